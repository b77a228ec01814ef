//! Monotonic timing of single invocations.
//!
//! `Instant` is monotonic and unaffected by wall-clock adjustments. Nothing
//! here retries or averages; repetition belongs to the runner.

use std::hint::black_box;
use std::time::{Duration, Instant};

/// Closure result paired with the time it took to produce it.
#[derive(Debug)]
pub struct Timed<T> {
    pub value: T,
    pub elapsed: Duration,
}

pub fn measure<F>(f: F) -> Duration
where
    F: FnOnce(),
{
    measure_with(f).elapsed
}

pub fn measure_with<F, R>(f: F) -> Timed<R>
where
    F: FnOnce() -> R,
{
    let start = Instant::now();
    let value = black_box(f());
    let elapsed = start.elapsed();
    Timed { value, elapsed }
}

pub fn as_millis_f64(d: Duration) -> f64 {
    d.as_secs_f64() * 1_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measure_with_returns_closure_value() {
        let timed = measure_with(|| 40 + 2);
        assert_eq!(timed.value, 42);
    }

    #[test]
    fn measure_covers_sleep() {
        let elapsed = measure(|| std::thread::sleep(Duration::from_millis(2)));
        assert!(elapsed >= Duration::from_millis(2));
    }

    #[test]
    fn millis_conversion_keeps_fraction() {
        assert!((as_millis_f64(Duration::from_micros(250)) - 0.25).abs() < 1e-9);
    }
}
