use std::io::Write as _;
use std::process::ExitCode;
use std::sync::Once;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, ValueEnum};
use statebench_core::{
    RunConfig, Runner, StrategyKind,
    report::{self, RunRecord},
    workload::{DEFAULT_APPEND_ITEM, DEFAULT_SIZE},
};
use tracing::warn;


static TRACE_INIT: Once = Once::new();
const TRACE_ENV: &str = "STATEBENCH_TRACE";
const DEFAULT_TRACE_FILTER: &str = "statebench_core=info,statebench=info";

#[derive(Debug, Parser)]
#[command(
    name = "statebench",
    author,
    version,
    about = "Time bulk-set, append and remove across collection update strategies",
    long_about = None,
    after_help = "Set STATEBENCH_TRACE=1 (or a filter such as statebench_core=debug) for logs on stderr."
)]
struct CliArgs {
    /// Number of generated workload items
    #[arg(value_name = "SIZE", default_value_t = DEFAULT_SIZE)]
    size: usize,

    /// Strategies to run, comma separated (default: all)
    #[arg(
        short,
        long = "strategy",
        value_name = "NAME",
        value_delimiter = ',',
        value_parser = parse_strategy
    )]
    strategies: Vec<StrategyKind>,

    /// Timed iterations; every iteration builds each strategy afresh
    #[arg(long, default_value_t = 1, value_parser = parse_positive)]
    repeat: usize,

    /// Untimed iterations run before measuring
    #[arg(long, default_value_t = 0)]
    warmup: usize,

    /// Index removed in the REMOVE phase (default: SIZE / 2)
    #[arg(long, value_name = "INDEX")]
    remove_index: Option<usize>,

    /// Item appended in the APPEND phase
    #[arg(long, value_name = "ITEM", default_value = DEFAULT_APPEND_ITEM)]
    append_item: String,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// List registered strategies and exit
    #[arg(long)]
    list: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl CliArgs {
    fn into_config(self) -> RunConfig {
        let strategies = if self.strategies.is_empty() {
            StrategyKind::ALL.to_vec()
        } else {
            let mut unique = Vec::with_capacity(self.strategies.len());
            for kind in self.strategies {
                if !unique.contains(&kind) {
                    unique.push(kind);
                }
            }
            unique
        };
        RunConfig {
            size: self.size,
            strategies,
            append_item: self.append_item,
            remove_index: self.remove_index,
            repeat: self.repeat,
            warmup: self.warmup,
        }
    }
}

fn parse_strategy(raw: &str) -> Result<StrategyKind, String> {
    raw.parse()
}

fn parse_positive(raw: &str) -> Result<usize, String> {
    match raw.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

/// REMOVE runs after APPEND, so `size` itself is still a valid index.
fn remove_index_out_of_range(config: &RunConfig) -> bool {
    config.remove_index() > config.size
}

fn env_toggle_enabled(raw: &str) -> bool {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return false;
    }
    !(trimmed.eq_ignore_ascii_case("0") || trimmed.eq_ignore_ascii_case("false") || trimmed.eq_ignore_ascii_case("off"))
}

fn filter_expr_from(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("1")
        || trimmed.eq_ignore_ascii_case("true")
        || trimmed.eq_ignore_ascii_case("on")
    {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn maybe_init_tracing() {
    let raw = match std::env::var(TRACE_ENV) {
        Ok(value) => value,
        Err(_) => return,
    };

    if !env_toggle_enabled(&raw) {
        return;
    }

    TRACE_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        use tracing_subscriber::fmt;

        let filter_expr = filter_expr_from(&raw).or_else(|| std::env::var("RUST_LOG").ok());

        let builder = fmt().with_writer(std::io::stderr);

        let builder = match filter_expr.and_then(|expr| EnvFilter::try_new(expr).ok()) {
            Some(filter) => builder.with_env_filter(filter),
            None => builder.with_env_filter(DEFAULT_TRACE_FILTER),
        };

        let _ = builder.try_init();
    });
}

fn run(args: CliArgs) -> anyhow::Result<ExitCode> {
    let mut stdout = std::io::stdout().lock();

    if args.list {
        for kind in StrategyKind::ALL {
            writeln!(stdout, "{:<14} {}", kind.name(), kind.description())?;
        }
        return Ok(ExitCode::SUCCESS);
    }

    let format = args.format;
    let config = args.into_config();
    if remove_index_out_of_range(&config) {
        warn!(
            remove_index = config.remove_index(),
            size = config.size,
            "remove index is past the appended item; REMOVE will fail for every strategy"
        );
    }

    let runner = Runner::new(config);
    let outcome = runner.run();

    let rendered = match format {
        OutputFormat::Table => {
            let cfg = runner.config();
            format!(
                "statebench: {} items, {} iteration(s), remove index {}\n\n{}",
                cfg.size,
                cfg.repeat,
                cfg.remove_index(),
                report::report(&outcome.measurements)
            )
        }
        OutputFormat::Csv => report::render_csv(&report::summarize(&outcome.measurements)),
        OutputFormat::Json => {
            let mut json = report::render_json(&RunRecord::new(&outcome, Utc::now()))?;
            json.push('\n');
            json
        }
    };
    stdout
        .write_all(rendered.as_bytes())
        .context("write report to stdout")?;
    stdout.flush().context("flush stdout")?;

    if outcome.completed_strategies().is_empty() {
        if outcome.all_init_failed() {
            eprintln!("Error: every strategy failed to initialise");
        } else {
            eprintln!("Error: no strategy completed every phase");
        }
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    maybe_init_tracing();
    let args = CliArgs::parse();
    match run(args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
