use std::sync::Arc;

use super::{Strategy, check_index};
use crate::error::BenchError;
use crate::workload::Workload;

/// Immutable event dispatched to a [`Store`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    SetAll(Arc<[Arc<str>]>),
    Append(String),
    RemoveAt(usize),
    /// Any action kind the list reducer does not handle.
    Other(String),
}

/// Top-level state. Never mutated; the reducer returns a new one whose slice
/// shares the item allocations of the previous state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListState {
    pub items: Arc<[Arc<str>]>,
}

impl Default for ListState {
    fn default() -> Self {
        Self {
            items: Arc::from(Vec::new()),
        }
    }
}

pub type Reducer = fn(&ListState, &Action) -> Result<ListState, BenchError>;

/// Pure reducer over [`ListState`]. Unknown actions yield the input state,
/// sharing its items.
pub fn list_reducer(state: &ListState, action: &Action) -> Result<ListState, BenchError> {
    let items: Arc<[Arc<str>]> = match action {
        Action::SetAll(items) => Arc::clone(items),
        Action::Append(item) => {
            let mut next = Vec::with_capacity(state.items.len() + 1);
            next.extend_from_slice(&state.items);
            next.push(Arc::from(item.as_str()));
            next.into()
        }
        Action::RemoveAt(index) => {
            check_index(*index, state.items.len())?;
            let mut next = Vec::with_capacity(state.items.len() - 1);
            next.extend_from_slice(&state.items[..*index]);
            next.extend_from_slice(&state.items[*index + 1..]);
            next.into()
        }
        Action::Other(_) => return Ok(state.clone()),
    };
    Ok(ListState { items })
}

type Subscriber = Box<dyn FnMut(&ListState)>;

/// Holds the current state and routes every dispatch through the reducer.
pub struct Store {
    state: ListState,
    reducer: Reducer,
    subscribers: Vec<Subscriber>,
    dispatched: usize,
}

impl Store {
    pub fn new(reducer: Reducer, initial: ListState) -> Self {
        Self {
            state: initial,
            reducer,
            subscribers: Vec::new(),
            dispatched: 0,
        }
    }

    pub fn state(&self) -> &ListState {
        &self.state
    }

    pub fn dispatched(&self) -> usize {
        self.dispatched
    }

    pub fn subscribe<F>(&mut self, subscriber: F)
    where
        F: FnMut(&ListState) + 'static,
    {
        self.subscribers.push(Box::new(subscriber));
    }

    /// Reduces `action` into a new state and notifies subscribers. A rejected
    /// action leaves the current state in place.
    pub fn dispatch(&mut self, action: Action) -> Result<(), BenchError> {
        let next = (self.reducer)(&self.state, &action)?;
        self.state = next;
        self.dispatched += 1;
        for subscriber in self.subscribers.iter_mut() {
            subscriber(&self.state);
        }
        Ok(())
    }
}

/// Strategy that only ever dispatches actions. Subscriber notification is
/// part of a dispatch and therefore timed.
pub struct ReducerStrategy {
    store: Store,
}

impl ReducerStrategy {
    pub fn new(_workload: &Workload) -> Self {
        Self {
            store: Store::new(list_reducer, ListState::default()),
        }
    }

    pub fn store_mut(&mut self) -> &mut Store {
        &mut self.store
    }
}

impl Strategy for ReducerStrategy {
    fn name(&self) -> &str {
        "reducer"
    }

    fn bulk_set(&mut self, items: &[String]) -> Result<(), BenchError> {
        let items: Arc<[Arc<str>]> = items.iter().map(|item| Arc::from(item.as_str())).collect();
        self.store.dispatch(Action::SetAll(items))
    }

    fn append(&mut self, item: String) -> Result<(), BenchError> {
        self.store.dispatch(Action::Append(item))
    }

    fn remove_at(&mut self, index: usize) -> Result<(), BenchError> {
        self.store.dispatch(Action::RemoveAt(index))
    }

    fn len(&self) -> usize {
        self.store.state().items.len()
    }

    fn to_vec(&self) -> Vec<String> {
        self.store.state().items.iter().map(|item| item.to_string()).collect()
    }
}
