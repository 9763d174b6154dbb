//! Cached client-side state for one resource, kept in step with its service.
//!
//! # Design
//! `Store` owns a `StoreState` behind a mutex and an injected service. Every
//! state change goes through one update path that queues a snapshot for the
//! subscribers. Snapshots are delivered in the order the changes happened,
//! with no lock held, so a listener may call back into the store. Actions
//! take `&self`, so a store can be shared across threads; concurrent actions
//! are not serialized and their writes land in completion order.
//!
//! Failures are handled by one of two policies: [`FailurePolicy::Record`]
//! (list) only stores the message, [`FailurePolicy::Propagate`] (everything
//! else) stores it and returns the error to the caller as well.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

use crate::error::ApiError;
use crate::resource::RecordKey;
use crate::service::{DepartmentService, EmployeeService, ResourceService};
use crate::types::Identified;

/// What the UI renders from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreState<T> {
    pub items: Vec<T>,
    pub current: Option<T>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> Default for StoreState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            current: None,
            loading: false,
            error: None,
        }
    }
}

/// How an action treats a failed service call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Record the message in state; the caller sees success.
    Record,
    /// Record the message in state and return the error.
    Propagate,
}

/// Handle returned by [`Store::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener<T> = Arc<dyn Fn(&StoreState<T>) + Send + Sync>;

struct Listeners<T> {
    next_id: u64,
    entries: Vec<(SubscriptionId, Listener<T>)>,
}

/// Current state plus the snapshots not yet handed to listeners.
struct Shared<T> {
    state: StoreState<T>,
    pending: VecDeque<StoreState<T>>,
    /// Set while some call is draining `pending`.
    notifying: bool,
}

/// Releases the draining role if a listener panics.
struct DrainGuard<'a, T>(&'a Mutex<Shared<T>>);

impl<T> Drop for DrainGuard<'_, T> {
    fn drop(&mut self) {
        if thread::panicking() {
            let mut shared = lock(self.0);
            shared.notifying = false;
            shared.pending.clear();
        }
    }
}

pub type DepartmentStore = Store<DepartmentService>;
pub type EmployeeStore = Store<EmployeeService>;

pub struct Store<S: ResourceService> {
    name: String,
    service: S,
    state: Mutex<Shared<S::Record>>,
    listeners: Mutex<Listeners<S::Record>>,
}

impl<S: ResourceService> std::fmt::Debug for Store<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("name", &self.name)
            .field("resource", &self.service.resource())
            .finish_non_exhaustive()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl DepartmentStore {
    pub fn departments(service: DepartmentService) -> Self {
        Store::new("department-store", service)
    }
}

impl EmployeeStore {
    pub fn employees(service: EmployeeService) -> Self {
        Store::new("employee-store", service)
    }
}

impl<S: ResourceService> Store<S> {
    pub fn new(name: &str, service: S) -> Self {
        Self {
            name: name.to_string(),
            service,
            state: Mutex::new(Shared {
                state: StoreState::default(),
                pending: VecDeque::new(),
                notifying: false,
            }),
            listeners: Mutex::new(Listeners {
                next_id: 0,
                entries: Vec::new(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// A copy of the current state.
    pub fn snapshot(&self) -> StoreState<S::Record> {
        lock(&self.state).state.clone()
    }

    /// Call `listener` with a snapshot after every state change.
    ///
    /// Listeners run with no store lock held and may call any store method.
    /// A change made from inside a listener is delivered after the current
    /// snapshot has reached every listener.
    pub fn subscribe(
        &self,
        listener: impl Fn(&StoreState<S::Record>) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let mut listeners = lock(&self.listeners);
        let id = SubscriptionId(listeners.next_id);
        listeners.next_id += 1;
        listeners.entries.push((id, Arc::new(listener)));
        id
    }

    /// Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = lock(&self.listeners);
        let before = listeners.entries.len();
        listeners.entries.retain(|(entry, _)| *entry != id);
        listeners.entries.len() != before
    }

    /// Apply `change` and queue the resulting snapshot. The first caller to
    /// find the queue idle delivers everything queued until it is empty;
    /// everyone else returns straight away.
    fn mutate(&self, change: impl FnOnce(&mut StoreState<S::Record>)) {
        {
            let mut shared = lock(&self.state);
            change(&mut shared.state);
            let snapshot = shared.state.clone();
            shared.pending.push_back(snapshot);
            if shared.notifying {
                return;
            }
            shared.notifying = true;
        }

        let _guard = DrainGuard(&self.state);
        loop {
            let snapshot = {
                let mut shared = lock(&self.state);
                match shared.pending.pop_front() {
                    Some(snapshot) => snapshot,
                    None => {
                        shared.notifying = false;
                        return;
                    }
                }
            };
            let listeners: Vec<Listener<S::Record>> = lock(&self.listeners)
                .entries
                .iter()
                .map(|(_, listener)| Arc::clone(listener))
                .collect();
            for listener in &listeners {
                listener(&snapshot);
            }
        }
    }

    pub fn set_loading(&self, loading: bool) {
        self.mutate(|state| state.loading = loading);
    }

    pub fn set_error(&self, error: Option<String>) {
        self.mutate(|state| state.error = error);
    }

    pub fn clear_error(&self) {
        self.mutate(|state| state.error = None);
    }

    pub fn clear_current(&self) {
        self.mutate(|state| state.current = None);
    }

    /// Run one service call with the busy flag raised, then either apply the
    /// result or record the failure according to `policy`.
    fn run<R>(
        &self,
        operation: &str,
        policy: FailurePolicy,
        call: impl FnOnce(&S) -> Result<R, ApiError>,
        apply: impl FnOnce(&mut StoreState<S::Record>, &R),
    ) -> Result<Option<R>, ApiError> {
        self.mutate(|state| {
            state.loading = true;
            state.error = None;
        });

        match call(&self.service) {
            Ok(value) => {
                self.mutate(|state| {
                    apply(state, &value);
                    state.loading = false;
                });
                Ok(Some(value))
            }
            Err(err) => {
                tracing::warn!(store = %self.name, error = %err, "Error {operation}");
                let message = err.to_string();
                self.mutate(|state| {
                    state.error = Some(message);
                    state.loading = false;
                });
                match policy {
                    FailurePolicy::Record => Ok(None),
                    FailurePolicy::Propagate => Err(err),
                }
            }
        }
    }

    /// Reload the whole collection. Failures only show up in `error`; the
    /// cached items are left as they were.
    pub fn list(&self) {
        let operation = format!("fetching {}", self.service.resource().plural());
        // Record never yields Err.
        let _ = self.run(
            &operation,
            FailurePolicy::Record,
            |service| service.list(),
            |state, response| state.items = response.data.clone().unwrap_or_default(),
        );
    }

    /// Load one record into `current`.
    pub fn fetch_one(&self, id: impl Into<RecordKey>) -> Result<S::Record, ApiError> {
        let id = id.into();
        let operation = format!("fetching {}", self.service.resource().singular());
        self.run(
            &operation,
            FailurePolicy::Propagate,
            |service| service.get(&id),
            |state, response| state.current = Some(response.data.clone()),
        )
        .and_then(expect_value)
        .map(|response| response.data)
    }

    /// Create a record and append it to the cached items.
    pub fn create(&self, input: &S::Input) -> Result<S::Record, ApiError> {
        let operation = format!("creating {}", self.service.resource().singular());
        self.run(
            &operation,
            FailurePolicy::Propagate,
            |service| service.create(input),
            |state, response| state.items.push(response.data.clone()),
        )
        .and_then(expect_value)
        .map(|response| response.data)
    }

    /// Update a record; the cached entry whose id matches `id` numerically is
    /// replaced and `current` is set to the new value.
    pub fn update(
        &self,
        id: impl Into<RecordKey>,
        input: &S::Input,
    ) -> Result<S::Record, ApiError> {
        let id = id.into();
        let operation = format!("updating {}", self.service.resource().singular());
        self.run(
            &operation,
            FailurePolicy::Propagate,
            |service| service.update(&id, input),
            |state, response| {
                for item in state.items.iter_mut() {
                    if id.matches_coerced(item.id()) {
                        *item = response.data.clone();
                    }
                }
                state.current = Some(response.data.clone());
            },
        )
        .and_then(expect_value)
        .map(|response| response.data)
    }

    /// Delete a record; the cached entry is dropped only when `id` is the
    /// same number as the record's id (a textual key never matches).
    pub fn delete(&self, id: impl Into<RecordKey>) -> Result<(), ApiError> {
        let id = id.into();
        let operation = format!("deleting {}", self.service.resource().singular());
        self.run(
            &operation,
            FailurePolicy::Propagate,
            |service| service.delete(&id),
            |state, _| state.items.retain(|item| !id.matches_exact(item.id())),
        )
        .map(|_| ())
    }
}

/// `Propagate` only ever yields `Ok(Some(_))` or `Err(_)`.
fn expect_value<R>(value: Option<R>) -> Result<R, ApiError> {
    value.ok_or_else(|| ApiError::Unknown("An unexpected error occurred".to_string()))
}
