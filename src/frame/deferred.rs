use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::foundation::error::{PlayoutError, PlayoutResult};

type Outcome<T> = Result<Arc<T>, Arc<str>>;

struct Slot<T> {
    value: Mutex<Option<Outcome<T>>>,
    ready: Condvar,
}

impl<T> Slot<T> {
    fn resolve(&self, outcome: Outcome<T>) {
        let mut guard = self.value.lock();
        if guard.is_none() {
            *guard = Some(outcome);
        }
        drop(guard);
        self.ready.notify_all();
    }
}

/// Write-once, read-many result cell.
///
/// Readers block in [`Deferred::get`] until the paired [`Promise`] is fulfilled, failed, or
/// dropped. A dropped promise resolves the cell with an error so readers never hang.
pub struct Deferred<T> {
    slot: Arc<Slot<T>>,
}

impl<T> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T> std::fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deferred")
            .field("ready", &self.is_ready())
            .finish()
    }
}

/// Writing half of a [`Deferred`].
pub struct Promise<T> {
    slot: Option<Arc<Slot<T>>>,
}

/// Create an unresolved cell and the promise that resolves it.
pub fn deferred<T>() -> (Promise<T>, Deferred<T>) {
    let slot = Arc::new(Slot {
        value: Mutex::new(None),
        ready: Condvar::new(),
    });
    (
        Promise {
            slot: Some(Arc::clone(&slot)),
        },
        Deferred { slot },
    )
}

impl<T> Promise<T> {
    /// Resolve with a value.
    pub fn set(mut self, value: T) {
        if let Some(slot) = self.slot.take() {
            slot.resolve(Ok(Arc::new(value)));
        }
    }

    /// Resolve with an error message.
    pub fn fail(mut self, msg: impl Into<String>) {
        if let Some(slot) = self.slot.take() {
            slot.resolve(Err(Arc::from(msg.into())));
        }
    }
}

impl<T> Drop for Promise<T> {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.take() {
            slot.resolve(Err(Arc::from("promise dropped before resolution")));
        }
    }
}

impl<T> Deferred<T> {
    /// An already-resolved cell.
    pub fn ready(value: T) -> Self {
        let (promise, deferred) = deferred();
        promise.set(value);
        deferred
    }

    /// An already-failed cell.
    pub fn failed(msg: impl Into<String>) -> Self {
        let (promise, deferred) = deferred();
        promise.fail(msg);
        deferred
    }

    /// Return `true` once the cell holds a value or an error.
    pub fn is_ready(&self) -> bool {
        self.slot.value.lock().is_some()
    }

    /// Block until resolved and return the shared value.
    pub fn get(&self) -> PlayoutResult<Arc<T>> {
        let mut guard = self.slot.value.lock();
        while guard.is_none() {
            self.slot.ready.wait(&mut guard);
        }
        Self::read(guard.as_ref())
    }

    /// Like [`Deferred::get`], giving up after `timeout`.
    pub fn get_timeout(&self, timeout: Duration) -> Option<PlayoutResult<Arc<T>>> {
        let mut guard = self.slot.value.lock();
        if guard.is_none() {
            let _ = self.slot.ready.wait_for(&mut guard, timeout);
        }
        guard.as_ref().map(|o| Self::read(Some(o)))
    }

    fn read(outcome: Option<&Outcome<T>>) -> PlayoutResult<Arc<T>> {
        match outcome {
            Some(Ok(v)) => Ok(Arc::clone(v)),
            Some(Err(msg)) => Err(PlayoutError::composition(msg.to_string())),
            None => Err(PlayoutError::composition("deferred value not resolved")),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/frame/deferred.rs"]
mod tests;
