use crate::error::{StoreError, StoreResult};
use parking_lot::Mutex;

type Matcher<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

struct FaultEntry<T: ?Sized> {
    remaining: usize,
    matches: Matcher<T>,
    error: StoreError,
}

/// Failures armed on one store operation. Each entry fails the next
/// `remaining` operations it matches, then disarms itself.
pub struct FaultPlan<T: ?Sized> {
    entries: Mutex<Vec<FaultEntry<T>>>,
}

impl<T: ?Sized> Default for FaultPlan<T> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }
}

impl<T: ?Sized> FaultPlan<T> {
    pub fn fail_next<F>(&self, failures: usize, error: StoreError, matches: F)
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        if failures == 0 {
            return;
        }
        self.entries.lock().push(FaultEntry {
            remaining: failures,
            matches: Box::new(matches),
            error,
        });
    }

    pub fn reset(&self) {
        self.entries.lock().clear();
    }

    pub(crate) fn check(&self, operation: &T) -> StoreResult<()> {
        let mut entries = self.entries.lock();
        let Some(position) = entries.iter().position(|e| (e.matches)(operation)) else {
            return Ok(());
        };
        let entry = &mut entries[position];
        entry.remaining -= 1;
        let error = entry.error.clone();
        if entry.remaining == 0 {
            entries.remove(position);
        }
        Err(error)
    }
}
