//! In-process registry of sequences with a generation or export running.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// What is running for a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    Generating,
    Exporting,
}

impl Activity {
    pub fn describe(&self) -> &'static str {
        match self {
            Activity::Generating => "Generation is already running for this sequence",
            Activity::Exporting => "An export is already running for this sequence",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct InFlight {
    active: Arc<Mutex<HashMap<String, Activity>>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Activity>> {
        // The map holds plain data; a panic elsewhere cannot leave it torn.
        self.active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Claim `key`, or report what already holds it.
    pub fn try_claim(&self, key: &str, activity: Activity) -> Result<InFlightGuard, Activity> {
        let mut active = self.lock();
        if let Some(current) = active.get(key) {
            return Err(*current);
        }
        active.insert(key.to_string(), activity);
        Ok(InFlightGuard {
            registry: self.clone(),
            key: key.to_string(),
        })
    }

    pub fn current(&self, key: &str) -> Option<Activity> {
        self.lock().get(key).copied()
    }
}

/// Releases the claim when dropped.
#[derive(Debug)]
pub struct InFlightGuard {
    registry: InFlight,
    key: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.registry.lock().remove(&self.key);
    }
}
