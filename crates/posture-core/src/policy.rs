//! Policy-trigger collaborator.
//!
//! The policy manager runs outside the verifier. It is notified once when a
//! session enters the package-verification phase and once when the
//! connection is deleted. Notifications are fire-and-forget.

use std::sync::{Arc, Mutex};

use crate::SessionId;

/// Policy manager notified about session progress
pub trait PolicyManager {
    /// Start (`starting = true`) or finish (`starting = false`) policy
    /// evaluation for a session
    fn policy_script(&self, session_id: SessionId, starting: bool);
}

/// Policy manager that only records the notifications it receives
///
/// Clones share one log.
#[derive(Debug, Clone, Default)]
pub struct RecordingPolicy {
    calls: Arc<Mutex<Vec<(SessionId, bool)>>>,
}

impl RecordingPolicy {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// All notifications in arrival order
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn calls(&self) -> Vec<(SessionId, bool)> {
        self.calls.lock().expect("RecordingPolicy mutex poisoned").clone()
    }

    /// Number of `starting = true` notifications for a session
    pub fn starts(&self, session_id: SessionId) -> usize {
        self.calls().iter().filter(|&&(id, starting)| id == session_id && starting).count()
    }
}

impl PolicyManager for RecordingPolicy {
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    fn policy_script(&self, session_id: SessionId, starting: bool) {
        self.calls.lock().expect("RecordingPolicy mutex poisoned").push((session_id, starting));
    }
}
