//! Anti-forgery state for in-flight OAuth logins.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

/// Issues and consumes per-flow CSRF state values.
///
/// Each `begin_authorization` call registers an independent value, so
/// concurrent logins from the same browser (two tabs) cannot corrupt each
/// other. Values are single-use and expire after a short TTL; an abandoned
/// flow leaves nothing behind once its value lapses.
#[derive(Clone)]
pub struct StateManager {
    issued: Arc<Mutex<HashMap<String, DateTime<Utc>>>>,
    ttl: Duration,
}

impl StateManager {
    /// Create a state manager with the default TTL of 10 minutes.
    pub fn new() -> Self {
        Self::with_ttl(Duration::minutes(10))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            issued: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    /// Issue a fresh state value for a new flow.
    pub fn issue(&self) -> String {
        let state = generate_state();
        let mut issued = self.issued.lock().unwrap();
        issued.insert(state.clone(), Utc::now() + self.ttl);
        state
    }

    /// Validate and consume a state value. Returns `false` when the value
    /// was never issued, already consumed, or has expired.
    pub fn consume(&self, state: &str) -> bool {
        let mut issued = self.issued.lock().unwrap();
        match issued.remove(state) {
            Some(expires_at) => Utc::now() <= expires_at,
            None => false,
        }
    }

    /// Drop expired values. Should be called periodically to bound memory.
    pub fn cleanup_expired(&self) {
        let mut issued = self.issued.lock().unwrap();
        let now = Utc::now();
        issued.retain(|_, expires_at| *expires_at > now);
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate a cryptographically random state value.
fn generate_state() -> String {
    let random_bytes: [u8; 32] = rand::thread_rng().gen();
    hex::encode(random_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_state() {
        let manager = StateManager::new();
        let state = manager.issue();
        assert!(!state.is_empty());
        assert_eq!(state.len(), 64); // 32 bytes hex encoded
    }

    #[test]
    fn test_consume_issued_state() {
        let manager = StateManager::new();
        let state = manager.issue();
        assert!(manager.consume(&state));
    }

    #[test]
    fn test_consume_unknown_state() {
        let manager = StateManager::new();
        assert!(!manager.consume("never-issued"));
    }

    #[test]
    fn test_state_is_single_use() {
        let manager = StateManager::new();
        let state = manager.issue();
        assert!(manager.consume(&state));
        assert!(!manager.consume(&state));
    }

    #[test]
    fn test_expired_state_rejected() {
        let manager = StateManager::with_ttl(Duration::seconds(-1));
        let state = manager.issue();
        assert!(!manager.consume(&state));
    }

    #[test]
    fn test_concurrent_flows_are_independent() {
        let manager = StateManager::new();
        let first = manager.issue();
        let second = manager.issue();
        assert_ne!(first, second);

        assert!(manager.consume(&second));
        assert!(manager.consume(&first));
    }
}
