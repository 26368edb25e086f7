//! Anti-forgery `state` tokens
//!
//! Every random state placed in a redirect URL is remembered here and must be
//! presented exactly once, for the same provider, before it expires.

use chrono::{DateTime, Utc};
use oauth2::CsrfToken;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::models::ProviderId;
use crate::{Error, Result};

pub const DEFAULT_STATE_TTL: Duration = Duration::from_secs(600);

/// How a provider uses the `state` query parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatePolicy {
    /// No state is sent; callbacks are not checked
    None,
    /// The provider always receives the same literal value
    Fixed(&'static str),
    /// A fresh token is issued per redirect and verified once on callback
    Random,
}

#[derive(Debug, Clone)]
struct IssuedState {
    provider: ProviderId,
    issued_at: DateTime<Utc>,
}

/// Issued state tokens awaiting their callback
///
/// Cloning shares the underlying map.
#[derive(Debug, Clone)]
pub struct StateStore {
    states: Arc<Mutex<HashMap<String, IssuedState>>>,
    ttl: Duration,
}

impl StateStore {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            states: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a new random state for `provider`
    pub fn issue(&self, provider: ProviderId) -> String {
        let token = CsrfToken::new_random().secret().clone();
        let now = Utc::now();

        let mut states = self.states.lock();
        Self::retain_live(&mut states, now, self.ttl);
        states.insert(
            token.clone(),
            IssuedState {
                provider,
                issued_at: now,
            },
        );

        debug!(%provider, pending = states.len(), "Issued OAuth2 state");
        token
    }

    /// Consume a previously issued state
    ///
    /// The token is removed even when verification fails, so it can never be
    /// replayed.
    pub fn verify(&self, provider: ProviderId, state: &str) -> Result<()> {
        let issued = self
            .states
            .lock()
            .remove(state)
            .ok_or_else(|| Error::InvalidState("unknown or already used state".to_string()))?;

        if issued.provider != provider {
            warn!(expected = %issued.provider, got = %provider, "OAuth2 state used for another provider");
            return Err(Error::InvalidState(format!(
                "state was issued for {}",
                issued.provider
            )));
        }

        if Self::is_expired(&issued, Utc::now(), self.ttl) {
            return Err(Error::InvalidState("state expired".to_string()));
        }

        Ok(())
    }

    /// Check a callback `state` against a provider's policy
    pub fn check(&self, provider: ProviderId, policy: StatePolicy, state: Option<&str>) -> Result<()> {
        match policy {
            StatePolicy::None => Ok(()),
            StatePolicy::Fixed(expected) => match state {
                Some(value) if value == expected => Ok(()),
                _ => Err(Error::InvalidState(format!("expected fixed state for {provider}"))),
            },
            StatePolicy::Random => {
                let state = state
                    .filter(|value| !value.is_empty())
                    .ok_or_else(|| Error::InvalidState("state is required".to_string()))?;
                self.verify(provider, state)
            }
        }
    }

    /// Drop expired entries, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let mut states = self.states.lock();
        let before = states.len();
        Self::retain_live(&mut states, Utc::now(), self.ttl);
        before - states.len()
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.states.lock().len()
    }

    fn retain_live(states: &mut HashMap<String, IssuedState>, now: DateTime<Utc>, ttl: Duration) {
        states.retain(|_, issued| !Self::is_expired(issued, now, ttl));
    }

    fn is_expired(issued: &IssuedState, now: DateTime<Utc>, ttl: Duration) -> bool {
        chrono::Duration::from_std(ttl)
            .is_ok_and(|ttl| now - issued.issued_at > ttl)
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new(DEFAULT_STATE_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_verify_once() {
        let store = StateStore::default();
        let state = store.issue(ProviderId::GitHub);

        assert!(!state.is_empty());
        assert_eq!(store.pending(), 1);
        assert!(store.verify(ProviderId::GitHub, &state).is_ok());

        // Replays are rejected
        assert!(matches!(
            store.verify(ProviderId::GitHub, &state),
            Err(Error::InvalidState(_))
        ));
        assert_eq!(store.pending(), 0);
    }

    #[test]
    fn test_states_are_unique() {
        let store = StateStore::default();
        let first = store.issue(ProviderId::Feishu);
        let second = store.issue(ProviderId::Feishu);

        assert_ne!(first, second);
        assert_eq!(store.pending(), 2);
    }

    #[test]
    fn test_cross_provider_state_rejected() {
        let store = StateStore::default();
        let state = store.issue(ProviderId::GitHub);

        let err = store.verify(ProviderId::Feishu, &state).unwrap_err();
        assert!(err.to_string().contains("github"));
        // Consumed on failure as well
        assert!(store.verify(ProviderId::GitHub, &state).is_err());
    }

    #[test]
    fn test_expired_state_rejected() {
        let store = StateStore::new(Duration::ZERO);
        let state = store.issue(ProviderId::GitHub);
        std::thread::sleep(Duration::from_millis(5));

        assert!(matches!(
            store.verify(ProviderId::GitHub, &state),
            Err(Error::InvalidState(_))
        ));
    }

    #[test]
    fn test_purge_expired() {
        let store = StateStore::new(Duration::from_millis(200));
        store.issue(ProviderId::GitHub);
        store.issue(ProviderId::Feishu);
        assert_eq!(store.purge_expired(), 0);
        std::thread::sleep(Duration::from_millis(300));

        assert_eq!(store.purge_expired(), 2);
        assert_eq!(store.pending(), 0);
    }

    #[test]
    fn test_check_policies() {
        let store = StateStore::default();

        assert!(store.check(ProviderId::Google, StatePolicy::None, None).is_ok());
        assert!(store
            .check(ProviderId::DingTalk, StatePolicy::Fixed("authCode"), Some("authCode"))
            .is_ok());
        assert!(store
            .check(ProviderId::DingTalk, StatePolicy::Fixed("authCode"), Some("other"))
            .is_err());
        assert!(store.check(ProviderId::GitHub, StatePolicy::Random, None).is_err());
        assert!(store.check(ProviderId::GitHub, StatePolicy::Random, Some("")).is_err());

        let state = store.issue(ProviderId::GitHub);
        assert!(store
            .check(ProviderId::GitHub, StatePolicy::Random, Some(&state))
            .is_ok());
    }
}
