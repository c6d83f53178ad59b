//! Session context shared between the UI and the client.
//!
//! # Design
//! `Session` is an explicit handle instead of a process-wide store: the
//! client receives one at construction and reads the token from it whenever a
//! request is built. Clones share the same state. Subscribers are called with
//! the current state right away and again after every change, outside the
//! state lock.
//!
//! The "stored token" slot is separate from the live token. It stands in for
//! the browser's session storage and is what `logout` wipes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use crate::dto::User;

/// Snapshot handed to subscribers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub token: Option<String>,
    pub me: Option<User>,
}

/// Handle returned by [`Session::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Arc<dyn Fn(&SessionState) + Send + Sync>;

#[derive(Default)]
struct Inner {
    state: RwLock<SessionState>,
    stored_token: Mutex<Option<String>>,
    subscribers: Mutex<Vec<(SubscriptionId, Subscriber)>>,
    /// Held from a change until its notifications are delivered.
    publish: Mutex<()>,
    next_id: AtomicU64,
}

#[derive(Clone, Default)]
pub struct Session {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.snapshot();
        f.debug_struct("Session")
            .field("signed_in", &state.token.is_some())
            .field("me", &state.me.as_ref().map(|u| u.username.as_str()))
            .finish()
    }
}

impl Session {
    /// A session with no token and no user.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token(&self) -> Option<String> {
        self.read(|state| state.token.clone())
    }

    pub fn me(&self) -> Option<User> {
        self.read(|state| state.me.clone())
    }

    pub fn snapshot(&self) -> SessionState {
        self.read(SessionState::clone)
    }

    pub fn set_token(&self, token: Option<String>) {
        tracing::debug!(present = token.is_some(), "session token updated");
        self.update(|state| state.token = token);
    }

    pub fn set_me(&self, me: Option<User>) {
        tracing::debug!(user = me.as_ref().map(|u| u.username.as_str()), "session user updated");
        self.update(|state| state.me = me);
    }

    /// Record a freshly issued token in both the live cell and the stored slot.
    pub fn sign_in(&self, token: &str) {
        *self.lock_stored() = Some(token.to_string());
        self.set_token(Some(token.to_string()));
    }

    /// Forget the token, the user and the stored slot.
    pub fn clear(&self) {
        self.remove_stored_token();
        self.update(|state| *state = SessionState::default());
    }

    pub fn stored_token(&self) -> Option<String> {
        self.lock_stored().clone()
    }

    pub fn remove_stored_token(&self) {
        *self.lock_stored() = None;
    }

    /// Register `callback`; it runs immediately with the current state.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&SessionState) + Send + Sync + 'static,
    {
        let _publishing = self.lock_publish();
        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let callback: Subscriber = Arc::new(callback);
        self.inner
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::clone(&callback)));
        callback(&self.snapshot());
        id
    }

    /// Returns whether `id` was still registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.inner.subscribers.lock().unwrap_or_else(PoisonError::into_inner);
        let before = subscribers.len();
        subscribers.retain(|(sid, _)| *sid != id);
        subscribers.len() != before
    }

    fn read<T>(&self, f: impl FnOnce(&SessionState) -> T) -> T {
        let state = self.inner.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    fn update(&self, f: impl FnOnce(&mut SessionState)) {
        let _publishing = self.lock_publish();
        let snapshot = {
            let mut state = self.inner.state.write().unwrap_or_else(PoisonError::into_inner);
            f(&mut state);
            state.clone()
        };
        let subscribers: Vec<Subscriber> = self
            .inner
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();
        tracing::trace!(subscribers = subscribers.len(), "notifying session subscribers");
        for callback in subscribers {
            callback(&snapshot);
        }
    }

    fn lock_publish(&self) -> MutexGuard<'_, ()> {
        self.inner.publish.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_stored(&self) -> MutexGuard<'_, Option<String>> {
        self.inner.stored_token.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder(session: &Session) -> (SubscriptionId, Arc<Mutex<Vec<Option<String>>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let id = session.subscribe(move |state| sink.lock().unwrap().push(state.token.clone()));
        (id, seen)
    }

    #[test]
    fn starts_empty() {
        let session = Session::new();
        assert_eq!(session.token(), None);
        assert_eq!(session.me(), None);
        assert_eq!(session.stored_token(), None);
    }

    #[test]
    fn subscriber_sees_current_value_then_changes() {
        let session = Session::new();
        session.set_token(Some("Bearer a".to_string()));

        let (_, seen) = recorder(&session);
        session.set_token(Some("Bearer b".to_string()));
        session.set_token(None);

        assert_eq!(
            *seen.lock().unwrap(),
            vec![Some("Bearer a".to_string()), Some("Bearer b".to_string()), None]
        );
    }

    #[test]
    fn unsubscribed_callbacks_are_not_called() {
        let session = Session::new();
        let (id, seen) = recorder(&session);
        assert!(session.unsubscribe(id));
        assert!(!session.unsubscribe(id));

        session.set_token(Some("t".to_string()));
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn clones_share_state() {
        let session = Session::new();
        let other = session.clone();
        other.sign_in("Bearer x");
        assert_eq!(session.token().as_deref(), Some("Bearer x"));
        assert_eq!(session.stored_token().as_deref(), Some("Bearer x"));
    }

    #[test]
    fn removing_stored_token_keeps_live_token() {
        let session = Session::new();
        session.sign_in("Bearer x");
        session.remove_stored_token();
        assert_eq!(session.stored_token(), None);
        assert_eq!(session.token().as_deref(), Some("Bearer x"));
    }

    #[test]
    fn clear_resets_everything() {
        let session = Session::new();
        session.sign_in("Bearer x");
        let (_, seen) = recorder(&session);
        session.clear();
        assert_eq!(session.snapshot(), SessionState::default());
        assert_eq!(session.stored_token(), None);
        assert_eq!(seen.lock().unwrap().last(), Some(&None));
    }

    #[test]
    fn debug_does_not_leak_token() {
        let session = Session::new();
        session.sign_in("Bearer secret");
        assert!(!format!("{session:?}").contains("secret"));
    }

    #[test]
    fn concurrent_writers_leave_subscribers_on_the_current_token() {
        let session = Session::new();
        let (_, first) = recorder(&session);
        let (_, second) = recorder(&session);

        let writers: Vec<_> = ["a", "b"]
            .into_iter()
            .map(|name| {
                let session = session.clone();
                std::thread::spawn(move || {
                    for i in 0..500 {
                        session.set_token(Some(format!("Bearer {name}{i}")));
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        let current = session.token();
        assert!(current.is_some());
        for seen in [first, second] {
            let seen = seen.lock().unwrap();
            assert_eq!(seen.len(), 1001);
            assert_eq!(seen.last(), Some(&current));
        }
    }

    #[test]
    fn subscribing_during_writes_never_ends_stale() {
        let session = Session::new();
        let writer = {
            let session = session.clone();
            std::thread::spawn(move || {
                for i in 0..500 {
                    session.set_token(Some(format!("Bearer {i}")));
                }
            })
        };
        let late: Vec<_> = (0..20).map(|_| recorder(&session).1).collect();
        writer.join().unwrap();

        let current = session.token();
        for seen in late {
            assert_eq!(seen.lock().unwrap().last(), Some(&current));
        }
    }
}
