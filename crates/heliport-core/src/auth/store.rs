//! The session store: single source of truth for authentication state.
//!
//! The store owns one subscription to the auth service's change feed. The
//! result of the boot-time session query and every delivered notification go
//! through `apply`, the only place `SessionState` is written. Sign-in, sign-up
//! and sign-out delegate to the provider and report success or failure; the
//! state change they cause arrives later as a notification.
//!
//! Listeners registered with `subscribe_state` are called synchronously, in
//! registration order, whenever the state actually changes.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{AuthError, AuthEvent, AuthProvider, Session, SessionState, SignUpMetadata, Subscription};

/// Handle returned by `subscribe_state`, used to remove the listener.
pub type ListenerId = u64;

type Listener = Box<dyn FnMut(&SessionState) + Send>;

pub struct SessionStore {
    provider: Arc<dyn AuthProvider>,
    state: SessionState,
    subscription: Option<Subscription>,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener_id: ListenerId,
}

impl SessionStore {
    pub fn new(provider: Arc<dyn AuthProvider>) -> Self {
        Self {
            provider,
            state: SessionState::Loading,
            subscription: None,
            listeners: Vec::new(),
            next_listener_id: 0,
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Subscribe to the auth service and resolve the boot-time session.
    ///
    /// A failed query resolves to `Unauthenticated`. Calling this again while
    /// the subscription is held does nothing.
    pub async fn initialize(&mut self) {
        if self.subscription.is_some() {
            debug!("Session store already initialized");
            return;
        }

        self.subscription = Some(self.provider.subscribe());

        let existing = match self.provider.get_current_session().await {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Failed to query existing session, continuing signed out");
                None
            }
        };
        self.apply(existing);

        // Anything delivered while the query was in flight is newer
        self.process_pending();
    }

    pub fn is_initialized(&self) -> bool {
        self.subscription.is_some()
    }

    /// Release the change subscription. Also happens when the store is dropped.
    pub fn shutdown(&mut self) {
        if self.subscription.take().is_some() {
            debug!("Session store released its auth subscription");
        }
    }

    // =========================================================================
    // Operations
    // =========================================================================

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let session = self.provider.sign_in_with_password(email, password).await?;
        info!(user_id = %session.user_id, "Sign-in accepted");
        Ok(())
    }

    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<(), AuthError> {
        let metadata = SignUpMetadata::with_full_name(display_name);
        let session = self.provider.sign_up(email, password, &metadata).await?;
        info!(user_id = %session.user_id, "Registration accepted");
        Ok(())
    }

    pub async fn sign_out(&self) -> Result<(), AuthError> {
        self.provider.sign_out().await?;
        info!("Sign-out accepted");
        Ok(())
    }

    // =========================================================================
    // State access
    // =========================================================================

    /// Latest known state. Never blocks.
    pub fn current_state(&self) -> SessionState {
        self.state.clone()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Snapshot of the current session, if authenticated
    pub fn session(&self) -> Option<Arc<Session>> {
        self.state.session().cloned()
    }

    // =========================================================================
    // Notifications
    // =========================================================================

    /// Apply every notification already delivered. Returns how many were applied.
    pub fn process_pending(&mut self) -> usize {
        let mut applied = 0;
        while let Some(change) = self.subscription.as_mut().and_then(Subscription::try_next) {
            debug!(event = ?change.event, "Applying auth change");
            self.apply(change.session);
            applied += 1;
        }
        applied
    }

    /// Wait for the next notification and apply it.
    /// Returns `None` when not initialized or when the feed has closed.
    pub async fn next_change(&mut self) -> Option<AuthEvent> {
        let change = self.subscription.as_mut()?.next().await?;
        debug!(event = ?change.event, "Applying auth change");
        self.apply(change.session);
        Some(change.event)
    }

    /// Register a listener called on every state transition.
    pub fn subscribe_state<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&SessionState) + Send + 'static,
    {
        let id = self.next_listener_id;
        self.next_listener_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe_state(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    fn apply(&mut self, session: Option<Session>) {
        let next = SessionState::from_session(session);
        if next == self.state {
            return;
        }

        debug!(from = self.state.label(), to = next.label(), user_id = ?next.user_id(), "Session state transition");
        self.state = next;

        for (_, listener) in self.listeners.iter_mut() {
            listener(&self.state);
        }
    }
}
