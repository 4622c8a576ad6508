//! Per-view access guard.
//!
//! An `AccessGate` wraps a protected view and is re-evaluated against the
//! store's state on every transition. While the state is `Loading` only a
//! placeholder is shown; once resolved the view either renders or the gate
//! issues a single redirect to the login entry point.

use super::SessionState;

/// What a protected view should do for a given state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Placeholder,
    Render,
    Redirect,
}

/// Pure decision for a state; the same state always yields the same decision.
pub fn decide(state: &SessionState) -> Decision {
    match state {
        SessionState::Loading => Decision::Placeholder,
        SessionState::Authenticated(_) => Decision::Render,
        SessionState::Unauthenticated => Decision::Redirect,
    }
}

/// Instruction to navigate to the login entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRedirect<R> {
    /// Where the user was headed, for collaborators that want to return there
    /// after signing in.
    pub return_to: Option<R>,
}

/// Outcome of evaluating a gate.
#[derive(Debug, PartialEq, Eq)]
pub enum Gated<'a, V, R> {
    /// Session status is not known yet; show neither the view nor a redirect.
    Placeholder,
    Render(&'a V),
    /// Navigate to login now. Issued once per transition to `Unauthenticated`.
    Redirect(LoginRedirect<R>),
    /// Redirect already issued for the current unauthenticated spell.
    Hidden,
}

pub struct AccessGate<V, R = ()> {
    view: V,
    destination: Option<R>,
    redirected: bool,
}

impl<V> AccessGate<V> {
    pub fn new(view: V) -> Self {
        Self {
            view,
            destination: None,
            redirected: false,
        }
    }
}

impl<V, R: Clone> AccessGate<V, R> {
    /// Gate whose redirects carry `destination` as the return-to target.
    pub fn returning_to(view: V, destination: R) -> Self {
        Self {
            view,
            destination: Some(destination),
            redirected: false,
        }
    }

    pub fn evaluate(&mut self, state: &SessionState) -> Gated<'_, V, R> {
        match decide(state) {
            Decision::Placeholder => Gated::Placeholder,
            Decision::Render => {
                self.redirected = false;
                Gated::Render(&self.view)
            }
            Decision::Redirect if self.redirected => Gated::Hidden,
            Decision::Redirect => {
                self.redirected = true;
                Gated::Redirect(LoginRedirect {
                    return_to: self.destination.clone(),
                })
            }
        }
    }

    /// Forget an issued redirect, e.g. when the user navigates to the view
    /// again while still signed out.
    pub fn reset(&mut self) {
        self.redirected = false;
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }
}
