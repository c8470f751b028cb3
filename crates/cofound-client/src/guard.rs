//! Access decisions for role-gated views.
//!
//! A protected view asks [`check`] before rendering. Entry requires a
//! session, a selected plan on the profile document, and a session role
//! matching the view's requirement; anything less resolves to a redirect
//! rather than an error.

use cofound_shared::types::Role;
use cofound_store::StoreError;

use crate::session::Session;

/// What a view requires of the visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Any signed-in user.
    SignedIn,
    /// A signed-in user whose session role matches and who has selected
    /// a plan.
    Role(Role),
}

/// Where the visitor should end up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Granted,
    RedirectSignIn,
    /// Send the visitor to the plan-selection page for this role.
    RedirectPlanSelection(Role),
}

/// Resolve an access decision for the current session.
pub async fn check(session: &Session, requirement: Requirement) -> Decision {
    let Some(current) = session.current() else {
        return Decision::RedirectSignIn;
    };

    let Requirement::Role(required) = requirement else {
        return Decision::Granted;
    };

    let plan_selected = match session.store().get_user(&current.user.uid).await {
        Ok(profile) => profile.plan_selected,
        // No profile document yet reads as "no plan selected".
        Err(StoreError::NotFound) => false,
        Err(e) => {
            tracing::warn!(uid = %current.user.uid, error = %e, "plan check failed");
            return Decision::RedirectSignIn;
        }
    };

    if plan_selected && current.role == required {
        Decision::Granted
    } else {
        Decision::RedirectPlanSelection(required)
    }
}
