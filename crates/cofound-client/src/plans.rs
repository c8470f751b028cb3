//! Plan selection: role-scoped catalogs and the single write that unlocks
//! role-gated views.

use cofound_shared::plans::{find_plan, plans_for_role, PlanTier};
use cofound_shared::types::Role;
use cofound_store::{AuthUser, Store};

use crate::error::{ClientError, Result};
use crate::notices::NoticeSink;

/// The purchasable tiers for a role, in catalog order.
pub fn catalog(role: Role) -> &'static [PlanTier] {
    plans_for_role(role)
}

/// Record the chosen plan on the user's profile and mark the plan as
/// selected, which is the flag the access guard reads. The plan must come
/// from the catalog of the role being purchased.
pub async fn select_plan(
    store: &Store,
    notices: &NoticeSink,
    user: &AuthUser,
    role: Role,
    plan_name: &str,
) -> Result<&'static PlanTier> {
    let Some(tier) = find_plan(role, plan_name) else {
        return Err(ClientError::Invalid(format!(
            "Unknown {role} plan: {plan_name}"
        )));
    };

    if let Err(e) = store.set_user_plan(&user.uid, tier.name).await {
        tracing::error!(error = %e, plan = tier.name, "plan selection failed");
        notices.error("Failed to save your plan. Please try again.");
        return Err(e.into());
    }
    Ok(tier)
}
