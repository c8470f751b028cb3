//! Subscription plan catalog for both account roles.
//!
//! The catalog is static data; selecting a plan is a store write performed
//! by the client crate. Post limits are enforced at posting time against
//! the plan name recorded on the user document.

use serde::{Deserialize, Serialize};

use crate::types::Role;

/// One purchasable tier.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PlanTier {
    pub name: &'static str,
    /// Monthly price in INR; 0 means the free tier.
    pub price_inr: u32,
    pub features: &'static [&'static str],
}

pub const JOINER_PLANS: &[PlanTier] = &[
    PlanTier {
        name: "Free Explorer",
        price_inr: 0,
        features: &[
            "View limited business ideas",
            "Basic profile visibility",
            "Message 1 founder/day",
        ],
    },
    PlanTier {
        name: "Pro Joiner",
        price_inr: 499,
        features: &[
            "Unlimited idea access",
            "Priority matchmaking",
            "Daily messages",
            "Skill badge boost",
        ],
    },
    PlanTier {
        name: "Elite Joiner",
        price_inr: 999,
        features: &[
            "All Pro features",
            "1-on-1 mentorship",
            "Exclusive startup invites",
            "AI skill match",
        ],
    },
];

pub const POSTER_PLANS: &[PlanTier] = &[
    PlanTier {
        name: "Starter Poster",
        price_inr: 0,
        features: &[
            "Post 1 business idea",
            "Basic visibility",
            "Receive 5 messages/month",
        ],
    },
    PlanTier {
        name: "Growth Poster",
        price_inr: 799,
        features: &[
            "Post up to 5 business ideas",
            "Priority visibility",
            "Unlimited messages",
            "Talent matching",
        ],
    },
    PlanTier {
        name: "Premium Poster",
        price_inr: 1499,
        features: &[
            "All Growth features",
            "Featured listings",
            "AI-powered matching",
            "Dedicated support",
        ],
    },
];

/// How many posts a plan permits.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PostLimit {
    Limited(u32),
    Unlimited,
}

impl PostLimit {
    /// Whether a user who already owns `existing` posts may create another.
    pub fn allows(&self, existing: u32) -> bool {
        match self {
            PostLimit::Limited(n) => existing < *n,
            PostLimit::Unlimited => true,
        }
    }
}

pub fn plans_for_role(role: Role) -> &'static [PlanTier] {
    match role {
        Role::Poster => POSTER_PLANS,
        Role::Joiner => JOINER_PLANS,
    }
}

/// Look up a tier by name within a role's catalog.
pub fn find_plan(role: Role, name: &str) -> Option<&'static PlanTier> {
    plans_for_role(role).iter().find(|p| p.name == name)
}

/// Post limit for a poster plan name.
///
/// Unknown or legacy plan names fall back to the Starter limit, so an
/// unrecognized plan can never unlock more posts than the free tier.
pub fn post_limit(plan_name: &str) -> PostLimit {
    match plan_name {
        "Starter Poster" => PostLimit::Limited(1),
        "Growth Poster" => PostLimit::Limited(5),
        "Premium Poster" => PostLimit::Unlimited,
        _ => PostLimit::Limited(1),
    }
}
