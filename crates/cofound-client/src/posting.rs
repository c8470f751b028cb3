//! Posting flow: draft validation, plan-limit enforcement, and the
//! recent-ideas panel.

use cofound_shared::constants::RECENT_POSTS_LIMIT;
use cofound_shared::plans::{post_limit, PostLimit};
use cofound_store::{AuthUser, NewPost, Post, Store, StoreError};

use crate::error::{ClientError, Result};
use crate::notices::NoticeSink;

/// Form state for a new business idea. Empty strings mean "not provided";
/// they become `None` on the stored post.
#[derive(Debug, Clone, Default)]
pub struct PostDraft {
    pub name: String,
    pub tagline: String,
    pub description: String,
    pub industry: String,
    pub stage: String,
    pub skills_needed: String,
    pub location: String,
    pub budget: String,
    pub timeline: String,
    pub team_size: String,
    pub is_remote: bool,
    pub experience: String,
    pub equity: String,
}

impl PostDraft {
    /// Check the required fields, reporting the first problem as a notice.
    fn validate(&self, notices: &NoticeSink) -> Result<()> {
        let problem = if self.name.trim().is_empty() {
            Some("Business name is required")
        } else if self.description.trim().is_empty() {
            Some("Business description is required")
        } else if self.description.trim().chars().count() < 20 {
            Some("Business description should be at least 20 characters")
        } else {
            None
        };
        match problem {
            Some(message) => {
                notices.error(message);
                Err(ClientError::Invalid(message.to_string()))
            }
            None => Ok(()),
        }
    }

    fn into_new_post(self, user: &AuthUser, plan: Option<&str>) -> NewPost {
        fn opt(s: String) -> Option<String> {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }

        NewPost {
            uid: user.uid.clone(),
            email: user.email.clone(),
            posted_by: Some(user.sender_name()),
            name: self.name.trim().to_string(),
            tagline: opt(self.tagline),
            description: self.description.trim().to_string(),
            industry: opt(self.industry),
            stage: opt(self.stage),
            skills_needed: opt(self.skills_needed),
            location: opt(self.location),
            budget: opt(self.budget),
            timeline: opt(self.timeline),
            team_size: opt(self.team_size),
            is_remote: self.is_remote,
            experience: opt(self.experience),
            equity: opt(self.equity),
            plan_used: plan.map(str::to_string),
        }
    }
}

/// Publish a draft as a post owned by `user`, enforcing the plan limit
/// against the owner's existing post count. A missing profile or unset
/// plan falls back to the free-tier limit.
pub async fn create_post(
    store: &Store,
    notices: &NoticeSink,
    user: &AuthUser,
    draft: PostDraft,
) -> Result<Post> {
    draft.validate(notices)?;

    let plan = match store.get_user(&user.uid).await {
        Ok(profile) => profile.plan.unwrap_or_default(),
        Err(StoreError::NotFound) => String::new(),
        Err(e) => return Err(e.into()),
    };

    let existing = store.count_posts_by_owner(&user.uid).await?;
    if let PostLimit::Limited(limit) = post_limit(&plan) {
        if existing >= limit {
            let plan_name = if plan.is_empty() {
                "Starter Poster".to_string()
            } else {
                plan.clone()
            };
            notices.warning(format!(
                "Post limit reached for {plan_name} plan. Please upgrade to post more ideas."
            ));
            return Err(ClientError::PostLimitReached {
                plan: plan_name,
                limit,
            });
        }
    }

    let plan_used = (!plan.is_empty()).then_some(plan.as_str());
    match store.create_post(&draft.into_new_post(user, plan_used)).await {
        Ok(post) => {
            notices.success(
                "Business idea posted successfully! \
                 You can now connect with potential collaborators.",
            );
            Ok(post)
        }
        Err(e) => {
            tracing::error!(error = %e, "post creation failed");
            notices.error("Failed to post business idea. Please try again.");
            Err(e.into())
        }
    }
}

/// The inspiration panel: the newest posts across all users.
pub async fn recent_posts(store: &Store) -> Result<Vec<Post>> {
    Ok(store.recent_posts(RECENT_POSTS_LIMIT).await?)
}

#[cfg(test)]
mod tests {
    use cofound_shared::types::{Role, UserId};

    use crate::notices::NoticeLevel;

    use super::*;

    async fn poster(store: &Store, plan: Option<&str>) -> AuthUser {
        let user = AuthUser {
            uid: UserId::new(),
            email: "founder@example.com".into(),
            display_name: Some("Founder".into()),
        };
        store
            .create_user_profile(&user.uid, &user.email, Some("Founder"), Role::Poster)
            .await
            .unwrap();
        if let Some(plan) = plan {
            store.set_user_plan(&user.uid, plan).await.unwrap();
        }
        user
    }

    fn valid_draft(name: &str) -> PostDraft {
        PostDraft {
            name: name.into(),
            description: "A marketplace connecting founders with builders".into(),
            ..PostDraft::default()
        }
    }

    #[tokio::test]
    async fn drafts_missing_required_fields_are_refused() {
        let store = Store::open_in_memory().unwrap();
        let notices = NoticeSink::default();
        let user = poster(&store, Some("Starter Poster")).await;

        let no_name = PostDraft {
            description: "Long enough description for the form".into(),
            ..PostDraft::default()
        };
        let err = create_post(&store, &notices, &user, no_name)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Invalid(_)));
        assert_eq!(notices.drain()[0].message, "Business name is required");

        let short_description = PostDraft {
            name: "Shorty".into(),
            description: "Too short".into(),
            ..PostDraft::default()
        };
        let err = create_post(&store, &notices, &user, short_description)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Invalid(_)));
        assert_eq!(
            notices.drain()[0].message,
            "Business description should be at least 20 characters"
        );

        assert_eq!(store.count_posts_by_owner(&user.uid).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn the_plan_limit_refuses_the_next_post_without_writing() {
        let store = Store::open_in_memory().unwrap();
        let notices = NoticeSink::default();
        let user = poster(&store, Some("Starter Poster")).await;

        create_post(&store, &notices, &user, valid_draft("First"))
            .await
            .unwrap();
        let sent = notices.drain();
        assert_eq!(sent[0].level, NoticeLevel::Success);

        let err = create_post(&store, &notices, &user, valid_draft("Second"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::PostLimitReached { limit: 1, .. }
        ));
        let sent = notices.drain();
        assert_eq!(sent[0].level, NoticeLevel::Warning);
        assert!(sent[0].message.contains("Starter Poster"));

        assert_eq!(store.count_posts_by_owner(&user.uid).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn an_unset_plan_falls_back_to_the_free_limit() {
        let store = Store::open_in_memory().unwrap();
        let notices = NoticeSink::default();
        let user = poster(&store, None).await;

        create_post(&store, &notices, &user, valid_draft("Only"))
            .await
            .unwrap();
        let err = create_post(&store, &notices, &user, valid_draft("Extra"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::PostLimitReached { .. }));
        assert!(notices
            .drain()
            .iter()
            .any(|n| n.message.contains("Starter Poster")));
    }

    #[tokio::test]
    async fn drafts_are_trimmed_and_stamped_with_owner_identity() {
        let store = Store::open_in_memory().unwrap();
        let notices = NoticeSink::default();
        let user = poster(&store, Some("Growth Poster")).await;

        let draft = PostDraft {
            name: "  Solar Kits  ".into(),
            tagline: "  Affordable energy  ".into(),
            description: "Prefabricated solar kits for rural households".into(),
            industry: "   ".into(),
            ..PostDraft::default()
        };
        let post = create_post(&store, &notices, &user, draft).await.unwrap();

        assert_eq!(post.name, "Solar Kits");
        assert_eq!(post.tagline.as_deref(), Some("Affordable energy"));
        assert_eq!(post.industry, None, "blank fields are dropped");
        assert_eq!(post.posted_by.as_deref(), Some("Founder"));
        assert_eq!(post.email, user.email);
        assert_eq!(post.plan_used.as_deref(), Some("Growth Poster"));
        assert_eq!(post.status, "active");
    }

    #[tokio::test]
    async fn recent_posts_returns_the_newest_three() {
        let store = Store::open_in_memory().unwrap();
        let notices = NoticeSink::default();
        let user = poster(&store, Some("Premium Poster")).await;

        for name in ["One", "Two", "Three", "Four"] {
            create_post(&store, &notices, &user, valid_draft(name))
                .await
                .unwrap();
        }

        let recent = recent_posts(&store).await.unwrap();
        let names: Vec<&str> = recent.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Four", "Three", "Two"]);
    }
}
