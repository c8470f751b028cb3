//! The idea directory: client-side search, filtering, and sorting over the
//! full post list, plus saved filters persisted through preferences.

use cofound_shared::constants::STAGE_ORDER;
use cofound_shared::types::{PostId, UserId};
use cofound_store::{Post, Store, StoreError};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Preference key holding a user's saved search filter.
pub const SAVED_SEARCH_KEY: &str = "searchFilters";

/// How directory results are ordered.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
    Alphabetical,
    /// Stage ladder order; posts with an unknown stage sort last.
    Stage,
}

/// A serializable search filter. Empty strings mean "no filter", matching
/// the saved-filter document this persists as.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchFilter {
    pub search_term: String,
    pub industry_filter: String,
    pub stage_filter: String,
    pub location_filter: String,
    pub budget_filter: String,
    pub show_remote_only: bool,
    pub sort_by: SortOrder,
}

impl SearchFilter {
    /// Filter and sort `posts`. Filtering is case-insensitive for the free
    /// text term and exact for the dropdown filters; sorting is stable, so
    /// ties keep the input order.
    pub fn apply<'a>(&self, posts: &'a [Post]) -> Vec<&'a Post> {
        let term = self.search_term.trim().to_lowercase();
        let mut results: Vec<&Post> = posts
            .iter()
            .filter(|post| {
                (term.is_empty() || matches_term(post, &term))
                    && equals_or_unset(&self.industry_filter, post.industry.as_deref())
                    && equals_or_unset(&self.stage_filter, post.stage.as_deref())
                    && equals_or_unset(&self.location_filter, post.location.as_deref())
                    && equals_or_unset(&self.budget_filter, post.budget.as_deref())
                    && (!self.show_remote_only || is_remote(post))
            })
            .collect();

        match self.sort_by {
            SortOrder::Newest => results.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            SortOrder::Oldest => results.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
            SortOrder::Alphabetical => {
                results.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
            }
            SortOrder::Stage => results.sort_by_key(|p| stage_rank(p.stage.as_deref())),
        }
        results
    }
}

fn matches_term(post: &Post, term: &str) -> bool {
    let hit = |field: Option<&str>| field.is_some_and(|s| s.to_lowercase().contains(term));
    post.name.to_lowercase().contains(term)
        || post.description.to_lowercase().contains(term)
        || hit(post.tagline.as_deref())
        || hit(post.skills_needed.as_deref())
        || hit(post.industry.as_deref())
}

fn equals_or_unset(filter: &str, value: Option<&str>) -> bool {
    filter.is_empty() || value == Some(filter)
}

fn is_remote(post: &Post) -> bool {
    post.is_remote
        || post
            .location
            .as_deref()
            .is_some_and(|l| l.to_lowercase().contains("remote"))
}

fn stage_rank(stage: Option<&str>) -> usize {
    stage
        .and_then(|s| STAGE_ORDER.iter().position(|known| *known == s))
        .unwrap_or(usize::MAX)
}

/// Dropdown option lists extracted from the current post set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions {
    pub industries: Vec<String>,
    pub stages: Vec<String>,
    pub locations: Vec<String>,
}

fn distinct(posts: &[Post], pick: fn(&Post) -> Option<&str>) -> Vec<String> {
    let mut values: Vec<String> = posts
        .iter()
        .filter_map(pick)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect();
    values.sort();
    values.dedup();
    values
}

/// Distinct, sorted filter options for the current post set.
pub fn filter_options(posts: &[Post]) -> FilterOptions {
    FilterOptions {
        industries: distinct(posts, |p| p.industry.as_deref()),
        stages: distinct(posts, |p| p.stage.as_deref()),
        locations: distinct(posts, |p| p.location.as_deref()),
    }
}

/// The directory view: a one-shot post fetch filtered locally, the way the
/// search page works. Call [`Directory::load`] again to re-query.
pub struct Directory {
    store: Store,
    posts: Vec<Post>,
    pub filter: SearchFilter,
}

impl Directory {
    pub fn new(store: Store) -> Self {
        Self {
            store,
            posts: Vec::new(),
            filter: SearchFilter::default(),
        }
    }

    /// Fetch the full post list, newest first.
    pub async fn load(&mut self) -> Result<()> {
        self.posts = self.store.list_posts().await?;
        Ok(())
    }

    pub fn results(&self) -> Vec<&Post> {
        self.filter.apply(&self.posts)
    }

    pub fn options(&self) -> FilterOptions {
        filter_options(&self.posts)
    }

    pub fn clear_filters(&mut self) {
        self.filter = SearchFilter::default();
    }

    /// Toggle the viewer's like on a post and refresh the cached copy.
    pub async fn toggle_like(&mut self, post_id: &PostId, user: &UserId) -> Result<Post> {
        let updated = self.store.toggle_like(post_id, user).await?;
        if let Some(slot) = self.posts.iter_mut().find(|p| p.id == updated.id) {
            *slot = updated.clone();
        }
        Ok(updated)
    }

    /// Persist the current filter for `user`.
    pub async fn save_filter(&self, user: &UserId) -> Result<()> {
        let value = serde_json::to_value(&self.filter).map_err(StoreError::Json)?;
        self.store
            .set_preference(user, SAVED_SEARCH_KEY, &value)
            .await?;
        Ok(())
    }

    /// Restore `user`'s saved filter; keeps the default when none is saved.
    pub async fn restore_filter(&mut self, user: &UserId) -> Result<()> {
        if let Some(value) = self.store.get_preference(user, SAVED_SEARCH_KEY).await? {
            self.filter = serde_json::from_value(value).map_err(StoreError::Json)?;
        }
        Ok(())
    }
}
