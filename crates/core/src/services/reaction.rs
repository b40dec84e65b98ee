//! Reaction service: per-visitor like/dislike reconciliation.

use std::sync::Arc;

use blog_common::{AppError, AppResult};
use blog_db::{
    entities::{post, post_reaction, post_reaction::Sentiment},
    repositories::{PostReactionRepository, PostRepository},
};
use sea_orm::{DatabaseConnection, TransactionTrait};
use serde::Serialize;
use tracing::{debug, info};

/// What a reaction request did to the visitor's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionAction {
    /// No previous reaction; one was recorded.
    Added,
    /// The same sentiment was requested again; the reaction was withdrawn.
    Removed,
    /// The opposite sentiment was requested; the reaction was switched.
    Changed,
}

/// A state transition for one (post, visitor) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReactionPlan {
    /// Reported action.
    pub action: ReactionAction,
    /// Visitor state after the transition.
    pub next: Option<Sentiment>,
    /// Change applied to `post.likes`.
    pub likes_delta: i32,
    /// Change applied to `post.dislikes`.
    pub dislikes_delta: i32,
}

/// Transition from `current` given the `requested` sentiment.
#[must_use]
pub const fn plan(current: Option<Sentiment>, requested: Sentiment) -> ReactionPlan {
    const fn delta(sentiment: Sentiment, sign: i32) -> (i32, i32) {
        match sentiment {
            Sentiment::Like => (sign, 0),
            Sentiment::Dislike => (0, sign),
        }
    }

    match current {
        None => {
            let (likes_delta, dislikes_delta) = delta(requested, 1);
            ReactionPlan {
                action: ReactionAction::Added,
                next: Some(requested),
                likes_delta,
                dislikes_delta,
            }
        }
        Some(existing) if existing.is_like() == requested.is_like() => {
            let (likes_delta, dislikes_delta) = delta(requested, -1);
            ReactionPlan {
                action: ReactionAction::Removed,
                next: None,
                likes_delta,
                dislikes_delta,
            }
        }
        Some(existing) => {
            let (old_likes, old_dislikes) = delta(existing, -1);
            let (new_likes, new_dislikes) = delta(requested, 1);
            ReactionPlan {
                action: ReactionAction::Changed,
                next: Some(requested),
                likes_delta: old_likes + new_likes,
                dislikes_delta: old_dislikes + new_dislikes,
            }
        }
    }
}

/// Result of a reaction request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReactionOutcome {
    /// What happened.
    pub action: ReactionAction,
    /// Post like count after the change.
    pub likes: i32,
    /// Post dislike count after the change.
    pub dislikes: i32,
    /// The visitor's reaction after the change.
    pub user_reaction: Option<Sentiment>,
}

/// Reaction service for business logic.
#[derive(Clone)]
pub struct ReactionService {
    db: Arc<DatabaseConnection>,
    reaction_repo: PostReactionRepository,
}

impl ReactionService {
    /// Create a new reaction service.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        let reaction_repo = PostReactionRepository::new(Arc::clone(&db));
        Self { db, reaction_repo }
    }

    /// Apply `requested` for the visitor at `ip_address` on a post.
    ///
    /// The post row stays locked for the whole transition, so concurrent
    /// requests on the same post are applied one after another. If another
    /// request inserted the visitor's reaction first, the transition is
    /// recomputed once against the stored row.
    pub async fn react(
        &self,
        post_id: i64,
        ip_address: &str,
        requested: Sentiment,
    ) -> AppResult<ReactionOutcome> {
        match self.try_react(post_id, ip_address, requested).await {
            Err(AppError::Conflict(reason)) => {
                debug!(post_id, ip = ip_address, %reason, "Reaction insert raced, retrying");
                self.try_react(post_id, ip_address, requested).await
            }
            other => other,
        }
    }

    async fn try_react(
        &self,
        post_id: i64,
        ip_address: &str,
        requested: Sentiment,
    ) -> AppResult<ReactionOutcome> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        PostRepository::find_by_id_for_update(&txn, post_id)
            .await?
            .ok_or(AppError::PostNotFound(post_id))?;

        let existing =
            PostReactionRepository::find_by_post_and_ip(&txn, post_id, ip_address).await?;
        let plan = plan(
            existing.as_ref().map(post_reaction::Model::sentiment),
            requested,
        );

        match (existing, plan.next) {
            (None, Some(sentiment)) => {
                PostReactionRepository::insert(&txn, post_id, ip_address, sentiment).await?;
            }
            (Some(row), Some(sentiment)) => {
                PostReactionRepository::set_sentiment(&txn, row.id, sentiment).await?;
            }
            (Some(row), None) => {
                PostReactionRepository::delete(&txn, row.id).await?;
            }
            (None, None) => {}
        }

        PostRepository::apply_reaction_delta(&txn, post_id, plan.likes_delta, plan.dislikes_delta)
            .await?;

        let post = PostRepository::find_by_id_in(&txn, post_id)
            .await?
            .ok_or(AppError::PostNotFound(post_id))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        info!(
            post_id,
            action = ?plan.action,
            likes = post.likes,
            dislikes = post.dislikes,
            "Reaction applied"
        );

        Ok(ReactionOutcome {
            action: plan.action,
            likes: post.likes,
            dislikes: post.dislikes,
            user_reaction: plan.next,
        })
    }

    /// The visitor's current reaction on a post.
    pub async fn current(
        &self,
        post_id: i64,
        ip_address: Option<&str>,
    ) -> AppResult<Option<Sentiment>> {
        match ip_address {
            Some(ip) => self.reaction_repo.sentiment_of(post_id, ip).await,
            None => Ok(None),
        }
    }

    /// Rebuild a post's like and dislike counters from its stored reactions.
    pub async fn recount(&self, post_id: i64) -> AppResult<post::Model> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        PostRepository::find_by_id_for_update(&txn, post_id)
            .await?
            .ok_or(AppError::PostNotFound(post_id))?;

        let (likes, dislikes) = PostReactionRepository::count_by_post(&txn, post_id).await?;
        PostRepository::set_reaction_counts(&txn, post_id, likes as i32, dislikes as i32).await?;

        let post = PostRepository::find_by_id_in(&txn, post_id)
            .await?
            .ok_or(AppError::PostNotFound(post_id))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        info!(post_id, likes, dislikes, "Reaction counters recounted");
        Ok(post)
    }

    /// Zero the engagement of the given posts and drop all their reactions.
    pub async fn reset_engagement(&self, post_ids: &[i64]) -> AppResult<u64> {
        if post_ids.is_empty() {
            return Ok(0);
        }

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let removed = PostReactionRepository::delete_by_posts(&txn, post_ids).await?;
        let updated = PostRepository::reset_engagement(&txn, post_ids).await?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        info!(posts = updated, reactions = removed, "Engagement reset");
        Ok(updated)
    }

    /// One page of stored reactions for the back office.
    pub async fn list(
        &self,
        post_id: Option<i64>,
        is_like: Option<bool>,
        offset: u64,
        limit: u64,
    ) -> AppResult<(Vec<post_reaction::Model>, u64)> {
        let rows = self
            .reaction_repo
            .find_page(post_id, is_like, offset, limit)
            .await?;
        let total = self.reaction_repo.count(post_id, is_like).await?;
        Ok((rows, total))
    }
}
