//! In-memory block list and group membership.
//!
//! Useful for tests and single-process development runs.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, GroupId, UserId};
use crate::ports::RelationshipChecker;

/// Blocks are stored as directed pairs `(blocker, blocked)`; queries are symmetric.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRelationshipStore {
    blocks: Arc<RwLock<HashSet<(UserId, UserId)>>>,
    groups: Arc<RwLock<HashMap<GroupId, HashSet<UserId>>>>,
}

impl InMemoryRelationshipStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn block(&self, blocker: UserId, blocked: UserId) {
        self.blocks.write().await.insert((blocker, blocked));
    }

    pub async fn unblock(&self, blocker: UserId, blocked: UserId) {
        self.blocks.write().await.remove(&(blocker, blocked));
    }

    pub async fn add_group_member(&self, group_id: GroupId, user_id: UserId) {
        self.groups
            .write()
            .await
            .entry(group_id)
            .or_default()
            .insert(user_id);
    }

    pub async fn is_member(&self, group_id: &GroupId, user_id: &UserId) -> bool {
        self.groups
            .read()
            .await
            .get(group_id)
            .is_some_and(|members| members.contains(user_id))
    }

    /// True when either user has blocked the other.
    pub async fn blocked_between(&self, a: &UserId, b: &UserId) -> bool {
        let blocks = self.blocks.read().await;
        blocks.contains(&(*a, *b)) || blocks.contains(&(*b, *a))
    }
}

#[async_trait]
impl RelationshipChecker for InMemoryRelationshipStore {
    async fn is_blocked(&self, a: &UserId, b: &UserId) -> Result<bool, DomainError> {
        Ok(self.blocked_between(a, b).await)
    }
}
