//! # Group Item Service
//!
//! Read side for the kitchen: what is waiting, what is being prepared, what
//! belongs to a given order. State changes go through the item service.

use uuid::Uuid;

use comanda_core::{CoreResult, GroupItem, GroupItemStatus, RequestContext};

use crate::Repositories;

#[derive(Debug, Clone)]
pub struct GroupItemService {
    repos: Repositories,
}

impl GroupItemService {
    pub fn new(repos: Repositories) -> Self {
        GroupItemService { repos }
    }

    /// A group with its items.
    pub async fn get_group(&self, ctx: &RequestContext, group_id: Uuid) -> CoreResult<GroupItem> {
        self.repos.groups.get_group_by_id(ctx, group_id, true).await
    }

    /// The kitchen queue: groups in any of `statuses`, oldest first.
    pub async fn groups_by_status(
        &self,
        ctx: &RequestContext,
        statuses: &[GroupItemStatus],
    ) -> CoreResult<Vec<GroupItem>> {
        self.repos.groups.get_groups_by_status(ctx, statuses).await
    }

    /// Groups of one order, optionally narrowed to `statuses`.
    pub async fn groups_by_order(
        &self,
        ctx: &RequestContext,
        order_id: Uuid,
        statuses: Option<&[GroupItemStatus]>,
    ) -> CoreResult<Vec<GroupItem>> {
        match statuses {
            Some(statuses) => {
                self.repos
                    .groups
                    .get_groups_by_order_id_and_status(ctx, order_id, statuses)
                    .await
            }
            None => self.repos.groups.get_groups_by_order_id(ctx, order_id).await,
        }
    }
}
