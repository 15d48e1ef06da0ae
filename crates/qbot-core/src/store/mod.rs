//! Persistence port.
//!
//! Every method is one atomic unit. Implementations must enforce uniqueness of
//! (queue, user) and (queue, position) and report violations as
//! [`Conflict`](crate::errors::Conflict).

use async_trait::async_trait;

use crate::{
    domain::{ChatId, ChatInfo, Group, NewQueue, Queue, QueueId, User, UserId, UserInfo},
    swap::SwapResolution,
    Result,
};

pub mod memory;

pub use memory::InMemoryStore;

#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Get-or-create the user, updating name fields that drifted.
    async fn observe_user(&self, user: &UserInfo) -> Result<User>;

    /// Get-or-create the group, updating a drifted title and recording `member`.
    async fn observe_group(&self, chat: &ChatInfo, member: UserId) -> Result<Group>;

    async fn group(&self, id: ChatId) -> Result<Option<Group>>;

    async fn user(&self, id: UserId) -> Result<Option<User>>;

    /// Groups where `user` has been seen, ordered by title.
    async fn groups_of_user(&self, user: UserId) -> Result<Vec<Group>>;

    /// Queues of a group, ordered by creation.
    async fn queues_in_group(&self, group: ChatId) -> Result<Vec<Queue>>;

    /// Queue with its members sorted by position.
    async fn queue(&self, id: QueueId) -> Result<Option<Queue>>;

    /// Case-insensitive lookup by name inside a group.
    async fn queue_by_name(&self, group: ChatId, name: &str) -> Result<Option<Queue>>;

    async fn create_queue(&self, new: NewQueue) -> Result<Queue>;

    /// Returns `false` when the queue did not exist.
    async fn delete_queue(&self, id: QueueId) -> Result<bool>;

    /// Returns `false` when the queue did not exist.
    async fn set_dynamic(&self, id: QueueId, is_dynamic: bool) -> Result<bool>;

    /// Returns `false` when the queue did not exist.
    async fn add_member(&self, id: QueueId, user: UserId, position: u32) -> Result<bool>;

    /// Removed member's position, or `None` if they were not in the queue.
    async fn remove_member(&self, id: QueueId, user: UserId) -> Result<Option<u32>>;

    /// Exchange the positions of `requester` and `target` if the requester
    /// still holds `expected`. Nothing moves unless the result is
    /// [`SwapResolution::Swap`]. `None` when the queue does not exist.
    async fn swap_positions(
        &self,
        id: QueueId,
        requester: UserId,
        expected: u32,
        target: UserId,
    ) -> Result<Option<SwapResolution>>;

    /// Renumber members from `starting_at` consecutively. `true` if anything moved.
    async fn compress(&self, id: QueueId, starting_at: u32) -> Result<bool>;
}
