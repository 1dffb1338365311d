//! Store contracts for Gotcha.
//!
//! The board subsystem is written against these traits so the same
//! behaviour can be served by the SQL [`Database`](crate::db::Database) or
//! by [`MemoryStorage`].
//!
//! Referential rules every implementation must keep:
//! - inserting a relation whose board or user does not exist fails with
//!   `NotFound`, and so does linking a nested board under a missing parent;
//! - compound writes are all-or-nothing;
//! - deleting a board also deletes its relations, its parent link and every
//!   board beneath it.

mod memory;

pub use memory::MemoryStorage;

use async_trait::async_trait;
use uuid::Uuid;

use crate::board::{BaseBoard, NestedBoard, NestedRelation, Relation};
use crate::db::User;
use crate::Result;

/// Message carried by `NotFound` when a relation targets a missing row.
pub(crate) const MISSING_RELATION_TARGET: &str = "board or user";

/// Identity store.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persist a new user. Fails with `EntityDuplicate` if the username or
    /// email is already taken.
    async fn insert_user(&self, user: &User) -> Result<()>;

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>>;

    /// Look a user up by username or email.
    async fn find_user_by_sobriquet(&self, sobriquet: &str) -> Result<Option<User>>;

    /// Every user except `id`, oldest first.
    async fn list_users_except(&self, id: Uuid) -> Result<Vec<User>>;

    async fn count_users(&self) -> Result<i64>;
}

/// Board, relation and hierarchy store.
#[async_trait]
pub trait BoardStore: Send + Sync {
    /// Persist a root board together with its creator's relation.
    async fn insert_root_board(&self, board: &BaseBoard, author: &Relation) -> Result<()>;

    /// Append a relation. Multiple relations for the same (board, user) pair
    /// are allowed.
    ///
    /// Relations attach to root boards only. A board with a parent link is
    /// rejected with [`NotFound`](crate::GotchaError::NotFound), same as a
    /// missing board or user.
    async fn insert_relation(&self, relation: &Relation) -> Result<()>;

    async fn relation(&self, id: Uuid) -> Result<Option<Relation>>;

    /// Relations held by a user, oldest first.
    async fn relations_of_user(&self, user_id: Uuid) -> Result<Vec<Relation>>;

    /// Relations attached to a board, oldest first.
    async fn relations_of_board(&self, board_id: Uuid) -> Result<Vec<Relation>>;

    /// Remove one relation. Returns whether it existed.
    async fn delete_relation(&self, id: Uuid) -> Result<bool>;

    /// Look up any board, root or nested.
    async fn board(&self, id: Uuid) -> Result<Option<BaseBoard>>;

    /// The link attaching `node_id` to its parent, if it is nested.
    async fn parent_link(&self, node_id: Uuid) -> Result<Option<NestedRelation>>;

    /// Direct children of a board, oldest first.
    async fn children_of(&self, parent_id: Uuid) -> Result<Vec<NestedBoard>>;

    /// Persist a nested board together with its parent link.
    async fn insert_nested_board(&self, board: &BaseBoard, link: &NestedRelation) -> Result<()>;

    /// Delete a root board, its relations and its whole subtree.
    /// Returns whether the board existed.
    async fn delete_root_board(&self, id: Uuid) -> Result<bool>;

    /// Delete a nested board and everything beneath it.
    /// Returns whether the board existed.
    async fn delete_nested_board(&self, id: Uuid) -> Result<bool>;
}
