//! Privilege checks for board operations.
//!
//! Every action names the exact set of privileges that allow it. A caller is
//! allowed if any relation they hold on the resolved root is in that set.

use uuid::Uuid;

use super::types::{PrivilegeType, Relation};
use crate::{GotchaError, Result};

/// Operations gated by a privilege on the root board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardAction {
    /// List the direct children of a node.
    ListNested,
    /// Attach a new nested board.
    CreateNested,
    /// Delete a nested board.
    DeleteNested,
    /// Grant another user a relation on the root.
    Grant,
    /// Revoke a relation on the root.
    Revoke,
    /// Delete the root board itself.
    DeleteRoot,
}

impl BoardAction {
    /// The privileges that allow this action.
    pub fn allowed(&self) -> &'static [PrivilegeType] {
        use PrivilegeType::*;

        match self {
            BoardAction::ListNested => &[Author, ReadWrite, ReadOnly],
            BoardAction::CreateNested | BoardAction::DeleteNested => &[Author, ReadWrite],
            BoardAction::Grant | BoardAction::Revoke | BoardAction::DeleteRoot => &[Author],
        }
    }

    /// Whether `privilege` allows this action.
    pub fn permits(&self, privilege: PrivilegeType) -> bool {
        self.allowed().contains(&privilege)
    }
}

/// Whether `user_id` holds a relation that allows `action`.
pub fn holds(relations: &[Relation], user_id: Uuid, action: BoardAction) -> bool {
    relations
        .iter()
        .any(|r| r.user_id == user_id && action.permits(r.privilege))
}

/// Require that `user_id` holds a relation that allows `action`.
///
/// Fails with `Security` otherwise.
pub fn check_privilege(relations: &[Relation], user_id: Uuid, action: BoardAction) -> Result<()> {
    if holds(relations, user_id, action) {
        Ok(())
    } else {
        Err(GotchaError::Security)
    }
}
