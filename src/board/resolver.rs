//! Board hierarchy resolver.
//!
//! Walks parent links from any node up to the root board that governs it.

use std::collections::HashSet;

use tracing::{trace, warn};
use uuid::Uuid;

use super::types::{Board, Relation};
use crate::storage::BoardStore;
use crate::{GotchaError, Result};

/// Default bound on the number of parent links between a node and its root.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Result of resolving a node to its root.
#[derive(Debug, Clone)]
pub struct ResolvedRoot {
    /// The root board with its relation IDs.
    pub board: Board,
    /// The root's relation records, oldest first.
    pub relations: Vec<Relation>,
    /// Number of parent links walked; 0 when the node is the root.
    pub depth: usize,
}

/// Resolve the root board governing `node_id`.
///
/// A node without a parent link is its own root. The walk is iterative and
/// stops with `Corrupted` if it revisits a node or exceeds `max_depth` links.
/// Fails with `NotFound` if the node (or the root it leads to) does not exist.
pub async fn resolve_root<S>(store: &S, node_id: Uuid, max_depth: usize) -> Result<ResolvedRoot>
where
    S: BoardStore + ?Sized,
{
    let mut current = node_id;
    let mut visited = HashSet::new();
    let mut depth = 0;

    while let Some(link) = store.parent_link(current).await? {
        if !visited.insert(current) {
            warn!(board_id = %node_id, "Cycle in board hierarchy");
            return Err(GotchaError::Corrupted(format!(
                "cycle in parent chain of board {node_id}"
            )));
        }
        depth += 1;
        if depth > max_depth {
            warn!(board_id = %node_id, max_depth, "Board hierarchy too deep");
            return Err(GotchaError::Corrupted(format!(
                "parent chain of board {node_id} exceeds {max_depth} links"
            )));
        }
        trace!(from = %current, to = %link.parent_board_id, "Following parent link");
        current = link.parent_board_id;
    }

    let base = store
        .board(current)
        .await?
        .ok_or_else(|| GotchaError::NotFound("board".to_string()))?;
    let relations = store.relations_of_board(current).await?;

    Ok(ResolvedRoot {
        board: Board {
            base,
            relations: relations.iter().map(|r| r.id).collect(),
        },
        relations,
        depth,
    })
}
