//! Board service for Gotcha.
//!
//! This module provides the board operations callers use: root and nested
//! board lifecycle plus privilege grants. Every operation that touches a
//! nested node first resolves its root and checks the caller's relations
//! there.

use tracing::{debug, info, warn};
use uuid::Uuid;

use super::privilege::{check_privilege, BoardAction};
use super::resolver::{resolve_root, ResolvedRoot, DEFAULT_MAX_DEPTH};
use super::types::{
    validate_description, validate_title, BaseBoard, Board, BoardPermission, NestedBoard,
    NestedRelation, PrivilegeType, Relation,
};
use crate::config::BoardsConfig;
use crate::db::User;
use crate::storage::BoardStore;
use crate::{GotchaError, Result};

/// Description attached to the creator's relation.
const AUTHOR_DESCRIPTION: &str = "author";

/// Service for board operations with privilege checking.
pub struct BoardService<'a, S: BoardStore + ?Sized> {
    store: &'a S,
    max_depth: usize,
}

impl<'a, S: BoardStore + ?Sized> BoardService<'a, S> {
    /// Create a new BoardService over the given store.
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Create a BoardService using the configured hierarchy bound.
    pub fn from_config(store: &'a S, config: &BoardsConfig) -> Self {
        Self::new(store).with_max_depth(config.max_depth)
    }

    /// Override the maximum hierarchy depth.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    async fn root_of(&self, node_id: Uuid) -> Result<ResolvedRoot> {
        resolve_root(self.store, node_id, self.max_depth).await
    }

    /// Create a root board owned by `user`.
    ///
    /// The board is stored together with a single `Author` relation for the
    /// caller.
    pub async fn new_root_board(&self, user: &User, title: &str) -> Result<Board> {
        validate_title(title)?;

        let base = BaseBoard::new(title);
        let author = Relation::new(base.id, user.id, AUTHOR_DESCRIPTION, PrivilegeType::Author);
        self.store.insert_root_board(&base, &author).await?;

        info!(board_id = %base.id, user_id = %user.id, "Root board created");
        Ok(Board {
            base,
            relations: vec![author.id],
        })
    }

    /// List every root board `user` holds a relation on.
    ///
    /// Boards come in the order of the user's oldest relation on each, and
    /// carry only that user's relation IDs.
    pub async fn root_boards_of_user(&self, user: &User) -> Result<Vec<Board>> {
        let relations = self.store.relations_of_user(user.id).await?;

        let mut grouped: Vec<(Uuid, Vec<Uuid>)> = Vec::new();
        for rel in relations {
            match grouped.iter_mut().find(|(board_id, _)| *board_id == rel.board_id) {
                Some((_, ids)) => ids.push(rel.id),
                None => grouped.push((rel.board_id, vec![rel.id])),
            }
        }

        let mut boards = Vec::with_capacity(grouped.len());
        for (board_id, relations) in grouped {
            match self.store.board(board_id).await? {
                Some(base) => boards.push(Board { base, relations }),
                // Deleted between the two reads
                None => debug!(board_id = %board_id, "Skipping vanished board"),
            }
        }
        Ok(boards)
    }

    /// Resolve a relation to the permission it grants.
    pub async fn privilege_of(&self, relation_id: Uuid) -> Result<BoardPermission> {
        self.store
            .relation(relation_id)
            .await?
            .map(|r| r.permission())
            .ok_or_else(|| GotchaError::NotFound("relation".to_string()))
    }

    /// Get a root board with all of its relation IDs.
    ///
    /// Nested boards are not root boards and yield `NotFound`.
    pub async fn board_info(&self, board_id: Uuid) -> Result<Board> {
        if self.store.parent_link(board_id).await?.is_some() {
            return Err(GotchaError::NotFound("board".to_string()));
        }
        let base = self
            .store
            .board(board_id)
            .await?
            .ok_or_else(|| GotchaError::NotFound("board".to_string()))?;
        let relations = self.store.relations_of_board(board_id).await?;

        Ok(Board {
            base,
            relations: relations.into_iter().map(|r| r.id).collect(),
        })
    }

    /// Find the root board governing any node.
    pub async fn resolve_root(&self, node_id: Uuid) -> Result<Board> {
        Ok(self.root_of(node_id).await?.board)
    }

    /// Delete a root board, proving ownership with `claimed` relation IDs.
    ///
    /// Every claimed relation must exist, reference `board_id` and belong to
    /// `user`, and at least one of them must be `Author`. Anything else is a
    /// `Security` error that does not say which check failed. On success the
    /// board, all of its relations and every nested board beneath it are
    /// removed.
    pub async fn delete_root_board(
        &self,
        board_id: Uuid,
        claimed: &[Uuid],
        user: &User,
    ) -> Result<()> {
        let mut is_author = false;
        for relation_id in claimed {
            let Some(rel) = self.store.relation(*relation_id).await? else {
                warn!(board_id = %board_id, user_id = %user.id, "Claimed relation does not exist");
                return Err(GotchaError::Security);
            };
            if rel.board_id != board_id || rel.user_id != user.id {
                warn!(board_id = %board_id, user_id = %user.id, "Claimed relation does not match");
                return Err(GotchaError::Security);
            }
            is_author |= BoardAction::DeleteRoot.permits(rel.privilege);
        }

        if !is_author {
            return Err(GotchaError::Security);
        }

        if !self.store.delete_root_board(board_id).await? {
            return Err(GotchaError::NotFound("board".to_string()));
        }

        info!(board_id = %board_id, user_id = %user.id, "Root board deleted");
        Ok(())
    }

    /// Attach a new board beneath `parent_id`.
    ///
    /// Requires `Author` or `ReadWrite` on the resolved root. The new node may
    /// not sit more than the configured depth below its root.
    pub async fn new_nested_board(
        &self,
        parent_id: Uuid,
        title: &str,
        user: &User,
    ) -> Result<NestedBoard> {
        validate_title(title)?;

        let root = self.root_of(parent_id).await?;
        check_privilege(&root.relations, user.id, BoardAction::CreateNested)?;

        if root.depth + 1 > self.max_depth {
            return Err(GotchaError::Validation(format!(
                "boards cannot be nested more than {} levels deep",
                self.max_depth
            )));
        }

        let base = BaseBoard::new(title);
        let link = NestedRelation::new(parent_id, base.id);
        self.store.insert_nested_board(&base, &link).await?;

        info!(
            board_id = %base.id,
            parent_id = %parent_id,
            root_id = %root.board.id(),
            "Nested board created"
        );
        Ok(NestedBoard {
            base,
            parent_id,
            relation_id: link.id,
        })
    }

    /// List the direct children of `board_id`.
    ///
    /// Any relation on the resolved root is enough. Only one level is
    /// listed, not the whole subtree.
    pub async fn nested_boards_of(&self, board_id: Uuid, user: &User) -> Result<Vec<NestedBoard>> {
        let root = self.root_of(board_id).await?;
        check_privilege(&root.relations, user.id, BoardAction::ListNested)?;

        self.store.children_of(board_id).await
    }

    /// Delete a nested board and everything beneath it.
    ///
    /// Requires `Author` or `ReadWrite` on the resolved root. Root boards are
    /// not nested and yield `NotFound`; they go through
    /// [`delete_root_board`](Self::delete_root_board).
    pub async fn delete_nested_board(&self, node_id: Uuid, user: &User) -> Result<()> {
        if self.store.parent_link(node_id).await?.is_none() {
            return Err(GotchaError::NotFound("nested board".to_string()));
        }

        let root = self.root_of(node_id).await?;
        check_privilege(&root.relations, user.id, BoardAction::DeleteNested)?;

        if !self.store.delete_nested_board(node_id).await? {
            return Err(GotchaError::NotFound("nested board".to_string()));
        }

        info!(board_id = %node_id, user_id = %user.id, "Nested board deleted");
        Ok(())
    }

    /// Grant `grantee_id` a privilege on the root governing `board_id`.
    ///
    /// Only an `Author` of that root may grant. `Author` itself cannot be
    /// granted.
    pub async fn grant_relation(
        &self,
        board_id: Uuid,
        grantor: &User,
        grantee_id: Uuid,
        description: &str,
        privilege: PrivilegeType,
    ) -> Result<Relation> {
        if privilege == PrivilegeType::Author {
            return Err(GotchaError::Validation(
                "author privilege cannot be granted".to_string(),
            ));
        }
        validate_description(description)?;

        let root = self.root_of(board_id).await?;
        check_privilege(&root.relations, grantor.id, BoardAction::Grant)?;

        let relation = Relation::new(root.board.id(), grantee_id, description, privilege);
        self.store.insert_relation(&relation).await?;

        info!(
            relation_id = %relation.id,
            board_id = %relation.board_id,
            grantee_id = %grantee_id,
            privilege = %privilege,
            "Relation granted"
        );
        Ok(relation)
    }

    /// Revoke a relation.
    ///
    /// Only an `Author` of the relation's board may revoke, and `Author`
    /// relations themselves cannot be revoked.
    pub async fn revoke_relation(&self, relation_id: Uuid, user: &User) -> Result<()> {
        let relation = self
            .store
            .relation(relation_id)
            .await?
            .ok_or_else(|| GotchaError::NotFound("relation".to_string()))?;

        let relations = self.store.relations_of_board(relation.board_id).await?;
        check_privilege(&relations, user.id, BoardAction::Revoke)?;

        if relation.privilege == PrivilegeType::Author {
            return Err(GotchaError::Validation(
                "author relation cannot be revoked".to_string(),
            ));
        }

        if !self.store.delete_relation(relation_id).await? {
            return Err(GotchaError::NotFound("relation".to_string()));
        }

        info!(relation_id = %relation_id, user_id = %user.id, "Relation revoked");
        Ok(())
    }
}
