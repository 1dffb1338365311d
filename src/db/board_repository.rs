//! Board repository for Gotcha.
//!
//! SQL implementation of [`BoardStore`] on top of [`Database`]. Every
//! compound write runs inside one transaction.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Transaction;
use tracing::debug;
use uuid::Uuid;

use super::repository::insert_error;
use super::{Backend, Database};
use crate::board::{BaseBoard, NestedBoard, NestedRelation, PrivilegeType, Relation};
use crate::storage::{BoardStore, MISSING_RELATION_TARGET};
use crate::{GotchaError, Result};

/// Raw relation row; `access_type` is decoded into [`PrivilegeType`].
#[derive(Debug, sqlx::FromRow)]
struct RelationRow {
    id: Uuid,
    board_id: Uuid,
    user_id: Uuid,
    access_type: i32,
    description: String,
    created_at: DateTime<Utc>,
}

impl RelationRow {
    fn into_relation(self) -> Result<Relation> {
        Ok(Relation {
            id: self.id,
            board_id: self.board_id,
            user_id: self.user_id,
            description: self.description,
            privilege: PrivilegeType::try_from(self.access_type)?,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct NestedBoardRow {
    id: Uuid,
    title: String,
    created_at: DateTime<Utc>,
    parent_board_id: Uuid,
    relation_id: Uuid,
}

impl NestedBoardRow {
    fn into_nested_board(self) -> NestedBoard {
        NestedBoard {
            base: BaseBoard {
                id: self.id,
                title: self.title,
                created_at: self.created_at,
            },
            parent_id: self.parent_board_id,
            relation_id: self.relation_id,
        }
    }
}

const RELATION_COLUMNS: &str = "id, board_id, user_id, access_type, description, created_at";

fn into_relations(rows: Vec<RelationRow>) -> Result<Vec<Relation>> {
    rows.into_iter().map(RelationRow::into_relation).collect()
}

async fn insert_board(tx: &mut Transaction<'_, Backend>, board: &BaseBoard) -> Result<()> {
    sqlx::query("INSERT INTO boards (id, title, created_at) VALUES ($1, $2, $3)")
        .bind(board.id)
        .bind(&board.title)
        .bind(board.created_at)
        .execute(&mut **tx)
        .await
        .map_err(|e| GotchaError::Database(e.to_string()))?;
    Ok(())
}

async fn board_exists(tx: &mut Transaction<'_, Backend>, id: Uuid) -> Result<bool> {
    let found: Option<Uuid> = sqlx::query_scalar("SELECT id FROM boards WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| GotchaError::Database(e.to_string()))?;
    Ok(found.is_some())
}

/// `root` followed by every board beneath it.
async fn subtree(tx: &mut Transaction<'_, Backend>, root: Uuid) -> Result<Vec<Uuid>> {
    // UNION (not UNION ALL) so a corrupted cycle still terminates
    let descendants: Vec<Uuid> = sqlx::query_scalar(
        "WITH RECURSIVE subtree(id) AS (
             SELECT nested_board_id FROM board_to_board WHERE parent_board_id = $1
             UNION
             SELECT l.nested_board_id FROM board_to_board l
             JOIN subtree s ON l.parent_board_id = s.id
         )
         SELECT id FROM subtree",
    )
    .bind(root)
    .fetch_all(&mut **tx)
    .await
    .map_err(|e| GotchaError::Database(e.to_string()))?;

    let mut ids = Vec::with_capacity(descendants.len() + 1);
    ids.push(root);
    ids.extend(descendants.into_iter().filter(|id| *id != root));
    Ok(ids)
}

async fn remove_boards(tx: &mut Transaction<'_, Backend>, ids: &[Uuid]) -> Result<()> {
    for id in ids {
        sqlx::query("DELETE FROM user_to_board WHERE board_id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await
            .map_err(|e| GotchaError::Database(e.to_string()))?;
        sqlx::query("DELETE FROM board_to_board WHERE nested_board_id = $1 OR parent_board_id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await
            .map_err(|e| GotchaError::Database(e.to_string()))?;
        sqlx::query("DELETE FROM boards WHERE id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await
            .map_err(|e| GotchaError::Database(e.to_string()))?;
    }
    Ok(())
}

/// Take row locks on `ids` so no child can be linked under them until commit.
#[cfg(feature = "postgres")]
async fn lock_boards(tx: &mut Transaction<'_, Backend>, ids: &[Uuid]) -> Result<()> {
    sqlx::query("SELECT id FROM boards WHERE id = ANY($1) FOR UPDATE")
        .bind(ids)
        .fetch_all(&mut **tx)
        .await
        .map_err(|e| GotchaError::Database(e.to_string()))?;
    Ok(())
}

/// SQLite admits a single writer, so the write transaction already excludes
/// concurrent inserts.
#[cfg(feature = "sqlite")]
async fn lock_boards(_tx: &mut Transaction<'_, Backend>, _ids: &[Uuid]) -> Result<()> {
    Ok(())
}

/// Subtree of `root` with every member locked.
///
/// A child linked by a transaction that committed before its parent was
/// locked only shows up on the next read, so the subtree is read again until
/// it holds no unlocked board.
async fn locked_subtree(tx: &mut Transaction<'_, Backend>, root: Uuid) -> Result<Vec<Uuid>> {
    let mut locked: HashSet<Uuid> = HashSet::new();
    loop {
        let ids = subtree(tx, root).await?;
        let fresh: Vec<Uuid> = ids.iter().copied().filter(|id| !locked.contains(id)).collect();
        if fresh.is_empty() {
            return Ok(ids);
        }
        lock_boards(tx, &fresh).await?;
        locked.extend(fresh);
    }
}

impl Database {
    /// Delete `id` and its subtree in one transaction.
    async fn delete_board_tree(&self, id: Uuid) -> Result<bool> {
        let mut tx = self.pool().begin().await?;
        if !board_exists(&mut tx, id).await? {
            return Ok(false);
        }

        let ids = locked_subtree(&mut tx, id).await?;
        remove_boards(&mut tx, &ids).await?;
        tx.commit().await?;

        debug!(board_id = %id, removed = ids.len(), "Deleted board tree");
        Ok(true)
    }
}

#[async_trait]
impl BoardStore for Database {
    async fn insert_root_board(&self, board: &BaseBoard, author: &Relation) -> Result<()> {
        if author.board_id != board.id {
            return Err(GotchaError::NotFound(MISSING_RELATION_TARGET.to_string()));
        }

        let mut tx = self.pool().begin().await?;
        insert_board(&mut tx, board).await?;
        sqlx::query(
            "INSERT INTO user_to_board (id, board_id, user_id, access_type, description, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(author.id)
        .bind(author.board_id)
        .bind(author.user_id)
        .bind(author.privilege.as_i32())
        .bind(&author.description)
        .bind(author.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| insert_error(e, "relation", MISSING_RELATION_TARGET))?;
        tx.commit().await?;
        Ok(())
    }

    async fn insert_relation(&self, relation: &Relation) -> Result<()> {
        // Nested boards inherit their relations from the root
        let inserted = sqlx::query(
            "INSERT INTO user_to_board (id, board_id, user_id, access_type, description, created_at)
             SELECT $1, $2, $3, $4, $5, $6
             WHERE NOT EXISTS (SELECT 1 FROM board_to_board WHERE nested_board_id = $2)",
        )
        .bind(relation.id)
        .bind(relation.board_id)
        .bind(relation.user_id)
        .bind(relation.privilege.as_i32())
        .bind(&relation.description)
        .bind(relation.created_at)
        .execute(self.pool())
        .await
        .map_err(|e| insert_error(e, "relation", MISSING_RELATION_TARGET))?;

        if inserted.rows_affected() == 0 {
            return Err(GotchaError::NotFound(MISSING_RELATION_TARGET.to_string()));
        }
        Ok(())
    }

    async fn relation(&self, id: Uuid) -> Result<Option<Relation>> {
        let row: Option<RelationRow> = sqlx::query_as(&format!(
            "SELECT {RELATION_COLUMNS} FROM user_to_board WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| GotchaError::Database(e.to_string()))?;

        row.map(RelationRow::into_relation).transpose()
    }

    async fn relations_of_user(&self, user_id: Uuid) -> Result<Vec<Relation>> {
        let rows: Vec<RelationRow> = sqlx::query_as(&format!(
            "SELECT {RELATION_COLUMNS} FROM user_to_board
             WHERE user_id = $1 ORDER BY created_at, id"
        ))
        .bind(user_id)
        .fetch_all(self.pool())
        .await
        .map_err(|e| GotchaError::Database(e.to_string()))?;

        into_relations(rows)
    }

    async fn relations_of_board(&self, board_id: Uuid) -> Result<Vec<Relation>> {
        let rows: Vec<RelationRow> = sqlx::query_as(&format!(
            "SELECT {RELATION_COLUMNS} FROM user_to_board
             WHERE board_id = $1 ORDER BY created_at, id"
        ))
        .bind(board_id)
        .fetch_all(self.pool())
        .await
        .map_err(|e| GotchaError::Database(e.to_string()))?;

        into_relations(rows)
    }

    async fn delete_relation(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM user_to_board WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(|e| GotchaError::Database(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }

    async fn board(&self, id: Uuid) -> Result<Option<BaseBoard>> {
        let board = sqlx::query_as::<_, BaseBoard>(
            "SELECT id, title, created_at FROM boards WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| GotchaError::Database(e.to_string()))?;
        Ok(board)
    }

    async fn parent_link(&self, node_id: Uuid) -> Result<Option<NestedRelation>> {
        let link = sqlx::query_as::<_, NestedRelation>(
            "SELECT id, parent_board_id, nested_board_id
             FROM board_to_board WHERE nested_board_id = $1",
        )
        .bind(node_id)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| GotchaError::Database(e.to_string()))?;
        Ok(link)
    }

    async fn children_of(&self, parent_id: Uuid) -> Result<Vec<NestedBoard>> {
        let rows: Vec<NestedBoardRow> = sqlx::query_as(
            "SELECT b.id, b.title, b.created_at, l.parent_board_id, l.id AS relation_id
             FROM board_to_board l
             JOIN boards b ON b.id = l.nested_board_id
             WHERE l.parent_board_id = $1
             ORDER BY b.created_at, b.id",
        )
        .bind(parent_id)
        .fetch_all(self.pool())
        .await
        .map_err(|e| GotchaError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(NestedBoardRow::into_nested_board).collect())
    }

    async fn insert_nested_board(&self, board: &BaseBoard, link: &NestedRelation) -> Result<()> {
        if link.nested_board_id != board.id {
            return Err(GotchaError::NotFound("parent board".to_string()));
        }

        let mut tx = self.pool().begin().await?;
        insert_board(&mut tx, board).await?;
        sqlx::query(
            "INSERT INTO board_to_board (id, parent_board_id, nested_board_id)
             VALUES ($1, $2, $3)",
        )
        .bind(link.id)
        .bind(link.parent_board_id)
        .bind(link.nested_board_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| insert_error(e, "nested board", "parent board"))?;
        tx.commit().await?;
        Ok(())
    }

    async fn delete_root_board(&self, id: Uuid) -> Result<bool> {
        self.delete_board_tree(id).await
    }

    async fn delete_nested_board(&self, id: Uuid) -> Result<bool> {
        self.delete_board_tree(id).await
    }
}
