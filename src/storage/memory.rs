//! In-memory store for tests and embedding.

use std::collections::{HashMap, HashSet, VecDeque};

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{BoardStore, UserStore, MISSING_RELATION_TARGET};
use crate::board::{BaseBoard, NestedBoard, NestedRelation, Relation};
use crate::db::User;
use crate::{GotchaError, Result};

#[derive(Debug, Default)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    boards: HashMap<Uuid, BaseBoard>,
    relations: HashMap<Uuid, Relation>,
    /// Parent links keyed by nested board ID.
    links: HashMap<Uuid, NestedRelation>,
}

impl MemoryState {
    /// `root` and every board beneath it.
    fn subtree(&self, root: Uuid) -> Vec<Uuid> {
        let mut seen = HashSet::from([root]);
        let mut order = vec![root];
        let mut queue = VecDeque::from([root]);

        while let Some(parent) = queue.pop_front() {
            for link in self.links.values() {
                if link.parent_board_id == parent && seen.insert(link.nested_board_id) {
                    order.push(link.nested_board_id);
                    queue.push_back(link.nested_board_id);
                }
            }
        }
        order
    }

    fn remove_boards(&mut self, ids: &[Uuid]) {
        for id in ids {
            self.relations.retain(|_, r| r.board_id != *id);
            self.links
                .retain(|_, l| l.nested_board_id != *id && l.parent_board_id != *id);
            self.boards.remove(id);
        }
    }

    fn sorted_relations<F>(&self, filter: F) -> Vec<Relation>
    where
        F: Fn(&Relation) -> bool,
    {
        let mut relations: Vec<Relation> = self
            .relations
            .values()
            .filter(|r| filter(*r))
            .cloned()
            .collect();
        relations.sort_by_key(|r| (r.created_at, r.id));
        relations
    }
}

/// Store that keeps everything in process memory.
///
/// All access is serialized through one mutex, so each call observes and
/// leaves a consistent state.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    state: Mutex<MemoryState>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStorage {
    async fn insert_user(&self, user: &User) -> Result<()> {
        let mut state = self.state.lock().await;
        let taken = state
            .users
            .values()
            .any(|u| u.id == user.id || u.username == user.username || u.email == user.email);
        if taken {
            return Err(GotchaError::EntityDuplicate("user".to_string()));
        }
        state.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.state.lock().await.users.get(&id).cloned())
    }

    async fn find_user_by_sobriquet(&self, sobriquet: &str) -> Result<Option<User>> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .values()
            .find(|u| u.username == sobriquet || u.email == sobriquet)
            .cloned())
    }

    async fn list_users_except(&self, id: Uuid) -> Result<Vec<User>> {
        let state = self.state.lock().await;
        let mut users: Vec<User> = state
            .users
            .values()
            .filter(|u| u.id != id)
            .cloned()
            .collect();
        users.sort_by_key(|u| (u.created_at, u.id));
        Ok(users)
    }

    async fn count_users(&self) -> Result<i64> {
        Ok(self.state.lock().await.users.len() as i64)
    }
}

#[async_trait]
impl BoardStore for MemoryStorage {
    async fn insert_root_board(&self, board: &BaseBoard, author: &Relation) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.boards.contains_key(&board.id) {
            return Err(GotchaError::Database(format!("duplicate board id {}", board.id)));
        }
        if author.board_id != board.id || !state.users.contains_key(&author.user_id) {
            return Err(GotchaError::NotFound(MISSING_RELATION_TARGET.to_string()));
        }
        state.boards.insert(board.id, board.clone());
        state.relations.insert(author.id, author.clone());
        Ok(())
    }

    async fn insert_relation(&self, relation: &Relation) -> Result<()> {
        let mut state = self.state.lock().await;
        if !state.boards.contains_key(&relation.board_id)
            || !state.users.contains_key(&relation.user_id)
            || state.links.contains_key(&relation.board_id)
        {
            return Err(GotchaError::NotFound(MISSING_RELATION_TARGET.to_string()));
        }
        state.relations.insert(relation.id, relation.clone());
        Ok(())
    }

    async fn relation(&self, id: Uuid) -> Result<Option<Relation>> {
        Ok(self.state.lock().await.relations.get(&id).cloned())
    }

    async fn relations_of_user(&self, user_id: Uuid) -> Result<Vec<Relation>> {
        let state = self.state.lock().await;
        Ok(state.sorted_relations(|r| r.user_id == user_id))
    }

    async fn relations_of_board(&self, board_id: Uuid) -> Result<Vec<Relation>> {
        let state = self.state.lock().await;
        Ok(state.sorted_relations(|r| r.board_id == board_id))
    }

    async fn delete_relation(&self, id: Uuid) -> Result<bool> {
        Ok(self.state.lock().await.relations.remove(&id).is_some())
    }

    async fn board(&self, id: Uuid) -> Result<Option<BaseBoard>> {
        Ok(self.state.lock().await.boards.get(&id).cloned())
    }

    async fn parent_link(&self, node_id: Uuid) -> Result<Option<NestedRelation>> {
        Ok(self.state.lock().await.links.get(&node_id).cloned())
    }

    async fn children_of(&self, parent_id: Uuid) -> Result<Vec<NestedBoard>> {
        let state = self.state.lock().await;
        let mut children: Vec<NestedBoard> = state
            .links
            .values()
            .filter(|l| l.parent_board_id == parent_id)
            .filter_map(|l| {
                state.boards.get(&l.nested_board_id).map(|b| NestedBoard {
                    base: b.clone(),
                    parent_id: l.parent_board_id,
                    relation_id: l.id,
                })
            })
            .collect();
        children.sort_by_key(|c| (c.base.created_at, c.base.id));
        Ok(children)
    }

    async fn insert_nested_board(&self, board: &BaseBoard, link: &NestedRelation) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.boards.contains_key(&board.id) {
            return Err(GotchaError::Database(format!("duplicate board id {}", board.id)));
        }
        if link.nested_board_id != board.id || !state.boards.contains_key(&link.parent_board_id) {
            return Err(GotchaError::NotFound("parent board".to_string()));
        }
        state.boards.insert(board.id, board.clone());
        state.links.insert(board.id, link.clone());
        Ok(())
    }

    async fn delete_root_board(&self, id: Uuid) -> Result<bool> {
        let mut state = self.state.lock().await;
        if !state.boards.contains_key(&id) {
            return Ok(false);
        }
        let subtree = state.subtree(id);
        state.remove_boards(&subtree);
        Ok(true)
    }

    async fn delete_nested_board(&self, id: Uuid) -> Result<bool> {
        let mut state = self.state.lock().await;
        if !state.boards.contains_key(&id) {
            return Ok(false);
        }
        let subtree = state.subtree(id);
        state.remove_boards(&subtree);
        Ok(true)
    }
}
