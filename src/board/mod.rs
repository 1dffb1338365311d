//! Board module for Gotcha.
//!
//! This module provides the board hierarchy and its access control:
//! - Root boards, which carry every privilege relation
//! - Nested boards, attached beneath a root or another nested board
//! - The resolver that walks parent links up to the governing root
//! - Exact-membership privilege checks per operation

mod privilege;
mod resolver;
mod service;
mod types;

pub use privilege::{check_privilege, holds, BoardAction};
pub use resolver::{resolve_root, ResolvedRoot, DEFAULT_MAX_DEPTH};
pub use service::BoardService;
pub use types::{
    validate_description, validate_title, BaseBoard, Board, BoardPermission, NestedBoard,
    NestedRelation, PrivilegeType, Relation, MAX_DESCRIPTION_LENGTH, MAX_TITLE_LENGTH,
};
