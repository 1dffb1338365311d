//! Gotcha - multi-tenant note boards
//!
//! Users register, sign in and own hierarchies of boards that can be nested
//! and shared with other users under read-only or read-write privileges.

pub mod auth;
pub mod board;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod storage;

pub use auth::{authenticate, register, Argon2Verifier, CredentialVerifier, RegistrationRequest};
pub use board::{
    Board, BoardPermission, BoardService, NestedBoard, NestedRelation, PrivilegeType, Relation,
};
pub use config::Config;
pub use db::{Database, NewUser, User};
pub use error::{GotchaError, Result};
pub use storage::{BoardStore, MemoryStorage, UserStore};
