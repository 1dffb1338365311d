//! Board model for Gotcha.
//!
//! This module defines root boards, nested boards, privilege relations and
//! the parent links that form the board hierarchy.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::db::now;
use crate::{GotchaError, Result};

/// Maximum board title length in characters.
pub const MAX_TITLE_LENGTH: usize = 255;

/// Maximum relation description length in characters.
pub const MAX_DESCRIPTION_LENGTH: usize = 255;

/// Privilege a relation grants on a root board.
///
/// The variants carry no ordering: `Author` is not "more" than `ReadWrite`.
/// Checks are membership tests against the set an action requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PrivilegeType {
    /// Creator of the board; full control. Only issued at root creation.
    Author,
    /// May list nested boards.
    ReadOnly,
    /// May list, create and delete nested boards.
    ReadWrite,
}

impl PrivilegeType {
    /// Stored integer representation.
    pub fn as_i32(&self) -> i32 {
        match self {
            PrivilegeType::Author => 1,
            PrivilegeType::ReadOnly => 2,
            PrivilegeType::ReadWrite => 3,
        }
    }

    /// Parse the stored integer representation.
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            1 => Some(PrivilegeType::Author),
            2 => Some(PrivilegeType::ReadOnly),
            3 => Some(PrivilegeType::ReadWrite),
            _ => None,
        }
    }

    /// Name used in logs and serialized output.
    pub fn as_str(&self) -> &'static str {
        match self {
            PrivilegeType::Author => "author",
            PrivilegeType::ReadOnly => "read_only",
            PrivilegeType::ReadWrite => "read_write",
        }
    }
}

impl fmt::Display for PrivilegeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PrivilegeType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "author" => Ok(PrivilegeType::Author),
            "read_only" | "readonly" => Ok(PrivilegeType::ReadOnly),
            "read_write" | "readwrite" => Ok(PrivilegeType::ReadWrite),
            _ => Err(format!("unknown privilege: {s}")),
        }
    }
}

impl TryFrom<i32> for PrivilegeType {
    type Error = GotchaError;

    fn try_from(value: i32) -> Result<Self> {
        PrivilegeType::from_i32(value)
            .ok_or_else(|| GotchaError::Corrupted(format!("unknown access type {value}")))
    }
}

/// Fields shared by root and nested boards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct BaseBoard {
    /// Unique board ID.
    pub id: Uuid,
    /// Board title.
    pub title: String,
    /// Board creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl BaseBoard {
    /// Create a board with a fresh identity. The title is not validated here.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            created_at: now(),
        }
    }
}

/// A root board together with the relations that grant access to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Board {
    #[serde(flatten)]
    pub base: BaseBoard,
    /// Relation IDs, oldest first.
    pub relations: Vec<Uuid>,
}

impl Board {
    pub fn id(&self) -> Uuid {
        self.base.id
    }
}

/// A board attached beneath another board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NestedBoard {
    #[serde(flatten)]
    pub base: BaseBoard,
    /// Board this node hangs off (root or nested).
    pub parent_id: Uuid,
    /// ID of the parent link record.
    pub relation_id: Uuid,
}

impl NestedBoard {
    pub fn id(&self) -> Uuid {
        self.base.id
    }
}

/// A privilege grant binding one user to one root board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relation {
    pub id: Uuid,
    /// Root board the grant applies to.
    pub board_id: Uuid,
    /// Grantee.
    pub user_id: Uuid,
    pub description: String,
    pub privilege: PrivilegeType,
    pub created_at: DateTime<Utc>,
}

impl Relation {
    /// Create a relation with a fresh identity.
    pub fn new(
        board_id: Uuid,
        user_id: Uuid,
        description: impl Into<String>,
        privilege: PrivilegeType,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            board_id,
            user_id,
            description: description.into(),
            privilege,
            created_at: now(),
        }
    }

    /// The (board, user, privilege) triple this relation proves.
    pub fn permission(&self) -> BoardPermission {
        BoardPermission {
            board_id: self.board_id,
            user_id: self.user_id,
            privilege: self.privilege,
        }
    }
}

/// Parent link of a nested board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct NestedRelation {
    pub id: Uuid,
    pub parent_board_id: Uuid,
    pub nested_board_id: Uuid,
}

impl NestedRelation {
    /// Create a link with a fresh identity.
    pub fn new(parent_board_id: Uuid, nested_board_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            parent_board_id,
            nested_board_id,
        }
    }
}

/// Resolved content of a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoardPermission {
    pub board_id: Uuid,
    pub user_id: Uuid,
    pub privilege: PrivilegeType,
}

/// Zero-width joiner, kept inside titles so emoji sequences survive.
const ZERO_WIDTH_JOINER: char = '\u{200D}';

/// Unicode format characters (category Cf): invisible, and able to reorder
/// or hide the text around them.
fn is_format(c: char) -> bool {
    matches!(
        c,
        '\u{00AD}'
            | '\u{0600}'..='\u{0605}'
            | '\u{061C}'
            | '\u{06DD}'
            | '\u{070F}'
            | '\u{08E2}'
            | '\u{180E}'
            | '\u{200B}'..='\u{200F}'
            | '\u{202A}'..='\u{202E}'
            | '\u{2060}'..='\u{2064}'
            | '\u{2066}'..='\u{206F}'
            | '\u{FEFF}'
            | '\u{FFF9}'..='\u{FFFB}'
            | '\u{110BD}'
            | '\u{110CD}'
            | '\u{1D173}'..='\u{1D17A}'
            | '\u{E0001}'
            | '\u{E0020}'..='\u{E007F}'
    )
}

/// Validate a board title: 1 to 255 printable characters.
///
/// Control characters and format characters are rejected, except for the
/// zero-width joiner. A title must also contain at least one visible
/// character.
pub fn validate_title(title: &str) -> Result<()> {
    if title.chars().all(|c| c.is_whitespace() || is_format(c)) {
        return Err(GotchaError::Validation("title is empty".to_string()));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(GotchaError::Validation(format!(
            "title is longer than {MAX_TITLE_LENGTH} characters"
        )));
    }
    if title.chars().any(char::is_control) {
        return Err(GotchaError::Validation(
            "title contains control characters".to_string(),
        ));
    }
    if title.chars().any(|c| is_format(c) && c != ZERO_WIDTH_JOINER) {
        return Err(GotchaError::Validation(
            "title contains invisible formatting characters".to_string(),
        ));
    }
    Ok(())
}

/// Validate a relation description: at most 255 characters.
pub fn validate_description(description: &str) -> Result<()> {
    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(GotchaError::Validation(format!(
            "description is longer than {MAX_DESCRIPTION_LENGTH} characters"
        )));
    }
    Ok(())
}
