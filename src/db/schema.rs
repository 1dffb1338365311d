//! Database schema and migrations for Gotcha.
//!
//! Migrations are applied in order; the `schema_version` table records
//! which ones have run.

/// Database migrations (SQLite dialect).
#[cfg(feature = "sqlite")]
pub const MIGRATIONS: &[&str] = &[
    // v1: users
    r#"
CREATE TABLE users (
    id          BLOB PRIMARY KEY,
    username    TEXT NOT NULL UNIQUE,
    email       TEXT NOT NULL UNIQUE,
    hash        TEXT NOT NULL,           -- Argon2 PHC string
    created_at  TEXT NOT NULL
);
"#,
    // v2: boards, privilege relations and nested-board links
    r#"
CREATE TABLE boards (
    id          BLOB PRIMARY KEY,
    title       TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

-- Privilege grants; only ever attached to root boards
CREATE TABLE user_to_board (
    id          BLOB PRIMARY KEY,
    board_id    BLOB NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
    user_id     BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    access_type INTEGER NOT NULL,        -- 1 author, 2 read-only, 3 read-write
    description TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

CREATE INDEX idx_user_to_board_board_id ON user_to_board(board_id);
CREATE INDEX idx_user_to_board_user_id ON user_to_board(user_id);

-- Parent links of nested boards
CREATE TABLE board_to_board (
    id              BLOB PRIMARY KEY,
    parent_board_id BLOB NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
    nested_board_id BLOB NOT NULL UNIQUE REFERENCES boards(id) ON DELETE CASCADE
);

CREATE INDEX idx_board_to_board_parent ON board_to_board(parent_board_id);
"#,
];

/// Database migrations (PostgreSQL dialect).
#[cfg(feature = "postgres")]
pub const MIGRATIONS: &[&str] = &[
    // v1: users
    r#"
CREATE TABLE users (
    id          UUID PRIMARY KEY,
    username    TEXT NOT NULL UNIQUE,
    email       TEXT NOT NULL UNIQUE,
    hash        TEXT NOT NULL,
    created_at  TIMESTAMPTZ NOT NULL
);
"#,
    // v2: boards, privilege relations and nested-board links
    r#"
CREATE TABLE boards (
    id          UUID PRIMARY KEY,
    title       TEXT NOT NULL,
    created_at  TIMESTAMPTZ NOT NULL
);

CREATE TABLE user_to_board (
    id          UUID PRIMARY KEY,
    board_id    UUID NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
    user_id     UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    access_type INTEGER NOT NULL,
    description TEXT NOT NULL,
    created_at  TIMESTAMPTZ NOT NULL
);

CREATE INDEX idx_user_to_board_board_id ON user_to_board(board_id);
CREATE INDEX idx_user_to_board_user_id ON user_to_board(user_id);

CREATE TABLE board_to_board (
    id              UUID PRIMARY KEY,
    parent_board_id UUID NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
    nested_board_id UUID NOT NULL UNIQUE REFERENCES boards(id) ON DELETE CASCADE
);

CREATE INDEX idx_board_to_board_parent ON board_to_board(parent_board_id);
"#,
];
