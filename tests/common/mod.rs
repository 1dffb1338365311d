//! Test helpers shared by the integration tests.

#![allow(dead_code)]

use gotcha::board::{Board, BoardService};
use gotcha::storage::{BoardStore, UserStore};
use gotcha::{register, Argon2Verifier, RegistrationRequest, User};

/// Cheapest Argon2 parameters the crate accepts, to keep tests fast.
pub fn verifier() -> Argon2Verifier {
    Argon2Verifier::with_params(8, 1, 1).unwrap()
}

/// Register a user named `username` with a derived email address.
pub async fn create_user<S: UserStore + ?Sized>(store: &S, username: &str) -> User {
    let request = RegistrationRequest::new(
        username,
        format!("{username}@example.com"),
        "password123",
    );
    register(store, &verifier(), &request).await.unwrap()
}

/// Create a root board owned by `user`.
pub async fn create_board<S: BoardStore + ?Sized>(store: &S, user: &User, title: &str) -> Board {
    BoardService::new(store)
        .new_root_board(user, title)
        .await
        .unwrap()
}
