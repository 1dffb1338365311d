//! User registration and sign-in for Gotcha.

use tracing::{info, warn};

use super::password::CredentialVerifier;
use super::validation::RegistrationRequest;
use crate::db::{NewUser, User};
use crate::storage::UserStore;
use crate::{GotchaError, Result};

/// Register a new user.
///
/// Validates the request, hashes the password and stores the user. A taken
/// username or email fails with `EntityDuplicate`.
pub async fn register<S, V>(store: &S, verifier: &V, request: &RegistrationRequest) -> Result<User>
where
    S: UserStore + ?Sized,
    V: CredentialVerifier + ?Sized,
{
    request.check()?;

    let hash = verifier.hash(&request.password)?;
    let user = NewUser::new(&request.username, &request.email, hash).into_user();
    store.insert_user(&user).await?;

    info!(user_id = %user.id, username = %user.username, "User registered");
    Ok(user)
}

/// Authenticate by username or email and password.
///
/// An unknown user and a wrong password both fail with `Security`.
pub async fn authenticate<S, V>(
    store: &S,
    verifier: &V,
    sobriquet: &str,
    password: &str,
) -> Result<User>
where
    S: UserStore + ?Sized,
    V: CredentialVerifier + ?Sized,
{
    let Some(user) = store.find_user_by_sobriquet(sobriquet).await? else {
        warn!("Sign-in failed");
        return Err(GotchaError::Security);
    };

    if !verifier.verify(password, &user.password_hash)? {
        warn!("Sign-in failed");
        return Err(GotchaError::Security);
    }

    info!(user_id = %user.id, "User signed in");
    Ok(user)
}
