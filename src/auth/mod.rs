//! Authentication module for Gotcha.
//!
//! This module provides password hashing, registration input validation,
//! user registration, and sign-in.

mod password;
mod registration;
pub mod validation;

pub use password::{Argon2Verifier, CredentialVerifier};
pub use registration::{authenticate, register};
pub use validation::RegistrationRequest;
