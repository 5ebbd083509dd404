//! Authentication domain types

mod error;
mod token;

pub use error::AuthError;
pub use token::{OAuthErrorBody, RefreshOutcome, Token, TokenGrant};
