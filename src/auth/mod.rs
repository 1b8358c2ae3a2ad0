//! Authentication module
//!
//! The token provider collaborator: given an environment's access key pair,
//! returns a bearer token valid for a bounded lifetime. Token refresh is not
//! handled here; a run uses one token per environment.

mod provider;
mod types;

pub use provider::{
    AccessKeyTokenProvider, StaticTokenProvider, TokenProvider, ACCESS_TOKEN_PATH,
    DEFAULT_TOKEN_EXPIRY_SECS,
};
pub use types::{AccessToken, Credentials};

#[cfg(test)]
mod tests;
