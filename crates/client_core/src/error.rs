use thiserror::Error;

/// Failures raised by profile actions before any remote call is made.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProfileViewError {
    #[error("Not logged in")]
    NotAuthenticated,
    #[error("profile for {actor} has not been loaded; nothing to follow")]
    MissingFollowTarget { actor: String },
}
