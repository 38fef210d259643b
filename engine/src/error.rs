use thiserror::Error;

/// Errors the engine can return from a composite operation. Anything not
/// represented here (a lost lease-acquire race, a lazy reclamation) is
/// expected control flow, not a failure, and never surfaces as an `Error`.
#[derive(Debug, Error)]
pub enum Error {
    #[error("client does not own the lease for this message")]
    WrongOwner {
        log_id: String,
        group_id: String,
        message_id: u64,
    },

    /// Catch-all for conditions that should be impossible given the
    /// invariants this crate maintains internally, surfaced to callers as a
    /// generic message rather than panicking.
    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
