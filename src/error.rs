//! Error types surfaced while a router is being set up.

use failure::Fail;

/// A type alias of `Result<T, E>` whose error type is fixed to [`Error`].
///
/// [`Error`]: ./enum.Error.html
pub type Result<T> = std::result::Result<T, Error>;

/// An error detected while registering patterns and handlers.
///
/// All of these are setup-time errors. Once a router starts serving,
/// lookups never fail: an unknown path resolves to the not-found handler.
#[derive(Debug, Fail)]
pub enum Error {
    /// The pattern string is malformed.
    #[fail(display = "invalid input: {}", _0)]
    InvalidInput(String),

    /// A terminal handle is already registered for the pattern.
    #[fail(display = "handle already exists at {:?}", _0)]
    HandleExists(String),

    /// The operation is not available on this router.
    #[fail(display = "unsupported operation: {}", _0)]
    UnsupportedOperation(&'static str),
}

impl Error {
    pub(crate) fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }
}
