//! Error taxonomy shared by every module of the crate.

use thiserror::Error;

/// Result type alias for dacl operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while normalizing, mutating or converting access control lists.
///
/// Normalization errors (`InvalidAccessType`, `UnknownRight`, `InvalidAceSource`,
/// `InvalidAclSource`) surface as soon as malformed input is seen. `AccountNotFound` is only
/// raised when an `Acl` is converted into its native form, since building an `Ace` never
/// consults a resolver.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum Error {
    #[error("Invalid access type: {0} (expected Allow or Deny)")]
    InvalidAccessType(String),

    #[error("Unknown right: {0}")]
    UnknownRight(String),

    #[error("Invalid acl source: {0}")]
    InvalidAclSource(String),

    #[error("Invalid ace source: {0}")]
    InvalidAceSource(String),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Invalid name pattern: {0}")]
    InvalidPattern(String),

    #[error("Invalid security identifier: {0}")]
    InvalidSid(String),

    #[error("Index {index} out of range for acl of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Unsupported native ace type: {0:#04x}")]
    UnsupportedAceType(u8),

    #[error("Native acl handle is already borrowed")]
    NativeHandleBusy,
} // enum Error


// Tests //////////////////////////////////////////////////////////////////////////////////////////


// mod tests
