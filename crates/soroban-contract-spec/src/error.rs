//! Error types for module parsing and value conversion.

use thiserror::Error;

/// Failure while extracting contract metadata from a WASM module.
///
/// All variants are fatal: no partial [`crate::ContractInfo`] is produced.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The bytes are not a well-formed WASM module, or one of the contract
    /// sections holds a truncated or garbled XDR payload.
    #[error("invalid WASM module: {0}")]
    InvalidModule(String),

    /// No `contractenvmetav0` section was found.
    #[error("environment meta section `contractenvmetav0` is missing")]
    EnvironmentMetaMissing,

    /// No `contractspecv0` section was found.
    #[error("contract spec section `contractspecv0` is missing")]
    DeclarationsMissing,
}

/// Failure while converting between native values and `ScVal`s.
#[derive(Debug, Error)]
pub enum SpecError {
    /// No function with this name is declared.
    #[error("function `{0}` not found in contract spec")]
    FunctionNotFound(String),

    /// The value's shape does not match the declared type.
    #[error("invalid type: {0}")]
    InvalidType(String),

    /// The integer matches none of the enum's discriminants.
    #[error("no case of enum `{name}` has value {value}")]
    InvalidEnumValue {
        /// Enum declaration name.
        name: String,
        /// The rejected integer.
        value: i128,
    },

    /// A named type reference does not resolve to a declaration.
    #[error("type `{0}` not found in contract spec")]
    TypeNotFound(String),

    /// Conversion nested deeper than the configured limit.
    #[error("conversion exceeded maximum depth of {0}")]
    DepthLimitExceeded(usize),

    /// A low-level numeric, address or XDR encoding failure.
    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

impl SpecError {
    /// Whether this failure came from the low-level encoders rather than
    /// from a mismatch against the contract spec.
    pub fn is_encoding(&self) -> bool {
        matches!(self, SpecError::Encoding(_))
    }

    pub(crate) fn invalid_type(msg: impl Into<String>) -> Self {
        SpecError::InvalidType(msg.into())
    }
}

/// Low-level encoding failures surfaced by the integer, address and XDR
/// encoders.
#[derive(Debug, Error)]
pub enum EncodingError {
    /// The string is not a decimal integer.
    #[error("malformed decimal integer `{0}`")]
    InvalidInteger(String),

    /// A byte buffer is longer than the target integer width.
    #[error("integer buffer of {len} bytes exceeds {max}-byte width")]
    IntegerTooLarge {
        /// Supplied buffer length.
        len: usize,
        /// Width of the target type in bytes.
        max: usize,
    },

    /// The string is not a recognizable account or contract address.
    #[error("unrecognized address `{0}`")]
    InvalidAddress(String),

    /// An XDR length limit or decoding rule was violated.
    #[error("xdr: {0}")]
    Xdr(#[from] stellar_xdr::curr::Error),
}

impl From<stellar_xdr::curr::Error> for SpecError {
    fn from(e: stellar_xdr::curr::Error) -> Self {
        SpecError::Encoding(EncodingError::Xdr(e))
    }
}

/// Result alias for conversion operations.
pub type Result<T, E = SpecError> = std::result::Result<T, E>;
