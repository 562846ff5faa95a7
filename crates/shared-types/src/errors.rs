//! # Error Types
//!
//! Construction errors for the shared value types.

use thiserror::Error;

/// Errors raised while building or parsing an account/permission name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    /// Name is empty.
    #[error("name must not be empty")]
    Empty,

    /// Name is longer than 12 characters.
    #[error("name {name:?} is longer than 12 characters")]
    TooLong { name: String },

    /// Name contains a character outside `a-z`, `1-5` and `.`.
    #[error("name {name:?} contains invalid character {ch:?}")]
    InvalidCharacter { name: String, ch: char },

    /// Name ends with a dot.
    #[error("name {name:?} must not end with '.'")]
    TrailingDot { name: String },
}

/// Errors raised by asset construction, parsing and arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetError {
    /// Amount magnitude exceeds `MAX_ASSET_AMOUNT`.
    #[error("magnitude of asset amount must be less than 2^62")]
    AmountOutOfRange,

    /// Symbol code is empty, too long, or not upper-case ASCII.
    #[error("invalid symbol code {0:?}")]
    InvalidSymbol(String),

    /// Symbol precision above 18 decimals.
    #[error("symbol precision {0} exceeds 18")]
    InvalidPrecision(u8),

    /// Two assets with different symbols were combined.
    #[error("attempt to combine assets with different symbols ({left} vs {right})")]
    SymbolMismatch { left: String, right: String },

    /// Arithmetic overflowed the representable range.
    #[error("asset arithmetic overflow")]
    Overflow,

    /// Textual form could not be parsed.
    #[error("cannot parse asset from {0:?}")]
    Parse(String),
}
