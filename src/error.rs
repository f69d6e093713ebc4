//! Structured Error Handling for fuzznum
//!
//! Provides a unified error type hierarchy with:
//! - Error codes for programmatic handling
//! - Structured error responses (JSON-friendly)
//! - Context preservation through error chains
//!
//! # Error Categories
//!
//! - Parameter errors - t-norm family parameters outside their domain
//! - Constraint errors - violated fuzzy-number constraints (e.g. md^q + nmd^q > 1)
//! - Registry errors - unknown mtypes, malformed registrations, failed transactions
//! - Reference errors - use of a template whose owning Fuzznum was dropped
//! - Operation errors - operations absent for an (mtype, t-norm) combination
//!
//! # Example
//!
//! ```rust,ignore
//! use fuzznum::error::{FuzzError, ErrorCode};
//!
//! fn check_degree(md: f64) -> Result<(), FuzzError> {
//!     if !(0.0..=1.0).contains(&md) {
//!         return Err(FuzzError::value(format!("md {} outside [0,1]", md))
//!             .with_context("attribute", "md"));
//!     }
//!     Ok(())
//! }
//! ```

use std::collections::HashMap;
use std::fmt;
use serde::{Deserialize, Serialize};

// ============================================================================
// Error Codes
// ============================================================================

/// Unique error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Value errors (1xxx)
    /// Generic invalid value
    InvalidValue = 1000,
    /// T-norm family parameter outside its domain
    InvalidParameter = 1001,
    /// Fuzzy-number constraint violated (e.g. md^q + nmd^q > 1)
    ConstraintViolation = 1002,
    /// Unknown t-norm family identifier
    UnknownFamily = 1003,
    /// q must be a positive integer
    InvalidQrung = 1004,
    /// Operand q values do not match
    QrungMismatch = 1005,
    /// Operand mtypes do not match
    MtypeMismatch = 1006,

    // Type errors (2xxx)
    /// Wrong argument shape or kind
    TypeMismatch = 2000,
    /// Attribute absent on the strategy
    UnknownAttribute = 2001,
    /// Attribute value has the wrong kind (scalar vs interval vs vector)
    AttributeKindMismatch = 2002,

    // Registry errors (3xxx)
    /// Generic registry error
    RegistryError = 3000,
    /// No strategy/template registered for the mtype
    UnknownMtype = 3001,
    /// Registration missing parts or with conflicting mtypes
    MalformedRegistration = 3002,
    /// Transaction failed and was rolled back
    TransactionFailed = 3003,

    // Reference errors (4xxx)
    /// Template outlived its owning Fuzznum
    InvalidReference = 4000,
    /// Lock poisoned by a panicking writer
    PoisonedState = 4001,

    // Operation errors (5xxx)
    /// Operation absent for the requested mtype and t-norm
    NotImplemented = 5000,
    /// Chain step produced a value the next step cannot consume
    ChainTypeError = 5001,
    /// Operand failed its pre-operation validation
    InvalidOperand = 5002,

    // Internal errors (9xxx)
    /// Internal error
    InternalError = 9000,
}

impl ErrorCode {
    /// Get the numeric code value
    pub fn code(&self) -> u32 {
        *self as u32
    }

    /// Get a short description of the error code
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::InvalidValue => "Invalid value",
            ErrorCode::InvalidParameter => "Parameter outside its domain",
            ErrorCode::ConstraintViolation => "Fuzzy-number constraint violated",
            ErrorCode::UnknownFamily => "Unknown t-norm family",
            ErrorCode::InvalidQrung => "Invalid q-rung",
            ErrorCode::QrungMismatch => "Operand q values do not match",
            ErrorCode::MtypeMismatch => "Operand mtypes do not match",
            ErrorCode::TypeMismatch => "Type mismatch",
            ErrorCode::UnknownAttribute => "Unknown attribute",
            ErrorCode::AttributeKindMismatch => "Attribute kind mismatch",
            ErrorCode::RegistryError => "Registry error",
            ErrorCode::UnknownMtype => "Unknown mtype",
            ErrorCode::MalformedRegistration => "Malformed registration",
            ErrorCode::TransactionFailed => "Transaction failed",
            ErrorCode::InvalidReference => "Invalidated reference",
            ErrorCode::PoisonedState => "Poisoned state",
            ErrorCode::NotImplemented => "Operation not implemented",
            ErrorCode::ChainTypeError => "Chain type error",
            ErrorCode::InvalidOperand => "Invalid operand",
            ErrorCode::InternalError => "Internal error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

// ============================================================================
// Error Context
// ============================================================================

/// Additional context information for an error
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Key-value pairs of context information
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub fields: HashMap<String, String>,
    /// Stack of error causes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<String>,
}

impl ErrorContext {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field to the context
    pub fn field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Add a cause to the error chain
    pub fn cause(mut self, cause: impl Into<String>) -> Self {
        self.causes.push(cause.into());
        self
    }
}

// ============================================================================
// Main Error Type
// ============================================================================

/// The main error type for fuzznum
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuzzError {
    /// Error code for programmatic handling
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Additional context
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ErrorContext>,
    /// Hint for resolving the error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl FuzzError {
    /// Create a new error with a code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: None,
            hint: None,
        }
    }

    // ========================================================================
    // Factory methods for common error types
    // ========================================================================

    /// Create an invalid-value error
    pub fn value(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidValue, message)
    }

    /// Create a parameter-domain error
    pub fn parameter(family: &str, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidParameter, message.into())
            .with_context("family", family)
    }

    /// Create a constraint-violation error
    pub fn constraint(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConstraintViolation, message)
    }

    /// Create an unknown t-norm family error
    pub fn unknown_family(name: &str) -> Self {
        Self::new(
            ErrorCode::UnknownFamily,
            format!("Unknown t-norm family '{}'", name),
        )
        .with_hint(
            "Supported: algebraic, lukasiewicz, einstein, hamacher, yager, \
             schweizer_sklar, dombi, aczel_alsina, frank, minimum, drastic, nilpotent",
        )
    }

    /// Create a type-mismatch error
    pub fn type_mismatch(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::TypeMismatch, message)
    }

    /// Create an unknown-attribute error
    pub fn unknown_attribute(mtype: &str, name: &str) -> Self {
        Self::new(
            ErrorCode::UnknownAttribute,
            format!("mtype '{}' has no attribute '{}'", mtype, name),
        )
    }

    /// Create an unknown-mtype error
    pub fn unknown_mtype(mtype: &str) -> Self {
        Self::new(
            ErrorCode::UnknownMtype,
            format!("No strategy registered for mtype '{}'", mtype),
        )
    }

    /// Create a malformed-registration error
    pub fn registration(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::MalformedRegistration, message)
    }

    /// Create a transaction-failure error
    pub fn transaction(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::TransactionFailed, message)
    }

    /// Create an invalidated-reference error
    pub fn invalid_reference(what: &str) -> Self {
        Self::new(
            ErrorCode::InvalidReference,
            format!("{} refers to a Fuzznum that no longer exists", what),
        )
    }

    /// Create a not-implemented error naming the operation, mtype and t-norm
    pub fn not_implemented(op: &str, mtype: &str, norm: &str) -> Self {
        Self::new(
            ErrorCode::NotImplemented,
            format!(
                "Operation '{}' is not implemented for mtype '{}' under t-norm '{}'",
                op, mtype, norm
            ),
        )
    }

    /// Create an invalid-operand error
    pub fn operand(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidOperand, message)
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    // ========================================================================
    // Builder methods
    // ========================================================================

    /// Set the error code
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = code;
        self
    }

    /// Add context to the error
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::new);
        ctx.fields.insert(key.into(), value.into());
        self
    }

    /// Add a cause to the error chain
    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::new);
        ctx.causes.push(cause.into());
        self
    }

    /// Add a hint for resolving the error
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Check if this error represents a constraint/domain problem in the input
    pub fn is_value_error(&self) -> bool {
        (1000..2000).contains(&self.code.code())
    }

    /// Check if this error came from the registry layer
    pub fn is_registry_error(&self) -> bool {
        (3000..4000).contains(&self.code.code())
    }

    /// Convert to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":"INTERNAL_ERROR","message":"{}"}}"#, self.message)
        })
    }
}

impl fmt::Display for FuzzError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)?;

        if let Some(ref ctx) = self.context {
            if !ctx.causes.is_empty() {
                write!(f, "\nCaused by:")?;
                for cause in &ctx.causes {
                    write!(f, "\n  - {}", cause)?;
                }
            }
        }

        if let Some(ref hint) = self.hint {
            write!(f, "\nHint: {}", hint)?;
        }

        Ok(())
    }
}

impl std::error::Error for FuzzError {}

impl From<serde_json::Error> for FuzzError {
    fn from(err: serde_json::Error) -> Self {
        FuzzError::type_mismatch(err.to_string()).with_context("format", "JSON")
    }
}

impl<T> From<std::sync::PoisonError<T>> for FuzzError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        FuzzError::new(ErrorCode::PoisonedState, err.to_string())
    }
}

// ============================================================================
// Result type alias
// ============================================================================

/// A Result type using FuzzError
pub type FuzzResult<T> = Result<T, FuzzError>;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = FuzzError::value("test error");
        assert_eq!(err.code, ErrorCode::InvalidValue);
        assert_eq!(err.message, "test error");
    }

    #[test]
    fn test_error_with_context() {
        let err = FuzzError::constraint("md^q + nmd^q > 1")
            .with_context("md", "0.9")
            .with_context("nmd", "0.8");

        let ctx = err.context.as_ref().unwrap();
        assert_eq!(ctx.fields.get("md"), Some(&"0.9".to_string()));
        assert_eq!(ctx.fields.get("nmd"), Some(&"0.8".to_string()));
    }

    #[test]
    fn test_error_with_cause() {
        let err = FuzzError::transaction("rollback")
            .with_cause("second registration rejected")
            .with_cause("empty mtype");

        let ctx = err.context.as_ref().unwrap();
        assert_eq!(ctx.causes.len(), 2);
    }

    #[test]
    fn test_not_implemented_names_everything() {
        let err = FuzzError::not_implemented("div", "ivqrofn", "algebraic");
        assert_eq!(err.code, ErrorCode::NotImplemented);
        assert!(err.message.contains("div"));
        assert!(err.message.contains("ivqrofn"));
        assert!(err.message.contains("algebraic"));
    }

    #[test]
    fn test_unknown_family_has_hint() {
        let err = FuzzError::unknown_family("archimedes");
        assert!(err.hint.is_some());
        assert!(err.message.contains("archimedes"));
    }

    #[test]
    fn test_error_category_predicates() {
        assert!(FuzzError::constraint("x").is_value_error());
        assert!(!FuzzError::constraint("x").is_registry_error());
        assert!(FuzzError::unknown_mtype("x").is_registry_error());
    }

    #[test]
    fn test_error_to_json() {
        let err = FuzzError::value("test error");
        let json = err.to_json();
        assert!(json.contains("INVALID_VALUE"));
        assert!(json.contains("test error"));
    }

    #[test]
    fn test_error_display() {
        let err = FuzzError::parameter("hamacher", "gamma must be > 0")
            .with_cause("got -1.5")
            .with_hint("Pass hamacher_gamma > 0");

        let display = err.to_string();
        assert!(display.contains("[1001]"));
        assert!(display.contains("gamma must be > 0"));
        assert!(display.contains("got -1.5"));
        assert!(display.contains("Pass hamacher_gamma > 0"));
    }
}
