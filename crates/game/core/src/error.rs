//! Common error infrastructure for game-core.
//!
//! Domain-specific errors (`SummonError`, `AttackError`, `IntentError`, ...)
//! live next to the code that produces them; this module only holds the
//! shared classification used by the runtime to decide how to react.

/// Severity level of an error, used for categorization and recovery strategies.
///
/// - **Recoverable**: the caller may try again with a different intent
/// - **Validation**: malformed input that must be rejected as-is
/// - **Internal**: a snapshot disagrees with itself and needs investigation
/// - **Fatal**: held history cannot be reconciled; only a resync helps
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    Recoverable,
    Validation,
    Internal,
    Fatal,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    /// Returns true if this error is potentially recoverable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Returns true if this error indicates broken history or a bug.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Common trait for all game-core errors.
pub trait GameError: core::fmt::Display + core::fmt::Debug {
    fn severity(&self) -> ErrorSeverity;

    /// Static identifier of the variant, stable enough for logs and tests.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}
