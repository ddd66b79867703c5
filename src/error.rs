//! Error types for M36 device access.
//!
//! Every session call returns its own [`SessionError`] carrying the MDIS error
//! number and the human-readable text for it, so no caller has to consult a
//! process-wide "last error". The tools wrap those failures in [`M36Error`],
//! which also covers the option checks done before any device is touched.
//!
//! ## Error Hierarchy
//!
//! - **`HelpRequested`** / **`Usage`**: `-?` or a malformed command line; both
//!   end with the usage text.
//! - **`OptionConflict`**: individually valid options that cannot be combined
//!   (current display without the ×8 gain).
//! - **`Device`**: a session call failed. The `operation` names the failing
//!   call the way the MDIS tools print it (`open`, `setstat M36_CH_GAIN`, ...).
//! - **`Output`**: writing tool output failed.

use thiserror::Error;

/// Convenience alias for results using the crate error type.
pub type Result<T> = std::result::Result<T, M36Error>;

/// Failure of a single device session call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct SessionError {
    /// MDIS error number (`ERR_*`)
    pub code: u32,
    /// Text for `code` as returned by the error string lookup
    pub message: String,
}

impl SessionError {
    /// Create a session error from an error number and its description.
    pub fn new(code: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Errors surfaced by the configurator and the tools.
#[derive(Error, Debug)]
pub enum M36Error {
    /// `-?` given
    #[error("help requested")]
    HelpRequested,

    /// Malformed command line
    #[error("{0}")]
    Usage(String),

    /// Options that are valid on their own but not together
    #[error("option {option} only available with option {requires}")]
    OptionConflict {
        /// Offending option as typed, e.g. `-d=2`
        option: String,
        /// Option that must accompany it, e.g. `-g=3`
        requires: String,
    },

    /// A device session call failed
    #[error("can't {operation}: {source}")]
    Device {
        /// Failing call, e.g. `setstat M36_CH_GAIN`
        operation: String,
        /// Error reported by the session
        #[source]
        source: SessionError,
    },

    /// Writing tool output failed
    #[error("can't write output: {0}")]
    Output(#[from] std::io::Error),
}

impl M36Error {
    /// Wrap a session failure with the name of the failing operation.
    pub fn device(operation: impl Into<String>, source: SessionError) -> Self {
        Self::Device {
            operation: operation.into(),
            source,
        }
    }

    /// Check if this error came from the device session.
    pub fn is_device(&self) -> bool {
        matches!(self, Self::Device { .. })
    }

    /// The session error behind a device failure, if any.
    pub fn session_error(&self) -> Option<&SessionError> {
        match self {
            Self::Device { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_error_display_names_operation() {
        let err = M36Error::device(
            "setstat M36_CH_GAIN",
            SessionError::new(0x0a03, "illegal parameter"),
        );
        assert_eq!(err.to_string(), "can't setstat M36_CH_GAIN: illegal parameter");
        assert!(err.is_device());
        assert_eq!(err.session_error().map(|e| e.code), Some(0x0a03));
    }

    #[test]
    fn test_option_conflict_display() {
        let err = M36Error::OptionConflict {
            option: "-d=2".into(),
            requires: "-g=3".into(),
        };
        assert_eq!(err.to_string(), "option -d=2 only available with option -g=3");
        assert!(!err.is_device());
        assert!(err.session_error().is_none());
    }
}
