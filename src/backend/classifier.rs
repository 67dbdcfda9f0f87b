//! Transport failure classification
//!
//! Reduces a [`TransportError`] to one of five stable categories with a fixed
//! operator message. Classification is pure: surfacing the result is up to
//! the caller.

use super::transport::TransportError;

/// Stable failure categories shown to the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureCategory {
    Timeout,
    PortBusy,
    IoFailure,
    InvalidArgument,
    Unknown,
}

impl FailureCategory {
    /// All categories, in classification priority order
    pub fn all() -> &'static [FailureCategory] {
        &[
            FailureCategory::Timeout,
            FailureCategory::PortBusy,
            FailureCategory::IoFailure,
            FailureCategory::InvalidArgument,
            FailureCategory::Unknown,
        ]
    }

    /// Operator-facing message for this category
    pub fn message(&self) -> &'static str {
        match self {
            FailureCategory::Timeout => "Device not responding",
            FailureCategory::PortBusy => "Port is in use by another program",
            FailureCategory::IoFailure => "Adapter or cable problem",
            FailureCategory::InvalidArgument => "Invalid COM port name",
            FailureCategory::Unknown => "Unknown error",
        }
    }
}

impl std::fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureCategory::Timeout => write!(f, "Timeout"),
            FailureCategory::PortBusy => write!(f, "PortBusy"),
            FailureCategory::IoFailure => write!(f, "IoFailure"),
            FailureCategory::InvalidArgument => write!(f, "InvalidArgument"),
            FailureCategory::Unknown => write!(f, "Unknown"),
        }
    }
}

/// A transport failure reduced to a category plus display text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedFailure {
    pub category: FailureCategory,
    /// Fixed operator message for the category
    pub message: &'static str,
    /// Original low-level message
    pub detail: String,
}

impl ClassifiedFailure {
    /// Two-line text for the error label
    pub fn display_text(&self) -> String {
        format!("Error: {}\n({})", self.message, self.detail)
    }
}

impl std::fmt::Display for ClassifiedFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.detail)
    }
}

/// Classify a transport failure
///
/// Match order is the priority order: timeout, access denied, I/O, invalid
/// port name, everything else.
pub fn classify(failure: &TransportError) -> ClassifiedFailure {
    let category = match failure {
        TransportError::Timeout(_) => FailureCategory::Timeout,
        TransportError::AccessDenied(_) => FailureCategory::PortBusy,
        TransportError::Io(_) => FailureCategory::IoFailure,
        TransportError::InvalidPortName(_) => FailureCategory::InvalidArgument,
        TransportError::Other(_) => FailureCategory::Unknown,
    };

    ClassifiedFailure {
        category,
        message: category.message(),
        detail: failure.detail().to_string(),
    }
}
