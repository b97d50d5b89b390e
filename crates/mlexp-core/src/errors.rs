//! Structured error types shared across mlexp crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`ExpError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (part names, versions, ids, paths).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for sweep definition, storage and scheduling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum ExpError {
    /// A commit was attempted with no properties, or with a reserved key.
    #[error("invalid property set: {0}")]
    InvalidPropertySet(ErrorInfo),
    /// A version outside `[0, latest]` was requested.
    #[error("unknown version: {0}")]
    UnknownVersion(ErrorInfo),
    /// A configuration id absent from the targeted version was requested.
    #[error("unknown configuration: {0}")]
    UnknownConfiguration(ErrorInfo),
    /// A property value outside the int/real/string/bool kinds.
    #[error("unsupported value type: {0}")]
    UnsupportedValueType(ErrorInfo),
    /// Another writer changed the sweep between read and write.
    #[error("concurrent write conflict: {0}")]
    ConcurrentWriteConflict(ErrorInfo),
    /// Storage engine failures.
    #[error("storage error: {0}")]
    Storage(ErrorInfo),
    /// Serialization and schema errors.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
    /// Filesystem and process errors.
    #[error("io error: {0}")]
    Io(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

impl ExpError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            ExpError::InvalidPropertySet(info)
            | ExpError::UnknownVersion(info)
            | ExpError::UnknownConfiguration(info)
            | ExpError::UnsupportedValueType(info)
            | ExpError::ConcurrentWriteConflict(info)
            | ExpError::Storage(info)
            | ExpError::Serde(info)
            | ExpError::Io(info) => info,
        }
    }

    /// Returns the stable error code of the payload.
    pub fn code(&self) -> &str {
        &self.info().code
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_context_and_hint() {
        let err = ExpError::UnknownVersion(
            ErrorInfo::new("store.unknown_version", "version does not exist")
                .with_context("part", "qrc")
                .with_context("version", "3")
                .with_hint("latest is 1"),
        );
        assert_eq!(
            err.to_string(),
            "unknown version: version does not exist (code: store.unknown_version) \
             | context: [part=qrc, version=3] | hint: latest is 1"
        );
        assert_eq!(err.code(), "store.unknown_version");
    }

    #[test]
    fn serializes_with_family_tag() {
        let err = ExpError::Storage(ErrorInfo::new("store.sqlite_open", "boom"));
        let json = serde_json::to_value(&err).expect("json");
        assert_eq!(json["family"], "Storage");
        assert_eq!(json["detail"]["code"], "store.sqlite_open");
    }
}
