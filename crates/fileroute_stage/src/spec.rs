//! Stage option models, lifecycle enums and top-level error types.

use std::fmt;

use serde::Deserialize;
use thiserror::Error;

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// Lifecycle state of a [`crate::stage::TransformStage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumStageState {
    /// Options failed validation; the stage will not process records.
    Unconfigured,
    /// Options are valid; no upstream connection yet.
    Configured,
    /// One upstream connection accepted; waiting for its shape.
    AwaitingInput,
    /// Input shape negotiated, output shape announced downstream.
    Ready,
    /// At least one record has been offered.
    Streaming,
    /// Both output channels are closed.
    Closed,
}

impl EnumStageState {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unconfigured => "unconfigured",
            Self::Configured => "configured",
            Self::AwaitingInput => "awaiting_input",
            Self::Ready => "ready",
            Self::Streaming => "streaming",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for EnumStageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filesystem operation selected by [`SpecStageOptions::if_move`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumFileOperation {
    /// Copy source to destination, overwriting the destination.
    Copy,
    /// Move source to destination.
    Move,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StructsAndErrors

/// User-facing stage options, parsed once at construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SpecStageOptions {
    /// Name of the input field holding the source path.
    pub field_source: String,
    /// Name of the input field holding the destination path.
    pub field_destination: String,
    /// Move instead of copy.
    pub if_move: bool,
    /// Create the destination's parent directory chain before the operation.
    pub if_create_dirs: bool,
}

impl SpecStageOptions {
    pub fn new(field_source: impl Into<String>, field_destination: impl Into<String>) -> Self {
        Self {
            field_source: field_source.into(),
            field_destination: field_destination.into(),
            ..Self::default()
        }
    }

    pub fn operation(&self) -> EnumFileOperation {
        if self.if_move {
            EnumFileOperation::Move
        } else {
            EnumFileOperation::Copy
        }
    }

    /// Check required field names; blank names count as missing.
    ///
    /// Returns every problem found so a host can display all of them at once.
    pub fn validate(&self) -> Result<(), Vec<StageError>> {
        let mut l_errors = Vec::new();
        if self.field_source.trim().is_empty() {
            l_errors.push(StageError::MissingSourceField);
        }
        if self.field_destination.trim().is_empty() {
            l_errors.push(StageError::MissingDestinationField);
        }
        if l_errors.is_empty() {
            Ok(())
        } else {
            Err(l_errors)
        }
    }
}

/// Errors raised while building or deriving a record shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    /// Two fields in one shape share a name.
    #[error("Duplicate field name: `{0}`")]
    DuplicateFieldName(String),
    /// The appended field collides with an existing input field.
    #[error("Output field `{0}` collides with an existing input field")]
    FieldNameCollision(String),
    /// A record was built with the wrong number of values.
    #[error("Expected {expected} values, got {actual}")]
    ValueCount { expected: usize, actual: usize },
}

/// Stage-level failures. Per-record filesystem problems never appear here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StageError {
    #[error("Source field cannot be empty.")]
    MissingSourceField,
    #[error("Destination field cannot be empty.")]
    MissingDestinationField,
    /// A configured field name is absent from the negotiated input shape.
    #[error("Field `{name}` not found in the input record")]
    FieldNotFound { name: String },
    #[error(transparent)]
    Shape(#[from] ShapeError),
    #[error("Missing Incoming Connection.")]
    MissingIncomingConnection,
    #[error("Only one incoming connection is supported")]
    ConnectionAlreadyEstablished,
    /// Operation not allowed in the current lifecycle state.
    #[error("Cannot {operation} while stage is {state}")]
    InvalidState {
        operation: &'static str,
        state: EnumStageState,
    },
    /// Record was not built from the negotiated input shape.
    #[error("Record shape does not match the negotiated input shape")]
    ShapeMismatch,
    /// Mapped input and output fields disagree on type.
    #[error("Field `{name}` has incompatible types between input and output")]
    IncompatibleFieldType { name: String },
}

impl StageError {
    /// Errors that keep the stage from ever streaming.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::MissingSourceField
                | Self::MissingDestinationField
                | Self::FieldNotFound { .. }
                | Self::Shape(_)
                | Self::IncompatibleFieldType { .. }
        )
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{EnumFileOperation, ShapeError, SpecStageOptions, StageError};

    #[test]
    fn options_deserialize_with_defaults() {
        let spec_options: SpecStageOptions =
            serde_json::from_str(r#"{"field_source": "path_src", "field_destination": "path_dst"}"#)
                .expect("parse options");
        assert_eq!(spec_options, SpecStageOptions::new("path_src", "path_dst"));
        assert!(!spec_options.if_move);
        assert!(!spec_options.if_create_dirs);
        assert_eq!(spec_options.operation(), EnumFileOperation::Copy);
    }

    #[test]
    fn options_validate_reports_every_missing_name() {
        let l_errors = SpecStageOptions::new("", "  ")
            .validate()
            .expect_err("must fail");
        assert_eq!(
            l_errors,
            vec![
                StageError::MissingSourceField,
                StageError::MissingDestinationField
            ]
        );
        assert!(SpecStageOptions::new("a", "b").validate().is_ok());
    }

    #[test]
    fn configuration_errors_are_classified() {
        assert!(StageError::MissingSourceField.is_configuration_error());
        assert!(StageError::from(ShapeError::FieldNameCollision("x".to_string()))
            .is_configuration_error());
        assert!(!StageError::ShapeMismatch.is_configuration_error());
        assert!(!StageError::MissingIncomingConnection.is_configuration_error());
    }
}
