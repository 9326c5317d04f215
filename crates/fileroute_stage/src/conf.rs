//! Fixed constants of the stage: appended field, status texts, host messages.

use crate::shape::EnumFieldType;

/// Name of the field appended to every outgoing record.
pub const C_FIELD_NAME_FILE_RESULT: &str = "file_result";
/// Type of the appended status field.
pub const ENUM_FIELD_TYPE_FILE_RESULT: EnumFieldType = EnumFieldType::String;
/// Max size (characters) of the appended status field.
pub const N_SIZE_FILE_RESULT_MAX: usize = 1000;

/// Status text after a successful copy.
pub const C_STATUS_FILE_COPIED: &str = "File Copied";
/// Status text after a successful move.
pub const C_STATUS_FILE_MOVED: &str = "File Moved";
/// Status text when the source path does not exist.
pub const C_STATUS_SOURCE_MISSING: &str = "Source file doesn't exist";
/// Status text when the destination's parent directory does not exist.
pub const C_STATUS_DESTINATION_MISSING: &str = "Destination path doesn't exist";

pub const C_MSG_SOURCE_FIELD_EMPTY: &str = "Source field cannot be empty.";
pub const C_MSG_DESTINATION_FIELD_EMPTY: &str = "Destination field cannot be empty.";
pub const C_MSG_SELECT_SOURCE_FIELD: &str = "Select a source field";
pub const C_MSG_SELECT_DESTINATION_FIELD: &str = "Select a destination field";
pub const C_MSG_MISSING_INCOMING_CONNECTION: &str = "Missing Incoming Connection.";
pub const C_MSG_DIR_TREE_FAILED: &str = "Unable to create directory tree";
