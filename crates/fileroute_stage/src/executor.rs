//! Per-record copy/move execution and failure classification.

use std::path::Path;

use crate::conf::{
    C_MSG_DIR_TREE_FAILED, C_STATUS_DESTINATION_MISSING, C_STATUS_FILE_COPIED,
    C_STATUS_FILE_MOVED, C_STATUS_SOURCE_MISSING,
};
use crate::spec::{EnumFileOperation, SpecStageOptions};
use crate::util::{
    copy_file_with_metadata, create_parent_dirs, derive_parent_dir, ensure_vacant_target,
    move_file, resolve_destination_path,
};

/// Classified result of one filesystem operation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumOutcome {
    Success(String),
    RecoverableFailure(String),
}

impl EnumOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn status(&self) -> &str {
        match self {
            Self::Success(txt) | Self::RecoverableFailure(txt) => txt,
        }
    }
}

/// Outcome plus the non-fatal directory-creation diagnostic, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecExecution {
    pub outcome: EnumOutcome,
    pub error_create_dirs: Option<String>,
}

/// Maps (source, destination, move flag, create-dirs flag) to an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileOperationExecutor {
    operation: EnumFileOperation,
    if_create_dirs: bool,
}

impl FileOperationExecutor {
    pub fn new(operation: EnumFileOperation, if_create_dirs: bool) -> Self {
        Self {
            operation,
            if_create_dirs,
        }
    }

    pub fn from_options(spec_options: &SpecStageOptions) -> Self {
        Self::new(spec_options.operation(), spec_options.if_create_dirs)
    }

    pub fn operation(&self) -> EnumFileOperation {
        self.operation
    }

    /// Run one operation. Policy, in order:
    /// 1. a null path yields `None` (nothing is emitted for the record);
    /// 2. optional parent-chain creation, failures kept as a diagnostic;
    /// 3. missing source;
    /// 4. missing destination parent;
    /// 5. copy or move, I/O errors converted into a failure status. A copy onto
    ///    the source itself and a move that would replace a file inside a
    ///    destination directory both fail.
    ///
    /// Nothing is retried and partial writes are left in place.
    pub fn execute(
        &self,
        path_source: Option<&str>,
        path_destination: Option<&str>,
    ) -> Option<SpecExecution> {
        let (Some(path_source), Some(path_destination)) = (path_source, path_destination) else {
            return None;
        };
        let path_src = Path::new(path_source);
        let path_dst = Path::new(path_destination);

        let mut error_create_dirs = None;
        if self.if_create_dirs
            && let Err(e) = create_parent_dirs(path_dst)
        {
            error_create_dirs = Some(format!("{C_MSG_DIR_TREE_FAILED}: {e}"));
        }

        let outcome = self.classify_and_run(path_src, path_dst);
        Some(SpecExecution {
            outcome,
            error_create_dirs,
        })
    }

    fn classify_and_run(&self, path_src: &Path, path_dst: &Path) -> EnumOutcome {
        if !path_src.exists() {
            return EnumOutcome::RecoverableFailure(C_STATUS_SOURCE_MISSING.to_string());
        }
        if derive_parent_dir(path_dst).is_none_or(|path_parent| !path_parent.exists()) {
            return EnumOutcome::RecoverableFailure(C_STATUS_DESTINATION_MISSING.to_string());
        }

        let path_target = resolve_destination_path(path_src, path_dst);
        let res_op = match self.operation {
            EnumFileOperation::Move => ensure_vacant_target(path_dst, &path_target)
                .and_then(|_| move_file(path_src, &path_target))
                .map(|_| C_STATUS_FILE_MOVED),
            EnumFileOperation::Copy => {
                copy_file_with_metadata(path_src, &path_target).map(|_| C_STATUS_FILE_COPIED)
            }
        };
        match res_op {
            Ok(status) => EnumOutcome::Success(status.to_string()),
            Err(e) => EnumOutcome::RecoverableFailure(e.to_string()),
        }
    }
}
