//! `fileroute_stage` v1:
//! Streaming record stage that copies or moves one file per record and routes
//! the record, plus a `file_result` status, to a success or an error channel.
//!
//! Modules:
//! - `conf`        : fixed constants and host message texts
//! - `spec`        : options/enums/errors
//! - `shape`       : record shapes, field references, output-shape derivation
//! - `record`      : field values, records, reusable record builder
//! - `mapper`      : input-to-output field mapping
//! - `executor`    : per-record filesystem operation and failure classification
//! - `channel`     : downstream channel contract
//! - `diagnostics` : injected host diagnostics sink
//! - `router`      : success/error routing and progress forwarding
//! - `report`      : run-time report model
//! - `stage`       : lifecycle state machine tying everything together
//! - `util`        : shared filesystem helpers

pub mod channel;
pub mod conf;
pub mod diagnostics;
pub mod executor;
pub mod mapper;
pub mod record;
pub mod report;
pub mod router;
pub mod shape;
pub mod spec;
pub mod stage;
mod util;

pub use channel::{CollectingChannel, EnumOutputAnchor, OutputChannel};
pub use diagnostics::{
    CollectingDiagnosticSink, DiagnosticSink, EnumDiagnosticLevel, TracingDiagnosticSink,
};
pub use executor::{EnumOutcome, FileOperationExecutor, SpecExecution};
pub use mapper::FieldMapper;
pub use record::{EnumFieldValue, Record, RecordBuilder};
pub use report::{ReportStage, ReportStageBuilder};
pub use router::OutputRouter;
pub use shape::{EnumFieldType, FieldRef, RecordShape, SpecField, derive_output_shape};
pub use spec::{EnumFileOperation, EnumStageState, ShapeError, SpecStageOptions, StageError};
pub use stage::TransformStage;
