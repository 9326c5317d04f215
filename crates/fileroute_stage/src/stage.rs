//! The single-input, dual-output transform stage.
//!
//! Lifecycle: `Unconfigured -> Configured -> AwaitingInput -> Ready -> Streaming -> Closed`.
//! Host callbacks map onto the methods below; the stage never depends on a host
//! being present, only on the injected channels and diagnostics sink.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::channel::{EnumOutputAnchor, OutputChannel};
use crate::conf::{
    C_FIELD_NAME_FILE_RESULT, C_MSG_MISSING_INCOMING_CONNECTION, C_MSG_SELECT_DESTINATION_FIELD,
    C_MSG_SELECT_SOURCE_FIELD, ENUM_FIELD_TYPE_FILE_RESULT, N_SIZE_FILE_RESULT_MAX,
};
use crate::diagnostics::{DiagnosticSink, EnumDiagnosticLevel, TracingDiagnosticSink};
use crate::executor::FileOperationExecutor;
use crate::mapper::FieldMapper;
use crate::record::{Record, RecordBuilder};
use crate::report::{ReportStage, ReportStageBuilder};
use crate::router::OutputRouter;
use crate::shape::{FieldRef, RecordShape, derive_output_shape};
use crate::spec::{EnumStageState, SpecStageOptions, StageError};

/// Everything resolved once the input shape is known.
struct SpecStreamContext {
    shape_out: Arc<RecordShape>,
    field_source: FieldRef,
    field_destination: FieldRef,
    field_status: FieldRef,
    mapper: FieldMapper,
    builder: RecordBuilder,
}

pub struct TransformStage {
    spec_options: SpecStageOptions,
    executor: FileOperationExecutor,
    state: EnumStageState,
    if_connected: bool,
    router: OutputRouter,
    sink: Box<dyn DiagnosticSink>,
    ctx: Option<SpecStreamContext>,
    builder_report: ReportStageBuilder,
}

impl TransformStage {
    /// Build the stage and validate `spec_options`.
    ///
    /// Invalid options are reported to `sink` and leave the stage `Unconfigured`;
    /// construction itself never fails.
    pub fn new(
        spec_options: SpecStageOptions,
        output: impl OutputChannel + 'static,
        error_output: impl OutputChannel + 'static,
        sink: impl DiagnosticSink + 'static,
    ) -> Self {
        let mut sink: Box<dyn DiagnosticSink> = Box::new(sink);
        let state = match spec_options.validate() {
            Ok(()) => EnumStageState::Configured,
            Err(l_errors) => {
                for e in &l_errors {
                    error!(error = %e, "Invalid stage options");
                    sink.report(EnumDiagnosticLevel::Error, &e.to_string());
                }
                EnumStageState::Unconfigured
            }
        };
        Self {
            executor: FileOperationExecutor::from_options(&spec_options),
            spec_options,
            state,
            if_connected: false,
            router: OutputRouter::new(Box::new(output), Box::new(error_output)),
            sink,
            ctx: None,
            builder_report: ReportStageBuilder::default(),
        }
    }

    /// Same as [`TransformStage::new`] with diagnostics going to `tracing`.
    pub fn with_tracing(
        spec_options: SpecStageOptions,
        output: impl OutputChannel + 'static,
        error_output: impl OutputChannel + 'static,
    ) -> Self {
        Self::new(
            spec_options,
            output,
            error_output,
            TracingDiagnosticSink::default(),
        )
    }

    pub fn state(&self) -> EnumStageState {
        self.state
    }

    pub fn options(&self) -> &SpecStageOptions {
        &self.spec_options
    }

    pub fn output_shape(&self) -> Option<Arc<RecordShape>> {
        self.ctx.as_ref().map(|ctx| Arc::clone(&ctx.shape_out))
    }

    pub fn report(&self) -> ReportStage {
        self.builder_report.snapshot()
    }

    /// Accept the single upstream connection.
    pub fn add_incoming_connection(&mut self) -> Result<(), StageError> {
        if self.state == EnumStageState::Closed {
            return Err(self.invalid_state("add incoming connection"));
        }
        if self.if_connected {
            return Err(StageError::ConnectionAlreadyEstablished);
        }
        self.if_connected = true;
        if self.state == EnumStageState::Configured {
            self.state = EnumStageState::AwaitingInput;
        }
        Ok(())
    }

    /// Negotiate the input shape: resolve path fields, derive and announce the
    /// output shape, build the field mapping.
    ///
    /// An `Err` is the "not ready" signal; it has already been reported to the sink.
    pub fn init_input(&mut self, shape_in: Arc<RecordShape>) -> Result<(), StageError> {
        match self.state {
            EnumStageState::AwaitingInput => {}
            EnumStageState::Unconfigured => {
                let (e, msg) = if self.spec_options.field_source.trim().is_empty() {
                    (StageError::MissingSourceField, C_MSG_SELECT_SOURCE_FIELD)
                } else {
                    (
                        StageError::MissingDestinationField,
                        C_MSG_SELECT_DESTINATION_FIELD,
                    )
                };
                self.sink.report(EnumDiagnosticLevel::Error, msg);
                return Err(e);
            }
            EnumStageState::Configured => return Err(self.fail_missing_connection()),
            _ => return Err(self.invalid_state("initialize input")),
        }

        let ctx = match self.build_context(&shape_in) {
            Ok(ctx) => ctx,
            Err(e) => {
                error!(error = %e, "Input initialization failed");
                self.sink.report(EnumDiagnosticLevel::Error, &e.to_string());
                return Err(e);
            }
        };
        self.router.init(&ctx.shape_out, ctx.field_status.clone());
        debug!(
            n_fields_in = shape_in.len(),
            n_fields_out = ctx.shape_out.len(),
            "Output shape announced"
        );
        self.ctx = Some(ctx);
        self.state = EnumStageState::Ready;
        Ok(())
    }

    fn build_context(&self, shape_in: &Arc<RecordShape>) -> Result<SpecStreamContext, StageError> {
        let field_source = resolve_field(shape_in, &self.spec_options.field_source)?;
        let field_destination = resolve_field(shape_in, &self.spec_options.field_destination)?;
        let shape_out = Arc::new(derive_output_shape(
            shape_in,
            C_FIELD_NAME_FILE_RESULT,
            ENUM_FIELD_TYPE_FILE_RESULT,
            N_SIZE_FILE_RESULT_MAX,
        )?);
        let field_status = resolve_field(&shape_out, C_FIELD_NAME_FILE_RESULT)?;
        let mapper = FieldMapper::build(shape_in, &shape_out)?;
        Ok(SpecStreamContext {
            builder: RecordBuilder::new(Arc::clone(&shape_out)),
            shape_out,
            field_source,
            field_destination,
            field_status,
            mapper,
        })
    }

    /// Process one record synchronously.
    ///
    /// Returns the channel the record went to, or `None` when it was dropped
    /// because a path value was null. Per-record filesystem failures are routed
    /// to `ErrorOutput`, never returned as `Err`.
    pub fn push_record(
        &mut self,
        record: &Record,
    ) -> Result<Option<EnumOutputAnchor>, StageError> {
        match self.state {
            EnumStageState::Ready | EnumStageState::Streaming => {}
            EnumStageState::Unconfigured | EnumStageState::Configured if !self.if_connected => {
                return Err(self.fail_missing_connection());
            }
            _ => return Err(self.invalid_state("push record")),
        }
        let Some(ctx) = self.ctx.as_mut() else {
            return Err(StageError::InvalidState {
                operation: "push record",
                state: self.state,
            });
        };
        self.state = EnumStageState::Streaming;

        ctx.builder.reset();
        ctx.mapper.copy(record, &mut ctx.builder)?;
        self.builder_report.add_received();

        let path_source = ctx.field_source.get_as_string(record);
        let path_destination = ctx.field_destination.get_as_string(record);
        let Some(execution) = self
            .executor
            .execute(path_source.as_deref(), path_destination.as_deref())
        else {
            ctx.builder.reset();
            self.builder_report.add_dropped();
            debug!("Record dropped: null path value");
            return Ok(None);
        };

        if let Some(msg) = &execution.error_create_dirs {
            warn!(path = path_destination.as_deref(), "{msg}");
            self.sink.report(EnumDiagnosticLevel::Error, msg);
            self.builder_report.add_dir_error();
        }

        let enum_anchor = self.router.route(&execution.outcome, &mut ctx.builder)?;
        self.builder_report
            .add_routed(enum_anchor, self.executor.operation());
        Ok(Some(enum_anchor))
    }

    /// Called when the host asks this stage to produce records on its own.
    ///
    /// Only valid as a no-op once an upstream is connected.
    pub fn push_all_records(&mut self) -> Result<(), StageError> {
        if self.if_connected {
            return Ok(());
        }
        Err(self.fail_missing_connection())
    }

    /// Relay upstream progress to the host and to the success channel.
    pub fn update_progress(&mut self, percent: f64) {
        if self.state == EnumStageState::Closed {
            return;
        }
        let percent = percent.clamp(0.0, 1.0);
        self.sink.progress(percent);
        self.router.forward_progress(percent);
    }

    /// Close both channels; safe to call more than once.
    pub fn close(&mut self) {
        if self.state == EnumStageState::Closed {
            return;
        }
        self.router.close();
        self.state = EnumStageState::Closed;
        self.ctx = None;
        info!("{}", self.builder_report.snapshot());
    }

    fn fail_missing_connection(&mut self) -> StageError {
        error!("{C_MSG_MISSING_INCOMING_CONNECTION}");
        self.sink
            .report(EnumDiagnosticLevel::Error, C_MSG_MISSING_INCOMING_CONNECTION);
        StageError::MissingIncomingConnection
    }

    fn invalid_state(&self, operation: &'static str) -> StageError {
        StageError::InvalidState {
            operation,
            state: self.state,
        }
    }
}

impl Drop for TransformStage {
    fn drop(&mut self) {
        self.close();
    }
}

fn resolve_field(shape: &Arc<RecordShape>, name: &str) -> Result<FieldRef, StageError> {
    shape
        .resolve(name)
        .ok_or_else(|| StageError::FieldNotFound {
            name: name.to_string(),
        })
}
