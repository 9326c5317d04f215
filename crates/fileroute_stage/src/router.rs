//! Routing of finished records to the success or error channel.

use std::sync::Arc;

use tracing::debug;

use crate::channel::{EnumOutputAnchor, OutputChannel};
use crate::executor::EnumOutcome;
use crate::record::RecordBuilder;
use crate::shape::{FieldRef, RecordShape};
use crate::spec::{EnumStageState, StageError};

pub struct OutputRouter {
    output: Box<dyn OutputChannel>,
    error_output: Box<dyn OutputChannel>,
    field_status: Option<FieldRef>,
    if_closed: bool,
}

impl OutputRouter {
    pub fn new(output: Box<dyn OutputChannel>, error_output: Box<dyn OutputChannel>) -> Self {
        Self {
            output,
            error_output,
            field_status: None,
            if_closed: false,
        }
    }

    /// Announce the output shape to both channels and bind the status field.
    pub fn init(&mut self, shape_out: &Arc<RecordShape>, field_status: FieldRef) {
        self.output.init(Arc::clone(shape_out));
        self.error_output.init(Arc::clone(shape_out));
        self.field_status = Some(field_status);
    }

    pub fn is_closed(&self) -> bool {
        self.if_closed
    }

    /// Write the status text, finalize the record and push it to exactly one channel.
    pub fn route(
        &mut self,
        outcome: &EnumOutcome,
        builder: &mut RecordBuilder,
    ) -> Result<EnumOutputAnchor, StageError> {
        if self.if_closed {
            return Err(StageError::InvalidState {
                operation: "route record",
                state: EnumStageState::Closed,
            });
        }
        let Some(field_status) = &self.field_status else {
            return Err(StageError::InvalidState {
                operation: "route record",
                state: EnumStageState::AwaitingInput,
            });
        };
        if !field_status.set_from_string(builder, outcome.status()) {
            return Err(StageError::ShapeMismatch);
        }
        let record = builder.finalize();

        let enum_anchor = if outcome.is_success() {
            self.output.push_record(record);
            EnumOutputAnchor::Output
        } else {
            self.error_output.push_record(record);
            EnumOutputAnchor::ErrorOutput
        };
        debug!(anchor = %enum_anchor, status = outcome.status(), "Record routed");
        Ok(enum_anchor)
    }

    /// Relay upstream progress to the success channel only.
    pub fn forward_progress(&mut self, percent: f64) {
        if !self.if_closed {
            self.output.update_progress(percent);
        }
    }

    /// Close both channels once; later calls do nothing.
    pub fn close(&mut self) {
        if self.if_closed {
            return;
        }
        self.output.close();
        self.error_output.close();
        self.if_closed = true;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::OutputRouter;
    use crate::channel::{CollectingChannel, EnumOutputAnchor};
    use crate::executor::EnumOutcome;
    use crate::record::{EnumFieldValue, RecordBuilder};
    use crate::shape::{EnumFieldType, RecordShape, SpecField};

    fn setup() -> (
        OutputRouter,
        CollectingChannel,
        CollectingChannel,
        RecordBuilder,
    ) {
        let shape_out = Arc::new(
            RecordShape::new(vec![
                SpecField::new("path", EnumFieldType::String, None),
                SpecField::new("file_result", EnumFieldType::String, Some(1000)),
            ])
            .expect("shape"),
        );
        let output = CollectingChannel::new();
        let error_output = CollectingChannel::new();
        let mut router =
            OutputRouter::new(Box::new(output.clone()), Box::new(error_output.clone()));
        let field_status = shape_out.resolve("file_result").expect("status field");
        router.init(&shape_out, field_status);
        (router, output, error_output, RecordBuilder::new(shape_out))
    }

    #[test]
    fn both_channels_receive_identical_shape() {
        let (_router, output, error_output, _builder) = setup();
        let shape_ok = output.shape().expect("shape");
        let shape_err = error_output.shape().expect("shape");
        assert!(Arc::ptr_eq(&shape_ok, &shape_err));
        assert_eq!(output.init_count(), 1);
        assert_eq!(error_output.init_count(), 1);
    }

    #[test]
    fn route_selects_exactly_one_channel() {
        let (mut router, output, error_output, mut builder) = setup();

        builder.set(0, EnumFieldValue::from("/a"));
        let enum_anchor = router
            .route(&EnumOutcome::Success("File Copied".to_string()), &mut builder)
            .expect("route");
        assert_eq!(enum_anchor, EnumOutputAnchor::Output);

        builder.set(0, EnumFieldValue::from("/b"));
        let enum_anchor = router
            .route(
                &EnumOutcome::RecoverableFailure("Source file doesn't exist".to_string()),
                &mut builder,
            )
            .expect("route");
        assert_eq!(enum_anchor, EnumOutputAnchor::ErrorOutput);

        let l_ok = output.records();
        let l_err = error_output.records();
        assert_eq!(l_ok.len(), 1);
        assert_eq!(l_err.len(), 1);
        assert_eq!(
            l_ok[0].values(),
            &[EnumFieldValue::from("/a"), EnumFieldValue::from("File Copied")]
        );
        assert_eq!(
            l_err[0].value_by_name("file_result"),
            Some(&EnumFieldValue::from("Source file doesn't exist"))
        );
    }

    #[test]
    fn status_text_is_bounded_by_field_size() {
        let (mut router, _output, error_output, mut builder) = setup();
        let txt_long = "x".repeat(1500);
        router
            .route(&EnumOutcome::RecoverableFailure(txt_long), &mut builder)
            .expect("route");
        let l_records = error_output.records();
        let Some(EnumFieldValue::Text(txt)) = l_records[0].value_by_name("file_result") else {
            panic!("expected text status");
        };
        assert_eq!(txt.chars().count(), 1000);
    }

    #[test]
    fn progress_goes_to_success_channel_only() {
        let (mut router, output, error_output, _builder) = setup();
        router.forward_progress(0.25);
        router.forward_progress(0.75);
        assert_eq!(output.progress_values(), vec![0.25, 0.75]);
        assert!(error_output.progress_values().is_empty());
    }

    #[test]
    fn close_is_idempotent_and_blocks_routing() {
        let (mut router, output, error_output, mut builder) = setup();
        router.close();
        router.close();
        assert_eq!(output.close_count(), 1);
        assert_eq!(error_output.close_count(), 1);
        assert!(
            router
                .route(&EnumOutcome::Success("File Copied".to_string()), &mut builder)
                .is_err()
        );
    }
}
