//! Stage report model and mutable report builder.

use std::collections::BTreeMap;
use std::fmt;

use crate::channel::EnumOutputAnchor;
use crate::spec::EnumFileOperation;

/// Aggregate counters for one stage run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReportStage {
    /// Records offered by the upstream.
    pub cnt_received: u64,
    /// Records dropped because a path value was null.
    pub cnt_dropped: u64,
    /// Records routed to `Output` after a copy.
    pub cnt_copied: u64,
    /// Records routed to `Output` after a move.
    pub cnt_moved: u64,
    /// Records routed to `ErrorOutput`.
    pub cnt_failed: u64,
    /// Directory-tree creation failures (non-fatal).
    pub cnt_dir_errors: u64,
}

impl ReportStage {
    /// Records emitted on either channel.
    pub fn routed_count(&self) -> u64 {
        self.cnt_copied + self.cnt_moved + self.cnt_failed
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_received".to_string(), self.cnt_received);
        dict_counts.insert("cnt_dropped".to_string(), self.cnt_dropped);
        dict_counts.insert("cnt_copied".to_string(), self.cnt_copied);
        dict_counts.insert("cnt_moved".to_string(), self.cnt_moved);
        dict_counts.insert("cnt_failed".to_string(), self.cnt_failed);
        dict_counts.insert("cnt_dir_errors".to_string(), self.cnt_dir_errors);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        format!(
            "{prefix} received={} dropped={} copied={} moved={} failed={} dir_errors={}",
            self.cnt_received,
            self.cnt_dropped,
            self.cnt_copied,
            self.cnt_moved,
            self.cnt_failed,
            self.cnt_dir_errors
        )
    }
}

impl fmt::Display for ReportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[FILEROUTE]"))
    }
}

/// Mutable accumulator, snapshotted into [`ReportStage`].
#[derive(Debug, Default, Clone)]
pub struct ReportStageBuilder {
    report: ReportStage,
}

impl ReportStageBuilder {
    pub fn add_received(&mut self) {
        self.report.cnt_received += 1;
    }

    pub fn add_dropped(&mut self) {
        self.report.cnt_dropped += 1;
    }

    pub fn add_dir_error(&mut self) {
        self.report.cnt_dir_errors += 1;
    }

    /// Count one routed record by destination channel and operation.
    pub fn add_routed(&mut self, enum_anchor: EnumOutputAnchor, operation: EnumFileOperation) {
        match (enum_anchor, operation) {
            (EnumOutputAnchor::ErrorOutput, _) => self.report.cnt_failed += 1,
            (EnumOutputAnchor::Output, EnumFileOperation::Copy) => self.report.cnt_copied += 1,
            (EnumOutputAnchor::Output, EnumFileOperation::Move) => self.report.cnt_moved += 1,
        }
    }

    pub fn snapshot(&self) -> ReportStage {
        self.report.clone()
    }

    pub fn build(self) -> ReportStage {
        self.report
    }
}

#[cfg(test)]
mod tests {
    use super::{ReportStage, ReportStageBuilder};
    use crate::channel::EnumOutputAnchor;
    use crate::spec::EnumFileOperation;

    #[test]
    fn report_to_dict_and_format() {
        let report = ReportStage {
            cnt_received: 6,
            cnt_dropped: 1,
            cnt_copied: 3,
            cnt_moved: 0,
            cnt_failed: 2,
            cnt_dir_errors: 1,
        };

        let dict_counts = report.to_dict();
        assert_eq!(dict_counts["cnt_received"], 6);
        assert_eq!(dict_counts["cnt_failed"], 2);
        assert_eq!(report.routed_count(), 5);
        assert_eq!(
            report.to_string(),
            "[FILEROUTE] received=6 dropped=1 copied=3 moved=0 failed=2 dir_errors=1"
        );
    }

    #[test]
    fn builder_counts_by_anchor_and_operation() {
        let mut builder = ReportStageBuilder::default();
        builder.add_received();
        builder.add_routed(EnumOutputAnchor::Output, EnumFileOperation::Move);
        builder.add_received();
        builder.add_routed(EnumOutputAnchor::ErrorOutput, EnumFileOperation::Move);

        let report = builder.build();
        assert_eq!(report.cnt_received, 2);
        assert_eq!(report.cnt_moved, 1);
        assert_eq!(report.cnt_failed, 1);
        assert_eq!(report.cnt_copied, 0);
    }
}
