use indicatif::ParallelProgressIterator;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use super::calendar::{CalendarWindow, CoverageMatrix};
use super::days_grouping;
use super::error::RecordError;
use super::records::{FileRecord, RawFileRecord};
use super::report::{ValidityReportRow, build_report};
use super::resolver::{GroupResolution, ResolvedTable, resolve_group};
use super::utils::progress_bar_for_count;

/// A record dropped from the run because of a data-quality error.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RejectedRecord {
    pub dataset_id: String,
    pub file_name: String,
    pub service_code: String,
    pub line_name: String,
    pub reason: String,
    #[serde(skip)]
    pub error: RecordError,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Resolution {
    pub table: ResolvedTable,
    pub report: Vec<ValidityReportRow>,
    pub rejected: Vec<RejectedRecord>,
}

/// Runs the whole batch: validation, grouping, per-date resolution and the
/// gap/conflict report.
pub fn resolve(raw_records: Vec<RawFileRecord>, window: CalendarWindow) -> Resolution {
    let (records, rejected) = normalise(raw_records);
    let (table, report) = resolve_records(records, window);
    Resolution {
        table,
        report,
        rejected,
    }
}

/// Validates raw records and puts the survivors in table order: service code,
/// line name, revision number, then the published operating-days text
/// (alphabetical, so `Friday` comes before `Thursday-Friday`). Grouping relies
/// on this order to find the equal-or-higher revisions ahead of each record.
pub fn normalise(raw_records: Vec<RawFileRecord>) -> (Vec<FileRecord>, Vec<RejectedRecord>) {
    let mut records = Vec::with_capacity(raw_records.len());
    let mut rejected = Vec::new();
    for raw in raw_records {
        let identity = (
            raw.dataset_id.clone(),
            raw.file_name.clone(),
            raw.service_code.clone(),
            raw.line_name.clone(),
        );
        match FileRecord::from_raw(raw) {
            Ok(record) => records.push(record),
            Err(error) => {
                let (dataset_id, file_name, service_code, line_name) = identity;
                warn!(%file_name, %service_code, %line_name, "Excluding file record: {error}");
                rejected.push(RejectedRecord {
                    dataset_id,
                    file_name,
                    service_code,
                    line_name,
                    reason: error.to_string(),
                    error,
                });
            }
        }
    }
    records.sort_by(|a, b| {
        (&a.service_code, &a.line_name, a.revision_number, &a.operating_days_text).cmp(&(
            &b.service_code,
            &b.line_name,
            b.revision_number,
            &b.operating_days_text,
        ))
    });
    info!(
        "Accepted {} file records, rejected {}",
        records.len(),
        rejected.len()
    );
    (records, rejected)
}

/// Resolves records that are already validated and in table order.
pub fn resolve_records(
    records: Vec<FileRecord>,
    window: CalendarWindow,
) -> (ResolvedTable, Vec<ValidityReportRow>) {
    info!(
        "Resolving {} file records from {} to {}",
        records.len(),
        window.first(),
        window.last()
    );
    let coverage = CoverageMatrix::build(&records, &window);
    let groups = days_grouping::group(&records);

    let progress = progress_bar_for_count(groups.len());
    let resolutions: Vec<GroupResolution> = groups
        .into_par_iter()
        .progress_with(progress)
        .map(|group| resolve_group(&records, &coverage, group, &window))
        .collect();

    let report = build_report(&records, &resolutions);
    let flagged = report
        .iter()
        .filter(|row| row.look_ahead_missing_flag || row.multiple_valid_files_issue_flag)
        .count();
    info!("{flagged} of {} days groups have lookahead gaps or conflicts", report.len());

    let table = ResolvedTable::assemble(records, &resolutions, window);
    (table, report)
}
