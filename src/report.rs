use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;

use super::days_grouping::DaysGroupId;
use super::records::{FileRecord, LineName, ServiceCode};
use super::resolver::GroupResolution;

/// Lookahead gaps and unresolved ties for one service line days group.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ValidityReportRow {
    pub license_number: String,
    pub service_code: ServiceCode,
    pub line_name: LineName,
    pub days_group: DaysGroupId,
    pub look_ahead_missing_flag: bool,
    pub dates_for_missing_lookahead: Vec<NaiveDate>,
    pub multiple_valid_files_issue_flag: bool,
    pub dates_for_multiple_valid_files: Vec<NaiveDate>,
    pub operating_days: String,
    pub dataset_ids: BTreeSet<String>,
}

pub fn build_report(records: &[FileRecord], resolutions: &[GroupResolution]) -> Vec<ValidityReportRow> {
    let mut report: Vec<ValidityReportRow> = resolutions
        .iter()
        .map(|resolution| report_row(records, resolution))
        .collect();
    report.sort_by(|a, b| {
        (&a.service_code, &a.line_name, a.days_group).cmp(&(&b.service_code, &b.line_name, b.days_group))
    });
    report
}

fn report_row(records: &[FileRecord], resolution: &GroupResolution) -> ValidityReportRow {
    let group = &resolution.group;
    // Highest revision names the group; the latest member takes ties.
    let operating_days = group
        .members
        .iter()
        .max_by_key(|&&row| records[row].revision_number)
        .map(|&row| records[row].operating_days.label())
        .unwrap_or_default();
    ValidityReportRow {
        license_number: group.service_code.license_number().to_string(),
        service_code: group.service_code.clone(),
        line_name: group.line_name.clone(),
        days_group: group.id,
        look_ahead_missing_flag: !resolution.missing_lookahead.is_empty(),
        dates_for_missing_lookahead: resolution.missing_lookahead.clone(),
        multiple_valid_files_issue_flag: !resolution.multiple_valid_files.is_empty(),
        dates_for_multiple_valid_files: resolution.multiple_valid_files.clone(),
        operating_days,
        dataset_ids: group
            .members
            .iter()
            .map(|&row| records[row].dataset_id.clone())
            .collect(),
    }
}
