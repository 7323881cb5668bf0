use chrono::NaiveDate;

use super::records::{FileRecord, RawFileRecord};

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn raw_record(
    file_name: &str,
    service_code: &str,
    line_name: &str,
    start: &str,
    end: &str,
    revision: &str,
    operating_days: &str,
) -> RawFileRecord {
    RawFileRecord {
        dataset_id: format!("ds-{file_name}"),
        operator_name: "Test Buses".to_string(),
        file_name: file_name.to_string(),
        trading_name: "Test Buses".to_string(),
        service_code: service_code.to_string(),
        line_name: line_name.to_string(),
        operating_period_start: start.to_string(),
        operating_period_end: end.to_string(),
        revision_number: revision.to_string(),
        operating_days: operating_days.to_string(),
    }
}

pub fn record(
    file_name: &str,
    service_code: &str,
    line_name: &str,
    start: &str,
    end: &str,
    revision: i64,
    operating_days: &str,
) -> FileRecord {
    FileRecord::from_raw(raw_record(
        file_name,
        service_code,
        line_name,
        start,
        end,
        &revision.to_string(),
        operating_days,
    ))
    .unwrap()
}
