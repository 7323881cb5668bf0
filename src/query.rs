use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

use super::error::QueryError;
use super::records::OperatingDays;
use super::resolver::{ResolvedRow, ResolvedTable};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum ValidFile {
    File(String),
    NoValidFile,
}

impl fmt::Display for ValidFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidFile::File(file_name) => f.write_str(file_name),
            ValidFile::NoValidFile => f.write_str("No valid file"),
        }
    }
}

impl ResolvedTable {
    /// Which file a consumer should use for a service line on `date`.
    ///
    /// `operating_days` is read with the same rules as the input, so
    /// `Monday-Friday` and the spelled-out weekday list are the same key. The
    /// answer comes from the whole days group of the matching row. If a tie
    /// left several files valid, the latest in table order is returned.
    pub fn valid_file_for(
        &self,
        date: NaiveDate,
        service_code: &str,
        line_name: &str,
        operating_days: &str,
    ) -> Result<ValidFile, QueryError> {
        let days = OperatingDays::from_pattern(operating_days)?;
        let matching = self
            .rows
            .iter()
            .find(|row| row_matches(row, service_code, line_name) && row.record.operating_days == days)
            .ok_or_else(|| QueryError::NotFound {
                service_code: service_code.to_string(),
                line_name: line_name.to_string(),
                operating_days: operating_days.to_string(),
            })?;
        let column = self
            .window
            .position(date)
            .ok_or(QueryError::DateOutsideWindow(date))?;

        let valid_file = self
            .rows
            .iter()
            .filter(|row| {
                row_matches(row, service_code, line_name) && row.days_group == matching.days_group
            })
            .filter(|row| row.is_valid_at(column))
            .last()
            .map(|row| ValidFile::File(row.record.file_name.clone()))
            .unwrap_or(ValidFile::NoValidFile);
        Ok(valid_file)
    }
}

fn row_matches(row: &ResolvedRow, service_code: &str, line_name: &str) -> bool {
    row.record.service_code.0 == service_code && row.record.line_name.0 == line_name
}
