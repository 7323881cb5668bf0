use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{fmt, io::Read, str::FromStr};
use tracing::info;

use super::error::RecordError;

/// Reads the service-line table exported by the ingestion side.
pub fn read_file(file_path: &str) -> Result<Vec<RawFileRecord>> {
    info!("Reading file records from {file_path}");
    let file = fs_err::File::open(file_path)?;
    let records = read_records(file)
        .with_context(|| format!("Malformed file record table {file_path}"))?;
    info!("Number of file records: {}", records.len());
    Ok(records)
}

pub fn read_records<R: Read>(reader: R) -> Result<Vec<RawFileRecord>> {
    let mut reader = csv::Reader::from_reader(reader);
    let records = reader
        .deserialize()
        .collect::<Result<Vec<RawFileRecord>, _>>()?;
    Ok(records)
}

/// One row of the upstream service-line extract, untouched.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct RawFileRecord {
    #[serde(rename = "DatasetID")]
    pub dataset_id: String,
    #[serde(rename = "OperatorName", default)]
    pub operator_name: String,
    #[serde(rename = "FileName")]
    pub file_name: String,
    #[serde(rename = "TradingName", default)]
    pub trading_name: String,
    #[serde(rename = "ServiceCode")]
    pub service_code: String,
    #[serde(rename = "LineName")]
    pub line_name: String,
    #[serde(rename = "OperatingPeriodStartDate")]
    pub operating_period_start: String,
    #[serde(rename = "OperatingPeriodEndDate", default)]
    pub operating_period_end: String,
    #[serde(rename = "RevisionNumber")]
    pub revision_number: String,
    #[serde(rename = "OperatingDays")]
    pub operating_days: String,
}

/// A timetable file's service-line descriptor after validation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FileRecord {
    pub dataset_id: String,
    pub operator_name: String,
    pub file_name: String,
    pub trading_name: String,
    pub service_code: ServiceCode,
    pub line_name: LineName,
    pub operating_period_start: NaiveDate,
    /// `None` for services running until further notice.
    pub operating_period_end: Option<NaiveDate>,
    pub revision_number: RevisionNumber,
    pub operating_days: OperatingDays,
    /// The pattern as published, e.g. `Monday-Friday`. Breaks ties in table order.
    pub operating_days_text: String,
}

impl FileRecord {
    pub fn from_raw(raw: RawFileRecord) -> Result<Self, RecordError> {
        let operating_days = OperatingDays::from_pattern(&raw.operating_days)?;
        let revision_number = RevisionNumber::from_str(&raw.revision_number)?;
        let operating_period_start = parse_date(&raw.operating_period_start)?;
        let operating_period_end = match raw.operating_period_end.trim() {
            "" => None,
            end => Some(parse_date(end)?),
        };
        if let Some(end) = operating_period_end {
            if end < operating_period_start {
                return Err(RecordError::EndBeforeStart {
                    start: operating_period_start,
                    end,
                });
            }
        }
        Ok(FileRecord {
            dataset_id: raw.dataset_id,
            operator_name: raw.operator_name,
            file_name: raw.file_name,
            trading_name: raw.trading_name,
            service_code: ServiceCode(raw.service_code.trim().to_string()),
            line_name: LineName(raw.line_name.trim().to_string()),
            operating_period_start,
            operating_period_end,
            revision_number,
            operating_days,
            operating_days_text: raw.operating_days,
        })
    }

    /// Whether the declared operating period includes `date`.
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.operating_period_start <= date
            && self.operating_period_end.is_none_or(|end| date <= end)
    }
}

// Exports carry either a bare date or a midnight timestamp.
fn parse_date(s: &str) -> Result<NaiveDate, RecordError> {
    let date_part = s
        .trim()
        .split(|c: char| c == 'T' || c.is_whitespace())
        .next()
        .unwrap_or_default();
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|_| RecordError::InvalidDate(s.to_string()))
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize)]
pub struct ServiceCode(pub String);

impl ServiceCode {
    /// The operator licence number, e.g. `PB0000815` for `PB0000815:24`.
    pub fn license_number(&self) -> &str {
        match self.0.split_once(':') {
            Some((license, _)) => license,
            None => &self.0,
        }
    }
}

impl fmt::Display for ServiceCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize)]
pub struct LineName(pub String);

impl fmt::Display for LineName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Higher is newer. Always compared as a number, never as text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize)]
pub struct RevisionNumber(pub i64);

impl FromStr for RevisionNumber {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(RevisionNumber)
            .map_err(|_| RecordError::InvalidRevision(s.to_string()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Day {
    pub const WEEK: [Day; 7] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
        Day::Saturday,
        Day::Sunday,
    ];

    /// Monday is 1, Sunday is 7.
    pub fn week_position(self) -> usize {
        self as usize + 1
    }

    pub fn name(self) -> &'static str {
        match self {
            Day::Monday => "Monday",
            Day::Tuesday => "Tuesday",
            Day::Wednesday => "Wednesday",
            Day::Thursday => "Thursday",
            Day::Friday => "Friday",
            Day::Saturday => "Saturday",
            Day::Sunday => "Sunday",
        }
    }
}

impl FromStr for Day {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Monday" => Ok(Day::Monday),
            "Tuesday" => Ok(Day::Tuesday),
            "Wednesday" => Ok(Day::Wednesday),
            "Thursday" => Ok(Day::Thursday),
            "Friday" => Ok(Day::Friday),
            "Saturday" => Ok(Day::Saturday),
            "Sunday" => Ok(Day::Sunday),
            other => Err(RecordError::UnknownDay(other.to_string())),
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The weekly pattern a timetable applies to, in week order with no repeats.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct OperatingDays(pub Vec<Day>);

impl OperatingDays {
    /// Expands the upstream text form into individual days.
    ///
    /// Accepts a single day (`Saturday`), a comma list (`Monday,Wednesday,`,
    /// trailing comma included as the extract writes it) or an inclusive range
    /// (`Monday-Friday`). Ranges never wrap from Sunday back to Monday.
    pub fn from_pattern(pattern: &str) -> Result<Self, RecordError> {
        let mut days = Vec::new();
        for token in pattern.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            match token.split_once('-') {
                Some((first, last)) => {
                    let first = Day::from_str(first)?;
                    let last = Day::from_str(last)?;
                    if first > last {
                        return Err(RecordError::ReversedDayRange(token.to_string()));
                    }
                    days.extend(Day::WEEK.into_iter().filter(|day| (first..=last).contains(day)));
                }
                None => days.push(Day::from_str(token)?),
            }
        }
        if days.is_empty() {
            return Err(RecordError::EmptyDayPattern(pattern.to_string()));
        }
        days.sort();
        days.dedup();
        Ok(OperatingDays(days))
    }

    pub fn contains(&self, day: &Day) -> bool {
        self.0.contains(day)
    }

    /// Every day of `self` also runs in `other`.
    pub fn is_subset_of(&self, other: &OperatingDays) -> bool {
        self.0.iter().all(|day| other.contains(day))
    }

    /// Formats the days back the way publishers see them: a single name, a
    /// `First-Last` range when consecutive, otherwise a comma list.
    pub fn label(&self) -> String {
        let consecutive = self
            .0
            .windows(2)
            .all(|pair| pair[1].week_position() == pair[0].week_position() + 1);
        match self.0.as_slice() {
            [] => String::new(),
            [day] => day.to_string(),
            [first, .., last] if consecutive => format!("{first}-{last}"),
            days => days.iter().map(|day| day.name()).collect::<Vec<_>>().join(","),
        }
    }
}

impl fmt::Display for OperatingDays {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{date, raw_record};

    #[test]
    fn test_range_expands_in_week_order() {
        let days = OperatingDays::from_pattern("Monday-Friday").unwrap();
        assert_eq!(
            days.0,
            vec![Day::Monday, Day::Tuesday, Day::Wednesday, Day::Thursday, Day::Friday]
        );
    }

    #[test]
    fn test_single_day_and_comma_list() {
        assert_eq!(
            OperatingDays::from_pattern("Saturday").unwrap().0,
            vec![Day::Saturday]
        );
        assert_eq!(
            OperatingDays::from_pattern("Monday,Wednesday,Friday,").unwrap().0,
            vec![Day::Monday, Day::Wednesday, Day::Friday]
        );
        assert_eq!(
            OperatingDays::from_pattern("Sunday,Monday,Monday").unwrap().0,
            vec![Day::Monday, Day::Sunday]
        );
    }

    #[test]
    fn test_malformed_patterns_are_errors() {
        assert_eq!(
            OperatingDays::from_pattern("Funday"),
            Err(RecordError::UnknownDay("Funday".to_string()))
        );
        assert_eq!(
            OperatingDays::from_pattern("Saturday-Monday"),
            Err(RecordError::ReversedDayRange("Saturday-Monday".to_string()))
        );
        assert!(matches!(
            OperatingDays::from_pattern("None"),
            Err(RecordError::UnknownDay(_))
        ));
        assert!(matches!(
            OperatingDays::from_pattern(" , "),
            Err(RecordError::EmptyDayPattern(_))
        ));
    }

    #[test]
    fn test_label_round_trips_upstream_forms() {
        for pattern in ["Monday-Friday", "Saturday", "Monday,Wednesday", "Monday-Sunday"] {
            assert_eq!(OperatingDays::from_pattern(pattern).unwrap().label(), pattern);
        }
        let listed = OperatingDays::from_pattern("Tuesday,Wednesday,Thursday").unwrap();
        assert_eq!(listed.label(), "Tuesday-Thursday");
    }

    #[test]
    fn test_subset_is_one_directional() {
        let weekdays = OperatingDays::from_pattern("Monday-Friday").unwrap();
        let early_week = OperatingDays::from_pattern("Monday,Tuesday").unwrap();
        assert!(early_week.is_subset_of(&weekdays));
        assert!(!weekdays.is_subset_of(&early_week));
        assert!(weekdays.is_subset_of(&weekdays));
    }

    #[test]
    fn test_revision_numbers_compare_numerically() {
        let nine = RevisionNumber::from_str("9").unwrap();
        let ten = RevisionNumber::from_str(" 10 ").unwrap();
        assert!(ten > nine);
        assert_eq!(
            RevisionNumber::from_str("Not Found"),
            Err(RecordError::InvalidRevision("Not Found".to_string()))
        );
    }

    #[test]
    fn test_from_raw_validates_period() {
        let mut raw = raw_record("a.xml", "PB0000815:24", "541", "2024-03-01", "", "1", "Monday-Friday");
        let record = FileRecord::from_raw(raw.clone()).unwrap();
        assert_eq!(record.operating_period_end, None);
        assert_eq!(record.service_code.license_number(), "PB0000815");

        raw.operating_period_start = "2024-03-01 00:00:00".to_string();
        raw.operating_period_end = "2024-03-31T00:00:00".to_string();
        let record = FileRecord::from_raw(raw.clone()).unwrap();
        assert_eq!(record.operating_period_start, date(2024, 3, 1));
        assert_eq!(record.operating_period_end, Some(date(2024, 3, 31)));

        raw.operating_period_end = "2024-02-01".to_string();
        assert_eq!(
            FileRecord::from_raw(raw),
            Err(RecordError::EndBeforeStart {
                start: date(2024, 3, 1),
                end: date(2024, 2, 1)
            })
        );
    }

    #[test]
    fn test_read_records_from_upstream_columns() {
        let table = "\
DatasetID,FileName,ServiceCode,LineName,OperatingPeriodStartDate,OperatingPeriodEndDate,RevisionNumber,OperatingDays
1234,541_r1.xml,PB0000815:24,541,2024-03-01,,3,Monday-Friday
1234,541_sat.xml,PB0000815:24,541,2024-03-01,2024-04-30,1,Saturday
";
        let raw = read_records(table.as_bytes()).unwrap();
        assert_eq!(raw.len(), 2);
        assert_eq!(raw[0].dataset_id, "1234");
        assert_eq!(raw[0].operator_name, "");
        assert_eq!(raw[0].trading_name, "");
        assert_eq!(raw[0].operating_period_end, "");
        assert_eq!(raw[1].operating_period_end, "2024-04-30");

        let record = FileRecord::from_raw(raw[0].clone()).unwrap();
        assert_eq!(record.operating_period_end, None);
        assert_eq!(record.revision_number, RevisionNumber(3));
        assert_eq!(record.operating_days_text, "Monday-Friday");
        assert_eq!(record.file_name, "541_r1.xml");
    }

    #[test]
    fn test_read_records_rejects_missing_required_column() {
        let table = "DatasetID,FileName\n1234,a.xml\n";
        assert!(read_records(table.as_bytes()).is_err());
    }

    #[test]
    fn test_license_number_without_colon_is_whole_code() {
        assert_eq!(ServiceCode("UZ000ABCD".to_string()).license_number(), "UZ000ABCD");
    }
}
