use chrono::NaiveDate;
use thiserror::Error;

/// Data-quality problems found in a single file record. The record is
/// dropped from the run and the batch carries on.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("unrecognised day name {0:?}")]
    UnknownDay(String),

    #[error("day range {0:?} runs backwards through the week")]
    ReversedDayRange(String),

    #[error("no operating days in {0:?}")]
    EmptyDayPattern(String),

    #[error("revision number {0:?} is not an integer")]
    InvalidRevision(String),

    #[error("operating period date {0:?} is not a calendar date")]
    InvalidDate(String),

    #[error("operating period ends on {end} before it starts on {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum WindowError {
    #[error("lookahead must be at least one day, got {0}")]
    NonPositiveLookahead(i64),

    #[error("a {lookahead_days} day lookahead from {base_date} runs past the calendar")]
    OutOfRange {
        base_date: NaiveDate,
        lookahead_days: i64,
    },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("invalid operating days in query: {0}")]
    InvalidDayPattern(#[from] RecordError),

    #[error("no record for service {service_code}, line {line_name}, operating {operating_days}")]
    NotFound {
        service_code: String,
        line_name: String,
        operating_days: String,
    },

    #[error("{0} is outside the resolved calendar window")]
    DateOutsideWindow(NaiveDate),
}
