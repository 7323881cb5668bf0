use chrono::{Days, Local, NaiveDate, NaiveDateTime};
use serde::Serialize;

use super::error::WindowError;
use super::records::FileRecord;

/// Publishers are expected to have six weeks of data published ahead.
pub const DEFAULT_LOOKAHEAD_DAYS: i64 = 42;

/// The dates a run is evaluated over: the base date plus `lookahead_days`
/// following days, inclusive at both ends.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CalendarWindow {
    dates: Vec<NaiveDate>,
}

impl CalendarWindow {
    pub fn new(base_date: NaiveDate, lookahead_days: i64) -> Result<Self, WindowError> {
        if lookahead_days <= 0 {
            return Err(WindowError::NonPositiveLookahead(lookahead_days));
        }
        let out_of_range = WindowError::OutOfRange {
            base_date,
            lookahead_days,
        };
        let last = base_date
            .checked_add_days(Days::new(lookahead_days as u64))
            .ok_or(out_of_range)?;
        let dates = base_date.iter_days().take_while(|date| *date <= last).collect();
        Ok(CalendarWindow { dates })
    }

    pub fn from_datetime(base: NaiveDateTime, lookahead_days: i64) -> Result<Self, WindowError> {
        Self::new(base.date(), lookahead_days)
    }

    pub fn today(lookahead_days: i64) -> Result<Self, WindowError> {
        Self::new(Local::now().date_naive(), lookahead_days)
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn first(&self) -> NaiveDate {
        self.dates[0]
    }

    pub fn last(&self) -> NaiveDate {
        self.dates[self.dates.len() - 1]
    }

    /// Column of `date` in the window, if it falls inside it.
    pub fn position(&self, date: NaiveDate) -> Option<usize> {
        let offset = (date - self.first()).num_days();
        usize::try_from(offset).ok().filter(|&column| column < self.len())
    }
}

/// One row per file record, one column per window date.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoverageMatrix {
    rows: Vec<Vec<bool>>,
}

impl CoverageMatrix {
    pub fn build(records: &[FileRecord], window: &CalendarWindow) -> Self {
        let rows = records
            .iter()
            .map(|record| window.dates().iter().map(|&date| record.covers(date)).collect())
            .collect();
        CoverageMatrix { rows }
    }

    pub fn covers(&self, row: usize, column: usize) -> bool {
        self.rows[row][column]
    }

    pub fn row(&self, row: usize) -> &[bool] {
        &self.rows[row]
    }
}
