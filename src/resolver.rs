use chrono::NaiveDate;
use serde::Serialize;

use super::calendar::{CalendarWindow, CoverageMatrix};
use super::days_grouping::{DaysGroup, DaysGroupId};
use super::records::FileRecord;

/// State of one file on one date after resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Validity {
    Valid,
    /// Covered by the operating period but superseded by a higher revision.
    Invalidated,
    /// Outside the operating period.
    NotApplicable,
}

/// Outcome for one days group on one date. Rows are record table indices.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum ResolvedCell {
    Winner(usize),
    /// Two or more files share the highest revision.
    Conflict(Vec<usize>),
    Missing,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupResolution {
    pub group: DaysGroup,
    /// One cell per window date.
    pub cells: Vec<ResolvedCell>,
    /// One row per group member, aligned with `group.members`.
    pub validity: Vec<Vec<Validity>>,
    pub missing_lookahead: Vec<NaiveDate>,
    pub multiple_valid_files: Vec<NaiveDate>,
}

/// Picks the authoritative file of `group` for every window date.
///
/// Among the members covering a date the highest revision wins and every
/// lower revision is invalidated for that date. Members tied on the highest
/// revision all stay valid and the date is reported as a conflict. A date no
/// member covers is reported as missing.
pub fn resolve_group(
    records: &[FileRecord],
    coverage: &CoverageMatrix,
    group: DaysGroup,
    window: &CalendarWindow,
) -> GroupResolution {
    let mut cells = Vec::with_capacity(window.len());
    let mut validity = vec![Vec::with_capacity(window.len()); group.members.len()];
    let mut missing_lookahead = Vec::new();
    let mut multiple_valid_files = Vec::new();

    for (column, &date) in window.dates().iter().enumerate() {
        let winner_revision = group
            .members
            .iter()
            .filter(|&&row| coverage.covers(row, column))
            .map(|&row| records[row].revision_number)
            .max();

        let Some(winner_revision) = winner_revision else {
            for row_validity in validity.iter_mut() {
                row_validity.push(Validity::NotApplicable);
            }
            cells.push(ResolvedCell::Missing);
            missing_lookahead.push(date);
            continue;
        };

        let mut winners = Vec::new();
        for (position, &row) in group.members.iter().enumerate() {
            let state = if !coverage.covers(row, column) {
                Validity::NotApplicable
            } else if records[row].revision_number < winner_revision {
                Validity::Invalidated
            } else {
                winners.push(row);
                Validity::Valid
            };
            validity[position].push(state);
        }

        if winners.len() == 1 {
            cells.push(ResolvedCell::Winner(winners[0]));
        } else {
            multiple_valid_files.push(date);
            cells.push(ResolvedCell::Conflict(winners));
        }
    }

    GroupResolution {
        group,
        cells,
        validity,
        missing_lookahead,
        multiple_valid_files,
    }
}

/// A file record with its resolved state on each window date.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResolvedRow {
    #[serde(flatten)]
    pub record: FileRecord,
    pub days_group: DaysGroupId,
    pub validity: Vec<Validity>,
}

impl ResolvedRow {
    pub fn is_valid_at(&self, column: usize) -> bool {
        self.validity.get(column) == Some(&Validity::Valid)
    }

    pub fn is_valid_anywhere(&self) -> bool {
        self.validity.contains(&Validity::Valid)
    }
}

/// The validity table: every accepted record against every window date.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResolvedTable {
    pub window: CalendarWindow,
    pub rows: Vec<ResolvedRow>,
}

impl ResolvedTable {
    /// Stitches per-group results back onto the record table. Every record
    /// belongs to exactly one group, so no two resolutions touch the same row.
    pub fn assemble(
        records: Vec<FileRecord>,
        resolutions: &[GroupResolution],
        window: CalendarWindow,
    ) -> Self {
        let mut placement: Vec<Option<(DaysGroupId, Vec<Validity>)>> = vec![None; records.len()];
        for resolution in resolutions {
            for (&row, validity) in resolution.group.members.iter().zip(&resolution.validity) {
                placement[row] = Some((resolution.group.id, validity.clone()));
            }
        }
        let rows = records
            .into_iter()
            .zip(placement)
            .filter_map(|(record, placed)| {
                placed.map(|(days_group, validity)| ResolvedRow {
                    record,
                    days_group,
                    validity,
                })
            })
            .collect();
        ResolvedTable { window, rows }
    }

    /// Rows valid on at least one window date: what a consumer needs to keep.
    pub fn consumer_rows(&self) -> impl Iterator<Item = &ResolvedRow> {
        self.rows.iter().filter(|row| row.is_valid_anywhere())
    }

    /// Rows valid on `date`. Empty when the date is outside the window.
    pub fn valid_on(&self, date: NaiveDate) -> Vec<&ResolvedRow> {
        match self.window.position(date) {
            Some(column) => self.rows.iter().filter(|row| row.is_valid_at(column)).collect(),
            None => Vec::new(),
        }
    }

    /// Rows not valid on `date`, e.g. files a consumer can drop for today.
    pub fn invalid_on(&self, date: NaiveDate) -> Vec<&ResolvedRow> {
        match self.window.position(date) {
            Some(column) => self.rows.iter().filter(|row| !row.is_valid_at(column)).collect(),
            None => self.rows.iter().collect(),
        }
    }
}
