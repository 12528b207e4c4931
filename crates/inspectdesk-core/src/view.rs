//! List and detail projections handed to the presentation layer.
//!
//! Only the data contract lives here: column names, string cells, derived
//! status badges and grouped detail fields. Rendering is somebody else's job.

use crate::config::PageSize;
use crate::id::RecordId;
use crate::record::{EntityKind, Record, Stored};

/// Status badge derived from a record's fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Pending,
    Completed,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub id: RecordId,
    pub cells: Vec<String>,
    pub status: Option<Status>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableView {
    pub kind: EntityKind,
    pub columns: Vec<&'static str>,
    pub rows: Vec<TableRow>,
    /// Row count before paging.
    pub total: usize,
}

impl TableView {
    pub fn ids(&self) -> Vec<&RecordId> {
        self.rows.iter().map(|r| &r.id).collect()
    }

    /// Cell under `column` in row `row`.
    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.columns.iter().position(|c| *c == column)?;
        self.rows.get(row)?.cells.get(idx).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetailSection {
    pub header: &'static str,
    pub fields: Vec<(&'static str, String)>,
}

impl DetailSection {
    pub fn new(header: &'static str, fields: Vec<(&'static str, String)>) -> Self {
        Self { header, fields }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetailView {
    pub title: String,
    pub sections: Vec<DetailSection>,
}

impl DetailView {
    /// First field with the given label, across all sections.
    pub fn field(&self, label: &str) -> Option<&str> {
        self.sections
            .iter()
            .flat_map(|s| s.fields.iter())
            .find(|(l, _)| *l == label)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_section(&self, header: &str) -> bool {
        self.sections.iter().any(|s| s.header == header)
    }
}

/// Table and detail projection of a record type.
pub trait Tabular: Record {
    const COLUMNS: &'static [&'static str];

    /// One cell per entry of [`COLUMNS`](Self::COLUMNS).
    fn cells(&self) -> Vec<String>;

    fn status(&self) -> Option<Status> {
        None
    }

    fn detail(stored: &Stored<Self>) -> DetailView;
}

/// Project records into a table, in the order given, truncated to `page`.
pub fn table<'a, T: Tabular + 'a>(
    records: impl IntoIterator<Item = &'a Stored<T>>,
    page: PageSize,
) -> TableView {
    let all: Vec<&Stored<T>> = records.into_iter().collect();
    let total = all.len();
    let rows = page
        .apply(&all)
        .iter()
        .map(|stored| TableRow {
            id: stored.id.clone(),
            cells: stored.record.cells(),
            status: stored.record.status(),
        })
        .collect();
    TableView {
        kind: T::KIND,
        columns: T::COLUMNS.to_vec(),
        rows,
        total,
    }
}
