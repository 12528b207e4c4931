//! Spreadsheet exchange as CSV through Arrow record batches.
//!
//! Every cell is text: exports write Utf8 columns and imports read every
//! column back as Utf8 regardless of what the file looks like.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, StringArray};
use arrow::csv::reader::Format;
use arrow::csv::{ReaderBuilder, WriterBuilder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::error::ArrowError;
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use inspectdesk_core::{Document, Factory, Followup, Inspection, Record, RecordId, Stored, User};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::info;

pub const FACTORY_TEMPLATE_FILE: &str = "factory_template.csv";

/// Template headers and the factory field each one fills.
const FACTORY_COLUMNS: [(&str, &str); 10] = [
    ("លេខចូល", "no"),
    ("ឈ្មោះរោងចក្រ", "factoryname"),
    ("ឈ្មោះរោងចក្រ (EN)", "factoryname_en"),
    ("Sector", "sector"),
    ("ភូមិ", "village"),
    ("ឃុំ", "commune"),
    ("ស្រុក", "district"),
    ("ខេត្ត", "province"),
    ("កម្មករសរុប", "total_workers"),
    ("កម្មករស្រី", "female_workers"),
];

const FACTORY_SAMPLE: [&str; 10] = [
    "EXAMPLE001",
    "រោងចក្រគំរូ",
    "Sample Factory",
    "វិស័យឧស្សាហកម្ម",
    "ភូមិគំរូ",
    "ឃុំគំរូ",
    "ស្រុកគំរូ",
    "ខេត្តគំរូ",
    "100",
    "50",
];

const USER_COLUMNS: [&str; 6] = ["ឈ្មោះ", "ទូរស័ព្ទ", "អ៊ីមែល", "តួនាទី", "មុខងារ", "សង្កាត់"];

const FOLLOWUP_COLUMNS: [&str; 6] = [
    "លេខចូល",
    "រោងចក្រ",
    "កាលបរិច្ឆេទតាមដាន",
    "កាលបរិច្ឆេទកំហិតដើម",
    "ស្ថានភាពតាមដាន",
    "សេចក្តីសន្និដ្ឋាន",
];

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("arrow error: {0}")]
    Arrow(#[from] ArrowError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("column {column} is not text")]
    NotText { column: String },

    #[error("file has none of the expected columns")]
    NoKnownColumns,
}

/// A rectangular grid of text cells under named columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sheet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    /// Cell at `row` under the column named `column`.
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.get(idx).map(String::as_str)
    }

    pub fn to_batch(&self) -> Result<RecordBatch, ExchangeError> {
        let schema = Schema::new(
            self.columns
                .iter()
                .map(|c| Field::new(c, DataType::Utf8, false))
                .collect::<Vec<_>>(),
        );
        let arrays: Vec<ArrayRef> = (0..self.columns.len())
            .map(|i| {
                let values = self
                    .rows
                    .iter()
                    .map(|row| row.get(i).map(String::as_str).unwrap_or(""));
                Arc::new(StringArray::from_iter_values(values)) as ArrayRef
            })
            .collect();
        let options = RecordBatchOptions::new().with_row_count(Some(self.rows.len()));
        Ok(RecordBatch::try_new_with_options(
            Arc::new(schema),
            arrays,
            &options,
        )?)
    }

    pub fn to_csv(&self) -> Result<Vec<u8>, ExchangeError> {
        let batch = self.to_batch()?;
        let mut buf = Vec::new();
        {
            let mut writer = WriterBuilder::new().with_header(true).build(&mut buf);
            writer.write(&batch)?;
        }
        Ok(buf)
    }

    pub fn write_csv(&self, path: &Path) -> Result<(), ExchangeError> {
        let bytes = self.to_csv()?;
        std::fs::write(path, bytes).map_err(|source| ExchangeError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse CSV with a header row. Empty and missing cells read as empty
    /// strings.
    pub fn from_csv(bytes: &[u8]) -> Result<Self, ExchangeError> {
        let (inferred, _) = Format::default()
            .with_header(true)
            .with_truncated_rows(true)
            .infer_schema(Cursor::new(bytes), None)?;
        let columns: Vec<String> = inferred.fields().iter().map(|f| f.name().clone()).collect();
        let mut sheet = Sheet::new(columns.clone());
        if columns.is_empty() {
            return Ok(sheet);
        }

        let schema = Schema::new(
            columns
                .iter()
                .map(|c| Field::new(c, DataType::Utf8, true))
                .collect::<Vec<_>>(),
        );
        let reader = ReaderBuilder::new(Arc::new(schema))
            .with_header(true)
            .with_truncated_rows(true)
            .build(Cursor::new(bytes))?;
        for batch in reader {
            let batch = batch?;
            let texts = columns
                .iter()
                .enumerate()
                .map(|(i, name)| {
                    batch
                        .column(i)
                        .as_any()
                        .downcast_ref::<StringArray>()
                        .ok_or_else(|| ExchangeError::NotText {
                            column: name.clone(),
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            for r in 0..batch.num_rows() {
                sheet.push_row(
                    texts
                        .iter()
                        .map(|a| {
                            if a.is_null(r) {
                                String::new()
                            } else {
                                a.value(r).to_string()
                            }
                        })
                        .collect(),
                );
            }
        }
        Ok(sheet)
    }
}

/// Record types that can be written to a spreadsheet.
pub trait Exportable: Record {
    fn sheet(records: &[Stored<Self>]) -> Result<Sheet, ExchangeError>;
}

impl Exportable for Document {
    fn sheet(records: &[Stored<Self>]) -> Result<Sheet, ExchangeError> {
        flat_sheet(records)
    }
}

impl Exportable for Factory {
    fn sheet(records: &[Stored<Self>]) -> Result<Sheet, ExchangeError> {
        flat_sheet(records)
    }
}

impl Exportable for Inspection {
    fn sheet(records: &[Stored<Self>]) -> Result<Sheet, ExchangeError> {
        flat_sheet(records)
    }
}

/// Relabelled columns; the password never leaves the dashboard.
impl Exportable for User {
    fn sheet(records: &[Stored<Self>]) -> Result<Sheet, ExchangeError> {
        let mut sheet = Sheet::new(USER_COLUMNS);
        for s in records {
            let u = &s.record;
            sheet.push_row(vec![
                u.name.clone(),
                u.phone.clone(),
                u.email.clone(),
                u.role.display_name().to_string(),
                u.function.clone(),
                u.sangkat.clone(),
            ]);
        }
        Ok(sheet)
    }
}

impl Exportable for Followup {
    fn sheet(records: &[Stored<Self>]) -> Result<Sheet, ExchangeError> {
        let mut sheet = Sheet::new(FOLLOWUP_COLUMNS);
        for s in records {
            let f = &s.record;
            sheet.push_row(vec![
                f.no.clone(),
                f.original().factory_name.clone(),
                f.followup_date.clone(),
                f.original().inspection_date.clone(),
                f.result.display_name().to_string(),
                f.conclusion.clone(),
            ]);
        }
        Ok(sheet)
    }
}

/// Every serialized field, columns in first-seen order starting with the
/// fields of an empty record.
fn flat_sheet<T: Record + Default>(records: &[Stored<T>]) -> Result<Sheet, ExchangeError> {
    let blank = Stored::new(RecordId::new(""), T::default());
    let mut columns: Vec<String> = object(&blank)?.into_iter().map(|(k, _)| k).collect();

    let objects = records.iter().map(object).collect::<Result<Vec<_>, _>>()?;
    for obj in &objects {
        for key in obj.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }

    let mut sheet = Sheet::new(columns.clone());
    for obj in objects {
        sheet.push_row(
            columns
                .iter()
                .map(|c| obj.get(c).map(cell).unwrap_or_default())
                .collect(),
        );
    }
    Ok(sheet)
}

fn object<T: Serialize>(value: &T) -> Result<serde_json::Map<String, Value>, ExchangeError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        _ => Ok(serde_json::Map::new()),
    }
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Write `records` to `dir` under the kind's fixed file name.
pub fn export<T: Exportable>(records: &[Stored<T>], dir: &Path) -> Result<PathBuf, ExchangeError> {
    std::fs::create_dir_all(dir).map_err(|source| ExchangeError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let path = dir.join(T::KIND.export_file());
    T::sheet(records)?.write_csv(&path)?;
    info!(kind = %T::KIND, count = records.len(), path = %path.display(), "exported");
    Ok(path)
}

/// The factory import template: Khmer headers and one sample row.
pub fn factory_template() -> Sheet {
    let mut sheet = Sheet::new(FACTORY_COLUMNS.map(|(header, _)| header));
    sheet.push_row(FACTORY_SAMPLE.map(str::to_string).to_vec());
    sheet
}

pub fn write_factory_template(dir: &Path) -> Result<PathBuf, ExchangeError> {
    std::fs::create_dir_all(dir).map_err(|source| ExchangeError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let path = dir.join(FACTORY_TEMPLATE_FILE);
    factory_template().write_csv(&path)?;
    info!(path = %path.display(), "wrote factory template");
    Ok(path)
}

/// Read factories from a CSV laid out like the template.
///
/// Missing columns leave the field empty; blank rows are skipped. Ids are
/// not assigned here.
pub fn import_factories(bytes: &[u8]) -> Result<Vec<Factory>, ExchangeError> {
    let sheet = Sheet::from_csv(bytes)?;
    let mapped: Vec<(usize, &str)> = FACTORY_COLUMNS
        .iter()
        .filter_map(|(header, field)| {
            let idx = sheet.columns.iter().position(|c| c.trim() == *header)?;
            Some((idx, *field))
        })
        .collect();
    if mapped.is_empty() {
        return Err(ExchangeError::NoKnownColumns);
    }

    let mut factories = Vec::new();
    for row in &sheet.rows {
        if row.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        let mut map = serde_json::Map::new();
        for (idx, field) in &mapped {
            let value = row.get(*idx).map(|c| c.trim()).unwrap_or("");
            map.insert(field.to_string(), Value::String(value.to_string()));
        }
        factories.push(serde_json::from_value(Value::Object(map))?);
    }
    info!(count = factories.len(), "parsed factory import");
    Ok(factories)
}

pub fn import_factories_file(path: &Path) -> Result<Vec<Factory>, ExchangeError> {
    let bytes = std::fs::read(path).map_err(|source| ExchangeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    import_factories(&bytes)
}
