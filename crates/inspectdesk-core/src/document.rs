//! Incoming and outgoing correspondence records.

use serde::{Deserialize, Serialize};

use crate::lenient;
use crate::record::{EntityKind, FieldMap, Record, Stored};
use crate::validate::{self, ValidationError};
use crate::view::{DetailSection, DetailView, Status, Tabular};

/// `progress` value of a document that has been dispatched.
pub const COMPLETED_PROGRESS: &str = "បានធ្វើចេញ";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, deserialize_with = "lenient::string")]
    pub no: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub ir: String,
    #[serde(rename = "outNo", default, deserialize_with = "lenient::string")]
    pub out_no: String,
    #[serde(rename = "submitDate", default, deserialize_with = "lenient::string")]
    pub submit_date: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub source: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub doc: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub officer: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub progress: String,
    /// Server fields with no typed counterpart, kept for export.
    #[serde(flatten)]
    pub extra: FieldMap,
}

impl Document {
    /// Date part of `submitDate` (the server sends full ISO timestamps).
    pub fn submit_day(&self) -> &str {
        self.submit_date.split('T').next().unwrap_or_default()
    }
}

impl Record for Document {
    const KIND: EntityKind = EntityKind::Document;

    fn validate(&self) -> Result<(), ValidationError> {
        validate::require(&[("no", self.no.as_str()), ("ir", self.ir.as_str())])
    }
}

impl Tabular for Document {
    const COLUMNS: &'static [&'static str] = &[
        "no",
        "ir",
        "outNo",
        "submitDate",
        "source",
        "doc",
        "officer",
        "progress",
    ];

    fn cells(&self) -> Vec<String> {
        vec![
            self.no.clone(),
            self.ir.clone(),
            self.out_no.clone(),
            self.submit_day().to_string(),
            self.source.clone(),
            self.doc.clone(),
            self.officer.clone(),
            self.progress.clone(),
        ]
    }

    fn status(&self) -> Option<Status> {
        Some(if self.progress == COMPLETED_PROGRESS {
            Status::Completed
        } else {
            Status::Pending
        })
    }

    fn detail(stored: &Stored<Self>) -> DetailView {
        let d = &stored.record;
        DetailView {
            title: format!("{} {}", d.no, d.ir),
            sections: vec![DetailSection::new(
                "Document",
                Self::COLUMNS.iter().copied().zip(d.cells()).collect(),
            )],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_server_shape() {
        let doc: Document = serde_json::from_value(json!({
            "no": 12,
            "ir": "IR-0042",
            "outNo": null,
            "submitDate": "2024-03-01T00:00:00.000Z",
            "progress": "បានធ្វើចេញ"
        }))
        .unwrap();
        assert_eq!(doc.no, "12");
        assert_eq!(doc.out_no, "");
        assert_eq!(doc.submit_day(), "2024-03-01");
        assert_eq!(doc.status(), Some(Status::Completed));
    }

    #[test]
    fn no_and_ir_required() {
        let doc = Document {
            no: "1".into(),
            ..Default::default()
        };
        assert_eq!(
            doc.validate(),
            Err(ValidationError::MissingFields(vec!["ir"]))
        );
    }

    #[test]
    fn wire_names_are_camel_case() {
        let value = serde_json::to_value(Document {
            out_no: "OUT-1".into(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(value["outNo"], "OUT-1");
        assert!(value.get("submitDate").is_some());
    }

    #[test]
    fn undeclared_server_fields_are_kept() {
        let stored: Stored<Document> = serde_json::from_value(json!({
            "id": 5,
            "no": "1",
            "ir": "IR-1",
            "remark": "urgent",
            "pages": 3
        }))
        .unwrap();
        assert_eq!(stored.record.extra.get("remark"), Some(&json!("urgent")));
        assert!(!stored.record.extra.contains_key("id"));

        let value = serde_json::to_value(&stored).unwrap();
        assert_eq!(value["pages"], 3);
        assert_eq!(value["ir"], "IR-1");
    }
}
