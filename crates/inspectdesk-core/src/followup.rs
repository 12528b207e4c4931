//! Penalty follow-ups and their link to the originating inspection.
//!
//! A follow-up carries an owned copy of the inspection it follows up on,
//! taken when the follow-up is created. Editing or deleting the inspection
//! afterwards does not reach the copy.

use serde::{Deserialize, Serialize};

use crate::id::RecordId;
use crate::inspection::Inspection;
use crate::record::{EntityKind, Record, Stored};
use crate::validate::{self, ValidationError};
use crate::view::{DetailSection, DetailView, Status, Tabular};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FollowupDetail {
    pub followup_format: String,
    pub followup_condition: String,
    pub followup_health: String,
    pub followup_professional: String,
}

impl FollowupDetail {
    pub const FIELDS: [&'static str; 4] = [
        "followup_format",
        "followup_condition",
        "followup_health",
        "followup_professional",
    ];

    pub fn values(&self) -> [&str; 4] {
        [
            self.followup_format.as_str(),
            self.followup_condition.as_str(),
            self.followup_health.as_str(),
            self.followup_professional.as_str(),
        ]
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut String> {
        match name {
            "followup_format" => Some(&mut self.followup_format),
            "followup_condition" => Some(&mut self.followup_condition),
            "followup_health" => Some(&mut self.followup_health),
            "followup_professional" => Some(&mut self.followup_professional),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
enum Implementation {
    #[default]
    #[serde(rename = "implemented", alias = "អនុវត្ត")]
    Implemented,
    #[serde(rename = "not-implemented", alias = "មិនអនុវត្ត")]
    NotImplemented,
}

/// A missing or null `penalty_implemented` reads as implemented.
#[derive(Deserialize)]
struct FollowupResultWire {
    #[serde(default)]
    penalty_implemented: Option<Implementation>,
    #[serde(flatten)]
    detail: FollowupDetail,
}

impl From<FollowupResultWire> for FollowupResult {
    fn from(wire: FollowupResultWire) -> Self {
        match wire.penalty_implemented.unwrap_or_default() {
            Implementation::Implemented => Self::Implemented,
            Implementation::NotImplemented => Self::NotImplemented(wire.detail),
        }
    }
}

/// `penalty_implemented`. Only the negative outcome carries details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "penalty_implemented", from = "FollowupResultWire")]
pub enum FollowupResult {
    #[default]
    #[serde(rename = "implemented", alias = "អនុវត្ត")]
    Implemented,
    #[serde(rename = "not-implemented", alias = "មិនអនុវត្ត")]
    NotImplemented(FollowupDetail),
}

impl FollowupResult {
    pub fn is_implemented(&self) -> bool {
        matches!(self, Self::Implemented)
    }

    pub fn detail(&self) -> Option<&FollowupDetail> {
        match self {
            Self::Implemented => None,
            Self::NotImplemented(d) => Some(d),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Implemented => "implemented",
            Self::NotImplemented(_) => "not-implemented",
        }
    }

    /// Khmer label used in spreadsheet exports.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Implemented => "អនុវត្ត",
            Self::NotImplemented(_) => "មិនអនុវត្ត",
        }
    }
}

impl From<Option<FollowupDetail>> for FollowupResult {
    fn from(detail: Option<FollowupDetail>) -> Self {
        detail.map_or(Self::Implemented, Self::NotImplemented)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Followup {
    #[serde(default)]
    pub no: String,
    pub original_inspection: RecordId,
    pub original_inspection_data: Stored<Inspection>,
    #[serde(default)]
    pub followup_date: String,
    #[serde(flatten)]
    pub result: FollowupResult,
    #[serde(default)]
    pub conclusion: String,
}

impl Followup {
    pub fn original(&self) -> &Inspection {
        &self.original_inspection_data.record
    }
}

impl Record for Followup {
    const KIND: EntityKind = EntityKind::Followup;
    const FROZEN: &'static [&'static str] = &["original_inspection", "original_inspection_data"];

    fn validate(&self) -> Result<(), ValidationError> {
        validate::require(&[
            ("no", self.no.as_str()),
            ("original_inspection", self.original_inspection.as_str()),
            ("followup_date", self.followup_date.as_str()),
        ])?;
        if let FollowupResult::NotImplemented(d) = &self.result {
            validate::require_any("follow-up result", &d.values())?;
        }
        Ok(())
    }
}

/// A submitted follow-up form, before the original inspection is resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FollowupDraft {
    pub no: String,
    pub original_inspection: Option<RecordId>,
    pub followup_date: String,
    pub result: FollowupResult,
    pub conclusion: String,
}

impl FollowupDraft {
    /// Required fields, then the details of a not-implemented result.
    ///
    /// Returns the referenced inspection id.
    pub fn validate(&self) -> Result<RecordId, ValidationError> {
        let original = self
            .original_inspection
            .as_ref()
            .map(RecordId::as_str)
            .unwrap_or_default();
        validate::require(&[
            ("no", self.no.as_str()),
            ("original_inspection", original),
            ("followup_date", self.followup_date.as_str()),
        ])?;
        if let FollowupResult::NotImplemented(d) = &self.result {
            validate::require_any("follow-up result", &d.values())?;
        }
        Ok(RecordId::new(original))
    }

    /// Complete the draft with the resolved snapshot of its original.
    pub fn attach(self, snapshot: Stored<Inspection>) -> Followup {
        Followup {
            no: self.no,
            original_inspection: snapshot.id.clone(),
            original_inspection_data: snapshot,
            followup_date: self.followup_date,
            result: self.result,
            conclusion: self.conclusion,
        }
    }
}

impl Tabular for Followup {
    const COLUMNS: &'static [&'static str] = &[
        "no",
        "factory_name",
        "followup_date",
        "inspection_date",
        "penalty_implemented",
    ];

    fn cells(&self) -> Vec<String> {
        let original = self.original();
        vec![
            self.no.clone(),
            original.factory_name.clone(),
            self.followup_date.clone(),
            original.inspection_date.clone(),
            self.result.label().to_string(),
        ]
    }

    fn status(&self) -> Option<Status> {
        Some(if self.result.is_implemented() {
            Status::Completed
        } else {
            Status::Pending
        })
    }

    fn detail(stored: &Stored<Self>) -> DetailView {
        let f = &stored.record;
        let original = f.original();
        let mut sections = vec![
            DetailSection::new(
                "Follow-up",
                vec![
                    ("no", f.no.clone()),
                    ("followup_date", f.followup_date.clone()),
                    (
                        "original_inspection",
                        format!("{} - {}", original.no, original.factory_name),
                    ),
                    ("penalty_implemented", f.result.label().to_string()),
                ],
            ),
            DetailSection::new(
                "Original inspection",
                vec![
                    ("factory_name", original.factory_name.clone()),
                    ("sector", original.sector.clone()),
                    ("case_subject", original.case_subject.clone()),
                    ("inspection_date", original.inspection_date.clone()),
                    ("village", original.village.clone()),
                    ("commune", original.commune.clone()),
                    ("district", original.district.clone()),
                    ("province", original.province.clone()),
                ],
            ),
        ];
        if let FollowupResult::NotImplemented(d) = &f.result {
            sections.push(DetailSection::new(
                "Outstanding",
                FollowupDetail::FIELDS
                    .into_iter()
                    .zip(d.values().map(str::to_string))
                    .collect(),
            ));
        }
        sections.push(DetailSection::new(
            "Conclusion",
            vec![("conclusion", f.conclusion.clone())],
        ));
        DetailView {
            title: format!("{} {}", f.no, original.factory_name),
            sections,
        }
    }
}
