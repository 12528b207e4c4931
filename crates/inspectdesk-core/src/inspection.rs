//! Factory inspection records.
//!
//! The penalty and fine sections are tagged enums flattened into the record,
//! so an absent section has no detail fields to go stale: on the wire the
//! record reads `has_penalty: "absent"` with no `penalty_*` keys at all.

use serde::{Deserialize, Serialize};

use crate::record::{EntityKind, Record, Stored};
use crate::validate::{self, ValidationError};
use crate::view::{DetailSection, DetailView, Status, Tabular};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PenaltyDetail {
    pub penalty_format: String,
    pub penalty_condition: String,
    pub penalty_health: String,
    pub penalty_professional: String,
}

impl PenaltyDetail {
    pub const FIELDS: [&'static str; 4] = [
        "penalty_format",
        "penalty_condition",
        "penalty_health",
        "penalty_professional",
    ];

    pub fn values(&self) -> [&str; 4] {
        [
            self.penalty_format.as_str(),
            self.penalty_condition.as_str(),
            self.penalty_health.as_str(),
            self.penalty_professional.as_str(),
        ]
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut String> {
        match name {
            "penalty_format" => Some(&mut self.penalty_format),
            "penalty_condition" => Some(&mut self.penalty_condition),
            "penalty_health" => Some(&mut self.penalty_health),
            "penalty_professional" => Some(&mut self.penalty_professional),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FineDetail {
    pub fine_amount: String,
    pub fine_type: String,
    pub fine_reason: String,
}

impl FineDetail {
    pub const FIELDS: [&'static str; 3] = ["fine_amount", "fine_type", "fine_reason"];

    pub fn values(&self) -> [&str; 3] {
        [self.fine_amount.as_str(), self.fine_type.as_str(), self.fine_reason.as_str()]
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut String> {
        match name {
            "fine_amount" => Some(&mut self.fine_amount),
            "fine_type" => Some(&mut self.fine_type),
            "fine_reason" => Some(&mut self.fine_reason),
            _ => None,
        }
    }
}

/// Decoded value of a `has_*` toggle. A missing or null toggle is absent.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
enum Presence {
    #[serde(rename = "present", alias = "មាន")]
    Present,
    #[default]
    #[serde(rename = "absent", alias = "គ្មាន")]
    Absent,
}

#[derive(Deserialize)]
struct PenaltyWire {
    #[serde(default)]
    has_penalty: Option<Presence>,
    #[serde(flatten)]
    detail: PenaltyDetail,
}

impl From<PenaltyWire> for Penalty {
    fn from(wire: PenaltyWire) -> Self {
        match wire.has_penalty.unwrap_or_default() {
            Presence::Present => Self::Present(wire.detail),
            Presence::Absent => Self::Absent,
        }
    }
}

/// `has_penalty` and, when present, its details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "has_penalty", from = "PenaltyWire")]
pub enum Penalty {
    #[serde(rename = "present", alias = "មាន")]
    Present(PenaltyDetail),
    #[default]
    #[serde(rename = "absent", alias = "គ្មាន")]
    Absent,
}

impl Penalty {
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    pub fn detail(&self) -> Option<&PenaltyDetail> {
        match self {
            Self::Present(d) => Some(d),
            Self::Absent => None,
        }
    }

    pub fn label(&self) -> &'static str {
        if self.is_present() { "present" } else { "absent" }
    }
}

impl From<Option<PenaltyDetail>> for Penalty {
    fn from(detail: Option<PenaltyDetail>) -> Self {
        detail.map_or(Self::Absent, Self::Present)
    }
}

#[derive(Deserialize)]
struct FineWire {
    #[serde(default)]
    has_fine: Option<Presence>,
    #[serde(flatten)]
    detail: FineDetail,
}

impl From<FineWire> for Fine {
    fn from(wire: FineWire) -> Self {
        match wire.has_fine.unwrap_or_default() {
            Presence::Present => Self::Present(wire.detail),
            Presence::Absent => Self::Absent,
        }
    }
}

/// `has_fine` and, when present, its details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "has_fine", from = "FineWire")]
pub enum Fine {
    #[serde(rename = "present", alias = "មាន")]
    Present(FineDetail),
    #[default]
    #[serde(rename = "absent", alias = "គ្មាន")]
    Absent,
}

impl Fine {
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    pub fn detail(&self) -> Option<&FineDetail> {
        match self {
            Self::Present(d) => Some(d),
            Self::Absent => None,
        }
    }

    pub fn label(&self) -> &'static str {
        if self.is_present() { "present" } else { "absent" }
    }
}

impl From<Option<FineDetail>> for Fine {
    fn from(detail: Option<FineDetail>) -> Self {
        detail.map_or(Self::Absent, Self::Present)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inspection {
    #[serde(default)]
    pub no: String,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub inspection_date: String,
    #[serde(default)]
    pub factory_name: String,
    #[serde(default)]
    pub sector: String,
    #[serde(default)]
    pub case_subject: String,
    #[serde(default)]
    pub village: String,
    #[serde(default)]
    pub commune: String,
    #[serde(default)]
    pub district: String,
    #[serde(default)]
    pub province: String,
    #[serde(default)]
    pub remarks: String,
    #[serde(flatten)]
    pub penalty: Penalty,
    #[serde(flatten)]
    pub fine: Fine,
}

impl Inspection {
    /// Plain text fields by wire name, for form editing.
    pub fn field_mut(&mut self, name: &str) -> Option<&mut String> {
        match name {
            "no" => Some(&mut self.no),
            "group" => Some(&mut self.group),
            "inspection_date" => Some(&mut self.inspection_date),
            "factory_name" => Some(&mut self.factory_name),
            "sector" => Some(&mut self.sector),
            "case_subject" => Some(&mut self.case_subject),
            "village" => Some(&mut self.village),
            "commune" => Some(&mut self.commune),
            "district" => Some(&mut self.district),
            "province" => Some(&mut self.province),
            "remarks" => Some(&mut self.remarks),
            _ => None,
        }
    }

    /// Label used when offering this inspection as a follow-up original.
    pub fn candidate_label(&self) -> String {
        format!("{} - {} ({})", self.no, self.factory_name, self.inspection_date)
    }
}

impl Record for Inspection {
    const KIND: EntityKind = EntityKind::Inspection;

    fn validate(&self) -> Result<(), ValidationError> {
        validate::require(&[
            ("no", self.no.as_str()),
            ("factory_name", self.factory_name.as_str()),
            ("group", self.group.as_str()),
            ("inspection_date", self.inspection_date.as_str()),
            ("sector", self.sector.as_str()),
            ("case_subject", self.case_subject.as_str()),
        ])?;
        if let Penalty::Present(d) = &self.penalty {
            validate::require_any("penalty", &d.values())?;
        }
        if let Fine::Present(d) = &self.fine {
            validate::require_any("fine", &d.values())?;
        }
        Ok(())
    }
}

impl Tabular for Inspection {
    const COLUMNS: &'static [&'static str] = &[
        "no",
        "factory_name",
        "sector",
        "case_subject",
        "inspection_date",
        "has_penalty",
        "has_fine",
        "status",
    ];

    fn cells(&self) -> Vec<String> {
        let status = if self.penalty.is_present() {
            "needs follow-up"
        } else {
            "completed"
        };
        vec![
            self.no.clone(),
            self.factory_name.clone(),
            self.sector.clone(),
            self.case_subject.clone(),
            self.inspection_date.clone(),
            self.penalty.label().to_string(),
            self.fine.label().to_string(),
            status.to_string(),
        ]
    }

    fn status(&self) -> Option<Status> {
        Some(if self.penalty.is_present() {
            Status::Pending
        } else {
            Status::Completed
        })
    }

    fn detail(stored: &Stored<Self>) -> DetailView {
        let i = &stored.record;
        let mut sections = vec![
            DetailSection::new(
                "Inspection",
                vec![
                    ("no", i.no.clone()),
                    ("group", i.group.clone()),
                    ("inspection_date", i.inspection_date.clone()),
                    ("factory_name", i.factory_name.clone()),
                    ("sector", i.sector.clone()),
                    ("case_subject", i.case_subject.clone()),
                ],
            ),
            DetailSection::new(
                "Location",
                vec![
                    ("village", i.village.clone()),
                    ("commune", i.commune.clone()),
                    ("district", i.district.clone()),
                    ("province", i.province.clone()),
                ],
            ),
            DetailSection::new(
                "Findings",
                vec![
                    ("has_penalty", i.penalty.label().to_string()),
                    ("has_fine", i.fine.label().to_string()),
                ],
            ),
        ];
        if let Penalty::Present(d) = &i.penalty {
            sections.push(DetailSection::new(
                "Penalty",
                PenaltyDetail::FIELDS
                    .into_iter()
                    .zip(d.values().map(str::to_string))
                    .collect(),
            ));
        }
        if let Fine::Present(d) = &i.fine {
            sections.push(DetailSection::new(
                "Fine",
                FineDetail::FIELDS
                    .into_iter()
                    .zip(d.values().map(str::to_string))
                    .collect(),
            ));
        }
        sections.push(DetailSection::new(
            "Remarks",
            vec![("remarks", i.remarks.clone())],
        ));
        DetailView {
            title: format!("{} {}", i.no, i.factory_name),
            sections,
        }
    }
}
