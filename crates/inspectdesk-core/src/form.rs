//! Form state for create and edit flows.
//!
//! Conditional sections (penalty, fine, follow-up outcome) are modelled as a
//! [`Section`]: a toggle plus the detail values it guards. Deactivating a
//! section clears its details, so a submitted record never carries values
//! for a section that was switched off.

use serde_json::Value;
use thiserror::Error;

use crate::factory::Factory;
use crate::followup::{Followup, FollowupDetail, FollowupDraft, FollowupResult};
use crate::id::RecordId;
use crate::inspection::{FineDetail, Inspection, PenaltyDetail};
use crate::record::Record;
use crate::validate::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("unknown field: {0}")]
    UnknownField(String),
    #[error("{0} section is switched off")]
    InactiveSection(&'static str),
    #[error("cannot set {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Toggle {
    Active,
    #[default]
    Inactive,
}

impl From<bool> for Toggle {
    fn from(active: bool) -> Self {
        if active { Self::Active } else { Self::Inactive }
    }
}

/// A toggle and the detail values shown while it is active.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section<D> {
    state: Toggle,
    detail: D,
}

impl<D: Default + Clone> Section<D> {
    /// Re-derive the toggle from stored details.
    pub fn from_detail(detail: Option<&D>) -> Self {
        match detail {
            Some(d) => Self {
                state: Toggle::Active,
                detail: d.clone(),
            },
            None => Self::default(),
        }
    }

    pub fn state(&self) -> Toggle {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == Toggle::Active
    }

    /// Switching off drops every detail value.
    pub fn set(&mut self, active: bool) {
        self.state = Toggle::from(active);
        if !active {
            self.detail = D::default();
        }
    }

    pub fn toggle(&mut self) {
        self.set(!self.is_active());
    }

    pub fn detail(&self) -> Option<&D> {
        self.is_active().then_some(&self.detail)
    }

    pub fn detail_mut(&mut self) -> Option<&mut D> {
        if self.is_active() {
            Some(&mut self.detail)
        } else {
            None
        }
    }

    pub fn into_option(self) -> Option<D> {
        match self.state {
            Toggle::Active => Some(self.detail),
            Toggle::Inactive => None,
        }
    }
}

/// Inspection create/edit form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InspectionForm {
    /// Plain fields. Its penalty and fine are ignored until submit.
    pub draft: Inspection,
    pub penalty: Section<PenaltyDetail>,
    pub fine: Section<FineDetail>,
}

impl InspectionForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_record(record: &Inspection) -> Self {
        Self {
            draft: record.clone(),
            penalty: Section::from_detail(record.penalty.detail()),
            fine: Section::from_detail(record.fine.detail()),
        }
    }

    /// Copy name and location from the selected factory.
    pub fn apply_factory(&mut self, factory: &Factory) {
        self.draft.factory_name = factory.factoryname.clone();
        self.draft.sector = factory.sector.clone();
        self.draft.village = factory.village.clone();
        self.draft.commune = factory.commune.clone();
        self.draft.district = factory.district.clone();
        self.draft.province = factory.province.clone();
    }

    pub fn set_field(&mut self, name: &str, value: &str) -> Result<(), FormError> {
        if let Some(slot) = self.draft.field_mut(name) {
            *slot = value.to_string();
            return Ok(());
        }
        if PenaltyDetail::FIELDS.contains(&name) {
            let detail = self
                .penalty
                .detail_mut()
                .ok_or(FormError::InactiveSection("penalty"))?;
            return set_slot(detail.field_mut(name), name, value);
        }
        if FineDetail::FIELDS.contains(&name) {
            let detail = self
                .fine
                .detail_mut()
                .ok_or(FormError::InactiveSection("fine"))?;
            return set_slot(detail.field_mut(name), name, value);
        }
        Err(FormError::UnknownField(name.to_string()))
    }

    /// Assemble and validate the record. The form is left as is on error.
    pub fn submit(&self) -> Result<Inspection, ValidationError> {
        let record = Inspection {
            penalty: self.penalty.clone().into_option().into(),
            fine: self.fine.clone().into_option().into(),
            ..self.draft.clone()
        };
        record.validate()?;
        Ok(record)
    }
}

/// Follow-up create/edit form.
///
/// The outcome toggle is inverted: the section is active when the penalty
/// was *not* implemented.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FollowupForm {
    pub no: String,
    pub original_inspection: Option<RecordId>,
    pub followup_date: String,
    pub conclusion: String,
    pub outstanding: Section<FollowupDetail>,
}

impl FollowupForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_record(record: &Followup) -> Self {
        Self {
            no: record.no.clone(),
            original_inspection: Some(record.original_inspection.clone()),
            followup_date: record.followup_date.clone(),
            conclusion: record.conclusion.clone(),
            outstanding: Section::from_detail(record.result.detail()),
        }
    }

    pub fn penalty_implemented(&self) -> bool {
        !self.outstanding.is_active()
    }

    pub fn set_penalty_implemented(&mut self, implemented: bool) {
        self.outstanding.set(!implemented);
    }

    /// A blank selection clears the reference.
    pub fn select_original(&mut self, id: &str) -> Option<&RecordId> {
        let id = RecordId::new(id);
        self.original_inspection = (!id.as_str().is_empty()).then_some(id);
        self.original_inspection.as_ref()
    }

    pub fn set_field(&mut self, name: &str, value: &str) -> Result<(), FormError> {
        match name {
            "no" => self.no = value.to_string(),
            "followup_date" => self.followup_date = value.to_string(),
            "conclusion" => self.conclusion = value.to_string(),
            "original_inspection" => {
                self.select_original(value);
            }
            _ if FollowupDetail::FIELDS.contains(&name) => {
                let detail = self
                    .outstanding
                    .detail_mut()
                    .ok_or(FormError::InactiveSection("follow-up result"))?;
                return set_slot(detail.field_mut(name), name, value);
            }
            _ => return Err(FormError::UnknownField(name.to_string())),
        }
        Ok(())
    }

    pub fn submit(&self) -> Result<FollowupDraft, ValidationError> {
        let draft = FollowupDraft {
            no: self.no.clone(),
            original_inspection: self.original_inspection.clone(),
            followup_date: self.followup_date.clone(),
            result: FollowupResult::from(self.outstanding.clone().into_option()),
            conclusion: self.conclusion.clone(),
        };
        draft.validate()?;
        Ok(draft)
    }
}

fn set_slot(slot: Option<&mut String>, name: &str, value: &str) -> Result<(), FormError> {
    let slot = slot.ok_or_else(|| FormError::UnknownField(name.to_string()))?;
    *slot = value.to_string();
    Ok(())
}

/// Set one top-level field of a flat record by its wire name.
///
/// Used by the document, factory and user forms, which have no
/// conditional sections.
pub fn set_json_field<T: Record>(record: &mut T, name: &str, value: &str) -> Result<(), FormError> {
    let invalid = |e: serde_json::Error| FormError::InvalidValue {
        field: name.to_string(),
        reason: e.to_string(),
    };
    let Value::Object(mut map) = serde_json::to_value(&*record).map_err(invalid)? else {
        return Err(FormError::UnknownField(name.to_string()));
    };
    match map.get_mut(name) {
        Some(slot) => *slot = Value::String(value.to_string()),
        None => return Err(FormError::UnknownField(name.to_string())),
    }
    *record = serde_json::from_value(Value::Object(map)).map_err(invalid)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspection::{Fine, Penalty};
    use crate::user::{Role, User};

    fn filled() -> InspectionForm {
        let mut form = InspectionForm::new();
        for (k, v) in [
            ("no", "INS001"),
            ("group", "A"),
            ("inspection_date", "2024-01-15"),
            ("factory_name", "Factory A"),
            ("sector", "Garment"),
            ("case_subject", "Routine"),
        ] {
            form.set_field(k, v).unwrap();
        }
        form
    }

    #[test]
    fn switching_penalty_off_clears_details() {
        let mut form = filled();
        form.penalty.set(true);
        for name in PenaltyDetail::FIELDS {
            form.set_field(name, "x").unwrap();
        }
        form.penalty.set(false);
        form.penalty.set(true);
        assert_eq!(form.penalty.detail(), Some(&PenaltyDetail::default()));

        form.penalty.set(false);
        let record = form.submit().unwrap();
        assert_eq!(record.penalty, Penalty::Absent);
    }

    #[test]
    fn inactive_section_rejects_detail_fields() {
        let mut form = filled();
        assert_eq!(
            form.set_field("fine_amount", "100"),
            Err(FormError::InactiveSection("fine"))
        );
        assert_eq!(
            form.set_field("colour", "red"),
            Err(FormError::UnknownField("colour".into()))
        );
    }

    #[test]
    fn active_section_needs_a_detail() {
        let mut form = filled();
        form.fine.set(true);
        assert_eq!(
            form.submit(),
            Err(ValidationError::EmptySection { section: "fine" })
        );
        form.set_field("fine_amount", "500").unwrap();
        let record = form.submit().unwrap();
        assert_eq!(record.fine.detail().unwrap().fine_amount, "500");
    }

    #[test]
    fn missing_required_fields_block_submit() {
        let mut form = filled();
        form.set_field("sector", "").unwrap();
        assert_eq!(
            form.submit(),
            Err(ValidationError::MissingFields(vec!["sector"]))
        );
    }

    #[test]
    fn edit_form_rederives_toggles() {
        let record = Inspection {
            penalty: Penalty::Absent,
            fine: Fine::Present(FineDetail {
                fine_amount: "500".into(),
                ..Default::default()
            }),
            ..filled().draft
        };
        let form = InspectionForm::from_record(&record);
        assert!(!form.penalty.is_active());
        assert!(form.fine.is_active());
        assert_eq!(form.submit().unwrap(), record);
    }

    #[test]
    fn factory_selection_fills_location() {
        let mut form = InspectionForm::new();
        form.apply_factory(&Factory {
            factoryname: "រោងចក្រ A".into(),
            sector: "Garment".into(),
            village: "V".into(),
            commune: "C".into(),
            district: "D".into(),
            province: "Phnom Penh".into(),
            ..Default::default()
        });
        assert_eq!(form.draft.factory_name, "រោងចក្រ A");
        assert_eq!(form.draft.province, "Phnom Penh");
    }

    #[test]
    fn followup_toggle_is_inverted() {
        let mut form = FollowupForm::new();
        assert!(form.penalty_implemented());
        assert_eq!(
            form.set_field("followup_format", "x"),
            Err(FormError::InactiveSection("follow-up result"))
        );

        form.set_penalty_implemented(false);
        form.set_field("followup_format", "still open").unwrap();
        form.set_penalty_implemented(true);
        form.set_penalty_implemented(false);
        assert_eq!(form.outstanding.detail(), Some(&FollowupDetail::default()));
    }

    #[test]
    fn followup_submit_builds_draft() {
        let mut form = FollowupForm::new();
        form.set_field("no", "FLW001").unwrap();
        form.set_field("followup_date", "2024-02-15").unwrap();
        assert_eq!(
            form.submit(),
            Err(ValidationError::MissingFields(vec!["original_inspection"]))
        );
        form.set_field("original_inspection", " 17 ").unwrap();
        let draft = form.submit().unwrap();
        assert_eq!(draft.original_inspection, Some(RecordId::from(17)));
        assert!(draft.result.is_implemented());
    }

    #[test]
    fn blank_selection_clears_original() {
        let mut form = FollowupForm::new();
        form.select_original("4");
        assert!(form.select_original("").is_none());
        assert!(form.original_inspection.is_none());
    }

    #[test]
    fn json_field_on_flat_record() {
        let mut user = User::default();
        set_json_field(&mut user, "email", "a@b.kh").unwrap();
        set_json_field(&mut user, "role", "admin").unwrap();
        assert_eq!(user.email, "a@b.kh");
        assert_eq!(user.role, Role::Admin);
        assert!(matches!(
            set_json_field(&mut user, "salary", "1"),
            Err(FormError::UnknownField(_))
        ));
    }
}
