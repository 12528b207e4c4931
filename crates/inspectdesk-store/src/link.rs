//! Follow-up to inspection link resolution.
//!
//! A follow-up may only be created against an inspection that carries a
//! penalty. The same lookup backs the read-only preview panel, where an
//! unqualified inspection is shown with a note instead of being refused.

use inspectdesk_core::{Followup, FollowupDraft, Inspection, RecordId, Stored, ValidationError};
use thiserror::Error;
use tracing::{info, warn};

use crate::store::RecordStore;

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("please fill in all required information (inspection {0} not found)")]
    ReferenceNotFound(RecordId),

    #[error("this original inspection carries no penalty to follow up on")]
    NoPenaltyOnOriginal { snapshot: Box<Stored<Inspection>> },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Look up an inspection and return an owned copy of it.
///
/// Fails when the inspection is missing or has no penalty. The copy shares
/// nothing with the stored record.
pub fn resolve_and_snapshot(
    inspections: &RecordStore<Inspection>,
    id: &RecordId,
) -> Result<Stored<Inspection>, LinkError> {
    let stored = inspections
        .find_by_id(id)
        .ok_or_else(|| LinkError::ReferenceNotFound(id.clone()))?;
    let snapshot = stored.clone();
    if !snapshot.record.penalty.is_present() {
        return Err(LinkError::NoPenaltyOnOriginal {
            snapshot: Box::new(snapshot),
        });
    }
    Ok(snapshot)
}

/// What the original-inspection panel shows for the current selection.
#[derive(Debug, Clone, PartialEq)]
pub enum Preview {
    /// Nothing selected.
    Cleared,
    Missing(RecordId),
    Loaded {
        snapshot: Stored<Inspection>,
        /// False renders the "no penalty" note next to the data.
        has_penalty: bool,
    },
}

/// Resolve the selection for display only.
pub fn preview(inspections: &RecordStore<Inspection>, selected: Option<&RecordId>) -> Preview {
    let Some(id) = selected else {
        return Preview::Cleared;
    };
    match resolve_and_snapshot(inspections, id) {
        Ok(snapshot) => Preview::Loaded {
            snapshot,
            has_penalty: true,
        },
        Err(LinkError::NoPenaltyOnOriginal { snapshot }) => Preview::Loaded {
            snapshot: *snapshot,
            has_penalty: false,
        },
        Err(_) => Preview::Missing(id.clone()),
    }
}

/// Inspections that can be followed up on, with their selector labels.
pub fn penalty_candidates(inspections: &RecordStore<Inspection>) -> Vec<(RecordId, String)> {
    inspections
        .filter(|s| s.record.penalty.is_present())
        .into_iter()
        .map(|s| (s.id.clone(), s.record.candidate_label()))
        .collect()
}

/// Validate a draft, snapshot its original and store the follow-up.
///
/// Any failure leaves `followups` untouched.
pub fn create_followup(
    followups: &mut RecordStore<Followup>,
    inspections: &RecordStore<Inspection>,
    draft: FollowupDraft,
) -> Result<RecordId, LinkError> {
    let original = draft.validate()?;
    let snapshot = match resolve_and_snapshot(inspections, &original) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!(original = %original, error = %e, "follow-up refused");
            return Err(e);
        }
    };
    let id = followups.create(draft.attach(snapshot));
    info!(id = %id, original = %original, "created follow-up");
    Ok(id)
}
