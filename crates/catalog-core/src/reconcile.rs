//! Set reconciliation between a persisted image collection and a client order.
//!
//! Pure functions over immutable snapshots: nothing here touches storage, so
//! the outcome can be validated in full before any row is written or deleted.

use std::collections::HashSet;

use uuid::Uuid;

use crate::defaults::FIRST_IMAGE_POSITION;
use crate::error::ValidationError;

/// Outcome of comparing the original identifiers with the submitted order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reconciliation {
    /// Kept identifiers in their new order.
    pub kept: Vec<Uuid>,
    /// Identifiers present before the edit but absent from the submitted order,
    /// in their original order.
    pub removed: Vec<Uuid>,
}

impl Reconciliation {
    /// Position assigned to each kept identifier.
    pub fn positions(&self) -> impl Iterator<Item = (Uuid, i32)> + '_ {
        self.kept
            .iter()
            .enumerate()
            .map(|(idx, id)| (*id, position_at(idx)))
    }

    /// First position available for newly attached images.
    pub fn next_position(&self) -> i32 {
        position_at(self.kept.len())
    }
}

/// Position for the element at `index` of an ordered collection.
pub fn position_at(index: usize) -> i32 {
    FIRST_IMAGE_POSITION + index as i32
}

/// Compute kept and removed identifiers.
///
/// `original` is the collection before the edit; `submitted` is the order the
/// client wants to keep. Every submitted identifier must belong to `original`
/// and appear at most once.
pub fn reconcile_order(
    original: &[Uuid],
    submitted: &[Uuid],
) -> Result<Reconciliation, ValidationError> {
    let known: HashSet<Uuid> = original.iter().copied().collect();
    let mut seen = HashSet::with_capacity(submitted.len());

    for id in submitted {
        if !known.contains(id) {
            return Err(ValidationError::UnknownImage(*id));
        }
        if !seen.insert(*id) {
            return Err(ValidationError::DuplicateImage(*id));
        }
    }

    let removed = original
        .iter()
        .filter(|id| !seen.contains(id))
        .copied()
        .collect();

    Ok(Reconciliation {
        kept: submitted.to_vec(),
        removed,
    })
}
