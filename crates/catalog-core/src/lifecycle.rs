//! Product image lifecycle.
//!
//! An [`ImageDraft`] holds the in-progress image collection of one product
//! while a form is processed. [`ImageLifecycleManager`] applies the three
//! steps of a submission to it (reconcile the kept set, attach new uploads,
//! require a non-empty result) and finally turns the draft into an
//! [`ImagePlan`] that the persistence layer executes in one transaction.
//!
//! Nothing here performs I/O. A draft that fails any step is simply dropped,
//! so a rejected submission never leaves partial state behind.

use std::collections::HashMap;

use tracing::debug;
use uuid::Uuid;

use crate::error::ValidationError;
use crate::image_validation::validate_image;
use crate::models::{ImageUpload, ProductImage, ValidatedImage};
use crate::reconcile::{position_at, reconcile_order};

/// In-progress image collection of a single product.
#[derive(Debug, Clone, Default)]
pub struct ImageDraft {
    kept: Vec<ProductImage>,
    removed: Vec<ProductImage>,
    pending: Vec<ValidatedImage>,
}

impl ImageDraft {
    /// Draft for a product that does not exist yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Draft seeded with a product's persisted images, sorted by position.
    pub fn from_existing(mut images: Vec<ProductImage>) -> Self {
        images.sort_by_key(|i| i.position);
        Self {
            kept: images,
            removed: Vec::new(),
            pending: Vec::new(),
        }
    }

    /// Persisted images that survive the submission, in their new order.
    pub fn kept(&self) -> &[ProductImage] {
        &self.kept
    }

    /// Persisted images scheduled for deletion.
    pub fn removed(&self) -> &[ProductImage] {
        &self.removed
    }

    /// Validated uploads not yet stored.
    pub fn pending(&self) -> &[ValidatedImage] {
        &self.pending
    }

    /// Total number of images the product would own.
    pub fn len(&self) -> usize {
        self.kept.len() + self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A kept image and its new position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionUpdate {
    pub image_id: Uuid,
    pub position: i32,
}

/// A validated upload and the position it will occupy.
#[derive(Debug, Clone)]
pub struct PlannedImage {
    pub position: i32,
    pub image: ValidatedImage,
}

/// Validated set of changes to apply to a product's images.
#[derive(Debug, Clone, Default)]
pub struct ImagePlan {
    /// New positions of kept images, in position order.
    pub reposition: Vec<PositionUpdate>,
    /// Images whose rows and stored files must be deleted.
    pub removed: Vec<ProductImage>,
    /// Uploads to store, positioned after every kept image.
    pub added: Vec<PlannedImage>,
}

impl ImagePlan {
    /// Number of images the product owns once the plan is applied.
    pub fn image_count(&self) -> usize {
        self.reposition.len() + self.added.len()
    }
}

/// Applies submission steps to an [`ImageDraft`].
#[derive(Debug, Clone, Copy)]
pub struct ImageLifecycleManager {
    max_upload_bytes: usize,
}

impl ImageLifecycleManager {
    pub fn new(max_upload_bytes: usize) -> Self {
        Self { max_upload_bytes }
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    /// Validate and append uploaded files to the draft.
    ///
    /// All-or-nothing: if any file is rejected the draft is left unchanged.
    /// New images are ordered after the kept ones in submission order.
    pub fn attach_new(
        &self,
        draft: &mut ImageDraft,
        files: Vec<ImageUpload>,
    ) -> Result<(), ValidationError> {
        let validated = files
            .into_iter()
            .map(|file| validate_image(file, self.max_upload_bytes))
            .collect::<Result<Vec<_>, _>>()?;

        draft.pending.extend(validated);
        Ok(())
    }

    /// Reconcile the draft's persisted images with the client's submitted order.
    ///
    /// `original` is the snapshot loaded before the form was bound. Images it
    /// contains that are missing from `submitted` are marked for removal; the
    /// rest are reordered to match `submitted`. Recomputed from the snapshot
    /// every time, so repeating the call with the same inputs is a no-op.
    pub fn reconcile(
        &self,
        draft: &mut ImageDraft,
        original: &[ProductImage],
        submitted: &[Uuid],
    ) -> Result<(), ValidationError> {
        let original_ids: Vec<Uuid> = original.iter().map(|i| i.id).collect();
        let outcome = reconcile_order(&original_ids, submitted)?;

        let mut by_id: HashMap<Uuid, &ProductImage> =
            original.iter().map(|i| (i.id, i)).collect();

        draft.kept = outcome
            .positions()
            .filter_map(|(id, position)| {
                by_id.remove(&id).map(|image| ProductImage {
                    position,
                    ..image.clone()
                })
            })
            .collect();
        draft.removed = outcome
            .removed
            .iter()
            .filter_map(|id| by_id.remove(id).cloned())
            .collect();

        debug!(
            subsystem = "lifecycle",
            component = "reconcile",
            kept_count = draft.kept.len(),
            removed_count = draft.removed.len(),
            "Reconciled image order"
        );
        Ok(())
    }

    /// Reject a draft that would leave the product without images.
    pub fn validate_non_empty(&self, draft: &ImageDraft) -> Result<(), ValidationError> {
        if draft.is_empty() {
            return Err(ValidationError::NoImages);
        }
        Ok(())
    }

    /// Check the draft and turn it into an executable plan.
    pub fn into_plan(&self, draft: ImageDraft) -> Result<ImagePlan, ValidationError> {
        self.validate_non_empty(&draft)?;

        let reposition: Vec<PositionUpdate> = draft
            .kept
            .iter()
            .enumerate()
            .map(|(idx, image)| PositionUpdate {
                image_id: image.id,
                position: position_at(idx),
            })
            .collect();

        let offset = reposition.len();
        let added: Vec<PlannedImage> = draft
            .pending
            .into_iter()
            .enumerate()
            .map(|(idx, image)| PlannedImage {
                position: position_at(offset + idx),
                image,
            })
            .collect();

        debug!(
            subsystem = "lifecycle",
            component = "plan",
            kept_count = reposition.len(),
            removed_count = draft.removed.len(),
            added_count = added.len(),
            "Built image plan"
        );

        Ok(ImagePlan {
            reposition,
            removed: draft.removed,
            added,
        })
    }

    /// Run a creation submission: attach uploads and require at least one image.
    pub fn plan_create(&self, files: Vec<ImageUpload>) -> Result<ImagePlan, ValidationError> {
        let mut draft = ImageDraft::new();
        self.attach_new(&mut draft, files)?;
        self.into_plan(draft)
    }

    /// Run an edit submission against the product's persisted images.
    ///
    /// Reconciliation runs first, then uploads are attached, then the
    /// emptiness check; the first failure wins. On failure the returned draft
    /// reflects the state reached so far, for re-rendering the form.
    pub fn plan_edit(
        &self,
        original: &[ProductImage],
        submitted: &[Uuid],
        files: Vec<ImageUpload>,
    ) -> Result<ImagePlan, (ValidationError, ImageDraft)> {
        let mut draft = ImageDraft::from_existing(original.to_vec());
        if let Err(e) = self.reconcile(&mut draft, original, submitted) {
            return Err((e, draft));
        }
        if let Err(e) = self.attach_new(&mut draft, files) {
            return Err((e, draft));
        }
        if let Err(e) = self.validate_non_empty(&draft) {
            return Err((e, draft));
        }
        self.into_plan(draft).map_err(|e| (e, ImageDraft::new()))
    }
}
