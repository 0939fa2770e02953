/*
    Drape - garment design placement engine
    Copyright (C) 2025 meetzli

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.
*/

//! Editor state for one customization in progress.

use crate::artwork::{ArtworkRef, ArtworkStore};
use crate::compose::ContainerBox;
use crate::controls;
use crate::drag::{DragController, PointerPos};
use crate::error::DesignError;
use crate::ingest::{self, DecodedUpload, FileDescriptor, PendingUpload};
use crate::payload::CartLineItem;
use crate::serialize::{self, LineItemRequest};
use crate::state::TransformState;
use crate::{DesignTransform, EngineConfig, PerSide, Side, SideDesign, TransformPatch};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The side now shows the new artwork with a default transform.
    Applied,
    /// The side was cleared or re-uploaded while this file was decoding.
    Stale,
}

#[derive(Debug, Clone)]
pub struct DesignSession {
    config: EngineConfig,
    active_side: Side,
    images: PerSide<Option<ArtworkRef>>,
    generations: PerSide<u64>,
    transforms: TransformState,
    drag: DragController,
    store: ArtworkStore,
    garment_size: Option<String>,
    color: String,
}

impl Default for DesignSession {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl DesignSession {
    pub fn new(config: EngineConfig) -> Self {
        let color = config.garment_colors.first().cloned().unwrap_or_else(|| "#ffffff".to_string());
        Self {
            config,
            active_side: Side::Front,
            images: PerSide::default(),
            generations: PerSide::default(),
            transforms: TransformState::new(),
            drag: DragController::new(),
            store: ArtworkStore::new(),
            garment_size: None,
            color,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &ArtworkStore {
        &self.store
    }

    pub fn active_side(&self) -> Side {
        self.active_side
    }

    pub fn set_active_side(&mut self, side: Side) {
        if side != self.active_side {
            self.drag.cancel();
            self.active_side = side;
        }
    }

    pub fn transform(&self, side: Side) -> DesignTransform {
        self.transforms.get(side)
    }

    pub fn image(&self, side: Side) -> Option<&ArtworkRef> {
        self.images.get(side).as_ref()
    }

    pub fn has_any_image(&self) -> bool {
        Side::ALL.iter().any(|side| self.images.get(*side).is_some())
    }

    /// Live view of one side, or `None` when nothing is uploaded there.
    pub fn side_design(&self, side: Side) -> Option<SideDesign> {
        self.image(side).map(|image| SideDesign {
            image: image.clone(),
            transform: self.transforms.get(side),
        })
    }

    // --- ingestion ---

    /// Validates a picked file and hands back a decode ticket. Rejected
    /// files leave the session untouched.
    pub fn begin_upload(&mut self, side: Side, file: &FileDescriptor) -> Result<PendingUpload, DesignError> {
        if let Err(e) = ingest::validate(side, file, &self.config) {
            tracing::warn!(%side, name = %file.name, error = %e, "upload rejected");
            return Err(e);
        }
        let generation = self.bump_generation(side);
        tracing::debug!(%side, generation, name = %file.name, "upload accepted, decoding");
        Ok(PendingUpload {
            side,
            generation,
            mime: file.mime.trim().to_string(),
            limit: self.config.max_upload_bytes,
        })
    }

    /// Lands a finished decode on its side. Results for a superseded ticket
    /// are dropped.
    pub fn finish_upload(&mut self, decoded: DecodedUpload) -> Result<UploadOutcome, DesignError> {
        let side = decoded.side;
        if *self.generations.get(side) != decoded.generation {
            tracing::warn!(%side, generation = decoded.generation, "discarding stale decode");
            return Ok(UploadOutcome::Stale);
        }

        match decoded.result {
            Ok(artwork) => {
                self.release_image(side);
                let handle = ArtworkRef::handle(side, decoded.generation);
                self.store.insert(handle.clone(), artwork);
                *self.images.get_mut(side) = Some(handle);
                self.transforms.reset(side);
                tracing::debug!(%side, "artwork ready");
                Ok(UploadOutcome::Applied)
            }
            Err(e) => {
                tracing::warn!(%side, error = %e, "artwork decode failed");
                self.release_image(side);
                Err(e)
            }
        }
    }

    /// Removes a side's artwork. Any decode still in flight for that side is
    /// invalidated.
    pub fn clear_image(&mut self, side: Side) {
        self.bump_generation(side);
        self.release_image(side);
        self.transforms.reset(side);
    }

    fn bump_generation(&mut self, side: Side) -> u64 {
        let generation = self.generations.get_mut(side);
        *generation += 1;
        *generation
    }

    fn release_image(&mut self, side: Side) {
        if self.drag.dragging_side() == Some(side) {
            self.drag.cancel();
        }
        if let Some(old) = self.images.get_mut(side).take() {
            self.store.revoke(&old);
        }
    }

    // --- interaction ---

    /// Starts dragging the active side's design. Needs artwork on that side.
    pub fn begin_drag(&mut self, container: ContainerBox, pointer: PointerPos) -> bool {
        let side = self.active_side;
        if self.images.get(side).is_none() {
            return false;
        }
        self.drag.begin(side, container, pointer)
    }

    pub fn drag_to(&mut self, pointer: PointerPos) -> Option<DesignTransform> {
        self.drag.drag_to(pointer, &mut self.transforms, &self.config)
    }

    pub fn end_drag(&mut self) {
        self.drag.end();
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    pub fn set_size(&mut self, size: i32) -> DesignTransform {
        controls::set_size(&mut self.transforms, self.active_side, size)
    }

    pub fn set_rotation(&mut self, degrees: i32) -> DesignTransform {
        controls::set_rotation(&mut self.transforms, self.active_side, degrees)
    }

    pub fn set_flipped(&mut self, flipped: bool) -> DesignTransform {
        controls::set_flipped(&mut self.transforms, self.active_side, flipped)
    }

    pub fn toggle_flip(&mut self) -> DesignTransform {
        controls::toggle_flip(&mut self.transforms, self.active_side)
    }

    /// Direct edit of any side, for keyboard nudges and programmatic edits.
    pub fn set_transform(&mut self, side: Side, patch: TransformPatch) -> DesignTransform {
        self.transforms.set(side, patch)
    }

    pub fn reset_side(&mut self, side: Side) {
        if self.drag.dragging_side() == Some(side) {
            self.drag.cancel();
        }
        self.transforms.reset(side);
    }

    // --- garment + cart ---

    pub fn select_garment_size(&mut self, size: impl Into<String>) {
        self.garment_size = Some(size.into());
    }

    pub fn garment_size(&self) -> Option<&str> {
        self.garment_size.as_deref()
    }

    pub fn select_color(&mut self, color: impl Into<String>) {
        self.color = color.into();
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn can_add_to_cart(&self) -> bool {
        self.garment_size.is_some() && self.has_any_image()
    }

    /// Freezes the current design into a new cart line. The session keeps
    /// its state; call [`DesignSession::start_new_design`] to begin another.
    pub fn add_to_cart(&self, product_id: &str, quantity: u32) -> Result<CartLineItem, DesignError> {
        let request = LineItemRequest {
            product_id,
            garment_size: self.garment_size.as_deref(),
            color: &self.color,
            quantity,
        };
        let item = serialize::build_line_item(&request, &self.images, &self.transforms, &self.store);
        match &item {
            Ok(item) => tracing::debug!(product = %item.product_id, size = %item.size, "line item created"),
            Err(e) => tracing::warn!(error = %e, "add to cart refused"),
        }
        item
    }

    /// Fresh defaults for the next line item. Garment choices are kept.
    pub fn start_new_design(&mut self) {
        self.drag.cancel();
        for side in Side::ALL {
            self.clear_image(side);
        }
        self.store.clear();
        self.active_side = Side::Front;
    }
}

impl Drop for DesignSession {
    fn drop(&mut self) {
        self.drag.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artwork::tests::png_bytes;

    fn png_file(size: u64) -> FileDescriptor {
        FileDescriptor::new("art.png", "image/png", size)
    }

    fn upload(session: &mut DesignSession, side: Side) {
        let bytes = png_bytes(10, 10);
        let ticket = session.begin_upload(side, &png_file(bytes.len() as u64)).unwrap();
        assert_eq!(session.finish_upload(ticket.decode(&bytes)).unwrap(), UploadOutcome::Applied);
    }

    #[test]
    fn upload_initializes_side_with_defaults() {
        let mut session = DesignSession::default();
        session.set_rotation(30);
        upload(&mut session, Side::Front);
        let design = session.side_design(Side::Front).unwrap();
        assert_eq!(design.transform, DesignTransform::default());
        assert!(session.side_design(Side::Back).is_none());
    }

    #[test]
    fn upload_on_one_side_leaves_the_other_alone() {
        let mut session = DesignSession::default();
        upload(&mut session, Side::Back);
        session.set_active_side(Side::Back);
        session.set_size(90);
        upload(&mut session, Side::Front);
        assert_eq!(session.transform(Side::Back).size, 90.0);
    }

    #[test]
    fn rejected_upload_mutates_nothing() {
        let mut session = DesignSession::default();
        upload(&mut session, Side::Front);
        let before = session.clone();
        let err = session
            .begin_upload(Side::Front, &FileDescriptor::new("doc.txt", "text/plain", 10))
            .unwrap_err();
        assert!(matches!(err, DesignError::InvalidFileType { .. }));
        assert_eq!(session.images, before.images);
        assert_eq!(session.generations, before.generations);
    }

    #[test]
    fn interleaved_decodes_are_independent() {
        let mut session = DesignSession::default();
        let bytes = png_bytes(4, 4);
        let front = session.begin_upload(Side::Front, &png_file(bytes.len() as u64)).unwrap();
        let back = session.begin_upload(Side::Back, &png_file(bytes.len() as u64)).unwrap();

        let back_result = back.decode(b"garbage");
        assert!(session.finish_upload(back_result).is_err());
        assert_eq!(session.finish_upload(front.decode(&bytes)).unwrap(), UploadOutcome::Applied);
        assert!(session.image(Side::Front).is_some());
        assert!(session.image(Side::Back).is_none());
    }

    #[test]
    fn decode_finishing_after_clear_is_stale() {
        let mut session = DesignSession::default();
        let bytes = png_bytes(4, 4);
        let ticket = session.begin_upload(Side::Front, &png_file(bytes.len() as u64)).unwrap();
        session.clear_image(Side::Front);
        assert_eq!(session.finish_upload(ticket.decode(&bytes)).unwrap(), UploadOutcome::Stale);
        assert!(session.image(Side::Front).is_none());
    }

    #[test]
    fn older_upload_cannot_overwrite_newer_one() {
        let mut session = DesignSession::default();
        let first = png_bytes(4, 4);
        let second = png_bytes(8, 2);
        let old = session.begin_upload(Side::Back, &png_file(first.len() as u64)).unwrap();
        let new = session.begin_upload(Side::Back, &png_file(second.len() as u64)).unwrap();
        assert_eq!(session.finish_upload(new.decode(&second)).unwrap(), UploadOutcome::Applied);
        assert_eq!(session.finish_upload(old.decode(&first)).unwrap(), UploadOutcome::Stale);

        let handle = session.image(Side::Back).unwrap();
        assert_eq!(session.store().get(handle).unwrap().dimensions(), (8, 2));
    }

    #[test]
    fn replacing_artwork_revokes_the_old_handle() {
        let mut session = DesignSession::default();
        upload(&mut session, Side::Front);
        let first = session.image(Side::Front).unwrap().clone();
        upload(&mut session, Side::Front);
        assert!(session.store().get(&first).is_none());
        assert_eq!(session.store().len(), 1);
    }

    #[test]
    fn switching_side_detaches_drag() {
        let mut session = DesignSession::default();
        upload(&mut session, Side::Front);
        upload(&mut session, Side::Back);
        assert!(session.begin_drag(ContainerBox::new(100.0, 100.0), PointerPos::new(0.0, 0.0)));
        session.set_active_side(Side::Back);
        assert!(!session.is_dragging());
        assert!(session.drag_to(PointerPos::new(20.0, 20.0)).is_none());
        assert_eq!(session.transform(Side::Front), DesignTransform::default());
        assert_eq!(session.transform(Side::Back), DesignTransform::default());
    }

    #[test]
    fn clearing_image_detaches_drag() {
        let mut session = DesignSession::default();
        upload(&mut session, Side::Front);
        session.begin_drag(ContainerBox::new(100.0, 100.0), PointerPos::new(0.0, 0.0));
        session.clear_image(Side::Front);
        assert!(!session.is_dragging());
        assert!(session.drag_to(PointerPos::new(20.0, 20.0)).is_none());
    }

    #[test]
    fn drag_needs_artwork_on_active_side() {
        let mut session = DesignSession::default();
        upload(&mut session, Side::Back);
        assert!(!session.begin_drag(ContainerBox::new(100.0, 100.0), PointerPos::new(0.0, 0.0)));
    }

    #[test]
    fn start_new_design_resets_but_keeps_emitted_item() {
        let mut session = DesignSession::default();
        session.select_garment_size("L");
        upload(&mut session, Side::Front);
        session.set_rotation(120);
        let item = session.add_to_cart("tee", 1).unwrap();

        session.start_new_design();
        assert!(!session.has_any_image());
        assert!(session.store().is_empty());
        assert_eq!(session.transform(Side::Front), DesignTransform::default());
        assert_eq!(item.customization.unwrap().front().unwrap().transform.rotation, 120.0);
        assert_eq!(session.garment_size(), Some("L"));
    }
}
