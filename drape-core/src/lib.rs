/*
    Drape - garment design placement engine
    Copyright (C) 2025 meetzli

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.
*/

use serde::{Deserialize, Serialize};

pub mod artwork;
pub mod compose;
pub mod config;
pub mod controls;
pub mod drag;
pub mod error;
pub mod ingest;
pub mod payload;
pub mod serialize;
pub mod session;
pub mod state;

pub use artwork::{Artwork, ArtworkRef, ArtworkResolver, ArtworkStore, DetachedResolver};
pub use compose::{compose_transform, Affine, ComposedTransform, ContainerBox};
pub use config::EngineConfig;
pub use drag::{DragController, PointerPos};
pub use error::DesignError;
pub use ingest::{FileDescriptor, PendingUpload, DecodedUpload};
pub use payload::{CartLineItem, CustomizationPayload};
pub use session::{DesignSession, UploadOutcome};
pub use state::TransformState;

pub const POSITION_MIN: f32 = 0.0;
pub const POSITION_MAX: f32 = 100.0;
pub const SIZE_MIN: f32 = 10.0;
pub const SIZE_MAX: f32 = 100.0;

/// Face of the garment a design is placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Front,
    Back,
}

impl Side {
    pub const ALL: [Side; 2] = [Side::Front, Side::Back];

    pub fn label(self) -> &'static str {
        match self {
            Side::Front => "front",
            Side::Back => "back",
        }
    }

    pub fn other(self) -> Side {
        match self {
            Side::Front => Side::Back,
            Side::Back => Side::Front,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One value per side, stored by value so the two never share state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerSide<T> {
    pub front: T,
    pub back: T,
}

impl<T> PerSide<T> {
    pub fn get(&self, side: Side) -> &T {
        match side {
            Side::Front => &self.front,
            Side::Back => &self.back,
        }
    }

    pub fn get_mut(&mut self, side: Side) -> &mut T {
        match side {
            Side::Front => &mut self.front,
            Side::Back => &mut self.back,
        }
    }
}

/// Placement of one artwork on one side. Positions and size are percentages,
/// rotation is in degrees.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DesignTransform {
    #[serde(rename = "vertical")]
    pub vertical_position: f32,
    #[serde(rename = "horizontal")]
    pub horizontal_position: f32,
    pub size: f32,
    #[serde(default)]
    pub rotation: f32,
    #[serde(default)]
    pub flipped: bool,
}

impl Default for DesignTransform {
    fn default() -> Self {
        Self {
            vertical_position: 50.0,
            horizontal_position: 50.0,
            size: 50.0,
            rotation: 0.0,
            flipped: false,
        }
    }
}

impl DesignTransform {
    /// Coerces every field into its domain. Valid tuples come back unchanged.
    pub fn sanitized(&self) -> Self {
        let defaults = Self::default();
        Self {
            vertical_position: clamp_or(self.vertical_position, POSITION_MIN, POSITION_MAX, defaults.vertical_position),
            horizontal_position: clamp_or(self.horizontal_position, POSITION_MIN, POSITION_MAX, defaults.horizontal_position),
            size: clamp_or(self.size, SIZE_MIN, SIZE_MAX, defaults.size),
            rotation: normalize_rotation(self.rotation),
            flipped: self.flipped,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.sanitized() == *self
    }

    pub fn apply(&mut self, patch: &TransformPatch) {
        if let Some(v) = patch.vertical_position {
            self.vertical_position = v;
        }
        if let Some(h) = patch.horizontal_position {
            self.horizontal_position = h;
        }
        if let Some(size) = patch.size {
            self.size = size;
        }
        if let Some(rotation) = patch.rotation {
            self.rotation = rotation;
        }
        if let Some(flipped) = patch.flipped {
            self.flipped = flipped;
        }
        *self = self.sanitized();
    }
}

/// Partial update for a [`DesignTransform`]; `None` fields are left alone.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TransformPatch {
    pub vertical_position: Option<f32>,
    pub horizontal_position: Option<f32>,
    pub size: Option<f32>,
    pub rotation: Option<f32>,
    pub flipped: Option<bool>,
}

impl TransformPatch {
    pub fn position(horizontal: f32, vertical: f32) -> Self {
        Self {
            horizontal_position: Some(horizontal),
            vertical_position: Some(vertical),
            ..Self::default()
        }
    }
}

/// Artwork uploaded for one side together with its placement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SideDesign {
    pub image: ArtworkRef,
    pub transform: DesignTransform,
}

/// Rotation in degrees folded into `[0, 360)`. Non-finite input becomes 0.
pub fn normalize_rotation(degrees: f32) -> f32 {
    if !degrees.is_finite() {
        return 0.0;
    }
    let r = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if r >= 360.0 { 0.0 } else { r }
}

fn clamp_or(value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        fallback
    }
}
