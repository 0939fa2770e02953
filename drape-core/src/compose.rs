/*
    Drape - garment design placement engine
    Copyright (C) 2025 meetzli

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.
*/

//! The one placement formula. Every surface that shows a design (editor
//! preview, cart thumbnail, order summary, raster export) goes through
//! [`compose_transform`] and consumes the resulting [`Affine`]; none of them
//! rebuild the math from the transform fields.
//!
//! Composition order, read as a CSS transform list:
//!
//! ```text
//! translate(anchor) translate(-50%, -50%) scale(size / baseline) rotate(rotation) scaleX(-1 if flipped)
//! ```
//!
//! The mirror is listed after the rotation, so it acts in the artwork's own
//! frame: `rotate(90) scaleX(-1)` is a different picture from
//! `scaleX(-1) rotate(90)`.

use serde::{Deserialize, Serialize};

use crate::{DesignTransform, EngineConfig};

/// Pixel box of the garment area a design is composited into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContainerBox {
    pub width: f32,
    pub height: f32,
}

impl ContainerBox {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn is_usable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// 2-D affine map in CSS `matrix(a, b, c, d, e, f)` order:
/// `x' = a*x + c*y + e`, `y' = b*x + d*y + f`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Affine {
    pub const IDENTITY: Affine = Affine { a: 1.0, b: 0.0, c: 0.0, d: 1.0, e: 0.0, f: 0.0 };

    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (self.a * x + self.c * y + self.e, self.b * x + self.d * y + self.f)
    }

    pub fn determinant(&self) -> f32 {
        self.a * self.d - self.b * self.c
    }

    pub fn to_css(&self) -> String {
        format!(
            "matrix({}, {}, {}, {}, {}, {})",
            self.a, self.b, self.c, self.d, self.e, self.f
        )
    }
}

/// Everything a surface needs to draw one side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComposedTransform {
    /// The transform actually rendered, after domain clamping.
    pub params: DesignTransform,
    pub anchor_x: f32,
    pub anchor_y: f32,
    /// Artwork box at 1.0x, in container pixels.
    pub box_width: f32,
    pub box_height: f32,
    pub scale: f32,
    /// Maps artwork-box coordinates (`0..box_width`, `0..box_height`) into
    /// container coordinates.
    pub matrix: Affine,
}

impl ComposedTransform {
    pub fn parameters(&self) -> DesignTransform {
        self.params
    }

    pub fn center(&self) -> (f32, f32) {
        self.matrix.apply(self.box_width / 2.0, self.box_height / 2.0)
    }

    /// Inline style for an absolutely positioned element of the natural box
    /// size, placed at the container's top-left corner.
    pub fn to_css(&self) -> String {
        format!(
            "position: absolute; left: 0; top: 0; width: {}px; height: {}px; transform-origin: 0 0; transform: {};",
            self.box_width,
            self.box_height,
            self.matrix.to_css()
        )
    }
}

/// Composes a side's transform inside `container`.
///
/// `artwork_size` is the decoded image size in pixels and only contributes
/// its aspect ratio; `None` (missing or undecodable artwork) yields a square
/// box for the placeholder. Out-of-domain fields are clamped, never rejected.
pub fn compose_transform(
    transform: &DesignTransform,
    container: ContainerBox,
    artwork_size: Option<(u32, u32)>,
    config: &EngineConfig,
) -> ComposedTransform {
    let params = transform.sanitized();
    if params != *transform {
        tracing::warn!(?transform, ?params, "clamped out-of-domain design transform");
    }

    let box_width = container.width.max(0.0) * config.natural_width_fraction;
    let box_height = match artwork_size {
        Some((w, h)) if w > 0 && h > 0 => box_width * h as f32 / w as f32,
        _ => box_width,
    };

    let anchor_x = container.width * params.horizontal_position / 100.0;
    let anchor_y = container.height * params.vertical_position / 100.0;
    let scale = config.scale_factor(params.size);

    let (sin, cos) = params.rotation.to_radians().sin_cos();
    let mirror = if params.flipped { -1.0 } else { 1.0 };

    // scale * rotate * mirror
    let a = scale * cos * mirror;
    let b = scale * sin * mirror;
    let c = -scale * sin;
    let d = scale * cos;

    // center-anchor: the box midpoint lands on the anchor
    let half_w = box_width / 2.0;
    let half_h = box_height / 2.0;
    let e = anchor_x - (a * half_w + c * half_h);
    let f = anchor_y - (b * half_w + d * half_h);

    ComposedTransform {
        params,
        anchor_x,
        anchor_y,
        box_width,
        box_height,
        scale,
        matrix: Affine { a, b, c, d, e, f },
    }
}
