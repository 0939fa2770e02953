/*
    Drape - garment design placement engine
    Copyright (C) 2025 meetzli

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.
*/

//! Slider and toggle inputs. Each one edits a single field of one side's
//! record; the order they are used in has no effect on rendering.

use crate::state::TransformState;
use crate::{DesignTransform, Side, TransformPatch, SIZE_MAX, SIZE_MIN};

pub const SIZE_SLIDER: (i32, i32) = (SIZE_MIN as i32, SIZE_MAX as i32);
pub const ROTATION_SLIDER: (i32, i32) = (0, 359);

pub fn set_size(state: &mut TransformState, side: Side, size: i32) -> DesignTransform {
    let size = size.clamp(SIZE_SLIDER.0, SIZE_SLIDER.1);
    state.set(side, TransformPatch { size: Some(size as f32), ..TransformPatch::default() })
}

pub fn set_rotation(state: &mut TransformState, side: Side, degrees: i32) -> DesignTransform {
    let degrees = degrees.rem_euclid(360);
    state.set(side, TransformPatch { rotation: Some(degrees as f32), ..TransformPatch::default() })
}

pub fn set_flipped(state: &mut TransformState, side: Side, flipped: bool) -> DesignTransform {
    state.set(side, TransformPatch { flipped: Some(flipped), ..TransformPatch::default() })
}

pub fn toggle_flip(state: &mut TransformState, side: Side) -> DesignTransform {
    let flipped = !state.get(side).flipped;
    set_flipped(state, side, flipped)
}

/// Parses a slider's string value. Browsers report range inputs as text.
pub fn parse_slider(value: &str) -> Option<i32> {
    let parsed: f64 = value.trim().parse().ok()?;
    parsed.is_finite().then(|| parsed.round() as i32)
}
