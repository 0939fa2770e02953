/*
    Drape - garment design placement engine
    Copyright (C) 2025 meetzli

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.
*/

use crate::compose::ContainerBox;
use crate::state::TransformState;
use crate::{DesignTransform, EngineConfig, Side};

/// Pointer position in page pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerPos {
    pub x: f64,
    pub y: f64,
}

impl PointerPos {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct DragSession {
    side: Side,
    container: ContainerBox,
    last: PointerPos,
}

/// Moves a side's anchor with the pointer. Positions are updated on every
/// move; there is no commit step. The anchor never leaves the safe zone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DragController {
    session: Option<DragSession>,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Captures the container box and starting pointer. A container with no
    /// area cannot be dragged in and leaves the controller detached.
    pub fn begin(&mut self, side: Side, container: ContainerBox, pointer: PointerPos) -> bool {
        if !container.is_usable() {
            tracing::warn!(?container, "ignoring drag start in an empty container");
            self.session = None;
            return false;
        }
        tracing::debug!(%side, "drag started");
        self.session = Some(DragSession { side, container, last: pointer });
        true
    }

    /// Applies the movement since the previous event. Returns the updated
    /// transform, or `None` when no drag is attached.
    pub fn drag_to(
        &mut self,
        pointer: PointerPos,
        state: &mut TransformState,
        config: &EngineConfig,
    ) -> Option<DesignTransform> {
        let session = self.session.as_mut()?;

        let dx = ((pointer.x - session.last.x) / session.container.width as f64 * 100.0) as f32;
        let dy = ((pointer.y - session.last.y) / session.container.height as f64 * 100.0) as f32;
        let transform = state.get_mut(session.side);
        if !(dx.is_finite() && dy.is_finite()) {
            tracing::warn!(?pointer, "ignoring non-finite pointer move");
            return Some(*transform);
        }
        session.last = pointer;

        transform.horizontal_position = config.clamp_to_safe_zone(transform.horizontal_position + dx);
        transform.vertical_position = config.clamp_to_safe_zone(transform.vertical_position + dy);
        Some(*transform)
    }

    pub fn end(&mut self) {
        if let Some(session) = self.session.take() {
            tracing::debug!(side = %session.side, "drag ended");
        }
    }

    /// Detaches immediately so a late move cannot land on a side that is no
    /// longer being edited.
    pub fn cancel(&mut self) {
        if let Some(session) = self.session.take() {
            tracing::debug!(side = %session.side, "drag cancelled");
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    pub fn dragging_side(&self) -> Option<Side> {
        self.session.as_ref().map(|s| s.side)
    }
}
