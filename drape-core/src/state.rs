/*
    Drape - garment design placement engine
    Copyright (C) 2025 meetzli

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.
*/

use crate::{DesignTransform, PerSide, Side, TransformPatch};

/// The canonical per-side transform records. There is no shared "current"
/// transform; callers always name the side they mean.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformState {
    sides: PerSide<DesignTransform>,
}

impl TransformState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, side: Side) -> DesignTransform {
        *self.sides.get(side)
    }

    pub fn set(&mut self, side: Side, patch: TransformPatch) -> DesignTransform {
        let transform = self.sides.get_mut(side);
        transform.apply(&patch);
        *transform
    }

    pub fn reset(&mut self, side: Side) {
        *self.sides.get_mut(side) = DesignTransform::default();
    }

    pub(crate) fn get_mut(&mut self, side: Side) -> &mut DesignTransform {
        self.sides.get_mut(side)
    }
}
