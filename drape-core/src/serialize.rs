/*
    Drape - garment design placement engine
    Copyright (C) 2025 meetzli

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.
*/

//! Freezes editor state into a [`CustomizationPayload`] at add-to-cart time.

use crate::artwork::{ArtworkRef, ArtworkResolver};
use crate::error::DesignError;
use crate::payload::{CartLineItem, CustomizationPayload};
use crate::state::TransformState;
use crate::{PerSide, Side, SideDesign};

/// Garment details chosen alongside the design.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItemRequest<'a> {
    pub product_id: &'a str,
    pub garment_size: Option<&'a str>,
    pub color: &'a str,
    pub quantity: u32,
}

/// Copies one side out of the editor. Store handles are re-encoded into
/// data URIs so the copy outlives the store.
pub fn freeze_side(
    side: Side,
    image: &ArtworkRef,
    transforms: &TransformState,
    resolver: &dyn ArtworkResolver,
) -> Result<SideDesign, DesignError> {
    let image = if image.is_detached() {
        image.clone()
    } else {
        resolver
            .resolve(image)
            .map_err(|reason| DesignError::DecodeFailure { side, reason })?
            .to_detached_ref()?
    };
    Ok(SideDesign {
        image,
        transform: transforms.get(side).sanitized(),
    })
}

pub fn snapshot(
    images: &PerSide<Option<ArtworkRef>>,
    transforms: &TransformState,
    resolver: &dyn ArtworkResolver,
) -> Result<CustomizationPayload, DesignError> {
    let mut frozen: PerSide<Option<SideDesign>> = PerSide::default();
    for side in Side::ALL {
        if let Some(image) = images.get(side) {
            *frozen.get_mut(side) = Some(freeze_side(side, image, transforms, resolver)?);
        }
    }
    CustomizationPayload::new(frozen.front, frozen.back).map_err(|_| DesignError::MissingSizeOrImage)
}

/// Builds the cart entry. Refused without a garment size or without any
/// uploaded side; nothing is serialized in that case.
pub fn build_line_item(
    request: &LineItemRequest<'_>,
    images: &PerSide<Option<ArtworkRef>>,
    transforms: &TransformState,
    resolver: &dyn ArtworkResolver,
) -> Result<CartLineItem, DesignError> {
    let garment_size = request
        .garment_size
        .filter(|s| !s.trim().is_empty())
        .ok_or(DesignError::MissingSizeOrImage)?;
    if images.front.is_none() && images.back.is_none() {
        return Err(DesignError::MissingSizeOrImage);
    }

    let customization = snapshot(images, transforms, resolver)?;
    Ok(CartLineItem {
        product_id: request.product_id.to_string(),
        size: garment_size.to_string(),
        color: request.color.to_string(),
        quantity: request.quantity.max(1),
        customization: Some(customization),
    })
}
