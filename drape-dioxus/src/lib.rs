/*
    Drape - garment design placement engine
    Copyright (C) 2025 meetzli

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.
*/

use drape_core::{
    compose_transform, ArtworkResolver, CartLineItem, ContainerBox, CustomizationPayload, DetachedResolver,
    EngineConfig, Side, SideDesign,
};
use dioxus::prelude::*;
use std::sync::Arc;

const PLACEHOLDER_FILL: &str = "#e4e4e7";
const PLACEHOLDER_STROKE: &str = "#a1a1aa";

/// What gets drawn inside a garment container for one side.
#[derive(Debug, Clone, PartialEq)]
pub enum SideLayer {
    Artwork { src: Arc<str>, style: String },
    Placeholder { style: String },
}

/// Resolves the artwork and composes its placement. Anything that cannot be
/// resolved becomes a placeholder at the placement it would have had.
pub fn side_layer(
    design: Option<&SideDesign>,
    container: ContainerBox,
    resolver: &dyn ArtworkResolver,
    config: &EngineConfig,
) -> SideLayer {
    let transform = design.map(|d| d.transform).unwrap_or_default();
    let artwork = design.and_then(|d| match resolver.resolve(&d.image) {
        Ok(artwork) => Some(artwork),
        Err(reason) => {
            tracing::warn!(image = %d.image, %reason, "artwork unavailable, showing placeholder");
            None
        }
    });

    let composed = compose_transform(&transform, container, artwork.as_ref().map(|a| a.dimensions()), config);
    match artwork {
        Some(artwork) => SideLayer::Artwork {
            src: artwork.shared_src(),
            style: composed.to_css(),
        },
        None => SideLayer::Placeholder {
            style: format!(
                "{} box-sizing: border-box; display: flex; align-items: center; justify-content: center; \
                 border: 2px solid {PLACEHOLDER_STROKE}; border-radius: 8%; background: {PLACEHOLDER_FILL}; \
                 color: {PLACEHOLDER_STROKE}; font-family: sans-serif; font-size: {}px;",
                composed.to_css(),
                composed.box_height * 0.5
            ),
        },
    }
}

fn container_style(container: ContainerBox, background: &str) -> String {
    format!(
        "position: relative; width: {}px; height: {}px; background-color: {}; overflow: hidden;",
        container.width, container.height, background
    )
}

pub fn render_layer_to_rsx(layer: SideLayer, container: ContainerBox, background: &str) -> Element {
    let style = container_style(container, background);

    rsx! {
        div {
            class: "drape-garment",
            style: "{style}",
            {match layer {
                SideLayer::Artwork { src, style } => rsx! {
                    img { class: "drape-artwork", src: "{src}", style: "{style}", draggable: "false" }
                },
                SideLayer::Placeholder { style } => rsx! {
                    div { class: "drape-placeholder", style: "{style}", "?" }
                },
            }}
        }
    }
}

pub fn render_side_to_rsx(
    design: Option<&SideDesign>,
    container: ContainerBox,
    background: &str,
    resolver: &dyn ArtworkResolver,
    config: &EngineConfig,
) -> Element {
    render_layer_to_rsx(side_layer(design, container, resolver, config), container, background)
}

/// Layer for one side of a stored payload, resolved with no editor attached.
pub fn payload_layer(
    payload: &CustomizationPayload,
    side: Side,
    container: ContainerBox,
    config: &EngineConfig,
) -> SideLayer {
    side_layer(payload.side(side), container, &DetachedResolver::new(), config)
}

pub fn render_payload_to_rsx(
    payload: &CustomizationPayload,
    side: Side,
    container: ContainerBox,
    background: &str,
    config: &EngineConfig,
) -> Element {
    render_layer_to_rsx(payload_layer(payload, side, container, config), container, background)
}

/// Thumbnails for a cart row: both sides of a customized item, an absent
/// side as a placeholder. Items without customization have none.
pub fn line_item_layers(item: &CartLineItem, thumbnail: ContainerBox, config: &EngineConfig) -> Vec<(Side, SideLayer)> {
    let Some(payload) = &item.customization else {
        return Vec::new();
    };
    let resolver = DetachedResolver::new();
    Side::ALL
        .into_iter()
        .map(|side| (side, side_layer(payload.side(side), thumbnail, &resolver, config)))
        .collect()
}

pub fn render_line_item_to_rsx(item: &CartLineItem, thumbnail: ContainerBox, config: &EngineConfig) -> Element {
    let layers = line_item_layers(item, thumbnail, config);

    rsx! {
        div {
            class: "drape-line-item",
            div {
                class: "drape-line-item-thumbs",
                if layers.is_empty() {
                    span { class: "drape-line-item-plain", "No custom design" }
                }
                for (side, layer) in layers {
                    div {
                        key: "{side}",
                        class: "drape-line-item-thumb",
                        {render_layer_to_rsx(layer, thumbnail, &item.color)}
                        span { class: "drape-line-item-side", "{side}" }
                    }
                }
            }
            div {
                class: "drape-line-item-details",
                span { "{item.product_id}" }
                span { "Size: {item.size}" }
                span {
                    "Color: "
                    span { class: "drape-swatch", style: "background-color: {item.color};" }
                }
                span { "Qty: {item.quantity}" }
            }
        }
    }
}
