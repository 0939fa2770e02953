/*
    Drape - garment design placement engine
    Copyright (C) 2025 meetzli

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.
*/

use serde::{Deserialize, Serialize};

use crate::artwork::ArtworkRef;
use crate::error::DesignError;
use crate::{DesignTransform, Side, SideDesign};

/// Frozen snapshot of both sides, attached to a cart line item. Holds values
/// only; nothing in here points back at editor state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "CustomizationWire", try_from = "CustomizationWire")]
pub struct CustomizationPayload {
    front: Option<SideDesign>,
    back: Option<SideDesign>,
}

impl CustomizationPayload {
    pub fn new(front: Option<SideDesign>, back: Option<SideDesign>) -> Result<Self, DesignError> {
        if front.is_none() && back.is_none() {
            return Err(DesignError::InvalidPayload("customization has no designed side".into()));
        }
        Ok(Self { front, back })
    }

    pub fn side(&self, side: Side) -> Option<&SideDesign> {
        match side {
            Side::Front => self.front.as_ref(),
            Side::Back => self.back.as_ref(),
        }
    }

    pub fn front(&self) -> Option<&SideDesign> {
        self.front.as_ref()
    }

    pub fn back(&self) -> Option<&SideDesign> {
        self.back.as_ref()
    }

    pub fn designed_sides(&self) -> impl Iterator<Item = Side> + '_ {
        Side::ALL.into_iter().filter(move |side| self.side(*side).is_some())
    }

    pub fn to_json(&self) -> Result<String, DesignError> {
        serde_json::to_string(self).map_err(|e| DesignError::InvalidPayload(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, DesignError> {
        serde_json::from_str(json).map_err(|e| DesignError::InvalidPayload(e.to_string()))
    }
}

/// The `customization` object as stored by the order collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CustomizationWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    front_image: Option<ArtworkRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    back_image: Option<ArtworkRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    front_design: Option<DesignTransform>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    back_design: Option<DesignTransform>,
}

impl From<CustomizationPayload> for CustomizationWire {
    fn from(payload: CustomizationPayload) -> Self {
        let (front_image, front_design) = split(payload.front);
        let (back_image, back_design) = split(payload.back);
        Self { front_image, back_image, front_design, back_design }
    }
}

impl TryFrom<CustomizationWire> for CustomizationPayload {
    type Error = DesignError;

    fn try_from(wire: CustomizationWire) -> Result<Self, Self::Error> {
        let front = join(Side::Front, wire.front_image, wire.front_design);
        let back = join(Side::Back, wire.back_image, wire.back_design);
        CustomizationPayload::new(front, back)
    }
}

fn split(design: Option<SideDesign>) -> (Option<ArtworkRef>, Option<DesignTransform>) {
    match design {
        Some(d) => (Some(d.image), Some(d.transform)),
        None => (None, None),
    }
}

fn join(side: Side, image: Option<ArtworkRef>, transform: Option<DesignTransform>) -> Option<SideDesign> {
    match (image, transform) {
        (Some(image), transform) => Some(SideDesign {
            image,
            transform: transform.unwrap_or_default(),
        }),
        (None, Some(_)) => {
            tracing::warn!(%side, "dropping design that has no image");
            None
        }
        (None, None) => None,
    }
}

/// Cart entry as exchanged with the cart/checkout collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    pub product_id: String,
    pub size: String,
    pub color: String,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customization: Option<CustomizationPayload>,
}

impl CartLineItem {
    pub fn to_json(&self) -> Result<String, DesignError> {
        serde_json::to_string_pretty(self).map_err(|e| DesignError::InvalidPayload(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, DesignError> {
        serde_json::from_str(json).map_err(|e| DesignError::InvalidPayload(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use serde_json::json;

    fn design(image: &str, transform: DesignTransform) -> SideDesign {
        SideDesign { image: ArtworkRef::new(image), transform }
    }

    #[test]
    fn serializes_to_wire_shape() {
        let payload = CustomizationPayload::new(
            Some(design("data:image/png;base64,AAAA", DesignTransform { size: 80.0, rotation: 90.0, flipped: true, ..Default::default() })),
            None,
        )
        .unwrap();

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            value,
            json!({
                "frontImage": "data:image/png;base64,AAAA",
                "frontDesign": { "vertical": 50.0, "horizontal": 50.0, "size": 80.0, "rotation": 90.0, "flipped": true }
            })
        );
    }

    #[test]
    fn empty_payload_is_invalid() {
        assert!(CustomizationPayload::new(None, None).is_err());
        assert!(CustomizationPayload::from_json("{}").is_err());
    }

    #[test]
    fn image_without_design_gets_default_transform() {
        let payload = CustomizationPayload::from_json(r#"{"backImage": "data:image/png;base64,AAAA"}"#).unwrap();
        assert!(payload.front().is_none());
        assert_eq!(payload.back().unwrap().transform, DesignTransform::default());
    }

    #[test]
    fn design_without_image_is_dropped() {
        let json = r#"{
            "frontDesign": {"vertical": 30, "horizontal": 30, "size": 50, "rotation": 0, "flipped": false},
            "backImage": "x"
        }"#;
        let payload = CustomizationPayload::from_json(json).unwrap();
        assert!(payload.front().is_none());
        assert_eq!(payload.designed_sides().collect::<Vec<_>>(), vec![Side::Back]);
    }

    #[test]
    fn out_of_domain_values_survive_deserialization_verbatim() {
        let json = r#"{"frontImage": "x", "frontDesign": {"vertical": 500, "horizontal": -2, "size": 0, "rotation": 720, "flipped": true}}"#;
        let payload = CustomizationPayload::from_json(json).unwrap();
        assert_eq!(payload.front().unwrap().transform.vertical_position, 500.0);
    }

    #[test]
    fn serialize_deserialize_is_idempotent() {
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..300 {
            let random_side = |rng: &mut StdRng, tag: &str| {
                rng.random_bool(0.6).then(|| {
                    design(
                        &format!("data:image/png;base64,{tag}{}", rng.random_range(0..1000)),
                        DesignTransform {
                            vertical_position: rng.random_range(20.0..=80.0),
                            horizontal_position: rng.random_range(20.0..=80.0),
                            size: rng.random_range(10..=100) as f32,
                            rotation: rng.random_range(0..360) as f32,
                            flipped: rng.random_bool(0.5),
                        },
                    )
                })
            };
            let front = random_side(&mut rng, "f");
            let back = random_side(&mut rng, "b");
            let Ok(payload) = CustomizationPayload::new(front, back) else {
                continue;
            };

            let json = payload.to_json().unwrap();
            let restored = CustomizationPayload::from_json(&json).unwrap();
            assert_eq!(restored, payload);
            assert_eq!(restored.to_json().unwrap(), json);
        }
    }

    #[test]
    fn line_item_uses_camel_case() {
        let item = CartLineItem {
            product_id: "tee-classic".into(),
            size: "M".into(),
            color: "#ffffff".into(),
            quantity: 2,
            customization: None,
        };
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["productId"], "tee-classic");
        assert!(value.get("customization").is_none());
        assert_eq!(CartLineItem::from_json(&item.to_json().unwrap()).unwrap(), item);
    }
}
