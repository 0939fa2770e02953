/*
    Drape - garment design placement engine
    Copyright (C) 2025 meetzli

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.
*/

use cosmic_text::{Attrs, Buffer, Family, FontSystem, Metrics, Shaping, SwashCache};
use drape_core::{
    compose_transform, ArtworkResolver, ComposedTransform, ContainerBox, CustomizationPayload, DetachedResolver,
    EngineConfig, Side, SideDesign,
};
use image::RgbaImage;
use thiserror::Error;
use tiny_skia::*;
use std::collections::{HashMap, VecDeque};
use std::hash::{DefaultHasher, Hash, Hasher};

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to create pixmap: {0}")]
    PixmapCreationError(String),

    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}

/// Garment area a side is composited onto.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pub width: u32,
    pub height: u32,
    pub background: String,
}

impl Surface {
    pub fn new(width: u32, height: u32, background: impl Into<String>) -> Self {
        Self { width, height, background: background.into() }
    }

    fn container(&self) -> ContainerBox {
        ContainerBox::new(self.width as f32, self.height as f32)
    }
}

const PLACEHOLDER_FILL: &str = "#e4e4e7";
const PLACEHOLDER_STROKE: &str = "#a1a1aa";
const PLACEHOLDER_GLYPH: &str = "?";
const ARTWORK_CACHE_CAPACITY: usize = 16;

/// Digest of a data URI; the URI itself is not retained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct ArtworkKey {
    hash: u64,
    len: usize,
}

impl ArtworkKey {
    fn of(uri: &str) -> Self {
        let mut hasher = DefaultHasher::new();
        uri.hash(&mut hasher);
        Self { hash: hasher.finish(), len: uri.len() }
    }
}

/// Decoded data-URI artwork, oldest entry evicted first.
struct ArtworkCache {
    entries: HashMap<ArtworkKey, Pixmap>,
    order: VecDeque<ArtworkKey>,
    capacity: usize,
}

impl ArtworkCache {
    fn new(capacity: usize) -> Self {
        Self { entries: HashMap::new(), order: VecDeque::new(), capacity }
    }

    fn contains(&self, key: ArtworkKey) -> bool {
        self.entries.contains_key(&key)
    }

    fn get(&self, key: ArtworkKey) -> Option<&Pixmap> {
        self.entries.get(&key)
    }

    fn insert(&mut self, key: ArtworkKey, pixmap: Pixmap) {
        if self.entries.insert(key, pixmap).is_some() {
            return;
        }
        self.order.push_back(key);
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.len()
    }
}

pub struct Renderer {
    config: EngineConfig,
    font_system: FontSystem,
    swash_cache: SwashCache,
    pixmap_buffer: Option<Pixmap>,
    image_cache: ArtworkCache,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            font_system: FontSystem::new(),
            swash_cache: SwashCache::new(),
            pixmap_buffer: None,
            image_cache: ArtworkCache::new(ARTWORK_CACHE_CAPACITY),
        }
    }

    /// Composites one side onto the surface and returns the raw pixel data
    /// (Premultiplied RGBA8). A missing design, or artwork that cannot be
    /// resolved, is drawn as a placeholder instead of failing.
    /// The pixel buffer is reused between calls of the same surface size.
    pub fn render_raw(
        &mut self,
        design: Option<&SideDesign>,
        surface: &Surface,
        resolver: &dyn ArtworkResolver,
    ) -> Result<&[u8], RenderError> {
        if surface.width == 0 || surface.height == 0 {
            return Err(RenderError::InvalidDimensions(format!("{}x{}", surface.width, surface.height)));
        }

        if self.pixmap_buffer.as_ref().map_or(true, |p| p.width() != surface.width || p.height() != surface.height) {
            self.pixmap_buffer = Pixmap::new(surface.width, surface.height);
        }

        // store handles are revocable, only data URIs are kept in the cache
        let key = design.filter(|d| d.image.is_detached()).map(|d| ArtworkKey::of(d.image.as_str()));
        let mut transient: Option<Pixmap> = None;
        if let Some(d) = design.filter(|_| key.is_none_or(|k| !self.image_cache.contains(k))) {
            match resolver.resolve(&d.image).map(|artwork| to_pixmap(artwork.pixels())) {
                Ok(Some(art)) => match key {
                    Some(key) => self.image_cache.insert(key, art),
                    None => transient = Some(art),
                },
                Ok(None) => tracing::warn!(image = %d.image, "empty artwork, drawing placeholder"),
                Err(reason) => tracing::warn!(image = %d.image, %reason, "artwork unavailable, drawing placeholder"),
            }
        }

        let pixmap = self.pixmap_buffer.as_mut()
            .ok_or_else(|| RenderError::PixmapCreationError("Invalid canvas dimensions".into()))?;

        match parse_color(&surface.background) {
            Some(color) => pixmap.fill(color),
            None => {
                tracing::warn!(background = %surface.background, "unparseable garment color, using white");
                pixmap.fill(Color::WHITE);
            }
        }

        let transform = design.map(|d| d.transform).unwrap_or_default();
        let art_pixmap = transient
            .as_ref()
            .or_else(|| key.and_then(|k| self.image_cache.get(k)));
        let composed = compose_transform(
            &transform,
            surface.container(),
            art_pixmap.map(|p| (p.width(), p.height())),
            &self.config,
        );
        let layer_transform = to_skia(&composed);

        match art_pixmap {
            Some(art) => {
                let fit = layer_transform.pre_scale(
                    composed.box_width / art.width() as f32,
                    composed.box_height / art.height() as f32,
                );
                let paint = PixmapPaint {
                    quality: FilterQuality::Bilinear,
                    ..PixmapPaint::default()
                };
                pixmap.draw_pixmap(0, 0, art.as_ref(), &paint, fit, None);
            }
            None => draw_placeholder(
                pixmap,
                &mut self.font_system,
                &mut self.swash_cache,
                &composed,
                layer_transform,
            ),
        }

        self.pixmap_buffer.as_ref()
            .map(|p| p.data())
            .ok_or_else(|| RenderError::PixmapCreationError("Invalid canvas dimensions".into()))
    }

    pub fn render(
        &mut self,
        design: Option<&SideDesign>,
        surface: &Surface,
        resolver: &dyn ArtworkResolver,
    ) -> Result<Vec<u8>, RenderError> {
        self.render_raw(design, surface, resolver)?;

        self.pixmap_buffer.as_ref()
            .ok_or_else(|| RenderError::PixmapCreationError("Invalid canvas dimensions".into()))?
            .encode_png()
            .map_err(|e| RenderError::EncodingError(e.to_string()))
    }

    /// Renders one side of a stored payload with no editor context, as the
    /// cart and order views do.
    pub fn render_payload(
        &mut self,
        payload: &CustomizationPayload,
        side: Side,
        surface: &Surface,
    ) -> Result<Vec<u8>, RenderError> {
        let resolver = DetachedResolver::new();
        self.render(payload.side(side), surface, &resolver)
    }
}

fn to_skia(composed: &ComposedTransform) -> Transform {
    let m = &composed.matrix;
    Transform::from_row(m.a, m.b, m.c, m.d, m.e, m.f)
}

fn to_pixmap(image: &RgbaImage) -> Option<Pixmap> {
    let (width, height) = image.dimensions();
    let mut pixels = Vec::with_capacity((width * height * 4) as usize);

    for pixel in image.pixels() {
        let r = pixel[0];
        let g = pixel[1];
        let b = pixel[2];
        let a = pixel[3];

        let a_f = a as f32 / 255.0;
        pixels.push((r as f32 * a_f) as u8);
        pixels.push((g as f32 * a_f) as u8);
        pixels.push((b as f32 * a_f) as u8);
        pixels.push(a);
    }

    Pixmap::from_vec(pixels, IntSize::from_wh(width, height)?)
}

fn draw_placeholder(
    pixmap: &mut Pixmap,
    font_system: &mut FontSystem,
    swash_cache: &mut SwashCache,
    composed: &ComposedTransform,
    layer_transform: Transform,
) {
    let Some(rect) = Rect::from_xywh(0.0, 0.0, composed.box_width, composed.box_height) else {
        return;
    };
    let radius = composed.box_width.min(composed.box_height) * 0.08;
    let Some(path) = create_rounded_rect_path(rect, radius) else {
        return;
    };

    let mut fill = Paint::default();
    fill.set_color(parse_color(PLACEHOLDER_FILL).unwrap_or(Color::BLACK));
    fill.anti_alias = true;
    pixmap.fill_path(&path, &fill, FillRule::Winding, layer_transform, None);

    let glyph_color = parse_color(PLACEHOLDER_STROKE).unwrap_or(Color::BLACK);
    let mut stroke_paint = Paint::default();
    stroke_paint.set_color(glyph_color);
    stroke_paint.anti_alias = true;
    let stroke = Stroke {
        width: (composed.box_width * 0.02).max(1.0),
        ..Stroke::default()
    };
    pixmap.stroke_path(&path, &stroke_paint, &stroke, layer_transform, None);

    let font_size = composed.box_height * 0.5;
    if font_size < 1.0 {
        return;
    }
    let metrics = Metrics::new(font_size, font_size * 1.2);
    let mut buffer = Buffer::new(font_system, metrics);
    let attrs = Attrs::new().family(Family::SansSerif);
    buffer.set_text(font_system, PLACEHOLDER_GLYPH, &attrs, Shaping::Advanced, None);
    buffer.shape_until_scroll(font_system, false);

    for run in buffer.layout_runs() {
        let offset_x = (composed.box_width - run.line_w) / 2.0;
        let offset_y = (composed.box_height - run.line_height) / 2.0;

        for glyph in run.glyphs {
            let physical_glyph = glyph.physical((0., 0.), 1.0);

            let Some(image) = swash_cache.get_image(font_system, physical_glyph.cache_key) else {
                tracing::debug!("no rasterized image for placeholder glyph");
                continue;
            };
            let width = image.placement.width;
            let height = image.placement.height;
            if width == 0 || height == 0 {
                continue;
            }

            // only coverage masks are expected for a plain sans-serif glyph
            if image.data.len() != (width * height) as usize {
                continue;
            }
            let mut pixels = Vec::with_capacity((width * height * 4) as usize);
            let r_f = glyph_color.red();
            let g_f = glyph_color.green();
            let b_f = glyph_color.blue();
            let a_f = glyph_color.alpha();
            for mask_val in image.data.iter() {
                let final_alpha = a_f * (*mask_val as f32 / 255.0);
                pixels.push((r_f * final_alpha * 255.0) as u8);
                pixels.push((g_f * final_alpha * 255.0) as u8);
                pixels.push((b_f * final_alpha * 255.0) as u8);
                pixels.push((final_alpha * 255.0) as u8);
            }

            let glyph_x = offset_x + (physical_glyph.x as f32) + (image.placement.left as f32);
            let glyph_y = offset_y + run.line_y + (physical_glyph.y as f32) - (image.placement.top as f32);

            let Some(size) = IntSize::from_wh(width, height) else {
                continue;
            };
            if let Some(glyph_pixmap) = Pixmap::from_vec(pixels, size) {
                pixmap.draw_pixmap(
                    0, 0,
                    glyph_pixmap.as_ref(),
                    &PixmapPaint::default(),
                    layer_transform.pre_translate(glyph_x, glyph_y),
                    None,
                );
            }
        }
    }
}

fn create_rounded_rect_path(rect: Rect, radius: f32) -> Option<Path> {
    let mut pb = PathBuilder::new();

    let x = rect.x();
    let y = rect.y();
    let w = rect.width();
    let h = rect.height();

    let r = radius.min(w / 2.0).min(h / 2.0);

    pb.move_to(x + r, y);
    pb.line_to(x + w - r, y);
    pb.quad_to(x + w, y, x + w, y + r);
    pb.line_to(x + w, y + h - r);
    pb.quad_to(x + w, y + h, x + w - r, y + h);
    pb.line_to(x + r, y + h);
    pb.quad_to(x, y + h, x, y + h - r);
    pb.line_to(x, y + r);
    pb.quad_to(x, y, x + r, y);
    pb.close();

    pb.finish()
}

fn parse_color(hex: &str) -> Option<Color> {
    if !hex.starts_with('#') || hex.len() != 7 {
        return None;
    }

    let r = u8::from_str_radix(&hex[1..3], 16).ok()?;
    let g = u8::from_str_radix(&hex[3..5], 16).ok()?;
    let b = u8::from_str_radix(&hex[5..7], 16).ok()?;

    Some(Color::from_rgba8(r, g, b, 255))
}

#[cfg(test)]
mod tests {
    use super::*;
    use drape_core::{ArtworkRef, ArtworkStore, DesignTransform};
    use image::Rgba;

    const RED: [u8; 4] = [255, 0, 0, 255];
    const BLUE: [u8; 4] = [0, 0, 255, 255];
    const WHITE: [u8; 4] = [255, 255, 255, 255];

    /// Left half red, right half blue.
    fn split_artwork() -> ArtworkRef {
        let img = RgbaImage::from_fn(20, 20, |x, _| if x < 10 { Rgba(RED) } else { Rgba(BLUE) });
        drape_core::Artwork::new(img, "").to_detached_ref().unwrap()
    }

    fn design(transform: DesignTransform) -> SideDesign {
        SideDesign { image: split_artwork(), transform }
    }

    fn pixel(data: &[u8], width: u32, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * width + x) * 4) as usize;
        [data[i], data[i + 1], data[i + 2], data[i + 3]]
    }

    fn surface() -> Surface {
        Surface::new(200, 200, "#ffffff")
    }

    #[test]
    fn default_transform_centers_artwork() {
        let mut renderer = Renderer::new();
        let d = design(DesignTransform::default());
        let data = renderer.render_raw(Some(&d), &surface(), &DetachedResolver::new()).unwrap();
        assert_eq!(pixel(data, 200, 75, 100), RED);
        assert_eq!(pixel(data, 200, 125, 100), BLUE);
        assert_eq!(pixel(data, 200, 10, 10), WHITE);
        assert_eq!(pixel(data, 200, 190, 190), WHITE);
    }

    #[test]
    fn flip_mirrors_the_artwork() {
        let mut renderer = Renderer::new();
        let d = design(DesignTransform { flipped: true, ..Default::default() });
        let data = renderer.render_raw(Some(&d), &surface(), &DetachedResolver::new()).unwrap();
        assert_eq!(pixel(data, 200, 75, 100), BLUE);
        assert_eq!(pixel(data, 200, 125, 100), RED);
    }

    #[test]
    fn flip_is_applied_after_rotation() {
        let mut renderer = Renderer::new();
        let rotated = design(DesignTransform { rotation: 90.0, ..Default::default() });
        let data = renderer.render_raw(Some(&rotated), &surface(), &DetachedResolver::new()).unwrap();
        assert_eq!(pixel(data, 200, 100, 75), RED);

        let rotated_flipped = design(DesignTransform { rotation: 90.0, flipped: true, ..Default::default() });
        let data = renderer.render_raw(Some(&rotated_flipped), &surface(), &DetachedResolver::new()).unwrap();
        assert_eq!(pixel(data, 200, 100, 75), BLUE);
        assert_eq!(pixel(data, 200, 100, 125), RED);
    }

    #[test]
    fn size_scales_against_baseline() {
        let mut renderer = Renderer::new();
        let d = design(DesignTransform { size: 100.0, ..Default::default() });
        let data = renderer.render_raw(Some(&d), &surface(), &DetachedResolver::new()).unwrap();
        // 2x the natural box covers the whole surface
        assert_eq!(pixel(data, 200, 5, 100), RED);
        assert_eq!(pixel(data, 200, 195, 100), BLUE);
    }

    #[test]
    fn missing_design_draws_placeholder() {
        let mut renderer = Renderer::new();
        let data = renderer.render_raw(None, &surface(), &DetachedResolver::new()).unwrap();
        assert_ne!(pixel(data, 200, 60, 60), WHITE);
        assert_eq!(pixel(data, 200, 10, 10), WHITE);
    }

    #[test]
    fn undecodable_artwork_draws_placeholder() {
        let mut renderer = Renderer::new();
        let broken = SideDesign {
            image: ArtworkRef::new("data:image/png;base64,bm90IGFuIGltYWdl"),
            transform: DesignTransform::default(),
        };
        let data = renderer.render_raw(Some(&broken), &surface(), &DetachedResolver::new()).unwrap();
        assert_ne!(pixel(data, 200, 60, 60), WHITE);
        assert_ne!(pixel(data, 200, 60, 60), RED);
    }

    #[test]
    fn revoked_handle_draws_placeholder() {
        let mut renderer = Renderer::new();
        let gone = SideDesign { image: ArtworkRef::new("artwork:front:7"), transform: DesignTransform::default() };
        assert!(renderer.render(Some(&gone), &surface(), &ArtworkStore::new()).is_ok());
    }

    #[test]
    fn corrupted_payload_values_are_clamped() {
        let json = format!(
            r#"{{"backImage": "{}", "backDesign": {{"vertical": -40, "horizontal": 900, "size": 5000, "rotation": -30, "flipped": false}}}}"#,
            split_artwork().as_str()
        );
        let payload = CustomizationPayload::from_json(&json).unwrap();
        let mut renderer = Renderer::new();
        let png = renderer.render_payload(&payload, Side::Back, &surface()).unwrap();
        assert!(!png.is_empty());
    }

    #[test]
    fn payload_renders_placeholder_for_absent_side() {
        let payload = CustomizationPayload::new(None, Some(design(DesignTransform::default()))).unwrap();
        let mut renderer = Renderer::new();
        let front = renderer.render_payload(&payload, Side::Front, &surface()).unwrap();
        let back = renderer.render_payload(&payload, Side::Back, &surface()).unwrap();
        assert_ne!(front, back);
    }

    #[test]
    fn artwork_cache_is_bounded() {
        let mut renderer = Renderer::new();
        let resolver = DetachedResolver::new();
        let small = Surface::new(40, 40, "#ffffff");
        let designs: Vec<SideDesign> = (0..ARTWORK_CACHE_CAPACITY as u8 + 4)
            .map(|i| {
                let img = RgbaImage::from_pixel(4, 4, Rgba([i, 0, 255 - i, 255]));
                SideDesign {
                    image: drape_core::Artwork::new(img, "").to_detached_ref().unwrap(),
                    transform: DesignTransform::default(),
                }
            })
            .collect();

        for d in &designs {
            renderer.render_raw(Some(d), &small, &resolver).unwrap();
            assert!(renderer.image_cache.len() <= ARTWORK_CACHE_CAPACITY);
        }
        assert_eq!(renderer.image_cache.len(), ARTWORK_CACHE_CAPACITY);

        // an evicted entry is decoded again and still drawn
        let data = renderer.render_raw(Some(&designs[0]), &small, &resolver).unwrap();
        assert_eq!(pixel(data, 40, 20, 20), [0, 0, 255, 255]);
    }

    #[test]
    fn zero_sized_surface_is_rejected() {
        let mut renderer = Renderer::new();
        let err = renderer.render_raw(None, &Surface::new(0, 10, "#ffffff"), &DetachedResolver::new());
        assert!(matches!(err, Err(RenderError::InvalidDimensions(_))));
    }

    #[test]
    fn bad_background_falls_back_to_white() {
        let mut renderer = Renderer::new();
        let data = renderer.render_raw(None, &Surface::new(20, 20, "navy"), &DetachedResolver::new()).unwrap();
        assert_eq!(pixel(data, 20, 0, 0), WHITE);
    }
}
