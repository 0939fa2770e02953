/*
    Drape - garment design placement engine
    Copyright (C) 2025 meetzli

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.
*/

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::error::DesignError;
use crate::Side;

const HANDLE_PREFIX: &str = "artwork:";
const DATA_URI_PREFIX: &str = "data:";

/// Opaque reference to an uploaded image.
///
/// Either a handle into an editor's [`ArtworkStore`] (revocable, only
/// meaningful while that store is alive) or a `data:` URI carrying the
/// encoded image itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtworkRef(String);

impl ArtworkRef {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub(crate) fn handle(side: Side, generation: u64) -> Self {
        Self(format!("{HANDLE_PREFIX}{side}:{generation}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_handle(&self) -> bool {
        self.0.starts_with(HANDLE_PREFIX)
    }

    /// True when the reference can be decoded without any editor state.
    pub fn is_detached(&self) -> bool {
        self.0.starts_with(DATA_URI_PREFIX)
    }

    /// Splits a `data:<mime>;base64,<payload>` URI into its MIME type and
    /// decoded bytes.
    pub fn decode_data_uri(&self) -> Result<(String, Vec<u8>), String> {
        let rest = self
            .0
            .strip_prefix(DATA_URI_PREFIX)
            .ok_or_else(|| "not a data URI".to_string())?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| "data URI has no payload".to_string())?;
        let mime = header
            .strip_suffix(";base64")
            .ok_or_else(|| "data URI is not base64 encoded".to_string())?;
        let bytes = STANDARD.decode(payload.trim()).map_err(|e| e.to_string())?;
        Ok((mime.to_string(), bytes))
    }
}

impl std::fmt::Display for ArtworkRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_detached() {
            // data URIs run to megabytes
            write!(f, "data URI ({} bytes)", self.0.len())
        } else {
            f.write_str(&self.0)
        }
    }
}

/// A decoded image. Clones share the pixel buffer.
#[derive(Debug, Clone)]
pub struct Artwork {
    pixels: Arc<RgbaImage>,
    display_src: Arc<str>,
}

impl Artwork {
    pub fn new(pixels: RgbaImage, display_src: impl Into<Arc<str>>) -> Self {
        Self {
            pixels: Arc::new(pixels),
            display_src: display_src.into(),
        }
    }

    /// Decodes encoded image bytes. `mime` is only used to build the display
    /// source; the format is sniffed from the bytes.
    pub fn decode(bytes: &[u8], mime: &str) -> Result<Self, String> {
        let format = image::guess_format(bytes).map_err(|e| e.to_string())?;
        let decoded = image::load_from_memory_with_format(bytes, format).map_err(|e| e.to_string())?;
        let display_src = format!("{DATA_URI_PREFIX}{mime};base64,{}", STANDARD.encode(bytes));
        Ok(Self::new(decoded.to_rgba8(), display_src))
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Source usable as an HTML `img` src.
    pub fn display_src(&self) -> &str {
        &self.display_src
    }

    /// Shared handle to the display source; clones do not copy the URI.
    pub fn shared_src(&self) -> Arc<str> {
        Arc::clone(&self.display_src)
    }

    /// Re-encodes the pixels as a PNG data URI that no longer depends on the
    /// store the artwork came from.
    pub fn to_detached_ref(&self) -> Result<ArtworkRef, DesignError> {
        let mut png = Vec::new();
        self.pixels
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .map_err(|e| DesignError::Encoding(e.to_string()))?;
        Ok(ArtworkRef(format!(
            "{DATA_URI_PREFIX}image/png;base64,{}",
            STANDARD.encode(&png)
        )))
    }
}

/// Turns an [`ArtworkRef`] into pixels. Every rendering surface takes one.
pub trait ArtworkResolver {
    fn resolve(&self, image: &ArtworkRef) -> Result<Artwork, String>;
}

fn resolve_data_uri(uri: &ArtworkRef) -> Result<Artwork, String> {
    let (_mime, bytes) = uri.decode_data_uri()?;
    let format = image::guess_format(&bytes).map_err(|e| e.to_string())?;
    let decoded = image::load_from_memory_with_format(&bytes, format).map_err(|e| e.to_string())?;
    // the URI itself already is a valid img src
    Ok(Artwork::new(decoded.to_rgba8(), uri.as_str()))
}

/// In-memory artwork owned by one editor session. Handles stop resolving
/// once revoked.
#[derive(Debug, Clone, Default)]
pub struct ArtworkStore {
    entries: HashMap<ArtworkRef, Artwork>,
}

impl ArtworkStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, handle: ArtworkRef, artwork: Artwork) {
        self.entries.insert(handle, artwork);
    }

    pub fn revoke(&mut self, handle: &ArtworkRef) -> bool {
        let removed = self.entries.remove(handle).is_some();
        if removed {
            tracing::debug!(%handle, "revoked artwork handle");
        }
        removed
    }

    pub fn get(&self, handle: &ArtworkRef) -> Option<&Artwork> {
        self.entries.get(handle)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl ArtworkResolver for ArtworkStore {
    fn resolve(&self, image: &ArtworkRef) -> Result<Artwork, String> {
        if let Some(artwork) = self.entries.get(image) {
            return Ok(artwork.clone());
        }
        if image.is_detached() {
            return resolve_data_uri(image);
        }
        Err(format!("artwork '{image}' is not in the store"))
    }
}

/// Resolver for surfaces that only see a stored payload (cart, order
/// views). Decoded data URIs are cached for the resolver's lifetime.
#[derive(Debug, Default)]
pub struct DetachedResolver {
    cache: RefCell<HashMap<ArtworkRef, Result<Artwork, String>>>,
}

impl DetachedResolver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ArtworkResolver for DetachedResolver {
    fn resolve(&self, image: &ArtworkRef) -> Result<Artwork, String> {
        if let Some(cached) = self.cache.borrow().get(image) {
            return cached.clone();
        }
        let resolved = if image.is_detached() {
            resolve_data_uri(image)
        } else {
            Err(format!("artwork '{image}' needs editor state to resolve"))
        };
        self.cache.borrow_mut().insert(image.clone(), resolved.clone());
        resolved
    }
}
