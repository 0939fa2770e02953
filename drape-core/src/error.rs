/*
    Drape - garment design placement engine
    Copyright (C) 2025 meetzli

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.
*/

use thiserror::Error;

use crate::Side;

/// Every failure the engine reports. None of them are fatal to the host
/// application.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DesignError {
    #[error("{side} upload rejected: '{mime}' is not an image type")]
    InvalidFileType { side: Side, mime: String },

    #[error("{side} upload rejected: {size} bytes exceeds the {limit} byte limit")]
    FileTooLarge { side: Side, size: u64, limit: u64 },

    #[error("Could not decode {side} artwork: {reason}")]
    DecodeFailure { side: Side, reason: String },

    #[error("Select a garment size and upload at least one design before adding to cart")]
    MissingSizeOrImage,

    #[error("Invalid customization payload: {0}")]
    InvalidPayload(String),

    #[error("Invalid engine configuration: {0}")]
    InvalidConfig(String),

    #[error("Artwork encoding error: {0}")]
    Encoding(String),
}
