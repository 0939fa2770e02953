/*
    Drape - garment design placement engine
    Copyright (C) 2025 meetzli

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.
*/

use crate::artwork::Artwork;
use crate::error::DesignError;
use crate::{EngineConfig, Side};

/// What the file picker reports before any bytes are read.
#[derive(Debug, Clone, PartialEq)]
pub struct FileDescriptor {
    pub name: String,
    pub mime: String,
    pub size: u64,
}

impl FileDescriptor {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            size,
        }
    }
}

/// Checks the MIME type first, then the size. Nothing is mutated.
pub fn validate(side: Side, file: &FileDescriptor, config: &EngineConfig) -> Result<(), DesignError> {
    let mime = file.mime.trim().to_ascii_lowercase();
    if !mime.starts_with("image/") || mime.len() == "image/".len() {
        return Err(DesignError::InvalidFileType { side, mime: file.mime.clone() });
    }
    if file.size > config.max_upload_bytes {
        return Err(DesignError::FileTooLarge {
            side,
            size: file.size,
            limit: config.max_upload_bytes,
        });
    }
    Ok(())
}

/// An accepted upload waiting for its bytes to be decoded. The generation
/// ties the eventual result to the side state it was started against.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingUpload {
    pub side: Side,
    pub generation: u64,
    pub mime: String,
    pub limit: u64,
}

impl PendingUpload {
    /// Decodes the file contents. Front and back uploads decode
    /// independently; failures are carried in the result, not raised.
    pub fn decode(&self, bytes: &[u8]) -> DecodedUpload {
        let result = if bytes.len() as u64 > self.limit {
            Err(DesignError::FileTooLarge {
                side: self.side,
                size: bytes.len() as u64,
                limit: self.limit,
            })
        } else {
            Artwork::decode(bytes, &self.mime).map_err(|reason| DesignError::DecodeFailure {
                side: self.side,
                reason,
            })
        };
        DecodedUpload {
            side: self.side,
            generation: self.generation,
            result,
        }
    }

    /// Settles the ticket when the file contents could not be read at all.
    pub fn fail(&self, reason: impl Into<String>) -> DecodedUpload {
        DecodedUpload {
            side: self.side,
            generation: self.generation,
            result: Err(DesignError::DecodeFailure { side: self.side, reason: reason.into() }),
        }
    }
}

/// Outcome of [`PendingUpload::decode`], handed back to the session.
#[derive(Debug, Clone)]
pub struct DecodedUpload {
    pub side: Side,
    pub generation: u64,
    pub result: Result<Artwork, DesignError>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artwork::tests::png_bytes;

    fn pending(side: Side) -> PendingUpload {
        PendingUpload { side, generation: 1, mime: "image/png".into(), limit: 5 * 1024 * 1024 }
    }

    #[test]
    fn non_image_mime_is_rejected() {
        let config = EngineConfig::default();
        for mime in ["application/pdf", "text/plain", "", "image/", "imagex/png"] {
            let err = validate(Side::Front, &FileDescriptor::new("a", mime, 10), &config).unwrap_err();
            assert!(matches!(err, DesignError::InvalidFileType { side: Side::Front, .. }), "{mime}");
        }
    }

    #[test]
    fn mime_check_runs_before_size_check() {
        let config = EngineConfig::default();
        let huge_pdf = FileDescriptor::new("a.pdf", "application/pdf", 50 * 1024 * 1024);
        assert!(matches!(
            validate(Side::Back, &huge_pdf, &config),
            Err(DesignError::InvalidFileType { .. })
        ));
    }

    #[test]
    fn size_limit_is_inclusive() {
        let config = EngineConfig::default();
        let limit = config.max_upload_bytes;
        assert!(validate(Side::Front, &FileDescriptor::new("a.png", "image/png", limit), &config).is_ok());
        let err = validate(Side::Front, &FileDescriptor::new("a.png", "image/png", limit + 1), &config).unwrap_err();
        assert_eq!(err, DesignError::FileTooLarge { side: Side::Front, size: limit + 1, limit });
    }

    #[test]
    fn mime_match_ignores_case_and_whitespace() {
        let config = EngineConfig::default();
        assert!(validate(Side::Front, &FileDescriptor::new("a.jpg", " Image/JPEG ", 10), &config).is_ok());
    }

    #[test]
    fn decode_success_and_failure_carry_the_ticket() {
        let ok = pending(Side::Back).decode(&png_bytes(8, 8));
        assert_eq!((ok.side, ok.generation), (Side::Back, 1));
        assert_eq!(ok.result.unwrap().dimensions(), (8, 8));

        let bad = pending(Side::Front).decode(b"\x89PNG but truncated");
        assert!(matches!(bad.result, Err(DesignError::DecodeFailure { side: Side::Front, .. })));

        let unreadable = pending(Side::Back).fail("read aborted");
        assert_eq!(unreadable.generation, 1);
        assert_eq!(
            unreadable.result.unwrap_err(),
            DesignError::DecodeFailure { side: Side::Back, reason: "read aborted".into() }
        );
    }

    #[test]
    fn decode_rechecks_actual_length() {
        let mut ticket = pending(Side::Front);
        ticket.limit = 4;
        let decoded = ticket.decode(&png_bytes(2, 2));
        assert!(matches!(decoded.result, Err(DesignError::FileTooLarge { .. })));
    }
}
