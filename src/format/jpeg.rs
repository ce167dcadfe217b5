//! JPEG stream validation and preview classification.
//!
//! Every candidate a format parser surfaces is a byte range that should hold
//! a complete JPEG. This module locates SOI/EOI markers, walks segment
//! markers, estimates encoder quality from the quantization tables, and maps
//! `(width, height, byte size)` to a preview quality tier.
//!
//! The scanners never assume well-formed input: all reads are bounds-checked
//! and a malformed stream simply fails validation.

use crate::preview::PreviewQuality;

// =============================================================================
// JPEG Markers
// =============================================================================

/// Start Of Image marker.
pub const SOI: [u8; 2] = [0xFF, 0xD8];

/// End Of Image marker.
pub const EOI: [u8; 2] = [0xFF, 0xD9];

/// Marker types the scanner records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    /// Start of Image (FFD8)
    Soi,
    /// End of Image (FFD9)
    Eoi,
    /// Define Quantization Table (FFDB)
    Dqt,
    /// Define Huffman Table (FFC4)
    Dht,
    /// Start of Scan (FFDA)
    Sos,
    /// Application segment 0, JFIF (FFE0)
    App0,
    /// Application segment 1, EXIF (FFE1)
    App1,
    /// Comment (FFFE)
    Com,
}

/// One recorded marker: its kind, its absolute offset, and for variable
/// segments the 16-bit big-endian length that follows the marker bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegMarker {
    pub kind: MarkerKind,
    pub offset: usize,
    pub length: u16,
}

// =============================================================================
// Stream Validation
// =============================================================================

/// Check that `data` is a complete JPEG stream.
///
/// Requires at least 4 bytes, the SOI marker at offset 0, and an EOI pair
/// somewhere in the stream, searched from the tail toward offset 3.
pub fn is_valid_jpeg(data: &[u8]) -> bool {
    if data.len() < 4 {
        return false;
    }
    if data[0..2] != SOI {
        return false;
    }

    // Scan from the end toward the header for the EOI pair.
    (3..=data.len() - 2)
        .rev()
        .any(|i| data[i] == 0xFF && data[i + 1] == 0xD9)
}

/// Find the first SOI marker in `data`, returning its offset.
pub fn find_jpeg_start(data: &[u8]) -> Option<usize> {
    if data.len() < 2 {
        return None;
    }
    (0..data.len() - 1).find(|&i| data[i] == 0xFF && data[i + 1] == 0xD8)
}

/// Find the first EOI marker at or after `start` (but never inside the SOI
/// itself), returning the exclusive end of the stream (EOI included).
pub fn find_jpeg_end(data: &[u8], start: usize) -> Option<usize> {
    if data.len() < 2 {
        return None;
    }
    (start.max(2)..data.len() - 1)
        .find(|&i| data[i] == 0xFF && data[i + 1] == 0xD9)
        .map(|i| i + 2)
}

/// Enumerate the known markers in a JPEG stream.
///
/// Unknown `FF xx` pairs are skipped without recording. After a variable
/// segment the scan advances past the declared segment length so marker-like
/// bytes inside compressed data are not re-matched.
pub fn find_jpeg_markers(data: &[u8]) -> Vec<JpegMarker> {
    let mut markers = Vec::new();
    let mut i = 0usize;

    while i + 1 < data.len() {
        if data[i] != 0xFF || data[i + 1] == 0x00 || data[i + 1] == 0xFF {
            i += 1;
            continue;
        }

        let kind = match data[i + 1] {
            0xD8 => Some((MarkerKind::Soi, false)),
            0xD9 => Some((MarkerKind::Eoi, false)),
            0xDB => Some((MarkerKind::Dqt, true)),
            0xC4 => Some((MarkerKind::Dht, true)),
            0xDA => Some((MarkerKind::Sos, true)),
            0xE0 => Some((MarkerKind::App0, true)),
            0xE1 => Some((MarkerKind::App1, true)),
            0xFE => Some((MarkerKind::Com, true)),
            _ => None,
        };

        let Some((kind, variable)) = kind else {
            i += 1;
            continue;
        };

        let length = if variable {
            if i + 3 < data.len() {
                u16::from_be_bytes([data[i + 2], data[i + 3]])
            } else {
                0
            }
        } else {
            2
        };

        markers.push(JpegMarker { kind, offset: i, length });

        // Skip past the segment payload so scan data is not re-matched.
        if length > 2 {
            i += length as usize;
        } else {
            i += 2;
        }
    }

    markers
}

// =============================================================================
// Quality Estimation
// =============================================================================

/// Estimate the encoder quality (25/50/75/95) from the first quantization
/// table: the lower the average coefficient, the higher the quality.
///
/// Returns 50 when no DQT segment is found.
pub fn estimate_quality(data: &[u8]) -> u8 {
    for marker in find_jpeg_markers(data) {
        if marker.kind != MarkerKind::Dqt {
            continue;
        }
        let table_start = marker.offset + 4;
        if table_start >= data.len() {
            continue;
        }

        // Average the 64 luminance coefficients (fewer if truncated).
        let mut sum: u32 = 0;
        for i in 0..64 {
            match data.get(table_start + i) {
                Some(&coefficient) => sum += u32::from(coefficient),
                None => break,
            }
        }
        let average = (sum / 64) as u8;

        return if average < 50 {
            95
        } else if average < 100 {
            75
        } else if average < 150 {
            50
        } else {
            25
        };
    }

    50
}

// =============================================================================
// Preview Classification
// =============================================================================

/// Maximum byte size for the thumbnail tier.
const THUMBNAIL_MAX_SIZE: u64 = 500 * 1024;
/// Preview tier byte-size window.
const PREVIEW_MIN_SIZE: u64 = 200 * 1024;
const PREVIEW_MAX_SIZE: u64 = 3 * 1024 * 1024;
/// Thumbnail tier resolution ceiling.
const THUMBNAIL_MAX_WIDTH: u32 = 320;
const THUMBNAIL_MAX_HEIGHT: u32 = 240;
/// Preview tier resolution floor.
const PREVIEW_MIN_WIDTH: u32 = 800;
const PREVIEW_MIN_HEIGHT: u32 = 600;
/// Anything beyond this edge length is full-resolution.
const FULL_MIN_EDGE: u32 = 2048;

/// Map `(width, height, byte size)` to a quality tier.
///
/// Tiers are evaluated in order (thumbnail, preview, full) and the first
/// match wins; anything left over defaults to the preview tier. Unknown
/// dimensions (0×0) satisfy the thumbnail resolution clause, so candidates
/// without declared dimensions always classify as thumbnails.
pub fn classify_preview(width: u32, height: u32, size: u64) -> PreviewQuality {
    if size <= THUMBNAIL_MAX_SIZE || (width <= THUMBNAIL_MAX_WIDTH && height <= THUMBNAIL_MAX_HEIGHT)
    {
        return PreviewQuality::Thumbnail;
    }

    if (PREVIEW_MIN_SIZE..=PREVIEW_MAX_SIZE).contains(&size)
        && width >= PREVIEW_MIN_WIDTH
        && height >= PREVIEW_MIN_HEIGHT
    {
        return PreviewQuality::Preview;
    }

    if size > PREVIEW_MAX_SIZE || width > FULL_MIN_EDGE || height > FULL_MIN_EDGE {
        return PreviewQuality::Full;
    }

    PreviewQuality::Preview
}

// =============================================================================
// Tests
// =============================================================================
