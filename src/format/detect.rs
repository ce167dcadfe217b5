//! RAW format detection.
//!
//! Two tiers:
//!
//! - [`detect_format_fast`] inspects signatures only: TIFF magic plus a
//!   vendor string in the first 100 bytes, the CR3 `ftyp` brand, or the RAF
//!   magic. TIFF files without a vendor string fall back to DNG, the generic
//!   TIFF-based format.
//! - [`detect_format`] asks every vendor parser's `can_parse` in a fixed
//!   order and is authoritative when the fast path comes up empty.

use serde::Serialize;

use crate::endian::read_u32_be_at;
use crate::format::tiff::is_tiff_header;
use crate::format::{arw, cr2, cr3, dng, nef, orf, raf, rw2};

// =============================================================================
// RawFormat
// =============================================================================

/// Recognized camera RAW formats.
///
/// `Pef` is a recognized tag with no parser behind it; files are never
/// detected as PEF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RawFormat {
    /// Canon CR2 (TIFF-based)
    Cr2,
    /// Canon CR3 (ISO-BMFF)
    Cr3,
    /// Nikon NEF (TIFF-based)
    Nef,
    /// Sony ARW (TIFF-based)
    Arw,
    /// Adobe DNG (TIFF-based)
    Dng,
    /// Fujifilm RAF
    Raf,
    /// Olympus ORF
    Orf,
    /// Pentax PEF (recognized, not parsed)
    Pef,
    /// Panasonic RW2
    Rw2,
    /// Not a recognized RAW file
    Unknown,
}

impl RawFormat {
    /// Short display name, e.g. "CR2".
    pub const fn name(&self) -> &'static str {
        match self {
            RawFormat::Cr2 => "CR2",
            RawFormat::Cr3 => "CR3",
            RawFormat::Nef => "NEF",
            RawFormat::Arw => "ARW",
            RawFormat::Dng => "DNG",
            RawFormat::Raf => "RAF",
            RawFormat::Orf => "ORF",
            RawFormat::Pef => "PEF",
            RawFormat::Rw2 => "RW2",
            RawFormat::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for RawFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Signature Detection
// =============================================================================

/// How many leading bytes the fast path scans for a vendor string.
const VENDOR_SCAN_LIMIT: usize = 100;

/// "cr3 " major brand.
const BRAND_CR3: u32 = 0x6372_3320;
/// "crx " major brand (newer bodies).
const BRAND_CRX: u32 = 0x6372_7820;
/// "ftyp" box type.
const FTYP: u32 = 0x6674_7970;

/// Fujifilm RAF magic (first 15 bytes).
const RAF_MAGIC: &[u8] = b"FUJIFILMCCD-RAW";

/// Signature-only format detection.
///
/// Cheap checks ordered by likelihood; returns `Unknown` when nothing
/// matches, in which case [`detect_format`] should be consulted.
pub fn detect_format_fast(data: &[u8]) -> RawFormat {
    if data.len() < 16 {
        return RawFormat::Unknown;
    }

    if is_tiff_header(data) {
        // Vendor string in the leading bytes settles the TIFF family.
        let scan_end = VENDOR_SCAN_LIMIT.min(data.len().saturating_sub(5));
        for i in 0..scan_end {
            match &data[i..] {
                bytes if bytes.starts_with(b"Canon") => return RawFormat::Cr2,
                bytes if bytes.starts_with(b"NIKON") => return RawFormat::Nef,
                bytes if bytes.starts_with(b"SONY") => return RawFormat::Arw,
                _ => {}
            }
        }
        // Generic TIFF-based RAW
        return RawFormat::Dng;
    }

    if data.len() >= 20
        && read_u32_be_at(data, 4) == Some(FTYP)
        && matches!(read_u32_be_at(data, 8), Some(BRAND_CR3) | Some(BRAND_CRX))
    {
        return RawFormat::Cr3;
    }

    if data.len() >= 16 && data.starts_with(RAF_MAGIC) {
        return RawFormat::Raf;
    }

    RawFormat::Unknown
}

/// Full format detection: every parser's `can_parse`, first match wins.
pub fn detect_format(data: &[u8]) -> RawFormat {
    if cr2::can_parse(data) {
        RawFormat::Cr2
    } else if cr3::can_parse(data) {
        RawFormat::Cr3
    } else if nef::can_parse(data) {
        RawFormat::Nef
    } else if arw::can_parse(data) {
        RawFormat::Arw
    } else if dng::can_parse(data) {
        RawFormat::Dng
    } else if raf::can_parse(data) {
        RawFormat::Raf
    } else if orf::can_parse(data) {
        RawFormat::Orf
    } else if rw2::can_parse(data) {
        RawFormat::Rw2
    } else {
        RawFormat::Unknown
    }
}

// =============================================================================
// Tests
// =============================================================================
