//! Preview records shared by every format parser.
//!
//! [`PreviewInfo`] is the canonical candidate record: a byte range inside the
//! source file plus the classification the vendor parser assigned to it. It
//! owns nothing beyond its scalars and the type label, so candidates are
//! copied freely during filtering and selection.

use bytes::Bytes;
use serde::Serialize;

use crate::format::RawFormat;

// =============================================================================
// PreviewQuality
// =============================================================================

/// Quality tier of an embedded preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewQuality {
    /// Tiny image for file lists (typically 160×120).
    Thumbnail,
    /// Mid-size image for UI display.
    Preview,
    /// Camera-resolution JPEG.
    Full,
}

// =============================================================================
// PreviewInfo
// =============================================================================

/// One embedded preview candidate.
///
/// `offset` and `size` locate the JPEG inside the source file; every emitted
/// record satisfies `offset + size <= file_size` and starts with the JPEG SOI
/// marker. `width`/`height` are 0 when the container does not declare them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewInfo {
    /// Byte offset of the JPEG within the file.
    pub offset: u64,
    /// Byte length of the JPEG.
    pub size: u64,
    /// Pixel width (0 if unknown).
    pub width: u32,
    /// Pixel height (0 if unknown).
    pub height: u32,
    /// True when the container declares JPEG compression for this image.
    pub is_jpeg: bool,
    /// TIFF NewSubfileType value (0 when absent or not TIFF).
    pub subfile_type: u32,
    /// IFD provenance: `>= 0` for main-chain IFDs, `-(1 + i)` for the i-th
    /// SubIFD, `-10` for Sony SR2SubIFD, `-20` for SR2Private embedded JPEGs.
    pub ifd_index: i32,
    /// Quality tier assigned by the classifier.
    pub quality: PreviewQuality,
    /// Selection score; higher wins. 0..12 in practice.
    pub priority: i32,
    /// EXIF orientation, 1..8 (1 = normal).
    pub orientation: u16,
    /// Provenance label, e.g. "CR2_IFD0", "NEF_SubIFD0", "CR3_PRVW".
    #[serde(rename = "type")]
    pub kind: String,
}

impl Default for PreviewInfo {
    fn default() -> Self {
        PreviewInfo {
            offset: 0,
            size: 0,
            width: 0,
            height: 0,
            is_jpeg: false,
            subfile_type: 0,
            ifd_index: -1,
            quality: PreviewQuality::Thumbnail,
            priority: 0,
            orientation: 1,
            kind: String::new(),
        }
    }
}

impl PreviewInfo {
    /// Whether this record points at an actual byte range.
    #[inline]
    pub fn is_present(&self) -> bool {
        self.offset != 0 && self.size != 0
    }

    /// End of the byte range (`offset + size`), saturating.
    #[inline]
    pub fn end(&self) -> u64 {
        self.offset.saturating_add(self.size)
    }
}

/// Push `preview` unless a candidate with the same `(offset, size)` is
/// already present.
pub(crate) fn push_unique(previews: &mut Vec<PreviewInfo>, preview: PreviewInfo) {
    let duplicate = previews
        .iter()
        .any(|existing| existing.offset == preview.offset && existing.size == preview.size);
    if !duplicate {
        previews.push(preview);
    }
}

// =============================================================================
// ExtractedPreview
// =============================================================================

/// A successfully extracted preview: the candidate record plus a fresh copy
/// of its JPEG bytes.
#[derive(Debug, Clone)]
pub struct ExtractedPreview {
    /// Detected source format.
    pub format: RawFormat,
    /// The selected candidate.
    pub info: PreviewInfo,
    /// The JPEG payload, copied out of the source buffer.
    pub jpeg: Bytes,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_preview() {
        let preview = PreviewInfo::default();
        assert!(!preview.is_present());
        assert_eq!(preview.orientation, 1);
        assert_eq!(preview.ifd_index, -1);
        assert_eq!(preview.quality, PreviewQuality::Thumbnail);
    }

    #[test]
    fn test_push_unique_dedupes_by_offset_and_size() {
        let mut previews = Vec::new();
        let a = PreviewInfo { offset: 100, size: 50, ..Default::default() };
        let same_range = PreviewInfo { offset: 100, size: 50, priority: 9, ..Default::default() };
        let other = PreviewInfo { offset: 100, size: 60, ..Default::default() };

        push_unique(&mut previews, a);
        push_unique(&mut previews, same_range);
        push_unique(&mut previews, other);

        assert_eq!(previews.len(), 2);
        // First occurrence wins
        assert_eq!(previews[0].priority, 0);
    }

    #[test]
    fn test_end_saturates() {
        let preview = PreviewInfo { offset: u64::MAX, size: 10, ..Default::default() };
        assert_eq!(preview.end(), u64::MAX);
    }
}
