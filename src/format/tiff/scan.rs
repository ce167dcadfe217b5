//! Preview candidate scan over the IFD chain.
//!
//! Walks the linked list of IFDs from IFD0, surfacing one raw candidate per
//! IFD (and per SubIFD) wherever strip or JFIF pointer tags describe an
//! embedded image. The records here are structural only; vendor parsers
//! attach quality, priority, and type labels afterwards.
//!
//! Traversal always terminates: the walk stops at a zero next-IFD offset, at
//! any offset outside the buffer, on a revisited offset, or at the chain cap.

use tracing::debug;

use crate::endian::ByteOrder;
use crate::format::tiff::parser::{Ifd, TiffHeader};
use crate::format::tiff::tags::{
    is_jpeg_compression, TAG_COMPRESSION, TAG_IMAGE_HEIGHT, TAG_IMAGE_WIDTH,
    TAG_JPEG_INTERCHANGE_FORMAT, TAG_JPEG_INTERCHANGE_FORMAT_LENGTH, TAG_NEW_SUBFILE_TYPE,
    TAG_ORIENTATION, TAG_STRIP_BYTE_COUNTS, TAG_STRIP_OFFSETS, TAG_SUB_IFDS,
};

// =============================================================================
// Constants
// =============================================================================

/// Hard cap on the number of chained IFDs any walk will visit.
pub const MAX_IFD_CHAIN: usize = 16;

// =============================================================================
// TiffPreview
// =============================================================================

/// A raw preview candidate surfaced by the structural scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TiffPreview {
    /// Byte offset of the candidate image data.
    pub offset: u32,
    /// Byte length of the candidate image data.
    pub size: u32,
    /// Declared pixel width (0 when absent).
    pub width: u32,
    /// Declared pixel height (0 when absent).
    pub height: u32,
    /// True when Compression declares JPEG (6 or 7).
    pub is_jpeg: bool,
    /// NewSubfileType value (0 when absent).
    pub subfile_type: u32,
    /// `>= 0` for main-chain IFDs, `-(1 + i)` for the i-th SubIFD.
    pub ifd_index: i32,
}

impl TiffPreview {
    /// Whether the scan found an actual byte range.
    #[inline]
    pub fn is_present(&self) -> bool {
        self.offset != 0 && self.size != 0
    }
}

// =============================================================================
// IFD Chain Walk
// =============================================================================

/// Walk the main IFD chain from IFD0, returning each parsed IFD with its
/// offset. The walk is cycle-guarded and capped at [`MAX_IFD_CHAIN`].
///
/// Returns an empty vector when the buffer has no valid TIFF header.
pub fn walk_ifd_chain(data: &[u8]) -> Vec<(u32, Ifd)> {
    let Ok(header) = TiffHeader::parse(data) else {
        return Vec::new();
    };
    let byte_order = header.byte_order;

    let mut chain = Vec::new();
    let mut visited: Vec<u32> = Vec::new();
    let mut offset = header.first_ifd_offset;

    while offset != 0 && (offset as usize) < data.len() && chain.len() < MAX_IFD_CHAIN {
        if visited.contains(&offset) {
            debug!(offset, "IFD cycle detected, stopping walk");
            break;
        }
        visited.push(offset);

        let Ok(ifd) = Ifd::parse(data, offset, byte_order) else {
            break;
        };
        let next = ifd.next_ifd_offset;
        chain.push((offset, ifd));
        offset = next;
    }

    chain
}

/// SubIFD offsets declared by `ifd` (tag 0x014A), if any.
pub fn sub_ifd_offsets(ifd: &Ifd, data: &[u8], byte_order: ByteOrder) -> Vec<u32> {
    ifd.get(TAG_SUB_IFDS)
        .map(|entry| entry.u32_values(data, byte_order))
        .unwrap_or_default()
}

// =============================================================================
// Candidate Extraction
// =============================================================================

/// Surface the candidate described by one IFD, if any.
///
/// The byte range comes from `(StripOffsets[0], StripByteCounts[0])` when
/// both arrays are present and of equal length, and is overridden by
/// `(JPEGInterchangeFormat, JPEGInterchangeFormatLength)` when that pair is
/// present; the JFIF pointer pair is authoritative where both coexist.
pub fn preview_from_ifd(
    data: &[u8],
    ifd: &Ifd,
    ifd_index: i32,
    byte_order: ByteOrder,
) -> TiffPreview {
    let mut preview = TiffPreview { ifd_index, ..Default::default() };

    if let (Some(offsets_entry), Some(counts_entry)) =
        (ifd.get(TAG_STRIP_OFFSETS), ifd.get(TAG_STRIP_BYTE_COUNTS))
    {
        let offsets = offsets_entry.u32_values(data, byte_order);
        let counts = counts_entry.u32_values(data, byte_order);
        if !offsets.is_empty() && !counts.is_empty() && offsets.len() == counts.len() {
            preview.offset = offsets[0];
            preview.size = counts[0];
        }
    }

    if let (Some(jpeg_offset), Some(jpeg_length)) = (
        ifd.get(TAG_JPEG_INTERCHANGE_FORMAT),
        ifd.get(TAG_JPEG_INTERCHANGE_FORMAT_LENGTH),
    ) {
        preview.offset = jpeg_offset.u32_value(data, byte_order);
        preview.size = jpeg_length.u32_value(data, byte_order);
    }

    if let Some(width) = ifd.u32_value(TAG_IMAGE_WIDTH, data, byte_order) {
        preview.width = width;
    }
    if let Some(height) = ifd.u32_value(TAG_IMAGE_HEIGHT, data, byte_order) {
        preview.height = height;
    }
    if let Some(compression) = ifd.u32_value(TAG_COMPRESSION, data, byte_order) {
        preview.is_jpeg = is_jpeg_compression(compression);
    }
    if let Some(subfile_type) = ifd.u32_value(TAG_NEW_SUBFILE_TYPE, data, byte_order) {
        preview.subfile_type = subfile_type;
    }

    preview
}

/// Scan the whole file for raw preview candidates.
///
/// Walks the main IFD chain; each IFD yields at most one candidate, and each
/// of its SubIFDs yields at most one more with `ifd_index = -(1 + i)`.
pub fn find_previews(data: &[u8]) -> Vec<TiffPreview> {
    let Ok(header) = TiffHeader::parse(data) else {
        return Vec::new();
    };
    let byte_order = header.byte_order;

    let mut previews = Vec::new();
    for (ifd_index, (_, ifd)) in walk_ifd_chain(data).iter().enumerate() {
        let preview = preview_from_ifd(data, ifd, ifd_index as i32, byte_order);
        if preview.is_present() {
            previews.push(preview);
        }

        for (i, sub_offset) in sub_ifd_offsets(ifd, data, byte_order).iter().enumerate() {
            let Ok(sub_ifd) = Ifd::parse(data, *sub_offset, byte_order) else {
                continue;
            };
            let sub_index = -1 - i as i32;
            let sub_preview = preview_from_ifd(data, &sub_ifd, sub_index, byte_order);
            if sub_preview.is_present() {
                previews.push(sub_preview);
            }
        }
    }

    previews
}

// =============================================================================
// Orientation
// =============================================================================

/// Read the EXIF orientation from IFD0.
///
/// Values outside 1..8 are ignored in favor of the default 1.
pub fn extract_orientation(data: &[u8]) -> u16 {
    let Ok(header) = TiffHeader::parse(data) else {
        return 1;
    };
    let byte_order = header.byte_order;

    let Ok(ifd0) = Ifd::parse(data, header.first_ifd_offset, byte_order) else {
        return 1;
    };

    match ifd0.u32_value(TAG_ORIENTATION, data, byte_order) {
        Some(orientation @ 1..=8) => orientation as u16,
        _ => 1,
    }
}

// =============================================================================
// Tests
// =============================================================================
