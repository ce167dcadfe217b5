//! Canon CR2 parsing.
//!
//! CR2 is TIFF with a fixed four-IFD layout:
//!
//! - IFD0: full-size JPEG preview (~2 MB on older bodies)
//! - IFD1: 160×120 thumbnail
//! - IFD2: reduced-resolution RAW
//! - IFD3: full-resolution RAW
//!
//! The container marks itself with the ASCII "CR" pair at offset 8, right
//! after the standard TIFF header.

use crate::endian::ByteOrder;
use crate::format::jpeg;
use crate::format::tiff;
use crate::options::in_target_range;
use crate::preview::{push_unique, PreviewInfo, PreviewQuality};

/// "CR" read as a little-endian u16 at offset 8.
const CR2_MAGIC: u16 = 0x5243;

/// Whether `data` looks like a CR2 file: a TIFF header followed by the "CR"
/// pair at offset 8.
pub fn can_parse(data: &[u8]) -> bool {
    if data.len() < 10 {
        return false;
    }
    let byte_order = ByteOrder::detect(data);
    if byte_order.read_u16(&data[2..4]) != tiff::parser::TIFF_MAGIC {
        return false;
    }
    byte_order.read_u16(&data[8..10]) == CR2_MAGIC
}

/// Enumerate the JPEG previews embedded in a CR2 file.
///
/// Every TIFF candidate is bounds-checked and JPEG-validated, then classified
/// by the IFD it came from.
pub fn extract_previews(data: &[u8]) -> Vec<PreviewInfo> {
    let mut previews = Vec::new();
    if !can_parse(data) {
        return previews;
    }

    let orientation = tiff::extract_orientation(data);
    let mut sub_ifd_counter = 0u32;

    for candidate in tiff::find_previews(data) {
        if !candidate.is_present() {
            continue;
        }
        let offset = candidate.offset as usize;
        let size = candidate.size as usize;
        let Some(end) = offset.checked_add(size) else {
            continue;
        };
        let Some(payload) = data.get(offset..end) else {
            continue;
        };
        if !jpeg::is_valid_jpeg(payload) {
            continue;
        }

        let mut preview = PreviewInfo {
            offset: u64::from(candidate.offset),
            size: u64::from(candidate.size),
            width: candidate.width,
            height: candidate.height,
            is_jpeg: candidate.is_jpeg,
            subfile_type: candidate.subfile_type,
            ifd_index: candidate.ifd_index,
            orientation,
            ..Default::default()
        };

        match candidate.ifd_index {
            0 => {
                // IFD0 hosts the full-size preview
                preview.quality = PreviewQuality::Preview;
                preview.kind = "CR2_IFD0".to_string();
                preview.priority = if in_target_range(preview.size) { 10 } else { 5 };
            }
            1 => {
                preview.quality = PreviewQuality::Thumbnail;
                preview.kind = "CR2_IFD1".to_string();
                preview.priority = 1;
            }
            index if index < 0 => {
                preview.quality =
                    jpeg::classify_preview(candidate.width, candidate.height, preview.size);
                preview.kind = format!("CR2_SubIFD{sub_ifd_counter}");
                sub_ifd_counter += 1;
                preview.priority = 3;
            }
            index => {
                preview.quality =
                    jpeg::classify_preview(candidate.width, candidate.height, preview.size);
                preview.kind = format!("CR2_IFD{index}");
                preview.priority = 3;
            }
        }

        push_unique(&mut previews, preview);
    }

    previews
}

/// Pick the best CR2 preview: highest priority, ties broken by preferring a
/// candidate inside the target size range, then the larger one.
pub fn select_best_preview(previews: &[PreviewInfo]) -> PreviewInfo {
    let mut best = PreviewInfo::default();
    let mut highest_priority = -1;

    for preview in previews {
        if preview.priority > highest_priority {
            highest_priority = preview.priority;
            best = preview.clone();
        } else if preview.priority == highest_priority {
            let best_in_range = in_target_range(best.size);
            let candidate_in_range = in_target_range(preview.size);
            if candidate_in_range && (!best_in_range || preview.size > best.size) {
                best = preview.clone();
            }
        }
    }

    best
}
