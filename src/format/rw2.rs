//! Panasonic RW2 parsing.
//!
//! RW2 uses a TIFF-shaped header with a private magic (0x0055 instead of
//! 0x002A), so the structural scan only yields candidates for files that
//! are plain TIFF with a Panasonic Make tag; the private-magic flavor is
//! detected but surfaces no previews. Embedded previews are complete JPEGs
//! with EXIF attached.

use crate::format::jpeg;
use crate::format::nef::make_starts_with;
use crate::format::tiff;
use crate::options::in_target_range;
use crate::preview::{push_unique, PreviewInfo, PreviewQuality};

/// The 8-byte RW2 signature: "II", private magic 0x0055, IFD at 0x18.
const RW2_MAGIC: [u8; 8] = [0x49, 0x49, 0x55, 0x00, 0x08, 0x00, 0x00, 0x00];

/// Whether `data` is a Panasonic container: the RW2 signature or a standard
/// TIFF whose Make starts with "Panasonic".
pub fn can_parse(data: &[u8]) -> bool {
    if data.len() < 8 {
        return false;
    }
    if data[..8] == RW2_MAGIC {
        return true;
    }
    make_starts_with(data, b"Panasonic")
}

/// Enumerate the JPEG previews embedded in an RW2 file.
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
        let Some(end) = offset.checked_add(candidate.size as usize) else {
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
        let tier = jpeg::classify_preview(candidate.width, candidate.height, preview.size);

        if candidate.subfile_type == 1 {
            preview.quality = tier;
            preview.kind = "RW2_Preview".to_string();
            preview.priority = if in_target_range(preview.size) { 10 } else { 8 };
        } else {
            match candidate.ifd_index {
                index if index < 0 => {
                    preview.quality = tier;
                    preview.kind = format!("RW2_SubIFD{sub_ifd_counter}");
                    sub_ifd_counter += 1;
                    preview.priority = 9;
                }
                0 => {
                    preview.quality = PreviewQuality::Thumbnail;
                    preview.kind = "RW2_IFD0".to_string();
                    preview.priority = 2;
                }
                index => {
                    preview.quality = tier;
                    preview.kind = format!("RW2_IFD{index}");
                    preview.priority = 5;
                }
            }
        }

        push_unique(&mut previews, preview);
    }

    previews
}

/// Pick the best RW2 preview: highest priority, then the larger size.
pub fn select_best_preview(previews: &[PreviewInfo]) -> PreviewInfo {
    let mut best = PreviewInfo::default();
    let mut highest_priority = -1;

    for preview in previews {
        if preview.priority > highest_priority
            || (preview.priority == highest_priority && preview.size > best.size)
        {
            highest_priority = preview.priority;
            best = preview.clone();
        }
    }

    best
}
