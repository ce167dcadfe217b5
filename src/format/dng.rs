//! Adobe DNG parsing.
//!
//! DNG defines preview storage explicitly: IFD0 carries a low-resolution
//! thumbnail and the SubIFDs hold the higher-quality previews, with
//! NewSubfileType=1 marking reduced-resolution images. Detection accepts
//! either the DNGVersion tag or an Adobe Software string, since converted
//! files sometimes drop one of the two.

use crate::format::jpeg;
use crate::format::nef::ifd0_ascii_starts_with;
use crate::format::tiff::{self, parser::TiffHeader, Ifd};
use crate::format::tiff::tags::{TAG_DNG_VERSION, TAG_SOFTWARE};
use crate::options::in_target_range;
use crate::preview::{push_unique, PreviewInfo, PreviewQuality};

/// Whether `data` is a TIFF carrying the DNGVersion tag or an Adobe
/// Software string in IFD0.
pub fn can_parse(data: &[u8]) -> bool {
    let Ok(header) = TiffHeader::parse(data) else {
        return false;
    };
    if header.first_ifd_offset as usize >= data.len() {
        return false;
    }
    let Ok(ifd0) = Ifd::parse(data, header.first_ifd_offset, header.byte_order) else {
        return false;
    };
    if ifd0.contains(TAG_DNG_VERSION) {
        return true;
    }
    ifd0_ascii_starts_with(data, TAG_SOFTWARE, b"Adobe")
}

/// Enumerate the JPEG previews embedded in a DNG file.
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
            preview.kind = "DNG_Preview".to_string();
            preview.priority = if in_target_range(preview.size) { 10 } else { 8 };
        } else {
            match candidate.ifd_index {
                index if index < 0 => {
                    // SubIFDs are the standard DNG preview location
                    preview.quality = tier;
                    preview.kind = format!("DNG_SubIFD{sub_ifd_counter}");
                    sub_ifd_counter += 1;
                    preview.priority = 9;
                }
                0 => {
                    preview.quality = PreviewQuality::Thumbnail;
                    preview.kind = "DNG_IFD0".to_string();
                    preview.priority = 2;
                }
                index => {
                    preview.quality = tier;
                    preview.kind = format!("DNG_IFD{index}");
                    preview.priority = 5;
                }
            }
        }

        push_unique(&mut previews, preview);
    }

    previews
}

/// Pick the best DNG preview: highest priority, then the larger size.
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
