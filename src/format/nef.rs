//! Nikon NEF parsing.
//!
//! NEF is standard TIFF with the full-size JPEG usually parked in a SubIFD.
//! Beyond the structural scan, Nikon bodies record the preview byte range in
//! the JpgFromRawStart/JpgFromRawLength tag pair (0x0201/0x0202) inside
//! SubIFDs; that pass often finds previews the strip tags miss and takes the
//! highest priorities.

use crate::endian::ByteOrder;
use crate::format::jpeg;
use crate::format::tiff::{self, parser::TiffHeader, Ifd};
use crate::format::tiff::tags::{
    TAG_MAKE, TAG_MODEL, TAG_NIKON_JPEG_FROM_RAW_LENGTH, TAG_NIKON_JPEG_FROM_RAW_START,
};
use crate::options::in_target_range;
use crate::preview::{push_unique, PreviewInfo, PreviewQuality};

/// Whether `data` is a TIFF whose IFD0 Make starts with "NIKON".
pub fn can_parse(data: &[u8]) -> bool {
    make_starts_with(data, b"NIKON")
}

/// Shared vendor probe: TIFF header plus an IFD0 Make tag with `prefix`.
pub(crate) fn make_starts_with(data: &[u8], prefix: &[u8]) -> bool {
    ifd0_ascii_starts_with(data, TAG_MAKE, prefix)
}

/// Probe an ASCII tag of IFD0 for a vendor prefix.
pub(crate) fn ifd0_ascii_starts_with(data: &[u8], tag: u16, prefix: &[u8]) -> bool {
    let Ok(header) = TiffHeader::parse(data) else {
        return false;
    };
    if header.first_ifd_offset as usize >= data.len() {
        return false;
    }
    let Ok(ifd0) = Ifd::parse(data, header.first_ifd_offset, header.byte_order) else {
        return false;
    };
    ifd0.get(tag)
        .and_then(|entry| entry.ascii_value(data, header.byte_order))
        .map_or(false, |value| value.as_bytes().starts_with(prefix))
}

/// Enumerate the JPEG previews embedded in a NEF file.
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

        match candidate.ifd_index {
            index if index < 0 => {
                // SubIFDs host the full-size preview on most bodies
                preview.quality = tier;
                preview.kind = format!("NEF_SubIFD{sub_ifd_counter}");
                sub_ifd_counter += 1;
                preview.priority = if in_target_range(preview.size) {
                    10
                } else if tier == PreviewQuality::Preview {
                    8
                } else {
                    5
                };
            }
            1 => {
                preview.quality = PreviewQuality::Thumbnail;
                preview.kind = "NEF_IFD1".to_string();
                preview.priority = 2;
            }
            0 => {
                preview.quality = tier;
                preview.kind = "NEF_IFD0".to_string();
                preview.priority = 7;
            }
            index => {
                preview.quality = tier;
                preview.kind = format!("NEF_IFD{index}");
                preview.priority = 3;
            }
        }

        push_unique(&mut previews, preview);
    }

    extract_jpg_from_raw(data, &mut previews, orientation);

    previews
}

/// Second pass: the JpgFromRawStart/Length tag pair inside every SubIFD.
///
/// Ranges that validate as JPEG are emitted with the highest NEF priorities;
/// duplicates of already-surfaced candidates are dropped.
fn extract_jpg_from_raw(data: &[u8], previews: &mut Vec<PreviewInfo>, orientation: u16) {
    let Ok(header) = TiffHeader::parse(data) else {
        return;
    };
    let byte_order = header.byte_order;

    for (_, ifd) in tiff::walk_ifd_chain(data) {
        for (i, sub_offset) in tiff::sub_ifd_offsets(&ifd, data, byte_order).iter().enumerate() {
            let Ok(sub_ifd) = Ifd::parse(data, *sub_offset, byte_order) else {
                continue;
            };
            let Some(start_entry) = sub_ifd.get(TAG_NIKON_JPEG_FROM_RAW_START) else {
                continue;
            };
            let Some(length_entry) = sub_ifd.get(TAG_NIKON_JPEG_FROM_RAW_LENGTH) else {
                continue;
            };

            let jpeg_offset = start_entry.u32_value(data, byte_order);
            let jpeg_length = length_entry.u32_value(data, byte_order);
            if jpeg_offset == 0 || jpeg_length == 0 {
                continue;
            }
            let offset = jpeg_offset as usize;
            let Some(end) = offset.checked_add(jpeg_length as usize) else {
                continue;
            };
            let Some(payload) = data.get(offset..end) else {
                continue;
            };
            if !jpeg::is_valid_jpeg(payload) {
                continue;
            }

            let size = u64::from(jpeg_length);
            let preview = PreviewInfo {
                offset: u64::from(jpeg_offset),
                size,
                is_jpeg: true,
                ifd_index: -1 - i as i32,
                quality: jpeg::classify_preview(0, 0, size),
                priority: if in_target_range(size) { 12 } else { 7 },
                orientation,
                kind: "NEF_JpgFromRaw".to_string(),
                ..Default::default()
            };

            push_unique(previews, preview);
        }
    }
}

/// Read the camera model from IFD0 tag 0x0110, trimming NUL and padding.
pub fn camera_model(data: &[u8]) -> Option<String> {
    let header = TiffHeader::parse(data).ok()?;
    if header.first_ifd_offset as usize >= data.len() {
        return None;
    }
    let ifd0 = Ifd::parse(data, header.first_ifd_offset, header.byte_order).ok()?;
    ifd0.get(TAG_MODEL)?
        .ascii_value(data, header.byte_order)
        .filter(|model| !model.is_empty())
}

/// Pick the best NEF preview: highest priority, ties broken by preferring a
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_parse_requires_nikon_make() {
        // TIFF with no IFD at all
        let data = [0x49, 0x49, 0x2A, 0x00, 0x08, 0x00, 0x00, 0x00];
        assert!(!can_parse(&data));
        assert!(!can_parse(b""));
    }

    #[test]
    fn test_select_best_prefers_jpg_from_raw() {
        let sub = PreviewInfo { priority: 10, size: 1024 * 1024, ..Default::default() };
        let nikon = PreviewInfo { priority: 12, size: 2 * 1024 * 1024, ..Default::default() };
        let best = select_best_preview(&[sub, nikon.clone()]);
        assert_eq!(best.size, nikon.size);
    }
}
