//! Sony ARW parsing.
//!
//! ARW is TIFF-based, but where the preview lives depends on the body
//! generation: IFD0 with NewSubfileType=1, SubIFDs, or Sony's proprietary
//! SR2 structures. Two vendor passes run after the structural scan:
//!
//! - **SR2Private (0x7200)**: an opaque block scanned byte-by-byte for
//!   embedded JPEG streams; the tag's value locates the block and its count
//!   carries the block length
//! - **SR2SubIFD (0x7201)**: ordinary SubIFDs reached through a Sony tag,
//!   read via their strip tags
//!
//! Orientation is searched across the IFD chain: IFD0 wins outright, IFD1
//! only with a non-default value, then any SubIFD with a non-default value.

use crate::format::jpeg;
use crate::format::nef::make_starts_with;
use crate::format::tiff::{self, parser::TiffHeader, Ifd};
use crate::format::tiff::tags::{
    TAG_ORIENTATION, TAG_SONY_SR2_PRIVATE, TAG_SONY_SR2_SUB_IFD, TAG_STRIP_BYTE_COUNTS,
    TAG_STRIP_OFFSETS,
};
use crate::options::in_target_range;
use crate::preview::{push_unique, PreviewInfo, PreviewQuality};

/// The ARW orientation walk keeps the historical cap of 10 chained IFDs.
const ORIENTATION_IFD_CAP: usize = 10;

/// Whether `data` is a TIFF whose IFD0 Make starts with "SONY" or carries
/// the SR2Private tag.
pub fn can_parse(data: &[u8]) -> bool {
    if make_starts_with(data, b"SONY") {
        return true;
    }

    // Some processed ARWs lose the Make tag but keep the SR2 block
    let Ok(header) = TiffHeader::parse(data) else {
        return false;
    };
    if header.first_ifd_offset as usize >= data.len() {
        return false;
    }
    match Ifd::parse(data, header.first_ifd_offset, header.byte_order) {
        Ok(ifd0) => ifd0.contains(TAG_SONY_SR2_PRIVATE),
        Err(_) => false,
    }
}

/// Enumerate the JPEG previews embedded in an ARW file.
pub fn extract_previews(data: &[u8]) -> Vec<PreviewInfo> {
    let mut previews = Vec::new();
    if !can_parse(data) {
        return previews;
    }

    let orientation = extract_arw_orientation(data);
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
            // Reduced-resolution image, the designated preview
            preview.quality = tier;
            preview.kind = "ARW_Preview".to_string();
            preview.priority = if in_target_range(preview.size) {
                10
            } else if tier == PreviewQuality::Preview {
                8
            } else {
                5
            };
        } else {
            match candidate.ifd_index {
                1 => {
                    preview.quality = PreviewQuality::Thumbnail;
                    preview.kind = "ARW_IFD1".to_string();
                    preview.priority = 2;
                }
                index if index < 0 => {
                    preview.quality = tier;
                    preview.kind = format!("ARW_SubIFD{sub_ifd_counter}");
                    sub_ifd_counter += 1;
                    // Modern bodies park full-size previews in SubIFDs
                    preview.priority = if preview.size >= 1024 * 1024 { 9 } else { 6 };
                }
                0 => {
                    preview.quality = tier;
                    preview.kind = "ARW_IFD0".to_string();
                    preview.priority = 7;
                }
                index => {
                    preview.quality = tier;
                    preview.kind = format!("ARW_IFD{index}");
                    preview.priority = 4;
                }
            }
        }

        push_unique(&mut previews, preview);
    }

    extract_sr2_previews(data, &mut previews, orientation);

    previews
}

/// Second pass: the SR2Private block and SR2SubIFD offsets of every IFD in
/// the main chain.
fn extract_sr2_previews(data: &[u8], previews: &mut Vec<PreviewInfo>, orientation: u16) {
    let Ok(header) = TiffHeader::parse(data) else {
        return;
    };
    let byte_order = header.byte_order;

    for (_, ifd) in tiff::walk_ifd_chain(data) {
        if let Some(sr2_entry) = ifd.get(TAG_SONY_SR2_PRIVATE) {
            let sr2_offset = sr2_entry.u32_value(data, byte_order);
            let sr2_length = sr2_entry.count;
            let in_bounds = (sr2_offset as usize)
                .checked_add(sr2_length as usize)
                .map_or(false, |end| end <= data.len());
            if sr2_offset > 0 && sr2_length > 0 && in_bounds {
                scan_sr2_private(data, sr2_offset, sr2_length, previews, orientation);
            }
        }

        if let Some(sub_entry) = ifd.get(TAG_SONY_SR2_SUB_IFD) {
            for sub_offset in sub_entry.u32_values(data, byte_order) {
                if sub_offset == 0 || sub_offset as usize >= data.len() {
                    continue;
                }
                let Ok(sub_ifd) = Ifd::parse(data, sub_offset, byte_order) else {
                    continue;
                };
                emit_sr2_sub_ifd(data, &sub_ifd, byte_order, previews, orientation);
            }
        }
    }
}

/// Scan the SR2Private block for embedded JPEG streams.
///
/// The block layout is proprietary, so every SOI pair inside it is tried;
/// the EOI search runs to end of file because streams regularly spill past
/// the declared block.
fn scan_sr2_private(
    data: &[u8],
    block_offset: u32,
    block_length: u32,
    previews: &mut Vec<PreviewInfo>,
    orientation: u16,
) {
    let base = block_offset as usize;
    let length = block_length as usize;

    for i in 0..length.saturating_sub(1) {
        if data[base + i] != 0xFF || data[base + i + 1] != 0xD8 {
            continue;
        }
        let start = base + i;
        let Some(end) = jpeg::find_jpeg_end(data, start) else {
            continue;
        };
        if end <= start {
            continue;
        }
        let payload = &data[start..end];
        if !jpeg::is_valid_jpeg(payload) {
            continue;
        }

        let size = (end - start) as u64;
        let preview = PreviewInfo {
            offset: start as u64,
            size,
            is_jpeg: true,
            ifd_index: -20,
            quality: jpeg::classify_preview(0, 0, size),
            priority: if in_target_range(size) { 12 } else { 8 },
            orientation,
            kind: "ARW_SR2Private".to_string(),
            ..Default::default()
        };
        push_unique(previews, preview);
    }
}

/// Emit the strip-tag candidate of one SR2 SubIFD.
fn emit_sr2_sub_ifd(
    data: &[u8],
    sub_ifd: &Ifd,
    byte_order: crate::endian::ByteOrder,
    previews: &mut Vec<PreviewInfo>,
    orientation: u16,
) {
    let (Some(offsets_entry), Some(counts_entry)) =
        (sub_ifd.get(TAG_STRIP_OFFSETS), sub_ifd.get(TAG_STRIP_BYTE_COUNTS))
    else {
        return;
    };
    let offsets = offsets_entry.u32_values(data, byte_order);
    let counts = counts_entry.u32_values(data, byte_order);
    let (Some(&jpeg_offset), Some(&jpeg_size)) = (offsets.first(), counts.first()) else {
        return;
    };

    let offset = jpeg_offset as usize;
    let Some(end) = offset.checked_add(jpeg_size as usize) else {
        return;
    };
    let Some(payload) = data.get(offset..end) else {
        return;
    };
    if !jpeg::is_valid_jpeg(payload) {
        return;
    }

    let size = u64::from(jpeg_size);
    let preview = PreviewInfo {
        offset: u64::from(jpeg_offset),
        size,
        is_jpeg: true,
        ifd_index: -10,
        quality: jpeg::classify_preview(0, 0, size),
        priority: if in_target_range(size) { 11 } else { 7 },
        orientation,
        kind: "ARW_SR2SubIFD".to_string(),
        ..Default::default()
    };
    push_unique(previews, preview);
}

/// Multi-IFD orientation search.
///
/// IFD0's value wins outright; IFD1 only with a non-default value; then the
/// SubIFDs of each visited IFD with a non-default value. The walk is capped
/// at 10 chained IFDs.
pub fn extract_arw_orientation(data: &[u8]) -> u16 {
    let Ok(header) = TiffHeader::parse(data) else {
        return 1;
    };
    let byte_order = header.byte_order;

    for (ifd_index, (_, ifd)) in tiff::walk_ifd_chain(data)
        .iter()
        .take(ORIENTATION_IFD_CAP)
        .enumerate()
    {
        if let Some(value @ 1..=8) = ifd.u32_value(TAG_ORIENTATION, data, byte_order) {
            if ifd_index == 0 {
                return value as u16;
            }
            if ifd_index == 1 && value != 1 {
                return value as u16;
            }
        }

        for sub_offset in tiff::sub_ifd_offsets(ifd, data, byte_order) {
            if sub_offset == 0 || sub_offset as usize >= data.len() {
                continue;
            }
            let Ok(sub_ifd) = Ifd::parse(data, sub_offset, byte_order) else {
                continue;
            };
            if let Some(value @ 2..=8) = sub_ifd.u32_value(TAG_ORIENTATION, data, byte_order) {
                return value as u16;
            }
        }
    }

    1
}

/// Pick the best ARW preview: highest priority; ties prefer the candidate in
/// the target range then the larger one, and when both sit outside the range
/// the one closest to 1 MiB.
pub fn select_best_preview(previews: &[PreviewInfo]) -> PreviewInfo {
    const SWEET_SPOT: u64 = 1024 * 1024;

    let mut best = PreviewInfo::default();
    let mut highest_priority = -1;

    for preview in previews {
        if preview.priority > highest_priority {
            highest_priority = preview.priority;
            best = preview.clone();
            continue;
        }
        if preview.priority != highest_priority {
            continue;
        }

        let best_in_range = in_target_range(best.size);
        let candidate_in_range = in_target_range(preview.size);
        if candidate_in_range && (!best_in_range || preview.size > best.size) {
            best = preview.clone();
        } else if !best_in_range && !candidate_in_range {
            let best_distance = best.size.abs_diff(SWEET_SPOT);
            let candidate_distance = preview.size.abs_diff(SWEET_SPOT);
            if candidate_distance < best_distance {
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
    fn test_can_parse_rejects_non_tiff() {
        assert!(!can_parse(b"FUJIFILMCCD-RAW\0"));
        assert!(!can_parse(&[0u8; 8]));
    }

    #[test]
    fn test_select_best_tie_break_closest_to_1mib() {
        let small = PreviewInfo { priority: 8, size: 10_000, ..Default::default() };
        let huge = PreviewInfo { priority: 8, size: 50 * 1024 * 1024, ..Default::default() };
        // Both outside the target range; 10 KB is closer to 1 MiB than 50 MiB
        let best = select_best_preview(&[huge, small.clone()]);
        assert_eq!(best.size, small.size);
    }

    #[test]
    fn test_select_best_range_beats_distance() {
        let outside = PreviewInfo { priority: 8, size: 10_000, ..Default::default() };
        let inside = PreviewInfo { priority: 8, size: 2 * 1024 * 1024, ..Default::default() };
        let best = select_best_preview(&[outside, inside.clone()]);
        assert_eq!(best.size, inside.size);
    }
}
