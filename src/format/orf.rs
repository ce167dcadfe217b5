//! Olympus ORF parsing.
//!
//! Olympus ships two container flavors: a custom TIFF variant whose header
//! reads "MMOR" or "IIRO", and plain TIFF with an OLYMPUS Make tag. The
//! custom variants carry a non-standard magic, so the structural scan only
//! yields candidates for the plain-TIFF flavor; the custom flavors are still
//! detected and simply surface no previews.

use crate::endian::read_u32_be_at;
use crate::format::jpeg;
use crate::format::nef::make_starts_with;
use crate::format::tiff;
use crate::options::in_target_range;
use crate::preview::{push_unique, PreviewInfo};

/// "MMOR" header of big-endian Olympus bodies.
const HEADER_MMOR: u32 = 0x4D4D_4F52;
/// "IIRO" header of little-endian Olympus bodies.
const HEADER_IIRO: u32 = 0x4949_524F;

/// Whether `data` is an Olympus container: the custom MMOR/IIRO header or a
/// standard TIFF whose Make starts with "OLYMPUS".
pub fn can_parse(data: &[u8]) -> bool {
    if data.len() < 8 {
        return false;
    }

    if matches!(read_u32_be_at(data, 0), Some(HEADER_MMOR) | Some(HEADER_IIRO)) {
        return true;
    }

    make_starts_with(data, b"OLYMPUS")
}

/// Enumerate the JPEG previews embedded in an ORF file.
pub fn extract_previews(data: &[u8]) -> Vec<PreviewInfo> {
    let mut previews = Vec::new();
    if !can_parse(data) {
        return previews;
    }

    let orientation = tiff::extract_orientation(data);

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

        let size = u64::from(candidate.size);
        let preview = PreviewInfo {
            offset: u64::from(candidate.offset),
            size,
            width: candidate.width,
            height: candidate.height,
            is_jpeg: candidate.is_jpeg,
            subfile_type: candidate.subfile_type,
            ifd_index: candidate.ifd_index,
            quality: jpeg::classify_preview(candidate.width, candidate.height, size),
            priority: if in_target_range(size) { 10 } else { 6 },
            orientation,
            kind: format!("ORF_IFD{}", candidate.ifd_index),
        };
        push_unique(&mut previews, preview);
    }

    previews
}

/// Pick the best ORF preview: highest priority, then the larger size.
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_parse_custom_headers() {
        let mut mmor = b"MMOR".to_vec();
        mmor.resize(16, 0);
        assert!(can_parse(&mmor));

        let mut iiro = b"IIRO".to_vec();
        iiro.resize(16, 0);
        assert!(can_parse(&iiro));

        assert!(!can_parse(b"MMOR"));
        assert!(!can_parse(&[0u8; 16]));
    }

    #[test]
    fn test_custom_header_yields_no_previews() {
        let mut data = b"MMOR".to_vec();
        data.resize(256, 0);
        assert!(extract_previews(&data).is_empty());
    }
}
