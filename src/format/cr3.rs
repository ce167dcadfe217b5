//! Canon CR3 parsing.
//!
//! CR3 moved Canon RAW onto the ISO-BMFF container. Three embedded JPEGs
//! matter here:
//!
//! - **THMB**: a 160×120 thumbnail, located by scanning for the ASCII
//!   `THMB` marker anywhere in the file
//! - **PRVW**: the medium preview, inside a `uuid` box carrying Canon's
//!   preview UUID; the payload wraps a PRVW sub-box whose JPEG follows a
//!   16-byte internal header
//! - **MDAT**: the full-resolution JPEG at the start of the first `mdat`
//!   box; only streams above 1 MiB qualify
//!
//! Orientation lives in the CMT1 metadata block at a fixed +0x140 offset,
//! stored little-endian unlike the box structure around it.

use crate::endian::{read_u32_be_at, ByteOrder};
use crate::format::bmff::{parse_box, walk_boxes, BOX_FTYP, BOX_MDAT, BOX_UUID};
use crate::format::jpeg;
use crate::preview::{push_unique, PreviewInfo, PreviewQuality};

// =============================================================================
// Constants
// =============================================================================

/// "cr3 " major brand.
const BRAND_CR3: u32 = 0x6372_3320;
/// "crx " major brand (newer bodies).
const BRAND_CRX: u32 = 0x6372_7820;

/// Canon's preview `uuid` box UUID.
const PREVIEW_UUID: [u8; 16] = [
    0xEA, 0xF4, 0x2B, 0x5E, 0x1C, 0x98, 0x4B, 0x88, 0xB9, 0xFB, 0xB7, 0xDC, 0x40, 0x6E, 0x4D, 0x16,
];

/// "PRVW" sub-box signature.
const PRVW_SIGNATURE: u32 = 0x5052_5657;
/// "THMB" marker.
const THMB_SIGNATURE: u32 = 0x5448_4D42;
/// "CMT1" marker.
const CMT1_SIGNATURE: u32 = 0x434D_5431;

/// Orientation offset within the CMT1 block.
const CMT1_ORIENTATION_OFFSET: usize = 0x140;

/// MDAT JPEGs below this size are not full-resolution previews.
const MDAT_MIN_JPEG_SIZE: u64 = 1024 * 1024;

/// Nominal THMB dimensions.
const THMB_WIDTH: u32 = 160;
const THMB_HEIGHT: u32 = 120;

/// Typical full-resolution dimensions reported for MDAT previews.
const MDAT_WIDTH: u32 = 5472;
const MDAT_HEIGHT: u32 = 3648;

// =============================================================================
// Detection
// =============================================================================

/// Whether `data` opens with an `ftyp` box whose major brand is `cr3 ` or
/// `crx `.
pub fn can_parse(data: &[u8]) -> bool {
    if data.len() < 20 {
        return false;
    }
    if read_u32_be_at(data, 4) != Some(BOX_FTYP) {
        return false;
    }
    matches!(read_u32_be_at(data, 8), Some(BRAND_CR3) | Some(BRAND_CRX))
}

// =============================================================================
// Preview Extraction
// =============================================================================

/// Enumerate the embedded previews of a CR3 file, in THMB, PRVW, MDAT order.
pub fn extract_previews(data: &[u8]) -> Vec<PreviewInfo> {
    let mut previews = Vec::new();
    if !can_parse(data) {
        return previews;
    }

    let orientation = extract_orientation(data);

    if let Some(mut thumbnail) = extract_thumbnail(data) {
        thumbnail.orientation = orientation;
        push_unique(&mut previews, thumbnail);
    }
    if let Some(mut medium) = extract_prvw(data) {
        medium.orientation = orientation;
        push_unique(&mut previews, medium);
    }
    if let Some(mut full) = extract_mdat(data) {
        full.orientation = orientation;
        push_unique(&mut previews, full);
    }

    previews
}

/// Locate the THMB thumbnail: find the ASCII marker, then the first SOI
/// after its 16-byte header, then the matching EOI.
fn extract_thumbnail(data: &[u8]) -> Option<PreviewInfo> {
    let marker = find_signature(data, THMB_SIGNATURE)?;
    if marker + 20 >= data.len() {
        return None;
    }

    let search_start = marker + 16;
    let start = search_start + jpeg::find_jpeg_start(&data[search_start..])?;
    let end = jpeg::find_jpeg_end(data, start)?;
    if end <= start {
        return None;
    }

    let payload = &data[start..end];
    if !jpeg::is_valid_jpeg(payload) {
        return None;
    }

    Some(PreviewInfo {
        offset: start as u64,
        size: (end - start) as u64,
        width: THMB_WIDTH,
        height: THMB_HEIGHT,
        is_jpeg: true,
        quality: PreviewQuality::Thumbnail,
        priority: 1,
        kind: "CR3_THMB".to_string(),
        ..Default::default()
    })
}

/// Locate the PRVW medium preview inside Canon's preview `uuid` box.
fn extract_prvw(data: &[u8]) -> Option<PreviewInfo> {
    for (offset, header) in walk_boxes(data) {
        if header.kind != BOX_UUID || header.size < 32 {
            continue;
        }
        let Some(uuid) = data.get(offset + 8..offset + 24) else {
            continue;
        };
        if uuid != PREVIEW_UUID {
            continue;
        }

        let Some(mut preview) = preview_from_uuid(data, offset, header.size) else {
            continue;
        };
        preview.quality = PreviewQuality::Preview;
        preview.kind = "CR3_PRVW".to_string();
        preview.priority = 5;
        return Some(preview);
    }
    None
}

/// Parse the PRVW payload of the preview `uuid` box at `box_offset`.
///
/// Layout: 16-byte UUID, 8 bytes of payload header, then the PRVW sub-box
/// (8-byte header + 16-byte internal header) wrapping the JPEG. The EOI
/// search is bounded to the PRVW box so trailing boxes are never swallowed.
fn preview_from_uuid(data: &[u8], box_offset: usize, box_size: u64) -> Option<PreviewInfo> {
    if box_size < 48 {
        return None;
    }
    let payload_offset = box_offset.checked_add(24)?;
    let prvw_offset = payload_offset.checked_add(8)?;
    let prvw_size = read_u32_be_at(data, prvw_offset)? as usize;
    let signature = read_u32_be_at(data, prvw_offset + 4)?;
    if signature != PRVW_SIGNATURE || prvw_size <= 20 {
        return None;
    }

    // 8-byte PRVW box header plus a 16-byte internal header precede the JPEG
    let search_start = prvw_offset + 8 + 16;
    if search_start >= data.len() {
        return None;
    }

    let start = search_start + jpeg::find_jpeg_start(&data[search_start..])?;
    let prvw_end = data.len().min(prvw_offset.saturating_add(prvw_size));
    let max_size = prvw_size.checked_sub(start - prvw_offset)?;
    let end = jpeg::find_jpeg_end(&data[..prvw_end], start)?;
    if end <= start || end - start > max_size {
        return None;
    }

    let payload = &data[start..end];
    if !jpeg::is_valid_jpeg(payload) {
        return None;
    }

    Some(PreviewInfo {
        offset: start as u64,
        size: (end - start) as u64,
        is_jpeg: true,
        ..Default::default()
    })
}

/// Locate the full-resolution JPEG at the start of the first `mdat` box.
fn extract_mdat(data: &[u8]) -> Option<PreviewInfo> {
    for (offset, header) in walk_boxes(data) {
        if header.kind != BOX_MDAT {
            continue;
        }

        let payload_offset = offset + 8;
        let search_limit = data.len().min(offset.saturating_add(header.size as usize));
        let window = data.get(payload_offset..search_limit)?;

        let start = payload_offset + jpeg::find_jpeg_start(window)?;
        let end = jpeg::find_jpeg_end(&data[..search_limit], start)?;
        if end <= start {
            return None;
        }

        let size = (end - start) as u64;
        if size <= MDAT_MIN_JPEG_SIZE {
            return None;
        }

        let payload = &data[start..end];
        if !jpeg::is_valid_jpeg(payload) {
            return None;
        }

        return Some(PreviewInfo {
            offset: start as u64,
            size,
            width: MDAT_WIDTH,
            height: MDAT_HEIGHT,
            is_jpeg: true,
            quality: PreviewQuality::Full,
            priority: 10,
            kind: "CR3_MDAT".to_string(),
            ..Default::default()
        });
    }
    None
}

// =============================================================================
// Orientation
// =============================================================================

/// Read the EXIF orientation from the CMT1 metadata block.
///
/// The value sits at CMT1 + 0x140, little-endian. Out-of-range values fall
/// back to 1.
pub fn extract_orientation(data: &[u8]) -> u16 {
    let Some(marker) = find_signature(data, CMT1_SIGNATURE) else {
        return 1;
    };

    match ByteOrder::Little.read_u16_at(data, marker + CMT1_ORIENTATION_OFFSET) {
        Some(orientation @ 1..=8) => orientation,
        _ => 1,
    }
}

/// First offset where the big-endian u32 `signature` occurs.
fn find_signature(data: &[u8], signature: u32) -> Option<usize> {
    let needle = signature.to_be_bytes();
    if data.len() < 4 {
        return None;
    }
    (0..data.len() - 3).find(|&i| data[i..i + 4] == needle)
}

// =============================================================================
// Selection
// =============================================================================

/// Pick the best CR3 preview: the largest candidate inside the default
/// target range, else the first candidate.
pub fn select_best_preview(previews: &[PreviewInfo]) -> PreviewInfo {
    let mut best = PreviewInfo::default();

    for preview in previews {
        if crate::options::in_target_range(preview.size)
            && (best.size == 0 || preview.size > best.size)
        {
            best = preview.clone();
        }
    }

    if best.size == 0 {
        if let Some(first) = previews.first() {
            best = first.clone();
        }
    }

    best
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn ftyp_cr3() -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&16u32.to_be_bytes());
        data.extend_from_slice(b"ftyp");
        data.extend_from_slice(b"cr3 ");
        data.extend_from_slice(&[0u8; 4]);
        data
    }

    fn valid_jpeg(len: usize) -> Vec<u8> {
        let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x04];
        jpeg.resize(len - 2, 0x10);
        jpeg.extend_from_slice(&[0xFF, 0xD9]);
        jpeg
    }

    #[test]
    fn test_can_parse() {
        let mut data = ftyp_cr3();
        data.resize(32, 0);
        assert!(can_parse(&data));

        data[8..12].copy_from_slice(b"crx ");
        assert!(can_parse(&data));

        data[8..12].copy_from_slice(b"isom");
        assert!(!can_parse(&data));

        assert!(!can_parse(&[0u8; 12]));
    }

    #[test]
    fn test_thumbnail_extraction() {
        let mut data = ftyp_cr3();
        data.extend_from_slice(b"THMB");
        data.extend_from_slice(&[0u8; 16]); // THMB header
        let jpeg = valid_jpeg(64);
        let jpeg_start = data.len();
        data.extend_from_slice(&jpeg);
        data.extend_from_slice(&[0u8; 16]);

        let thumbnail = extract_thumbnail(&data).unwrap();
        assert_eq!(thumbnail.offset, jpeg_start as u64);
        assert_eq!(thumbnail.size, jpeg.len() as u64);
        assert_eq!(thumbnail.width, THMB_WIDTH);
        assert_eq!(thumbnail.quality, PreviewQuality::Thumbnail);
        assert_eq!(thumbnail.kind, "CR3_THMB");
    }

    #[test]
    fn test_prvw_extraction() {
        let jpeg = valid_jpeg(128);

        // PRVW sub-box: header + 16-byte internal header + JPEG
        let prvw_size = 8 + 16 + jpeg.len();
        let mut prvw = Vec::new();
        prvw.extend_from_slice(&(prvw_size as u32).to_be_bytes());
        prvw.extend_from_slice(b"PRVW");
        prvw.extend_from_slice(&[0u8; 16]);
        prvw.extend_from_slice(&jpeg);

        // uuid box: header + UUID + 8-byte payload header + PRVW
        let uuid_size = 8 + 16 + 8 + prvw.len();
        let mut data = ftyp_cr3();
        let uuid_offset = data.len();
        data.extend_from_slice(&(uuid_size as u32).to_be_bytes());
        data.extend_from_slice(b"uuid");
        data.extend_from_slice(&PREVIEW_UUID);
        data.extend_from_slice(&[0u8; 8]);
        data.extend_from_slice(&prvw);

        let preview = extract_prvw(&data).unwrap();
        assert_eq!(preview.kind, "CR3_PRVW");
        assert_eq!(preview.priority, 5);
        assert_eq!(preview.quality, PreviewQuality::Preview);
        let expected_start = uuid_offset + 8 + 16 + 8 + 8 + 16;
        assert_eq!(preview.offset, expected_start as u64);
        assert_eq!(preview.size, jpeg.len() as u64);
    }

    #[test]
    fn test_prvw_wrong_uuid_ignored() {
        let mut data = ftyp_cr3();
        data.extend_from_slice(&40u32.to_be_bytes());
        data.extend_from_slice(b"uuid");
        data.extend_from_slice(&[0xAB; 16]);
        data.extend_from_slice(&[0u8; 12]);
        assert!(extract_prvw(&data).is_none());
    }

    #[test]
    fn test_mdat_requires_large_jpeg() {
        // Small JPEG in mdat: rejected
        let jpeg = valid_jpeg(512);
        let mut data = ftyp_cr3();
        data.extend_from_slice(&((jpeg.len() + 8) as u32).to_be_bytes());
        data.extend_from_slice(b"mdat");
        data.extend_from_slice(&jpeg);
        assert!(extract_mdat(&data).is_none());

        // 2 MiB JPEG: accepted as the full-resolution preview
        let jpeg = valid_jpeg(2 * 1024 * 1024);
        let mut data = ftyp_cr3();
        let mdat_offset = data.len();
        data.extend_from_slice(&((jpeg.len() + 8) as u32).to_be_bytes());
        data.extend_from_slice(b"mdat");
        data.extend_from_slice(&jpeg);

        let preview = extract_mdat(&data).unwrap();
        assert_eq!(preview.offset, (mdat_offset + 8) as u64);
        assert_eq!(preview.size, jpeg.len() as u64);
        assert_eq!(preview.kind, "CR3_MDAT");
        assert_eq!(preview.quality, PreviewQuality::Full);
        assert_eq!(preview.priority, 10);
    }

    #[test]
    fn test_orientation_from_cmt1() {
        let mut data = ftyp_cr3();
        let cmt1_offset = data.len();
        data.extend_from_slice(b"CMT1");
        data.resize(cmt1_offset + CMT1_ORIENTATION_OFFSET + 2, 0);
        data[cmt1_offset + CMT1_ORIENTATION_OFFSET] = 0x06;

        assert_eq!(extract_orientation(&data), 6);

        // Out-of-range value falls back to 1
        data[cmt1_offset + CMT1_ORIENTATION_OFFSET] = 0x2A;
        assert_eq!(extract_orientation(&data), 1);
    }

    #[test]
    fn test_orientation_missing_cmt1() {
        assert_eq!(extract_orientation(&ftyp_cr3()), 1);
        assert_eq!(extract_orientation(&[]), 1);
    }

    #[test]
    fn test_select_best_prefers_target_range() {
        let thumbnail = PreviewInfo { size: 10_000, ..Default::default() };
        let medium = PreviewInfo { size: 1024 * 1024, ..Default::default() };
        let full = PreviewInfo { size: 8 * 1024 * 1024, ..Default::default() };

        let best = select_best_preview(&[thumbnail.clone(), medium.clone(), full.clone()]);
        assert_eq!(best.size, medium.size);

        // Nothing in range: first candidate wins
        let best = select_best_preview(&[thumbnail.clone(), full]);
        assert_eq!(best.size, thumbnail.size);
    }
}
