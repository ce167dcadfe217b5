//! Fujifilm RAF parsing.
//!
//! RAF is the one format here with no TIFF or box structure at the top: a
//! fixed ASCII magic followed by a big-endian directory at fixed offsets.
//! The embedded JPEG's offset and length sit at bytes 84 and 88.

use crate::endian::read_u32_be_at;
use crate::format::jpeg;
use crate::options::in_target_range;
use crate::preview::PreviewInfo;

/// The 15-byte RAF magic.
const RAF_MAGIC: &[u8] = b"FUJIFILMCCD-RAW";

/// Fixed offset of the big-endian JPEG offset field.
const JPEG_OFFSET_FIELD: usize = 84;
/// Fixed offset of the big-endian JPEG length field.
const JPEG_LENGTH_FIELD: usize = 88;

/// Whether `data` starts with the RAF magic.
pub fn can_parse(data: &[u8]) -> bool {
    data.len() >= 16 && data.starts_with(RAF_MAGIC)
}

/// Enumerate the JPEG previews of a RAF file (at most one).
pub fn extract_previews(data: &[u8]) -> Vec<PreviewInfo> {
    let mut previews = Vec::new();
    if !can_parse(data) || data.len() < 100 {
        return previews;
    }

    let (Some(jpeg_offset), Some(jpeg_length)) = (
        read_u32_be_at(data, JPEG_OFFSET_FIELD),
        read_u32_be_at(data, JPEG_LENGTH_FIELD),
    ) else {
        return previews;
    };
    if jpeg_offset == 0 || jpeg_length == 0 {
        return previews;
    }

    let offset = jpeg_offset as usize;
    let Some(end) = offset.checked_add(jpeg_length as usize) else {
        return previews;
    };
    let Some(payload) = data.get(offset..end) else {
        return previews;
    };
    if !jpeg::is_valid_jpeg(payload) {
        return previews;
    }

    let size = u64::from(jpeg_length);
    previews.push(PreviewInfo {
        offset: u64::from(jpeg_offset),
        size,
        is_jpeg: true,
        quality: jpeg::classify_preview(0, 0, size),
        priority: if in_target_range(size) { 10 } else { 7 },
        kind: "RAF_JPEG".to_string(),
        ..Default::default()
    });

    previews
}

/// RAF carries a single preview; selection returns it.
pub fn select_best_preview(previews: &[PreviewInfo]) -> PreviewInfo {
    previews.first().cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raf_with_jpeg(jpeg_offset: u32, jpeg: &[u8], total: usize) -> Vec<u8> {
        let mut data = vec![0u8; total];
        data[..15].copy_from_slice(RAF_MAGIC);
        data[JPEG_OFFSET_FIELD..JPEG_OFFSET_FIELD + 4].copy_from_slice(&jpeg_offset.to_be_bytes());
        data[JPEG_LENGTH_FIELD..JPEG_LENGTH_FIELD + 4]
            .copy_from_slice(&(jpeg.len() as u32).to_be_bytes());
        let at = jpeg_offset as usize;
        data[at..at + jpeg.len()].copy_from_slice(jpeg);
        data
    }

    fn valid_jpeg(len: usize) -> Vec<u8> {
        let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x04];
        jpeg.resize(len - 2, 0x20);
        jpeg.extend_from_slice(&[0xFF, 0xD9]);
        jpeg
    }

    #[test]
    fn test_can_parse() {
        assert!(can_parse(b"FUJIFILMCCD-RAW\0"));
        assert!(!can_parse(b"FUJIFILMCCD-RA"));
        assert!(!can_parse(&[0x49, 0x49, 0x2A, 0x00]));
    }

    #[test]
    fn test_extract_single_preview() {
        let jpeg = valid_jpeg(512);
        let data = raf_with_jpeg(1024, &jpeg, 2048);

        let previews = extract_previews(&data);
        assert_eq!(previews.len(), 1);
        assert_eq!(previews[0].offset, 1024);
        assert_eq!(previews[0].size, 512);
        assert_eq!(previews[0].priority, 7); // below the target range
        assert_eq!(previews[0].kind, "RAF_JPEG");
    }

    #[test]
    fn test_extract_rejects_bad_range() {
        let jpeg = valid_jpeg(64);
        let mut data = raf_with_jpeg(256, &jpeg, 512);
        // Length now points past the end of the buffer
        data[JPEG_LENGTH_FIELD..JPEG_LENGTH_FIELD + 4].copy_from_slice(&4096u32.to_be_bytes());
        assert!(extract_previews(&data).is_empty());
    }

    #[test]
    fn test_extract_rejects_non_jpeg() {
        let mut data = vec![0u8; 2048];
        data[..15].copy_from_slice(RAF_MAGIC);
        data[JPEG_OFFSET_FIELD..JPEG_OFFSET_FIELD + 4].copy_from_slice(&1024u32.to_be_bytes());
        data[JPEG_LENGTH_FIELD..JPEG_LENGTH_FIELD + 4].copy_from_slice(&128u32.to_be_bytes());
        assert!(extract_previews(&data).is_empty());
    }
}
