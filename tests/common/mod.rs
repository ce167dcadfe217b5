#![allow(dead_code)] // each test binary uses its own subset of the builders

//! Shared fixture builders for the integration tests.
//!
//! Real RAW files are megabytes of licensed sensor data, so the tests
//! synthesize containers byte-by-byte instead: little-endian TIFFs with
//! hand-planned IFD layouts, RAF fixed-offset directories, and CR3 box
//! chains. The JPEG payloads are structurally valid (SOI, one APP0 segment,
//! filler, EOI) without being decodable images.

/// A structurally valid JPEG of exactly `len` bytes (minimum 10).
///
/// The filler byte 0x10 guarantees no stray SOI/EOI pairs inside the body.
pub fn fake_jpeg(len: usize) -> Vec<u8> {
    assert!(len >= 10, "fake_jpeg needs at least 10 bytes");
    let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x04, 0x00, 0x00];
    jpeg.resize(len - 2, 0x10);
    jpeg.extend_from_slice(&[0xFF, 0xD9]);
    jpeg
}

/// Grow `data` as needed and copy `bytes` at `offset`.
pub fn put(data: &mut Vec<u8>, offset: usize, bytes: &[u8]) {
    if data.len() < offset + bytes.len() {
        data.resize(offset + bytes.len(), 0);
    }
    data[offset..offset + bytes.len()].copy_from_slice(bytes);
}

// =============================================================================
// TIFF building blocks (little-endian)
// =============================================================================

/// One 12-byte IFD entry.
#[derive(Debug, Clone, Copy)]
pub struct TiffEntry {
    pub tag: u16,
    pub field_type: u16,
    pub count: u32,
    pub value: [u8; 4],
}

impl TiffEntry {
    /// Inline LONG scalar.
    pub fn long(tag: u16, value: u32) -> Self {
        TiffEntry { tag, field_type: 4, count: 1, value: value.to_le_bytes() }
    }

    /// Inline SHORT scalar.
    pub fn short(tag: u16, value: u16) -> Self {
        let mut bytes = [0u8; 4];
        bytes[..2].copy_from_slice(&value.to_le_bytes());
        TiffEntry { tag, field_type: 3, count: 1, value: bytes }
    }

    /// Out-of-line value: `count` elements of `field_type` at `offset`.
    pub fn at_offset(tag: u16, field_type: u16, count: u32, offset: u32) -> Self {
        TiffEntry { tag, field_type, count, value: offset.to_le_bytes() }
    }

    /// ASCII string of `count` bytes stored at `offset`.
    pub fn ascii(tag: u16, count: u32, offset: u32) -> Self {
        Self::at_offset(tag, 2, count, offset)
    }

    fn encode(&self) -> [u8; 12] {
        let mut bytes = [0u8; 12];
        bytes[0..2].copy_from_slice(&self.tag.to_le_bytes());
        bytes[2..4].copy_from_slice(&self.field_type.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.count.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.value);
        bytes
    }
}

/// Serialize an IFD: entry count, entries, next-IFD offset.
pub fn ifd_bytes(entries: &[TiffEntry], next_ifd: u32) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(2 + entries.len() * 12 + 4);
    bytes.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    for entry in entries {
        bytes.extend_from_slice(&entry.encode());
    }
    bytes.extend_from_slice(&next_ifd.to_le_bytes());
    bytes
}

/// Start a little-endian TIFF with IFD0 at offset 8.
pub fn le_tiff() -> Vec<u8> {
    vec![0x49, 0x49, 0x2A, 0x00, 0x08, 0x00, 0x00, 0x00]
}

/// Little-endian u32 array serialized for an out-of-line LONG value.
pub fn long_array(values: &[u32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

// =============================================================================
// Format fixtures
// =============================================================================

/// Scenario fixture: a minimal CR2 (TIFF header + "CR" at offset 8).
pub fn minimal_cr2() -> Vec<u8> {
    let mut data = le_tiff();
    data.extend_from_slice(b"CR");
    data.extend_from_slice(&[0x02, 0x00]); // CR2 version
    data.resize(64, 0);
    data
}

/// Scenario fixture: a RAF with one embedded JPEG.
pub fn raf_with_preview(jpeg_offset: u32, jpeg_len: usize, total: usize) -> Vec<u8> {
    let mut data = vec![0u8; total];
    data[..16].copy_from_slice(b"FUJIFILMCCD-RAW\0");
    data[84..88].copy_from_slice(&jpeg_offset.to_be_bytes());
    data[88..92].copy_from_slice(&(jpeg_len as u32).to_be_bytes());
    let jpeg = fake_jpeg(jpeg_len);
    put(&mut data, jpeg_offset as usize, &jpeg);
    data
}

/// Scenario fixture: a CR3 `ftyp` header followed by a CMT1 block whose
/// orientation field holds `orientation`.
pub fn cr3_with_orientation(orientation: u16) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(&16u32.to_be_bytes());
    data.extend_from_slice(b"ftyp");
    data.extend_from_slice(b"cr3 ");
    data.extend_from_slice(&[0u8; 4]);

    let cmt1_offset = data.len();
    data.extend_from_slice(b"CMT1");
    data.resize(cmt1_offset + 0x140 + 2, 0);
    data[cmt1_offset + 0x140..cmt1_offset + 0x142].copy_from_slice(&orientation.to_le_bytes());
    data.resize(cmt1_offset + 0x180, 0);
    data
}

/// Scenario fixture: a NEF with three SubIFD previews of the given sizes
/// and the given camera model.
///
/// Layout: IFD0 (Make, Model, SubIFDs) at 8; string and array values in the
/// 60..120 window; the three SubIFDs at 120/160/200; JPEG payloads from
/// offset 512 with 4 KiB gaps.
pub fn nef_with_subifd_previews(model: &str, sizes: &[usize; 3]) -> Vec<u8> {
    let make = b"NIKON CORPORATION\0";
    let model_bytes: Vec<u8> = model.bytes().chain(std::iter::once(0)).collect();

    let mut jpeg_offsets = [0u32; 3];
    let mut next_offset = 512usize;
    for (i, size) in sizes.iter().enumerate() {
        jpeg_offsets[i] = next_offset as u32;
        next_offset += size + 4096;
    }

    let mut data = le_tiff();
    let ifd0 = ifd_bytes(
        &[
            TiffEntry::ascii(0x010F, make.len() as u32, 60),
            TiffEntry::ascii(0x0110, model_bytes.len() as u32, 80),
            TiffEntry::at_offset(0x014A, 4, 3, 100),
        ],
        0,
    );
    put(&mut data, 8, &ifd0);
    put(&mut data, 60, make);
    put(&mut data, 80, &model_bytes);
    put(&mut data, 100, &long_array(&[120, 160, 200]));

    for (i, &sub_offset) in [120usize, 160, 200].iter().enumerate() {
        let sub = ifd_bytes(
            &[
                TiffEntry::long(0x0111, jpeg_offsets[i]),
                TiffEntry::long(0x0117, sizes[i] as u32),
            ],
            0,
        );
        put(&mut data, sub_offset, &sub);
        put(&mut data, jpeg_offsets[i] as usize, &fake_jpeg(sizes[i]));
    }

    data
}

/// Scenario fixture: an ARW whose SR2Private block holds one embedded JPEG.
///
/// The SR2Private tag stores the block length in its count and points at a
/// LONG holding the block offset. The JPEG sits `jpeg_offset_in_block` bytes
/// into the block.
pub fn arw_with_sr2_private(jpeg_len: usize, jpeg_offset_in_block: usize) -> Vec<u8> {
    let block_offset = 4096u32;
    let block_len = (jpeg_offset_in_block + jpeg_len + 1024) as u32;

    let mut data = le_tiff();
    let ifd0 = ifd_bytes(
        &[
            TiffEntry::ascii(0x010F, 5, 60),
            TiffEntry::at_offset(0x7200, 4, block_len, 72),
        ],
        0,
    );
    put(&mut data, 8, &ifd0);
    put(&mut data, 60, b"SONY\0");
    put(&mut data, 72, &block_offset.to_le_bytes());

    let jpeg_at = block_offset as usize + jpeg_offset_in_block;
    put(&mut data, jpeg_at, &fake_jpeg(jpeg_len));
    // Pad out the declared block
    let block_end = block_offset as usize + block_len as usize;
    if data.len() < block_end {
        data.resize(block_end, 0);
    }
    data
}
