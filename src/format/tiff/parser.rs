//! TIFF header and IFD structure parsing.
//!
//! The formats built on TIFF (CR2, NEF, ARW, DNG, and the TIFF flavors of
//! ORF/RW2) all start from the same 8-byte header and the same linked list of
//! IFDs. This module parses those structures from an untrusted byte slice;
//! nothing here follows vendor semantics; that is the scan layer's job.
//!
//! # TIFF Header (8 bytes)
//! ```text
//! Bytes 0-1: Byte order (0x4949 = "II" little-endian, 0x4D4D = "MM" big-endian)
//! Bytes 2-3: Magic (42 = 0x002A)
//! Bytes 4-7: Offset of the first IFD
//! ```
//!
//! # IFD Entry (12 bytes)
//! ```text
//! Bytes 0-1:  Tag ID
//! Bytes 2-3:  Field type
//! Bytes 4-7:  Value count
//! Bytes 8-11: Value (when it fits in 4 bytes) or absolute offset to it
//! ```
//!
//! The value/offset field is kept as its raw 4 bytes: inline values are
//! decoded from those bytes with the file's byte order, which stays correct
//! for big-endian files on any host.

use std::collections::HashMap;

use crate::endian::ByteOrder;
use crate::error::TiffError;

use super::tags::{self, type_size};

// =============================================================================
// Constants
// =============================================================================

/// TIFF magic number ("the answer", 42).
pub const TIFF_MAGIC: u16 = 0x002A;

/// Size of the TIFF header in bytes.
pub const TIFF_HEADER_SIZE: usize = 8;

/// Size of one IFD entry in bytes.
pub const IFD_ENTRY_SIZE: usize = 12;

// =============================================================================
// TiffHeader
// =============================================================================

/// Parsed TIFF file header: byte order plus the offset of IFD0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TiffHeader {
    /// Byte order for all multi-byte values in the file.
    pub byte_order: ByteOrder,
    /// Offset of the first IFD.
    pub first_ifd_offset: u32,
}

impl TiffHeader {
    /// Parse the 8-byte TIFF header at the start of `data`.
    ///
    /// # Errors
    /// - `FileTooSmall` if fewer than 8 bytes are available
    /// - `InvalidMagic` if bytes 2..4 are not 0x002A in the detected order
    pub fn parse(data: &[u8]) -> Result<Self, TiffError> {
        if data.len() < TIFF_HEADER_SIZE {
            return Err(TiffError::FileTooSmall {
                required: TIFF_HEADER_SIZE,
                actual: data.len(),
            });
        }

        let byte_order = ByteOrder::detect(data);
        let magic = byte_order.read_u16(&data[2..4]);
        if magic != TIFF_MAGIC {
            return Err(TiffError::InvalidMagic(magic));
        }

        Ok(TiffHeader {
            byte_order,
            first_ifd_offset: byte_order.read_u32(&data[4..8]),
        })
    }
}

/// Quick check for a classic TIFF header without constructing one.
pub fn is_tiff_header(data: &[u8]) -> bool {
    if data.len() < TIFF_HEADER_SIZE {
        return false;
    }
    let magic = u16::from_le_bytes([data[0], data[1]]);
    if magic != 0x4949 && magic != 0x4D4D {
        return false;
    }
    ByteOrder::detect(data).read_u16(&data[2..4]) == TIFF_MAGIC
}

// =============================================================================
// IfdEntry
// =============================================================================

/// A single IFD directory entry.
///
/// The value field is kept as the raw 4 entry bytes. When
/// `type_size(field_type) * count <= 4` the value lives in those bytes;
/// otherwise they encode an absolute file offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfdEntry {
    /// Tag ID.
    pub tag: u16,
    /// Field type code (see [`tags`]).
    pub field_type: u16,
    /// Number of values (not bytes).
    pub count: u32,
    /// Raw bytes of the value/offset field.
    pub value: [u8; 4],
}

impl IfdEntry {
    /// Parse one 12-byte entry at `offset`. Returns `None` when the entry
    /// does not fit in the buffer.
    pub fn parse(data: &[u8], offset: usize, byte_order: ByteOrder) -> Option<IfdEntry> {
        let bytes = data.get(offset..offset.checked_add(IFD_ENTRY_SIZE)?)?;
        Some(IfdEntry {
            tag: byte_order.read_u16(&bytes[0..2]),
            field_type: byte_order.read_u16(&bytes[2..4]),
            count: byte_order.read_u32(&bytes[4..8]),
            value: [bytes[8], bytes[9], bytes[10], bytes[11]],
        })
    }

    /// Total byte size of the value data (`type_size * count`), saturating.
    #[inline]
    pub fn value_byte_size(&self) -> u64 {
        u64::from(type_size(self.field_type)).saturating_mul(u64::from(self.count))
    }

    /// Whether the value is packed into the entry itself.
    #[inline]
    pub fn is_inline(&self) -> bool {
        let size = self.value_byte_size();
        size > 0 && size <= 4
    }

    /// The value field decoded as an absolute offset.
    #[inline]
    pub fn value_offset(&self, byte_order: ByteOrder) -> u32 {
        byte_order.read_u32(&self.value)
    }

    /// First scalar of the value, widened to u32.
    ///
    /// Inline values decode from the entry's raw value bytes using the file
    /// byte order; out-of-line values are read at the stored offset. Unknown
    /// field types, RATIONALs, and out-of-range offsets yield 0; the scan
    /// layer treats 0 as "absent".
    pub fn u32_value(&self, data: &[u8], byte_order: ByteOrder) -> u32 {
        if type_size(self.field_type) == 0 {
            return 0;
        }

        if self.is_inline() {
            return match self.field_type {
                tags::TYPE_SHORT => u32::from(byte_order.read_u16(&self.value[0..2])),
                tags::TYPE_LONG => byte_order.read_u32(&self.value),
                tags::TYPE_BYTE | tags::TYPE_ASCII => u32::from(self.value[0]),
                _ => 0,
            };
        }

        let offset = self.value_offset(byte_order) as usize;
        match self.field_type {
            tags::TYPE_SHORT => byte_order.read_u16_at(data, offset).map_or(0, u32::from),
            tags::TYPE_LONG => byte_order.read_u32_at(data, offset).unwrap_or(0),
            _ => 0,
        }
    }

    /// All `count` values, widened to u32.
    ///
    /// BYTE and SHORT elements widen; LONG passes through; RATIONAL and
    /// unknown types yield an empty vector, as does any out-of-range value
    /// array.
    pub fn u32_values(&self, data: &[u8], byte_order: ByteOrder) -> Vec<u32> {
        let unit = type_size(self.field_type);
        if unit == 0 || unit > 4 || self.count == 0 {
            return Vec::new();
        }

        let total = self.value_byte_size();
        let bytes: &[u8] = if total <= 4 {
            &self.value
        } else {
            let offset = self.value_offset(byte_order) as usize;
            let Some(end) = offset.checked_add(total as usize) else {
                return Vec::new();
            };
            match data.get(offset..end) {
                Some(bytes) => bytes,
                None => return Vec::new(),
            }
        };

        let count = self.count as usize;
        let mut values = Vec::with_capacity(count);
        for i in 0..count {
            let at = i * unit as usize;
            let value = match self.field_type {
                tags::TYPE_SHORT => u32::from(byte_order.read_u16(&bytes[at..at + 2])),
                tags::TYPE_LONG => byte_order.read_u32(&bytes[at..at + 4]),
                _ => u32::from(bytes[at]),
            };
            values.push(value);
        }
        values
    }

    /// Decode an ASCII tag value, trimming the NUL terminator and padding.
    ///
    /// Values of up to 4 bytes are read from the entry itself, longer ones
    /// from the stored offset. Returns `None` for non-ASCII entries or
    /// out-of-range offsets.
    pub fn ascii_value(&self, data: &[u8], byte_order: ByteOrder) -> Option<String> {
        if self.field_type != tags::TYPE_ASCII || self.count == 0 {
            return None;
        }

        let count = self.count as usize;
        let bytes: &[u8] = if count <= 4 {
            &self.value[..count]
        } else {
            let offset = self.value_offset(byte_order) as usize;
            data.get(offset..offset.checked_add(count)?)?
        };

        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        let text = String::from_utf8_lossy(&bytes[..end]);
        Some(text.trim_end_matches([' ', '\0']).to_string())
    }
}

// =============================================================================
// Ifd
// =============================================================================

/// A parsed Image File Directory.
///
/// Entries are kept in file order and indexed by tag for lookup; on duplicate
/// tags the last parsed entry wins.
#[derive(Debug, Clone)]
pub struct Ifd {
    /// All entries, in file order.
    pub entries: Vec<IfdEntry>,
    /// Tag → index into `entries`.
    by_tag: HashMap<u16, usize>,
    /// Offset of the next IFD (0 = end of chain).
    pub next_ifd_offset: u32,
}

impl Ifd {
    /// Parse the IFD at `offset`.
    ///
    /// # Errors
    /// - `InvalidIfdOffset` when `offset` is outside the buffer
    /// - `TruncatedIfd` when the declared entry table plus the next-IFD
    ///   pointer would run past the end of the buffer
    pub fn parse(data: &[u8], offset: u32, byte_order: ByteOrder) -> Result<Ifd, TiffError> {
        let start = offset as usize;
        let count_bytes = byte_order
            .read_u16_at(data, start)
            .ok_or(TiffError::InvalidIfdOffset(offset))?;
        let entry_count = count_bytes as usize;

        let entries_start = start + 2;
        let entries_end = entries_start + entry_count * IFD_ENTRY_SIZE;
        if entries_end.checked_add(4).map_or(true, |end| end > data.len()) {
            return Err(TiffError::TruncatedIfd(offset));
        }

        let mut entries = Vec::with_capacity(entry_count);
        let mut by_tag = HashMap::with_capacity(entry_count);
        for i in 0..entry_count {
            let entry_offset = entries_start + i * IFD_ENTRY_SIZE;
            if let Some(entry) = IfdEntry::parse(data, entry_offset, byte_order) {
                by_tag.insert(entry.tag, entries.len());
                entries.push(entry);
            }
        }

        let next_ifd_offset = byte_order.read_u32_at(data, entries_end).unwrap_or(0);

        Ok(Ifd { entries, by_tag, next_ifd_offset })
    }

    /// Look up an entry by tag ID.
    pub fn get(&self, tag: u16) -> Option<&IfdEntry> {
        self.by_tag.get(&tag).map(|&index| &self.entries[index])
    }

    /// Whether the IFD carries `tag`.
    pub fn contains(&self, tag: u16) -> bool {
        self.by_tag.contains_key(&tag)
    }

    /// Scalar u32 value of `tag`, or `None` when the tag is absent.
    pub fn u32_value(&self, tag: u16, data: &[u8], byte_order: ByteOrder) -> Option<u32> {
        self.get(tag).map(|entry| entry.u32_value(data, byte_order))
    }

    /// Number of entries.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }
}

// =============================================================================
// Tests
// =============================================================================
