//! TIFF tag and field-type constants.
//!
//! Only the tags the preview scan and the vendor parsers actually consult are
//! defined; everything else is carried through the IFD untouched and ignored.

// =============================================================================
// Field Types
// =============================================================================

/// Unsigned 8-bit integer (1 byte).
pub const TYPE_BYTE: u16 = 1;
/// 8-bit ASCII character, NUL-terminated strings (1 byte).
pub const TYPE_ASCII: u16 = 2;
/// Unsigned 16-bit integer (2 bytes).
pub const TYPE_SHORT: u16 = 3;
/// Unsigned 32-bit integer (4 bytes).
pub const TYPE_LONG: u16 = 4;
/// Two LONGs, numerator/denominator (8 bytes).
pub const TYPE_RATIONAL: u16 = 5;

/// Size in bytes of a single value of `field_type`, or 0 for unknown types.
#[inline]
pub const fn type_size(field_type: u16) -> u32 {
    match field_type {
        TYPE_BYTE | TYPE_ASCII => 1,
        TYPE_SHORT => 2,
        TYPE_LONG => 4,
        TYPE_RATIONAL => 8,
        _ => 0,
    }
}

// =============================================================================
// Baseline Tags
// =============================================================================

/// NewSubfileType: 1 marks a reduced-resolution (preview) image.
pub const TAG_NEW_SUBFILE_TYPE: u16 = 0x00FE;
/// Image width in pixels.
pub const TAG_IMAGE_WIDTH: u16 = 0x0100;
/// Image height in pixels.
pub const TAG_IMAGE_HEIGHT: u16 = 0x0101;
/// Compression scheme; 6 (old-style JPEG) and 7 (JPEG) matter here.
pub const TAG_COMPRESSION: u16 = 0x0103;
/// Camera maker string.
pub const TAG_MAKE: u16 = 0x010F;
/// Camera model string.
pub const TAG_MODEL: u16 = 0x0110;
/// Offsets of image strips; the first strip hosts embedded previews.
pub const TAG_STRIP_OFFSETS: u16 = 0x0111;
/// EXIF orientation, 1..8.
pub const TAG_ORIENTATION: u16 = 0x0112;
/// Byte counts matching `TAG_STRIP_OFFSETS`.
pub const TAG_STRIP_BYTE_COUNTS: u16 = 0x0117;
/// Software string (Adobe products mark DNGs converted by them).
pub const TAG_SOFTWARE: u16 = 0x0131;
/// Child IFD offsets.
pub const TAG_SUB_IFDS: u16 = 0x014A;
/// Offset of an embedded JFIF stream.
pub const TAG_JPEG_INTERCHANGE_FORMAT: u16 = 0x0201;
/// Length of the embedded JFIF stream.
pub const TAG_JPEG_INTERCHANGE_FORMAT_LENGTH: u16 = 0x0202;

// =============================================================================
// Vendor Tags
// =============================================================================

/// Nikon: start of the embedded JPEG inside a SubIFD.
pub const TAG_NIKON_JPEG_FROM_RAW_START: u16 = 0x0201;
/// Nikon: length of the embedded JPEG inside a SubIFD.
pub const TAG_NIKON_JPEG_FROM_RAW_LENGTH: u16 = 0x0202;
/// Sony: SR2Private proprietary block.
pub const TAG_SONY_SR2_PRIVATE: u16 = 0x7200;
/// Sony: SR2 SubIFD offsets.
pub const TAG_SONY_SR2_SUB_IFD: u16 = 0x7201;
/// Adobe: DNGVersion, present in every DNG.
pub const TAG_DNG_VERSION: u16 = 0xC612;

/// Compression values that mark a JPEG-compressed image.
#[inline]
pub const fn is_jpeg_compression(compression: u32) -> bool {
    compression == 6 || compression == 7
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_sizes() {
        assert_eq!(type_size(TYPE_BYTE), 1);
        assert_eq!(type_size(TYPE_ASCII), 1);
        assert_eq!(type_size(TYPE_SHORT), 2);
        assert_eq!(type_size(TYPE_LONG), 4);
        assert_eq!(type_size(TYPE_RATIONAL), 8);
        assert_eq!(type_size(7), 0);
        assert_eq!(type_size(0), 0);
    }

    #[test]
    fn test_jpeg_compression_values() {
        assert!(is_jpeg_compression(6));
        assert!(is_jpeg_compression(7));
        assert!(!is_jpeg_compression(1));
        assert!(!is_jpeg_compression(34712));
    }
}
