//! rawpreview - embedded JPEG preview extraction from camera RAW files.
//!
//! Camera RAW containers embed one or more ready-to-use JPEG renditions of
//! the shot: a thumbnail for file lists, a mid-size preview for UI display,
//! and often the full-resolution camera JPEG. This crate locates those
//! streams without decoding any RAW sensor data, across eight vendor
//! formats: Canon CR2 and CR3, Nikon NEF, Sony ARW, Adobe DNG, Fujifilm
//! RAF, Olympus ORF, and Panasonic RW2.
//!
//! All parsing operates on a borrowed, read-only byte slice and treats it as
//! hostile: every offset is bounds-checked, IFD walks are cycle-guarded, and
//! malformed structures degrade to "no candidates" rather than failures.
//!
//! # Example
//!
//! ```no_run
//! use rawpreview::{extract_from_buffer, ExtractionOptions};
//!
//! let bytes = std::fs::read("photo.nef").unwrap();
//! match extract_from_buffer(&bytes, &ExtractionOptions::default()) {
//!     Ok(preview) => {
//!         println!("{}: {} bytes at offset {}", preview.format, preview.info.size, preview.info.offset);
//!         std::fs::write("preview.jpg", &preview.jpeg).unwrap();
//!     }
//!     Err(error) => eprintln!("{:?}: {}", error.code(), error),
//! }
//! ```
//!
//! # Selection modes
//!
//! - [`extract_from_buffer`] / [`extract_preview`]: the best match for the
//!   caller's size window and preferred quality tier
//! - [`extract_medium_preview`] / [`extract_full_preview`]: position-indexed
//!   selection per format, with camera-model-aware handling for Nikon bodies
//! - [`extract_all_previews`]: every embedded preview with its bytes

pub mod endian;
pub mod error;
pub mod extractor;
pub mod format;
pub mod options;
pub mod preview;
pub mod select;

pub use endian::ByteOrder;
pub use error::{ErrorCode, ExtractError, TiffError};
pub use extractor::{
    all_previews, detect_format_file, extract_all_from_buffer, extract_all_previews,
    extract_from_buffer, extract_full_from_buffer, extract_full_preview,
    extract_medium_from_buffer, extract_medium_preview, extract_preview,
};
pub use format::jpeg::{
    classify_preview, estimate_quality, find_jpeg_end, find_jpeg_markers, find_jpeg_start,
    is_valid_jpeg, JpegMarker, MarkerKind,
};
pub use format::{detect_format, detect_format_fast, is_tiff_header, RawFormat};
pub use options::{
    ExtractionOptions, SelectOptions, DEFAULT_TARGET_MAX_SIZE, DEFAULT_TARGET_MIN_SIZE,
};
pub use preview::{ExtractedPreview, PreviewInfo, PreviewQuality};
pub use select::{nikon_mapping, PreviewMapping};
