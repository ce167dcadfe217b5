//! Format parsers for camera RAW containers.
//!
//! Every vendor module exposes the same three operations:
//!
//! - `can_parse`: cheap header/IFD0 probe
//! - `extract_previews`: the full candidate enumeration, each candidate
//!   bounds-checked and JPEG-validated before it is emitted
//! - `select_best_preview`: the vendor's own priority-based pick
//!
//! Shared machinery lives underneath: [`tiff`] for the IFD-based formats,
//! [`bmff`] for the CR3 box walk, and [`jpeg`] for stream validation and
//! tier classification. Use [`detect::detect_format`] to route a buffer to
//! the right parser.

pub mod arw;
pub mod bmff;
pub mod cr2;
pub mod cr3;
pub mod detect;
pub mod dng;
pub mod jpeg;
pub mod nef;
pub mod orf;
pub mod raf;
pub mod rw2;
pub mod tiff;

pub use detect::{detect_format, detect_format_fast, RawFormat};
pub use tiff::is_tiff_header;
