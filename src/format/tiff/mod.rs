//! TIFF container parsing.
//!
//! Three layers, bottom up:
//!
//! - [`tags`]: the tag and field-type vocabulary
//! - [`parser`]: header, IFD entry, and IFD structure parsing
//! - [`scan`]: cycle-guarded chain traversal surfacing raw preview
//!   candidates and the EXIF orientation
//!
//! Vendor parsers (CR2, NEF, ARW, DNG, and the TIFF flavors of ORF/RW2)
//! build on this module and attach their own semantics to the candidates.

pub mod parser;
pub mod scan;
pub mod tags;

pub use parser::{is_tiff_header, Ifd, IfdEntry, TiffHeader, IFD_ENTRY_SIZE, TIFF_HEADER_SIZE};
pub use scan::{
    extract_orientation, find_previews, preview_from_ifd, sub_ifd_offsets, walk_ifd_chain,
    TiffPreview, MAX_IFD_CHAIN,
};
