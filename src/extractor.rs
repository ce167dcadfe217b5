//! Top-level extraction pipeline.
//!
//! A strictly one-way data flow over a borrowed byte slice:
//!
//! ```text
//! bytes -> structural validation -> format detection -> candidate list
//!       -> selection -> bounds + JPEG validation -> copied JPEG bytes
//! ```
//!
//! A wall-clock deadline starts at entry and is checked between stages;
//! there is no mid-parse cancellation, so the checkpoints bound the run time
//! to one complete parsing pass. The input slice is never retained and the
//! output copy is the only allocation that scales with input size.

use std::path::Path;
use std::time::{Duration, Instant};

use bytes::Bytes;
use tracing::debug;

use crate::error::ExtractError;
use crate::format::{arw, cr2, cr3, detect, dng, nef, orf, raf, rw2, RawFormat};
use crate::format::jpeg;
use crate::options::{ExtractionOptions, SelectOptions, MEMORY_CHECK_THRESHOLD};
use crate::preview::{ExtractedPreview, PreviewInfo};
use crate::select;

/// Minimum plausible RAW file size; anything smaller is rejected outright.
const MIN_FILE_SIZE: usize = 16;

// =============================================================================
// Deadline
// =============================================================================

/// Wall-clock deadline for one extraction.
#[derive(Debug, Clone, Copy)]
struct Deadline {
    start: Instant,
    limit: Duration,
}

impl Deadline {
    fn new(limit: Duration) -> Self {
        Deadline { start: Instant::now(), limit }
    }

    fn expired(&self) -> bool {
        self.start.elapsed() >= self.limit
    }

    /// Error out if the deadline passed before `stage`.
    fn check(&self, stage: &'static str) -> Result<(), ExtractError> {
        if self.expired() {
            Err(ExtractError::TimeoutExceeded { stage })
        } else {
            Ok(())
        }
    }
}

// =============================================================================
// File Access
// =============================================================================

/// Read a file into memory, mapping I/O failures to extraction errors.
fn read_file(path: &Path) -> Result<Vec<u8>, ExtractError> {
    std::fs::read(path).map_err(|error| {
        let path = path.display().to_string();
        match error.kind() {
            std::io::ErrorKind::PermissionDenied => ExtractError::AccessDenied { path },
            std::io::ErrorKind::NotFound => ExtractError::FileNotFound { path },
            _ => ExtractError::FileNotFound { path },
        }
    })
}

// =============================================================================
// Pipeline Stages
// =============================================================================

/// Structural header validation: the buffer must open with a TIFF header or
/// an ISO-BMFF `ftyp` box.
fn validate_structure(data: &[u8]) -> Result<(), ExtractError> {
    let tiff_like = data.len() >= 4
        && ((data[0] == 0x49 && data[1] == 0x49 && data[2] == 0x2A && data[3] == 0x00)
            || (data[0] == 0x4D && data[1] == 0x4D && data[2] == 0x00 && data[3] == 0x2A));

    let bmff_like = data.len() >= 20
        && crate::endian::read_u32_be_at(data, 4) == Some(0x6674_7970);

    if tiff_like || bmff_like {
        Ok(())
    } else {
        Err(ExtractError::InvalidFormat("Invalid file format".to_string()))
    }
}

/// Per-format candidate enumeration.
pub fn all_previews(data: &[u8], format: RawFormat) -> Vec<PreviewInfo> {
    match format {
        RawFormat::Cr2 => cr2::extract_previews(data),
        RawFormat::Cr3 => cr3::extract_previews(data),
        RawFormat::Nef => nef::extract_previews(data),
        RawFormat::Arw => arw::extract_previews(data),
        RawFormat::Dng => dng::extract_previews(data),
        RawFormat::Raf => raf::extract_previews(data),
        RawFormat::Orf => orf::extract_previews(data),
        RawFormat::Rw2 => rw2::extract_previews(data),
        _ => Vec::new(),
    }
}

/// Per-format preferred pick.
fn format_best(previews: &[PreviewInfo], format: RawFormat) -> PreviewInfo {
    match format {
        RawFormat::Cr2 => cr2::select_best_preview(previews),
        RawFormat::Cr3 => cr3::select_best_preview(previews),
        RawFormat::Nef => nef::select_best_preview(previews),
        RawFormat::Arw => arw::select_best_preview(previews),
        RawFormat::Dng => dng::select_best_preview(previews),
        RawFormat::Raf => raf::select_best_preview(previews),
        RawFormat::Orf => orf::select_best_preview(previews),
        RawFormat::Rw2 => rw2::select_best_preview(previews),
        _ => PreviewInfo::default(),
    }
}

/// Choose the candidate to emit for the best-match pipeline.
///
/// The vendor's preferred pick wins when its size falls inside the caller's
/// target range. Otherwise candidates are filtered to the range (all kept if
/// none qualify) and ranked by preferred-quality match, then size.
fn select_best_preview(
    previews: &[PreviewInfo],
    options: &ExtractionOptions,
    format: RawFormat,
) -> PreviewInfo {
    if previews.is_empty() {
        return PreviewInfo::default();
    }

    let vendor_pick = format_best(previews, format);
    if vendor_pick.size >= options.target_min_size && vendor_pick.size <= options.target_max_size {
        return vendor_pick;
    }

    let mut candidates: Vec<&PreviewInfo> = previews
        .iter()
        .filter(|p| p.size >= options.target_min_size && p.size <= options.target_max_size)
        .collect();
    if candidates.is_empty() {
        candidates = previews.iter().collect();
    }

    candidates.sort_by(|a, b| {
        let a_match = a.quality == options.preferred_quality;
        let b_match = b.quality == options.preferred_quality;
        b_match.cmp(&a_match).then(b.size.cmp(&a.size))
    });

    candidates[0].clone()
}

/// Bounds, memory, and JPEG validation of the selected candidate.
fn validate_preview(
    data: &[u8],
    preview: &PreviewInfo,
    options: &ExtractionOptions,
) -> Result<(), ExtractError> {
    if preview.end() > data.len() as u64 {
        return Err(ExtractError::ValidationFailed);
    }
    if preview.size > options.max_memory_bytes() {
        return Err(ExtractError::MemoryLimitExceeded(
            "Preview size exceeds memory limit".to_string(),
        ));
    }

    let payload = &data[preview.offset as usize..preview.end() as usize];
    let valid = if options.strict_validation {
        jpeg::is_valid_jpeg(payload)
    } else {
        payload.len() >= 2 && payload[0..2] == jpeg::SOI
    };

    if valid {
        Ok(())
    } else {
        Err(ExtractError::ValidationFailed)
    }
}

/// Copy the preview byte range out of the source buffer.
fn copy_jpeg(data: &[u8], preview: &PreviewInfo) -> Option<Bytes> {
    let start = usize::try_from(preview.offset).ok()?;
    let end = usize::try_from(preview.end()).ok()?;
    data.get(start..end).map(Bytes::copy_from_slice)
}

// =============================================================================
// Best-Match Extraction
// =============================================================================

/// Extract the best-matching preview from an in-memory RAW file.
///
/// This is the full pipeline: structural validation, format detection,
/// candidate enumeration, selection per `options`, validation, and emission
/// of a fresh copy of the JPEG bytes.
pub fn extract_from_buffer(
    data: &[u8],
    options: &ExtractionOptions,
) -> Result<ExtractedPreview, ExtractError> {
    let deadline = Deadline::new(options.timeout);

    if data.len() < MIN_FILE_SIZE {
        return Err(ExtractError::InvalidFormat("Invalid data buffer".to_string()));
    }

    // Memory guard for very large inputs only; typical RAW files bypass it.
    if data.len() as u64 > MEMORY_CHECK_THRESHOLD
        && data.len() as u64 > options.max_memory_bytes()
    {
        return Err(ExtractError::MemoryLimitExceeded(
            "File size exceeds memory limit".to_string(),
        ));
    }

    validate_structure(data)?;
    deadline.check("validation")?;

    let mut format = detect::detect_format_fast(data);
    if format == RawFormat::Unknown {
        format = detect::detect_format(data);
    }
    if format == RawFormat::Unknown {
        return Err(ExtractError::InvalidFormat(
            "Unsupported or unrecognized RAW format".to_string(),
        ));
    }
    deadline.check("format detection")?;
    debug!(format = format.name(), "detected RAW format");

    let previews = all_previews(data, format);
    if previews.is_empty() {
        return Err(ExtractError::NoPreviewsFound);
    }
    deadline.check("preview extraction")?;
    debug!(candidates = previews.len(), "enumerated preview candidates");

    let selected = select_best_preview(&previews, options, format);
    if !selected.is_present() {
        return Err(ExtractError::NoPreviewsFound);
    }

    validate_preview(data, &selected, options)?;
    deadline.check("validation")?;

    let jpeg = copy_jpeg(data, &selected)
        .ok_or_else(|| ExtractError::Unknown("Failed to extract JPEG data".to_string()))?;

    Ok(ExtractedPreview { format, info: selected, jpeg })
}

/// Extract the best-matching preview from a RAW file on disk.
pub fn extract_preview(
    path: impl AsRef<Path>,
    options: &ExtractionOptions,
) -> Result<ExtractedPreview, ExtractError> {
    let data = read_file(path.as_ref())?;
    extract_from_buffer(&data, options)
}

// =============================================================================
// Position-Indexed Extraction
// =============================================================================

/// Common tail of the medium/full operations: bounds-check, validate, copy.
fn emit_selected(
    data: &[u8],
    format: RawFormat,
    selected: PreviewInfo,
    options: &SelectOptions,
) -> Result<ExtractedPreview, ExtractError> {
    if selected.end() > data.len() as u64 {
        return Err(ExtractError::CorruptedFile(
            "Preview extends beyond file bounds".to_string(),
        ));
    }

    let payload = &data[selected.offset as usize..selected.end() as usize];
    let valid = if options.strict_validation {
        jpeg::is_valid_jpeg(payload)
    } else {
        payload.len() >= 2 && payload[0..2] == jpeg::SOI
    };
    if !valid {
        return Err(ExtractError::ValidationFailed);
    }

    let jpeg = copy_jpeg(data, &selected)
        .ok_or_else(|| ExtractError::Unknown("Failed to extract JPEG data".to_string()))?;

    Ok(ExtractedPreview { format, info: selected, jpeg })
}

/// Extract the medium preview using the per-format position mapping.
pub fn extract_medium_from_buffer(
    data: &[u8],
    options: &SelectOptions,
) -> Result<ExtractedPreview, ExtractError> {
    let deadline = Deadline::new(options.timeout);

    let format = detect::detect_format(data);
    deadline.check("format detection")?;

    let previews = all_previews(data, format);
    if previews.is_empty() {
        return Err(ExtractError::NoPreviewsFound);
    }
    deadline.check("preview extraction")?;

    let selected =
        select::select_medium(data, format, &previews).ok_or(ExtractError::NoPreviewsFound)?;
    emit_selected(data, format, selected, options)
}

/// Extract the full preview using the per-format position mapping.
pub fn extract_full_from_buffer(
    data: &[u8],
    options: &SelectOptions,
) -> Result<ExtractedPreview, ExtractError> {
    let deadline = Deadline::new(options.timeout);

    let format = detect::detect_format(data);
    deadline.check("format detection")?;

    let previews = all_previews(data, format);
    if previews.is_empty() {
        return Err(ExtractError::NoPreviewsFound);
    }
    deadline.check("preview extraction")?;

    let selected =
        select::select_full(data, format, &previews).ok_or(ExtractError::NoPreviewsFound)?;
    emit_selected(data, format, selected, options)
}

/// Extract the medium preview from a RAW file on disk.
pub fn extract_medium_preview(
    path: impl AsRef<Path>,
    options: &SelectOptions,
) -> Result<ExtractedPreview, ExtractError> {
    let data = read_file(path.as_ref())?;
    extract_medium_from_buffer(&data, options)
}

/// Extract the full preview from a RAW file on disk.
pub fn extract_full_preview(
    path: impl AsRef<Path>,
    options: &SelectOptions,
) -> Result<ExtractedPreview, ExtractError> {
    let data = read_file(path.as_ref())?;
    extract_full_from_buffer(&data, options)
}

// =============================================================================
// Enumeration
// =============================================================================

/// Enumerate every preview of an in-memory RAW file, each with a fresh copy
/// of its JPEG bytes.
pub fn extract_all_from_buffer(data: &[u8]) -> Result<Vec<ExtractedPreview>, ExtractError> {
    let format = detect::detect_format(data);
    let previews = all_previews(data, format);

    let mut extracted = Vec::with_capacity(previews.len());
    for preview in previews {
        // Candidates are bounds-checked at emission; a failed copy here
        // would mean a parser bug, so skip rather than fail the whole call.
        if let Some(jpeg) = copy_jpeg(data, &preview) {
            extracted.push(ExtractedPreview { format, info: preview, jpeg });
        }
    }
    Ok(extracted)
}

/// Enumerate every preview of a RAW file on disk.
pub fn extract_all_previews(path: impl AsRef<Path>) -> Result<Vec<ExtractedPreview>, ExtractError> {
    let data = read_file(path.as_ref())?;
    extract_all_from_buffer(&data)
}

/// Detect the format of a RAW file on disk.
pub fn detect_format_file(path: impl AsRef<Path>) -> Result<RawFormat, ExtractError> {
    let data = read_file(path.as_ref())?;
    Ok(detect::detect_format(&data))
}

// =============================================================================
// Tests
// =============================================================================
