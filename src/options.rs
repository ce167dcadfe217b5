//! Extraction options and their defaults.

use std::time::Duration;

use crate::preview::PreviewQuality;

// =============================================================================
// Default Values
// =============================================================================

/// Default lower bound of the target preview size (200 KiB).
pub const DEFAULT_TARGET_MIN_SIZE: u64 = 200 * 1024;

/// Default upper bound of the target preview size (3 MiB).
pub const DEFAULT_TARGET_MAX_SIZE: u64 = 3 * 1024 * 1024;

/// Default wall-clock deadline for one extraction.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Default memory limit in MiB for allocations attributable to one call.
pub const DEFAULT_MAX_MEMORY_MB: u64 = 100;

/// Inputs below this size bypass the memory check entirely; most RAW files
/// are 10-50 MiB and must never trip the limit.
pub const MEMORY_CHECK_THRESHOLD: u64 = 200 * 1024 * 1024;

// =============================================================================
// ExtractionOptions
// =============================================================================

/// Options for the best-match extraction pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionOptions {
    /// Lower bound of the preferred preview size.
    pub target_min_size: u64,
    /// Upper bound of the preferred preview size.
    pub target_max_size: u64,
    /// Quality tier to prefer when ranking candidates of equal fit.
    pub preferred_quality: PreviewQuality,
    /// Wall-clock deadline, checked at pipeline checkpoints.
    pub timeout: Duration,
    /// Limit in MiB on allocations attributable to this call.
    pub max_memory_mb: u64,
    /// When true, require a complete SOI..EOI stream; when false, only the
    /// SOI marker is checked before emission.
    pub strict_validation: bool,
    /// Reserved; accepted but not acted on.
    pub include_metadata: bool,
    /// Reserved; accepted but not acted on.
    pub use_cache: bool,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        ExtractionOptions {
            target_min_size: DEFAULT_TARGET_MIN_SIZE,
            target_max_size: DEFAULT_TARGET_MAX_SIZE,
            preferred_quality: PreviewQuality::Preview,
            timeout: DEFAULT_TIMEOUT,
            max_memory_mb: DEFAULT_MAX_MEMORY_MB,
            strict_validation: true,
            include_metadata: false,
            use_cache: false,
        }
    }
}

impl ExtractionOptions {
    /// Memory limit in bytes.
    #[inline]
    pub fn max_memory_bytes(&self) -> u64 {
        self.max_memory_mb.saturating_mul(1024 * 1024)
    }
}

// =============================================================================
// SelectOptions
// =============================================================================

/// Options for the position-indexed medium/full extraction operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOptions {
    /// Wall-clock deadline, checked at pipeline checkpoints.
    pub timeout: Duration,
    /// When true, require a complete SOI..EOI stream before emission.
    pub strict_validation: bool,
}

impl Default for SelectOptions {
    fn default() -> Self {
        SelectOptions {
            timeout: DEFAULT_TIMEOUT,
            strict_validation: true,
        }
    }
}

/// Whether `size` falls in the default 200 KiB..3 MiB target range.
///
/// Vendor parsers score candidates against the fixed default range so the
/// candidate list is reproducible regardless of caller options; the caller's
/// range only drives final selection.
#[inline]
pub(crate) fn in_target_range(size: u64) -> bool {
    (DEFAULT_TARGET_MIN_SIZE..=DEFAULT_TARGET_MAX_SIZE).contains(&size)
}

// =============================================================================
// Tests
// =============================================================================
