//! Position-indexed medium/full preview selection.
//!
//! Consumers wanting "the medium preview" or "the full preview" cannot rely
//! on priorities alone: the candidate order per format is stable, so fixed
//! indices work for most formats. Nikon bodies are the exception: several
//! recent models emit their previews in unexpected order, so those select by
//! size instead ("smart" mode: full = largest, medium = second-largest).

use crate::format::{nef, RawFormat};
use crate::preview::PreviewInfo;

// =============================================================================
// PreviewMapping
// =============================================================================

/// Which candidate indices serve the full and medium consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewMapping {
    /// Candidate index for the full preview.
    pub full_index: usize,
    /// Candidate index for the medium preview.
    pub medium_index: usize,
    /// When true, ignore the indices and select by size.
    pub smart: bool,
}

/// Size-based selection, used where candidate order is unreliable.
const SMART: PreviewMapping = PreviewMapping { full_index: 0, medium_index: 1, smart: true };

/// Traditional candidate order: full first, medium second.
const POSITIONAL: PreviewMapping = PreviewMapping { full_index: 0, medium_index: 1, smart: false };

/// Per-format position mappings.
///
/// Sony lists THMB-like candidates first (full preview at index 2, medium at
/// 0); CR3 enumerates THMB, PRVW, MDAT in order (full = MDAT at 2, medium =
/// PRVW at 1); the rest follow the traditional order.
pub fn format_mapping(format: RawFormat) -> PreviewMapping {
    match format {
        RawFormat::Arw => PreviewMapping { full_index: 2, medium_index: 0, smart: false },
        RawFormat::Cr3 => PreviewMapping { full_index: 2, medium_index: 1, smart: false },
        RawFormat::Cr2
        | RawFormat::Dng
        | RawFormat::Raf
        | RawFormat::Orf
        | RawFormat::Rw2 => POSITIONAL,
        // NEF goes through nikon_mapping; anything else gets the default
        _ => POSITIONAL,
    }
}

/// Nikon models whose candidate order is reliable enough for positional
/// selection. Every other model (Z 9, Z 8, Z 7II, Z 6III, Z 6II, Z 5, Z fc,
/// Z 30, D850, D780, D6, and anything unknown) selects by size.
const POSITIONAL_NIKON_MODELS: &[&str] =
    &["Z 6", "D750", "D810", "D610", "D7500", "D7200", "D5600", "D3500"];

/// Mapping for a Nikon body, given the Model tag value.
///
/// The leading "NIKON" vendor prefix is stripped and the remainder matched
/// exactly, so "Z 6III" never falls into the "Z 6" bucket.
pub fn nikon_mapping(model: &str) -> PreviewMapping {
    let model = model.trim();
    let model = model
        .strip_prefix("NIKON CORPORATION")
        .or_else(|| model.strip_prefix("NIKON"))
        .unwrap_or(model)
        .trim();

    if POSITIONAL_NIKON_MODELS.contains(&model) {
        POSITIONAL
    } else {
        SMART
    }
}

// =============================================================================
// Selection
// =============================================================================

/// The mapping for `format`, resolving NEF through the camera model table.
fn resolve_mapping(data: &[u8], format: RawFormat) -> PreviewMapping {
    if format == RawFormat::Nef {
        let model = nef::camera_model(data).unwrap_or_default();
        nikon_mapping(&model)
    } else {
        format_mapping(format)
    }
}

/// Largest candidate by byte size; ties keep the earliest candidate.
fn largest(previews: &[PreviewInfo]) -> Option<&PreviewInfo> {
    let mut best: Option<&PreviewInfo> = None;
    for preview in previews {
        if best.map_or(true, |current| preview.size > current.size) {
            best = Some(preview);
        }
    }
    best
}

/// Second-largest candidate by byte size; with fewer than two candidates,
/// the first one.
fn second_largest(previews: &[PreviewInfo]) -> Option<&PreviewInfo> {
    if previews.len() <= 1 {
        return previews.first();
    }
    let mut sorted: Vec<&PreviewInfo> = previews.iter().collect();
    sorted.sort_by(|a, b| b.size.cmp(&a.size));
    sorted.get(1).copied()
}

/// Select the medium preview from `previews` for `format`.
///
/// Out-of-range indices fall back to candidate 1, then candidate 0.
pub fn select_medium(data: &[u8], format: RawFormat, previews: &[PreviewInfo]) -> Option<PreviewInfo> {
    if previews.is_empty() {
        return None;
    }
    let mapping = resolve_mapping(data, format);

    let selected = if mapping.smart {
        second_largest(previews)
    } else if mapping.medium_index < previews.len() {
        previews.get(mapping.medium_index)
    } else {
        previews.get(1).or_else(|| previews.first())
    };

    selected.cloned()
}

/// Select the full preview from `previews` for `format`.
///
/// Out-of-range indices fall back to candidate 0.
pub fn select_full(data: &[u8], format: RawFormat, previews: &[PreviewInfo]) -> Option<PreviewInfo> {
    if previews.is_empty() {
        return None;
    }
    let mapping = resolve_mapping(data, format);

    let selected = if mapping.smart {
        largest(previews)
    } else if mapping.full_index < previews.len() {
        previews.get(mapping.full_index)
    } else {
        previews.first()
    };

    selected.cloned()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn previews_of_sizes(sizes: &[u64]) -> Vec<PreviewInfo> {
        sizes
            .iter()
            .enumerate()
            .map(|(i, &size)| PreviewInfo {
                offset: 1000 + i as u64 * 10_000_000,
                size,
                ..Default::default()
            })
            .collect()
    }

    // -------------------------------------------------------------------------
    // Mapping tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_format_mappings() {
        assert_eq!(
            format_mapping(RawFormat::Arw),
            PreviewMapping { full_index: 2, medium_index: 0, smart: false }
        );
        assert_eq!(
            format_mapping(RawFormat::Cr3),
            PreviewMapping { full_index: 2, medium_index: 1, smart: false }
        );
        assert_eq!(format_mapping(RawFormat::Cr2), POSITIONAL);
        assert_eq!(format_mapping(RawFormat::Raf), POSITIONAL);
    }

    #[test]
    fn test_nikon_positional_models() {
        for model in ["Z 6", "D750", "D810", "D610", "D7500", "D7200", "D5600", "D3500"] {
            assert!(!nikon_mapping(model).smart, "{model} should be positional");
        }
        assert!(!nikon_mapping("NIKON Z 6").smart);
        assert!(!nikon_mapping("NIKON CORPORATION D750").smart);
    }

    #[test]
    fn test_nikon_smart_models() {
        for model in ["Z 9", "Z 8", "Z 7II", "Z 6III", "Z 6II", "Z 5", "Z fc", "Z 30", "D850", "D780", "D6"] {
            assert!(nikon_mapping(model).smart, "{model} should be smart");
        }
        assert!(nikon_mapping("NIKON Z 9").smart);
        // Unknown models default to smart selection
        assert!(nikon_mapping("D4").smart);
        assert!(nikon_mapping("").smart);
    }

    #[test]
    fn test_z6iii_does_not_match_z6() {
        // Exact matching: the Z 6III must not inherit the Z 6 mapping
        assert!(nikon_mapping("NIKON Z 6III").smart);
        assert!(!nikon_mapping("NIKON Z 6").smart);
    }

    // -------------------------------------------------------------------------
    // Selection tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_positional_selection() {
        let previews = previews_of_sizes(&[3_000_000, 500_000, 8_000_000]);

        // CR2: full = 0, medium = 1
        let full = select_full(&[], RawFormat::Cr2, &previews).unwrap();
        assert_eq!(full.size, 3_000_000);
        let medium = select_medium(&[], RawFormat::Cr2, &previews).unwrap();
        assert_eq!(medium.size, 500_000);

        // ARW: full = 2, medium = 0
        let full = select_full(&[], RawFormat::Arw, &previews).unwrap();
        assert_eq!(full.size, 8_000_000);
        let medium = select_medium(&[], RawFormat::Arw, &previews).unwrap();
        assert_eq!(medium.size, 3_000_000);
    }

    #[test]
    fn test_positional_fallbacks() {
        let one = previews_of_sizes(&[1_000_000]);

        // ARW full index 2 is out of range: fall back to candidate 0
        let full = select_full(&[], RawFormat::Arw, &one).unwrap();
        assert_eq!(full.size, 1_000_000);

        // CR2 medium index 1 out of range: candidate 1 missing, use 0
        let medium = select_medium(&[], RawFormat::Cr2, &one).unwrap();
        assert_eq!(medium.size, 1_000_000);

        assert!(select_full(&[], RawFormat::Cr2, &[]).is_none());
        assert!(select_medium(&[], RawFormat::Cr2, &[]).is_none());
    }

    #[test]
    fn test_smart_selection_for_unknown_nikon() {
        // No model tag in an empty buffer: NEF defaults to smart
        let previews = previews_of_sizes(&[5 * 1024, 2 * 1024 * 1024, 8 * 1024 * 1024]);

        let full = select_full(&[], RawFormat::Nef, &previews).unwrap();
        assert_eq!(full.size, 8 * 1024 * 1024);

        let medium = select_medium(&[], RawFormat::Nef, &previews).unwrap();
        assert_eq!(medium.size, 2 * 1024 * 1024);
    }

    #[test]
    fn test_smart_selection_single_candidate() {
        let one = previews_of_sizes(&[123_456]);
        let medium = select_medium(&[], RawFormat::Nef, &one).unwrap();
        assert_eq!(medium.size, 123_456);
        let full = select_full(&[], RawFormat::Nef, &one).unwrap();
        assert_eq!(full.size, 123_456);
    }
}
