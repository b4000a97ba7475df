//! Rendition selection policy: highest advertised bandwidth wins.

use super::VariantDescriptor;

/// Selects the rendition with the maximum bandwidth (missing bandwidth
/// counts as zero). Ties keep the earliest entry: the scan only replaces the
/// current best on a strictly greater bandwidth, so the result does not
/// depend on any sort's stability.
pub fn select_variant(variants: &[VariantDescriptor]) -> Option<&VariantDescriptor> {
    let mut best: Option<&VariantDescriptor> = None;
    for v in variants {
        match best {
            Some(b) if v.bandwidth.unwrap_or(0) <= b.bandwidth.unwrap_or(0) => {}
            _ => best = Some(v),
        }
    }
    best
}
