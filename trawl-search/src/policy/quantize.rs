//! Count tiers for sources that only accept fixed result limits.

/// Rounds `count` up to the smallest tier that holds it.
///
/// Counts above the top tier use the top tier; callers truncate the returned
/// set back to what was asked for. `tiers` must be ascending.
pub fn quantize_count(count: usize, tiers: &[usize]) -> usize {
    tiers
        .iter()
        .copied()
        .find(|tier| count <= *tier)
        .or_else(|| tiers.last().copied())
        .unwrap_or(count)
}
