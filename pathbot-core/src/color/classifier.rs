//! Tolerance-band color classification
//!
//! A reading matches a label when every channel lies strictly within
//! `tolerance` of the label's reference. Zero matches and several matches
//! are both ordinary results; callers decide what they mean.

use super::profile::{ColorId, ColorProfile, MAX_COLORS};
use super::sample::ColorSample;

/// Set of color labels, stored as a bitset over [`ColorId`]s
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ColorSet(u16);

const _: () = assert!(MAX_COLORS <= u16::BITS as usize);

impl ColorSet {
    /// Empty set
    pub const EMPTY: Self = Self(0);

    /// Set holding a single id
    pub const fn single(id: ColorId) -> Self {
        Self(1 << id.index())
    }

    /// Set holding `id` if present, otherwise the empty set
    pub fn from_option(id: Option<ColorId>) -> Self {
        id.map(Self::single).unwrap_or(Self::EMPTY)
    }

    /// Add an id
    pub fn insert(&mut self, id: ColorId) {
        self.0 |= 1 << id.index();
    }

    /// Check membership
    pub const fn contains(&self, id: ColorId) -> bool {
        self.0 & (1 << id.index()) != 0
    }

    /// Check if no label is present
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Number of labels
    pub const fn len(&self) -> u32 {
        self.0.count_ones()
    }

    /// Union of two sets
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Set minus one id
    pub const fn without(self, id: ColorId) -> Self {
        Self(self.0 & !(1 << id.index()))
    }

    /// Check if the sets share any label
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Iterate over members in id order
    pub fn iter(&self) -> impl Iterator<Item = ColorId> + '_ {
        (0..MAX_COLORS as u8)
            .filter_map(ColorId::new)
            .filter(move |id| self.contains(*id))
    }
}

impl FromIterator<ColorId> for ColorSet {
    fn from_iter<I: IntoIterator<Item = ColorId>>(iter: I) -> Self {
        let mut set = Self::EMPTY;
        for id in iter {
            set.insert(id);
        }
        set
    }
}

/// Report whether two label sets share any element
pub fn overlaps(a: ColorSet, b: ColorSet) -> bool {
    a.overlaps(&b)
}

/// Classifies readings against a profile with a fixed per-channel tolerance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ColorClassifier {
    tolerance: u16,
}

impl ColorClassifier {
    /// Create a classifier
    pub const fn new(tolerance: u16) -> Self {
        Self { tolerance }
    }

    /// Labels whose reference lies within tolerance on all three channels
    pub fn classify(&self, sample: ColorSample, profile: &ColorProfile) -> ColorSet {
        profile
            .iter()
            .filter(|(_, entry)| self.matches(sample, entry.reference))
            .map(|(id, _)| id)
            .collect()
    }

    /// Check a reading against one reference
    pub fn matches(&self, sample: ColorSample, reference: ColorSample) -> bool {
        sample
            .channels()
            .iter()
            .zip(reference.channels().iter())
            .all(|(&s, &r)| s.abs_diff(r) < self.tolerance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{BLACK, WHITE, YELLOW_LINE};
    use proptest::prelude::*;

    fn course_profile() -> ColorProfile {
        let mut profile = ColorProfile::new();
        profile.insert(WHITE, ColorSample::new(72, 86, 100)).unwrap();
        profile.insert("red", ColorSample::new(68, 23, 40)).unwrap();
        profile.insert(YELLOW_LINE, ColorSample::new(39, 35, 10)).unwrap();
        profile.insert(BLACK, ColorSample::new(0, 0, 0)).unwrap();
        profile
    }

    #[test]
    fn test_classify_single_match() {
        let profile = course_profile();
        let classifier = ColorClassifier::new(8);

        let red = profile.id("red").unwrap();
        let result = classifier.classify(ColorSample::new(70, 24, 39), &profile);
        assert_eq!(result, ColorSet::single(red));

        let black = profile.id(BLACK).unwrap();
        let result = classifier.classify(ColorSample::new(1, 1, 1), &profile);
        assert_eq!(result, ColorSet::single(black));
    }

    #[test]
    fn test_band_edges_are_exclusive() {
        let profile = course_profile();
        let classifier = ColorClassifier::new(8);

        // 68 + 8 is on the edge and must not match
        assert!(classifier
            .classify(ColorSample::new(76, 23, 40), &profile)
            .is_empty());
        assert!(!classifier
            .classify(ColorSample::new(75, 23, 40), &profile)
            .is_empty());
    }

    #[test]
    fn test_one_channel_out_of_band_rejects() {
        let profile = course_profile();
        let classifier = ColorClassifier::new(8);
        assert!(classifier
            .classify(ColorSample::new(68, 23, 60), &profile)
            .is_empty());
    }

    #[test]
    fn test_ambiguous_match() {
        let mut profile = ColorProfile::new();
        let a = profile.insert("a", ColorSample::new(10, 10, 10)).unwrap();
        let b = profile.insert("b", ColorSample::new(14, 14, 14)).unwrap();

        let result = ColorClassifier::new(8).classify(ColorSample::new(12, 12, 12), &profile);
        assert_eq!(result.len(), 2);
        assert!(result.contains(a));
        assert!(result.contains(b));
    }

    #[test]
    fn test_empty_profile_never_matches() {
        let result = ColorClassifier::new(20).classify(ColorSample::new(1, 2, 3), &ColorProfile::new());
        assert!(result.is_empty());
    }

    #[test]
    fn test_overlaps() {
        let a = ColorId::new(1).unwrap();
        let b = ColorId::new(2).unwrap();

        assert!(!overlaps(ColorSet::EMPTY, ColorSet::EMPTY));
        assert!(!overlaps(ColorSet::single(a), ColorSet::EMPTY));
        assert!(!overlaps(ColorSet::single(a), ColorSet::single(b)));
        assert!(overlaps(
            ColorSet::single(a).union(ColorSet::single(b)),
            ColorSet::single(b)
        ));
    }

    #[test]
    fn test_set_iter_and_without() {
        let ids: ColorSet = [0u8, 3, 7]
            .iter()
            .filter_map(|&i| ColorId::new(i))
            .collect();
        let three = ColorId::new(3).unwrap();

        assert_eq!(ids.iter().count(), 3);
        assert!(!ids.without(three).contains(three));
        assert_eq!(ids.without(three).len(), 2);
    }

    fn arb_sample() -> impl Strategy<Value = ColorSample> {
        (0u16..=255, 0u16..=255, 0u16..=255).prop_map(|(r, g, b)| ColorSample::new(r, g, b))
    }

    proptest! {
        #[test]
        fn prop_exact_reference_always_matches(
            reference in arb_sample(),
            tolerance in 1u16..=20,
        ) {
            let mut profile = course_profile();
            let id = profile.insert("probe", reference).unwrap();
            let result = ColorClassifier::new(tolerance).classify(reference, &profile);
            prop_assert!(result.contains(id));
        }

        #[test]
        fn prop_far_sample_matches_nothing(
            references in proptest::collection::vec(arb_sample(), 1..8),
            offset in (0u16..=300, 0u16..=300, 0u16..=300),
            tolerance in 4u16..=20,
        ) {
            let mut profile = ColorProfile::new();
            for (i, reference) in references.iter().enumerate() {
                let label = ["c0", "c1", "c2", "c3", "c4", "c5", "c6", "c7"][i];
                profile.insert(label, *reference).unwrap();
            }

            // Every channel sits at least 2*tolerance above the largest reference
            let floor = 255 + 2 * tolerance;
            let sample = ColorSample::new(floor + offset.0, floor + offset.1, floor + offset.2);
            let result = ColorClassifier::new(tolerance).classify(sample, &profile);
            prop_assert!(result.is_empty());
        }
    }
}
