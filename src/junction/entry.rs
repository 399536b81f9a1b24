use super::splice_site::SpliceSite;
use super::IntronKey;
use crate::stats::SplicedAlignmentMap;

/// Depth profile around a junction, from an unspliced coverage pass
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CoverageSummary {
    /// Depth at the last base before the intron
    pub donor_depth: u32,
    /// Depth at the first base after the intron
    pub acceptor_depth: u32,
    /// Lowest depth in either exonic window
    pub min_flank_depth: u32,
    /// Mean depth over both exonic windows
    pub flank_mean: f64,
    /// Mean depth inside the intron
    pub intron_mean: f64,
    /// `(flank_mean - intron_mean) / flank_mean`, 0 when the flanks are uncovered
    pub drop_ratio: f64,
}

/// Unspliced alignments running across the intron boundaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoundaryCrossings {
    /// Reads covering both the last exonic base and the first intronic base
    pub donor: u32,
    /// Reads covering both the last intronic base and the first exonic base
    pub acceptor: u32,
}

impl BoundaryCrossings {
    pub fn total(&self) -> u32 {
        self.donor + self.acceptor
    }
}

/// A distinct splice junction and the evidence gathered for it.
///
/// Identity is fixed at creation; alignment evidence accumulates through
/// [`Junction::add_observation`] and derived metrics are filled in by the
/// calculation passes of the owning store.
#[derive(Debug, Clone)]
pub struct Junction {
    key: IntronKey,
    left_flank_start: i64,
    right_flank_end: i64,
    support: u32,
    max_min_anchor: i64,
    read_names: Vec<String>,

    pub coverage: Option<CoverageSummary>,
    pub splice_site: Option<SpliceSite>,
    pub boundary_crossings: Option<BoundaryCrossings>,
    pub multiple_mapping_score: Option<f64>,
    pub unique: bool,
    pub primary: bool,
}

impl Junction {
    /// New junction with a single supporting observation
    pub fn new(key: IntronKey, left_flank_start: i64, right_flank_end: i64) -> Self {
        let mut junction = Self::with_support(key, left_flank_start, right_flank_end, 0);
        junction.add_observation(left_flank_start, right_flank_end);
        junction
    }

    /// Junction with explicit support, used when reloading a table
    pub fn with_support(
        key: IntronKey,
        left_flank_start: i64,
        right_flank_end: i64,
        support: u32,
    ) -> Self {
        Self {
            key,
            left_flank_start,
            right_flank_end,
            support,
            max_min_anchor: 0,
            read_names: Vec::new(),
            coverage: None,
            splice_site: None,
            boundary_crossings: None,
            multiple_mapping_score: None,
            unique: false,
            primary: false,
        }
    }

    pub fn key(&self) -> &IntronKey {
        &self.key
    }

    pub fn intron_start(&self) -> i64 {
        self.key.start
    }

    pub fn intron_end(&self) -> i64 {
        self.key.end
    }

    pub fn intron_size(&self) -> i64 {
        self.key.size()
    }

    pub fn left_flank_start(&self) -> i64 {
        self.left_flank_start
    }

    pub fn right_flank_end(&self) -> i64 {
        self.right_flank_end
    }

    /// Bases between the left flank start and the intron
    pub fn left_anchor_len(&self) -> i64 {
        self.key.start - self.left_flank_start
    }

    /// Bases between the intron and the right flank end, inclusive
    pub fn right_anchor_len(&self) -> i64 {
        self.right_flank_end - self.key.end
    }

    pub fn support(&self) -> u32 {
        self.support
    }

    /// Largest, over all supporting alignments, of the shorter anchor
    pub fn max_min_anchor(&self) -> i64 {
        self.max_min_anchor
    }

    pub fn set_max_min_anchor(&mut self, anchor: i64) {
        self.max_min_anchor = anchor;
    }

    /// Names of the reads supporting this junction, in ingest order
    pub fn read_names(&self) -> &[String] {
        &self.read_names
    }

    pub fn add_read_name(&mut self, name: impl Into<String>) {
        self.read_names.push(name.into());
    }

    /// Widen the flanks so they cover `[left_flank_start, right_flank_end]`
    pub fn extend_flanks(&mut self, left_flank_start: i64, right_flank_end: i64) {
        self.left_flank_start = self.left_flank_start.min(left_flank_start);
        self.right_flank_end = self.right_flank_end.max(right_flank_end);
    }

    /// Record one more supporting alignment with the given anchor extent.
    pub fn add_observation(&mut self, left_flank_start: i64, right_flank_end: i64) {
        let min_anchor =
            (self.key.start - left_flank_start).min(right_flank_end - self.key.end);
        self.max_min_anchor = self.max_min_anchor.max(min_anchor);
        self.extend_flanks(left_flank_start, right_flank_end);
        self.support += 1;
    }

    /// Add support without per-alignment anchor information
    pub fn add_support(&mut self, count: u32) {
        self.support += count;
    }

    /// Support divided by the summed multiplicity of the supporting reads.
    ///
    /// A read missing from `spliced` counts once. Returns 0 when the junction
    /// has no recorded read names.
    pub fn calc_multiple_mapping_score(&mut self, spliced: &SplicedAlignmentMap) -> f64 {
        let total: u64 = self
            .read_names
            .iter()
            .map(|name| spliced.multiplicity(name).unwrap_or(1) as u64)
            .sum();
        let score = if total == 0 {
            0.0
        } else {
            self.support as f64 / total as f64
        };
        self.multiple_mapping_score = Some(score);
        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::junction::Strand;

    fn key() -> IntronKey {
        IntronKey::new(0, 100, 199, Strand::Positive)
    }

    #[test]
    fn test_new_junction() {
        let j = Junction::new(key(), 80, 230);
        assert_eq!(j.support(), 1);
        assert_eq!(j.left_flank_start(), 80);
        assert_eq!(j.right_flank_end(), 230);
        assert_eq!(j.left_anchor_len(), 20);
        assert_eq!(j.right_anchor_len(), 31);
        assert_eq!(j.max_min_anchor(), 20);
        assert!(j.coverage.is_none());
        assert!(j.splice_site.is_none());
        assert!(!j.primary && !j.unique);
    }

    #[test]
    fn test_observations_widen_flanks() {
        let mut j = Junction::new(key(), 80, 230);
        j.add_observation(90, 260);
        j.add_observation(50, 210);

        assert_eq!(j.support(), 3);
        assert_eq!(j.left_flank_start(), 50);
        assert_eq!(j.right_flank_end(), 260);
        // min anchors: 20, 10, 11
        assert_eq!(j.max_min_anchor(), 20);
    }

    #[test]
    fn test_extend_flanks_never_shrinks() {
        let mut j = Junction::new(key(), 80, 230);
        j.extend_flanks(90, 220);
        assert_eq!(j.left_flank_start(), 80);
        assert_eq!(j.right_flank_end(), 230);
        assert_eq!(j.support(), 1);
    }

    #[test]
    fn test_multiple_mapping_score() {
        let mut j = Junction::new(key(), 80, 230);
        j.add_observation(80, 230);
        j.add_read_name("a");
        j.add_read_name("b");

        let mut spliced = SplicedAlignmentMap::new();
        spliced.record("a");
        spliced.record("a");
        spliced.record("a");

        // support 2 over multiplicities 3 + 1 (b missing)
        let score = j.calc_multiple_mapping_score(&spliced);
        assert!((score - 0.5).abs() < 1e-9);
        assert_eq!(j.multiple_mapping_score, Some(score));
    }

    #[test]
    fn test_multiple_mapping_score_without_names() {
        let mut j = Junction::with_support(key(), 80, 230, 4);
        assert_eq!(j.calc_multiple_mapping_score(&SplicedAlignmentMap::new()), 0.0);
    }
}
