/// Junction coverage from per-reference depth batches
use super::entry::{CoverageSummary, Junction};
use super::system::JunctionSystem;
use crate::error::Error;
use crate::io::depth::DepthSource;
use log::{debug, info};

/// Mean and minimum depth over `[start, end]`, clamped to `depths`
fn window_stats(depths: &[u32], start: i64, end: i64) -> Option<(u64, u32, usize)> {
    let start = start.max(0);
    let end = end.min(depths.len() as i64 - 1);
    if start > end {
        return None;
    }
    let window = &depths[start as usize..=end as usize];
    let sum = window.iter().map(|&d| d as u64).sum();
    let min = window.iter().copied().min().unwrap_or(0);
    Some((sum, min, window.len()))
}

/// Summarise the depth around `junction`.
///
/// The exonic windows are the `window` bases before the intron start and
/// after the intron end. Positions outside the reference are skipped.
pub fn summarise_coverage(junction: &Junction, depths: &[u32], window: usize) -> CoverageSummary {
    let window = window.max(1) as i64;
    let start = junction.intron_start();
    let end = junction.intron_end();
    let depth_at = |pos: i64| {
        usize::try_from(pos)
            .ok()
            .and_then(|p| depths.get(p).copied())
            .unwrap_or(0)
    };

    let left = window_stats(depths, start - window, start - 1);
    let right = window_stats(depths, end + 1, end + window);

    let (flank_sum, flank_len) = [left, right]
        .iter()
        .flatten()
        .fold((0u64, 0usize), |(s, n), &(sum, _, len)| (s + sum, n + len));
    let min_flank_depth = [left, right]
        .iter()
        .flatten()
        .map(|&(_, min, _)| min)
        .min()
        .unwrap_or(0);
    let flank_mean = if flank_len == 0 {
        0.0
    } else {
        flank_sum as f64 / flank_len as f64
    };

    let intron_mean = window_stats(depths, start, end)
        .map(|(sum, _, len)| sum as f64 / len as f64)
        .unwrap_or(0.0);

    let drop_ratio = if flank_mean > 0.0 {
        (flank_mean - intron_mean) / flank_mean
    } else {
        0.0
    };

    CoverageSummary {
        donor_depth: depth_at(start - 1),
        acceptor_depth: depth_at(end + 1),
        min_flank_depth,
        flank_mean,
        intron_mean,
        drop_ratio,
    }
}

impl JunctionSystem {
    /// Exonic window used for coverage: the override if given, otherwise the
    /// rounded mean query length, and never less than 1.
    pub fn coverage_window(&self, window: Option<usize>) -> usize {
        window
            .filter(|&w| w > 0)
            .unwrap_or_else(|| self.query_length_stats().mean().round() as usize)
            .max(1)
    }

    /// Set the coverage summary of every junction on a reference the depth
    /// source yields.
    ///
    /// Only one depth batch is held at a time. Junctions on references the
    /// source never yields keep no coverage. Returns the number of junctions
    /// that received a summary.
    pub fn calc_coverage<D: DepthSource + ?Sized>(
        &mut self,
        source: &mut D,
        window: Option<usize>,
    ) -> Result<usize, Error> {
        let window = self.coverage_window(window);
        info!("Calculating junction coverage with a {window} bp window");

        let mut covered = 0;
        while let Some(batch) = source.next_batch()? {
            let ids = self.select_ids_by_reference(batch.ref_index);
            debug!(
                "Reference {}: {} bases, {} junctions",
                batch.ref_index,
                batch.depths.len(),
                ids.len()
            );
            for id in ids {
                if let Some(junction) = self.get_mut(id) {
                    junction.coverage = Some(summarise_coverage(junction, &batch.depths, window));
                    covered += 1;
                }
            }
        }

        info!("Calculated coverage for {covered} of {} junctions", self.size());
        Ok(covered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::depth::{DepthBatch, MemoryDepthSource};
    use crate::junction::{IntronKey, Strand};
    use crate::stats::QueryLengthStats;

    fn junction(start: i64, end: i64) -> Junction {
        Junction::new(IntronKey::new(0, start, end, Strand::Unknown), start - 2, end + 2)
    }

    #[test]
    fn test_summary_values() {
        //            0  1  2  3  4  5  6  7  8  9
        let depths = [4, 6, 8, 1, 1, 1, 1, 5, 3, 2];
        // intron 3..=6, window 2: left [1,2], right [7,8]
        let summary = summarise_coverage(&junction(3, 6), &depths, 2);

        assert_eq!(summary.donor_depth, 8);
        assert_eq!(summary.acceptor_depth, 5);
        assert_eq!(summary.min_flank_depth, 3);
        assert!((summary.flank_mean - 5.5).abs() < 1e-9);
        assert!((summary.intron_mean - 1.0).abs() < 1e-9);
        assert!((summary.drop_ratio - 4.5 / 5.5).abs() < 1e-9);
    }

    #[test]
    fn test_summary_clamped_at_reference_edges() {
        let depths = [2, 0, 0, 0, 3];
        // left window [-9, 0] clamps to [0], right window [4, 13] clamps to [4]
        let summary = summarise_coverage(&junction(1, 3), &depths, 10);
        assert_eq!(summary.donor_depth, 2);
        assert_eq!(summary.acceptor_depth, 3);
        assert_eq!(summary.min_flank_depth, 2);
        assert!((summary.flank_mean - 2.5).abs() < 1e-9);
        assert_eq!(summary.intron_mean, 0.0);
        assert!((summary.drop_ratio - 1.0).abs() < 1e-9);

        // intron at the very start: no left window, donor outside the reference
        let summary = summarise_coverage(&junction(0, 1), &depths, 1);
        assert_eq!(summary.donor_depth, 0);
        assert_eq!(summary.min_flank_depth, 0);
    }

    #[test]
    fn test_summary_uncovered_flanks() {
        let depths = [0u32; 20];
        let summary = summarise_coverage(&junction(5, 10), &depths, 3);
        assert_eq!(summary.flank_mean, 0.0);
        assert_eq!(summary.drop_ratio, 0.0);
    }

    #[test]
    fn test_calc_coverage_per_reference() {
        let mut system = JunctionSystem::new();
        system.insert_or_merge(IntronKey::new(0, 3, 6, Strand::Unknown), 1, 8);
        system.insert_or_merge(IntronKey::new(1, 3, 6, Strand::Unknown), 1, 8);
        system.insert_or_merge(IntronKey::new(2, 3, 6, Strand::Unknown), 1, 8);

        let mut source = MemoryDepthSource::new(vec![
            DepthBatch {
                ref_index: 0,
                depths: vec![4, 6, 8, 1, 1, 1, 1, 5, 3, 2],
            },
            DepthBatch {
                ref_index: 2,
                depths: vec![1; 10],
            },
        ]);
        let covered = system.calc_coverage(&mut source, Some(2)).unwrap();
        assert_eq!(covered, 2);

        let on = |r| {
            system
                .lookup(&IntronKey::new(r, 3, 6, Strand::Unknown))
                .unwrap()
                .coverage
        };
        assert_eq!(on(0).unwrap().donor_depth, 8);
        assert!(on(1).is_none());
        assert_eq!(on(2).unwrap().drop_ratio, 0.0);
    }

    #[test]
    fn test_coverage_window_from_query_lengths() {
        let mut system = JunctionSystem::new();
        assert_eq!(system.coverage_window(None), 1);

        let mut lengths = QueryLengthStats::new();
        lengths.record(100);
        lengths.record(51);
        system.set_query_length_stats(lengths);
        assert_eq!(system.coverage_window(None), 76);
        assert_eq!(system.coverage_window(Some(0)), 76);
        assert_eq!(system.coverage_window(Some(20)), 20);
    }
}
