/// Unspliced alignments crossing junction boundaries
use super::entry::BoundaryCrossings;
use super::system::{JunctionId, JunctionSystem};
use crate::error::Error;
use crate::io::alignment::AlignmentRecord;
use log::info;
use std::collections::HashMap;

/// Junction boundaries on one reference, sorted by position
#[derive(Default)]
struct BoundaryIndex {
    /// (intron start, junction)
    donors: Vec<(i64, JunctionId)>,
    /// (intron end, junction)
    acceptors: Vec<(i64, JunctionId)>,
}

impl BoundaryIndex {
    fn sort(&mut self) {
        self.donors.sort_unstable();
        self.acceptors.sort_unstable();
    }
}

/// Entries of a sorted boundary list with position in `[lo, hi]`
fn in_range(list: &[(i64, JunctionId)], lo: i64, hi: i64) -> &[(i64, JunctionId)] {
    let from = list.partition_point(|&(pos, _)| pos < lo);
    let to = list.partition_point(|&(pos, _)| pos <= hi);
    &list[from..to.max(from)]
}

impl JunctionSystem {
    /// Count unspliced alignments running across each junction boundary.
    ///
    /// An alignment crosses the donor if it covers both `start - 1` and
    /// `start`, and the acceptor if it covers both `end` and `end + 1`.
    /// Spliced alignments are skipped. Input order does not matter.
    /// Returns the number of unspliced alignments seen.
    pub fn find_flanking_alignments<I>(&mut self, alignments: I) -> Result<u64, Error>
    where
        I: IntoIterator<Item = Result<AlignmentRecord, Error>>,
    {
        let mut index: HashMap<usize, BoundaryIndex> = HashMap::new();
        for &id in self.ids() {
            if let Some(junction) = self.get(id) {
                let key = junction.key();
                let entry = index.entry(key.ref_id).or_default();
                entry.donors.push((key.start, id));
                entry.acceptors.push((key.end, id));
            }
        }
        index.values_mut().for_each(BoundaryIndex::sort);

        for junction in self.junctions_mut() {
            junction.boundary_crossings = Some(BoundaryCrossings::default());
        }

        let mut unspliced = 0u64;
        let mut crossing = 0u64;
        for record in alignments {
            let record = record?;
            if record.is_spliced() {
                continue;
            }
            unspliced += 1;

            let Some(bounds) = index.get(&record.ref_id) else {
                continue;
            };
            let first = record.position;
            let last = record.reference_end();

            for &(_, id) in in_range(&bounds.donors, first + 1, last) {
                if let Some(c) = self.get_mut(id).and_then(|j| j.boundary_crossings.as_mut()) {
                    c.donor += 1;
                    crossing += 1;
                }
            }
            for &(_, id) in in_range(&bounds.acceptors, first, last - 1) {
                if let Some(c) = self.get_mut(id).and_then(|j| j.boundary_crossings.as_mut()) {
                    c.acceptor += 1;
                    crossing += 1;
                }
            }
        }

        info!("Found {crossing} boundary crossings in {unspliced} unspliced alignments");
        Ok(unspliced)
    }
}
