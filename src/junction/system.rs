use super::cigar::CigarWalker;
use super::entry::Junction;
use super::{IntronKey, Strandedness};
use crate::error::Error;
use crate::io::alignment::{AlignmentRecord, RefSeq};
use crate::stats::{IngestStats, QueryLengthStats, SplicedAlignmentMap};
use log::{debug, info, warn};
use std::collections::HashMap;

/// Handle to a junction stored in a [`JunctionSystem`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JunctionId(pub(crate) usize);

impl JunctionId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Content-addressed store of distinct junctions.
///
/// Junctions live in an arena and are found by [`IntronKey`] through a hash
/// index. A separate ordered handle sequence records insertion order (or
/// sorted order after [`JunctionSystem::sort`]); every pass and every writer
/// walks that sequence.
#[derive(Debug, Default, Clone)]
pub struct JunctionSystem {
    arena: Vec<Junction>,
    index: HashMap<IntronKey, JunctionId>,
    order: Vec<JunctionId>,
    /// Reference sequences, sorted by index
    refs: Vec<RefSeq>,
    query_lengths: QueryLengthStats,
}

impl JunctionSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store for alignments against `refs`
    pub fn with_references(refs: Vec<RefSeq>) -> Self {
        let mut system = Self::new();
        for reference in refs {
            system.register_reference(reference);
        }
        system
    }

    pub fn references(&self) -> &[RefSeq] {
        &self.refs
    }

    pub fn reference(&self, ref_id: usize) -> Option<&RefSeq> {
        self.refs
            .binary_search_by_key(&ref_id, |r| r.index)
            .ok()
            .map(|i| &self.refs[i])
    }

    /// Add a reference if its index is not yet known
    pub fn register_reference(&mut self, reference: RefSeq) {
        match self.refs.binary_search_by_key(&reference.index, |r| r.index) {
            Ok(i) => {
                let existing = &self.refs[i];
                if existing.name != reference.name || existing.length != reference.length {
                    warn!(
                        "Reference {} is {} ({} bp) here but {} ({} bp) elsewhere; keeping the first",
                        reference.index,
                        existing.name,
                        existing.length,
                        reference.name,
                        reference.length
                    );
                }
            }
            Err(i) => self.refs.insert(i, reference),
        }
    }

    pub fn set_query_length_stats(&mut self, stats: QueryLengthStats) {
        self.query_lengths = stats;
    }

    pub fn query_length_stats(&self) -> &QueryLengthStats {
        &self.query_lengths
    }

    /// Number of distinct junctions
    pub fn size(&self) -> usize {
        debug_assert_eq!(self.index.len(), self.order.len());
        debug_assert_eq!(self.arena.len(), self.order.len());
        self.index.len()
    }

    pub fn len(&self) -> usize {
        self.size()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Record one observation of `key`.
    ///
    /// Creates the junction with support 1 on first sight; afterwards bumps
    /// support and widens the flanks.
    pub fn insert_or_merge(
        &mut self,
        key: IntronKey,
        left_flank_start: i64,
        right_flank_end: i64,
    ) -> &mut Junction {
        let id = match self.index.get(&key) {
            Some(&id) => {
                self.arena[id.0].add_observation(left_flank_start, right_flank_end);
                id
            }
            None => self.push(Junction::new(key, left_flank_start, right_flank_end)),
        };
        &mut self.arena[id.0]
    }

    fn push(&mut self, junction: Junction) -> JunctionId {
        let id = JunctionId(self.arena.len());
        self.index.insert(*junction.key(), id);
        self.arena.push(junction);
        self.order.push(id);
        id
    }

    /// Add a fully formed junction, merging it into an existing one with the
    /// same key.
    pub fn insert_junction(&mut self, junction: Junction) -> JunctionId {
        match self.index.get(junction.key()) {
            Some(&id) => {
                let existing = &mut self.arena[id.0];
                existing.extend_flanks(junction.left_flank_start(), junction.right_flank_end());
                existing.add_support(junction.support());
                let anchor = existing.max_min_anchor().max(junction.max_min_anchor());
                existing.set_max_min_anchor(anchor);
                id
            }
            None => self.push(junction),
        }
    }

    pub fn lookup(&self, key: &IntronKey) -> Option<&Junction> {
        self.index.get(key).map(|id| &self.arena[id.0])
    }

    pub fn lookup_mut(&mut self, key: &IntronKey) -> Option<&mut Junction> {
        self.index.get(key).map(|id| &mut self.arena[id.0])
    }

    pub fn get(&self, id: JunctionId) -> Option<&Junction> {
        self.arena.get(id.0)
    }

    pub fn get_mut(&mut self, id: JunctionId) -> Option<&mut Junction> {
        self.arena.get_mut(id.0)
    }

    /// Handles in sequence order
    pub fn ids(&self) -> &[JunctionId] {
        &self.order
    }

    /// Junctions in sequence order
    pub fn junctions(&self) -> impl Iterator<Item = &Junction> + '_ {
        self.order.iter().map(|id| &self.arena[id.0])
    }

    /// Mutable access to every junction, in no particular order
    pub fn junctions_mut(&mut self) -> impl Iterator<Item = &mut Junction> + '_ {
        self.arena.iter_mut()
    }

    /// Handle sequence alongside mutable junction storage
    pub(crate) fn split_mut(&mut self) -> (&[JunctionId], &mut [Junction]) {
        (&self.order, &mut self.arena)
    }

    /// Handles of the junctions on `ref_id`, in sequence order
    pub fn select_ids_by_reference(&self, ref_id: usize) -> Vec<JunctionId> {
        self.order
            .iter()
            .copied()
            .filter(|id| self.arena[id.0].key().ref_id == ref_id)
            .collect()
    }

    /// Junctions on `ref_id`, in sequence order
    pub fn select_by_reference(&self, ref_id: usize) -> Vec<&Junction> {
        self.junctions()
            .filter(|j| j.key().ref_id == ref_id)
            .collect()
    }

    /// Combine another call set into this one.
    ///
    /// Each junction of `other` counts as a single observation here: new keys
    /// start at support 1 and existing keys gain 1. Read names, coverage and
    /// grouping flags are not carried over; splice-site classification is.
    pub fn append(&mut self, other: &JunctionSystem) {
        for reference in &other.refs {
            self.register_reference(reference.clone());
        }

        let before = self.size();
        for junction in other.junctions() {
            let merged = self.insert_or_merge(
                *junction.key(),
                junction.left_flank_start(),
                junction.right_flank_end(),
            );
            if merged.splice_site.is_none() {
                merged.splice_site = junction.splice_site;
            }
        }
        debug!(
            "Appended {} junctions ({} new)",
            other.size(),
            self.size() - before
        );
    }

    /// Reorder the sequence by reference, start, end and strand
    pub fn sort(&mut self) {
        let arena = &self.arena;
        self.order.sort_by_key(|id| arena[id.0].key().sort_key());
    }

    /// Whether the sequence is ordered by reference then start
    pub fn is_sorted(&self) -> bool {
        self.order.windows(2).all(|w| {
            let a = self.arena[w[0].0].key();
            let b = self.arena[w[1].0].key();
            (a.ref_id, a.start) <= (b.ref_id, b.start)
        })
    }

    /// Extract every junction in `record` into the store.
    ///
    /// Returns the number of junctions the alignment contained.
    pub fn add_junctions(
        &mut self,
        record: &AlignmentRecord,
        strandedness: Strandedness,
        stats: &mut IngestStats,
    ) -> usize {
        stats.total_alignments += 1;
        stats.query_lengths.record(record.query_length);

        let ref_length = self.reference(record.ref_id).map(|r| r.length);
        let strand = strandedness.strand_for(record.is_reverse);
        let walker = CigarWalker::new(
            &record.cigar,
            record.ref_id,
            ref_length,
            record.position,
            strand,
        );

        let mut found = 0;
        for observation in walker {
            self.insert_or_merge(
                observation.key,
                observation.left_flank_start,
                observation.right_flank_end,
            )
            .add_read_name(record.name.as_str());
            found += 1;
        }

        if found > 0 {
            stats.spliced_alignments += 1;
            stats.junction_observations += found as u64;
            stats.spliced.record(&record.name);
        }
        found
    }

    /// Feed a stream of alignments into the store
    pub fn ingest<I>(
        &mut self,
        alignments: I,
        strandedness: Strandedness,
        stats: &mut IngestStats,
    ) -> Result<(), Error>
    where
        I: IntoIterator<Item = Result<AlignmentRecord, Error>>,
    {
        for record in alignments {
            let record = record?;
            self.add_junctions(&record, strandedness, stats);
            if stats.total_alignments % 1_000_000 == 0 {
                debug!(
                    "Processed {} alignments, {} junctions so far",
                    stats.total_alignments,
                    self.size()
                );
            }
        }

        info!(
            "Found {} distinct junctions in {} spliced alignments",
            self.size(),
            stats.spliced_alignments
        );
        Ok(())
    }

    /// Compute the multiple-mapping score of every junction
    pub fn calc_multiple_mapping_stats(&mut self, spliced: &SplicedAlignmentMap) {
        for junction in self.junctions_mut() {
            junction.calc_multiple_mapping_score(spliced);
        }
        debug!("Computed multiple-mapping scores for {} junctions", self.size());
    }
}
