/// Junction extraction from CIGAR operations
use super::{IntronKey, Strand};
use crate::io::alignment::CigarOp;

/// One reference skip seen in one alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JunctionObservation {
    pub key: IntronKey,
    /// First base of the left anchor (0-based)
    pub left_flank_start: i64,
    /// Last base of the right anchor (0-based, inclusive)
    pub right_flank_end: i64,
}

/// Iterator over the junctions of a single alignment, left to right.
///
/// Each non-empty `N` op yields exactly one observation. The left anchor
/// runs from the start of the current segment (the alignment start, or the
/// end of the previous skip) to the skip. The right anchor runs from the
/// skip up to the next skip, soft clip or end of the CIGAR. A soft clip at
/// the start of a segment moves the left anchor start forward by its length.
///
/// Coordinates are clamped to the reference, and the walk stops once a right
/// anchor reaches the last reference base.
#[derive(Debug, Clone)]
pub struct CigarWalker<'a> {
    ops: &'a [CigarOp],
    ref_id: usize,
    /// Reference length; `i64::MAX` when unknown
    ref_length: i64,
    strand: Strand,
    next_op: usize,
    segment_start: usize,
    left_start: i64,
    left_end: i64,
    done: bool,
}

impl<'a> CigarWalker<'a> {
    pub fn new(
        ops: &'a [CigarOp],
        ref_id: usize,
        ref_length: Option<i64>,
        position: i64,
        strand: Strand,
    ) -> Self {
        Self {
            ops,
            ref_id,
            ref_length: ref_length.unwrap_or(i64::MAX),
            strand,
            next_op: 0,
            segment_start: 0,
            left_start: position,
            left_end: position,
            done: false,
        }
    }

    fn observe_skip(&mut self, op_index: usize, skip: i64) -> JunctionObservation {
        let right_start = self.left_end + skip;

        // Extend the right anchor up to the next boundary
        let mut right_end = right_start;
        let mut j = op_index + 1;
        while j < self.ops.len() && right_end < self.ref_length {
            let op = self.ops[j];
            if matches!(op, CigarOp::RefSkip(_) | CigarOp::SoftClip(_)) {
                break;
            }
            if op.consumes_reference() {
                right_end += op.len() as i64;
            }
            j += 1;
        }
        right_end -= 1;

        let last_base = self.ref_length - 1;
        let intron_end = (right_start - 1).min(last_base);
        let intron_start = self.left_end.min(intron_end);
        let right_flank_end = right_end.min(last_base);
        let left_flank_start = self.left_start.min(intron_start);

        let observation = JunctionObservation {
            key: IntronKey::new(self.ref_id, intron_start, intron_end, self.strand),
            left_flank_start,
            right_flank_end,
        };

        if right_flank_end >= last_base || j >= self.ops.len() {
            self.done = true;
        } else {
            // Next segment starts right after this skip
            self.segment_start = op_index + 1;
            self.left_start = right_start;
            self.left_end = right_start;
        }

        observation
    }
}

impl Iterator for CigarWalker<'_> {
    type Item = JunctionObservation;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done && self.next_op < self.ops.len() {
            let i = self.next_op;
            self.next_op += 1;

            match self.ops[i] {
                CigarOp::SoftClip(n) if i == self.segment_start => {
                    self.left_start += n as i64;
                    self.left_end = self.left_start;
                }
                CigarOp::RefSkip(n) if n > 0 => {
                    return Some(self.observe_skip(i, n as i64));
                }
                op if op.consumes_reference() => {
                    self.left_end += op.len() as i64;
                }
                _ => {}
            }
        }
        None
    }
}
