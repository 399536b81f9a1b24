/// Per-base depth batches, one reference sequence at a time
use crate::error::Error;
use crate::io::alignment::{AlignmentRecord, RefSeq};
use crate::io::bam::BamAlignmentReader;
use std::io::Read;

/// Depth counts for a single reference sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepthBatch {
    /// Index of the reference these depths belong to
    pub ref_index: usize,
    /// Depth per 0-based reference position
    pub depths: Vec<u32>,
}

/// Source of per-reference depth batches.
///
/// Implementations must yield batches in strictly increasing `ref_index`
/// order. References without any coverage may be omitted.
pub trait DepthSource {
    fn next_batch(&mut self) -> Result<Option<DepthBatch>, Error>;
}

/// Depth source over precomputed batches
#[derive(Debug, Default)]
pub struct MemoryDepthSource {
    batches: std::vec::IntoIter<DepthBatch>,
    last: Option<usize>,
}

impl MemoryDepthSource {
    pub fn new(batches: Vec<DepthBatch>) -> Self {
        Self {
            batches: batches.into_iter(),
            last: None,
        }
    }
}

impl DepthSource for MemoryDepthSource {
    fn next_batch(&mut self) -> Result<Option<DepthBatch>, Error> {
        let Some(batch) = self.batches.next() else {
            return Ok(None);
        };
        check_order(self.last, batch.ref_index)?;
        self.last = Some(batch.ref_index);
        Ok(Some(batch))
    }
}

fn check_order(last: Option<usize>, next: usize) -> Result<(), Error> {
    match last {
        Some(last) if next <= last => Err(Error::Depth(format!(
            "reference {next} follows reference {last}; input must be coordinate-sorted"
        ))),
        _ => Ok(()),
    }
}

/// Accumulates depth for one reference via a difference array.
struct Pileup {
    ref_index: usize,
    diff: Vec<i64>,
}

impl Pileup {
    fn new(reference: &RefSeq) -> Self {
        Self {
            ref_index: reference.index,
            diff: vec![0; reference.length.max(0) as usize + 1],
        }
    }

    fn add(&mut self, record: &AlignmentRecord) {
        let len = self.diff.len() as i64 - 1;
        let mut pos = record.position;
        for op in &record.cigar {
            let op_len = op.len() as i64;
            if op.is_aligned() {
                let start = pos.clamp(0, len);
                let end = (pos + op_len).clamp(0, len);
                if start < end {
                    self.diff[start as usize] += 1;
                    self.diff[end as usize] -= 1;
                }
            }
            if op.consumes_reference() {
                pos += op_len;
            }
        }
    }

    fn finish(self) -> DepthBatch {
        let mut depths = Vec::with_capacity(self.diff.len().saturating_sub(1));
        let mut running = 0i64;
        for d in &self.diff[..self.diff.len() - 1] {
            running += d;
            depths.push(running.max(0) as u32);
        }
        DepthBatch {
            ref_index: self.ref_index,
            depths,
        }
    }
}

/// Computes depth batches from a coordinate-sorted BAM file.
///
/// Only aligned bases (M, =, X) count towards depth; deletions and
/// reference skips do not.
pub struct BamDepthParser<R> {
    reader: BamAlignmentReader<R>,
    current: Option<Pileup>,
    last: Option<usize>,
}

impl<R: Read> BamDepthParser<R> {
    pub fn new(reader: BamAlignmentReader<R>) -> Self {
        Self {
            reader,
            current: None,
            last: None,
        }
    }

    /// Index of the reference currently being accumulated
    pub fn current_ref_index(&self) -> Option<usize> {
        self.current.as_ref().map(|p| p.ref_index)
    }

    fn start(&mut self, ref_id: usize) -> Result<Pileup, Error> {
        check_order(self.last, ref_id)?;
        self.last = Some(ref_id);
        let reference = self.reader.references().get(ref_id).ok_or_else(|| {
            Error::Depth(format!("reference {ref_id} not present in header"))
        })?;
        Ok(Pileup::new(reference))
    }
}

impl<R: Read> DepthSource for BamDepthParser<R> {
    fn next_batch(&mut self) -> Result<Option<DepthBatch>, Error> {
        while let Some(record) = self.reader.next_record()? {
            if let Some(pileup) = self
                .current
                .as_mut()
                .filter(|p| p.ref_index == record.ref_id)
            {
                pileup.add(&record);
                continue;
            }

            let mut next = self.start(record.ref_id)?;
            next.add(&record);
            if let Some(done) = self.current.replace(next) {
                return Ok(Some(done.finish()));
            }
        }

        Ok(self.current.take().map(Pileup::finish))
    }
}
