/// Ingest-time statistics threaded through the pipeline by the caller
use log::info;
use std::collections::HashMap;

/// Read-length statistics over all ingested alignments
#[derive(Default, Debug, Clone, Copy, PartialEq)]
pub struct QueryLengthStats {
    pub min: usize,
    pub max: usize,
    sum: u64,
    count: u64,
}

impl QueryLengthStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, length: usize) {
        if self.count == 0 || length < self.min {
            self.min = length;
        }
        if length > self.max {
            self.max = length;
        }
        self.sum += length as u64;
        self.count += 1;
    }

    /// Mean query length; 0.0 if nothing was recorded
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum as f64 / self.count as f64
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }
}

/// Number of spliced alignment records seen per read name.
///
/// A read name with several spliced records is a multi-mapper; the
/// multiplicity feeds the multiple-mapping score of each junction.
#[derive(Default, Debug, Clone)]
pub struct SplicedAlignmentMap {
    counts: HashMap<String, u32>,
}

impl SplicedAlignmentMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, name: &str) {
        *self.counts.entry(name.to_string()).or_insert(0) += 1;
    }

    /// Multiplicity of `name`, or None if it never produced a spliced alignment
    pub fn multiplicity(&self, name: &str) -> Option<u32> {
        self.counts.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Counters collected while feeding alignments into a junction system
#[derive(Default, Debug)]
pub struct IngestStats {
    /// Mapped alignments read
    pub total_alignments: u64,
    /// Alignments with at least one reference skip
    pub spliced_alignments: u64,
    /// Junction observations (one per reference skip)
    pub junction_observations: u64,
    pub query_lengths: QueryLengthStats,
    pub spliced: SplicedAlignmentMap,
}

impl IngestStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spliced_percent(&self) -> f64 {
        if self.total_alignments == 0 {
            0.0
        } else {
            100.0 * self.spliced_alignments as f64 / self.total_alignments as f64
        }
    }

    /// Print summary statistics to log
    pub fn print_summary(&self) {
        if self.total_alignments == 0 {
            info!("No alignments processed");
            return;
        }

        info!("=== Ingest Summary ===");
        info!("Alignments processed: {}", self.total_alignments);
        info!(
            "Spliced alignments: {} ({:.2}%)",
            self.spliced_alignments,
            self.spliced_percent()
        );
        info!("Junction observations: {}", self.junction_observations);
        info!("Distinct spliced read names: {}", self.spliced.len());
        info!(
            "Query length min/mean/max: {}/{:.2}/{}",
            self.query_lengths.min,
            self.query_lengths.mean(),
            self.query_lengths.max
        );
    }
}
