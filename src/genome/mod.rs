pub mod fasta;

use std::collections::HashMap;
use std::path::Path;

use crate::error::Error;
use crate::io::alignment::RefSeq;

use fasta::parse_fasta_files;

/// Sequence lookup keyed by alignment reference id.
pub trait GenomeSequence {
    /// Encoded bases (A=0, C=1, G=2, T=3, N=4) over the 0-based inclusive
    /// range `[start, end]`. The range is clamped to the reference; an
    /// unknown reference or empty range yields an empty vector.
    fn fetch(&self, ref_id: usize, start: i64, end: i64) -> Vec<u8>;
}

/// In-memory genome with one encoded sequence per alignment reference.
pub struct Genome {
    /// Chromosome names, indexed by reference id
    pub chr_name: Vec<String>,

    /// Encoded sequences, indexed by reference id; empty if absent from the FASTA
    pub sequences: Vec<Vec<u8>>,
}

impl Genome {
    /// Load FASTA files and arrange their chromosomes in reference-id order.
    ///
    /// References missing from the FASTA get an empty sequence, so every
    /// lookup against them returns nothing.
    pub fn from_fasta<P: AsRef<Path>>(paths: &[P], references: &[RefSeq]) -> Result<Self, Error> {
        let chromosomes = parse_fasta_files(paths)?;
        let mut by_name: HashMap<String, Vec<u8>> = chromosomes
            .into_iter()
            .map(|c| (c.name, c.sequence))
            .collect();

        let mut chr_name = Vec::with_capacity(references.len());
        let mut sequences = Vec::with_capacity(references.len());
        for reference in references {
            let sequence = match by_name.remove(&reference.name) {
                Some(seq) => {
                    if seq.len() as i64 != reference.length {
                        log::warn!(
                            "Reference {} has length {} in FASTA but {} in alignments",
                            reference.name,
                            seq.len(),
                            reference.length
                        );
                    }
                    seq
                }
                None => {
                    log::warn!("Reference {} not found in genome FASTA", reference.name);
                    Vec::new()
                }
            };
            chr_name.push(reference.name.clone());
            sequences.push(sequence);
        }

        Ok(Self {
            chr_name,
            sequences,
        })
    }

    /// Build from already-encoded sequences (reference id = position)
    pub fn from_sequences(named: Vec<(String, Vec<u8>)>) -> Self {
        let (chr_name, sequences) = named.into_iter().unzip();
        Self {
            chr_name,
            sequences,
        }
    }

    /// Access a single encoded base, or None if out of bounds.
    pub fn get_base(&self, ref_id: usize, pos: i64) -> Option<u8> {
        let seq = self.sequences.get(ref_id)?;
        usize::try_from(pos).ok().and_then(|p| seq.get(p).copied())
    }
}

impl GenomeSequence for Genome {
    fn fetch(&self, ref_id: usize, start: i64, end: i64) -> Vec<u8> {
        let Some(seq) = self.sequences.get(ref_id) else {
            return Vec::new();
        };
        let start = start.max(0);
        let end = end.min(seq.len() as i64 - 1);
        if start > end {
            return Vec::new();
        }
        seq[start as usize..=end as usize].to_vec()
    }
}
