/// Splice junction discovery and scoring
///
/// This module handles:
/// - Extracting junction observations from alignment CIGARs
/// - Deduplicating observations into a store of distinct junctions
/// - Coverage, splice-site and grouping metrics over the stored junctions
/// - Writing junctions as text, reloadable tables, GFF3 and BED
mod cigar;
mod coverage;
mod entry;
mod flanking;
mod group;
mod output;
mod splice_site;
mod system;
mod table;

pub use cigar::{CigarWalker, JunctionObservation};
pub use coverage::summarise_coverage;
pub use entry::{BoundaryCrossings, CoverageSummary, Junction};
pub use group::GroupSummary;
pub use splice_site::{SpliceMotif, SpliceSite, SpliceSiteClass, SpliceSiteCounts};
pub use system::{JunctionId, JunctionSystem};
pub use table::TABLE_HEADER;

use std::fmt;
use std::str::FromStr;

/// Strand of a junction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Strand {
    Positive,
    Negative,
    Unknown,
}

impl Strand {
    /// Strand character used in junction tables: `+`, `-` or `?`
    pub fn to_char(self) -> char {
        match self {
            Strand::Positive => '+',
            Strand::Negative => '-',
            Strand::Unknown => '?',
        }
    }

    /// Strand character for GFF3/BED, where unknown is `.`
    pub fn to_feature_char(self) -> char {
        match self {
            Strand::Unknown => '.',
            s => s.to_char(),
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(Strand::Positive),
            '-' => Some(Strand::Negative),
            '?' | '.' => Some(Strand::Unknown),
            _ => None,
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strand::Positive => write!(f, "POSITIVE"),
            Strand::Negative => write!(f, "NEGATIVE"),
            Strand::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Library strandedness, deciding how a read's orientation maps to a junction strand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strandedness {
    /// Junction strand is always unknown
    #[default]
    Unstranded,
    /// Read is antisense to the transcript (e.g. dUTP): reverse reads are `+`
    FirstStrand,
    /// Read is sense to the transcript: reverse reads are `-`
    SecondStrand,
}

impl Strandedness {
    pub fn is_strand_specific(self) -> bool {
        self != Strandedness::Unstranded
    }

    /// Junction strand implied by a read's reverse-complement flag
    pub fn strand_for(self, is_reverse: bool) -> Strand {
        match (self, is_reverse) {
            (Strandedness::Unstranded, _) => Strand::Unknown,
            (Strandedness::FirstStrand, true) | (Strandedness::SecondStrand, false) => {
                Strand::Positive
            }
            (Strandedness::FirstStrand, false) | (Strandedness::SecondStrand, true) => {
                Strand::Negative
            }
        }
    }
}

impl FromStr for Strandedness {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "unstranded" => Ok(Self::Unstranded),
            "firststrand" => Ok(Self::FirstStrand),
            "secondstrand" => Ok(Self::SecondStrand),
            _ => Err(format!(
                "unknown strandedness '{s}'; expected unstranded, firststrand or secondstrand"
            )),
        }
    }
}

impl fmt::Display for Strandedness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unstranded => write!(f, "unstranded"),
            Self::FirstStrand => write!(f, "firststrand"),
            Self::SecondStrand => write!(f, "secondstrand"),
        }
    }
}

/// Identity of a junction: reference, intron coordinates and strand.
///
/// `start` and `end` are the first and last intron bases, 0-based inclusive.
/// Flanking evidence is not part of the key.
#[derive(Hash, Eq, PartialEq, Clone, Copy, Debug)]
pub struct IntronKey {
    pub ref_id: usize,
    pub start: i64,
    pub end: i64,
    pub strand: Strand,
}

impl IntronKey {
    pub fn new(ref_id: usize, start: i64, end: i64, strand: Strand) -> Self {
        debug_assert!(start <= end, "intron start {start} after end {end}");
        Self {
            ref_id,
            start,
            end,
            strand,
        }
    }

    /// Intron length in bases
    pub fn size(&self) -> i64 {
        self.end - self.start + 1
    }

    /// Same reference and either the same start or the same end.
    ///
    /// Strand is not compared, so junctions on opposite strands sharing a
    /// boundary are linked.
    pub fn shares_donor_or_acceptor(&self, other: &IntronKey) -> bool {
        self.ref_id == other.ref_id && (self.start == other.start || self.end == other.end)
    }

    /// Sort order of the junction sequence: reference, start, end, strand
    pub fn sort_key(&self) -> (usize, i64, i64, Strand) {
        (self.ref_id, self.start, self.end, self.strand)
    }
}

impl fmt::Display for IntronKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}",
            self.ref_id,
            self.start,
            self.end,
            self.strand.to_char()
        )
    }
}
