/// Splice-site dinucleotide classification against a reference genome
use super::system::JunctionSystem;
use super::{IntronKey, Strand};
use crate::genome::fasta::decode_base;
use crate::genome::GenomeSequence;
use log::info;
use std::fmt;
use std::str::FromStr;

/// Splice junction motif types, read on the forward strand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpliceMotif {
    /// GT-AG (canonical, + strand)
    GtAg,
    /// CT-AC (canonical, - strand; reverse complement of GT-AG)
    CtAc,
    /// GC-AG (semi-canonical, + strand)
    GcAg,
    /// CT-GC (semi-canonical, - strand; reverse complement of GC-AG)
    CtGc,
    /// AT-AC (semi-canonical, + strand)
    AtAc,
    /// GT-AT (semi-canonical, - strand; reverse complement of AT-AC)
    GtAt,
    /// Non-canonical
    NonCanonical,
}

impl SpliceMotif {
    /// Detect the motif from encoded donor and acceptor bases (A=0, C=1, G=2, T=3)
    pub fn detect(donor: [u8; 2], acceptor: [u8; 2]) -> Self {
        match (donor, acceptor) {
            ([2, 3], [0, 2]) => SpliceMotif::GtAg,
            ([2, 1], [0, 2]) => SpliceMotif::GcAg,
            ([0, 3], [0, 1]) => SpliceMotif::AtAc,
            ([1, 3], [0, 1]) => SpliceMotif::CtAc,
            ([1, 3], [2, 1]) => SpliceMotif::CtGc,
            ([2, 3], [0, 3]) => SpliceMotif::GtAt,
            _ => SpliceMotif::NonCanonical,
        }
    }

    /// Strand a transcript would need for this motif, if any
    pub fn implied_strand(self) -> Option<Strand> {
        match self {
            SpliceMotif::GtAg | SpliceMotif::GcAg | SpliceMotif::AtAc => Some(Strand::Positive),
            SpliceMotif::CtAc | SpliceMotif::CtGc | SpliceMotif::GtAt => Some(Strand::Negative),
            SpliceMotif::NonCanonical => None,
        }
    }

    /// Class of this motif for a junction on `strand`.
    ///
    /// A motif only counts on its own strand; an unknown strand accepts both.
    pub fn class_on(self, strand: Strand) -> SpliceSiteClass {
        let on_strand = match (strand, self.implied_strand()) {
            (_, None) => false,
            (Strand::Unknown, Some(_)) => true,
            (s, Some(implied)) => s == implied,
        };
        if !on_strand {
            return SpliceSiteClass::NonCanonical;
        }
        match self {
            SpliceMotif::GtAg | SpliceMotif::CtAc => SpliceSiteClass::Canonical,
            SpliceMotif::NonCanonical => SpliceSiteClass::NonCanonical,
            _ => SpliceSiteClass::SemiCanonical,
        }
    }
}

/// Splice-site class of a junction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpliceSiteClass {
    /// GT-AG on the junction strand
    Canonical,
    /// GC-AG or AT-AC on the junction strand
    SemiCanonical,
    NonCanonical,
}

impl SpliceSiteClass {
    /// Single-letter code used in junction tables
    pub fn code(self) -> char {
        match self {
            SpliceSiteClass::Canonical => 'C',
            SpliceSiteClass::SemiCanonical => 'S',
            SpliceSiteClass::NonCanonical => 'N',
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "C" => Some(SpliceSiteClass::Canonical),
            "S" => Some(SpliceSiteClass::SemiCanonical),
            "N" => Some(SpliceSiteClass::NonCanonical),
            _ => None,
        }
    }
}

impl fmt::Display for SpliceSiteClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpliceSiteClass::Canonical => write!(f, "CANONICAL"),
            SpliceSiteClass::SemiCanonical => write!(f, "SEMI_CANONICAL"),
            SpliceSiteClass::NonCanonical => write!(f, "NON_CANONICAL"),
        }
    }
}

/// Dinucleotides at both ends of an intron and their classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpliceSite {
    /// First two intron bases, uppercase ASCII
    pub donor: [u8; 2],
    /// Last two intron bases, uppercase ASCII
    pub acceptor: [u8; 2],
    pub motif: SpliceMotif,
    pub class: SpliceSiteClass,
}

impl SpliceSite {
    /// Classify the intron of `key` against `genome`.
    ///
    /// Bases outside the reference read as `N`, so an intron running off the
    /// reference is non-canonical.
    pub fn classify<G: GenomeSequence + ?Sized>(key: &IntronKey, genome: &G) -> Self {
        let donor = two_bases(genome.fetch(key.ref_id, key.start, key.start + 1));
        let acceptor = two_bases(genome.fetch(key.ref_id, key.end - 1, key.end));
        Self::from_encoded(donor, acceptor, key.strand)
    }

    fn from_encoded(donor: [u8; 2], acceptor: [u8; 2], strand: Strand) -> Self {
        let motif = SpliceMotif::detect(donor, acceptor);
        Self {
            donor: donor.map(decode_base),
            acceptor: acceptor.map(decode_base),
            motif,
            class: motif.class_on(strand),
        }
    }

    /// Rebuild from the `GT-AG` style text written to junction tables
    pub fn parse(dinucleotides: &str, strand: Strand) -> Option<Self> {
        let (donor, acceptor) = dinucleotides.split_once('-')?;
        let donor: [u8; 2] = donor.as_bytes().try_into().ok()?;
        let acceptor: [u8; 2] = acceptor.as_bytes().try_into().ok()?;
        let encode = |b: [u8; 2]| b.map(crate::genome::fasta::encode_base);
        Some(Self::from_encoded(encode(donor), encode(acceptor), strand))
    }

    pub fn is_canonical(&self) -> bool {
        self.class == SpliceSiteClass::Canonical
    }
}

impl fmt::Display for SpliceSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [d1, d2] = self.donor;
        let [a1, a2] = self.acceptor;
        write!(f, "{}{}-{}{}", d1 as char, d2 as char, a1 as char, a2 as char)
    }
}

impl FromStr for SpliceSiteClass {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s).ok_or_else(|| format!("unknown splice-site class '{s}'"))
    }
}

fn two_bases(bases: Vec<u8>) -> [u8; 2] {
    match bases.as_slice() {
        [a, b] => [*a, *b],
        _ => [4, 4],
    }
}

/// Junction counts per splice-site class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpliceSiteCounts {
    pub canonical: usize,
    pub semi_canonical: usize,
    pub non_canonical: usize,
}

impl SpliceSiteCounts {
    pub fn add(&mut self, class: SpliceSiteClass) {
        match class {
            SpliceSiteClass::Canonical => self.canonical += 1,
            SpliceSiteClass::SemiCanonical => self.semi_canonical += 1,
            SpliceSiteClass::NonCanonical => self.non_canonical += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.canonical + self.semi_canonical + self.non_canonical
    }
}

impl JunctionSystem {
    /// Classify the splice site of every junction against `genome`.
    ///
    /// Junctions that already carry a classification keep it and are only
    /// counted.
    pub fn scan_reference<G>(&mut self, genome: &G) -> SpliceSiteCounts
    where
        G: GenomeSequence + ?Sized,
    {
        let mut counts = SpliceSiteCounts::default();
        for junction in self.junctions_mut() {
            let site = match junction.splice_site {
                Some(site) => site,
                None => {
                    let site = SpliceSite::classify(junction.key(), genome);
                    junction.splice_site = Some(site);
                    site
                }
            };
            counts.add(site.class);
        }

        info!(
            "Splice sites: {} canonical, {} semi-canonical, {} non-canonical",
            counts.canonical, counts.semi_canonical, counts.non_canonical
        );
        counts
    }
}
