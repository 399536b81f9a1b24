use std::path::PathBuf;

use clap::Parser;

use crate::junction::Strandedness;

// ---------------------------------------------------------------------------
// Run mode enum
// ---------------------------------------------------------------------------

/// `--runMode` values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    /// Discover junctions from a BAM file
    Extract,
    /// Combine previously saved junction tables
    Merge,
}

impl std::str::FromStr for RunMode {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "extract" => Ok(Self::Extract),
            "merge" => Ok(Self::Merge),
            _ => Err(format!(
                "unknown runMode '{s}'; expected 'extract' or 'merge'"
            )),
        }
    }
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Extract => write!(f, "extract"),
            Self::Merge => write!(f, "merge"),
        }
    }
}

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// Command-line parameters.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "sjscan",
    about = "Splice junction discovery and scoring from RNA-seq alignments",
    version
)]
pub struct Parameters {
    // ── Run ─────────────────────────────────────────────────────────────
    /// Run mode: extract or merge
    #[arg(long = "runMode", default_value = "extract")]
    pub run_mode: RunMode,

    // ── Input ───────────────────────────────────────────────────────────
    /// BAM file with spliced alignments (extract mode)
    #[arg(long = "bamFile")]
    pub bam_file: Option<PathBuf>,

    /// Coordinate-sorted BAM with unspliced alignments, used for coverage
    /// and boundary-crossing counts
    #[arg(long = "unsplicedBam")]
    pub unspliced_bam: Option<PathBuf>,

    /// Genome FASTA file(s) (plain or gzip) for splice-site classification
    #[arg(long = "genomeFastaFiles", num_args = 1..)]
    pub genome_fasta_files: Vec<PathBuf>,

    /// Junction tables to combine (merge mode)
    #[arg(long = "inputTabs", num_args = 1..)]
    pub input_tabs: Vec<PathBuf>,

    // ── Junctions ───────────────────────────────────────────────────────
    /// Library strandedness: unstranded, firststrand or secondstrand
    #[arg(long = "strandSpecific", default_value = "unstranded")]
    pub strand_specific: Strandedness,

    /// Exonic window for coverage, in bases; 0 = mean read length
    #[arg(long = "coverageWindow", default_value_t = 0)]
    pub coverage_window: usize,

    // ── Output ──────────────────────────────────────────────────────────
    /// Output file name prefix (including path)
    #[arg(long = "outFileNamePrefix", default_value = "./sjscan")]
    pub out_file_name_prefix: PathBuf,
}

impl Parameters {
    /// Coverage window override, if one was given
    pub fn coverage_window(&self) -> Option<usize> {
        (self.coverage_window > 0).then_some(self.coverage_window)
    }

    /// Validate parameter combinations that clap cannot express.
    pub fn validate(&self) -> Result<(), crate::error::Error> {
        match self.run_mode {
            RunMode::Extract => {
                if self.bam_file.is_none() {
                    return Err(crate::error::Error::Parameter(
                        "--bamFile is required when --runMode extract".into(),
                    ));
                }
                if !self.input_tabs.is_empty() {
                    return Err(crate::error::Error::Parameter(
                        "--inputTabs is only used with --runMode merge".into(),
                    ));
                }
            }
            RunMode::Merge => {
                if self.input_tabs.is_empty() {
                    return Err(crate::error::Error::Parameter(
                        "--inputTabs is required when --runMode merge".into(),
                    ));
                }
                if self.bam_file.is_some() || self.unspliced_bam.is_some() {
                    return Err(crate::error::Error::Parameter(
                        "BAM inputs are not used with --runMode merge".into(),
                    ));
                }
            }
        }

        if self.out_file_name_prefix.as_os_str().is_empty() {
            return Err(crate::error::Error::Parameter(
                "--outFileNamePrefix must not be empty".into(),
            ));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
