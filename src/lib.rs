pub mod error;
pub mod genome;
pub mod io;
pub mod junction;
pub mod params;
pub mod stats;

use log::info;

use crate::error::Error;
use crate::genome::Genome;
use crate::io::bam::BamAlignmentReader;
use crate::io::depth::BamDepthParser;
use crate::junction::JunctionSystem;
use crate::params::{Parameters, RunMode};
use crate::stats::IngestStats;

/// Top-level dispatcher. Called from `main()` after CLI parsing.
pub fn run(params: &Parameters) -> anyhow::Result<()> {
    params.validate()?;

    info!("sjscan v{}", env!("CARGO_PKG_VERSION"));
    info!("runMode: {}", params.run_mode);

    match params.run_mode {
        RunMode::Extract => extract(params),
        RunMode::Merge => merge(params),
    }
}

fn extract(params: &Parameters) -> anyhow::Result<()> {
    let bam_file = params
        .bam_file
        .as_deref()
        .ok_or_else(|| Error::Parameter("--bamFile is required".into()))?;
    info!("bamFile: {}", bam_file.display());
    info!("strandSpecific: {}", params.strand_specific);

    let reader = BamAlignmentReader::open(bam_file)?;
    let mut system = JunctionSystem::with_references(reader.references().to_vec());
    let mut stats = IngestStats::new();

    info!("Extracting junctions...");
    system.ingest(reader, params.strand_specific, &mut stats)?;
    stats.print_summary();
    system.set_query_length_stats(stats.query_lengths);

    if let Some(unspliced) = params.unspliced_bam.as_deref() {
        info!("unsplicedBam: {}", unspliced.display());

        info!("Counting unspliced alignments across junction boundaries...");
        system.find_flanking_alignments(BamAlignmentReader::open(unspliced)?)?;

        let mut depth = BamDepthParser::new(BamAlignmentReader::open(unspliced)?);
        system.calc_coverage(&mut depth, params.coverage_window())?;
    }

    if !params.genome_fasta_files.is_empty() {
        info!(
            "genomeFastaFiles: {:?}",
            params
                .genome_fasta_files
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
        );
        let genome = Genome::from_fasta(&params.genome_fasta_files, system.references())?;
        system.scan_reference(&genome);
    }

    system.calc_multiple_mapping_stats(&stats.spliced);
    system.sort();
    system.calc_junction_stats();

    system.save_all(&params.out_file_name_prefix)?;
    info!("Junction extraction complete!");
    Ok(())
}

fn merge(params: &Parameters) -> anyhow::Result<()> {
    let mut merged = JunctionSystem::new();
    for path in &params.input_tabs {
        let system = JunctionSystem::from_table(path)?;
        merged.append(&system);
    }
    info!(
        "Merged {} tables into {} distinct junctions",
        params.input_tabs.len(),
        merged.size()
    );

    merged.sort();
    merged.calc_junction_stats();

    merged.save_all(&params.out_file_name_prefix)?;
    info!("Merge complete!");
    Ok(())
}
