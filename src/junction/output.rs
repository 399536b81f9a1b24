/// Junction output: descriptive report, GFF3 and BED
///
/// Coordinates are stored 0-based inclusive. GFF3 writes them 1-based
/// closed, BED writes them 0-based half-open.
use super::entry::Junction;
use super::splice_site::SpliceSiteClass;
use super::system::JunctionSystem;
use crate::error::Error;
use log::info;
use std::borrow::Cow;
use std::ffi::OsString;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

const GFF_SOURCE: &str = "sjscan";

/// `<prefix><suffix>`, e.g. `out/sample` + `.junctions.tab`
pub fn prefixed_path(prefix: &Path, suffix: &str) -> PathBuf {
    let mut path = OsString::from(prefix.as_os_str());
    path.push(suffix);
    PathBuf::from(path)
}

fn create(path: &Path) -> Result<BufWriter<File>, Error> {
    let file = File::create(path).map_err(|e| Error::io(e, path))?;
    Ok(BufWriter::new(file))
}

fn junction_name(index: usize) -> String {
    format!("junc_{index}")
}

fn or_na<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "NA".to_string(), |v| v.to_string())
}

impl JunctionSystem {
    /// Reference name for output, falling back to the numeric id
    pub fn reference_name(&self, ref_id: usize) -> Cow<'_, str> {
        match self.reference(ref_id) {
            Some(r) => Cow::Borrowed(r.name.as_str()),
            None => Cow::Owned(ref_id.to_string()),
        }
    }

    /// One block per junction with a sequential index and every field
    pub fn write_description<W: Write>(&self, w: &mut W) -> io::Result<()> {
        for (i, junction) in self.junctions().enumerate() {
            writeln!(w, "Junction {i}:")?;
            self.describe(junction, w)?;
            writeln!(w)?;
        }
        Ok(())
    }

    fn describe<W: Write>(&self, j: &Junction, w: &mut W) -> io::Result<()> {
        let key = j.key();
        let ref_length = self.reference(key.ref_id).map(|r| r.length);
        writeln!(
            w,
            "Reference: {} (id {}, length {})",
            self.reference_name(key.ref_id),
            key.ref_id,
            or_na(ref_length)
        )?;
        writeln!(
            w,
            "Intron: {}-{} ({} bp), strand {}",
            key.start,
            key.end,
            key.size(),
            key.strand
        )?;
        writeln!(
            w,
            "Flanks: {}-{} (left anchor {} bp, right anchor {} bp)",
            j.left_flank_start(),
            j.right_flank_end(),
            j.left_anchor_len(),
            j.right_anchor_len()
        )?;
        writeln!(w, "Supporting alignments: {}", j.support())?;
        writeln!(w, "Distinct read names: {}", j.read_names().len())?;
        writeln!(w, "Maximal minimal anchor: {}", j.max_min_anchor())?;

        match j.splice_site {
            Some(site) => writeln!(w, "Splice site: {} ({})", site, site.class)?,
            None => writeln!(w, "Splice site: NA")?,
        }

        match j.coverage {
            Some(c) => writeln!(
                w,
                "Coverage: donor {}, acceptor {}, min flank {}, flank mean {:.2}, intron mean {:.2}, drop ratio {:.3}",
                c.donor_depth, c.acceptor_depth, c.min_flank_depth, c.flank_mean, c.intron_mean, c.drop_ratio
            )?,
            None => writeln!(w, "Coverage: NA")?,
        }

        match j.boundary_crossings {
            Some(c) => writeln!(
                w,
                "Unspliced boundary crossings: donor {}, acceptor {}",
                c.donor, c.acceptor
            )?,
            None => writeln!(w, "Unspliced boundary crossings: NA")?,
        }

        match j.multiple_mapping_score {
            Some(mms) => writeln!(w, "Multiple mapping score: {mms:.4}")?,
            None => writeln!(w, "Multiple mapping score: NA")?,
        }
        writeln!(w, "Primary: {}; Unique in group: {}", j.primary, j.unique)
    }

    fn gff_attributes(&self, j: &Junction, name: &str) -> String {
        let mut attrs = format!(
            "ID={name};Name={name};support={};max_min_anchor={};primary={};unique={}",
            j.support(),
            j.max_min_anchor(),
            j.primary,
            j.unique
        );
        if let Some(site) = j.splice_site {
            attrs.push_str(&format!(";splice_site={site};ss_class={}", site.class.code()));
        }
        if let Some(mms) = j.multiple_mapping_score {
            attrs.push_str(&format!(";mms={mms:.4}"));
        }
        if let Some(c) = j.coverage {
            attrs.push_str(&format!(";drop_ratio={:.4}", c.drop_ratio));
        }
        attrs
    }

    /// GFF3 with each junction as a feature spanning its flanks, and one
    /// `match_part` child per non-empty anchor.
    pub fn write_junction_gff<W: Write>(&self, w: &mut W) -> io::Result<()> {
        writeln!(w, "##gff-version 3")?;
        for (i, j) in self.junctions().enumerate() {
            let key = j.key();
            let seqid = self.reference_name(key.ref_id);
            let strand = key.strand.to_feature_char();
            let name = junction_name(i);

            writeln!(
                w,
                "{seqid}\t{GFF_SOURCE}\tjunction\t{}\t{}\t{}\t{strand}\t.\t{}",
                j.left_flank_start() + 1,
                j.right_flank_end() + 1,
                j.support(),
                self.gff_attributes(j, &name)
            )?;
            if j.left_anchor_len() > 0 {
                writeln!(
                    w,
                    "{seqid}\t{GFF_SOURCE}\tmatch_part\t{}\t{}\t{}\t{strand}\t.\tID={name}_left;Parent={name}",
                    j.left_flank_start() + 1,
                    key.start,
                    j.support()
                )?;
            }
            if j.right_anchor_len() > 0 {
                writeln!(
                    w,
                    "{seqid}\t{GFF_SOURCE}\tmatch_part\t{}\t{}\t{}\t{strand}\t.\tID={name}_right;Parent={name}",
                    key.end + 2,
                    j.right_flank_end() + 1,
                    j.support()
                )?;
            }
        }
        Ok(())
    }

    /// GFF3 with each junction as an `intron` feature
    pub fn write_intron_gff<W: Write>(&self, w: &mut W) -> io::Result<()> {
        writeln!(w, "##gff-version 3")?;
        for (i, j) in self.junctions().enumerate() {
            let key = j.key();
            writeln!(
                w,
                "{}\t{GFF_SOURCE}\tintron\t{}\t{}\t{}\t{}\t.\t{}",
                self.reference_name(key.ref_id),
                key.start + 1,
                key.end + 1,
                j.support(),
                key.strand.to_feature_char(),
                self.gff_attributes(j, &junction_name(i))
            )?;
        }
        Ok(())
    }

    /// BED12 with two blocks per junction, one per anchor.
    ///
    /// With a `filter`, only junctions classified into that splice-site class
    /// are written; names count written rows only.
    pub fn write_bed<W: Write>(
        &self,
        w: &mut W,
        filter: Option<SpliceSiteClass>,
    ) -> io::Result<usize> {
        writeln!(w, "track name=\"junctions\"")?;
        let mut written = 0;
        for j in self.junctions() {
            if let Some(class) = filter {
                if j.splice_site.map(|s| s.class) != Some(class) {
                    continue;
                }
            }
            let key = j.key();
            let chrom_start = j.left_flank_start();
            let chrom_end = j.right_flank_end() + 1;
            writeln!(
                w,
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t255,0,0\t2\t{},{}\t0,{}",
                self.reference_name(key.ref_id),
                chrom_start,
                chrom_end,
                junction_name(written),
                j.support(),
                key.strand.to_feature_char(),
                key.start,
                key.end + 1,
                j.left_anchor_len(),
                j.right_anchor_len(),
                key.end + 1 - chrom_start
            )?;
            written += 1;
        }
        Ok(written)
    }

    /// Write the report, table, both GFF3 variants and the BED files under
    /// `prefix`.
    pub fn save_all(&self, prefix: &Path) -> Result<(), Error> {
        let report = prefixed_path(prefix, ".junctions.txt");
        info!("Saving junction report to {}", report.display());
        let mut w = create(&report)?;
        self.write_description(&mut w)
            .and_then(|_| w.flush())
            .map_err(|e| Error::io(e, &report))?;

        let table = prefixed_path(prefix, ".junctions.tab");
        info!("Saving junction table to {}", table.display());
        self.save_table(&table)?;

        let gff = prefixed_path(prefix, ".junctions.gff3");
        info!("Saving junction GFF3 to {}", gff.display());
        let mut w = create(&gff)?;
        self.write_junction_gff(&mut w)
            .and_then(|_| w.flush())
            .map_err(|e| Error::io(e, &gff))?;

        let introns = prefixed_path(prefix, ".introns.gff3");
        info!("Saving intron GFF3 to {}", introns.display());
        let mut w = create(&introns)?;
        self.write_intron_gff(&mut w)
            .and_then(|_| w.flush())
            .map_err(|e| Error::io(e, &introns))?;

        let beds = [
            (".junctions.bed", None),
            (".canonical.bed", Some(SpliceSiteClass::Canonical)),
            (".semicanonical.bed", Some(SpliceSiteClass::SemiCanonical)),
            (".noncanonical.bed", Some(SpliceSiteClass::NonCanonical)),
        ];
        for (suffix, filter) in beds {
            let path = prefixed_path(prefix, suffix);
            let mut w = create(&path)?;
            let written = self
                .write_bed(&mut w, filter)
                .and_then(|n| w.flush().map(|_| n))
                .map_err(|e| Error::io(e, &path))?;
            info!("Wrote {} junctions to {}", written, path.display());
        }

        Ok(())
    }
}
