/// Tab-separated junction table, written by `save_all` and read back by `load`
use super::entry::{BoundaryCrossings, CoverageSummary, Junction};
use super::splice_site::SpliceSite;
use super::system::JunctionSystem;
use super::{IntronKey, Strand};
use crate::error::Error;
use crate::io::alignment::RefSeq;
use log::info;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

/// Header row; its `index` column marks it as a header on reload
pub const TABLE_HEADER: &str = "index\trefid\trefname\treflen\tstart\tend\tstrand\t\
left_flank_start\tright_flank_end\tsupport\tmax_min_anchor\tsplice_site\tss_class\t\
primary\tunique\tmms\tdonor_depth\tacceptor_depth\tmin_flank_depth\tflank_mean\t\
intron_mean\tdrop_ratio\tdonor_crossings\tacceptor_crossings";

/// Columns up to and including `support` are required
const REQUIRED_COLUMNS: usize = 10;

fn na<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "NA".to_string(), |v| v.to_string())
}

fn flag(value: bool) -> u8 {
    value as u8
}

fn is_header(line: &str) -> bool {
    line.split('\t').any(|field| field == "index")
}

/// Field `idx` of a row, parsed; `None` for a missing column or `NA`
fn optional<T: FromStr>(fields: &[&str], idx: usize, line: usize) -> Result<Option<T>, Error> {
    match fields.get(idx) {
        None | Some(&"NA") | Some(&"") => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| Error::table(line, format!("cannot parse column {} ('{raw}')", idx + 1))),
    }
}

fn required<T: FromStr>(fields: &[&str], idx: usize, line: usize) -> Result<T, Error> {
    optional(fields, idx, line)?
        .ok_or_else(|| Error::table(line, format!("missing value in column {}", idx + 1)))
}

fn parse_row(row: &str, line: usize) -> Result<(Option<RefSeq>, Junction), Error> {
    let fields: Vec<&str> = row.split('\t').collect();
    if fields.len() < REQUIRED_COLUMNS {
        return Err(Error::table(
            line,
            format!(
                "expected at least {REQUIRED_COLUMNS} columns, found {}",
                fields.len()
            ),
        ));
    }

    let ref_id: usize = required(&fields, 1, line)?;
    let reference = optional::<i64>(&fields, 3, line)?
        .filter(|_| fields[2] != "NA")
        .map(|length| RefSeq::new(ref_id, fields[2], length));

    let start: i64 = required(&fields, 4, line)?;
    let end: i64 = required(&fields, 5, line)?;
    if start > end {
        return Err(Error::table(line, format!("intron start {start} after end {end}")));
    }
    let strand = fields[6]
        .chars()
        .next()
        .filter(|_| fields[6].len() == 1)
        .and_then(Strand::from_char)
        .ok_or_else(|| Error::table(line, format!("invalid strand '{}'", fields[6])))?;

    let key = IntronKey::new(ref_id, start, end, strand);
    let mut junction = Junction::with_support(
        key,
        required(&fields, 7, line)?,
        required(&fields, 8, line)?,
        required(&fields, 9, line)?,
    );

    if let Some(anchor) = optional(&fields, 10, line)? {
        junction.set_max_min_anchor(anchor);
    }
    if let Some(text) = optional::<String>(&fields, 11, line)? {
        junction.splice_site = Some(
            SpliceSite::parse(&text, strand)
                .ok_or_else(|| Error::table(line, format!("invalid splice site '{text}'")))?,
        );
    }
    junction.primary = optional::<u8>(&fields, 13, line)?.unwrap_or(0) != 0;
    junction.unique = optional::<u8>(&fields, 14, line)?.unwrap_or(0) != 0;
    junction.multiple_mapping_score = optional(&fields, 15, line)?;

    if let Some(donor_depth) = optional(&fields, 16, line)? {
        junction.coverage = Some(CoverageSummary {
            donor_depth,
            acceptor_depth: required(&fields, 17, line)?,
            min_flank_depth: required(&fields, 18, line)?,
            flank_mean: required(&fields, 19, line)?,
            intron_mean: required(&fields, 20, line)?,
            drop_ratio: required(&fields, 21, line)?,
        });
    }
    if let Some(donor) = optional(&fields, 22, line)? {
        junction.boundary_crossings = Some(BoundaryCrossings {
            donor,
            acceptor: required(&fields, 23, line)?,
        });
    }

    Ok((reference, junction))
}

impl JunctionSystem {
    /// Header row followed by one row per junction in sequence order
    pub fn write_table<W: Write>(&self, w: &mut W) -> io::Result<()> {
        writeln!(w, "{TABLE_HEADER}")?;
        for (i, j) in self.junctions().enumerate() {
            let key = j.key();
            let (ref_name, ref_length) = match self.reference(key.ref_id) {
                Some(r) => (r.name.as_str(), Some(r.length)),
                None => ("NA", None),
            };
            let coverage = j.coverage;
            let crossings = j.boundary_crossings;
            writeln!(
                w,
                "{i}\t{}\t{ref_name}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                key.ref_id,
                na(ref_length),
                key.start,
                key.end,
                key.strand.to_char(),
                j.left_flank_start(),
                j.right_flank_end(),
                j.support(),
                j.max_min_anchor(),
                na(j.splice_site),
                na(j.splice_site.map(|s| s.class.code())),
                flag(j.primary),
                flag(j.unique),
                na(j.multiple_mapping_score.map(|v| format!("{v:.6}"))),
                na(coverage.map(|c| c.donor_depth)),
                na(coverage.map(|c| c.acceptor_depth)),
                na(coverage.map(|c| c.min_flank_depth)),
                na(coverage.map(|c| format!("{:.6}", c.flank_mean))),
                na(coverage.map(|c| format!("{:.6}", c.intron_mean))),
                na(coverage.map(|c| format!("{:.6}", c.drop_ratio))),
                na(crossings.map(|c| c.donor)),
                na(crossings.map(|c| c.acceptor)),
            )?;
        }
        Ok(())
    }

    pub fn save_table(&self, path: &Path) -> Result<(), Error> {
        let file = File::create(path).map_err(|e| Error::io(e, path))?;
        let mut w = BufWriter::new(file);
        self.write_table(&mut w)
            .and_then(|_| w.flush())
            .map_err(|e| Error::io(e, path))
    }

    /// Register every junction of a table read from `reader`.
    ///
    /// Header and empty lines are skipped. A row whose key is already present
    /// is merged into the existing junction. Returns the number of rows read.
    pub fn read_table<R: BufRead>(&mut self, reader: R) -> Result<usize, Error> {
        let mut rows = 0;
        for (n, line) in reader.lines().enumerate() {
            let line = line?;
            let row = line.trim();
            if row.is_empty() || is_header(row) {
                continue;
            }
            let (reference, junction) = parse_row(row, n + 1)?;
            if let Some(reference) = reference {
                self.register_reference(reference);
            }
            self.insert_junction(junction);
            rows += 1;
        }
        Ok(rows)
    }

    /// Load a junction table from `path` into this store
    pub fn load(&mut self, path: &Path) -> Result<usize, Error> {
        let file = File::open(path).map_err(|e| Error::io(e, path))?;
        let rows = self.read_table(BufReader::new(file)).map_err(|e| match e {
            Error::Io { source, .. } => Error::io(source, path),
            other => other,
        })?;
        info!("Loaded {} junctions from {}", rows, path.display());
        Ok(rows)
    }

    /// New store holding the junctions of the table at `path`
    pub fn from_table(path: &Path) -> Result<Self, Error> {
        let mut system = Self::new();
        system.load(path)?;
        Ok(system)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::junction::SpliceSiteClass;
    use crate::stats::SplicedAlignmentMap;
    use std::io::Cursor;

    fn populated() -> JunctionSystem {
        let mut system = JunctionSystem::with_references(vec![
            RefSeq::new(0, "chr1", 10_000),
            RefSeq::new(1, "chr2", 5_000),
        ]);
        let j = system.insert_or_merge(IntronKey::new(0, 120, 219, Strand::Positive), 100, 249);
        j.add_read_name("a");
        j.splice_site = SpliceSite::parse("GT-AG", Strand::Positive);
        j.coverage = Some(CoverageSummary {
            donor_depth: 5,
            acceptor_depth: 4,
            min_flank_depth: 2,
            flank_mean: 3.5,
            intron_mean: 0.25,
            drop_ratio: 0.928571,
        });
        j.boundary_crossings = Some(BoundaryCrossings {
            donor: 1,
            acceptor: 0,
        });
        system.insert_or_merge(IntronKey::new(0, 120, 219, Strand::Positive), 90, 260);
        system.insert_or_merge(IntronKey::new(1, 40, 80, Strand::Unknown), 10, 100);
        system.calc_multiple_mapping_stats(&SplicedAlignmentMap::new());
        system.sort();
        system.calc_junction_stats();
        system
    }

    fn table_text(system: &JunctionSystem) -> String {
        let mut buf = Vec::new();
        system.write_table(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_header_and_rows() {
        let text = table_text(&populated());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], TABLE_HEADER);

        let header_cols = lines[0].split('\t').count();
        for row in &lines[1..] {
            assert_eq!(row.split('\t').count(), header_cols);
        }

        let first: Vec<&str> = lines[1].split('\t').collect();
        assert_eq!(&first[..10], &["0", "0", "chr1", "10000", "120", "219", "+", "90", "260", "2"]);
        assert_eq!(first[11], "GT-AG");
        assert_eq!(first[12], "C");
        assert_eq!(first[16], "5");

        let second: Vec<&str> = lines[2].split('\t').collect();
        assert_eq!(second[6], "?");
        assert_eq!(second[11], "NA");
        assert_eq!(second[16], "NA");
    }

    #[test]
    fn test_reload_reproduces_junctions() {
        let saved = populated();
        let mut reloaded = JunctionSystem::new();
        let rows = reloaded
            .read_table(Cursor::new(table_text(&saved)))
            .unwrap();
        assert_eq!(rows, 2);
        assert_eq!(reloaded.size(), saved.size());

        for j in saved.junctions() {
            let r = reloaded.lookup(j.key()).unwrap();
            assert_eq!(r.support(), j.support());
            assert_eq!(r.left_flank_start(), j.left_flank_start());
            assert_eq!(r.right_flank_end(), j.right_flank_end());
            assert_eq!(r.max_min_anchor(), j.max_min_anchor());
            assert_eq!(r.splice_site, j.splice_site);
            assert_eq!(r.primary, j.primary);
            assert_eq!(r.unique, j.unique);
            assert_eq!(r.boundary_crossings, j.boundary_crossings);
            assert_eq!(r.coverage.is_some(), j.coverage.is_some());
        }

        let j = reloaded
            .lookup(&IntronKey::new(0, 120, 219, Strand::Positive))
            .unwrap();
        assert_eq!(j.splice_site.unwrap().class, SpliceSiteClass::Canonical);
        assert!((j.coverage.unwrap().flank_mean - 3.5).abs() < 1e-9);
        assert_eq!(reloaded.reference(1).unwrap().name, "chr2");
    }

    #[test]
    fn test_minimal_rows_and_blank_lines() {
        let text = "index\trefid\n\n0\t0\tchr1\t1000\t10\t20\t-\t5\t30\t3\n";
        let mut system = JunctionSystem::new();
        assert_eq!(system.read_table(Cursor::new(text)).unwrap(), 1);

        let j = system
            .lookup(&IntronKey::new(0, 10, 20, Strand::Negative))
            .unwrap();
        assert_eq!(j.support(), 3);
        assert!(j.splice_site.is_none());
        assert!(j.multiple_mapping_score.is_none());
    }

    #[test]
    fn test_malformed_rows() {
        let cases = [
            "0\t0\tchr1\t1000\t10\t20\t-\t5\t30",
            "0\t0\tchr1\t1000\tten\t20\t-\t5\t30\t3",
            "0\t0\tchr1\t1000\t30\t20\t-\t5\t40\t3",
            "0\t0\tchr1\t1000\t10\t20\tx\t5\t30\t3",
            "0\t0\tchr1\t1000\t10\t20\t+\t5\t30\t3\t4\tGTAG",
        ];
        for text in cases {
            let mut system = JunctionSystem::new();
            let err = system.read_table(Cursor::new(text)).unwrap_err();
            assert!(matches!(err, Error::Table { line: 1, .. }), "{text}: {err}");
        }
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.junctions.tab");
        populated().save_table(&path).unwrap();

        let system = JunctionSystem::from_table(&path).unwrap();
        assert_eq!(system.size(), 2);

        let missing = JunctionSystem::from_table(&dir.path().join("nope.tab"));
        assert!(missing.unwrap_err().to_string().contains("nope.tab"));
    }
}
