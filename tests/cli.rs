/// End-to-end tests driving the sjscan binary
use assert_cmd::Command;
use noodles::bam;
use noodles::sam;
use noodles::sam::alignment::io::Write as _;
use noodles::sam::alignment::record::cigar::op::{Kind, Op};
use noodles::sam::alignment::record::{Flags, MappingQuality};
use noodles::sam::alignment::record_buf::{Cigar, QualityScores, RecordBuf, Sequence};
use noodles::sam::header::record::value::{map::ReferenceSequence, Map};
use predicates::prelude::*;
use std::fs;
use std::io::{BufWriter, Write};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const CHR1_LEN: usize = 1000;

fn parse_cigar(cigar: &str) -> Vec<Op> {
    let mut ops = Vec::new();
    let mut len = 0usize;
    for c in cigar.chars() {
        if let Some(d) = c.to_digit(10) {
            len = len * 10 + d as usize;
            continue;
        }
        let kind = match c {
            'M' => Kind::Match,
            'I' => Kind::Insertion,
            'D' => Kind::Deletion,
            'N' => Kind::Skip,
            'S' => Kind::SoftClip,
            _ => panic!("unsupported op {c}"),
        };
        ops.push(Op::new(kind, len));
        len = 0;
    }
    ops
}

/// Write a single-reference BAM; records are (name, 1-based position, CIGAR)
fn write_bam(path: &Path, records: &[(&str, usize, &str)]) {
    let header = sam::Header::builder()
        .add_reference_sequence(
            "chr1",
            Map::<ReferenceSequence>::new(NonZeroUsize::new(CHR1_LEN).unwrap()),
        )
        .build();

    let mut writer = bam::io::Writer::new(BufWriter::new(fs::File::create(path).unwrap()));
    writer.write_header(&header).unwrap();

    for &(name, pos, cigar) in records {
        let ops = parse_cigar(cigar);
        let query_len: usize = ops
            .iter()
            .filter(|op| matches!(op.kind(), Kind::Match | Kind::Insertion | Kind::SoftClip))
            .map(|op| op.len())
            .sum();

        let mut record = RecordBuf::default();
        record.name_mut().replace(name.into());
        *record.flags_mut() = Flags::empty();
        *record.reference_sequence_id_mut() = Some(0);
        *record.alignment_start_mut() = Some(pos.try_into().unwrap());
        *record.mapping_quality_mut() = MappingQuality::new(60);
        *record.cigar_mut() = Cigar::from(ops);
        *record.sequence_mut() = Sequence::from(vec![b'A'; query_len]);
        *record.quality_scores_mut() = QualityScores::from(vec![30u8; query_len]);
        writer.write_alignment_record(&header, &record).unwrap();
    }

    writer.finish(&header).unwrap();
}

/// chr1 of `CHR1_LEN` bases with a GT..AG intron at 120..=219 (0-based)
fn write_genome(dir: &TempDir) -> PathBuf {
    let mut seq = vec![b'A'; CHR1_LEN];
    seq[120] = b'G';
    seq[121] = b'T';
    seq[218] = b'A';
    seq[219] = b'G';

    let path = dir.path().join("genome.fa");
    let mut file = fs::File::create(&path).unwrap();
    writeln!(file, ">chr1").unwrap();
    for line in seq.chunks(60) {
        file.write_all(line).unwrap();
        writeln!(file).unwrap();
    }
    path
}

fn spliced_bam(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("spliced.bam");
    write_bam(
        &path,
        &[
            ("r1", 101, "20M100N30M"),
            ("r2", 91, "30M100N40M"),
            ("r3", 301, "20M50N20M"),
            ("r4", 501, "40M"),
        ],
    );
    path
}

fn unspliced_bam(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("unspliced.bam");
    write_bam(
        &path,
        &[("u1", 111, "20M"), ("u2", 201, "30M"), ("u3", 401, "30M")],
    );
    path
}

fn rows(path: &Path) -> Vec<Vec<String>> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .skip(1)
        .map(|l| l.split('\t').map(str::to_string).collect())
        .collect()
}

fn sjscan() -> Command {
    Command::cargo_bin("sjscan").unwrap()
}

#[test]
fn test_extract_writes_all_outputs() {
    let tmpdir = TempDir::new().unwrap();
    let bam = spliced_bam(&tmpdir);
    let unspliced = unspliced_bam(&tmpdir);
    let genome = write_genome(&tmpdir);
    let prefix = tmpdir.path().join("sample");

    sjscan()
        .arg("--bamFile")
        .arg(&bam)
        .arg("--unsplicedBam")
        .arg(&unspliced)
        .arg("--genomeFastaFiles")
        .arg(&genome)
        .arg("--outFileNamePrefix")
        .arg(&prefix)
        .assert()
        .success()
        .stderr(predicate::str::contains("Junction extraction complete"));

    for suffix in [
        ".junctions.txt",
        ".junctions.tab",
        ".junctions.gff3",
        ".introns.gff3",
        ".junctions.bed",
        ".canonical.bed",
        ".semicanonical.bed",
        ".noncanonical.bed",
    ] {
        let path = tmpdir.path().join(format!("sample{suffix}"));
        assert!(path.exists(), "missing {}", path.display());
    }

    let table = rows(&tmpdir.path().join("sample.junctions.tab"));
    assert_eq!(table.len(), 2);

    let first = &table[0];
    assert_eq!(
        &first[..15],
        &["0", "0", "chr1", "1000", "120", "219", "?", "90", "259", "2", "30", "GT-AG", "C", "1", "1"]
    );
    // one multiplicity per read: score 1
    assert_eq!(first[15], "1.000000");
    // u1 crosses the donor, u2 the acceptor
    assert_eq!(&first[22..], &["1", "1"]);

    let second = &table[1];
    assert_eq!((second[4].as_str(), second[5].as_str()), ("320", "369"));
    assert_eq!(second[12], "N");
    assert_ne!(second[16], "NA");

    let canonical = fs::read_to_string(tmpdir.path().join("sample.canonical.bed")).unwrap();
    let lines: Vec<&str> = canonical.lines().collect();
    assert_eq!(lines[0], "track name=\"junctions\"");
    assert_eq!(
        lines[1],
        "chr1\t90\t260\tjunc_0\t2\t.\t120\t220\t255,0,0\t2\t30,40\t0,130"
    );
    assert_eq!(lines.len(), 2);

    let introns = fs::read_to_string(tmpdir.path().join("sample.introns.gff3")).unwrap();
    assert!(introns.contains("chr1\tsjscan\tintron\t121\t220\t2\t.\t"));
}

#[test]
fn test_extract_strand_specific() {
    let tmpdir = TempDir::new().unwrap();
    let bam = spliced_bam(&tmpdir);
    let prefix = tmpdir.path().join("stranded");

    sjscan()
        .arg("--bamFile")
        .arg(&bam)
        .arg("--strandSpecific")
        .arg("secondstrand")
        .arg("--outFileNamePrefix")
        .arg(&prefix)
        .assert()
        .success();

    let table = rows(&tmpdir.path().join("stranded.junctions.tab"));
    // forward reads under second-strand are +
    assert!(table.iter().all(|r| r[6] == "+"));
    // no genome given: no splice-site class
    assert!(table.iter().all(|r| r[12] == "NA"));
}

#[test]
fn test_merge_tables() {
    let tmpdir = TempDir::new().unwrap();
    let bam = spliced_bam(&tmpdir);

    let first = tmpdir.path().join("a");
    sjscan()
        .arg("--bamFile")
        .arg(&bam)
        .arg("--outFileNamePrefix")
        .arg(&first)
        .assert()
        .success();

    let other_bam = tmpdir.path().join("other.bam");
    write_bam(&other_bam, &[("s1", 101, "20M100N30M"), ("s2", 601, "10M80N10M")]);
    let second = tmpdir.path().join("b");
    sjscan()
        .arg("--bamFile")
        .arg(&other_bam)
        .arg("--outFileNamePrefix")
        .arg(&second)
        .assert()
        .success();

    let merged = tmpdir.path().join("merged");
    sjscan()
        .arg("--runMode")
        .arg("merge")
        .arg("--inputTabs")
        .arg(tmpdir.path().join("a.junctions.tab"))
        .arg(tmpdir.path().join("b.junctions.tab"))
        .arg("--outFileNamePrefix")
        .arg(&merged)
        .assert()
        .success()
        .stderr(predicate::str::contains("Merge complete"));

    let table = rows(&tmpdir.path().join("merged.junctions.tab"));
    let summary: Vec<(&str, &str, &str)> = table
        .iter()
        .map(|r| (r[4].as_str(), r[5].as_str(), r[9].as_str()))
        .collect();
    // shared junction counted once per table
    assert_eq!(
        summary,
        vec![("120", "219", "2"), ("320", "369", "1"), ("610", "689", "1")]
    );
}

#[test]
fn test_missing_bam_argument() {
    sjscan()
        .assert()
        .failure()
        .stderr(predicate::str::contains("--bamFile is required"));
}

#[test]
fn test_nonexistent_bam() {
    let tmpdir = TempDir::new().unwrap();
    sjscan()
        .arg("--bamFile")
        .arg(tmpdir.path().join("absent.bam"))
        .arg("--outFileNamePrefix")
        .arg(tmpdir.path().join("out"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("absent.bam"));
}

#[test]
fn test_merge_rejects_bad_table() {
    let tmpdir = TempDir::new().unwrap();
    let bad = tmpdir.path().join("bad.tab");
    fs::write(&bad, "0\t0\tchr1\t1000\tten\t20\t+\t5\t30\t1\n").unwrap();

    sjscan()
        .arg("--runMode")
        .arg("merge")
        .arg("--inputTabs")
        .arg(&bad)
        .arg("--outFileNamePrefix")
        .arg(tmpdir.path().join("out"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("line 1"));
}
