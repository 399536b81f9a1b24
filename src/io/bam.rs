/// BAM alignment reader with noodles (streaming)
use crate::error::Error;
use crate::io::alignment::{derive_name, AlignmentRecord, CigarOp, RefSeq};
use bstr::ByteSlice;
use noodles::bam;
use noodles::bgzf;
use noodles::sam;
use noodles::sam::alignment::record::cigar::op::Kind;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Streaming BAM reader yielding mapped [`AlignmentRecord`]s.
///
/// Unmapped records, and records lacking a reference id or position, are
/// skipped. Records are returned in file order.
pub struct BamAlignmentReader<R> {
    inner: bam::io::Reader<R>,
    header: sam::Header,
    references: Vec<RefSeq>,
    record: bam::Record,
    path: PathBuf,
}

impl BamAlignmentReader<bgzf::Reader<File>> {
    /// Open a BAM file and read its header.
    pub fn open(path: &Path) -> Result<Self, Error> {
        let file = File::open(path).map_err(|e| Error::io(e, path))?;
        let mut inner = bam::io::Reader::new(file);
        let header = inner.read_header().map_err(|e| Error::io(e, path))?;
        let references = reference_sequences(&header);

        log::debug!(
            "Opened {} with {} reference sequences",
            path.display(),
            references.len()
        );

        Ok(Self {
            inner,
            header,
            references,
            record: bam::Record::default(),
            path: path.to_path_buf(),
        })
    }
}

impl<R: Read> BamAlignmentReader<R> {
    /// Reference sequences from the header, in reference-id order
    pub fn references(&self) -> &[RefSeq] {
        &self.references
    }

    pub fn header(&self) -> &sam::Header {
        &self.header
    }

    /// Read the next mapped alignment, or `None` at end of file.
    pub fn next_record(&mut self) -> Result<Option<AlignmentRecord>, Error> {
        loop {
            let n = self
                .inner
                .read_record(&mut self.record)
                .map_err(|e| Error::io(e, &self.path))?;
            if n == 0 {
                return Ok(None);
            }

            let converted =
                convert_record(&self.record).map_err(|e| Error::io(e, &self.path))?;
            if let Some(record) = converted {
                if record.ref_id >= self.references.len() {
                    return Err(Error::Alignment(format!(
                        "record '{}' refers to reference {} but header has {} sequences",
                        record.name,
                        record.ref_id,
                        self.references.len()
                    )));
                }
                return Ok(Some(record));
            }
        }
    }
}

impl<R: Read> Iterator for BamAlignmentReader<R> {
    type Item = Result<AlignmentRecord, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

/// Collect reference metadata from a SAM header
pub fn reference_sequences(header: &sam::Header) -> Vec<RefSeq> {
    header
        .reference_sequences()
        .iter()
        .enumerate()
        .map(|(index, (name, map))| RefSeq::new(index, name.to_string(), map.length().get() as i64))
        .collect()
}

fn convert_record(record: &bam::Record) -> std::io::Result<Option<AlignmentRecord>> {
    let flags = record.flags();
    if flags.is_unmapped() {
        return Ok(None);
    }

    let Some(ref_id) = record.reference_sequence_id().transpose()? else {
        return Ok(None);
    };
    let Some(start) = record.alignment_start().transpose()? else {
        return Ok(None);
    };

    let mut cigar = Vec::new();
    for result in record.cigar().iter() {
        let op = result?;
        cigar.push(convert_op(op.kind(), op.len() as u32));
    }

    let name = record
        .name()
        .map(|n| n.to_str_lossy().into_owned())
        .unwrap_or_default();

    Ok(Some(AlignmentRecord {
        name: derive_name(&name, flags.is_segmented(), flags.is_first_segment()),
        ref_id,
        position: start.get() as i64 - 1,
        cigar,
        is_reverse: flags.is_reverse_complemented(),
        query_length: record.sequence().len(),
    }))
}

fn convert_op(kind: Kind, len: u32) -> CigarOp {
    match kind {
        Kind::Match => CigarOp::Match(len),
        Kind::SequenceMatch => CigarOp::Equal(len),
        Kind::SequenceMismatch => CigarOp::Diff(len),
        Kind::Insertion => CigarOp::Ins(len),
        Kind::Deletion => CigarOp::Del(len),
        Kind::Skip => CigarOp::RefSkip(len),
        Kind::SoftClip => CigarOp::SoftClip(len),
        Kind::HardClip => CigarOp::HardClip(len),
        Kind::Pad => CigarOp::Pad(len),
    }
}
