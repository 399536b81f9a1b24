use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::MultiGzDecoder;

use crate::error::Error;

/// A single chromosome from a FASTA file.
#[derive(Debug, Clone)]
pub struct Chromosome {
    pub name: String,
    pub sequence: Vec<u8>,
}

/// Encode a nucleotide: A=0, C=1, G=2, T=3, N/other=4 (case-insensitive)
pub fn encode_base(byte: u8) -> u8 {
    match byte {
        b'A' | b'a' => 0,
        b'C' | b'c' => 1,
        b'G' | b'g' => 2,
        b'T' | b't' => 3,
        _ => 4,
    }
}

/// Decode an encoded base back to its uppercase letter
pub fn decode_base(code: u8) -> u8 {
    match code {
        0 => b'A',
        1 => b'C',
        2 => b'G',
        3 => b'T',
        _ => b'N',
    }
}

fn open(path: &Path) -> Result<Box<dyn BufRead>, Error> {
    let file = File::open(path).map_err(|e| Error::io(e, path))?;
    let path_str = path.to_string_lossy();
    if path_str.ends_with(".gz") || path_str.ends_with(".gzip") {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Parse FASTA files (plain or gzip) and extract chromosomes.
///
/// - Base encoding: A=0, C=1, G=2, T=3, N/other=4
/// - Control characters (ASCII < 32) are skipped
/// - Chromosome name is the header up to the first whitespace
pub fn parse_fasta_files<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<Chromosome>, Error> {
    let mut chromosomes = Vec::new();

    for path in paths {
        let path = path.as_ref();
        let reader = open(path)?;

        let mut current_name: Option<String> = None;
        let mut current_seq: Vec<u8> = Vec::new();

        for (line_num, line_result) in reader.lines().enumerate() {
            let line = line_result.map_err(|e| Error::io(e, path))?;

            if line.is_empty() {
                continue;
            }

            if let Some(stripped) = line.strip_prefix('>') {
                if let Some(name) = current_name.take() {
                    chromosomes.push(Chromosome {
                        name,
                        sequence: std::mem::take(&mut current_seq),
                    });
                }

                let name = stripped
                    .split_whitespace()
                    .next()
                    .ok_or_else(|| {
                        Error::Fasta(format!(
                            "empty chromosome name at {}:{}",
                            path.display(),
                            line_num + 1
                        ))
                    })?
                    .to_string();

                current_name = Some(name);
            } else {
                if current_name.is_none() {
                    return Err(Error::Fasta(format!(
                        "sequence data before first header at {}:{}",
                        path.display(),
                        line_num + 1
                    )));
                }

                current_seq.extend(
                    line.as_bytes()
                        .iter()
                        .filter(|&&b| b >= 32)
                        .map(|&b| encode_base(b)),
                );
            }
        }

        if let Some(name) = current_name {
            chromosomes.push(Chromosome {
                name,
                sequence: current_seq,
            });
        }
    }

    if chromosomes.is_empty() {
        return Err(Error::Fasta(
            "no chromosomes found in FASTA files".to_string(),
        ));
    }

    Ok(chromosomes)
}
