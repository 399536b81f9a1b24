/// Decoded alignment records as consumed by junction extraction
use crate::error::Error;
use std::fmt;
use std::str::FromStr;

/// CIGAR operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CigarOp {
    /// M: match/mismatch (default mode)
    Match(u32),
    /// =: exact match (optional)
    Equal(u32),
    /// X: mismatch (optional)
    Diff(u32),
    /// I: insertion to reference
    Ins(u32),
    /// D: deletion from reference
    Del(u32),
    /// N: splice junction (skipped reference region)
    RefSkip(u32),
    /// S: soft clip (clipped sequence present in read)
    SoftClip(u32),
    /// H: hard clip (clipped sequence not present)
    HardClip(u32),
    /// P: padding (silent deletion from padded reference)
    Pad(u32),
}

impl CigarOp {
    /// Get the operation character
    pub fn op_char(&self) -> char {
        match self {
            CigarOp::Match(_) => 'M',
            CigarOp::Equal(_) => '=',
            CigarOp::Diff(_) => 'X',
            CigarOp::Ins(_) => 'I',
            CigarOp::Del(_) => 'D',
            CigarOp::RefSkip(_) => 'N',
            CigarOp::SoftClip(_) => 'S',
            CigarOp::HardClip(_) => 'H',
            CigarOp::Pad(_) => 'P',
        }
    }

    /// Get the operation length
    pub fn len(&self) -> u32 {
        match self {
            CigarOp::Match(n)
            | CigarOp::Equal(n)
            | CigarOp::Diff(n)
            | CigarOp::Ins(n)
            | CigarOp::Del(n)
            | CigarOp::RefSkip(n)
            | CigarOp::SoftClip(n)
            | CigarOp::HardClip(n)
            | CigarOp::Pad(n) => *n,
        }
    }

    /// Check if operation is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check if operation consumes reference bases
    pub fn consumes_reference(&self) -> bool {
        matches!(
            self,
            CigarOp::Match(_)
                | CigarOp::Equal(_)
                | CigarOp::Diff(_)
                | CigarOp::Del(_)
                | CigarOp::RefSkip(_)
        )
    }

    /// Aligned bases that contribute to per-base depth (M, =, X)
    pub fn is_aligned(&self) -> bool {
        matches!(
            self,
            CigarOp::Match(_) | CigarOp::Equal(_) | CigarOp::Diff(_)
        )
    }
}

impl fmt::Display for CigarOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.len(), self.op_char())
    }
}

/// Parse a textual CIGAR such as `10S40M200N50M`.
pub fn parse_cigar(s: &str) -> Result<Vec<CigarOp>, Error> {
    let mut ops = Vec::new();
    let mut len: Option<u32> = None;

    for c in s.chars() {
        if let Some(d) = c.to_digit(10) {
            let current = len.unwrap_or(0);
            len = Some(
                current
                    .checked_mul(10)
                    .and_then(|v| v.checked_add(d))
                    .ok_or_else(|| Error::Alignment(format!("CIGAR length overflow in '{s}'")))?,
            );
            continue;
        }

        let n = len
            .take()
            .ok_or_else(|| Error::Alignment(format!("CIGAR op '{c}' has no length in '{s}'")))?;
        let op = match c {
            'M' => CigarOp::Match(n),
            '=' => CigarOp::Equal(n),
            'X' => CigarOp::Diff(n),
            'I' => CigarOp::Ins(n),
            'D' => CigarOp::Del(n),
            'N' => CigarOp::RefSkip(n),
            'S' => CigarOp::SoftClip(n),
            'H' => CigarOp::HardClip(n),
            'P' => CigarOp::Pad(n),
            _ => {
                return Err(Error::Alignment(format!(
                    "unknown CIGAR op '{c}' in '{s}'"
                )))
            }
        };
        ops.push(op);
    }

    if len.is_some() {
        return Err(Error::Alignment(format!("trailing length in CIGAR '{s}'")));
    }

    Ok(ops)
}

/// Reference sequence metadata taken from the alignment header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefSeq {
    pub index: usize,
    pub name: String,
    pub length: i64,
}

impl RefSeq {
    pub fn new(index: usize, name: impl Into<String>, length: i64) -> Self {
        Self {
            index,
            name: name.into(),
            length,
        }
    }
}

/// One mapped alignment, reduced to the fields junction discovery needs.
#[derive(Debug, Clone)]
pub struct AlignmentRecord {
    /// Read name; paired mates carry a `_R1` / `_R2` suffix
    pub name: String,
    /// Reference sequence index
    pub ref_id: usize,
    /// Leftmost mapped position (0-based)
    pub position: i64,
    pub cigar: Vec<CigarOp>,
    pub is_reverse: bool,
    /// Length of the read sequence
    pub query_length: usize,
}

impl AlignmentRecord {
    /// Whether any reference-skip op is present
    pub fn is_spliced(&self) -> bool {
        self.cigar.iter().any(|op| matches!(op, CigarOp::RefSkip(_)))
    }

    /// Number of reference bases spanned, introns included
    pub fn reference_length(&self) -> i64 {
        self.cigar
            .iter()
            .filter(|op| op.consumes_reference())
            .map(|op| op.len() as i64)
            .sum()
    }

    /// Last reference base covered (0-based, inclusive)
    pub fn reference_end(&self) -> i64 {
        self.position + self.reference_length() - 1
    }
}

/// Name used to key multi-mapping statistics: mates of a pair are kept apart.
pub fn derive_name(name: &str, is_paired: bool, is_first: bool) -> String {
    if !is_paired {
        name.to_string()
    } else if is_first {
        format!("{name}_R1")
    } else {
        format!("{name}_R2")
    }
}

impl FromStr for CigarOp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match parse_cigar(s)?.as_slice() {
            [op] => Ok(*op),
            _ => Err(Error::Alignment(format!("expected a single CIGAR op, got '{s}'"))),
        }
    }
}
