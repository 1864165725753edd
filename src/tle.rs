//! NORAD two-line element parsing and checksum validation.
//!
//! Accepts both the 2-line and 3-line (leading name line) variants. Lines
//! are stored as fixed-size byte arrays once validated; callers that only
//! need the raw lines back out (for re-serialization round-trips) get them
//! bit-exact.

use crate::error::TleError;

/// A validated two-line element set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tle {
    pub name: Option<String>,
    pub line1: [u8; 69],
    pub line2: [u8; 69],
}

impl Tle {
    /// Parse a record. `name` is the optional 3rd-line satellite name,
    /// already stripped of its own line terminator.
    pub fn parse(name: Option<&str>, line1: &str, line2: &str) -> Result<Tle, TleError> {
        let l1 = validate_line(line1, 1, '1')?;
        let l2 = validate_line(line2, 2, '2')?;
        let name = name.map(|s| s.trim().to_string());

        // Length, prefix, and checksum are necessary but not sufficient: a
        // line can pass all three and still carry a field the underlying
        // SGP4 model rejects (a non-numeric mean motion, say). Running it
        // through the model's own parser here surfaces that at parse time
        // rather than deferring it to the first propagation step.
        ::sgp4::Elements::from_tle(name.clone(), &l1, &l2).map_err(|e| TleError::Elements(e.to_string()))?;

        Ok(Tle { name, line1: l1, line2: l2 })
    }

    pub fn line1_str(&self) -> &str {
        std::str::from_utf8(&self.line1).expect("validated ASCII TLE line")
    }

    pub fn line2_str(&self) -> &str {
        std::str::from_utf8(&self.line2).expect("validated ASCII TLE line")
    }

    /// NORAD catalog number, parsed out of columns 3-7 of line 1.
    pub fn norad_id(&self) -> Option<u32> {
        self.line1_str().get(2..7)?.trim().parse().ok()
    }
}

fn validate_line(line: &str, line_no: u8, expected_prefix: char) -> Result<[u8; 69], TleError> {
    if line.len() != 69 {
        return Err(TleError::WrongLength {
            line: line_no,
            len: line.len(),
        });
    }
    if !line.starts_with(expected_prefix) {
        return Err(TleError::WrongLineNumber {
            line: line_no,
            expected: expected_prefix,
        });
    }

    let bytes = line.as_bytes();
    let computed = checksum(&bytes[..68]);
    let expected = (bytes[68] as char)
        .to_digit(10)
        .ok_or(TleError::ChecksumMismatch {
            line: line_no,
            expected: 0,
            computed,
        })? as u8;

    if computed != expected {
        return Err(TleError::ChecksumMismatch {
            line: line_no,
            expected,
            computed,
        });
    }

    let mut out = [0u8; 69];
    out.copy_from_slice(bytes);
    Ok(out)
}

/// Modulo-10 NORAD checksum: sum of digits, `'-'` counts as 1, every other
/// non-digit character counts as 0.
fn checksum(columns: &[u8]) -> u8 {
    let sum: u32 = columns
        .iter()
        .map(|&b| match b {
            b'0'..=b'9' => (b - b'0') as u32,
            b'-' => 1,
            _ => 0,
        })
        .sum();
    (sum % 10) as u8
}
