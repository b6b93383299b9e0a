use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use ndarray::{ArrayD, IxDyn};
use thiserror::Error;

use super::model::{CubeHeader, HeaderValue};

// ---------------------------------------------------------------------------
// Primary HDU: 2880-byte blocks, 80-character ASCII header cards ending in
// END, big-endian data with NAXIS1 varying fastest.
// ---------------------------------------------------------------------------

pub const BLOCK_SIZE: usize = 2880;
pub const CARD_SIZE: usize = 80;

/// Keywords owned by the writer; copied headers never override them.
const STRUCTURAL: &[&str] = &["SIMPLE", "BITPIX", "NAXIS", "EXTEND", "BSCALE", "BZERO", "BLANK", "END"];

#[derive(Error, Debug)]
pub enum FitsError {
    #[error("FITS I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid FITS format: {0}")]
    InvalidFormat(String),
    #[error("unsupported BITPIX: {0}")]
    UnsupportedBitpix(i64),
    #[error("missing required keyword: {0}")]
    MissingKeyword(String),
}

/// Header and data of a primary HDU, data indexed `[NAXISn, ..., NAXIS1]`.
#[derive(Debug, Clone)]
pub struct FitsImage {
    pub header: CubeHeader,
    pub data: ArrayD<f64>,
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

pub fn read_primary(path: &Path) -> Result<FitsImage, FitsError> {
    let mut reader = BufReader::new(File::open(path)?);
    read_primary_from(&mut reader)
}

pub fn read_primary_from<R: Read>(reader: &mut R) -> Result<FitsImage, FitsError> {
    let header = read_header(reader)?;

    let int = |key: &str| {
        header
            .get(key)
            .and_then(HeaderValue::as_i64)
            .ok_or_else(|| FitsError::MissingKeyword(key.to_string()))
    };

    let bitpix = int("BITPIX")?;
    let naxis = int("NAXIS")?;
    if naxis <= 0 {
        return Err(FitsError::InvalidFormat("primary HDU has no data array".into()));
    }
    if naxis > 999 {
        return Err(FitsError::InvalidFormat(format!("NAXIS = {naxis}")));
    }

    let mut axes = Vec::with_capacity(naxis as usize);
    for i in 1..=naxis {
        let n = int(&format!("NAXIS{i}"))?;
        if n < 0 {
            return Err(FitsError::InvalidFormat(format!("NAXIS{i} = {n}")));
        }
        axes.push(n as usize);
    }
    let count = axes
        .iter()
        .try_fold(1usize, |acc, &n| acc.checked_mul(n))
        .ok_or_else(|| FitsError::InvalidFormat(format!("data size overflows: {axes:?}")))?;

    let bscale = header.get("BSCALE").and_then(HeaderValue::as_f64).unwrap_or(1.0);
    let bzero = header.get("BZERO").and_then(HeaderValue::as_f64).unwrap_or(0.0);
    let blank = header.get("BLANK").and_then(HeaderValue::as_i64);

    let values = read_values(reader, bitpix, count, blank)?;
    let values: Vec<f64> = values.into_iter().map(|v| v * bscale + bzero).collect();

    // NAXIS1 varies fastest, i.e. it is the last (row-major) ndarray axis.
    axes.reverse();
    let data = ArrayD::from_shape_vec(IxDyn(&axes), values)
        .map_err(|e| FitsError::InvalidFormat(e.to_string()))?;

    Ok(FitsImage { header, data })
}

/// Read cards block by block until the block holding `END`.
fn read_header<R: Read>(reader: &mut R) -> Result<CubeHeader, FitsError> {
    let mut header = CubeHeader::new();
    let mut block = [0u8; BLOCK_SIZE];
    let mut first = true;

    loop {
        reader.read_exact(&mut block)?;
        let mut done = false;

        for card in block.chunks(CARD_SIZE) {
            let card = std::str::from_utf8(card)
                .ok()
                .filter(|c| c.is_ascii())
                .ok_or_else(|| FitsError::InvalidFormat("non-ASCII header card".into()))?;

            if first {
                if !card.starts_with("SIMPLE") {
                    return Err(FitsError::InvalidFormat("file does not start with SIMPLE".into()));
                }
                first = false;
            }

            let keyword = card[..8].trim();
            if keyword == "END" {
                done = true;
                break;
            }
            if keyword.is_empty() || &card[8..10] != "= " {
                continue; // COMMENT, HISTORY, blank
            }
            if let Some(value) = parse_value(&card[10..]) {
                header.insert(keyword, value);
            }
        }

        if done {
            return Ok(header);
        }
    }
}

/// Parse the value field of a card (columns 11-80).
fn parse_value(field: &str) -> Option<HeaderValue> {
    let s = field.trim_start();

    if let Some(rest) = s.strip_prefix('\'') {
        // Quotes inside strings are doubled
        let mut out = String::new();
        let mut chars = rest.chars().peekable();
        while let Some(c) = chars.next() {
            if c == '\'' {
                if chars.peek() == Some(&'\'') {
                    chars.next();
                    out.push('\'');
                } else {
                    break;
                }
            } else {
                out.push(c);
            }
        }
        return Some(HeaderValue::String(out.trim_end().to_string()));
    }

    let value = match s.find('/') {
        Some(idx) => s[..idx].trim(),
        None => s.trim(),
    };

    match value {
        "" => None,
        "T" => Some(HeaderValue::Bool(true)),
        "F" => Some(HeaderValue::Bool(false)),
        v => {
            if let Ok(i) = v.parse::<i64>() {
                Some(HeaderValue::Integer(i))
            } else if let Ok(f) = v.replace(['D', 'd'], "E").parse::<f64>() {
                Some(HeaderValue::Float(f))
            } else {
                Some(HeaderValue::String(v.to_string()))
            }
        }
    }
}

fn read_values<R: Read>(
    reader: &mut R,
    bitpix: i64,
    count: usize,
    blank: Option<i64>,
) -> Result<Vec<f64>, FitsError> {
    let width = match bitpix {
        8 => 1,
        16 => 2,
        32 | -32 => 4,
        64 | -64 => 8,
        other => return Err(FitsError::UnsupportedBitpix(other)),
    };
    let len = count
        .checked_mul(width)
        .ok_or_else(|| FitsError::InvalidFormat(format!("{count} values of {width} bytes overflow")))?;
    // grows with the bytes actually present, not with what NAXISn claims
    let mut raw = Vec::new();
    reader.take(len as u64).read_to_end(&mut raw)?;
    if raw.len() != len {
        return Err(FitsError::InvalidFormat(format!(
            "data array truncated: expected {len} bytes, found {}",
            raw.len()
        )));
    }

    let int = |v: i64| match blank {
        Some(b) if b == v => f64::NAN,
        _ => v as f64,
    };

    let values = raw
        .chunks_exact(width)
        .map(|b| match bitpix {
            8 => int(b[0] as i64),
            16 => int(i16::from_be_bytes([b[0], b[1]]) as i64),
            32 => int(i32::from_be_bytes([b[0], b[1], b[2], b[3]]) as i64),
            64 => int(i64::from_be_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]])),
            -32 => f32::from_be_bytes([b[0], b[1], b[2], b[3]]) as f64,
            _ => f64::from_be_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]),
        })
        .collect();
    Ok(values)
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Write `data` as a BITPIX -64 primary HDU, copying the non-structural
/// keywords of `header`.
pub fn write_primary(path: &Path, header: &CubeHeader, data: &ArrayD<f64>) -> Result<(), FitsError> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_primary_to(&mut writer, header, data)?;
    writer.flush()?;
    Ok(())
}

pub fn write_primary_to<W: Write>(
    writer: &mut W,
    header: &CubeHeader,
    data: &ArrayD<f64>,
) -> Result<(), FitsError> {
    let mut cards = vec![
        format_card("SIMPLE", &HeaderValue::Bool(true))?,
        format_card("BITPIX", &HeaderValue::Integer(-64))?,
        format_card("NAXIS", &HeaderValue::Integer(data.ndim() as i64))?,
    ];
    for (i, &n) in data.shape().iter().rev().enumerate() {
        cards.push(format_card(&format!("NAXIS{}", i + 1), &HeaderValue::Integer(n as i64))?);
    }
    for (key, value) in header.iter() {
        if STRUCTURAL.contains(&key.as_str()) || key.starts_with("NAXIS") {
            continue;
        }
        cards.push(format_card(key, value)?);
    }
    cards.push(format!("{:<80}", "END"));

    let mut bytes: Vec<u8> = cards.concat().into_bytes();
    pad_block(&mut bytes, b' ');
    writer.write_all(&bytes)?;

    let mut bytes: Vec<u8> = data.iter().flat_map(|v| v.to_be_bytes()).collect();
    pad_block(&mut bytes, 0);
    writer.write_all(&bytes)?;
    Ok(())
}

fn pad_block(bytes: &mut Vec<u8>, fill: u8) {
    let padding = (BLOCK_SIZE - bytes.len() % BLOCK_SIZE) % BLOCK_SIZE;
    bytes.resize(bytes.len() + padding, fill);
}

fn format_card(key: &str, value: &HeaderValue) -> Result<String, FitsError> {
    if key.len() > 8 || !key.is_ascii() {
        return Err(FitsError::InvalidFormat(format!("keyword '{key}' is not a FITS keyword")));
    }
    let field = match value {
        HeaderValue::String(s) => format!("'{:<8}'", s.replace('\'', "''")),
        HeaderValue::Integer(i) => format!("{i:>20}"),
        HeaderValue::Float(f) => format!("{:>20}", format!("{f:?}")),
        HeaderValue::Bool(b) => format!("{:>20}", if *b { "T" } else { "F" }),
    };
    let card = format!("{key:<8}= {field}");
    if card.len() > CARD_SIZE || !card.is_ascii() {
        return Err(FitsError::InvalidFormat(format!("value of '{key}' does not fit a card")));
    }
    Ok(format!("{card:<80}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn header() -> CubeHeader {
        let mut h = CubeHeader::new();
        h.insert("CTYPE1", HeaderValue::String("GLON-CAR".into()));
        h.insert("CRPIX1", HeaderValue::Float(3.0));
        h.insert("CDELT1", HeaderValue::Float(-0.5));
        h.insert("RESTFREQ", HeaderValue::Float(1.420405751786e9));
        h.insert("OBJECT", HeaderValue::String("O'Neil field".into()));
        h
    }

    #[test]
    fn round_trip_preserves_shape_order_and_values() {
        let data = ArrayD::from_shape_fn(IxDyn(&[3, 4, 5]), |i| (i[0] * 100 + i[1] * 10 + i[2]) as f64);
        let mut buf = Vec::new();
        write_primary_to(&mut buf, &header(), &data).unwrap();
        assert_eq!(buf.len() % BLOCK_SIZE, 0);

        let image = read_primary_from(&mut Cursor::new(buf)).unwrap();
        assert_eq!(image.data, data);
        assert_eq!(image.header.get("NAXIS1"), Some(&HeaderValue::Integer(5)));
        assert_eq!(image.header.get("NAXIS3"), Some(&HeaderValue::Integer(3)));
        assert_eq!(image.header.number("CDELT1"), Ok(-0.5));
        assert_eq!(image.header.number("RESTFREQ"), Ok(1.420405751786e9));
        assert_eq!(image.header.text("CTYPE1"), Some("GLON-CAR"));
        assert_eq!(image.header.text("OBJECT"), Some("O'Neil field"));
    }

    #[test]
    fn parses_card_values() {
        assert_eq!(parse_value("                   T / flag"), Some(HeaderValue::Bool(true)));
        assert_eq!(parse_value("                  42"), Some(HeaderValue::Integer(42)));
        assert_eq!(parse_value("   1.5D3 / double"), Some(HeaderValue::Float(1500.0)));
        assert_eq!(parse_value(" 'FELO-HEL' / spectral"), Some(HeaderValue::String("FELO-HEL".into())));
        assert_eq!(parse_value("   / only comment"), None);
    }

    #[test]
    fn scales_integer_data_and_blanks() {
        let mut cards = String::new();
        for (k, v) in [
            ("SIMPLE", "T"),
            ("BITPIX", "16"),
            ("NAXIS", "1"),
            ("NAXIS1", "3"),
            ("BSCALE", "0.5"),
            ("BZERO", "10.0"),
            ("BLANK", "-32768"),
        ] {
            cards.push_str(&format!("{k:<8}= {v:>20}{:50}", ""));
        }
        cards.push_str(&format!("{:<80}", "END"));
        let mut bytes = cards.into_bytes();
        pad_block(&mut bytes, b' ');
        for v in [4i16, -32768, -2] {
            bytes.extend_from_slice(&v.to_be_bytes());
        }
        pad_block(&mut bytes, 0);

        let image = read_primary_from(&mut Cursor::new(bytes)).unwrap();
        let values: Vec<f64> = image.data.iter().copied().collect();
        assert_eq!(values[0], 12.0);
        assert!(values[1].is_nan());
        assert_eq!(values[2], 9.0);
    }

    fn header_only(bitpix: &str, axes: &[&str]) -> Vec<u8> {
        let mut cards = String::new();
        let naxis = axes.len().to_string();
        let mut pairs = vec![("SIMPLE", "T"), ("BITPIX", bitpix), ("NAXIS", naxis.as_str())];
        let names: Vec<String> = (1..=axes.len()).map(|i| format!("NAXIS{i}")).collect();
        pairs.extend(names.iter().map(String::as_str).zip(axes.iter().copied()));
        for (k, v) in pairs {
            cards.push_str(&format!("{k:<8}= {v:>20}{:50}", ""));
        }
        cards.push_str(&format!("{:<80}", "END"));
        let mut bytes = cards.into_bytes();
        pad_block(&mut bytes, b' ');
        bytes
    }

    #[test]
    fn oversized_axes_are_rejected() {
        // 2^31 * 2^31 values fit in usize, their byte length does not
        let bytes = header_only("-64", &["2147483648", "2147483648"]);
        assert!(matches!(
            read_primary_from(&mut Cursor::new(bytes)),
            Err(FitsError::InvalidFormat(_))
        ));
    }

    #[test]
    fn absurd_axis_count_is_rejected() {
        let mut bytes = header_only("8", &[]);
        let card = format!("{:<8}= {:>20}{:50}", "NAXIS", "1000000000000", "");
        bytes[160..240].copy_from_slice(card.as_bytes());
        assert!(matches!(
            read_primary_from(&mut Cursor::new(bytes)),
            Err(FitsError::InvalidFormat(msg)) if msg == "NAXIS = 1000000000000"
        ));
    }

    #[test]
    fn missing_data_is_rejected() {
        let mut bytes = header_only("-64", &["1000000000"]);
        bytes.extend_from_slice(&[0u8; 16]);
        assert!(matches!(
            read_primary_from(&mut Cursor::new(bytes)),
            Err(FitsError::InvalidFormat(msg)) if msg.contains("truncated")
        ));
    }

    #[test]
    fn rejects_non_fits_input() {
        let bytes = vec![b'x'; BLOCK_SIZE];
        assert!(matches!(
            read_primary_from(&mut Cursor::new(bytes)),
            Err(FitsError::InvalidFormat(_))
        ));
    }
}
