//! Intel HEX loading.
//!
//! Each line is `:LLAAAATT<data>CC`. Supported record types are data (00), end of file
//! (01), extended segment address (02), start segment address (03), extended linear
//! address (04) and start linear address (05). Adjacent data records are merged into one
//! segment.

use super::{ImageLoader, LoadRequest, ParsedImage, Segment};
use crate::common::ImageError;

const FORMAT: &str = "ihex";

const REC_DATA: u8 = 0x00;
const REC_EOF: u8 = 0x01;
const REC_EXT_SEGMENT: u8 = 0x02;
const REC_START_SEGMENT: u8 = 0x03;
const REC_EXT_LINEAR: u8 = 0x04;
const REC_START_LINEAR: u8 = 0x05;

/// One decoded record.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Record {
    kind: u8,
    offset: u16,
    data: Vec<u8>,
}

/// Decodes one `:`-prefixed line, verifying length and checksum.
fn parse_record(line: &str, number: usize) -> Result<Record, ImageError> {
    let bad = |reason: &str| ImageError::malformed(FORMAT, format!("line {number}: {reason}"));

    let hex = line.strip_prefix(':').ok_or_else(|| bad("missing ':'"))?;
    if !hex.is_ascii() {
        return Err(bad("invalid hex digit"));
    }
    if hex.len() % 2 != 0 || hex.len() < 10 {
        return Err(bad("truncated record"));
    }
    let bytes = (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16))
        .collect::<Result<Vec<u8>, _>>()
        .map_err(|_| bad("invalid hex digit"))?;

    let count = bytes[0] as usize;
    if bytes.len() != count + 5 {
        return Err(bad("byte count does not match record length"));
    }
    if bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b)) != 0 {
        return Err(bad("checksum mismatch"));
    }

    Ok(Record {
        kind: bytes[3],
        offset: u16::from_be_bytes([bytes[1], bytes[2]]),
        data: bytes[4..4 + count].to_vec(),
    })
}

fn be_u16(record: &Record, number: usize) -> Result<u16, ImageError> {
    match record.data.as_slice() {
        [hi, lo] => Ok(u16::from_be_bytes([*hi, *lo])),
        _ => Err(ImageError::malformed(
            FORMAT,
            format!("line {number}: address record must carry 2 bytes"),
        )),
    }
}

fn be_u32(record: &Record, number: usize) -> Result<u32, ImageError> {
    match record.data.as_slice() {
        [a, b, c, d] => Ok(u32::from_be_bytes([*a, *b, *c, *d])),
        _ => Err(ImageError::malformed(
            FORMAT,
            format!("line {number}: start record must carry 4 bytes"),
        )),
    }
}

/// Plain-text hex-record format.
#[derive(Clone, Copy, Debug, Default)]
pub struct IntelHexLoader;

impl ImageLoader for IntelHexLoader {
    fn format(&self) -> &'static str {
        FORMAT
    }

    fn parse(&self, data: &[u8], _request: &LoadRequest) -> Result<ParsedImage, ImageError> {
        if data.first() != Some(&b':') {
            return Err(ImageError::Unrecognized(FORMAT));
        }
        let text = std::str::from_utf8(data)
            .map_err(|_| ImageError::malformed(FORMAT, "not ASCII text"))?;

        let mut segments: Vec<Segment> = Vec::new();
        let mut entry = None;
        let mut base: u64 = 0;
        let mut saw_eof = false;

        for (i, line) in text.lines().map(str::trim).enumerate() {
            let number = i + 1;
            if line.is_empty() {
                continue;
            }
            let record = parse_record(line, number)?;

            match record.kind {
                REC_DATA => {
                    let address = base + u64::from(record.offset);
                    match segments.last_mut() {
                        Some(last) if last.address + last.bytes.len() as u64 == address => {
                            last.bytes.extend_from_slice(&record.data);
                        }
                        _ => segments.push(Segment {
                            address,
                            bytes: record.data,
                        }),
                    }
                }
                REC_EOF => {
                    saw_eof = true;
                    break;
                }
                REC_EXT_SEGMENT => base = u64::from(be_u16(&record, number)?) << 4,
                REC_START_SEGMENT => {
                    let cs_ip = be_u32(&record, number)?;
                    entry = Some((u64::from(cs_ip >> 16) << 4) + u64::from(cs_ip & 0xffff));
                }
                REC_EXT_LINEAR => base = u64::from(be_u16(&record, number)?) << 16,
                REC_START_LINEAR => entry = Some(u64::from(be_u32(&record, number)?)),
                other => {
                    return Err(ImageError::Unsupported {
                        format: FORMAT,
                        reason: format!("record type {other:#04x} on line {number}"),
                    });
                }
            }
        }

        if !saw_eof {
            return Err(ImageError::malformed(FORMAT, "missing end-of-file record"));
        }

        Ok(ParsedImage { segments, entry })
    }
}
