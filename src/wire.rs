//! Wire-format helpers shared by the header, question and resource record
//! codecs: name (de)compression and the handful of raw big-endian reads
//! the rest of the crate needs.

use crate::error::ServerError;
use crate::name::Name;

/// DNS names may only compress to 14 bits of pointer, RFC1035 §4.1.4.
const MAX_POINTER_HOPS: usize = 32;
const MAX_NAME_LEN: usize = 255;

pub fn get_u16(buf: &[u8], offset: usize) -> Result<u16, ServerError> {
    buf.get(offset..offset + 2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
        .ok_or(ServerError::FormatError("truncated while reading u16"))
}

pub fn get_u32(buf: &[u8], offset: usize) -> Result<u32, ServerError> {
    buf.get(offset..offset + 4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or(ServerError::FormatError("truncated while reading u32"))
}

/// Decodes a possibly-compressed name starting at `offset` in `buf`.
/// Returns the name and the offset immediately following the name *as it
/// appeared in the message* (i.e. following the first pointer, not its target).
///
/// Follows RFC1035 §4.1.4: a label either starts with the two high bits
/// `00` (a length octet, 0-63) or `11` (a 14-bit pointer to an earlier
/// offset in the message). Anything else is a format error. Pointer
/// chains are bounded by `MAX_POINTER_HOPS` and must always point
/// strictly backwards, so a cycle is impossible; both are checked anyway
/// so a corrupt or adversarial message fails closed.
pub fn decode_name(buf: &[u8], offset: usize) -> Result<(Name, usize), ServerError> {
    let mut labels: Vec<String> = Vec::new();
    let mut cursor = offset;
    let mut end_of_name: Option<usize> = None;
    let mut hops = 0usize;
    let mut total_len = 0usize;

    loop {
        let len_byte = *buf
            .get(cursor)
            .ok_or(ServerError::FormatError("truncated name"))?;

        if len_byte == 0 {
            cursor += 1;
            if end_of_name.is_none() {
                end_of_name = Some(cursor);
            }
            break;
        }

        match len_byte & 0b1100_0000 {
            0b0000_0000 => {
                let label_len = len_byte as usize;
                let start = cursor + 1;
                let end = start + label_len;
                let label_bytes = buf
                    .get(start..end)
                    .ok_or(ServerError::FormatError("truncated label"))?;
                let label = String::from_utf8_lossy(label_bytes).into_owned();
                total_len += label.len() + 1;
                if total_len > MAX_NAME_LEN {
                    return Err(ServerError::FormatError("name too long"));
                }
                labels.push(label);
                cursor = end;
            }
            0b1100_0000 => {
                let hi = (len_byte & 0b0011_1111) as usize;
                let lo = *buf
                    .get(cursor + 1)
                    .ok_or(ServerError::FormatError("truncated pointer"))? as usize;
                let pointer = (hi << 8) | lo;
                if end_of_name.is_none() {
                    end_of_name = Some(cursor + 2);
                }
                if pointer >= cursor {
                    return Err(ServerError::FormatError("name pointer does not point backwards"));
                }
                hops += 1;
                if hops > MAX_POINTER_HOPS {
                    return Err(ServerError::FormatError("name decompression exceeded pointer hop limit"));
                }
                cursor = pointer;
            }
            _ => return Err(ServerError::FormatError("reserved label type in name")),
        }
    }

    Ok((Name::from_labels(labels), end_of_name.unwrap_or(cursor)))
}

/// Encodes `name` without compression, except that when `compress_target`
/// is given the whole name is replaced by a pointer to it. This mirrors
/// the teacher crate's `DomainName::as_bytes(compress_target)` contract:
/// compression is opportunistic and name-granular, not a full
/// suffix-sharing table, which keeps the encoder simple while still
/// letting answers point their owner name back at the question.
pub fn encode_name(name: &Name, compress_target: Option<u16>) -> Vec<u8> {
    if let Some(target) = compress_target {
        return vec![0b1100_0000 | ((target >> 8) as u8), (target & 0xFF) as u8];
    }
    let mut out = Vec::new();
    for label in name.labels() {
        out.push(label.len() as u8);
        out.extend_from_slice(label.as_bytes());
    }
    out.push(0);
    out
}
