// Minimal DER TLV utilities for precertificate TBS surgery
//
// x509-parser reads certificates but cannot re-emit them, and removing the
// poison extension or substituting the issuer name requires splicing TLVs
// out of the TBSCertificate and recomputing the enclosing lengths. Only
// definite-length encodings are accepted (DER forbids indefinite lengths).

use crate::error::CtError;
use crate::Result;

/// DER tag for SEQUENCE
pub const TAG_SEQUENCE: u8 = 0x30;
/// DER tag for OCTET STRING
pub const TAG_OCTET_STRING: u8 = 0x04;
/// Context tag [0], the optional TBS version field
pub const TAG_CONTEXT_0: u8 = 0xA0;
/// Context tag [3], the TBS extensions wrapper
pub const TAG_CONTEXT_3: u8 = 0xA3;

/// One decoded TLV: its tag, full encoded bytes and content window
#[derive(Debug, Clone, Copy)]
pub struct Tlv<'a> {
    pub tag: u8,
    /// The complete TLV including tag and length bytes
    pub raw: &'a [u8],
    /// The value bytes only
    pub content: &'a [u8],
}

/// Read one TLV from the front of `input`, returning it and the rest
pub fn read_tlv(input: &[u8]) -> Result<(Tlv<'_>, &[u8])> {
    if input.len() < 2 {
        return Err(CtError::malformed("DER element truncated"));
    }
    let tag = input[0];
    let first = input[1];

    let (length, header_len) = if first & 0x80 == 0 {
        (usize::from(first), 2)
    } else {
        let num_bytes = usize::from(first & 0x7F);
        if num_bytes == 0 {
            return Err(CtError::malformed("Indefinite DER length is not allowed"));
        }
        if num_bytes > 4 || input.len() < 2 + num_bytes {
            return Err(CtError::malformed("Unsupported or truncated DER length"));
        }
        let mut length = 0usize;
        for byte in &input[2..2 + num_bytes] {
            length = (length << 8) | usize::from(*byte);
        }
        (length, 2 + num_bytes)
    };

    let total = header_len
        .checked_add(length)
        .ok_or_else(|| CtError::malformed("DER length overflow"))?;
    if input.len() < total {
        return Err(CtError::malformed(format!(
            "DER element declares {} content bytes, {} available",
            length,
            input.len() - header_len
        )));
    }

    let tlv = Tlv {
        tag,
        raw: &input[..total],
        content: &input[header_len..total],
    };
    Ok((tlv, &input[total..]))
}

/// Split a value into its consecutive child TLVs, consuming it exactly
pub fn read_children(mut content: &[u8]) -> Result<Vec<Tlv<'_>>> {
    let mut children = Vec::new();
    while !content.is_empty() {
        let (child, rest) = read_tlv(content)?;
        children.push(child);
        content = rest;
    }
    Ok(children)
}

/// Emit a tag and a minimally encoded definite length
pub fn write_header(out: &mut Vec<u8>, tag: u8, length: usize) {
    out.push(tag);
    if length < 0x80 {
        out.push(length as u8);
    } else {
        let bytes = length.to_be_bytes();
        let skip = bytes.iter().take_while(|b| **b == 0).count();
        out.push(0x80 | (bytes.len() - skip) as u8);
        out.extend_from_slice(&bytes[skip..]);
    }
}

/// Wrap content bytes in a TLV with the given tag
pub fn wrap(tag: u8, content: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(content.len() + 6);
    write_header(&mut out, tag, content.len());
    out.extend_from_slice(content);
    out
}

/// Unwrap a single OCTET STRING, consuming the input exactly
pub fn parse_octet_string(input: &[u8]) -> Result<&[u8]> {
    let (tlv, rest) = read_tlv(input)?;
    if tlv.tag != TAG_OCTET_STRING {
        return Err(CtError::malformed(format!(
            "Expected OCTET STRING (0x04), found tag 0x{:02X}",
            tlv.tag
        )));
    }
    if !rest.is_empty() {
        return Err(CtError::malformed("Trailing bytes after OCTET STRING"));
    }
    Ok(tlv.content)
}
