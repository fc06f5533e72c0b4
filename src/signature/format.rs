// Signature on-disk format.
//
// Layout (big-endian throughout):
//
//   offset  size  field
//     0      4    magic: 72 73 01 36 (md4) or 72 73 01 37 (blake2)
//     4      4    block size
//     8      4    strong-sum truncation length H
//    12      —    records: repeated (weak: u32 BE) (strong: H bytes)
//
// The body must be an exact multiple of the record stride `4 + H`.

use std::io::{self, Write};

use super::{STRONG_SUM_MAX_LEN, Signature, SignatureVariant};

/// Magic for signatures carrying truncated MD4 strong sums.
pub const MD4_SIG_MAGIC: [u8; 4] = [0x72, 0x73, 0x01, 0x36];

/// Magic for signatures carrying truncated BLAKE2 strong sums
/// (recognised on parse; never generated).
pub const BLAKE2_SIG_MAGIC: [u8; 4] = [0x72, 0x73, 0x01, 0x37];

/// Fixed header length: magic + block size + strong-sum length.
pub const SIG_HEADER_LEN: usize = 12;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum SignatureError {
    /// Input ends before the 12-byte fixed header.
    ShortHeader { len: usize },
    /// Magic is neither the md4 nor the blake2 signature magic.
    UnknownVariant { magic: [u8; 4] },
    /// Header fields or body length are inconsistent.
    Malformed(String),
    /// Generation parameters out of range.
    InvalidParameters(String),
}

impl std::fmt::Display for SignatureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ShortHeader { len } => {
                write!(f, "signature too short: {len} bytes, header needs {SIG_HEADER_LEN}")
            }
            Self::UnknownVariant { magic } => write!(
                f,
                "unrecognised signature magic: {:02X} {:02X} {:02X} {:02X}",
                magic[0], magic[1], magic[2], magic[3]
            ),
            Self::Malformed(msg) => write!(f, "malformed signature: {msg}"),
            Self::InvalidParameters(msg) => write!(f, "invalid signature parameters: {msg}"),
        }
    }
}

impl std::error::Error for SignatureError {}

// ---------------------------------------------------------------------------
// Encoding / decoding
// ---------------------------------------------------------------------------

impl Signature {
    /// Serialise to the on-disk byte layout.
    pub fn to_bytes(&self) -> Vec<u8> {
        let stride = 4 + self.strong_len() as usize;
        let mut out = Vec::with_capacity(SIG_HEADER_LEN + self.block_count() * stride);
        out.extend_from_slice(match self.variant() {
            SignatureVariant::Md4 => &MD4_SIG_MAGIC,
            SignatureVariant::Blake2 => &BLAKE2_SIG_MAGIC,
        });
        out.extend_from_slice(&self.block_len().to_be_bytes());
        out.extend_from_slice(&self.strong_len().to_be_bytes());
        for index in 0..self.block_count() {
            out.extend_from_slice(&self.weak_sum(index).to_be_bytes());
            out.extend_from_slice(self.strong_sum(index));
        }
        out
    }

    /// Serialise to a writer.
    pub fn serialize<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.to_bytes())
    }

    /// Parse the on-disk byte layout.
    pub fn parse(data: &[u8]) -> Result<Self, SignatureError> {
        if data.len() < SIG_HEADER_LEN {
            return Err(SignatureError::ShortHeader { len: data.len() });
        }

        let mut magic = [0u8; 4];
        magic.copy_from_slice(&data[..4]);
        let variant = match magic {
            MD4_SIG_MAGIC => SignatureVariant::Md4,
            BLAKE2_SIG_MAGIC => SignatureVariant::Blake2,
            _ => return Err(SignatureError::UnknownVariant { magic }),
        };

        let mut field = [0u8; 4];
        field.copy_from_slice(&data[4..8]);
        let block_len = u32::from_be_bytes(field);
        field.copy_from_slice(&data[8..12]);
        let strong_len = u32::from_be_bytes(field);

        if block_len == 0 {
            return Err(SignatureError::Malformed("block size is zero".into()));
        }
        if strong_len == 0 || strong_len > STRONG_SUM_MAX_LEN {
            return Err(SignatureError::Malformed(format!(
                "strong-sum length {strong_len} out of range 1..={STRONG_SUM_MAX_LEN}"
            )));
        }

        let body = &data[SIG_HEADER_LEN..];
        let stride = 4 + strong_len as usize;
        if !body.len().is_multiple_of(stride) {
            return Err(SignatureError::Malformed(format!(
                "body of {} bytes is not a multiple of the {stride}-byte record stride",
                body.len()
            )));
        }

        let blocks = body.len() / stride;
        let mut weak_sums = Vec::with_capacity(blocks);
        let mut strong_sums = Vec::with_capacity(blocks * strong_len as usize);
        for record in body.chunks_exact(stride) {
            field.copy_from_slice(&record[..4]);
            weak_sums.push(u32::from_be_bytes(field));
            strong_sums.extend_from_slice(&record[4..]);
        }

        Ok(Signature::from_parts(
            block_len,
            strong_len,
            variant,
            weak_sums,
            strong_sums,
        ))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
