// Block signatures: per-block weak/strong fingerprints over a base file.
//
// A signature partitions the base into fixed-size blocks and records, for
// each block, the weak rolling checksum and a truncated MD4 digest. The
// delta encoder probes blocks by weak sum and confirms candidates with the
// strong sum before emitting a COPY.
//
// # Modules
//
// - `format` — on-disk encoding/decoding (magic, header, record stride)
// - `index`  — weak-sum to block-index lookup table

pub mod format;
pub mod index;

pub use format::SignatureError;
pub use index::WeakSumIndex;

use md4::{Digest, Md4};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::hash::rolling;

/// Byte length of the full strong digest (MD4).
pub const STRONG_SUM_MAX_LEN: u32 = 16;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Parameters for signature generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureOptions {
    /// Block size in bytes. Every block of the base is this long except
    /// possibly the last.
    pub block_len: u32,
    /// Leading bytes of the strong digest retained per record (1..=16).
    pub strong_len: u32,
}

impl Default for SignatureOptions {
    fn default() -> Self {
        Self {
            block_len: 2048,
            strong_len: 8,
        }
    }
}

// ---------------------------------------------------------------------------
// Variant
// ---------------------------------------------------------------------------

/// Strong-digest family recorded in the signature magic.
///
/// Generation always produces `Md4`. `Blake2` signatures are accepted on
/// parse for interchange, but match confirmation stays on the MD4 family,
/// so candidates never confirm against them and deltas computed from such
/// signatures fall back to literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureVariant {
    Md4,
    Blake2,
}

// ---------------------------------------------------------------------------
// Signature
// ---------------------------------------------------------------------------

/// An immutable block signature of a base file.
///
/// Records are stored column-wise: one `u32` weak sum per block plus a flat
/// strong-sum buffer with `strong_len` bytes per block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    block_len: u32,
    strong_len: u32,
    variant: SignatureVariant,
    weak_sums: Vec<u32>,
    strong_sums: Vec<u8>,
}

impl Signature {
    /// Fingerprint `base` into block records.
    pub fn generate(base: &[u8], opts: &SignatureOptions) -> Result<Self, SignatureError> {
        validate_options(opts)?;
        let mut sig = Self::with_capacity(opts, base.len());
        for block in base.chunks(opts.block_len as usize) {
            let digest = md4_digest(block);
            sig.push_record(rolling::checksum(0, block), &digest);
        }
        Ok(sig)
    }

    /// Fingerprint `base`, computing block records in parallel.
    ///
    /// Produces a signature identical to [`Signature::generate`].
    #[cfg(feature = "parallel")]
    pub fn generate_parallel(base: &[u8], opts: &SignatureOptions) -> Result<Self, SignatureError> {
        validate_options(opts)?;
        let records: Vec<(u32, [u8; 16])> = base
            .par_chunks(opts.block_len as usize)
            .map(|block| (rolling::checksum(0, block), md4_digest(block)))
            .collect();
        let mut sig = Self::with_capacity(opts, base.len());
        for (weak, digest) in records {
            sig.push_record(weak, &digest);
        }
        Ok(sig)
    }

    fn with_capacity(opts: &SignatureOptions, base_len: usize) -> Self {
        let blocks = base_len.div_ceil(opts.block_len as usize);
        Self {
            block_len: opts.block_len,
            strong_len: opts.strong_len,
            variant: SignatureVariant::Md4,
            weak_sums: Vec::with_capacity(blocks),
            strong_sums: Vec::with_capacity(blocks * opts.strong_len as usize),
        }
    }

    pub(crate) fn push_record(&mut self, weak: u32, digest: &[u8]) {
        self.weak_sums.push(weak);
        self.strong_sums
            .extend_from_slice(&digest[..self.strong_len as usize]);
    }

    pub(crate) fn from_parts(
        block_len: u32,
        strong_len: u32,
        variant: SignatureVariant,
        weak_sums: Vec<u32>,
        strong_sums: Vec<u8>,
    ) -> Self {
        Self {
            block_len,
            strong_len,
            variant,
            weak_sums,
            strong_sums,
        }
    }

    /// Block size the base was partitioned with.
    pub fn block_len(&self) -> u32 {
        self.block_len
    }

    /// Retained strong-sum length per record.
    pub fn strong_len(&self) -> u32 {
        self.strong_len
    }

    /// Digest family recorded in the magic.
    pub fn variant(&self) -> SignatureVariant {
        self.variant
    }

    /// Number of block records.
    pub fn block_count(&self) -> usize {
        self.weak_sums.len()
    }

    /// Weak sum of block `index`.
    pub fn weak_sum(&self, index: usize) -> u32 {
        self.weak_sums[index]
    }

    pub(crate) fn weak_sums(&self) -> &[u32] {
        &self.weak_sums
    }

    /// Truncated strong sum of block `index`.
    pub fn strong_sum(&self, index: usize) -> &[u8] {
        let stride = self.strong_len as usize;
        &self.strong_sums[index * stride..(index + 1) * stride]
    }

    /// Strong digest of a window presented as two in-order ring slices.
    ///
    /// Returns `None` for the `Blake2` variant: generation is MD4-only, so
    /// there is no digest to confirm those records with.
    pub(crate) fn window_digest(&self, front: &[u8], back: &[u8]) -> Option<[u8; 16]> {
        match self.variant {
            SignatureVariant::Md4 => {
                let mut hasher = Md4::new();
                hasher.update(front);
                hasher.update(back);
                Some(hasher.finalize().into())
            }
            SignatureVariant::Blake2 => None,
        }
    }
}

fn validate_options(opts: &SignatureOptions) -> Result<(), SignatureError> {
    if opts.block_len == 0 {
        return Err(SignatureError::InvalidParameters(
            "block size must be at least 1".into(),
        ));
    }
    if opts.strong_len == 0 || opts.strong_len > STRONG_SUM_MAX_LEN {
        return Err(SignatureError::InvalidParameters(format!(
            "strong-sum length {} out of range 1..={STRONG_SUM_MAX_LEN}",
            opts.strong_len
        )));
    }
    Ok(())
}

fn md4_digest(block: &[u8]) -> [u8; 16] {
    let mut hasher = Md4::new();
    hasher.update(block);
    hasher.finalize().into()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    #[test]
    fn block_count_rounds_up() {
        let opts = SignatureOptions {
            block_len: 4,
            strong_len: 8,
        };
        assert_eq!(Signature::generate(b"", &opts).unwrap().block_count(), 0);
        assert_eq!(Signature::generate(b"abcd", &opts).unwrap().block_count(), 1);
        assert_eq!(
            Signature::generate(b"abcde", &opts).unwrap().block_count(),
            2
        );
    }

    #[test]
    fn tail_block_covers_remainder_only() {
        let opts = SignatureOptions {
            block_len: 4,
            strong_len: 16,
        };
        let sig = Signature::generate(b"abcdefgh-tail", &opts).unwrap();
        assert_eq!(sig.block_count(), 4);
        assert_eq!(sig.weak_sum(3), rolling::checksum(0, b"tail"));
        assert_eq!(sig.strong_sum(3), md4_digest(b"tail"));
    }

    #[test]
    fn strong_sum_is_md4_prefix() {
        // MD4("abc") = a448017aaf21d8525fc10ae87aa6729d
        let opts = SignatureOptions {
            block_len: 3,
            strong_len: 16,
        };
        let sig = Signature::generate(b"abc", &opts).unwrap();
        assert_eq!(hex(sig.strong_sum(0)), "a448017aaf21d8525fc10ae87aa6729d");

        let truncated = Signature::generate(
            b"abc",
            &SignatureOptions {
                block_len: 3,
                strong_len: 4,
            },
        )
        .unwrap();
        assert_eq!(hex(truncated.strong_sum(0)), "a448017a");
    }

    #[test]
    fn window_digest_matches_contiguous_digest() {
        let opts = SignatureOptions {
            block_len: 8,
            strong_len: 8,
        };
        let sig = Signature::generate(b"12345678", &opts).unwrap();
        let whole = sig.window_digest(b"12345678", b"").unwrap();
        let split = sig.window_digest(b"123", b"45678").unwrap();
        assert_eq!(whole, split);
        assert_eq!(&whole[..8], sig.strong_sum(0));
    }

    #[test]
    fn generate_rejects_bad_parameters() {
        let base = b"data";
        assert!(matches!(
            Signature::generate(
                base,
                &SignatureOptions {
                    block_len: 0,
                    strong_len: 8
                }
            ),
            Err(SignatureError::InvalidParameters(_))
        ));
        assert!(matches!(
            Signature::generate(
                base,
                &SignatureOptions {
                    block_len: 4,
                    strong_len: 0
                }
            ),
            Err(SignatureError::InvalidParameters(_))
        ));
        assert!(matches!(
            Signature::generate(
                base,
                &SignatureOptions {
                    block_len: 4,
                    strong_len: 17
                }
            ),
            Err(SignatureError::InvalidParameters(_))
        ));
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn parallel_generation_is_identical() {
        let base: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();
        let opts = SignatureOptions {
            block_len: 64,
            strong_len: 8,
        };
        let seq = Signature::generate(&base, &opts).unwrap();
        let par = Signature::generate_parallel(&base, &opts).unwrap();
        assert_eq!(seq.to_bytes(), par.to_bytes());
    }
}
