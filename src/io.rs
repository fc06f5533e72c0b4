// File-level helpers for the signature/delta/patch pipeline.
//
// Wraps the streaming core with buffered I/O: base and signature inputs
// are slurped (signature generation needs the whole base; the encoder
// needs the whole record set), the target and delta sides stream through
// 64 KiB buffers. Optionally computes SHA-256 digests of the payloads
// (feature-gated behind `file-io`).

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

#[cfg(feature = "file-io")]
use sha2::Digest;

use crate::delta::{DeltaEncoder, DeltaError};
use crate::patch::{self, PatchError};
use crate::signature::{Signature, SignatureError, SignatureOptions};

const BUF_SIZE: usize = 64 * 1024; // 64 KiB

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Statistics returned by `signature_file()`.
#[derive(Debug, Clone)]
pub struct SignatureStats {
    /// Base file size in bytes.
    pub base_size: u64,
    /// Serialised signature size in bytes.
    pub sig_size: u64,
    /// Number of block records.
    pub blocks: u64,
    /// SHA-256 of the base file (if the `file-io` feature is enabled).
    pub base_sha256: Option<[u8; 32]>,
}

/// Statistics returned by `delta_file()`.
#[derive(Debug, Clone)]
pub struct DeltaStats {
    /// Signature file size in bytes.
    pub sig_size: u64,
    /// Target (new) file size in bytes.
    pub target_size: u64,
    /// Delta output size in bytes.
    pub delta_size: u64,
    /// SHA-256 of the target file (if the `file-io` feature is enabled).
    pub target_sha256: Option<[u8; 32]>,
}

/// Statistics returned by `patch_file()`.
#[derive(Debug, Clone)]
pub struct PatchStats {
    /// Base file size in bytes.
    pub base_size: u64,
    /// Delta file size in bytes.
    pub delta_size: u64,
    /// Reconstructed output size in bytes.
    pub output_size: u64,
    /// SHA-256 of the reconstructed output (if the `file-io` feature is enabled).
    pub output_sha256: Option<[u8; 32]>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error type for file-level operations.
#[derive(Debug)]
pub enum IoError {
    /// I/O error (file open, read, write).
    Io(io::Error),
    /// Signature generation or parsing error.
    Signature(SignatureError),
    /// Delta encoding error.
    Delta(DeltaError),
    /// Patch application error.
    Patch(PatchError),
}

impl std::fmt::Display for IoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Signature(e) => write!(f, "signature error: {e}"),
            Self::Delta(e) => write!(f, "delta error: {e}"),
            Self::Patch(e) => write!(f, "patch error: {e}"),
        }
    }
}

impl std::error::Error for IoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Signature(e) => Some(e),
            Self::Delta(e) => Some(e),
            Self::Patch(e) => Some(e),
        }
    }
}

impl From<io::Error> for IoError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<SignatureError> for IoError {
    fn from(e: SignatureError) -> Self {
        Self::Signature(e)
    }
}

impl From<DeltaError> for IoError {
    fn from(e: DeltaError) -> Self {
        Self::Delta(e)
    }
}

impl From<PatchError> for IoError {
    fn from(e: PatchError) -> Self {
        Self::Patch(e)
    }
}

// ---------------------------------------------------------------------------
// signature_file
// ---------------------------------------------------------------------------

/// Fingerprint `base_path` and write the serialised signature to `sig_path`.
pub fn signature_file(
    base_path: &Path,
    sig_path: &Path,
    opts: &SignatureOptions,
) -> Result<SignatureStats, IoError> {
    let base = std::fs::read(base_path)?;
    let base_size = base.len() as u64;

    let sig = Signature::generate(&base, opts)?;
    let blocks = sig.block_count() as u64;

    let sig_file = File::create(sig_path)?;
    let mut writer = BufWriter::with_capacity(BUF_SIZE, sig_file);
    sig.serialize(&mut writer)?;
    writer.flush()?;
    let sig_size = writer.into_inner().map_err(|e| e.into_error())?.metadata()?.len();

    log::debug!("signature: {base_size} base bytes -> {blocks} records, {sig_size} bytes");

    Ok(SignatureStats {
        base_size,
        sig_size,
        blocks,
        base_sha256: sha256_of(&base),
    })
}

// ---------------------------------------------------------------------------
// delta_file
// ---------------------------------------------------------------------------

/// Encode `target_path` against the signature at `sig_path`, writing the
/// delta to `delta_path`. The target streams through the encoder.
pub fn delta_file(
    sig_path: &Path,
    target_path: &Path,
    delta_path: &Path,
) -> Result<DeltaStats, IoError> {
    let sig_bytes = std::fs::read(sig_path)?;
    let sig_size = sig_bytes.len() as u64;

    let target_file = File::open(target_path)?;
    let mut target_reader = BufReader::with_capacity(BUF_SIZE, target_file);

    let delta_file = File::create(delta_path)?;
    let delta_writer = BufWriter::with_capacity(BUF_SIZE, delta_file);

    let mut encoder = DeltaEncoder::new(&sig_bytes, delta_writer)?;

    #[cfg(feature = "file-io")]
    let mut target_hasher = sha2::Sha256::new();

    let mut target_size = 0u64;
    let mut buf = vec![0u8; BUF_SIZE];
    loop {
        let n = target_reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        target_size += n as u64;
        #[cfg(feature = "file-io")]
        target_hasher.update(&buf[..n]);
        encoder.write(&buf[..n])?;
    }

    let writer = encoder.finish()?;
    let delta_size = writer.into_inner().map_err(|e| e.into_error())?.metadata()?.len();

    log::debug!("delta: {target_size} target bytes -> {delta_size} delta bytes");

    #[cfg(feature = "file-io")]
    let target_sha256 = Some(target_hasher.finalize().into());
    #[cfg(not(feature = "file-io"))]
    let target_sha256 = None;

    Ok(DeltaStats {
        sig_size,
        target_size,
        delta_size,
        target_sha256,
    })
}

// ---------------------------------------------------------------------------
// patch_file
// ---------------------------------------------------------------------------

/// Apply the delta at `delta_path` to `base_path`, writing the
/// reconstructed file to `output_path`.
pub fn patch_file(
    base_path: &Path,
    delta_path: &Path,
    output_path: &Path,
) -> Result<PatchStats, IoError> {
    let base = std::fs::read(base_path)?;
    let base_size = base.len() as u64;
    let delta = std::fs::read(delta_path)?;
    let delta_size = delta.len() as u64;

    let output_file = File::create(output_path)?;
    let mut writer = BufWriter::with_capacity(BUF_SIZE, output_file);

    #[cfg(feature = "file-io")]
    let (output_size, output_sha256) = {
        let mut hasher = sha2::Sha256::new();
        let written = {
            let mut hashing = HashingWriter {
                inner: &mut writer,
                hasher: &mut hasher,
            };
            patch::apply(&base, &delta, &mut hashing)?
        };
        (written, Some(hasher.finalize().into()))
    };

    #[cfg(not(feature = "file-io"))]
    let (output_size, output_sha256): (u64, Option<[u8; 32]>) =
        (patch::apply(&base, &delta, &mut writer)?, None);

    writer.flush()?;
    log::debug!("patch: {delta_size} delta bytes -> {output_size} output bytes");

    Ok(PatchStats {
        base_size,
        delta_size,
        output_size,
        output_sha256,
    })
}

// ---------------------------------------------------------------------------
// SHA-256 helpers (file-io feature)
// ---------------------------------------------------------------------------

#[cfg(feature = "file-io")]
fn sha256_of(data: &[u8]) -> Option<[u8; 32]> {
    let mut hasher = sha2::Sha256::new();
    hasher.update(data);
    Some(hasher.finalize().into())
}

#[cfg(not(feature = "file-io"))]
fn sha256_of(_data: &[u8]) -> Option<[u8; 32]> {
    None
}

#[cfg(feature = "file-io")]
struct HashingWriter<'a, W: Write> {
    inner: &'a mut W,
    hasher: &'a mut sha2::Sha256,
}

#[cfg(feature = "file-io")]
impl<W: Write> Write for HashingWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
