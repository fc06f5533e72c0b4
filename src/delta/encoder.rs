// Streaming delta encoder.
//
// DeltaEncoder owns the sink and scans the new stream one byte at a time:
//   - Fill: copy input into the ring until it holds one full block, then
//     take the weak sum in one shot
//   - Rotate: before admitting each byte, probe the index with the current
//     weak sum and confirm candidates with the strong digest; a confirmed
//     match flushes pending literals, emits COPY(block * K, K) and restarts
//     the window; otherwise the evicted byte joins the pending literals and
//     the weak sum rotates
//   - Finish: probe the final full window once, roll out at most one byte,
//     drain the rest as literals, then emit END
//
// Pending literals are flushed whenever they reach one block size, bounding
// encoder memory on streams that never match.

use std::io::Write;

use crate::delta::command::{self, MAX_COMMAND_LEN};
use crate::delta::ring::RingWindow;
use crate::hash::rolling;
use crate::signature::{Signature, SignatureError, WeakSumIndex};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum DeltaError {
    /// The signature bytes handed to the encoder did not parse.
    Signature(SignatureError),
    /// A weak-sum bucket disagreed with the record it points at.
    IndexCorruption { weak: u32, block: usize },
    /// The sink reported a write error; the cause is preserved unchanged.
    Sink(std::io::Error),
}

impl std::fmt::Display for DeltaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Signature(e) => write!(f, "signature error: {e}"),
            Self::IndexCorruption { weak, block } => write!(
                f,
                "weak-sum index corruption: bucket {weak:#010X} points at block {block}"
            ),
            Self::Sink(e) => write!(f, "sink write failed: {e}"),
        }
    }
}

impl std::error::Error for DeltaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Signature(e) => Some(e),
            Self::IndexCorruption { .. } => None,
            Self::Sink(e) => Some(e),
        }
    }
}

impl From<SignatureError> for DeltaError {
    fn from(e: SignatureError) -> Self {
        Self::Signature(e)
    }
}

// ---------------------------------------------------------------------------
// DeltaEncoder
// ---------------------------------------------------------------------------

/// Streaming delta encoder over a parsed signature.
///
/// Writes the delta magic on construction, commands as matches and literal
/// runs resolve, and the END terminator on [`finish`](Self::finish).
///
/// # Example
/// ```
/// use rsdelta::delta::DeltaEncoder;
/// use rsdelta::signature::{Signature, SignatureOptions};
///
/// let base = b"aaaabbbbccccdddd";
/// let sig = Signature::generate(base, &SignatureOptions { block_len: 4, strong_len: 8 })
///     .unwrap()
///     .to_bytes();
///
/// let mut encoder = DeltaEncoder::new(&sig, Vec::new()).unwrap();
/// encoder.write(b"aaaabbbbxxccccdddd").unwrap();
/// let delta = encoder.finish().unwrap();
/// assert_eq!(&delta[..4], &[0x72, 0x73, 0x02, 0x36]);
/// ```
pub struct DeltaEncoder<W: Write> {
    sig: Signature,
    index: WeakSumIndex,
    window: RingWindow,
    weak: u32,
    pending: Vec<u8>,
    sink: W,
}

impl<W: Write> DeltaEncoder<W> {
    /// Parse `sig_bytes`, build the weak-sum index, and write the delta
    /// magic to `sink`.
    pub fn new(sig_bytes: &[u8], mut sink: W) -> Result<Self, DeltaError> {
        let sig = Signature::parse(sig_bytes)?;
        let index = WeakSumIndex::build(&sig);
        let block_len = sig.block_len() as usize;
        sink.write_all(&command::DELTA_MAGIC)
            .map_err(DeltaError::Sink)?;
        Ok(Self {
            window: RingWindow::new(block_len),
            pending: Vec::with_capacity(block_len),
            weak: 0,
            sig,
            index,
            sink,
        })
    }

    /// Append bytes of the new stream, emitting commands as they resolve.
    pub fn write(&mut self, mut data: &[u8]) -> Result<(), DeltaError> {
        loop {
            if !self.window.is_full() {
                let consumed = self.window.extend_from(data);
                data = &data[consumed..];
                if !self.window.is_full() {
                    return Ok(());
                }
                self.weak = self.window_checksum();
            }
            if data.is_empty() {
                return Ok(());
            }

            let mut restart_at = None;
            for (i, &next) in data.iter().enumerate() {
                if self.try_emit_match()? {
                    restart_at = Some(i);
                    break;
                }
                let evicted = self.window.rotate(next);
                self.weak = rolling::rotate(
                    self.weak,
                    self.window.capacity() as u32,
                    evicted,
                    next,
                );
                self.push_literal(evicted)?;
            }

            match restart_at {
                Some(i) => {
                    self.window.restart_with(data[i]);
                    // A one-byte window is already full again here.
                    self.weak = if self.window.is_full() {
                        self.window_checksum()
                    } else {
                        0
                    };
                    data = &data[i + 1..];
                }
                None => return Ok(()),
            }
        }
    }

    /// Drain the window, emit END, flush the sink and return it.
    pub fn finish(mut self) -> Result<W, DeltaError> {
        if self.window.is_full() {
            if self.try_emit_match()? {
                self.window.clear();
                self.weak = 0;
            } else {
                // The rolling identities need the pre-removal window
                // length, so only the first byte rolls out; the shrunken
                // window drains as raw literals below.
                let evicted = self.window.pop_front();
                self.weak = rolling::rollout(
                    self.weak,
                    self.window.capacity() as u32,
                    evicted,
                );
                self.push_literal(evicted)?;
            }
        }
        while !self.window.is_empty() {
            let byte = self.window.pop_front();
            self.push_literal(byte)?;
        }
        self.flush_pending()?;
        self.sink
            .write_all(&[command::OP_END])
            .map_err(DeltaError::Sink)?;
        self.sink.flush().map_err(DeltaError::Sink)?;
        Ok(self.sink)
    }

    /// Block size of the underlying signature.
    pub fn block_len(&self) -> u32 {
        self.sig.block_len()
    }

    /// Probe the index with the current weak sum; on a strong-sum
    /// confirmation, flush pending literals and emit the COPY.
    ///
    /// The caller resets the window and weak sum on `Ok(true)`.
    fn try_emit_match(&mut self) -> Result<bool, DeltaError> {
        let candidates = self.index.candidates(self.weak);
        if candidates.is_empty() {
            return Ok(false);
        }

        let (front, back) = self.window.as_slices();
        let digest = match self.sig.window_digest(front, back) {
            Some(digest) => digest,
            None => return Ok(false),
        };
        let strong_len = self.sig.strong_len() as usize;

        let mut confirmed = None;
        for &block in candidates {
            if self.sig.weak_sum(block) != self.weak {
                return Err(DeltaError::IndexCorruption {
                    weak: self.weak,
                    block,
                });
            }
            if digest[..strong_len] == *self.sig.strong_sum(block) {
                confirmed = Some(block);
                break;
            }
        }
        let Some(block) = confirmed else {
            return Ok(false);
        };

        self.flush_pending()?;
        let block_len = u64::from(self.sig.block_len());
        let mut buf = [0u8; MAX_COMMAND_LEN];
        let n = command::encode_copy(block as u64 * block_len, block_len, &mut buf);
        self.sink.write_all(&buf[..n]).map_err(DeltaError::Sink)?;
        Ok(true)
    }

    fn push_literal(&mut self, byte: u8) -> Result<(), DeltaError> {
        self.pending.push(byte);
        if self.pending.len() >= self.window.capacity() {
            self.flush_pending()?;
        }
        Ok(())
    }

    fn flush_pending(&mut self) -> Result<(), DeltaError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let mut buf = [0u8; MAX_COMMAND_LEN];
        let n = command::encode_literal_header(self.pending.len() as u64, &mut buf);
        self.sink.write_all(&buf[..n]).map_err(DeltaError::Sink)?;
        self.sink
            .write_all(&self.pending)
            .map_err(DeltaError::Sink)?;
        self.pending.clear();
        Ok(())
    }

    fn window_checksum(&self) -> u32 {
        let (front, back) = self.window.as_slices();
        rolling::checksum(rolling::checksum(0, front), back)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
