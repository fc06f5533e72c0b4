// Delta generation against a block signature (rsync delta wire format).
//
// # Modules
//
// - `command` — delta magic, command opcodes, LITERAL/COPY/END emission
// - `ring`    — the fixed-capacity sliding window over the new stream
// - `encoder` — the streaming encoder tying window, index and sink together

pub mod command;
pub mod encoder;
pub mod ring;

// Re-export key types for convenience.
pub use command::DELTA_MAGIC;
pub use encoder::{DeltaEncoder, DeltaError};
