//! Rsdelta: rsync-style delta compression in Rust.
//!
//! The crate provides:
//! - Block signatures with weak rolling and truncated MD4 strong sums
//!   (`signature`)
//! - A streaming delta encoder over the rsync delta wire format (`delta`)
//! - Patch application reconstructing the new file from base + delta
//!   (`patch`)
//! - One-shot in-memory helpers (`engine`) and file-oriented helpers (`io`)
//! - An optional CLI (`cli` feature)
//!
//! # Quick Start
//!
//! ```
//! use rsdelta::engine;
//! use rsdelta::signature::SignatureOptions;
//!
//! let base = b"hello old world";
//! let target = b"hello new world";
//!
//! let opts = SignatureOptions { block_len: 4, strong_len: 8 };
//! let sig = engine::signature(base, &opts).unwrap();
//! let delta = engine::delta(&sig, target).unwrap();
//! let restored = engine::patch(base, &delta).unwrap();
//! assert_eq!(restored, target);
//! ```

pub mod delta;
pub mod engine;
pub mod hash;
pub mod io;
pub mod patch;
pub mod signature;

#[cfg(feature = "cli")]
pub mod cli;
