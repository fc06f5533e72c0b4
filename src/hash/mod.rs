// Checksum primitives for block matching.
//
// This module provides:
// - The 32-bit weak rolling checksum (adler-style low/high pair with a
//   per-byte constant offset), with whole-buffer, rotate-by-one and
//   rollout updates

pub mod rolling;
