//! Content hashing for cairn.
//!
//! Wraps BLAKE3 with a domain tag per kind of stored content. No custom
//! cryptography.

pub mod hasher;

pub use hasher::ContentHasher;
