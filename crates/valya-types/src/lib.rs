//! Foundation types for Valya.
//!
//! Valya layers content-defined chunking and recursive index nodes on top of
//! a content-addressed block store. This crate holds the vocabulary every
//! other Valya crate shares.
//!
//! # Key Types
//!
//! - [`Algorithm`] — Registry of supported hash algorithms with their stable
//!   text names and numeric wire tags
//! - [`BlockId`] — Content identifier: algorithm plus digest bytes
//! - [`Block`] — Immutable byte payload paired with its derived identifier

pub mod algorithm;
pub mod block;
pub mod error;
pub mod id;

pub use algorithm::Algorithm;
pub use block::Block;
pub use error::TypeError;
pub use id::BlockId;
