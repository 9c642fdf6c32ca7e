// src/extract/mod.rs
//! Pattern-based field slicing: item segmentation + tolerant text extraction.

pub mod segment;
pub mod text;

pub use segment::segment;
pub use text::{clean_text, first_match};
