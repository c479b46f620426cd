//! Frame ingestion sources.
//!
//! Frames come from numbered still images on local disk:
//! `basename + printf(pattern, index) + extension`.
//!
//! The ingestion layer is responsible for:
//! - Rendering the frame index into a file name
//! - Decoding the file into an RGB `Frame`
//! - Reporting a missing or undecodable file as the end of the sequence
//!
//! The ingestion layer MUST NOT:
//! - Cache or prefetch frames
//! - Treat a missing file as an error

mod format;
pub mod sequence;

pub use format::IndexFormat;
pub use sequence::{ImageSequence, SequenceConfig, SequenceStats};
