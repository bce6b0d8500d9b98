//! Fixed-capacity chunk buffering between audio producers and consumers.
//!
//! [`CircularChunkBuffer`] reconciles variable-cadence producer pushes with
//! fixed-size consumer reads: a capture or decode path pushes whole chunks,
//! a playback path pops them in FIFO order (or drains everything at once).

pub mod circular;

pub use circular::{CircularChunkBuffer, RECOMMENDED_CHUNK_CAPACITY};
