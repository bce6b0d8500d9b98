//! Fixed-capacity circular buffer of same-sized audio chunks.

use tracing::trace;

use crate::error::{Result, VoiceLinkError};

/// Chunk capacity that works well for engines without native streamed PCM
/// playback. Latency cost is `capacity × frame duration` (18 × 20 ms =
/// 360 ms) in exchange for glitch resistance.
pub const RECOMMENDED_CHUNK_CAPACITY: usize = 18;

/// A fixed-capacity ring of same-sized chunks.
///
/// Pushed chunks accumulate in a contiguous backing store and are served
/// out in FIFO order, either one chunk at a time or as the entire filled
/// region at once. Chunks handed out are copies, never views — callers may
/// mutate them freely.
///
/// ## Backpressure
///
/// Pushing into a full buffer silently drops the chunk: a producer running
/// faster than its consumer loses newest data rather than blocking or
/// growing unboundedly. Drops are counted in [`dropped_chunks`] for
/// diagnostics.
///
/// ## Thread safety
///
/// No operation is internally synchronized. The buffer is safe only under
/// a single-producer/single-consumer discipline enforced by the caller;
/// concurrent push and read without external locking is undefined.
///
/// [`dropped_chunks`]: CircularChunkBuffer::dropped_chunks
#[derive(Debug, Clone)]
pub struct CircularChunkBuffer<T> {
    /// Backing store of `chunk_size * chunk_capacity` elements. Buffered
    /// chunks always occupy a prefix of `chunks_available * chunk_size`.
    store: Vec<T>,
    chunk_size: usize,
    chunk_capacity: usize,
    chunks_available: usize,
    dropped_chunks: u64,
}

impl<T: Copy + Default> CircularChunkBuffer<T> {
    /// Create a buffer holding up to `chunk_capacity` chunks of
    /// `chunk_size` elements each, zero-initialized and empty.
    ///
    /// # Panics
    /// Panics if `chunk_size == 0` or `chunk_capacity == 0`.
    pub fn new(chunk_size: usize, chunk_capacity: usize) -> Self {
        assert!(chunk_size > 0, "chunk_size must be positive");
        assert!(chunk_capacity >= 1, "chunk_capacity must be at least 1");

        Self {
            store: vec![T::default(); chunk_size * chunk_capacity],
            chunk_size,
            chunk_capacity,
            chunks_available: 0,
            dropped_chunks: 0,
        }
    }

    /// Create a buffer with [`RECOMMENDED_CHUNK_CAPACITY`] chunks.
    ///
    /// # Panics
    /// Panics if `chunk_size == 0`.
    pub fn with_recommended_capacity(chunk_size: usize) -> Self {
        Self::new(chunk_size, RECOMMENDED_CHUNK_CAPACITY)
    }

    /// Push one chunk into the buffer.
    ///
    /// Silently drops the chunk when the buffer is full (see the
    /// backpressure note on the type).
    ///
    /// # Errors
    /// `VoiceLinkError::InvalidChunkSize` if `chunk.len()` does not equal
    /// the buffer's chunk size; buffer state is unchanged.
    pub fn push_chunk(&mut self, chunk: &[T]) -> Result<()> {
        if chunk.len() != self.chunk_size {
            return Err(VoiceLinkError::InvalidChunkSize {
                got: chunk.len(),
                expected: self.chunk_size,
            });
        }

        if self.is_full() {
            self.dropped_chunks += 1;
            trace!(
                dropped_chunks = self.dropped_chunks,
                chunk_capacity = self.chunk_capacity,
                "buffer full — chunk dropped"
            );
            return Ok(());
        }

        let start = self.buffer_available();
        self.store[start..start + self.chunk_size].copy_from_slice(chunk);
        self.chunks_available += 1;
        Ok(())
    }

    /// Pop the oldest chunk as a freshly allocated copy.
    ///
    /// # Errors
    /// `VoiceLinkError::NoChunksAvailable` if the buffer is empty.
    pub fn read_chunk(&mut self) -> Result<Vec<T>> {
        if !self.can_read_chunk() {
            return Err(VoiceLinkError::NoChunksAvailable);
        }

        let chunk = self.store[..self.chunk_size].to_vec();
        self.pop_front();
        Ok(chunk)
    }

    /// Pop the oldest chunk into caller-supplied storage starting at
    /// `offset`.
    ///
    /// # Errors
    /// `VoiceLinkError::NoChunksAvailable` if the buffer is empty.
    ///
    /// # Panics
    /// Panics if `target` cannot hold one chunk at `offset`.
    pub fn read_chunk_to(&mut self, target: &mut [T], offset: usize) -> Result<()> {
        if !self.can_read_chunk() {
            return Err(VoiceLinkError::NoChunksAvailable);
        }

        target[offset..offset + self.chunk_size].copy_from_slice(&self.store[..self.chunk_size]);
        self.pop_front();
        Ok(())
    }

    /// Drain the entire filled region as one contiguous copy, leaving the
    /// buffer empty.
    ///
    /// Legal at any fill level, but waiting until [`is_full`] avoids
    /// consuming partial data prematurely.
    ///
    /// [`is_full`]: CircularChunkBuffer::is_full
    pub fn read_all(&mut self) -> Vec<T> {
        let available = self.buffer_available();
        self.chunks_available = 0;
        self.store[..available].to_vec()
    }

    /// Drain the entire filled region into caller-supplied storage starting
    /// at `offset`. Returns the number of elements copied.
    ///
    /// # Panics
    /// Panics if `target` cannot hold the filled region at `offset`.
    pub fn read_all_to(&mut self, target: &mut [T], offset: usize) -> usize {
        let available = self.buffer_available();
        target[offset..offset + available].copy_from_slice(&self.store[..available]);
        self.chunks_available = 0;
        available
    }

    /// Number of buffered elements (`chunks_available × chunk_size`).
    pub fn buffer_available(&self) -> usize {
        self.chunks_available * self.chunk_size
    }

    /// Total backing-store length in elements.
    pub fn buffer_len(&self) -> usize {
        self.store.len()
    }

    /// Element count of one chunk.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Maximum number of chunks the buffer can hold.
    pub fn chunk_capacity(&self) -> usize {
        self.chunk_capacity
    }

    /// Number of full chunks currently stored.
    pub fn chunks_available(&self) -> usize {
        self.chunks_available
    }

    /// Whether every chunk slot is occupied.
    pub fn is_full(&self) -> bool {
        self.buffer_available() == self.store.len()
    }

    /// Whether at least one chunk can be read.
    pub fn can_read_chunk(&self) -> bool {
        self.chunks_available > 0
    }

    /// Chunks discarded by pushes into a full buffer since construction.
    pub fn dropped_chunks(&self) -> u64 {
        self.dropped_chunks
    }

    /// Discard the front chunk, shifting the remaining filled region left.
    fn pop_front(&mut self) {
        let available = self.buffer_available();
        self.store.copy_within(self.chunk_size..available, 0);
        self.chunks_available -= 1;
    }
}
