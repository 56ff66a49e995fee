//! Seekable pseudorandom byte stream
//!
//! This module provides a file-like source of random bytes that never holds
//! more than one block of payload in memory. It is used to synthesize large
//! uploads for storage benchmarks without materializing the object.
//!
//! # Block Addressing
//!
//! Content is derived per fixed-size block. A single seed block of random
//! bytes is generated when the stream is constructed, and block `n` is the
//! seed block with `n` added to every byte (wrapping at 256):
//!
//! ```text
//! content(n)[i] = seed[i] + (n mod 256)
//! ```
//!
//! Any absolute offset maps to `(offset / block_size, offset % block_size)`,
//! so reads at arbitrary positions cost O(1) to locate and O(block_size) to
//! derive. The most recently derived block is cached for sequential reads.
//!
//! # Reproducibility
//!
//! Each construction draws a fresh seed block, so two streams built with
//! [`BlockRandomStream::new`] produce different bytes. Within one instance,
//! the same offset always yields the same byte. Use
//! [`BlockRandomStream::with_seed`] when two instances must agree.
//!
//! # Example
//!
//! ```
//! use taskpulse::util::stream::{BlockRandomStream, Whence};
//!
//! let mut stream = BlockRandomStream::with_seed(10_000, 4096, 7);
//! let head = stream.read(100);
//! assert_eq!(head.len(), 100);
//!
//! stream.seek(0, Whence::Start);
//! assert_eq!(stream.read(100), head);
//!
//! stream.seek(0, Whence::End);
//! assert!(stream.read(1).is_empty());
//! ```

use rand::RngCore;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use std::io;

/// Default block size (1 MiB)
pub const DEFAULT_BLOCK_SIZE: usize = 1024 * 1024;

/// Reference point for [`BlockRandomStream::seek`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
    /// Offset from the beginning of the stream
    Start,
    /// Offset relative to the current position
    Current,
    /// Offset back from the end: position = total_length - offset
    End,
}

/// Block-addressed pseudorandom stream
///
/// Owns its seed block, position and one-block cache exclusively. Independent
/// instances can live on different threads; a single instance needs external
/// synchronization if shared.
pub struct BlockRandomStream {
    total_length: u64,
    position: i64,
    block_size: usize,
    seed_block: Vec<u8>,
    cached_block_id: Option<i64>,
    cached_block: Vec<u8>,
    clamp_seeks: bool,
}

impl BlockRandomStream {
    /// Create a stream of `total_length` bytes with 1 MiB blocks and a fresh seed
    pub fn new(total_length: u64) -> Self {
        Self::with_block_size(total_length, DEFAULT_BLOCK_SIZE)
    }

    /// Create a stream with a custom block size and a fresh seed
    ///
    /// # Panics
    /// Panics if `block_size` is 0
    pub fn with_block_size(total_length: u64, block_size: usize) -> Self {
        let rng = Xoshiro256PlusPlus::from_entropy();
        Self::from_rng(total_length, block_size, rng)
    }

    /// Create a stream whose seed block is derived from `seed`
    ///
    /// Two streams with the same `(block_size, seed)` produce identical bytes.
    ///
    /// # Panics
    /// Panics if `block_size` is 0
    pub fn with_seed(total_length: u64, block_size: usize, seed: u64) -> Self {
        let rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        Self::from_rng(total_length, block_size, rng)
    }

    fn from_rng(total_length: u64, block_size: usize, mut rng: Xoshiro256PlusPlus) -> Self {
        assert!(block_size > 0, "Block size must be greater than 0");
        // Positions are i64, so the end must be addressable
        let total_length = total_length.min(i64::MAX as u64);

        let mut seed_block = vec![0u8; block_size];
        rng.fill_bytes(&mut seed_block);

        Self {
            total_length,
            position: 0,
            block_size,
            seed_block,
            cached_block_id: None,
            cached_block: vec![0u8; block_size],
            clamp_seeks: false,
        }
    }

    /// Clamp every seek into `[0, total_length]` instead of allowing any position
    pub fn clamp_seeks(mut self, clamp: bool) -> Self {
        self.clamp_seeks = clamp;
        self
    }

    /// Total number of bytes the stream produces
    ///
    /// Lengths requested above `i64::MAX` are capped at `i64::MAX`.
    #[inline]
    pub fn len(&self) -> u64 {
        self.total_length
    }

    /// Check if the stream has no content at all
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.total_length == 0
    }

    /// End position as a signed offset
    #[inline]
    fn end(&self) -> i64 {
        self.total_length as i64
    }

    /// Current absolute position (may be outside `[0, len]` after an unclamped seek)
    #[inline]
    pub fn tell(&self) -> i64 {
        self.position
    }

    /// Size of one block in bytes
    #[inline]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Map an absolute position to `(block_id, offset_within_block)`
    ///
    /// Uses Euclidean division, so negative positions land in negative blocks
    /// with a non-negative offset.
    #[inline]
    pub fn block_for(&self, position: i64) -> (i64, usize) {
        let block_size = self.block_size as i64;
        (
            position.div_euclid(block_size),
            position.rem_euclid(block_size) as usize,
        )
    }

    /// Content of the given block, derived from the seed block
    pub fn content_of(&mut self, block_id: i64) -> &[u8] {
        if self.cached_block_id != Some(block_id) {
            // Truncation to u8 is the wraparound at 256.
            let shift = block_id as u8;
            for (out, &seed) in self.cached_block.iter_mut().zip(&self.seed_block) {
                *out = seed.wrapping_add(shift);
            }
            self.cached_block_id = Some(block_id);
        }
        &self.cached_block
    }

    /// Move the position
    ///
    /// Positions outside `[0, len]` are accepted unless the stream was built
    /// with [`clamp_seeks`](Self::clamp_seeks). Reads past the end return
    /// nothing; reads at negative positions produce bytes from negative blocks.
    pub fn seek(&mut self, offset: i64, whence: Whence) {
        let target = match whence {
            Whence::Start => offset,
            Whence::Current => self.position.saturating_add(offset),
            Whence::End => self.end().saturating_sub(offset),
        };

        self.position = if self.clamp_seeks {
            target.clamp(0, self.end())
        } else {
            target
        };
    }

    /// Bytes left between the position and the end (0 when at or past the end)
    #[inline]
    fn remaining(&self) -> u64 {
        let remaining = (self.total_length as i128) - (self.position as i128);
        remaining.max(0).min(u64::MAX as i128) as u64
    }

    /// Fill `buf` from the current position, returning the number of bytes written
    ///
    /// Returns fewer than `buf.len()` bytes only at the end of the stream.
    pub fn read_into(&mut self, buf: &mut [u8]) -> usize {
        let wanted = (buf.len() as u64).min(self.remaining()) as usize;
        let mut filled = 0usize;

        while filled < wanted {
            let (block_id, within) = self.block_for(self.position + filled as i64);
            let take = (self.block_size - within).min(wanted - filled);
            let block = self.content_of(block_id);
            buf[filled..filled + take].copy_from_slice(&block[within..within + take]);
            filled += take;
        }

        self.position += filled as i64;
        filled
    }

    /// Read up to `n` bytes from the current position
    ///
    /// An empty vector means end of stream; it is never an error.
    pub fn read(&mut self, n: usize) -> Vec<u8> {
        let len = (n as u64).min(self.remaining()) as usize;
        let mut out = vec![0u8; len];
        let filled = self.read_into(&mut out);
        out.truncate(filled);
        out
    }
}

impl std::fmt::Debug for BlockRandomStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockRandomStream")
            .field("total_length", &self.total_length)
            .field("position", &self.position)
            .field("block_size", &self.block_size)
            .field("cached_block_id", &self.cached_block_id)
            .field("clamp_seeks", &self.clamp_seeks)
            .finish()
    }
}

impl io::Read for BlockRandomStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.read_into(buf))
    }
}

impl io::Seek for BlockRandomStream {
    /// Standard seek semantics: `SeekFrom::End(n)` is `len + n`, and landing
    /// on a negative position is an error.
    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
        let target = match pos {
            io::SeekFrom::Start(offset) => i64::try_from(offset).unwrap_or(i64::MAX),
            io::SeekFrom::Current(delta) => self.position.saturating_add(delta),
            io::SeekFrom::End(delta) => self.end().saturating_add(delta),
        };

        if target < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "invalid seek to a negative position",
            ));
        }

        BlockRandomStream::seek(self, target, Whence::Start);
        Ok(self.position.max(0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Seek, SeekFrom};

    const BS: usize = 1024;

    #[test]
    fn test_chunking_invariance() {
        let mut whole = BlockRandomStream::with_seed(3 * BS as u64, BS, 42);
        let all = whole.read(3 * BS);
        assert_eq!(all.len(), 3 * BS);

        let mut chunked = BlockRandomStream::with_seed(3 * BS as u64, BS, 42);
        let mut pieces = Vec::new();
        for size in [1, 7, 1000, 513, 1024, 4096].iter().cycle() {
            let chunk = chunked.read(*size);
            if chunk.is_empty() {
                break;
            }
            pieces.extend_from_slice(&chunk);
        }

        assert_eq!(pieces, all);
    }

    #[test]
    fn test_seek_read_is_deterministic() {
        let mut stream = BlockRandomStream::with_block_size(3 * BS as u64, BS);

        stream.seek(900, Whence::Start);
        let first = stream.read(500);
        stream.seek(900, Whence::Start);
        let second = stream.read(500);

        assert_eq!(first.len(), 500);
        assert_eq!(first, second);
    }

    #[test]
    fn test_full_read_then_eof() {
        let total = 3 * BS as u64;
        let mut stream = BlockRandomStream::with_block_size(total, BS);

        assert_eq!(stream.read(total as usize).len() as u64, total);
        assert_eq!(stream.tell(), total as i64);
        assert!(stream.read(1).is_empty());
        assert_eq!(stream.tell(), total as i64);
    }

    #[test]
    fn test_short_read_at_end() {
        let mut stream = BlockRandomStream::with_seed(2500, BS, 1);
        stream.seek(2000, Whence::Start);
        assert_eq!(stream.read(1000).len(), 500);
    }

    #[test]
    fn test_block_content_wraps_seed() {
        let mut stream = BlockRandomStream::with_seed(u64::MAX, BS, 9);
        let seed = stream.content_of(0).to_vec();

        let block_3 = stream.content_of(3).to_vec();
        for (s, b) in seed.iter().zip(&block_3) {
            assert_eq!(*b, s.wrapping_add(3));
        }

        // 256 wraps back to the seed block
        assert_eq!(stream.content_of(256).to_vec(), seed);
    }

    #[test]
    fn test_read_crosses_block_boundary() {
        let mut stream = BlockRandomStream::with_seed(3 * BS as u64, BS, 5);
        let block0 = stream.content_of(0).to_vec();
        let block1 = stream.content_of(1).to_vec();

        stream.seek(BS as i64 - 10, Whence::Start);
        let data = stream.read(20);

        assert_eq!(&data[..10], &block0[BS - 10..]);
        assert_eq!(&data[10..], &block1[..10]);
    }

    #[test]
    fn test_block_for() {
        let stream = BlockRandomStream::with_seed(0, BS, 0);
        assert_eq!(stream.block_for(0), (0, 0));
        assert_eq!(stream.block_for(BS as i64 + 5), (1, 5));
        assert_eq!(stream.block_for(-1), (-1, BS - 1));
    }

    #[test]
    fn test_seek_whence() {
        let mut stream = BlockRandomStream::with_seed(5000, BS, 0);

        stream.seek(100, Whence::Start);
        assert_eq!(stream.tell(), 100);
        stream.seek(50, Whence::Current);
        assert_eq!(stream.tell(), 150);
        stream.seek(1000, Whence::End);
        assert_eq!(stream.tell(), 4000);
    }

    #[test]
    fn test_unclamped_seek_past_end() {
        let mut stream = BlockRandomStream::with_seed(5000, BS, 0);
        stream.seek(10_000, Whence::Start);

        assert_eq!(stream.tell(), 10_000);
        assert!(stream.read(10).is_empty());
        assert_eq!(stream.tell(), 10_000);
    }

    #[test]
    fn test_unclamped_negative_seek_reads_negative_block() {
        let mut stream = BlockRandomStream::with_seed(5000, BS, 3);
        let expected_byte = stream.content_of(-1)[BS - 4];

        stream.seek(-4, Whence::Start);
        let data = stream.read(8);

        assert_eq!(data.len(), 8);
        assert_eq!(data[0], expected_byte);
        assert_eq!(stream.tell(), 4);
    }

    #[test]
    fn test_clamped_seeks() {
        let mut stream = BlockRandomStream::with_seed(5000, BS, 0).clamp_seeks(true);

        stream.seek(-10, Whence::Start);
        assert_eq!(stream.tell(), 0);
        stream.seek(-10, Whence::End);
        assert_eq!(stream.tell(), 5000);
    }

    #[test]
    fn test_instances_reseed() {
        let mut a = BlockRandomStream::with_block_size(BS as u64, BS);
        let mut b = BlockRandomStream::with_block_size(BS as u64, BS);
        assert_ne!(a.read(BS), b.read(BS));
    }

    #[test]
    fn test_same_seed_agrees_across_instances() {
        let mut a = BlockRandomStream::with_seed(BS as u64 * 2, BS, 77);
        let mut b = BlockRandomStream::with_seed(BS as u64 * 2, BS, 77);
        assert_eq!(a.read(2 * BS), b.read(2 * BS));
    }

    #[test]
    fn test_io_read_to_end() {
        let mut stream = BlockRandomStream::with_seed(10_000, BS, 11);
        let mut out = Vec::new();
        stream.read_to_end(&mut out).unwrap();
        assert_eq!(out.len(), 10_000);
    }

    #[test]
    fn test_io_seek_semantics() {
        let mut stream = BlockRandomStream::with_seed(10_000, BS, 11);

        // Inherent seek shadows the trait method, so call through the trait.
        assert_eq!(Seek::seek(&mut stream, SeekFrom::End(-100)).unwrap(), 9_900);
        assert_eq!(Seek::seek(&mut stream, SeekFrom::Current(50)).unwrap(), 9_950);
        assert!(Seek::seek(&mut stream, SeekFrom::Current(-20_000)).is_err());
        assert_eq!(stream.tell(), 9_950);
    }

    #[test]
    fn test_huge_length_end_is_eof() {
        let mut stream = BlockRandomStream::with_seed(u64::MAX, BS, 1);
        assert_eq!(stream.len(), i64::MAX as u64);

        stream.seek(0, Whence::End);
        assert_eq!(stream.tell(), i64::MAX);
        assert!(stream.read(16).is_empty());

        stream.seek(10, Whence::End);
        assert_eq!(stream.read(16).len(), 10);
        assert_eq!(Seek::seek(&mut stream, SeekFrom::End(0)).unwrap(), i64::MAX as u64);
    }

    #[test]
    fn test_empty_stream() {
        let mut stream = BlockRandomStream::with_seed(0, BS, 0);
        assert!(stream.is_empty());
        assert!(stream.read(10).is_empty());
    }
}
