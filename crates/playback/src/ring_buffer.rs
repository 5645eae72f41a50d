//! Const-generic, stack-allocated ring buffer for PCM audio samples.
//!
//! `RingBuffer<N>` stores up to `N - 1` `i32` samples without heap
//! allocation. It is a single-producer / single-consumer (SPSC) structure
//! used between the decode stage (writer) and the I2S-feed stage (reader)
//! of the main loop.
//!
//! # Design
//!
//! Two bare indices, `write` and `read`, with no separate `count` field —
//! one slot is permanently sacrificed so that `write == read` unambiguously
//! means empty. Same index-only design as the teacher's
//! `platform::dma::CircularBuffer`, carried over unchanged: there is still
//! no interrupt or DMA controller here to race the indices, since the main
//! loop calls `write_slice` once per decoded frame and `read_slice` once per
//! I2S FIFO top-up, both from the same poll iteration.
//!
//! `no_std`, no `heapless` — the backing store lives entirely on the stack
//! or in a `static`.

/// A fixed-capacity ring buffer for `i32` audio samples.
///
/// Capacity is set at compile time via the const generic `N`; the usable
/// capacity is `N - 1` (one slot is sacrificed to disambiguate full from
/// empty).
pub struct RingBuffer<const N: usize> {
    buf: [i32; N],
    /// Index of the next slot to read from.
    read: usize,
    /// Index of the next slot to write to.
    write: usize,
}

impl<const N: usize> RingBuffer<N> {
    /// Create a new, empty ring buffer.
    ///
    /// This function is `const` so that ring buffers may be stored in
    /// `static` variables without a runtime initialiser.
    pub const fn new() -> Self {
        Self {
            buf: [0i32; N],
            read: 0,
            write: 0,
        }
    }

    /// Number of samples currently available to read.
    #[allow(clippy::arithmetic_side_effects)] // bounded by N, see module docs
    pub fn available(&self) -> usize {
        if self.write >= self.read {
            self.write - self.read
        } else {
            N - self.read + self.write
        }
    }

    /// Free slots available to write, after reserving the sacrificed slot.
    #[allow(clippy::arithmetic_side_effects)] // available() <= N - 1 by construction
    pub fn free_space(&self) -> usize {
        N - self.available() - 1
    }

    /// Write a slice of samples into the buffer.
    ///
    /// # Errors
    ///
    /// Returns `Err(())` if the slice would not fit in the remaining
    /// capacity. The buffer is left unchanged on error (the write is
    /// all-or-nothing).
    #[allow(clippy::result_unit_err)] // overflow is the only error; () is sufficient
    #[allow(clippy::arithmetic_side_effects)] // index wrap via % N, bounded by the loop
    pub fn write_slice(&mut self, data: &[i32]) -> Result<(), ()> {
        if data.len() > self.free_space() {
            return Err(());
        }
        for &sample in data {
            if let Some(slot) = self.buf.get_mut(self.write) {
                *slot = sample;
            }
            self.write = (self.write + 1) % N;
        }
        Ok(())
    }

    /// Read up to `out.len()` samples from the buffer into `out`.
    ///
    /// Returns the number of samples actually read (may be less than
    /// `out.len()` if the buffer contains fewer samples than requested).
    #[allow(clippy::arithmetic_side_effects)] // index wrap via % N, bounded by the loop
    pub fn read_slice(&mut self, out: &mut [i32]) -> usize {
        let n = out.len().min(self.available());
        for slot in out.iter_mut().take(n) {
            if let Some(&sample) = self.buf.get(self.read) {
                *slot = sample;
            }
            self.read = (self.read + 1) % N;
        }
        n
    }

    /// Usable capacity: `N - 1`, one slot reserved to disambiguate full
    /// from empty.
    pub const fn capacity(&self) -> usize {
        N - 1
    }

    /// `true` when no samples are present.
    pub fn is_empty(&self) -> bool {
        self.write == self.read
    }

    /// `true` when the buffer holds its full usable capacity.
    pub fn is_full(&self) -> bool {
        self.free_space() == 0
    }
}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_buffer_reports_zero_available() {
        let rb: RingBuffer<8> = RingBuffer::new();
        assert!(rb.is_empty());
        assert_eq!(rb.available(), 0);
        assert_eq!(rb.capacity(), 7);
    }

    #[test]
    fn write_past_usable_capacity_is_rejected() {
        let mut rb: RingBuffer<8> = RingBuffer::new();
        assert!(rb.write_slice(&[0i32; 7]).is_ok());
        assert!(rb.is_full());
        assert!(rb.write_slice(&[1i32]).is_err());
    }

    #[test]
    fn indices_wrap_past_the_end_of_the_backing_array() {
        let mut rb: RingBuffer<4> = RingBuffer::new();
        for round in 0..5i32 {
            rb.write_slice(&[round, round + 1]).unwrap_or_default();
            let mut out = [0i32; 2];
            let n = rb.read_slice(&mut out);
            assert_eq!(n, 2);
            assert_eq!(out, [round, round + 1]);
        }
    }
}
