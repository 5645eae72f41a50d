//! Ping-pong DMA buffer feeding the I²S FIFO.
//!
//! Two fixed halves are handed to the DMA controller in turn: while one
//! half streams out to the WM8758 over I²S, the main loop refills the
//! other from the ring buffer/DSP chain. [`crate::exception_handlers::AUDIO_DMA_IRQ_STATE`]
//! is what the completion IRQ flips; this module owns the buffer storage
//! and the `Hal::dma_*` calls that start/stop the transfer.
//!
//! Real PP5021C DMA requires the source address to sit in the uncached
//! SDRAM alias (`hal::regs::SDRAM_UNCACHED_BASE..SDRAM_UNCACHED_END`),
//! which in turn requires linker-section placement this workspace does
//! not set up (see `DESIGN.md`) — the same simplification `boot.rs`'s
//! direct-fixed-address SDRAM smoke test already makes. `DmaDoubleBuffer`
//! therefore owns two plain `'static`-lifetime-shaped Rust arrays rather
//! than carving them out of [`alloc_pool::DmaPool`]: the pool's `alloc()`
//! borrow is scoped to the pool itself, too short-lived for a buffer that
//! must survive an entire playback session.

use hal::Hal;

use crate::exception_handlers::{AUDIO_DMA_IRQ_STATE, AUDIO_I2S_DMA_CHANNEL};

/// Stereo frames per half-buffer.
pub const HALF_BUFFER_FRAMES: usize = 2048;
/// Interleaved `i16` samples per half-buffer (`HALF_BUFFER_FRAMES * 2`).
pub const HALF_BUFFER_SAMPLES: usize = HALF_BUFFER_FRAMES * 2;

/// Two fixed-size `i16` halves DMA'd to the I²S FIFO in turn.
pub struct DmaDoubleBuffer {
    halves: [[i16; HALF_BUFFER_SAMPLES]; 2],
    running: bool,
}

impl DmaDoubleBuffer {
    /// Construct a stopped, silence-filled double buffer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            halves: [[0i16; HALF_BUFFER_SAMPLES]; 2],
            running: false,
        }
    }

    /// `true` once [`Self::start`] has configured and armed DMA.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    fn half_addr(&self, index: u8) -> u32 {
        let [h0, h1] = &self.halves;
        let ptr = if index == 0 { h0.as_ptr() } else { h1.as_ptr() };
        #[allow(clippy::cast_possible_truncation)]
        // On the real armv4t-none-eabi target, pointers are already 32-bit;
        // on host test builds the truncation is harmless (MockHal ignores
        // the address).
        {
            ptr as usize as u32
        }
    }

    /// Configure [`AUDIO_DMA_IRQ_STATE`] with both half addresses, then
    /// arm and start DMA on half 0.
    ///
    /// # Errors
    ///
    /// Propagates a HAL error from `dma_init`/`dma_start`.
    pub fn start<H: Hal>(&mut self, hal: &mut H) -> Result<(), hal::HalError> {
        let addr0 = self.half_addr(0);
        let addr1 = self.half_addr(1);
        let half_len_bytes = HALF_BUFFER_SAMPLES.saturating_mul(core::mem::size_of::<i16>());

        AUDIO_DMA_IRQ_STATE.configure(addr0, addr1, half_len_bytes as u32);
        hal.dma_init(AUDIO_I2S_DMA_CHANNEL, hal::regs::DMA_REQUEST_I2S, addr0, half_len_bytes)?;
        hal.dma_start(AUDIO_I2S_DMA_CHANNEL)?;
        self.running = true;
        Ok(())
    }

    /// Abort the DMA transfer and mark the buffer stopped.
    pub fn stop<H: Hal>(&mut self, hal: &mut H) {
        let _ = hal.dma_abort(AUDIO_I2S_DMA_CHANNEL);
        self.running = false;
    }

    /// Both halves, for priming with real audio before the first
    /// [`Self::start`] — at that point neither half is "active" yet in
    /// the sense [`AUDIO_DMA_IRQ_STATE`] tracks, so both need filling.
    pub fn priming_halves_mut(&mut self) -> (&mut [i16], &mut [i16]) {
        let [h0, h1] = &mut self.halves;
        (&mut h0[..], &mut h1[..])
    }

    /// The half the main loop should refill right now: whichever one the
    /// DMA controller is *not* currently reading from.
    pub fn refill_target_mut(&mut self) -> &mut [i16] {
        let want_half_one = AUDIO_DMA_IRQ_STATE.active_half() == 0;
        let [h0, h1] = &mut self.halves;
        if want_half_one {
            &mut h1[..]
        } else {
            &mut h0[..]
        }
    }

    /// `true` once since the last call if the IRQ has flipped halves and
    /// the non-active half needs refilling.
    pub fn refill_needed(&self) -> bool {
        AUDIO_DMA_IRQ_STATE.take_refill_needed()
    }
}

impl Default for DmaDoubleBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hal::mock::MockHal;

    #[test]
    fn new_buffer_is_stopped_and_silent() {
        let buf = DmaDoubleBuffer::new();
        assert!(!buf.is_running());
    }

    #[test]
    fn start_arms_dma_and_marks_running() {
        let mut buf = DmaDoubleBuffer::new();
        let mut mock = MockHal::new(0);
        buf.start(&mut mock).expect("start should succeed");
        assert!(buf.is_running());
    }

    #[test]
    fn stop_clears_running_flag() {
        let mut buf = DmaDoubleBuffer::new();
        let mut mock = MockHal::new(0);
        buf.start(&mut mock).expect("start");
        buf.stop(&mut mock);
        assert!(!buf.is_running());
    }

    #[test]
    fn refill_target_is_full_half_buffer_length() {
        let mut buf = DmaDoubleBuffer::new();
        let mut mock = MockHal::new(0);
        buf.start(&mut mock).expect("start");
        let target = buf.refill_target_mut();
        assert_eq!(target.len(), HALF_BUFFER_SAMPLES);
    }

    #[test]
    fn refill_needed_reflects_irq_state_and_is_consumed_once() {
        let mut buf = DmaDoubleBuffer::new();
        let mut mock = MockHal::new(0);
        buf.start(&mut mock).expect("start");
        assert!(!buf.refill_needed());
        AUDIO_DMA_IRQ_STATE.on_dma_complete();
        assert!(buf.refill_needed());
        assert!(!buf.refill_needed());
    }
}
