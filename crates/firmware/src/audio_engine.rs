//! Audio engine glue: [`playback::engine::PlaybackEngine`] state machine,
//! [`playback::ring_buffer::RingBuffer`] decoupling, the post-ring DSP
//! chain, and the [`crate::dma_buffer::DmaDoubleBuffer`] feed.
//!
//! Bitstream decoding itself is an external collaborator (per
//! [`playback::decoder`]'s streaming contract) — this module owns the
//! ring buffer, the buffering threshold, the underrun counter, the DSP
//! chain, and the double-buffer refill. The decode stage pushes PCM
//! samples in via [`AudioEngine::push_samples`]; the main loop calls
//! [`AudioEngine::refill_dma_if_needed`] once per iteration, mirroring
//! the concurrency contract in which the decoder and the DMA-feed both
//! run from the single cooperative main loop and the DMA-completion IRQ
//! only flips buffer halves and flags a refill
//! ([`crate::exception_handlers::AUDIO_DMA_IRQ_STATE`]).
//!
//! # Pipeline
//!
//! ```text
//! push_samples() -> ring buffer -> [resample] -> DSP chain (EQ, bass,
//! widen, ramped volume) -> dither (32->16 bit) -> DMA half-buffer
//! ```
//!
//! The DSP chain and dither run here, at refill time, never at decode
//! time — so a gapless slot swap never has to re-run them over already
//! buffered history.

use hal::Hal;
use playback::dither::Ditherer;
use playback::dsp::DspChain;
use playback::engine::{PlaybackEngine, PlaybackError, PlaybackState};
use playback::ring_buffer::RingBuffer;

use crate::dma_buffer::DmaDoubleBuffer;

/// Ring fill fraction (of usable capacity) required for `Buffering` to
/// automatically transition to `Playing`.
const BUFFERING_THRESHOLD_PERCENT: usize = 25;

/// Number of interleaved stereo samples drained from the ring buffer,
/// run through the DSP chain, and dithered per inner loop of
/// [`AudioEngine::refill_dma_if_needed`]. Kept small and stack-local so a
/// half-buffer-sized (4096-sample) refill never needs a 16 KiB scratch
/// array.
const REFILL_CHUNK_SAMPLES: usize = 64;

/// Default sample rate and volume the DSP chain starts at; updated once
/// the first track's [`playback::decoder::TrackInfo`] is known.
const DEFAULT_SAMPLE_RATE_HZ: u32 = 44_100;
const DEFAULT_VOLUME_PERCENT: u8 = 100;

/// Orchestrates playback state, the SPSC ring buffer, the DSP chain, and
/// the DMA double buffer.
///
/// `N` is the ring buffer's backing-array size (usable capacity `N - 1`
/// interleaved samples); per spec the production instantiation uses
/// 32 Ki, giving roughly 370 ms of headroom at 44.1 kHz stereo.
pub struct AudioEngine<const N: usize> {
    engine: PlaybackEngine,
    ring: RingBuffer<N>,
    dsp: DspChain,
    ditherer: Ditherer,
    dma: DmaDoubleBuffer,
    underrun_count: u32,
}

impl<const N: usize> AudioEngine<N> {
    /// Create a new engine, stopped, with an empty ring buffer, a flat
    /// DSP chain, and DMA not yet started.
    #[must_use]
    pub fn new() -> Self {
        Self {
            engine: PlaybackEngine::new(),
            ring: RingBuffer::new(),
            dsp: DspChain::new(DEFAULT_SAMPLE_RATE_HZ, DEFAULT_VOLUME_PERCENT),
            ditherer: Ditherer::default(),
            dma: DmaDoubleBuffer::new(),
            underrun_count: 0,
        }
    }

    /// Set the EQ/bass/widener gains applied by the DSP chain.
    pub fn set_eq_gains(&mut self, gains: playback::dsp::EqGains) {
        self.dsp.set_gains(gains);
    }

    /// Request a new master volume target; the DSP chain ramps toward it
    /// sample-by-sample rather than jumping.
    pub fn set_volume_target(&mut self, percent: u8) {
        self.dsp.set_volume_target(percent);
    }

    /// Re-point the DSP chain at a new sample rate, e.g. a gapless
    /// rate-change swap ([`playback::decoder_slots::SwapKind::RateChange`]).
    pub fn set_sample_rate(&mut self, sample_rate_hz: u32) {
        self.dsp.set_sample_rate(sample_rate_hz);
    }

    /// Current playback state.
    #[must_use]
    pub fn state(&self) -> PlaybackState {
        self.engine.state()
    }

    /// Total underruns observed since the engine was created (never
    /// reset — surfaced on the diagnostics screen per spec).
    #[must_use]
    pub fn underrun_count(&self) -> u32 {
        self.underrun_count
    }

    /// Reported DSP load, 0–100, fed to [`crate::power::PowerMonitor`]
    /// for CPU-profile downshift decisions. Decoding and the DSP chain
    /// dominate the load while actively playing; an idle engine reports
    /// none.
    #[must_use]
    pub fn reported_load_percent(&self) -> u8 {
        match self.engine.state() {
            PlaybackState::Playing => 70,
            PlaybackState::Buffering => 40,
            PlaybackState::Paused | PlaybackState::Stopped => 0,
        }
    }

    /// Begin pre-rolling a track: ring buffer fills from `Stopped` before
    /// the I²S feed starts.
    ///
    /// # Errors
    ///
    /// Returns `Err(PlaybackError::AlreadyPlaying)` if already playing.
    pub fn begin_buffering(&mut self) -> Result<(), PlaybackError> {
        self.engine.begin_buffering()
    }

    /// Start or resume playback immediately, bypassing the buffering
    /// threshold (used when resuming from `Paused`, where the ring is
    /// already primed).
    ///
    /// # Errors
    ///
    /// Returns `Err(PlaybackError::AlreadyPlaying)` if already playing.
    pub fn play(&mut self) -> Result<(), PlaybackError> {
        self.engine.play()
    }

    /// Pause playback; the ring buffer and position are preserved.
    ///
    /// # Errors
    ///
    /// Returns `Err(PlaybackError::NotPlaying)` if stopped.
    pub fn pause(&mut self) -> Result<(), PlaybackError> {
        self.engine.pause()
    }

    /// Stop playback, clear the ring buffer, and reset position. DMA
    /// itself is aborted lazily on the next [`Self::refill_dma_if_needed`]
    /// call, since stopping the DMA channel needs a [`Hal`] handle this
    /// method doesn't take.
    pub fn stop(&mut self) {
        let _ = self.engine.stop();
        self.ring = RingBuffer::new();
    }

    /// Push decoded samples into the ring buffer, then automatically
    /// promote `Buffering` to `Playing` once the ring reaches the 25%
    /// fill threshold.
    ///
    /// # Errors
    ///
    /// Returns `Err(())` if the ring buffer has no room for `samples`
    /// (the decode stage must back off and retry next iteration).
    #[allow(clippy::arithmetic_side_effects)] // capacity() is const and always >= 1 for any N used
    pub fn push_samples(&mut self, samples: &[i32]) -> Result<(), ()> {
        self.ring.write_slice(samples)?;
        if self.engine.state() == PlaybackState::Buffering {
            let fill_percent = self.ring.available().saturating_mul(100) / self.ring.capacity().max(1);
            if fill_percent >= BUFFERING_THRESHOLD_PERCENT {
                let _ = self.engine.play();
            }
        }
        Ok(())
    }

    /// Drain up to `target.len()` samples from `ring` through `dsp` and
    /// `ditherer` into `target`, in [`REFILL_CHUNK_SAMPLES`]-sized steps
    /// so the scratch buffer stays well under the
    /// `clippy::large_stack_arrays` threshold. Any stretch where the ring
    /// runs dry is filled with silence. Returns `true` if at least one
    /// real sample was read.
    #[allow(clippy::arithmetic_side_effects)] // chunk lengths are bounded by REFILL_CHUNK_SAMPLES
    fn drain_into(ring: &mut RingBuffer<N>, dsp: &mut DspChain, ditherer: &mut Ditherer, target: &mut [i16]) -> bool {
        let mut any_samples = false;
        for chunk in target.chunks_mut(REFILL_CHUNK_SAMPLES) {
            let mut raw = [0i32; REFILL_CHUNK_SAMPLES];
            let Some(raw_slice) = raw.get_mut(..chunk.len()) else {
                continue;
            };
            let read = ring.read_slice(raw_slice);
            if read == 0 {
                for sample in chunk.iter_mut() {
                    *sample = 0;
                }
                continue;
            }
            any_samples = true;
            if let Some(filled) = raw_slice.get_mut(..read) {
                dsp.process_buffer(filled);
                ditherer.process_slice(filled, chunk.get_mut(..read).unwrap_or(&mut []));
            }
            if let Some(tail) = chunk.get_mut(read..) {
                for sample in tail.iter_mut() {
                    *sample = 0;
                }
            }
        }
        any_samples
    }

    /// Feed the DMA double buffer from the ring buffer through the DSP
    /// chain.
    ///
    /// The first call while `Playing` primes both halves synchronously
    /// (there is no completed transfer yet to trigger a refill) and
    /// starts DMA. Every call after that only does work once the
    /// completion IRQ has flagged a refill
    /// ([`crate::exception_handlers::DmaIrqState::take_refill_needed`]),
    /// filling whichever half just went idle.
    ///
    /// An empty ring buffer writes silence and bumps
    /// [`Self::underrun_count`] rather than stalling: the DMA continues
    /// regardless, per the concurrency contract's "DMA continues playing
    /// silence" rule.
    ///
    /// # Errors
    ///
    /// Propagates a DMA HAL error from starting or re-priming the
    /// transfer.
    pub fn refill_dma_if_needed<H: Hal>(&mut self, hal: &mut H) -> Result<(), hal::HalError> {
        if self.engine.state() != PlaybackState::Playing {
            if self.dma.is_running() {
                self.dma.stop(hal);
            }
            return Ok(());
        }

        if !self.dma.is_running() {
            let (h0, h1) = self.dma.priming_halves_mut();
            let first = Self::drain_into(&mut self.ring, &mut self.dsp, &mut self.ditherer, h0);
            let second = Self::drain_into(&mut self.ring, &mut self.dsp, &mut self.ditherer, h1);
            if !first && !second {
                self.underrun_count = self.underrun_count.saturating_add(1);
            }
            self.dma.start(hal)?;
            return Ok(());
        }

        if !self.dma.refill_needed() {
            return Ok(());
        }

        let target = self.dma.refill_target_mut();
        if !Self::drain_into(&mut self.ring, &mut self.dsp, &mut self.ditherer, target) {
            self.underrun_count = self.underrun_count.saturating_add(1);
        }
        Ok(())
    }
}

impl<const N: usize> Default for AudioEngine<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hal::mock::MockHal;

    #[test]
    fn starts_stopped_with_no_underruns() {
        let engine: AudioEngine<64> = AudioEngine::new();
        assert_eq!(engine.state(), PlaybackState::Stopped);
        assert_eq!(engine.underrun_count(), 0);
    }

    #[test]
    fn buffering_promotes_to_playing_at_threshold() {
        let mut engine: AudioEngine<256> = AudioEngine::new();
        engine.begin_buffering().expect("begin buffering");
        // Usable capacity is 255; 25% of that is ~63 samples.
        let samples = [1i32; 70];
        engine.push_samples(&samples).expect("push should succeed");
        assert_eq!(engine.state(), PlaybackState::Playing);
    }

    #[test]
    fn buffering_stays_buffering_below_threshold() {
        let mut engine: AudioEngine<256> = AudioEngine::new();
        engine.begin_buffering().expect("begin buffering");
        let samples = [1i32; 10];
        engine.push_samples(&samples).expect("push should succeed");
        assert_eq!(engine.state(), PlaybackState::Buffering);
    }

    #[test]
    fn refill_writes_silence_and_counts_underrun_when_ring_empty() {
        let mut engine: AudioEngine<64> = AudioEngine::new();
        engine.play().expect("play should succeed");
        let mut mock = MockHal::new(0);
        engine
            .refill_dma_if_needed(&mut mock)
            .expect("refill should succeed");
        assert_eq!(engine.underrun_count(), 1);
    }

    #[test]
    fn refill_drains_ring_without_underrun() {
        let mut engine: AudioEngine<64> = AudioEngine::new();
        engine.begin_buffering().expect("begin buffering");
        engine.push_samples(&[0x7FFF_0000u32 as i32; 20]).expect("push");
        engine.play().expect("play should succeed");
        let mut mock = MockHal::new(0);
        engine
            .refill_dma_if_needed(&mut mock)
            .expect("refill should succeed");
        assert_eq!(engine.underrun_count(), 0);
    }

    #[test]
    fn stop_clears_ring_and_resets_state() {
        let mut engine: AudioEngine<64> = AudioEngine::new();
        engine.play().expect("play should succeed");
        engine.push_samples(&[1i32; 4]).expect("push");
        engine.stop();
        assert_eq!(engine.state(), PlaybackState::Stopped);
    }
}
