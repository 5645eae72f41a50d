//! Audio decoder abstractions — format detection, PCM frame types, codec traits.
//!
//! Individual codec bit-stream decoders (WAV/FLAC/MP3/AIFF) are external
//! collaborators, specified only by the streaming contract they must
//! satisfy: this module defines that contract — format detection and the
//! [`FrameDecoder`] trait — but not the bitstreams themselves, beyond the
//! `mp3` reference decoder in [`crate::mp3_decoder`]. The constraint of
//! `no_std` + fixed-size stack arrays is intentional: decode output buffers
//! on the PP5021C live in uncached SDRAM reachable by the DMA controller
//! and must never touch the heap.
//!
//! # Decoder crate selection rationale
//!
//! * **MP3**: `nanomp3` (pure-Rust, `no_std`, c2rust translation of minimp3
//!   with soundness fixes). `minimp3` / `minimp3-rs` carry multiple
//!   ARM-specific UB issues; `symphonia` requires `std`.
//!
//! * **FLAC / AIFF**: left to the external collaborator satisfying
//!   [`FrameDecoder`]; out of scope here per the streaming-contract split.
//!
//! * **WAV**: PCM chunks parsed directly — no third-party crate needed.

/// A decoded PCM frame — up to 4 096 samples per channel on the stack.
///
/// MP3 decodes at most 1 152 samples/channel; FLAC block size ≤ 4 096.
/// The array is always fully allocated; `len` indicates the valid suffix.
/// Samples are left-justified 32-bit signed integers (MSBs carry the audio
/// data regardless of the original bit depth).
#[derive(Clone)]
pub struct PcmFrame {
    /// Raw sample storage, left-justified 32-bit signed integers.
    pub samples: [i32; 4096],
    /// Number of valid samples in `samples` (per channel).
    pub len: usize,
    /// Sample rate in Hz (e.g. 44 100, 48 000, 96 000).
    pub sample_rate: u32,
    /// Channel count (1 = mono, 2 = stereo).
    pub channels: u8,
}

impl PcmFrame {
    /// Create a zeroed `PcmFrame` suitable for use as an output buffer.
    pub const fn zeroed() -> Self {
        Self {
            samples: [0i32; 4096],
            len: 0,
            sample_rate: 44_100,
            channels: 2,
        }
    }
}

impl Default for PcmFrame {
    /// All-zero frame, including `sample_rate`/`channels` — distinct from
    /// [`PcmFrame::zeroed`], which pre-fills the playback engine's default
    /// rate/channel count for use as a fresh output buffer.
    fn default() -> Self {
        Self {
            samples: [0i32; 4096],
            len: 0,
            sample_rate: 0,
            channels: 0,
        }
    }
}

/// Errors that a [`FrameDecoder`] may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// The input bitstream contains invalid or corrupt data.
    InvalidData,
    /// The input buffer is exhausted; no more frames can be decoded.
    EndOfStream,
    /// The codec does not support this file's parameters (e.g. DSD in a WAV decoder).
    UnsupportedFormat,
    /// The provided output buffer is too small for one decoded frame.
    BufferTooSmall,
}

/// Audio container / codec format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    /// Free Lossless Audio Codec
    Flac,
    /// MPEG Layer 3
    Mp3,
    /// Waveform Audio File Format (PCM or IEEE-float payload)
    Wav,
    /// Audio Interchange File Format (big-endian PCM)
    Aiff,
}

impl AudioFormat {
    /// Detect the audio format from a lowercase file extension.
    ///
    /// Returns `None` when the extension is not recognised.
    ///
    /// The match is case-sensitive; callers should lower-case the extension
    /// before calling this function.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "flac" => Some(Self::Flac),
            "mp3" => Some(Self::Mp3),
            "wav" => Some(Self::Wav),
            "aiff" | "aif" => Some(Self::Aiff),
            _ => None,
        }
    }
}

/// Static info about a decoder's stream, published once the container
/// header has been parsed so a decoder slot ([`crate::decoder_slots`]) can
/// compare an about-to-preload track's format against the one currently
/// playing before deciding whether a gapless swap needs a rate change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackInfo {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count (1 = mono, 2 = stereo).
    pub channels: u8,
    /// Bit depth of the source material (informational; decoders always
    /// produce left-justified 32-bit [`PcmFrame`] samples regardless).
    pub bits_per_sample: u8,
    /// Total decodable samples per channel, if known from the container
    /// header up front (e.g. a WAV `data` chunk size).
    pub total_samples: u64,
    /// Stream duration in milliseconds, derived from `total_samples` and
    /// `sample_rate` where both are known.
    pub duration_ms: u64,
    /// Container/codec format.
    pub format: AudioFormat,
    /// True if this decoder supports [`FrameDecoder::seek`].
    pub seekable: bool,
}

/// Trait for stateful, frame-by-frame audio decoders.
///
/// Each call to [`decode_frame`] consumes some bytes from `input` and writes
/// one decoded PCM frame to `output`, returning the number of input bytes
/// consumed.  Implementations must be `no_std`-safe and must not allocate.
///
/// [`decode_frame`]: FrameDecoder::decode_frame
pub trait FrameDecoder {
    /// Error type produced by this decoder.
    type Error: core::fmt::Debug;

    /// Decode one frame from `input` into `output`.
    ///
    /// # Returns
    ///
    /// `Ok(bytes_consumed)` on success, where `bytes_consumed ≤ input.len()`.
    ///
    /// # Errors
    ///
    /// Returns `Err(Self::Error)` on bitstream errors, format mismatches, or
    /// insufficient output buffer space.
    fn decode_frame(&mut self, input: &[u8], output: &mut PcmFrame) -> Result<usize, Self::Error>;

    /// Sample rate of the stream being decoded, in Hz.
    fn sample_rate(&self) -> u32;

    /// Number of audio channels in the stream.
    fn channels(&self) -> u8;

    /// Static stream info, for comparing against the currently playing
    /// track ahead of a gapless swap.
    fn track_info(&self) -> TrackInfo;

    /// Seek to `sample_index` (per channel), if the format supports random
    /// access.
    ///
    /// # Errors
    ///
    /// Returns `Err(Self::Error)` — a codec-specific "unsupported" variant —
    /// for formats that cannot seek (e.g. a bare MP3 bitstream with no seek
    /// table).
    fn seek(&mut self, sample_index: u64) -> Result<(), Self::Error>;
}
