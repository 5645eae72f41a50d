//! WAV (RIFF/WAVE) PCM decoder — the reference/test decoder for the
//! streaming pipeline, since a WAV file is just its PCM samples plus a
//! small fixed header: no entropy coding, no bitstream synchronization to
//! get wrong. [`WavDecoder`] is therefore also the one decoder the
//! round-trip property in the playback pipeline's test suite can check
//! bit-exactly.
//!
//! Only PCM-tagged (`audio_format == 1`), 16-bit WAV is supported; anything
//! else (IEEE float, ADPCM, 8/24/32-bit PCM) reports
//! [`DecodeError::UnsupportedFormat`]. The `fmt ` chunk must precede
//! `data`, as it always does in practice.

use crate::decoder::{AudioFormat, DecodeError, FrameDecoder, PcmFrame, TrackInfo};

fn le_u16(bytes: &[u8], offset: usize) -> Option<u16> {
    Some(u16::from_le_bytes(
        bytes.get(offset..offset.checked_add(2)?)?.try_into().ok()?,
    ))
}

fn le_u32(bytes: &[u8], offset: usize) -> Option<u32> {
    Some(u32::from_le_bytes(
        bytes.get(offset..offset.checked_add(4)?)?.try_into().ok()?,
    ))
}

/// Streaming WAV decoder. Call [`FrameDecoder::decode_frame`] repeatedly
/// with successive windows of the file's bytes (starting at byte 0); the
/// first call(s) parse the RIFF header and produce no samples, after which
/// every call decodes as many whole stereo/mono frames as `input`,
/// `output`, and the remaining `data` chunk all have room for.
pub struct WavDecoder {
    sample_rate: u32,
    channels: u8,
    bits_per_sample: u16,
    data_chunk_len: u32,
    consumed_data_bytes: u64,
    header_parsed: bool,
}

impl WavDecoder {
    /// Create a decoder with no header parsed yet.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            sample_rate: 0,
            channels: 0,
            bits_per_sample: 0,
            data_chunk_len: 0,
            consumed_data_bytes: 0,
            header_parsed: false,
        }
    }

    fn bytes_per_frame(&self) -> usize {
        2usize.saturating_mul(usize::from(self.channels.max(1)))
    }

    fn remaining_data_bytes(&self) -> u64 {
        u64::from(self.data_chunk_len).saturating_sub(self.consumed_data_bytes)
    }

    /// Walk RIFF chunks until `fmt ` then `data` are found. Returns the
    /// byte offset of the first PCM sample (the count of bytes consumed by
    /// the header) on success.
    fn parse_header(&mut self, input: &[u8]) -> Result<usize, DecodeError> {
        if input.get(0..4) != Some(b"RIFF".as_slice()) {
            return Err(DecodeError::InvalidData);
        }
        if input.get(8..12) != Some(b"WAVE".as_slice()) {
            return Err(DecodeError::InvalidData);
        }

        let mut pos = 12usize;
        let mut have_fmt = false;

        loop {
            let id = input.get(pos..pos.checked_add(4).ok_or(DecodeError::InvalidData)?);
            let chunk_size = le_u32(input, pos.checked_add(4).ok_or(DecodeError::InvalidData)?)
                .ok_or(DecodeError::InvalidData)?;
            let body_start = pos.checked_add(8).ok_or(DecodeError::InvalidData)?;

            match id {
                Some(b"fmt ") => {
                    let audio_format =
                        le_u16(input, body_start).ok_or(DecodeError::InvalidData)?;
                    if audio_format != 1 {
                        return Err(DecodeError::UnsupportedFormat);
                    }
                    let channels = u8::try_from(
                        le_u16(input, body_start.checked_add(2).ok_or(DecodeError::InvalidData)?)
                            .ok_or(DecodeError::InvalidData)?,
                    )
                    .map_err(|_| DecodeError::UnsupportedFormat)?;
                    let sample_rate =
                        le_u32(input, body_start.checked_add(4).ok_or(DecodeError::InvalidData)?)
                            .ok_or(DecodeError::InvalidData)?;
                    let bits_per_sample = le_u16(
                        input,
                        body_start.checked_add(14).ok_or(DecodeError::InvalidData)?,
                    )
                    .ok_or(DecodeError::InvalidData)?;

                    self.channels = channels;
                    self.sample_rate = sample_rate;
                    self.bits_per_sample = bits_per_sample;
                    have_fmt = true;
                }
                Some(b"data") => {
                    if !have_fmt {
                        return Err(DecodeError::InvalidData);
                    }
                    if self.bits_per_sample != 16 {
                        return Err(DecodeError::UnsupportedFormat);
                    }
                    self.data_chunk_len = chunk_size;
                    self.header_parsed = true;
                    return Ok(body_start);
                }
                _ => {}
            }

            // RIFF chunks are word-aligned: an odd-sized chunk carries one
            // pad byte before the next chunk header.
            let padded_size = chunk_size.saturating_add(chunk_size % 2);
            let next =
                body_start.saturating_add(usize::try_from(padded_size).unwrap_or(usize::MAX));
            if next <= pos || next >= input.len() {
                return Err(DecodeError::InvalidData);
            }
            pos = next;
        }
    }
}

impl Default for WavDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder for WavDecoder {
    type Error = DecodeError;

    fn decode_frame(&mut self, input: &[u8], output: &mut PcmFrame) -> Result<usize, Self::Error> {
        if !self.header_parsed {
            let consumed = self.parse_header(input)?;
            output.len = 0;
            output.sample_rate = self.sample_rate;
            output.channels = self.channels;
            return Ok(consumed);
        }

        if self.remaining_data_bytes() == 0 {
            return Err(DecodeError::EndOfStream);
        }

        let channels = usize::from(self.channels.max(1));
        let bytes_per_frame = self.bytes_per_frame();
        let max_output_frames = output.samples.len() / channels;
        if max_output_frames == 0 {
            return Err(DecodeError::BufferTooSmall);
        }

        let max_input_frames = input.len() / bytes_per_frame;
        let max_remaining_frames =
            usize::try_from(self.remaining_data_bytes() / bytes_per_frame as u64)
                .unwrap_or(usize::MAX);
        let frames = max_input_frames.min(max_output_frames).min(max_remaining_frames);

        for (dst_frame, src_frame) in output
            .samples
            .chunks_exact_mut(channels)
            .zip(input.chunks_exact(bytes_per_frame))
            .take(frames)
        {
            for (dst, src_sample) in dst_frame.iter_mut().zip(src_frame.chunks_exact(2)) {
                let lo = *src_sample.first().unwrap_or(&0);
                let hi = *src_sample.get(1).unwrap_or(&0);
                let sample16 = i16::from_le_bytes([lo, hi]);
                *dst = i32::from(sample16) << 16;
            }
        }

        output.len = frames;
        output.sample_rate = self.sample_rate;
        output.channels = self.channels;

        let consumed = frames.saturating_mul(bytes_per_frame);
        self.consumed_data_bytes = self.consumed_data_bytes.saturating_add(consumed as u64);
        Ok(consumed)
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn channels(&self) -> u8 {
        self.channels
    }

    fn track_info(&self) -> TrackInfo {
        let channels = u64::from(self.channels.max(1));
        let total_samples = u64::from(self.data_chunk_len) / 2 / channels.max(1);
        let duration_ms = if self.sample_rate == 0 {
            0
        } else {
            total_samples.saturating_mul(1000) / u64::from(self.sample_rate)
        };
        TrackInfo {
            sample_rate: self.sample_rate,
            channels: self.channels,
            bits_per_sample: self.bits_per_sample as u8,
            total_samples,
            duration_ms,
            format: AudioFormat::Wav,
            seekable: true,
        }
    }

    /// Reposition the `data`-chunk read cursor to `sample_index` (per
    /// channel). The header must already have been parsed.
    ///
    /// This only updates the decoder's notion of how many `data`-chunk
    /// bytes remain (used by [`Self::decode_frame`] to bound how many
    /// frames it will produce and to detect end-of-stream); the caller
    /// still owns the byte stream and must itself start passing
    /// `decode_frame` bytes from the corresponding file offset.
    fn seek(&mut self, sample_index: u64) -> Result<(), Self::Error> {
        if !self.header_parsed {
            return Err(DecodeError::InvalidData);
        }
        let bytes_per_frame = self.bytes_per_frame() as u64;
        let target = sample_index.saturating_mul(bytes_per_frame);
        if target > u64::from(self.data_chunk_len) {
            return Err(DecodeError::InvalidData);
        }
        self.consumed_data_bytes = target;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::indexing_slicing, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;

    /// Build a minimal 16-bit PCM WAV file in memory from interleaved
    /// samples.
    fn build_wav(sample_rate: u32, channels: u16, samples: &[i16]) -> Vec<u8> {
        let bytes_per_sample = 2u16;
        let block_align = bytes_per_sample * channels;
        let byte_rate = sample_rate * u32::from(block_align);
        let data_bytes = (samples.len() * 2) as u32;

        let mut out = Vec::new();
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data_bytes).to_le_bytes());
        out.extend_from_slice(b"WAVE");

        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes()); // PCM
        out.extend_from_slice(&channels.to_le_bytes());
        out.extend_from_slice(&sample_rate.to_le_bytes());
        out.extend_from_slice(&byte_rate.to_le_bytes());
        out.extend_from_slice(&block_align.to_le_bytes());
        out.extend_from_slice(&16u16.to_le_bytes()); // bits per sample

        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_bytes.to_le_bytes());
        for s in samples {
            out.extend_from_slice(&s.to_le_bytes());
        }
        out
    }

    #[test]
    fn parses_header_and_reports_track_info() {
        let samples = [100i16, -100, 200, -200];
        let wav = build_wav(44_100, 2, &samples);

        let mut decoder = WavDecoder::new();
        let mut output = PcmFrame::zeroed();
        let consumed = decoder.decode_frame(&wav, &mut output).expect("header parse");
        assert_eq!(consumed, 44); // 12 (RIFF/WAVE) + 8 + 16 (fmt) + 8 (data header)
        assert_eq!(output.len, 0);

        let info = decoder.track_info();
        assert_eq!(info.sample_rate, 44_100);
        assert_eq!(info.channels, 2);
        assert_eq!(info.total_samples, 2);
        assert!(info.seekable);
    }

    #[test]
    fn round_trip_decode_is_bit_exact() {
        let samples = [1000i16, -1000, 2000, -2000, 3000, -3000];
        let wav = build_wav(44_100, 2, &samples);

        let mut decoder = WavDecoder::new();
        let mut output = PcmFrame::zeroed();
        let header_len = decoder.decode_frame(&wav, &mut output).expect("header parse");

        let pcm_bytes = &wav[header_len..];
        let mut frame = PcmFrame::zeroed();
        let consumed = decoder.decode_frame(pcm_bytes, &mut frame).expect("decode data");
        assert_eq!(consumed, pcm_bytes.len());
        assert_eq!(frame.len, 3);

        let decoded: Vec<i16> = frame.samples[..frame.len * 2]
            .iter()
            .map(|&s| (s >> 16) as i16)
            .collect();
        assert_eq!(decoded, samples);
    }

    #[test]
    fn seek_caps_remaining_frames_by_position() {
        // 3 stereo frames; seek past the first two, leaving one behind.
        let samples = [10i16, 20, 30, 40, 50, 60];
        let wav = build_wav(44_100, 2, &samples);

        let mut decoder = WavDecoder::new();
        let mut output = PcmFrame::zeroed();
        let header_len = decoder.decode_frame(&wav, &mut output).expect("header parse");

        decoder.seek(2).expect("seek to frame 2");
        let pcm_bytes = &wav[header_len + 2 * 4..];
        let mut frame = PcmFrame::zeroed();
        let consumed = decoder
            .decode_frame(pcm_bytes, &mut frame)
            .expect("decode last frame");
        assert_eq!(frame.len, 1);
        assert_eq!(consumed, 4);
    }

    #[test]
    fn rejects_non_pcm_format_tag() {
        let mut wav = build_wav(44_100, 2, &[0, 0]);
        // Flip the fmt audio_format tag (offset 20) away from PCM (1).
        wav[20] = 3;
        let mut decoder = WavDecoder::new();
        let mut output = PcmFrame::zeroed();
        assert_eq!(
            decoder.decode_frame(&wav, &mut output),
            Err(DecodeError::UnsupportedFormat)
        );
    }

    #[test]
    fn rejects_missing_riff_tag() {
        let mut decoder = WavDecoder::new();
        let mut output = PcmFrame::zeroed();
        assert_eq!(
            decoder.decode_frame(b"not a wav file at all!!", &mut output),
            Err(DecodeError::InvalidData)
        );
    }
}
