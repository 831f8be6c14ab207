//! RIFF/WAVE PCM encoding and decoding.
//!
//! The encoder writes the canonical 44-byte header followed by interleaved
//! little-endian PCM. The byte layout is fully determined by
//! [`AudioContainerParams`]; nothing is inferred from the sample data.
//!
//! The decoder walks the RIFF chunk list, so files carrying extra chunks
//! (`LIST`, `fact`, ...) decode as long as they contain PCM `fmt ` and `data`.

use loopcam_core::{LoopCamError, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Size of the canonical header written by the encoder.
pub const HEADER_LEN: usize = 44;

/// Bit depths the encoder and decoder accept.
pub const SUPPORTED_BIT_DEPTHS: [u16; 4] = [8, 16, 24, 32];

const FORMAT_PCM: u16 = 1;
const FMT_CHUNK_LEN: u32 = 16;

/// The four values that determine a WAV buffer's byte layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioContainerParams {
    /// Frames per second (Hz).
    pub sample_rate: u32,
    /// Interleaved channels per frame.
    pub channel_count: u16,
    /// One of 8, 16, 24 or 32.
    pub bits_per_sample: u16,
    /// Clip length in seconds.
    pub duration_seconds: f64,
}

impl AudioContainerParams {
    /// Create validated parameters.
    pub fn new(
        sample_rate: u32,
        channel_count: u16,
        bits_per_sample: u16,
        duration_seconds: f64,
    ) -> Result<Self> {
        let params = Self {
            sample_rate,
            channel_count,
            bits_per_sample,
            duration_seconds,
        };
        params.validate()?;
        Ok(params)
    }

    /// Check every field and that the clip holds at least one frame.
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(LoopCamError::InvalidParameters(
                "sample rate must be positive".into(),
            ));
        }
        if self.channel_count == 0 {
            return Err(LoopCamError::InvalidParameters(
                "channel count must be positive".into(),
            ));
        }
        if !SUPPORTED_BIT_DEPTHS.contains(&self.bits_per_sample) {
            return Err(LoopCamError::InvalidParameters(format!(
                "unsupported bit depth {}",
                self.bits_per_sample
            )));
        }
        if !(self.duration_seconds.is_finite() && self.duration_seconds > 0.0) {
            return Err(LoopCamError::InvalidParameters(format!(
                "duration must be positive, got {}",
                self.duration_seconds
            )));
        }
        // The frame count has to fit the u32 sizes of the header.
        let frames = (self.sample_rate as f64 * self.duration_seconds).round();
        if frames > u32::MAX as f64 {
            return Err(LoopCamError::InvalidParameters(format!(
                "{} s at {} Hz is too long",
                self.duration_seconds, self.sample_rate
            )));
        }
        if frames < 1.0 {
            return Err(LoopCamError::EmptyDuration(format!(
                "{} s at {} Hz",
                self.duration_seconds, self.sample_rate
            )));
        }
        let block_align = self.checked_block_align().ok_or_else(|| {
            LoopCamError::InvalidParameters(format!(
                "{} channels at {} bits overflow the block align",
                self.channel_count, self.bits_per_sample
            ))
        })?;
        if self
            .sample_rate
            .checked_mul(u32::from(block_align))
            .is_none()
        {
            return Err(LoopCamError::InvalidParameters(format!(
                "{} Hz overflows the byte rate",
                self.sample_rate
            )));
        }
        // ChunkSize is a u32 covering everything after the first 8 bytes.
        let riff_size = (frames as u64)
            .checked_mul(u64::from(block_align))
            .and_then(|data| data.checked_add(HEADER_LEN as u64 - 8));
        if !matches!(riff_size, Some(size) if size <= u32::MAX as u64) {
            return Err(LoopCamError::InvalidParameters(format!(
                "{frames} frames exceed the RIFF size limit"
            )));
        }
        Ok(())
    }

    /// Frames per channel, rounded to the nearest whole frame.
    pub fn frame_count(&self) -> usize {
        (self.sample_rate as f64 * self.duration_seconds).round() as usize
    }

    pub fn bytes_per_sample(&self) -> usize {
        (self.bits_per_sample / 8) as usize
    }

    fn checked_block_align(&self) -> Option<u16> {
        self.channel_count.checked_mul(self.bits_per_sample / 8)
    }

    /// Bytes per interleaved frame. Saturates for parameters that fail
    /// [`validate`](Self::validate).
    pub fn block_align(&self) -> u16 {
        self.channel_count.saturating_mul(self.bits_per_sample / 8)
    }

    pub fn byte_rate(&self) -> u32 {
        self.sample_rate.saturating_mul(u32::from(self.block_align()))
    }

    /// Size of the PCM payload in bytes.
    pub fn data_size(&self) -> usize {
        self.frame_count().saturating_mul(self.block_align() as usize)
    }

    /// Total encoded length including the header.
    pub fn encoded_len(&self) -> usize {
        HEADER_LEN.saturating_add(self.data_size())
    }

    /// Inclusive `(min, max)` of a signed sample at this bit depth.
    pub fn sample_range(&self) -> (i32, i32) {
        sample_range(self.bits_per_sample)
    }
}

fn sample_range(bits: u16) -> (i32, i32) {
    let half = 1i64 << (bits - 1);
    (-half as i32, (half - 1) as i32)
}

/// Scale an amplitude in [-1, 1] to a signed integer sample.
///
/// The positive half maps onto `2^(bits-1) - 1` and the negative half onto
/// `2^(bits-1)`, so both extremes are reachable. Rounds to nearest; values
/// outside [-1, 1] clamp and NaN becomes silence.
pub fn quantize(amplitude: f32, bits_per_sample: u16) -> i32 {
    if amplitude.is_nan() {
        return 0;
    }
    let (min, max) = sample_range(bits_per_sample);
    let a = amplitude.clamp(-1.0, 1.0) as f64;
    let scaled = if a >= 0.0 {
        a * max as f64
    } else {
        a * -(min as f64)
    };
    scaled.round().clamp(min as f64, max as f64) as i32
}

/// Inverse of [`quantize`]: map a signed sample back to [-1, 1].
pub fn dequantize(sample: i32, bits_per_sample: u16) -> f32 {
    let half = (1i64 << (bits_per_sample - 1)) as f64;
    (sample as f64 / half) as f32
}

fn write_header(buf: &mut Vec<u8>, params: &AudioContainerParams, data_size: u32) {
    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&(data_size + (HEADER_LEN as u32 - 8)).to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&FMT_CHUNK_LEN.to_le_bytes());
    buf.extend_from_slice(&FORMAT_PCM.to_le_bytes());
    buf.extend_from_slice(&params.channel_count.to_le_bytes());
    buf.extend_from_slice(&params.sample_rate.to_le_bytes());
    buf.extend_from_slice(&params.byte_rate().to_le_bytes());
    buf.extend_from_slice(&params.block_align().to_le_bytes());
    buf.extend_from_slice(&params.bits_per_sample.to_le_bytes());

    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_size.to_le_bytes());
}

/// Append one sample in the wire format for `bits`.
/// 8-bit PCM is unsigned offset-binary; wider depths are signed.
fn push_sample(buf: &mut Vec<u8>, sample: i32, bits: u16) {
    match bits {
        8 => buf.push((sample + 128) as u8),
        16 => buf.extend_from_slice(&(sample as i16).to_le_bytes()),
        24 => buf.extend_from_slice(&sample.to_le_bytes()[..3]),
        _ => buf.extend_from_slice(&sample.to_le_bytes()),
    }
}

fn read_sample(bytes: &[u8], bits: u16) -> i32 {
    match bits {
        8 => bytes[0] as i32 - 128,
        16 => i16::from_le_bytes([bytes[0], bytes[1]]) as i32,
        // Place the three bytes in the high end, then arithmetic-shift back
        // down to sign-extend.
        24 => i32::from_le_bytes([0, bytes[0], bytes[1], bytes[2]]) >> 8,
        _ => i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
    }
}

/// Encode a clip from a sample function `f(frame_index, channel) -> amplitude`.
pub fn encode<F>(params: &AudioContainerParams, mut sample: F) -> Result<Vec<u8>>
where
    F: FnMut(usize, u16) -> f32,
{
    params.validate()?;
    let mut buf = Vec::with_capacity(params.encoded_len());
    write_header(&mut buf, params, params.data_size() as u32);
    for frame in 0..params.frame_count() {
        for channel in 0..params.channel_count {
            let value = quantize(sample(frame, channel), params.bits_per_sample);
            push_sample(&mut buf, value, params.bits_per_sample);
        }
    }
    debug_assert_eq!(buf.len(), params.encoded_len());
    Ok(buf)
}

/// Encode a clip whose every channel carries the same signal `f(frame_index)`.
pub fn encode_mono<F>(params: &AudioContainerParams, mut sample: F) -> Result<Vec<u8>>
where
    F: FnMut(usize) -> f32,
{
    let mut current = (usize::MAX, 0.0f32);
    encode(params, |frame, _| {
        if current.0 != frame {
            current = (frame, sample(frame));
        }
        current.1
    })
}

/// Encode pre-quantized interleaved PCM.
///
/// `samples` must hold exactly `frame_count * channel_count` values, each in
/// the signed range of the bit depth. Out-of-range values are rejected
/// rather than wrapped.
pub fn encode_pcm(params: &AudioContainerParams, samples: &[i32]) -> Result<Vec<u8>> {
    params.validate()?;
    let expected = params.frame_count() * params.channel_count as usize;
    if samples.len() != expected {
        return Err(LoopCamError::InvalidParameters(format!(
            "expected {expected} samples, got {}",
            samples.len()
        )));
    }
    let (min, max) = params.sample_range();
    if let Some((idx, bad)) = samples
        .iter()
        .enumerate()
        .find(|(_, &s)| s < min || s > max)
    {
        return Err(LoopCamError::InvalidParameters(format!(
            "sample {idx} = {bad} outside {}-bit range",
            params.bits_per_sample
        )));
    }
    let mut buf = Vec::with_capacity(params.encoded_len());
    write_header(&mut buf, params, params.data_size() as u32);
    for &s in samples {
        push_sample(&mut buf, s, params.bits_per_sample);
    }
    Ok(buf)
}

/// Parameters of [`fallback_silence`]: 0.1 s of 44.1 kHz mono 16-bit.
pub const FALLBACK_PARAMS: AudioContainerParams = AudioContainerParams {
    sample_rate: 44_100,
    channel_count: 1,
    bits_per_sample: 16,
    duration_seconds: 0.1,
};

/// A short, well-formed, all-zero clip. Cannot fail.
pub fn fallback_silence() -> Vec<u8> {
    let data_size = FALLBACK_PARAMS.data_size();
    let mut buf = Vec::with_capacity(HEADER_LEN + data_size);
    write_header(&mut buf, &FALLBACK_PARAMS, data_size as u32);
    buf.resize(HEADER_LEN + data_size, 0);
    buf
}

/// Sample rate of the generated placeholder tone.
pub const PLACEHOLDER_SAMPLE_RATE: u32 = 44_100;
/// Tempo used when the caller has none.
pub const PLACEHOLDER_DEFAULT_BPM: f32 = 120.0;

/// Placeholder clip used when audio generation is unavailable: a sine at
/// `bpm / 60` Hz with amplitude 0.5, 44.1 kHz mono 16-bit.
///
/// Falls back to [`fallback_silence`] when the duration is unusable, so it
/// never fails either.
pub fn placeholder_tone(bpm: Option<f32>, duration_seconds: f64) -> Vec<u8> {
    let bpm = bpm
        .filter(|b| b.is_finite() && *b > 0.0)
        .unwrap_or(PLACEHOLDER_DEFAULT_BPM);
    let frequency = bpm as f64 / 60.0;
    let params = AudioContainerParams {
        sample_rate: PLACEHOLDER_SAMPLE_RATE,
        channel_count: 1,
        bits_per_sample: 16,
        duration_seconds,
    };
    let rate = params.sample_rate as f64;
    match encode_mono(&params, |i| {
        ((std::f64::consts::TAU * frequency * i as f64 / rate).sin() * 0.5) as f32
    }) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, "placeholder tone failed, using silence");
            fallback_silence()
        }
    }
}

/// Location of the PCM payload inside a WAV buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WavHeader {
    pub params: AudioContainerParams,
    /// Byte offset of the first PCM sample.
    pub data_offset: usize,
    /// Length of the PCM payload in bytes.
    pub data_len: usize,
}

fn decode_err(msg: impl Into<String>) -> LoopCamError {
    LoopCamError::DecodeError(msg.into())
}

fn le_u16(b: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([b[at], b[at + 1]])
}

fn le_u32(b: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([b[at], b[at + 1], b[at + 2], b[at + 3]])
}

/// Parse and validate the chunk structure of a WAV buffer.
pub fn read_header(bytes: &[u8]) -> Result<WavHeader> {
    if bytes.len() < 12 {
        return Err(decode_err(format!("{} bytes is too short", bytes.len())));
    }
    if &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
        return Err(decode_err("not a RIFF/WAVE container"));
    }
    // Some writers leave ChunkSize at 0 or u32::MAX when streaming; only
    // trust it when it fits inside the buffer.
    let riff_end = (le_u32(bytes, 4) as usize)
        .checked_add(8)
        .filter(|&end| end >= 12 && end <= bytes.len())
        .unwrap_or(bytes.len());

    let mut fmt: Option<(u16, u16, u32, u16, u16)> = None;
    let mut data: Option<(usize, usize)> = None;
    let mut pos = 12;
    while pos + 8 <= riff_end {
        let id = &bytes[pos..pos + 4];
        let len = le_u32(bytes, pos + 4) as usize;
        let body = pos + 8;
        match id {
            b"fmt " => {
                if len < 16 || body.saturating_add(16) > riff_end {
                    return Err(decode_err("truncated fmt chunk"));
                }
                fmt = Some((
                    le_u16(bytes, body),
                    le_u16(bytes, body + 2),
                    le_u32(bytes, body + 4),
                    le_u16(bytes, body + 12),
                    le_u16(bytes, body + 14),
                ));
            }
            b"data" => {
                if !matches!(body.checked_add(len), Some(end) if end <= riff_end) {
                    return Err(decode_err(format!(
                        "data chunk declares {len} bytes, {} available",
                        riff_end - body
                    )));
                }
                data = Some((body, len));
                break;
            }
            _ => {}
        }
        // Chunks are padded to even length.
        pos = body.saturating_add(len).saturating_add(len & 1);
    }

    let (format, channels, rate, block_align, bits) =
        fmt.ok_or_else(|| decode_err("missing fmt chunk"))?;
    let (data_offset, data_len) = data.ok_or_else(|| decode_err("missing data chunk"))?;

    if format != FORMAT_PCM {
        return Err(decode_err(format!("unsupported audio format {format}")));
    }
    if channels == 0 || rate == 0 {
        return Err(decode_err("zero channels or sample rate"));
    }
    if !SUPPORTED_BIT_DEPTHS.contains(&bits) {
        return Err(decode_err(format!("unsupported bit depth {bits}")));
    }
    // Widened so hostile channel counts cannot overflow.
    if u32::from(block_align) != u32::from(channels) * u32::from(bits / 8) {
        return Err(decode_err(format!("inconsistent block align {block_align}")));
    }
    if data_len == 0 {
        return Err(decode_err("empty data chunk"));
    }
    if data_len % block_align as usize != 0 {
        return Err(decode_err("data chunk is not a whole number of frames"));
    }

    let frames = data_len / block_align as usize;
    Ok(WavHeader {
        params: AudioContainerParams {
            sample_rate: rate,
            channel_count: channels,
            bits_per_sample: bits,
            duration_seconds: frames as f64 / rate as f64,
        },
        data_offset,
        data_len,
    })
}

/// Decode to signed integer PCM, interleaved.
pub fn decode_pcm(bytes: &[u8]) -> Result<(AudioContainerParams, Vec<i32>)> {
    let header = read_header(bytes)?;
    let width = header.params.bytes_per_sample();
    let payload = &bytes[header.data_offset..header.data_offset + header.data_len];
    let samples = payload
        .chunks_exact(width)
        .map(|chunk| read_sample(chunk, header.params.bits_per_sample))
        .collect();
    Ok((header.params, samples))
}

/// A decoded clip: interleaved samples normalized to [-1, 1].
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    pub params: AudioContainerParams,
    pub samples: Vec<f32>,
}

impl DecodedAudio {
    pub fn channels(&self) -> usize {
        self.params.channel_count as usize
    }

    /// Frames per channel.
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels()
    }

    pub fn duration_seconds(&self) -> f64 {
        self.frames() as f64 / self.params.sample_rate as f64
    }

    /// Fold one frame down to a stereo pair. Mono is duplicated; with more
    /// than two channels, even channels go left and odd channels right.
    pub fn stereo_frame(&self, frame: usize) -> (f32, f32) {
        let ch = self.channels();
        let base = frame * ch;
        match ch {
            1 => {
                let s = self.samples[base];
                (s, s)
            }
            2 => (self.samples[base], self.samples[base + 1]),
            _ => {
                let (mut l, mut r) = (0.0, 0.0);
                for (i, s) in self.samples[base..base + ch].iter().enumerate() {
                    if i % 2 == 0 {
                        l += s;
                    } else {
                        r += s;
                    }
                }
                (l / ch.div_ceil(2) as f32, r / (ch / 2) as f32)
            }
        }
    }
}

/// Decode a WAV buffer for playback.
pub fn decode(bytes: &[u8]) -> Result<DecodedAudio> {
    let (params, pcm) = decode_pcm(bytes)?;
    let bits = params.bits_per_sample;
    Ok(DecodedAudio {
        params,
        samples: pcm.into_iter().map(|s| dequantize(s, bits)).collect(),
    })
}
