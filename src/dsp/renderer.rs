//! WAV renderer — encodes a SampleBuffer as canonical RIFF/WAVE PCM16.

use crate::config::{SymphonyConfig, SynthConfig};
use crate::error::{EngineError, EngineResult};

use super::buffer::SampleBuffer;
use super::graph;
use super::symphony;

/// Size of the canonical header (RIFF + fmt + data chunk headers).
pub const HEADER_SIZE: usize = 44;

/// Render a synthesis graph and encode it as WAV bytes.
pub fn render_wav(config: &SynthConfig) -> EngineResult<Vec<u8>> {
    let buffer = graph::render(config)?;
    encode_wav(&buffer)
}

/// Render the eighteen-gate symphony and encode it as WAV bytes.
pub fn render_symphony_wav(config: &SymphonyConfig) -> EngineResult<Vec<u8>> {
    let buffer = symphony::render_symphony(config)?;
    encode_wav(&buffer)
}

/// Quantize one sample: clamp to [-1, 1], scale negatives by 32768 and
/// the rest by 32767, truncate toward zero. NaN encodes as 0.
pub fn to_pcm16(sample: f64) -> i16 {
    let s = sample.clamp(-1.0, 1.0);
    let scaled = if s < 0.0 { s * 32768.0 } else { s * 32767.0 };
    scaled as i16
}

/// The size-dependent fields of a PCM16 header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HeaderFields {
    byte_rate: u32,
    block_align: u16,
    data_size: u32,
    file_size: u32,
}

impl HeaderFields {
    /// Every field is computed in u64 and must fit its 32-bit slot.
    fn new(sample_rate: u32, channels: u8, frames: usize) -> EngineResult<Self> {
        let channels = channels as u64;
        let byte_rate = sample_rate as u64 * channels * 2;
        let data_size = (frames as u64).saturating_mul(channels * 2);
        let file_size = data_size.saturating_add(36);
        Ok(HeaderFields {
            byte_rate: fit_u32("byte rate", byte_rate)?,
            // channels <= 255
            block_align: (channels * 2) as u16,
            data_size: fit_u32("data size", data_size)?,
            file_size: fit_u32("RIFF size", file_size)?,
        })
    }
}

fn fit_u32(field: &'static str, value: u64) -> EngineResult<u32> {
    u32::try_from(value).map_err(|_| EngineError::WavFieldOverflow { field, value })
}

/// Encode a buffer as 16-bit PCM WAV, frames interleaved channel 0 first.
///
/// Fails if the sample rate, channel count or length cannot be described
/// by the 32-bit header fields.
pub fn encode_wav(buffer: &SampleBuffer) -> EngineResult<Vec<u8>> {
    let channels = buffer.channels();
    let sample_rate = buffer.sample_rate();
    let bits_per_sample: u16 = 16;
    let fields = HeaderFields::new(sample_rate, channels, buffer.frames())?;

    let mut buf = Vec::with_capacity(HEADER_SIZE + fields.data_size as usize);

    // RIFF header
    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&fields.file_size.to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    // fmt chunk
    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
    buf.extend_from_slice(&1u16.to_le_bytes()); // PCM format
    buf.extend_from_slice(&(channels as u16).to_le_bytes());
    buf.extend_from_slice(&sample_rate.to_le_bytes());
    buf.extend_from_slice(&fields.byte_rate.to_le_bytes());
    buf.extend_from_slice(&fields.block_align.to_le_bytes());
    buf.extend_from_slice(&bits_per_sample.to_le_bytes());

    // data chunk
    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&fields.data_size.to_le_bytes());
    for frame in 0..buffer.frames() {
        for ch in buffer.samples() {
            buf.extend_from_slice(&to_pcm16(ch[frame]).to_le_bytes());
        }
    }

    Ok(buf)
}

/// Decode WAV data (PCM 16/24/32 or float) into a SampleBuffer.
///
/// Integer samples are normalized by their positive full scale
/// (32767 for 16-bit, 2147483647 for 32-bit).
#[cfg(feature = "native")]
pub fn read_wav<R: std::io::Read>(reader: R) -> EngineResult<SampleBuffer> {
    let mut reader = hound::WavReader::new(reader)?;
    let spec = reader.spec();
    let channels = spec.channels as usize;
    if channels == 0 {
        return Err(EngineError::InvalidChannelCount(0));
    }

    let interleaved: Vec<f64> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|s| s.map(f64::from))
            .collect::<Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let full_scale = match spec.bits_per_sample {
                16 => i16::MAX as f64,
                32 => i32::MAX as f64,
                bits => ((1i64 << (bits - 1)) - 1) as f64,
            };
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f64 / full_scale))
                .collect::<Result<_, _>>()?
        }
    };

    let mut samples = vec![Vec::with_capacity(interleaved.len() / channels); channels];
    for (i, s) in interleaved.into_iter().enumerate() {
        samples[i % channels].push(s);
    }
    log::debug!(
        "decoded WAV: {} channels, {} Hz, {} bits",
        spec.channels,
        spec.sample_rate,
        spec.bits_per_sample
    );
    SampleBuffer::new(spec.sample_rate, samples)
}

#[cfg(feature = "native")]
pub fn load_wav<P: AsRef<std::path::Path>>(path: P) -> EngineResult<SampleBuffer> {
    let file = std::io::BufReader::new(std::fs::File::open(path)?);
    read_wav(file)
}

#[cfg(feature = "native")]
pub fn save_wav<P: AsRef<std::path::Path>>(path: P, buffer: &SampleBuffer) -> EngineResult<()> {
    std::fs::write(path, encode_wav(buffer)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u32_at(wav: &[u8], at: usize) -> u32 {
        u32::from_le_bytes([wav[at], wav[at + 1], wav[at + 2], wav[at + 3]])
    }

    fn u16_at(wav: &[u8], at: usize) -> u16 {
        u16::from_le_bytes([wav[at], wav[at + 1]])
    }

    fn i16_at(wav: &[u8], at: usize) -> i16 {
        i16::from_le_bytes([wav[at], wav[at + 1]])
    }

    #[test]
    fn wav_header_valid() {
        let buffer = SampleBuffer::silence(44100, 2, 10).unwrap();
        let wav = encode_wav(&buffer).unwrap();

        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[12..16], b"fmt ");
        assert_eq!(&wav[36..40], b"data");
        assert_eq!(u32_at(&wav, 16), 16);
        assert_eq!(u16_at(&wav, 20), 1);
        assert_eq!(u16_at(&wav, 22), 2);
        assert_eq!(u32_at(&wav, 24), 44100);
        assert_eq!(u32_at(&wav, 28), 44100 * 2 * 2);
        assert_eq!(u16_at(&wav, 32), 4);
        assert_eq!(u16_at(&wav, 34), 16);
    }

    #[test]
    fn two_channel_two_frame_layout() {
        let buffer = SampleBuffer::new(44100, vec![vec![1.0, -1.0], vec![0.0, 0.0]]).unwrap();
        let wav = encode_wav(&buffer).unwrap();

        assert_eq!(wav.len(), HEADER_SIZE + 8);
        assert_eq!(u32_at(&wav, 4) as usize, wav.len() - 8);
        assert_eq!(u32_at(&wav, 40), 8);

        // Channel 0 carries 32767 then -32768, interleaved with channel 1.
        assert_eq!(i16_at(&wav, 44), 32767);
        assert_eq!(i16_at(&wav, 46), 0);
        assert_eq!(i16_at(&wav, 48), -32768);
        assert_eq!(i16_at(&wav, 50), 0);
    }

    #[test]
    fn quantization_rules() {
        assert_eq!(to_pcm16(1.0), 32767);
        assert_eq!(to_pcm16(-1.0), -32768);
        assert_eq!(to_pcm16(2.5), 32767);
        assert_eq!(to_pcm16(-7.0), -32768);
        assert_eq!(to_pcm16(0.5), 16383); // 16383.5 truncated
        assert_eq!(to_pcm16(-0.5), -16384);
        assert_eq!(to_pcm16(-0.00001), 0); // -0.327 truncates toward zero
        assert_eq!(to_pcm16(f64::NAN), 0);
    }

    #[test]
    fn empty_buffer_is_header_only() {
        let wav = encode_wav(&SampleBuffer::silence(8000, 1, 0).unwrap()).unwrap();
        assert_eq!(wav.len(), HEADER_SIZE);
        assert_eq!(u32_at(&wav, 4), 36);
        assert_eq!(u32_at(&wav, 40), 0);
    }

    #[test]
    fn round_trip_through_standard_reader() {
        let left: Vec<f64> = (0..500).map(|i| ((i as f64) * 0.05).sin() * 0.9).collect();
        let right: Vec<f64> = (0..500).map(|i| ((i as f64) * 0.013).cos() * -0.4).collect();
        let buffer = SampleBuffer::new(22050, vec![left.clone(), right.clone()]).unwrap();
        let wav = encode_wav(&buffer).unwrap();

        let mut reader = hound::WavReader::new(std::io::Cursor::new(wav)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.sample_rate, 22050);
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(spec.sample_format, hound::SampleFormat::Int);

        let decoded: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(decoded.len(), 1000);
        for (i, pair) in decoded.chunks(2).enumerate() {
            for (ch, original) in [&left, &right].iter().enumerate() {
                let o = original[i];
                let scale = if o < 0.0 { 32768.0 } else { 32767.0 };
                let back = pair[ch] as f64 / scale;
                assert!(
                    (back - o).abs() <= 1.0 / 32767.0,
                    "frame {i} ch {ch}: {o} -> {back}"
                );
            }
        }
    }

    #[test]
    fn header_fields_that_overflow_are_errors() {
        let fast_mono = SampleBuffer::mono(3_000_000_000, vec![0.0]).unwrap();
        assert!(matches!(
            encode_wav(&fast_mono),
            Err(EngineError::WavFieldOverflow { field: "byte rate", value: 6_000_000_000 })
        ));

        let wide = SampleBuffer::silence(8_500_000, 255, 0).unwrap();
        assert!(matches!(
            encode_wav(&wide),
            Err(EngineError::WavFieldOverflow { field: "byte rate", .. })
        ));

        // 2^31 stereo frames is 8 GiB of data; checked without allocating it
        assert!(matches!(
            HeaderFields::new(44100, 2, 1 << 31),
            Err(EngineError::WavFieldOverflow { field: "data size", .. })
        ));
        // data fits, RIFF size (data + 36) does not
        assert!(matches!(
            HeaderFields::new(44100, 1, (u32::MAX / 2) as usize),
            Err(EngineError::WavFieldOverflow { field: "RIFF size", .. })
        ));
    }

    #[test]
    fn largest_rate_that_fits() {
        let fields = HeaderFields::new(u32::MAX / 2, 1, 0).unwrap();
        assert_eq!(fields.byte_rate, u32::MAX - 1);
        assert_eq!(fields.file_size, 36);
    }

    #[test]
    fn render_wav_uses_config_length() {
        let mut cfg = SynthConfig::gate_718(0.25);
        cfg.sample_rate = 8000;
        let wav = render_wav(&cfg).unwrap();
        assert_eq!(u32_at(&wav, 40), 2000 * 2 * 2);
        assert!(wav[HEADER_SIZE..].iter().any(|&b| b != 0), "render should not be silent");
    }

    #[cfg(feature = "native")]
    #[test]
    fn read_back_encoded_wav() {
        let buffer = SampleBuffer::mono(16000, vec![0.0, 0.5, -0.5, 1.0]).unwrap();
        let decoded = read_wav(std::io::Cursor::new(encode_wav(&buffer).unwrap())).unwrap();
        assert_eq!(decoded.sample_rate(), 16000);
        assert_eq!(decoded.channels(), 1);
        let ch = decoded.channel(0).unwrap();
        assert!((ch[1] - 16383.0 / 32767.0).abs() < 1e-12);
        assert!((ch[2] - -16384.0 / 32767.0).abs() < 1e-12);
        assert_eq!(ch[3], 1.0);
    }

    #[cfg(feature = "native")]
    #[test]
    fn partial_trailing_frame_is_a_format_error() {
        // three samples declared as stereo: the last frame is incomplete
        let mono = SampleBuffer::mono(8000, vec![0.1, 0.2, 0.3]).unwrap();
        let mut wav = encode_wav(&mono).unwrap();
        wav[22..24].copy_from_slice(&2u16.to_le_bytes());
        wav[28..32].copy_from_slice(&(8000u32 * 4).to_le_bytes());
        wav[32..34].copy_from_slice(&4u16.to_le_bytes());

        let err = read_wav(std::io::Cursor::new(wav)).unwrap_err();
        assert!(
            matches!(err, EngineError::Wav(hound::Error::FormatError(_))),
            "got {err}"
        );
    }
}
