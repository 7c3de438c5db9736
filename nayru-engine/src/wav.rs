//! WAV decoding for upstream TTS responses (`spec.md` §4.2 step 4, §6).
//!
//! The upstream endpoint returns RIFF/WAVE, PCM16, mono or stereo, at
//! either 16 kHz or 24 kHz (`spec.md` §6) — we don't hardcode either
//! rate and instead read whatever the header declares.

use std::io::Cursor;

use hound::SampleFormat;

#[derive(Debug)]
pub struct DecodedWav {
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<i16>,
}

#[derive(Debug, thiserror::Error)]
pub enum WavDecodeError {
    #[error("malformed WAV payload: {0}")]
    Malformed(String),

    #[error("unsupported WAV sample format: {0:?} at {1} bits")]
    UnsupportedFormat(SampleFormat, u16),
}

/// Decode a RIFF/WAVE PCM16 payload into raw samples.
pub fn decode(bytes: &[u8]) -> Result<DecodedWav, WavDecodeError> {
    let mut reader = hound::WavReader::new(Cursor::new(bytes))
        .map_err(|e| WavDecodeError::Malformed(e.to_string()))?;
    let spec = reader.spec();

    if spec.sample_format != SampleFormat::Int || spec.bits_per_sample != 16 {
        return Err(WavDecodeError::UnsupportedFormat(
            spec.sample_format,
            spec.bits_per_sample,
        ));
    }

    let samples: Result<Vec<i16>, _> = reader.samples::<i16>().collect();
    let samples = samples.map_err(|e| WavDecodeError::Malformed(e.to_string()))?;

    Ok(DecodedWav {
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        samples,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_wav(sample_rate: u32, channels: u16, samples: &[i16]) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for &s in samples {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn decodes_mono_pcm16() {
        let bytes = make_wav(24000, 1, &[1, -1, 2, -2]);
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.sample_rate, 24000);
        assert_eq!(decoded.channels, 1);
        assert_eq!(decoded.samples, vec![1, -1, 2, -2]);
    }

    #[test]
    fn decodes_stereo_pcm16() {
        let bytes = make_wav(16000, 2, &[1, 2, 3, 4]);
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.channels, 2);
        assert_eq!(decoded.sample_rate, 16000);
    }

    #[test]
    fn rejects_garbage() {
        let err = decode(b"not a wav file").unwrap_err();
        assert!(matches!(err, WavDecodeError::Malformed(_)));
    }
}
