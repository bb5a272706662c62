use std::{fs::File, path::Path};

use symphonia::core::{
    audio::SampleBuffer,
    codecs::{CODEC_TYPE_NULL, DecoderOptions},
    errors::Error,
    formats::FormatOptions,
    io::MediaSourceStream,
    meta::MetadataOptions,
    probe::Hint,
};
use tracing::{debug, warn};

use super::{ClipDecoder, LinearResampler, to_stereo};
use crate::{
    audio::constants::{MIXER_CHANNELS, TARGET_SAMPLE_RATE},
    common::AudioError,
};

/// Decodes any container symphonia can probe (mp3, ogg, flac, wav, m4a, ...).
#[derive(Debug, Default, Clone, Copy)]
pub struct SymphoniaDecoder;

impl SymphoniaDecoder {
    pub fn new() -> Self {
        Self
    }
}

fn is_end_of_stream(e: &Error) -> bool {
    matches!(e, Error::IoError(io) if io.kind() == std::io::ErrorKind::UnexpectedEof)
        || matches!(e, Error::ResetRequired)
}

impl ClipDecoder for SymphoniaDecoder {
    fn decode(&self, path: &Path) -> Result<Vec<i16>, AudioError> {
        let file = File::open(path).map_err(|e| AudioError::unreadable(path, e))?;

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(&ext.to_lowercase());
        }

        let mss = MediaSourceStream::new(Box::new(file), Default::default());
        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| AudioError::unreadable(path, e))?;

        let mut format = probed.format;
        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| AudioError::unreadable(path, "no audio track found"))?;

        let track_id = track.id;
        let source_rate = track.codec_params.sample_rate.unwrap_or(TARGET_SAMPLE_RATE);
        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| AudioError::unreadable(path, e))?;

        debug!(
            "Decoding {}: {}Hz -> {}Hz",
            path.display(),
            source_rate,
            TARGET_SAMPLE_RATE
        );

        let mut resampler = LinearResampler::new(source_rate, TARGET_SAMPLE_RATE, MIXER_CHANNELS);
        let mut sample_buf: Option<SampleBuffer<i16>> = None;
        let mut stereo = Vec::new();
        let mut out = Vec::new();

        loop {
            let packet = match format.next_packet() {
                Ok(p) => p,
                Err(e) if is_end_of_stream(&e) => break,
                Err(e) if out.is_empty() => return Err(AudioError::unreadable(path, e)),
                Err(e) => {
                    warn!("Stopped reading {} early: {}", path.display(), e);
                    break;
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    let spec = *decoded.spec();
                    let channels = spec.channels.count();
                    let needed = decoded.capacity() * channels;
                    if sample_buf.as_ref().is_none_or(|b| b.capacity() < needed) {
                        sample_buf = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
                    }
                    let Some(buf) = sample_buf.as_mut() else {
                        continue;
                    };
                    buf.copy_interleaved_ref(decoded);

                    stereo.clear();
                    to_stereo(buf.samples(), channels, &mut stereo);
                    if resampler.is_passthrough() {
                        out.extend_from_slice(&stereo);
                    } else {
                        resampler.process(&stereo, &mut out);
                    }
                }
                Err(Error::DecodeError(e)) => {
                    warn!("Skipping corrupt packet in {}: {}", path.display(), e);
                }
                Err(e) if is_end_of_stream(&e) => break,
                Err(e) if out.is_empty() => return Err(AudioError::unreadable(path, e)),
                Err(e) => {
                    warn!("Stopped decoding {} early: {}", path.display(), e);
                    break;
                }
            }
        }

        if out.is_empty() {
            return Err(AudioError::unreadable(path, "no audio decoded"));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::decode::testing::write_wav;

    #[test]
    fn decodes_stereo_wav_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello.wav");
        let samples: Vec<i16> = (0..1920).map(|i| (i % 100) as i16 * 10).collect();
        write_wav(&path, 48_000, 2, &samples);

        let decoded = SymphoniaDecoder::new().decode(&path).unwrap();
        assert_eq!(decoded, samples);
    }

    #[test]
    fn mono_wav_becomes_stereo() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mono.wav");
        write_wav(&path, 48_000, 1, &[5, -5, 7]);

        let decoded = SymphoniaDecoder::new().decode(&path).unwrap();
        assert_eq!(decoded, vec![5, 5, -5, -5, 7, 7]);
    }

    #[test]
    fn low_rate_wav_is_resampled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("low.wav");
        write_wav(&path, 24_000, 2, &vec![300; 960]);

        let decoded = SymphoniaDecoder::new().decode(&path).unwrap();
        assert_eq!(decoded.len(), 1920);
    }

    #[test]
    fn missing_file_is_unreadable() {
        let err = SymphoniaDecoder::new()
            .decode(Path::new("/definitely/not/here.ogg"))
            .unwrap_err();
        assert!(matches!(err, AudioError::AssetUnreadable { .. }));
    }

    #[test]
    fn garbage_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noise.mp3");
        std::fs::write(&path, b"this is not audio at all").unwrap();

        let err = SymphoniaDecoder::new().decode(&path).unwrap_err();
        assert!(matches!(err, AudioError::AssetUnreadable { .. }));
    }
}
