//! Asset → 48 kHz stereo PCM.
//!
//! Decoding runs on the control path, before a clip reaches the mixer, so the
//! frame production path never touches the filesystem.

pub mod resampler;
pub mod symphonia_decoder;

pub use symphonia_decoder::SymphoniaDecoder;
pub use resampler::LinearResampler;

use std::path::Path;

use crate::common::AudioError;

pub trait ClipDecoder: Send + Sync {
    /// Decodes the whole asset into interleaved stereo i16 samples at
    /// `TARGET_SAMPLE_RATE`. An asset that yields no samples is unreadable.
    fn decode(&self, path: &Path) -> Result<Vec<i16>, AudioError>;
}

/// Appends `input` (interleaved, `channels` wide) to `out` as stereo.
/// Mono is duplicated, anything wider keeps its first two channels.
pub fn to_stereo(input: &[i16], channels: usize, out: &mut Vec<i16>) {
    match channels {
        0 => {}
        1 => {
            out.reserve(input.len() * 2);
            for &s in input {
                out.push(s);
                out.push(s);
            }
        }
        2 => out.extend_from_slice(input),
        n => {
            out.reserve(input.len() / n * 2);
            for frame in input.chunks_exact(n) {
                out.push(frame[0]);
                out.push(frame[1]);
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::{collections::HashMap, path::PathBuf};

    use super::*;

    /// Serves canned sample vectors by path. Unknown paths are unreadable.
    #[derive(Default)]
    pub struct FakeDecoder {
        clips: HashMap<PathBuf, Vec<i16>>,
    }

    impl FakeDecoder {
        pub fn with(mut self, path: &str, samples: Vec<i16>) -> Self {
            self.clips.insert(PathBuf::from(path), samples);
            self
        }
    }

    impl ClipDecoder for FakeDecoder {
        fn decode(&self, path: &Path) -> Result<Vec<i16>, AudioError> {
            match self.clips.get(path) {
                Some(samples) if !samples.is_empty() => Ok(samples.clone()),
                Some(_) => Err(AudioError::unreadable(path, "no audio decoded")),
                None => Err(AudioError::unreadable(path, "file not found")),
            }
        }
    }

    /// Writes a 16-bit PCM RIFF/WAVE file.
    pub fn write_wav(path: &Path, sample_rate: u32, channels: u16, samples: &[i16]) {
        use byteorder::{LittleEndian, WriteBytesExt};

        let data_len = (samples.len() * 2) as u32;
        let block_align = channels * 2;
        let mut buf = Vec::with_capacity(44 + data_len as usize);
        buf.extend_from_slice(b"RIFF");
        buf.write_u32::<LittleEndian>(36 + data_len).unwrap();
        buf.extend_from_slice(b"WAVEfmt ");
        buf.write_u32::<LittleEndian>(16).unwrap();
        buf.write_u16::<LittleEndian>(1).unwrap();
        buf.write_u16::<LittleEndian>(channels).unwrap();
        buf.write_u32::<LittleEndian>(sample_rate).unwrap();
        buf.write_u32::<LittleEndian>(sample_rate * block_align as u32)
            .unwrap();
        buf.write_u16::<LittleEndian>(block_align).unwrap();
        buf.write_u16::<LittleEndian>(16).unwrap();
        buf.extend_from_slice(b"data");
        buf.write_u32::<LittleEndian>(data_len).unwrap();
        for &s in samples {
            buf.write_i16::<LittleEndian>(s).unwrap();
        }
        std::fs::write(path, buf).unwrap();
    }
}
