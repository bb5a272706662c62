use audiopus::{Application, Bitrate, Channels, SampleRate, coder::Encoder as OpusEncoder};

use super::{EncoderFactory, FrameEncoder};
use crate::{
    audio::constants::{FRAME_DURATION_MS, MAX_OPUS_PACKET_SIZE},
    common::AudioError,
    configs::{EncoderConfig, SignalKind},
};

const SAMPLE_RATE: SampleRate = SampleRate::Hz48000;
const CHANNELS: Channels = Channels::Stereo;

// libopus encoder CTL request codes and values (opus_defines.h).
const OPUS_AUTO: i32 = -1000;
const OPUS_SET_BANDWIDTH_REQUEST: i32 = 4008;
const OPUS_SET_INBAND_FEC_REQUEST: i32 = 4012;
const OPUS_SET_PACKET_LOSS_PERC_REQUEST: i32 = 4014;
const OPUS_SET_SIGNAL_REQUEST: i32 = 4024;
const OPUS_BANDWIDTH_FULLBAND: i32 = 1105;
const OPUS_SIGNAL_VOICE: i32 = 3001;
const OPUS_SIGNAL_MUSIC: i32 = 3002;

/// PCM i16 → Opus encoder for 20 ms stereo frames at 48 kHz, tuned for a
/// lossy voice link.
pub struct OpusFrameEncoder {
    encoder: OpusEncoder,
    frame_len: usize,
}

impl OpusFrameEncoder {
    pub fn new(config: &EncoderConfig) -> Result<Self, AudioError> {
        let mut encoder = OpusEncoder::new(SAMPLE_RATE, CHANNELS, Application::Audio)?;
        encoder.set_bitrate(Bitrate::BitsPerSecond(config.bitrate))?;
        encoder.set_encoder_ctl_request(OPUS_SET_BANDWIDTH_REQUEST, OPUS_BANDWIDTH_FULLBAND)?;
        encoder.set_encoder_ctl_request(OPUS_SET_INBAND_FEC_REQUEST, i32::from(config.inband_fec))?;
        encoder.set_encoder_ctl_request(
            OPUS_SET_PACKET_LOSS_PERC_REQUEST,
            i32::from(config.packet_loss_percent.min(100)),
        )?;
        let signal = match config.signal {
            SignalKind::Auto => OPUS_AUTO,
            SignalKind::Voice => OPUS_SIGNAL_VOICE,
            SignalKind::Music => OPUS_SIGNAL_MUSIC,
        };
        encoder.set_encoder_ctl_request(OPUS_SET_SIGNAL_REQUEST, signal)?;

        let samples_per_channel = SAMPLE_RATE as usize * FRAME_DURATION_MS as usize / 1000;
        Ok(Self {
            encoder,
            frame_len: samples_per_channel * CHANNELS as usize,
        })
    }
}

impl FrameEncoder for OpusFrameEncoder {
    fn required_input_len(&self) -> usize {
        self.frame_len
    }

    fn encode(&mut self, pcm: &[i16], out: &mut Vec<u8>) -> Result<(), AudioError> {
        out.resize(MAX_OPUS_PACKET_SIZE, 0);
        let size = self.encoder.encode(pcm, out.as_mut_slice())?;
        out.truncate(size);
        Ok(())
    }
}

pub struct OpusEncoderFactory {
    config: EncoderConfig,
}

impl OpusEncoderFactory {
    pub fn new(config: EncoderConfig) -> Self {
        Self { config }
    }
}

impl EncoderFactory for OpusEncoderFactory {
    fn create(&self) -> Result<Box<dyn FrameEncoder>, AudioError> {
        Ok(Box::new(OpusFrameEncoder::new(&self.config)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_length_follows_codec_parameters() {
        let encoder = OpusFrameEncoder::new(&EncoderConfig::default()).unwrap();
        assert_eq!(encoder.required_input_len(), 1920);
        assert_eq!(encoder.required_input_bytes(), 3840);
    }

    #[test]
    fn encodes_a_silent_frame() {
        let mut encoder = OpusFrameEncoder::new(&EncoderConfig::default()).unwrap();
        let pcm = vec![0i16; encoder.required_input_len()];
        let mut out = Vec::new();
        encoder.encode(&pcm, &mut out).unwrap();
        assert!(!out.is_empty());
        assert!(out.len() <= MAX_OPUS_PACKET_SIZE);
    }
}
