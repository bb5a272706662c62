//! Central constants for the audio path.

/// Output sample rate sent to the voice transport (Hz).
pub const TARGET_SAMPLE_RATE: u32 = 48_000;

/// Duration of one transport frame.
pub const FRAME_DURATION_MS: u64 = 20;

/// Samples per channel in one 20 ms frame at 48 kHz.
pub const FRAME_SAMPLES_PER_CHANNEL: usize = 960;

/// Stereo channel count used throughout the mixer.
pub const MIXER_CHANNELS: usize = 2;

/// Bytes per 16-bit PCM sample.
pub const BYTES_PER_SAMPLE: usize = 2;

/// Interleaved samples in one stereo frame (960 frames × 2 channels).
pub const FRAME_SIZE_SAMPLES: usize = FRAME_SAMPLES_PER_CHANNEL * MIXER_CHANNELS;

/// Upper bound for one encoded Opus packet.
pub const MAX_OPUS_PACKET_SIZE: usize = 4_000;

/// The three-byte Opus silence frame.
pub const OPUS_SILENCE_FRAME: [u8; 3] = [0xF8, 0xFF, 0xFE];
