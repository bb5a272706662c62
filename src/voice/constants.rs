/// RTP version 2, no padding, no extension, no CSRCs.
pub const RTP_VERSION_BYTE: u8 = 0x80;

/// Dynamic payload type used for Opus.
pub const RTP_OPUS_PAYLOAD_TYPE: u8 = 0x78;

/// RTP header length in bytes.
pub const RTP_HEADER_LEN: usize = 12;

/// Timestamp advance per frame (samples per channel at 48 kHz over 20 ms).
pub const RTP_TIMESTAMP_STEP: u32 = 960;

/// Reusable packet buffer capacity: header plus the largest Opus packet.
pub const UDP_PACKET_BUF_CAPACITY: usize =
    RTP_HEADER_LEN + crate::audio::constants::MAX_OPUS_PACKET_SIZE;
