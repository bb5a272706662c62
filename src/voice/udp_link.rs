use std::{net::SocketAddr, sync::Arc};

use async_trait::async_trait;
use byteorder::{BigEndian, WriteBytesExt};
use tokio::net::UdpSocket;

use super::{
    PacketSink,
    constants::{
        RTP_HEADER_LEN, RTP_OPUS_PAYLOAD_TYPE, RTP_TIMESTAMP_STEP, RTP_VERSION_BYTE,
        UDP_PACKET_BUF_CAPACITY,
    },
};
use crate::common::TransportError;

/// Wraps Opus packets in RTP and sends them to one remote address.
pub struct RtpLink {
    socket: Arc<UdpSocket>,
    address: SocketAddr,
    ssrc: u32,
    sequence: u16,
    timestamp: u32,
    /// Reusable packet buffer, cleared per frame.
    packet_buf: Vec<u8>,
}

impl RtpLink {
    pub fn new(socket: Arc<UdpSocket>, address: SocketAddr, ssrc: u32) -> Self {
        Self {
            socket,
            address,
            ssrc,
            sequence: 0,
            timestamp: 0,
            packet_buf: Vec::with_capacity(UDP_PACKET_BUF_CAPACITY),
        }
    }

    /// Builds the next packet into the internal buffer and advances the
    /// sequence number and timestamp.
    fn frame(&mut self, payload: &[u8]) -> &[u8] {
        let sequence = self.sequence;
        self.sequence = self.sequence.wrapping_add(1);

        let timestamp = self.timestamp;
        self.timestamp = self.timestamp.wrapping_add(RTP_TIMESTAMP_STEP);

        self.packet_buf.clear();
        self.packet_buf.push(RTP_VERSION_BYTE);
        self.packet_buf.push(RTP_OPUS_PAYLOAD_TYPE);
        // Writes into a Vec cannot fail.
        let _ = self.packet_buf.write_u16::<BigEndian>(sequence);
        let _ = self.packet_buf.write_u32::<BigEndian>(timestamp);
        let _ = self.packet_buf.write_u32::<BigEndian>(self.ssrc);
        debug_assert_eq!(self.packet_buf.len(), RTP_HEADER_LEN);
        self.packet_buf.extend_from_slice(payload);
        &self.packet_buf
    }
}

#[async_trait]
impl PacketSink for RtpLink {
    async fn send_packet(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        let address = self.address;
        let socket = self.socket.clone();
        let packet = self.frame(payload);
        socket.send_to(packet, address).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use byteorder::ReadBytesExt;

    use super::*;

    async fn link() -> RtpLink {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        RtpLink::new(Arc::new(socket), "127.0.0.1:9".parse().unwrap(), 0xDEAD_BEEF)
    }

    #[tokio::test]
    async fn header_carries_sequence_timestamp_and_ssrc() {
        let mut link = link().await;
        link.frame(&[1, 2, 3]);
        let packet = link.frame(&[4, 5]).to_vec();

        assert_eq!(packet.len(), RTP_HEADER_LEN + 2);
        let mut header = &packet[..RTP_HEADER_LEN];
        assert_eq!(header.read_u8().unwrap(), RTP_VERSION_BYTE);
        assert_eq!(header.read_u8().unwrap(), RTP_OPUS_PAYLOAD_TYPE);
        assert_eq!(header.read_u16::<BigEndian>().unwrap(), 1);
        assert_eq!(header.read_u32::<BigEndian>().unwrap(), RTP_TIMESTAMP_STEP);
        assert_eq!(header.read_u32::<BigEndian>().unwrap(), 0xDEAD_BEEF);
        assert_eq!(&packet[RTP_HEADER_LEN..], &[4, 5]);
    }

    #[tokio::test]
    async fn counters_wrap() {
        let mut link = link().await;
        link.sequence = u16::MAX;
        link.timestamp = u32::MAX - 10;
        link.frame(&[]);
        assert_eq!(link.sequence, 0);
        assert_eq!(link.timestamp, RTP_TIMESTAMP_STEP - 11);
    }
}
