use std::net::Ipv4Addr;

use crate::error::DecodeError;

/// Tamanho do cabeçalho IPv4 sem opções.
pub const IP_HEADER_LEN: usize = 20;

/// Cabeçalho IPv4 que precede o ICMP em sockets RAW. Somente leitura.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpHeader {
    pub version: u8,
    /// Tamanho do cabeçalho em palavras de 32 bits.
    pub ihl: u8,
    pub tos: u8,
    pub len: u16,
    pub id: u16,
    pub flags: u16,
    pub ttl: u8,
    pub protocol: u8,
    pub checksum: u16,
    pub src_addr: Ipv4Addr,
    pub dest_addr: Ipv4Addr,
}

impl IpHeader {
    /// Lê o layout fixo de 20 bytes (opções não são interpretadas).
    pub fn parse(raw: &[u8]) -> Result<Self, DecodeError> {
        if raw.len() < IP_HEADER_LEN {
            return Err(DecodeError::Truncated { needed: IP_HEADER_LEN, got: raw.len() });
        }
        let be16 = |i: usize| u16::from_be_bytes([raw[i], raw[i + 1]]);
        let be32 = |i: usize| u32::from_be_bytes([raw[i], raw[i + 1], raw[i + 2], raw[i + 3]]);
        Ok(Self {
            version: raw[0] >> 4,
            ihl: raw[0] & 0x0F,
            tos: raw[1],
            len: be16(2),
            id: be16(4),
            flags: be16(6),
            ttl: raw[8],
            protocol: raw[9],
            checksum: be16(10),
            // Ipv4Addr::from(u32) extrai os octetos nos deslocamentos 24, 16, 8, 0.
            src_addr: Ipv4Addr::from(be32(12)),
            dest_addr: Ipv4Addr::from(be32(16)),
        })
    }

    /// Tamanho real do cabeçalho em bytes, incluindo opções.
    pub fn header_len(&self) -> usize {
        self.ihl as usize * 4
    }
}
