use crate::checksum::checksum;
use crate::error::DecodeError;

/// Tamanho fixo do cabeçalho ICMP (type, code, checksum, id, seq).
pub const ICMP_HEADER_LEN: usize = 8;

/// Tamanho do timestamp (f64 big-endian) que prefixa o payload enviado.
pub const TIMESTAMP_LEN: usize = 8;

/// Tipos ICMP que o receptor distingue (RFC 792).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IcmpType {
    EchoReply,
    DestinationUnreachable,
    EchoRequest,
    TimeExceeded,
    Other(u8),
}

impl From<u8> for IcmpType {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::EchoReply,
            3 => Self::DestinationUnreachable,
            8 => Self::EchoRequest,
            11 => Self::TimeExceeded,
            other => Self::Other(other),
        }
    }
}

impl From<IcmpType> for u8 {
    fn from(value: IcmpType) -> Self {
        match value {
            IcmpType::EchoReply => 0,
            IcmpType::DestinationUnreachable => 3,
            IcmpType::EchoRequest => 8,
            IcmpType::TimeExceeded => 11,
            IcmpType::Other(other) => other,
        }
    }
}

/// Cabeçalho ICMP de 8 bytes, sempre em ordem de rede no fio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IcmpHeader {
    pub icmp_type: u8,
    pub code: u8,
    pub checksum: u16,
    pub id: u16,
    pub seq: u16,
}

impl IcmpHeader {
    pub fn new(icmp_type: u8, code: u8, checksum: u16, id: u16, seq: u16) -> Self {
        Self { icmp_type, code, checksum, id, seq }
    }

    pub fn kind(&self) -> IcmpType {
        IcmpType::from(self.icmp_type)
    }

    pub fn to_bytes(&self) -> [u8; ICMP_HEADER_LEN] {
        let mut out = [0u8; ICMP_HEADER_LEN];
        out[0] = self.icmp_type;
        out[1] = self.code;
        out[2..4].copy_from_slice(&self.checksum.to_be_bytes());
        out[4..6].copy_from_slice(&self.id.to_be_bytes());
        out[6..8].copy_from_slice(&self.seq.to_be_bytes());
        out
    }

    /// Lê os primeiros 8 bytes; o restante do slice é ignorado.
    pub fn parse(raw: &[u8]) -> Result<Self, DecodeError> {
        if raw.len() < ICMP_HEADER_LEN {
            return Err(DecodeError::Truncated { needed: ICMP_HEADER_LEN, got: raw.len() });
        }
        Ok(Self {
            icmp_type: raw[0],
            code: raw[1],
            checksum: u16::from_be_bytes([raw[2], raw[3]]),
            id: u16::from_be_bytes([raw[4], raw[5]]),
            seq: u16::from_be_bytes([raw[6], raw[7]]),
        })
    }
}

/// Monta um pacote ICMPv4 Echo Request (type=8, code=0).
///
/// O payload no fio é `timestamp (f64 big-endian) + data`. O checksum é
/// calculado com o campo zerado e depois escrito em ordem de rede.
pub fn build_echo_request(ident: u16, seq: u16, timestamp: f64, data: &[u8]) -> Vec<u8> {
    // Cabeçalho ICMP (8 bytes) + timestamp (8 bytes) + payload
    let mut pkt = Vec::with_capacity(ICMP_HEADER_LEN + TIMESTAMP_LEN + data.len());

    let header = IcmpHeader::new(IcmpType::EchoRequest.into(), 0, 0, ident, seq);
    pkt.extend_from_slice(&header.to_bytes());
    pkt.extend_from_slice(&timestamp.to_be_bytes());
    pkt.extend_from_slice(data);

    let csum = checksum(&pkt);
    pkt[2..4].copy_from_slice(&csum.to_be_bytes());

    pkt
}
