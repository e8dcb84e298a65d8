use std::error::Error;
use std::fmt;
use std::io;

/// Falha fatal ao montar a sessão.
#[derive(Debug)]
pub enum PingerError {
    /// Nem o socket RAW nem o socket DGRAM de ICMP puderam ser criados.
    Socket(io::Error),
}

impl fmt::Display for PingerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Socket(e) => write!(f, "falha ao criar socket ICMP: {}", e),
        }
    }
}

impl Error for PingerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Socket(e) => Some(e),
        }
    }
}

/// Falha de um único envio. A sessão continua utilizável.
#[derive(Debug)]
pub enum SendError {
    /// O resolvedor da plataforma não conhece o destino.
    Resolve { destination: String, source: io::Error },
    /// O destino resolveu, mas só para endereços IPv6.
    NoIpv4Address { destination: String },
    /// `sendto` falhou.
    Io(io::Error),
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolve { destination, source } => {
                write!(f, "não foi possível resolver {}: {}", destination, source)
            }
            Self::NoIpv4Address { destination } => {
                write!(f, "{} não possui endereço IPv4", destination)
            }
            Self::Io(e) => write!(f, "falha ao enviar: {}", e),
        }
    }
}

impl Error for SendError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Resolve { source, .. } => Some(source),
            Self::NoIpv4Address { .. } => None,
            Self::Io(e) => Some(e),
        }
    }
}

/// Cabeçalho mais curto do que o layout fixo exige.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    Truncated { needed: usize, got: usize },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated { needed, got } => {
                write!(f, "cabeçalho truncado: {} bytes, esperado {}", got, needed)
            }
        }
    }
}

impl Error for DecodeError {}
