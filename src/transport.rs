use log::{debug, warn};
use socket2::{Domain, Protocol, Socket, Type};

use crate::error::PingerError;
use crate::ip::IP_HEADER_LEN;

/// Forma de acesso ao ICMP, escolhida uma única vez na criação da sessão.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// SOCK_RAW: exige privilégios; os quadros recebidos trazem o cabeçalho IP.
    Privileged,
    /// SOCK_DGRAM de ICMP ("ping socket"): sem privilégios, o kernel gerencia o id.
    Unprivileged,
}

impl Transport {
    pub fn socket_type(self) -> Type {
        match self {
            // Type::RAW só existe com a feature `all` do socket2.
            Transport::Privileged => Type::from(libc::SOCK_RAW),
            Transport::Unprivileged => Type::DGRAM,
        }
    }

    /// Se os quadros lidos deste socket começam com o cabeçalho IPv4.
    ///
    /// No Linux (e nos demais unix que não o macOS) o kernel remove o
    /// cabeçalho IP dos ping sockets.
    pub fn has_ip_header(self) -> bool {
        match self {
            Transport::Privileged => true,
            Transport::Unprivileged => cfg!(any(windows, target_os = "macos", target_os = "ios")),
        }
    }

    /// Bytes de cabeçalho IP assumidos antes do ICMP quando não é possível ler o IHL.
    pub fn ip_header_len(self) -> usize {
        if self.has_ip_header() { IP_HEADER_LEN } else { 0 }
    }

    /// Quando o kernel reescreve o id ICMP (ping socket sem cabeçalho IP),
    /// o id esperado é a porta local do socket.
    pub fn kernel_assigns_id(self) -> bool {
        !self.has_ip_header()
    }

    pub fn open(self) -> std::io::Result<Socket> {
        Socket::new(Domain::IPV4, self.socket_type(), Some(Protocol::ICMPV4))
    }
}

/// Abre um socket RAW de ICMP; em EPERM cai para o ping socket DGRAM.
///
/// Qualquer outro erro é fatal para a sessão.
pub fn open_socket(forced: Option<Transport>) -> Result<(Socket, Transport), PingerError> {
    if let Some(transport) = forced {
        let sock = transport.open().map_err(PingerError::Socket)?;
        debug!("socket ICMP aberto ({:?}, forçado)", transport);
        return Ok((sock, transport));
    }

    match Transport::Privileged.open() {
        Ok(sock) => {
            debug!("socket ICMP RAW aberto");
            Ok((sock, Transport::Privileged))
        }
        Err(e) if e.raw_os_error() == Some(libc::EPERM) => {
            warn!("socket RAW negado ({}); usando ping socket sem privilégios", e);
            let sock = Transport::Unprivileged.open().map_err(PingerError::Socket)?;
            Ok((sock, Transport::Unprivileged))
        }
        Err(e) => Err(PingerError::Socket(e)),
    }
}
