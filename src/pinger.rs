use std::sync::atomic::AtomicBool;

use log::{debug, warn};
use socket2::Socket;

use crate::config::{MatchPolicy, PingerConfig};
use crate::error::{PingerError, SendError};
use crate::receiver::{self, Reply};
use crate::sender;
use crate::transport::{self, Transport};

/// Sessão de ping que transporta payloads arbitrários.
///
/// Dona de um socket ICMP, de um contador de sequência e de um id aleatório
/// fixo por sessão. `send` e `read` podem ser chamados em qualquer ordem.
/// Respostas chegam na ordem da rede, não na ordem de envio: correlacione
/// pelo conteúdo do payload.
///
/// Não é seguro compartilhar entre threads sem um `Mutex` externo que
/// serialize os pares send/read.
#[derive(Debug)]
pub struct PayloadPinger {
    socket: Socket,
    transport: Transport,
    ident: u16,
    seq: u16,
    config: PingerConfig,
}

impl PayloadPinger {
    pub fn new() -> Result<Self, PingerError> {
        Self::with_config(PingerConfig::default())
    }

    pub fn with_config(config: PingerConfig) -> Result<Self, PingerError> {
        let (socket, transport) = transport::open_socket(config.transport)?;
        let ident: u16 = rand::random();
        debug!("sessão criada: transporte={:?} id={:#06x}", transport, ident);
        Ok(Self { socket, transport, ident, seq: 0, config })
    }

    pub fn transport(&self) -> Transport {
        self.transport
    }

    /// Id ICMP da sessão. Em ping sockets sem cabeçalho IP o kernel o substitui
    /// pela porta local.
    pub fn id(&self) -> u16 {
        self.ident
    }

    pub fn next_sequence(&self) -> u16 {
        self.seq
    }

    pub fn config(&self) -> &PingerConfig {
        &self.config
    }

    /// Envia `payload` para `destination`. Falhas de resolução e de envio viram `false`.
    pub fn send(&mut self, destination: &str, payload: &[u8]) -> bool {
        match self.try_send(destination, payload) {
            Ok(()) => true,
            Err(e) => {
                warn!("{}", e);
                false
            }
        }
    }

    /// Como `send`, mas devolve o motivo da falha.
    ///
    /// A sequência avança mesmo quando o envio falha.
    pub fn try_send(&mut self, destination: &str, payload: &[u8]) -> Result<(), SendError> {
        let seq = self.seq;
        self.seq = self.seq.wrapping_add(1);
        sender::send_one(&self.socket, destination, self.ident, seq, payload)
    }

    /// Payload da próxima Echo Reply, ou `None` no timeout.
    pub fn read(&mut self) -> Option<Vec<u8>> {
        self.read_reply().map(|r| r.payload)
    }

    pub fn read_reply(&mut self) -> Option<Reply> {
        self.receive(None)
    }

    /// Como `read`, mas retorna `None` assim que `cancel` for marcado.
    pub fn read_cancellable(&mut self, cancel: &AtomicBool) -> Option<Vec<u8>> {
        self.receive(Some(cancel)).map(|r| r.payload)
    }

    fn receive(&mut self, cancel: Option<&AtomicBool>) -> Option<Reply> {
        let expected_id = match self.config.match_policy {
            MatchPolicy::Permissive => None,
            MatchPolicy::SessionId => Some(self.expected_reply_id()),
        };
        match receiver::receive_one(&self.socket, self.transport, &self.config, expected_id, cancel) {
            Ok(reply) => reply,
            Err(e) => {
                warn!("erro na leitura: {}", e);
                None
            }
        }
    }

    fn expected_reply_id(&self) -> u16 {
        if !self.transport.kernel_assigns_id() {
            return self.ident;
        }
        // Ping socket: o kernel troca o id pela "porta" local do socket.
        match self.socket.local_addr().ok().and_then(|a| a.as_socket()) {
            Some(addr) => addr.port(),
            None => self.ident,
        }
    }
}

impl Drop for PayloadPinger {
    fn drop(&mut self) {
        debug!("fechando sessão id={:#06x} após {} envios", self.ident, self.seq);
    }
}
