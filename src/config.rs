use std::time::Duration;

use crate::transport::Transport;

/// Como uma Echo Reply é aceita pelo receptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchPolicy {
    /// Qualquer Echo Reply com id diferente de zero é aceita, na ordem de
    /// chegada. Respostas de outras sessões no mesmo host podem aparecer;
    /// o chamador correlaciona pelo conteúdo do payload.
    #[default]
    Permissive,
    /// O id da resposta precisa ser o id da sessão (ou a porta local, quando
    /// o kernel reescreve o id).
    SessionId,
}

/// Parâmetros da sessão.
#[derive(Debug, Clone)]
pub struct PingerConfig {
    /// Prazo total de uma leitura.
    pub timeout: Duration,
    /// Maior espera isolada no socket; o cancelamento é verificado entre esperas.
    pub poll_interval: Duration,
    /// Quadros inspecionados por leitura antes de desistir.
    pub max_frames: usize,
    pub match_policy: MatchPolicy,
    /// Força um transporte em vez de tentar RAW primeiro.
    pub transport: Option<Transport>,
}

impl Default for PingerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(500),
            poll_interval: Duration::from_millis(100),
            max_frames: 5,
            match_policy: MatchPolicy::Permissive,
            transport: None,
        }
    }
}

impl PingerConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_max_frames(mut self, max_frames: usize) -> Self {
        self.max_frames = max_frames;
        self
    }

    pub fn with_match_policy(mut self, match_policy: MatchPolicy) -> Self {
        self.match_policy = match_policy;
        self
    }

    pub fn with_transport(mut self, transport: Transport) -> Self {
        self.transport = Some(transport);
        self
    }
}
