use std::io::{self, Read};
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use log::{debug, trace};
use socket2::Socket;

use crate::config::PingerConfig;
use crate::icmp::{ICMP_HEADER_LEN, IcmpHeader, IcmpType, TIMESTAMP_LEN};
use crate::ip::IpHeader;
use crate::transport::Transport;

/// Maior datagrama IPv4; no loopback (MTU 65536) um quadro pode passar de 1500 bytes.
const RECV_BUFFER_LEN: usize = 65535;

/// Menor espera passada ao socket; um timeout zerado bloquearia para sempre.
const MIN_WAIT: Duration = Duration::from_millis(1);

/// Echo Reply aceita, já sem o timestamp de envio.
///
/// `source` vem do cabeçalho IP; ping sockets sem cabeçalho deixam `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub source: Option<Ipv4Addr>,
    pub id: u16,
    pub seq: u16,
    pub payload: Vec<u8>,
}

/// Destino de um quadro recebido.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Verdict<'a> {
    /// Echo Reply aceita; `payload` já está sem o timestamp.
    Reply { header: IcmpHeader, source: Option<Ipv4Addr>, payload: &'a [u8] },
    /// Tráfego irrelevante ou malformado; continuar lendo.
    Skip(&'static str),
    /// Encerra a leitura sem resposta.
    NoReply,
}

/// Classifica um quadro lido do socket.
///
/// `expected_id` só é `Some` com `MatchPolicy::SessionId`; aí uma Echo Reply
/// com outro id é descartada em vez de aceita.
pub(crate) fn classify(frame: &[u8], transport: Transport, expected_id: Option<u16>) -> Verdict<'_> {
    let (offset, source) = if transport.has_ip_header() {
        match IpHeader::parse(frame) {
            Ok(ip) => (ip.header_len().max(transport.ip_header_len()), Some(ip.src_addr)),
            Err(_) => return Verdict::Skip("cabeçalho IP truncado"),
        }
    } else {
        (0, None)
    };

    let Some(icmp) = frame.get(offset..) else {
        return Verdict::Skip("cabeçalho IP maior que o quadro");
    };
    let header = match IcmpHeader::parse(icmp) {
        Ok(h) => h,
        Err(_) => return Verdict::Skip("cabeçalho ICMP truncado"),
    };

    match header.kind() {
        // Erros de roteadores intermediários, não respostas.
        IcmpType::TimeExceeded => return Verdict::Skip("time exceeded"),
        IcmpType::DestinationUnreachable => return Verdict::Skip("destination unreachable"),
        _ => {}
    }

    if header.id != 0 {
        match header.kind() {
            // Nosso próprio request (ou de outro processo) visto no socket RAW.
            IcmpType::EchoRequest => return Verdict::Skip("echo request"),
            IcmpType::EchoReply => {
                if expected_id.is_some_and(|id| id != header.id) {
                    return Verdict::Skip("echo reply de outra sessão");
                }
                let body = &icmp[ICMP_HEADER_LEN..];
                if body.len() < TIMESTAMP_LEN {
                    return Verdict::Skip("echo reply sem timestamp");
                }
                return Verdict::Reply { header, source, payload: &body[TIMESTAMP_LEN..] };
            }
            _ => {}
        }
    }

    Verdict::NoReply
}

/// Lê do socket até achar uma Echo Reply, estourar o prazo ou ser cancelado.
///
/// `Ok(None)` é o timeout normal. Erros de I/O que não sejam timeout sobem.
pub fn receive_one(
    socket: &Socket,
    transport: Transport,
    config: &PingerConfig,
    expected_id: Option<u16>,
    cancel: Option<&AtomicBool>,
) -> io::Result<Option<Reply>> {
    let deadline = Instant::now() + config.timeout;
    let mut buf = vec![0u8; RECV_BUFFER_LEN];
    let mut reader = socket;
    let mut frames = 0usize;

    while frames < config.max_frames {
        if cancel.is_some_and(|c| c.load(Ordering::SeqCst)) {
            debug!("leitura cancelada");
            return Ok(None);
        }

        let now = Instant::now();
        if now >= deadline {
            break;
        }
        let wait = (deadline - now).min(config.poll_interval).max(MIN_WAIT);
        socket.set_read_timeout(Some(wait))?;

        let n = match reader.read(&mut buf) {
            Ok(r) => r,
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted
                ) =>
            {
                continue;
            }
            Err(e) => return Err(e),
        };
        frames += 1;

        match classify(&buf[..n], transport, expected_id) {
            Verdict::Reply { header, source, payload } => {
                trace!("echo reply de {:?} id={} seq={} bytes={}", source, header.id, header.seq, payload.len());
                return Ok(Some(Reply { source, id: header.id, seq: header.seq, payload: payload.to_vec() }));
            }
            Verdict::Skip(reason) => trace!("quadro ignorado: {}", reason),
            Verdict::NoReply => {
                trace!("quadro sem id ou de tipo desconhecido; encerrando leitura");
                return Ok(None);
            }
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::icmp::build_echo_request;

    fn reply_frame(id: u16, seq: u16, data: &[u8]) -> Vec<u8> {
        let mut pkt = build_echo_request(id, seq, 42.0, data);
        pkt[0] = 0;
        pkt
    }

    fn with_ip_header(icmp: &[u8]) -> Vec<u8> {
        let mut frame = vec![0x45, 0, 0, 0, 0, 0, 0, 0, 64, 1, 0, 0, 127, 0, 0, 1, 127, 0, 0, 1];
        frame.extend_from_slice(icmp);
        frame
    }

    fn icmp_frame(icmp_type: u8, id: u16) -> Vec<u8> {
        let mut pkt = IcmpHeader::new(icmp_type, 0, 0, id, 0).to_bytes().to_vec();
        pkt.extend_from_slice(&[0u8; 28]);
        pkt
    }

    #[test]
    fn accepts_echo_reply_behind_ip_header() {
        let frame = with_ip_header(&reply_frame(0x1234, 3, b"payload1"));
        match classify(&frame, Transport::Privileged, None) {
            Verdict::Reply { header, source, payload } => {
                assert_eq!(source, Some(Ipv4Addr::LOCALHOST));
                assert_eq!(header.id, 0x1234);
                assert_eq!(header.seq, 3);
                assert_eq!(payload, b"payload1");
            }
            other => panic!("esperado Reply, veio {:?}", other),
        }
    }

    #[test]
    fn honours_ip_options_length() {
        let mut frame = vec![0x46, 0, 0, 0, 0, 0, 0, 0, 64, 1, 0, 0, 127, 0, 0, 1, 127, 0, 0, 1, 1, 1, 1, 1];
        frame.extend_from_slice(&reply_frame(9, 0, b"x"));
        assert!(matches!(classify(&frame, Transport::Privileged, None), Verdict::Reply { payload: b"x", .. }));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn accepts_echo_reply_without_ip_header() {
        let frame = reply_frame(0x0101, 0, b"");
        assert!(matches!(classify(&frame, Transport::Unprivileged, None), Verdict::Reply { payload: b"", .. }));
    }

    #[test]
    fn skips_router_errors() {
        for t in [3u8, 11] {
            let frame = with_ip_header(&icmp_frame(t, 0));
            assert!(matches!(classify(&frame, Transport::Privileged, None), Verdict::Skip(_)));
        }
    }

    #[test]
    fn skips_own_echo_request() {
        let frame = with_ip_header(&build_echo_request(77, 1, 0.0, b"payload1"));
        assert!(matches!(classify(&frame, Transport::Privileged, None), Verdict::Skip(_)));
    }

    #[test]
    fn zero_id_ends_read() {
        let frame = with_ip_header(&reply_frame(0, 1, b"payload1"));
        assert_eq!(classify(&frame, Transport::Privileged, None), Verdict::NoReply);
    }

    #[test]
    fn unknown_type_ends_read() {
        let frame = with_ip_header(&icmp_frame(5, 99));
        assert_eq!(classify(&frame, Transport::Privileged, None), Verdict::NoReply);
    }

    #[test]
    fn truncated_frames_are_skipped() {
        assert!(matches!(classify(&[0x45, 0, 0], Transport::Privileged, None), Verdict::Skip(_)));
        let frame = with_ip_header(&[0, 0, 0, 0]);
        assert!(matches!(classify(&frame, Transport::Privileged, None), Verdict::Skip(_)));
    }

    #[test]
    fn reply_without_timestamp_is_skipped() {
        let mut icmp = IcmpHeader::new(0, 0, 0, 5, 0).to_bytes().to_vec();
        icmp.extend_from_slice(&[1, 2, 3]);
        let frame = with_ip_header(&icmp);
        assert!(matches!(classify(&frame, Transport::Privileged, None), Verdict::Skip(_)));
    }

    #[test]
    fn session_id_policy_filters_foreign_replies() {
        let frame = with_ip_header(&reply_frame(0x2222, 0, b"alheio"));
        assert!(matches!(classify(&frame, Transport::Privileged, Some(0x1111)), Verdict::Skip(_)));
        assert!(matches!(classify(&frame, Transport::Privileged, Some(0x2222)), Verdict::Reply { .. }));
        // Política permissiva aceita qualquer id não zero.
        assert!(matches!(classify(&frame, Transport::Privileged, None), Verdict::Reply { .. }));
    }

    #[cfg(target_os = "linux")]
    mod polling {
        use std::net::{SocketAddr, UdpSocket};

        use socket2::{Domain, Protocol, Type};

        use super::*;

        // Um socket UDP entrega só o payload, como o ping socket do Linux:
        // serve de fio para o laço sem precisar de privilégios.
        fn wire() -> (Socket, UdpSocket, SocketAddr) {
            let rx = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP)).unwrap();
            let bind: SocketAddr = "127.0.0.1:0".parse().unwrap();
            rx.bind(&bind.into()).unwrap();
            let addr = rx.local_addr().unwrap().as_socket().unwrap();
            let tx = UdpSocket::bind("127.0.0.1:0").unwrap();
            (rx, tx, addr)
        }

        fn config(timeout_ms: u64) -> PingerConfig {
            PingerConfig::default().with_timeout(Duration::from_millis(timeout_ms))
        }

        #[test]
        fn skips_request_then_returns_reply() {
            let (rx, tx, addr) = wire();
            tx.send_to(&build_echo_request(7, 0, 1.0, b"payload1"), addr).unwrap();
            tx.send_to(&reply_frame(7, 0, b"payload1"), addr).unwrap();

            let reply = receive_one(&rx, Transport::Unprivileged, &config(2000), None, None).unwrap();
            let reply = reply.expect("sem resposta");
            assert_eq!(reply.payload, b"payload1");
            assert_eq!(reply.id, 7);
            assert_eq!(reply.source, None);
        }

        #[test]
        fn gives_up_after_max_frames() {
            let (rx, tx, addr) = wire();
            for seq in 0..5 {
                tx.send_to(&build_echo_request(7, seq, 1.0, b"ruido"), addr).unwrap();
            }
            tx.send_to(&reply_frame(7, 5, b"depois"), addr).unwrap();

            let start = Instant::now();
            assert_eq!(receive_one(&rx, Transport::Unprivileged, &config(2000), None, None).unwrap(), None);
            assert!(start.elapsed() < Duration::from_secs(1));

            // A resposta que ficou na fila é entregue na leitura seguinte.
            let reply = receive_one(&rx, Transport::Unprivileged, &config(2000), None, None).unwrap();
            assert_eq!(reply.map(|r| r.payload), Some(b"depois".to_vec()));
        }

        #[test]
        fn idle_socket_waits_for_deadline() {
            let (rx, _tx, _addr) = wire();
            let start = Instant::now();
            assert_eq!(receive_one(&rx, Transport::Unprivileged, &config(300), None, None).unwrap(), None);
            let elapsed = start.elapsed();
            assert!(elapsed >= Duration::from_millis(280), "retornou cedo: {:?}", elapsed);
            assert!(elapsed < Duration::from_secs(2), "demorou demais: {:?}", elapsed);
        }

        #[test]
        fn cancel_flag_stops_read() {
            let (rx, _tx, _addr) = wire();
            let cancel = AtomicBool::new(true);
            let start = Instant::now();
            assert_eq!(receive_one(&rx, Transport::Unprivileged, &config(5000), None, Some(&cancel)).unwrap(), None);
            assert!(start.elapsed() < Duration::from_secs(1));
        }

        #[test]
        fn large_reply_is_not_truncated() {
            let (rx, tx, addr) = wire();
            let data = vec![0x5A; 4000];
            tx.send_to(&reply_frame(9, 0, &data), addr).unwrap();

            let reply = receive_one(&rx, Transport::Unprivileged, &config(2000), None, None).unwrap();
            assert_eq!(reply.map(|r| r.payload), Some(data));
        }

        #[test]
        fn session_id_policy_skips_foreign_reply() {
            let (rx, tx, addr) = wire();
            tx.send_to(&reply_frame(1, 0, b"alheio"), addr).unwrap();
            tx.send_to(&reply_frame(2, 0, b"meu"), addr).unwrap();

            let reply = receive_one(&rx, Transport::Unprivileged, &config(2000), Some(2), None).unwrap();
            assert_eq!(reply.map(|r| r.payload), Some(b"meu".to_vec()));
        }
    }
}
