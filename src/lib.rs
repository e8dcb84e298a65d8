//! Canal de payload sobre ICMP Echo.
//!
//! Envia Echo Requests carregando bytes arbitrários e recupera esses bytes
//! das Echo Replies correspondentes. Tenta socket RAW e, sem privilégios,
//! cai para o ping socket DGRAM.
//!
//! ```no_run
//! use pingrs_payload::PayloadPinger;
//!
//! let mut pinger = PayloadPinger::new()?;
//! pinger.send("127.0.0.1", b"payload1");
//! if let Some(data) = pinger.read() {
//!     assert_eq!(data, b"payload1");
//! }
//! # Ok::<(), pingrs_payload::PingerError>(())
//! ```

pub mod checksum;
pub mod config;
pub mod error;
pub mod icmp;
pub mod ip;
pub mod pinger;
pub mod receiver;
pub mod sender;
pub mod transport;

pub use checksum::checksum;
pub use config::{MatchPolicy, PingerConfig};
pub use error::{DecodeError, PingerError, SendError};
pub use icmp::{IcmpHeader, IcmpType};
pub use ip::IpHeader;
pub use pinger::PayloadPinger;
pub use receiver::Reply;
pub use transport::Transport;
