//! SMPP v3.4 transceiver client.
//!
//! One TCP connection to an SMSC that submits outbound messages and receives MO messages and
//! delivery reports, multiplexed by sequence number.
//!
//! The protocol logic lives in [`Session`], a synchronous state object that is fed bytes and
//! instants and queues the PDUs it wants written. [`Connection`] runs a session on a tokio
//! `TcpStream`; [`SessionHandle`] lets other tasks send through it.
//!
//! # Examples
//!
//! ## Sending a message
//!
//! ```rust,no_run
//! use smpp_transceiver::{
//!     Connection, Correlation, MessageOptions, SessionConfig, SessionDelegate,
//! };
//!
//! struct Log;
//!
//! impl SessionDelegate for Log {
//!     fn on_bound(&mut self, system_id: &str) {
//!         println!("bound to {system_id}");
//!     }
//!
//!     fn on_message_accepted(&mut self, correlation: &Correlation, message_id: &str) {
//!         println!("message {} accepted as {message_id}", correlation.message_id());
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> smpp_transceiver::SmppResult<()> {
//!     let config = SessionConfig::new("system_id", "password");
//!     let (connection, handle) = Connection::connect("localhost:2775", config, Log).await?;
//!     let driver = tokio::spawn(connection.run());
//!
//!     // once bound
//!     handle
//!         .send_long_message(1, "7726", "447700900123", "Hello, World!", MessageOptions::default())
//!         .await?;
//!
//!     handle.send_unbind().await?;
//!     let _ = driver.await;
//!     Ok(())
//! }
//! ```
//!
//! ## Driving a session by hand
//!
//! ```rust
//! use smpp_transceiver::{Session, SessionConfig};
//! use std::time::Instant;
//!
//! let mut session = Session::new(SessionConfig::new("esme", "secret"), ());
//! session.on_connected(Instant::now()).unwrap();
//!
//! while let Some(pdu) = session.poll_transmit() {
//!     // write `pdu` to the transport
//!     assert!(pdu.len() >= 16);
//! }
//! ```

pub mod codec;
pub mod config;
pub mod connection;
pub mod datatypes;
pub mod error;
pub mod frame;
pub(crate) mod macros;
pub mod segmentation;
pub mod session;


pub use codec::{CodecError, Decodable, Encodable, Frame, PduHeader, PduRegistry};
pub use config::SessionConfig;
pub use connection::{Connection, SessionHandle};
pub use error::{SmppError, SmppResult};
pub use frame::{FrameDecoder, FrameError};
pub use segmentation::{MessageOptions, Segment, UdhLayout, get_message_part_size};
pub use session::{
    Correlation, Health, KeepAliveConfig, KeepAliveStatus, Session, SessionDelegate,
    SessionState,
};
