//! vncboot runtime: RFB client, transport, and errors.
//!
//! This crate owns everything that touches the socket:
//!
//! - **Transport**: dialing TCP and the [`Stream`] abstraction that lets the
//!   client run over in-memory pipes
//! - **Client**: the RFB handshake, authentication, and KeyEvent delivery,
//!   with a background reader that drops server-to-client messages
//! - **Testing**: an in-memory RFB server used by this crate's and
//!   downstream tests
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │     vncboot      │  Session, driver, interpreter, orchestrator
//! └────────┬─────────┘
//! ┌────────▼─────────┐
//! │ vncboot-runtime  │  This crate
//! │  ┌────────────┐  │
//! │  │ RfbClient  │  │  Handshake + KeyEvents
//! │  └────────────┘  │
//! │  ┌────────────┐  │
//! │  │ Transport  │  │  TCP / duplex
//! │  └────────────┘  │
//! └────────┬─────────┘
//! ┌────────▼─────────┐
//! │ vncboot-protocol │  Wire encoding
//! └──────────────────┘
//! ```

pub mod client;
mod drain;
pub mod error;
pub mod testing;
pub mod transport;

pub use client::{ClientConfig, RfbClient};
pub use error::{Error, Result};
pub use transport::{BoxedStream, Stream, dial_tcp, shutdown};
