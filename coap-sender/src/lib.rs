//! `coap-sender` composes CoAP requests, drives blockwise transfers
//! and renders whatever comes back so a human can read it.
//!
//! ## Blockwise transfers
//! CoAP messages are meant to fit in a single datagram. Bodies that do not
//! are fragmented with the Block options from [RFC7959](https://www.rfc-editor.org/rfc/rfc7959):
//! - **Block1** fragments a request body; the client sends block `0, 1, 2, ..`
//!   and the server acknowledges each one.
//! - **Block2** fragments a response body; the server answers with block `0`
//!   and the client asks for `1, 2, ..` until the server says there are no more.
//!
//! [`Engine`](crate::engine::Engine) runs both flows against anything that
//! implements [`Transport`](crate::transport::Transport), and hands back a
//! [`TransferResult`](crate::result::TransferResult) holding an exchange log
//! and text / CBOR / hex renderings of the final payload.
//!
//! ```no_run
//! use coap_sender::cancel::Cancel;
//! use coap_sender::config::Config;
//! use coap_sender::engine::{Engine, Transfer};
//! use coap_sender::req::Method;
//! use coap_sender::udp::UdpTransport;
//!
//! let transport = UdpTransport::try_new(Config::default().transport).unwrap();
//! let mut engine = Engine::new(transport);
//!
//! let transfer = Transfer::new(Method::Put, "coap://127.0.0.1/firmware".parse().unwrap())
//!   .payload(vec![0u8; 4096])
//!   .block1(6);
//!
//! let result = engine.transfer(&transfer, &Cancel::new()).unwrap();
//! println!("{}", result.log);
//! ```

// -
// style
#![allow(clippy::unused_unit)]
// -
// deny
#![deny(missing_docs)]
#![deny(missing_debug_implementations)]
#![cfg_attr(not(test), deny(unsafe_code))]
// -
// warnings
#![cfg_attr(not(test), warn(unreachable_pub))]


pub(crate) mod logging;

/// Block1 / Block2 option values
pub mod block;

/// Cooperative cancellation of transfers
pub mod cancel;

/// configuring transports & retries
pub mod config;

/// The blockwise transfer engine
pub mod engine;

/// Errors
pub mod error;

/// Exchange log
pub mod exchange;

/// Rendering payloads for humans
pub mod inspect;

/// Known CoAP options & content formats
pub mod option;

/// Building request payloads
pub mod payload;

/// Request methods & targets
pub mod req;

/// Outcome of a transfer
pub mod result;

/// Caller-level retrying of whole transfers
pub mod retry;

/// The transport capability consumed by the engine
pub mod transport;

/// CoAP over plain UDP
#[cfg(feature = "udp")]
pub mod udp;

#[doc(inline)]
pub use error::{Error, ErrorKind};
