use crate::cancel::Cancel;
use crate::error::Error;
use crate::option::OptionKind;
use crate::req::{Method, Target};

/// The CoAP capabilities the [`Engine`](crate::engine::Engine) needs from
/// whatever actually moves messages.
///
/// Implementors own message framing, message IDs, tokens and sockets; the
/// engine only builds requests, attaches options & payloads and waits for the
/// matching response.
///
/// ```
/// use coap_sender::cancel::Cancel;
/// use coap_sender::error::{Error, What, When};
/// use coap_sender::option::OptionKind;
/// use coap_sender::req::{Method, Target};
/// use coap_sender::transport::Transport;
///
/// /// A transport that answers every request with its own payload
/// #[derive(Debug, Default)]
/// struct Echo;
///
/// #[derive(Debug)]
/// struct Req(Vec<u8>);
///
/// impl Transport for Echo {
///   type Req = Req;
///   type Resp = Vec<u8>;
///
///   fn create_request(&mut self, _: Method, _: &Target, _: bool) -> Result<Req, Error> {
///     Ok(Req(vec![]))
///   }
///
///   fn set_payload(&mut self, req: &mut Req, payload: &[u8]) {
///     req.0 = payload.to_vec();
///   }
///
///   fn add_option(&mut self, _: &mut Req, _: OptionKind, _: &[u8]) {}
///
///   fn send(&mut self, _: &mut Req) -> Result<(), Error> {
///     Ok(())
///   }
///
///   fn await_response(&mut self, req: &Req, cancel: &Cancel) -> Result<Vec<u8>, Error> {
///     cancel.check(When::None)?;
///     Ok(req.0.clone())
///   }
///
///   fn payload<'a>(&self, resp: &'a Vec<u8>) -> &'a [u8] {
///     resp
///   }
///
///   fn option(&self, _: &Vec<u8>, _: OptionKind) -> Option<Vec<u8>> {
///     None
///   }
///
///   fn describe_request(&self, req: &Req) -> String {
///     format!("REQ  PayloadLen={}", req.0.len())
///   }
///
///   fn describe_response(&self, resp: &Vec<u8>) -> String {
///     format!("RES  PayloadLen={}", resp.len())
///   }
///
///   fn describe_request_options(&self, _: &Req) -> String {
///     "Options: (none)".into()
///   }
///
///   fn describe_response_options(&self, _: &Vec<u8>) -> String {
///     "Options: (none)".into()
///   }
/// }
/// ```
pub trait Transport {
  /// A request under construction
  type Req;

  /// A response received for a request
  type Resp;

  /// Start building a request for `method` on `target`.
  ///
  /// `confirmable` selects between a CON and NON message.
  fn create_request(&mut self,
                    method: Method,
                    target: &Target,
                    confirmable: bool)
                    -> Result<Self::Req, Error>;

  /// Replace the request's payload
  fn set_payload(&mut self, req: &mut Self::Req, payload: &[u8]);

  /// Attach an option value to the request
  fn add_option(&mut self, req: &mut Self::Req, kind: OptionKind, value: &[u8]);

  /// Transmit the request
  fn send(&mut self, req: &mut Self::Req) -> Result<(), Error>;

  /// Block until the response to a sent request arrives.
  ///
  /// Fails with a [`Transport`](crate::ErrorKind::Transport) error when no
  /// response arrives in time, and with [`Cancelled`](crate::ErrorKind::Cancelled)
  /// if `cancel` fires first.
  fn await_response(&mut self, req: &Self::Req, cancel: &Cancel) -> Result<Self::Resp, Error>;

  /// The response's payload, possibly empty
  fn payload<'a>(&self, resp: &'a Self::Resp) -> &'a [u8];

  /// The value of an option in the response, if present
  fn option(&self, resp: &Self::Resp, kind: OptionKind) -> Option<Vec<u8>>;

  /// One-line summary of a request
  fn describe_request(&self, req: &Self::Req) -> String;

  /// One-line summary of a response
  fn describe_response(&self, resp: &Self::Resp) -> String;

  /// Listing of a request's options
  fn describe_request_options(&self, req: &Self::Req) -> String;

  /// Listing of a response's options
  fn describe_response_options(&self, resp: &Self::Resp) -> String;
}
