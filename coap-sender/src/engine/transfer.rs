use crate::block;
use crate::error::{Error, When};
use crate::option::ContentFormat;
use crate::req::{Method, Target};

/// Everything the engine needs to know about one transfer
///
/// ```
/// use coap_sender::engine::Transfer;
/// use coap_sender::option::ContentFormat;
/// use coap_sender::req::Method;
///
/// let t = Transfer::new(Method::Post, "coap://10.0.0.1/upload".parse().unwrap())
///   .payload(b"hello".to_vec())
///   .non()
///   .block1(2)
///   .content_format(ContentFormat::Text);
///
/// assert!(!t.confirmable);
/// assert_eq!(t.block1, Some(2));
/// assert_eq!(t.block2, None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
  /// Request method
  pub method: Method,
  /// Where to send the request
  pub target: Target,
  /// The full request body
  pub payload: Vec<u8>,
  /// Send CON (`true`) or NON (`false`) messages
  pub confirmable: bool,
  /// Fragment the request body into blocks of `2^(szx+4)` bytes
  pub block1: Option<u8>,
  /// Follow the server's Block2 continuation, asking for `2^(szx+4)` byte blocks
  pub block2: Option<u8>,
  /// Content-Format of the request body
  pub content_format: Option<ContentFormat>,
  /// Acceptable response Content-Format
  pub accept: Option<ContentFormat>,
  /// Register as an observer of the target
  pub observe: bool,
}

impl Transfer {
  /// A confirmable request with no payload, no blockwise transfer and no
  /// extra options
  pub fn new(method: Method, target: Target) -> Self {
    Self { method,
           target,
           payload: vec![],
           confirmable: true,
           block1: None,
           block2: None,
           content_format: None,
           accept: None,
           observe: false }
  }

  /// Set the request body
  pub fn payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
    self.payload = payload.into();
    self
  }

  /// Send NON messages instead of CON
  pub fn non(mut self) -> Self {
    self.confirmable = false;
    self
  }

  /// Enable Block1 with size exponent `szx`
  pub fn block1(mut self, szx: u8) -> Self {
    self.block1 = Some(szx);
    self
  }

  /// Enable Block2 with size exponent `szx`
  pub fn block2(mut self, szx: u8) -> Self {
    self.block2 = Some(szx);
    self
  }

  /// Attach a Content-Format option
  pub fn content_format(mut self, f: ContentFormat) -> Self {
    self.content_format = Some(f);
    self
  }

  /// Attach an Accept option
  pub fn accept(mut self, f: ContentFormat) -> Self {
    self.accept = Some(f);
    self
  }

  /// Attach an Observe (register) option
  pub fn observe(mut self) -> Self {
    self.observe = true;
    self
  }

  /// Will the request body be sent in Block1 fragments?
  ///
  /// Only non-empty POST and PUT bodies are fragmented.
  pub fn uses_block1(&self) -> bool {
    self.block1.is_some() && !self.payload.is_empty() && self.method.is_write()
  }

  /// Check everything that can be checked before sending anything
  pub fn validate(&self) -> Result<(), Error> {
    if self.target.host.is_empty() {
      return Err(Error::invalid_argument("target has no host"));
    }

    for szx in self.block1.iter().chain(self.block2.iter()) {
      block::size_of(*szx).map_err(|e| When::Validating.what(e.into()))?;
    }

    Ok(())
  }
}
