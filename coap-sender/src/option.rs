use toad_msg::opt::known::{no_repeat, repeat};
#[doc(inline)]
pub use toad_msg::ContentFormat;
use toad_msg::OptNumber;

use crate::error::Error;

/// Options the engine attaches to requests or reads from responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OptionKind {
  /// Request body fragmentation ([RFC7959 2.2](https://www.rfc-editor.org/rfc/rfc7959#section-2.2))
  Block1,
  /// Response body fragmentation ([RFC7959 2.2](https://www.rfc-editor.org/rfc/rfc7959#section-2.2))
  Block2,
  /// Format of the request payload
  ContentFormat,
  /// Acceptable formats for the response payload
  Accept,
  /// Register interest in a resource ([RFC7641](https://www.rfc-editor.org/rfc/rfc7641))
  Observe,
}

impl OptionKind {
  /// The option number on the wire
  pub fn number(&self) -> OptNumber {
    match self {
      | OptionKind::Observe => no_repeat::OBSERVE,
      | OptionKind::ContentFormat => no_repeat::CONTENT_FORMAT,
      | OptionKind::Accept => no_repeat::ACCEPT,
      | OptionKind::Block2 => no_repeat::BLOCK2,
      | OptionKind::Block1 => no_repeat::BLOCK1,
    }
  }
}

/// How an option's value should be read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueFormat {
  /// zero-length
  Empty,
  /// UTF-8 string
  String,
  /// big-endian unsigned integer
  Uint,
  /// a Block1 / Block2 value
  Block,
  /// opaque bytes
  Opaque,
}

/// Human name and value format of a known option number
pub fn describe(number: OptNumber) -> Option<(&'static str, ValueFormat)> {
  use ValueFormat::*;

  let d = match number {
    | repeat::IF_MATCH => ("If-Match", Opaque),
    | no_repeat::HOST => ("Uri-Host", String),
    | repeat::ETAG => ("ETag", Opaque),
    | no_repeat::IF_NONE_MATCH => ("If-None-Match", Empty),
    | no_repeat::OBSERVE => ("Observe", Uint),
    | no_repeat::PORT => ("Uri-Port", Uint),
    | repeat::LOCATION_PATH => ("Location-Path", String),
    | repeat::PATH => ("Uri-Path", String),
    | no_repeat::CONTENT_FORMAT => ("Content-Format", Uint),
    | no_repeat::MAX_AGE => ("Max-Age", Uint),
    | repeat::QUERY => ("Uri-Query", String),
    | no_repeat::ACCEPT => ("Accept", Uint),
    | repeat::LOCATION_QUERY => ("Location-Query", String),
    | no_repeat::BLOCK2 => ("Block2", Block),
    | no_repeat::BLOCK1 => ("Block1", Block),
    | no_repeat::SIZE2 => ("Size2", Uint),
    | no_repeat::PROXY_URI => ("Proxy-Uri", String),
    | no_repeat::PROXY_SCHEME => ("Proxy-Scheme", String),
    | no_repeat::SIZE1 => ("Size1", Uint),
    | _ => return None,
  };

  Some(d)
}

/// Encode an unsigned integer option value with no leading zero bytes
///
/// Zero encodes as the empty value, as RFC7252 section 3.2 allows.
pub fn uint_value(n: u32) -> Vec<u8> {
  let bytes = n.to_be_bytes();
  let skip = bytes.iter().take_while(|b| **b == 0).count();
  bytes[skip..].to_vec()
}

/// Read a big-endian unsigned integer option value
pub fn read_uint(bytes: &[u8]) -> u64 {
  bytes.iter().fold(0u64, |n, b| (n << 8) | u64::from(*b))
}

/// `application/cbor` ([RFC8949](https://www.rfc-editor.org/rfc/rfc8949#section-9.5)),
/// which [`ContentFormat`] only knows as a number
pub const CBOR: ContentFormat = ContentFormat::Other(60);

const MEDIA_TYPES: [(u16, &str); 7] = [(0, "text/plain"),
                                       (40, "application/link-format"),
                                       (41, "application/xml"),
                                       (42, "application/octet-stream"),
                                       (47, "application/exi"),
                                       (50, "application/json"),
                                       (60, "application/cbor")];

/// Content-Format option value
///
/// ```
/// use coap_sender::option::{content_format_value, ContentFormat, CBOR};
///
/// assert_eq!(content_format_value(ContentFormat::Text), Vec::<u8>::new());
/// assert_eq!(content_format_value(CBOR), vec![60]);
/// ```
pub fn content_format_value(f: ContentFormat) -> Vec<u8> {
  uint_value(u32::from(u16::from(&f)))
}

/// Media type name of a content format, if it is one we know
pub fn media_type(f: ContentFormat) -> Option<&'static str> {
  let n = u16::from(&f);
  MEDIA_TYPES.iter()
             .find(|(m, _)| *m == n)
             .map(|(_, name)| *name)
}

/// Media type name of a content format, or its number
pub fn content_format_name(f: ContentFormat) -> String {
  match media_type(f) {
    | Some(name) => name.to_string(),
    | None => u16::from(&f).to_string(),
  }
}

/// Parse a media type name (`"application/cbor"`) or a raw number (`"60"`)
pub fn parse_content_format(s: &str) -> Result<ContentFormat, Error> {
  let s = s.trim();
  if let Ok(n) = s.parse::<u16>() {
    return Ok(ContentFormat::from(n));
  }

  let name = s.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
  MEDIA_TYPES.iter()
             .find(|(_, m)| *m == name)
             .map(|(n, _)| ContentFormat::from(*n))
             .ok_or_else(|| Error::invalid_argument(format!("unsupported content format {:?}", s)))
}
