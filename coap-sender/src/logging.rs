use core::fmt::Write;

use toad_msg::opt::known::no_repeat::{ACCEPT, CONTENT_FORMAT};
use toad_msg::{ContentFormat, OptNumber};

use crate::block;
use crate::option::{self, ValueFormat};

/// `log` target for everything this crate emits
pub(crate) const TARGET: &str = "coap_sender";

/// What an option listing reads as when there are no options
pub(crate) const NO_OPTIONS: &str = "Options: (none)";

/// What a missing property in a summary reads as
pub(crate) const UNKNOWN: &str = "?";

/// The header fields of a message, as far as they are known
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Header<'a> {
  pub(crate) ty: Option<&'a str>,
  pub(crate) code: Option<(u8, u8)>,
  pub(crate) id: Option<u16>,
  pub(crate) token: &'a [u8],
  pub(crate) payload_len: usize,
}

/// `REQ  Type=Con Code=0.02 (POST) MID=1234 Token=0A0B0C0D PayloadLen=64`
pub(crate) fn request_summary(h: Header<'_>) -> String {
  summary("REQ ", h)
}

/// `RES  Type=Ack Code=2.05 (Content) MID=1234 Token=0A0B0C0D PayloadLen=5`
pub(crate) fn response_summary(h: Header<'_>) -> String {
  summary("RES ", h)
}

fn summary(prefix: &str, h: Header<'_>) -> String {
  let mut s = String::new();
  write!(s, "{} Type={}", prefix, h.ty.unwrap_or(UNKNOWN)).ok();

  match h.code {
    | Some((class, detail)) => {
      write!(s, " Code={}.{:02}", class, detail).ok();
      if let Some(name) = code_name(class, detail) {
        write!(s, " ({})", name).ok();
      }
    },
    | None => {
      write!(s, " Code={}", UNKNOWN).ok();
    },
  }

  match h.id {
    | Some(id) => write!(s, " MID={}", id).ok(),
    | None => write!(s, " MID={}", UNKNOWN).ok(),
  };

  if h.token.is_empty() {
    s.push_str(" Token=(none)");
  } else {
    write!(s, " Token={}", ::hex::encode_upper(h.token)).ok();
  }

  write!(s, " PayloadLen={}", h.payload_len).ok();
  s
}

/// Human name of a message code
pub(crate) fn code_name(class: u8, detail: u8) -> Option<&'static str> {
  let name = match (class, detail) {
    | (0, 0) => "Empty",
    | (0, 1) => "GET",
    | (0, 2) => "POST",
    | (0, 3) => "PUT",
    | (0, 4) => "DELETE",
    | (2, 1) => "Created",
    | (2, 2) => "Deleted",
    | (2, 3) => "Valid",
    | (2, 4) => "Changed",
    | (2, 5) => "Content",
    | (2, 31) => "Continue",
    | (4, 0) => "Bad Request",
    | (4, 1) => "Unauthorized",
    | (4, 2) => "Bad Option",
    | (4, 3) => "Forbidden",
    | (4, 4) => "Not Found",
    | (4, 5) => "Method Not Allowed",
    | (4, 6) => "Not Acceptable",
    | (4, 8) => "Request Entity Incomplete",
    | (4, 12) => "Precondition Failed",
    | (4, 13) => "Request Entity Too Large",
    | (4, 15) => "Unsupported Content-Format",
    | (5, 0) => "Internal Server Error",
    | (5, 1) => "Not Implemented",
    | (5, 2) => "Bad Gateway",
    | (5, 3) => "Service Unavailable",
    | (5, 4) => "Gateway Timeout",
    | (5, 5) => "Proxying Not Supported",
    | _ => return None,
  };

  Some(name)
}

/// Multi-line option listing
///
/// ```text
/// Options:
///  - Uri-Path: "test"
///  - Content-Format: 60 (application/cbor)
///  - Block1: num=0 m=1 szx=2
/// ```
pub(crate) fn options<'a>(opts: impl IntoIterator<Item = (u32, &'a [u8])>) -> String {
  let mut s = String::from("Options:");
  let mut any = false;

  for (number, value) in opts {
    any = true;
    s.push_str("\n - ");
    s.push_str(&option(number, value));
  }

  if any {
    s
  } else {
    NO_OPTIONS.to_string()
  }
}

/// `Name: value` for one option value
pub(crate) fn option(number: u32, value: &[u8]) -> String {
  let (name, format) = match option::describe(OptNumber(number)) {
    | Some((name, format)) => (name.to_string(), format),
    | None => (format!("Option({})", number), ValueFormat::Opaque),
  };

  let rendered = match format {
    | _ if value.is_empty() && format != ValueFormat::Uint => None,
    | ValueFormat::Empty => None,
    | ValueFormat::String => match core::str::from_utf8(value) {
      | Ok(s) => Some(format!("{:?}", s)),
      | Err(_) => Some(opaque(value)),
    },
    | ValueFormat::Uint if value.len() > 8 => Some(opaque(value)),
    | ValueFormat::Uint => {
      let n = option::read_uint(value);
      match (OptNumber(number), u16::try_from(n)) {
        | (CONTENT_FORMAT, Ok(cf)) | (ACCEPT, Ok(cf)) => {
          Some(format!("{} ({})", n, option::content_format_name(ContentFormat::from(cf))))
        },
        | _ => Some(n.to_string()),
      }
    },
    | ValueFormat::Block => match block::decode(value) {
      | Ok(b) => Some(b.to_string()),
      | Err(_) => Some(opaque(value)),
    },
    | ValueFormat::Opaque => Some(opaque(value)),
  };

  match rendered {
    | Some(v) => format!("{}: {}", name, v),
    | None => name,
  }
}

fn opaque(value: &[u8]) -> String {
  format!("0x{}", ::hex::encode_upper(value))
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn summaries() {
    let h = Header { ty: Some("Con"),
                     code: Some((0, 2)),
                     id: Some(1234),
                     token: &[0x0A, 0x0B],
                     payload_len: 64 };
    assert_eq!(request_summary(h),
               "REQ  Type=Con Code=0.02 (POST) MID=1234 Token=0A0B PayloadLen=64");

    let h = Header { ty: Some("Ack"),
                     code: Some((2, 5)),
                     id: Some(1),
                     token: &[],
                     payload_len: 5 };
    assert_eq!(response_summary(h),
               "RES  Type=Ack Code=2.05 (Content) MID=1 Token=(none) PayloadLen=5");
  }

  #[test]
  fn summary_with_missing_fields() {
    assert_eq!(response_summary(Header::default()),
               "RES  Type=? Code=? MID=? Token=(none) PayloadLen=0");
    let h = Header { code: Some((2, 99)),
                     ..Header::default() };
    assert!(response_summary(h).contains("Code=2.99 MID"));
  }

  #[test]
  fn option_listing() {
    let listing = options(vec![(11, &b"test"[..]),
                               (12, &[60][..]),
                               (27, &[0x0A][..]),
                               (6, &[][..]),
                               (4, &[0xBE, 0xEF][..]),
                               (2048, &[1][..])]);

    assert_eq!(listing,
               ["Options:",
                " - Uri-Path: \"test\"",
                " - Content-Format: 60 (application/cbor)",
                " - Block1: num=0 m=1 szx=2",
                " - Observe: 0",
                " - ETag: 0xBEEF",
                " - Option(2048): 0x01"].join("\n"));
  }

  #[test]
  fn no_options() {
    assert_eq!(options(Vec::<(u32, &[u8])>::new()), NO_OPTIONS);
  }

  #[test]
  fn bad_block_value_is_shown_raw() {
    assert_eq!(option(23, &[0x0F]), "Block2: 0x0F");
  }
}
