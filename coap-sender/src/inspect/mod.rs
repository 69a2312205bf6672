//! Every rendering is best-effort; a payload that is not text (or not CBOR)
//! simply does not get that rendering.

/// CBOR diagnostic notation
pub mod cbor;

/// Hex dumps
pub mod hex;

#[doc(inline)]
pub use self::cbor::diagnostic;
#[doc(inline)]
pub use self::hex::dump;

/// The renderings of one payload
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Inspection {
  /// The payload as UTF-8 text, see [`text`]
  pub text: Option<String>,
  /// The payload in CBOR diagnostic notation, see [`diagnostic`]
  pub cbor: Option<String>,
  /// Hex dump of the payload, see [`dump`]
  pub hex: String,
}

/// Render a payload every way it can be rendered
///
/// ```
/// use coap_sender::inspect::inspect;
///
/// let i = inspect(b"hello");
/// assert_eq!(i.text.as_deref(), Some("hello"));
/// assert_eq!(i.cbor, None);
/// assert!(i.hex.contains("68 65 6C 6C 6F"));
/// ```
pub fn inspect(bytes: &[u8]) -> Inspection {
  Inspection { text: text(bytes),
               cbor: diagnostic(bytes),
               hex: dump(bytes) }
}

/// Read the payload as text
///
/// The bytes must be UTF-8 and must not contain NUL or other control
/// characters besides tab, line feed and carriage return; valid UTF-8
/// that is full of control bytes is almost always a binary format.
pub fn text(bytes: &[u8]) -> Option<String> {
  if bytes.is_empty() {
    return None;
  }

  let s = core::str::from_utf8(bytes).ok()?;
  let binary = s.chars()
                .any(|c| c.is_control() && !matches!(c, '\t' | '\n' | '\r'));

  if binary {
    None
  } else {
    Some(s.to_string())
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn hello() {
    let i = inspect(&[0x68, 0x65, 0x6C, 0x6C, 0x6F]);
    assert_eq!(i.text.as_deref(), Some("hello"));
    assert!(i.hex.contains("68 65 6C 6C 6F"));
    assert_eq!(i.cbor, None);
  }

  #[test]
  fn cbor_integer_is_not_text() {
    let i = inspect(&[0x01]);
    assert_eq!(i.cbor.as_deref(), Some("1"));
    assert_eq!(i.text, None);
    assert!(i.hex.starts_with("000000  01 "));
  }

  #[test]
  fn empty() {
    let i = inspect(&[]);
    assert_eq!(i,
               Inspection { text: None,
                            cbor: None,
                            hex: hex::EMPTY.to_string() });
  }

  #[test]
  fn text_rejects_nul() {
    assert_eq!(text(b"hel\0lo"), None);
    assert_eq!(text(&[0xFF, 0xFE]), None);
    assert_eq!(text(b"line 1\r\n\tline 2").as_deref(), Some("line 1\r\n\tline 2"));
    assert_eq!(text("héllo ✓".as_bytes()).as_deref(), Some("héllo ✓"));
  }

  #[test]
  fn text_that_is_also_cbor() {
    // 0x61 0x61: a one-character CBOR text string, and also "aa"
    let i = inspect(b"aa");
    assert_eq!(i.text.as_deref(), Some("aa"));
    assert_eq!(i.cbor.as_deref(), Some("\"a\""));
  }
}
