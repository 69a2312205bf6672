use core::fmt;
use core::str::FromStr;

use crate::error::Error;

/// How the caller's payload input should be read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadMode {
  /// No payload; the input is ignored
  None,
  /// The input's UTF-8 bytes
  Text,
  /// The input is hex digits, see [`from_hex`]
  Hex,
  /// The input is JSON to send as CBOR, see [`cbor_from_json`]
  CborFromJson,
}

impl Default for PayloadMode {
  fn default() -> Self {
    PayloadMode::None
  }
}

impl FromStr for PayloadMode {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      | "none" => Ok(PayloadMode::None),
      | "text" => Ok(PayloadMode::Text),
      | "hex" => Ok(PayloadMode::Hex),
      | "json" | "cbor" => Ok(PayloadMode::CborFromJson),
      | _ => Err(Error::invalid_argument(format!("unknown payload mode {:?}", s))),
    }
  }
}

impl fmt::Display for PayloadMode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
                  | PayloadMode::None => "none",
                  | PayloadMode::Text => "text",
                  | PayloadMode::Hex => "hex",
                  | PayloadMode::CborFromJson => "json",
                })
  }
}

/// Turn the caller's input into payload bytes
///
/// ```
/// use coap_sender::payload::{build, PayloadMode};
///
/// assert_eq!(build(PayloadMode::Text, "hi").unwrap(), b"hi".to_vec());
/// assert_eq!(build(PayloadMode::Hex, "68 69").unwrap(), b"hi".to_vec());
/// assert_eq!(build(PayloadMode::CborFromJson, "1").unwrap(), vec![0x01]);
/// assert_eq!(build(PayloadMode::None, "ignored").unwrap(), Vec::<u8>::new());
/// ```
pub fn build(mode: PayloadMode, input: &str) -> Result<Vec<u8>, Error> {
  match mode {
    | PayloadMode::None => Ok(vec![]),
    | PayloadMode::Text => Ok(input.as_bytes().to_vec()),
    | PayloadMode::Hex => from_hex(input),
    | PayloadMode::CborFromJson => cbor_from_json(input),
  }
}

/// Parse loosely formatted hex
///
/// `0x` prefixes are dropped and anything that is not a hex digit separates
/// bytes, so `DE AD be ef`, `0xDE,0xAD` and `de:ad` all work.
pub fn from_hex(input: &str) -> Result<Vec<u8>, Error> {
  let digits = input.replace("0x", " ")
                    .replace("0X", " ")
                    .chars()
                    .filter(char::is_ascii_hexdigit)
                    .collect::<String>();

  if digits.len() % 2 != 0 {
    return Err(Error::invalid_argument(format!("hex input has an odd number of digits ({})",
                                               digits.len())));
  }

  hex::decode(&digits).map_err(|e| Error::invalid_argument(format!("bad hex: {}", e)))
}

/// Parse JSON and encode it as CBOR
pub fn cbor_from_json(input: &str) -> Result<Vec<u8>, Error> {
  let value = serde_json::from_str::<serde_json::Value>(input)
                .map_err(|e| Error::invalid_argument(format!("bad JSON: {}", e)))?;

  serde_cbor::to_vec(&value).map_err(|e| Error::invalid_argument(format!("JSON not representable as CBOR: {}", e)))
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::ErrorKind;

  #[test]
  fn hex() {
    assert_eq!(from_hex("DE AD be ef").unwrap(), vec![0xDE, 0xAD, 0xBE, 0xEF]);
    assert_eq!(from_hex("0xDE,0xAD").unwrap(), vec![0xDE, 0xAD]);
    assert_eq!(from_hex("0XDE 0x0A").unwrap(), vec![0xDE, 0x0A]);
    assert_eq!(from_hex("de:ad\nbe\tef").unwrap(), vec![0xDE, 0xAD, 0xBE, 0xEF]);
    assert_eq!(from_hex("").unwrap(), Vec::<u8>::new());
  }

  #[test]
  fn odd_hex_fails() {
    assert_eq!(from_hex("ABC").unwrap_err().kind(), ErrorKind::InvalidArgument);
    assert_eq!(from_hex("0xA").unwrap_err().kind(), ErrorKind::InvalidArgument);
  }

  #[test]
  fn json_to_cbor() {
    assert_eq!(cbor_from_json(r#"{"a":1}"#).unwrap(), vec![0xA1, 0x61, 0x61, 0x01]);
    assert_eq!(cbor_from_json("[1, true, null]").unwrap(),
               vec![0x83, 0x01, 0xF5, 0xF6]);
    assert_eq!(cbor_from_json(r#""hi""#).unwrap(), vec![0x62, b'h', b'i']);
  }

  #[test]
  fn bad_json_fails() {
    assert_eq!(cbor_from_json("{a:1}").unwrap_err().kind(),
               ErrorKind::InvalidArgument);
  }

  #[test]
  fn modes() {
    assert_eq!("Hex".parse::<PayloadMode>().unwrap(), PayloadMode::Hex);
    assert_eq!("json".parse::<PayloadMode>().unwrap(), PayloadMode::CborFromJson);
    assert!("yaml".parse::<PayloadMode>().is_err());
    assert_eq!(build(PayloadMode::Text, "é").unwrap(), vec![0xC3, 0xA9]);
  }
}
