use core::fmt::Write;

use serde_cbor::Value;

/// Decode a single CBOR data item and render it in
/// [diagnostic notation](https://www.rfc-editor.org/rfc/rfc8949#section-8).
///
/// Yields `None` when the bytes are empty, not well-formed, or have
/// trailing bytes after the first item.
///
/// ```
/// use coap_sender::inspect::diagnostic;
///
/// // {"a": 1, "b": "x"}
/// let bytes = [0xA2, 0x61, 0x61, 0x01, 0x61, 0x62, 0x61, 0x78];
/// assert_eq!(diagnostic(&bytes).as_deref(), Some(r#"{"a": 1, "b": "x"}"#));
/// ```
pub fn diagnostic(bytes: &[u8]) -> Option<String> {
  if bytes.is_empty() {
    return None;
  }

  match serde_cbor::from_slice::<Value>(bytes) {
    | Ok(value) => {
      let mut out = String::new();
      write_value(&mut out, &value);
      Some(out)
    },
    | Err(e) => {
      log::trace!(target: crate::logging::TARGET, "payload is not CBOR: {}", e);
      None
    },
  }
}

fn write_value(out: &mut String, value: &Value) {
  match value {
    | Value::Null => out.push_str("null"),
    | Value::Bool(b) => write!(out, "{}", b).unwrap_or_default(),
    | Value::Integer(n) => write!(out, "{}", n).unwrap_or_default(),
    | Value::Float(f) => write_float(out, *f),
    | Value::Bytes(bs) => write!(out, "h'{}'", ::hex::encode(bs)).unwrap_or_default(),
    | Value::Text(s) => write_text(out, s),
    | Value::Array(items) => {
      out.push('[');
      for (ix, item) in items.iter().enumerate() {
        if ix > 0 {
          out.push_str(", ");
        }
        write_value(out, item);
      }
      out.push(']');
    },
    | Value::Map(entries) => {
      out.push('{');
      for (ix, (k, v)) in entries.iter().enumerate() {
        if ix > 0 {
          out.push_str(", ");
        }
        write_value(out, k);
        out.push_str(": ");
        write_value(out, v);
      }
      out.push('}');
    },
    | Value::Tag(tag, inner) => {
      write!(out, "{}(", tag).unwrap_or_default();
      write_value(out, inner);
      out.push(')');
    },
    | _ => out.push_str("undefined"),
  }
}

fn write_float(out: &mut String, f: f64) {
  if f.is_nan() {
    out.push_str("NaN");
  } else if f.is_infinite() {
    out.push_str(if f > 0. { "Infinity" } else { "-Infinity" });
  } else {
    // `Debug` keeps the `.0` on integral floats, so 1.0 doesn't read as 1
    write!(out, "{:?}", f).unwrap_or_default();
  }
}

fn write_text(out: &mut String, s: &str) {
  out.push('"');
  for c in s.chars() {
    match c {
      | '"' => out.push_str("\\\""),
      | '\\' => out.push_str("\\\\"),
      | '\n' => out.push_str("\\n"),
      | '\r' => out.push_str("\\r"),
      | '\t' => out.push_str("\\t"),
      | c if c.is_control() => write!(out, "\\u{:04x}", c as u32).unwrap_or_default(),
      | c => out.push(c),
    }
  }
  out.push('"');
}
