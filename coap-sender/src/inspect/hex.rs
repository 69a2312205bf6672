use core::fmt::Write;

/// What an empty payload dumps as
pub const EMPTY: &str = "(empty)";

/// Bytes per line of a dump
pub const WIDTH: usize = 16;

/// Classic hex dump; offset, bytes, then the printable ASCII
///
/// ```text
/// 000000  68 65 6C 6C 6F 2C 20 77 6F 72 6C 64 21 0A 00 FF  hello, world!...
/// 000010  2A                                               *
/// ```
pub fn dump(bytes: &[u8]) -> String {
  if bytes.is_empty() {
    return EMPTY.to_string();
  }

  let mut out = String::with_capacity((bytes.len() / WIDTH + 1) * (8 + WIDTH * 4 + 2));

  for (ix, line) in bytes.chunks(WIDTH).enumerate() {
    if ix > 0 {
      out.push('\n');
    }

    write!(out, "{:06X}  ", ix * WIDTH).ok();

    for b in line {
      write!(out, "{:02X} ", b).ok();
    }
    for _ in line.len()..WIDTH {
      out.push_str("   ");
    }

    out.push(' ');
    out.extend(line.iter().map(|b| match b {
                             | 0x20..=0x7E => *b as char,
                             | _ => '.',
                           }));
  }

  out
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn empty() {
    assert_eq!(dump(&[]), "(empty)");
  }

  #[test]
  fn one_short_line() {
    assert_eq!(dump(b"hello"),
               format!("000000  68 65 6C 6C 6F {} hello", " ".repeat(11 * 3)));
  }

  #[test]
  fn full_and_partial_lines() {
    let bytes = b"hello, world!\n\0\xFF*";
    let lines = dump(bytes).lines().map(String::from).collect::<Vec<_>>();

    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0],
               "000000  68 65 6C 6C 6F 2C 20 77 6F 72 6C 64 21 0A 00 FF  hello, world!...");
    assert!(lines[1].starts_with("000010  2A "));
    assert!(lines[1].ends_with(" *"));
    assert_eq!(lines[0].len(), lines[1].len() + WIDTH - 1);
  }

  #[test]
  fn offsets_count_up_in_hex() {
    let dumped = dump(&[0u8; 300]);
    let offsets = dumped.lines().map(|l| &l[..6]).collect::<Vec<_>>();

    assert_eq!(offsets.len(), 19);
    assert_eq!(offsets[1], "000010");
    assert_eq!(offsets[18], "000120");
  }
}
