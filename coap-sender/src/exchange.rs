use core::fmt;

use crate::block::BlockParam;

/// Which way a message went
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
  /// We sent it
  Tx,
  /// We received it
  Rx,
}

impl fmt::Display for Direction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      | Direction::Tx => f.write_str("TX"),
      | Direction::Rx => f.write_str("RX"),
    }
  }
}

/// Which Block option a message was tagged with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
  /// Request body fragment
  Block1,
  /// Response body fragment
  Block2,
}

impl fmt::Display for BlockKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      | BlockKind::Block1 => f.write_str("Block1"),
      | BlockKind::Block2 => f.write_str("Block2"),
    }
  }
}

/// One transmitted or received message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeLogEntry {
  /// Sent or received
  pub direction: Direction,
  /// The Block option the message carried, if any
  pub block: Option<(BlockKind, BlockParam)>,
  /// Payload length in bytes
  pub len: usize,
  /// The transport's one-line summary of the message
  pub summary: String,
  /// The transport's listing of the message's options
  pub options: String,
}

impl fmt::Display for ExchangeLogEntry {
  /// ```text
  /// [TX Block1] num=0 m=1 szx=2 size=64
  /// REQ  Type=Con Code=0.02 (POST) MID=1234 Token=0A0B0C0D PayloadLen=64
  /// Options:
  ///  - Block1: num=0 m=1 szx=2
  /// ```
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.block {
      | Some((kind, b)) => write!(f, "[{} {}] {} size={}", self.direction, kind, b, self.len)?,
      | None => write!(f, "[{}] size={}", self.direction, self.len)?,
    }

    write!(f, "\n{}\n{}", self.summary, self.options)
  }
}

/// Append-only record of every message in a transfer
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExchangeLog(Vec<ExchangeLogEntry>);

impl ExchangeLog {
  /// An empty log
  pub fn new() -> Self {
    Self::default()
  }

  /// Record a message
  pub fn push(&mut self, entry: ExchangeLogEntry) {
    self.0.push(entry);
  }

  /// The entries, oldest first
  pub fn entries(&self) -> &[ExchangeLogEntry] {
    &self.0
  }

  /// Number of entries
  pub fn len(&self) -> usize {
    self.0.len()
  }

  /// Is the log empty?
  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  /// Give up the entries
  pub fn into_entries(self) -> Vec<ExchangeLogEntry> {
    self.0
  }
}

impl fmt::Display for ExchangeLog {
  /// Entries separated by blank lines
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (ix, entry) in self.0.iter().enumerate() {
      if ix > 0 {
        f.write_str("\n\n")?;
      }
      write!(f, "{}", entry)?;
    }

    Ok(())
  }
}
