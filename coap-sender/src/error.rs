use core::fmt;

use crate::block;

/// The context that an error occurred in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum When {
  /// Checking the caller's input, before any exchange
  Validating,
  /// Sending block `num` of a Block1 sequence
  SendingBlock1 {
    /// Block number
    num: u32,
  },
  /// Sending a request that was not fragmented
  SingleRequest,
  /// Asking the server for block `num` of a Block2 sequence
  FollowingBlock2 {
    /// Block number
    num: u32,
  },
  /// Waiting to retry a failed transfer
  Retrying {
    /// The attempt that was about to start
    attempt: u16,
  },
  /// No particular context
  None,
}

impl When {
  /// Construct a specific error from the context the error occurred in
  pub fn what(self, what: What) -> Error {
    Error { when: self, what }
  }
}

/// An error encountered while driving a transfer
#[derive(Debug)]
pub struct Error {
  /// What happened?
  pub what: What,
  /// What were we doing when it happened?
  pub when: When,
}

/// A contextless error with some additional debug data attached.
#[derive(Debug)]
pub enum What {
  /// The caller's input was malformed
  InvalidArgument(String),
  /// Encoding or decoding a Block option value failed
  Block(block::Error),
  /// No response arrived before the transport gave up
  Timeout,
  /// The server rejected the request with a Reset message
  Reset,
  /// Some socket operation failed
  SockError(std::io::Error),
  /// A message could not be serialized or parsed
  Malformed(String),
  /// The caller cancelled the transfer
  Cancelled,
}

/// Coarse classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
  /// Malformed caller input; nothing was sent
  InvalidArgument,
  /// A Block option value could not be encoded or decoded
  Encoding,
  /// The transport failed to send or to deliver a response
  Transport,
  /// The caller cancelled the transfer
  Cancelled,
}

impl What {
  /// Which [`ErrorKind`] this is
  pub fn kind(&self) -> ErrorKind {
    match self {
      | What::InvalidArgument(_) => ErrorKind::InvalidArgument,
      | What::Block(e) => e.kind(),
      | What::Timeout | What::Reset | What::SockError(_) | What::Malformed(_) => {
        ErrorKind::Transport
      },
      | What::Cancelled => ErrorKind::Cancelled,
    }
  }
}

impl Error {
  /// Which [`ErrorKind`] this is
  pub fn kind(&self) -> ErrorKind {
    self.what.kind()
  }

  /// Shorthand for an [`What::InvalidArgument`] found while validating input
  pub fn invalid_argument(msg: impl ToString) -> Self {
    When::Validating.what(What::InvalidArgument(msg.to_string()))
  }

  /// Is this an error that a caller-level retry could fix?
  pub fn is_transient(&self) -> bool {
    self.kind() == ErrorKind::Transport
  }
}

impl From<block::Error> for What {
  fn from(e: block::Error) -> Self {
    What::Block(e)
  }
}

impl fmt::Display for When {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      | When::Validating => write!(f, "validating input"),
      | When::SendingBlock1 { num } => write!(f, "sending Block1 #{}", num),
      | When::SingleRequest => write!(f, "sending request"),
      | When::FollowingBlock2 { num } => write!(f, "requesting Block2 #{}", num),
      | When::Retrying { attempt } => write!(f, "waiting for attempt {}", attempt),
      | When::None => Ok(()),
    }
  }
}

impl fmt::Display for What {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      | What::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
      | What::Block(e) => write!(f, "block option: {}", e),
      | What::Timeout => write!(f, "no response (timeout)"),
      | What::Reset => write!(f, "server reset the exchange"),
      | What::SockError(e) => write!(f, "socket error: {}", e),
      | What::Malformed(msg) => write!(f, "malformed message: {}", msg),
      | What::Cancelled => write!(f, "cancelled"),
    }
  }
}

impl fmt::Display for Error {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.when {
      | When::None => write!(f, "{}", self.what),
      | when => write!(f, "{} while {}", self.what, when),
    }
  }
}

impl std::error::Error for Error {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match &self.what {
      | What::SockError(e) => Some(e),
      | What::Block(e) => Some(e),
      | _ => None,
    }
  }
}
