use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::retry::{Attempts, Strategy};

/// Configuration options related to the UDP transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Transport {
  /// Local address to bind the socket to
  ///
  /// Defaults to any interface, any port.
  /// ```
  /// use coap_sender::config::Transport;
  ///
  /// assert_eq!(Transport::default().bind, "0.0.0.0:0".parse().unwrap());
  /// ```
  pub bind: SocketAddr,
  /// How long to wait for the response to a request before giving up.
  ///
  /// Confirmable requests are not retransmitted while waiting, so this bounds
  /// a single attempt.
  ///
  /// Defaults to 3 seconds.
  /// ```
  /// use std::time::Duration;
  ///
  /// use coap_sender::config::Transport;
  ///
  /// assert_eq!(Transport::default().response_timeout, Duration::from_millis(3000));
  /// ```
  pub response_timeout: Duration,
  /// How long to sleep between polls of the socket while waiting
  ///
  /// Defaults to 5 milliseconds.
  /// ```
  /// use std::time::Duration;
  ///
  /// use coap_sender::config::Transport;
  ///
  /// assert_eq!(Transport::default().poll_interval, Duration::from_millis(5));
  /// ```
  pub poll_interval: Duration,
  /// Largest datagram accepted.
  ///
  /// Anything longer fails the exchange rather than being truncated.
  ///
  /// Defaults to 65535 bytes, the most a UDP length field can describe.
  /// ```
  /// use coap_sender::config::Transport;
  ///
  /// assert_eq!(Transport::default().max_datagram, 65535);
  /// ```
  pub max_datagram: usize,
}

/// Configuration options related to retrying whole transfers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Retry {
  /// How long to wait between attempts
  ///
  /// Defaults to a short random delay:
  /// ```
  /// use std::time::Duration;
  ///
  /// use coap_sender::config::Retry;
  /// use coap_sender::retry::Strategy;
  ///
  /// assert_eq!(Retry::default().strategy,
  ///            Strategy::Delay { min: Duration::from_millis(250),
  ///                              max: Duration::from_millis(500) });
  /// ```
  pub strategy: Strategy,
  /// Number of times a transfer may be attempted, including the first.
  ///
  /// Defaults to 2 attempts.
  /// ```
  /// use coap_sender::config::Retry;
  /// use coap_sender::retry::Attempts;
  ///
  /// assert_eq!(Retry::default().max_attempts, Attempts(2));
  /// ```
  pub max_attempts: Attempts,
}

impl Default for Transport {
  fn default() -> Self {
    Transport { bind: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
                response_timeout: Duration::from_millis(3000),
                poll_interval: Duration::from_millis(5),
                max_datagram: usize::from(u16::MAX) }
  }
}

impl Default for Retry {
  fn default() -> Self {
    Retry { strategy: Strategy::Delay { min: Duration::from_millis(250),
                                        max: Duration::from_millis(500) },
            max_attempts: Attempts(2) }
  }
}

/// Runtime config
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Config {
  /// See [`Transport`]
  pub transport: Transport,
  /// See [`Retry`]
  pub retry: Retry,
}
