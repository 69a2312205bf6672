use core::convert::Infallible;
use std::thread;
use std::time::{Duration, Instant};

use rand::Rng;

use crate::cancel::Cancel;
use crate::config;
use crate::error::{Error, When};
use crate::logging::TARGET;

/// How long [`Retry::run`] sleeps between checks of the timer & cancel signal
const SLEEP: Duration = Duration::from_millis(10);

/// A non-blocking timer that decides when a failed operation should be
/// tried again, following a fixed-delay or exponential-backoff [`Strategy`].
///
/// ```
/// use std::time::{Duration, Instant};
///
/// use coap_sender::retry::{Attempts, RetryTimer, Strategy, YouShould};
///
/// let strategy = Strategy::Delay { min: Duration::from_millis(100),
///                                  max: Duration::from_millis(100) };
/// let mut timer = RetryTimer::new(strategy, Attempts(2));
///
/// // attempt 1 failed
/// let failed_at = Instant::now();
/// timer.failed(failed_at);
///
/// assert_eq!(timer.what_should_i_do(failed_at), Err(nb::Error::WouldBlock));
/// assert_eq!(timer.what_should_i_do(failed_at + Duration::from_millis(100)),
///            Ok(YouShould::Retry));
///
/// // attempt 2 failed
/// timer.failed(Instant::now());
/// assert_eq!(timer.what_should_i_do(Instant::now()), Ok(YouShould::Cry));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RetryTimer {
  init: Duration,
  strategy: Strategy,
  last_failure: Option<Instant>,
  attempts: Attempts,
  max_attempts: Attempts,
}

/// A number of attempts
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Attempts(pub u16);

/// Result of [`RetryTimer::what_should_i_do`].
///
/// This tells you if a retry should be attempted or not.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum YouShould {
  /// Attempts have been exhausted and the work that is
  /// being retried should be considered poisoned.
  Cry,
  /// A retry should be performed
  Retry,
}

impl RetryTimer {
  /// Create a timer for an operation about to be attempted for the first time
  pub fn new(strategy: Strategy, max_attempts: Attempts) -> Self {
    let init = if strategy.has_jitter() {
      let (min, max) = strategy.bounds();
      let ms = rand::thread_rng().gen_range(millis(min)..=millis(max));
      Duration::from_millis(ms)
    } else {
      strategy.bounds().0
    };

    Self { init,
           strategy,
           last_failure: None,
           attempts: Attempts(1),
           max_attempts }
  }

  /// The attempt currently running (or that most recently failed), from 1
  pub fn attempts(&self) -> Attempts {
    self.attempts
  }

  /// Tell the timer the current attempt failed at `now`
  pub fn failed(&mut self, now: Instant) {
    self.last_failure = Some(now);
  }

  /// How long to wait after the current attempt failed
  pub fn delay(&self) -> Duration {
    match self.strategy {
      | Strategy::Delay { .. } => self.init,
      | Strategy::Exponential { .. } => Strategy::delay_exp(self.init, self.attempts.0),
    }
  }

  /// When the thing we keep trying fails, invoke this (after
  /// [`RetryTimer::failed`]) to ask "it failed again! what do I do??"
  ///
  /// Returns `nb::Error::WouldBlock` when we have not yet
  /// waited the appropriate amount of time to retry.
  pub fn what_should_i_do(&mut self, now: Instant) -> nb::Result<YouShould, Infallible> {
    if self.attempts >= self.max_attempts {
      return Ok(YouShould::Cry);
    }

    let waited = self.last_failure
                     .map(|at| now.saturating_duration_since(at))
                     .unwrap_or(Duration::MAX);

    if waited >= self.delay() {
      self.attempts.0 += 1;
      self.last_failure = None;
      Ok(YouShould::Retry)
    } else {
      Err(nb::Error::WouldBlock)
    }
  }
}

fn millis(d: Duration) -> u64 {
  u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Strategy to employ when retrying
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
  /// Generate a random delay between `min` and `max`,
  /// and wait until this delay has passed between attempts.
  ///
  /// After each failed attempt, double the delay before retrying again.
  Exponential {
    /// Minimum (inclusive) delay before the second attempt
    init_min: Duration,
    /// Maximum (inclusive) delay before the second attempt
    init_max: Duration,
  },
  /// Generate a random delay between `min` and `max`,
  /// and wait until this delay has passed between attempts.
  Delay {
    /// Minimum (inclusive) delay for attempts
    min: Duration,
    /// Maximum (inclusive) delay for attempts
    max: Duration,
  },
}

impl Strategy {
  /// Are min & max delays different? if not, we can skip the random number generation.
  pub fn has_jitter(&self) -> bool {
    let (min, max) = self.bounds();
    millis(max) > millis(min)
  }

  /// The min & max delays
  pub fn bounds(&self) -> (Duration, Duration) {
    match *self {
      | Self::Delay { min, max } => (min, max),
      | Self::Exponential { init_min, init_max } => (init_min, init_max),
    }
  }

  /// Get the longest time this strategy will wait in total if all attempts fail
  pub fn max_time(&self, max_attempts: Attempts) -> Duration {
    let waits = max_attempts.0.saturating_sub(1);
    match *self {
      | Self::Exponential { init_max, .. } => {
        (1..=waits).map(|n| Self::delay_exp(init_max, n))
                   .fold(Duration::ZERO, Duration::saturating_add)
      },
      | Self::Delay { max, .. } => max.saturating_mul(u32::from(waits)),
    }
  }

  /// Given the initial delay and the attempt that just failed,
  /// yields the delay until the next attempt.
  fn delay_exp(init: Duration, attempt: u16) -> Duration {
    // | attempt | delay    |
    // | 1       | init     |
    // | 2       | init * 2 |
    // | 3       | init * 4 |
    // | n       | init * 2^(n-1) |
    init.saturating_mul(2u32.saturating_pow(u32::from(attempt.saturating_sub(1))))
  }
}

/// Re-runs a whole operation (typically [`Engine::transfer`](crate::engine::Engine::transfer))
/// while it fails with a transient [`Transport`](crate::ErrorKind::Transport) error.
///
/// Invalid input, encoding failures and cancellation are never retried.
///
/// ```
/// use std::time::Duration;
///
/// use coap_sender::cancel::Cancel;
/// use coap_sender::config;
/// use coap_sender::error::{What, When};
/// use coap_sender::retry::{Attempts, Retry, Strategy};
///
/// let retry = Retry::new(config::Retry { strategy: Strategy::Delay { min: Duration::ZERO,
///                                                                    max: Duration::ZERO },
///                                        max_attempts: Attempts(3) });
///
/// let out = retry.run(&Cancel::new(), |Attempts(n)| {
///                  if n < 3 {
///                    Err(When::SingleRequest.what(What::Timeout))
///                  } else {
///                    Ok(n)
///                  }
///                });
///
/// assert_eq!(out.unwrap(), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Retry {
  config: config::Retry,
}

impl Retry {
  /// Create a retrier
  pub fn new(config: config::Retry) -> Self {
    Self { config }
  }

  /// Run `f` until it succeeds, fails with an error that is not transient, or
  /// runs out of attempts.
  ///
  /// `f` is given the number of the attempt, starting at 1. The last error is
  /// returned when attempts run out. `cancel` is checked while waiting between
  /// attempts.
  pub fn run<T, F>(&self, cancel: &Cancel, mut f: F) -> Result<T, Error>
    where F: FnMut(Attempts) -> Result<T, Error>
  {
    let mut timer = RetryTimer::new(self.config.strategy, self.config.max_attempts);

    loop {
      let e = match f(timer.attempts()) {
        | Ok(t) => return Ok(t),
        | Err(e) if !e.is_transient() => return Err(e),
        | Err(e) => e,
      };

      timer.failed(Instant::now());

      loop {
        let when = When::Retrying { attempt: timer.attempts().0.saturating_add(1) };
        cancel.check(when)?;

        match timer.what_should_i_do(Instant::now()) {
          | Ok(YouShould::Retry) => {
            log::warn!(target: TARGET, "{}; trying again (attempt {})", e, timer.attempts().0);
            break;
          },
          | Ok(YouShould::Cry) => {
            log::warn!(target: TARGET, "{}; giving up after {} attempts", e, timer.attempts().0);
            return Err(e);
          },
          | Err(nb::Error::WouldBlock) => thread::sleep(SLEEP.min(timer.delay())),
          | Err(nb::Error::Other(never)) => match never {},
        }
      }
    }
  }
}
