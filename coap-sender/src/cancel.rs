use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{Error, What, When};

/// A cancellation signal shared between the caller and a running transfer.
///
/// Clones observe the same signal; cancelling any clone cancels all of them.
///
/// ```
/// use coap_sender::cancel::Cancel;
///
/// let cancel = Cancel::new();
/// let handle = cancel.clone();
///
/// assert!(!cancel.is_cancelled());
/// handle.cancel();
/// assert!(cancel.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Cancel(Arc<AtomicBool>);

impl Cancel {
  /// Create a signal that has not fired
  pub fn new() -> Self {
    Self::default()
  }

  /// Fire the signal
  pub fn cancel(&self) {
    self.0.store(true, Ordering::SeqCst);
  }

  /// Has the signal fired?
  pub fn is_cancelled(&self) -> bool {
    self.0.load(Ordering::SeqCst)
  }

  /// Yield [`What::Cancelled`] if the signal has fired
  pub fn check(&self, when: When) -> Result<(), Error> {
    if self.is_cancelled() {
      Err(when.what(What::Cancelled))
    } else {
      Ok(())
    }
  }
}
