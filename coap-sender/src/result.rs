use crate::error::Error;
use crate::exchange::{ExchangeLog, ExchangeLogEntry};
use crate::inspect;

/// The outcome of one transfer
///
/// When `ok` is false there are no renderings; `log` holds the error message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransferResult {
  /// Did the transfer complete?
  pub ok: bool,
  /// Every exchange rendered as text, or the error message
  pub log: String,
  /// The structured exchanges `log` was rendered from
  pub exchanges: Vec<ExchangeLogEntry>,
  /// Final payload as text, if it is text
  pub text: Option<String>,
  /// Final payload in CBOR diagnostic notation, if it is CBOR
  pub cbor: Option<String>,
  /// Hex dump of the final payload
  pub hex: Option<String>,
  /// Summary of the last request sent
  pub last_request_summary: String,
  /// Summary of the last response received
  pub last_response_summary: String,
  /// Options of the last request sent
  pub last_request_options: String,
  /// Options of the last response received
  pub last_response_options: String,
}

/// What a transfer leaves behind besides its log
#[derive(Debug, Clone, Default)]
pub(crate) struct Last {
  pub(crate) request_summary: String,
  pub(crate) response_summary: String,
  pub(crate) request_options: String,
  pub(crate) response_options: String,
}

impl TransferResult {
  /// A completed transfer with its reassembled payload
  pub(crate) fn succeeded(log: ExchangeLog, payload: &[u8], last: Last) -> Self {
    let inspect::Inspection { text, cbor, hex } = inspect::inspect(payload);

    Self { ok: true,
           log: log.to_string(),
           exchanges: log.into_entries(),
           text,
           cbor,
           hex: Some(hex),
           last_request_summary: last.request_summary,
           last_response_summary: last.response_summary,
           last_request_options: last.request_options,
           last_response_options: last.response_options }
  }

  /// A transfer that failed with `e`
  ///
  /// ```
  /// use coap_sender::error::{What, When};
  /// use coap_sender::result::TransferResult;
  ///
  /// let r = TransferResult::failed(&When::SingleRequest.what(What::Timeout));
  /// assert!(!r.ok);
  /// assert_eq!(r.log, "no response (timeout) while sending request");
  /// assert_eq!((r.text, r.cbor, r.hex), (None, None, None));
  /// ```
  pub fn failed(e: &Error) -> Self {
    Self { ok: false,
           log: e.to_string(),
           ..Self::default() }
  }
}
