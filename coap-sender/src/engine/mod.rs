use crate::block::{self, BlockParam};
use crate::cancel::Cancel;
use crate::error::{Error, When};
use crate::exchange::{BlockKind, Direction, ExchangeLog, ExchangeLogEntry};
use crate::logging::TARGET;
use crate::option::{self, OptionKind};
use crate::req::Method;
use crate::result::{Last, TransferResult};
use crate::transport::Transport;

mod transfer;

#[doc(inline)]
pub use transfer::Transfer;

/// Drives blockwise transfers over a [`Transport`]
///
/// One engine owns one transport, and a transfer borrows the engine mutably;
/// callers that want concurrent transfers need one engine each.
///
/// A transfer either completes or fails as a whole. There is no retrying in
/// here; see [`crate::retry`] for re-running failed transfers.
#[derive(Debug)]
pub struct Engine<T> {
  transport: T,
}

impl<T: Transport> Engine<T> {
  /// Create an engine that talks over `transport`
  pub fn new(transport: T) -> Self {
    Self { transport }
  }

  /// Borrow the transport
  pub fn transport(&self) -> &T {
    &self.transport
  }

  /// Send a request, fragmenting the payload into Block1 requests and
  /// following Block2 continuations as `transfer` asks.
  ///
  /// `cancel` is checked before every exchange and while waiting for
  /// responses; a cancelled transfer fails with
  /// [`ErrorKind::Cancelled`](crate::ErrorKind::Cancelled).
  ///
  /// Any failed exchange fails the whole transfer, and no partial result is
  /// returned.
  pub fn transfer(&mut self, transfer: &Transfer, cancel: &Cancel) -> Result<TransferResult, Error> {
    transfer.validate()?;

    let mut run = Run { transport: &mut self.transport,
                        transfer,
                        cancel,
                        log: ExchangeLog::new(),
                        last: Last::default() };

    let first = if transfer.uses_block1() {
      run.send_block1()?
    } else {
      run.send_single()?
    };

    let payload = match transfer.block2 {
      | Some(_) => run.follow_block2(first)?,
      | None => run.transport.payload(&first).to_vec(),
    };

    log::info!(target: TARGET,
               "{} {} done after {} messages, {} byte payload",
               transfer.method,
               transfer.target,
               run.log.len(),
               payload.len());

    let Run { log, last, .. } = run;
    Ok(TransferResult::succeeded(log, &payload, last))
  }
}

/// State of one transfer in progress
struct Run<'a, T: Transport> {
  transport: &'a mut T,
  transfer: &'a Transfer,
  cancel: &'a Cancel,
  log: ExchangeLog,
  last: Last,
}

/// Give errors raised without context the context of the current exchange
fn during(when: When) -> impl Fn(Error) -> Error {
  move |e| match e.when {
    | When::None => when.what(e.what),
    | _ => e,
  }
}

impl<'a, T: Transport> Run<'a, T> {
  /// Block1 path; one request per fragment, the last response is returned
  fn send_block1(&mut self) -> Result<T::Resp, Error> {
    let t = self.transfer;
    // uses_block1 ensured this is set
    let szx = t.block1.unwrap_or(block::MAX_SZX);
    let mut last = None;

    let fragments = block::fragments(t.payload.len(), szx).map_err(|e| When::Validating.what(e.into()))?;

    for (param, range) in fragments {
      let when = When::SendingBlock1 { num: param.num() };
      self.cancel.check(when)?;

      let mut req = self.method_request(when)?;
      let len = range.len();
      self.transport.set_payload(&mut req, &t.payload[range]);
      let value = param.encode().map_err(|e| when.what(e.into()))?;
      self.transport.add_option(&mut req, OptionKind::Block1, &value);

      last = Some(self.exchange(req, Some((BlockKind::Block1, param)), len, when)?);
    }

    last.ok_or_else(|| Error::invalid_argument("no payload to fragment"))
  }

  /// Single request path, with a Block2 size hint when following Block2
  fn send_single(&mut self) -> Result<T::Resp, Error> {
    let t = self.transfer;
    let when = When::SingleRequest;
    self.cancel.check(when)?;

    let mut req = self.method_request(when)?;
    if !t.payload.is_empty() {
      self.transport.set_payload(&mut req, &t.payload);
    }

    let hint = match t.block2 {
      | Some(szx) => {
        let param = BlockParam::new(0, false, szx).map_err(|e| when.what(e.into()))?;
        let value = param.encode().map_err(|e| when.what(e.into()))?;
        self.transport.add_option(&mut req, OptionKind::Block2, &value);
        Some((BlockKind::Block2, param))
      },
      | None => None,
    };

    self.exchange(req, hint, t.payload.len(), when)
  }

  /// Ask for the rest of a Block2 response until the server says there is
  /// no more, and yield the reassembled payload.
  fn follow_block2(&mut self, first: T::Resp) -> Result<Vec<u8>, Error> {
    let mut payload = self.transport.payload(&first).to_vec();
    if payload.is_empty() {
      return Ok(payload);
    }

    let mut current = first;
    let mut asked = 0u32;
    while let Some(value) = self.transport.option(&current, OptionKind::Block2) {
      let reading = When::FollowingBlock2 { num: asked.saturating_add(1) };
      let got = block::decode(&value).map_err(|e| reading.what(e.into()))?;
      log::trace!(target: TARGET, "server sent Block2 {}", got);
      if !got.more() {
        break;
      }

      let next = got.next();
      asked = next.num();
      let when = When::FollowingBlock2 { num: next.num() };
      self.cancel.check(when)?;

      let mut req = self.transport
                        .create_request(Method::Get, &self.transfer.target, self.transfer.confirmable)
                        .map_err(during(when))?;
      if let Some(f) = self.transfer.accept {
        self.transport.add_option(&mut req, OptionKind::Accept, &option::content_format_value(f));
      }
      let encoded = next.encode().map_err(|e| when.what(e.into()))?;
      self.transport.add_option(&mut req, OptionKind::Block2, &encoded);

      current = self.exchange(req, Some((BlockKind::Block2, next)), 0, when)?;
      payload.extend_from_slice(self.transport.payload(&current));
    }

    Ok(payload)
  }

  /// A request for the caller's method with the options they asked for
  fn method_request(&mut self, when: When) -> Result<T::Req, Error> {
    let t = self.transfer;
    let mut req = self.transport
                      .create_request(t.method, &t.target, t.confirmable)
                      .map_err(during(when))?;

    if let Some(f) = t.content_format {
      self.transport
          .add_option(&mut req, OptionKind::ContentFormat, &option::content_format_value(f));
    }
    if let Some(f) = t.accept {
      self.transport.add_option(&mut req, OptionKind::Accept, &option::content_format_value(f));
    }
    if t.observe {
      self.transport.add_option(&mut req, OptionKind::Observe, &option::uint_value(0));
    }

    Ok(req)
  }

  /// Send a request carrying `len` payload bytes, wait for its response
  /// and log both
  fn exchange(&mut self,
              mut req: T::Req,
              block: Option<(BlockKind, BlockParam)>,
              len: usize,
              when: When)
              -> Result<T::Resp, Error> {
    self.transport.send(&mut req).map_err(during(when))?;

    let tx = ExchangeLogEntry { direction: Direction::Tx,
                                block,
                                len,
                                summary: self.transport.describe_request(&req),
                                options: self.transport.describe_request_options(&req) };
    log::debug!(target: TARGET, "{}", tx);
    self.last.request_summary = tx.summary.clone();
    self.last.request_options = tx.options.clone();
    self.log.push(tx);

    let resp = self.transport
                   .await_response(&req, self.cancel)
                   .map_err(during(when))?;

    let rx = ExchangeLogEntry { direction: Direction::Rx,
                                block: self.response_block(&resp),
                                len: self.transport.payload(&resp).len(),
                                summary: self.transport.describe_response(&resp),
                                options: self.transport.describe_response_options(&resp) };
    log::debug!(target: TARGET, "{}", rx);
    self.last.response_summary = rx.summary.clone();
    self.last.response_options = rx.options.clone();
    self.log.push(rx);

    Ok(resp)
  }

  /// The Block option a response carries, preferring Block2
  fn response_block(&self, resp: &T::Resp) -> Option<(BlockKind, BlockParam)> {
    [(OptionKind::Block2, BlockKind::Block2), (OptionKind::Block1, BlockKind::Block1)].into_iter()
      .find_map(|(opt, kind)| {
        self.transport
            .option(resp, opt)
            .and_then(|v| block::decode(&v).ok())
            .map(|b| (kind, b))
      })
  }
}
