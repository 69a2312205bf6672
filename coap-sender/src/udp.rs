use std::collections::BTreeMap;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::thread;
use std::time::Instant;

use toad_msg::alloc::Message;
use toad_msg::opt::known::{no_repeat, repeat};
use toad_msg::{Code, Id, OptNumber, OptValue, Payload, Token, TryFromBytes, TryIntoBytes, Type};

use crate::cancel::Cancel;
use crate::config;
use crate::error::{Error, What, When};
use crate::logging::{self, Header, TARGET};
use crate::option::OptionKind;
use crate::req::{Method, Target};
use crate::transport::Transport;

/// A request addressed to a server
#[derive(Debug, Clone, PartialEq)]
pub struct UdpRequest {
  /// The message to send
  pub msg: Message,
  /// Where to send it
  pub addr: SocketAddr,
}

/// A response and the address it came from
#[derive(Debug, Clone, PartialEq)]
pub struct UdpResponse {
  /// The message received
  pub msg: Message,
  /// Who sent it
  pub addr: SocketAddr,
}

/// [`Transport`] over a plain (non-DTLS) UDP socket
///
/// Requests are sent once; there is no retransmission of CON requests.
/// Waiting for a response polls the non-blocking socket until a matching
/// response arrives, the configured timeout elapses or the transfer is
/// cancelled.
///
/// A datagram longer than [`config::Transport::max_datagram`] fails the wait
/// instead of being truncated.
#[derive(Debug)]
pub struct UdpTransport {
  sock: UdpSocket,
  config: config::Transport,
  buf: Vec<u8>,
}

impl UdpTransport {
  /// Bind a socket to `config.bind`
  pub fn try_new(config: config::Transport) -> Result<Self, Error> {
    let sock = UdpSocket::bind(config.bind).map_err(sock_error)?;
    sock.set_nonblocking(true).map_err(sock_error)?;

    log::debug!(target: TARGET, "bound {:?}", sock.local_addr().ok());

    Ok(Self { sock,
              config,
              buf: vec![0; config.max_datagram.saturating_add(1)] })
  }

  /// The address the socket is bound to
  pub fn local_addr(&self) -> Result<SocketAddr, Error> {
    self.sock.local_addr().map_err(sock_error)
  }

  /// Resolve a target to the address requests should go to, preferring
  /// addresses of the same family as the local socket.
  fn resolve(&self, target: &Target) -> Result<SocketAddr, Error> {
    let addrs = (target.host.as_str(), target.port).to_socket_addrs()
                                                   .map_err(|e| {
                                                     Error::invalid_argument(format!("cannot resolve {}: {}",
                                                                                     target.host, e))
                                                   })?
                                                   .collect::<Vec<_>>();

    let v4 = self.config.bind.is_ipv4();
    addrs.iter()
         .find(|a| a.is_ipv4() == v4)
         .or_else(|| addrs.first())
         .copied()
         .ok_or_else(|| Error::invalid_argument(format!("{} resolved to no addresses", target.host)))
  }

  fn send_dgram(&self, bytes: &[u8], addr: SocketAddr) -> nb::Result<(), Error> {
    match self.sock.send_to(bytes, addr) {
      | Ok(_) => Ok(()),
      | Err(e) if e.kind() == io::ErrorKind::WouldBlock => Err(nb::Error::WouldBlock),
      | Err(e) => Err(nb::Error::Other(sock_error(e))),
    }
  }

  fn send_msg(&self, msg: Message, addr: SocketAddr) -> Result<(), Error> {
    let bytes = msg.try_into_bytes::<Vec<u8>>()
                   .map_err(|e| When::None.what(What::Malformed(format!("{:?}", e))))?;

    log::trace!(target: TARGET, "sending {} byte datagram to {}", bytes.len(), addr);
    nb::block!(self.send_dgram(&bytes, addr))
  }

  fn recv_dgram(&mut self) -> nb::Result<(Message, SocketAddr), Error> {
    let (n, addr) = match self.sock.recv_from(&mut self.buf) {
      | Ok(got) => got,
      | Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Err(nb::Error::WouldBlock),
      // ICMP port unreachable from a previous datagram surfaces here on some platforms
      | Err(e) if e.kind() == io::ErrorKind::ConnectionReset => return Err(nb::Error::WouldBlock),
      | Err(e) => return Err(nb::Error::Other(sock_error(e))),
    };

    log::trace!(target: TARGET, "received {} byte datagram from {}", n, addr);

    if n > self.config.max_datagram {
      let msg = format!("{} sent a datagram longer than {} bytes", addr, self.config.max_datagram);
      return Err(nb::Error::Other(When::None.what(What::Malformed(msg))));
    }

    match parse(&self.buf[..n]) {
      | Ok(msg) => Ok((msg, addr)),
      | Err(e) => {
        log::debug!(target: TARGET, "ignoring unparseable datagram from {}: {}", addr, e);
        Err(nb::Error::WouldBlock)
      },
    }
  }

  /// Receive one datagram and decide what it means for `req`
  fn poll_resp(&mut self, req: &UdpRequest) -> nb::Result<UdpResponse, Error> {
    let (msg, addr) = self.recv_dgram()?;

    if addr != req.addr {
      log::debug!(target: TARGET, "ignoring message from {}; expected {}", addr, req.addr);
      return Err(nb::Error::WouldBlock);
    }

    let is_empty = msg.code.class == 0 && msg.code.detail == 0;

    match msg.ty {
      | Type::Reset if msg.id == req.msg.id => {
        log::warn!(target: TARGET, "{} reset message {}", addr, msg.id.0);
        Err(nb::Error::Other(When::None.what(What::Reset)))
      },
      | Type::Ack if is_empty && msg.id == req.msg.id => {
        log::debug!(target: TARGET, "request {} acked; waiting for separate response", msg.id.0);
        Err(nb::Error::WouldBlock)
      },
      | _ if !is_empty && msg.token == req.msg.token => {
        if msg.ty == Type::Con {
          self.send_msg(empty_ack(&msg), addr).map_err(nb::Error::Other)?;
        }

        Ok(UdpResponse { msg, addr })
      },
      | _ => {
        log::debug!(target: TARGET,
                    "ignoring {} from {} that does not answer request {}",
                    describe(&msg, logging::response_summary),
                    addr,
                    req.msg.id.0);
        Err(nb::Error::WouldBlock)
      },
    }
  }
}

fn sock_error(e: io::Error) -> Error {
  When::None.what(What::SockError(e))
}

/// Parse a datagram, keeping every value of repeated options
fn parse(dgram: &[u8]) -> Result<Message, String> {
  let mut msg = Message::try_from_bytes(dgram).map_err(|e| format!("{:?}", e))?;
  let opts = wire_options(dgram).ok_or_else(|| String::from("malformed options"))?;

  msg.opts = BTreeMap::new();
  opts.into_iter().for_each(|(n, v)| add(&mut msg, n, v));
  Ok(msg)
}

/// Every option of a serialized message in wire order, repeats included
///
/// `Message::try_from_bytes` keeps only one value per option number.
fn wire_options(dgram: &[u8]) -> Option<Vec<(OptNumber, Vec<u8>)>> {
  let tkl = usize::from(*dgram.first()? & 0x0F);
  let mut rest = dgram.get(4 + tkl..)?;
  let mut number = 0u32;
  let mut opts = vec![];

  while let Some((&head, tail)) = rest.split_first() {
    if head == 0xFF {
      break;
    }

    rest = tail;
    let delta = opt_len_or_delta(head >> 4, &mut rest)?;
    let len = usize::from(opt_len_or_delta(head & 0x0F, &mut rest)?);
    if rest.len() < len {
      return None;
    }

    let (value, tail) = rest.split_at(len);
    number = number.checked_add(u32::from(delta))?;
    opts.push((OptNumber(number), value.to_vec()));
    rest = tail;
  }

  Some(opts)
}

/// Option delta or length nibble plus its extended bytes ([RFC7252 3.1](https://www.rfc-editor.org/rfc/rfc7252#section-3.1))
fn opt_len_or_delta<'a>(nibble: u8, rest: &mut &'a [u8]) -> Option<u16> {
  let bytes: &'a [u8] = *rest;
  let (n, used) = match (nibble, bytes) {
    | (13, [a, ..]) => (u16::from(*a) + 13, 1),
    | (14, [a, b, ..]) => (u16::from_be_bytes([*a, *b]).checked_add(269)?, 2),
    | (13..=15, _) => return None,
    | (n, _) => (u16::from(n), 0),
  };

  *rest = &bytes[used..];
  Some(n)
}

fn empty_ack(con: &Message) -> Message {
  Message { id: con.id,
            ty: Type::Ack,
            ver: Default::default(),
            token: Token(Default::default()),
            code: Code::new(0, 0),
            opts: BTreeMap::new(),
            payload: Payload(vec![]) }
}

fn type_name(ty: Type) -> &'static str {
  match ty {
    | Type::Con => "Con",
    | Type::Non => "Non",
    | Type::Ack => "Ack",
    | Type::Reset => "Reset",
  }
}

fn describe(msg: &Message, summary: fn(Header<'_>) -> String) -> String {
  summary(Header { ty: Some(type_name(msg.ty)),
                   code: Some((msg.code.class, msg.code.detail)),
                   id: Some(msg.id.0),
                   token: msg.token.0.as_slice(),
                   payload_len: msg.payload.0.len() })
}

fn describe_options(msg: &Message) -> String {
  logging::options(msg.opts
                      .iter()
                      .flat_map(|(n, vs)| vs.iter().map(move |v| (n.0, v.0.as_slice()))))
}

fn add(msg: &mut Message, number: OptNumber, value: Vec<u8>) {
  msg.opts
     .entry(number)
     .or_default()
     .push(OptValue(value));
}

impl Transport for UdpTransport {
  type Req = UdpRequest;
  type Resp = UdpResponse;

  fn create_request(&mut self,
                    method: Method,
                    target: &Target,
                    confirmable: bool)
                    -> Result<UdpRequest, Error> {
    let addr = self.resolve(target)?;
    let token: [u8; 4] = rand::random();

    let mut msg = Message { id: Id(rand::random()),
                            ty: if confirmable { Type::Con } else { Type::Non },
                            ver: Default::default(),
                            token: Token(token.iter().copied().collect()),
                            code: Code::new(0, method.code_detail()),
                            opts: BTreeMap::new(),
                            payload: Payload(vec![]) };

    if !target.host_is_ip() {
      add(&mut msg, no_repeat::HOST, target.host.as_bytes().to_vec());
    }
    for seg in &target.path {
      add(&mut msg, repeat::PATH, seg.as_bytes().to_vec());
    }
    for q in &target.query {
      add(&mut msg, repeat::QUERY, q.as_bytes().to_vec());
    }

    Ok(UdpRequest { msg, addr })
  }

  fn set_payload(&mut self, req: &mut UdpRequest, payload: &[u8]) {
    req.msg.payload = Payload(payload.to_vec());
  }

  fn add_option(&mut self, req: &mut UdpRequest, kind: OptionKind, value: &[u8]) {
    add(&mut req.msg, kind.number(), value.to_vec());
  }

  fn send(&mut self, req: &mut UdpRequest) -> Result<(), Error> {
    self.send_msg(req.msg.clone(), req.addr)
  }

  fn await_response(&mut self, req: &UdpRequest, cancel: &Cancel) -> Result<UdpResponse, Error> {
    let start = Instant::now();

    loop {
      cancel.check(When::None)?;

      match self.poll_resp(req) {
        | Ok(resp) => break Ok(resp),
        | Err(nb::Error::Other(e)) => break Err(e),
        | Err(nb::Error::WouldBlock) if start.elapsed() >= self.config.response_timeout => {
          log::debug!(target: TARGET,
                      "no response to {} within {:?}",
                      req.msg.id.0,
                      self.config.response_timeout);
          break Err(When::None.what(What::Timeout));
        },
        | Err(nb::Error::WouldBlock) => thread::sleep(self.config.poll_interval),
      }
    }
  }

  fn payload<'a>(&self, resp: &'a UdpResponse) -> &'a [u8] {
    &resp.msg.payload.0
  }

  fn option(&self, resp: &UdpResponse, kind: OptionKind) -> Option<Vec<u8>> {
    resp.msg
        .opts
        .get(&kind.number())
        .and_then(|vs| vs.first())
        .map(|v| v.0.clone())
  }

  fn describe_request(&self, req: &UdpRequest) -> String {
    describe(&req.msg, logging::request_summary)
  }

  fn describe_response(&self, resp: &UdpResponse) -> String {
    describe(&resp.msg, logging::response_summary)
  }

  fn describe_request_options(&self, req: &UdpRequest) -> String {
    describe_options(&req.msg)
  }

  fn describe_response_options(&self, resp: &UdpResponse) -> String {
    describe_options(&resp.msg)
  }
}

#[cfg(test)]
mod test {
  use std::thread::JoinHandle;
  use std::time::Duration;

  use super::*;
  use crate::block;
  use crate::engine::{Engine, Transfer};
  use crate::ErrorKind;

  fn client(timeout: Duration) -> UdpTransport {
    UdpTransport::try_new(config::Transport { bind: "127.0.0.1:0".parse().unwrap(),
                                              response_timeout: timeout,
                                              ..Default::default() }).unwrap()
  }

  /// A blocking server socket on loopback running `f` in a thread
  fn server<F>(f: F) -> (SocketAddr, JoinHandle<()>)
    where F: FnOnce(UdpSocket) + Send + 'static
  {
    let sock = UdpSocket::bind("127.0.0.1:0").unwrap();
    sock.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    let addr = sock.local_addr().unwrap();
    (addr, thread::spawn(move || f(sock)))
  }

  fn recv_raw(sock: &UdpSocket) -> (Vec<u8>, SocketAddr) {
    let mut buf = [0u8; 1152];
    let (n, addr) = sock.recv_from(&mut buf).unwrap();
    (buf[..n].to_vec(), addr)
  }

  fn recv(sock: &UdpSocket) -> (Message, SocketAddr) {
    let (dgram, addr) = recv_raw(sock);
    (parse(&dgram).unwrap(), addr)
  }

  fn send(sock: &UdpSocket, msg: Message, addr: SocketAddr) {
    sock.send_to(&msg.try_into_bytes::<Vec<u8>>().unwrap(), addr)
        .unwrap();
  }

  fn response(req: &Message, ty: Type, code: (u8, u8), payload: &[u8]) -> Message {
    Message { id: if ty == Type::Ack { req.id } else { Id(req.id.0.wrapping_add(1)) },
              ty,
              ver: Default::default(),
              token: req.token,
              code: Code::new(code.0, code.1),
              opts: BTreeMap::new(),
              payload: Payload(payload.to_vec()) }
  }

  fn target(addr: SocketAddr, path: &str) -> Target {
    format!("coap://{}/{}", addr, path).parse().unwrap()
  }

  #[test]
  fn piggybacked_response() {
    let (addr, srv) = server(|sock| {
      let (dgram, from) = recv_raw(&sock);
      // 4 byte header, 4 byte token, then Uri-Path "a", Uri-Path "b", Uri-Query "x=1"
      assert_eq!(&dgram[8..16], &[0xB1, b'a', 0x01, b'b', 0x43, b'x', b'=', b'1']);

      let req = parse(&dgram).unwrap();
      assert_eq!(req.ty, Type::Con);
      assert_eq!(req.code, Code::new(0, 1));
      assert_eq!(req.token.0.len(), 4);
      assert_eq!(req.opts.get(&repeat::PATH).unwrap().len(), 2);
      assert_eq!(req.opts.get(&repeat::QUERY).unwrap()[0].0, b"x=1".to_vec());
      assert!(req.opts.get(&no_repeat::HOST).is_none());

      let mut rep = response(&req, Type::Ack, (2, 5), b"hello");
      add(&mut rep, no_repeat::BLOCK2, block::encode(0, true, 2).unwrap().to_vec());
      send(&sock, rep, from);
    });

    let mut udp = client(Duration::from_secs(2));
    let mut req = udp.create_request(Method::Get, &target(addr, "a/b?x=1"), true)
                     .unwrap();
    udp.send(&mut req).unwrap();
    let resp = udp.await_response(&req, &Cancel::new()).unwrap();
    srv.join().unwrap();

    assert_eq!(udp.payload(&resp), b"hello");
    let b2 = block::decode(&udp.option(&resp, OptionKind::Block2).unwrap()).unwrap();
    assert_eq!((b2.num(), b2.more(), b2.szx()), (0, true, 2));
    assert_eq!(udp.option(&resp, OptionKind::Block1), None);

    assert!(udp.describe_response(&resp)
               .starts_with("RES  Type=Ack Code=2.05 (Content) MID="));
    assert!(udp.describe_response(&resp).ends_with("PayloadLen=5"));
    assert_eq!(udp.describe_response_options(&resp),
               "Options:\n - Block2: num=0 m=1 szx=2");
    assert!(udp.describe_request(&req).starts_with("REQ  Type=Con Code=0.01 (GET)"));
    assert!(udp.describe_request_options(&req)
               .contains(" - Uri-Path: \"a\"\n - Uri-Path: \"b\""));
  }

  #[test]
  fn separate_response_is_acked() {
    let (addr, srv) = server(|sock| {
      let (req, from) = recv(&sock);
      send(&sock, empty_ack(&req), from);

      let rep = response(&req, Type::Con, (2, 5), b"later");
      let rep_id = rep.id;
      send(&sock, rep, from);

      let (ack, _) = recv(&sock);
      assert_eq!(ack.ty, Type::Ack);
      assert_eq!(ack.id, rep_id);
      assert_eq!(ack.code, Code::new(0, 0));
    });

    let mut udp = client(Duration::from_secs(2));
    let mut req = udp.create_request(Method::Get, &target(addr, "x"), true)
                     .unwrap();
    udp.send(&mut req).unwrap();
    let resp = udp.await_response(&req, &Cancel::new()).unwrap();
    srv.join().unwrap();

    assert_eq!(udp.payload(&resp), b"later");
  }

  #[test]
  fn junk_and_strangers_are_ignored() {
    let (addr, srv) = server(|sock| {
      let (req, from) = recv(&sock);
      sock.send_to(&[0xFF, 0x00], from).unwrap();

      let mut other = response(&req, Type::Non, (2, 5), b"not yours");
      other.token = Token([9u8, 9, 9, 9, 9].iter().copied().collect());
      send(&sock, other, from);

      send(&sock, response(&req, Type::Non, (2, 5), b"yours"), from);
    });

    let mut udp = client(Duration::from_secs(2));
    let mut req = udp.create_request(Method::Get, &target(addr, "x"), false)
                     .unwrap();
    assert_eq!(req.msg.ty, Type::Non);
    udp.send(&mut req).unwrap();
    let resp = udp.await_response(&req, &Cancel::new()).unwrap();
    srv.join().unwrap();

    assert_eq!(udp.payload(&resp), b"yours");
  }

  #[test]
  fn reset_fails() {
    let (addr, srv) = server(|sock| {
      let (req, from) = recv(&sock);
      let mut rst = empty_ack(&req);
      rst.ty = Type::Reset;
      send(&sock, rst, from);
    });

    let mut udp = client(Duration::from_secs(2));
    let mut req = udp.create_request(Method::Get, &target(addr, "x"), true)
                     .unwrap();
    udp.send(&mut req).unwrap();
    let err = udp.await_response(&req, &Cancel::new()).unwrap_err();
    srv.join().unwrap();

    assert_eq!(err.kind(), ErrorKind::Transport);
    assert!(matches!(err.what, What::Reset));
  }

  #[test]
  fn unanswered_request_times_out() {
    let (addr, srv) = server(|sock| {
      recv(&sock);
    });

    let mut udp = client(Duration::from_millis(50));
    let mut req = udp.create_request(Method::Get, &target(addr, "x"), true)
                     .unwrap();
    udp.send(&mut req).unwrap();
    let err = udp.await_response(&req, &Cancel::new()).unwrap_err();
    srv.join().unwrap();

    assert_eq!(err.kind(), ErrorKind::Transport);
    assert!(matches!(err.what, What::Timeout));
  }

  #[test]
  fn cancel_stops_waiting() {
    let (addr, srv) = server(|sock| {
      recv(&sock);
    });

    let mut udp = client(Duration::from_secs(10));
    let mut req = udp.create_request(Method::Get, &target(addr, "x"), true)
                     .unwrap();
    udp.send(&mut req).unwrap();

    let cancel = Cancel::new();
    let handle = cancel.clone();
    let canceller = thread::spawn(move || {
      thread::sleep(Duration::from_millis(20));
      handle.cancel();
    });

    let started = Instant::now();
    let err = udp.await_response(&req, &cancel).unwrap_err();
    canceller.join().unwrap();
    srv.join().unwrap();

    assert_eq!(err.kind(), ErrorKind::Cancelled);
    assert!(started.elapsed() < Duration::from_secs(5));
  }

  #[test]
  fn hostnames_are_sent_as_uri_host() {
    let mut udp = client(Duration::from_millis(10));
    let req = udp.create_request(Method::Post,
                                 &"coap://localhost:5683/x".parse().unwrap(),
                                 true)
                 .unwrap();

    assert_eq!(req.msg.opts.get(&no_repeat::HOST).unwrap()[0].0,
               b"localhost".to_vec());
    assert!(req.msg.opts.get(&no_repeat::PORT).is_none());
    assert_eq!(req.addr.port(), 5683);
  }

  #[test]
  fn engine_block2_over_udp() {
    let (addr, srv) = server(|sock| {
      let (req, from) = recv(&sock);
      let mut rep = response(&req, Type::Ack, (2, 5), b"0123456789abcdef");
      add(&mut rep, no_repeat::BLOCK2, block::encode(0, true, 0).unwrap().to_vec());
      send(&sock, rep, from);

      let (req, from) = recv(&sock);
      let asked = req.opts.get(&no_repeat::BLOCK2).unwrap()[0].0.clone();
      assert_eq!(block::decode(&asked).unwrap().num(), 1);

      let mut rep = response(&req, Type::Ack, (2, 5), b"!");
      add(&mut rep, no_repeat::BLOCK2, block::encode(1, false, 0).unwrap().to_vec());
      send(&sock, rep, from);
    });

    let mut engine = Engine::new(client(Duration::from_secs(2)));
    let transfer = Transfer::new(Method::Get, target(addr, "big")).block2(0);
    let result = engine.transfer(&transfer, &Cancel::new()).unwrap();
    srv.join().unwrap();

    assert_eq!(result.text.as_deref(), Some("0123456789abcdef!"));
    assert_eq!(result.exchanges.len(), 4);
    assert!(result.last_response_options.contains("Block2: num=1 m=0 szx=0"));
  }

  #[test]
  fn wire_options_keep_repeats() {
    // CON 0.01 MID=1, no token, Uri-Path a/b/c, Block1 (delta 16, extended), payload "!"
    let dgram = [0x40, 0x01, 0x00, 0x01, 0xB1, b'a', 0x01, b'b', 0x01, b'c', 0xD1, 0x03, 0x0A,
                 0xFF, b'!'];

    assert_eq!(wire_options(&dgram).unwrap(),
               vec![(repeat::PATH, b"a".to_vec()),
                    (repeat::PATH, b"b".to_vec()),
                    (repeat::PATH, b"c".to_vec()),
                    (no_repeat::BLOCK1, vec![0x0A])]);

    let msg = parse(&dgram).unwrap();
    assert_eq!(msg.opts.get(&repeat::PATH)
                  .unwrap()
                  .iter()
                  .map(|v| v.0.clone())
                  .collect::<Vec<_>>(),
               vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
    assert_eq!(msg.payload.0, b"!".to_vec());
  }

  #[test]
  fn wire_options_reject_garbage() {
    assert_eq!(wire_options(&[0x40, 0x01, 0x00, 0x01, 0xB5, b'a']), None);
    assert_eq!(wire_options(&[0x40, 0x01, 0x00, 0x01, 0xF1, b'a']), None);
    assert_eq!(wire_options(&[0x40, 0x01, 0x00, 0x01, 0xD1]), None);
    assert_eq!(wire_options(&[0x48, 0x01, 0x00]), None);
    assert_eq!(wire_options(&[0x40, 0x01, 0x00, 0x01]), Some(vec![]));
  }

  #[test]
  fn repeated_response_options_are_described() {
    let (addr, srv) = server(|sock| {
      let (req, from) = recv(&sock);
      let mut rep = response(&req, Type::Ack, (2, 1), b"");
      add(&mut rep, repeat::LOCATION_PATH, b"things".to_vec());
      add(&mut rep, repeat::LOCATION_PATH, b"42".to_vec());
      add(&mut rep, repeat::ETAG, vec![0x01]);
      add(&mut rep, repeat::ETAG, vec![0x02]);
      send(&sock, rep, from);
    });

    let mut udp = client(Duration::from_secs(2));
    let mut req = udp.create_request(Method::Post, &target(addr, "things"), true)
                     .unwrap();
    udp.send(&mut req).unwrap();
    let resp = udp.await_response(&req, &Cancel::new()).unwrap();
    srv.join().unwrap();

    assert_eq!(udp.describe_response_options(&resp),
               ["Options:",
                " - ETag: 0x01",
                " - ETag: 0x02",
                " - Location-Path: \"things\"",
                " - Location-Path: \"42\""].join("\n"));
  }

  #[test]
  fn large_response_is_received_whole() {
    let body = (0..1400).map(|i| (i % 251) as u8).collect::<Vec<_>>();
    let expected = body.clone();

    let (addr, srv) = server(move |sock| {
      let (req, from) = recv(&sock);
      send(&sock, response(&req, Type::Ack, (2, 5), &body), from);
    });

    let mut udp = client(Duration::from_secs(2));
    let mut req = udp.create_request(Method::Get, &target(addr, "big"), true)
                     .unwrap();
    udp.send(&mut req).unwrap();
    let resp = udp.await_response(&req, &Cancel::new()).unwrap();
    srv.join().unwrap();

    assert_eq!(udp.payload(&resp), expected.as_slice());
  }

  #[test]
  fn datagram_over_max_fails_instead_of_truncating() {
    let (addr, srv) = server(|sock| {
      let (req, from) = recv(&sock);
      send(&sock, response(&req, Type::Ack, (2, 5), &[0xAB; 1400]), from);
    });

    let mut udp = UdpTransport::try_new(config::Transport { bind: "127.0.0.1:0".parse().unwrap(),
                                                            response_timeout:
                                                              Duration::from_secs(2),
                                                            max_datagram: 1152,
                                                            ..Default::default() }).unwrap();
    let mut req = udp.create_request(Method::Get, &target(addr, "big"), true)
                     .unwrap();
    udp.send(&mut req).unwrap();
    let err = udp.await_response(&req, &Cancel::new()).unwrap_err();
    srv.join().unwrap();

    assert_eq!(err.kind(), ErrorKind::Transport);
    assert!(matches!(err.what, What::Malformed(_)));
  }
}
