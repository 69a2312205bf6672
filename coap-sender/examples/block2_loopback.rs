//! Fetch a resource served in 32 byte Block2 pieces by a toy server on
//! loopback, printing the exchange log.

use std::collections::BTreeMap;
use std::net::UdpSocket;
use std::thread;
use std::time::Duration;

use coap_sender::block;
use coap_sender::cancel::Cancel;
use coap_sender::config::Config;
use coap_sender::engine::{Engine, Transfer};
use coap_sender::req::Method;
use coap_sender::udp::UdpTransport;
use toad_msg::alloc::Message;
use toad_msg::opt::known::no_repeat::BLOCK2;
use toad_msg::{Code, OptValue, Payload, TryFromBytes, TryIntoBytes, Type};

const BODY: &[u8] = b"Lorem ipsum dolor sit amet, consectetur adipiscing elit, sed do eiusmod \
tempor incididunt ut labore et dolore magna aliqua.";

/// Answer GETs with the block of `BODY` they ask for, until the last one is sent
fn serve(sock: UdpSocket) {
  let mut buf = [0u8; 1152];

  loop {
    let (n, from) = match sock.recv_from(&mut buf) {
      | Ok(got) => got,
      | Err(_) => return,
    };
    let req = Message::try_from_bytes(&buf[..n]).unwrap();

    let num = req.opts
                 .get(&BLOCK2)
                 .and_then(|vs| vs.first())
                 .map(|v| block::decode(&v.0).unwrap().num())
                 .unwrap_or(0);
    let start = (num as usize * 32).min(BODY.len());
    let end = (start + 32).min(BODY.len());
    let more = end < BODY.len();

    let block2 = block::encode(num, more, 1).unwrap().to_vec();
    let rep = Message { id: req.id,
                        ty: Type::Ack,
                        ver: Default::default(),
                        token: req.token,
                        code: Code::new(2, 5),
                        opts: BTreeMap::from([(BLOCK2, vec![OptValue(block2)])]),
                        payload: Payload(BODY[start..end].to_vec()) };

    sock.send_to(&rep.try_into_bytes::<Vec<u8>>().unwrap(), from)
        .unwrap();

    if !more {
      return;
    }
  }
}

pub fn main() {
  simple_logger::init_with_level(log::Level::Debug).unwrap();

  let sock = UdpSocket::bind("127.0.0.1:0").unwrap();
  sock.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
  let addr = sock.local_addr().unwrap();
  let server = thread::spawn(move || serve(sock));

  let mut config = Config::default().transport;
  config.bind = "127.0.0.1:0".parse().unwrap();
  let mut engine = Engine::new(UdpTransport::try_new(config).unwrap());

  let target = format!("coap://{}/lorem", addr).parse().unwrap();
  let result = engine.transfer(&Transfer::new(Method::Get, target).block2(1), &Cancel::new())
                     .unwrap();
  server.join().unwrap();

  println!("{}\n", result.log);
  println!("{}", result.text.unwrap_or_default());
}
