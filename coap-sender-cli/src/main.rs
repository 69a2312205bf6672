//! `coap-sender`: send one CoAP request (blockwise if asked) and print
//! everything that happened.

use std::net::{Ipv6Addr, SocketAddr};
use std::process::ExitCode;
use std::time::Duration;

use clap::{ArgAction, Parser};
use coap_sender::cancel::Cancel;
use coap_sender::config::Config;
use coap_sender::engine::{Engine, Transfer};
use coap_sender::option::{self, ContentFormat};
use coap_sender::payload::{self, PayloadMode};
use coap_sender::req::{Method, Target};
use coap_sender::result::TransferResult;
use coap_sender::retry::{Attempts, Retry};
use coap_sender::udp::UdpTransport;
use coap_sender::Error;

/// Send a CoAP request and inspect the response
#[derive(Parser, Debug)]
#[command(name = "coap-sender", version)]
#[command(about = "Send CoAP requests, with Block1 / Block2 transfers, and inspect the response")]
struct Args {
  /// Target, e.g. coap://127.0.0.1:5683/sensors/temp?unit=c
  uri: Target,

  /// Request method (GET, POST, PUT, DELETE)
  #[arg(short, long, default_value = "GET")]
  method: Method,

  /// Send this text as the payload
  #[arg(long, group = "body")]
  text: Option<String>,

  /// Send these hex bytes as the payload (e.g. "DE AD BE EF")
  #[arg(long, group = "body")]
  hex: Option<String>,

  /// Send this JSON, encoded as CBOR, as the payload
  #[arg(long, group = "body")]
  json: Option<String>,

  /// Send non-confirmable messages
  #[arg(long)]
  non: bool,

  /// Fragment the payload with Block1, blocks of 2^(SZX+4) bytes
  #[arg(long, value_name = "SZX")]
  block1: Option<u8>,

  /// Follow Block2 continuations, asking for blocks of 2^(SZX+4) bytes
  #[arg(long, value_name = "SZX")]
  block2: Option<u8>,

  /// Content-Format of the payload (name like application/cbor, or number)
  #[arg(long, value_parser = option::parse_content_format)]
  content_format: Option<ContentFormat>,

  /// Acceptable response Content-Format
  #[arg(long, value_parser = option::parse_content_format)]
  accept: Option<ContentFormat>,

  /// Register as an observer
  #[arg(long)]
  observe: bool,

  /// How long to wait for each response
  #[arg(long, value_name = "MS")]
  timeout_ms: Option<u64>,

  /// How many times to retry the whole transfer after a timeout or socket error
  #[arg(long, value_name = "N")]
  retries: Option<u16>,

  /// Log more (-v info, -vv debug, -vvv trace)
  #[arg(short, long, action = ArgAction::Count)]
  verbose: u8,
}

impl Args {
  fn payload(&self) -> Result<Vec<u8>, Error> {
    let (mode, input) = match (&self.text, &self.hex, &self.json) {
      | (Some(s), _, _) => (PayloadMode::Text, s.as_str()),
      | (_, Some(s), _) => (PayloadMode::Hex, s.as_str()),
      | (_, _, Some(s)) => (PayloadMode::CborFromJson, s.as_str()),
      | _ => (PayloadMode::None, ""),
    };

    payload::build(mode, input)
  }

  fn config(&self) -> Config {
    let mut config = Config::default();

    if self.uri.host.parse::<Ipv6Addr>().is_ok() {
      config.transport.bind = SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0));
    }
    if let Some(ms) = self.timeout_ms {
      config.transport.response_timeout = Duration::from_millis(ms);
    }
    if let Some(n) = self.retries {
      config.retry.max_attempts = Attempts(n.saturating_add(1));
    }

    config
  }

  fn transfer(&self, payload: Vec<u8>) -> Transfer {
    let mut t = Transfer::new(self.method, self.uri.clone()).payload(payload);
    t.confirmable = !self.non;
    t.block1 = self.block1;
    t.block2 = self.block2;
    t.content_format = self.content_format;
    t.accept = self.accept;
    t.observe = self.observe;
    t
  }

  fn log_level(&self) -> log::Level {
    match self.verbose {
      | 0 => log::Level::Warn,
      | 1 => log::Level::Info,
      | 2 => log::Level::Debug,
      | _ => log::Level::Trace,
    }
  }
}

/// The printed report; sections with nothing in them are left out
fn render(result: &TransferResult) -> String {
  let join = |summary: &str, options: &str| {
    [summary, options].iter()
                      .filter(|s| !s.is_empty())
                      .copied()
                      .collect::<Vec<_>>()
                      .join("\n")
  };

  let sections = [("Log", Some(result.log.clone())),
                  ("Request",
                   Some(join(&result.last_request_summary, &result.last_request_options))),
                  ("Response",
                   Some(join(&result.last_response_summary, &result.last_response_options))),
                  ("Text", result.text.clone()),
                  ("CBOR", result.cbor.clone()),
                  ("Hex", result.hex.clone())];

  sections.iter()
          .filter_map(|(name, body)| match body {
            | Some(body) if !body.is_empty() => Some(format!("== {} ==\n{}", name, body)),
            | _ => None,
          })
          .collect::<Vec<_>>()
          .join("\n\n")
}

fn run(args: &Args, payload: Vec<u8>) -> TransferResult {
  let config = args.config();
  let transfer = args.transfer(payload);
  let cancel = Cancel::new();

  Retry::new(config.retry).run(&cancel, |Attempts(n)| {
                             if n > 1 {
                               log::info!("attempt {} of {}", n, config.retry.max_attempts.0);
                             }

                             let transport = UdpTransport::try_new(config.transport)?;
                             Engine::new(transport).transfer(&transfer, &cancel)
                           })
                           .unwrap_or_else(|e| TransferResult::failed(&e))
}

fn main() -> ExitCode {
  let args = Args::parse();

  if let Err(e) = simple_logger::init_with_level(args.log_level()) {
    eprintln!("could not install logger: {}", e);
  }

  let payload = match args.payload() {
    | Ok(p) => p,
    | Err(e) => {
      eprintln!("error: {}", e);
      return ExitCode::from(2);
    },
  };

  let result = run(&args, payload);
  println!("{}", render(&result));

  if result.ok {
    ExitCode::SUCCESS
  } else {
    ExitCode::from(1)
  }
}

#[cfg(test)]
mod test {
  use coap_sender::option::CBOR;

  use super::*;

  fn args(argv: &[&str]) -> Args {
    Args::try_parse_from(std::iter::once("coap-sender").chain(argv.iter().copied())).unwrap()
  }

  #[test]
  fn defaults() {
    let a = args(&["coap://127.0.0.1/test"]);
    assert_eq!(a.method, Method::Get);
    assert_eq!(a.payload().unwrap(), Vec::<u8>::new());

    let t = a.transfer(vec![]);
    assert!(t.confirmable);
    assert_eq!((t.block1, t.block2, t.observe), (None, None, false));
    assert_eq!(a.config(), Config::default());
    assert_eq!(a.log_level(), log::Level::Warn);
  }

  #[test]
  fn flags() {
    let a = args(&["coap://[::1]:5684/fw",
                   "-m",
                   "put",
                   "--hex",
                   "DE AD",
                   "--non",
                   "--block1",
                   "2",
                   "--block2",
                   "6",
                   "--content-format",
                   "application/octet-stream",
                   "--accept",
                   "60",
                   "--observe",
                   "--timeout-ms",
                   "500",
                   "--retries",
                   "0",
                   "-vv"]);

    assert_eq!(a.method, Method::Put);
    assert_eq!(a.payload().unwrap(), vec![0xDE, 0xAD]);
    assert_eq!(a.log_level(), log::Level::Debug);

    let t = a.transfer(a.payload().unwrap());
    assert!(!t.confirmable);
    assert_eq!((t.block1, t.block2), (Some(2), Some(6)));
    assert_eq!(t.content_format, Some(ContentFormat::OctetStream));
    assert_eq!(t.accept, Some(CBOR));
    assert!(t.observe);

    let c = a.config();
    assert!(c.transport.bind.is_ipv6());
    assert_eq!(c.transport.response_timeout, Duration::from_millis(500));
    assert_eq!(c.retry.max_attempts, Attempts(1));
  }

  #[test]
  fn bad_arguments_are_rejected() {
    let parse = |argv: &[&str]| {
      Args::try_parse_from(std::iter::once("coap-sender").chain(argv.iter().copied()))
    };

    assert!(parse(&["http://example.com"]).is_err());
    assert!(parse(&["coap://h", "-m", "PATCH"]).is_err());
    assert!(parse(&["coap://h", "--text", "a", "--hex", "00"]).is_err());
    assert!(parse(&["coap://h", "--accept", "image/png"]).is_err());
    assert!(args(&["coap://h", "--hex", "ABC"]).payload().is_err());
  }

  #[test]
  fn render_failed() {
    let e = Error::invalid_argument("nope");
    assert_eq!(render(&TransferResult::failed(&e)),
               "== Log ==\ninvalid argument: nope while validating input");
  }

  #[test]
  fn render_succeeded() {
    let r = TransferResult { ok: true,
                             log: "[TX] size=0".into(),
                             text: Some("hi".into()),
                             hex: Some("000000  68 69".into()),
                             last_request_summary: "REQ".into(),
                             last_request_options: "Options: (none)".into(),
                             last_response_summary: "RES".into(),
                             ..TransferResult::default() };

    assert_eq!(render(&r),
               ["== Log ==\n[TX] size=0",
                "== Request ==\nREQ\nOptions: (none)",
                "== Response ==\nRES",
                "== Text ==\nhi",
                "== Hex ==\n000000  68 69"].join("\n\n"));
  }
}
