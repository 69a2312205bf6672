use core::fmt;
use core::str::FromStr;
use std::net::IpAddr;

use crate::error::Error;

/// Default CoAP port
pub const DEFAULT_PORT: u16 = 5683;

/// Request method
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Method {
  /// `0.01 GET`
  Get,
  /// `0.02 POST`
  Post,
  /// `0.03 PUT`
  Put,
  /// `0.04 DELETE`
  Delete,
}

impl Method {
  /// Code detail; the class of a request code is always 0
  pub fn code_detail(&self) -> u8 {
    match self {
      | Method::Get => 1,
      | Method::Post => 2,
      | Method::Put => 3,
      | Method::Delete => 4,
    }
  }

  /// Method for a request code, if it is one of the four
  pub fn from_code(class: u8, detail: u8) -> Option<Self> {
    match (class, detail) {
      | (0, 1) => Some(Method::Get),
      | (0, 2) => Some(Method::Post),
      | (0, 3) => Some(Method::Put),
      | (0, 4) => Some(Method::Delete),
      | _ => None,
    }
  }

  /// POST and PUT carry a body that may need Block1 fragmentation
  pub fn is_write(&self) -> bool {
    matches!(self, Method::Post | Method::Put)
  }

  /// `"GET"`, `"POST"`, ..
  pub fn as_str(&self) -> &'static str {
    match self {
      | Method::Get => "GET",
      | Method::Post => "POST",
      | Method::Put => "PUT",
      | Method::Delete => "DELETE",
    }
  }
}

impl fmt::Display for Method {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Method {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_uppercase().as_str() {
      | "GET" => Ok(Method::Get),
      | "POST" => Ok(Method::Post),
      | "PUT" => Ok(Method::Put),
      | "DELETE" => Ok(Method::Delete),
      | _ => Err(Error::invalid_argument(format!("unknown method {:?}", s))),
    }
  }
}

/// Where a request is going, parsed from a `coap://` URI
///
/// ```
/// use coap_sender::req::Target;
///
/// let t: Target = "coap://127.0.0.1:5684/sensors/temp?unit=c".parse().unwrap();
/// assert_eq!(t.host, "127.0.0.1");
/// assert_eq!(t.port, 5684);
/// assert_eq!(t.path, vec!["sensors", "temp"]);
/// assert_eq!(t.query, vec!["unit=c"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target {
  /// Hostname or IP literal (no brackets)
  pub host: String,
  /// UDP port; 5683 when the URI does not name one
  pub port: u16,
  /// Uri-Path segments
  pub path: Vec<String>,
  /// Uri-Query elements
  pub query: Vec<String>,
}

impl Target {
  /// Is [`Target::host`] an IP address rather than a name?
  pub fn host_is_ip(&self) -> bool {
    self.host.parse::<IpAddr>().is_ok()
  }
}

impl FromStr for Target {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let s = s.trim();
    if s.is_empty() {
      return Err(Error::invalid_argument("target address is empty"));
    }

    let rest = match s.split_once("://") {
      | Some((scheme, rest)) if scheme.eq_ignore_ascii_case("coap") => rest,
      | Some((scheme, _)) => {
        return Err(Error::invalid_argument(format!("unsupported scheme {:?}", scheme)))
      },
      | None => return Err(Error::invalid_argument(format!("{:?} is not a coap:// URI", s))),
    };

    let (rest, query): (&str, Vec<String>) = match rest.split_once('?') {
      | Some((rest, q)) => (rest,
                            q.split('&')
                             .filter(|q| !q.is_empty())
                             .map(String::from)
                             .collect()),
      | None => (rest, vec![]),
    };

    let (authority, path) = match rest.split_once('/') {
      | Some((authority, path)) => (authority, path),
      | None => (rest, ""),
    };

    let (host, port) = if let Some(bracketed) = authority.strip_prefix('[') {
      let (host, after) = bracketed.split_once(']')
                                   .ok_or_else(|| Error::invalid_argument("unterminated IPv6 literal"))?;
      match after {
        | "" => (host, None),
        | after => match after.strip_prefix(':') {
          | Some(port) => (host, Some(port)),
          | None => return Err(Error::invalid_argument(format!("unexpected {:?} after host", after))),
        },
      }
    } else {
      match authority.split_once(':') {
        | Some((host, port)) => (host, Some(port)),
        | None => (authority, None),
      }
    };

    if host.is_empty() {
      return Err(Error::invalid_argument(format!("{:?} has no host", s)));
    }

    let port = match port {
      | None | Some("") => DEFAULT_PORT,
      | Some(port) => port.parse::<u16>()
                          .map_err(|_| Error::invalid_argument(format!("invalid port {:?}", port)))?,
    };

    Ok(Target { host: host.to_string(),
                port,
                path: path.split('/')
                          .filter(|seg| !seg.is_empty())
                          .map(String::from)
                          .collect(),
                query })
  }
}

impl fmt::Display for Target {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.host.contains(':') {
      write!(f, "coap://[{}]:{}", self.host, self.port)?;
    } else {
      write!(f, "coap://{}:{}", self.host, self.port)?;
    }

    for seg in &self.path {
      write!(f, "/{}", seg)?;
    }

    for (ix, q) in self.query.iter().enumerate() {
      write!(f, "{}{}", if ix == 0 { '?' } else { '&' }, q)?;
    }

    Ok(())
  }
}
