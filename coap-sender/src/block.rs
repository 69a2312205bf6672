use core::fmt;
use core::ops::Range;

use tinyvec::ArrayVec;

use crate::error::ErrorKind;

/// Largest block number that fits in a 3-byte option value
pub const MAX_NUM: u32 = (1 << 20) - 1;

/// Largest usable size exponent (1024 byte blocks)
///
/// `7` would mean 2048 bytes, which RFC7959 reserves.
pub const MAX_SZX: u8 = 6;

/// Raw Block1 / Block2 option value; 1 to 3 bytes
pub type Value = ArrayVec<[u8; 3]>;

/// Errors encounterable encoding or decoding a Block option value
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Error {
  /// SZX must be in `0..=6`
  SzxOutOfRange(u8),
  /// Block number does not fit in 3 bytes
  NumOutOfRange(u32),
  /// Option value was empty
  Empty,
  /// A received option value used the reserved SZX `7`
  ReservedSzx,
}

impl Error {
  /// Which [`ErrorKind`] this is
  ///
  /// A bad SZX is the caller's mistake, everything else is an encoding failure.
  pub fn kind(&self) -> ErrorKind {
    match self {
      | Error::SzxOutOfRange(_) => ErrorKind::InvalidArgument,
      | Error::NumOutOfRange(_) | Error::Empty | Error::ReservedSzx => ErrorKind::Encoding,
    }
  }
}

impl fmt::Display for Error {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      | Error::SzxOutOfRange(szx) => write!(f, "szx {} is not in 0..={}", szx, MAX_SZX),
      | Error::NumOutOfRange(num) => {
        write!(f, "block number {} does not fit in 3 bytes (max {})", num, MAX_NUM)
      },
      | Error::Empty => write!(f, "empty option value"),
      | Error::ReservedSzx => write!(f, "option value uses reserved szx 7"),
    }
  }
}

impl std::error::Error for Error {}

/// Three items of information are transferred in a
/// Block (Block1 or Block2) option:
/// * the size of the block ([`BlockParam::size`], derived from [`BlockParam::szx`])
/// * whether more blocks are following ([`BlockParam::more`])
/// * the relative number of the block ([`BlockParam::num`]) within a sequence of blocks with the given size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockParam {
  num: u32,
  more: bool,
  szx: u8,
}

impl BlockParam {
  /// Create a block parameter, checking that it can be encoded
  pub fn new(num: u32, more: bool, szx: u8) -> Result<Self, Error> {
    size_of(szx)?;

    if num > MAX_NUM {
      return Err(Error::NumOutOfRange(num));
    }

    Ok(Self { num, more, szx })
  }

  #[allow(missing_docs)]
  pub fn num(&self) -> u32 {
    self.num
  }

  #[allow(missing_docs)]
  pub fn more(&self) -> bool {
    self.more
  }

  #[allow(missing_docs)]
  pub fn szx(&self) -> u8 {
    self.szx
  }

  /// `2^(szx + 4)` bytes
  pub fn size(&self) -> usize {
    1 << (self.szx + 4)
  }

  /// The block a client should ask for after this one.
  ///
  /// `more` is meaningless on a request, so it is always `false`.
  pub fn next(&self) -> Self {
    Self { num: self.num.saturating_add(1),
           more: false,
           szx: self.szx }
  }

  /// Encode into the option value
  pub fn encode(&self) -> Result<Value, Error> {
    encode(self.num, self.more, self.szx)
  }
}

impl fmt::Display for BlockParam {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f,
           "num={} m={} szx={}",
           self.num,
           u8::from(self.more),
           self.szx)
  }
}

/// Block size in bytes for a size exponent
///
/// ```
/// use coap_sender::block::size_of;
///
/// assert_eq!(size_of(0), Ok(16));
/// assert_eq!(size_of(2), Ok(64));
/// assert_eq!(size_of(6), Ok(1024));
/// assert!(size_of(7).is_err());
/// ```
pub fn size_of(szx: u8) -> Result<usize, Error> {
  if szx > MAX_SZX {
    Err(Error::SzxOutOfRange(szx))
  } else {
    Ok(1 << (szx + 4))
  }
}

/// Encode a Block option value using the fewest big-endian bytes
///
/// ```
/// use coap_sender::block;
///
/// assert_eq!(block::encode(1, true, 2).unwrap().as_slice(), &[0x1A]);
/// ```
pub fn encode(num: u32, more: bool, szx: u8) -> Result<Value, Error> {
  size_of(szx)?;

  if num > MAX_NUM {
    return Err(Error::NumOutOfRange(num));
  }

  let v = (num << 4) | (u32::from(more) << 3) | u32::from(szx);
  let len = match v {
    | 0..=0xFF => 1,
    | 0x100..=0xFFFF => 2,
    | _ => 3,
  };

  Ok(v.to_be_bytes()[4 - len..].iter().copied().collect())
}

/// Decode a Block option value of any length
///
/// Bits above the 64th are discarded.
pub fn decode(bytes: &[u8]) -> Result<BlockParam, Error> {
  if bytes.is_empty() {
    return Err(Error::Empty);
  }

  let v = bytes.iter().fold(0u64, |v, b| (v << 8) | u64::from(*b));

  let szx = (v & 0b111) as u8;
  if szx > MAX_SZX {
    return Err(Error::ReservedSzx);
  }

  Ok(BlockParam { num: u32::try_from(v >> 4).unwrap_or(u32::MAX),
                  more: v & 0b1000 != 0,
                  szx })
}

/// Split a payload of `len` bytes into Block1 fragments of `2^(szx+4)` bytes
///
/// Yields the block parameter to send each slice with, alongside the
/// byte range of the slice.
///
/// ```
/// use coap_sender::block;
///
/// let sizes = block::fragments(150, 2).unwrap()
///                                     .map(|(_, range)| range.len())
///                                     .collect::<Vec<_>>();
/// assert_eq!(sizes, vec![64, 64, 22]);
/// ```
pub fn fragments(len: usize, szx: u8) -> Result<Fragments, Error> {
  let size = size_of(szx)?;
  Ok(Fragments { len,
                 size,
                 szx,
                 offset: 0,
                 num: 0 })
}

/// Iterator returned by [`fragments`]
#[derive(Debug, Clone)]
pub struct Fragments {
  len: usize,
  size: usize,
  szx: u8,
  offset: usize,
  num: u32,
}

impl Iterator for Fragments {
  type Item = (BlockParam, Range<usize>);

  fn next(&mut self) -> Option<Self::Item> {
    if self.offset >= self.len {
      return None;
    }

    let end = self.len.min(self.offset + self.size);
    let block = BlockParam { num: self.num,
                             more: self.offset + self.size < self.len,
                             szx: self.szx };
    let range = self.offset..end;

    self.offset += self.size;
    self.num += 1;

    Some((block, range))
  }
}
