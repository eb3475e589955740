//! Structured call arguments and their head/tail encoding.
//!
//! Operators present the decoded arguments of each delegated call alongside
//! the session proof. They are only trusted after [`encode_arguments`]
//! reproduces the call's real calldata byte for byte.
//!
//! Arguments arrive from the operator, so decoding caps tuple nesting at
//! [`MAX_ARGUMENT_DEPTH`]. Every recursive walk below relies on that bound.

use std::io::{self, Read};

use borsh::{BorshDeserialize, BorshSerialize};
use warden_state::{be_word_u128, B256};

const WORD: usize = 32;

const TAG_WORD: u8 = 0;
const TAG_BYTES: u8 = 1;
const TAG_TUPLE: u8 = 2;

/// Deepest tuple nesting a decoded argument may have; a top-level value is
/// depth 1.
pub const MAX_ARGUMENT_DEPTH: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize)]
pub enum Argument {
    /// Any static 32-byte value (uint, int, address, bool, bytesN)
    Word(B256),
    /// Dynamic byte string (bytes, string)
    Bytes(Vec<u8>),
    /// Ordered fields of a struct or fixed array
    Tuple(Vec<Argument>),
}

impl Argument {
    pub fn uint(value: u128) -> Self {
        Argument::Word(be_word_u128(value))
    }

    pub fn address(address: &warden_state::Address) -> Self {
        Argument::Word(address.to_word())
    }

    pub fn is_dynamic(&self) -> bool {
        match self {
            Argument::Word(_) => false,
            Argument::Bytes(_) => true,
            Argument::Tuple(fields) => fields.iter().any(Argument::is_dynamic),
        }
    }

    /// Bytes this argument occupies in the head of its enclosing tuple.
    fn head_len(&self) -> usize {
        match self {
            _ if self.is_dynamic() => WORD,
            Argument::Tuple(fields) => fields.iter().map(Argument::head_len).sum(),
            _ => WORD,
        }
    }

    fn encode_into(&self, out: &mut Vec<u8>) {
        match self {
            Argument::Word(word) => out.extend_from_slice(word),
            Argument::Bytes(bytes) => {
                out.extend_from_slice(&be_word_u128(bytes.len() as u128));
                out.extend_from_slice(bytes);
                let padding = (WORD - bytes.len() % WORD) % WORD;
                out.resize(out.len() + padding, 0);
            },
            Argument::Tuple(fields) => encode_tuple(fields, out),
        }
    }

    /// Standalone encoding of this value.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode_into(&mut out);
        out
    }
}

impl BorshDeserialize for Argument {
    fn deserialize_reader<R: Read>(reader: &mut R) -> io::Result<Self> {
        read_argument(reader, 1)
    }
}

fn read_argument<R: Read>(reader: &mut R, depth: usize) -> io::Result<Argument> {
    if depth > MAX_ARGUMENT_DEPTH {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "argument nesting too deep",
        ));
    }
    match u8::deserialize_reader(reader)? {
        TAG_WORD => Ok(Argument::Word(B256::deserialize_reader(reader)?)),
        TAG_BYTES => Ok(Argument::Bytes(Vec::<u8>::deserialize_reader(reader)?)),
        TAG_TUPLE => {
            let count = u32::deserialize_reader(reader)?;
            // no preallocation: the count is untrusted
            let mut fields = Vec::new();
            for _ in 0..count {
                fields.push(read_argument(reader, depth + 1)?);
            }
            Ok(Argument::Tuple(fields))
        },
        tag => Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("unknown argument tag {tag}"),
        )),
    }
}

fn encode_tuple(fields: &[Argument], out: &mut Vec<u8>) {
    let head_len: usize = fields.iter().map(Argument::head_len).sum();
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();
    for field in fields {
        if field.is_dynamic() {
            head.extend_from_slice(&be_word_u128((head_len + tail.len()) as u128));
            field.encode_into(&mut tail);
        } else {
            field.encode_into(&mut head);
        }
    }
    out.extend_from_slice(&head);
    out.extend_from_slice(&tail);
}

/// Encodes `args` as the parameter list following a function selector.
pub fn encode_arguments(args: &[Argument]) -> Vec<u8> {
    let mut out = Vec::new();
    encode_tuple(args, &mut out);
    out
}
