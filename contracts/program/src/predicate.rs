//! Calldata predicate engine.
//!
//! A rule tree is the borsh encoding of `Vec<PredicateNode>`: one node per
//! top-level argument, where slot 0 is the value sent with the call. Every
//! node is a one-byte tag followed by its operand; literals and child lists
//! carry u32 little-endian length prefixes.
//!
//! Trees are parsed once, with depth and node limits, into [`PredicateNode`]
//! and evaluated by structural recursion. Composite nodes applied to a tuple
//! argument pair subrule `i` with field `i`; applied to a scalar they apply
//! every subrule to that scalar.

use core::cmp::Ordering;

use borsh::BorshSerialize;

use crate::abi::{encode_arguments, Argument};
use crate::config::WardenConfig;
use crate::error::WardenError;

const TAG_ANY: u8 = 0;
const TAG_EQ: u8 = 1;
const TAG_NE: u8 = 2;
const TAG_LT: u8 = 3;
const TAG_GT: u8 = 4;
const TAG_AND: u8 = 5;
const TAG_OR: u8 = 6;

const LITERAL_BYTES: u8 = 0;
const LITERAL_LIST: u8 = 1;

/// Rule operand, shaped like the argument it is compared to.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize)]
pub enum Literal {
    Bytes(Vec<u8>),
    List(Vec<Literal>),
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize)]
pub enum PredicateNode {
    Any,
    Eq(Literal),
    Ne(Literal),
    Lt(Literal),
    Gt(Literal),
    And(Vec<PredicateNode>),
    Or(Vec<PredicateNode>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PredicateLimits {
    pub max_depth: usize,
    pub max_nodes: usize,
}

impl PredicateLimits {
    pub fn from_config(config: &WardenConfig) -> Self {
        Self {
            max_depth: config.max_predicate_depth,
            max_nodes: config.max_predicate_nodes,
        }
    }
}

impl Default for PredicateLimits {
    fn default() -> Self {
        Self::from_config(&WardenConfig::default())
    }
}

/// Encodes a top-level rule list. The only decoder is [`decode_rules`].
pub fn encode_rules(rules: &[PredicateNode]) -> std::io::Result<Vec<u8>> {
    borsh::to_vec(rules)
}

/// Parses a top-level rule list, rejecting unknown tags and oversized trees.
pub fn decode_rules(
    bytes: &[u8],
    limits: &PredicateLimits,
) -> Result<Vec<PredicateNode>, WardenError> {
    let mut reader = Reader {
        bytes,
        pos: 0,
        nodes: 0,
        limits,
    };
    let count = reader.read_len()?;
    let mut rules = Vec::with_capacity(count);
    for _ in 0..count {
        rules.push(reader.read_node(1)?);
    }
    if reader.pos != bytes.len() {
        return Err(WardenError::MalformedPredicate);
    }
    Ok(rules)
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
    nodes: usize,
    limits: &'a PredicateLimits,
}

impl<'a> Reader<'a> {
    fn take(&mut self, len: usize) -> Result<&'a [u8], WardenError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or(WardenError::MalformedPredicate)?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8, WardenError> {
        Ok(self.take(1)?[0])
    }

    /// Length prefix; every element needs at least one byte, so a prefix larger
    /// than the remaining input is malformed.
    fn read_len(&mut self) -> Result<usize, WardenError> {
        let raw = self.take(4)?;
        let len = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]) as usize;
        if len > self.bytes.len() - self.pos {
            return Err(WardenError::MalformedPredicate);
        }
        Ok(len)
    }

    fn enter(&mut self, depth: usize) -> Result<(), WardenError> {
        if depth > self.limits.max_depth {
            return Err(WardenError::PredicateTooDeep);
        }
        self.nodes += 1;
        if self.nodes > self.limits.max_nodes {
            return Err(WardenError::PredicateTooLarge);
        }
        Ok(())
    }

    fn read_node(&mut self, depth: usize) -> Result<PredicateNode, WardenError> {
        self.enter(depth)?;
        let node = match self.read_u8()? {
            TAG_ANY => PredicateNode::Any,
            TAG_EQ => PredicateNode::Eq(self.read_literal(depth + 1)?),
            TAG_NE => PredicateNode::Ne(self.read_literal(depth + 1)?),
            TAG_LT => PredicateNode::Lt(self.read_literal(depth + 1)?),
            TAG_GT => PredicateNode::Gt(self.read_literal(depth + 1)?),
            tag @ (TAG_AND | TAG_OR) => {
                let count = self.read_len()?;
                let mut children = Vec::with_capacity(count);
                for _ in 0..count {
                    children.push(self.read_node(depth + 1)?);
                }
                if tag == TAG_AND {
                    PredicateNode::And(children)
                } else {
                    PredicateNode::Or(children)
                }
            },
            tag => {
                tracing::warn!(tag, "unknown predicate tag");
                return Err(WardenError::InvalidPredicateTag);
            },
        };
        Ok(node)
    }

    fn read_literal(&mut self, depth: usize) -> Result<Literal, WardenError> {
        self.enter(depth)?;
        match self.read_u8()? {
            LITERAL_BYTES => {
                let len = self.read_len()?;
                Ok(Literal::Bytes(self.take(len)?.to_vec()))
            },
            LITERAL_LIST => {
                let count = self.read_len()?;
                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    items.push(self.read_literal(depth + 1)?);
                }
                Ok(Literal::List(items))
            },
            tag => {
                tracing::warn!(tag, "unknown literal tag");
                Err(WardenError::InvalidPredicateTag)
            },
        }
    }
}

/// Re-encodes `literal` into the layout of `shape` so the two compare as
/// encoded arguments.
pub fn shape_literal(literal: &Literal, shape: &Argument) -> Result<Argument, WardenError> {
    match (literal, shape) {
        (Literal::Bytes(bytes), Argument::Word(_)) => Ok(Argument::Word(left_pad(bytes)?)),
        (Literal::Bytes(bytes), Argument::Bytes(_)) => Ok(Argument::Bytes(bytes.clone())),
        (Literal::List(items), Argument::Tuple(fields)) if items.len() == fields.len() => items
            .iter()
            .zip(fields)
            .map(|(item, field)| shape_literal(item, field))
            .collect::<Result<Vec<_>, _>>()
            .map(Argument::Tuple),
        _ => Err(WardenError::RuleShapeMismatch),
    }
}

fn left_pad(bytes: &[u8]) -> Result<[u8; 32], WardenError> {
    if bytes.len() > 32 {
        return Err(WardenError::RuleShapeMismatch);
    }
    let mut word = [0u8; 32];
    word[32 - bytes.len()..].copy_from_slice(bytes);
    Ok(word)
}

fn literal_equals(literal: &Literal, arg: &Argument) -> Result<bool, WardenError> {
    let expected = shape_literal(literal, arg)?;
    Ok(encode_arguments(core::slice::from_ref(&expected))
        == encode_arguments(core::slice::from_ref(arg)))
}

fn compare_word(literal: &Literal, arg: &Argument) -> Result<Ordering, WardenError> {
    match (literal, arg) {
        (Literal::Bytes(bytes), Argument::Word(word)) => Ok(word.cmp(&left_pad(bytes)?)),
        _ => Err(WardenError::RuleShapeMismatch),
    }
}

fn fields_for<'a>(
    children: &[PredicateNode],
    arg: &'a Argument,
) -> Result<Option<&'a [Argument]>, WardenError> {
    match arg {
        Argument::Tuple(fields) if fields.len() == children.len() => Ok(Some(fields)),
        Argument::Tuple(_) => Err(WardenError::RuleShapeMismatch),
        _ => Ok(None),
    }
}

impl PredicateNode {
    /// Evaluates the node lazily: composites stop at the first decisive
    /// subrule, so later subrules are never inspected.
    pub fn evaluate(&self, arg: &Argument) -> Result<bool, WardenError> {
        match self {
            PredicateNode::Any => Ok(true),
            PredicateNode::Eq(literal) => literal_equals(literal, arg),
            PredicateNode::Ne(literal) => literal_equals(literal, arg).map(|eq| !eq),
            PredicateNode::Lt(literal) => Ok(compare_word(literal, arg)? == Ordering::Less),
            PredicateNode::Gt(literal) => Ok(compare_word(literal, arg)? == Ordering::Greater),
            PredicateNode::And(children) => {
                if children.is_empty() {
                    return Ok(true);
                }
                match fields_for(children, arg)? {
                    Some(fields) => {
                        for (child, field) in children.iter().zip(fields) {
                            if !child.evaluate(field)? {
                                return Ok(false);
                            }
                        }
                    },
                    None => {
                        for child in children {
                            if !child.evaluate(arg)? {
                                return Ok(false);
                            }
                        }
                    },
                }
                Ok(true)
            },
            PredicateNode::Or(children) => {
                if children.is_empty() {
                    return Ok(true);
                }
                match fields_for(children, arg)? {
                    Some(fields) => {
                        for (child, field) in children.iter().zip(fields) {
                            if child.evaluate(field)? {
                                return Ok(true);
                            }
                        }
                    },
                    None => {
                        for child in children {
                            if child.evaluate(arg)? {
                                return Ok(true);
                            }
                        }
                    },
                }
                Ok(false)
            },
        }
    }

    /// Checks the whole tree against the argument layout without evaluating it.
    pub fn check_shape(&self, arg: &Argument) -> Result<(), WardenError> {
        match self {
            PredicateNode::Any => Ok(()),
            PredicateNode::Eq(literal) | PredicateNode::Ne(literal) => {
                shape_literal(literal, arg).map(|_| ())
            },
            PredicateNode::Lt(literal) | PredicateNode::Gt(literal) => {
                compare_word(literal, arg).map(|_| ())
            },
            PredicateNode::And(children) | PredicateNode::Or(children) => {
                if children.is_empty() {
                    return Ok(());
                }
                match fields_for(children, arg)? {
                    Some(fields) => children
                        .iter()
                        .zip(fields)
                        .try_for_each(|(child, field)| child.check_shape(field)),
                    None => children.iter().try_for_each(|child| child.check_shape(arg)),
                }
            },
        }
    }
}

/// Applies one rule per argument slot; every slot must pass.
pub fn evaluate_rules(rules: &[PredicateNode], args: &[Argument]) -> Result<bool, WardenError> {
    if rules.len() != args.len() {
        return Err(WardenError::InvalidArgumentsLength);
    }
    for (rule, arg) in rules.iter().zip(args) {
        if !rule.evaluate(arg)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Verifies every rule matches the layout of its argument slot.
pub fn check_rules_shape(rules: &[PredicateNode], args: &[Argument]) -> Result<(), WardenError> {
    if rules.len() != args.len() {
        return Err(WardenError::InvalidArgumentsLength);
    }
    rules
        .iter()
        .zip(args)
        .try_for_each(|(rule, arg)| rule.check_shape(arg))
}
