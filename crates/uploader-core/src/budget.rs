//! Byte budget for the request currently being built
//!
//! Each batched sender owns one budget sized to its per-class maximum
//! request size. Costs are serialized proto bytes, including the varint
//! framing of length-delimited fields.

use thiserror::Error;

/// Budget violations
///
/// `OutOfSpace` is ordinary control flow inside the senders (flush and
/// retry once); `BaseExceedsMax` indicates a max request size too small to
/// hold even an empty request and surfaces at sender construction.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum BudgetError {
    #[error("Base request cost {base_cost} exceeds max request size {max_bytes}")]
    BaseExceedsMax { base_cost: usize, max_bytes: usize },

    #[error("Out of space: point costs {cost} bytes, {remaining} remaining")]
    OutOfSpace { cost: usize, remaining: usize },
}

/// Tracks remaining bytes for the request currently being built
#[derive(Debug)]
pub struct ByteBudgetManager {
    max_bytes: usize,
    remaining: usize,
}

impl ByteBudgetManager {
    /// Create a budget of `max_bytes` per request
    pub fn new(max_bytes: usize) -> Self {
        Self {
            max_bytes,
            remaining: max_bytes,
        }
    }

    /// Start a fresh request whose empty serialization costs `base_cost`
    pub fn reset(&mut self, base_cost: usize) -> Result<(), BudgetError> {
        if base_cost > self.max_bytes {
            return Err(BudgetError::BaseExceedsMax {
                base_cost,
                max_bytes: self.max_bytes,
            });
        }
        self.remaining = self.max_bytes - base_cost;
        Ok(())
    }

    /// Charge the marginal serialized cost of one more point
    pub fn add_point(&mut self, cost: usize) -> Result<(), BudgetError> {
        if cost > self.remaining {
            return Err(BudgetError::OutOfSpace {
                cost,
                remaining: self.remaining,
            });
        }
        self.remaining -= cost;
        Ok(())
    }

    /// Bytes still available in the current request
    pub fn remaining(&self) -> usize {
        self.remaining
    }
}

/// Serialized cost of a length-delimited field holding `body_len` bytes:
/// one tag byte (field numbers here are all below 16) plus the length
/// varint plus the body itself.
pub fn length_delimited_cost(body_len: usize) -> usize {
    1 + prost::length_delimiter_len(body_len) + body_len
}
