use crate::ir::{BlockId, ValueId};
use std::collections::HashMap;

/// Item of a function that needs a stable integer identity.
///
/// A block carries at most one conditional branch (its terminator), so the
/// block id identifies the branch.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Numbered {
    Register(ValueId),
    Branch(BlockId),
}

/// Assigns identifiers to registers and branches.
///
/// Implementations have to be injective and deterministic within one
/// compilation: the same item always gets the same id, different items of
/// the same kind never share one. Register ids double as keys of the
/// runtime's symbolic memory, so they have to be unique module wide.
pub trait NumberingOracle {
    fn assign(&mut self, function: &str, item: Numbered) -> u32;
}

/// Numbers items in first-seen order, one counter per kind.
#[derive(Debug, Default)]
pub struct SequentialNumbering {
    registers: HashMap<(String, ValueId), u32>,
    branches: HashMap<(String, BlockId), u32>,
}

impl SequentialNumbering {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registers(&self) -> usize {
        self.registers.len()
    }

    pub fn branches(&self) -> usize {
        self.branches.len()
    }
}

impl NumberingOracle for SequentialNumbering {
    fn assign(&mut self, function: &str, item: Numbered) -> u32 {
        match item {
            Numbered::Register(value) => next_id(&mut self.registers, (function.to_string(), value)),
            Numbered::Branch(block) => next_id(&mut self.branches, (function.to_string(), block)),
        }
    }
}

fn next_id<K: Eq + std::hash::Hash>(ids: &mut HashMap<K, u32>, key: K) -> u32 {
    let next = ids.len() as u32;
    *ids.entry(key).or_insert(next)
}
