use log::trace;
use std::{collections::HashMap, fmt};
use z3_solver::ast::Dynamic;

/// Key of the symbolic memory.
///
/// Registers and memory locations share one key space: an address is equal
/// to another exactly if their numeric values are equal.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Address(u64);

impl Address {
    pub fn register(id: u32) -> Self {
        Self(id as u64)
    }

    pub fn pointer(ptr: u64) -> Self {
        Self(ptr)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl From<u32> for Address {
    fn from(id: u32) -> Self {
        Self::register(id)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// At most one expression per address; binding again replaces the old one.
#[derive(Debug, Default)]
pub struct SymbolicMemory<'ctx> {
    bindings: HashMap<Address, Dynamic<'ctx>>,
}

impl<'ctx> SymbolicMemory<'ctx> {
    pub fn new() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    /// Binds `address` to `value` and returns the discarded binding.
    pub fn bind(&mut self, address: Address, value: Dynamic<'ctx>) -> Option<Dynamic<'ctx>> {
        trace!("bind {} := {}", address, value);

        self.bindings.insert(address, value)
    }

    pub fn get(&self, address: &Address) -> Option<&Dynamic<'ctx>> {
        self.bindings.get(address)
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.bindings.contains_key(address)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Address, &Dynamic<'ctx>)> {
        self.bindings.iter()
    }
}
