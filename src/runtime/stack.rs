use super::{Address, RuntimeError};
use crate::instrument::Hook;
use log::trace;
use std::fmt;
use z3_solver::ast::BV;

/// Operand pushed by a value hook.
///
/// Registers are pushed by reference and resolved when the consuming hook
/// pops them.
#[derive(Clone, Debug)]
pub enum StackEntry<'ctx> {
    Concrete(BV<'ctx>),
    Register(u32),
}

impl<'ctx> fmt::Display for StackEntry<'ctx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StackEntry::Concrete(value) => write!(f, "{}", value),
            StackEntry::Register(id) => write!(f, "R{}", id),
        }
    }
}

/// LIFO queue between value hooks and the hook of the consuming
/// instruction: the operand pushed first is popped last.
#[derive(Debug, Default)]
pub struct OperandStack<'ctx> {
    entries: Vec<StackEntry<'ctx>>,
}

impl<'ctx> OperandStack<'ctx> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, entry: StackEntry<'ctx>) {
        trace!("push {} (depth {})", entry, self.entries.len() + 1);

        self.entries.push(entry);
    }

    /// Pops one operand on behalf of `hook`, which is about to bind `site`.
    pub fn pop(&mut self, hook: Hook, site: Address) -> Result<StackEntry<'ctx>, RuntimeError> {
        self.entries
            .pop()
            .ok_or(RuntimeError::StackUnderflow { hook, site })
    }

    /// Pops the two operands of a binary instruction. Operand 1 was pushed
    /// last and comes off first; the result is returned as `(lhs, rhs)`.
    pub fn pop_operands(
        &mut self,
        hook: Hook,
        site: Address,
    ) -> Result<(StackEntry<'ctx>, StackEntry<'ctx>), RuntimeError> {
        let rhs = self.pop(hook, site)?;
        let lhs = self.pop(hook, site)?;

        Ok((lhs, rhs))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operands_come_off_in_reverse_push_order() {
        let mut stack = OperandStack::new();

        stack.push(StackEntry::Register(1));
        stack.push(StackEntry::Register(2));

        let (lhs, rhs) = stack
            .pop_operands(Hook::BinOp, Address::register(3))
            .unwrap();

        assert!(matches!(lhs, StackEntry::Register(1)));
        assert!(matches!(rhs, StackEntry::Register(2)));
        assert!(stack.is_empty());
    }

    #[test]
    fn underflow_names_hook_and_site() {
        let mut stack = OperandStack::new();
        stack.push(StackEntry::Register(1));

        let err = stack
            .pop_operands(Hook::ICmp, Address::register(9))
            .unwrap_err();

        assert!(matches!(
            err,
            RuntimeError::StackUnderflow {
                hook: Hook::ICmp,
                site
            } if site == Address::register(9)
        ));
    }
}
