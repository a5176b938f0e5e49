//! Symbolic interpreter behind the hooks of instrumented programs.
//!
//! A [`Runtime`] starts uninitialized. [`Hook::Init`] creates the
//! [`Session`] that owns the symbolic memory, the operand stack and the
//! branch trace; every other hook operates on that session. Hooks run in
//! program order of a single-threaded target, nothing here is synchronized.

use crate::{
    instrument::Hook,
    ir::{BinaryOperator, Predicate, Relation},
};
use log::{debug, info, trace, warn};
use thiserror::Error;
use z3_solver::{
    ast::{Ast, Bool, Dynamic, BV},
    Context,
};

pub mod memory;
pub mod stack;

pub use self::{memory::*, stack::*};

/// Width of all integer expressions.
pub const WORD_SIZE: u32 = 64;

#[derive(Debug, Clone, Error)]
pub enum RuntimeError {
    #[error("{0} called before the runtime was initialized")]
    NotInitialized(Hook),

    #[error("runtime has already been initialized")]
    AlreadyInitialized,

    #[error("operand stack underflow in {hook} while binding {site}")]
    StackUnderflow { hook: Hook, site: Address },

    #[error("{hook} takes {expected} arguments but was called with {actual}")]
    ArityMismatch {
        hook: Hook,
        expected: usize,
        actual: usize,
    },
}

/// Outcome of one conditional branch of a run.
#[derive(Clone, Debug)]
pub struct BranchRecord<'ctx> {
    pub branch: u32,
    pub taken: bool,
    pub condition: Bool<'ctx>,
}

/// Symbolic program input introduced by [`Hook::Input`].
#[derive(Clone, Debug)]
pub struct InputRecord<'ctx> {
    pub address: Address,
    pub symbol: BV<'ctx>,
}

pub struct Runtime<'ctx> {
    context: &'ctx Context,
    session: Option<Session<'ctx>>,
}

impl<'ctx> Runtime<'ctx> {
    pub fn new(context: &'ctx Context) -> Self {
        Self {
            context,
            session: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn init(&mut self) -> Result<&mut Session<'ctx>, RuntimeError> {
        if self.session.is_some() {
            return Err(RuntimeError::AlreadyInitialized);
        }

        info!("initializing symbolic interpreter session");

        Ok(self.session.insert(Session::new(self.context)))
    }

    pub fn session(&self) -> Result<&Session<'ctx>, RuntimeError> {
        self.session
            .as_ref()
            .ok_or(RuntimeError::NotInitialized(Hook::Init))
    }

    pub fn into_session(self) -> Option<Session<'ctx>> {
        self.session
    }

    /// Entry point for instrumented code. `args` follow the parameter list
    /// of `hook`; integers are truncated to their ABI width.
    pub fn call(&mut self, hook: Hook, args: &[i64]) -> Result<(), RuntimeError> {
        let expected = hook.params().len();
        if args.len() != expected {
            return Err(RuntimeError::ArityMismatch {
                hook,
                expected,
                actual: args.len(),
            });
        }

        trace!("{}({:?})", hook, args);

        match hook {
            Hook::Init => self.init().map(|_| ()),
            Hook::Alloca => {
                self.active(hook)?.alloca(args[0] as u32, args[1] as u64);
                Ok(())
            }
            Hook::Store => self.active(hook)?.store(args[0] as u64),
            Hook::Load => {
                self.active(hook)?.load(args[0] as u32, args[1] as u64);
                Ok(())
            }
            Hook::Const => {
                self.active(hook)?.push_const(args[0] as i32);
                Ok(())
            }
            Hook::Register => {
                self.active(hook)?.push_register(args[0] as u32);
                Ok(())
            }
            Hook::ICmp => self.active(hook)?.icmp(args[0] as u32, args[1] as u32),
            Hook::Branch => {
                self.active(hook)?
                    .branch(args[0] as u32, args[1] as u32, args[2] != 0);
                Ok(())
            }
            Hook::BinOp => self.active(hook)?.binop(args[0] as u32, args[1] as u32),
            Hook::Input => {
                self.active(hook)?.input(args[0] as u64);
                Ok(())
            }
        }
    }

    fn active(&mut self, hook: Hook) -> Result<&mut Session<'ctx>, RuntimeError> {
        self.session
            .as_mut()
            .ok_or(RuntimeError::NotInitialized(hook))
    }
}

pub struct Session<'ctx> {
    context: &'ctx Context,
    memory: SymbolicMemory<'ctx>,
    stack: OperandStack<'ctx>,
    trace: Vec<BranchRecord<'ctx>>,
    inputs: Vec<InputRecord<'ctx>>,
    zero: BV<'ctx>,
    one: BV<'ctx>,
}

impl<'ctx> Session<'ctx> {
    pub fn new(context: &'ctx Context) -> Self {
        Self {
            context,
            memory: SymbolicMemory::new(),
            stack: OperandStack::new(),
            trace: Vec::new(),
            inputs: Vec::new(),
            zero: BV::from_u64(context, 0, WORD_SIZE),
            one: BV::from_u64(context, 1, WORD_SIZE),
        }
    }

    pub fn context(&self) -> &'ctx Context {
        self.context
    }

    pub fn memory(&self) -> &SymbolicMemory<'ctx> {
        &self.memory
    }

    pub fn stack(&self) -> &OperandStack<'ctx> {
        &self.stack
    }

    pub fn trace(&self) -> &[BranchRecord<'ctx>] {
        &self.trace
    }

    pub fn inputs(&self) -> &[InputRecord<'ctx>] {
        &self.inputs
    }

    /// Branch conditions of this run, oldest first.
    pub fn path_condition(&self) -> Vec<Bool<'ctx>> {
        self.trace.iter().map(|r| r.condition.clone()).collect()
    }

    /// Addresses are concrete, only values stored through them are symbolic.
    pub fn alloca(&mut self, register: u32, ptr: u64) {
        let address = BV::from_u64(self.context, ptr, WORD_SIZE);

        self.memory.bind(Address::register(register), address.into());
    }

    pub fn store(&mut self, ptr: u64) -> Result<(), RuntimeError> {
        let target = Address::pointer(ptr);
        let entry = self.stack.pop(Hook::Store, target)?;
        let value = self.eval(&entry);

        self.memory.bind(target, value);

        Ok(())
    }

    pub fn load(&mut self, register: u32, ptr: u64) {
        let source = Address::pointer(ptr);

        let value = match self.memory.get(&source) {
            Some(value) => value.clone(),
            None => {
                warn!("load from unbound address {} into R{}", source, register);
                BV::new_const(self.context, format!("M{:#x}", ptr), WORD_SIZE).into()
            }
        };

        self.memory.bind(Address::register(register), value);
    }

    pub fn push_const(&mut self, literal: i32) {
        let value = BV::from_i64(self.context, literal as i64, WORD_SIZE);

        self.stack.push(StackEntry::Concrete(value));
    }

    pub fn push_register(&mut self, register: u32) {
        self.stack.push(StackEntry::Register(register));
    }

    pub fn icmp(&mut self, register: u32, code: u32) -> Result<(), RuntimeError> {
        let target = Address::register(register);
        let (lhs, rhs) = self.stack.pop_operands(Hook::ICmp, target)?;
        let y = self.to_bv(self.eval(&lhs));
        let z = self.to_bv(self.eval(&rhs));

        let predicate = Predicate::from_code(code);

        let result = match predicate.relation() {
            Some(Relation::Eq) => y._eq(&z),
            Some(Relation::Ne) => y._eq(&z).not(),
            Some(Relation::Gt) => y.bvsgt(&z),
            Some(Relation::Lt) => y.bvslt(&z),
            Some(Relation::Ge) => y.bvsge(&z),
            Some(Relation::Le) => y.bvsle(&z),
            None => {
                // TODO: decide whether an unmodelled predicate should abort the run
                warn!("unknown comparison predicate {} for R{}", predicate, register);
                Bool::new_const(self.context, format!("cmp{}", register))
            }
        };

        self.memory.bind(target, result.into());

        Ok(())
    }

    pub fn binop(&mut self, register: u32, code: u32) -> Result<(), RuntimeError> {
        let target = Address::register(register);
        let (lhs, rhs) = self.stack.pop_operands(Hook::BinOp, target)?;
        let y = self.to_bv(self.eval(&lhs));
        let z = self.to_bv(self.eval(&rhs));

        let op = BinaryOperator::from_code(code);

        let result = match op {
            BinaryOperator::Add => y.bvadd(&z),
            BinaryOperator::Sub => y.bvsub(&z),
            BinaryOperator::Mul => y.bvmul(&z),
            BinaryOperator::SDiv | BinaryOperator::UDiv => y.bvsdiv(&z),
            BinaryOperator::SRem | BinaryOperator::URem => y.bvsmod(&z),
            BinaryOperator::Shl => y.bvshl(&z),
            BinaryOperator::LShr => y.bvlshr(&z),
            BinaryOperator::AShr => y.bvashr(&z),
            BinaryOperator::And => y.bvand(&z),
            BinaryOperator::Or => y.bvor(&z),
            BinaryOperator::Xor => y.bvxor(&z),
            BinaryOperator::Unknown(_) => {
                warn!("unknown binary operator {} for R{}", op, register);
                BV::new_const(self.context, format!("bin{}", register), WORD_SIZE)
            }
        };

        self.memory.bind(target, result.into());

        Ok(())
    }

    /// Records the direction a branch took as a constraint over its
    /// condition register.
    pub fn branch(&mut self, branch: u32, register: u32, taken: bool) {
        let condition = match self.memory.get(&Address::register(register)) {
            Some(value) => self.to_bool(value.clone()),
            None => {
                warn!("branch {} on unbound register R{}", branch, register);
                Bool::new_const(self.context, format!("R{}", register))
            }
        };

        let condition = if taken { condition } else { condition.not() };

        debug!("branch {}: taken={} pc={}", branch, taken, condition);

        self.trace.push(BranchRecord {
            branch,
            taken,
            condition,
        });
    }

    /// Makes the slot behind `ptr` a fresh program input.
    pub fn input(&mut self, ptr: u64) {
        let address = Address::pointer(ptr);
        let symbol = BV::new_const(
            self.context,
            format!("X{}", self.inputs.len()),
            WORD_SIZE,
        );

        debug!("input {} at {}", symbol, address);

        self.memory.bind(address, symbol.clone().into());
        self.inputs.push(InputRecord { address, symbol });
    }

    /// Resolves a popped operand. A register without binding degrades to
    /// an unconstrained reference `R<id>` instead of failing the run.
    pub fn eval(&self, entry: &StackEntry<'ctx>) -> Dynamic<'ctx> {
        match entry {
            StackEntry::Concrete(value) => value.clone().into(),
            StackEntry::Register(id) => match self.memory.get(&Address::register(*id)) {
                Some(value) => value.clone(),
                None => {
                    warn!("cannot find register R{} in memory", id);
                    BV::new_const(self.context, format!("R{}", id), WORD_SIZE).into()
                }
            },
        }
    }
}

//
// Private Implementation
//

impl<'ctx> Session<'ctx> {
    fn to_bv(&self, value: Dynamic<'ctx>) -> BV<'ctx> {
        if let Some(bv) = value.as_bv() {
            bv
        } else if let Some(b) = value.as_bool() {
            b.ite(&self.one, &self.zero)
        } else {
            warn!("cannot use {} as an integer operand", value);
            BV::fresh_const(self.context, "unsupported", WORD_SIZE)
        }
    }

    fn to_bool(&self, value: Dynamic<'ctx>) -> Bool<'ctx> {
        if let Some(b) = value.as_bool() {
            b
        } else if let Some(bv) = value.as_bv() {
            bv._eq(&self.zero).not()
        } else {
            warn!("cannot use {} as a branch condition", value);
            Bool::fresh_const(self.context, "unsupported")
        }
    }
}
