use crate::{
    instrument::Hook,
    ir::{BinaryOperator, Function, Instruction, Module, Operand, Predicate, Relation, ValueId},
    runtime::{Runtime, RuntimeError},
};
use log::{debug, trace};
use std::collections::{HashMap, VecDeque};
use thiserror::Error;

pub mod defaults {
    pub const MAX_EXECUTION_DEPTH: u64 = 100_000;
    pub const STACK_BASE: u64 = 0x1000;
    pub const SLOT_SIZE: u64 = 8;
    pub const ENTRY_FUNCTION: &str = "main";
}

#[derive(Clone, Debug)]
pub struct ExecutionOptions {
    pub entry_function: String,
    pub max_execution_depth: u64,
    /// Address of the first stack slot. Registers and pointers share the
    /// runtime's key space, so a hook naming a register id at or above it
    /// fails with [`ExecutionError::RegisterCollision`].
    pub stack_base: u64,
    pub slot_size: u64,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            entry_function: defaults::ENTRY_FUNCTION.to_string(),
            max_execution_depth: defaults::MAX_EXECUTION_DEPTH,
            stack_base: defaults::STACK_BASE,
            slot_size: defaults::SLOT_SIZE,
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum ExecutionError {
    #[error("function {0} is neither defined nor a hook")]
    UnknownFunction(String),

    #[error("value %{1} is used before its definition in {0}")]
    UndefinedValue(String, ValueId),

    #[error("access to invalid address {0:#x}")]
    InvalidPointer(i64),

    #[error("block bb{1} of {0} does not exist or has no terminator")]
    InvalidControlFlow(String, u32),

    #[error("division by zero in {0}")]
    DivisionByZero(String),

    #[error("engine does not support {0}")]
    NotSupported(String),

    #[error("has reached the maximum execution depth of {0}")]
    ExecutionDepthReached(u64),

    #[error("{1} expects {2} arguments, got {0}")]
    ArgumentMismatch(usize, String, usize),

    #[error("register id {0} reaches into the stack starting at {1:#x}")]
    RegisterCollision(u32, u64),

    #[error("runtime failed: {0}")]
    Runtime(#[from] RuntimeError),
}

/// Runs an instrumented module on concrete inputs and forwards every hook
/// call to the symbolic runtime.
///
/// Memory is a flat set of word sized slots handed out by `alloca`. Values
/// are 64-bit integers, comparison results are 0 or 1.
pub struct ConcreteExecutor<'a, 'ctx> {
    module: &'a Module,
    runtime: &'a mut Runtime<'ctx>,
    options: ExecutionOptions,
    inputs: VecDeque<i64>,
    memory: HashMap<u64, i64>,
    next_slot: u64,
    execution_depth: u64,
}

impl<'a, 'ctx> ConcreteExecutor<'a, 'ctx> {
    pub fn new(
        module: &'a Module,
        runtime: &'a mut Runtime<'ctx>,
        options: &ExecutionOptions,
        inputs: Vec<i64>,
    ) -> Self {
        Self {
            module,
            runtime,
            options: options.clone(),
            inputs: inputs.into(),
            memory: HashMap::new(),
            next_slot: options.stack_base,
            execution_depth: 0,
        }
    }

    /// Executes the entry function and returns its result.
    pub fn run(&mut self) -> Result<Option<i64>, ExecutionError> {
        let module = self.module;
        let entry = module
            .function(&self.options.entry_function)
            .ok_or_else(|| ExecutionError::UnknownFunction(self.options.entry_function.clone()))?;

        debug!(
            "executing {} with inputs {:?} (stack base {:#x})",
            entry.name, self.inputs, self.options.stack_base
        );

        time_debug!("finished concrete execution", {
            self.execute(entry, Vec::new())
        })
    }

    pub fn execution_depth(&self) -> u64 {
        self.execution_depth
    }
}

//
// Private Implementation
//

type Frame = HashMap<ValueId, i64>;

impl<'a, 'ctx> ConcreteExecutor<'a, 'ctx> {
    fn execute(&mut self, function: &'a Function, args: Vec<i64>) -> Result<Option<i64>, ExecutionError> {
        if args.len() != function.params.len() {
            return Err(ExecutionError::ArgumentMismatch(
                args.len(),
                function.name.clone(),
                function.params.len(),
            ));
        }

        let mut frame: Frame = function.params.iter().copied().zip(args).collect();
        let mut block = function
            .entry_block()
            .ok_or_else(|| ExecutionError::InvalidControlFlow(function.name.clone(), 0))?;

        loop {
            let mut next = None;

            for instruction in block.instructions.iter() {
                self.execution_depth += 1;
                if self.execution_depth > self.options.max_execution_depth {
                    return Err(ExecutionError::ExecutionDepthReached(
                        self.options.max_execution_depth,
                    ));
                }

                trace!("{}: {}", function.name, instruction);

                match instruction {
                    Instruction::Alloca { result } => {
                        let slot = self.next_slot;
                        self.next_slot += self.options.slot_size;
                        frame.insert(*result, slot as i64);
                    }
                    Instruction::Store { value, ptr } => {
                        let value = operand(function, &frame, value)?;
                        let address = self.check_address(operand(function, &frame, ptr)?)?;
                        self.memory.insert(address, value);
                    }
                    Instruction::Load { result, ptr } => {
                        let address = self.check_address(operand(function, &frame, ptr)?)?;
                        let value = self.memory.get(&address).copied().unwrap_or_else(|| {
                            trace!("read of uninitialized slot {:#x}", address);
                            0
                        });
                        frame.insert(*result, value);
                    }
                    Instruction::ICmp {
                        result,
                        predicate,
                        lhs,
                        rhs,
                    } => {
                        let lhs = operand(function, &frame, lhs)?;
                        let rhs = operand(function, &frame, rhs)?;
                        frame.insert(*result, compare(*predicate, lhs, rhs)? as i64);
                    }
                    Instruction::Binary {
                        result,
                        op,
                        lhs,
                        rhs,
                    } => {
                        let lhs = operand(function, &frame, lhs)?;
                        let rhs = operand(function, &frame, rhs)?;
                        frame.insert(*result, arithmetic(function, *op, lhs, rhs)?);
                    }
                    Instruction::Br { target } => {
                        next = Some(*target);
                        break;
                    }
                    Instruction::CondBr {
                        cond,
                        then_block,
                        else_block,
                    } => {
                        let taken = operand(function, &frame, cond)? != 0;
                        next = Some(if taken { *then_block } else { *else_block });
                        break;
                    }
                    Instruction::Call {
                        result,
                        callee,
                        args,
                    } => {
                        let args = args
                            .iter()
                            .map(|a| operand(function, &frame, a))
                            .collect::<Result<Vec<_>, _>>()?;
                        let value = self.call(callee, args)?;
                        if let (Some(result), Some(value)) = (result, value) {
                            frame.insert(*result, value);
                        }
                    }
                    Instruction::Ret { value } => {
                        return value
                            .as_ref()
                            .map(|v| operand(function, &frame, v))
                            .transpose();
                    }
                    Instruction::Debug(_) => {}
                }
            }

            let target = next
                .ok_or_else(|| ExecutionError::InvalidControlFlow(function.name.clone(), block.id))?;

            block = function
                .block(target)
                .ok_or_else(|| ExecutionError::InvalidControlFlow(function.name.clone(), target))?;
        }
    }

    fn call(&mut self, callee: &str, args: Vec<i64>) -> Result<Option<i64>, ExecutionError> {
        if let Some(hook) = Hook::from_name(callee) {
            if hook == Hook::Input {
                if let Some(ptr) = args.first() {
                    let address = self.check_address(*ptr)?;
                    let value = self.inputs.pop_front().unwrap_or_else(|| {
                        debug!("no more concrete inputs, defaulting to 0");
                        0
                    });
                    self.memory.insert(address, value);
                }
            }

            if let Some(register) = register_argument(hook, &args) {
                if register as u64 >= self.options.stack_base {
                    return Err(ExecutionError::RegisterCollision(register, self.options.stack_base));
                }
            }

            self.runtime.call(hook, &args)?;

            return Ok(None);
        }

        let module = self.module;
        let function = module
            .function(callee)
            .ok_or_else(|| ExecutionError::UnknownFunction(callee.to_string()))?;

        self.execute(function, args)
    }

    fn check_address(&self, ptr: i64) -> Result<u64, ExecutionError> {
        let address = ptr as u64;
        let in_range = (self.options.stack_base..self.next_slot).contains(&address);

        if in_range && (address - self.options.stack_base) % self.options.slot_size == 0 {
            Ok(address)
        } else {
            Err(ExecutionError::InvalidPointer(ptr))
        }
    }
}

fn operand(function: &Function, frame: &Frame, operand: &Operand) -> Result<i64, ExecutionError> {
    match operand {
        Operand::Const(imm) => Ok(*imm),
        Operand::Value(id) => frame
            .get(id)
            .copied()
            .ok_or_else(|| ExecutionError::UndefinedValue(function.name.clone(), *id)),
    }
}

/// Register id a hook binds or reads, if any.
fn register_argument(hook: Hook, args: &[i64]) -> Option<u32> {
    let index = match hook {
        Hook::Alloca | Hook::Load | Hook::ICmp | Hook::BinOp | Hook::Register => 0,
        Hook::Branch => 1,
        Hook::Init | Hook::Store | Hook::Const | Hook::Input => return None,
    };

    args.get(index).map(|id| *id as u32)
}

/// Relations are compared signed, unsigned predicates included, since the
/// runtime records every relation with signed bit-vector comparisons. The
/// direction taken here must satisfy the recorded path condition.
fn compare(predicate: Predicate, lhs: i64, rhs: i64) -> Result<bool, ExecutionError> {
    match predicate.relation() {
        Some(Relation::Eq) => Ok(lhs == rhs),
        Some(Relation::Ne) => Ok(lhs != rhs),
        Some(Relation::Gt) => Ok(lhs > rhs),
        Some(Relation::Lt) => Ok(lhs < rhs),
        Some(Relation::Ge) => Ok(lhs >= rhs),
        Some(Relation::Le) => Ok(lhs <= rhs),
        None => match predicate {
            Predicate::FcmpTrue | Predicate::FcmpOrd => Ok(true),
            Predicate::FcmpFalse | Predicate::FcmpUno => Ok(false),
            other => Err(ExecutionError::NotSupported(format!("predicate {}", other))),
        },
    }
}

/// Follows the runtime's bit-vector semantics: both divisions truncate
/// signed, both remainders take the sign of the divisor, shifts by 64 or
/// more saturate.
fn arithmetic(function: &Function, op: BinaryOperator, lhs: i64, rhs: i64) -> Result<i64, ExecutionError> {
    let is_division = matches!(
        op,
        BinaryOperator::UDiv | BinaryOperator::SDiv | BinaryOperator::URem | BinaryOperator::SRem
    );
    if is_division && rhs == 0 {
        return Err(ExecutionError::DivisionByZero(function.name.clone()));
    }

    let overshift = rhs as u64 >= 64;
    let shift = (rhs as u64 % 64) as u32;

    Ok(match op {
        BinaryOperator::Add => lhs.wrapping_add(rhs),
        BinaryOperator::Sub => lhs.wrapping_sub(rhs),
        BinaryOperator::Mul => lhs.wrapping_mul(rhs),
        BinaryOperator::UDiv | BinaryOperator::SDiv => lhs.wrapping_div(rhs),
        BinaryOperator::URem | BinaryOperator::SRem => {
            let remainder = lhs.wrapping_rem(rhs);
            if remainder != 0 && (remainder < 0) != (rhs < 0) {
                remainder.wrapping_add(rhs)
            } else {
                remainder
            }
        }
        BinaryOperator::Shl if overshift => 0,
        BinaryOperator::LShr if overshift => 0,
        BinaryOperator::AShr if overshift => lhs >> 63,
        BinaryOperator::Shl => lhs.wrapping_shl(shift),
        BinaryOperator::LShr => ((lhs as u64) >> shift) as i64,
        BinaryOperator::AShr => lhs >> shift,
        BinaryOperator::And => lhs & rhs,
        BinaryOperator::Or => lhs | rhs,
        BinaryOperator::Xor => lhs ^ rhs,
        BinaryOperator::Unknown(code) => {
            return Err(ExecutionError::NotSupported(format!("binary opcode {}", code)))
        }
    })
}
