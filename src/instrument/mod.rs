//! Static instrumentation of IR functions.
//!
//! Every semantically relevant instruction gets a call into the runtime that
//! mirrors it. Operands travel over the runtime's operand stack: value hooks
//! push, the hook of the consuming instruction pops. The placement below is
//! what makes the pops line up, so it must stay in sync with the runtime.

use crate::ir::{Function, Instruction, Module, Operand, Type};
use log::{debug, trace};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

pub mod numbering;

pub use self::numbering::{Numbered, NumberingOracle, SequentialNumbering};

pub mod defaults {
    pub const ENTRY_FUNCTION: &str = "main";
}

/// Runtime entry points together with their ABI.
#[derive(Clone, Copy, Debug, Display, EnumIter, EnumString, Eq, Hash, IntoStaticStr, PartialEq)]
pub enum Hook {
    #[strum(serialize = "__DSE_Init__")]
    Init,
    #[strum(serialize = "__DSE_Alloca__")]
    Alloca,
    #[strum(serialize = "__DSE_Store__")]
    Store,
    #[strum(serialize = "__DSE_Load__")]
    Load,
    #[strum(serialize = "__DSE_Const__")]
    Const,
    #[strum(serialize = "__DSE_Register__")]
    Register,
    #[strum(serialize = "__DSE_ICmp__")]
    ICmp,
    #[strum(serialize = "__DSE_Branch__")]
    Branch,
    #[strum(serialize = "__DSE_BinOp__")]
    BinOp,
    /// Called by the target program itself to mark a memory slot as input.
    #[strum(serialize = "__DSE_Input__")]
    Input,
}

impl Hook {
    pub fn name(&self) -> &'static str {
        self.into()
    }

    pub fn from_name(name: &str) -> Option<Self> {
        name.parse().ok()
    }

    pub fn params(&self) -> &'static [Type] {
        match self {
            Hook::Init => &[],
            Hook::Alloca => &[Type::Int32, Type::Ptr],
            Hook::Store => &[Type::Ptr],
            Hook::Load => &[Type::Int32, Type::Ptr],
            Hook::Const => &[Type::Int32],
            Hook::Register => &[Type::Int32],
            Hook::ICmp => &[Type::Int32, Type::Int32],
            Hook::Branch => &[Type::Int32, Type::Int32, Type::Int1],
            Hook::BinOp => &[Type::Int32, Type::Int32],
            Hook::Input => &[Type::Ptr],
        }
    }
}

#[derive(Clone, Debug)]
pub struct InstrumentOptions {
    /// Function that receives the call to [`Hook::Init`].
    pub entry_function: String,
}

impl Default for InstrumentOptions {
    fn default() -> Self {
        Self {
            entry_function: defaults::ENTRY_FUNCTION.to_string(),
        }
    }
}

/// Declares all hooks in `module`. Existing declarations are kept, so this
/// can be requested any number of times.
pub fn declare_hooks(module: &mut Module) {
    for hook in Hook::iter() {
        module.get_or_insert_function(hook.name(), hook.params());
    }
}

/// Instruments every function of `module` and returns the number of
/// inserted hook calls. Must run once per module.
pub fn instrument_module<N>(module: &mut Module, oracle: &mut N, options: &InstrumentOptions) -> usize
where
    N: NumberingOracle,
{
    time_info!("instrumented module", {
        let mut inserted = 0;
        for idx in 0..module.functions.len() {
            declare_hooks(module);
            inserted += instrument_function(&mut module.functions[idx], oracle, options);
        }
        inserted
    })
}

/// Rewrites one function in place and returns the number of inserted calls.
pub fn instrument_function<N>(function: &mut Function, oracle: &mut N, options: &InstrumentOptions) -> usize
where
    N: NumberingOracle,
{
    let name = function.name.clone();
    let mut inserted = 0;

    if name == options.entry_function {
        if let Some(entry) = function.blocks.first_mut() {
            let position = entry.first_non_debug().unwrap_or(entry.instructions.len());
            entry.instructions.insert(position, hook_call(Hook::Init, vec![]));
            inserted += 1;
            debug!("inserted {} into entry block of {}", Hook::Init, name);
        }
    }

    for block in function.blocks.iter_mut() {
        let original = std::mem::take(&mut block.instructions);
        let mut rewritten = Vec::with_capacity(original.len() * 3);

        for instruction in original.into_iter() {
            let mut emitter = Emitter::new(&name, oracle);

            emitter.visit(&instruction, block.id);
            inserted += emitter.len();

            if let Some(before) = emitter.before.take() {
                rewritten.push(before);
            }
            rewritten.push(instruction);

            // Each call is placed directly behind the instrumented
            // instruction, so later calls end up in front of earlier ones.
            rewritten.extend(emitter.after.into_iter().rev());
        }

        block.instructions = rewritten;
    }

    trace!("instrumented function:\n{}", function);
    debug!("inserted {} hook calls into {}", inserted, name);

    inserted
}

//
// Private Implementation
//

fn hook_call(hook: Hook, args: Vec<Operand>) -> Instruction {
    Instruction::Call {
        result: None,
        callee: hook.name().to_string(),
        args,
    }
}

fn id_operand(id: u32) -> Operand {
    Operand::Const(id as i64)
}

struct Emitter<'a, N: NumberingOracle> {
    function: &'a str,
    oracle: &'a mut N,
    before: Option<Instruction>,
    after: Vec<Instruction>,
}

impl<'a, N: NumberingOracle> Emitter<'a, N> {
    fn new(function: &'a str, oracle: &'a mut N) -> Self {
        Self {
            function,
            oracle,
            before: None,
            after: Vec::new(),
        }
    }

    fn len(&self) -> usize {
        self.after.len() + self.before.iter().count()
    }

    fn register(&mut self, value: u32) -> u32 {
        self.oracle.assign(self.function, Numbered::Register(value))
    }

    #[rustfmt::skip]
    fn visit(&mut self, instruction: &Instruction, block: u32) {
        match instruction {
            Instruction::Alloca { result } => {
                let id = self.register(*result);
                self.emit(Hook::Alloca, vec![id_operand(id), Operand::Value(*result)]);
            }
            Instruction::Store { value, ptr } => {
                self.emit(Hook::Store, vec![*ptr]);
                self.emit_value(value);
            }
            Instruction::Load { result, ptr } => {
                let id = self.register(*result);
                self.emit(Hook::Load, vec![id_operand(id), *ptr]);
            }
            Instruction::ICmp { result, predicate, lhs, rhs } => {
                let id = self.register(*result);
                self.emit(Hook::ICmp, vec![id_operand(id), Operand::Const(predicate.code() as i64)]);
                self.emit_value(rhs);
                self.emit_value(lhs);
            }
            Instruction::Binary { result, op, lhs, rhs } => {
                let id = self.register(*result);
                self.emit(Hook::BinOp, vec![id_operand(id), Operand::Const(op.code() as i64)]);
                self.emit_value(rhs);
                self.emit_value(lhs);
            }
            Instruction::CondBr { cond: Operand::Value(cond), .. } => {
                let branch = self.oracle.assign(self.function, Numbered::Branch(block));
                let register = self.register(*cond);
                self.before = Some(hook_call(
                    Hook::Branch,
                    vec![id_operand(branch), id_operand(register), Operand::Value(*cond)],
                ));
            }
            Instruction::CondBr { cond: Operand::Const(_), .. } => {
                trace!("skipping branch on a constant condition in bb{}", block);
            }
            Instruction::Br { .. }
            | Instruction::Call { .. }
            | Instruction::Ret { .. }
            | Instruction::Debug(_) => {}
        }
    }

    fn emit(&mut self, hook: Hook, args: Vec<Operand>) {
        self.after.push(hook_call(hook, args));
    }

    fn emit_value(&mut self, value: &Operand) {
        match value {
            // the hook ABI carries 32-bit literals
            Operand::Const(imm) => self.emit(Hook::Const, vec![Operand::Const(*imm as i32 as i64)]),
            Operand::Value(id) => {
                let register = self.register(*id);
                self.emit(Hook::Register, vec![id_operand(register)]);
            }
        }
    }
}
