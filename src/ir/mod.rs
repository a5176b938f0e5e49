use std::fmt;

//
// Public Interface
//

pub mod builder;
pub mod opcode;

pub use self::builder::FunctionBuilder;
pub use self::opcode::{BinaryOperator, Predicate, Relation};

pub type ValueId = u32;
pub type BlockId = u32;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Operand {
    Const(i64),
    Value(ValueId),
}

/// Parameter types of external declarations; only what the hook ABI needs.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Type {
    Int1,
    Int32,
    Ptr,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Instruction {
    Alloca {
        result: ValueId,
    },
    Store {
        value: Operand,
        ptr: Operand,
    },
    Load {
        result: ValueId,
        ptr: Operand,
    },
    ICmp {
        result: ValueId,
        predicate: Predicate,
        lhs: Operand,
        rhs: Operand,
    },
    Binary {
        result: ValueId,
        op: BinaryOperator,
        lhs: Operand,
        rhs: Operand,
    },
    Br {
        target: BlockId,
    },
    CondBr {
        cond: Operand,
        then_block: BlockId,
        else_block: BlockId,
    },
    Call {
        result: Option<ValueId>,
        callee: String,
        args: Vec<Operand>,
    },
    Ret {
        value: Option<Operand>,
    },
    Debug(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct BasicBlock {
    pub id: BlockId,
    pub instructions: Vec<Instruction>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Function {
    pub name: String,
    pub params: Vec<ValueId>,
    pub blocks: Vec<BasicBlock>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Declaration {
    pub name: String,
    pub params: Vec<Type>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Module {
    pub functions: Vec<Function>,
    pub declarations: Vec<Declaration>,
}

impl Module {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_function(&mut self, function: Function) {
        self.functions.push(function);
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn declaration(&self, name: &str) -> Option<&Declaration> {
        self.declarations.iter().find(|d| d.name == name)
    }

    /// Declares an external function unless a declaration with the same name
    /// exists already, in which case the existing one is returned untouched.
    pub fn get_or_insert_function(&mut self, name: &str, params: &[Type]) -> &Declaration {
        match self.declarations.iter().position(|d| d.name == name) {
            Some(idx) => &self.declarations[idx],
            None => {
                self.declarations.push(Declaration {
                    name: name.to_string(),
                    params: params.to_vec(),
                });
                &self.declarations[self.declarations.len() - 1]
            }
        }
    }
}

impl Function {
    pub fn entry_block(&self) -> Option<&BasicBlock> {
        self.blocks.first()
    }

    pub fn block(&self, id: BlockId) -> Option<&BasicBlock> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.blocks.iter().flat_map(|b| b.instructions.iter())
    }
}

impl BasicBlock {
    pub fn first_non_debug(&self) -> Option<usize> {
        self.instructions.iter().position(|i| !i.is_debug())
    }

    pub fn terminator(&self) -> Option<&Instruction> {
        self.instructions.last().filter(|i| i.is_terminator())
    }
}

impl Instruction {
    pub fn result(&self) -> Option<ValueId> {
        match *self {
            Instruction::Alloca { result }
            | Instruction::Load { result, .. }
            | Instruction::ICmp { result, .. }
            | Instruction::Binary { result, .. } => Some(result),
            Instruction::Call { result, .. } => result,
            _ => None,
        }
    }

    pub fn is_debug(&self) -> bool {
        matches!(self, Instruction::Debug(_))
    }

    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            Instruction::Br { .. } | Instruction::CondBr { .. } | Instruction::Ret { .. }
        )
    }

    pub fn is_call_to(&self, name: &str) -> bool {
        matches!(self, Instruction::Call { callee, .. } if callee == name)
    }
}

//
// Private Implementation
//

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Const(imm) => write!(f, "{}", imm),
            Operand::Value(id) => write!(f, "%{}", id),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int1 => write!(f, "i1"),
            Type::Int32 => write!(f, "i32"),
            Type::Ptr => write!(f, "ptr"),
        }
    }
}

impl fmt::Display for Instruction {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Alloca { result } =>
                write!(f, "%{} = alloca", result),
            Instruction::Store { value, ptr } =>
                write!(f, "store {}, {}", value, ptr),
            Instruction::Load { result, ptr } =>
                write!(f, "%{} = load {}", result, ptr),
            Instruction::ICmp { result, predicate, lhs, rhs } => {
                let kind = if predicate.is_float() { "fcmp" } else { "icmp" };
                write!(f, "%{} = {} {} {}, {}", result, kind, predicate, lhs, rhs)
            }
            Instruction::Binary { result, op, lhs, rhs } =>
                write!(f, "%{} = {} {}, {}", result, op, lhs, rhs),
            Instruction::Br { target } =>
                write!(f, "br bb{}", target),
            Instruction::CondBr { cond, then_block, else_block } =>
                write!(f, "br {}, bb{}, bb{}", cond, then_block, else_block),
            Instruction::Call { result, callee, args } => {
                if let Some(result) = result {
                    write!(f, "%{} = ", result)?;
                }
                let args = args.iter().map(|a| a.to_string()).collect::<Vec<_>>();
                write!(f, "call {}({})", callee, args.join(", "))
            }
            Instruction::Ret { value: Some(value) } =>
                write!(f, "ret {}", value),
            Instruction::Ret { value: None } =>
                write!(f, "ret void"),
            Instruction::Debug(note) =>
                write!(f, "; dbg {}", note),
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = self
            .params
            .iter()
            .map(|p| format!("%{}", p))
            .collect::<Vec<_>>();
        writeln!(f, "define {}({}) {{", self.name, params.join(", "))?;
        for block in self.blocks.iter() {
            writeln!(f, "bb{}:", block.id)?;
            for instruction in block.instructions.iter() {
                writeln!(f, "  {}", instruction)?;
            }
        }
        writeln!(f, "}}")
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for declaration in self.declarations.iter() {
            let params = declaration
                .params
                .iter()
                .map(|p| p.to_string())
                .collect::<Vec<_>>();
            writeln!(f, "declare void {}({})", declaration.name, params.join(", "))?;
        }
        for function in self.functions.iter() {
            writeln!(f)?;
            write!(f, "{}", function)?;
        }
        Ok(())
    }
}
