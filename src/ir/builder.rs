use crate::ir::{
    BasicBlock, BinaryOperator, BlockId, Function, Instruction, Operand, Predicate, ValueId,
};

//
// Public Interface
//

/// Incrementally constructs a [`Function`], handing out fresh value ids and
/// appending instructions to the block selected with [`switch_to`].
///
/// [`switch_to`]: FunctionBuilder::switch_to
pub struct FunctionBuilder {
    name: String,
    params: Vec<ValueId>,
    blocks: Vec<BasicBlock>,
    current: usize,
    next_value: ValueId,
}

impl FunctionBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            params: Vec::new(),
            blocks: vec![BasicBlock {
                id: 0,
                instructions: Vec::new(),
            }],
            current: 0,
            next_value: 0,
        }
    }

    pub fn param(&mut self) -> Operand {
        let id = self.fresh();
        self.params.push(id);
        Operand::Value(id)
    }

    pub fn new_block(&mut self) -> BlockId {
        let id = self.blocks.len() as BlockId;
        self.blocks.push(BasicBlock {
            id,
            instructions: Vec::new(),
        });
        id
    }

    pub fn switch_to(&mut self, block: BlockId) {
        self.current = self
            .blocks
            .iter()
            .position(|b| b.id == block)
            .unwrap_or_else(|| panic!("block bb{} was never created", block));
    }

    pub fn alloca(&mut self) -> Operand {
        let result = self.fresh();
        self.push(Instruction::Alloca { result });
        Operand::Value(result)
    }

    pub fn store(&mut self, value: Operand, ptr: Operand) {
        self.push(Instruction::Store { value, ptr });
    }

    pub fn load(&mut self, ptr: Operand) -> Operand {
        let result = self.fresh();
        self.push(Instruction::Load { result, ptr });
        Operand::Value(result)
    }

    pub fn icmp(&mut self, predicate: Predicate, lhs: Operand, rhs: Operand) -> Operand {
        let result = self.fresh();
        self.push(Instruction::ICmp {
            result,
            predicate,
            lhs,
            rhs,
        });
        Operand::Value(result)
    }

    pub fn binary(&mut self, op: BinaryOperator, lhs: Operand, rhs: Operand) -> Operand {
        let result = self.fresh();
        self.push(Instruction::Binary {
            result,
            op,
            lhs,
            rhs,
        });
        Operand::Value(result)
    }

    pub fn br(&mut self, target: BlockId) {
        self.push(Instruction::Br { target });
    }

    pub fn cond_br(&mut self, cond: Operand, then_block: BlockId, else_block: BlockId) {
        self.push(Instruction::CondBr {
            cond,
            then_block,
            else_block,
        });
    }

    pub fn call(&mut self, callee: &str, args: Vec<Operand>) -> Operand {
        let result = self.fresh();
        self.push(Instruction::Call {
            result: Some(result),
            callee: callee.to_string(),
            args,
        });
        Operand::Value(result)
    }

    pub fn call_void(&mut self, callee: &str, args: Vec<Operand>) {
        self.push(Instruction::Call {
            result: None,
            callee: callee.to_string(),
            args,
        });
    }

    pub fn ret(&mut self, value: Option<Operand>) {
        self.push(Instruction::Ret { value });
    }

    pub fn debug(&mut self, note: &str) {
        self.push(Instruction::Debug(note.to_string()));
    }

    pub fn finalize(self) -> Function {
        Function {
            name: self.name,
            params: self.params,
            blocks: self.blocks,
        }
    }
}

//
// Private Implementation
//

impl FunctionBuilder {
    fn fresh(&mut self) -> ValueId {
        let id = self.next_value;
        self.next_value += 1;
        id
    }

    fn push(&mut self, instruction: Instruction) {
        self.blocks[self.current].instructions.push(instruction);
    }
}
