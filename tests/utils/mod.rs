#![allow(dead_code)]

use concolic::{
    instrument::Hook,
    ir::{BinaryOperator, FunctionBuilder, Module, Operand, Predicate},
};
use std::sync::Once;
use z3_solver::{
    ast::{Ast, Bool, Dynamic, BV},
    Context, SatResult, Solver,
};

static INIT_LOGGER: Once = Once::new();

pub fn init() {
    INIT_LOGGER.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

pub fn is_valid<'ctx>(ctx: &'ctx Context, condition: &Bool<'ctx>) -> bool {
    let solver = Solver::new(ctx);
    solver.assert(&condition.not());
    solver.check() == SatResult::Unsat
}

pub fn is_satisfiable<'ctx>(ctx: &'ctx Context, conditions: &[Bool<'ctx>]) -> bool {
    let solver = Solver::new(ctx);
    conditions.iter().for_each(|c| solver.assert(c));
    solver.check() == SatResult::Sat
}

pub fn concrete_u64(value: &Dynamic) -> Option<u64> {
    value.as_bv().and_then(|bv| bv.simplify().as_u64())
}

pub fn concrete_bool(value: &Dynamic) -> Option<bool> {
    value.as_bool().and_then(|b| b.simplify().as_bool())
}

pub fn word<'ctx>(ctx: &'ctx Context, value: i64) -> BV<'ctx> {
    BV::from_i64(ctx, value, 64)
}

/// Poor man's input generator: the first candidate in `range` under which
/// all `conditions` hold for `symbol`.
pub fn find_input<'ctx>(
    ctx: &'ctx Context,
    symbol: &BV<'ctx>,
    conditions: &[Bool<'ctx>],
    range: std::ops::Range<i64>,
) -> Option<i64> {
    range.into_iter().find(|candidate| {
        let mut constraints = conditions.to_vec();
        constraints.push(symbol._eq(&word(ctx, *candidate)));
        is_satisfiable(ctx, &constraints)
    })
}

/// ```c
/// int main() {
///   int x; input(&x);
///   int y = x * 2;
///   if (y < 10) {
///     if (x == 3) return 1;
///     return 2;
///   }
///   return 0;
/// }
/// ```
pub fn branching_module() -> Module {
    let mut f = FunctionBuilder::new("main");

    let x = f.alloca();
    let y = f.alloca();
    f.call_void(Hook::Input.name(), vec![x]);

    let x0 = f.load(x);
    let doubled = f.binary(BinaryOperator::Mul, x0, Operand::Const(2));
    f.store(doubled, y);
    let y0 = f.load(y);
    let small = f.icmp(Predicate::IcmpSlt, y0, Operand::Const(10));

    let check = f.new_block();
    let large = f.new_block();
    let hit = f.new_block();
    let miss = f.new_block();
    f.cond_br(small, check, large);

    f.switch_to(check);
    let x1 = f.load(x);
    let three = f.icmp(Predicate::IcmpEq, x1, Operand::Const(3));
    f.cond_br(three, hit, miss);

    f.switch_to(hit);
    f.ret(Some(Operand::Const(1)));
    f.switch_to(miss);
    f.ret(Some(Operand::Const(2)));
    f.switch_to(large);
    f.ret(Some(Operand::Const(0)));

    let mut module = Module::new();
    module.add_function(f.finalize());
    module
}
