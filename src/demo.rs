use concolic::{
    instrument::Hook,
    ir::{BinaryOperator, FunctionBuilder, Module, Operand, Predicate},
};

/// Builds the program
///
/// ```c
/// int main() {
///   int x;
///   input(&x);
///   int y = x * 2;
///   if (y < 10) {
///     if (x == 3) return 1;
///     return 2;
///   }
///   return 0;
/// }
/// ```
pub fn sample_module() -> Module {
    let mut f = FunctionBuilder::new("main");

    f.debug("x");
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
