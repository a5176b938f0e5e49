mod utils;

use concolic::{
    engine::{ConcreteExecutor, ExecutionError, ExecutionOptions},
    instrument::{instrument_module, Hook, InstrumentOptions, SequentialNumbering},
    ir::{BinaryOperator, FunctionBuilder, Module, Operand, Predicate},
    path_exploration::{Exploration, StrategyKind, VisitedSet},
    runtime::{Runtime, RuntimeError},
};
use std::collections::BTreeSet;
use utils::{branching_module, find_input, init, is_satisfiable, word};
use z3_solver::{ast::Ast, Config, Context};

fn instrumented(mut module: Module) -> Module {
    instrument_module(
        &mut module,
        &mut SequentialNumbering::new(),
        &InstrumentOptions::default(),
    );
    module
}

#[test]
fn concrete_run_records_the_symbolic_path() {
    init();

    let module = instrumented(branching_module());
    let ctx = Context::new(&Config::new());
    let mut runtime = Runtime::new(&ctx);

    let result = ConcreteExecutor::new(&module, &mut runtime, &ExecutionOptions::default(), vec![0])
        .run()
        .unwrap();

    let session = runtime.session().unwrap();
    let input = &session.inputs()[0].symbol;

    assert_eq!(result, Some(2));
    assert_eq!(session.trace().len(), 2);
    assert!(session.trace()[0].taken);
    assert!(!session.trace()[1].taken);
    assert!(session.stack().is_empty());

    let path = session.path_condition();
    let mut with_three = path.clone();
    with_three.push(input._eq(&word(&ctx, 3)));
    let mut with_minus_seven = path.clone();
    with_minus_seven.push(input._eq(&word(&ctx, -7)));

    assert!(!is_satisfiable(&ctx, &with_three));
    assert!(is_satisfiable(&ctx, &with_minus_seven));
}

#[test]
fn large_inputs_take_a_single_branch() {
    let module = instrumented(branching_module());
    let ctx = Context::new(&Config::new());
    let mut runtime = Runtime::new(&ctx);

    let result = ConcreteExecutor::new(&module, &mut runtime, &ExecutionOptions::default(), vec![5])
        .run()
        .unwrap();

    assert_eq!(result, Some(0));
    assert_eq!(runtime.session().unwrap().trace().len(), 1);
}

#[test]
fn depth_first_exploration_reaches_every_return() {
    init();

    let module = instrumented(branching_module());
    let ctx = Context::new(&Config::new());
    let strategy = StrategyKind::DepthFirst.strategy();
    let mut visited = VisitedSet::new();
    let mut results = BTreeSet::new();
    let mut inputs = vec![0];

    for _ in 0..10 {
        let input = *inputs.last().unwrap();
        let mut runtime = Runtime::new(&ctx);
        let result = ConcreteExecutor::new(&module, &mut runtime, &ExecutionOptions::default(), vec![input])
            .run()
            .unwrap();

        results.insert(result.unwrap());

        let session = runtime.into_session().unwrap();
        let symbol = session.inputs()[0].symbol.clone();
        let mut conditions = session.path_condition();

        match strategy.next_path(&mut conditions, &mut visited) {
            Exploration::Flipped { .. } => {}
            Exploration::Empty | Exploration::Exhausted => break,
        }

        match find_input(&ctx, &symbol, &conditions, -32..32) {
            Some(next) => inputs.push(next),
            None => break,
        }
    }

    assert_eq!(&inputs[..3], &[0, 3, 5]);
    assert_eq!(results.into_iter().collect::<Vec<_>>(), vec![0, 1, 2]);
}

#[test]
fn module_functions_are_called_with_arguments() {
    let mut helper = FunctionBuilder::new("inc");
    let a = helper.param();
    let sum = helper.binary(BinaryOperator::Add, a, Operand::Const(1));
    helper.ret(Some(sum));

    let mut main = FunctionBuilder::new("main");
    let value = main.call("inc", vec![Operand::Const(41)]);
    main.ret(Some(value));

    let mut module = Module::new();
    module.add_function(main.finalize());
    module.add_function(helper.finalize());
    let module = instrumented(module);

    let ctx = Context::new(&Config::new());
    let mut runtime = Runtime::new(&ctx);
    let result = ConcreteExecutor::new(&module, &mut runtime, &ExecutionOptions::default(), vec![])
        .run()
        .unwrap();

    assert_eq!(result, Some(42));
}

#[test]
fn calls_to_unknown_functions_fail() {
    let mut main = FunctionBuilder::new("main");
    main.call_void("printf", vec![]);
    main.ret(None);

    let mut module = Module::new();
    module.add_function(main.finalize());

    let ctx = Context::new(&Config::new());
    let mut runtime = Runtime::new(&ctx);
    let err = ConcreteExecutor::new(&module, &mut runtime, &ExecutionOptions::default(), vec![])
        .run()
        .unwrap_err();

    assert!(matches!(err, ExecutionError::UnknownFunction(name) if name == "printf"));

    let options = ExecutionOptions {
        entry_function: "start".to_string(),
        ..Default::default()
    };
    let err = ConcreteExecutor::new(&module, &mut runtime, &options, vec![])
        .run()
        .unwrap_err();

    assert!(matches!(err, ExecutionError::UnknownFunction(name) if name == "start"));
}

#[test]
fn hooks_without_init_surface_as_runtime_errors() {
    let mut main = FunctionBuilder::new("main");
    let x = main.alloca();
    main.call_void(Hook::Input.name(), vec![x]);
    main.ret(None);

    let mut module = Module::new();
    module.add_function(main.finalize());

    let ctx = Context::new(&Config::new());
    let mut runtime = Runtime::new(&ctx);
    let err = ConcreteExecutor::new(&module, &mut runtime, &ExecutionOptions::default(), vec![7])
        .run()
        .unwrap_err();

    assert!(matches!(
        err,
        ExecutionError::Runtime(RuntimeError::NotInitialized(Hook::Input))
    ));
}

#[test]
fn execution_depth_is_bounded() {
    let mut main = FunctionBuilder::new("main");
    let spin = main.new_block();
    main.br(spin);
    main.switch_to(spin);
    main.br(spin);

    let mut module = Module::new();
    module.add_function(main.finalize());

    let options = ExecutionOptions {
        max_execution_depth: 50,
        ..Default::default()
    };

    let ctx = Context::new(&Config::new());
    let mut runtime = Runtime::new(&ctx);
    let mut executor = ConcreteExecutor::new(&module, &mut runtime, &options, vec![]);

    assert!(matches!(
        executor.run(),
        Err(ExecutionError::ExecutionDepthReached(50))
    ));
    assert_eq!(executor.execution_depth(), 51);
}

#[test]
fn unsigned_comparisons_agree_with_the_recorded_condition() {
    let mut main = FunctionBuilder::new("main");
    let x = main.alloca();
    main.call_void(Hook::Input.name(), vec![x]);
    let value = main.load(x);
    let below = main.icmp(Predicate::IcmpUlt, value, Operand::Const(10));
    let then_block = main.new_block();
    let else_block = main.new_block();
    main.cond_br(below, then_block, else_block);
    main.switch_to(then_block);
    main.ret(Some(Operand::Const(1)));
    main.switch_to(else_block);
    main.ret(Some(Operand::Const(0)));

    let mut module = Module::new();
    module.add_function(main.finalize());
    let module = instrumented(module);

    let ctx = Context::new(&Config::new());
    let mut runtime = Runtime::new(&ctx);
    let result = ConcreteExecutor::new(&module, &mut runtime, &ExecutionOptions::default(), vec![-1])
        .run()
        .unwrap();

    let session = runtime.session().unwrap();
    let input = &session.inputs()[0].symbol;
    let mut path = session.path_condition();
    path.push(input._eq(&word(&ctx, -1)));

    assert_eq!(result, Some(1));
    assert!(session.trace()[0].taken);
    assert!(is_satisfiable(&ctx, &path));
}

#[test]
fn register_ids_must_stay_below_the_stack() {
    let module = instrumented(branching_module());
    let options = ExecutionOptions {
        stack_base: 4,
        ..Default::default()
    };

    let ctx = Context::new(&Config::new());
    let mut runtime = Runtime::new(&ctx);
    let err = ConcreteExecutor::new(&module, &mut runtime, &options, vec![0])
        .run()
        .unwrap_err();

    assert!(matches!(err, ExecutionError::RegisterCollision(4, 4)));
}
