mod utils;

use concolic::path_exploration::{
    BreadthFirst, DepthFirst, Exploration, ExplorationStrategy, StrategyKind, VisitedSet,
};
use std::str::FromStr;
use utils::{init, is_valid, word};
use z3_solver::{
    ast::{Ast, Bool, BV},
    Config, Context,
};

fn equivalent<'ctx>(ctx: &'ctx Context, a: &Bool<'ctx>, b: &Bool<'ctx>) -> bool {
    is_valid(ctx, &a._eq(b))
}

/// `x < 10` followed by `x == 3`, the path of input 3 through the sample
/// program.
fn path(ctx: &Context) -> (Bool, Bool) {
    let x = BV::new_const(ctx, "X0", 64);
    (x.bvslt(&word(ctx, 10)), x._eq(&word(ctx, 3)))
}

#[test]
fn empty_path_is_left_alone() {
    let ctx = Context::new(&Config::new());
    let mut visited = VisitedSet::new();

    for kind in &[StrategyKind::DepthFirst, StrategyKind::BreadthFirst] {
        let mut conditions: Vec<Bool> = Vec::new();

        assert_eq!(
            kind.strategy().next_path(&mut conditions, &mut visited),
            Exploration::Empty
        );
        assert!(conditions.is_empty());
    }

    assert!(visited.is_empty());
}

#[test]
fn depth_first_flips_the_tail() {
    init();

    let ctx = Context::new(&Config::new());
    let (small, three) = path(&ctx);
    let mut visited = VisitedSet::new();
    let mut conditions = vec![small.clone(), three.clone()];

    let outcome = DepthFirst.next_path(&mut conditions, &mut visited);

    assert_eq!(outcome, Exploration::Flipped { index: 1 });
    assert_eq!(conditions.len(), 2);
    assert!(equivalent(&ctx, &conditions[0], &small));
    assert!(equivalent(&ctx, &conditions[1], &three.not()));
    assert!(visited.contains(&three));
    assert!(visited.contains(&three.not()));
    assert!(!visited.contains(&small));
}

#[test]
fn depth_first_backtracks_over_visited_outcomes() {
    let ctx = Context::new(&Config::new());
    let (small, three) = path(&ctx);
    let mut visited = VisitedSet::new();

    visited.flip(&three);

    let mut conditions = vec![small.clone(), three];
    let outcome = DepthFirst.next_path(&mut conditions, &mut visited);

    assert_eq!(outcome, Exploration::Flipped { index: 0 });
    assert_eq!(conditions.len(), 1);
    assert!(equivalent(&ctx, &conditions[0], &small.not()));
}

#[test]
fn depth_first_reports_an_exhausted_path() {
    let ctx = Context::new(&Config::new());
    let (small, three) = path(&ctx);
    let mut visited = VisitedSet::new();

    visited.flip(&small);
    visited.flip(&three);
    let before = visited.len();

    let mut conditions = vec![small, three];
    let outcome = DepthFirst.next_path(&mut conditions, &mut visited);

    assert_eq!(outcome, Exploration::Exhausted);
    assert!(conditions.is_empty());
    assert_eq!(visited.len(), before);
}

#[test]
fn breadth_first_rotates_a_novel_head() {
    let ctx = Context::new(&Config::new());
    let (small, three) = path(&ctx);
    let mut visited = VisitedSet::new();
    let mut conditions = vec![small.clone(), three.clone()];

    let outcome = BreadthFirst.next_path(&mut conditions, &mut visited);

    assert_eq!(outcome, Exploration::Flipped { index: 1 });
    assert!(equivalent(&ctx, &conditions[0], &three));
    assert!(equivalent(&ctx, &conditions[1], &small.not()));
}

#[test]
fn breadth_first_moves_visited_heads_to_the_tail() {
    let ctx = Context::new(&Config::new());
    let (small, three) = path(&ctx);
    let mut visited = VisitedSet::new();

    visited.flip(&small);

    let mut conditions = vec![small.clone(), three.clone()];
    let outcome = BreadthFirst.next_path(&mut conditions, &mut visited);

    assert_eq!(outcome, Exploration::Flipped { index: 1 });
    assert!(equivalent(&ctx, &conditions[0], &small));
    assert!(equivalent(&ctx, &conditions[1], &three.not()));
}

#[test]
fn breadth_first_stops_after_one_round() {
    let ctx = Context::new(&Config::new());
    let (small, three) = path(&ctx);
    let mut visited = VisitedSet::new();

    visited.flip(&small);
    visited.flip(&three);

    let mut conditions = vec![small.clone(), three.clone()];
    let outcome = BreadthFirst.next_path(&mut conditions, &mut visited);

    assert_eq!(outcome, Exploration::Exhausted);
    assert_eq!(conditions.len(), 2);
    assert!(equivalent(&ctx, &conditions[0], &small));
    assert!(equivalent(&ctx, &conditions[1], &three));
}

#[test]
fn no_outcome_is_proposed_twice() {
    let ctx = Context::new(&Config::new());
    let (small, three) = path(&ctx);

    for name in &["dfs", "bfs"] {
        let strategy = StrategyKind::from_str(name).unwrap().strategy();
        let mut visited = VisitedSet::new();
        let mut proposals: Vec<Bool> = Vec::new();

        loop {
            let mut conditions = vec![small.clone(), three.clone()];

            match strategy.next_path(&mut conditions, &mut visited) {
                Exploration::Flipped { index } => proposals.push(conditions[index].clone()),
                Exploration::Exhausted => break,
                Exploration::Empty => unreachable!(),
            }

            assert!(proposals.len() <= 2, "{} keeps proposing outcomes", name);
        }

        assert_eq!(proposals.len(), 2, "{}", name);
        assert!(!equivalent(&ctx, &proposals[0], &proposals[1]));
    }
}
