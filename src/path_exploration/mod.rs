mod breadth_first;
mod depth_first;

pub use self::{breadth_first::*, depth_first::*};

use log::trace;
use std::collections::HashSet;
use strum::{EnumString, EnumVariantNames, IntoStaticStr};
use z3_solver::ast::{Ast, Bool};

/// Decides which branch outcome of a finished run to pursue next.
///
/// `conditions` is the path condition of one run, oldest first. A call is a
/// no-op on an empty sequence and otherwise mutates it exactly once so that
/// the flipped outcome is never proposed twice for the same `visited` set.
pub trait ExplorationStrategy {
    fn next_path<'ctx>(
        &self,
        conditions: &mut Vec<Bool<'ctx>>,
        visited: &mut VisitedSet<'ctx>,
    ) -> Exploration;
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Exploration {
    /// Nothing to explore, the sequence was empty.
    Empty,
    /// The condition now at `index` is a negated, previously unseen outcome.
    Flipped { index: usize },
    /// Every outcome on this path was attempted before.
    Exhausted,
}

#[derive(Clone, Copy, Debug, EnumString, EnumVariantNames, IntoStaticStr, Eq, PartialEq)]
pub enum StrategyKind {
    #[strum(serialize = "dfs")]
    DepthFirst,
    #[strum(serialize = "bfs")]
    BreadthFirst,
}

impl StrategyKind {
    pub fn strategy(&self) -> Box<dyn ExplorationStrategy> {
        match self {
            StrategyKind::DepthFirst => Box::new(DepthFirst),
            StrategyKind::BreadthFirst => Box::new(BreadthFirst),
        }
    }
}

/// Branch outcomes attempted so far in an exploration session.
///
/// Expressions are simplified before insertion and keyed by z3's structural
/// hash. Semantically equal but differently shaped expressions count as
/// different outcomes.
#[derive(Debug, Default)]
pub struct VisitedSet<'ctx> {
    outcomes: HashSet<Bool<'ctx>>,
}

impl<'ctx> VisitedSet<'ctx> {
    pub fn new() -> Self {
        Self {
            outcomes: HashSet::new(),
        }
    }

    pub fn contains(&self, condition: &Bool<'ctx>) -> bool {
        self.outcomes.contains(&condition.simplify())
    }

    pub fn insert(&mut self, condition: &Bool<'ctx>) -> bool {
        self.outcomes.insert(condition.simplify())
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Returns the simplified negation of `condition` unless it was seen
    /// before. On success both polarities are marked as visited.
    pub fn flip(&mut self, condition: &Bool<'ctx>) -> Option<Bool<'ctx>> {
        let original = condition.simplify();
        let negation = condition.not().simplify();

        if self.outcomes.contains(&negation) {
            trace!("already visited: {}", negation);
            return None;
        }

        self.outcomes.insert(original);
        self.outcomes.insert(negation.clone());

        Some(negation)
    }
}
