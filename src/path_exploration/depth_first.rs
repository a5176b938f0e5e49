use super::{Exploration, ExplorationStrategy, VisitedSet};
use log::{debug, info, trace};
use z3_solver::ast::Bool;

/// Flips the most recent branch outcome that was not attempted yet.
///
/// Conditions at the tail whose negation was visited before are dropped, so
/// the search backtracks towards the root of the execution tree.
#[derive(Clone, Copy, Debug, Default)]
pub struct DepthFirst;

impl ExplorationStrategy for DepthFirst {
    fn next_path<'ctx>(
        &self,
        conditions: &mut Vec<Bool<'ctx>>,
        visited: &mut VisitedSet<'ctx>,
    ) -> Exploration {
        if conditions.is_empty() {
            return Exploration::Empty;
        }

        while let Some(tail) = conditions.last() {
            trace!("dfs: inspecting tail {} at depth {}", tail, conditions.len());

            match visited.flip(tail) {
                Some(negation) => {
                    let index = conditions.len() - 1;

                    debug!("dfs: flipped condition {} to {}", index, negation);

                    conditions[index] = negation;

                    return Exploration::Flipped { index };
                }
                None => {
                    conditions.pop();
                }
            }
        }

        info!("finished exploring this path without finding a new target");

        Exploration::Exhausted
    }
}
