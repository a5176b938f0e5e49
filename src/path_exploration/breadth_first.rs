use super::{Exploration, ExplorationStrategy, VisitedSet};
use log::{debug, info, trace};
use z3_solver::ast::Bool;

/// Flips the oldest branch outcome that was not attempted yet.
///
/// The head of the sequence is inspected and rotated to the tail. A novel
/// head is replaced by its negation at the tail; a visited one is moved there
/// unchanged. After one full round without a novel outcome the sequence is
/// back in its original order and the path counts as exhausted.
#[derive(Clone, Copy, Debug, Default)]
pub struct BreadthFirst;

impl ExplorationStrategy for BreadthFirst {
    fn next_path<'ctx>(
        &self,
        conditions: &mut Vec<Bool<'ctx>>,
        visited: &mut VisitedSet<'ctx>,
    ) -> Exploration {
        if conditions.is_empty() {
            return Exploration::Empty;
        }

        for round in 0..conditions.len() {
            let head = conditions.remove(0);

            trace!("bfs: inspecting head {} (round {})", head, round);

            match visited.flip(&head) {
                Some(negation) => {
                    debug!("bfs: flipped {} to {}", head, negation);

                    conditions.push(negation);

                    return Exploration::Flipped {
                        index: conditions.len() - 1,
                    };
                }
                None => conditions.push(head),
            }
        }

        info!("finished exploring this path without finding a new target");

        Exploration::Exhausted
    }
}
