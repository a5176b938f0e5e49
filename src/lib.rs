#[macro_use]
pub mod util;

pub mod engine;
pub mod instrument;
pub mod ir;
pub mod path_exploration;
pub mod runtime;
