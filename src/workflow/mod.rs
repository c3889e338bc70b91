pub mod builder;
pub mod engine;
pub mod planner;
pub mod types;

pub use builder::PipelineBuilder;
pub use engine::{merge, render_fragment, result_entries, McpUnitExecutor, Pipeline, UnitExecutor};
pub use planner::{EmptyPlanner, FixedPlanner, Planner};
pub use types::*;
