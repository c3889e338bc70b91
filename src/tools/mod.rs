pub mod registry;
pub mod schema;

pub use registry::{attack_tools, ToolDescriptor, ToolRegistry};
pub use schema::{AllTechniquesArgs, ObjectsByContentArgs, ParamSpec, TacticQuery};
