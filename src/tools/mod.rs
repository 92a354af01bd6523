//! Built-in tools available to the model.

pub mod calculator;
pub mod time;

pub use calculator::CalculatorTool;
pub use time::CurrentTimeTool;

use crate::tool::ToolRegistry;

/// The default toolkit registered by the service binary.
pub fn default_toolkit() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(CurrentTimeTool);
    registry.register(CalculatorTool);
    registry
}
