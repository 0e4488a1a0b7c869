//! Standard library tools for VeLa

pub mod format;
pub mod io;
pub mod lists;
pub mod math;
pub mod meta;
pub mod strings;

use crate::tools::ToolRegistry;

/// Register all standard library tools
pub fn register_all(registry: &mut ToolRegistry) {
    math::register(registry);
    strings::register(registry);
    registry.register(format::FormatTool);
    lists::register(registry);
    io::register(registry);
    meta::register(registry);
}
