mod code;
mod decl;
mod expr;

pub use code::*;
pub use decl::*;
pub use expr::*;
