mod assembly_formatter;
mod daedalus_formatter;
mod html_builder;
mod source_builder;
mod text_builder;

pub use assembly_formatter::*;
pub use daedalus_formatter::*;
pub use html_builder::*;
pub use source_builder::*;
pub use text_builder::*;
