pub mod decompiler;
pub mod disassembler;
pub mod formatters;
pub mod parser;
pub mod script;
pub mod syntax;
