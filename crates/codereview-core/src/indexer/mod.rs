pub mod complexity;
pub mod filesystem;
pub mod incremental;
pub mod parser;
pub mod pipeline;
pub mod revision;
pub mod snippets;
pub mod symbols;
