pub mod canon;
mod densemap;
pub mod diagram;
pub mod dirty;
pub mod fs;
pub mod graph;
pub mod recipe;
pub mod run;
pub mod scanner;
pub mod trace;
pub mod walk;
