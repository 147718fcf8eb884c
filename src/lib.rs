//! bash-ast - The command tree of a bash-compatible shell
//!
//! This library provides the abstract syntax tree a bash parser produces and
//! an executor walks: words, redirections, case clauses, conditional
//! expressions and the commands built from them, plus a stable text
//! rendering for diagnostics and snapshot tests.

pub mod ast;
pub mod config;
pub mod dump;
pub mod error;

pub use ast::*;
pub use config::Config;
pub use error::Error;
