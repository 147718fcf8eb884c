//! Abstract Syntax Tree (AST) Types for Bash commands
//!
//! This module defines the command tree a parser hands to an executor:
//! words and word lists, redirections, case clauses, `[[ ]]` expression
//! trees and the [`Command`] union tying them together.
//!
//! Architecture:
//!   Lexer → Parser → [Command tree] → Executor

pub mod chain;
pub mod command;
pub mod cond;
pub mod connection;
pub mod factory;
pub mod pattern;
pub mod redirect;
pub mod render;
pub mod word;

pub use chain::Chain;
pub use command::{
    ArithForNode, ArithNode, CaseNode, Command, CommandError, CommandFlags, CommandType,
    CommandValue, Coproc, CoprocNode, CoprocStatus, Element, ForNode, FunctionDefNode, GroupNode,
    IfNode, Redirectable, SimpleCommandNode, SubshellEnv, SubshellNode, Walk, WhileNode,
};
pub use cond::{CondError, CondExpr, CondKind};
pub use connection::{ConnectionNode, Connector};
pub use factory::AST;
pub use pattern::{CaseClause, CasePatFlags, PatternList};
pub use redirect::{
    open_flag_names, Redirect, RedirectChain, RedirectClass, RedirectError, RedirectFlags,
    RedirectInstruction, RedirectPolicy, Redirectee,
};
pub use render::RenderOptions;
pub use word::{Word, WordFlags, WordList};
