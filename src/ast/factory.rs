//! Node builders
//!
//! Shorthands for the parser: each returns a finished [`Command`] with no
//! flags and an empty redirect chain.

use super::command::{
    ArithForNode, ArithNode, CaseNode, Command, CommandFlags, CommandValue, CoprocNode, ForNode,
    FunctionDefNode, GroupNode, IfNode, SimpleCommandNode, SubshellNode, WhileNode,
};
use super::cond::CondExpr;
use super::connection::{ConnectionNode, Connector};
use super::pattern::PatternList;
use super::word::{Word, WordList};

/// AST factory for building nodes
pub struct AST;

impl AST {
    fn node(value: CommandValue, line: usize) -> Command {
        Command::new(value, CommandFlags::empty(), line)
    }

    pub fn simple(words: WordList, line: usize) -> Command {
        Self::node(
            CommandValue::Simple(SimpleCommandNode::from_words(words)),
            line,
        )
    }

    pub fn for_loop(name: Word, map_list: WordList, action: Command, line: usize) -> Command {
        Self::node(
            CommandValue::For(ForNode {
                name,
                map_list,
                action: Box::new(action),
            }),
            line,
        )
    }

    pub fn select(name: Word, map_list: WordList, action: Command, line: usize) -> Command {
        Self::node(
            CommandValue::Select(ForNode {
                name,
                map_list,
                action: Box::new(action),
            }),
            line,
        )
    }

    pub fn arith_for(
        init: WordList,
        test: WordList,
        step: WordList,
        action: Command,
        line: usize,
    ) -> Command {
        Self::node(
            CommandValue::ArithFor(ArithForNode {
                init,
                test,
                step,
                action: Box::new(action),
            }),
            line,
        )
    }

    pub fn case(word: Word, clauses: PatternList, line: usize) -> Command {
        Self::node(CommandValue::Case(CaseNode { word, clauses }), line)
    }

    pub fn while_loop(test: Command, action: Command, line: usize) -> Command {
        Self::node(
            CommandValue::While(WhileNode {
                test: Box::new(test),
                action: Box::new(action),
            }),
            line,
        )
    }

    pub fn until_loop(test: Command, action: Command, line: usize) -> Command {
        Self::node(
            CommandValue::Until(WhileNode {
                test: Box::new(test),
                action: Box::new(action),
            }),
            line,
        )
    }

    pub fn if_then(
        test: Command,
        true_case: Command,
        false_case: Option<Command>,
        line: usize,
    ) -> Command {
        Self::node(
            CommandValue::If(IfNode {
                test: Box::new(test),
                true_case: Box::new(true_case),
                false_case: false_case.map(Box::new),
            }),
            line,
        )
    }

    pub fn connection(first: Command, second: Command, connector: Connector) -> Command {
        let line = first.line;
        Self::node(
            CommandValue::Connection(ConnectionNode::new(first, second, connector)),
            line,
        )
    }

    pub fn function_def(
        name: Word,
        body: Command,
        source_file: Option<String>,
        line: usize,
    ) -> Command {
        Self::node(
            CommandValue::FunctionDef(FunctionDefNode {
                name,
                body: Box::new(body),
                source_file,
            }),
            line,
        )
    }

    pub fn group(body: Command, line: usize) -> Command {
        Self::node(
            CommandValue::Group(GroupNode {
                body: Box::new(body),
            }),
            line,
        )
    }

    pub fn arith(expression: WordList, line: usize) -> Command {
        Self::node(CommandValue::Arith(ArithNode { expression }), line)
    }

    pub fn cond(root: CondExpr, line: usize) -> Command {
        Self::node(CommandValue::Cond(root), line)
    }

    pub fn subshell(body: Command, line: usize) -> Command {
        let mut cmd = Self::node(
            CommandValue::Subshell(SubshellNode {
                body: Box::new(body),
            }),
            line,
        );
        cmd.flags |= CommandFlags::WANT_SUBSHELL;
        cmd
    }

    pub fn coproc(name: impl Into<String>, body: Command, line: usize) -> Command {
        Self::node(
            CommandValue::Coproc(CoprocNode {
                name: name.into(),
                body: Box::new(body),
            }),
            line,
        )
    }
}
