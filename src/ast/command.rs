//! The command tree
//!
//! [`Command`] wraps exactly one [`CommandValue`] payload; the payload is the
//! discriminant, so a node's type and its contents cannot disagree. Every
//! node owns its children outright.

use std::fmt;

use bitflags::bitflags;
use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::cond::{CondError, CondExpr};
use super::connection::ConnectionNode;
use super::pattern::PatternList;
use super::redirect::{Redirect, RedirectChain, RedirectError, RedirectPolicy};
use super::word::{Word, WordList};

// =============================================================================
// FLAGS
// =============================================================================

bitflags! {
    /// Execution-environment flags of a command.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct CommandFlags: u32 {
        /// User wants a subshell: `( command )`.
        const WANT_SUBSHELL = 0x01;
        /// Shell needs to force a subshell.
        const FORCE_SUBSHELL = 0x02;
        /// Invert the exit value (`!`).
        const INVERT_RETURN = 0x04;
        /// Ignore the exit value, for `set -e`.
        const IGNORE_RETURN = 0x08;
        /// Ignore functions during command lookup.
        const NO_FUNCTIONS = 0x10;
        /// Do not expand the command words.
        const INHIBIT_EXPANSION = 0x20;
        const TIME_PIPELINE = 0x80;
        /// `time -p`
        const TIME_POSIX = 0x100;
        /// Async command needs an implicit `</dev/null`.
        const STDIN_REDIR = 0x400;
    }
}

bitflags! {
    /// Why the executor is running in a subshell.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct SubshellEnv: u32 {
        /// `command &`
        const ASYNC = 0x01;
        /// `( ... )`
        const PAREN = 0x02;
        /// `` `command` `` or `$(command)`
        const COMSUB = 0x04;
        /// Executing a disk command.
        const FORK = 0x08;
        const PIPE = 0x10;
        /// `<(command)` or `>(command)`
        const PROCSUB = 0x20;
        const COPROC = 0x40;
    }
}

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("command type {0} is out of range")]
    BadType(i32),
    #[error("{found} payload given for a {expected} command")]
    PayloadMismatch {
        expected: CommandType,
        found: CommandType,
    },
    #[error("bad connector {0}")]
    BadConnector(i32),
    #[error("{typ} at line {line} has an empty word list to map over")]
    EmptyMapList { typ: CommandType, line: usize },
    #[error("conditional at line {line}: {source}")]
    Cond {
        line: usize,
        #[source]
        source: CondError,
    },
    #[error("redirection at line {line}: {source}")]
    Redirect {
        line: usize,
        #[source]
        source: RedirectError,
    },
}

// =============================================================================
// COMMAND TYPES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandType {
    For = 0,
    Case,
    While,
    If,
    Simple,
    Select,
    Connection,
    FunctionDef,
    Until,
    Group,
    Arith,
    Cond,
    ArithFor,
    Subshell,
    Coproc,
}

impl CommandType {
    const ALL: [CommandType; 15] = [
        Self::For,
        Self::Case,
        Self::While,
        Self::If,
        Self::Simple,
        Self::Select,
        Self::Connection,
        Self::FunctionDef,
        Self::Until,
        Self::Group,
        Self::Arith,
        Self::Cond,
        Self::ArithFor,
        Self::Subshell,
        Self::Coproc,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::For => "FOR",
            Self::Case => "CASE",
            Self::While => "WHILE",
            Self::If => "IF",
            Self::Simple => "SIMPLE",
            Self::Select => "SELECT",
            Self::Connection => "CONNECTION",
            Self::FunctionDef => "FUNCTION_DEF",
            Self::Until => "UNTIL",
            Self::Group => "GROUP",
            Self::Arith => "ARITH",
            Self::Cond => "COND",
            Self::ArithFor => "ARITH_FOR",
            Self::Subshell => "SUBSHELL",
            Self::Coproc => "COPROC",
        }
    }
}

impl TryFrom<i32> for CommandType {
    type Error = CommandError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        usize::try_from(code)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .ok_or(CommandError::BadType(code))
    }
}

impl fmt::Display for CommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// PAYLOADS
// =============================================================================

/// `for NAME in WORDS; do ACTION; done`, also used by `select`.
/// The map list is never empty in a parsed tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForNode {
    pub name: Word,
    pub map_list: WordList,
    pub action: Box<Command>,
}

/// `for (( INIT; TEST; STEP )); do ACTION; done`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArithForNode {
    pub init: WordList,
    pub test: WordList,
    pub step: WordList,
    pub action: Box<Command>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseNode {
    pub word: Word,
    pub clauses: PatternList,
}

/// Body of both `while` and `until`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhileNode {
    pub test: Box<Command>,
    pub action: Box<Command>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IfNode {
    pub test: Box<Command>,
    pub true_case: Box<Command>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub false_case: Option<Box<Command>>,
}

/// Program name, arguments and assignments, plus their redirections.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SimpleCommandNode {
    pub words: WordList,
    #[serde(default)]
    pub redirects: RedirectChain,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefNode {
    pub name: Word,
    pub body: Box<Command>,
    /// File in which the function was defined, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
}

/// `{ ...; }`: pipes and redirections apply to the whole group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupNode {
    pub body: Box<Command>,
}

/// `(( ... ))`. Only the first word is used for now.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArithNode {
    pub expression: WordList,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubshellNode {
    pub body: Box<Command>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoprocNode {
    pub name: String,
    pub body: Box<Command>,
}

/// The payload of a command; the variant is the command's type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CommandValue {
    For(ForNode),
    Case(CaseNode),
    While(WhileNode),
    If(IfNode),
    Simple(SimpleCommandNode),
    Select(ForNode),
    Connection(ConnectionNode),
    FunctionDef(FunctionDefNode),
    Until(WhileNode),
    Group(GroupNode),
    Arith(ArithNode),
    Cond(CondExpr),
    ArithFor(ArithForNode),
    Subshell(SubshellNode),
    Coproc(CoprocNode),
}

impl CommandValue {
    pub fn command_type(&self) -> CommandType {
        match self {
            CommandValue::For(_) => CommandType::For,
            CommandValue::Case(_) => CommandType::Case,
            CommandValue::While(_) => CommandType::While,
            CommandValue::If(_) => CommandType::If,
            CommandValue::Simple(_) => CommandType::Simple,
            CommandValue::Select(_) => CommandType::Select,
            CommandValue::Connection(_) => CommandType::Connection,
            CommandValue::FunctionDef(_) => CommandType::FunctionDef,
            CommandValue::Until(_) => CommandType::Until,
            CommandValue::Group(_) => CommandType::Group,
            CommandValue::Arith(_) => CommandType::Arith,
            CommandValue::Cond(_) => CommandType::Cond,
            CommandValue::ArithFor(_) => CommandType::ArithFor,
            CommandValue::Subshell(_) => CommandType::Subshell,
            CommandValue::Coproc(_) => CommandType::Coproc,
        }
    }
}

// =============================================================================
// REDIRECTABLE
// =============================================================================

/// Owns a redirect chain that grows at the tail.
pub trait Redirectable {
    fn redirects(&self) -> &RedirectChain;

    fn redirects_mut(&mut self) -> &mut RedirectChain;

    fn add_redirect(&mut self, redirect: Redirect) {
        self.redirects_mut().append(redirect);
    }
}

impl Redirectable for SimpleCommandNode {
    fn redirects(&self) -> &RedirectChain {
        &self.redirects
    }

    fn redirects_mut(&mut self) -> &mut RedirectChain {
        &mut self.redirects
    }
}

impl Redirectable for Command {
    fn redirects(&self) -> &RedirectChain {
        &self.redirects
    }

    fn redirects_mut(&mut self) -> &mut RedirectChain {
        &mut self.redirects
    }
}

// =============================================================================
// SIMPLE COMMAND ELEMENTS
// =============================================================================

/// A word or a redirection, as the parser meets them in a simple command.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Word(Word),
    Redirect(Redirect),
}

impl SimpleCommandNode {
    pub fn from_words(words: WordList) -> Self {
        Self {
            words,
            redirects: RedirectChain::new(),
        }
    }

    /// Words are prepended, redirections appended; call
    /// [`SimpleCommandNode::finish`] once all elements are in.
    pub fn push_element(&mut self, element: Element) {
        match element {
            Element::Word(word) => self.words.push_front(word),
            Element::Redirect(redirect) => self.add_redirect(redirect),
        }
    }

    /// Restore source order of the words.
    pub fn finish(mut self) -> Self {
        self.words.reverse();
        self
    }

    pub fn from_elements<I: IntoIterator<Item = Element>>(elements: I) -> Self {
        let mut node = Self::default();
        for element in elements {
            node.push_element(element);
        }
        node.finish()
    }
}

// =============================================================================
// COMMAND
// =============================================================================

/// One parsed shell construct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    #[serde(default)]
    pub flags: CommandFlags,
    /// Line the command starts on.
    #[serde(default)]
    pub line: usize,
    /// Redirections around the whole construct (`for ... done >out`).
    #[serde(default)]
    pub redirects: RedirectChain,
    pub value: CommandValue,
}

impl Command {
    pub fn new(value: CommandValue, flags: CommandFlags, line: usize) -> Self {
        Self {
            flags,
            line,
            redirects: RedirectChain::new(),
            value,
        }
    }

    /// Build a node of type `typ`, refusing a payload of any other type.
    pub fn make(
        typ: CommandType,
        value: CommandValue,
        flags: CommandFlags,
        line: usize,
    ) -> Result<Self, CommandError> {
        let found = value.command_type();
        if found != typ {
            debug!("make: {} payload for {} command at line {}", found, typ, line);
            return Err(CommandError::PayloadMismatch {
                expected: typ,
                found,
            });
        }
        Ok(Self::new(value, flags, line))
    }

    pub fn typ(&self) -> CommandType {
        self.value.command_type()
    }

    /// Direct child commands, in source order.
    pub fn children(&self) -> Vec<&Command> {
        match &self.value {
            CommandValue::For(n) | CommandValue::Select(n) => vec![&*n.action],
            CommandValue::ArithFor(n) => vec![&*n.action],
            CommandValue::Case(n) => n.clauses.iter().map(|c| &c.action).collect(),
            CommandValue::While(n) | CommandValue::Until(n) => vec![&*n.test, &*n.action],
            CommandValue::If(n) => {
                let mut out = vec![&*n.test, &*n.true_case];
                if let Some(f) = &n.false_case {
                    out.push(&**f);
                }
                out
            }
            CommandValue::Connection(n) => vec![&*n.first, &*n.second],
            CommandValue::FunctionDef(n) => vec![&*n.body],
            CommandValue::Group(n) => vec![&*n.body],
            CommandValue::Subshell(n) => vec![&*n.body],
            CommandValue::Coproc(n) => vec![&*n.body],
            CommandValue::Simple(_) | CommandValue::Arith(_) | CommandValue::Cond(_) => Vec::new(),
        }
    }

    /// This node and everything below it, parents before children and
    /// siblings in source order.
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            pending: vec![self],
        }
    }

    /// Check the invariants a parser is expected to uphold, for this node
    /// and everything below it.
    pub fn validate(&self) -> Result<(), CommandError> {
        self.walk().try_for_each(Command::check_node)
    }

    fn check_node(&self) -> Result<(), CommandError> {
        match &self.value {
            CommandValue::For(n) | CommandValue::Select(n) if n.map_list.is_empty() => {
                debug!("validate: empty map list at line {}", self.line);
                Err(CommandError::EmptyMapList {
                    typ: self.typ(),
                    line: self.line,
                })
            }
            CommandValue::Cond(root) => root.validate().map_err(|source| CommandError::Cond {
                line: self.line,
                source,
            }),
            _ => Ok(()),
        }
    }

    /// Every redirection in the tree: the node's own chain first, then a
    /// simple command's, in tree order.
    pub fn all_redirects(&self) -> impl Iterator<Item = (&Command, &Redirect)> + '_ {
        self.walk().flat_map(|cmd| {
            let payload = match &cmd.value {
                CommandValue::Simple(n) => Some(n.redirects.iter()),
                _ => None,
            };
            cmd.redirects
                .iter()
                .chain(payload.into_iter().flatten())
                .map(move |r| (cmd, r))
        })
    }

    /// Run `policy` over every redirection; `target_exists` answers whether
    /// a redirection's target is already there.
    pub fn check_redirects<F>(
        &self,
        policy: &RedirectPolicy,
        mut target_exists: F,
    ) -> Result<(), CommandError>
    where
        F: FnMut(&Redirect) -> bool,
    {
        for (cmd, redirect) in self.all_redirects() {
            policy
                .check(redirect, target_exists(redirect))
                .map_err(|source| CommandError::Redirect {
                    line: cmd.line,
                    source,
                })?;
        }
        Ok(())
    }
}

/// Preorder iterator over a command tree, see [`Command::walk`].
pub struct Walk<'a> {
    pending: Vec<&'a Command>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a Command;

    fn next(&mut self) -> Option<Self::Item> {
        let cmd = self.pending.pop()?;
        self.pending.extend(cmd.children().into_iter().rev());
        Some(cmd)
    }
}

// Deep trees (a long `a; b; c; ...` script is a left-deep chain of
// connections) must not drop recursively.
impl Drop for Command {
    fn drop(&mut self) {
        let mut detached = Vec::new();
        detach_children(&mut self.value, &mut detached);
        while let Some(mut cmd) = detached.pop() {
            detach_children(&mut cmd.value, &mut detached);
        }
    }
}

fn detach_children(value: &mut CommandValue, out: &mut Vec<Command>) {
    if matches!(value, CommandValue::Simple(_) | CommandValue::Arith(_) | CommandValue::Cond(_)) {
        return;
    }
    let taken = std::mem::replace(value, CommandValue::Simple(SimpleCommandNode::default()));
    match taken {
        CommandValue::For(n) | CommandValue::Select(n) => out.push(*n.action),
        CommandValue::ArithFor(n) => out.push(*n.action),
        CommandValue::Case(n) => out.extend(n.clauses.into_iter().map(|c| c.action)),
        CommandValue::While(n) | CommandValue::Until(n) => {
            out.push(*n.test);
            out.push(*n.action);
        }
        CommandValue::If(n) => {
            out.push(*n.test);
            out.push(*n.true_case);
            if let Some(f) = n.false_case {
                out.push(*f);
            }
        }
        CommandValue::Connection(n) => {
            out.push(*n.first);
            out.push(*n.second);
        }
        CommandValue::FunctionDef(n) => out.push(*n.body),
        CommandValue::Group(n) => out.push(*n.body),
        CommandValue::Subshell(n) => out.push(*n.body),
        CommandValue::Coproc(n) => out.push(*n.body),
        CommandValue::Simple(_) | CommandValue::Arith(_) | CommandValue::Cond(_) => {}
    }
}

// =============================================================================
// COPROCESSES
// =============================================================================

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct CoprocStatus: u32 {
        const RUNNING = 0x01;
        const DEAD = 0x02;
    }
}

/// Executor-side record of a started coprocess.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Coproc {
    pub name: String,
    pub pid: u32,
    pub rfd: i32,
    pub wfd: i32,
    pub rsave: i32,
    pub wsave: i32,
    pub flags: CoprocStatus,
    pub status: i32,
}

impl Coproc {
    /// Record for a coprocess not yet started: every descriptor is -1.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pid: 0,
            rfd: -1,
            wfd: -1,
            rsave: -1,
            wsave: -1,
            flags: CoprocStatus::empty(),
            status: 0,
        }
    }

    pub fn is_running(&self) -> bool {
        self.flags.contains(CoprocStatus::RUNNING)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::connection::Connector;
    use crate::ast::pattern::{CaseClause, CasePatFlags};
    use crate::ast::redirect::{RedirectFlags, RedirectInstruction, Redirectee};

    fn simple(words: &[&str]) -> Command {
        Command::new(
            CommandValue::Simple(SimpleCommandNode::from_words(WordList::from_texts(words))),
            CommandFlags::empty(),
            1,
        )
    }

    fn out_to(name: &str) -> Redirect {
        Redirect::new(
            Redirectee::Fd(1),
            RedirectInstruction::OutputDirection,
            Redirectee::Filename(Word::new(name)),
            RedirectFlags::empty(),
        )
        .unwrap()
    }

    #[test]
    fn test_make_matching_payload() {
        let cmd = Command::make(
            CommandType::Simple,
            CommandValue::Simple(SimpleCommandNode::default()),
            CommandFlags::INVERT_RETURN,
            7,
        )
        .unwrap();
        assert_eq!(cmd.typ(), CommandType::Simple);
        assert_eq!(cmd.line, 7);
        assert!(cmd.flags.contains(CommandFlags::INVERT_RETURN));
        assert!(cmd.redirects.is_empty());
    }

    #[test]
    fn test_make_mismatched_payload_fails() {
        let err = Command::make(
            CommandType::Simple,
            CommandValue::Group(GroupNode {
                body: Box::new(simple(&["true"])),
            }),
            CommandFlags::empty(),
            1,
        )
        .unwrap_err();
        assert_eq!(
            err,
            CommandError::PayloadMismatch {
                expected: CommandType::Simple,
                found: CommandType::Group,
            }
        );
    }

    #[test]
    fn test_while_and_until_share_a_payload_but_not_a_type() {
        let body = WhileNode {
            test: Box::new(simple(&["true"])),
            action: Box::new(simple(&["echo"])),
        };
        let until = Command::new(CommandValue::Until(body.clone()), CommandFlags::empty(), 1);
        assert_eq!(until.typ(), CommandType::Until);
        let made = Command::make(
            CommandType::While,
            CommandValue::Until(body),
            CommandFlags::empty(),
            1,
        );
        assert!(made.is_err());
    }

    #[test]
    fn test_command_type_codes() {
        assert_eq!(CommandType::try_from(0), Ok(CommandType::For));
        assert_eq!(CommandType::try_from(14), Ok(CommandType::Coproc));
        assert_eq!(CommandType::try_from(15), Err(CommandError::BadType(15)));
        assert_eq!(CommandType::try_from(-1), Err(CommandError::BadType(-1)));
        assert_eq!(CommandType::FunctionDef.to_string(), "FUNCTION_DEF");
    }

    #[test]
    fn test_add_redirect_on_command_and_simple_payload() {
        let mut cmd = simple(&["ls"]);
        cmd.add_redirect(out_to("a"));
        cmd.add_redirect(out_to("b"));
        let names: Vec<_> = cmd
            .redirects()
            .iter()
            .map(|r| r.redirectee.filename().unwrap().text.as_str())
            .collect();
        assert_eq!(names, vec!["a", "b"]);

        let mut node = SimpleCommandNode::default();
        node.add_redirect(out_to("c"));
        assert_eq!(node.redirects().len(), 1);
    }

    #[test]
    fn test_simple_from_elements() {
        let node = SimpleCommandNode::from_elements(vec![
            Element::Word(Word::new("echo")),
            Element::Redirect(out_to("first")),
            Element::Word(Word::new("hi")),
            Element::Redirect(out_to("second")),
        ]);
        assert_eq!(node.words.join(" "), "echo hi");
        let targets: Vec<_> = node
            .redirects
            .iter()
            .map(|r| r.redirectee.filename().unwrap().text.clone())
            .collect();
        assert_eq!(targets, vec!["first", "second"]);
    }

    #[test]
    fn test_children_order() {
        let if_cmd = Command::new(
            CommandValue::If(IfNode {
                test: Box::new(simple(&["test"])),
                true_case: Box::new(simple(&["yes"])),
                false_case: Some(Box::new(simple(&["no"]))),
            }),
            CommandFlags::empty(),
            1,
        );
        let firsts: Vec<_> = if_cmd
            .children()
            .into_iter()
            .map(|c| match &c.value {
                CommandValue::Simple(s) => s.words.join(" "),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(firsts, vec!["test", "yes", "no"]);
    }

    #[test]
    fn test_validate_rejects_empty_map_list() {
        let select = Command::new(
            CommandValue::Select(ForNode {
                name: Word::new("x"),
                map_list: WordList::new(),
                action: Box::new(simple(&["echo"])),
            }),
            CommandFlags::empty(),
            4,
        );
        assert_eq!(
            select.validate(),
            Err(CommandError::EmptyMapList {
                typ: CommandType::Select,
                line: 4,
            })
        );
    }

    #[test]
    fn test_validate_reaches_nested_conditionals() {
        let mut bad = CondExpr::term(Word::new("x"));
        bad.right = Some(Box::new(CondExpr::term(Word::new("y"))));
        let cond = Command::new(CommandValue::Cond(bad), CommandFlags::empty(), 3);
        let clauses: PatternList = vec![CaseClause::new(
            WordList::from_texts(&["*"]),
            cond,
            CasePatFlags::empty(),
        )]
        .into();
        let case = Command::new(
            CommandValue::Case(CaseNode {
                word: Word::new("$x"),
                clauses,
            }),
            CommandFlags::empty(),
            2,
        );
        let tree = Command::new(
            CommandValue::Connection(ConnectionNode::new(
                simple(&["true"]),
                case,
                Connector::And,
            )),
            CommandFlags::empty(),
            1,
        );
        match tree.validate() {
            Err(CommandError::Cond { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected a conditional violation, got {:?}", other),
        }
        assert!(simple(&["ok"]).validate().is_ok());
    }

    #[test]
    fn test_walk_is_preorder_in_source_order() {
        let tree = Command::new(
            CommandValue::Connection(ConnectionNode::new(
                Command::new(
                    CommandValue::Group(GroupNode {
                        body: Box::new(simple(&["a"])),
                    }),
                    CommandFlags::empty(),
                    1,
                ),
                simple(&["b"]),
                Connector::Pipe,
            )),
            CommandFlags::empty(),
            1,
        );
        let types: Vec<_> = tree.walk().map(Command::typ).collect();
        assert_eq!(
            types,
            vec![
                CommandType::Connection,
                CommandType::Group,
                CommandType::Simple,
                CommandType::Simple,
            ]
        );
    }

    #[test]
    fn test_check_redirects_covers_command_and_payload_chains() {
        let mut inner = simple(&["cat"]);
        if let CommandValue::Simple(node) = &mut inner.value {
            node.add_redirect(out_to("existing"));
        }
        inner.line = 5;
        let mut group = Command::new(
            CommandValue::Group(GroupNode {
                body: Box::new(inner),
            }),
            CommandFlags::empty(),
            4,
        );
        group.add_redirect(out_to("fresh"));

        let targets: Vec<_> = group
            .all_redirects()
            .map(|(cmd, r)| (cmd.line, r.redirectee.filename().unwrap().text.clone()))
            .collect();
        assert_eq!(targets, vec![(4, "fresh".to_string()), (5, "existing".to_string())]);

        let exists = |r: &Redirect| r.redirectee.filename().is_some_and(|w| w.text == "existing");
        let lax = RedirectPolicy::default();
        assert_eq!(group.check_redirects(&lax, exists), Ok(()));

        let noclobber = RedirectPolicy {
            noclobber: true,
            restricted: false,
        };
        assert_eq!(
            group.check_redirects(&noclobber, exists),
            Err(CommandError::Redirect {
                line: 5,
                source: RedirectError::NoClobber,
            })
        );

        let restricted = RedirectPolicy {
            noclobber: false,
            restricted: true,
        };
        assert_eq!(
            group.check_redirects(&restricted, |_| false),
            Err(CommandError::Redirect {
                line: 4,
                source: RedirectError::Restricted,
            })
        );
    }

    #[test]
    fn test_deeply_nested_groups_drop() {
        let mut tree = simple(&["true"]);
        for line in 0..100_000 {
            tree = Command::new(
                CommandValue::Group(GroupNode {
                    body: Box::new(tree),
                }),
                CommandFlags::empty(),
                line,
            );
        }
        assert_eq!(tree.walk().count(), 100_001);
        assert_eq!(tree.validate(), Ok(()));
        drop(tree);
    }

    #[test]
    fn test_coproc_record() {
        let mut co = Coproc::new("COPROC");
        assert!(!co.is_running());
        assert_eq!(co.rfd, -1);
        co.flags |= CoprocStatus::RUNNING;
        assert!(co.is_running());
    }

    #[test]
    fn test_flag_values() {
        assert_eq!(CommandFlags::TIME_POSIX.bits(), 0x100);
        assert_eq!(CommandFlags::STDIN_REDIR.bits(), 0x400);
        assert_eq!(CommandFlags::all().iter().count(), 9);
        assert_eq!(SubshellEnv::COPROC.bits(), 0x40);
    }
}
