//! Case clauses
//!
//! The clauses of a `case` command in match-priority order. The
//! terminator of each clause (`;;`, `;&`, `;;&`) is kept as flags.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use super::chain::Chain;
use super::command::Command;
use super::word::{Word, WordList};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct CasePatFlags: u32 {
        /// `;&`: run the next clause's action without testing it.
        const FALLTHROUGH = 0x01;
        /// `;;&`: keep testing the following clauses after this one ran.
        const TESTNEXT = 0x02;
    }
}

/// Patterns and the action run when one of them matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseClause {
    pub patterns: WordList,
    pub action: Command,
    #[serde(default)]
    pub flags: CasePatFlags,
}

impl CaseClause {
    pub fn new(patterns: WordList, action: Command, flags: CasePatFlags) -> Self {
        Self {
            patterns,
            action,
            flags,
        }
    }
}

pub type PatternList = Chain<CaseClause>;

impl Chain<CaseClause> {
    /// `(patterns, action, flags)` per clause, in chain order.
    pub fn clauses(&self) -> impl Iterator<Item = (&WordList, &Command, CasePatFlags)> + '_ {
        self.iter().map(|c| (&c.patterns, &c.action, c.flags))
    }

    /// Actions to run, in order, for a subject that `matches` tests against
    /// each pattern word.
    ///
    /// The first clause with a matching pattern runs. A `FALLTHROUGH` clause
    /// carries on into the next action untested. After the last action run,
    /// testing resumes with the following clause only if that clause was
    /// `TESTNEXT`.
    pub fn dispatch<F>(&self, mut matches: F) -> Vec<&Command>
    where
        F: FnMut(&Word) -> bool,
    {
        let clauses: Vec<&CaseClause> = self.iter().collect();
        let mut actions = Vec::new();
        let mut i = 0;
        while i < clauses.len() {
            if !clauses[i].patterns.iter().any(&mut matches) {
                i += 1;
                continue;
            }
            loop {
                actions.push(&clauses[i].action);
                if clauses[i].flags.contains(CasePatFlags::FALLTHROUGH) && i + 1 < clauses.len() {
                    i += 1;
                } else {
                    break;
                }
            }
            if !clauses[i].flags.contains(CasePatFlags::TESTNEXT) {
                break;
            }
            i += 1;
        }
        actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::command::{Command, CommandFlags, CommandValue, SimpleCommandNode};

    fn action(text: &str) -> Command {
        Command::new(
            CommandValue::Simple(SimpleCommandNode::from_words(WordList::from_texts(&[
                "echo", text,
            ]))),
            CommandFlags::empty(),
            0,
        )
    }

    fn clause(pats: &[&str], act: &str, flags: CasePatFlags) -> CaseClause {
        CaseClause::new(WordList::from_texts(pats), action(act), flags)
    }

    fn arg(cmd: &Command) -> String {
        match &cmd.value {
            CommandValue::Simple(s) => s.words.join(" "),
            _ => unreachable!(),
        }
    }

    fn run(list: &PatternList, subject: &str) -> Vec<String> {
        list.dispatch(|w| w.text == "*" || w.text == subject)
            .into_iter()
            .map(arg)
            .collect()
    }

    #[test]
    fn test_iteration_in_insertion_order() {
        let list = PatternList::new()
            .prepend(clause(&["b"], "two", CasePatFlags::TESTNEXT))
            .prepend(clause(&["a"], "one", CasePatFlags::FALLTHROUGH))
            .reversed()
            .reversed();
        let firsts: Vec<String> = list.clauses().map(|(p, _, _)| p.join("|")).collect();
        assert_eq!(firsts, vec!["a", "b"]);
        let flags: Vec<CasePatFlags> = list.clauses().map(|(_, _, f)| f).collect();
        assert_eq!(flags, vec![CasePatFlags::FALLTHROUGH, CasePatFlags::TESTNEXT]);
    }

    #[test]
    fn test_first_match_wins() {
        let list: PatternList = vec![
            clause(&["x", "y"], "xy", CasePatFlags::empty()),
            clause(&["y"], "y", CasePatFlags::empty()),
        ]
        .into();
        assert_eq!(run(&list, "y"), vec!["echo xy"]);
        assert!(run(&list, "z").is_empty());
    }

    #[test]
    fn test_fallthrough_skips_pattern_test() {
        let list: PatternList = vec![
            clause(&["a"], "one", CasePatFlags::FALLTHROUGH),
            clause(&["never"], "two", CasePatFlags::empty()),
            clause(&["a"], "three", CasePatFlags::empty()),
        ]
        .into();
        assert_eq!(run(&list, "a"), vec!["echo one", "echo two"]);
    }

    #[test]
    fn test_testnext_continues_matching() {
        let list: PatternList = vec![
            clause(&["a"], "one", CasePatFlags::TESTNEXT),
            clause(&["b"], "two", CasePatFlags::empty()),
            clause(&["*"], "any", CasePatFlags::empty()),
            clause(&["a"], "late", CasePatFlags::empty()),
        ]
        .into();
        assert_eq!(run(&list, "a"), vec!["echo one", "echo any"]);
    }

    #[test]
    fn test_fallthrough_into_testnext() {
        let list: PatternList = vec![
            clause(&["a"], "one", CasePatFlags::FALLTHROUGH),
            clause(&["no"], "two", CasePatFlags::TESTNEXT),
            clause(&["a"], "three", CasePatFlags::empty()),
        ]
        .into();
        assert_eq!(run(&list, "a"), vec!["echo one", "echo two", "echo three"]);
    }

    #[test]
    fn test_fallthrough_on_last_clause_stops() {
        let list: PatternList = vec![clause(&["a"], "only", CasePatFlags::FALLTHROUGH)].into();
        assert_eq!(run(&list, "a"), vec!["echo only"]);
    }
}
