//! Words and word lists
//!
//! A word is the token text produced by the lexer together with the
//! attribute bits the lexer and parser attach to it. Flags are independent;
//! which combinations make sense is the producer's business.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use super::chain::Chain;

bitflags! {
    /// Lexical and expansion attributes of a [`Word`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct WordFlags: u32 {
        /// Dollar sign present.
        const HAS_DOLLAR = 0x000001;
        /// Some form of quote character is present.
        const QUOTED = 0x000002;
        /// Variable assignment.
        const ASSIGNMENT = 0x000004;
        /// Result of a glob expansion.
        const GLOB_EXPANDED = 0x000008;
        /// No word splitting (IFS is empty).
        const NO_SPLIT = 0x000010;
        const NO_GLOB = 0x000020;
        /// No splitting except for `$@`, the context does not allow it.
        const NO_SPLIT2 = 0x000040;
        /// Tilde-expand this assignment word.
        const TILDE_EXPAND = 0x000080;
        /// `$@` with its special handling.
        const DOLLAR_AT = 0x000100;
        /// `$*` with its special handling.
        const DOLLAR_STAR = 0x000200;
        const NO_COMSUB = 0x000400;
        /// Right-hand side of an assignment statement.
        const ASSIGN_RHS = 0x000800;
        const NO_TILDE = 0x001000;
        /// Internal marker for word expansion.
        const ITILDE = 0x002000;
        /// Quote removal only.
        const NO_EXPAND = 0x004000;
        const COMPOUND_ASSIGN = 0x008000;
        /// Builtin that takes assignment arguments (`declare`, `local`, ...).
        const ASSIGN_BUILTIN = 0x010000;
        /// Assignment argument to a command.
        const ASSIGN_ARG = 0x020000;
        const HAS_QUOTED_NULL = 0x040000;
        /// Treat as if double-quoted.
        const DQUOTE = 0x080000;
        const NO_PROCSUB = 0x100000;
        /// Contains literal CTLESC characters.
        const HAS_CTLESC = 0x200000;
        /// Looks like an associative array assignment.
        const ASSIGN_ASSOC = 0x400000;
    }
}

/// A single shell word.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Word {
    pub text: String,
    #[serde(default)]
    pub flags: WordFlags,
}

impl Word {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            flags: WordFlags::empty(),
        }
    }

    pub fn with_flags(text: impl Into<String>, flags: WordFlags) -> Self {
        Self {
            text: text.into(),
            flags,
        }
    }

    pub fn has(&self, flag: WordFlags) -> bool {
        self.flags.contains(flag)
    }

    pub fn is_quoted(&self) -> bool {
        self.flags.intersects(WordFlags::QUOTED | WordFlags::DQUOTE)
    }

    /// Diagnostic form: the quoted text followed by any flag names.
    ///
    /// ```
    /// use bash_ast::{Word, WordFlags};
    /// let w = Word::with_flags("$x", WordFlags::HAS_DOLLAR);
    /// assert_eq!(w.render(), "\"$x\"[HAS_DOLLAR]");
    /// ```
    pub fn render(&self) -> String {
        if self.flags.is_empty() {
            format!("{:?}", self.text)
        } else {
            format!("{:?}[{}]", self.text, flag_names(self.flags))
        }
    }
}

impl From<&str> for Word {
    fn from(text: &str) -> Self {
        Word::new(text)
    }
}

/// `A|B|C` from the set flags, in bit order.
pub(crate) fn flag_names<F: bitflags::Flags>(flags: F) -> String {
    flags
        .iter_names()
        .map(|(name, _)| name)
        .collect::<Vec<_>>()
        .join("|")
}

/// Ordered list of words. Order is significant (arguments, patterns).
pub type WordList = Chain<Word>;

impl Chain<Word> {
    /// Word texts joined by `separator`, no trailing separator.
    pub fn join(&self, separator: &str) -> String {
        let mut out = String::new();
        for (i, word) in self.iter().enumerate() {
            if i > 0 {
                out.push_str(separator);
            }
            out.push_str(&word.text);
        }
        out
    }

    /// Each word's diagnostic form, space separated.
    pub fn render(&self) -> String {
        self.iter()
            .map(Word::render)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Build a list from plain texts, in the given order.
    pub fn from_texts<S: AsRef<str>>(texts: &[S]) -> Self {
        texts.iter().map(|t| Word::new(t.as_ref())).collect()
    }
}
