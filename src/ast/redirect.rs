//! Redirections
//!
//! A [`Redirect`] rebinds a descriptor around a command's execution. The
//! instruction tag alone decides how the executor treats it, so every
//! predicate about an instruction lives here and nowhere else.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::chain::Chain;
use super::word::{flag_names, Word};

lazy_static::lazy_static! {
    /// `name` or `name[subscript]` as accepted in `{varname}` redirections.
    static ref REDIR_VARNAME: regex_lite::Regex =
        regex_lite::Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\[[^\]]+\])?$").unwrap();
}

/// What a redirection does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedirectInstruction {
    /// `>`
    OutputDirection = 0,
    /// `<`
    InputDirection,
    /// `&<`, input from a descriptor-named file
    InputaDirection,
    /// `>>`
    AppendingTo,
    /// `<<`
    ReadingUntil,
    /// `<<<`
    ReadingString,
    /// `<&N`
    DuplicatingInput,
    /// `>&N`
    DuplicatingOutput,
    /// `<<-`
    DeblankReadingUntil,
    /// `<&-` / `>&-`
    CloseThis,
    /// `&>`
    ErrAndOut,
    /// `<>`
    InputOutput,
    /// `>|`
    OutputForce,
    /// `<&$word`
    DuplicatingInputWord,
    /// `>&$word`
    DuplicatingOutputWord,
    /// `<&N-`
    MoveInput,
    /// `>&N-`
    MoveOutput,
    /// `<&$word-`
    MoveInputWord,
    /// `>&$word-`
    MoveOutputWord,
    /// `&>>`
    AppendErrAndOut,
}

/// Predicates over an instruction, as consumed by the redirection executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RedirectClass {
    pub clobbering: bool,
    pub output: bool,
    pub input: bool,
    pub write: bool,
    pub needs_translation: bool,
}

impl RedirectInstruction {
    pub const ALL: [RedirectInstruction; 20] = [
        Self::OutputDirection,
        Self::InputDirection,
        Self::InputaDirection,
        Self::AppendingTo,
        Self::ReadingUntil,
        Self::ReadingString,
        Self::DuplicatingInput,
        Self::DuplicatingOutput,
        Self::DeblankReadingUntil,
        Self::CloseThis,
        Self::ErrAndOut,
        Self::InputOutput,
        Self::OutputForce,
        Self::DuplicatingInputWord,
        Self::DuplicatingOutputWord,
        Self::MoveInput,
        Self::MoveOutput,
        Self::MoveInputWord,
        Self::MoveOutputWord,
        Self::AppendErrAndOut,
    ];

    /// Subject to noclobber checking.
    pub fn is_clobbering(self) -> bool {
        matches!(self, Self::OutputDirection | Self::ErrAndOut)
    }

    pub fn is_output(self) -> bool {
        matches!(
            self,
            Self::OutputDirection | Self::InputOutput | Self::ErrAndOut | Self::AppendErrAndOut
        )
    }

    pub fn is_input(self) -> bool {
        matches!(
            self,
            Self::InputDirection | Self::InputaDirection | Self::InputOutput
        )
    }

    /// Opens its target for writing.
    pub fn is_write(self) -> bool {
        matches!(
            self,
            Self::OutputDirection
                | Self::InputOutput
                | Self::ErrAndOut
                | Self::AppendingTo
                | Self::AppendErrAndOut
                | Self::OutputForce
        )
    }

    /// The target word names a variable that must be resolved to a
    /// descriptor before execution.
    pub fn needs_translation(self) -> bool {
        matches!(
            self,
            Self::DuplicatingInputWord
                | Self::DuplicatingOutputWord
                | Self::MoveInputWord
                | Self::MoveOutputWord
        )
    }

    pub fn is_heredoc(self) -> bool {
        matches!(self, Self::ReadingUntil | Self::DeblankReadingUntil)
    }

    /// Target is a descriptor number rather than a word.
    pub fn takes_descriptor(self) -> bool {
        matches!(
            self,
            Self::DuplicatingInput
                | Self::DuplicatingOutput
                | Self::CloseThis
                | Self::MoveInput
                | Self::MoveOutput
        )
    }

    pub fn classify(self) -> RedirectClass {
        RedirectClass {
            clobbering: self.is_clobbering(),
            output: self.is_output(),
            input: self.is_input(),
            write: self.is_write(),
            needs_translation: self.needs_translation(),
        }
    }

    /// `open(2)` flags for the instruction's target.
    pub fn open_flags(self) -> i32 {
        match self {
            Self::OutputDirection | Self::ErrAndOut | Self::OutputForce => {
                libc::O_TRUNC | libc::O_WRONLY | libc::O_CREAT
            }
            Self::AppendingTo | Self::AppendErrAndOut => {
                libc::O_APPEND | libc::O_WRONLY | libc::O_CREAT
            }
            Self::InputDirection | Self::InputaDirection => libc::O_RDONLY,
            Self::InputOutput => libc::O_RDWR | libc::O_CREAT,
            _ => 0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::OutputDirection => "output_direction",
            Self::InputDirection => "input_direction",
            Self::InputaDirection => "inputa_direction",
            Self::AppendingTo => "appending_to",
            Self::ReadingUntil => "reading_until",
            Self::ReadingString => "reading_string",
            Self::DuplicatingInput => "duplicating_input",
            Self::DuplicatingOutput => "duplicating_output",
            Self::DeblankReadingUntil => "deblank_reading_until",
            Self::CloseThis => "close_this",
            Self::ErrAndOut => "err_and_out",
            Self::InputOutput => "input_output",
            Self::OutputForce => "output_force",
            Self::DuplicatingInputWord => "duplicating_input_word",
            Self::DuplicatingOutputWord => "duplicating_output_word",
            Self::MoveInput => "move_input",
            Self::MoveOutput => "move_output",
            Self::MoveInputWord => "move_input_word",
            Self::MoveOutputWord => "move_output_word",
            Self::AppendErrAndOut => "append_err_and_out",
        }
    }
}

impl fmt::Display for RedirectInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RedirectInstruction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|ri| ri.name() == s)
            .ok_or_else(|| format!("unknown redirect instruction: {}", s))
    }
}

/// Errors a redirection can produce for its constructing caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RedirectError {
    #[error("ambiguous redirect")]
    Ambiguous,
    #[error("cannot overwrite existing file")]
    NoClobber,
    #[error("restricted: cannot redirect output")]
    Restricted,
    #[error("cannot create temp file for here-document")]
    HeredocFailed,
    #[error("invalid variable name for redirection")]
    BadVar,
}

impl RedirectError {
    pub fn code(self) -> i32 {
        match self {
            Self::Ambiguous => -1,
            Self::NoClobber => -2,
            Self::Restricted => -3,
            Self::HeredocFailed => -4,
            Self::BadVar => -5,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            -1 => Some(Self::Ambiguous),
            -2 => Some(Self::NoClobber),
            -3 => Some(Self::Restricted),
            -4 => Some(Self::HeredocFailed),
            -5 => Some(Self::BadVar),
            _ => None,
        }
    }
}

/// Descriptor number or filename word. A negative descriptor marks an
/// out-of-range number seen upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Redirectee {
    Fd(i32),
    Filename(Word),
}

impl Redirectee {
    pub fn fd(&self) -> Option<i32> {
        match self {
            Redirectee::Fd(n) => Some(*n),
            Redirectee::Filename(_) => None,
        }
    }

    pub fn filename(&self) -> Option<&Word> {
        match self {
            Redirectee::Fd(_) => None,
            Redirectee::Filename(w) => Some(w),
        }
    }

    fn render(&self) -> String {
        match self {
            Redirectee::Fd(n) => n.to_string(),
            Redirectee::Filename(w) => w.render(),
        }
    }
}

bitflags! {
    /// Private flags of a redirection.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct RedirectFlags: u32 {
        /// `{varname}` redirector: the shell allocates the descriptor.
        const VARASSIGN = 0x01;
    }
}

/// Symbolic form of `open(2)` flags, e.g. `TRUNC|WRONLY|CREAT`. The numeric
/// values differ between platforms; the names do not.
pub fn open_flag_names(flags: i32) -> String {
    let mut names = Vec::new();
    if flags & libc::O_APPEND != 0 {
        names.push("APPEND");
    }
    if flags & libc::O_TRUNC != 0 {
        names.push("TRUNC");
    }
    names.push(if flags & libc::O_RDWR != 0 {
        "RDWR"
    } else if flags & libc::O_WRONLY != 0 {
        "WRONLY"
    } else {
        "RDONLY"
    });
    if flags & libc::O_CREAT != 0 {
        names.push("CREAT");
    }
    names.join("|")
}

/// One redirection operation.
///
/// Deserializing goes through [`Redirect::new`] / [`Redirect::here_doc`]
/// rules, and `flags` is recomputed from the instruction rather than read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRedirect")]
pub struct Redirect {
    pub redirector: Redirectee,
    pub instruction: RedirectInstruction,
    #[serde(skip_serializing_if = "RedirectFlags::is_empty")]
    pub rflags: RedirectFlags,
    /// Flags for `open(2)`.
    #[serde(skip_serializing)]
    pub flags: i32,
    pub redirectee: Redirectee,
    /// The word that appeared in `<<foo`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub here_doc_eof: Option<String>,
}

/// A redirection as stored on disk, before any checks.
#[derive(Deserialize)]
struct RawRedirect {
    redirector: Redirectee,
    instruction: RedirectInstruction,
    #[serde(default)]
    rflags: RedirectFlags,
    redirectee: Redirectee,
    #[serde(default)]
    here_doc_eof: Option<String>,
}

impl TryFrom<RawRedirect> for Redirect {
    type Error = RedirectError;

    fn try_from(raw: RawRedirect) -> Result<Self, Self::Error> {
        if !raw.instruction.is_heredoc() {
            if raw.here_doc_eof.is_some() {
                debug!("terminator given for {}", raw.instruction);
                return Err(RedirectError::Ambiguous);
            }
            return Self::new(raw.redirector, raw.instruction, raw.redirectee, raw.rflags);
        }
        let terminator = raw
            .here_doc_eof
            .filter(|eof| !eof.is_empty())
            .ok_or(RedirectError::HeredocFailed)?;
        Self::build(
            raw.redirector,
            raw.instruction,
            raw.redirectee,
            raw.rflags,
            Some(terminator),
        )
    }
}

impl Redirect {
    /// Build a redirection, checking the target fits the instruction.
    pub fn new(
        redirector: Redirectee,
        instruction: RedirectInstruction,
        redirectee: Redirectee,
        rflags: RedirectFlags,
    ) -> Result<Self, RedirectError> {
        if instruction.is_heredoc() {
            debug!("here-document {} built without a terminator", instruction);
            return Err(RedirectError::HeredocFailed);
        }
        Self::build(redirector, instruction, redirectee, rflags, None)
    }

    /// Build a here-document. `document` holds the body text.
    pub fn here_doc(
        redirector: Redirectee,
        instruction: RedirectInstruction,
        document: Word,
        terminator: impl Into<String>,
    ) -> Result<Self, RedirectError> {
        let terminator = terminator.into();
        if !instruction.is_heredoc() {
            debug!("{} is not a here-document instruction", instruction);
            return Err(RedirectError::Ambiguous);
        }
        if terminator.is_empty() {
            debug!("here-document has an empty terminator");
            return Err(RedirectError::HeredocFailed);
        }
        Self::build(
            redirector,
            instruction,
            Redirectee::Filename(document),
            RedirectFlags::empty(),
            Some(terminator),
        )
    }

    fn build(
        redirector: Redirectee,
        instruction: RedirectInstruction,
        redirectee: Redirectee,
        rflags: RedirectFlags,
        here_doc_eof: Option<String>,
    ) -> Result<Self, RedirectError> {
        if rflags.contains(RedirectFlags::VARASSIGN) {
            let valid = redirector
                .filename()
                .is_some_and(|w| REDIR_VARNAME.is_match(&w.text));
            if !valid {
                debug!("bad {{varname}} redirector: {}", redirector.render());
                return Err(RedirectError::BadVar);
            }
        }

        match (&redirectee, instruction.takes_descriptor()) {
            (Redirectee::Fd(_), true) => {}
            (Redirectee::Filename(w), false) => {
                if w.text.is_empty() && !w.is_quoted() && !instruction.is_heredoc() {
                    debug!("{} target expanded to nothing", instruction);
                    return Err(RedirectError::Ambiguous);
                }
            }
            _ => {
                debug!(
                    "{} given a mismatched target {}",
                    instruction,
                    redirectee.render()
                );
                return Err(RedirectError::Ambiguous);
            }
        }

        Ok(Self {
            redirector,
            instruction,
            rflags,
            flags: instruction.open_flags(),
            redirectee,
            here_doc_eof,
        })
    }

    pub fn classify(&self) -> RedirectClass {
        self.instruction.classify()
    }

    /// One-line diagnostic form.
    pub fn render(&self) -> String {
        let mut out = format!(
            "{} {} {}",
            self.redirector.render(),
            self.instruction,
            self.redirectee.render()
        );
        if !self.rflags.is_empty() {
            out.push_str(&format!(" rflags={}", flag_names(self.rflags)));
        }
        if self.flags != 0 {
            out.push_str(&format!(" flags={}", open_flag_names(self.flags)));
        }
        if let Some(eof) = &self.here_doc_eof {
            out.push_str(&format!(" eof={:?}", eof));
        }
        out
    }
}

/// Redirections in execution order.
pub type RedirectChain = Chain<Redirect>;

impl Chain<Redirect> {
    pub fn render(&self) -> Vec<String> {
        self.iter().map(Redirect::render).collect()
    }
}

/// Shell options that veto otherwise well-formed redirections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RedirectPolicy {
    #[serde(default)]
    pub noclobber: bool,
    #[serde(default)]
    pub restricted: bool,
}

impl RedirectPolicy {
    /// Check `redirect` against the policy. `target_exists` reports whether
    /// the filename target is already present.
    pub fn check(&self, redirect: &Redirect, target_exists: bool) -> Result<(), RedirectError> {
        let class = redirect.classify();
        if self.restricted && class.write {
            debug!("restricted shell refuses {}", redirect.instruction);
            return Err(RedirectError::Restricted);
        }
        if self.noclobber && class.clobbering && target_exists {
            debug!("noclobber refuses {}", redirect.instruction);
            return Err(RedirectError::NoClobber);
        }
        Ok(())
    }
}
