//! Diagnostic dump of a command tree
//!
//! The output is an indented outline, one construct per header line, with
//! children nested under a label. For a given tree and options the text is
//! always the same, so it can be stored as a snapshot.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::command::{Command, CommandValue};
use super::redirect::RedirectChain;
use super::word::flag_names;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOptions {
    /// Spaces per nesting level.
    #[serde(default = "default_indent")]
    pub indent: usize,
    /// Show `line=N` on each header.
    #[serde(default = "default_show_lines")]
    pub show_lines: bool,
}

fn default_indent() -> usize {
    2
}

fn default_show_lines() -> bool {
    true
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            indent: default_indent(),
            show_lines: default_show_lines(),
        }
    }
}

/// One unit of pending output. Children are queued as `Node` steps rather
/// than rendered by recursion, so tree depth only grows the work stack.
enum Step<'t> {
    Line(String),
    Enter,
    Leave,
    Node(&'t Command),
}

/// The steps for one node, in output order.
struct Outline<'t> {
    steps: Vec<Step<'t>>,
}

impl<'t> Outline<'t> {
    fn line(&mut self, text: String) {
        self.steps.push(Step::Line(text));
    }

    fn child(&mut self, label: String, cmd: &'t Command) {
        self.line(label);
        self.steps.push(Step::Enter);
        self.steps.push(Step::Node(cmd));
        self.steps.push(Step::Leave);
    }

    fn redirects(&mut self, chain: &RedirectChain) {
        if chain.is_empty() {
            return;
        }
        self.line("redirects:".to_string());
        self.steps.push(Step::Enter);
        for line in chain.render() {
            self.line(line);
        }
        self.steps.push(Step::Leave);
    }
}

struct Renderer<'o> {
    options: &'o RenderOptions,
    out: String,
    depth: usize,
}

impl<'o> Renderer<'o> {
    fn new(options: &'o RenderOptions) -> Self {
        Self {
            options,
            out: String::new(),
            depth: 0,
        }
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.depth * self.options.indent {
            self.out.push(' ');
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn run(mut self, root: &Command) -> String {
        let mut work = vec![Step::Node(root)];
        while let Some(step) = work.pop() {
            match step {
                Step::Line(text) => self.line(&text),
                Step::Enter => self.depth += 1,
                Step::Leave => self.depth -= 1,
                Step::Node(cmd) => work.extend(self.outline(cmd).steps.into_iter().rev()),
            }
        }
        self.out
    }

    fn outline<'t>(&self, cmd: &'t Command) -> Outline<'t> {
        let mut o = Outline { steps: Vec::new() };
        let mut header = cmd.typ().name().to_string();
        if self.options.show_lines {
            header.push_str(&format!(" line={}", cmd.line));
        }
        if !cmd.flags.is_empty() {
            header.push_str(&format!(" flags={}", flag_names(cmd.flags)));
        }
        o.line(header);
        o.steps.push(Step::Enter);

        match &cmd.value {
            CommandValue::For(n) | CommandValue::Select(n) => {
                o.line(format!("name: {}", n.name.render()));
                o.line(format!("in: {}", n.map_list.render()));
                o.child("action:".to_string(), &n.action);
            }
            CommandValue::ArithFor(n) => {
                o.line(format!("init: {}", n.init.render()));
                o.line(format!("test: {}", n.test.render()));
                o.line(format!("step: {}", n.step.render()));
                o.child("action:".to_string(), &n.action);
            }
            CommandValue::Case(n) => {
                o.line(format!("word: {}", n.word.render()));
                for clause in n.clauses.iter() {
                    let mut label = format!("clause: {}", clause.patterns.render());
                    if !clause.flags.is_empty() {
                        label.push_str(&format!(" flags={}", flag_names(clause.flags)));
                    }
                    o.child(label, &clause.action);
                }
            }
            CommandValue::While(n) | CommandValue::Until(n) => {
                o.child("test:".to_string(), &n.test);
                o.child("action:".to_string(), &n.action);
            }
            CommandValue::If(n) => {
                o.child("test:".to_string(), &n.test);
                o.child("then:".to_string(), &n.true_case);
                if let Some(false_case) = &n.false_case {
                    o.child("else:".to_string(), false_case);
                }
            }
            CommandValue::Simple(n) => {
                o.line(format!("words: {}", n.words.render()));
                o.redirects(&n.redirects);
            }
            CommandValue::Connection(n) => {
                o.line(format!("connector: {}", n.connector));
                o.child("first:".to_string(), &n.first);
                o.child("second:".to_string(), &n.second);
            }
            CommandValue::FunctionDef(n) => {
                o.line(format!("name: {}", n.name.render()));
                if let Some(source) = &n.source_file {
                    o.line(format!("source: {:?}", source));
                }
                o.child("body:".to_string(), &n.body);
            }
            CommandValue::Group(n) => o.child("body:".to_string(), &n.body),
            CommandValue::Subshell(n) => o.child("body:".to_string(), &n.body),
            CommandValue::Arith(n) => o.line(format!("expression: {}", n.expression.render())),
            CommandValue::Cond(root) => o.line(format!("expression: {}", root.render())),
            CommandValue::Coproc(n) => {
                o.line(format!("name: {:?}", n.name));
                o.child("body:".to_string(), &n.body);
            }
        }

        o.redirects(&cmd.redirects);
        o.steps.push(Step::Leave);
        o
    }
}

impl Command {
    pub fn render(&self) -> String {
        self.render_with(&RenderOptions::default())
    }

    pub fn render_with(&self, options: &RenderOptions) -> String {
        Renderer::new(options).run(self)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
