//! Binary composition of two commands: `a ; b`, `a & b`, `a | b`,
//! `a && b`, `a || b` and newline-separated lists.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::command::{Command, CommandError};

/// What separates the two halves of a [`ConnectionNode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Connector {
    /// `;`
    Sequence,
    /// `&`
    Background,
    /// `|`
    Pipe,
    /// `&&`
    And,
    /// `||`
    Or,
    /// newline
    Newline,
}

impl Connector {
    /// Token code as produced by the parser.
    pub fn code(self) -> i32 {
        match self {
            Connector::Sequence => ';' as i32,
            Connector::Background => '&' as i32,
            Connector::Pipe => '|' as i32,
            Connector::Newline => '\n' as i32,
            Connector::And => 288,
            Connector::Or => 289,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Connector::Sequence => ";",
            Connector::Background => "&",
            Connector::Pipe => "|",
            Connector::And => "&&",
            Connector::Or => "||",
            Connector::Newline => "\\n",
        }
    }
}

impl TryFrom<i32> for Connector {
    type Error = CommandError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        [
            Connector::Sequence,
            Connector::Background,
            Connector::Pipe,
            Connector::And,
            Connector::Or,
            Connector::Newline,
        ]
        .into_iter()
        .find(|c| c.code() == code)
        .ok_or(CommandError::BadConnector(code))
    }
}

impl fmt::Display for Connector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionNode {
    pub first: Box<Command>,
    pub second: Box<Command>,
    pub connector: Connector,
}

impl ConnectionNode {
    pub fn new(first: Command, second: Command, connector: Connector) -> Self {
        Self {
            first: Box::new(first),
            second: Box::new(second),
            connector,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connector_codes() {
        assert_eq!(Connector::Sequence.code(), 59);
        assert_eq!(Connector::Pipe.code(), 124);
        assert_eq!(Connector::try_from(38), Ok(Connector::Background));
        assert_eq!(Connector::try_from(289), Ok(Connector::Or));
        assert_eq!(Connector::try_from(0), Err(CommandError::BadConnector(0)));
    }

    #[test]
    fn test_connector_symbols() {
        assert_eq!(Connector::And.to_string(), "&&");
        assert_eq!(Connector::Newline.to_string(), "\\n");
    }
}
