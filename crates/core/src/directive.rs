use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const EXECUTE: &str = "EXECUTE";
const EXECUTE_CONFIRM: &str = "EXECUTE AND CONFIRM";
const ANSWER: &str = "ANSWER";
const NOINFO: &str = "NOINFO";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectiveParseError {
    #[error("unrecognized directive tag in {0:?}")]
    UnknownTag(String),
    #[error("{0} directive has no command")]
    MissingCommand(&'static str),
    #[error("ANSWER directive has no text")]
    MissingText,
}

/// One step of a decision. On the wire each directive is a string whose
/// leading tag, up to the first colon, selects the variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Directive {
    /// `EXECUTE: <cmd>`
    Execute { cmd: String },
    /// `EXECUTE AND CONFIRM: <cmd>`
    ExecuteConfirm { cmd: String },
    /// `ANSWER: <text>`
    Answer { text: String },
    /// `NOINFO`, optionally followed by a colon and ignored text.
    NoInfo,
}

impl Directive {
    pub fn execute(cmd: impl Into<String>) -> Self {
        Directive::Execute { cmd: cmd.into() }
    }

    pub fn execute_confirm(cmd: impl Into<String>) -> Self {
        Directive::ExecuteConfirm { cmd: cmd.into() }
    }

    pub fn answer(text: impl Into<String>) -> Self {
        Directive::Answer { text: text.into() }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Directive::Execute { .. } => EXECUTE,
            Directive::ExecuteConfirm { .. } => EXECUTE_CONFIRM,
            Directive::Answer { .. } => ANSWER,
            Directive::NoInfo => NOINFO,
        }
    }

    /// The shell command, for the variants that run one.
    pub fn command(&self) -> Option<&str> {
        match self {
            Directive::Execute { cmd } | Directive::ExecuteConfirm { cmd } => Some(cmd),
            Directive::Answer { .. } | Directive::NoInfo => None,
        }
    }

    pub fn requires_subprocess(&self) -> bool {
        self.command().is_some()
    }
}

impl FromStr for Directive {
    type Err = DirectiveParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (tag, body) = match s.split_once(':') {
            Some((tag, body)) => (tag.trim(), body.trim()),
            None => (s, ""),
        };

        match tag {
            EXECUTE if body.is_empty() => Err(DirectiveParseError::MissingCommand(EXECUTE)),
            EXECUTE => Ok(Directive::execute(body)),
            EXECUTE_CONFIRM if body.is_empty() => {
                Err(DirectiveParseError::MissingCommand(EXECUTE_CONFIRM))
            }
            EXECUTE_CONFIRM => Ok(Directive::execute_confirm(body)),
            ANSWER if body.is_empty() => Err(DirectiveParseError::MissingText),
            ANSWER => Ok(Directive::answer(body)),
            NOINFO => Ok(Directive::NoInfo),
            _ => Err(DirectiveParseError::UnknownTag(s.to_string())),
        }
    }
}

impl TryFrom<String> for Directive {
    type Error = DirectiveParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Directive> for String {
    fn from(directive: Directive) -> Self {
        directive.to_string()
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directive::Execute { cmd } | Directive::ExecuteConfirm { cmd } => {
                write!(f, "{}: {}", self.tag(), cmd)
            }
            Directive::Answer { text } => write!(f, "{}: {}", ANSWER, text),
            Directive::NoInfo => f.write_str(NOINFO),
        }
    }
}
