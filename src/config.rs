//! Chain configuration: one directive per line, a name followed by its
//! arguments, `#` starting a comment.
//!
//! ```text
//! hostmap
//! forward 8.8.8.8:53
//! ```

use thiserror::Error;

/// Name of this stage's directive.
pub const DIRECTIVE: &str = "hostmap";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub name: String,
    pub args: Vec<String>,
    /// 1-based line in the configuration text.
    pub line: usize,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("line {line}: {directive}: unexpected argument '{token}'")]
    UnexpectedArgument {
        directive: String,
        token: String,
        line: usize,
    },

    #[error("line {line}: {directive} expects {expected}")]
    MissingArgument {
        directive: String,
        expected: &'static str,
        line: usize,
    },

    #[error("line {line}: {directive}: invalid argument '{token}'")]
    InvalidArgument {
        directive: String,
        token: String,
        line: usize,
    },

    #[error("line {line}: unknown directive '{name}'")]
    UnknownDirective { name: String, line: usize },

    #[error("no directives configured")]
    Empty,
}

/// Splits configuration text into directives, skipping blank lines and
/// comments.
pub fn parse_directives(text: &str) -> Vec<Directive> {
    text.lines()
        .enumerate()
        .filter_map(|(i, line)| {
            let line_text = line.split('#').next().unwrap_or_default();
            let mut tokens = line_text.split_whitespace().map(str::to_string);
            let name = tokens.next()?;
            Some(Directive {
                name,
                args: tokens.collect(),
                line: i + 1,
            })
        })
        .collect()
}

/// Validates a `hostmap` directive. The stage takes no options, so any token
/// after the directive name is an error.
pub fn setup(directive: &Directive) -> Result<(), ConfigError> {
    match directive.args.first() {
        Some(token) => Err(ConfigError::UnexpectedArgument {
            directive: directive.name.clone(),
            token: token.clone(),
            line: directive.line,
        }),
        None => Ok(()),
    }
}
