//! Paramstyle conversion
//!
//! Rewrites a statement written in one of the five DB-API paramstyles into the
//! `$n` positional form the wire protocol expects, and produces the mapping
//! from caller arguments to the flat positional argument list.
//!
//! The converter is a character scanner. Placeholders inside string literals,
//! quoted identifiers and comments are copied through untouched.

use crate::error::{Error, Result};
use crate::types::{Params, Value};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Paramstyle
// ============================================================================

/// Placeholder convention used in statements handed to a cursor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Paramstyle {
    /// `WHERE a = ?`
    Qmark,
    /// `WHERE a = :1`
    Numeric,
    /// `WHERE a = :name`
    Named,
    /// `WHERE a = %s`
    #[default]
    Format,
    /// `WHERE a = %(name)s`
    Pyformat,
}

impl Paramstyle {
    /// Lowercase DB-API name
    pub fn as_str(&self) -> &'static str {
        match self {
            Paramstyle::Qmark => "qmark",
            Paramstyle::Numeric => "numeric",
            Paramstyle::Named => "named",
            Paramstyle::Format => "format",
            Paramstyle::Pyformat => "pyformat",
        }
    }
}

impl fmt::Display for Paramstyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Paramstyle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "qmark" => Ok(Paramstyle::Qmark),
            "numeric" => Ok(Paramstyle::Numeric),
            "named" => Ok(Paramstyle::Named),
            "format" => Ok(Paramstyle::Format),
            "pyformat" => Ok(Paramstyle::Pyformat),
            other => Err(Error::interface(format!(
                "Invalid paramstyle '{other}'. Expected one of: qmark, numeric, named, format, pyformat"
            ))),
        }
    }
}

// ============================================================================
// Converted statement
// ============================================================================

/// A statement rewritten to `$n` placeholders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedStatement {
    /// Rewritten SQL
    pub sql: String,
    /// Placeholder names in `$n` order; `None` for positional statements
    placeholders: Option<Vec<String>>,
}

impl ConvertedStatement {
    /// Names bound to `$1`, `$2`, ... for name-bound statements
    pub fn placeholders(&self) -> Option<&[String]> {
        self.placeholders.as_deref()
    }

    /// Map caller params into the flat positional argument list
    pub fn make_args(&self, params: &Params) -> Result<Vec<Value>> {
        match (&self.placeholders, params) {
            (None, Params::None) => Ok(Vec::new()),
            (None, Params::Positional(values)) => Ok(values.clone()),
            (None, Params::Named(_)) => Err(Error::programming(
                "Positional placeholders require a sequence of parameters",
            )),
            (Some(names), _) if names.is_empty() => match params {
                Params::Positional(values) => Ok(values.clone()),
                _ => Ok(Vec::new()),
            },
            (Some(names), Params::Named(map)) => names
                .iter()
                .map(|name| {
                    map.get(name).cloned().ok_or_else(|| {
                        Error::programming(format!("Missing value for parameter '{name}'"))
                    })
                })
                .collect(),
            (Some(_), _) => Err(Error::programming(
                "Named placeholders require a mapping of parameters",
            )),
        }
    }
}

// ============================================================================
// Scanner
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Outside,
    /// `'...'`
    SingleQuoted,
    /// `"..."`
    QuotedIdent,
    /// `E'...'`
    EscapeString,
    /// `:name`, `%(name)s` or the `s` of `%s`
    ParamName,
    /// `-- ...` up to end of line
    LineComment,
    /// `/* ... */`
    BlockComment,
}

/// Rewrite `query` from `style` placeholders into `$n` placeholders
///
/// A `pyformat` statement that uses a bare `%s` is scanned with `format`
/// rules from that point on.
pub fn convert_paramstyle(style: Paramstyle, query: &str) -> Result<ConvertedStatement> {
    let chars: Vec<char> = query.chars().collect();
    let mut style = style;
    let mut state = State::Outside;
    let mut in_quote_escape = false;
    let mut in_param_escape = false;
    let mut placeholders: Vec<String> = Vec::new();
    let mut positional = 0usize;
    let mut out = String::with_capacity(query.len() + 8);
    let mut prev: Option<char> = None;

    for (i, &c) in chars.iter().enumerate() {
        let next = chars.get(i + 1).copied();

        match state {
            State::Outside => match c {
                '\'' => {
                    out.push(c);
                    state = if prev == Some('E') {
                        State::EscapeString
                    } else {
                        State::SingleQuoted
                    };
                }
                '"' => {
                    out.push(c);
                    state = State::QuotedIdent;
                }
                '-' => {
                    out.push(c);
                    if prev == Some('-') {
                        state = State::LineComment;
                    }
                }
                '*' => {
                    out.push(c);
                    if prev == Some('/') {
                        state = State::BlockComment;
                    }
                }
                '?' if style == Paramstyle::Qmark => {
                    positional += 1;
                    out.push_str(&format!("${positional}"));
                }
                ':' if style == Paramstyle::Numeric && is_lone_colon(prev, next) => {
                    out.push('$');
                }
                ':' if style == Paramstyle::Named && is_lone_colon(prev, next) => {
                    state = State::ParamName;
                    placeholders.push(String::new());
                }
                '%' if style == Paramstyle::Pyformat && next == Some('(') => {
                    state = State::ParamName;
                    placeholders.push(String::new());
                }
                '%' if matches!(style, Paramstyle::Format | Paramstyle::Pyformat) => {
                    style = Paramstyle::Format;
                    if in_param_escape {
                        in_param_escape = false;
                        out.push(c);
                    } else {
                        match next {
                            Some('%') => in_param_escape = true,
                            Some('s') => {
                                state = State::ParamName;
                                positional += 1;
                                out.push_str(&format!("${positional}"));
                            }
                            _ => {
                                return Err(Error::interface(
                                    "Only %s and %% are supported in the query.",
                                ))
                            }
                        }
                    }
                }
                _ => out.push(c),
            },

            State::SingleQuoted => {
                if c == '\'' {
                    if in_quote_escape {
                        in_quote_escape = false;
                    } else if next == Some('\'') {
                        in_quote_escape = true;
                    } else {
                        state = State::Outside;
                    }
                }
                out.push(c);
            }

            State::QuotedIdent => {
                if c == '"' {
                    state = State::Outside;
                }
                out.push(c);
            }

            State::EscapeString => {
                if c == '\'' && prev != Some('\\') {
                    state = State::Outside;
                }
                out.push(c);
            }

            State::ParamName => match style {
                Paramstyle::Named => {
                    if let Some(name) = placeholders.last_mut() {
                        name.push(c);
                    }
                    let ends = next.map_or(true, |n| !n.is_alphanumeric() && n != '_');
                    if ends {
                        state = State::Outside;
                        close_placeholder(&mut placeholders, &mut out);
                    }
                }
                Paramstyle::Pyformat => {
                    if prev == Some(')') && c == 's' {
                        state = State::Outside;
                        close_placeholder(&mut placeholders, &mut out);
                    } else if c != '(' && c != ')' {
                        if let Some(name) = placeholders.last_mut() {
                            name.push(c);
                        }
                    }
                }
                // the `s` of `%s`
                _ => state = State::Outside,
            },

            State::LineComment => {
                out.push(c);
                if c == '\n' {
                    state = State::Outside;
                }
            }

            State::BlockComment => {
                out.push(c);
                if c == '/' && prev == Some('*') {
                    state = State::Outside;
                }
            }
        }

        prev = Some(c);
    }

    let placeholders = match style {
        Paramstyle::Qmark | Paramstyle::Numeric | Paramstyle::Format => None,
        Paramstyle::Named | Paramstyle::Pyformat => Some(placeholders),
    };

    Ok(ConvertedStatement {
        sql: out,
        placeholders,
    })
}

/// A `:` starts a parameter unless it is part of `::` or `:=`
fn is_lone_colon(prev: Option<char>, next: Option<char>) -> bool {
    prev != Some(':') && matches!(next, Some(n) if n != ':' && n != '=')
}

/// Emit `$k` for the placeholder just scanned, reusing the index of an
/// earlier placeholder with the same name.
fn close_placeholder(placeholders: &mut Vec<String>, out: &mut String) {
    let Some((last, earlier)) = placeholders.split_last() else {
        return;
    };
    let reused = earlier.iter().position(|p| p == last);
    if let Some(idx) = reused {
        out.push_str(&format!("${}", idx + 1));
        placeholders.pop();
    } else {
        out.push_str(&format!("${}", placeholders.len()));
    }
}

#[cfg(test)]
mod tests;
