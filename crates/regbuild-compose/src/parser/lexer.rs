//! Tokenization of recipe text using `nom`.
//!
//! Raw text is first folded into logical lines (comments and blank lines
//! dropped, backslash continuations joined), then each line is split into
//! whitespace-separated words.

use nom::{
    IResult, Parser,
    bytes::complete::take_while1,
    character::complete::multispace0,
    multi::many0,
    sequence::{preceded, terminated},
};
use regbuild_common::error::{BuildError, Result};

const CONTINUATION: char = '\\';
const COMMENT: char = '#';

/// One instruction after continuation folding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalLine {
    /// 1-based number of the physical line the instruction starts on.
    pub number: usize,
    /// The folded instruction text.
    pub text: String,
}

/// Folds recipe text into logical lines.
pub fn logical_lines(input: &str) -> Vec<LogicalLine> {
    let mut lines = Vec::new();
    let mut pending: Option<LogicalLine> = None;

    for (idx, raw) in input.lines().enumerate() {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with(COMMENT) {
            continue;
        }

        let (body, continues) = match trimmed.strip_suffix(CONTINUATION) {
            Some(body) => (body.trim_end(), true),
            None => (trimmed, false),
        };

        let line = match pending.take() {
            Some(mut line) => {
                line.text.push(' ');
                line.text.push_str(body);
                line
            }
            None => LogicalLine {
                number: idx + 1,
                text: body.to_string(),
            },
        };

        if continues {
            pending = Some(line);
        } else {
            lines.push(line);
        }
    }

    if let Some(line) = pending {
        lines.push(line);
    }
    lines
}

fn word(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| !c.is_whitespace()).parse(input)
}

fn words(input: &str) -> IResult<&str, Vec<&str>> {
    terminated(many0(preceded(multispace0, word)), multispace0).parse(input)
}

/// Splits a logical line into words.
///
/// # Errors
///
/// Returns a parse error if the line cannot be fully consumed.
pub fn tokenize(line: &str) -> Result<Vec<String>> {
    let (rest, found) =
        words(line).map_err(|e| BuildError::parse(line, format!("lexer error: {e}")))?;
    if !rest.is_empty() {
        return Err(BuildError::parse(line, format!("unexpected input: {rest}")));
    }
    Ok(found.into_iter().map(str::to_string).collect())
}
