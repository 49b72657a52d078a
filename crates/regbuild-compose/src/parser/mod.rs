//! Recipe parser built on `nom`.
//!
//! Transforms raw recipe text into a validated [`Recipe`] through
//! lexing, directive parsing, and static checks.

pub mod ast;
pub mod lexer;
pub mod validator;

use std::io::Read;
use std::path::PathBuf;

use regbuild_common::error::{BuildError, Result};

use self::ast::{ArgDecl, Recipe, Stage};
use self::lexer::LogicalLine;

const FROM: &str = "FROM";
const ARG: &str = "ARG";
const AS: &str = "AS";
const FLAG_PREFIX: &str = "--";
const PLATFORM_FLAG: &str = "--platform=";

/// Parses a recipe from its source text.
///
/// # Errors
///
/// Returns a parse error for a malformed `FROM` or `ARG` directive, or if
/// the recipe fails validation.
pub fn parse_recipe(input: &str) -> Result<Recipe> {
    let mut recipe = Recipe::default();

    for line in lexer::logical_lines(input) {
        let words = lexer::tokenize(&line.text)?;
        let Some((instruction, args)) = words.split_first() else {
            continue;
        };

        if instruction.eq_ignore_ascii_case(FROM) {
            recipe.stages.push(parse_from(&line, args)?);
        } else if instruction.eq_ignore_ascii_case(ARG) && recipe.stages.is_empty() {
            recipe.global_args.extend(parse_arg(&line, args)?);
        }
    }

    validator::validate(&recipe)?;
    tracing::debug!(stages = recipe.stages.len(), "parsed recipe");
    Ok(recipe)
}

/// Reads a whole recipe stream and parses it.
///
/// # Errors
///
/// Returns an I/O error if the stream cannot be read, otherwise the same
/// errors as [`parse_recipe`].
pub fn read_recipe(mut reader: impl Read) -> Result<Recipe> {
    let mut content = String::new();
    let _ = reader
        .read_to_string(&mut content)
        .map_err(|e| BuildError::Io {
            path: PathBuf::from("<recipe stream>"),
            source: e,
        })?;
    parse_recipe(&content)
}

fn parse_from(line: &LogicalLine, args: &[String]) -> Result<Stage> {
    let mut platform = None;
    let mut rest = args.iter().peekable();
    while let Some(flag) = rest.next_if(|w| w.starts_with(FLAG_PREFIX)) {
        if let Some(value) = flag.strip_prefix(PLATFORM_FLAG) {
            platform = Some(value.to_string());
        }
    }

    let Some(image) = rest.next() else {
        return Err(parse_err(line, "FROM requires an image reference"));
    };

    let alias = match rest.next() {
        None => None,
        Some(keyword) if keyword.eq_ignore_ascii_case(AS) => match rest.next() {
            Some(alias) => Some(alias.clone()),
            None => return Err(parse_err(line, "AS requires a stage name")),
        },
        Some(other) => {
            return Err(parse_err(line, &format!("expected AS, got `{other}`")));
        }
    };

    if let Some(extra) = rest.next() {
        return Err(parse_err(line, &format!("unexpected token `{extra}` after stage name")));
    }

    Ok(Stage {
        image: image.clone(),
        alias,
        platform,
        line: line.text.clone(),
    })
}

fn parse_arg(line: &LogicalLine, args: &[String]) -> Result<Vec<ArgDecl>> {
    if args.is_empty() {
        return Err(parse_err(line, "ARG requires a name"));
    }
    args.iter()
        .map(|arg| match arg.split_once('=') {
            Some(("", _)) => Err(parse_err(line, "ARG name is empty")),
            Some((name, default)) => Ok(ArgDecl {
                name: name.to_string(),
                default: Some(unquote(default).to_string()),
            }),
            None => Ok(ArgDecl {
                name: arg.clone(),
                default: None,
            }),
        })
        .collect()
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

fn parse_err(line: &LogicalLine, message: &str) -> BuildError {
    BuildError::Parse {
        line: line.text.clone(),
        message: format!("line {}: {message}", line.number),
    }
}
