//! Syntax tree for build recipes.
//!
//! Only the directives that shape image lineage are kept: global `ARG`
//! declarations and the `FROM` line of each stage.

/// Root node of a parsed recipe.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recipe {
    /// `ARG` declarations preceding the first stage.
    pub global_args: Vec<ArgDecl>,
    /// Stages in file order.
    pub stages: Vec<Stage>,
}

/// A global `ARG NAME[=default]` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgDecl {
    /// Argument name.
    pub name: String,
    /// Default value, if declared.
    pub default: Option<String>,
}

/// A `FROM [--flag=value...] <image> [AS <alias>]` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    /// Image token as written; may name an earlier stage or contain ARGs.
    pub image: String,
    /// Stage alias from the `AS` clause.
    pub alias: Option<String>,
    /// Value of `--platform`, if given.
    pub platform: Option<String>,
    /// The directive's logical line, for error reporting.
    pub line: String,
}
