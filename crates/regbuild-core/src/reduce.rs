//! Fixed-point `${name}` substitution over a flat variable map.
//!
//! Each rewriting pass replaces only the innermost complete markers, so a
//! nested reference such as `${${a}${b}}` first becomes `${xy}` and is looked
//! up on the next pass. Passes repeat until nothing is rewritten or
//! [`MAX_NESTING_DEPTH`] is exceeded.
//!
//! References to names that are not in the map are left untouched.

use std::collections::{BTreeMap, BTreeSet};

use regbuild_common::constants::MAX_NESTING_DEPTH;
use regbuild_common::error::{BuildError, Result};

const MARKER_OPEN: &str = "${";
const MARKER_CLOSE: char = '}';

/// Resolves every reference in `vars` against the map itself.
///
/// The result does not depend on map iteration order. On failure no partial
/// map is returned.
///
/// # Errors
///
/// Returns [`BuildError::VariableCycle`] when a name requires its own value,
/// or [`BuildError::NestingTooDeep`] when a value keeps producing markers.
pub fn reduce(vars: &BTreeMap<String, String>) -> Result<BTreeMap<String, String>> {
    let mut reducer = Reducer {
        templates: vars,
        resolved: BTreeMap::new(),
        in_progress: BTreeSet::new(),
    };
    for name in vars.keys() {
        let _ = reducer.resolve(name)?;
    }
    tracing::debug!(count = reducer.resolved.len(), "reduced variable map");
    Ok(reducer.resolved)
}

/// Substitutes markers in `template` using `lookup` until a fixed point.
///
/// Never fails: unknown names stay literal and rewriting stops silently at
/// the nesting cap.
pub fn expand_with<F>(template: &str, mut lookup: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    let mut value = template.to_string();
    for _ in 0..=MAX_NESTING_DEPTH {
        let Ok((next, rewritten)) = substitute_pass(&value, |name| Ok(lookup(name))) else {
            break;
        };
        if !rewritten {
            break;
        }
        value = next;
    }
    value
}

struct Reducer<'a> {
    templates: &'a BTreeMap<String, String>,
    resolved: BTreeMap<String, String>,
    in_progress: BTreeSet<String>,
}

impl Reducer<'_> {
    fn resolve(&mut self, name: &str) -> Result<String> {
        if let Some(value) = self.resolved.get(name) {
            return Ok(value.clone());
        }
        if !self.in_progress.insert(name.to_string()) {
            return Err(BuildError::VariableCycle {
                name: name.to_string(),
            });
        }

        let mut value = self.templates.get(name).cloned().unwrap_or_default();
        let mut passes = 0;
        loop {
            let (next, rewritten) = substitute_pass(&value, |key| {
                if self.templates.contains_key(key) {
                    self.resolve(key).map(Some)
                } else {
                    Ok(None)
                }
            })?;
            if !rewritten {
                break;
            }
            passes += 1;
            if passes > MAX_NESTING_DEPTH {
                return Err(BuildError::NestingTooDeep {
                    name: name.to_string(),
                    depth: MAX_NESTING_DEPTH,
                });
            }
            value = next;
        }

        let _ = self.in_progress.remove(name);
        let _ = self.resolved.insert(name.to_string(), value.clone());
        Ok(value)
    }
}

/// Rewrites each innermost complete marker once.
///
/// Returns the new string and whether any marker was replaced.
fn substitute_pass<F>(input: &str, mut lookup: F) -> Result<(String, bool)>
where
    F: FnMut(&str) -> Result<Option<String>>,
{
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    let mut rewritten = false;

    while let Some(start) = rest.find(MARKER_OPEN) {
        let body_start = start + MARKER_OPEN.len();
        let body = &rest[body_start..];
        match (body.find(MARKER_CLOSE), body.find(MARKER_OPEN)) {
            (Some(end), Some(inner)) if inner < end => {
                // Not innermost: keep the prefix and retry at the inner marker.
                out.push_str(&rest[..body_start + inner]);
                rest = &body[inner..];
            }
            (Some(end), _) => {
                out.push_str(&rest[..start]);
                match lookup(&body[..end])? {
                    Some(value) => {
                        out.push_str(&value);
                        rewritten = true;
                    }
                    None => out.push_str(&rest[start..=body_start + end]),
                }
                rest = &body[end + 1..];
            }
            (None, _) => break,
        }
    }

    out.push_str(rest);
    Ok((out, rewritten))
}
