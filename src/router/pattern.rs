//! Path template compilation.
//!
//! Turns a template such as `/users/{id:\d+}/posts/{slug}` into an anchored
//! [`Regex`] plus the ordered list of placeholder names. Literal text is escaped
//! so that regex metacharacters in the template match themselves; placeholders
//! become capturing groups using their constraint, or `[^/]+` when none is given.
//!
//! The scan tracks brace depth so constraints may carry their own braces
//! (`{year:\d{4}}`). Outside a placeholder `\{` and `\}` author literal braces.
//! Inside a placeholder every `\x` pair is copied verbatim into the constraint and
//! never affects the depth count.

use std::fmt;
use std::sync::Arc;

use regex::{Captures, Regex};

use crate::error::ConfigError;

/// Constraint used for placeholders declared without one.
pub const DEFAULT_CONSTRAINT: &str = "[^/]+";

/// A compiled path template.
///
/// Immutable once built. The number of capture groups in [`regex`](Self::regex)
/// always equals the number of [`param_names`](Self::param_names), so captures can
/// be zipped positionally with names.
#[derive(Clone)]
pub struct CompiledPattern {
    regex: Regex,
    param_names: Vec<Arc<str>>,
}

impl CompiledPattern {
    /// The anchored regular expression.
    #[must_use]
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Source of the anchored regular expression (e.g. `^/users/([^/]+)$`).
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Placeholder names in left-to-right declaration order.
    #[must_use]
    pub fn param_names(&self) -> &[Arc<str>] {
        &self.param_names
    }

    /// Number of capturing groups (excluding the implicit whole-match group).
    #[must_use]
    pub fn capture_count(&self) -> usize {
        self.regex.captures_len() - 1
    }

    /// Full-string match against a request path.
    #[inline]
    #[must_use]
    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Captures for a request path, or `None` when it does not match structurally.
    #[inline]
    #[must_use]
    pub fn captures<'p>(&self, path: &'p str) -> Option<Captures<'p>> {
        self.regex.captures(path)
    }
}

impl PartialEq for CompiledPattern {
    fn eq(&self, other: &Self) -> bool {
        self.regex.as_str() == other.regex.as_str() && self.param_names == other.param_names
    }
}

impl Eq for CompiledPattern {}

impl fmt::Debug for CompiledPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledPattern")
            .field("regex", &self.regex.as_str())
            .field("param_names", &self.param_names)
            .finish()
    }
}

/// Compile a path template.
///
/// # Errors
///
/// Returns a [`ConfigError`] when the template does not start with `/` or
/// contains spaces, when braces are unbalanced, when a placeholder has no name,
/// when a constraint is not a valid regular expression, or when a constraint
/// adds capturing groups of its own.
///
/// # Example
///
/// ```rust
/// use simplerouter::router::compile;
///
/// let pattern = compile(r"/users/{id:\d+}/posts/{slug}").unwrap();
/// assert_eq!(pattern.as_str(), r"^/users/(\d+)/posts/([^/]+)$");
/// assert_eq!(pattern.param_names().len(), 2);
/// ```
pub fn compile(template: &str) -> Result<CompiledPattern, ConfigError> {
    validate_template(template)?;

    let mut pattern = String::with_capacity(template.len() + 8);
    pattern.push('^');
    let mut param_names = Vec::with_capacity(template.matches('{').count());

    let mut literal = String::new();
    let mut body = String::new();
    let mut depth = 0usize;
    let mut chars = template.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' if depth == 0 => match chars.clone().next() {
                Some(brace @ ('{' | '}')) => {
                    chars.next();
                    literal.push(brace);
                }
                _ => literal.push('\\'),
            },
            '\\' => {
                body.push('\\');
                if let Some(escaped) = chars.next() {
                    body.push(escaped);
                }
            }
            '{' => {
                if depth == 0 {
                    pattern.push_str(&regex::escape(&literal));
                    literal.clear();
                } else {
                    body.push('{');
                }
                depth += 1;
            }
            '}' => {
                if depth == 0 {
                    return Err(ConfigError::TooManyClosingBraces {
                        template: template.to_string(),
                    });
                }
                depth -= 1;
                if depth == 0 {
                    push_placeholder(template, &body, &mut pattern, &mut param_names)?;
                    body.clear();
                } else {
                    body.push('}');
                }
            }
            _ if depth == 0 => literal.push(c),
            _ => body.push(c),
        }
    }

    if depth != 0 {
        return Err(ConfigError::UnbalancedBraces {
            template: template.to_string(),
        });
    }

    pattern.push_str(&regex::escape(&literal));
    pattern.push('$');

    let regex = Regex::new(&pattern).map_err(|source| ConfigError::InvalidConstraint {
        template: template.to_string(),
        source,
    })?;

    let groups = regex.captures_len() - 1;
    if groups != param_names.len() {
        return Err(ConfigError::CaptureGroupMismatch {
            template: template.to_string(),
            names: param_names.len(),
            groups,
        });
    }

    Ok(CompiledPattern { regex, param_names })
}

fn validate_template(template: &str) -> Result<(), ConfigError> {
    if !template.starts_with('/') || template.contains(' ') {
        return Err(ConfigError::InvalidPath(template.to_string()));
    }
    Ok(())
}

fn push_placeholder(
    template: &str,
    body: &str,
    pattern: &mut String,
    param_names: &mut Vec<Arc<str>>,
) -> Result<(), ConfigError> {
    let (name, constraint) = match body.split_once(':') {
        Some((name, constraint)) if !constraint.is_empty() => (name, constraint),
        Some((name, _)) => (name, DEFAULT_CONSTRAINT),
        None => (body, DEFAULT_CONSTRAINT),
    };

    if name.is_empty() {
        return Err(ConfigError::EmptyParameterName {
            template: template.to_string(),
        });
    }

    pattern.push('(');
    pattern.push_str(constraint);
    pattern.push(')');
    param_names.push(Arc::from(name));
    Ok(())
}
