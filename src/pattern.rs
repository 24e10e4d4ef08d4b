//! Parsing of route patterns into segments.

use {
    crate::error::{Error, Result},
    regex::Regex,
    std::fmt,
};

/// A single piece of a route pattern.
#[derive(Debug, Clone)]
pub(crate) enum Segment {
    /// A run of literal bytes.
    Literal(String),

    /// `{name}` — consumes greedily up to the byte following this
    /// segment in the pattern and binds the consumed run to `name`.
    Wildcard(String),

    /// `{name:expr}` — a regular expression anchored at the current
    /// position, bound to `name`.
    Regex {
        name: String,
        expr: String,
        compiled: Regex,
    },
}

impl Segment {
    pub(crate) fn is_literal(&self) -> bool {
        match self {
            Segment::Literal(..) => true,
            _ => false,
        }
    }
}

impl PartialEq for Segment {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Segment::Literal(a), Segment::Literal(b)) => a == b,
            (Segment::Wildcard(a), Segment::Wildcard(b)) => a == b,
            (
                Segment::Regex { name, expr, .. },
                Segment::Regex {
                    name: other_name,
                    expr: other_expr,
                    ..
                },
            ) => name == other_name && expr == other_expr,
            _ => false,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Literal(s) => f.write_str(s),
            Segment::Wildcard(name) => write!(f, "{{{}}}", name),
            Segment::Regex { name, expr, .. } => write!(f, "{{{}:{}}}", name, expr),
        }
    }
}

/// Splits a pattern string into its ordered segments.
///
/// A wildcard consumes greedily until the first byte of the following
/// literal, so two non-literal segments in a row are rejected: the first
/// would have no byte telling it where to stop.
pub(crate) fn segments(pattern: &str) -> Result<Vec<Segment>> {
    if pattern.is_empty() {
        return Err(Error::invalid_input("pattern cannot be empty"));
    }
    if !pattern.is_ascii() {
        return Err(Error::invalid_input(format!(
            "pattern {:?} must be a sequence of ASCII characters",
            pattern
        )));
    }

    let mut segments = Vec::new();
    let mut rest = pattern;
    while !rest.is_empty() {
        if rest.as_bytes()[0] == b'{' {
            let close = rest.find('}').ok_or_else(|| {
                Error::invalid_input(format!("missing closing '}}' in {:?}", pattern))
            })?;
            let body = &rest[1..close];
            let segment = match body.find(':') {
                Some(i) => {
                    let (name, expr) = (&body[..i], &body[i + 1..]);
                    validate_name(name)?;
                    Segment::Regex {
                        name: name.to_owned(),
                        expr: expr.to_owned(),
                        compiled: compile_anchored(expr)?,
                    }
                }
                None => {
                    validate_name(body)?;
                    Segment::Wildcard(body.to_owned())
                }
            };
            segments.push(segment);
            rest = &rest[close + 1..];
        } else {
            let end = rest.find('{').unwrap_or_else(|| rest.len());
            let (literal, tail) = rest.split_at(end);
            if literal.contains('}') {
                return Err(Error::invalid_input(format!(
                    "unbalanced '}}' in {:?}",
                    pattern
                )));
            }
            segments.push(Segment::Literal(literal.to_owned()));
            rest = tail;
        }
    }

    for pair in segments.windows(2) {
        if !pair[0].is_literal() && !pair[1].is_literal() {
            return Err(Error::invalid_input(format!(
                "adjacent wildcard segments without a separator in {:?}",
                pattern
            )));
        }
    }

    Ok(segments)
}

/// Compiles `expr` so that matching starts at the current input position.
pub(crate) fn compile_anchored(expr: &str) -> Result<Regex> {
    Regex::new(&format!("^(?:{})", expr)).map_err(|e| {
        Error::invalid_input(format!("invalid regular expression {:?}: {}", expr, e))
    })
}

fn validate_name(name: &str) -> Result<()> {
    let mut bytes = name.bytes();
    let valid = match bytes.next() {
        Some(b) => {
            (b.is_ascii_alphabetic() || b == b'_')
                && bytes.all(|b| b.is_ascii_alphanumeric() || b == b'_')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(Error::invalid_input(format!(
            "invalid parameter name {:?}",
            name
        )))
    }
}

/// Splits `s` by `delim`, honoring `\` as an escape for the next character.
///
/// Used at the route-declaration layer, where one resource may declare
/// several comma-separated paths; the segment parser itself never sees
/// escapes.
pub(crate) fn split_escape(s: &str, delim: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut escaped = false;
    for c in s.chars() {
        if escaped {
            current.push(c);
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == delim {
            parts.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}
