//! Matchers attached to the nodes of the pattern tree.

use {crate::pattern::Segment, regex::Regex};

/// The kind of a matcher.
///
/// The ordering is the child priority: children of a node are visited in
/// ascending kind order, so literal siblings win over regex siblings and
/// regex siblings over wildcards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum MatcherKind {
    Literal,
    Regex,
    Wildcard,
}

/// The outcome of matching a matcher against an input prefix.
#[derive(Debug, PartialEq)]
pub(crate) struct Match<'i> {
    pub(crate) matched: bool,
    /// The bytes consumed from the front of the input.
    pub(crate) consumed: &'i str,
    /// What remains after `consumed`; equal to the whole input when
    /// nothing was consumed.
    pub(crate) tail: &'i str,
}

impl<'i> Match<'i> {
    fn hit(input: &'i str, end: usize) -> Self {
        Match {
            matched: true,
            consumed: &input[..end],
            tail: &input[end..],
        }
    }

    fn miss(input: &'i str) -> Self {
        Match {
            matched: false,
            consumed: "",
            tail: input,
        }
    }
}

/// The outcome of structurally comparing a matcher with an incoming
/// segment at insert time.
#[derive(Debug, PartialEq)]
pub(crate) struct Parsed {
    /// The matcher and the segment describe the same input set.
    pub(crate) equal: bool,
    /// The shared prefix; empty means the two cannot share a node.
    pub(crate) common: String,
    /// The part of the segment not covered by `common`.
    pub(crate) seg_tail: String,
    /// The part of the matcher not covered by `common`.
    pub(crate) self_tail: String,
}

impl Parsed {
    fn disjoint(seg: &Segment, data: String) -> Self {
        Parsed {
            equal: false,
            common: String::new(),
            seg_tail: seg.to_string(),
            self_tail: data,
        }
    }

    fn equal() -> Self {
        Parsed {
            equal: true,
            common: String::new(),
            seg_tail: String::new(),
            self_tail: String::new(),
        }
    }
}

#[derive(Debug)]
pub(crate) enum Matcher {
    Literal(LiteralMatcher),
    Regex(RegexMatcher),
    Wildcard(WildcardMatcher),
}

#[derive(Debug)]
pub(crate) struct LiteralMatcher {
    data: String,
}

#[derive(Debug)]
pub(crate) struct WildcardMatcher {
    name: String,
    trail: Option<u8>,
}

#[derive(Debug)]
pub(crate) struct RegexMatcher {
    name: String,
    expr: String,
    compiled: Regex,
    trail: Option<u8>,
}

impl Matcher {
    /// Creates the matcher realizing `segment`.
    ///
    /// Regular expressions were compiled and validated by the pattern
    /// parser; no validation happens here.
    pub(crate) fn new(segment: &Segment) -> Self {
        match segment {
            Segment::Literal(s) => Matcher::Literal(LiteralMatcher { data: s.clone() }),
            Segment::Wildcard(name) => Matcher::Wildcard(WildcardMatcher {
                name: name.clone(),
                trail: None,
            }),
            Segment::Regex {
                name,
                expr,
                compiled,
            } => Matcher::Regex(RegexMatcher {
                name: name.clone(),
                expr: expr.clone(),
                compiled: compiled.clone(),
                trail: None,
            }),
        }
    }

    pub(crate) fn literal(data: String) -> Self {
        Matcher::Literal(LiteralMatcher { data })
    }

    pub(crate) fn kind(&self) -> MatcherKind {
        match self {
            Matcher::Literal(..) => MatcherKind::Literal,
            Matcher::Regex(..) => MatcherKind::Regex,
            Matcher::Wildcard(..) => MatcherKind::Wildcard,
        }
    }

    /// The parameter name bound by this matcher, if any.
    pub(crate) fn name(&self) -> Option<&str> {
        match self {
            Matcher::Literal(..) => None,
            Matcher::Regex(m) => Some(&m.name),
            Matcher::Wildcard(m) => Some(&m.name),
        }
    }

    /// A stable textual form, used by debug walks over the tree.
    pub(crate) fn data(&self) -> String {
        match self {
            Matcher::Literal(m) => m.data.clone(),
            Matcher::Wildcard(m) => format!("{{{}}}", m.name),
            Matcher::Regex(m) => format!("{{{}:{}}}", m.name, m.expr),
        }
    }

    /// Records the byte that ends greedy consumption.
    ///
    /// Set by the parent insert when the cursor moves from a wildcard or
    /// regex into a following literal; the first insert wins.
    pub(crate) fn set_trail(&mut self, trail: u8) {
        match self {
            Matcher::Literal(..) => {}
            Matcher::Wildcard(m) => {
                m.trail.get_or_insert(trail);
            }
            Matcher::Regex(m) => {
                m.trail.get_or_insert(trail);
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn trail(&self) -> Option<u8> {
        match self {
            Matcher::Literal(..) => None,
            Matcher::Wildcard(m) => m.trail,
            Matcher::Regex(m) => m.trail,
        }
    }

    /// Matches this matcher against the front of `input`.
    pub(crate) fn find<'i>(&self, input: &'i str) -> Match<'i> {
        match self {
            Matcher::Literal(m) => {
                let common = common_prefix_len(m.data.as_bytes(), input.as_bytes());
                if common == m.data.len() {
                    Match::hit(input, common)
                } else {
                    Match::miss(input)
                }
            }
            Matcher::Wildcard(m) => {
                let end = stop_at(input, m.trail);
                if end == 0 {
                    Match::miss(input)
                } else {
                    Match::hit(input, end)
                }
            }
            Matcher::Regex(m) => {
                let candidate = &input[..stop_at(input, m.trail)];
                match m.compiled.find(candidate) {
                    Some(found) if !found.as_str().is_empty() => Match::hit(input, found.end()),
                    _ => Match::miss(input),
                }
            }
        }
    }

    /// Compares this matcher with an incoming segment at insert time.
    ///
    /// Only literals can share a prefix; wildcard and regex matchers are
    /// either equal to the segment or disjoint.
    pub(crate) fn parse(&self, segment: &Segment) -> Parsed {
        match (self, segment) {
            (Matcher::Literal(m), Segment::Literal(s)) => {
                let common = common_prefix_len(m.data.as_bytes(), s.as_bytes());
                Parsed {
                    equal: common == m.data.len() && common == s.len(),
                    common: s[..common].to_owned(),
                    seg_tail: s[common..].to_owned(),
                    self_tail: m.data[common..].to_owned(),
                }
            }
            (Matcher::Wildcard(m), Segment::Wildcard(name)) if *name == m.name => Parsed::equal(),
            (Matcher::Regex(m), Segment::Regex { name, expr, .. })
                if *name == m.name && *expr == m.expr =>
            {
                Parsed::equal()
            }
            _ => Parsed::disjoint(segment, self.data()),
        }
    }
}

/// The position of the trail byte in `input`, or the input length when the
/// trail is unset or absent.
fn stop_at(input: &str, trail: Option<u8>) -> usize {
    match trail {
        Some(t) => input
            .bytes()
            .position(|b| b == t)
            .unwrap_or_else(|| input.len()),
        None => input.len(),
    }
}

fn common_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}
