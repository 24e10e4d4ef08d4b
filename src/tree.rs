//! The prefix tree shared by all patterns registered on a router.

use {
    crate::{
        error::{Error, Result},
        handle::Handle,
        input::Context,
        matcher::{Matcher, MatcherKind},
        pattern::{self, Segment},
    },
    std::fmt,
};

/// A node of the pattern tree.
///
/// Every node holds one matcher. Children are kept sorted by matcher
/// kind, so lookups try literal children first, then regex, then
/// wildcard.
#[derive(Default)]
pub(crate) struct Node {
    matcher: Option<Matcher>,
    children: Vec<Node>,
    handle: Option<Handle>,
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field(
                "matcher",
                &self.matcher.as_ref().map(Matcher::data).unwrap_or_default(),
            )
            .field("children", &self.children)
            .field("has_handle", &self.handle.is_some())
            .finish()
    }
}

impl Node {
    fn with_matcher(matcher: Matcher) -> Self {
        Node {
            matcher: Some(matcher),
            children: Vec::new(),
            handle: None,
        }
    }

    /// Inserts `pattern` into the tree, attaching `handle` to the
    /// terminal node.
    ///
    /// A terminal that already carries a handle attempts a merge;
    /// handles that cannot merge surface [`Error::HandleExists`].
    pub(crate) fn insert(&mut self, pattern_str: &str, handle: Handle) -> Result<()> {
        let segments = pattern::segments(pattern_str)?;

        let mut cursor = self;
        for segment in &segments {
            if let Some(matcher) = &mut cursor.matcher {
                match (matcher.kind(), segment) {
                    (MatcherKind::Wildcard, Segment::Wildcard(..)) => {
                        return Err(Error::invalid_input(format!(
                            "adjacent wildcard segments without a separator in {:?}",
                            pattern_str
                        )));
                    }
                    (MatcherKind::Wildcard, Segment::Literal(s))
                    | (MatcherKind::Regex, Segment::Literal(s)) => {
                        // The wildcard needs the first byte of the
                        // following literal to know where to stop
                        // consuming; the first insert wins.
                        if let Some(&b) = s.as_bytes().first() {
                            matcher.set_trail(b);
                        }
                    }
                    _ => {}
                }
            }
            cursor = insert_segment(cursor, segment)?;
        }

        match &mut cursor.handle {
            Some(existing) => {
                if existing.merge(handle) {
                    Ok(())
                } else {
                    Err(Error::HandleExists(pattern_str.to_owned()))
                }
            }
            slot => {
                *slot = Some(handle);
                Ok(())
            }
        }
    }

    /// Returns `true` when `segment` can be inserted below this node
    /// without creating a sibling.
    fn accepts(&self, segment: &Segment) -> bool {
        let matcher = match &self.matcher {
            Some(m) => m,
            None => return false,
        };
        match (matcher, segment) {
            (Matcher::Literal(..), Segment::Literal(s)) => {
                // Sharing a single leading byte is enough: the insert
                // below will split on the common prefix.
                matcher.data().as_bytes().first() == s.as_bytes().first()
            }
            _ => matcher.parse(segment).equal,
        }
    }

    fn sort_children(&mut self) {
        self.children
            .sort_by_key(|child| child.matcher.as_ref().map(Matcher::kind));
    }

    /// Resolves `input` against this subtree.
    ///
    /// Returns the matched handle and the unmatched tail. A tail equal to
    /// the input means nothing was consumed here; callers treat that as a
    /// hard backtracking signal, never as a partial match.
    pub(crate) fn lookup<'n, 'i>(
        &'n self,
        cx: &mut Context,
        input: &'i str,
    ) -> (Option<&'n Handle>, &'i str) {
        if input.is_empty() {
            return (None, input);
        }
        let matcher = match &self.matcher {
            Some(m) => m,
            None => return (None, input),
        };

        let found = matcher.find(input);

        if found.matched && !found.consumed.is_empty() {
            if let Some(name) = matcher.name() {
                cx.bind(name, found.consumed);
            }
        }

        // exact terminal hit
        if found.matched && found.tail.is_empty() {
            if let Some(handle) = &self.handle {
                return (Some(handle), "");
            }
        }

        // nothing consumed
        if found.tail.len() == input.len() {
            return (None, input);
        }

        for child in &self.children {
            let (handle, tail) = child.lookup(cx, found.tail);
            if handle.is_some() {
                return (handle, tail);
            }
        }

        // a partial handle consumes whatever the children left over
        if found.matched {
            if let Some(handle) = &self.handle {
                if handle.is_partial() {
                    return (Some(handle), found.tail);
                }
            }
        }

        (None, "")
    }

    /// Visits every node depth-first with its level, the matcher's
    /// textual form and whether a handle is attached.
    pub(crate) fn walk(&self, f: &mut dyn FnMut(usize, &str, bool)) {
        self.walk_at(0, f)
    }

    fn walk_at(&self, level: usize, f: &mut dyn FnMut(usize, &str, bool)) {
        let data = self.matcher.as_ref().map(Matcher::data).unwrap_or_default();
        f(level, &data, self.handle.is_some());
        for child in &self.children {
            child.walk_at(level + 1, f);
        }
    }
}

/// Inserts one segment at `node`, returning the node it landed on.
fn insert_segment<'n>(node: &'n mut Node, segment: &Segment) -> Result<&'n mut Node> {
    let parsed = match &node.matcher {
        None => {
            node.matcher = Some(Matcher::new(segment));
            return Ok(node);
        }
        Some(matcher) if matcher.kind() != segment_kind(segment) => {
            // A node holds one matcher kind; the segment lands on a
            // child, either an existing one that accommodates it or a
            // fresh sibling.
            if let Some(i) = node.children.iter().position(|c| c.accepts(segment)) {
                return insert_segment(&mut node.children[i], segment);
            }
            return Ok(push_child(node, Matcher::new(segment)));
        }
        Some(matcher) => matcher.parse(segment),
    };

    if parsed.equal {
        return Ok(node);
    }

    if parsed.common.is_empty() {
        // Disjoint from this node and a sibling cannot be created at
        // this level. Reachable only at a tree root, e.g. two host
        // patterns without a shared leading byte.
        return Err(Error::invalid_input(format!(
            "segment {:?} shares no prefix with the tree root {:?}",
            segment.to_string(),
            parsed.self_tail
        )));
    }

    // Literal prefix split: this node keeps the common prefix while its
    // previous tail moves into a new child together with the children
    // and the handle.
    if !parsed.self_tail.is_empty() {
        let child = Node {
            matcher: Some(Matcher::literal(parsed.self_tail)),
            children: std::mem::take(&mut node.children),
            handle: node.handle.take(),
        };
        node.matcher = Some(Matcher::literal(parsed.common));
        node.children.push(child);
    }

    if parsed.seg_tail.is_empty() {
        return Ok(node);
    }

    let remainder = Segment::Literal(parsed.seg_tail);
    if let Some(i) = node.children.iter().position(|c| c.accepts(&remainder)) {
        return insert_segment(&mut node.children[i], &remainder);
    }
    Ok(push_child(node, Matcher::new(&remainder)))
}

fn push_child<'n>(node: &'n mut Node, matcher: Matcher) -> &'n mut Node {
    let kind = matcher.kind();
    node.children.push(Node::with_matcher(matcher));
    node.sort_children();

    // the sort is stable, so the pushed node is the last of its kind
    let i = node
        .children
        .iter()
        .rposition(|c| c.matcher.as_ref().map(Matcher::kind) == Some(kind))
        .unwrap_or_else(|| node.children.len() - 1);
    &mut node.children[i]
}

fn segment_kind(segment: &Segment) -> MatcherKind {
    match segment {
        Segment::Literal(..) => MatcherKind::Literal,
        Segment::Regex { .. } => MatcherKind::Regex,
        Segment::Wildcard(..) => MatcherKind::Wildcard,
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            handle::{default_method_not_allowed, MethodHandlers},
            input::{Input, RequestBody},
            output,
        },
        http::{Method, Request},
        indexmap::IndexMap,
        std::sync::Arc,
    };

    /// A method handle replying with `tag` on GET.
    fn handle(tag: &'static str) -> Handle {
        let mut handlers: IndexMap<Method, crate::handler::BoxedHandler> = IndexMap::new();
        handlers.insert(
            Method::GET,
            Arc::new(move |_: &mut Input<'_>| output::text(tag)),
        );
        Handle::Methods(MethodHandlers {
            handlers,
            method_not_allowed: Arc::new(default_method_not_allowed),
            params: None,
        })
    }

    fn shape(node: &Node) -> Vec<(usize, String, bool)> {
        let mut out = Vec::new();
        node.walk(&mut |level, data, terminal| {
            out.push((level, data.to_owned(), terminal));
        });
        out
    }

    fn serve(handle: &Handle, cx: &mut Context) -> String {
        let request = Request::builder()
            .method(Method::GET)
            .uri("/")
            .body(RequestBody::default())
            .unwrap();
        let response = handle.serve(&mut Input::new(&request, cx));
        String::from_utf8(response.body().as_bytes().to_vec()).unwrap()
    }

    fn lookup_body(node: &Node, path: &str) -> Option<String> {
        let mut cx = Context::new();
        let (handle, _) = node.lookup(&mut cx, path);
        handle.map(|h| serve(h, &mut cx))
    }

    macro_rules! t {
        ($($name:ident ([$($pattern:expr),*], $expected:expr);)*) => {$(
            #[test]
            fn $name() {
                let mut root = Node::default();
                for pattern in [$($pattern),*] {
                    root.insert(pattern, handle(pattern)).unwrap();
                }
                let expected: Vec<(usize, &str, bool)> = $expected;
                let expected: Vec<(usize, String, bool)> = expected
                    .into_iter()
                    .map(|(l, d, t)| (l, d.to_owned(), t))
                    .collect();
                assert_eq!(shape(&root), expected);
            }
        )*};
    }

    t! [
        shape_two_disjoint_suffixes(["/foo", "/bar"], vec![
            (0, "/", false),
            (1, "foo", true),
            (1, "bar", true),
        ]);
        shape_prefix_inserted_after(["/foo/bar", "/foo"], vec![
            (0, "/foo", true),
            (1, "/bar", true),
        ]);
        shape_prefix_inserted_before(["/foo", "/foo/bar"], vec![
            (0, "/foo", true),
            (1, "/bar", true),
        ]);
        shape_literal_before_wildcard(["/foo/", "/foo/bar", "/foo/{id}"], vec![
            (0, "/foo/", true),
            (1, "bar", true),
            (1, "{id}", true),
        ]);
        shape_kind_order_with_regex(["/p/{id}", "/p/x", "/p/{n:[0-9]+}"], vec![
            (0, "/p/", false),
            (1, "x", true),
            (1, "{n:[0-9]+}", true),
            (1, "{id}", true),
        ]);
    ];

    #[test]
    fn lookup_two_disjoint_suffixes() {
        let mut root = Node::default();
        root.insert("/foo", handle("i'm /foo")).unwrap();
        root.insert("/bar", handle("i'm /bar")).unwrap();

        assert_eq!(lookup_body(&root, "/foo").as_deref(), Some("i'm /foo"));
        assert_eq!(lookup_body(&root, "/bar").as_deref(), Some("i'm /bar"));
        assert_eq!(lookup_body(&root, "/baz"), None);
    }

    #[test]
    fn lookup_after_prefix_split() {
        let mut root = Node::default();
        root.insert("/foo/bar", handle("i'm /foo/bar")).unwrap();
        root.insert("/foo", handle("i'm /foo")).unwrap();

        assert_eq!(lookup_body(&root, "/foo").as_deref(), Some("i'm /foo"));
        assert_eq!(
            lookup_body(&root, "/foo/bar").as_deref(),
            Some("i'm /foo/bar")
        );
        assert_eq!(lookup_body(&root, "/fo"), None);
    }

    #[test]
    fn lookup_literal_wins_over_wildcard() {
        let mut root = Node::default();
        root.insert("/foo/", handle("slash")).unwrap();
        root.insert("/foo/bar", handle("bar")).unwrap();
        root.insert("/foo/{id}", handle("id")).unwrap();

        assert_eq!(lookup_body(&root, "/foo/bar").as_deref(), Some("bar"));

        let mut cx = Context::new();
        let (h, _) = root.lookup(&mut cx, "/foo/abc");
        let h = h.unwrap();
        assert_eq!(cx.param("id"), Some("abc"));
        assert_eq!(serve(h, &mut cx), "id");
    }

    #[test]
    fn lookup_binds_last_value_for_repeated_name() {
        let mut root = Node::default();
        root.insert("/foo/{id}/bar/{id}", handle("two")).unwrap();

        let mut cx = Context::new();
        let (h, tail) = root.lookup(&mut cx, "/foo/1/bar/2");
        assert!(h.is_some());
        assert_eq!(tail, "");
        assert_eq!(cx.param("id"), Some("2"));
    }

    #[test]
    fn lookup_regex_anchored() {
        let mut root = Node::default();
        root.insert("/foo/{id:[0-9]+}", handle("digits")).unwrap();

        let mut cx = Context::new();
        let (h, tail) = root.lookup(&mut cx, "/foo/123");
        assert!(h.is_some());
        assert_eq!(tail, "");
        assert_eq!(cx.param("id"), Some("123"));

        assert_eq!(lookup_body(&root, "/foo/abc"), None);
        assert_eq!(lookup_body(&root, "/foo/123abc"), None);
    }

    #[test]
    fn lookup_wildcard_trail_set_from_following_literal() {
        let mut root = Node::default();
        root.insert("/u/{name}/posts", handle("posts")).unwrap();

        let mut cx = Context::new();
        let (h, _) = root.lookup(&mut cx, "/u/alice/posts");
        assert!(h.is_some());
        assert_eq!(cx.param("name"), Some("alice"));

        assert_eq!(lookup_body(&root, "/u/alice/other"), None);
    }

    #[test]
    fn lookup_after_repeated_splits() {
        let patterns = ["abcdefg", "abcdef", "abcde", "abcd", "abc", "ab", "a"];
        let mut root = Node::default();
        for pattern in patterns {
            root.insert(pattern, handle(pattern)).unwrap();
        }
        for pattern in patterns {
            assert_eq!(lookup_body(&root, pattern).as_deref(), Some(pattern));
        }
        assert_eq!(lookup_body(&root, "abcdefgh"), None);
    }

    #[test]
    fn lookup_empty_input() {
        let mut root = Node::default();
        root.insert("/foo", handle("foo")).unwrap();
        assert_eq!(lookup_body(&root, ""), None);
    }

    #[test]
    fn insert_duplicate_method_is_rejected() {
        let mut root = Node::default();
        root.insert("/foo", handle("first")).unwrap();
        match root.insert("/foo", handle("second")) {
            Err(Error::HandleExists(path)) => assert_eq!(path, "/foo"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn insert_merges_disjoint_methods() {
        let mut handlers: IndexMap<Method, crate::handler::BoxedHandler> = IndexMap::new();
        handlers.insert(
            Method::POST,
            Arc::new(move |_: &mut Input<'_>| output::text("posted")),
        );
        let post = Handle::Methods(MethodHandlers {
            handlers,
            method_not_allowed: Arc::new(default_method_not_allowed),
            params: None,
        });

        let mut root = Node::default();
        root.insert("/foo", handle("got")).unwrap();
        root.insert("/foo", post).unwrap();

        let mut cx = Context::new();
        let (h, _) = root.lookup(&mut cx, "/foo");
        let h = h.unwrap();
        assert!(h.is_method_allowed(&Method::GET));
        assert!(h.is_method_allowed(&Method::POST));
        assert!(!h.is_method_allowed(&Method::DELETE));
    }

    #[test]
    fn insert_adjacent_wildcard_patterns() {
        let mut root = Node::default();
        assert!(matches!(
            root.insert("{a}{b}", handle("nope")),
            Err(Error::InvalidInput(..))
        ));
    }

    #[test]
    fn insert_disjoint_roots_is_rejected() {
        let mut root = Node::default();
        root.insert("abc.example.com", Handle::HostSentinel).unwrap();
        assert!(matches!(
            root.insert("xyz.example.com", Handle::HostSentinel),
            Err(Error::InvalidInput(..))
        ));
    }

    #[test]
    fn children_sorted_after_any_insert_order() {
        let mut root = Node::default();
        root.insert("/a/{w}", handle("w")).unwrap();
        root.insert("/a/{r:[0-9]+}", handle("r")).unwrap();
        root.insert("/a/lit", handle("lit")).unwrap();
        root.insert("/a/other", handle("other")).unwrap();

        let mut kinds_by_level: Vec<Vec<String>> = Vec::new();
        root.walk(&mut |level, data, _| {
            while kinds_by_level.len() <= level {
                kinds_by_level.push(Vec::new());
            }
            kinds_by_level[level].push(data.to_owned());
        });
        // literal children first, then regex, then wildcard
        assert_eq!(kinds_by_level[1], vec!["lit", "other", "{r:[0-9]+}", "{w}"]);
    }

    #[test]
    fn catch_all_matches_any_tail() {
        let mut root = Node::default();
        let inner: crate::handler::BoxedHandler =
            Arc::new(move |_: &mut Input<'_>| output::text("static"));
        root.insert("/static/", Handle::CatchAll(inner)).unwrap();

        let mut cx = Context::new();
        let (h, tail) = root.lookup(&mut cx, "/static/css/site.css");
        assert!(h.is_some());
        assert_eq!(tail, "css/site.css");

        // specific children still win over the catch-all
        root.insert("/static/favicon.ico", handle("icon")).unwrap();
        let mut cx = Context::new();
        let (h, tail) = root.lookup(&mut cx, "/static/favicon.ico");
        assert_eq!(tail, "");
        assert_eq!(serve(h.unwrap(), &mut cx), "icon");
    }
}
