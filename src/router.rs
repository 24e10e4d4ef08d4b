//! The router: pattern registration, host matching and dispatch.

use {
    crate::{
        error::{Error, Result},
        handle::{default_method_not_allowed, Handle, MethodHandlers, MethodNotAllowed},
        handler::{BoxedHandler, Handler},
        input::{BindParams, Context, Input, ParamsSpec, RequestBody},
        middleware::{attach, Middleware},
        output::{self, ResponseBody},
        pattern::split_escape,
        tree::Node,
    },
    http::{header, Method, Request, Response, StatusCode},
    indexmap::IndexMap,
    log::trace,
    std::borrow::Cow,
    std::fmt,
    std::sync::Arc,
};

/// An HTTP router matching hosts and paths against a prefix tree.
///
/// Patterns are registered up front; once the router starts serving it
/// is read-only and may be shared freely across threads.
pub struct Router {
    path: String,
    tree: Node,
    host_tree: Option<Node>,
    middlewares: Vec<Middleware>,
    not_found: BoxedHandler,
    method_not_allowed: MethodNotAllowed,
    is_sub_route: bool,
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("path", &self.path)
            .field("is_sub_route", &self.is_sub_route)
            .finish()
    }
}

impl Router {
    /// Creates a router rooted at `path` with the default handlers.
    pub fn new(path: impl Into<String>) -> Self {
        Router {
            path: path.into(),
            tree: Node::default(),
            host_tree: None,
            middlewares: Vec::new(),
            not_found: default_not_found(),
            method_not_allowed: Arc::new(default_method_not_allowed),
            is_sub_route: false,
        }
    }

    /// Creates a builder rooted at `path`.
    pub fn build(path: impl Into<String>) -> Builder {
        Builder {
            path: path.into(),
            hosts: Vec::new(),
            middlewares: Vec::new(),
            not_found: None,
            method_not_allowed: None,
        }
    }

    /// Registers a method-aware resource.
    ///
    /// `paths` may declare several comma-separated paths for the same
    /// resource; a literal comma is written `\,`. A path starting with
    /// `/` is absolute; anything else is joined under the router's own
    /// path, with a leading `.` stripped.
    pub fn route(&mut self, paths: &str, resource: Resource) -> Result<()> {
        let paths = split_escape(paths, ',');
        if paths.is_empty() {
            return Err(Error::invalid_input("a route needs at least one path"));
        }
        for path in &paths {
            let full = self.resolve_path(path.trim());
            let handle = Handle::Methods(resource.to_handlers(
                &self.middlewares,
                &self.method_not_allowed,
            ));
            self.tree.insert(&full, handle)?;
        }
        Ok(())
    }

    /// Registers a single function for one method.
    pub fn route_fn(
        &mut self,
        path: &str,
        method: Method,
        handler: impl Handler,
    ) -> Result<()> {
        self.route(path, Resource::new().method(method, handler))
    }

    /// Registers a handler consuming any tail under `path`, regardless
    /// of the method.
    pub fn catch_all(&mut self, path: &str, handler: impl Handler) -> Result<()> {
        let full = self.resolve_path(path);
        let handler = attach(Arc::new(handler), &self.middlewares);
        self.tree.insert(&full, Handle::CatchAll(handler))
    }

    /// Mounts a sub-router under `path`.
    ///
    /// The closure configures the sub-router. It inherits this router's
    /// middlewares; lookups that reach `path` continue inside it with
    /// the unmatched tail.
    pub fn mount(
        &mut self,
        path: &str,
        f: impl FnOnce(&mut Router) -> Result<()>,
    ) -> Result<()> {
        let mut sub = Router {
            path: path.to_owned(),
            tree: Node::default(),
            host_tree: None,
            middlewares: self.middlewares.clone(),
            not_found: self.not_found.clone(),
            method_not_allowed: self.method_not_allowed.clone(),
            is_sub_route: true,
        };
        f(&mut sub)?;

        let full = self.resolve_path(path);
        self.tree.insert(&full, Handle::SubRouter(Box::new(sub)))
    }

    /// Adds a host pattern recognized by this router.
    ///
    /// A router without hosts accepts every host.
    pub fn add_host(&mut self, host: &str) -> Result<()> {
        if self.is_sub_route {
            return Err(Error::UnsupportedOperation(
                "setting a host on a sub-router",
            ));
        }
        self.host_tree
            .get_or_insert_with(Node::default)
            .insert(host, Handle::HostSentinel)
    }

    /// Replaces the not-found handler.
    pub fn set_not_found(&mut self, handler: impl Handler) -> Result<()> {
        if self.is_sub_route {
            return Err(Error::UnsupportedOperation(
                "setting a not-found handler on a sub-router",
            ));
        }
        self.not_found = attach(Arc::new(handler), &self.middlewares);
        Ok(())
    }

    /// Replaces the method-not-allowed factory.
    pub fn set_method_not_allowed(
        &mut self,
        f: impl Fn(&[Method]) -> BoxedHandler + Send + Sync + 'static,
    ) {
        let middlewares = self.middlewares.clone();
        let inner: MethodNotAllowed = Arc::new(f);
        self.method_not_allowed =
            Arc::new(move |allowed| attach(inner(allowed), &middlewares));
    }

    /// Appends a middleware applied to handlers registered afterwards.
    pub fn add_middleware(
        &mut self,
        f: impl Fn(BoxedHandler) -> BoxedHandler + Send + Sync + 'static,
    ) {
        self.middlewares.push(Arc::new(f));
    }

    /// Returns `true` when `host` is recognized by this router.
    ///
    /// Host patterns bind parameters through the same context as path
    /// patterns, so `{sub}.example.com` makes `sub` available to the
    /// handler.
    pub fn is_supported_host(&self, cx: &mut Context, host: &str) -> bool {
        let tree = match &self.host_tree {
            None => return true,
            Some(tree) => tree,
        };
        let (handle, _) = tree.lookup(cx, host);
        handle.is_some()
    }

    /// Serves `request`, resolving its path against the compiled
    /// patterns.
    pub fn serve(&self, request: &Request<RequestBody>) -> Response<ResponseBody> {
        let mut cx = Context::new();
        if let Some(query) = request.uri().query() {
            cx.set_queries(query);
        }

        let host = request_host(request);
        if !self.is_supported_host(&mut cx, &host) {
            trace!("host {:?} rejected", host);
            return self.not_found.call(&mut Input::new(request, &mut cx));
        }

        let path = request.uri().path().to_owned();
        self.dispatch(request, &mut cx, &path)
    }

    /// Re-enters this router as a nested handle, reading the unmatched
    /// tail recorded in the context instead of the URL path.
    pub(crate) fn respond(&self, input: &mut Input<'_>) -> Response<ResponseBody> {
        let path = input
            .context
            .take_routing_path()
            .unwrap_or_else(|| input.request.uri().path().to_owned());
        self.dispatch(input.request, input.context, &path)
    }

    fn dispatch(
        &self,
        request: &Request<RequestBody>,
        cx: &mut Context,
        path: &str,
    ) -> Response<ResponseBody> {
        let (handle, trail) = self.lookup(cx, path);
        let handle = match handle {
            Some(handle) => handle,
            None => {
                trace!("no route for {:?}", path);
                return self.not_found.call(&mut Input::new(request, cx));
            }
        };
        if !trail.is_empty() {
            cx.set_routing_path(trail);
        }
        handle.serve(&mut Input::new(request, cx))
    }

    /// Resolves `path`, crossing into nested routers, and returns the
    /// final handle together with any unmatched tail.
    pub(crate) fn lookup<'r, 'p>(
        &'r self,
        cx: &mut Context,
        path: &'p str,
    ) -> (Option<&'r Handle>, &'p str) {
        let mut router = self;
        let mut find_path = path;
        loop {
            let (handle, trail) = router.tree.lookup(cx, find_path);

            let handle = match handle {
                Some(handle) => handle,
                None => return (None, trail),
            };

            if trail.is_empty() {
                return (Some(handle), "");
            }

            if !handle.is_partial() {
                // a leftover tail on a terminal handle is a conflict,
                // not a match
                return (None, trail);
            }

            match handle {
                Handle::SubRouter(sub) => {
                    router = sub;
                    find_path = trail;
                }
                _ => return (Some(handle), trail),
            }
        }
    }

    /// Visits every node of the compiled path tree depth-first with its
    /// depth, the matcher's textual form and whether a handle is
    /// attached. Intended for debugging.
    pub fn walk(&self, f: &mut dyn FnMut(usize, &str, bool)) {
        self.tree.walk(f)
    }

    /// Joins `path` onto this router's base path.
    ///
    /// Sub-routers insert into their own tree, which is entered with
    /// the parent's unmatched tail, so their paths are used as-is.
    fn resolve_path(&self, path: &str) -> String {
        let path: Cow<'_, str> = if path.starts_with('/') {
            Cow::Borrowed(path)
        } else {
            Cow::Borrowed(path.strip_prefix('.').unwrap_or(path))
        };
        if self.is_sub_route {
            return path.into_owned();
        }
        join_path(&self.path, &path)
    }
}

/// A builder assembling a [`Router`].
///
/// [`Router`]: ./struct.Router.html
pub struct Builder {
    path: String,
    hosts: Vec<String>,
    middlewares: Vec<Middleware>,
    not_found: Option<BoxedHandler>,
    method_not_allowed: Option<MethodNotAllowed>,
}

impl fmt::Debug for Builder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("path", &self.path)
            .field("hosts", &self.hosts)
            .finish()
    }
}

impl Builder {
    /// Adds a host pattern recognized by the router.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.hosts.push(host.into());
        self
    }

    /// Appends a middleware wrapping every registered handler.
    pub fn middleware(
        mut self,
        f: impl Fn(BoxedHandler) -> BoxedHandler + Send + Sync + 'static,
    ) -> Self {
        self.middlewares.push(Arc::new(f));
        self
    }

    /// Sets the not-found handler.
    pub fn not_found(mut self, handler: impl Handler) -> Self {
        self.not_found = Some(Arc::new(handler));
        self
    }

    /// Sets the method-not-allowed factory.
    pub fn method_not_allowed(
        mut self,
        f: impl Fn(&[Method]) -> BoxedHandler + Send + Sync + 'static,
    ) -> Self {
        self.method_not_allowed = Some(Arc::new(f));
        self
    }

    /// Builds the router, compiling the host patterns.
    pub fn finish(self) -> Result<Router> {
        let host_tree = if self.hosts.is_empty() {
            None
        } else {
            let mut tree = Node::default();
            for host in &self.hosts {
                tree.insert(host, Handle::HostSentinel)?;
            }
            Some(tree)
        };

        let not_found = attach(
            self.not_found.unwrap_or_else(default_not_found),
            &self.middlewares,
        );

        let inner = self
            .method_not_allowed
            .unwrap_or_else(|| Arc::new(default_method_not_allowed));
        let middlewares = self.middlewares.clone();
        let method_not_allowed: MethodNotAllowed =
            Arc::new(move |allowed| attach(inner(allowed), &middlewares));

        Ok(Router {
            path: self.path,
            tree: Node::default(),
            host_tree,
            middlewares: self.middlewares,
            not_found,
            method_not_allowed,
            is_sub_route: false,
        })
    }
}

/// A builder collecting the method handlers mounted at one path.
#[derive(Clone, Default)]
pub struct Resource {
    methods: IndexMap<Method, BoxedHandler>,
    params: Option<ParamsSpec>,
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .field("params", &self.params)
            .finish()
    }
}

impl Resource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `method`.
    pub fn method(mut self, method: Method, handler: impl Handler) -> Self {
        self.methods.insert(method, Arc::new(handler));
        self
    }

    pub fn get(self, handler: impl Handler) -> Self {
        self.method(Method::GET, handler)
    }

    pub fn post(self, handler: impl Handler) -> Self {
        self.method(Method::POST, handler)
    }

    pub fn put(self, handler: impl Handler) -> Self {
        self.method(Method::PUT, handler)
    }

    pub fn delete(self, handler: impl Handler) -> Self {
        self.method(Method::DELETE, handler)
    }

    pub fn patch(self, handler: impl Handler) -> Self {
        self.method(Method::PATCH, handler)
    }

    pub fn head(self, handler: impl Handler) -> Self {
        self.method(Method::HEAD, handler)
    }

    /// Declares the parameter struct decoded by the handlers.
    ///
    /// The type is installed into the request context before dispatch
    /// and recovered with [`Input::typed_params`].
    ///
    /// [`Input::typed_params`]: ../input/struct.Input.html#method.typed_params
    pub fn params<T: BindParams>(mut self) -> Self {
        self.params = Some(ParamsSpec::of::<T>());
        self
    }

    fn to_handlers(
        &self,
        middlewares: &[Middleware],
        method_not_allowed: &MethodNotAllowed,
    ) -> MethodHandlers {
        MethodHandlers {
            handlers: self
                .methods
                .iter()
                .map(|(method, handler)| (method.clone(), attach(handler.clone(), middlewares)))
                .collect(),
            method_not_allowed: method_not_allowed.clone(),
            params: self.params,
        }
    }
}

/// The default not-found handler: an empty 404.
fn default_not_found() -> BoxedHandler {
    Arc::new(|_: &mut Input<'_>| output::status(StatusCode::NOT_FOUND))
}

/// The request host with any port stripped.
pub(crate) fn request_host(request: &Request<RequestBody>) -> String {
    request
        .headers()
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .or_else(|| request.uri().host())
        .and_then(|host| host.split(':').next())
        .unwrap_or("")
        .to_owned()
}

fn join_path(parent: &str, path: &str) -> String {
    let mut joined = String::new();
    if !parent.is_empty() && parent != "/" {
        let parent = ensure_leading_slash(parent);
        joined.push_str(parent.strip_suffix('/').unwrap_or(&parent));
    }
    if !path.is_empty() {
        joined.push_str(&ensure_leading_slash(path));
    }
    joined
}

fn ensure_leading_slash(path: &str) -> Cow<'_, str> {
    if path.starts_with('/') {
        Cow::Borrowed(path)
    } else {
        Cow::Owned(format!("/{}", path))
    }
}
