//! The multiplexer: an ordered set of routers selected by host and path.

use {
    crate::{
        handler::{BoxedHandler, Handler},
        input::{Context, Input, RequestBody},
        output::{self, ResponseBody},
        router::{request_host, Router},
    },
    http::{Request, Response, StatusCode},
    log::trace,
    std::fmt,
    std::sync::Arc,
};

/// An ordered collection of routers tried in turn for each request.
///
/// There is no process-wide default multiplexer; construct one
/// explicitly and hand it your routers.
pub struct Mux {
    routers: Vec<Router>,
    not_found: BoxedHandler,
}

impl fmt::Debug for Mux {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mux")
            .field("routers", &self.routers)
            .finish()
    }
}

impl Default for Mux {
    fn default() -> Self {
        Self::new()
    }
}

impl Mux {
    pub fn new() -> Self {
        Mux {
            routers: Vec::new(),
            not_found: Arc::new(|_: &mut Input<'_>| output::status(StatusCode::NOT_FOUND)),
        }
    }

    /// Appends a router; routers are tried in registration order.
    pub fn add_router(&mut self, router: Router) {
        self.routers.push(router);
    }

    /// Replaces the fall-through not-found handler.
    pub fn set_not_found(&mut self, handler: impl Handler) {
        self.not_found = Arc::new(handler);
    }

    /// Serves `request` with the first router whose host accepts it and
    /// whose tree resolves the path.
    ///
    /// A router that matches the path but not the method is remembered
    /// and scanning continues: a later router may carry the same path
    /// with the needed method. When no router matches, the remembered
    /// handle answers with 405, or the not-found handler with 404.
    pub fn serve(&self, request: &Request<RequestBody>) -> Response<ResponseBody> {
        let mut cx = Context::new();
        if let Some(query) = request.uri().query() {
            cx.set_queries(query);
        }

        let host = request_host(request);
        let path = request.uri().path();
        let method = request.method();

        let mut last_not_allowed = None;
        for router in &self.routers {
            if router.is_supported_host(&mut cx, &host) {
                let (handle, trail) = router.lookup(&mut cx, path);
                if let Some(handle) = handle {
                    if !handle.is_method_allowed(method) {
                        trace!("method {} not allowed, scanning on", method);
                        last_not_allowed = Some(handle);
                        continue;
                    }
                    if !trail.is_empty() {
                        cx.set_routing_path(trail);
                    }
                    return handle.serve(&mut Input::new(request, &mut cx));
                }
            }
            // drop bindings written by this router's partial matches,
            // keeping the query values for the next router
            cx.reset();
            if let Some(query) = request.uri().query() {
                cx.set_queries(query);
            }
        }

        if let Some(handle) = last_not_allowed {
            return handle.serve(&mut Input::new(request, &mut cx));
        }

        self.not_found.call(&mut Input::new(request, &mut cx))
    }
}
