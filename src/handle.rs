//! Polymorphic leaf handles stored at the terminals of the tree.

use {
    crate::{
        handler::{BoxedHandler, Handler},
        input::{Input, ParamsSpec},
        output::ResponseBody,
        router::Router,
    },
    http::{header, HeaderValue, Method, Response, StatusCode},
    indexmap::IndexMap,
    std::fmt,
    std::sync::Arc,
};

/// A factory producing the handler served when the method is not
/// allowed; it receives the methods that are.
pub type MethodNotAllowed = Arc<dyn Fn(&[Method]) -> BoxedHandler + Send + Sync + 'static>;

/// The leaf object attached to a terminal node.
pub(crate) enum Handle {
    /// A method-aware terminal.
    Methods(MethodHandlers),

    /// A handler consuming any unmatched tail.
    CatchAll(BoxedHandler),

    /// A nested router, re-entered with the unmatched tail.
    SubRouter(Box<Router>),

    /// Marks a recognized host in the host tree; never served.
    HostSentinel,
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handle::Methods(m) => f.debug_tuple("Methods").field(&m.allowed()).finish(),
            Handle::CatchAll(..) => f.debug_tuple("CatchAll").finish(),
            Handle::SubRouter(r) => f.debug_tuple("SubRouter").field(r).finish(),
            Handle::HostSentinel => f.debug_tuple("HostSentinel").finish(),
        }
    }
}

impl Handle {
    /// A partial handle accepts a match that leaves a tail behind.
    pub(crate) fn is_partial(&self) -> bool {
        match self {
            Handle::Methods(..) | Handle::HostSentinel => false,
            Handle::CatchAll(..) | Handle::SubRouter(..) => true,
        }
    }

    pub(crate) fn is_method_allowed(&self, method: &Method) -> bool {
        match self {
            Handle::Methods(m) => m.handlers.contains_key(method),
            _ => true,
        }
    }

    /// Attempts to fold `other` into this handle.
    ///
    /// Only method handles merge, and only when their method sets are
    /// disjoint. A failed merge leaves this handle untouched.
    pub(crate) fn merge(&mut self, other: Handle) -> bool {
        match (self, other) {
            (Handle::Methods(m), Handle::Methods(other)) => m.merge(other),
            _ => false,
        }
    }

    pub(crate) fn serve(&self, input: &mut Input<'_>) -> Response<ResponseBody> {
        match self {
            Handle::Methods(m) => m.serve(input),
            Handle::CatchAll(h) => h.call(input),
            Handle::SubRouter(r) => r.respond(input),
            Handle::HostSentinel => crate::output::status(StatusCode::NOT_FOUND),
        }
    }
}

/// The map of handlers by HTTP method at one path.
pub(crate) struct MethodHandlers {
    pub(crate) handlers: IndexMap<Method, BoxedHandler>,
    pub(crate) method_not_allowed: MethodNotAllowed,
    pub(crate) params: Option<ParamsSpec>,
}

impl MethodHandlers {
    fn allowed(&self) -> Vec<Method> {
        self.handlers.keys().cloned().collect()
    }

    fn merge(&mut self, other: MethodHandlers) -> bool {
        if other
            .handlers
            .keys()
            .any(|method| self.handlers.contains_key(method))
        {
            return false;
        }
        self.handlers.extend(other.handlers);
        if self.params.is_none() {
            self.params = other.params;
        }
        true
    }

    fn serve(&self, input: &mut Input<'_>) -> Response<ResponseBody> {
        match self.handlers.get(input.request.method()) {
            Some(handler) => {
                if let Some(spec) = self.params {
                    input.context.set_params_spec(spec);
                }
                handler.call(input)
            }
            None => (self.method_not_allowed)(&self.allowed()).call(input),
        }
    }
}

/// The default method-not-allowed handler: an empty 405 carrying the
/// allowed methods in the `Allow` header.
pub(crate) fn default_method_not_allowed(allowed: &[Method]) -> BoxedHandler {
    let value = allowed
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    Arc::new(move |_: &mut Input<'_>| {
        let mut response = crate::output::status(StatusCode::METHOD_NOT_ALLOWED);
        response.headers_mut().insert(
            header::ALLOW,
            HeaderValue::from_str(&value).expect("method names are valid header values"),
        );
        response
    })
}
