//! Components for accessing the request and its routing state.

pub mod param;

pub use self::param::{BindError, BindParams, FromBinding, ParamsSpec};

use {
    self::param::parse_with,
    bytes::Bytes,
    http::Request,
    indexmap::IndexMap,
    std::any::TypeId,
    std::ops::Index,
    url::form_urlencoded,
};

/// An opaque request body.
///
/// The router never reads it; it is carried through so handlers can.
#[derive(Debug, Default)]
pub struct RequestBody(Bytes);

impl RequestBody {
    pub fn new(data: impl Into<Bytes>) -> Self {
        RequestBody(data.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Per-request scratch state produced while the tree is traversed.
///
/// Bindings are written in pattern order, left to right; a later match
/// with the same name overwrites the earlier value. The context is
/// owned by the task serving the request and is never shared.
#[derive(Debug, Default)]
pub struct Context {
    params: IndexMap<String, String>,
    queries: IndexMap<String, String>,
    routing_path: Option<String>,
    params_spec: Option<ParamsSpec>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears every binding produced so far.
    ///
    /// The multiplexer calls this between routers so that bindings
    /// written by one router's partial matches do not leak into the
    /// next.
    pub fn reset(&mut self) {
        self.params.clear();
        self.queries.clear();
        self.routing_path = None;
        self.params_spec = None;
    }

    pub(crate) fn bind(&mut self, name: &str, value: &str) {
        self.params.insert(name.to_owned(), value.to_owned());
    }

    pub(crate) fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub(crate) fn query(&self, name: &str) -> Option<&str> {
        self.queries.get(name).map(String::as_str)
    }

    pub(crate) fn set_queries(&mut self, query: &str) {
        // the first value wins, like `url.Values.Get`
        for (name, value) in form_urlencoded::parse(query.as_bytes()) {
            self.queries
                .entry(name.into_owned())
                .or_insert_with(|| value.into_owned());
        }
    }

    pub(crate) fn set_routing_path(&mut self, path: &str) {
        self.routing_path = Some(path.to_owned());
    }

    pub(crate) fn take_routing_path(&mut self) -> Option<String> {
        self.routing_path.take()
    }

    pub(crate) fn routing_path(&self) -> Option<&str> {
        self.routing_path.as_deref()
    }

    pub(crate) fn set_params_spec(&mut self, spec: ParamsSpec) {
        self.params_spec = Some(spec);
    }

    pub(crate) fn params_spec(&self) -> Option<ParamsSpec> {
        self.params_spec
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

/// A view over the request and its routing state, passed to handlers.
#[derive(Debug)]
pub struct Input<'a> {
    /// The incoming request.
    pub request: &'a Request<RequestBody>,
    pub(crate) context: &'a mut Context,
}

impl<'a> Input<'a> {
    pub(crate) fn new(request: &'a Request<RequestBody>, context: &'a mut Context) -> Self {
        Input { request, context }
    }

    /// Returns a proxy for the parameters bound while matching.
    pub fn params(&self) -> Params<'_> {
        Params {
            context: self.context,
        }
    }

    /// Parses the parameter `name` into `T`.
    pub fn param<T: FromBinding>(&self, name: &str) -> Result<T, BindError> {
        self.params().parse(name)
    }

    /// Parses the query value `name` into `T`; `Ok(None)` when absent.
    pub fn query<T: FromBinding>(&self, name: &str) -> Result<Option<T>, BindError> {
        self.params().parse_query(name)
    }

    /// Decodes the parameter struct declared on the matched resource.
    ///
    /// Fails when the resource declared no parameter type, when the
    /// declared type is not `T`, or when a field fails to parse.
    pub fn typed_params<T: BindParams>(&self) -> Result<T, BindError> {
        let spec = self.context.params_spec().ok_or(BindError::NoSchema)?;
        if spec.type_id() != TypeId::of::<T>() {
            return Err(BindError::SchemaMismatch {
                declared: spec.type_name(),
            });
        }
        T::bind(&self.params())
    }

    /// The path suffix left unconsumed by the match, set for catch-all
    /// handlers and nested routers.
    pub fn routing_tail(&self) -> Option<&str> {
        self.context.routing_path()
    }
}

/// A proxy object for accessing bound parameters and queries.
#[derive(Debug)]
pub struct Params<'input> {
    context: &'input Context,
}

impl<'input> Params<'input> {
    /// Returns `true` if no parameter was bound.
    pub fn is_empty(&self) -> bool {
        self.context.is_empty()
    }

    /// Returns the raw value bound to `name`, if any.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.context.param(name)
    }

    /// Returns the raw query value for `name`, if any.
    pub fn query(&self, name: &str) -> Option<&str> {
        self.context.query(name)
    }

    /// Parses the value bound to `name` into `T`.
    pub fn parse<T: FromBinding>(&self, name: &str) -> Result<T, BindError> {
        let value = self.get(name).ok_or_else(|| BindError::missing(name))?;
        parse_with::<T>(name, value)
    }

    /// Parses the query value for `name` into `T`; `Ok(None)` when the
    /// query string did not carry `name`.
    pub fn parse_query<T: FromBinding>(&self, name: &str) -> Result<Option<T>, BindError> {
        match self.query(name) {
            Some(value) => parse_with::<T>(name, value).map(Some),
            None => Ok(None),
        }
    }
}

impl<'input, 'a> Index<&'a str> for Params<'input> {
    type Output = str;

    fn index(&self, name: &'a str) -> &Self::Output {
        self.get(name).expect("parameter is not bound")
    }
}
