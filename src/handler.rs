//! Definition of `Handler`.

use {
    crate::{input::Input, output::ResponseBody},
    http::Response,
    std::sync::Arc,
};

/// A trait representing the function invoked for a matched route.
///
/// Handlers are shared across worker threads, so they must be `Send`
/// and `Sync`. Any closure with the right signature is a handler:
///
/// ```
/// use tsuji::{output, Input};
///
/// let handler = |input: &mut Input<'_>| output::text("hello");
/// # let _ = handler;
/// ```
pub trait Handler: Send + Sync + 'static {
    /// Handles a request, producing a complete response.
    fn call(&self, input: &mut Input<'_>) -> Response<ResponseBody>;
}

impl<F> Handler for F
where
    F: Fn(&mut Input<'_>) -> Response<ResponseBody> + Send + Sync + 'static,
{
    #[inline]
    fn call(&self, input: &mut Input<'_>) -> Response<ResponseBody> {
        (*self)(input)
    }
}

/// A shared, type-erased handler.
pub type BoxedHandler = Arc<dyn Handler>;
