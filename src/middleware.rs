//! Middleware composition.

use {crate::handler::BoxedHandler, std::sync::Arc};

/// A function wrapping a handler with additional behavior.
///
/// Middlewares are applied outermost first: for a chain `[m1, m2, m3]`
/// around a handler `h`, the effective call order is `m1(m2(m3(h)))`.
pub type Middleware = Arc<dyn Fn(BoxedHandler) -> BoxedHandler + Send + Sync + 'static>;

/// Wraps a closure into a [`Middleware`].
///
/// [`Middleware`]: ./type.Middleware.html
pub fn middleware(
    f: impl Fn(BoxedHandler) -> BoxedHandler + Send + Sync + 'static,
) -> Middleware {
    Arc::new(f)
}

pub(crate) fn attach(handler: BoxedHandler, middlewares: &[Middleware]) -> BoxedHandler {
    middlewares.iter().rev().fold(handler, |h, m| m(h))
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            handler::Handler,
            input::{Context, Input, RequestBody},
            output,
        },
        http::Request,
    };

    fn tagging(tag: &'static str) -> Middleware {
        middleware(move |inner| {
            Arc::new(move |input: &mut Input<'_>| {
                let mut response = inner.call(input);
                response
                    .headers_mut()
                    .append("x-trace", tag.parse().unwrap());
                response
            })
        })
    }

    #[test]
    fn attach_applies_outermost_first() {
        let handler: BoxedHandler = Arc::new(|_: &mut Input<'_>| output::text("ok"));
        let wrapped = attach(handler, &[tagging("m1"), tagging("m2"), tagging("m3")]);

        let request = Request::builder()
            .uri("/")
            .body(RequestBody::default())
            .unwrap();
        let mut cx = Context::new();
        let response = wrapped.call(&mut Input::new(&request, &mut cx));

        // the innermost middleware appends first
        let tags: Vec<_> = response
            .headers()
            .get_all("x-trace")
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect();
        assert_eq!(tags, vec!["m3", "m2", "m1"]);
    }
}
