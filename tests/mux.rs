use {
    http::{header, Method, Request, Response, StatusCode},
    tsuji::{input::RequestBody, output, Input, Mux, Resource, ResponseBody, Router},
};

fn request(method: Method, uri: &str) -> Request<RequestBody> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(RequestBody::default())
        .unwrap()
}

fn body_str(response: &Response<ResponseBody>) -> String {
    String::from_utf8(response.body().as_bytes().to_vec()).unwrap()
}

#[test]
fn method_split_across_routers() {
    let mut a = Router::new("/");
    a.route(
        "/foo",
        Resource::new().get(|_: &mut Input<'_>| output::text("a: get")),
    )
    .unwrap();

    let mut b = Router::new("/");
    b.route(
        "/foo",
        Resource::new().post(|_: &mut Input<'_>| output::text("b: post")),
    )
    .unwrap();

    let mut mux = Mux::new();
    mux.add_router(a);
    mux.add_router(b);

    // router A rejects the method; the multiplexer keeps scanning and
    // finds the handler on router B
    let response = mux.serve(&request(Method::POST, "/foo"));
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_str(&response), "b: post");

    let response = mux.serve(&request(Method::GET, "/foo"));
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_str(&response), "a: get");

    // neither router takes DELETE; the last remembered handle answers
    let response = mux.serve(&request(Method::DELETE, "/foo"));
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers().get(header::ALLOW).unwrap(), "POST");
}

#[test]
fn routers_selected_by_host() {
    let mut a = Router::build("/").host("a.example.com").finish().unwrap();
    a.route(
        "/ping",
        Resource::new().get(|_: &mut Input<'_>| output::text("a")),
    )
    .unwrap();

    let mut b = Router::build("/").host("b.example.com").finish().unwrap();
    b.route(
        "/ping",
        Resource::new().get(|_: &mut Input<'_>| output::text("b")),
    )
    .unwrap();

    let mut mux = Mux::new();
    mux.add_router(a);
    mux.add_router(b);

    let req = Request::builder()
        .method(Method::GET)
        .uri("/ping")
        .header(header::HOST, "b.example.com")
        .body(RequestBody::default())
        .unwrap();
    assert_eq!(body_str(&mux.serve(&req)), "b");

    let req = Request::builder()
        .method(Method::GET)
        .uri("/ping")
        .header(header::HOST, "c.example.com")
        .body(RequestBody::default())
        .unwrap();
    assert_eq!(mux.serve(&req).status(), StatusCode::NOT_FOUND);
}

#[test]
fn bindings_reset_between_routers() {
    // router A binds `name` while descending, then fails to find a
    // terminal; the binding must not leak into router B's handler
    let mut a = Router::new("/");
    a.route(
        "/x/{name}/deep",
        Resource::new().get(|_: &mut Input<'_>| output::text("a")),
    )
    .unwrap();

    let mut b = Router::new("/");
    b.route(
        "/x/foo",
        Resource::new().get(|input: &mut Input<'_>| {
            assert!(input.params().get("name").is_none());
            output::text("b")
        }),
    )
    .unwrap();

    let mut mux = Mux::new();
    mux.add_router(a);
    mux.add_router(b);

    let response = mux.serve(&request(Method::GET, "/x/foo"));
    assert_eq!(body_str(&response), "b");
}

#[test]
fn fall_through_to_not_found() {
    let mut a = Router::new("/");
    a.route(
        "/known",
        Resource::new().get(|_: &mut Input<'_>| output::text("known")),
    )
    .unwrap();

    let mut mux = Mux::new();
    mux.add_router(a);

    let response = mux.serve(&request(Method::GET, "/unknown"));
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[test]
fn custom_not_found_handler() {
    let mut mux = Mux::new();
    mux.set_not_found(|_: &mut Input<'_>| {
        let mut response = output::text("try /docs");
        *response.status_mut() = StatusCode::NOT_FOUND;
        response
    });

    let response = mux.serve(&request(Method::GET, "/anything"));
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_str(&response), "try /docs");
}

#[test]
fn queries_are_available_through_the_mux() {
    let mut a = Router::new("/");
    a.route(
        "/search",
        Resource::new().get(|input: &mut Input<'_>| {
            output::text(input.params().query("q").unwrap_or("none").to_owned())
        }),
    )
    .unwrap();

    let mut mux = Mux::new();
    mux.add_router(a);

    let response = mux.serve(&request(Method::GET, "/search?q=tries"));
    assert_eq!(body_str(&response), "tries");
}
