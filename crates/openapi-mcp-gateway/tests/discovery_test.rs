//! Discovery tools against a wiremock-served OpenAPI document.

mod common;

use common::{Fixture, blog_document, fixture};
use openapi_mcp_gateway::ToolCallError;
use openapi_mcp_kernel::{FetchError, ServiceDescriptor};
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn blog_server(expected_fetches: u64) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/api-docs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(blog_document()))
        .expect(expected_fetches)
        .mount(&server)
        .await;
    server
}

fn blog(server: &MockServer) -> ServiceDescriptor {
    ServiceDescriptor::new("blog-api", format!("{}/", server.uri()))
}

async fn call(fixture: &Fixture, tool: &str, arguments: Value) -> Value {
    let text = fixture.router.call(tool, arguments).await.unwrap();
    serde_json::from_str(&text).unwrap()
}

#[tokio::test]
async fn list_apis_filters_by_group() {
    let server = blog_server(1).await;
    let f = fixture(vec![blog(&server)], 60);

    let result = call(
        &f,
        "listApis",
        json!({ "serviceName": "blog-api", "apiGroup": "posts" }),
    )
    .await;

    assert_eq!(
        result,
        json!({ "/posts/{id}": { "get": { "tags": ["posts"], "operationId": "getPost" } } })
    );
}

#[tokio::test]
async fn list_apis_group_match_ignores_case() {
    let server = blog_server(1).await;
    let f = fixture(vec![blog(&server)], 60);

    let result = call(
        &f,
        "listApis",
        json!({ "serviceName": "blog-api", "apiGroup": "ADMIN" }),
    )
    .await;

    assert_eq!(
        result,
        json!({
            "/posts": {
                "post": { "tags": ["Admin"], "operationId": "createPost", "summary": "Create a post" }
            }
        })
    );
}

#[tokio::test]
async fn blank_group_lists_every_operation_once_fetched() {
    let server = blog_server(1).await;
    let f = fixture(vec![blog(&server)], 60);

    let all = call(&f, "listApis", json!({ "serviceName": "blog-api" })).await;
    let blank = call(
        &f,
        "listApis",
        json!({ "serviceName": "blog-api", "apiGroup": "  " }),
    )
    .await;

    let paths: Vec<&String> = all.as_object().unwrap().keys().collect();
    assert_eq!(paths, ["/posts/{id}", "/posts", "/comments"]);
    assert_eq!(all, blank);
    assert_eq!(f.metrics.miss_count("blog-api"), 1);
    assert_eq!(f.metrics.hit_count("blog-api"), 1);
}

#[tokio::test]
async fn api_detail_describes_operation() {
    let server = blog_server(1).await;
    let f = fixture(vec![blog(&server)], 60);

    let detail = call(
        &f,
        "getApiDetail",
        json!({ "serviceName": "blog-api", "requestUrl": "/posts", "httpMethod": "POST" }),
    )
    .await;

    assert_eq!(
        detail,
        json!({
            "parameters": [],
            "requestBody": {
                "required": true,
                "schema": { "$ref": "#/components/schemas/PostInput" }
            },
            "responses": {
                "201": { "$ref": "#/components/schemas/Post" },
                "400": { "$ref": "#/components/schemas/ErrorMessage" }
            },
            "componentRefs": [
                "#/components/schemas/PostInput",
                "#/components/schemas/Post",
                "#/components/schemas/ErrorMessage"
            ]
        })
    );
}

#[tokio::test]
async fn api_detail_reports_missing_path_and_method() {
    let server = blog_server(1).await;
    let f = fixture(vec![blog(&server)], 60);

    let missing_path = call(
        &f,
        "getApiDetail",
        json!({ "serviceName": "blog-api", "requestUrl": "/unknown", "httpMethod": "GET" }),
    )
    .await;
    assert_eq!(
        missing_path,
        json!({ "error": "Path not found", "path": "/unknown" })
    );

    let missing_method = call(
        &f,
        "getApiDetail",
        json!({ "serviceName": "blog-api", "requestUrl": "/posts/{id}", "httpMethod": "PUT" }),
    )
    .await;
    assert_eq!(
        missing_method,
        json!({ "error": "Method not found for path", "path": "/posts/{id}", "method": "put" })
    );
}

#[tokio::test]
async fn component_schemas_are_keyed_by_full_ref() {
    let server = blog_server(1).await;
    let f = fixture(vec![blog(&server)], 60);

    let schemas = call(
        &f,
        "getComponentSchemas",
        json!({
            "serviceName": "blog-api",
            "refs": " #/components/schemas/Post, ,#/components/schemas/Missing"
        }),
    )
    .await;

    assert_eq!(
        schemas,
        json!({
            "#/components/schemas/Post": {
                "type": "object",
                "required": ["id", "title"],
                "properties": {
                    "id": { "type": "integer", "format": "int64" },
                    "title": { "type": "string" },
                    "status": { "type": "string", "enum": ["DRAFT", "PUBLISHED"] },
                    "author": { "$ref": "#/components/schemas/Author" }
                }
            }
        })
    );
}

#[tokio::test]
async fn unknown_service_and_blank_base_url_are_structured_errors() {
    let f = fixture(
        vec![
            ServiceDescriptor::new("zeta", "http://localhost:1"),
            ServiceDescriptor::new("alpha", ""),
        ],
        60,
    );

    let unknown = call(&f, "listApis", json!({ "serviceName": "nope" })).await;
    assert_eq!(
        unknown,
        json!({ "error": "Unknown service name", "serviceName": "nope", "available": ["alpha", "zeta"] })
    );

    let blank = call(
        &f,
        "getComponentSchemas",
        json!({ "serviceName": "alpha", "refs": "#/components/schemas/Post" }),
    )
    .await;
    assert_eq!(
        blank,
        json!({ "error": "Base URL is empty", "serviceName": "alpha" })
    );
}

#[tokio::test]
async fn fetch_failure_propagates_out_of_list_apis() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/api-docs"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;
    let f = fixture(vec![blog(&server)], 60);

    let err = f
        .router
        .call("listApis", json!({ "serviceName": "blog-api" }))
        .await
        .unwrap_err();
    match err {
        ToolCallError::Fetch {
            service_name,
            source,
        } => {
            assert_eq!(service_name, "blog-api");
            assert!(matches!(source, FetchError::Status { status: 500, .. }));
        }
        other => panic!("expected fetch failure, got {other:?}"),
    }

    // Failures are not cached.
    assert!(
        f.router
            .call("getApiDetail", json!({ "serviceName": "blog-api", "requestUrl": "/posts", "httpMethod": "get" }))
            .await
            .is_err()
    );
    assert_eq!(f.metrics.fetch_error_count("blog-api"), 2);
}

#[tokio::test]
async fn unparseable_document_is_a_fetch_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/api-docs"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;
    let f = fixture(vec![blog(&server)], 60);

    let err = f
        .router
        .call("getComponentSchemas", json!({ "serviceName": "blog-api", "refs": "X" }))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ToolCallError::Fetch {
            source: FetchError::Parse { .. },
            ..
        }
    ));
}

#[tokio::test]
async fn empty_document_body_yields_empty_index() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/api-docs"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    let f = fixture(vec![blog(&server)], 60);

    let result = call(&f, "listApis", json!({ "serviceName": "blog-api" })).await;
    assert_eq!(result, json!({}));
}

#[tokio::test]
async fn list_services_reports_each_service_independently() {
    let server = blog_server(1).await;
    Mock::given(method("GET"))
        .and(path("/broken/api-docs"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let f = fixture(
        vec![
            blog(&server),
            ServiceDescriptor::new("broken", server.uri()).with_api_docs_path("broken/api-docs"),
            ServiceDescriptor::new("no-url", " "),
            ServiceDescriptor::new("", server.uri()),
        ],
        60,
    );

    let listing = call(&f, "listServices", Value::Null).await;
    let entries = listing.as_array().unwrap();
    assert_eq!(entries.len(), 3);

    assert_eq!(
        entries[0],
        json!({ "serviceName": "blog-api", "apiGroups": ["Admin", "comments", "posts"] })
    );
    assert_eq!(entries[1]["serviceName"], "broken");
    assert_eq!(entries[1]["error"], "OPENAPI_FETCH_FAILED");
    assert!(entries[1]["message"].as_str().unwrap().contains("503"));
    assert_eq!(
        entries[2],
        json!({ "serviceName": "no-url", "error": "MISSING_BASE_URL" })
    );
}

#[tokio::test]
async fn shadowed_duplicate_is_neither_listed_nor_cached() {
    let shadowed = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/api-docs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tags": [{ "name": "old" }],
            "components": { "schemas": { "Legacy": { "type": "string" } } }
        })))
        .expect(0)
        .mount(&shadowed)
        .await;
    let active = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/api-docs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tags": [{ "name": "new" }],
            "components": { "schemas": { "Current": { "type": "integer" } } }
        })))
        .expect(1)
        .mount(&active)
        .await;

    let f = fixture(
        vec![
            ServiceDescriptor::new("a", shadowed.uri()),
            ServiceDescriptor::new("a", active.uri()),
        ],
        60,
    );

    let listing = call(&f, "listServices", Value::Null).await;
    assert_eq!(listing, json!([{ "serviceName": "a", "apiGroups": ["new"] }]));

    let schemas = call(
        &f,
        "getComponentSchemas",
        json!({ "serviceName": "a", "refs": "#/components/schemas/Current,#/components/schemas/Legacy" }),
    )
    .await;
    assert_eq!(
        schemas,
        json!({ "#/components/schemas/Current": { "type": "integer" } })
    );
    assert_eq!(f.metrics.hit_count("a"), 1);
}
