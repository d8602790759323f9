//! End-to-end tests for tool dispatch.
//!
//! These drive `tools/call` through the JSON-RPC entry point of a fully
//! registered server, with wiremock standing in for Paperless-ngx. They
//! check argument validation, the request that reaches the API, and the
//! reply envelope or error that comes back.

use paperless_mcp::clients::{PaperlessClient, PaperlessConfig};
use paperless_mcp::tools::all_tools;
use paperless_mcp::{McpError, McpRequest, McpResponse, McpServer, RequestId};
use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Test fixture: a mock Paperless-ngx server and an MCP server wired to it.
struct TestFixture {
    paperless: MockServer,
    server: McpServer,
}

impl TestFixture {
    async fn new() -> Self {
        let paperless = MockServer::start().await;
        let config = PaperlessConfig::new(paperless.uri(), "test-token");
        let client = Arc::new(PaperlessClient::new(config).unwrap());

        let server = McpServer::paperless();
        server.register_tools(all_tools(client)).await;

        Self { paperless, server }
    }

    async fn call(&self, name: &str, arguments: Value) -> McpResponse {
        let request = McpRequest::new(1, "tools/call").with_params(json!({
            "name": name,
            "arguments": arguments
        }));
        self.server.handle_request(request).await.unwrap()
    }

    /// Call a tool that must succeed and return the JSON inside its envelope.
    async fn call_ok(&self, name: &str, arguments: Value) -> Value {
        let response = self.call(name, arguments).await;
        assert!(response.error.is_none(), "unexpected error: {:?}", response.error);

        let result = response.result.unwrap();
        let content = result["content"].as_array().unwrap();
        assert_eq!(content.len(), 1);
        assert_eq!(content[0]["type"], "text");
        assert!(result.get("isError").is_none());

        serde_json::from_str(content[0]["text"].as_str().unwrap()).unwrap()
    }

    async fn call_err(&self, name: &str, arguments: Value) -> McpError {
        let response = self.call(name, arguments).await;
        assert!(response.result.is_none(), "expected an error for {}", name);
        response.error.unwrap()
    }
}

#[tokio::test]
async fn test_tools_list() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .server
        .handle_request(McpRequest::new("list", "tools/list"))
        .await
        .unwrap();
    assert_eq!(response.id, RequestId::String("list".to_string()));

    let tools = response.result.unwrap()["tools"].as_array().unwrap().clone();
    assert_eq!(tools.len(), 21);

    let names: Vec<&str> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted, "tools/list should be sorted by name");

    for expected in [
        "bulk_edit_documents",
        "bulk_edit_tags",
        "create_correspondent",
        "delete_document_type",
        "post_document",
        "update_tag",
    ] {
        assert!(names.contains(&expected), "missing {}", expected);
    }
}

#[tokio::test]
async fn test_create_tag_out_of_range_algorithm_sends_nothing() {
    let fixture = TestFixture::new().await;

    Mock::given(method("POST"))
        .and(path("/api/tags/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 1, "name": "Invoice"})))
        .expect(0)
        .mount(&fixture.paperless)
        .await;

    let error = fixture
        .call_err("create_tag", json!({"name": "Invoice", "matching_algorithm": 7}))
        .await;
    assert_eq!(error.code, McpError::INVALID_PARAMS);
}

#[tokio::test]
async fn test_create_tag_bad_color_sends_nothing() {
    let fixture = TestFixture::new().await;

    let error = fixture
        .call_err("create_tag", json!({"name": "Invoice", "color": "blue"}))
        .await;
    assert_eq!(error.code, McpError::INVALID_PARAMS);

    let requests = fixture.paperless.received_requests().await.unwrap();
    assert!(requests.is_empty());
}

#[tokio::test]
async fn test_create_tag() {
    let fixture = TestFixture::new().await;

    Mock::given(method("POST"))
        .and(path("/api/tags/"))
        .and(body_json(json!({
            "name": "Invoice",
            "color": "#a6cee3",
            "matching_algorithm": 2
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 12,
            "name": "Invoice",
            "color": "#a6cee3",
            "match": "",
            "matching_algorithm": 2,
            "is_insensitive": true,
            "is_inbox_tag": false,
            "document_count": 0
        })))
        .expect(1)
        .mount(&fixture.paperless)
        .await;

    let tag = fixture
        .call_ok(
            "create_tag",
            json!({"name": "Invoice", "color": "#a6cee3", "matching_algorithm": 2}),
        )
        .await;
    assert_eq!(tag["id"], 12);
    assert_eq!(tag["matching_algorithm"], 2);
}

#[tokio::test]
async fn test_create_tag_reply_matches_upstream() {
    let fixture = TestFixture::new().await;
    let upstream = json!({
        "id": 9,
        "name": "Invoice",
        "match": "",
        "matching_algorithm": 1,
        "is_insensitive": true
    });

    Mock::given(method("POST"))
        .and(path("/api/tags/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(upstream.clone()))
        .expect(1)
        .mount(&fixture.paperless)
        .await;

    let tag = fixture.call_ok("create_tag", json!({"name": "Invoice"})).await;
    assert_eq!(tag, upstream);
}

#[tokio::test]
async fn test_get_document_reply_matches_upstream() {
    let fixture = TestFixture::new().await;
    let upstream = json!({"id": 1, "title": "Invoice", "correspondent": null});

    Mock::given(method("GET"))
        .and(path("/api/documents/1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(upstream.clone()))
        .expect(1)
        .mount(&fixture.paperless)
        .await;

    let document = fixture.call_ok("get_document", json!({"id": 1})).await;
    assert_eq!(document, upstream);
}

#[tokio::test]
async fn test_update_document_type_reply_matches_upstream() {
    let fixture = TestFixture::new().await;
    let upstream = json!({"id": 2, "name": "Receipt", "owner": null});

    Mock::given(method("PATCH"))
        .and(path("/api/document_types/2/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(upstream.clone()))
        .expect(1)
        .mount(&fixture.paperless)
        .await;

    let updated = fixture
        .call_ok("update_document_type", json!({"id": 2, "name": "Receipt"}))
        .await;
    assert_eq!(updated, upstream);
}

#[tokio::test]
async fn test_update_correspondent_is_partial() {
    let fixture = TestFixture::new().await;

    Mock::given(method("PATCH"))
        .and(path("/api/correspondents/4/"))
        .and(body_json(json!({"matching_algorithm": 0})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 4,
            "name": "ACME",
            "matching_algorithm": 0
        })))
        .expect(1)
        .mount(&fixture.paperless)
        .await;

    let updated = fixture
        .call_ok("update_correspondent", json!({"id": 4, "matching_algorithm": 0}))
        .await;
    assert_eq!(updated["name"], "ACME");
}

#[tokio::test]
async fn test_bulk_edit_documents_forwards_supplied_parameters() {
    let fixture = TestFixture::new().await;

    Mock::given(method("POST"))
        .and(path("/api/documents/bulk_edit/"))
        .and(body_json(json!({
            "documents": [1, 2],
            "method": "set_correspondent",
            "parameters": {"correspondent": null, "degrees": 90}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": "OK"})))
        .expect(1)
        .mount(&fixture.paperless)
        .await;

    let result = fixture
        .call_ok(
            "bulk_edit_documents",
            json!({
                "documents": [1, 2],
                "method": "set_correspondent",
                "correspondent": null,
                "degrees": 90
            }),
        )
        .await;
    assert_eq!(result, json!({"result": "OK"}));
}

#[tokio::test]
async fn test_bulk_edit_tags_delete_drops_extras() {
    let fixture = TestFixture::new().await;

    Mock::given(method("POST"))
        .and(path("/api/bulk_edit_objects/"))
        .and(body_json(json!({
            "objects": [3, 4],
            "object_type": "tags",
            "operation": "delete"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": "OK"})))
        .expect(1)
        .mount(&fixture.paperless)
        .await;

    fixture
        .call_ok(
            "bulk_edit_tags",
            json!({
                "ids": [3, 4],
                "operation": "delete",
                "owner": 1,
                "permissions": {"view": {"users": [1]}},
                "merge": true
            }),
        )
        .await;
}

#[tokio::test]
async fn test_delete_document_type() {
    let fixture = TestFixture::new().await;

    Mock::given(method("DELETE"))
        .and(path("/api/document_types/6/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&fixture.paperless)
        .await;

    let result = fixture.call_ok("delete_document_type", json!({"id": 6})).await;
    assert_eq!(result, json!({"id": 6, "deleted": true}));
}

#[tokio::test]
async fn test_search_documents_tool() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/documents/"))
        .and(query_param("query", "insurance"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 1,
            "next": null,
            "previous": null,
            "results": [{
                "id": 5,
                "title": "Car insurance",
                "content": "policy text",
                "download_url": "/api/documents/5/download/",
                "thumbnail_url": "/api/documents/5/thumb/"
            }]
        })))
        .expect(1)
        .mount(&fixture.paperless)
        .await;

    let page = fixture
        .call_ok("search_documents", json!({"query": "insurance"}))
        .await;
    assert_eq!(page["results"][0], json!({"id": 5, "title": "Car insurance"}));
}

#[tokio::test]
async fn test_list_documents_tool_builds_query() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/documents/"))
        .and(query_param("tags__id__all", "1,2"))
        .and(query_param("ordering", "-created"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 0, "next": null, "previous": null, "results": []
        })))
        .expect(1)
        .mount(&fixture.paperless)
        .await;

    let page = fixture
        .call_ok(
            "list_documents",
            json!({"tags__id__all": [1, 2], "ordering": "-created"}),
        )
        .await;
    assert_eq!(page["count"], 0);
}

#[tokio::test]
async fn test_download_document_tool() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/documents/9/download/"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-disposition", "attachment; filename=\"note.txt\"")
                .set_body_raw(b"hello".to_vec(), "text/plain"),
        )
        .expect(1)
        .mount(&fixture.paperless)
        .await;

    let result = fixture.call_ok("download_document", json!({"id": 9})).await;
    assert_eq!(result["filename"], "note.txt");
    assert_eq!(result["size"], 5);
    assert_eq!(result["content_base64"], "aGVsbG8=");
}

#[tokio::test]
async fn test_post_document_tool() {
    let fixture = TestFixture::new().await;

    Mock::given(method("POST"))
        .and(path("/api/documents/post_document/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("task-77")))
        .expect(1)
        .mount(&fixture.paperless)
        .await;

    let result = fixture
        .call_ok(
            "post_document",
            json!({
                "file": "aGVsbG8=",
                "filename": "note.txt",
                "created": "2024-02-29",
                "tags": [3]
            }),
        )
        .await;
    assert_eq!(result, json!({"task_id": "task-77"}));
}

#[tokio::test]
async fn test_post_document_bad_date_sends_nothing() {
    let fixture = TestFixture::new().await;

    let error = fixture
        .call_err(
            "post_document",
            json!({"file": "aGVsbG8=", "filename": "note.txt", "created": "yesterday"}),
        )
        .await;
    assert_eq!(error.code, McpError::INVALID_PARAMS);
    assert!(fixture.paperless.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_upstream_failure_is_rpc_error() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/documents/404/"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Not found."})))
        .mount(&fixture.paperless)
        .await;

    let error = fixture.call_err("get_document", json!({"id": 404})).await;
    assert_eq!(error.code, McpError::INTERNAL_ERROR);
    assert!(error.message.contains("404"));

    let data = error.data.unwrap();
    assert_eq!(data["status"], 404);
    assert_eq!(data["path"], "/documents/404/");
    assert_eq!(data["body"], json!({"detail": "Not found."}));
}

#[tokio::test]
async fn test_unknown_tool() {
    let fixture = TestFixture::new().await;

    let error = fixture.call_err("shred_everything", json!({})).await;
    assert_eq!(error.code, McpError::INVALID_PARAMS);
    assert!(error.message.contains("shred_everything"));
}
