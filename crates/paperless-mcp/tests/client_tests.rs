//! End-to-end tests for the Paperless-ngx API client.
//!
//! Each test points a `PaperlessClient` at a wiremock server standing in for
//! Paperless-ngx and checks both the outbound request and how the reply is
//! turned into a value or an error.

use paperless_mcp::clients::{
    DocumentDownload, ObjectOperation, ObjectPermissions, ObjectType, PaginatedList,
    PaperlessClient, PaperlessConfig, PaperlessError, PermissionSet, TagFields, UploadMetadata,
};
use reqwest::Method;
use serde_json::{json, Value};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "test-token";

/// Test fixture holding a mock Paperless-ngx server.
struct TestFixture {
    server: MockServer,
}

impl TestFixture {
    async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    fn client(&self) -> PaperlessClient {
        let config = PaperlessConfig::new(self.server.uri(), TOKEN);
        PaperlessClient::new(config).unwrap()
    }

    async fn single_request(&self) -> wiremock::Request {
        let mut requests = self.server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1, "expected exactly one request");
        requests.remove(0)
    }
}

// =============================================================================
// Request primitive
// =============================================================================

#[tokio::test]
async fn test_standard_headers_sent() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/documents/1/"))
        .and(header("Authorization", "Token test-token"))
        .and(header("Accept", "application/json; version=5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1,
            "title": "Invoice"
        })))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let document = fixture.client().get_document(1).await.unwrap();
    assert_eq!(document.id, 1);
    assert_eq!(document.title.as_deref(), Some("Invoice"));

    let request = fixture.single_request().await;
    let language = request
        .headers
        .get("accept-language")
        .and_then(|v| v.to_str().ok());
    assert_eq!(language, Some("en-US,en;q=0.9"));
    let content_type = request
        .headers
        .get("content-type")
        .and_then(|v| v.to_str().ok());
    assert_eq!(content_type, Some("application/json"));
}

#[tokio::test]
async fn test_error_carries_status_and_path() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/documents/99/"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Not found."})))
        .mount(&fixture.server)
        .await;

    let err = fixture.client().get_document(99).await.unwrap_err();
    let message = err.to_string();
    assert!(message.contains("404"), "{}", message);
    assert!(message.contains("/documents/99/"), "{}", message);

    match err {
        PaperlessError::Api { status, path, body } => {
            assert_eq!(status, 404);
            assert_eq!(path, "/documents/99/");
            assert_eq!(body, Some(json!({"detail": "Not found."})));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_error_with_non_json_body() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/tags/"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&fixture.server)
        .await;

    let err = fixture.client().list_tags(None).await.unwrap_err();
    assert_eq!(err.status(), Some(502));
    match err {
        PaperlessError::Api { body, .. } => {
            assert_eq!(body, Some(Value::String("<html>Bad Gateway</html>".to_string())));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_error_with_empty_body() {
    let fixture = TestFixture::new().await;

    Mock::given(method("DELETE"))
        .and(path("/api/tags/5/"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&fixture.server)
        .await;

    let err = fixture.client().delete_tag(5).await.unwrap_err();
    let message = err.to_string();
    assert!(message.contains("403"));
    assert!(message.contains("/tags/5/"));
    assert!(message.contains("null"));
}

#[tokio::test]
async fn test_no_content_returns_none() {
    let fixture = TestFixture::new().await;

    Mock::given(method("DELETE"))
        .and(path("/api/correspondents/8/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let result: Option<Value> = fixture
        .client()
        .request(Method::DELETE, "/correspondents/8/", None, None)
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_malformed_success_body() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/documents/3/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("definitely not json"))
        .mount(&fixture.server)
        .await;

    let err = fixture.client().get_document(3).await.unwrap_err();
    assert!(matches!(err, PaperlessError::InvalidResponse { .. }));
}

#[tokio::test]
async fn test_success_body_keeps_shape() {
    let fixture = TestFixture::new().await;
    let raw = json!({
        "count": 1,
        "next": null,
        "previous": null,
        "all": [4],
        "results": [{
            "id": 4,
            "title": "Lease",
            "content": "",
            "tags": [],
            "correspondent": null,
            "document_type": null,
            "storage_path": null,
            "created": "2023-01-01",
            "added": "2023-01-02T00:00:00Z",
            "modified": "2023-01-02T00:00:00Z",
            "archive_serial_number": 12,
            "custom_fields": [],
            "notes": [],
            "page_count": 3
        }]
    });

    Mock::given(method("GET"))
        .and(path("/api/documents/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(raw.clone()))
        .mount(&fixture.server)
        .await;

    let page = fixture.client().list_documents(None).await.unwrap();
    assert_eq!(serde_json::to_value(&page).unwrap(), raw);
}

#[tokio::test]
async fn test_partial_body_gains_no_keys() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/documents/1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1, "title": "Invoice"})))
        .mount(&fixture.server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/tags/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 1,
            "results": [{"id": 3, "name": "Inbox", "color": null}]
        })))
        .mount(&fixture.server)
        .await;

    let document = fixture.client().get_document(1).await.unwrap();
    assert_eq!(
        serde_json::to_value(&document).unwrap(),
        json!({"id": 1, "title": "Invoice"})
    );

    let tags = fixture.client().list_tags(None).await.unwrap();
    assert_eq!(tags.results[0].color, Some(None));
    assert_eq!(
        serde_json::to_value(&tags).unwrap(),
        json!({"count": 1, "results": [{"id": 3, "name": "Inbox", "color": null}]})
    );
}

// =============================================================================
// Documents
// =============================================================================

#[tokio::test]
async fn test_search_strips_heavy_fields() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/documents/"))
        .and(query_param("query", "electricity bill"))
        .and(query_param("page", "2"))
        .and(query_param("page_size", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 6,
            "next": null,
            "previous": "http://paperless/api/documents/?page=1",
            "results": [{
                "id": 11,
                "title": "Electricity March",
                "content": "long OCR text",
                "download_url": "/api/documents/11/download/",
                "thumbnail_url": "/api/documents/11/thumb/",
                "__search_hit__": {"score": 1.5, "rank": 0}
            }]
        })))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let page: PaginatedList<Value> = fixture
        .client()
        .search_documents("electricity bill", Some(2), Some(5))
        .await
        .unwrap();

    assert_eq!(page.count, Some(6));
    assert_eq!(
        page.results[0],
        json!({
            "id": 11,
            "title": "Electricity March",
            "__search_hit__": {"score": 1.5, "rank": 0}
        })
    );
}

#[tokio::test]
async fn test_search_omits_unset_paging() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/documents/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 0, "next": null, "previous": null, "results": []
        })))
        .mount(&fixture.server)
        .await;

    fixture
        .client()
        .search_documents("receipt", None, None)
        .await
        .unwrap();

    let request = fixture.single_request().await;
    assert_eq!(request.url.query(), Some("query=receipt"));
}

#[tokio::test]
async fn test_download_original() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/documents/42/download/"))
        .and(query_param("original", "true"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-disposition", "attachment; filename=\"scan-42.pdf\"")
                .set_body_raw(b"%PDF-1.4 original".to_vec(), "application/pdf"),
        )
        .expect(1)
        .mount(&fixture.server)
        .await;

    let response = fixture.client().download_document(42, true).await.unwrap();
    let download = DocumentDownload::read(42, response).await.unwrap();

    assert_eq!(download.filename, "scan-42.pdf");
    assert_eq!(download.content_type.as_deref(), Some("application/pdf"));
    assert_eq!(download.bytes, b"%PDF-1.4 original");
}

#[tokio::test]
async fn test_download_archived_without_query() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/documents/42/download/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"%PDF".to_vec(), "application/pdf"))
        .mount(&fixture.server)
        .await;

    let response = fixture.client().download_document(42, false).await.unwrap();
    let download = DocumentDownload::read(42, response).await.unwrap();
    assert_eq!(download.filename, "document-42");

    let request = fixture.single_request().await;
    assert_eq!(request.url.path(), "/api/documents/42/download/");
    assert_eq!(request.url.query(), None);
}

#[tokio::test]
async fn test_download_error_is_normalized() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/documents/7/download/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&fixture.server)
        .await;

    let err = fixture.client().download_document(7, false).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn test_post_document_multipart() {
    let fixture = TestFixture::new().await;

    Mock::given(method("POST"))
        .and(path("/api/documents/post_document/"))
        .and(header("Authorization", "Token test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("3f2a-task")))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let metadata = UploadMetadata {
        title: Some("T".to_string()),
        tags: vec![10, 20],
        ..UploadMetadata::default()
    };
    let task_id = fixture
        .client()
        .post_document(b"file bytes".to_vec(), "scan.pdf", &metadata)
        .await
        .unwrap();
    assert_eq!(task_id, "3f2a-task");

    let request = fixture.single_request().await;
    let content_type = request
        .headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(
        content_type.starts_with("multipart/form-data; boundary="),
        "{}",
        content_type
    );

    let body = String::from_utf8_lossy(&request.body);
    assert_eq!(body.matches("name=\"tags\"").count(), 2);
    assert!(body.contains("\r\n\r\n10\r\n"));
    assert!(body.contains("\r\n\r\n20\r\n"));
    assert!(!body.contains("10,20"));
    assert!(body.contains("name=\"title\""));
    assert!(body.contains("filename=\"scan.pdf\""));
    assert!(!body.contains("name=\"correspondent\""));
}

#[tokio::test]
async fn test_bulk_edit_documents_body() {
    let fixture = TestFixture::new().await;

    let mut parameters = serde_json::Map::new();
    parameters.insert("add_tags".to_string(), json!([1]));
    parameters.insert("remove_tags".to_string(), json!([2]));

    Mock::given(method("POST"))
        .and(path("/api/documents/bulk_edit/"))
        .and(body_json(json!({
            "documents": [5, 6],
            "method": "modify_tags",
            "parameters": {"add_tags": [1], "remove_tags": [2]}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": "OK"})))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let result = fixture
        .client()
        .bulk_edit_documents(
            &[5, 6],
            paperless_mcp::clients::BulkEditMethod::ModifyTags,
            parameters,
        )
        .await
        .unwrap();
    assert_eq!(result, json!({"result": "OK"}));
}

// =============================================================================
// Taxonomy objects
// =============================================================================

#[tokio::test]
async fn test_update_tag_is_patch() {
    let fixture = TestFixture::new().await;

    Mock::given(method("PATCH"))
        .and(path("/api/tags/3/"))
        .and(body_json(json!({"name": "X"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 3,
            "name": "X",
            "matching_algorithm": 1
        })))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let tag = fixture
        .client()
        .update_tag(3, &TagFields::named("X"))
        .await
        .unwrap();
    assert_eq!(tag.name, "X");
}

#[tokio::test]
async fn test_bulk_edit_objects_delete_payload() {
    let fixture = TestFixture::new().await;

    Mock::given(method("POST"))
        .and(path("/api/bulk_edit_objects/"))
        .and(body_json(json!({
            "objects": [1, 2],
            "object_type": "tags",
            "operation": "delete"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": "OK"})))
        .expect(1)
        .mount(&fixture.server)
        .await;

    fixture
        .client()
        .bulk_edit_objects(&[1, 2], ObjectType::Tags, &ObjectOperation::Delete)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_bulk_edit_objects_set_permissions_payload() {
    let fixture = TestFixture::new().await;

    let permissions = ObjectPermissions {
        view: PermissionSet {
            users: vec![2],
            groups: vec![],
        },
        change: PermissionSet::default(),
    };

    Mock::given(method("POST"))
        .and(path("/api/bulk_edit_objects/"))
        .and(body_json(json!({
            "objects": [9],
            "object_type": "document_types",
            "operation": "set_permissions",
            "owner": 1,
            "permissions": {
                "view": {"users": [2], "groups": []},
                "change": {"users": [], "groups": []}
            },
            "merge": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": "OK"})))
        .expect(1)
        .mount(&fixture.server)
        .await;

    fixture
        .client()
        .bulk_edit_objects(
            &[9],
            ObjectType::DocumentTypes,
            &ObjectOperation::SetPermissions {
                owner: Some(1),
                permissions: Some(permissions),
                merge: Some(true),
            },
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_list_correspondents_with_query() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/correspondents/"))
        .and(query_param("name__icontains", "bank"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 1,
            "next": null,
            "previous": null,
            "results": [{
                "id": 2,
                "name": "Bank",
                "match": "",
                "matching_algorithm": 6,
                "is_insensitive": true,
                "document_count": 14,
                "last_correspondence": "2024-05-01"
            }]
        })))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let page = fixture
        .client()
        .list_correspondents(Some("name__icontains=bank"))
        .await
        .unwrap();
    assert_eq!(page.results[0].name, "Bank");
    assert_eq!(page.results[0].document_count, Some(14));
}
