//! Paperless-ngx REST API client.
//!
//! Every operation is one HTTP exchange with the remote service. JSON calls
//! go through [`PaperlessClient::request`]; uploads (multipart) and downloads
//! (binary) build their own requests from the same standard headers so the
//! authentication and version pinning cannot drift between the three paths.
//!
//! Remote JSON is deserialized into the declared result type without further
//! validation. The client holds only immutable configuration and is safe to
//! share across concurrent calls.

use super::config::PaperlessConfig;
use super::models::{
    BulkEditMethod, ClassifierFields, Correspondent, Document, DocumentType, ObjectId,
    ObjectOperation, ObjectType, PaginatedList, Tag, TagFields, UploadMetadata,
};
use regex::Regex;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, AUTHORIZATION, CONTENT_DISPOSITION,
    CONTENT_TYPE,
};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use std::sync::OnceLock;
use thiserror::Error;
use tracing::{debug, instrument, warn};
use url::form_urlencoded;

/// Fields removed from every search hit to bound response size.
pub const SEARCH_STRIPPED_FIELDS: [&str; 3] = ["content", "download_url", "thumbnail_url"];

const ACCEPT_LANGUAGE_VALUE: &str = "en-US,en;q=0.9";

/// Paperless client errors.
#[derive(Debug, Error)]
pub enum PaperlessError {
    /// The HTTP exchange itself failed (DNS, connection, timeout).
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("Paperless API error {status} on {path}: {}", render_body(.body))]
    Api {
        /// HTTP status code.
        status: u16,
        /// Request path relative to the API root.
        path: String,
        /// Response body, parsed as JSON when possible.
        body: Option<Value>,
    },

    /// A 2xx response carried a body that is not the expected JSON.
    #[error("Invalid response from {path}: {message}")]
    InvalidResponse {
        /// Request path relative to the API root.
        path: String,
        /// Parse failure.
        message: String,
    },

    /// A request payload could not be serialized.
    #[error("Failed to encode request: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A header value contained characters HTTP does not allow.
    #[error("Invalid header value for {0}")]
    InvalidHeader(String),

    /// The underlying HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(reqwest::Error),
}

impl PaperlessError {
    /// HTTP status of a remote rejection, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            PaperlessError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn render_body(body: &Option<Value>) -> String {
    match body {
        Some(value) => value.to_string(),
        None => "null".to_string(),
    }
}

/// Paperless-ngx API client.
#[derive(Clone)]
pub struct PaperlessClient {
    /// HTTP client instance.
    client: Client,

    /// Connection settings.
    config: PaperlessConfig,
}

impl PaperlessClient {
    /// Create a new client from a resolved configuration.
    pub fn new(config: PaperlessConfig) -> Result<Self, PaperlessError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(PaperlessError::ClientBuild)?;

        Ok(Self { client, config })
    }

    /// The configuration this client was built from.
    pub fn config(&self) -> &PaperlessConfig {
        &self.config
    }

    /// Headers sent on every request: token auth, pinned API version, and
    /// language. Content type is left to each call shape.
    pub fn standard_headers(&self) -> Result<HeaderMap, PaperlessError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            header_value("Authorization", &self.config.authorization_header())?,
        );
        headers.insert(ACCEPT, header_value("Accept", &self.config.accept_header())?);
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_VALUE));
        Ok(headers)
    }

    /// Issue a JSON request against `{base_url}/api{path}`.
    ///
    /// Caller headers are merged over the defaults, except `Authorization`
    /// which always comes from the configuration. Returns `Ok(None)` for
    /// `204 No Content` without reading the body.
    #[instrument(skip(self, body, extra_headers))]
    pub async fn request<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<Option<T>, PaperlessError>
    where
        T: DeserializeOwned,
    {
        let mut headers = self.standard_headers()?;
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(extra) = extra_headers {
            merge_headers(&mut headers, extra);
        }

        let url = self.config.api_url(path);
        debug!("Sending {} {}", method, url);

        let mut request = self.client.request(method, &url).headers(headers);
        if let Some(body) = body {
            request = request.body(serde_json::to_vec(&body)?);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(api_error(path, response).await);
        }

        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| PaperlessError::InvalidResponse {
                path: path.to_string(),
                message: e.to_string(),
            })
    }

    /// JSON request whose success must carry a body.
    async fn request_json<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, PaperlessError>
    where
        T: DeserializeOwned,
    {
        self.request(method, path, body, None)
            .await?
            .ok_or_else(|| PaperlessError::InvalidResponse {
                path: path.to_string(),
                message: "expected a JSON body, got 204 No Content".to_string(),
            })
    }

    /// List documents. `query` is an already-encoded query string, with or
    /// without the leading `?`.
    pub async fn list_documents(
        &self,
        query: Option<&str>,
    ) -> Result<PaginatedList<Document>, PaperlessError> {
        let path = with_query("/documents/", query);
        self.request_json(Method::GET, &path, None).await
    }

    /// Get a single document.
    #[instrument(skip(self))]
    pub async fn get_document(&self, id: ObjectId) -> Result<Document, PaperlessError> {
        self.request_json(Method::GET, &format!("/documents/{}/", id), None)
            .await
    }

    /// Full-text search. Hits come back without their content and URL fields.
    #[instrument(skip(self))]
    pub async fn search_documents(
        &self,
        query: &str,
        page: Option<u32>,
        page_size: Option<u32>,
    ) -> Result<PaginatedList<Value>, PaperlessError> {
        let path = search_path(query, page, page_size);
        let raw: PaginatedList<Value> = self.request_json(Method::GET, &path, None).await?;
        Ok(strip_search_fields(&raw))
    }

    /// Start a download of the archived (or original) file.
    ///
    /// Returns the raw response once its status has been checked; read it
    /// with [`DocumentDownload::read`].
    #[instrument(skip(self))]
    pub async fn download_document(
        &self,
        id: ObjectId,
        original: bool,
    ) -> Result<reqwest::Response, PaperlessError> {
        let path = download_path(id, original);
        let url = self.config.api_url(&path);
        debug!("Downloading document {} from {}", id, url);

        let response = self
            .client
            .get(&url)
            .headers(self.standard_headers()?)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(&path, response).await);
        }

        Ok(response)
    }

    /// Upload a file for asynchronous consumption. Returns the task ID the
    /// server assigns to the consume job.
    #[instrument(skip(self, file, metadata), fields(size = file.len()))]
    pub async fn post_document(
        &self,
        file: Vec<u8>,
        filename: &str,
        metadata: &UploadMetadata,
    ) -> Result<String, PaperlessError> {
        let path = "/documents/post_document/";
        let url = self.config.api_url(path);

        let mut form =
            Form::new().part("document", Part::bytes(file).file_name(filename.to_string()));
        for (name, value) in metadata.form_fields() {
            form = form.text(name, value);
        }

        debug!("Uploading {} to {}", filename, url);

        // No explicit content type: reqwest sets the multipart boundary.
        let response = self
            .client
            .post(&url)
            .headers(self.standard_headers()?)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(path, response).await);
        }

        let text = response.text().await?;
        Ok(parse_task_id(&text))
    }

    /// Apply one bulk edit method to a set of documents. `parameters` is
    /// forwarded untouched.
    #[instrument(skip(self, documents, parameters), fields(count = documents.len()))]
    pub async fn bulk_edit_documents(
        &self,
        documents: &[ObjectId],
        method: BulkEditMethod,
        parameters: Map<String, Value>,
    ) -> Result<Value, PaperlessError> {
        let body = json!({
            "documents": documents,
            "method": method,
            "parameters": parameters,
        });
        self.request(Method::POST, "/documents/bulk_edit/", Some(body), None)
            .await
            .map(|result| result.unwrap_or(Value::Null))
    }

    /// List objects of one taxonomy family.
    pub async fn list_objects<T>(
        &self,
        kind: ObjectType,
        query: Option<&str>,
    ) -> Result<PaginatedList<T>, PaperlessError>
    where
        T: DeserializeOwned,
    {
        let path = with_query(&kind.collection_path(), query);
        self.request_json(Method::GET, &path, None).await
    }

    /// Create an object of one taxonomy family.
    async fn create_object<T>(&self, kind: ObjectType, body: Value) -> Result<T, PaperlessError>
    where
        T: DeserializeOwned,
    {
        self.request_json(Method::POST, &kind.collection_path(), Some(body))
            .await
    }

    /// Partially update an object; only the supplied fields change.
    async fn update_object<T>(
        &self,
        kind: ObjectType,
        id: ObjectId,
        body: Value,
    ) -> Result<T, PaperlessError>
    where
        T: DeserializeOwned,
    {
        self.request_json(Method::PATCH, &kind.item_path(id), Some(body))
            .await
    }

    /// Delete an object of one taxonomy family.
    #[instrument(skip(self))]
    pub async fn delete_object(&self, kind: ObjectType, id: ObjectId) -> Result<(), PaperlessError> {
        self.request::<Value>(Method::DELETE, &kind.item_path(id), None, None)
            .await
            .map(|_| ())
    }

    /// List tags.
    pub async fn list_tags(&self, query: Option<&str>) -> Result<PaginatedList<Tag>, PaperlessError> {
        self.list_objects(ObjectType::Tags, query).await
    }

    /// Create a tag.
    #[instrument(skip(self, fields))]
    pub async fn create_tag(&self, fields: &TagFields) -> Result<Tag, PaperlessError> {
        self.create_object(ObjectType::Tags, serde_json::to_value(fields)?)
            .await
    }

    /// Update a tag with PATCH semantics.
    #[instrument(skip(self, fields))]
    pub async fn update_tag(&self, id: ObjectId, fields: &TagFields) -> Result<Tag, PaperlessError> {
        self.update_object(ObjectType::Tags, id, serde_json::to_value(fields)?)
            .await
    }

    /// Delete a tag.
    pub async fn delete_tag(&self, id: ObjectId) -> Result<(), PaperlessError> {
        self.delete_object(ObjectType::Tags, id).await
    }

    /// List correspondents.
    pub async fn list_correspondents(
        &self,
        query: Option<&str>,
    ) -> Result<PaginatedList<Correspondent>, PaperlessError> {
        self.list_objects(ObjectType::Correspondents, query).await
    }

    /// Create a correspondent.
    #[instrument(skip(self, fields))]
    pub async fn create_correspondent(
        &self,
        fields: &ClassifierFields,
    ) -> Result<Correspondent, PaperlessError> {
        self.create_object(ObjectType::Correspondents, serde_json::to_value(fields)?)
            .await
    }

    /// Update a correspondent with PATCH semantics.
    #[instrument(skip(self, fields))]
    pub async fn update_correspondent(
        &self,
        id: ObjectId,
        fields: &ClassifierFields,
    ) -> Result<Correspondent, PaperlessError> {
        self.update_object(ObjectType::Correspondents, id, serde_json::to_value(fields)?)
            .await
    }

    /// Delete a correspondent.
    pub async fn delete_correspondent(&self, id: ObjectId) -> Result<(), PaperlessError> {
        self.delete_object(ObjectType::Correspondents, id).await
    }

    /// List document types.
    pub async fn list_document_types(
        &self,
        query: Option<&str>,
    ) -> Result<PaginatedList<DocumentType>, PaperlessError> {
        self.list_objects(ObjectType::DocumentTypes, query).await
    }

    /// Create a document type.
    #[instrument(skip(self, fields))]
    pub async fn create_document_type(
        &self,
        fields: &ClassifierFields,
    ) -> Result<DocumentType, PaperlessError> {
        self.create_object(ObjectType::DocumentTypes, serde_json::to_value(fields)?)
            .await
    }

    /// Update a document type with PATCH semantics.
    #[instrument(skip(self, fields))]
    pub async fn update_document_type(
        &self,
        id: ObjectId,
        fields: &ClassifierFields,
    ) -> Result<DocumentType, PaperlessError> {
        self.update_object(ObjectType::DocumentTypes, id, serde_json::to_value(fields)?)
            .await
    }

    /// Delete a document type.
    pub async fn delete_document_type(&self, id: ObjectId) -> Result<(), PaperlessError> {
        self.delete_object(ObjectType::DocumentTypes, id).await
    }

    /// Apply one operation to a set of tags, correspondents, or document types.
    #[instrument(skip(self, objects, operation), fields(count = objects.len(), operation = operation.as_str()))]
    pub async fn bulk_edit_objects(
        &self,
        objects: &[ObjectId],
        kind: ObjectType,
        operation: &ObjectOperation,
    ) -> Result<Value, PaperlessError> {
        let body = bulk_edit_objects_body(objects, kind, operation);
        self.request(Method::POST, "/bulk_edit_objects/", Some(body), None)
            .await
            .map(|result| result.unwrap_or(Value::Null))
    }
}

/// Body for `/bulk_edit_objects/`. Owner and permission keys appear only
/// for `set_permissions`, and only when supplied.
pub fn bulk_edit_objects_body(
    objects: &[ObjectId],
    kind: ObjectType,
    operation: &ObjectOperation,
) -> Value {
    let mut body = Map::new();
    body.insert("objects".to_string(), json!(objects));
    body.insert("object_type".to_string(), json!(kind.as_str()));
    body.insert("operation".to_string(), json!(operation.as_str()));

    if let ObjectOperation::SetPermissions {
        owner,
        permissions,
        merge,
    } = operation
    {
        if let Some(owner) = owner {
            body.insert("owner".to_string(), json!(owner));
        }
        if let Some(permissions) = permissions {
            body.insert("permissions".to_string(), json!(permissions));
        }
        if let Some(merge) = merge {
            body.insert("merge".to_string(), json!(merge));
        }
    }

    Value::Object(body)
}

/// Copy of a search page with the heavy fields removed from every hit.
pub fn strip_search_fields(page: &PaginatedList<Value>) -> PaginatedList<Value> {
    let results = page
        .results
        .iter()
        .map(|hit| match hit {
            Value::Object(fields) => Value::Object(
                fields
                    .iter()
                    .filter(|(key, _)| !SEARCH_STRIPPED_FIELDS.contains(&key.as_str()))
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect(),
            ),
            other => other.clone(),
        })
        .collect();

    PaginatedList {
        count: page.count,
        next: page.next.clone(),
        previous: page.previous.clone(),
        results,
        extra: page.extra.clone(),
    }
}

/// Path for a full-text search; paging keys appear only when supplied.
pub fn search_path(query: &str, page: Option<u32>, page_size: Option<u32>) -> String {
    let mut params = form_urlencoded::Serializer::new(String::new());
    params.append_pair("query", query);
    if let Some(page) = page {
        params.append_pair("page", &page.to_string());
    }
    if let Some(page_size) = page_size {
        params.append_pair("page_size", &page_size.to_string());
    }
    format!("/documents/?{}", params.finish())
}

/// Path for a document download.
pub fn download_path(id: ObjectId, original: bool) -> String {
    if original {
        format!("/documents/{}/download/?original=true", id)
    } else {
        format!("/documents/{}/download/", id)
    }
}

fn with_query(path: &str, query: Option<&str>) -> String {
    match query.map(|q| q.trim_start_matches('?')) {
        Some(q) if !q.is_empty() => format!("{}?{}", path, q),
        _ => path.to_string(),
    }
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, PaperlessError> {
    HeaderValue::from_str(value).map_err(|_| PaperlessError::InvalidHeader(name.to_string()))
}

/// Caller headers replace standard ones name by name, keeping every value a
/// caller supplied. `Authorization` is never overridden.
fn merge_headers(headers: &mut HeaderMap, extra: HeaderMap) {
    let mut current: Option<HeaderName> = None;
    for (name, value) in extra {
        if let Some(name) = name {
            current = (name != AUTHORIZATION).then_some(name);
            if let Some(ref name) = current {
                headers.remove(name);
            }
        }
        if let Some(ref name) = current {
            headers.append(name.clone(), value);
        }
    }
}

/// Turn a non-2xx response into [`PaperlessError::Api`]. Body reading and
/// parsing are best effort and never replace the original failure.
async fn api_error(path: &str, response: reqwest::Response) -> PaperlessError {
    let status = response.status().as_u16();
    let body = match response.text().await {
        Ok(text) if text.trim().is_empty() => None,
        Ok(text) => Some(serde_json::from_str(&text).unwrap_or(Value::String(text))),
        Err(_) => None,
    };

    warn!(status, path, "Paperless API request failed");

    PaperlessError::Api {
        status,
        path: path.to_string(),
        body,
    }
}

/// The consume endpoint answers with a JSON string; fall back to the raw
/// text for servers that do not quote it.
fn parse_task_id(text: &str) -> String {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::String(id)) => id,
        Ok(other) => other.to_string(),
        Err(_) => text.trim().to_string(),
    }
}

static FILENAME: OnceLock<Regex> = OnceLock::new();

fn filename_pattern() -> &'static Regex {
    FILENAME.get_or_init(|| {
        Regex::new(r#"(?i)(?:^|;)\s*filename\s*=\s*(?:"([^"]+)"|([^;\s]+))"#)
            .expect("filename pattern")
    })
}

/// Extract the `filename` parameter of a `Content-Disposition` value.
pub fn filename_from_content_disposition(value: &str) -> Option<String> {
    let captures = filename_pattern().captures(value)?;
    captures
        .get(1)
        .or_else(|| captures.get(2))
        .map(|m| m.as_str().trim().to_string())
        .filter(|name| !name.is_empty())
}

/// A fully read document download.
#[derive(Debug, Clone)]
pub struct DocumentDownload {
    /// File name from `Content-Disposition`, or `document-<id>`.
    pub filename: String,

    /// MIME type reported by the server.
    pub content_type: Option<String>,

    /// File contents.
    pub bytes: Vec<u8>,
}

impl DocumentDownload {
    /// Read a download response to completion.
    pub async fn read(id: ObjectId, response: reqwest::Response) -> Result<Self, PaperlessError> {
        let headers = response.headers();
        let filename = headers
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(filename_from_content_disposition)
            .unwrap_or_else(|| format!("document-{}", id));
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response.bytes().await?.to_vec();

        Ok(Self {
            filename,
            content_type,
            bytes,
        })
    }
}
