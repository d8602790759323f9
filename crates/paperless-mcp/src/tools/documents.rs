//! Document tools
//!
//! Listing, retrieval, full-text search, download, upload, and bulk edits
//! of documents.

use super::{
    id_list_schema, id_schema, page_schema, page_size_schema, parse_params, permissions_schema,
};
use crate::clients::{
    BulkEditMethod, BulkEditParameters, DocumentDownload, ObjectId, PaperlessClient,
    UploadMetadata,
};
use crate::server::{McpServerError, McpServerResult, Tool, ToolContext};
use crate::types::{ToolDefinition, ToolResult};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use serde_json::json;
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::{debug, instrument};
use url::form_urlencoded;

const CATEGORY: &str = "documents";

/// All document tools.
pub fn document_tools(client: Arc<PaperlessClient>) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(ListDocumentsTool::new(client.clone())),
        Arc::new(GetDocumentTool::new(client.clone())),
        Arc::new(SearchDocumentsTool::new(client.clone())),
        Arc::new(DownloadDocumentTool::new(client.clone())),
        Arc::new(PostDocumentTool::new(client.clone())),
        Arc::new(BulkEditDocumentsTool::new(client)),
    ]
}

/// Tool to list documents with optional filters.
pub struct ListDocumentsTool {
    client: Arc<PaperlessClient>,
}

impl ListDocumentsTool {
    pub fn new(client: Arc<PaperlessClient>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ListDocumentsParams {
    page: Option<NonZeroU32>,
    page_size: Option<NonZeroU32>,
    ordering: Option<String>,
    #[serde(rename = "tags__id__all")]
    tags_all: Option<Vec<ObjectId>>,
    #[serde(rename = "correspondent__id")]
    correspondent: Option<ObjectId>,
    #[serde(rename = "document_type__id")]
    document_type: Option<ObjectId>,
    #[serde(rename = "title__icontains")]
    title_contains: Option<String>,
}

impl ListDocumentsParams {
    /// Encoded query suffix; empty when no filter was given.
    fn query(&self) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        if let Some(page) = self.page {
            query.append_pair("page", &page.to_string());
        }
        if let Some(page_size) = self.page_size {
            query.append_pair("page_size", &page_size.to_string());
        }
        if let Some(ref ordering) = self.ordering {
            query.append_pair("ordering", ordering);
        }
        if let Some(ref tags) = self.tags_all {
            if !tags.is_empty() {
                let joined: Vec<String> = tags.iter().map(ToString::to_string).collect();
                query.append_pair("tags__id__all", &joined.join(","));
            }
        }
        if let Some(correspondent) = self.correspondent {
            query.append_pair("correspondent__id", &correspondent.to_string());
        }
        if let Some(document_type) = self.document_type {
            query.append_pair("document_type__id", &document_type.to_string());
        }
        if let Some(ref title) = self.title_contains {
            query.append_pair("title__icontains", title);
        }
        query.finish()
    }
}

#[async_trait]
impl Tool for ListDocumentsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("list_documents", "List documents, optionally filtered and ordered")
            .with_category(CATEGORY)
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "page": page_schema(),
                    "page_size": page_size_schema(),
                    "ordering": {
                        "type": "string",
                        "description": "Field to order by, prefix with '-' for descending (e.g. '-created')"
                    },
                    "tags__id__all": id_list_schema("Only documents carrying all of these tag IDs"),
                    "correspondent__id": id_schema("Only documents from this correspondent"),
                    "document_type__id": id_schema("Only documents of this type"),
                    "title__icontains": {
                        "type": "string",
                        "description": "Case-insensitive title substring"
                    }
                },
                "required": []
            }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "list_documents"))]
    async fn execute(
        &self,
        args: serde_json::Value,
        _context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let params: ListDocumentsParams = parse_params(args)?;
        let query = params.query();

        let page = self.client.list_documents(Some(query.as_str())).await?;
        Ok(ToolResult::from_serializable(&page)?)
    }
}

/// Tool to fetch one document.
pub struct GetDocumentTool {
    client: Arc<PaperlessClient>,
}

impl GetDocumentTool {
    pub fn new(client: Arc<PaperlessClient>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct DocumentIdParams {
    id: ObjectId,
}

#[async_trait]
impl Tool for GetDocumentTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("get_document", "Get a document's metadata and content by ID")
            .with_category(CATEGORY)
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "id": id_schema("Document ID")
                },
                "required": ["id"]
            }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "get_document"))]
    async fn execute(
        &self,
        args: serde_json::Value,
        _context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let params: DocumentIdParams = parse_params(args)?;
        let document = self.client.get_document(params.id).await?;
        Ok(ToolResult::from_serializable(&document)?)
    }
}

/// Tool for full-text search.
///
/// Hits are returned without their OCR content and URL fields; use
/// `get_document` for the full record.
pub struct SearchDocumentsTool {
    client: Arc<PaperlessClient>,
}

impl SearchDocumentsTool {
    pub fn new(client: Arc<PaperlessClient>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct SearchDocumentsParams {
    query: String,
    page: Option<NonZeroU32>,
    page_size: Option<NonZeroU32>,
}

#[async_trait]
impl Tool for SearchDocumentsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "search_documents",
            "Full-text search across documents; results omit content and URLs",
        )
        .with_category(CATEGORY)
        .with_schema(json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "minLength": 1,
                    "description": "Search query"
                },
                "page": page_schema(),
                "page_size": page_size_schema()
            },
            "required": ["query"]
        }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "search_documents"))]
    async fn execute(
        &self,
        args: serde_json::Value,
        _context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let params: SearchDocumentsParams = parse_params(args)?;
        if params.query.trim().is_empty() {
            return Err(McpServerError::InvalidParams(
                "query must not be empty".to_string(),
            ));
        }

        let results = self
            .client
            .search_documents(
                &params.query,
                params.page.map(NonZeroU32::get),
                params.page_size.map(NonZeroU32::get),
            )
            .await?;
        Ok(ToolResult::from_serializable(&results)?)
    }
}

/// Tool to download a document's file.
///
/// The file travels back base64-encoded, since the reply envelope only
/// carries text.
pub struct DownloadDocumentTool {
    client: Arc<PaperlessClient>,
}

impl DownloadDocumentTool {
    pub fn new(client: Arc<PaperlessClient>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct DownloadDocumentParams {
    id: ObjectId,
    #[serde(default)]
    original: bool,
}

#[async_trait]
impl Tool for DownloadDocumentTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "download_document",
            "Download a document file (archived version unless original is set)",
        )
        .with_category(CATEGORY)
        .with_schema(json!({
            "type": "object",
            "properties": {
                "id": id_schema("Document ID"),
                "original": {
                    "type": "boolean",
                    "description": "Download the original file instead of the archived PDF",
                    "default": false
                }
            },
            "required": ["id"]
        }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "download_document"))]
    async fn execute(
        &self,
        args: serde_json::Value,
        _context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let params: DownloadDocumentParams = parse_params(args)?;

        let response = self
            .client
            .download_document(params.id, params.original)
            .await?;
        let download = DocumentDownload::read(params.id, response).await?;

        debug!(
            "Downloaded {} ({} bytes)",
            download.filename,
            download.bytes.len()
        );

        Ok(ToolResult::json(json!({
            "id": params.id,
            "filename": download.filename,
            "content_type": download.content_type,
            "size": download.bytes.len(),
            "content_base64": STANDARD.encode(&download.bytes),
        })))
    }
}

/// Tool to upload a new document for consumption.
pub struct PostDocumentTool {
    client: Arc<PaperlessClient>,
}

impl PostDocumentTool {
    pub fn new(client: Arc<PaperlessClient>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct PostDocumentParams {
    file: String,
    filename: String,
    #[serde(flatten)]
    metadata: UploadMetadata,
}

/// Decode a base64 payload, accepting a `data:...;base64,` prefix.
fn decode_file(encoded: &str) -> McpServerResult<Vec<u8>> {
    let payload = match encoded.find("base64,") {
        Some(index) => &encoded[index + "base64,".len()..],
        None => encoded,
    };
    let payload: String = payload.chars().filter(|c| !c.is_whitespace()).collect();

    STANDARD
        .decode(payload)
        .map_err(|e| McpServerError::InvalidParams(format!("file is not valid base64: {}", e)))
}

/// Accept `YYYY-MM-DD` or an RFC 3339 timestamp.
fn validate_created(created: &str) -> McpServerResult<()> {
    let valid = NaiveDate::parse_from_str(created, "%Y-%m-%d").is_ok()
        || DateTime::parse_from_rfc3339(created).is_ok();
    if valid {
        Ok(())
    } else {
        Err(McpServerError::InvalidParams(format!(
            "created must be YYYY-MM-DD or an RFC 3339 timestamp, got '{}'",
            created
        )))
    }
}

#[async_trait]
impl Tool for PostDocumentTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "post_document",
            "Upload a document; it is consumed asynchronously and a task ID is returned",
        )
        .with_category(CATEGORY)
        .with_schema(json!({
            "type": "object",
            "properties": {
                "file": {
                    "type": "string",
                    "description": "File contents, base64-encoded"
                },
                "filename": {
                    "type": "string",
                    "minLength": 1,
                    "description": "File name including extension"
                },
                "title": {"type": "string", "description": "Document title"},
                "created": {
                    "type": "string",
                    "description": "Creation date, YYYY-MM-DD or RFC 3339"
                },
                "correspondent": id_schema("Correspondent ID"),
                "document_type": id_schema("Document type ID"),
                "storage_path": id_schema("Storage path ID"),
                "tags": id_list_schema("Tag IDs"),
                "archive_serial_number": {
                    "type": "integer",
                    "description": "Archive serial number"
                },
                "custom_fields": id_list_schema("Custom field IDs")
            },
            "required": ["file", "filename"]
        }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "post_document"))]
    async fn execute(
        &self,
        args: serde_json::Value,
        _context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let params: PostDocumentParams = parse_params(args)?;

        if params.filename.trim().is_empty() {
            return Err(McpServerError::InvalidParams(
                "filename must not be empty".to_string(),
            ));
        }
        if let Some(ref created) = params.metadata.created {
            validate_created(created)?;
        }
        let file = decode_file(&params.file)?;

        let task_id = self
            .client
            .post_document(file, &params.filename, &params.metadata)
            .await?;
        Ok(ToolResult::json(json!({ "task_id": task_id })))
    }
}

/// Tool to apply one bulk edit method to many documents.
///
/// Every supplied method parameter is forwarded; the server decides which
/// combinations are valid for the chosen method.
pub struct BulkEditDocumentsTool {
    client: Arc<PaperlessClient>,
}

impl BulkEditDocumentsTool {
    pub fn new(client: Arc<PaperlessClient>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct BulkEditDocumentsParams {
    documents: Vec<ObjectId>,
    method: BulkEditMethod,
    #[serde(flatten)]
    parameters: BulkEditParameters,
}

#[async_trait]
impl Tool for BulkEditDocumentsTool {
    fn definition(&self) -> ToolDefinition {
        let methods: Vec<&str> = BulkEditMethod::ALL.iter().map(|m| m.as_str()).collect();
        let nullable_id = |description: &str| {
            json!({
                "type": ["integer", "null"],
                "description": description
            })
        };

        ToolDefinition::new(
            "bulk_edit_documents",
            "Apply one bulk operation (tagging, metadata, permissions, merge, split, rotate, delete...) to several documents",
        )
        .with_category(CATEGORY)
        .with_schema(json!({
            "type": "object",
            "properties": {
                "documents": id_list_schema("Document IDs to edit"),
                "method": {
                    "type": "string",
                    "enum": methods,
                    "description": "Bulk edit method"
                },
                "correspondent": nullable_id("Correspondent ID for set_correspondent (null clears)"),
                "document_type": nullable_id("Document type ID for set_document_type (null clears)"),
                "storage_path": nullable_id("Storage path ID for set_storage_path (null clears)"),
                "tag": id_schema("Tag ID for add_tag / remove_tag"),
                "add_tags": id_list_schema("Tag IDs to add for modify_tags"),
                "remove_tags": id_list_schema("Tag IDs to remove for modify_tags"),
                "permissions": {
                    "type": "object",
                    "description": "Permission change for set_permissions",
                    "properties": {
                        "owner": id_schema("New owner user ID"),
                        "set_permissions": permissions_schema(),
                        "merge": {"type": "boolean"}
                    }
                },
                "metadata_document_id": id_schema("Document whose metadata survives a merge"),
                "delete_originals": {
                    "type": "boolean",
                    "description": "Delete the source documents after merge / split"
                },
                "pages": {
                    "type": "string",
                    "description": "Page specification for split / delete_pages, e.g. \"1,3-5\""
                },
                "degrees": {
                    "type": "integer",
                    "description": "Rotation in degrees for rotate (90, 180, 270)"
                }
            },
            "required": ["documents", "method"]
        }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "bulk_edit_documents"))]
    async fn execute(
        &self,
        args: serde_json::Value,
        _context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let params: BulkEditDocumentsParams = parse_params(args)?;
        if params.documents.is_empty() {
            return Err(McpServerError::InvalidParams(
                "documents must contain at least one ID".to_string(),
            ));
        }

        debug!(
            "Bulk edit {} on {} documents",
            params.method,
            params.documents.len()
        );

        let result = self
            .client
            .bulk_edit_documents(
                &params.documents,
                params.method,
                params.parameters.into_map()?,
            )
            .await?;
        Ok(ToolResult::json(result))
    }
}
