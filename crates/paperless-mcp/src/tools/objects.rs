//! Taxonomy object tools
//!
//! Tags, correspondents, and document types share list, delete, and bulk
//! edit tools parameterized by [`ObjectType`]. Correspondents and document
//! types also share create and update tools, since their writable fields
//! are the same.

use super::{
    id_list_schema, id_schema, matching_algorithm_schema, page_schema, page_size_schema,
    parse_params, permissions_schema,
};
use crate::clients::{
    ClassifierFields, ObjectId, ObjectOperation, ObjectPermissions, ObjectType, PaperlessClient,
};
use crate::server::{McpServerError, McpServerResult, Tool, ToolContext};
use crate::types::{ToolDefinition, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::{debug, instrument};
use url::form_urlencoded;

/// Tools for one taxonomy family.
pub fn object_tools(client: Arc<PaperlessClient>, kind: ObjectType) -> Vec<Arc<dyn Tool>> {
    let mut tools: Vec<Arc<dyn Tool>> = vec![
        Arc::new(ListObjectsTool::new(client.clone(), kind)),
        Arc::new(DeleteObjectTool::new(client.clone(), kind)),
        Arc::new(BulkEditObjectsTool::new(client.clone(), kind)),
    ];

    if let Some(classifier) = ClassifierKind::from_object_type(kind) {
        tools.push(Arc::new(CreateClassifierTool::new(client.clone(), classifier)));
        tools.push(Arc::new(UpdateClassifierTool::new(client, classifier)));
    }

    tools
}

/// Families whose writable fields are [`ClassifierFields`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierKind {
    Correspondents,
    DocumentTypes,
}

impl ClassifierKind {
    /// The classifier family for an object type; tags have their own fields.
    pub fn from_object_type(kind: ObjectType) -> Option<Self> {
        match kind {
            ObjectType::Tags => None,
            ObjectType::Correspondents => Some(Self::Correspondents),
            ObjectType::DocumentTypes => Some(Self::DocumentTypes),
        }
    }

    pub fn object_type(self) -> ObjectType {
        match self {
            Self::Correspondents => ObjectType::Correspondents,
            Self::DocumentTypes => ObjectType::DocumentTypes,
        }
    }
}

fn classifier_field_properties(kind: ObjectType) -> Value {
    json!({
        "name": {
            "type": "string",
            "minLength": 1,
            "description": format!("Name of the {}", kind.singular().replace('_', " "))
        },
        "match": {"type": "string", "description": "Text to match for automatic assignment"},
        "matching_algorithm": matching_algorithm_schema(),
        "is_insensitive": {"type": "boolean", "description": "Case-insensitive matching"}
    })
}

/// Tool to list one taxonomy family.
pub struct ListObjectsTool {
    client: Arc<PaperlessClient>,
    kind: ObjectType,
}

impl ListObjectsTool {
    pub fn new(client: Arc<PaperlessClient>, kind: ObjectType) -> Self {
        Self { client, kind }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ListObjectsParams {
    page: Option<NonZeroU32>,
    page_size: Option<NonZeroU32>,
    #[serde(rename = "name__icontains")]
    name_contains: Option<String>,
}

impl ListObjectsParams {
    fn query(&self) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        if let Some(page) = self.page {
            query.append_pair("page", &page.to_string());
        }
        if let Some(page_size) = self.page_size {
            query.append_pair("page_size", &page_size.to_string());
        }
        if let Some(ref name) = self.name_contains {
            query.append_pair("name__icontains", name);
        }
        query.finish()
    }
}

#[async_trait]
impl Tool for ListObjectsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            format!("list_{}", self.kind.as_str()),
            format!("List {}", self.kind.label()),
        )
        .with_category(self.kind.as_str())
        .with_schema(json!({
            "type": "object",
            "properties": {
                "page": page_schema(),
                "page_size": page_size_schema(),
                "name__icontains": {
                    "type": "string",
                    "description": "Case-insensitive name substring"
                }
            },
            "required": []
        }))
    }

    #[instrument(skip(self, args, _context))]
    async fn execute(
        &self,
        args: serde_json::Value,
        _context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let params: ListObjectsParams = parse_params(args)?;
        let query = params.query();
        let query = Some(query.as_str());

        let page = match self.kind {
            ObjectType::Tags => serde_json::to_value(self.client.list_tags(query).await?)?,
            ObjectType::Correspondents => {
                serde_json::to_value(self.client.list_correspondents(query).await?)?
            }
            ObjectType::DocumentTypes => {
                serde_json::to_value(self.client.list_document_types(query).await?)?
            }
        };
        Ok(ToolResult::json(page))
    }
}

/// Tool to delete one object.
pub struct DeleteObjectTool {
    client: Arc<PaperlessClient>,
    kind: ObjectType,
}

impl DeleteObjectTool {
    pub fn new(client: Arc<PaperlessClient>, kind: ObjectType) -> Self {
        Self { client, kind }
    }
}

#[derive(Debug, Deserialize)]
struct ObjectIdParams {
    id: ObjectId,
}

#[async_trait]
impl Tool for DeleteObjectTool {
    fn definition(&self) -> ToolDefinition {
        let singular = self.kind.singular();
        ToolDefinition::new(
            format!("delete_{}", singular),
            format!("Delete a {}", singular.replace('_', " ")),
        )
        .with_category(self.kind.as_str())
        .with_schema(json!({
            "type": "object",
            "properties": {
                "id": id_schema("ID of the object to delete")
            },
            "required": ["id"]
        }))
    }

    #[instrument(skip(self, args, _context))]
    async fn execute(
        &self,
        args: serde_json::Value,
        _context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let params: ObjectIdParams = parse_params(args)?;

        match self.kind {
            ObjectType::Tags => self.client.delete_tag(params.id).await?,
            ObjectType::Correspondents => self.client.delete_correspondent(params.id).await?,
            ObjectType::DocumentTypes => self.client.delete_document_type(params.id).await?,
        }

        debug!("Deleted {} {}", self.kind.singular(), params.id);
        Ok(ToolResult::json(json!({ "id": params.id, "deleted": true })))
    }
}

/// Tool to change permissions of, or delete, many objects at once.
pub struct BulkEditObjectsTool {
    client: Arc<PaperlessClient>,
    kind: ObjectType,
}

impl BulkEditObjectsTool {
    pub fn new(client: Arc<PaperlessClient>, kind: ObjectType) -> Self {
        Self { client, kind }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum OperationSelector {
    SetPermissions,
    Delete,
}

#[derive(Debug, Deserialize)]
struct BulkEditObjectsParams {
    ids: Vec<ObjectId>,
    operation: OperationSelector,
    owner: Option<ObjectId>,
    permissions: Option<ObjectPermissions>,
    merge: Option<bool>,
}

impl BulkEditObjectsParams {
    /// Owner and permission fields survive only for `set_permissions`.
    fn operation(&self) -> ObjectOperation {
        match self.operation {
            OperationSelector::SetPermissions => ObjectOperation::SetPermissions {
                owner: self.owner,
                permissions: self.permissions.clone(),
                merge: self.merge,
            },
            OperationSelector::Delete => ObjectOperation::Delete,
        }
    }
}

#[async_trait]
impl Tool for BulkEditObjectsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            format!("bulk_edit_{}", self.kind.as_str()),
            format!(
                "Set permissions on, or delete, several {} at once",
                self.kind.label()
            ),
        )
        .with_category(self.kind.as_str())
        .with_schema(json!({
            "type": "object",
            "properties": {
                "ids": id_list_schema("IDs of the objects to edit"),
                "operation": {
                    "type": "string",
                    "enum": ["set_permissions", "delete"],
                    "description": "Operation to apply"
                },
                "owner": id_schema("New owner user ID (set_permissions only)"),
                "permissions": permissions_schema(),
                "merge": {
                    "type": "boolean",
                    "description": "Merge with existing permissions instead of replacing them (set_permissions only)"
                }
            },
            "required": ["ids", "operation"]
        }))
    }

    #[instrument(skip(self, args, _context))]
    async fn execute(
        &self,
        args: serde_json::Value,
        _context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let params: BulkEditObjectsParams = parse_params(args)?;
        if params.ids.is_empty() {
            return Err(McpServerError::InvalidParams(
                "ids must contain at least one ID".to_string(),
            ));
        }

        let operation = params.operation();
        let result = self
            .client
            .bulk_edit_objects(&params.ids, self.kind, &operation)
            .await?;
        Ok(ToolResult::json(result))
    }
}

/// Tool to create a correspondent or document type.
pub struct CreateClassifierTool {
    client: Arc<PaperlessClient>,
    kind: ClassifierKind,
}

impl CreateClassifierTool {
    pub fn new(client: Arc<PaperlessClient>, kind: ClassifierKind) -> Self {
        Self { client, kind }
    }
}

#[async_trait]
impl Tool for CreateClassifierTool {
    fn definition(&self) -> ToolDefinition {
        let kind = self.kind.object_type();
        ToolDefinition::new(
            format!("create_{}", kind.singular()),
            format!("Create a {}", kind.singular().replace('_', " ")),
        )
        .with_category(kind.as_str())
        .with_schema(json!({
            "type": "object",
            "properties": classifier_field_properties(kind),
            "required": ["name"]
        }))
    }

    #[instrument(skip(self, args, _context))]
    async fn execute(
        &self,
        args: serde_json::Value,
        _context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let fields: ClassifierFields = parse_params(args)?;
        match fields.name.as_deref() {
            Some(name) if !name.trim().is_empty() => {}
            _ => {
                return Err(McpServerError::InvalidParams(
                    "name is required".to_string(),
                ))
            }
        }

        let created = match self.kind {
            ClassifierKind::Correspondents => {
                serde_json::to_value(self.client.create_correspondent(&fields).await?)?
            }
            ClassifierKind::DocumentTypes => {
                serde_json::to_value(self.client.create_document_type(&fields).await?)?
            }
        };
        Ok(ToolResult::json(created))
    }
}

/// Tool to change some fields of a correspondent or document type.
pub struct UpdateClassifierTool {
    client: Arc<PaperlessClient>,
    kind: ClassifierKind,
}

impl UpdateClassifierTool {
    pub fn new(client: Arc<PaperlessClient>, kind: ClassifierKind) -> Self {
        Self { client, kind }
    }
}

#[derive(Debug, Deserialize)]
struct UpdateClassifierParams {
    id: ObjectId,
    #[serde(flatten)]
    fields: ClassifierFields,
}

#[async_trait]
impl Tool for UpdateClassifierTool {
    fn definition(&self) -> ToolDefinition {
        let kind = self.kind.object_type();
        let mut properties = classifier_field_properties(kind);
        if let Some(map) = properties.as_object_mut() {
            map.insert("id".to_string(), id_schema("ID of the object to update"));
        }

        ToolDefinition::new(
            format!("update_{}", kind.singular()),
            format!(
                "Update a {}; only the given fields change",
                kind.singular().replace('_', " ")
            ),
        )
        .with_category(kind.as_str())
        .with_schema(json!({
            "type": "object",
            "properties": properties,
            "required": ["id"]
        }))
    }

    #[instrument(skip(self, args, _context))]
    async fn execute(
        &self,
        args: serde_json::Value,
        _context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let params: UpdateClassifierParams = parse_params(args)?;
        if params.fields == ClassifierFields::default() {
            return Err(McpServerError::InvalidParams(
                "no fields to update".to_string(),
            ));
        }

        let updated = match self.kind {
            ClassifierKind::Correspondents => serde_json::to_value(
                self.client
                    .update_correspondent(params.id, &params.fields)
                    .await?,
            )?,
            ClassifierKind::DocumentTypes => serde_json::to_value(
                self.client
                    .update_document_type(params.id, &params.fields)
                    .await?,
            )?,
        };
        Ok(ToolResult::json(updated))
    }
}
