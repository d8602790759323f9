//! Tag tools
//!
//! Tag creation and partial update. Listing, deletion, and bulk edits share
//! the generic taxonomy tools in [`super::objects`].

use super::{id_schema, matching_algorithm_schema, parse_params};
use crate::clients::{ObjectId, ObjectType, PaperlessClient, TagFields};
use crate::server::{McpServerError, McpServerResult, Tool, ToolContext};
use crate::types::{ToolDefinition, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Tag tools that are not shared with other taxonomy families.
pub fn tag_tools(client: Arc<PaperlessClient>) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(CreateTagTool::new(client.clone())),
        Arc::new(UpdateTagTool::new(client)),
    ]
}

fn tag_field_properties() -> Value {
    json!({
        "name": {"type": "string", "minLength": 1, "description": "Tag name"},
        "color": {
            "type": "string",
            "pattern": "^#[0-9a-fA-F]{6}$",
            "description": "Hex color, e.g. #a6cee3"
        },
        "match": {"type": "string", "description": "Text to match for automatic tagging"},
        "matching_algorithm": matching_algorithm_schema(),
        "is_insensitive": {"type": "boolean", "description": "Case-insensitive matching"},
        "is_inbox_tag": {"type": "boolean", "description": "Assign to every newly added document"}
    })
}

/// Tool to create a tag.
pub struct CreateTagTool {
    client: Arc<PaperlessClient>,
}

impl CreateTagTool {
    pub fn new(client: Arc<PaperlessClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for CreateTagTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("create_tag", "Create a tag")
            .with_category(ObjectType::Tags.as_str())
            .with_schema(json!({
                "type": "object",
                "properties": tag_field_properties(),
                "required": ["name"]
            }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "create_tag"))]
    async fn execute(
        &self,
        args: serde_json::Value,
        _context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let fields: TagFields = parse_params(args)?;
        match fields.name.as_deref() {
            Some(name) if !name.trim().is_empty() => {}
            _ => {
                return Err(McpServerError::InvalidParams(
                    "name is required".to_string(),
                ))
            }
        }

        let tag = self.client.create_tag(&fields).await?;
        debug!("Created tag {} ({})", tag.name, tag.id);
        Ok(ToolResult::from_serializable(&tag)?)
    }
}

/// Tool to change some fields of a tag.
pub struct UpdateTagTool {
    client: Arc<PaperlessClient>,
}

impl UpdateTagTool {
    pub fn new(client: Arc<PaperlessClient>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct UpdateTagParams {
    id: ObjectId,
    #[serde(flatten)]
    fields: TagFields,
}

#[async_trait]
impl Tool for UpdateTagTool {
    fn definition(&self) -> ToolDefinition {
        let mut properties = tag_field_properties();
        if let Some(map) = properties.as_object_mut() {
            map.insert("id".to_string(), id_schema("Tag ID"));
        }

        ToolDefinition::new("update_tag", "Update a tag; only the given fields change")
            .with_category(ObjectType::Tags.as_str())
            .with_schema(json!({
                "type": "object",
                "properties": properties,
                "required": ["id"]
            }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "update_tag"))]
    async fn execute(
        &self,
        args: serde_json::Value,
        _context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let params: UpdateTagParams = parse_params(args)?;
        if params.fields == TagFields::default() {
            return Err(McpServerError::InvalidParams(
                "no fields to update".to_string(),
            ));
        }

        let tag = self.client.update_tag(params.id, &params.fields).await?;
        Ok(ToolResult::from_serializable(&tag)?)
    }
}
