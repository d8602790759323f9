//! Paperless-ngx resource and request types.
//!
//! Response types mirror the remote JSON and keep any fields they do not
//! name in a flattened `extra` map, so nothing the server sends is lost when
//! a value is handed back to a caller. Request types serialize only the
//! fields that were set.

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::OnceLock;

/// Identifier of any remote entity. Opaque to this crate.
pub type ObjectId = i64;

/// Pattern-matching strategy used for automatic classification.
///
/// Travels as an integer code in the closed range `[0, 6]` for every
/// entity family.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub enum MatchingAlgorithm {
    /// No automatic matching.
    #[default]
    None = 0,
    /// Any of the words.
    Any = 1,
    /// All of the words.
    All = 2,
    /// Exact string.
    Exact = 3,
    /// Regular expression.
    Regex = 4,
    /// Fuzzy match.
    Fuzzy = 5,
    /// Learned automatically.
    Auto = 6,
}

impl MatchingAlgorithm {
    /// Integer code sent over the wire.
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<i64> for MatchingAlgorithm {
    type Error = String;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::None),
            1 => Ok(Self::Any),
            2 => Ok(Self::All),
            3 => Ok(Self::Exact),
            4 => Ok(Self::Regex),
            5 => Ok(Self::Fuzzy),
            6 => Ok(Self::Auto),
            other => Err(format!(
                "matching_algorithm must be between 0 and 6, got {}",
                other
            )),
        }
    }
}

impl From<MatchingAlgorithm> for u8 {
    fn from(algorithm: MatchingAlgorithm) -> Self {
        algorithm.code()
    }
}

static HEX_COLOR: OnceLock<Regex> = OnceLock::new();

fn hex_color_pattern() -> &'static Regex {
    HEX_COLOR.get_or_init(|| Regex::new(r"^#[0-9a-fA-F]{6}$").expect("hex color pattern"))
}

/// A `#RRGGBB` tag color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor(String);

impl HexColor {
    /// Borrow the color string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for HexColor {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if hex_color_pattern().is_match(&value) {
            Ok(Self(value))
        } else {
            Err(format!("color must be a hex color like #a6cee3, got '{}'", value))
        }
    }
}

impl From<HexColor> for String {
    fn from(color: HexColor) -> Self {
        color.0
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// User and group IDs granted one permission level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSet {
    /// User IDs.
    #[serde(default)]
    pub users: Vec<ObjectId>,

    /// Group IDs.
    #[serde(default)]
    pub groups: Vec<ObjectId>,
}

/// View and change permissions attached to an entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectPermissions {
    /// Who may view.
    #[serde(default)]
    pub view: PermissionSet,

    /// Who may change.
    #[serde(default)]
    pub change: PermissionSet,
}

/// One page of a remote collection.
///
/// Keys the server leaves out stay out when the page is serialized again,
/// and `next`/`previous` keep an explicit `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedList<T> {
    /// Total number of items across all pages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,

    /// URL of the next page.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub next: Option<Option<String>>,

    /// URL of the previous page.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub previous: Option<Option<String>>,

    /// Items on this page.
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,

    /// Any other keys the server returned (e.g. `all`).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Custom field value attached to a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomFieldInstance {
    /// Custom field ID.
    pub field: ObjectId,

    /// Field value; its type depends on the field's data type.
    #[serde(default)]
    pub value: Value,
}

/// A document stored in Paperless-ngx.
///
/// Every field besides `id` is optional. A nullable field is `None` when
/// the key was absent and `Some(None)` when the server sent `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Document ID.
    pub id: ObjectId,

    /// Title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// OCR text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Tag IDs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<ObjectId>>,

    /// Correspondent ID.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub correspondent: Option<Option<ObjectId>>,

    /// Document type ID.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub document_type: Option<Option<ObjectId>>,

    /// Storage path ID.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub storage_path: Option<Option<ObjectId>>,

    /// Creation date as reported by the server.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub created: Option<Option<String>>,

    /// When the document was added.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub added: Option<Option<String>>,

    /// When the document was last modified.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub modified: Option<Option<String>>,

    /// Archive serial number.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub archive_serial_number: Option<Option<i64>>,

    /// Custom field values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_fields: Option<Vec<CustomFieldInstance>>,

    /// Notes; shape varies across server versions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<Vec<Value>>,

    /// Owner user ID.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub owner: Option<Option<ObjectId>>,

    /// Permissions, when requested with `full_perms`. Kept verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Value>,

    /// Any other keys the server returned.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    /// Tag ID.
    pub id: ObjectId,

    /// Tag name.
    pub name: String,

    /// Display color.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub color: Option<Option<String>>,

    /// Match pattern.
    #[serde(default, rename = "match", skip_serializing_if = "Option::is_none")]
    pub match_pattern: Option<String>,

    /// Matching algorithm.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matching_algorithm: Option<MatchingAlgorithm>,

    /// Case-insensitive matching.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_insensitive: Option<bool>,

    /// Whether new documents receive this tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_inbox_tag: Option<bool>,

    /// Parent tag for hierarchical tags.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub parent: Option<Option<ObjectId>>,

    /// Number of documents with this tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_count: Option<u64>,

    /// Owner user ID.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub owner: Option<Option<ObjectId>>,

    /// Permissions. Kept verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Value>,

    /// Any other keys the server returned.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A correspondent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correspondent {
    /// Correspondent ID.
    pub id: ObjectId,

    /// Correspondent name.
    pub name: String,

    /// Match pattern.
    #[serde(default, rename = "match", skip_serializing_if = "Option::is_none")]
    pub match_pattern: Option<String>,

    /// Matching algorithm.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matching_algorithm: Option<MatchingAlgorithm>,

    /// Case-insensitive matching.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_insensitive: Option<bool>,

    /// Number of documents from this correspondent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_count: Option<u64>,

    /// Date of the most recent document.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub last_correspondence: Option<Option<String>>,

    /// Owner user ID.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub owner: Option<Option<ObjectId>>,

    /// Permissions. Kept verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Value>,

    /// Any other keys the server returned.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A document type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentType {
    /// Document type ID.
    pub id: ObjectId,

    /// Document type name.
    pub name: String,

    /// Match pattern.
    #[serde(default, rename = "match", skip_serializing_if = "Option::is_none")]
    pub match_pattern: Option<String>,

    /// Matching algorithm.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matching_algorithm: Option<MatchingAlgorithm>,

    /// Case-insensitive matching.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_insensitive: Option<bool>,

    /// Number of documents of this type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_count: Option<u64>,

    /// Owner user ID.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub owner: Option<Option<ObjectId>>,

    /// Permissions. Kept verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Value>,

    /// Any other keys the server returned.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Writable tag fields. Used for both creation and partial updates; unset
/// fields are left out of the request body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagFields {
    /// Tag name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Display color.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<HexColor>,

    /// Match pattern.
    #[serde(rename = "match", skip_serializing_if = "Option::is_none")]
    pub match_pattern: Option<String>,

    /// Matching algorithm.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matching_algorithm: Option<MatchingAlgorithm>,

    /// Case-insensitive matching.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_insensitive: Option<bool>,

    /// Whether new documents receive this tag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_inbox_tag: Option<bool>,
}

impl TagFields {
    /// Fields with only a name set.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

/// Writable correspondent and document type fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassifierFields {
    /// Name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Match pattern.
    #[serde(rename = "match", skip_serializing_if = "Option::is_none")]
    pub match_pattern: Option<String>,

    /// Matching algorithm.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matching_algorithm: Option<MatchingAlgorithm>,

    /// Case-insensitive matching.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_insensitive: Option<bool>,
}

impl ClassifierFields {
    /// Fields with only a name set.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

/// Metadata sent alongside an uploaded file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadMetadata {
    /// Document title.
    #[serde(default)]
    pub title: Option<String>,

    /// Creation date.
    #[serde(default)]
    pub created: Option<String>,

    /// Correspondent ID.
    #[serde(default)]
    pub correspondent: Option<ObjectId>,

    /// Document type ID.
    #[serde(default)]
    pub document_type: Option<ObjectId>,

    /// Storage path ID.
    #[serde(default)]
    pub storage_path: Option<ObjectId>,

    /// Tag IDs.
    #[serde(default)]
    pub tags: Vec<ObjectId>,

    /// Archive serial number.
    #[serde(default)]
    pub archive_serial_number: Option<i64>,

    /// Custom field IDs.
    #[serde(default)]
    pub custom_fields: Vec<ObjectId>,
}

impl UploadMetadata {
    /// Multipart text fields in send order. Unset values are omitted and
    /// list values become one field per element.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = Vec::new();

        if let Some(ref title) = self.title {
            fields.push(("title", title.clone()));
        }
        if let Some(ref created) = self.created {
            fields.push(("created", created.clone()));
        }
        if let Some(correspondent) = self.correspondent {
            fields.push(("correspondent", correspondent.to_string()));
        }
        if let Some(document_type) = self.document_type {
            fields.push(("document_type", document_type.to_string()));
        }
        if let Some(storage_path) = self.storage_path {
            fields.push(("storage_path", storage_path.to_string()));
        }
        for tag in &self.tags {
            fields.push(("tags", tag.to_string()));
        }
        if let Some(asn) = self.archive_serial_number {
            fields.push(("archive_serial_number", asn.to_string()));
        }
        for field in &self.custom_fields {
            fields.push(("custom_fields", field.to_string()));
        }

        fields
    }
}

/// Selector for a document bulk edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkEditMethod {
    SetCorrespondent,
    SetDocumentType,
    SetStoragePath,
    AddTag,
    RemoveTag,
    ModifyTags,
    Delete,
    Reprocess,
    SetPermissions,
    Merge,
    Split,
    Rotate,
    DeletePages,
}

impl BulkEditMethod {
    /// Every selector, in the order the remote API documents them.
    pub const ALL: [BulkEditMethod; 13] = [
        Self::SetCorrespondent,
        Self::SetDocumentType,
        Self::SetStoragePath,
        Self::AddTag,
        Self::RemoveTag,
        Self::ModifyTags,
        Self::Delete,
        Self::Reprocess,
        Self::SetPermissions,
        Self::Merge,
        Self::Split,
        Self::Rotate,
        Self::DeletePages,
    ];

    /// Wire name of the selector.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SetCorrespondent => "set_correspondent",
            Self::SetDocumentType => "set_document_type",
            Self::SetStoragePath => "set_storage_path",
            Self::AddTag => "add_tag",
            Self::RemoveTag => "remove_tag",
            Self::ModifyTags => "modify_tags",
            Self::Delete => "delete",
            Self::Reprocess => "reprocess",
            Self::SetPermissions => "set_permissions",
            Self::Merge => "merge",
            Self::Split => "split",
            Self::Rotate => "rotate",
            Self::DeletePages => "delete_pages",
        }
    }
}

impl fmt::Display for BulkEditMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ownership and permission change carried by a `set_permissions` bulk edit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PermissionsUpdate {
    /// New owner user ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<ObjectId>,

    /// Permissions to apply.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set_permissions: Option<ObjectPermissions>,

    /// Merge with existing permissions instead of replacing them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge: Option<bool>,
}

/// Union of every method-specific bulk edit parameter.
///
/// Which keys matter depends on the [`BulkEditMethod`]; every key that was
/// supplied is forwarded and the server decides what combination is valid.
/// The nullable ID fields distinguish "absent" from an explicit `null`,
/// which clears the value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkEditParameters {
    /// Correspondent ID for `set_correspondent`.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub correspondent: Option<Option<ObjectId>>,

    /// Document type ID for `set_document_type`.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub document_type: Option<Option<ObjectId>>,

    /// Storage path ID for `set_storage_path`.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub storage_path: Option<Option<ObjectId>>,

    /// Tag ID for `add_tag` / `remove_tag`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<ObjectId>,

    /// Tag IDs to add for `modify_tags`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub add_tags: Option<Vec<ObjectId>>,

    /// Tag IDs to remove for `modify_tags`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remove_tags: Option<Vec<ObjectId>>,

    /// Permission change for `set_permissions`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<PermissionsUpdate>,

    /// Document whose metadata survives a `merge`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata_document_id: Option<ObjectId>,

    /// Delete source documents after `merge` / `split`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete_originals: Option<bool>,

    /// Page specification for `split` / `delete_pages`, e.g. "1,3-5".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<String>,

    /// Rotation for `rotate`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degrees: Option<i64>,
}

impl BulkEditParameters {
    /// The supplied parameters as a JSON object.
    pub fn into_map(self) -> Result<Map<String, Value>, serde_json::Error> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            _ => Ok(Map::new()),
        }
    }
}

/// Maps a present field (including `null`) to `Some`, leaving absence to
/// `#[serde(default)]`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Taxonomy object families that support bulk edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectType {
    Tags,
    Correspondents,
    DocumentTypes,
}

impl ObjectType {
    /// Every object family.
    pub const ALL: [ObjectType; 3] = [Self::Tags, Self::Correspondents, Self::DocumentTypes];

    /// Plural wire name, also the API path segment and `object_type` value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tags => "tags",
            Self::Correspondents => "correspondents",
            Self::DocumentTypes => "document_types",
        }
    }

    /// Singular name used in tool names and messages.
    pub fn singular(self) -> &'static str {
        match self {
            Self::Tags => "tag",
            Self::Correspondents => "correspondent",
            Self::DocumentTypes => "document_type",
        }
    }

    /// Human-readable plural.
    pub fn label(self) -> &'static str {
        match self {
            Self::Tags => "tags",
            Self::Correspondents => "correspondents",
            Self::DocumentTypes => "document types",
        }
    }

    /// Collection path relative to the API root.
    pub fn collection_path(self) -> String {
        format!("/{}/", self.as_str())
    }

    /// Item path relative to the API root.
    pub fn item_path(self, id: ObjectId) -> String {
        format!("/{}/{}/", self.as_str(), id)
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operation applied by a taxonomy bulk edit.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectOperation {
    /// Change owner and/or permissions.
    SetPermissions {
        /// New owner user ID.
        owner: Option<ObjectId>,
        /// Permissions to apply.
        permissions: Option<ObjectPermissions>,
        /// Merge with existing permissions instead of replacing them.
        merge: Option<bool>,
    },
    /// Delete the objects.
    Delete,
}

impl ObjectOperation {
    /// Wire name of the operation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SetPermissions { .. } => "set_permissions",
            Self::Delete => "delete",
        }
    }
}
