//! Catalog Domain Model and Provider Contract
//!
//! Types describing the remote asset catalog (assets, collections, metadata
//! views) and the [`CatalogProvider`] trait the sync engine is written
//! against. Wire-format details stay in the provider crate; everything here
//! is already decoded.

use async_trait::async_trait;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// Sentinel view field used by the catalog UI as a visual divider.
pub const SEPARATOR_FIELD: &str = "__separator__";

/// Field name -> ordered values, as returned by the catalog.
pub type MetadataMap = HashMap<String, Vec<MetadataValue>>;

/// Errors surfaced by catalog operations
#[derive(Error, Debug, Clone)]
pub enum CatalogError {
    /// Network failure below HTTP (DNS, connect, TLS)
    #[error("Transport error while requesting {resource}: {message}")]
    Transport { resource: String, message: String },

    /// Operation did not complete within its deadline
    #[error("Request for {resource} timed out after {timeout:?}")]
    Timeout { resource: String, timeout: Duration },

    /// 401/403 from the catalog
    #[error(
        "Permission denied (status {status}) for {resource}; check that the App-ID and Auth-Token are correct"
    )]
    PermissionDenied { resource: String, status: u16 },

    /// 200 response whose payload carries a non-null `errors` field
    #[error("Catalog returned errors for {resource}: {errors}")]
    Payload {
        resource: String,
        errors: serde_json::Value,
    },

    /// Any status outside the triage table
    #[error("Unexpected status {status} for {resource}: {body}")]
    UnexpectedStatus {
        resource: String,
        status: u16,
        body: String,
    },

    /// Retryable status persisted through every attempt
    #[error("Giving up on {resource} after {attempts} attempts (last status {status})")]
    RetriesExhausted {
        resource: String,
        status: u16,
        attempts: u32,
    },

    /// Response body could not be decoded
    #[error("Failed to decode response for {resource}: {message}")]
    Decode { resource: String, message: String },

    /// Request could not be constructed
    #[error("Invalid request for {resource}: {message}")]
    InvalidRequest { resource: String, message: String },
}

impl CatalogError {
    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::PermissionDenied { status, .. }
            | Self::UnexpectedStatus { status, .. }
            | Self::RetriesExhausted { status, .. } => Some(*status),
            Self::Payload { .. } => Some(200),
            _ => None,
        }
    }

    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. })
    }
}

/// Result type for catalog operations
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

/// Loosely typed metadata value as stored by the catalog
///
/// Decoded from arbitrary JSON: numbers become [`MetadataValue::Integer`]
/// (fractions are truncated), `null` becomes empty text, objects are kept as
/// their JSON text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Text(String),
    Bool(bool),
    Integer(i64),
    List(Vec<MetadataValue>),
}

impl MetadataValue {
    /// Render the value as a single spreadsheet cell.
    pub fn to_cell(&self) -> String {
        match self {
            Self::Text(text) => text.trim_matches(' ').to_string(),
            Self::Bool(flag) => flag.to_string(),
            Self::Integer(number) => number.to_string(),
            Self::List(items) => join_cells(items),
        }
    }
}

/// Render a multi-valued field, comma separated.
pub fn join_cells(values: &[MetadataValue]) -> String {
    values
        .iter()
        .map(MetadataValue::to_cell)
        .collect::<Vec<_>>()
        .join(",")
}

impl From<serde_json::Value> for MetadataValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => Self::Text(String::new()),
            Value::Bool(flag) => Self::Bool(flag),
            Value::Number(number) => {
                if let Some(int) = number.as_i64() {
                    Self::Integer(int)
                } else if let Some(uint) = number.as_u64() {
                    Self::Integer(i64::try_from(uint).unwrap_or(i64::MAX))
                } else {
                    Self::Integer(number.as_f64().map(|f| f.trunc() as i64).unwrap_or_default())
                }
            }
            Value::String(text) => Self::Text(text),
            Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Value::Object(_) => Self::Text(value.to_string()),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl<'de> Deserialize<'de> for MetadataValue {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        serde_json::Value::deserialize(deserializer).map(Self::from)
    }
}

/// One file attached to an asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    pub original_name: String,
    pub size: u64,
}

/// A catalog asset
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Asset {
    pub id: String,
    pub title: String,
    pub files: Vec<FileDescriptor>,
    pub metadata: MetadataMap,
}

impl Asset {
    pub fn first_file(&self) -> Option<&FileDescriptor> {
        self.files.first()
    }

    /// Whether any attached file was uploaded under `original_name`
    pub fn has_file_named(&self, original_name: &str) -> bool {
        self.files.iter().any(|f| f.original_name == original_name)
    }
}

/// Type tag of an entry in a collection listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectKind {
    Asset,
    Collection,
    Other(String),
}

impl ObjectKind {
    pub fn from_wire(object_type: &str) -> Self {
        match object_type {
            "assets" | "asset" => Self::Asset,
            "collections" | "collection" => Self::Collection,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Entry in a collection listing or search result
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionObject {
    pub id: String,
    pub title: String,
    pub kind: ObjectKind,
    pub files: Vec<FileDescriptor>,
    pub metadata: MetadataMap,
}

impl CollectionObject {
    pub fn into_asset(self) -> Asset {
        Asset {
            id: self.id,
            title: self.title,
            files: self.files,
            metadata: self.metadata,
        }
    }
}

/// One page of a collection's contents
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionPage {
    pub objects: Vec<CollectionObject>,
    pub page: u32,
    pub pages: u32,
}

impl CollectionPage {
    /// Whether pages follow `requested_page`. The page number echoed by the
    /// server is not trusted for this.
    pub fn has_more_after(&self, requested_page: u32) -> bool {
        self.pages > requested_page
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldOption {
    pub label: String,
    pub value: String,
}

/// One entry of a metadata view schema
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViewField {
    /// Machine key
    pub name: String,
    /// Human readable column header
    pub label: String,
    pub field_type: String,
    pub options: Vec<FieldOption>,
    pub read_only: bool,
    pub required: bool,
}

impl ViewField {
    pub fn is_separator(&self) -> bool {
        self.name == SEPARATOR_FIELD
    }
}

/// Catalog-defined schema for asset metadata
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MetadataView {
    pub name: String,
    pub description: String,
    pub fields: Vec<ViewField>,
}

impl MetadataView {
    /// Fields that carry data, in view order
    pub fn data_fields(&self) -> impl Iterator<Item = &ViewField> {
        self.fields.iter().filter(|f| !f.is_separator())
    }
}

/// Payload for replacing metadata values on an asset
///
/// Serializes to
/// `{"metadata_values": {name: {"field_values": [{"value": v}, ...]}}}`
/// with fields in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MetadataUpdate {
    fields: Vec<(String, Vec<String>)>,
}

impl MetadataUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the values for `name`, replacing any earlier entry.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<String>) {
        let name = name.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = values,
            None => self.fields.push((name, values)),
        }
    }

    pub fn values(&self, name: &str) -> Option<&[String]> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, values)| values.as_slice())
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for MetadataUpdate {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        #[derive(Serialize)]
        struct FieldValue<'a> {
            value: &'a str,
        }

        #[derive(Serialize)]
        struct FieldValues<'a> {
            field_values: Vec<FieldValue<'a>>,
        }

        struct Values<'a>(&'a [(String, Vec<String>)]);

        impl Serialize for Values<'_> {
            fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                let mut map = serializer.serialize_map(Some(self.0.len()))?;
                for (name, values) in self.0 {
                    let entry = FieldValues {
                        field_values: values.iter().map(|v| FieldValue { value: v }).collect(),
                    };
                    map.serialize_entry(name, &entry)?;
                }
                map.end()
            }
        }

        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("metadata_values", &Values(&self.fields))?;
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchTerm {
    pub name: String,
    pub value_in: Vec<String>,
}

impl SearchTerm {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value_in: vec![value.into()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchFilter {
    pub operator: String,
    pub terms: Vec<SearchTerm>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchSort {
    pub name: String,
    pub order: String,
}

/// Body of a catalog search query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchRequest {
    pub doc_types: Vec<String>,
    pub query: String,
    pub filter: SearchFilter,
    pub facets_filters: Vec<SearchTerm>,
    pub sort: Vec<SearchSort>,
    pub include_fields: Vec<String>,
    pub search_after: Vec<serde_json::Value>,
}

impl SearchRequest {
    /// Active assets anywhere below `collection_id`, newest first.
    pub fn collection_assets(collection_id: &str) -> Self {
        Self {
            doc_types: vec!["assets".to_string(), "collections".to_string()],
            query: String::new(),
            filter: SearchFilter {
                operator: "AND".to_string(),
                terms: vec![
                    SearchTerm::new("ancestor_collections", collection_id),
                    SearchTerm::new("status", "ACTIVE"),
                ],
            },
            facets_filters: vec![SearchTerm::new("object_type", "assets")],
            sort: vec![SearchSort {
                name: "date_created".to_string(),
                order: "desc".to_string(),
            }],
            include_fields: [
                "id",
                "title",
                "files",
                "in_collections",
                "metadata",
                "files.size",
                "media_type",
            ]
            .iter()
            .map(|f| f.to_string())
            .collect(),
            search_after: Vec::new(),
        }
    }

    /// Continue after the cursor returned with a previous page.
    pub fn after(mut self, cursor: Vec<serde_json::Value>) -> Self {
        self.search_after = cursor;
        self
    }
}

/// One page of search hits
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResults {
    pub objects: Vec<CollectionObject>,
    pub pages: u32,
    /// Sort key of the last hit; `None` when the page was empty
    pub next_search_after: Option<Vec<serde_json::Value>>,
}

/// Typed access to the remote catalog
///
/// Every operation is a single logical call: implementations apply their
/// own timeout and retry policy and surface a classified [`CatalogError`].
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    async fn get_metadata_view(&self, view_id: &str) -> CatalogResult<MetadataView>;

    async fn get_collection_contents(
        &self,
        collection_id: &str,
        page: u32,
        per_page: u32,
    ) -> CatalogResult<CollectionPage>;

    async fn get_collection(&self, collection_id: &str) -> CatalogResult<Collection>;

    async fn get_asset(&self, asset_id: &str) -> CatalogResult<Asset>;

    /// Update the asset title
    async fn patch_asset(&self, asset_id: &str, title: &str) -> CatalogResult<()>;

    /// Replace metadata values of `asset_id` within `view_id`
    async fn update_metadata_in_asset(
        &self,
        view_id: &str,
        asset_id: &str,
        update: &MetadataUpdate,
    ) -> CatalogResult<()>;

    /// Current metadata values of `asset_id` within `view_id`
    async fn get_asset_metadata(&self, view_id: &str, asset_id: &str)
        -> CatalogResult<MetadataMap>;

    async fn search(&self, request: &SearchRequest, per_page: u32)
        -> CatalogResult<SearchResults>;
}
