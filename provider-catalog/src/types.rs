//! Catalog API response types
//!
//! Wire structures for the catalog's JSON responses and their conversion
//! into the domain model in `bridge_traits::catalog`. Every field the tool
//! does not strictly need is defaulted so schema drift on the server side
//! does not break decoding.

use bridge_traits::catalog::{
    Asset, Collection, CollectionObject, CollectionPage, FieldOption, FileDescriptor, MetadataMap,
    MetadataValue, MetadataView, ObjectKind, SearchResults, ViewField,
};
use serde::Deserialize;
use std::collections::HashMap;

/// `GET /API/metadata/v1/views/{id}/`
#[derive(Debug, Clone, Deserialize)]
pub struct ViewResponse {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub view_fields: Vec<ViewFieldDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ViewFieldDto {
    pub name: String,

    #[serde(default)]
    pub label: Option<String>,

    #[serde(default)]
    pub field_type: Option<String>,

    #[serde(default)]
    pub options: Option<Vec<OptionDto>>,

    #[serde(default)]
    pub read_only: Option<bool>,

    #[serde(default)]
    pub required: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OptionDto {
    #[serde(default)]
    pub label: String,

    #[serde(default)]
    pub value: String,
}

/// Entry of a collection contents listing or a search hit
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectDto {
    pub id: String,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub object_type: Option<String>,

    #[serde(default)]
    pub files: Option<Vec<FileDto>>,

    /// Field name -> value list (occasionally a bare value)
    #[serde(default)]
    pub metadata: Option<HashMap<String, MetadataValue>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileDto {
    #[serde(default)]
    pub original_name: Option<String>,

    #[serde(default)]
    pub size: Option<u64>,
}

/// `GET /API/assets/v1/collections/{id}/contents/`
#[derive(Debug, Clone, Deserialize)]
pub struct ContentsResponse {
    #[serde(default)]
    pub objects: Vec<ObjectDto>,

    #[serde(default)]
    pub page: Option<u32>,

    #[serde(default)]
    pub pages: u32,
}

/// `GET /API/assets/v1/collections/{id}/`
#[derive(Debug, Clone, Deserialize)]
pub struct CollectionResponse {
    pub id: String,

    #[serde(default)]
    pub title: Option<String>,
}

/// `GET /API/assets/v1/assets/{id}/`
#[derive(Debug, Clone, Deserialize)]
pub struct AssetResponse {
    pub id: String,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub files: Option<Vec<FileDto>>,
}

/// `GET /API/metadata/v1/assets/{id}/views/{view}/`
#[derive(Debug, Clone, Deserialize)]
pub struct AssetMetadataResponse {
    #[serde(default)]
    pub metadata_values: HashMap<String, FieldValuesDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldValuesDto {
    #[serde(default)]
    pub field_values: Vec<FieldValueDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldValueDto {
    pub value: MetadataValue,
}

/// `POST /API/search/v1/search/`
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub objects: Vec<SearchObjectDto>,

    #[serde(default)]
    pub pages: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchObjectDto {
    /// Sort key, echoed back as the next `search_after` cursor
    #[serde(rename = "_sort", default)]
    pub sort: Vec<serde_json::Value>,

    #[serde(flatten)]
    pub object: ObjectDto,
}

fn convert_files(files: Option<Vec<FileDto>>) -> Vec<FileDescriptor> {
    files
        .unwrap_or_default()
        .into_iter()
        .map(|f| FileDescriptor {
            original_name: f.original_name.unwrap_or_default(),
            size: f.size.unwrap_or_default(),
        })
        .collect()
}

fn convert_metadata(metadata: Option<HashMap<String, MetadataValue>>) -> MetadataMap {
    metadata
        .unwrap_or_default()
        .into_iter()
        .map(|(name, value)| {
            let values = match value {
                MetadataValue::List(items) => items,
                single => vec![single],
            };
            (name, values)
        })
        .collect()
}

impl From<ObjectDto> for CollectionObject {
    fn from(dto: ObjectDto) -> Self {
        Self {
            kind: ObjectKind::from_wire(dto.object_type.as_deref().unwrap_or_default()),
            id: dto.id,
            title: dto.title.unwrap_or_default(),
            files: convert_files(dto.files),
            metadata: convert_metadata(dto.metadata),
        }
    }
}

impl From<OptionDto> for FieldOption {
    fn from(dto: OptionDto) -> Self {
        Self {
            label: dto.label,
            value: dto.value,
        }
    }
}

impl From<ViewFieldDto> for ViewField {
    fn from(dto: ViewFieldDto) -> Self {
        Self {
            name: dto.name,
            label: dto.label.unwrap_or_default(),
            field_type: dto.field_type.unwrap_or_default(),
            options: dto
                .options
                .unwrap_or_default()
                .into_iter()
                .map(FieldOption::from)
                .collect(),
            read_only: dto.read_only.unwrap_or_default(),
            required: dto.required.unwrap_or_default(),
        }
    }
}

impl From<ViewResponse> for MetadataView {
    fn from(dto: ViewResponse) -> Self {
        Self {
            name: dto.name,
            description: dto.description.unwrap_or_default(),
            fields: dto.view_fields.into_iter().map(ViewField::from).collect(),
        }
    }
}

impl ContentsResponse {
    /// `requested_page` fills in when the server omits the page number.
    pub fn into_page(self, requested_page: u32) -> CollectionPage {
        CollectionPage {
            objects: self.objects.into_iter().map(CollectionObject::from).collect(),
            page: self.page.unwrap_or(requested_page),
            pages: self.pages,
        }
    }
}

impl From<CollectionResponse> for Collection {
    fn from(dto: CollectionResponse) -> Self {
        Self {
            id: dto.id,
            title: dto.title.unwrap_or_default(),
        }
    }
}

impl From<AssetResponse> for Asset {
    fn from(dto: AssetResponse) -> Self {
        Self {
            id: dto.id,
            title: dto.title.unwrap_or_default(),
            files: convert_files(dto.files),
            metadata: MetadataMap::new(),
        }
    }
}

impl From<AssetMetadataResponse> for MetadataMap {
    fn from(dto: AssetMetadataResponse) -> Self {
        dto.metadata_values
            .into_iter()
            .map(|(name, values)| {
                let values = values.field_values.into_iter().map(|v| v.value).collect();
                (name, values)
            })
            .collect()
    }
}

impl From<SearchResponse> for SearchResults {
    fn from(dto: SearchResponse) -> Self {
        let next_search_after = dto.objects.last().map(|hit| hit.sort.clone());

        Self {
            objects: dto
                .objects
                .into_iter()
                .map(|hit| CollectionObject::from(hit.object))
                .collect(),
            pages: dto.pages,
            next_search_after,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_view() {
        let json = r#"{
            "name": "Delivery",
            "description": null,
            "view_fields": [
                {"name": "signed_off", "label": "Signed off", "field_type": "boolean", "read_only": false, "required": true},
                {"name": "__separator__", "label": null},
                {"name": "categories", "label": "Content Categories", "field_type": "drop_down",
                 "options": [{"label": "Promotional", "value": "Promotional"}]}
            ]
        }"#;

        let view: MetadataView = serde_json::from_str::<ViewResponse>(json).unwrap().into();

        assert_eq!(view.name, "Delivery");
        assert_eq!(view.fields.len(), 3);
        assert!(view.fields[0].required);
        assert!(view.fields[1].is_separator());
        assert_eq!(view.fields[2].options[0].value, "Promotional");
        assert_eq!(view.data_fields().count(), 2);
    }

    #[test]
    fn test_deserialize_contents_page() {
        let json = r#"{
            "objects": [
                {"id": "a1", "title": "Clip", "object_type": "assets",
                 "files": [{"original_name": "clip.mov", "size": 1024, "directory_path": "x"}],
                 "metadata": {"categories": ["Promotional", " Internal "], "delay": [7.0], "flag": true}},
                {"id": "c2", "title": "Sub", "object_type": "collections"}
            ],
            "page": 1,
            "pages": 3,
            "per_page": 500
        }"#;

        let page = serde_json::from_str::<ContentsResponse>(json)
            .unwrap()
            .into_page(1);

        assert_eq!(page.pages, 3);
        assert!(page.has_more_after(1));
        assert_eq!(page.objects[0].kind, ObjectKind::Asset);
        assert_eq!(page.objects[1].kind, ObjectKind::Collection);
        assert_eq!(page.objects[0].files[0].size, 1024);
        assert_eq!(
            page.objects[0].metadata["delay"],
            vec![MetadataValue::Integer(7)]
        );
        assert_eq!(page.objects[0].metadata["flag"], vec![MetadataValue::Bool(true)]);
        assert!(page.objects[1].files.is_empty());
    }

    #[test]
    fn test_missing_page_number_uses_requested() {
        let page = serde_json::from_str::<ContentsResponse>(r#"{"objects": [], "pages": 0}"#)
            .unwrap()
            .into_page(4);

        assert_eq!(page.page, 4);
        assert!(!page.has_more_after(4));
    }

    #[test]
    fn test_deserialize_asset_metadata() {
        let json = r#"{
            "object_id": "a1",
            "metadata_values": {
                "frame_rate": {"field_values": [{"value": "25"}]},
                "categories": {"field_values": [{"value": "Promotional"}, {"value": "Internal"}]}
            }
        }"#;

        let metadata: MetadataMap = serde_json::from_str::<AssetMetadataResponse>(json)
            .unwrap()
            .into();

        assert_eq!(metadata["frame_rate"], vec![MetadataValue::from("25")]);
        assert_eq!(metadata["categories"].len(), 2);
    }

    #[test]
    fn test_deserialize_search_results_cursor() {
        let json = r#"{
            "objects": [
                {"_sort": [1700000002, "a"], "id": "a1", "object_type": "assets", "title": "One"},
                {"_sort": [1700000001, "b"], "id": "a2", "object_type": "assets", "title": "Two"}
            ],
            "pages": 2
        }"#;

        let results: SearchResults = serde_json::from_str::<SearchResponse>(json).unwrap().into();

        assert_eq!(results.objects.len(), 2);
        assert_eq!(
            results.next_search_after,
            Some(vec![serde_json::json!(1700000001), serde_json::json!("b")])
        );
    }

    #[test]
    fn test_empty_search_has_no_cursor() {
        let results: SearchResults = serde_json::from_str::<SearchResponse>(r#"{"objects": []}"#)
            .unwrap()
            .into();

        assert!(results.next_search_after.is_none());
    }
}
