//! In-memory `CatalogProvider` for tests
//!
//! Serves scripted views, collection pages, assets and search pages, and
//! records every write so tests can assert on the calls that were made.

use async_trait::async_trait;
use bridge_traits::catalog::{
    Asset, CatalogError, CatalogProvider, CatalogResult, Collection, CollectionObject,
    CollectionPage, FileDescriptor, MetadataMap, MetadataUpdate, MetadataView, ObjectKind,
    SearchRequest, SearchResults,
};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
struct CallLog {
    page_requests: Vec<(String, u32)>,
    asset_lookups: Vec<String>,
    search_cursors: Vec<Vec<serde_json::Value>>,
    patches: Vec<(String, String)>,
    metadata_updates: Vec<(String, String, MetadataUpdate)>,
}

#[derive(Default)]
pub struct FakeCatalog {
    views: HashMap<String, MetadataView>,
    collections: HashMap<String, Collection>,
    pages: HashMap<(String, u32), CollectionPage>,
    page_errors: HashMap<String, CatalogError>,
    assets: HashMap<String, Asset>,
    asset_metadata: HashMap<String, MetadataMap>,
    search_pages: Vec<SearchResults>,
    patch_errors: HashMap<String, CatalogError>,
    update_errors: HashMap<String, CatalogError>,
    calls: Mutex<CallLog>,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_view(mut self, view_id: &str, view: MetadataView) -> Self {
        self.views.insert(view_id.to_string(), view);
        self
    }

    pub fn with_collection(mut self, id: &str, title: &str) -> Self {
        self.collections.insert(
            id.to_string(),
            Collection {
                id: id.to_string(),
                title: title.to_string(),
            },
        );
        self
    }

    /// Serve `page` for `collection_id` at `page.page`.
    pub fn with_page(self, collection_id: &str, page: CollectionPage) -> Self {
        let number = page.page;
        self.with_page_at(collection_id, number, page)
    }

    /// Serve `page` when page `number` is requested, whatever page number
    /// it carries.
    pub fn with_page_at(mut self, collection_id: &str, number: u32, page: CollectionPage) -> Self {
        self.pages.insert((collection_id.to_string(), number), page);
        self
    }

    /// Fail every contents request for `collection_id`.
    pub fn with_page_error(mut self, collection_id: &str, error: CatalogError) -> Self {
        self.page_errors.insert(collection_id.to_string(), error);
        self
    }

    /// Make `asset` resolvable through `get_asset`.
    pub fn with_asset(mut self, asset: Asset) -> Self {
        self.assets.insert(asset.id.clone(), asset);
        self
    }

    pub fn with_asset_metadata(mut self, asset_id: &str, metadata: MetadataMap) -> Self {
        self.asset_metadata.insert(asset_id.to_string(), metadata);
        self
    }

    /// Append a search page; pages are served in order.
    pub fn with_search_page(
        mut self,
        objects: Vec<CollectionObject>,
        next_search_after: Option<Vec<serde_json::Value>>,
    ) -> Self {
        self.search_pages.push(SearchResults {
            objects,
            pages: 1,
            next_search_after,
        });
        self
    }

    pub fn with_patch_error(mut self, asset_id: &str, error: CatalogError) -> Self {
        self.patch_errors.insert(asset_id.to_string(), error);
        self
    }

    pub fn with_update_error(mut self, asset_id: &str, error: CatalogError) -> Self {
        self.update_errors.insert(asset_id.to_string(), error);
        self
    }

    fn log(&self) -> std::sync::MutexGuard<'_, CallLog> {
        self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn page_requests(&self) -> Vec<(String, u32)> {
        self.log().page_requests.clone()
    }

    pub fn asset_lookups(&self) -> Vec<String> {
        self.log().asset_lookups.clone()
    }

    pub fn search_cursors(&self) -> Vec<Vec<serde_json::Value>> {
        self.log().search_cursors.clone()
    }

    /// `(asset id, title)` of every title update
    pub fn patches(&self) -> Vec<(String, String)> {
        self.log().patches.clone()
    }

    /// `(view id, asset id, payload)` of every metadata update
    pub fn metadata_updates(&self) -> Vec<(String, String, MetadataUpdate)> {
        self.log().metadata_updates.clone()
    }
}

fn not_found(resource: String) -> CatalogError {
    CatalogError::UnexpectedStatus {
        resource,
        status: 404,
        body: r#"{"errors":["Not found"]}"#.to_string(),
    }
}

#[async_trait]
impl CatalogProvider for FakeCatalog {
    async fn get_metadata_view(&self, view_id: &str) -> CatalogResult<MetadataView> {
        self.views
            .get(view_id)
            .cloned()
            .ok_or_else(|| not_found(format!("metadata view {}", view_id)))
    }

    async fn get_collection_contents(
        &self,
        collection_id: &str,
        page: u32,
        _per_page: u32,
    ) -> CatalogResult<CollectionPage> {
        self.log()
            .page_requests
            .push((collection_id.to_string(), page));

        if let Some(error) = self.page_errors.get(collection_id) {
            return Err(error.clone());
        }
        Ok(self
            .pages
            .get(&(collection_id.to_string(), page))
            .cloned()
            .unwrap_or(CollectionPage {
                objects: Vec::new(),
                page,
                pages: page,
            }))
    }

    async fn get_collection(&self, collection_id: &str) -> CatalogResult<Collection> {
        self.collections
            .get(collection_id)
            .cloned()
            .ok_or_else(|| not_found(format!("collection {}", collection_id)))
    }

    async fn get_asset(&self, asset_id: &str) -> CatalogResult<Asset> {
        self.log().asset_lookups.push(asset_id.to_string());
        self.assets
            .get(asset_id)
            .cloned()
            .ok_or_else(|| not_found(format!("asset {}", asset_id)))
    }

    async fn patch_asset(&self, asset_id: &str, title: &str) -> CatalogResult<()> {
        self.log()
            .patches
            .push((asset_id.to_string(), title.to_string()));
        match self.patch_errors.get(asset_id) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    async fn update_metadata_in_asset(
        &self,
        view_id: &str,
        asset_id: &str,
        update: &MetadataUpdate,
    ) -> CatalogResult<()> {
        self.log().metadata_updates.push((
            view_id.to_string(),
            asset_id.to_string(),
            update.clone(),
        ));
        match self.update_errors.get(asset_id) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    async fn get_asset_metadata(&self, _view_id: &str, asset_id: &str) -> CatalogResult<MetadataMap> {
        Ok(self
            .asset_metadata
            .get(asset_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn search(&self, request: &SearchRequest, _per_page: u32) -> CatalogResult<SearchResults> {
        let index = {
            let mut log = self.log();
            log.search_cursors.push(request.search_after.clone());
            log.search_cursors.len() - 1
        };
        Ok(self.search_pages.get(index).cloned().unwrap_or(SearchResults {
            objects: Vec::new(),
            pages: 0,
            next_search_after: None,
        }))
    }
}

/// Listing entry for an asset with a single file
pub fn asset_object(id: &str, original_name: &str) -> CollectionObject {
    CollectionObject {
        id: id.to_string(),
        title: format!("Title of {}", id),
        kind: ObjectKind::Asset,
        files: vec![FileDescriptor {
            original_name: original_name.to_string(),
            size: 1024,
        }],
        metadata: MetadataMap::new(),
    }
}

/// Listing entry for a sub-collection
pub fn collection_object(id: &str) -> CollectionObject {
    CollectionObject {
        id: id.to_string(),
        title: format!("Collection {}", id),
        kind: ObjectKind::Collection,
        files: Vec::new(),
        metadata: MetadataMap::new(),
    }
}

pub fn asset(id: &str, title: &str, original_name: &str) -> Asset {
    Asset {
        id: id.to_string(),
        title: title.to_string(),
        files: vec![FileDescriptor {
            original_name: original_name.to_string(),
            size: 1024,
        }],
        metadata: MetadataMap::new(),
    }
}
