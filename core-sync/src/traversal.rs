//! # Collection Traversal
//!
//! Flattens a collection tree into the list of assets below it.
//!
//! Pages of a collection are fetched in order; every sub-collection found on
//! a page is descended into before the next entry is processed. Visited
//! asset and collection ids are tracked in [`TraversalState`], which keeps a
//! tree that (erroneously) contains itself from looping and keeps assets
//! linked from several collections from being reported twice.
//!
//! Requests are issued one at a time.

use crate::error::Result;
use bridge_traits::catalog::{Asset, CatalogProvider, ObjectKind, SearchRequest};
use futures::future::{BoxFuture, FutureExt};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Dedup sets and diagnostics for one traversal
#[derive(Debug, Default)]
pub struct TraversalState {
    pub visited_assets: HashSet<String>,
    pub visited_collections: HashSet<String>,
    /// Sub-collections that could not be listed: (collection id, reason)
    pub failed_collections: Vec<(String, String)>,
}

impl TraversalState {
    pub fn new() -> Self {
        Self::default()
    }
}

pub struct CollectionTraversal {
    catalog: Arc<dyn CatalogProvider>,
    page_size: u32,
}

impl CollectionTraversal {
    pub fn new(catalog: Arc<dyn CatalogProvider>, page_size: u32) -> Self {
        Self { catalog, page_size }
    }

    /// Every asset below `collection_id`, each reported once.
    pub async fn collect_assets(&self, collection_id: &str) -> Result<Vec<Asset>> {
        let mut state = TraversalState::new();
        state.visited_collections.insert(collection_id.to_string());

        let assets = self.traverse(collection_id, 1, &mut state).await?;

        info!(
            assets = assets.len(),
            collections = state.visited_collections.len(),
            failed_collections = state.failed_collections.len(),
            "Collection traversal finished"
        );
        Ok(assets)
    }

    /// Walk `collection_id` starting at `page`.
    ///
    /// Failing to list any page of `collection_id` itself is an error. A
    /// sub-collection that cannot be listed is recorded in
    /// [`TraversalState::failed_collections`] and its siblings are still
    /// visited.
    pub async fn traverse(
        &self,
        collection_id: &str,
        page: u32,
        state: &mut TraversalState,
    ) -> Result<Vec<Asset>> {
        let mut assets = Vec::new();
        self.walk(collection_id, page, state, &mut assets).await?;
        Ok(assets)
    }

    fn walk<'a>(
        &'a self,
        collection_id: &'a str,
        first_page: u32,
        state: &'a mut TraversalState,
        assets: &'a mut Vec<Asset>,
    ) -> BoxFuture<'a, Result<()>> {
        async move {
            let mut page = first_page;
            loop {
                let contents = self
                    .catalog
                    .get_collection_contents(collection_id, page, self.page_size)
                    .await?;
                debug!(
                    collection_id,
                    page,
                    pages = contents.pages,
                    objects = contents.objects.len(),
                    "Processing collection page"
                );

                let has_more = contents.has_more_after(page);
                for object in contents.objects {
                    match object.kind {
                        ObjectKind::Asset => {
                            if state.visited_assets.insert(object.id.clone()) {
                                assets.push(object.into_asset());
                            }
                        }
                        ObjectKind::Collection => {
                            if !state.visited_collections.insert(object.id.clone()) {
                                continue;
                            }
                            println!("found collection {}, traversing:", object.id);
                            if let Err(e) = self.walk(&object.id, 1, state, assets).await {
                                warn!(collection_id = %object.id, error = %e, "Skipping sub-collection");
                                println!("could not traverse collection {}: {}", object.id, e);
                                state.failed_collections.push((object.id.clone(), e.to_string()));
                            }
                        }
                        ObjectKind::Other(ref kind) => {
                            debug!(id = %object.id, kind = %kind, "Ignoring collection entry");
                        }
                    }
                }

                if !has_more {
                    return Ok(());
                }
                page += 1;
            }
        }
        .boxed()
    }

    /// Every active asset below `collection_id`, found through the search API.
    ///
    /// Pages are chained with the `search_after` cursor of the previous page
    /// until a page comes back empty. A short page is not the end: the
    /// server may cap the page size below the one requested.
    #[instrument(skip(self))]
    pub async fn discover_by_search(&self, collection_id: &str) -> Result<Vec<Asset>> {
        let mut request = SearchRequest::collection_assets(collection_id);
        let mut seen = HashSet::new();
        let mut assets = Vec::new();

        loop {
            let results = self.catalog.search(&request, self.page_size).await?;
            let hits = results.objects.len();

            for object in results.objects {
                if object.kind == ObjectKind::Asset && seen.insert(object.id.clone()) {
                    assets.push(object.into_asset());
                }
            }
            debug!(hits, total = assets.len(), "Search page processed");

            if hits == 0 {
                break;
            }
            let Some(cursor) = results.next_search_after else {
                break;
            };
            if cursor.is_empty() || cursor == request.search_after {
                warn!("Search cursor did not advance, stopping");
                break;
            }
            request = request.after(cursor);
        }

        info!(assets = assets.len(), "Search discovery finished");
        Ok(assets)
    }
}
