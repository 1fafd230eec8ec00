//! Catalog browsing: filtering, pagination, sorting, categories.
//!
//! The engine keeps one mutable filter configuration; every change resets
//! to the first page and re-fetches. A fetch replaces the product list and
//! pagination metadata together, only after the gateway call succeeds, so
//! no partial update is ever observable.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::warn;

use coralcart_core::SortKey;

use crate::gateway::{ApiError, Gateway, Product, ProductFilters};

/// Sentinel category meaning "no category filter".
pub const ALL_CATEGORIES: &str = "all";

/// Categories offered when the catalog cannot be reached.
const FALLBACK_CATEGORIES: [&str; 3] = ["electronics", "fashion", "books"];

/// Pagination metadata for the current product page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageInfo {
    pub total: u64,
    pub page: u32,
    pub pages: u32,
}

/// The catalog/filter engine.
pub struct CatalogService<G> {
    gateway: Arc<G>,
    filters: ProductFilters,
    products: Vec<Product>,
    page_info: PageInfo,
}

impl<G: Gateway> CatalogService<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self {
            gateway,
            filters: ProductFilters::default(),
            products: Vec::new(),
            page_info: PageInfo::default(),
        }
    }

    /// Re-fetch with the current filters, replacing the product list and
    /// pagination metadata atomically.
    ///
    /// # Errors
    ///
    /// Returns the gateway error; the previously loaded page stays intact.
    pub async fn refresh(&mut self) -> Result<(), ApiError> {
        let page = self.gateway.list_products(&self.filters).await?;
        self.products = page.products;
        self.page_info = PageInfo {
            total: page.total,
            page: page.page,
            pages: page.pages,
        };
        Ok(())
    }

    /// Set or clear the free-text search and reload from page one.
    ///
    /// # Errors
    ///
    /// Returns the gateway error from the reload.
    pub async fn search(&mut self, query: Option<&str>) -> Result<(), ApiError> {
        self.filters.search = query
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(ToString::to_string);
        self.filters.page = 1;
        self.refresh().await
    }

    /// Filter by category (`None` or the `all` sentinel clears it) and
    /// reload from page one.
    ///
    /// # Errors
    ///
    /// Returns the gateway error from the reload.
    pub async fn filter_by_category(&mut self, category: Option<&str>) -> Result<(), ApiError> {
        self.filters.category = category
            .filter(|c| *c != ALL_CATEGORIES)
            .map(ToString::to_string);
        self.filters.page = 1;
        self.refresh().await
    }

    /// Set price bounds (currency units) and reload from page one.
    ///
    /// # Errors
    ///
    /// Returns the gateway error from the reload.
    pub async fn set_price_range(
        &mut self,
        min: Option<Decimal>,
        max: Option<Decimal>,
    ) -> Result<(), ApiError> {
        self.filters.min_price = min;
        self.filters.max_price = max;
        self.filters.page = 1;
        self.refresh().await
    }

    /// Filter by availability and reload from page one.
    ///
    /// # Errors
    ///
    /// Returns the gateway error from the reload.
    pub async fn set_availability(&mut self, is_active: Option<bool>) -> Result<(), ApiError> {
        self.filters.is_active = is_active;
        self.filters.page = 1;
        self.refresh().await
    }

    /// Jump to a page and reload.
    ///
    /// # Errors
    ///
    /// Returns the gateway error from the reload.
    pub async fn goto_page(&mut self, page: u32) -> Result<(), ApiError> {
        self.filters.page = page.max(1);
        self.refresh().await
    }

    /// Sort the loaded page in place.
    ///
    /// The gateway does not support server-side sorting, so the client
    /// compensates by sorting the fetched page; rows on other pages are
    /// not reordered.
    pub fn sort(&mut self, key: SortKey) {
        match key {
            SortKey::PriceAsc => self.products.sort_by(|a, b| a.price.cmp(&b.price)),
            SortKey::PriceDesc => self.products.sort_by(|a, b| b.price.cmp(&a.price)),
            SortKey::NameAsc => self
                .products
                .sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase())),
            SortKey::NameDesc => self
                .products
                .sort_by(|a, b| b.title.to_lowercase().cmp(&a.title.to_lowercase())),
            // Undated products sort last.
            SortKey::Newest => self
                .products
                .sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        }
    }

    /// Fetch one product's detail record.
    ///
    /// # Errors
    ///
    /// Returns the gateway error (including not-found).
    pub async fn product_detail(
        &self,
        id: &coralcart_core::ProductId,
    ) -> Result<Product, ApiError> {
        self.gateway.get_product(id).await
    }

    /// All known categories: the `all` sentinel first, then every distinct
    /// category across the catalog in first-seen order.
    ///
    /// The gateway has no categories endpoint, so they are derived from
    /// the product listing; if even that fails, a static fallback list is
    /// returned so the filter UI stays usable.
    pub async fn categories(&self) -> Vec<String> {
        let mut categories = vec![ALL_CATEGORIES.to_string()];

        match self.gateway.list_products(&ProductFilters::default()).await {
            Ok(page) => {
                for product in &page.products {
                    for category in &product.categories {
                        if !category.is_empty() && !categories.contains(category) {
                            categories.push(category.clone());
                        }
                    }
                }
            }
            Err(error) => {
                warn!(%error, "failed to derive categories, using fallback list");
                categories.extend(FALLBACK_CATEGORIES.iter().map(ToString::to_string));
            }
        }

        categories
    }

    // -- Accessors ----------------------------------------------------------

    /// The currently loaded page of products.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    #[must_use]
    pub fn page_info(&self) -> PageInfo {
        self.page_info
    }

    #[must_use]
    pub fn filters(&self) -> &ProductFilters {
        &self.filters
    }
}
