/// Search and stock overview for staff
use crate::{
    catalog::{ComponentCatalog, StockAlert},
    error::InventoryResult,
    logs::{SearchLogManager, SearchTermCount},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub most_frequent_searches: Vec<SearchTermCount>,
    pub alerts: Vec<StockAlert>,
    pub missing_searches: Vec<SearchTermCount>,
}

pub struct DashboardService {
    catalog: Arc<ComponentCatalog>,
    search_log: Arc<SearchLogManager>,
    low_stock_threshold: i64,
}

impl DashboardService {
    pub fn new(
        catalog: Arc<ComponentCatalog>,
        search_log: Arc<SearchLogManager>,
        low_stock_threshold: i64,
    ) -> Self {
        Self {
            catalog,
            search_log,
            low_stock_threshold,
        }
    }

    pub async fn summary(&self) -> InventoryResult<DashboardSummary> {
        Ok(DashboardSummary {
            most_frequent_searches: self.search_log.term_counts(true).await?,
            alerts: self.catalog.low_stock(self.low_stock_threshold).await?,
            missing_searches: self.search_log.term_counts(false).await?,
        })
    }
}
