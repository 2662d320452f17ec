// Reports module - stock positions, health metrics and sales analytics

pub mod metrics;
pub mod sales;
pub mod stock;
pub mod summary;

pub use metrics::{PortfolioMetrics, StockThresholds, ThresholdLevel};
pub use sales::{
    client_drill_down, group_sales, priced_sales, sales_detail, ClientDrillDown, SaleLine,
    SalesFilter, SalesGroup, SalesGrouping, SalesOverview,
};
pub use stock::{attach_manifest, compute_stock_positions, StockPosition};
pub use summary::{
    product_summary, warehouse_summary, PositionFilter, ProductSummary, WarehouseSummary,
};
