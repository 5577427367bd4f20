pub mod asset_grouping_service;
pub mod completion_tracker;
pub mod history_service;
pub mod market_data_service;
pub mod portfolio_service;
pub mod valuation_service;
