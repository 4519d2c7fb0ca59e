pub mod alert_poller;
pub mod alert_service;
pub mod import_service;
pub mod portfolio_service;
pub mod price_service;
