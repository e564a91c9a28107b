pub mod default_route;
pub mod export_route;
pub mod search_route;
