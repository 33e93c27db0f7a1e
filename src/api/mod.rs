// API module
//
// Thin HTTP adapters over the ledger engine's public operations

pub mod handlers;
pub mod routes;

// Re-export main components for easier access
pub use routes::configure_routes;
