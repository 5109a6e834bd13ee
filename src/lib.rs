pub mod api;
pub mod config;
pub mod demo_feed;
pub mod export;
pub mod format;
pub mod http_client;
pub mod provider;
pub mod rows;
pub mod state;
pub mod table_sort;
