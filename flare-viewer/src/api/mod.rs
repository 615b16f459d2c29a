//! HTTP API handlers for flare-viewer

pub mod buildinfo;
pub mod flares;
pub mod health;
pub mod proxy;
pub mod search;
pub mod ui;

pub use buildinfo::get_build_info;
pub use flares::{list_flares, resolve_image};
pub use health::health_routes;
pub use proxy::{proxy_events, proxy_imagery, ProxyResponse};
pub use search::search_stream;
pub use ui::{serve_app_js, serve_index};
