//! HTTP front for the coordinator, used by the campaign UI.

mod http;
mod task_store;

pub use http::{GatewayHttpState, router};
