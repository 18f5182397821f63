//! HTTP surface for the presentation layer: snapshots out, intents in.

mod routes;

pub use routes::{create_router, create_router_with_name, SessionState};
