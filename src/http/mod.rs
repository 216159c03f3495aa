//! HTTP surface: the admission gate and the demo service behind it.

mod gate;
mod handler;
mod server;

pub use gate::{too_many_requests, AdmissionGate, AdmissionLayer};
pub use handler::demo_handler;
pub use server::HttpServer;
