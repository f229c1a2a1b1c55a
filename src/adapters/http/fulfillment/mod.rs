//! HTTP adapter for the fulfillment endpoints.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::FulfillmentAppState;
pub use routes::app_router;
