// EMR API lib.rs
//
// HTTP layer of the clinic EMR backend: routes, handlers and API docs.

// Public modules
pub mod api;
pub mod openapi;
