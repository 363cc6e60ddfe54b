pub mod ai;
pub mod dashboard;
pub mod documents;
pub mod drugs;
pub mod encounters;
pub mod error;
pub mod extract;
pub mod health;
pub mod observations;
pub mod patients;
pub mod prescriptions;
pub mod test_orders;
pub mod users;

// Tests module
#[cfg(test)]
mod tests;

// Re-export handlers for easier imports
pub use error::{service_error, ErrorResponse};
pub use extract::JsonBody;
pub use health::health_check;
