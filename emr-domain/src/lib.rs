// EMR Domain
// This crate contains the business logic for the clinic EMR application

// Services that implement business logic
pub mod services;

// Authentication
pub mod auth;

// Domain entities
pub mod entities;

// Service error type shared by every service
pub mod errors;

// Runtime configuration read from the environment
pub mod config;

// Health checks and system status
pub mod health;

// Re-export the database module from emr-data for convenience
pub use emr_data::database;

// Testing utilities - only available with mock feature
#[cfg(any(test, feature = "mock"))]
pub mod testing;
