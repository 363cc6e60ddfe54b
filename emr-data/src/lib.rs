// EMR Data
// This crate owns the SQLite schema and the repositories built on top of it

// Database connection management
pub mod database;

// Repository implementations for data access
pub mod repository;

// Storage records
pub mod models;
