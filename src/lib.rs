pub mod analyzer;
pub mod api;
pub mod client;
pub mod config;
pub mod corpus;
pub mod data_models;
pub mod query_engine;
pub mod store;
