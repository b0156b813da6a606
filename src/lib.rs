//! Case-management backend for a personal-injury practice: clients, cases,
//! incidents, medical treatment, insurance coverage, and document storage
//! behind a JSON REST API.

pub mod api;
pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod pagination;
pub mod storage;
