//! Server-rendered task manager: SQLite-backed CRUD behind actix-web routes
//! that answer with HTML fragments for htmx.

pub mod app_state;
pub mod components;
pub mod config;
pub mod container;
pub mod db_context;
pub mod error;
pub mod form_route;
pub mod models;
pub mod repository;
pub mod routes;
pub mod task_route;
pub mod validation;
