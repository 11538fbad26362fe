use std::env;

pub const DEFAULT_DATABASE_PATH: &str = "data/tasks.db";
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";
pub const DEFAULT_FRONTEND_ORIGIN: &str = "http://localhost:8080";

#[derive(Clone, Debug)]
pub struct Config {
    pub database_path: String,
    pub bind_address: String,
    pub frontend_origin: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        Self {
            database_path: env::var("DATABASE_PATH").unwrap_or_else(|_| DEFAULT_DATABASE_PATH.to_string()),
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| DEFAULT_BIND_ADDRESS.to_string()),
            frontend_origin: env::var("FRONTEND_ORIGIN")
                .unwrap_or_else(|_| DEFAULT_FRONTEND_ORIGIN.to_string()),
        }
    }
}
