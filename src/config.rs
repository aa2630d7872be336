use dotenvy::dotenv;
use once_cell::sync::Lazy;
use std::env;
use std::str::FromStr;

pub static CONFIG: Lazy<Config> = Lazy::new(|| {
    dotenv().ok(); // Load .env file if present
    Config {
        port: get_env_parsed("PORT", 3000),
        data_path: get_env_or_default("DATA_PATH", "data.json"),
        static_dir: get_env_or_default("STATIC_DIR", "static"),
        max_page_size: get_env_parsed("MAX_PAGE_SIZE", 10_000),
        search_url: get_env_or_default("SEARCH_URL", "http://localhost:3000"),
    }
});

pub struct Config {
    pub port: u16,
    /// JSON array of works to index on startup.
    pub data_path: String,
    pub static_dir: String,
    pub max_page_size: usize,
    /// Base URL the `search` command talks to.
    pub search_url: String,
}

fn get_env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn get_env_parsed<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("Invalid value for environment variable {key}: {raw}")),
        Err(_) => default,
    }
}
