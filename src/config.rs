use std::path::PathBuf;

/// Server settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Directory served for every non-API path
    pub static_dir: PathBuf,
    /// Where the question pool is persisted
    pub question_store_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 6574,
            static_dir: PathBuf::from("static"),
            question_store_dir: PathBuf::from("data"),
        }
    }
}

impl ServerConfig {
    /// Load from PORT, STATIC_DIR and QUESTION_STORE_DIR
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let var = |key: &str| {
            std::env::var(key)
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };

        let port = match var("PORT").map(|p| p.parse::<u16>()) {
            Some(Ok(port)) => port,
            Some(Err(e)) => {
                tracing::warn!("Ignoring invalid PORT: {}", e);
                defaults.port
            }
            None => defaults.port,
        };

        Self {
            port,
            static_dir: var("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_dir),
            question_store_dir: var("QUESTION_STORE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.question_store_dir),
        }
    }
}
