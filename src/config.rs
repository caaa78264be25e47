use std::collections::HashMap;

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_PORT: u16 = 3040;

/// Process-wide configuration, read from the environment once at startup and
/// passed by reference into the gateway and adapters. Nothing re-reads the
/// environment after this is constructed.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: Option<String>,
    pub ollama_url: String,
    pub host: String,
    pub port: u16,
    /// CORS allow-list; `["*"]` means any origin.
    pub cors_origins: Vec<String>,
    pub environment: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            cors_origins: vec!["*".to_string()],
            environment: "development".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// Build from an explicit key/value set. Seam for tests.
    pub fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Self {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k, v.trim().to_string()))
            .filter(|(_, v)| !v.is_empty())
            .collect();

        let mut config = Self::default();

        if let Some(key) = vars.get("OPENAI_API_KEY") {
            config.openai_api_key = Some(key.clone());
        }
        if let Some(url) = vars.get("OLLAMA_URL") {
            config.ollama_url = url.clone();
        }
        if let Some(host) = vars.get("HOST") {
            config.host = host.clone();
        }
        if let Some(port) = vars.get("PORT") {
            match port.parse::<u16>() {
                Ok(p) => config.port = p,
                Err(_) => {
                    tracing::warn!(port = %port, "PORT is not a valid port number, using {DEFAULT_PORT}");
                }
            }
        }
        if let Some(origins) = vars.get("CORS_ORIGINS") {
            config.cors_origins = split_origins(origins);
        }
        if let Some(env) = vars.get("ENVIRONMENT") {
            config.environment = env.clone();
        }

        config
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    let origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(ToString::to_string)
        .collect();

    if origins.is_empty() {
        vec!["*".to_string()]
    } else {
        origins
    }
}
