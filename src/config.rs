use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 5400;

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub data_file: String,
}

impl Config {
    /// Unset or unparsable variables keep their [`Default`] value.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or(defaults.port),
            data_file: std::env::var("DATA_FILE").unwrap_or(defaults.data_file),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(&self.data_file)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            data_file: "data.json".to_string(),
        }
    }
}
