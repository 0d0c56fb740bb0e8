use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    #[serde(default)]
    pub buffer: BufferConfig,
    #[serde(default)]
    pub listen: ListenConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BufferConfig {
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ListenConfig {
    #[serde(default = "default_addr")]
    pub addr: String,
    /// Per-read timeout; 0 waits forever.
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

fn default_capacity() -> usize {
    8192
}

fn default_addr() -> String {
    "127.0.0.1:10086".to_string()
}

fn default_read_timeout_ms() -> u64 {
    200
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self { capacity: default_capacity() }
    }
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            read_timeout_ms: default_read_timeout_ms(),
        }
    }
}

/// Load the config at `path`, falling back to defaults when the file does not exist.
pub fn load_config(path: &str) -> Result<Config, Box<dyn std::error::Error>> {
    if !Path::new(path).exists() {
        log::info!("Config file not found: {}, using defaults", path);
        return Ok(Config::default());
    }

    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config file {}: {}", path, e))?;

    let cfg = parse_config(&content)
        .map_err(|e| format!("Invalid config {}: {}", path, e))?;

    log::info!("Config loaded from: {}", path);
    Ok(cfg)
}

pub fn parse_config(content: &str) -> Result<Config, Box<dyn std::error::Error>> {
    let cfg: Config = toml::from_str(content)?;

    if cfg.buffer.capacity == 0 {
        return Err("buffer.capacity must be greater than zero".into());
    }
    if cfg.listen.read_timeout_ms == 0 {
        log::warn!("listen.read_timeout_ms is 0 - reads will wait indefinitely");
    }
    log::debug!(
        "Buffer capacity {} bytes, listen address {}",
        cfg.buffer.capacity,
        cfg.listen.addr
    );

    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let cfg = parse_config("").unwrap();
        assert_eq!(cfg.buffer.capacity, 8192);
        assert_eq!(cfg.listen.addr, "127.0.0.1:10086");
        assert_eq!(cfg.listen.read_timeout_ms, 200);
    }

    #[test]
    fn test_partial_config() {
        let cfg = parse_config(
            r#"
            [buffer]
            capacity = 1024

            [listen]
            read_timeout_ms = 50
            "#,
        )
        .unwrap();
        assert_eq!(cfg.buffer.capacity, 1024);
        assert_eq!(cfg.listen.addr, "127.0.0.1:10086");
        assert_eq!(cfg.listen.read_timeout_ms, 50);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = parse_config("[buffer]\ncapacity = 0\n").unwrap_err();
        assert!(err.to_string().contains("capacity"));
    }

    #[test]
    fn test_malformed_toml_rejected() {
        assert!(parse_config("[buffer\ncapacity = 1").is_err());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let cfg = load_config("/nonexistent/ringframe/config.toml").unwrap();
        assert_eq!(cfg.buffer.capacity, 8192);
    }
}
