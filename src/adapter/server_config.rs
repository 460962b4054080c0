use crate::adapter::database_config::{parse_var, string_var, ConfigError};

/// HTTPサーバーとサイト表示の設定
/// 起動時に一度だけ読み込み、ルーターの状態として共有する
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub site_title: String,
    pub site_header: String,
    /// 在庫僅少とみなす販売可能数
    pub low_stock_threshold: u32,
}

impl ServerConfig {
    /// 環境変数から設定を読み取る
    /// SERVER_HOST, SERVER_PORT, SITE_TITLE, SITE_HEADER, LOW_STOCK_THRESHOLD
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: string_var("SERVER_HOST", "0.0.0.0"),
            port: parse_var("SERVER_PORT", 3000)?,
            site_title: string_var("SITE_TITLE", "TCG Storefront"),
            site_header: string_var("SITE_HEADER", "TCG Storefront Admin"),
            low_stock_threshold: parse_var("LOW_STOCK_THRESHOLD", 5)?,
        })
    }

    /// バインドするアドレス
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            site_title: "TCG Storefront".to_string(),
            site_header: "TCG Storefront Admin".to_string(),
            low_stock_threshold: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::database_config::tests::ENV_LOCK;
    use std::env;

    #[test]
    fn test_defaults() {
        let _lock = ENV_LOCK.lock().unwrap();
        for var in ["SERVER_HOST", "SERVER_PORT", "SITE_TITLE", "SITE_HEADER", "LOW_STOCK_THRESHOLD"] {
            env::remove_var(var);
        }

        let config = ServerConfig::from_env().unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:3000");
        assert_eq!(config.low_stock_threshold, 5);
        assert_eq!(config.site_title, ServerConfig::default().site_title);
    }

    #[test]
    fn test_overrides() {
        let _lock = ENV_LOCK.lock().unwrap();
        env::set_var("SERVER_PORT", "8080");
        env::set_var("SITE_TITLE", "Poké Cartas");
        env::set_var("LOW_STOCK_THRESHOLD", "2");

        let config = ServerConfig::from_env().unwrap();
        env::remove_var("SERVER_PORT");
        env::remove_var("SITE_TITLE");
        env::remove_var("LOW_STOCK_THRESHOLD");

        assert_eq!(config.port, 8080);
        assert_eq!(config.site_title, "Poké Cartas");
        assert_eq!(config.low_stock_threshold, 2);
    }

    #[test]
    fn test_invalid_threshold() {
        let _lock = ENV_LOCK.lock().unwrap();
        env::set_var("LOW_STOCK_THRESHOLD", "few");
        let result = ServerConfig::from_env();
        env::remove_var("LOW_STOCK_THRESHOLD");
        assert!(result.is_err());
    }
}
