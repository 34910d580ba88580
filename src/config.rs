use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub bbps_base_url: String,
    pub bbps_token: String,
    /// Fee direction used when the fee config omits one. BBPS convention: "C".
    pub fee_direction_default: String,
    /// TTL in seconds for the biller-catalog cache.
    pub biller_cache_ttl_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            bbps_base_url: std::env::var("BBPS_BASE_URL")
                .map_err(|_| anyhow::anyhow!("BBPS_BASE_URL environment variable required"))
                .and_then(|url| {
                    if url.trim().is_empty() {
                        anyhow::bail!("BBPS_BASE_URL cannot be empty");
                    }
                    if !url.starts_with("http://") && !url.starts_with("https://") {
                        anyhow::bail!("BBPS_BASE_URL must start with http:// or https://");
                    }
                    Ok(url)
                })?,
            bbps_token: std::env::var("BBPS_TOKEN")
                .map_err(|_| anyhow::anyhow!("BBPS_TOKEN environment variable required"))
                .and_then(|token| {
                    if token.trim().is_empty() {
                        anyhow::bail!("BBPS_TOKEN cannot be empty");
                    }
                    Ok(token)
                })?,
            fee_direction_default: std::env::var("FEE_DIRECTION_DEFAULT")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "C".to_string()),
            biller_cache_ttl_secs: std::env::var("BILLER_CACHE_TTL_SECS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("BILLER_CACHE_TTL_SECS must be a valid number"))?,
        };

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("BBPS Base URL: {}", config.bbps_base_url);
        tracing::debug!("Server Port: {}", config.port);
        tracing::debug!("Fee direction default: {}", config.fee_direction_default);

        Ok(config)
    }
}
