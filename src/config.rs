use dotenv::dotenv;
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use std::{env, fmt, str::FromStr};

pub struct Config {
    pub port: u16,
    pub log_level: String,
    pub jwt_secret: String,
    pub token_ttl_secs: u64,
    pub collection_link_base_url: String,
    pub wallet_opening_balance: Decimal,
    pub request_timeout_secs: u64,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("log_level", &self.log_level)
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("collection_link_base_url", &self.collection_link_base_url)
            .field("wallet_opening_balance", &self.wallet_opening_balance)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

/// Starting balance of every in-process wallet account, in rupees.
pub const DEFAULT_WALLET_OPENING_BALANCE: i64 = 10_000;

impl Config {
    fn from_env() -> Self {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            port: parsed(&var, "PORT").unwrap_or(3000),
            log_level: var("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            jwt_secret: var("JWT_SECRET").unwrap_or_else(|| "secret".to_string()), // Use a secure secret in production
            token_ttl_secs: parsed(&var, "TOKEN_TTL_SECS").unwrap_or(3600),
            collection_link_base_url: var("COLLECTION_LINK_BASE_URL")
                .unwrap_or_else(|| "http://localhost:3000/pay".to_string()),
            wallet_opening_balance: parsed(&var, "WALLET_OPENING_BALANCE")
                .unwrap_or(Decimal::from(DEFAULT_WALLET_OPENING_BALANCE)),
            request_timeout_secs: parsed(&var, "REQUEST_TIMEOUT_SECS").unwrap_or(30),
        }
    }
}

fn parsed<T: FromStr>(var: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    var(key).and_then(|v| v.parse().ok())
}

pub static CONFIG: Lazy<Config> = Lazy::new(Config::from_env);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::contribution::PaymentMethod;
    use crate::infrastructure::payment::{PaymentChannelAdapter, PaymentRequest, wallet::WalletChannel};
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[tokio::test]
    async fn test_default_wallet_balance_can_pay() {
        let config = config(&[]);
        assert_eq!(config.wallet_opening_balance, Decimal::from(DEFAULT_WALLET_OPENING_BALANCE));

        let wallet = WalletChannel::new(config.wallet_opening_balance);
        assert_eq!(wallet.method(), PaymentMethod::Wallet);
        let receipt = wallet
            .pay(&PaymentRequest {
                payer_id: "u1".to_string(),
                amount: Decimal::from(500),
                item_id: Some("i1".to_string()),
                room_id: "r1".to_string(),
            })
            .await;
        assert!(receipt.is_ok());
    }

    #[test]
    fn test_overrides_and_bad_values() {
        let config = config(&[
            ("PORT", "8080"),
            ("WALLET_OPENING_BALANCE", "250.50"),
            ("TOKEN_TTL_SECS", "soon"),
        ]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.wallet_opening_balance, Decimal::new(25050, 2));
        assert_eq!(config.token_ttl_secs, 3600);
        assert!(format!("{:?}", config).contains("<redacted>"));
    }
}
