//! Process configuration, read from the environment (and an optional `.env`).

use anyhow::{Context, Result, anyhow};
use std::path::PathBuf;

const DEFAULT_FRONTEND_URL: &str = "https://your-valentine-site.vercel.app";
const DEFAULT_DATABASE_URL: &str = "sqlite:valentine.db?mode=rwc";
const DEFAULT_UPI_ID: &str = "mpjani294.personal@oksbi";
const DEFAULT_PRICE_INR: u32 = 30;
const DEFAULT_PORT: u16 = 3000;

/// What the user is asked to pay, and to whom.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentConfig {
    pub upi_id: String,
    pub price_inr: u32,
}

impl PaymentConfig {
    pub fn upi_link(&self) -> String {
        format!(
            "upi://pay?pa={}&pn=Valentine%20Proposal&am={}&cu=INR&tn=Valentine%20Proposal%20Link",
            self.upi_id, self.price_inr
        )
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bot_token: String,
    pub admin_bot_token: Option<String>,
    pub frontend_url: String,
    pub server_url: String,
    pub port: u16,
    pub database_url: String,
    pub upload_dir: PathBuf,
    pub admin_chat_file: PathBuf,
    pub payment: PaymentConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<AppConfig> {
        dotenvy::dotenv().ok();
        AppConfig::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source. Empty
    /// values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<AppConfig> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let bot_token = var("BOT_TOKEN").ok_or_else(|| anyhow!("BOT_TOKEN not set"))?;

        let port = match var("PORT") {
            Some(port) => port.parse().context("PORT is invalid")?,
            None => DEFAULT_PORT,
        };

        let price_inr = match var("PRICE_INR") {
            Some(price) => price.parse().context("PRICE_INR is invalid")?,
            None => DEFAULT_PRICE_INR,
        };

        Ok(AppConfig {
            bot_token,
            admin_bot_token: var("ADMIN_BOT_TOKEN"),
            frontend_url: var("FRONTEND_URL").unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_owned()),
            server_url: var("SERVER_URL").unwrap_or_else(|| format!("http://localhost:{port}")),
            port,
            database_url: var("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_owned()),
            upload_dir: var("UPLOAD_DIR")
                .unwrap_or_else(|| "uploads".to_owned())
                .into(),
            admin_chat_file: var("ADMIN_CHAT_FILE")
                .unwrap_or_else(|| "admin_chat.json".to_owned())
                .into(),
            payment: PaymentConfig {
                upi_id: var("UPI_ID").unwrap_or_else(|| DEFAULT_UPI_ID.to_owned()),
                price_inr,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[("BOT_TOKEN", "123:abc")])).unwrap();

        assert_eq!(config.bot_token, "123:abc");
        assert!(config.admin_bot_token.is_none());
        assert_eq!(config.port, 3000);
        assert_eq!(config.server_url, "http://localhost:3000");
        assert_eq!(config.frontend_url, DEFAULT_FRONTEND_URL);
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
        assert_eq!(config.payment.price_inr, 30);
    }

    #[test]
    fn test_missing_bot_token_refuses_to_start() {
        let result = AppConfig::from_lookup(lookup(&[("PORT", "8080")]));
        assert!(result.is_err());

        let result = AppConfig::from_lookup(lookup(&[("BOT_TOKEN", "  ")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_numbers_are_errors() {
        let result = AppConfig::from_lookup(lookup(&[("BOT_TOKEN", "t"), ("PORT", "http")]));
        assert!(result.is_err());

        let result = AppConfig::from_lookup(lookup(&[("BOT_TOKEN", "t"), ("PRICE_INR", "free")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_server_url_follows_port() {
        let config =
            AppConfig::from_lookup(lookup(&[("BOT_TOKEN", "t"), ("PORT", "8080")])).unwrap();
        assert_eq!(config.server_url, "http://localhost:8080");
    }

    #[test]
    fn test_upi_link() {
        let payment = PaymentConfig {
            upi_id: "someone@bank".into(),
            price_inr: 30,
        };
        assert_eq!(
            payment.upi_link(),
            "upi://pay?pa=someone@bank&pn=Valentine%20Proposal&am=30&cu=INR&tn=Valentine%20Proposal%20Link"
        );
    }
}
