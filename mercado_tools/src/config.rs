use log::*;
use mpg_common::Secret;

pub const DEFAULT_MP_API_URL: &str = "https://api.mercadopago.com";

#[derive(Debug, Clone, Default)]
pub struct MercadoConfig {
    pub api_url: String,
    pub access_token: Secret<String>,
    pub webhook_secret: Secret<String>,
}

impl MercadoConfig {
    pub fn new_from_env_or_default() -> Self {
        let api_url = std::env::var("MPG_MP_API_URL").unwrap_or_else(|_| {
            info!("MPG_MP_API_URL not set, using {DEFAULT_MP_API_URL} as default");
            DEFAULT_MP_API_URL.to_string()
        });
        let access_token = Secret::new(std::env::var("MPG_MP_ACCESS_TOKEN").unwrap_or_else(|_| {
            warn!("MPG_MP_ACCESS_TOKEN not set. Payment fetches against the live API will be rejected.");
            String::default()
        }));
        let webhook_secret = Secret::new(std::env::var("MPG_MP_WEBHOOK_SECRET").unwrap_or_else(|_| {
            warn!("MPG_MP_WEBHOOK_SECRET not set. Webhook signatures cannot be validated without it.");
            String::default()
        }));
        Self { api_url, access_token, webhook_secret }
    }
}
