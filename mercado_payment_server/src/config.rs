use std::{env, time::Duration};

use log::*;
use mercado_tools::MercadoConfig;
use mpg_common::{Secret, MXN_CURRENCY_CODE};

const DEFAULT_MPG_HOST: &str = "127.0.0.1";
const DEFAULT_MPG_PORT: u16 = 3001;
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(600);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// The only currency payments may settle in. Anything else is rejected outright.
    pub settlement_currency: String,
    /// TTL for checkout intents. Bounds the tolerable delay between checkout initiation and webhook arrival.
    pub cache_ttl: Duration,
    /// Shared key for the admin routes. When empty, admin routes refuse every request.
    pub admin_api_key: Secret<String>,
    /// When false, webhook signatures are not checked. This is the explicitly-flagged test mode; never run
    /// production like this.
    pub signature_checks: bool,
    /// Mercado Pago API configuration.
    pub mercado: MercadoConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_MPG_HOST.to_string(),
            port: DEFAULT_MPG_PORT,
            database_url: String::default(),
            settlement_currency: MXN_CURRENCY_CODE.to_string(),
            cache_ttl: DEFAULT_CACHE_TTL,
            admin_api_key: Secret::default(),
            signature_checks: true,
            mercado: MercadoConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("MPG_HOST").ok().unwrap_or_else(|| DEFAULT_MPG_HOST.into());
        let port = env::var("MPG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for MPG_PORT. {e} Using the default, {DEFAULT_MPG_PORT}, \
                         instead."
                    );
                    DEFAULT_MPG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_MPG_PORT);
        let database_url = env::var("MPG_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ MPG_DATABASE_URL is not set. Please set it to the URL for the gateway database.");
            String::default()
        });
        let settlement_currency = env::var("MPG_SETTLEMENT_CURRENCY").ok().unwrap_or_else(|| {
            info!("🪛️ MPG_SETTLEMENT_CURRENCY is not set. Using {MXN_CURRENCY_CODE}.");
            MXN_CURRENCY_CODE.to_string()
        });
        let cache_ttl = env::var("MPG_CACHE_TTL_SECS")
            .map_err(|_| {
                info!(
                    "🪛️ MPG_CACHE_TTL_SECS is not set. Using the default of {} seconds.",
                    DEFAULT_CACHE_TTL.as_secs()
                )
            })
            .and_then(|s| {
                s.parse::<u64>()
                    .map(Duration::from_secs)
                    .map_err(|e| warn!("🪛️ Invalid configuration value for MPG_CACHE_TTL_SECS. {e}"))
            })
            .ok()
            .unwrap_or(DEFAULT_CACHE_TTL);
        let admin_api_key = Secret::new(env::var("MPG_ADMIN_API_KEY").ok().unwrap_or_else(|| {
            warn!("🪛️ MPG_ADMIN_API_KEY is not set. Admin routes will refuse all requests.");
            String::default()
        }));
        let signature_checks =
            env::var("MPG_MP_SIGNATURE_CHECKS").map(|s| &s != "0" && &s != "false").unwrap_or(true);
        if !signature_checks {
            warn!(
                "🚨️ Webhook signature checks are DISABLED (MPG_MP_SIGNATURE_CHECKS). Anyone can post to the \
                 webhook endpoint. Only ever run like this against test credentials."
            );
        }
        let mercado = MercadoConfig::new_from_env_or_default();
        Self { host, port, database_url, settlement_currency, cache_ttl, admin_api_key, signature_checks, mercado }
    }
}

/// The admin API key as app data, so the per-route middleware can reach it.
#[derive(Clone, Default)]
pub struct AdminApiKey(pub Secret<String>);
