//! # Application State
//!
//! Shared state for the Axum application.
//! Contains the order gateway, PayPal settings and the reconciliation policy.

use axum::http::Uri;
use checkout_core::{ApplicationContext, BoxedOrderGateway, Currency, ReconcilePolicy};
use checkout_paypal::{PayPalConfig, PayPalGateway};
use serde::Deserialize;
use std::sync::Arc;

/// Local dev server for the storefront
pub const DEV_ORIGIN: &str = "http://localhost:5173";

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Environment (development, staging, production)
    pub environment: String,
    /// Public storefront URL, always allowed by CORS
    pub public_base_url: Option<String>,
    /// URL the hosting platform exposes this service under
    pub render_external_url: Option<String>,
    /// Extra CORS origins
    pub allowed_origins: Vec<String>,
    /// Brand shown on the PayPal checkout page
    pub brand_name: String,
    /// Checkout page locale
    pub locale: String,
    /// Reconciliation limits
    pub policy: ReconcilePolicy,
}

/// `[checkout]` table of `config/checkout.toml`
#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    #[serde(default)]
    checkout: CheckoutSettings,
}

#[derive(Debug, Default, Deserialize)]
struct CheckoutSettings {
    #[serde(flatten)]
    policy: ReconcilePolicy,
    #[serde(default)]
    brand_name: Option<String>,
    #[serde(default)]
    locale: Option<String>,
    #[serde(default)]
    allowed_origins: Vec<String>,
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    /// Load `config/checkout.toml` (if any), then apply environment overrides
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let settings = load_settings()?.checkout;
        let mut config = Self {
            allowed_origins: settings.allowed_origins,
            policy: settings.policy,
            ..Self::default()
        };
        if let Some(brand) = settings.brand_name {
            config.brand_name = brand;
        }
        if let Some(locale) = settings.locale {
            config.locale = locale;
        }

        if let Some(host) = env_var("HOST") {
            config.host = host;
        }
        if let Some(port) = env_var("PORT") {
            config.port = port
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid PORT {:?}: {}", port, e))?;
        }
        if let Some(environment) = env_var("ENVIRONMENT") {
            config.environment = environment;
        }
        config.public_base_url = env_var("PUBLIC_BASE_URL");
        config.render_external_url = env_var("RENDER_EXTERNAL_URL");
        if let Some(brand) = env_var("BRAND_NAME") {
            config.brand_name = brand;
        }
        if let Some(locale) = env_var("PAYPAL_LOCALE") {
            config.locale = locale;
        }
        if let Some(minimum) = env_var("MIN_ORDER_TOTAL") {
            config.policy.minimum_total = minimum
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid MIN_ORDER_TOTAL {:?}: {}", minimum, e))?;
        }
        if let Some(currency) = env_var("DEFAULT_CURRENCY") {
            config.policy.default_currency = currency.parse::<Currency>()?;
        }

        Ok(config)
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<std::net::SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid socket address {}:{}: {}", self.host, self.port, e))
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Origins the CORS layer accepts, deduplicated, in insertion order
    pub fn cors_origins(&self) -> Vec<String> {
        let mut origins = vec![DEV_ORIGIN.to_string()];
        if let Some(public) = &self.public_base_url {
            origins.push(public.trim_end_matches('/').to_string());
        }
        if let Some(origin) = self.render_external_url.as_deref().and_then(origin_of) {
            origins.push(origin);
        }
        origins.extend(self.allowed_origins.iter().cloned());

        let mut seen = std::collections::HashSet::new();
        origins.retain(|o| seen.insert(o.clone()));
        origins
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            environment: "development".to_string(),
            public_base_url: None,
            render_external_url: None,
            allowed_origins: Vec::new(),
            brand_name: "Your Store".to_string(),
            locale: "en-GB".to_string(),
            policy: ReconcilePolicy::default(),
        }
    }
}

/// `scheme://host[:port]` of a URL, or `None` if it has no scheme or host
fn origin_of(url: &str) -> Option<String> {
    let uri: Uri = url.parse().ok()?;
    let scheme = uri.scheme_str()?;
    let authority = uri.authority()?;
    Some(format!("{}://{}", scheme, authority))
}

/// Load settings from `CHECKOUT_CONFIG` or the usual config paths
fn load_settings() -> anyhow::Result<FileSettings> {
    let explicit = env_var("CHECKOUT_CONFIG");
    let config_paths: Vec<&str> = match explicit.as_deref() {
        Some(path) => vec![path],
        None => vec![
            "config/checkout.toml",
            "../config/checkout.toml",
            "../../config/checkout.toml",
        ],
    };

    for path in config_paths {
        if let Ok(content) = std::fs::read_to_string(path) {
            let settings: FileSettings = toml::from_str(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path, e))?;
            tracing::info!("Loaded checkout settings from {}", path);
            return Ok(settings);
        }
    }

    if let Some(path) = explicit {
        anyhow::bail!("CHECKOUT_CONFIG points at unreadable file: {}", path);
    }

    tracing::warn!("No checkout settings file found, using defaults");
    Ok(FileSettings::default())
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Payment processor
    pub gateway: BoxedOrderGateway,
    /// PayPal settings (SDK config and debug endpoints)
    pub paypal: PayPalConfig,
    /// Application config
    pub config: AppConfig,
}

impl AppState {
    /// Create a new AppState backed by the PayPal gateway
    pub fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;
        let paypal = PayPalConfig::from_env();
        let gateway = PayPalGateway::new(paypal.clone())
            .map_err(|e| anyhow::anyhow!("Failed to initialize PayPal: {}", e))?;

        Ok(Self::with_gateway(config, paypal, Arc::new(gateway)))
    }

    /// Build state around any gateway (used by tests)
    pub fn with_gateway(
        config: AppConfig,
        paypal: PayPalConfig,
        gateway: BoxedOrderGateway,
    ) -> Self {
        Self {
            gateway,
            paypal,
            config,
        }
    }

    /// Checkout page settings sent with every order
    pub fn application_context(&self) -> ApplicationContext {
        ApplicationContext::new(
            &self.config.brand_name,
            &self.config.locale,
            &self.paypal.return_urls(),
        )
    }
}
