use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Absolute base used to build provider return/notify URLs.
    pub public_base_url: String,
    pub payments: PaymentConfig,
}

/// Provider credentials, injected through `AppState` rather than read from
/// ambient globals at the call sites.
#[derive(Debug, Clone)]
pub struct PaymentConfig {
    pub stripe_secret_key: String,
    pub stripe_webhook_secret: String,
    pub cinetpay_api_key: String,
    pub cinetpay_site_id: String,
    pub cinetpay_base_url: String,
    pub currency: String,
    /// Phone numbers surfaced for the chat-confirmed payment path.
    pub chat_numbers: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let public_base_url =
            env::var("PUBLIC_BASE_URL").unwrap_or_else(|_| format!("http://{host}:{port}"));

        let payments = PaymentConfig {
            stripe_secret_key: env::var("STRIPE_SECRET_KEY").unwrap_or_default(),
            stripe_webhook_secret: env::var("STRIPE_WEBHOOK_SECRET").unwrap_or_default(),
            cinetpay_api_key: env::var("CINETPAY_API_KEY").unwrap_or_default(),
            cinetpay_site_id: env::var("CINETPAY_SITE_ID").unwrap_or_default(),
            cinetpay_base_url: env::var("CINETPAY_BASE_URL")
                .unwrap_or_else(|_| "https://sandbox.cinetpay.com/v1".to_string()),
            currency: env::var("PAYMENT_CURRENCY").unwrap_or_else(|_| "XOF".to_string()),
            chat_numbers: env::var("CHAT_PAYMENT_NUMBERS")
                .map(|raw| {
                    raw.split(',')
                        .map(|n| n.trim().to_string())
                        .filter(|n| !n.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
        };

        Ok(Self {
            database_url,
            host,
            port,
            public_base_url,
            payments,
        })
    }
}
