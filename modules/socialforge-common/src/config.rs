use std::env;

/// Application configuration loaded from environment variables.
/// Collaborator clients receive the relevant fields at construction time;
/// nothing reads the environment after startup.
#[derive(Debug, Clone)]
pub struct Config {
    // Job store
    pub db_path: String,

    // Web server
    pub web_host: String,
    pub web_port: u16,

    // Webhook authenticity. Unset means accept all requests.
    pub webhook_secret: Option<String>,
    // Callback target used when a request does not carry its own.
    pub default_callback_url: Option<String>,

    // Branding
    pub brand_prefix: String,

    // Browser automation sidecar (Facebook + YouTube sessions)
    pub browserbot_url: String,
    pub browserbot_token: Option<String>,
    pub fb_category: String,

    // GeeLark cloud phones (Instagram)
    pub geelark_api_token: String,
    pub geelark_android_version: String,
    pub geelark_signup_flow: String,
    pub geelark_warmup_template: String,
    pub proxy_url: String,

    // OTP number leasing
    pub otp_provider: String,
    pub smsman_api_key: String,
    pub fivesim_api_key: String,
    pub otp_poll_interval_secs: u64,
    pub otp_max_wait_secs: u64,

    // Orchestration
    pub max_concurrent_jobs: usize,
    pub task_deadline_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        let otp_provider = env::var("OTP_PROVIDER").unwrap_or_else(|_| "smsman".to_string());
        Self {
            db_path: env::var("DB_PATH").unwrap_or_else(|_| "socialforge.db".to_string()),
            web_host: env::var("WEB_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            web_port: parse_env("WEB_PORT", 8080),
            webhook_secret: optional_env("WEBHOOK_SECRET"),
            default_callback_url: optional_env("CMS_CALLBACK_URL"),
            brand_prefix: env::var("BRAND_PREFIX").unwrap_or_else(|_| "STAGE".to_string()),
            browserbot_url: env::var("BROWSERBOT_URL")
                .unwrap_or_else(|_| "http://localhost:9333".to_string()),
            browserbot_token: optional_env("BROWSERBOT_TOKEN"),
            fb_category: env::var("FB_CATEGORY").unwrap_or_else(|_| "Entertainment".to_string()),
            geelark_api_token: required_env("GEELARK_API_TOKEN"),
            geelark_android_version: env::var("GEELARK_ANDROID_VERSION")
                .unwrap_or_else(|_| "Android12".to_string()),
            geelark_signup_flow: env::var("GEELARK_SIGNUP_FLOW")
                .unwrap_or_else(|_| "instagram-signup".to_string()),
            geelark_warmup_template: env::var("GEELARK_WARMUP_TEMPLATE")
                .unwrap_or_else(|_| "instagram-ai-account-warmup".to_string()),
            proxy_url: required_env("PROXY_URL"),
            smsman_api_key: if otp_provider == "smsman" {
                required_env("SMSMAN_API_KEY")
            } else {
                env::var("SMSMAN_API_KEY").unwrap_or_default()
            },
            fivesim_api_key: if otp_provider == "fivesim" {
                required_env("FIVESIM_API_KEY")
            } else {
                env::var("FIVESIM_API_KEY").unwrap_or_default()
            },
            otp_provider,
            otp_poll_interval_secs: parse_env("OTP_POLL_INTERVAL", 10),
            otp_max_wait_secs: parse_env("OTP_MAX_WAIT", 300),
            max_concurrent_jobs: parse_env("MAX_CONCURRENT_JOBS", 2),
            task_deadline_secs: parse_env("TASK_DEADLINE_SECS", 600),
        }
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}

fn optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(v) => v
            .parse()
            .unwrap_or_else(|_| panic!("{key} must be a number")),
        Err(_) => default,
    }
}
