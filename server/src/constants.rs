//! Application-wide constants
//!
//! Single source of truth for configuration defaults.

/// Default values for server configuration
pub mod defaults {
    /// OpenAI-compatible endpoint of the model service
    pub const BASE_URL: &str = "https://api.groq.com/openai/v1";
    /// Lighter model used for simple component requests
    pub const SIMPLE_MODEL: &str = "llama3-8b-8192";
    /// Heavier model used for full-application requests
    pub const COMPLEX_MODEL: &str = "llama3-70b-8192";
    /// Address the HTTP facade binds to
    pub const BIND_ADDR: &str = "127.0.0.1:8080";
    /// Watchdog timeout for sandbox evaluation in milliseconds
    pub const EVAL_TIMEOUT_MS: u64 = 5000;
}

/// Environment variables consulted at startup
pub mod env_keys {
    /// API key override; takes precedence over the config file
    pub const API_KEY: &str = "VIEWSMITH_API_KEY";
    /// Legacy API key variable, honored when the primary one is unset
    pub const API_KEY_FALLBACK: &str = "GROQ_API_KEY";
}
