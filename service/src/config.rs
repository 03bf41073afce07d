use clap::builder::TypedValueParser as _;
use clap::Parser;
use dotenvy::dotenv;
use log::LevelFilter;
use std::fmt;
use std::str::FromStr;

/// Default Google OAuth endpoint URLs. Override in tests to point at a mock
/// server.
pub const DEFAULT_OAUTH_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const DEFAULT_OAUTH_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const DEFAULT_OAUTH_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

#[derive(Clone, Debug, PartialEq)]
pub enum RustEnv {
    Development,
    Production,
    Staging,
}

#[derive(Debug, PartialEq, Eq)]
pub struct RustEnvParseError;

impl FromStr for RustEnv {
    type Err = RustEnvParseError;
    fn from_str(level: &str) -> Result<RustEnv, Self::Err> {
        match level.to_lowercase().as_str() {
            "development" => Ok(RustEnv::Development),
            "production" => Ok(RustEnv::Production),
            "staging" => Ok(RustEnv::Staging),
            _ => Err(RustEnvParseError),
        }
    }
}

impl fmt::Display for RustEnv {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RustEnv::Development => write!(f, "development"),
            RustEnv::Production => write!(f, "production"),
            RustEnv::Staging => write!(f, "staging"),
        }
    }
}

/// How the identity middleware resolves the current principal: verify the
/// signed token only (no store hit, no pre-expiry revocation) or resolve the
/// session id against the store (revocable, one lookup per request).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VerificationMode {
    Stateless,
    Stateful,
}

#[derive(Debug, PartialEq, Eq)]
pub struct VerificationModeParseError;

impl FromStr for VerificationMode {
    type Err = VerificationModeParseError;
    fn from_str(mode: &str) -> Result<VerificationMode, Self::Err> {
        match mode.to_lowercase().as_str() {
            "stateless" => Ok(VerificationMode::Stateless),
            "stateful" => Ok(VerificationMode::Stateful),
            _ => Err(VerificationModeParseError),
        }
    }
}

impl fmt::Display for VerificationMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            VerificationMode::Stateless => write!(f, "stateless"),
            VerificationMode::Stateful => write!(f, "stateful"),
        }
    }
}

#[derive(Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// A list of full CORS origin URLs that allowed to receive server responses.
    #[arg(
        long,
        env,
        value_delimiter = ',',
        use_value_delimiter = true,
        default_value = "http://localhost:3000,https://localhost:3000"
    )]
    pub allowed_origins: Vec<String>,

    /// Secret used to sign session tokens. Required; never logged.
    #[arg(long, env)]
    signing_secret: Option<String>,

    /// Lifetime in seconds of issued tokens; cookie expiry is derived from it.
    #[arg(long, env, default_value_t = 3600)]
    pub token_expiration_seconds: i64,

    /// Prefix for the authentication cookies, e.g. `<prefix>-token`.
    #[arg(long, env, default_value = "authbridge")]
    pub cookie_prefix: String,

    /// Set the Secure attribute on issued cookies (HTTPS-only delivery).
    #[arg(long, env, default_value_t = false)]
    pub cookie_secure: bool,

    /// SameSite attribute for issued cookies: strict, lax, or none.
    #[arg(long, env, default_value = "lax")]
    pub cookie_same_site: String,

    /// Optional Domain attribute for issued cookies.
    #[arg(long, env)]
    pub cookie_domain: Option<String>,

    /// Server-side session lifetime in seconds, independent of token expiry.
    #[arg(long, env, default_value_t = 86400)]
    pub session_expiry_seconds: i64,

    /// Lifetime in seconds of the anti-forgery state issued per login flow.
    #[arg(long, env, default_value_t = 600)]
    pub state_expiry_seconds: i64,

    /// How the identity middleware verifies requests.
    #[arg(
        long,
        env,
        default_value_t = VerificationMode::Stateless,
        value_parser = clap::builder::PossibleValuesParser::new(["stateless", "stateful"])
            .map(|s| s.parse::<VerificationMode>().unwrap()),
    )]
    pub verification_mode: VerificationMode,

    /// OAuth client id issued by the identity provider.
    #[arg(long, env)]
    oauth_client_id: Option<String>,

    /// OAuth client secret issued by the identity provider. Never logged.
    #[arg(long, env)]
    oauth_client_secret: Option<String>,

    /// Redirect URI registered with the identity provider for our callback.
    #[arg(long, env)]
    oauth_redirect_uri: Option<String>,

    /// The provider's authorization endpoint.
    #[arg(long, env, default_value = DEFAULT_OAUTH_AUTH_URL)]
    oauth_auth_url: String,

    /// The provider's token endpoint.
    #[arg(long, env, default_value = DEFAULT_OAUTH_TOKEN_URL)]
    oauth_token_url: String,

    /// The provider's userinfo endpoint.
    #[arg(long, env, default_value = DEFAULT_OAUTH_USERINFO_URL)]
    oauth_userinfo_url: String,

    /// Where the browser is sent after a completed login.
    #[arg(long, env, default_value = "/")]
    post_login_redirect_url: String,

    /// Login page the browser is sent to when a handshake fails.
    #[arg(long, env, default_value = "/login")]
    login_error_redirect_url: String,

    /// The host interface to listen for incoming connections
    #[arg(short, long, env, default_value = "127.0.0.1")]
    pub interface: Option<String>,

    /// The host TCP port to listen for incoming connections
    #[arg(short, long, env, default_value_t = 4000)]
    pub port: u16,

    /// Set the log level verbosity threshold (level) to control what gets displayed on console output
    #[arg(
        short,
        long,
        env,
        default_value_t = LevelFilter::Info,
        value_parser = clap::builder::PossibleValuesParser::new(["OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE"])
            .map(|s| s.parse::<LevelFilter>().unwrap()),
        )]
    pub log_level_filter: LevelFilter,

    /// Set the Rust runtime environment to use.
    #[arg(
    short,
    long,
    env,
    default_value_t = RustEnv::Development,
    value_parser = clap::builder::PossibleValuesParser::new([
        "DEVELOPMENT", "PRODUCTION", "STAGING",
        "development", "production", "staging"
    ])
        .map(|s| s.parse::<RustEnv>().unwrap()),
    )]
    pub runtime_env: RustEnv,
}

impl Default for Config {
    fn default() -> Self {
        // Parse with no CLI arguments so tests are isolated from the
        // harness's own argv.
        Config::parse_from(["authbridge"])
    }
}

impl Config {
    pub fn new() -> Self {
        // Load .env file first
        dotenv().ok();
        // Then parse the command line parameters and flags
        Config::parse()
    }

    pub fn signing_secret(&self) -> &str {
        self.signing_secret
            .as_ref()
            .expect("No signing secret provided")
    }

    pub fn set_signing_secret(mut self, signing_secret: String) -> Self {
        self.signing_secret = Some(signing_secret);
        self
    }

    pub fn oauth_client_id(&self) -> &str {
        self.oauth_client_id
            .as_ref()
            .expect("No OAuth client id provided")
    }

    pub fn oauth_client_secret(&self) -> &str {
        self.oauth_client_secret
            .as_ref()
            .expect("No OAuth client secret provided")
    }

    pub fn oauth_redirect_uri(&self) -> &str {
        self.oauth_redirect_uri
            .as_ref()
            .expect("No OAuth redirect URI provided")
    }

    pub fn oauth_auth_url(&self) -> &str {
        &self.oauth_auth_url
    }

    pub fn oauth_token_url(&self) -> &str {
        &self.oauth_token_url
    }

    pub fn oauth_userinfo_url(&self) -> &str {
        &self.oauth_userinfo_url
    }

    pub fn post_login_redirect_url(&self) -> &str {
        &self.post_login_redirect_url
    }

    pub fn login_error_redirect_url(&self) -> &str {
        &self.login_error_redirect_url
    }

    pub fn runtime_env(&self) -> RustEnv {
        self.runtime_env.clone()
    }

    pub fn is_production(&self) -> bool {
        self.runtime_env() == RustEnv::Production
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.port, 4000);
        assert_eq!(config.token_expiration_seconds, 3600);
        assert_eq!(config.session_expiry_seconds, 86400);
        assert_eq!(config.cookie_prefix, "authbridge");
        assert_eq!(config.verification_mode, VerificationMode::Stateless);
        assert_eq!(config.post_login_redirect_url(), "/");
        assert_eq!(config.login_error_redirect_url(), "/login");
        assert!(!config.is_production());
    }

    #[test]
    fn test_verification_mode_parses() {
        assert_eq!(
            "STATEFUL".parse::<VerificationMode>(),
            Ok(VerificationMode::Stateful)
        );
        assert_eq!(
            "stateless".parse::<VerificationMode>(),
            Ok(VerificationMode::Stateless)
        );
        assert!("hybrid".parse::<VerificationMode>().is_err());
    }

    #[test]
    fn test_oauth_endpoint_defaults_point_at_google() {
        let config = Config::default();
        assert_eq!(config.oauth_auth_url(), DEFAULT_OAUTH_AUTH_URL);
        assert_eq!(config.oauth_token_url(), DEFAULT_OAUTH_TOKEN_URL);
        assert_eq!(config.oauth_userinfo_url(), DEFAULT_OAUTH_USERINFO_URL);
    }
}
