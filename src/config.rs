/// The configuration parameters for the application.
///
/// Every field can be given as a command line flag or through the environment variable
/// named in its `env` attribute.
#[derive(clap::Parser)]
pub struct Config {
    /// The connection URL for the Postgres database this application should use.
    #[clap(long, env)]
    pub database_url: String,

    /// The HMAC signing and verification key used for login tokens (JWTs).
    ///
    /// There is no required structure or format to this key as it's just fed into a hash function.
    /// In practice, it should be a long, random string that would be infeasible to brute-force.
    #[clap(long, env)]
    pub hmac_key: String,

    /// The port the HTTP server listens on.
    #[clap(long, env, default_value = "8080")]
    pub port: u16,

    /// How long an issued token stays valid, in days.
    #[clap(long, env, default_value = "14")]
    pub session_length_days: i64,

    /// Sender address for the welcome message on registration.
    #[clap(long, env, default_value = "noreply@authors-haven.com")]
    pub mail_from: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            hmac_key: String::new(),
            port: 8080,
            session_length_days: 14,
            mail_from: "noreply@authors-haven.com".to_string(),
        }
    }
}
