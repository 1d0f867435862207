pub mod env_var {
    use std::time::Duration;

    use lazy_static::lazy_static;
    use url::Url;

    lazy_static! {
        static ref ENV_VAR: EnvVar = load_env();
    }

    pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
    pub const DEFAULT_GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com";
    pub const DEFAULT_GEMINI_TIMEOUT: Duration = Duration::from_secs(60);
    pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 16 * 1024 * 1024;
    pub const DEFAULT_HISTORY_LIMIT: u32 = 50;

    #[derive(Debug, Clone)]
    pub struct EnvVar {
        pub port: u16,
        pub database_host: String,
        pub database_port: u16,
        pub database_name: String,
        pub database_user: String,
        pub database_password: String,
        pub database_url: String,
        pub gemini_api_key: String,
        pub gemini_model: String,
        pub gemini_api_url: Url,
        pub gemini_timeout: Duration,
        pub max_upload_bytes: u64,
        pub history_limit: u32,
    }

    macro_rules! get_env {
        ($env:literal) => {
            std::env::var($env).expect(concat!("Missing env var ", $env))
        };
        ($env:literal, $default:expr) => {
            std::env::var($env).ok().unwrap_or_else(|| $default.to_string())
        };
    }

    fn load_env() -> EnvVar {
        // A missing .env file is fine, the variables may come from the process environment.
        dotenv::dotenv().ok();

        let port: u16 = get_env!("PORT").parse().expect("Invalid PORT");
        let database_host = get_env!("DATABASE_HOST");
        let database_name = get_env!("DATABASE_NAME");
        let database_user = get_env!("DATABASE_USER");
        let database_password = get_env!("DATABASE_PASSWORD");
        let database_port: u16 = get_env!("DATABASE_PORT")
            .parse()
            .expect("Invalid DATABASE_PORT");

        let database_url = format!("postgres://{database_user}:{database_password}@{database_host}:{database_port}/{database_name}");

        let gemini_api_key = get_env!("GEMINI_API_KEY");
        let gemini_model = get_env!("GEMINI_MODEL", DEFAULT_GEMINI_MODEL);
        let gemini_api_url: Url = get_env!("GEMINI_API_URL", DEFAULT_GEMINI_API_URL)
            .parse()
            .expect("Invalid GEMINI_API_URL");
        let gemini_timeout = Duration::from_secs(
            get_env!("GEMINI_TIMEOUT_SECS", DEFAULT_GEMINI_TIMEOUT.as_secs())
                .parse()
                .expect("Invalid GEMINI_TIMEOUT_SECS"),
        );

        let max_upload_bytes: u64 = get_env!("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)
            .parse()
            .expect("Invalid MAX_UPLOAD_BYTES");
        let history_limit: u32 = get_env!("HISTORY_LIMIT", DEFAULT_HISTORY_LIMIT)
            .parse()
            .expect("Invalid HISTORY_LIMIT");

        EnvVar {
            port,
            database_host,
            database_name,
            database_password,
            database_port,
            database_user,
            database_url,
            gemini_api_key,
            gemini_model,
            gemini_api_url,
            gemini_timeout,
            max_upload_bytes,
            history_limit,
        }
    }

    pub fn get() -> &'static EnvVar {
        &ENV_VAR
    }
}
