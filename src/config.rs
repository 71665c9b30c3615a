//! Environment configuration, loaded via `dotenvy` + `std::env` with a small
//! env-with-default helper rather than a config-file format.

use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub secret_key: String,
    pub auth_service_url: String,
}

impl Config {
    /// Loads `RAGNAROK_SECRET_KEY` and `AUTH_SERVICE_URL`, calling
    /// `dotenvy::dotenv()` first so a local `.env` can supply them in
    /// development. Missing `AUTH_SERVICE_URL` is a startup error; a
    /// missing secret key falls back to a fixed development value (logged
    /// as a warning) so the binary still starts for local testing.
    pub fn from_env() -> Result<Self, env::VarError> {
        if dotenvy::dotenv().is_err() {
            log::debug!("no .env file found, reading configuration from the environment only");
        }

        let secret_key = match env::var("RAGNAROK_SECRET_KEY") {
            Ok(value) => value,
            Err(_) => {
                log::warn!("RAGNAROK_SECRET_KEY is unset, using an insecure development default");
                "dev-secret-key".to_string()
            }
        };
        let auth_service_url = env::var("AUTH_SERVICE_URL")?;

        Ok(Self {
            secret_key,
            auth_service_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_auth_service_url_is_an_error() {
        std::env::remove_var("AUTH_SERVICE_URL");
        assert!(Config::from_env().is_err());
    }
}
