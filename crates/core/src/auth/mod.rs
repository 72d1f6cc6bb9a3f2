//! Request authentication.
//!
//! Users authenticate with the credentials of the media server they already
//! use; the server is asked to validate them on every request.

mod none;
mod subsonic;
mod types;

pub use none::*;
pub use subsonic::*;
pub use types::*;

use crate::config::{AuthConfig, AuthMethod, HttpConfig};

/// Factory function to create authenticator from config
pub fn create_authenticator(
    config: &AuthConfig,
    http: &HttpConfig,
) -> Result<Box<dyn Authenticator>, AuthError> {
    match config.method {
        AuthMethod::None => Ok(Box::new(NoneAuthenticator)),
        AuthMethod::Subsonic => {
            let subsonic = config.subsonic.clone().ok_or_else(|| {
                AuthError::ConfigurationError(
                    "auth.subsonic must be set when using subsonic auth method".to_string(),
                )
            })?;
            Ok(Box::new(SubsonicAuthenticator::new(subsonic, &http.user_agent)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SubsonicConfig;

    #[test]
    fn test_create_authenticator_none() {
        let config = AuthConfig {
            method: AuthMethod::None,
            subsonic: None,
        };
        let auth = create_authenticator(&config, &HttpConfig::default()).unwrap();
        assert_eq!(auth.method_name(), "none");
    }

    #[test]
    fn test_create_authenticator_subsonic() {
        let config = AuthConfig {
            method: AuthMethod::Subsonic,
            subsonic: Some(SubsonicConfig {
                url: "https://music.example.com".to_string(),
                api_version: "1.15.0".to_string(),
                client_name: "music-requests".to_string(),
                timeout_secs: 15,
            }),
        };
        let auth = create_authenticator(&config, &HttpConfig::default()).unwrap();
        assert_eq!(auth.method_name(), "subsonic");
    }

    #[test]
    fn test_create_authenticator_subsonic_missing_section() {
        let config = AuthConfig {
            method: AuthMethod::Subsonic,
            subsonic: None,
        };
        let result = create_authenticator(&config, &HttpConfig::default());
        assert!(matches!(result, Err(AuthError::ConfigurationError(_))));
    }
}
