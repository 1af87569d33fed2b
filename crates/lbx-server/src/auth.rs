//! Authentication settings.
//!
//! The authenticators themselves live outside this crate; here they are
//! plain configuration leaves that the server hands over untouched.

use lbx_config::{string_enum, Config, ConfigError, ConfigResult, Field};

use crate::mail::EmailConfig;

string_enum! {
    /// Second factors and login methods a deployment can enable.
    pub enum AuthType {
        Email => "email",
        WebAuthnPlatform => "webauthn_platform",
        WebAuthnPortable => "webauthn_portable",
        Totp => "totp",
        OpenId => "openid",
    }
}

string_enum! {
    #[derive(Default)]
    pub enum TotpHash {
        #[default]
        Sha1 => "sha1",
        Sha256 => "sha256",
        Sha512 => "sha512",
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct WebAuthnConfig {
    pub rp_name: String,
    pub rp_id: Option<String>,
    pub origin: Option<String>,
}

impl Default for WebAuthnConfig {
    fn default() -> Self {
        Self {
            rp_name: "Lockbox".into(),
            rp_id: None,
            origin: None,
        }
    }
}

impl Config for WebAuthnConfig {
    const NAME: &'static str = "WebAuthnConfig";

    fn fields() -> Vec<Field<Self>> {
        vec![
            Field::scalar("rp_name", |c: &mut Self| &mut c.rp_name),
            Field::optional("rp_id", |c: &mut Self| &mut c.rp_id),
            Field::optional("origin", |c: &mut Self| &mut c.origin),
        ]
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TotpAuthConfig {
    /// Seconds per code.
    pub interval: u32,
    pub digits: u8,
    pub hash: TotpHash,
    /// Accepted drift, in intervals either side of now.
    pub window: u32,
}

impl Default for TotpAuthConfig {
    fn default() -> Self {
        Self {
            interval: 30,
            digits: 6,
            hash: TotpHash::Sha1,
            window: 1,
        }
    }
}

impl Config for TotpAuthConfig {
    const NAME: &'static str = "TotpAuthConfig";

    fn fields() -> Vec<Field<Self>> {
        vec![
            Field::scalar("interval", |c: &mut Self| &mut c.interval),
            Field::scalar("digits", |c: &mut Self| &mut c.digits),
            Field::scalar("hash", |c: &mut Self| &mut c.hash),
            Field::scalar("window", |c: &mut Self| &mut c.window),
        ]
    }
}

#[derive(Clone, Default, PartialEq)]
pub struct OpenIdConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub discovery_url: Option<String>,
    pub authorization_endpoint: Option<String>,
    pub token_endpoint: Option<String>,
    pub user_info_endpoint: Option<String>,
    pub redirect_uri: Option<String>,
}

impl Config for OpenIdConfig {
    const NAME: &'static str = "OpenIdConfig";

    fn fields() -> Vec<Field<Self>> {
        vec![
            Field::optional("client_id", |c: &mut Self| &mut c.client_id),
            Field::optional("client_secret", |c: &mut Self| &mut c.client_secret),
            Field::optional("discovery_url", |c: &mut Self| &mut c.discovery_url),
            Field::optional("authorization_endpoint", |c: &mut Self| {
                &mut c.authorization_endpoint
            }),
            Field::optional("token_endpoint", |c: &mut Self| &mut c.token_endpoint),
            Field::optional("user_info_endpoint", |c: &mut Self| &mut c.user_info_endpoint),
            Field::optional("redirect_uri", |c: &mut Self| &mut c.redirect_uri),
        ]
    }
}

impl std::fmt::Debug for OpenIdConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenIdConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("discovery_url", &self.discovery_url)
            .field("authorization_endpoint", &self.authorization_endpoint)
            .field("token_endpoint", &self.token_endpoint)
            .field("user_info_endpoint", &self.user_info_endpoint)
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AuthConfig {
    pub types: Vec<AuthType>,
    /// Mail settings for email verification codes, if they differ from
    /// the server-wide ones.
    pub email: Option<EmailConfig>,
    pub webauthn: Option<WebAuthnConfig>,
    pub totp: Option<TotpAuthConfig>,
    pub openid: Option<OpenIdConfig>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            types: vec![AuthType::Email, AuthType::Totp],
            email: None,
            webauthn: None,
            totp: None,
            openid: None,
        }
    }
}

impl AuthConfig {
    pub fn is_enabled(&self, auth_type: AuthType) -> bool {
        self.types.contains(&auth_type)
    }

    /// Fail if an enabled method cannot work without a section that is
    /// missing. Other methods fall back to their defaults.
    pub fn check(&self) -> ConfigResult<()> {
        if !self.is_enabled(AuthType::OpenId) {
            return Ok(());
        }
        let Some(openid) = &self.openid else {
            return Err(ConfigError::MissingSection {
                key: "auth.openid".into(),
                backend: AuthType::OpenId.to_string(),
            });
        };
        if openid.client_id.as_deref().map_or(true, str::is_empty) {
            return Err(ConfigError::MissingField {
                key: "auth.openid.client_id".into(),
            });
        }
        Ok(())
    }
}

impl Config for AuthConfig {
    const NAME: &'static str = "AuthConfig";

    fn fields() -> Vec<Field<Self>> {
        vec![
            Field::scalar("types", |c: &mut Self| &mut c.types),
            Field::optional_nested("email", |c: &mut Self| &mut c.email),
            Field::optional_nested("webauthn", |c: &mut Self| &mut c.webauthn),
            Field::optional_nested("totp", |c: &mut Self| &mut c.totp),
            Field::optional_nested("openid", |c: &mut Self| &mut c.openid),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lbx_config::Namespace;

    fn load(pairs: &[(&str, &str)]) -> ConfigResult<AuthConfig> {
        AuthConfig::from_env(&Namespace::from_pairs(pairs.iter().copied()), "AUTH_")
    }

    #[test]
    fn defaults_enable_email_and_totp() {
        let config = load(&[]).unwrap();
        assert_eq!(config.types, vec![AuthType::Email, AuthType::Totp]);
        assert!(config.totp.is_none());
        config.check().unwrap();
    }

    #[test]
    fn types_from_list() {
        let config = load(&[("AUTH_TYPES", "email, webauthn_platform")]).unwrap();
        assert_eq!(config.types, vec![AuthType::Email, AuthType::WebAuthnPlatform]);
    }

    #[test]
    fn unknown_type_rejected() {
        let err = load(&[("AUTH_TYPES", "email,sms")]).unwrap_err();
        assert_eq!(err.key(), "types");
        assert!(matches!(err, ConfigError::Coerce { .. }));
    }

    #[test]
    fn totp_section_from_single_leaf() {
        let config = load(&[("AUTH_TOTP_DIGITS", "8")]).unwrap();
        let totp = config.totp.unwrap();
        assert_eq!(totp.digits, 8);
        assert_eq!(totp.interval, 30);
        assert_eq!(totp.hash, TotpHash::Sha1);
    }

    #[test]
    fn openid_requires_section_and_client() {
        let err = load(&[("AUTH_TYPES", "openid")]).unwrap().check().unwrap_err();
        assert!(matches!(err, ConfigError::MissingSection { .. }));

        let config = load(&[
            ("AUTH_TYPES", "openid"),
            ("AUTH_OPENID_DISCOVERY_URL", "https://id.example.com"),
        ])
        .unwrap();
        let err = config.check().unwrap_err();
        assert_eq!(err.key(), "auth.openid.client_id");

        let config = load(&[
            ("AUTH_TYPES", "openid"),
            ("AUTH_OPENID_CLIENT_ID", "lockbox"),
        ])
        .unwrap();
        config.check().unwrap();
    }

    #[test]
    fn openid_secret_redacted() {
        let config = OpenIdConfig {
            client_secret: Some("hunter2".into()),
            ..Default::default()
        };
        assert!(!format!("{config:?}").contains("hunter2"));
    }
}
