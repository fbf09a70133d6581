//! Process-wide relay configuration.
//!
//! Everything is read from the environment once at startup. Provider
//! credentials are optional here and checked per request, so a deployment
//! that is missing one still boots and reports the gap to its callers.

use envconfig::Envconfig;

#[derive(Envconfig, Clone, Debug, Default)]
pub struct RelayConfig {
    /// Bearer secret shared with the calling agent platform.
    #[envconfig(from = "RETELL_FUNCTION_SECRET")]
    pub function_secret: Option<String>,

    #[envconfig(from = "TWILIO_ACCOUNT_SID")]
    pub twilio_account_sid: Option<String>,

    #[envconfig(from = "TWILIO_AUTH_TOKEN")]
    pub twilio_auth_token: Option<String>,

    /// Explicit sender number, used only when no messaging service is set.
    #[envconfig(from = "TWILIO_FROM_NUMBER")]
    pub twilio_from_number: Option<String>,

    #[envconfig(from = "TWILIO_MESSAGING_SID")]
    pub twilio_messaging_sid: Option<String>,

    #[envconfig(from = "TWILIO_STATUS_CALLBACK_URL")]
    pub twilio_status_callback_url: Option<String>,

    #[envconfig(from = "TWILIO_API_BASE_URL", default = "https://api.twilio.com")]
    pub twilio_api_base_url: String,

    #[envconfig(from = "SMS_RELAY_HOST", default = "0.0.0.0")]
    pub host: String,

    #[envconfig(from = "SMS_RELAY_PORT", default = "3000")]
    pub port: u16,

    #[envconfig(from = "SMS_RELAY_CORS_PERMISSIVE", default = "false")]
    pub cors_permissive: bool,
}

/// Where a sent message is attributed from on the provider side.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Sender {
    MessagingService(String),
    FromNumber(String),
}

/// Provider credentials that passed the presence check.
#[derive(Clone, Debug)]
pub struct TwilioCredentials {
    pub account_sid: String,
    pub auth_token: String,
    pub sender: Sender,
    pub status_callback: Option<String>,
}

/// Treats unset and empty variables alike. Values are used exactly as given.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl RelayConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn function_secret(&self) -> Option<&str> {
        present(&self.function_secret)
    }

    /// Resolves the Twilio credentials, or names every missing variable.
    ///
    /// A messaging service wins over a sender number when both are set.
    pub fn twilio_credentials(&self) -> Result<TwilioCredentials, String> {
        let account_sid = present(&self.twilio_account_sid);
        let auth_token = present(&self.twilio_auth_token);
        let sender = present(&self.twilio_messaging_sid)
            .map(|sid| Sender::MessagingService(sid.to_string()))
            .or_else(|| {
                present(&self.twilio_from_number).map(|n| Sender::FromNumber(n.to_string()))
            });

        match (account_sid, auth_token, sender) {
            (Some(account_sid), Some(auth_token), Some(sender)) => Ok(TwilioCredentials {
                account_sid: account_sid.to_string(),
                auth_token: auth_token.to_string(),
                sender,
                status_callback: present(&self.twilio_status_callback_url).map(str::to_string),
            }),
            (account_sid, auth_token, sender) => {
                let mut missing = Vec::new();
                if account_sid.is_none() {
                    missing.push("TWILIO_ACCOUNT_SID");
                }
                if auth_token.is_none() {
                    missing.push("TWILIO_AUTH_TOKEN");
                }
                if sender.is_none() {
                    missing.push("TWILIO_FROM_NUMBER or TWILIO_MESSAGING_SID");
                }
                Err(format!(
                    "Missing Twilio configuration: {} (need ACCOUNT_SID, AUTH_TOKEN and FROM_NUMBER or MESSAGING_SID)",
                    missing.join(", ")
                ))
            }
        }
    }
}
