use crate::errors::AppError;
use crate::jwt::JwtConfig;

/// Access guard behaviour shared by every handler.
#[derive(Debug, Clone, Copy)]
pub struct GuardConfig {
    /// Show a loading state (503) instead of the fallback while a session's
    /// first resolution is still in flight.
    pub show_loading_placeholder: bool,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            show_loading_placeholder: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub jwt: JwtConfig,
    pub guard: GuardConfig,
    /// Mounts the operator role override endpoints.
    pub role_override_enabled: bool,
}

impl AppConfig {
    pub fn new(jwt: JwtConfig) -> Self {
        Self {
            jwt,
            guard: GuardConfig::default(),
            role_override_enabled: false,
        }
    }

    pub fn with_role_override(mut self, enabled: bool) -> Self {
        self.role_override_enabled = enabled;
        self
    }

    pub fn from_env() -> Result<Self, AppError> {
        let jwt = JwtConfig::from_env()?;
        let show_loading_placeholder = env_flag("ROLE_GUARD_LOADING", true)?;
        let role_override_enabled = env_flag("ROLE_OVERRIDE_ENABLED", false)?;

        Ok(Self {
            jwt,
            guard: GuardConfig {
                show_loading_placeholder,
            },
            role_override_enabled,
        })
    }
}

fn env_flag(name: &str, default: bool) -> Result<bool, AppError> {
    match std::env::var(name) {
        Ok(value) => parse_flag(&value)
            .ok_or_else(|| AppError::configuration(format!("{name} must be true or false"))),
        Err(_) => Ok(default),
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
