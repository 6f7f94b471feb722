use std::env;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use crate::controls::ControlRange;
use crate::fleet::{LayoutConfig, UnitDefaults};
use crate::model::Container;
use crate::packing::PackingConfig;
use crate::session::DEFAULT_FRAME_RATE;
use crate::unit::SmoothingConfig;

/// Complete application configuration, loaded from environment variables or default values.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub layout: LayoutSettings,
}

impl AppConfig {
    /// Creates a configuration from the currently available environment variables.
    pub fn from_env() -> Self {
        Self {
            api: ApiConfig::from_env(),
            layout: LayoutSettings::from_env(),
        }
    }
}

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    bind_ip: IpAddr,
    display_host: String,
    port: u16,
}

impl ApiConfig {
    const DEFAULT_HOST: &'static str = "0.0.0.0";
    const DEFAULT_PORT: u16 = 8080;
    const HOST_VAR: &'static str = "PALLET_LAYOUT_API_HOST";
    const PORT_VAR: &'static str = "PALLET_LAYOUT_API_PORT";

    fn from_env() -> Self {
        Self::from_values(env_string(Self::HOST_VAR), env_string(Self::PORT_VAR))
    }

    fn from_values(host: Option<String>, port: Option<String>) -> Self {
        let host_value = host.unwrap_or_else(|| Self::DEFAULT_HOST.to_string());
        let (bind_ip, effective_host) = match host_value.parse::<IpAddr>() {
            Ok(ip) => (ip, host_value),
            Err(err) => {
                tracing::warn!(
                    "⚠️ Could not parse {} ('{}'): {}. Using {}.",
                    Self::HOST_VAR,
                    host_value,
                    err,
                    Self::DEFAULT_HOST
                );
                (
                    IpAddr::V4(Ipv4Addr::UNSPECIFIED),
                    Self::DEFAULT_HOST.to_string(),
                )
            }
        };

        let port = match port {
            Some(raw) => match raw.parse::<u16>() {
                Ok(value) if value != 0 => value,
                Ok(_) => {
                    tracing::warn!(
                        "⚠️ {} must not be 0. Using {}.",
                        Self::PORT_VAR,
                        Self::DEFAULT_PORT
                    );
                    Self::DEFAULT_PORT
                }
                Err(err) => {
                    tracing::warn!(
                        "⚠️ Could not parse {} ('{}'): {}. Using {}.",
                        Self::PORT_VAR,
                        raw,
                        err,
                        Self::DEFAULT_PORT
                    );
                    Self::DEFAULT_PORT
                }
            },
            None => Self::DEFAULT_PORT,
        };

        Self {
            bind_ip,
            display_host: effective_host,
            port,
        }
    }

    /// Socket address to bind the server to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.port)
    }

    /// Visible hostname for logging and hints.
    pub fn display_host(&self) -> &str {
        &self.display_host
    }

    /// Configured port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Indicates whether binding to all interfaces.
    pub fn binds_to_all_interfaces(&self) -> bool {
        match self.bind_ip {
            IpAddr::V4(addr) => addr == Ipv4Addr::UNSPECIFIED,
            IpAddr::V6(addr) => addr == Ipv6Addr::UNSPECIFIED,
        }
    }

    /// Checks whether the hostname matches the default value.
    pub fn uses_default_host(&self) -> bool {
        self.display_host == Self::DEFAULT_HOST
    }
}

/// Trailer, fleet and frame loop settings.
#[derive(Clone, Debug)]
pub struct LayoutSettings {
    layout: LayoutConfig,
    frame_rate: f64,
}

impl LayoutSettings {
    const TRAILER_WIDTH_VAR: &'static str = "PALLET_LAYOUT_TRAILER_WIDTH";
    const TRAILER_LENGTH_VAR: &'static str = "PALLET_LAYOUT_TRAILER_LENGTH";
    const UNIT_COUNT_VAR: &'static str = "PALLET_LAYOUT_UNIT_COUNT";
    const UNIT_WIDTH_VAR: &'static str = "PALLET_LAYOUT_UNIT_WIDTH";
    const UNIT_LENGTH_VAR: &'static str = "PALLET_LAYOUT_UNIT_LENGTH";
    const UNIT_HEIGHT_VAR: &'static str = "PALLET_LAYOUT_UNIT_HEIGHT";
    const FRAME_RATE_VAR: &'static str = "PALLET_LAYOUT_FRAME_RATE";
    const PACKING_EPSILON_VAR: &'static str = "PALLET_LAYOUT_PACKING_EPSILON";
    const SMOOTHING_RATE_VAR: &'static str = "PALLET_LAYOUT_SMOOTHING_RATE";

    fn from_env() -> Self {
        let trailer_width = load_f64_with_warning(
            Self::TRAILER_WIDTH_VAR,
            Container::DEFAULT_WIDTH,
            |value| value > 0.0,
            "must be greater than 0",
            "Trailer width differs from the standard 2.5 m",
        );
        let trailer_length = load_f64_with_warning(
            Self::TRAILER_LENGTH_VAR,
            Container::DEFAULT_LENGTH,
            |value| value > 0.0,
            "must be greater than 0",
            "Trailer length differs from the standard 13.6 m",
        );
        let container = match Container::new(trailer_width, trailer_length) {
            Ok(container) => container,
            Err(err) => {
                tracing::warn!("⚠️ {}. Using the standard trailer.", err);
                Container::default()
            }
        };

        let defaults = UnitDefaults {
            width: load_unit_dimension(
                Self::UNIT_WIDTH_VAR,
                UnitDefaults::DEFAULT_WIDTH,
                ControlRange::UNIT_WIDTH,
            ),
            length: load_unit_dimension(
                Self::UNIT_LENGTH_VAR,
                UnitDefaults::DEFAULT_LENGTH,
                ControlRange::UNIT_LENGTH,
            ),
            height: load_unit_dimension(
                Self::UNIT_HEIGHT_VAR,
                UnitDefaults::DEFAULT_HEIGHT,
                ControlRange::UNIT_HEIGHT,
            ),
        };

        let initial_count = parse_count(
            Self::UNIT_COUNT_VAR,
            env_string(Self::UNIT_COUNT_VAR),
            LayoutConfig::DEFAULT_INITIAL_COUNT,
        );

        let general_epsilon = load_f64_with_warning(
            Self::PACKING_EPSILON_VAR,
            PackingConfig::DEFAULT_GENERAL_EPSILON,
            |value| value > 0.0 && value < 0.01,
            "must be between 0 and 0.01",
            "Adjusted tolerances may let units overhang the trailer",
        );

        let rate = load_f64_with_warning(
            Self::SMOOTHING_RATE_VAR,
            SmoothingConfig::DEFAULT_RATE,
            |value| value > 0.0,
            "must be greater than 0",
            "Adjusted smoothing rate changes how fast highlights fade",
        );

        let frame_rate = load_f64_with_warning(
            Self::FRAME_RATE_VAR,
            DEFAULT_FRAME_RATE,
            |value| (1.0..=240.0).contains(&value),
            "must be between 1 and 240",
            "Adjusted frame rate",
        );

        let layout = LayoutConfig {
            container,
            defaults,
            initial_count,
            packing: PackingConfig::builder()
                .general_epsilon(general_epsilon)
                .build(),
            smoothing: SmoothingConfig {
                color_rate: rate,
                lift_rate: rate,
                ..SmoothingConfig::default()
            },
        };

        Self { layout, frame_rate }
    }

    /// Configuration the fleet is built from.
    pub fn layout_config(&self) -> LayoutConfig {
        self.layout
    }

    /// Frames per second of the smoothing loop.
    pub fn frame_rate(&self) -> f64 {
        self.frame_rate
    }
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            layout: LayoutConfig::default(),
            frame_rate: DEFAULT_FRAME_RATE,
        }
    }
}

fn load_unit_dimension(var_name: &str, default: f64, range: ControlRange) -> f64 {
    load_f64_with_warning(
        var_name,
        default,
        |value| (range.min..=range.max).contains(&value),
        "must be within the panel range",
        "Unit dimension differs from the standard pallet",
    )
}

fn env_string(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_owned())
            }
        }
        Err(env::VarError::NotPresent) => None,
        Err(err) => {
            tracing::warn!(
                "⚠️ Access to {} failed: {}. Using default value.",
                name,
                err
            );
            None
        }
    }
}

fn parse_count(var_name: &str, raw: Option<String>, default: usize) -> usize {
    let Some(raw) = raw else {
        return default;
    };
    let range = ControlRange::UNIT_COUNT;
    match raw.parse::<usize>() {
        Ok(value) if (range.min..=range.max).contains(&(value as f64)) => value,
        Ok(value) => {
            tracing::warn!(
                "⚠️ {} contains invalid value '{}': must be between {} and {}. Using {}.",
                var_name,
                value,
                range.min,
                range.max,
                default
            );
            default
        }
        Err(err) => {
            tracing::warn!(
                "⚠️ Could not parse {} ('{}') as count: {}. Using {}.",
                var_name,
                raw,
                err,
                default
            );
            default
        }
    }
}

fn load_f64_with_warning(
    var_name: &str,
    default: f64,
    validator: impl Fn(f64) -> bool,
    invalid_hint: &str,
    warning: &str,
) -> f64 {
    parse_f64_with_warning(
        var_name,
        env_string(var_name),
        default,
        validator,
        invalid_hint,
        warning,
    )
}

fn parse_f64_with_warning(
    var_name: &str,
    raw: Option<String>,
    default: f64,
    validator: impl Fn(f64) -> bool,
    invalid_hint: &str,
    warning: &str,
) -> f64 {
    match raw {
        Some(raw) => match raw.parse::<f64>() {
            Ok(value) if value.is_finite() && validator(value) => {
                let tolerance = (default.abs().max(1.0)) * 1e-9;
                if (value - default).abs() > tolerance {
                    tracing::info!("⚠️ {} ({} = {}).", warning, var_name, value);
                }
                value
            }
            Ok(_) => {
                tracing::warn!(
                    "⚠️ {} contains invalid value '{}': {}. Using {}.",
                    var_name,
                    raw,
                    invalid_hint,
                    default
                );
                default
            }
            Err(err) => {
                tracing::warn!(
                    "⚠️ Could not parse {} ('{}') as number: {}. Using {}.",
                    var_name,
                    raw,
                    err,
                    default
                );
                default
            }
        },
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positive(value: f64) -> bool {
        value > 0.0
    }

    fn parse(raw: Option<&str>) -> f64 {
        parse_f64_with_warning(
            "TEST_VAR",
            raw.map(str::to_owned),
            2.5,
            positive,
            "must be greater than 0",
            "Test warning",
        )
    }

    #[test]
    fn test_parse_f64_accepts_valid_values() {
        assert_eq!(parse(Some("3.0")), 3.0);
        assert_eq!(parse(Some("2.5")), 2.5);
        assert_eq!(parse(Some("1e-3")), 0.001);
    }

    #[test]
    fn test_parse_f64_falls_back_to_default() {
        assert_eq!(parse(None), 2.5);
        assert_eq!(parse(Some("-1.0")), 2.5);
        assert_eq!(parse(Some("0")), 2.5);
        assert_eq!(parse(Some("wide")), 2.5);
        assert_eq!(parse(Some("NaN")), 2.5);
        assert_eq!(parse(Some("inf")), 2.5);
    }

    #[test]
    fn test_parse_count_respects_panel_range() {
        assert_eq!(parse_count("TEST_VAR", Some("12".into()), 2), 12);
        assert_eq!(parse_count("TEST_VAR", Some("100".into()), 2), 100);
        assert_eq!(parse_count("TEST_VAR", Some("0".into()), 2), 2);
        assert_eq!(parse_count("TEST_VAR", Some("101".into()), 2), 2);
        assert_eq!(parse_count("TEST_VAR", Some("-4".into()), 2), 2);
        assert_eq!(parse_count("TEST_VAR", Some("2.5".into()), 2), 2);
        assert_eq!(parse_count("TEST_VAR", None, 2), 2);
    }

    #[test]
    fn test_api_config_defaults() {
        let config = ApiConfig::from_values(None, None);
        assert_eq!(config.port(), 8080);
        assert!(config.binds_to_all_interfaces());
        assert!(config.uses_default_host());
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8080");
    }

    #[test]
    fn test_api_config_invalid_values_fall_back() {
        let config = ApiConfig::from_values(Some("not-an-ip".into()), Some("0".into()));
        assert_eq!(config.display_host(), "0.0.0.0");
        assert_eq!(config.port(), 8080);

        let config = ApiConfig::from_values(Some("127.0.0.1".into()), Some("9000".into()));
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:9000");
        assert!(!config.binds_to_all_interfaces());
        assert!(!config.uses_default_host());
    }

    #[test]
    fn test_layout_settings_default_matches_standard_trailer() {
        let settings = LayoutSettings::default();
        let layout = settings.layout_config();
        assert_eq!(layout.container, Container::default());
        assert_eq!(layout.initial_count, 2);
        assert_eq!(settings.frame_rate(), DEFAULT_FRAME_RATE);
    }
}
