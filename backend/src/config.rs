//! Service configuration loaded via OrthoConfig.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::MembershipChangeConfig;

/// Configuration values for the segment membership service.
///
/// Values come from CLI flags, `SEGMENTS_*` environment variables, or a
/// config file, in OrthoConfig's usual precedence.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "SEGMENTS")]
pub struct SegmentsSettings {
    /// PostgreSQL connection URL. Storage is kept in memory when absent.
    pub database_url: Option<String>,
    /// Seconds between expiry sweeps.
    #[ortho_config(default = 60)]
    pub sweep_interval_secs: u64,
    /// Wall-clock budget for one expiry sweep, in seconds.
    #[ortho_config(default = 10)]
    pub sweep_timeout_secs: u64,
    /// Wall-clock budget for one membership batch, in seconds.
    #[ortho_config(default = 10)]
    pub batch_timeout_secs: u64,
    /// Maximum batch items touching storage at once.
    #[ortho_config(default = 64)]
    pub max_concurrent_changes: usize,
    /// Maximum pooled database connections.
    #[ortho_config(default = 10)]
    pub pool_max_size: u32,
}

impl SegmentsSettings {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }

    pub fn sweep_timeout(&self) -> Duration {
        Duration::from_secs(self.sweep_timeout_secs.max(1))
    }

    /// Batch limits for the membership change orchestrator.
    pub fn change_config(&self) -> MembershipChangeConfig {
        MembershipChangeConfig {
            max_concurrent_changes: self.max_concurrent_changes.max(1),
            batch_timeout: Duration::from_secs(self.batch_timeout_secs.max(1)),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for service configuration parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 6] = [
        "SEGMENTS_DATABASE_URL",
        "SEGMENTS_SWEEP_INTERVAL_SECS",
        "SEGMENTS_SWEEP_TIMEOUT_SECS",
        "SEGMENTS_BATCH_TIMEOUT_SECS",
        "SEGMENTS_MAX_CONCURRENT_CHANGES",
        "SEGMENTS_POOL_MAX_SIZE",
    ];

    fn load_from_empty_args() -> SegmentsSettings {
        SegmentsSettings::load_from_iter([OsString::from("segments")])
            .expect("config should load")
    }

    #[rstest]
    fn default_values_are_used_when_missing() {
        let _guard = lock_env(VARS.map(|name| (name, None::<String>)));

        let settings = load_from_empty_args();
        assert!(settings.database_url.is_none());
        assert_eq!(settings.sweep_interval(), Duration::from_secs(60));
        assert_eq!(settings.sweep_timeout(), Duration::from_secs(10));
        assert_eq!(settings.change_config(), MembershipChangeConfig::default());
        assert_eq!(settings.pool_max_size, 10);
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            (
                "SEGMENTS_DATABASE_URL",
                Some("postgres://segments@localhost/segments".to_owned()),
            ),
            ("SEGMENTS_SWEEP_INTERVAL_SECS", Some("5".to_owned())),
            ("SEGMENTS_SWEEP_TIMEOUT_SECS", Some("2".to_owned())),
            ("SEGMENTS_BATCH_TIMEOUT_SECS", Some("3".to_owned())),
            ("SEGMENTS_MAX_CONCURRENT_CHANGES", Some("8".to_owned())),
            ("SEGMENTS_POOL_MAX_SIZE", Some("4".to_owned())),
        ]);

        let settings = load_from_empty_args();
        assert_eq!(
            settings.database_url.as_deref(),
            Some("postgres://segments@localhost/segments")
        );
        assert_eq!(settings.sweep_interval(), Duration::from_secs(5));
        assert_eq!(settings.sweep_timeout(), Duration::from_secs(2));
        assert_eq!(
            settings.change_config(),
            MembershipChangeConfig {
                max_concurrent_changes: 8,
                batch_timeout: Duration::from_secs(3),
            }
        );
        assert_eq!(settings.pool_max_size, 4);
    }

    #[rstest]
    fn zero_limits_are_clamped() {
        let _guard = lock_env([
            ("SEGMENTS_SWEEP_INTERVAL_SECS", Some("0".to_owned())),
            ("SEGMENTS_MAX_CONCURRENT_CHANGES", Some("0".to_owned())),
        ]);

        let settings = load_from_empty_args();
        assert_eq!(settings.sweep_interval(), Duration::from_secs(1));
        assert_eq!(settings.change_config().max_concurrent_changes, 1);
    }
}
