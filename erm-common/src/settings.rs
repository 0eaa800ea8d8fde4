//! Runtime engine settings
//!
//! Thresholds and the shadow-mode flag live outside the process binary so
//! operators can change them without a restart:
//! - [`SettingsSource`] loads a fresh [`EngineSettings`] snapshot
//! - [`SettingsHandle`] is the shared, reloadable copy every component reads
//!
//! # Settings Sources
//!
//! - [`StaticSettings`]: fixed values (tests, embedded use)
//! - [`SqliteSettings`]: `settings` table; missing keys are initialized with
//!   built-in defaults and written back

use crate::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Confidence at or above which a suggestion is tier B
pub const HIGH_TIER_FLOOR: u8 = 85;

/// Default review threshold (tier C floor)
pub const DEFAULT_REVIEW_THRESHOLD: u8 = 70;

/// Default display floor (suggestions below are computed but hidden)
pub const DEFAULT_DISPLAY_FLOOR: u8 = 40;

/// Default upper bound for the shadow (new engine) path
pub const DEFAULT_SHADOW_TIMEOUT_MS: u64 = 2_000;

const KEY_REVIEW_THRESHOLD: &str = "review_threshold";
const KEY_DISPLAY_FLOOR: &str = "display_floor";
const KEY_SHADOW_ENABLED: &str = "shadow_enabled";
const KEY_SHADOW_TIMEOUT_MS: &str = "shadow_timeout_ms";

/// Runtime settings snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Tier C floor; below it suggestions are tier D
    pub review_threshold: u8,
    /// Suggestions below this confidence are not surfaced
    pub display_floor: u8,
    /// Run the new engine path alongside the legacy path
    pub shadow_enabled: bool,
    /// Upper bound for one shadow execution of the new engine path
    pub shadow_timeout_ms: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            review_threshold: DEFAULT_REVIEW_THRESHOLD,
            display_floor: DEFAULT_DISPLAY_FLOOR,
            shadow_enabled: true,
            shadow_timeout_ms: DEFAULT_SHADOW_TIMEOUT_MS,
        }
    }
}

impl EngineSettings {
    /// Bring out-of-range values back into their valid ranges
    ///
    /// A review threshold above the tier B floor would make tier C empty, so
    /// it is clamped to [`HIGH_TIER_FLOOR`].
    pub fn validated(mut self) -> Self {
        if self.review_threshold > HIGH_TIER_FLOOR {
            warn!(
                review_threshold = self.review_threshold,
                "review_threshold above {}, clamping",
                HIGH_TIER_FLOOR
            );
            self.review_threshold = HIGH_TIER_FLOOR;
        }
        if self.display_floor > 100 {
            warn!(display_floor = self.display_floor, "display_floor above 100, clamping");
            self.display_floor = 100;
        }
        if self.shadow_timeout_ms == 0 {
            warn!("shadow_timeout_ms of 0 would cancel every shadow run, using default");
            self.shadow_timeout_ms = DEFAULT_SHADOW_TIMEOUT_MS;
        }
        self
    }
}

/// Source of runtime settings
#[async_trait]
pub trait SettingsSource: Send + Sync {
    /// Load a fresh settings snapshot
    async fn load(&self) -> Result<EngineSettings>;
}

/// Fixed settings
#[derive(Debug, Clone, Default)]
pub struct StaticSettings(pub EngineSettings);

#[async_trait]
impl SettingsSource for StaticSettings {
    async fn load(&self) -> Result<EngineSettings> {
        Ok(self.0)
    }
}

/// Settings stored in the SQLite `settings` table
#[derive(Debug, Clone)]
pub struct SqliteSettings {
    pool: SqlitePool,
}

impl SqliteSettings {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Persist all values of a settings snapshot
    pub async fn save(&self, settings: &EngineSettings) -> Result<()> {
        let values = [
            (KEY_REVIEW_THRESHOLD, settings.review_threshold.to_string()),
            (KEY_DISPLAY_FLOOR, settings.display_floor.to_string()),
            (KEY_SHADOW_ENABLED, settings.shadow_enabled.to_string()),
            (KEY_SHADOW_TIMEOUT_MS, settings.shadow_timeout_ms.to_string()),
        ];
        for (key, value) in values {
            write_setting(&self.pool, key, &value).await?;
        }
        Ok(())
    }
}

async fn write_setting(pool: &SqlitePool, key: &str, value: &str) -> Result<()> {
    sqlx::query("INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)")
        .bind(key)
        .bind(value)
        .execute(pool)
        .await?;
    Ok(())
}

#[async_trait]
impl SettingsSource for SqliteSettings {
    /// For each setting:
    /// 1. Try to read from database
    /// 2. If missing, use built-in default
    /// 3. Write default back to database for consistency
    async fn load(&self) -> Result<EngineSettings> {
        async fn get_setting<T>(
            pool: &SqlitePool,
            key: &str,
            default: T,
            parse: fn(&str) -> Result<T>,
        ) -> Result<T>
        where
            T: ToString,
        {
            let value_opt: Option<(String,)> =
                sqlx::query_as("SELECT value FROM settings WHERE key = ?")
                    .bind(key)
                    .fetch_optional(pool)
                    .await?;

            match value_opt {
                Some((value,)) => parse(value.trim()),
                None => {
                    info!("Setting '{}' not found in database, using default: {}", key, default.to_string());
                    write_setting(pool, key, &default.to_string()).await?;
                    Ok(default)
                }
            }
        }

        let parse_u8 = |s: &str| {
            s.parse::<u8>()
                .map_err(|e| Error::Config(format!("Invalid u8 '{}': {}", s, e)))
        };
        let parse_u64 = |s: &str| {
            s.parse::<u64>()
                .map_err(|e| Error::Config(format!("Invalid u64 '{}': {}", s, e)))
        };
        let parse_bool = |s: &str| match s.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            other => Err(Error::Config(format!("Invalid bool '{}'", other))),
        };

        let defaults = EngineSettings::default();
        let settings = EngineSettings {
            review_threshold: get_setting(&self.pool, KEY_REVIEW_THRESHOLD, defaults.review_threshold, parse_u8).await?,
            display_floor: get_setting(&self.pool, KEY_DISPLAY_FLOOR, defaults.display_floor, parse_u8).await?,
            shadow_enabled: get_setting(&self.pool, KEY_SHADOW_ENABLED, defaults.shadow_enabled, parse_bool).await?,
            shadow_timeout_ms: get_setting(&self.pool, KEY_SHADOW_TIMEOUT_MS, defaults.shadow_timeout_ms, parse_u64).await?,
        };

        Ok(settings.validated())
    }
}

/// Shared, reloadable settings
///
/// Cloning the handle shares the underlying snapshot.
#[derive(Debug, Clone, Default)]
pub struct SettingsHandle {
    inner: Arc<RwLock<EngineSettings>>,
}

impl SettingsHandle {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(settings.validated())),
        }
    }

    /// Current settings snapshot
    pub async fn snapshot(&self) -> EngineSettings {
        *self.inner.read().await
    }

    /// Replace settings with a fresh load from `source`
    ///
    /// On failure the previous snapshot stays in effect.
    pub async fn reload(&self, source: &dyn SettingsSource) -> Result<EngineSettings> {
        let fresh = source.load().await?.validated();
        *self.inner.write().await = fresh;
        info!(
            review_threshold = fresh.review_threshold,
            display_floor = fresh.display_floor,
            shadow_enabled = fresh.shadow_enabled,
            "Engine settings reloaded"
        );
        Ok(fresh)
    }

    /// Toggle shadow mode in place
    pub async fn set_shadow_enabled(&self, enabled: bool) {
        self.inner.write().await.shadow_enabled = enabled;
        info!(shadow_enabled = enabled, "Shadow mode toggled");
    }
}
