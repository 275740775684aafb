//! Global classbell configuration at ~/.config/classbell/config.toml

use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use config::{Config, File};
use serde::{Deserialize, Serialize};

use crate::error::{BellError, BellResult};
use crate::store::Store;

static DEFAULT_DATA_DIR: &str = "~/classbell";

fn default_data_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_DIR)
}

fn default_course_reminders() -> Vec<u32> {
    vec![10]
}

fn default_plan_days() -> u32 {
    2
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct BellConfig {
    /// Where courses.json, events.json and term.json live.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// IANA zone event times are interpreted in. Host zone when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,

    /// Minutes before each class to remind.
    #[serde(default = "default_course_reminders")]
    pub course_reminders: Vec<u32>,

    /// Days of classes (starting today) to plan triggers for.
    #[serde(default = "default_plan_days")]
    pub plan_days: u32,

    /// Show an ongoing notification while an event is in progress.
    #[serde(default = "default_true")]
    pub live_activity: bool,
}

impl Default for BellConfig {
    fn default() -> Self {
        BellConfig {
            data_dir: default_data_dir(),
            timezone: None,
            course_reminders: default_course_reminders(),
            plan_days: default_plan_days(),
            live_activity: true,
        }
    }
}

impl BellConfig {
    pub fn config_path() -> BellResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| BellError::Config("Could not determine config directory".into()))?
            .join("classbell");

        Ok(config_dir.join("config.toml"))
    }

    /// Load the global config, writing a commented-out default on first run.
    pub fn load() -> BellResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> BellResult<Self> {
        Config::builder()
            .add_source(File::from(path).required(false))
            .build()
            .map_err(|e| BellError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| BellError::Config(e.to_string()))
    }

    pub fn data_path(&self) -> PathBuf {
        let expanded = shellexpand::tilde(&self.data_dir.to_string_lossy()).into_owned();
        PathBuf::from(expanded)
    }

    pub fn store(&self) -> Store {
        Store::open(self.data_path())
    }

    /// Configured zone, else the host zone, else UTC.
    pub fn tz(&self) -> Tz {
        if let Some(name) = &self.timezone {
            match name.parse::<Tz>() {
                Ok(tz) => return tz,
                Err(e) => tracing::warn!(timezone = %name, error = %e, "Unknown timezone in config"),
            }
        }

        iana_time_zone::get_timezone()
            .ok()
            .and_then(|name| name.parse::<Tz>().ok())
            .unwrap_or(Tz::UTC)
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> BellResult<()> {
        let contents = format!(
            "\
# classbell configuration

# Where courses, events and the term are stored:
# data_dir = \"{}\"

# Timezone for event times (defaults to the system timezone):
# timezone = \"Asia/Shanghai\"

# Minutes before each class to remind:
# course_reminders = [10]

# Days of classes to plan ahead:
# plan_days = 2

# Ongoing notification while an event is in progress:
# live_activity = true
",
            DEFAULT_DATA_DIR
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                BellError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| BellError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}
