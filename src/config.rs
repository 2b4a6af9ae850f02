//! Configuration system using a YAML defaults file.
//!
//! The file lives in the OS-standard config directory:
//! - Windows: %APPDATA%\mp3repair\defaults.yaml
//! - macOS: ~/Library/Application Support/mp3repair/defaults.yaml
//! - Linux: ~/.config/mp3repair/defaults.yaml
//!
//! Its top level maps a section name (`common` or a command name) to a
//! mapping of flag name to default value. Values are decoded per flag, so a
//! bad value only breaks the command that reads its section. Unknown
//! sections and keys are reported as warnings and otherwise ignored.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_yaml::{Mapping, Value};

use crate::dirty::DIRTY_FILE_NAME;

const APP_DIR_NAME: &str = "mp3repair";
const CONFIG_FILE_NAME: &str = "defaults.yaml";
const CONFIG_BACKUP_NAME: &str = "defaults-backup.yaml";

pub const COMMON: &str = "common";
pub const LIST: &str = "list";
pub const CHECK: &str = "check";
pub const REPAIR: &str = "repair";
pub const RESET_DATABASE: &str = "resetDatabase";
pub const EXPORT: &str = "export";
pub const COMMAND: &str = "command";

/// Every recognized section and its keys.
const KNOWN_KEYS: &[(&str, &[&str])] = &[
    (COMMON, &["topDir", "ext", "artistFilter", "albumFilter"]),
    (
        LIST,
        &[
            "includeArtists",
            "includeAlbums",
            "includeTracks",
            "annotate",
            "details",
            "diagnostic",
            "sort",
        ],
    ),
    (CHECK, &["empty", "gaps", "integrity"]),
    (REPAIR, &["dryRun"]),
    (
        RESET_DATABASE,
        &["service", "timeout", "metadata", "extension", "force"],
    ),
    (EXPORT, &["defaults", "overwrite"]),
    (COMMAND, &["default"]),
];

// ============================================================================
// Application Paths
// ============================================================================

/// Where the application keeps its files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    config_dir: PathBuf,
    data_dir: PathBuf,
}

impl AppPaths {
    /// Standard per-user locations.
    pub fn discover() -> Result<Self, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        let data_dir = dirs::data_local_dir().ok_or(ConfigError::NoDataDir)?;
        Ok(Self {
            config_dir: config_dir.join(APP_DIR_NAME),
            data_dir: data_dir.join(APP_DIR_NAME),
        })
    }

    /// Paths below an arbitrary root.
    pub fn rooted(root: &Path) -> Self {
        Self {
            config_dir: root.join("config"),
            data_dir: root.join("data"),
        }
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE_NAME)
    }

    /// Where `export -overwrite` moves the previous configuration file.
    pub fn config_backup(&self) -> PathBuf {
        self.config_dir.join(CONFIG_BACKUP_NAME)
    }

    pub fn dirty_marker(&self) -> PathBuf {
        self.data_dir.join(DIRTY_FILE_NAME)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}

// ============================================================================
// Raw Configuration
// ============================================================================

/// The parsed configuration file, before any value is decoded.
#[derive(Debug, Clone, Default)]
pub struct Configuration {
    sections: Mapping,
    warnings: Vec<String>,
}

impl Configuration {
    /// Load the file at `path`; a missing file is an empty configuration.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let contents =
            fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        let config = Self::parse(&contents).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Parse YAML text.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let value: Value =
            serde_yaml::from_str(contents).map_err(|source| ConfigError::Parse {
                path: PathBuf::new(),
                source,
            })?;
        let sections = match value {
            Value::Null => Mapping::new(),
            Value::Mapping(m) => m,
            _ => return Err(ConfigError::NotAMapping(String::from("top level"))),
        };

        let mut warnings = Vec::new();
        for (name, body) in &sections {
            let Some(name) = name.as_str() else {
                warnings.push(format!("ignoring non-text section name {:?}", name));
                continue;
            };
            let Some((_, keys)) = KNOWN_KEYS.iter().find(|(s, _)| *s == name) else {
                warnings.push(format!("ignoring unknown section {:?}", name));
                continue;
            };
            let Some(body) = body.as_mapping() else {
                if !body.is_null() {
                    return Err(ConfigError::NotAMapping(name.to_string()));
                }
                continue;
            };
            for key in body.keys() {
                match key.as_str() {
                    Some(k) if keys.contains(&k) => {}
                    _ => warnings.push(format!(
                        "ignoring unknown key {:?} in section {:?}",
                        key.as_str().unwrap_or("?"),
                        name
                    )),
                }
            }
        }
        for warning in &warnings {
            tracing::warn!("{}", warning);
        }
        Ok(Self { sections, warnings })
    }

    /// Problems found while loading that did not prevent it.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn section<'a>(&'a self, name: &'a str) -> Section<'a> {
        Section {
            name,
            values: self.sections.get(name).and_then(Value::as_mapping),
        }
    }
}

/// Inclusive bounds and default of an integer setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntBounds {
    pub min: i64,
    pub default: i64,
    pub max: i64,
}

impl IntBounds {
    pub fn clamp(&self, value: i64) -> i64 {
        value.clamp(self.min, self.max)
    }
}

/// Typed access to one section of the configuration.
#[derive(Debug, Clone, Copy)]
pub struct Section<'a> {
    name: &'a str,
    values: Option<&'a Mapping>,
}

impl Section<'_> {
    fn raw(&self, key: &str) -> Option<&Value> {
        self.values?.get(key)
    }

    fn invalid(&self, key: &str, expected: &'static str) -> ConfigError {
        ConfigError::InvalidValue {
            section: self.name.to_string(),
            key: key.to_string(),
            expected,
        }
    }

    pub fn bool(&self, key: &str, default: bool) -> Result<bool, ConfigError> {
        match self.raw(key) {
            None | Some(Value::Null) => Ok(default),
            Some(Value::Bool(b)) => Ok(*b),
            Some(_) => Err(self.invalid(key, "a boolean")),
        }
    }

    /// A text value with environment references expanded.
    pub fn string(&self, key: &str, default: &str) -> Result<String, ConfigError> {
        let raw = match self.raw(key) {
            None | Some(Value::Null) => return Ok(default.to_string()),
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(_) => return Err(self.invalid(key, "a string")),
        };
        expand_env(&raw, |name| std::env::var(name).ok()).map_err(|name| {
            ConfigError::UndefinedVariable {
                section: self.name.to_string(),
                key: key.to_string(),
                name,
            }
        })
    }

    /// An integer value clamped to `bounds`.
    pub fn int(&self, key: &str, bounds: IntBounds) -> Result<i64, ConfigError> {
        match self.raw(key) {
            None | Some(Value::Null) => Ok(bounds.default),
            Some(Value::Number(n)) => {
                let value = n.as_i64().ok_or_else(|| self.invalid(key, "an integer"))?;
                let clamped = bounds.clamp(value);
                if clamped != value {
                    tracing::warn!(
                        section = self.name,
                        key,
                        value,
                        clamped,
                        "configured value out of range"
                    );
                }
                Ok(clamped)
            }
            Some(_) => Err(self.invalid(key, "an integer")),
        }
    }
}

static ENV_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{(\w+)\}|\$(\w+)|%(\w+)%").expect("environment reference pattern compiles")
});

/// Expand `$VAR`, `${VAR}` and `%VAR%` references using `lookup`.
///
/// Returns the name of the first undefined variable as the error.
pub fn expand_env(
    text: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<String, String> {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in ENV_REFERENCE.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let Some(name) = caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3)) else {
            continue;
        };
        let value = lookup(name.as_str()).ok_or_else(|| name.as_str().to_string())?;
        out.push_str(&text[last..whole.start()]);
        out.push_str(&value);
        last = whole.end();
    }
    out.push_str(&text[last..]);
    Ok(out)
}

// ============================================================================
// Typed Defaults
// ============================================================================

/// Flags shared by every command that reads the library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonDefaults {
    pub top_dir: String,
    pub ext: String,
    pub artist_filter: String,
    pub album_filter: String,
}

impl CommonDefaults {
    pub fn builtin() -> Self {
        let top_dir = dirs::audio_dir()
            .or_else(|| dirs::home_dir().map(|h| h.join("Music")))
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            top_dir: top_dir.to_string_lossy().into_owned(),
            ext: ".mp3".into(),
            artist_filter: ".*".into(),
            album_filter: ".*".into(),
        }
    }

    pub fn load(config: &Configuration) -> Result<Self, ConfigError> {
        let s = config.section(COMMON);
        let d = Self::builtin();
        Ok(Self {
            top_dir: s.string("topDir", &d.top_dir)?,
            ext: s.string("ext", &d.ext)?,
            artist_filter: s.string("artistFilter", &d.artist_filter)?,
            album_filter: s.string("albumFilter", &d.album_filter)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDefaults {
    pub include_artists: bool,
    pub include_albums: bool,
    pub include_tracks: bool,
    pub annotate: bool,
    pub details: bool,
    pub diagnostic: bool,
    pub sort: String,
}

impl ListDefaults {
    pub fn builtin() -> Self {
        Self {
            include_artists: true,
            include_albums: true,
            include_tracks: false,
            annotate: false,
            details: false,
            diagnostic: false,
            sort: "numeric".into(),
        }
    }

    pub fn load(config: &Configuration) -> Result<Self, ConfigError> {
        let s = config.section(LIST);
        let d = Self::builtin();
        Ok(Self {
            include_artists: s.bool("includeArtists", d.include_artists)?,
            include_albums: s.bool("includeAlbums", d.include_albums)?,
            include_tracks: s.bool("includeTracks", d.include_tracks)?,
            annotate: s.bool("annotate", d.annotate)?,
            details: s.bool("details", d.details)?,
            diagnostic: s.bool("diagnostic", d.diagnostic)?,
            sort: s.string("sort", &d.sort)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckDefaults {
    pub empty: bool,
    pub gaps: bool,
    pub integrity: bool,
}

impl CheckDefaults {
    pub fn builtin() -> Self {
        Self {
            empty: false,
            gaps: false,
            integrity: true,
        }
    }

    pub fn load(config: &Configuration) -> Result<Self, ConfigError> {
        let s = config.section(CHECK);
        let d = Self::builtin();
        Ok(Self {
            empty: s.bool("empty", d.empty)?,
            gaps: s.bool("gaps", d.gaps)?,
            integrity: s.bool("integrity", d.integrity)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairDefaults {
    pub dry_run: bool,
}

impl RepairDefaults {
    pub fn builtin() -> Self {
        Self { dry_run: false }
    }

    pub fn load(config: &Configuration) -> Result<Self, ConfigError> {
        let s = config.section(REPAIR);
        Ok(Self {
            dry_run: s.bool("dryRun", Self::builtin().dry_run)?,
        })
    }
}

/// Bounds of the service stop timeout, in seconds.
pub const TIMEOUT_BOUNDS: IntBounds = IntBounds {
    min: 1,
    default: 10,
    max: 60,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResetDatabaseDefaults {
    pub service: String,
    pub timeout: u64,
    pub metadata: String,
    pub extension: String,
    pub force: bool,
}

impl ResetDatabaseDefaults {
    pub fn builtin() -> Self {
        let metadata = dirs::data_local_dir()
            .unwrap_or_default()
            .join("Microsoft")
            .join("Media Player");
        Self {
            service: "WMPNetworkSVC".into(),
            timeout: TIMEOUT_BOUNDS.default as u64,
            metadata: metadata.to_string_lossy().into_owned(),
            extension: ".wmdb".into(),
            force: false,
        }
    }

    pub fn load(config: &Configuration) -> Result<Self, ConfigError> {
        let s = config.section(RESET_DATABASE);
        let d = Self::builtin();
        Ok(Self {
            service: s.string("service", &d.service)?,
            timeout: s.int("timeout", TIMEOUT_BOUNDS)? as u64,
            metadata: s.string("metadata", &d.metadata)?,
            extension: s.string("extension", &d.extension)?,
            force: s.bool("force", d.force)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportDefaults {
    pub defaults: bool,
    pub overwrite: bool,
}

impl ExportDefaults {
    pub fn builtin() -> Self {
        Self {
            defaults: false,
            overwrite: false,
        }
    }

    pub fn load(config: &Configuration) -> Result<Self, ConfigError> {
        let s = config.section(EXPORT);
        let d = Self::builtin();
        Ok(Self {
            defaults: s.bool("defaults", d.defaults)?,
            overwrite: s.bool("overwrite", d.overwrite)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandDefaults {
    pub default: String,
}

impl CommandDefaults {
    pub fn builtin() -> Self {
        Self {
            default: LIST.into(),
        }
    }

    pub fn load(config: &Configuration) -> Result<Self, ConfigError> {
        let s = config.section(COMMAND);
        Ok(Self {
            default: s.string("default", &Self::builtin().default)?,
        })
    }
}

/// Every section's defaults, as written by `export -defaults`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Defaults {
    pub common: CommonDefaults,
    pub list: ListDefaults,
    pub check: CheckDefaults,
    pub repair: RepairDefaults,
    pub reset_database: ResetDatabaseDefaults,
    pub export: ExportDefaults,
    pub command: CommandDefaults,
}

impl Defaults {
    pub fn builtin() -> Self {
        Self {
            common: CommonDefaults::builtin(),
            list: ListDefaults::builtin(),
            check: CheckDefaults::builtin(),
            repair: RepairDefaults::builtin(),
            reset_database: ResetDatabaseDefaults::builtin(),
            export: ExportDefaults::builtin(),
            command: CommandDefaults::builtin(),
        }
    }

    /// Effective defaults: configured values over built-in ones.
    pub fn load(config: &Configuration) -> Result<Self, ConfigError> {
        Ok(Self {
            common: CommonDefaults::load(config)?,
            list: ListDefaults::load(config)?,
            check: CheckDefaults::load(config)?,
            repair: RepairDefaults::load(config)?,
            reset_database: ResetDatabaseDefaults::load(config)?,
            export: ExportDefaults::load(config)?,
            command: CommandDefaults::load(config)?,
        })
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(ConfigError::Serialize)
    }
}

// ============================================================================
// Config File Operations
// ============================================================================

/// Write `defaults` to `path`.
///
/// Creates the directory if needed and writes atomically (temp, then
/// rename).
pub fn save(defaults: &Defaults, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|e| ConfigError::CreateDir(dir.to_path_buf(), e))?;
    }
    let contents = defaults.to_yaml()?;

    let temp_path = path.with_extension("yaml.tmp");
    fs::write(&temp_path, &contents).map_err(|e| ConfigError::Write(temp_path.clone(), e))?;
    fs::rename(&temp_path, path)
        .map_err(|e| ConfigError::Rename(temp_path, path.to_path_buf(), e))?;

    tracing::info!("Saved config to {:?}", path);
    Ok(())
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Could not determine local data directory")]
    NoDataDir,

    #[error("Failed to read config file {0}: {1}")]
    Read(PathBuf, std::io::Error),

    #[error("invalid content in configuration file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid content in configuration file: {0} is not a mapping")]
    NotAMapping(String),

    #[error("invalid content in configuration file: section {section:?} key {key:?} must be {expected}")]
    InvalidValue {
        section: String,
        key: String,
        expected: &'static str,
    },

    #[error("invalid content in configuration file: section {section:?} key {key:?} refers to undefined variable {name:?}")]
    UndefinedVariable {
        section: String,
        key: String,
        name: String,
    },

    #[error("Failed to create config directory {0}: {1}")]
    CreateDir(PathBuf, std::io::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(serde_yaml::Error),

    #[error("Failed to write config to {0}: {1}")]
    Write(PathBuf, std::io::Error),

    #[error("Failed to rename temp file {0} to {1}: {2}")]
    Rename(PathBuf, PathBuf, std::io::Error),
}

// ============================================================================
// Tests
// ============================================================================
