//! Configuration vault – reads/writes `~/.navgraph/config.toml`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use navgraph_geometry::Viewport;

/// Persisted user configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding `<name>_graph.json` documents.
    #[serde(default = "default_graph_dir")]
    pub graph_dir: PathBuf,

    /// Plan projection viewport, in pixels.
    #[serde(default = "default_viewport_width")]
    pub viewport_width: u32,
    #[serde(default = "default_viewport_height")]
    pub viewport_height: u32,

    /// Level a fresh recording session starts on.
    #[serde(default)]
    pub default_level: i32,

    /// Save the graph after every finished hallway.
    #[serde(default = "default_autosave")]
    pub autosave: bool,
}

fn home_dir() -> String {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string())
}

fn default_graph_dir() -> PathBuf {
    PathBuf::from(home_dir()).join(".navgraph").join("graphs")
}
fn default_viewport_width() -> u32 {
    1080
}
fn default_viewport_height() -> u32 {
    1920
}
fn default_autosave() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            graph_dir: default_graph_dir(),
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            default_level: 0,
            autosave: default_autosave(),
        }
    }
}

impl Config {
    pub fn viewport(&self) -> Viewport {
        Viewport {
            width: self.viewport_width as f32,
            height: self.viewport_height as f32,
        }
    }
}

/// Return the path to `~/.navgraph/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(&home_dir())
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".navgraph").join("config.toml")
}

/// Load the config from disk with environment overrides applied. `None`
/// when the file does not exist yet.
pub fn load() -> Result<Option<Config>, String> {
    let mut cfg = load_from(&config_path())?;
    if let Some(cfg) = cfg.as_mut() {
        apply_env_overrides(cfg);
    }
    Ok(cfg)
}

pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let cfg: Config = toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    Ok(Some(cfg))
}

/// Apply `NAVGRAPH_*` environment overrides. Unparsable numbers are ignored.
///
/// | Variable | Config field |
/// |---|---|
/// | `NAVGRAPH_GRAPH_DIR` | `graph_dir` |
/// | `NAVGRAPH_VIEWPORT_WIDTH` | `viewport_width` |
/// | `NAVGRAPH_VIEWPORT_HEIGHT` | `viewport_height` |
/// | `NAVGRAPH_LEVEL` | `default_level` |
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("NAVGRAPH_GRAPH_DIR") {
        cfg.graph_dir = PathBuf::from(v);
    }
    if let Ok(v) = std::env::var("NAVGRAPH_VIEWPORT_WIDTH")
        && let Ok(w) = v.parse::<u32>()
    {
        cfg.viewport_width = w;
    }
    if let Ok(v) = std::env::var("NAVGRAPH_VIEWPORT_HEIGHT")
        && let Ok(h) = v.parse::<u32>()
    {
        cfg.viewport_height = h;
    }
    if let Ok(v) = std::env::var("NAVGRAPH_LEVEL")
        && let Ok(level) = v.parse::<i32>()
    {
        cfg.default_level = level;
    }
}

/// Save the config, creating `~/.navgraph/` if necessary.
pub fn save(cfg: &Config) -> Result<(), String> {
    save_to(cfg, &config_path())
}

pub(crate) fn save_to(cfg: &Config, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| format!("Failed to create config directory: {}", e))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))
                .map_err(|e| format!("Failed to set config directory permissions: {}", e))?;
        }
    }
    let raw = toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| {
                use std::io::Write;
                f.write_all(raw.as_bytes())
            })
            .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw).map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_config() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        let cfg = Config {
            graph_dir: dir.path().join("graphs"),
            viewport_width: 800,
            viewport_height: 600,
            default_level: -1,
            autosave: false,
        };
        save_to(&cfg, &path).expect("save");

        let loaded = load_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "autosave = false\n").expect("write");

        let loaded = load_from(&path).expect("load ok").expect("some");
        assert!(!loaded.autosave);
        assert_eq!(loaded.viewport_width, 1080);
        assert_eq!(loaded.viewport_height, 1920);
        assert_eq!(loaded.default_level, 0);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "viewport_width = \"wide\"\n").expect("write");
        assert!(load_from(&path).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn config_file_has_restrictive_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        save_to(&Config::default(), &path).expect("save");

        let file_mode = std::fs::metadata(&path).expect("meta").permissions().mode() & 0o777;
        assert_eq!(file_mode, 0o600);
        let dir_mode = std::fs::metadata(path.parent().unwrap())
            .expect("meta")
            .permissions()
            .mode()
            & 0o777;
        assert_eq!(dir_mode, 0o700);
    }

    #[test]
    fn load_from_returns_none_when_missing() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        assert!(load_from(&path).expect("no error").is_none());
    }

    #[test]
    fn config_path_points_to_navgraph_dir() {
        let p = config_path_for_home("/home/surveyor");
        assert_eq!(p, PathBuf::from("/home/surveyor/.navgraph/config.toml"));
    }

    // Env-var tests share one function so they never race each other.
    #[test]
    fn env_overrides() {
        // SAFETY: only this test touches NAVGRAPH_* variables.
        unsafe {
            std::env::set_var("NAVGRAPH_GRAPH_DIR", "/srv/graphs");
            std::env::set_var("NAVGRAPH_VIEWPORT_WIDTH", "640");
            std::env::set_var("NAVGRAPH_VIEWPORT_HEIGHT", "tall");
            std::env::set_var("NAVGRAPH_LEVEL", "-2");
        }
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.graph_dir, PathBuf::from("/srv/graphs"));
        assert_eq!(cfg.viewport_width, 640);
        assert_eq!(cfg.viewport_height, 1920);
        assert_eq!(cfg.default_level, -2);
        unsafe {
            for var in [
                "NAVGRAPH_GRAPH_DIR",
                "NAVGRAPH_VIEWPORT_WIDTH",
                "NAVGRAPH_VIEWPORT_HEIGHT",
                "NAVGRAPH_LEVEL",
            ] {
                std::env::remove_var(var);
            }
        }
    }
}
