use crate::models::{ConfigValue, RawConfig};
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::fs;

/// One panel definition file: a named, ordered list of raw control
/// configurations. Validation happens later, in the specifier builder -
/// a panel file that loads is not yet a panel that builds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelFile {
    pub panel: String,

    #[serde(default)]
    pub controls: Vec<RawConfig>,
}

/// Loader for YAML panel definition files.
///
/// Manages a directory of `<name>.yaml` files, one per panel. Load and save
/// round-trip through [`PanelFile`]; a missing file loads as a default
/// sample panel so a fresh installation has something to show.
#[derive(Debug, Clone)]
pub struct PanelLoader {
    panel_dir: Utf8PathBuf,
}

impl PanelLoader {
    /// Create a new PanelLoader rooted at the given directory.
    ///
    /// The directory is created if it doesn't exist.
    pub fn new<P: AsRef<Utf8Path>>(panel_dir: P) -> Result<Self> {
        let panel_dir = panel_dir.as_ref().to_path_buf();

        if !panel_dir.exists() {
            fs::create_dir_all(&panel_dir)
                .with_context(|| format!("Failed to create panel directory: {}", panel_dir))?;
        }

        Ok(Self { panel_dir })
    }

    /// Path of one panel's definition file.
    pub fn panel_path(&self, name: &str) -> Utf8PathBuf {
        self.panel_dir.join(format!("{}.yaml", name))
    }

    /// Load a panel definition.
    ///
    /// # Returns
    /// The loaded PanelFile, or a default sample panel if the file doesn't
    /// exist.
    pub fn load_panel(&self, name: &str) -> Result<PanelFile> {
        let path = self.panel_path(name);

        if !path.exists() {
            tracing::warn!("Panel file not found at {}, using default panel", path);
            return Ok(Self::create_default_panel(name));
        }

        let file_contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read panel file: {}", path))?;

        let panel: PanelFile = serde_yaml_ng::from_str(&file_contents)
            .with_context(|| format!("Failed to parse panel file: {}", path))?;

        tracing::info!(
            "Loaded panel `{}` ({} controls) from {}",
            panel.panel,
            panel.controls.len(),
            path
        );
        Ok(panel)
    }

    /// Save a panel definition.
    pub fn save_panel(&self, panel: &PanelFile) -> Result<()> {
        let path = self.panel_path(&panel.panel);

        let yaml_string =
            serde_yaml_ng::to_string(panel).context("Failed to serialize panel to YAML")?;

        fs::write(&path, yaml_string)
            .with_context(|| format!("Failed to write panel file: {}", path))?;

        tracing::info!("Saved panel `{}` to {}", panel.panel, path);
        Ok(())
    }

    /// Names of every panel definition in the directory.
    pub fn list_panels(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();

        for entry in self
            .panel_dir
            .read_dir_utf8()
            .with_context(|| format!("Failed to read panel directory: {}", self.panel_dir))?
        {
            let entry = entry?;
            let path = entry.path();
            if path.extension() == Some("yaml") {
                if let Some(stem) = path.file_stem() {
                    names.push(stem.to_string());
                }
            }
        }

        names.sort();
        Ok(names)
    }

    /// A small sample panel used when a requested definition is missing.
    fn create_default_panel(name: &str) -> PanelFile {
        let scale: RawConfig = [
            ("identifier".to_string(), ConfigValue::from("volume")),
            ("type".to_string(), ConfigValue::from("scale")),
            ("minValue".to_string(), ConfigValue::Int(0)),
            ("maxValue".to_string(), ConfigValue::Int(100)),
            ("initialValue".to_string(), ConfigValue::Int(50)),
        ]
        .into_iter()
        .collect();

        let range: RawConfig = [
            ("identifier".to_string(), ConfigValue::from("low:high")),
            ("type".to_string(), ConfigValue::from("range")),
            ("minValue".to_string(), ConfigValue::Int(0)),
            ("maxValue".to_string(), ConfigValue::Int(100)),
            ("minInterval".to_string(), ConfigValue::Int(5)),
        ]
        .into_iter()
        .collect();

        let select: RawConfig = [
            ("identifier".to_string(), ConfigValue::from("quality")),
            ("type".to_string(), ConfigValue::from("select")),
            (
                "choices".to_string(),
                ConfigValue::List(vec![
                    ConfigValue::from("low"),
                    ConfigValue::from("medium"),
                    ConfigValue::from("high"),
                ]),
            ),
        ]
        .into_iter()
        .collect();

        PanelFile {
            panel: name.to_string(),
            controls: vec![scale, range, select],
        }
    }

    /// Get the panel directory path.
    pub fn panel_dir(&self) -> &Utf8Path {
        &self.panel_dir
    }
}
