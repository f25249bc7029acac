//! Configuration for form generation
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (forms.toml)
//! - Environment variables (FORMS__*)
//!
//! ## Example config file (forms.toml):
//! ```toml
//! [layout]
//! mode = "horizontal"
//! colon = true
//! label_align = "right"
//! label_col = { span = 4, offset = 0 }
//! wrapper_col = { span = 20, offset = 0 }
//!
//! [output]
//! format = "pretty"
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormConfig {
    /// Layout of every form item
    #[serde(default)]
    pub layout: LayoutConfig,

    /// How generated definitions are written
    #[serde(default)]
    pub output: OutputConfig,
}

/// Form layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    #[serde(default)]
    pub mode: LayoutMode,

    /// Grid columns taken by the label
    #[serde(default = "default_label_col")]
    pub label_col: ColSpan,

    /// Grid columns taken by the input
    #[serde(default = "default_wrapper_col")]
    pub wrapper_col: ColSpan,

    /// Show a colon after labels
    #[serde(default = "default_true")]
    pub colon: bool,

    #[serde(default)]
    pub label_align: LabelAlign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColSpan {
    pub span: i64,
    #[serde(default)]
    pub offset: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    #[default]
    Horizontal,
    Inline,
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LabelAlign {
    Left,
    #[default]
    Right,
}

impl LabelAlign {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

/// Output format for JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Compact,
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_label_col() -> ColSpan {
    ColSpan { span: 4, offset: 0 }
}

fn default_wrapper_col() -> ColSpan {
    ColSpan { span: 20, offset: 0 }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            mode: LayoutMode::default(),
            label_col: default_label_col(),
            wrapper_col: default_wrapper_col(),
            colon: true,
            label_align: LabelAlign::default(),
        }
    }
}

impl ColSpan {
    fn to_value(self) -> Value {
        json!({ "span": self.span, "offset": self.offset })
    }
}

impl FormConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, layering `config_path` over the default locations
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = ["forms.toml", ".forms.toml", "config/forms.toml"];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "familiar", "forms") {
            let xdg_config = config_dir.config_dir().join("forms.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // FORMS__LAYOUT__MODE=vertical
        builder = builder.add_source(
            Environment::with_prefix("FORMS")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Props every generated form item starts from
    ///
    /// Column spans and label alignment only apply outside vertical layout.
    pub fn form_item_defaults(&self) -> Map<String, Value> {
        let layout = &self.layout;
        let mut props = Map::new();
        props.insert("colon".into(), Value::Bool(layout.colon));

        if layout.mode != LayoutMode::Vertical {
            props.insert("labelCol".into(), layout.label_col.to_value());
            props.insert("wrapperCol".into(), layout.wrapper_col.to_value());
            props.insert("labelAlign".into(), Value::String(layout.label_align.as_str().into()));
        }

        props
    }

    pub fn compact(&self) -> bool {
        self.output.format == OutputFormat::Compact
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = FormConfig::default();
        assert_eq!(config.layout.mode, LayoutMode::Horizontal);
        assert_eq!(config.layout.wrapper_col.span, 20);
        assert!(!config.compact());
    }

    #[test]
    fn test_horizontal_defaults() {
        let props = FormConfig::default().form_item_defaults();
        assert_eq!(
            Value::Object(props),
            json!({
                "colon": true,
                "labelCol": { "span": 4, "offset": 0 },
                "wrapperCol": { "span": 20, "offset": 0 },
                "labelAlign": "right"
            })
        );
    }

    #[test]
    fn test_vertical_layout_only_sets_colon() {
        let mut config = FormConfig::default();
        config.layout.mode = LayoutMode::Vertical;
        config.layout.colon = false;
        assert_eq!(Value::Object(config.form_item_defaults()), json!({ "colon": false }));
    }

    #[test]
    fn test_serialize_config() {
        let config = FormConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[layout]"));
        assert!(toml_str.contains("[output]"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[layout]\nmode = \"inline\"\nlabel_col = {{ span = 6 }}\n\n[output]\nformat = \"compact\""
        )
        .unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let config = FormConfig::load_from(Some(&path)).unwrap();
        assert_eq!(config.layout.mode, LayoutMode::Inline);
        assert_eq!(config.layout.label_col, ColSpan { span: 6, offset: 0 });
        assert_eq!(config.layout.wrapper_col.span, 20);
        assert!(config.compact());
    }

    #[test]
    fn test_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("forms.toml");
        let path = path.to_str().unwrap();

        let mut config = FormConfig::default();
        config.layout.label_align = LabelAlign::Left;
        config.save(path).unwrap();

        let loaded = FormConfig::load_from(Some(path)).unwrap();
        assert_eq!(loaded, config);
    }
}
