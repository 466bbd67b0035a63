use crate::ir::ChartKind;
use crate::OutputFormat;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Image size and encoding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderOptions {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default)]
    pub format: OutputFormat,
}

fn default_width() -> u32 { 800 }
fn default_height() -> u32 { 600 }

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            format: OutputFormat::Png,
        }
    }
}

/// Features switched on for this deployment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capabilities {
    #[serde(default = "enabled")]
    pub grouping: bool,
    #[serde(default = "enabled")]
    pub horizontal_bar: bool,
    #[serde(default = "enabled")]
    pub pie: bool,
}

fn enabled() -> bool { true }

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            grouping: true,
            horizontal_bar: true,
            pie: true,
        }
    }
}

impl Capabilities {
    pub fn supports(&self, chart: ChartKind) -> bool {
        match chart {
            ChartKind::Bar => true,
            ChartKind::Barh => self.horizontal_bar,
            ChartKind::Pie => self.pie,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub render: RenderOptions,
    #[serde(default)]
    pub capabilities: Capabilities,
    /// Rows shown in the summary preview, capped at ten
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,
    /// Above this many categories, value labels give way to tooltips
    #[serde(default = "default_label_threshold")]
    pub label_threshold: usize,
}

fn default_preview_rows() -> usize { 10 }
fn default_label_threshold() -> usize { 10 }

impl Default for Config {
    fn default() -> Self {
        Self {
            render: RenderOptions::default(),
            capabilities: Capabilities::default(),
            preview_rows: default_preview_rows(),
            label_threshold: default_label_threshold(),
        }
    }
}

impl Config {
    /// Defaults, then the optional TOML file, then `TABPLOT_*` variables
    /// (`TABPLOT_RENDER__WIDTH=1024`).
    pub fn load(path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed("TABPLOT_").split("__")).extract()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.render.width, 800);
        assert_eq!(config.render.height, 600);
        assert_eq!(config.preview_rows, 10);
        assert_eq!(config.label_threshold, 10);
        assert!(config.capabilities.grouping);
    }

    #[test]
    fn test_load_from_toml_and_env() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "tabplot.toml",
                r#"
                preview_rows = 5

                [render]
                format = "svg"

                [capabilities]
                grouping = false
                "#,
            )?;
            jail.set_env("TABPLOT_RENDER__WIDTH", "1024");

            let config = Config::load(Some(Path::new("tabplot.toml")))?;
            assert_eq!(config.preview_rows, 5);
            assert_eq!(config.render.format, OutputFormat::Svg);
            assert_eq!(config.render.width, 1024);
            assert_eq!(config.render.height, 600);
            assert!(!config.capabilities.grouping);
            assert!(config.capabilities.pie);
            Ok(())
        });
    }

    #[test]
    fn test_capabilities_supports() {
        let caps = Capabilities {
            grouping: true,
            horizontal_bar: false,
            pie: true,
        };
        assert!(caps.supports(ChartKind::Bar));
        assert!(!caps.supports(ChartKind::Barh));
        assert!(caps.supports(ChartKind::Pie));
    }
}
