// Library exports for tabplot

pub mod config;
pub mod csv_reader;
pub mod data;
pub mod document;
pub mod encode;
pub mod error;
pub mod graph;
pub mod ir;
pub mod palette;
pub mod runtime;
pub mod scale;
pub mod summary;
pub mod transform;

pub use config::{Capabilities, Config, RenderOptions};
pub use error::{Error, LoadError, ValidationError};
pub use runtime::{render_document, render_image, summarize, PlotRequest};
pub use summary::Summary;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OutputFormat {
    #[serde(rename = "png")]
    #[default]
    Png,
    #[serde(rename = "svg")]
    Svg,
}

impl OutputFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Svg => "image/svg+xml",
        }
    }
}
