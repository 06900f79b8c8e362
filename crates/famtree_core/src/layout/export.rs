//! Export rectangle computation.
//!
//! The engine only decides which canvas region to rasterize; producing pixels
//! is the rendering surface's job.

use crate::config::LayoutConfig;
use crate::model::person::Person;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    pub fn parse(value: &str) -> Result<Self, UnsupportedFormat> {
        match value.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            other => Err(UnsupportedFormat(other.to_string())),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
        }
    }

    /// JPEG has no alpha channel, so the surface must paint a background.
    pub fn needs_opaque_background(self) -> bool {
        matches!(self, Self::Jpeg)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedFormat(pub String);

impl Display for UnsupportedFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "unsupported image format `{}`; expected png|jpeg|jpg", self.0)
    }
}

impl Error for UnsupportedFormat {}

/// Canvas rectangle in scene coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Raster request handed to the rendering surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub source: Rect,
    pub format: ImageFormat,
    /// Target image size in whole pixels.
    pub pixel_width: u32,
    pub pixel_height: u32,
}

/// Bounding rectangle of all nodes plus padding; `None` for an empty tree.
pub fn export_bounds(people: &[Person], config: &LayoutConfig) -> Option<Rect> {
    let first = people.first()?;
    let (mut min_x, mut max_x, mut min_y, mut max_y) = (first.x, first.x, first.y, first.y);
    for person in &people[1..] {
        min_x = min_x.min(person.x);
        max_x = max_x.max(person.x);
        min_y = min_y.min(person.y);
        max_y = max_y.max(person.y);
    }

    let margin_x = config.half_width() + config.export_padding;
    let margin_y = config.half_height() + config.export_padding;
    Some(Rect {
        x: min_x - margin_x,
        y: min_y - margin_y,
        width: (max_x - min_x) + margin_x * 2.0,
        height: (max_y - min_y) + margin_y * 2.0,
    })
}

/// Builds the raster request for `people` in `format`.
pub fn export_request(
    people: &[Person],
    format: ImageFormat,
    config: &LayoutConfig,
) -> Option<ExportRequest> {
    let source = export_bounds(people, config)?;
    Some(ExportRequest {
        source,
        format,
        pixel_width: source.width.ceil() as u32,
        pixel_height: source.height.ceil() as u32,
    })
}
