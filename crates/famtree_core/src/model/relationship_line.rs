//! Free-form emotional relationship lines.
//!
//! Lines are positioned entirely by the user and carry no reference to
//! person records.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Emotional tone of a relationship line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LineTone {
    Intimate,
    Distant,
    Conflict,
}

/// Arrow-head cardinality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LineArrows {
    /// Arrow head at the end point only.
    One,
    /// Arrow heads at both end points.
    Two,
}

/// Line type stored as `<tone>-<arrows>`, e.g. `conflict-two`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct LineType {
    pub tone: LineTone,
    pub arrows: LineArrows,
}

impl LineType {
    pub fn new(tone: LineTone, arrows: LineArrows) -> Self {
        Self { tone, arrows }
    }

    pub fn as_wire(self) -> String {
        let tone = match self.tone {
            LineTone::Intimate => "intimate",
            LineTone::Distant => "distant",
            LineTone::Conflict => "conflict",
        };
        let arrows = match self.arrows {
            LineArrows::One => "one",
            LineArrows::Two => "two",
        };
        format!("{tone}-{arrows}")
    }

    pub fn parse(value: &str) -> Option<Self> {
        let (tone, arrows) = value.split_once('-')?;
        let tone = match tone {
            "intimate" => LineTone::Intimate,
            "distant" => LineTone::Distant,
            "conflict" => LineTone::Conflict,
            _ => return None,
        };
        let arrows = match arrows {
            "one" => LineArrows::One,
            "two" => LineArrows::Two,
            _ => return None,
        };
        Some(Self { tone, arrows })
    }
}

impl From<LineType> for String {
    fn from(value: LineType) -> Self {
        value.as_wire()
    }
}

impl TryFrom<String> for LineType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("invalid line type `{value}`"))
    }
}

/// User-positioned emotional connector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipLine {
    pub id: String,
    pub line_type: LineType,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

/// Draggable part of a relationship line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineHandle {
    Start,
    End,
    Body,
}

impl RelationshipLine {
    /// Creates a line with a generated id.
    pub fn new(line_type: LineType, x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            id: format!("l{}", Uuid::new_v4().simple()),
            line_type,
            x1,
            y1,
            x2,
            y2,
        }
    }

    /// Moves one handle by a delta. `Body` translates both end points.
    pub fn translate(&mut self, handle: LineHandle, dx: f64, dy: f64) {
        match handle {
            LineHandle::Start => {
                self.x1 += dx;
                self.y1 += dy;
            }
            LineHandle::End => {
                self.x2 += dx;
                self.y2 += dy;
            }
            LineHandle::Body => {
                self.x1 += dx;
                self.y1 += dy;
                self.x2 += dx;
                self.y2 += dy;
            }
        }
    }
}
