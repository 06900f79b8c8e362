//! Node shape selection.
//!
//! Maps person attributes to a renderer-neutral outline + overlay descriptor.

use crate::config::LayoutConfig;
use crate::model::person::{Gender, NodeType};
use serde::Serialize;

const ROUNDED_CORNER_RADIUS: f64 = 5.0;
const MALE_CROSS_INSET: f64 = 3.0;
const CROSS_SCALE: f64 = 0.7;

/// Node outline, centered on the person position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Outline {
    RoundedRect {
        width: f64,
        height: f64,
        corner_radius: f64,
    },
    Ellipse {
        diameter: f64,
    },
    /// Square rotated 45 degrees; `half_diagonal` is center-to-vertex.
    Diamond {
        half_diagonal: f64,
    },
}

/// Decoration drawn on top of the outline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Overlay {
    None,
    /// Deceased mark: two diagonals spanning `half_width` x `half_height`
    /// around the center.
    Cross { half_width: f64, half_height: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeShape {
    pub outline: Outline,
    pub overlay: Overlay,
}

/// Picks the node shape for one person.
///
/// Pets are diamonds, males rounded rectangles, everyone else ellipses.
/// Deceased males get a corner-to-corner cross; others a cross at 70% size.
pub fn node_shape(
    gender: Gender,
    node_type: NodeType,
    is_deceased: bool,
    config: &LayoutConfig,
) -> NodeShape {
    let is_pet = node_type == NodeType::Pet;
    let outline = if is_pet {
        Outline::Diamond {
            half_diagonal: config.half_width(),
        }
    } else if gender == Gender::Male {
        Outline::RoundedRect {
            width: config.node_width,
            height: config.node_height,
            corner_radius: ROUNDED_CORNER_RADIUS,
        }
    } else {
        Outline::Ellipse {
            diameter: config.node_height,
        }
    };

    let overlay = if !is_deceased {
        Overlay::None
    } else if gender == Gender::Male && !is_pet {
        Overlay::Cross {
            half_width: config.half_width() - MALE_CROSS_INSET,
            half_height: config.half_height() - MALE_CROSS_INSET,
        }
    } else {
        let base = if is_pet {
            config.node_width
        } else {
            config.node_height
        };
        let half = base * CROSS_SCALE / 2.0;
        Overlay::Cross {
            half_width: half,
            half_height: half,
        }
    };

    NodeShape { outline, overlay }
}

#[cfg(test)]
mod tests {
    use super::{node_shape, Outline, Overlay};
    use crate::config::LayoutConfig;
    use crate::model::person::{Gender, NodeType};

    #[test]
    fn outline_follows_gender_and_node_type() {
        let config = LayoutConfig::default();
        let male = node_shape(Gender::Male, NodeType::Person, false, &config);
        let female = node_shape(Gender::Female, NodeType::Person, false, &config);
        let pet = node_shape(Gender::Male, NodeType::Pet, false, &config);

        assert!(matches!(male.outline, Outline::RoundedRect { corner_radius, .. } if corner_radius == 5.0));
        assert_eq!(female.outline, Outline::Ellipse { diameter: 80.0 });
        assert_eq!(pet.outline, Outline::Diamond { half_diagonal: 40.0 });
        assert_eq!(male.overlay, Overlay::None);
    }

    #[test]
    fn deceased_cross_size_depends_on_shape() {
        let config = LayoutConfig::default();
        let male = node_shape(Gender::Male, NodeType::Person, true, &config);
        let female = node_shape(Gender::Female, NodeType::Person, true, &config);

        assert_eq!(
            male.overlay,
            Overlay::Cross {
                half_width: 37.0,
                half_height: 37.0,
            }
        );
        assert_eq!(
            female.overlay,
            Overlay::Cross {
                half_width: 28.0,
                half_height: 28.0,
            }
        );
    }
}
