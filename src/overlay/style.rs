use serde::{Deserialize, Serialize};

use crate::geometry::Color;

/// Polygon style handed to the host renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StyleDescriptor {
    pub color: Color,
    pub fill_color: Color,
    pub opacity: f32,
    pub fill_opacity: f32,
    pub weight: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dash_array: Option<String>,
}

impl Default for StyleDescriptor {
    fn default() -> Self {
        Self {
            color: Color::new(0xfc, 0x67, 0x21),
            fill_color: Color::new(0xfc, 0x67, 0x21),
            opacity: 0.5,
            fill_opacity: 0.2,
            weight: 3.0,
            dash_array: None,
        }
    }
}

impl StyleDescriptor {
    pub fn with_fill(mut self, fill_color: Color, fill_opacity: f32) -> Self {
        self.fill_color = fill_color;
        self.fill_opacity = fill_opacity.clamp(0.0, 1.0);
        self
    }
}
