//! Style properties, addressed by string name.
//!
//! Each item stores only the properties it overrides; everything else is
//! resolved against the document's default [`Style`] through a [`StyleView`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Property names understood by items and the default style.
pub mod names {
    pub const PEN_COLOR: &str = "pen-color";
    pub const PEN_WIDTH: &str = "pen-width";
    pub const PEN_STYLE: &str = "pen-style";
    pub const BRUSH_COLOR: &str = "brush-color";
    pub const START_ARROW: &str = "start-arrow";
    pub const END_ARROW: &str = "end-arrow";
    pub const ARROW_SIZE: &str = "arrow-size";
    pub const CORNER_RADIUS: &str = "corner-radius";
    pub const CAPTION: &str = "caption";
    pub const FONT_FAMILY: &str = "font-family";
    pub const FONT_SIZE: &str = "font-size";
    pub const TEXT_COLOR: &str = "text-color";
    pub const TEXT_ALIGNMENT: &str = "text-alignment";
}

// ────────────────────────────────────────────────────────────────────────────
// Value types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const TRANSPARENT: Color = Color {
        r: 0,
        g: 0,
        b: 0,
        a: 0,
    };

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse `#rrggbb`, `#rrggbbaa` or a small set of named colors.
    pub fn parse(value: &str) -> Option<Color> {
        let value = value.trim();
        if let Some(hex) = value.strip_prefix('#') {
            let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
            return match hex.len() {
                6 => Some(Color::rgb(channel(0)?, channel(2)?, channel(4)?)),
                8 => Some(Color {
                    r: channel(0)?,
                    g: channel(2)?,
                    b: channel(4)?,
                    a: channel(6)?,
                }),
                _ => None,
            };
        }
        match value.to_ascii_lowercase().as_str() {
            "black" => Some(Color::BLACK),
            "white" => Some(Color::WHITE),
            "transparent" | "none" => Some(Color::TRANSPARENT),
            "red" => Some(Color::rgb(255, 0, 0)),
            "green" => Some(Color::rgb(0, 128, 0)),
            "blue" => Some(Color::rgb(0, 0, 255)),
            "yellow" => Some(Color::rgb(255, 255, 0)),
            "gray" | "grey" => Some(Color::rgb(128, 128, 128)),
            "lightgray" | "lightgrey" => Some(Color::rgb(211, 211, 211)),
            _ => None,
        }
    }

    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PenStyle {
    NoPen,
    #[default]
    Solid,
    Dash,
    Dot,
    DashDot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ArrowStyle {
    #[default]
    None,
    Normal,
    Triangle,
    TriangleFilled,
    Circle,
    CircleFilled,
    Diamond,
    DiamondFilled,
    Concave,
    ConcaveFilled,
}

impl ArrowStyle {
    pub fn is_filled(self) -> bool {
        matches!(
            self,
            ArrowStyle::TriangleFilled
                | ArrowStyle::CircleFilled
                | ArrowStyle::DiamondFilled
                | ArrowStyle::ConcaveFilled
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Alignment {
    Left,
    #[default]
    Center,
    Right,
}

/// Value of a named property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    Bool(bool),
    Number(f64),
    Color(Color),
    Text(String),
    Pen(PenStyle),
    Arrow(ArrowStyle),
    Align(Alignment),
}

impl PropertyValue {
    /// Short type tag used by the document format.
    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::Bool(_) => "bool",
            PropertyValue::Number(_) => "number",
            PropertyValue::Color(_) => "color",
            PropertyValue::Text(_) => "text",
            PropertyValue::Pen(_) => "pen",
            PropertyValue::Arrow(_) => "arrow",
            PropertyValue::Align(_) => "align",
        }
    }

    /// Value as a string, the inverse of [`PropertyValue::parse`].
    pub fn to_value_string(&self) -> String {
        match self {
            PropertyValue::Bool(b) => b.to_string(),
            PropertyValue::Number(n) => n.to_string(),
            PropertyValue::Color(c) => c.to_string(),
            PropertyValue::Text(t) => t.clone(),
            PropertyValue::Pen(p) => format!("{:?}", p),
            PropertyValue::Arrow(a) => format!("{:?}", a),
            PropertyValue::Align(a) => format!("{:?}", a),
        }
    }

    /// Parse a value given its type tag.
    pub fn parse(type_name: &str, value: &str) -> Option<PropertyValue> {
        Some(match type_name {
            "bool" => PropertyValue::Bool(value.parse().ok()?),
            "number" => PropertyValue::Number(value.parse().ok()?),
            "color" => PropertyValue::Color(Color::parse(value)?),
            "text" => PropertyValue::Text(value.to_string()),
            "pen" => PropertyValue::Pen(match value {
                "NoPen" => PenStyle::NoPen,
                "Solid" => PenStyle::Solid,
                "Dash" => PenStyle::Dash,
                "Dot" => PenStyle::Dot,
                "DashDot" => PenStyle::DashDot,
                _ => return None,
            }),
            "arrow" => PropertyValue::Arrow(match value {
                "None" => ArrowStyle::None,
                "Normal" => ArrowStyle::Normal,
                "Triangle" => ArrowStyle::Triangle,
                "TriangleFilled" => ArrowStyle::TriangleFilled,
                "Circle" => ArrowStyle::Circle,
                "CircleFilled" => ArrowStyle::CircleFilled,
                "Diamond" => ArrowStyle::Diamond,
                "DiamondFilled" => ArrowStyle::DiamondFilled,
                "Concave" => ArrowStyle::Concave,
                "ConcaveFilled" => ArrowStyle::ConcaveFilled,
                _ => return None,
            }),
            "align" => PropertyValue::Align(match value {
                "Left" => Alignment::Left,
                "Center" => Alignment::Center,
                "Right" => Alignment::Right,
                _ => return None,
            }),
            _ => return None,
        })
    }

    /// True if both values carry the same variant.
    pub fn same_type(&self, other: &PropertyValue) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Style
// ────────────────────────────────────────────────────────────────────────────

/// A complete set of named style properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Style {
    pub properties: IndexMap<String, PropertyValue>,
}

impl Default for Style {
    fn default() -> Self {
        let mut properties = IndexMap::new();
        properties.insert(names::PEN_COLOR.to_string(), PropertyValue::Color(Color::BLACK));
        properties.insert(names::PEN_WIDTH.to_string(), PropertyValue::Number(0.5));
        properties.insert(names::PEN_STYLE.to_string(), PropertyValue::Pen(PenStyle::Solid));
        properties.insert(names::BRUSH_COLOR.to_string(), PropertyValue::Color(Color::WHITE));
        properties.insert(names::START_ARROW.to_string(), PropertyValue::Arrow(ArrowStyle::None));
        properties.insert(names::END_ARROW.to_string(), PropertyValue::Arrow(ArrowStyle::None));
        properties.insert(names::ARROW_SIZE.to_string(), PropertyValue::Number(3.0));
        properties.insert(names::CORNER_RADIUS.to_string(), PropertyValue::Number(0.0));
        properties.insert(names::CAPTION.to_string(), PropertyValue::Text("Label".to_string()));
        properties.insert(names::FONT_FAMILY.to_string(), PropertyValue::Text("Arial".to_string()));
        properties.insert(names::FONT_SIZE.to_string(), PropertyValue::Number(4.0));
        properties.insert(names::TEXT_COLOR.to_string(), PropertyValue::Color(Color::BLACK));
        properties.insert(
            names::TEXT_ALIGNMENT.to_string(),
            PropertyValue::Align(Alignment::Center),
        );
        Self { properties }
    }
}

impl Style {
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    /// Set a property; values of a different type than the existing entry
    /// are rejected and `false` is returned.
    pub fn set(&mut self, name: &str, value: PropertyValue) -> bool {
        match self.properties.get_mut(name) {
            Some(existing) if existing.same_type(&value) => {
                *existing = value;
                true
            }
            Some(_) => false,
            None => {
                self.properties.insert(name.to_string(), value);
                true
            }
        }
    }
}

/// Item overrides layered over the document defaults.
#[derive(Debug, Clone, Copy)]
pub struct StyleView<'a> {
    overrides: &'a IndexMap<String, PropertyValue>,
    defaults: &'a Style,
}

impl<'a> StyleView<'a> {
    pub fn new(overrides: &'a IndexMap<String, PropertyValue>, defaults: &'a Style) -> Self {
        Self {
            overrides,
            defaults,
        }
    }

    pub fn get(&self, name: &str) -> Option<&'a PropertyValue> {
        self.overrides.get(name).or_else(|| self.defaults.get(name))
    }

    pub fn number(&self, name: &str) -> f64 {
        self.get(name).and_then(PropertyValue::as_number).unwrap_or(0.0)
    }

    pub fn color(&self, name: &str) -> Color {
        match self.get(name) {
            Some(PropertyValue::Color(c)) => *c,
            _ => Color::BLACK,
        }
    }

    pub fn text(&self, name: &str) -> &'a str {
        match self.get(name) {
            Some(PropertyValue::Text(t)) => t.as_str(),
            _ => "",
        }
    }

    pub fn pen_style(&self) -> PenStyle {
        match self.get(names::PEN_STYLE) {
            Some(PropertyValue::Pen(p)) => *p,
            _ => PenStyle::Solid,
        }
    }

    pub fn arrow(&self, name: &str) -> ArrowStyle {
        match self.get(name) {
            Some(PropertyValue::Arrow(a)) => *a,
            _ => ArrowStyle::None,
        }
    }

    pub fn alignment(&self) -> Alignment {
        match self.get(names::TEXT_ALIGNMENT) {
            Some(PropertyValue::Align(a)) => *a,
            _ => Alignment::Center,
        }
    }

    /// Half the pen width, or zero when the pen is disabled.
    pub fn half_pen_width(&self) -> f64 {
        if self.pen_style() == PenStyle::NoPen {
            0.0
        } else {
            self.number(names::PEN_WIDTH) / 2.0
        }
    }
}
