//! Component shape catalog.
//!
//! Each shape declares the dimension names it understands. A dimension with a
//! default may be left out of the input; one without a default is required.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// One dimension a shape understands
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DimensionSpec {
    pub name: &'static str,
    pub default: Option<f64>,
}

const fn required(name: &'static str) -> DimensionSpec {
    DimensionSpec {
        name,
        default: None,
    }
}

const fn defaulted(name: &'static str, default: f64) -> DimensionSpec {
    DimensionSpec {
        name,
        default: Some(default),
    }
}

const CIRCLE: &[DimensionSpec] = &[required("od"), defaulted("id", 0.0), defaulted("mult", 1.0)];

const HEXAGON: &[DimensionSpec] = &[required("op"), defaulted("ip", 0.0), defaulted("mult", 1.0)];

const HELIX: &[DimensionSpec] = &[
    required("od"),
    required("axialPitch"),
    required("helixDiameter"),
    defaulted("id", 0.0),
    defaulted("mult", 1.0),
];

const RECTANGLE: &[DimensionSpec] = &[
    required("lengthOuter"),
    required("widthOuter"),
    defaulted("lengthInner", 0.0),
    defaulted("widthInner", 0.0),
    defaulted("mult", 1.0),
];

const SQUARE: &[DimensionSpec] = &[
    required("widthOuter"),
    defaulted("widthInner", 0.0),
    defaulted("mult", 1.0),
];

const UNSHAPED: &[DimensionSpec] = &[required("area"), defaulted("op", 0.0), defaulted("mult", 1.0)];

const DERIVED: &[DimensionSpec] = &[defaulted("mult", 1.0)];

/// Recognized component shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Shape {
    Circle,
    Hexagon,
    Helix,
    Rectangle,
    Square,
    UnshapedComponent,
    /// Fills whatever area the other components leave (e.g. coolant)
    DerivedShape,
}

impl Shape {
    pub const ALL: [Shape; 7] = [
        Shape::Circle,
        Shape::Hexagon,
        Shape::Helix,
        Shape::Rectangle,
        Shape::Square,
        Shape::UnshapedComponent,
        Shape::DerivedShape,
    ];

    /// The dimensions this shape declares
    pub fn dimensions(self) -> &'static [DimensionSpec] {
        match self {
            Shape::Circle => CIRCLE,
            Shape::Hexagon => HEXAGON,
            Shape::Helix => HELIX,
            Shape::Rectangle => RECTANGLE,
            Shape::Square => SQUARE,
            Shape::UnshapedComponent => UNSHAPED,
            Shape::DerivedShape => DERIVED,
        }
    }

    pub fn dimension(self, name: &str) -> Option<&'static DimensionSpec> {
        self.dimensions().iter().find(|d| d.name == name)
    }

    pub fn declares(self, name: &str) -> bool {
        self.dimension(name).is_some()
    }

    pub fn name(self) -> &'static str {
        match self {
            Shape::Circle => "Circle",
            Shape::Hexagon => "Hexagon",
            Shape::Helix => "Helix",
            Shape::Rectangle => "Rectangle",
            Shape::Square => "Square",
            Shape::UnshapedComponent => "UnshapedComponent",
            Shape::DerivedShape => "DerivedShape",
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a shape name is not in the catalog
#[derive(Debug, Clone, PartialEq)]
pub struct UnknownShapeName(pub String);

impl FromStr for Shape {
    type Err = UnknownShapeName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Shape::ALL
            .iter()
            .copied()
            .find(|shape| shape.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownShapeName(s.to_string()))
    }
}
