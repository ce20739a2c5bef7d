//! Core geometry and symmetry descriptors.
//!
//! Input strings are canonicalized (case-insensitive, surrounding and repeated
//! whitespace ignored) so `" thetaRZ"` and `"thiRd periodic "` are accepted.

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::core::error::BlueprintError;

fn canonical(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Lattice geometry of the core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GeomType {
    #[default]
    Hex,
    Cartesian,
    Rz,
    #[serde(rename = "thetarz")]
    Rzt,
}

impl GeomType {
    /// Human-readable label
    pub fn label(self) -> &'static str {
        match self {
            GeomType::Hex => "Hexagonal",
            GeomType::Cartesian => "Cartesian",
            GeomType::Rz => "R-Z",
            GeomType::Rzt => "R-Z-Theta",
        }
    }
}

impl fmt::Display for GeomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GeomType::Hex => "hex",
            GeomType::Cartesian => "cartesian",
            GeomType::Rz => "rz",
            GeomType::Rzt => "thetarz",
        })
    }
}

impl FromStr for GeomType {
    type Err = BlueprintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match canonical(s).as_str() {
            "hex" | "hexagonal" => Ok(GeomType::Hex),
            "cartesian" => Ok(GeomType::Cartesian),
            "rz" => Ok(GeomType::Rz),
            "thetarz" | "rzt" => Ok(GeomType::Rzt),
            _ => Err(BlueprintError::InvalidGeometry(format!(
                "unknown geometry type '{}'",
                s
            ))),
        }
    }
}

/// Fraction of the full core that is modeled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomainType {
    FullCore,
    ThirdCore,
    QuarterCore,
    EighthCore,
    SixteenthCore,
}

impl DomainType {
    pub fn label(self) -> &'static str {
        match self {
            DomainType::FullCore => "Full",
            DomainType::ThirdCore => "Third",
            DomainType::QuarterCore => "Quarter",
            DomainType::EighthCore => "Eighth",
            DomainType::SixteenthCore => "Sixteenth",
        }
    }

    fn keyword(self) -> &'static str {
        match self {
            DomainType::FullCore => "full",
            DomainType::ThirdCore => "third",
            DomainType::QuarterCore => "quarter",
            DomainType::EighthCore => "eighth",
            DomainType::SixteenthCore => "sixteenth",
        }
    }

    fn from_keyword(word: &str) -> Option<Self> {
        [
            DomainType::FullCore,
            DomainType::ThirdCore,
            DomainType::QuarterCore,
            DomainType::EighthCore,
            DomainType::SixteenthCore,
        ]
        .into_iter()
        .find(|d| d.keyword() == word)
    }
}

/// Boundary condition at the edges of the modeled domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundaryType {
    NoSymmetry,
    Periodic,
    Reflective,
}

impl BoundaryType {
    pub fn label(self) -> &'static str {
        match self {
            BoundaryType::NoSymmetry => "No Symmetry",
            BoundaryType::Periodic => "Periodic",
            BoundaryType::Reflective => "Reflective",
        }
    }
}

impl fmt::Display for BoundaryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BoundaryType::NoSymmetry => "",
            BoundaryType::Periodic => "periodic",
            BoundaryType::Reflective => "reflective",
        })
    }
}

/// Domain + boundary description of core symmetry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymmetryType {
    domain: DomainType,
    boundary: BoundaryType,
    through_center_assembly: bool,
}

impl SymmetryType {
    pub fn new(
        domain: DomainType,
        boundary: BoundaryType,
        through_center_assembly: bool,
    ) -> Result<Self, BlueprintError> {
        let invalid = |reason: &str| {
            Err(BlueprintError::InvalidGeometry(format!(
                "{} {} is not a valid symmetry: {}",
                domain.keyword(),
                boundary,
                reason
            )))
        };

        match (domain, boundary) {
            (DomainType::FullCore, BoundaryType::NoSymmetry) => {}
            (DomainType::FullCore, _) => return invalid("full core has no symmetry boundary"),
            (_, BoundaryType::NoSymmetry) => return invalid("partial cores need a boundary"),
            (DomainType::ThirdCore, BoundaryType::Reflective) => {
                return invalid("third core symmetry must be periodic")
            }
            _ => {}
        }
        if through_center_assembly && boundary != BoundaryType::Reflective {
            return invalid("only reflective boundaries can pass through the center assembly");
        }

        Ok(Self {
            domain,
            boundary,
            through_center_assembly,
        })
    }

    pub fn full_core() -> Self {
        Self {
            domain: DomainType::FullCore,
            boundary: BoundaryType::NoSymmetry,
            through_center_assembly: false,
        }
    }

    pub fn domain(&self) -> DomainType {
        self.domain
    }

    pub fn boundary(&self) -> BoundaryType {
        self.boundary
    }

    pub fn is_through_center_assembly(&self) -> bool {
        self.through_center_assembly
    }

    /// Number of modeled domains that make up the full core
    pub fn symmetry_factor(&self) -> f64 {
        match self.domain {
            DomainType::FullCore => 1.0,
            DomainType::ThirdCore => 3.0,
            DomainType::QuarterCore => 4.0,
            DomainType::EighthCore => 8.0,
            DomainType::SixteenthCore => 16.0,
        }
    }
}

impl Default for SymmetryType {
    fn default() -> Self {
        Self::full_core()
    }
}

impl fmt::Display for SymmetryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.domain.keyword())?;
        if self.boundary != BoundaryType::NoSymmetry {
            write!(f, " {}", self.boundary)?;
        }
        if self.through_center_assembly {
            f.write_str(" through center assembly")?;
        }
        Ok(())
    }
}

impl FromStr for SymmetryType {
    type Err = BlueprintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = canonical(s);
        let (text, through_center) = match text.strip_suffix("through center assembly") {
            Some(rest) => (rest.trim_end().to_string(), true),
            None => (text, false),
        };

        let mut words = text.split(' ').filter(|w| !w.is_empty() && *w != "core");
        let domain = words
            .next()
            .and_then(DomainType::from_keyword)
            .ok_or_else(|| {
                BlueprintError::InvalidGeometry(format!("unknown symmetry '{}'", s))
            })?;
        let boundary = match words.next() {
            None => BoundaryType::NoSymmetry,
            Some("periodic") => BoundaryType::Periodic,
            Some("reflective") => BoundaryType::Reflective,
            Some(other) => {
                return Err(BlueprintError::InvalidGeometry(format!(
                    "unknown symmetry boundary '{}' in '{}'",
                    other, s
                )))
            }
        };
        if let Some(extra) = words.next() {
            return Err(BlueprintError::InvalidGeometry(format!(
                "unexpected '{}' in symmetry '{}'",
                extra, s
            )));
        }

        SymmetryType::new(domain, boundary, through_center)
    }
}

impl Serialize for SymmetryType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Check that a symmetry makes sense for a lattice geometry
pub fn check_valid_geom_symmetry_combo(
    geom: GeomType,
    symmetry: &SymmetryType,
) -> Result<(), BlueprintError> {
    let valid = match geom {
        GeomType::Hex => matches!(
            symmetry.domain(),
            DomainType::FullCore | DomainType::ThirdCore
        ),
        GeomType::Cartesian => matches!(
            symmetry.domain(),
            DomainType::FullCore | DomainType::QuarterCore | DomainType::EighthCore
        ),
        GeomType::Rz => symmetry.domain() == DomainType::FullCore,
        GeomType::Rzt => true,
    };
    if valid {
        Ok(())
    } else {
        Err(BlueprintError::InvalidGeometry(format!(
            "{} symmetry is not supported by {} geometry",
            symmetry,
            geom.label()
        )))
    }
}

/// Geometry of the core lattice
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CoreGeometry {
    pub geom: GeomType,
    pub symmetry: SymmetryType,
}

impl CoreGeometry {
    pub fn new(geom: GeomType, symmetry: SymmetryType) -> Result<Self, BlueprintError> {
        check_valid_geom_symmetry_combo(geom, &symmetry)?;
        Ok(Self { geom, symmetry })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geom_from_str() {
        assert_eq!("HeX".parse::<GeomType>().unwrap(), GeomType::Hex);
        assert_eq!("cARTESIAN".parse::<GeomType>().unwrap(), GeomType::Cartesian);
        assert_eq!(" thetaRZ".parse::<GeomType>().unwrap(), GeomType::Rzt);
        assert_eq!("rZ  ".parse::<GeomType>().unwrap(), GeomType::Rz);
        assert!("what even is this?".parse::<GeomType>().is_err());
    }

    #[test]
    fn test_geom_labels_and_display() {
        assert_eq!(GeomType::Hex.label(), "Hexagonal");
        assert_eq!(GeomType::Cartesian.label(), "Cartesian");
        assert_eq!(GeomType::Rz.label(), "R-Z");
        assert_eq!(GeomType::Rzt.label(), "R-Z-Theta");
        for geom in ["hex", "cartesian", "rz", "thetarz"] {
            assert_eq!(geom.parse::<GeomType>().unwrap().to_string(), geom);
        }
    }

    #[test]
    fn test_symmetry_from_str() {
        let st: SymmetryType = "thiRd periodic ".parse().unwrap();
        assert_eq!(st.domain(), DomainType::ThirdCore);

        let st: SymmetryType = "third core periodic".parse().unwrap();
        assert_eq!(st.boundary(), BoundaryType::Periodic);

        let st: SymmetryType = "sixteenth reflective".parse().unwrap();
        assert_eq!(st.boundary(), BoundaryType::Reflective);
        assert_eq!(st.to_string(), "sixteenth reflective");

        assert!("what even is this?".parse::<SymmetryType>().is_err());
        assert!("quarter sideways".parse::<SymmetryType>().is_err());
    }

    #[test]
    fn test_symmetry_through_center() {
        let st: SymmetryType = "eighth reflective through center assembly".parse().unwrap();
        assert!(st.is_through_center_assembly());
        assert_eq!(st.domain(), DomainType::EighthCore);
        assert_eq!(st.boundary(), BoundaryType::Reflective);
        assert_eq!(st.to_string(), "eighth reflective through center assembly");

        let round_trip: SymmetryType = st.to_string().parse().unwrap();
        assert_eq!(round_trip, st);
    }

    #[test]
    fn test_labels() {
        let st = SymmetryType::full_core();
        assert_eq!(st.domain().label(), "Full");
        assert_eq!(st.boundary().label(), "No Symmetry");
        assert_eq!(st.boundary().to_string(), "");
        assert_eq!(st.to_string(), "full");

        let st = SymmetryType::new(DomainType::ThirdCore, BoundaryType::Periodic, false).unwrap();
        assert_eq!(st.domain().label(), "Third");
        assert_eq!(st.boundary().label(), "Periodic");
    }

    #[test]
    fn test_symmetry_factor() {
        let cases = [
            ("full", 1.0),
            ("third periodic", 3.0),
            ("quarter reflective", 4.0),
            ("eighth reflective", 8.0),
            ("sixteenth reflective", 16.0),
        ];
        for (text, factor) in cases {
            let st: SymmetryType = text.parse().unwrap();
            assert_eq!(st.symmetry_factor(), factor, "{}", text);
        }
    }

    #[test]
    fn test_invalid_symmetries() {
        assert!(SymmetryType::new(DomainType::ThirdCore, BoundaryType::Reflective, false).is_err());
        assert!(SymmetryType::new(DomainType::QuarterCore, BoundaryType::NoSymmetry, false).is_err());
        assert!(SymmetryType::new(DomainType::FullCore, BoundaryType::Periodic, false).is_err());
        assert!(SymmetryType::new(DomainType::QuarterCore, BoundaryType::Periodic, true).is_err());
    }

    #[test]
    fn test_geom_symmetry_combos() {
        let full = SymmetryType::full_core();
        let third: SymmetryType = "third periodic".parse().unwrap();
        let quarter: SymmetryType = "quarter reflective".parse().unwrap();

        assert!(check_valid_geom_symmetry_combo(GeomType::Hex, &third).is_ok());
        assert!(check_valid_geom_symmetry_combo(GeomType::Hex, &full).is_ok());
        assert!(check_valid_geom_symmetry_combo(GeomType::Cartesian, &quarter).is_ok());
        assert!(check_valid_geom_symmetry_combo(GeomType::Rzt, &quarter).is_ok());
        assert!(check_valid_geom_symmetry_combo(GeomType::Rz, &full).is_ok());

        assert!(check_valid_geom_symmetry_combo(GeomType::Hex, &quarter).is_err());
        assert!(check_valid_geom_symmetry_combo(GeomType::Cartesian, &third).is_err());
        assert!(CoreGeometry::new(GeomType::Hex, quarter).is_err());
    }

    #[test]
    fn test_restricted_domains() {
        let third: SymmetryType = "third periodic".parse().unwrap();
        let eighth: SymmetryType = "eighth reflective".parse().unwrap();
        let sixteenth: SymmetryType = "sixteenth reflective".parse().unwrap();

        assert!(CoreGeometry::new(GeomType::Cartesian, eighth).is_ok());
        assert!(matches!(
            CoreGeometry::new(GeomType::Cartesian, sixteenth),
            Err(BlueprintError::InvalidGeometry(_))
        ));
        assert!(matches!(
            CoreGeometry::new(GeomType::Rz, third),
            Err(BlueprintError::InvalidGeometry(_))
        ));
        assert!(CoreGeometry::new(GeomType::Rz, SymmetryType::full_core()).is_ok());
        assert!(CoreGeometry::new(GeomType::Rzt, sixteenth).is_ok());
    }

    #[test]
    fn test_default_geometry() {
        let geometry = CoreGeometry::default();
        assert_eq!(geometry.geom, GeomType::Hex);
        assert_eq!(geometry.symmetry.symmetry_factor(), 1.0);
    }
}
