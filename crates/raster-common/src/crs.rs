//! Coordinate Reference System types and utilities.

use serde::{Deserialize, Serialize};
use std::fmt;

/// EPSG-coded coordinate reference systems.
///
/// The codes the validation pipelines actually produce get their own
/// variants; anything else is carried through as [`CrsCode::Epsg`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CrsCode {
    /// WGS84 Geographic (lat/lon in degrees)
    Epsg4326,
    /// Web Mercator (meters)
    Epsg3857,
    /// NAD83 Geographic
    Epsg4269,
    /// Any other EPSG code
    Epsg(u32),
}

impl CrsCode {
    /// The CRS assigned to rasters that arrive without one.
    pub const WGS84: CrsCode = CrsCode::Epsg4326;

    /// Parse a CRS string.
    ///
    /// Accepts formats like:
    /// - "EPSG:4326"
    /// - "epsg:32633"
    /// - "CRS:84" (equivalent to EPSG:4326 with lon/lat axis order)
    pub fn parse(s: &str) -> Result<Self, CrsParseError> {
        let normalized = s.trim().to_uppercase();

        if normalized == "CRS:84" {
            return Ok(CrsCode::Epsg4326);
        }

        let code = normalized
            .strip_prefix("EPSG:")
            .ok_or_else(|| CrsParseError::UnsupportedCrs(s.to_string()))?;
        let code: u32 = code
            .parse()
            .map_err(|_| CrsParseError::InvalidCode(s.to_string()))?;

        Ok(Self::from_epsg(code))
    }

    /// Build from a numeric EPSG code, folding well-known codes into their variants.
    pub fn from_epsg(code: u32) -> Self {
        match code {
            4326 => CrsCode::Epsg4326,
            3857 | 900913 => CrsCode::Epsg3857,
            4269 => CrsCode::Epsg4269,
            other => CrsCode::Epsg(other),
        }
    }

    /// Numeric EPSG code.
    pub fn epsg(&self) -> u32 {
        match self {
            CrsCode::Epsg4326 => 4326,
            CrsCode::Epsg3857 => 3857,
            CrsCode::Epsg4269 => 4269,
            CrsCode::Epsg(code) => *code,
        }
    }

    /// Check if this is a geographic (lat/lon) CRS.
    pub fn is_geographic(&self) -> bool {
        matches!(self, CrsCode::Epsg4326 | CrsCode::Epsg4269)
    }
}

impl Default for CrsCode {
    fn default() -> Self {
        Self::WGS84
    }
}

impl fmt::Display for CrsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

impl TryFrom<String> for CrsCode {
    type Error = CrsParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CrsCode> for String {
    fn from(code: CrsCode) -> Self {
        code.to_string()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CrsParseError {
    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),

    #[error("Invalid EPSG code: {0}")]
    InvalidCode(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_crs() {
        assert_eq!(CrsCode::parse("EPSG:4326").unwrap(), CrsCode::Epsg4326);
        assert_eq!(CrsCode::parse("epsg:3857").unwrap(), CrsCode::Epsg3857);
        assert_eq!(CrsCode::parse("CRS:84").unwrap(), CrsCode::Epsg4326);
        assert_eq!(CrsCode::parse("EPSG:32633").unwrap(), CrsCode::Epsg(32633));
        assert!(CrsCode::parse("EPSG:abc").is_err());
        assert!(CrsCode::parse("+proj=longlat").is_err());
    }

    #[test]
    fn test_display_roundtrips_through_parse() {
        for code in [CrsCode::Epsg4326, CrsCode::Epsg3857, CrsCode::Epsg(32736)] {
            assert_eq!(CrsCode::parse(&code.to_string()).unwrap(), code);
        }
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&CrsCode::Epsg4326).unwrap();
        assert_eq!(json, "\"EPSG:4326\"");

        let parsed: CrsCode = serde_json::from_str("\"EPSG:4269\"").unwrap();
        assert_eq!(parsed, CrsCode::Epsg4269);
    }

    #[test]
    fn test_default_is_wgs84() {
        assert_eq!(CrsCode::default(), CrsCode::Epsg4326);
        assert!(CrsCode::default().is_geographic());
    }
}
