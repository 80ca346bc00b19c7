//! Region geometries used to clip rasters to administrative units.

use crate::BoundingBox;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A polygonal region made of one or more closed rings.
///
/// Rings are combined with the even-odd rule, so holes and the parts of a
/// multipolygon can be stored side by side without distinguishing them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub rings: Vec<Vec<(f64, f64)>>,
}

impl Polygon {
    pub fn new(rings: Vec<Vec<(f64, f64)>>) -> Self {
        Self { rings }
    }

    /// A single-ring polygon.
    pub fn from_exterior(ring: Vec<(f64, f64)>) -> Self {
        Self { rings: vec![ring] }
    }

    /// The rectangle covered by `bbox`.
    pub fn from_bbox(bbox: &BoundingBox) -> Self {
        Self::from_exterior(bbox.corners().to_vec())
    }

    /// Parse a GeoJSON `Polygon` or `MultiPolygon` geometry (or a `Feature` wrapping one).
    pub fn from_geojson(value: &Value) -> Result<Self, GeometryError> {
        let geometry = match value.get("type").and_then(Value::as_str) {
            Some("Feature") => value
                .get("geometry")
                .ok_or_else(|| GeometryError::InvalidGeoJson("feature has no geometry".into()))?,
            _ => value,
        };

        let kind = geometry
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| GeometryError::InvalidGeoJson("missing geometry type".into()))?;
        let coordinates = geometry
            .get("coordinates")
            .ok_or_else(|| GeometryError::InvalidGeoJson("missing coordinates".into()))?;

        let rings = match kind {
            "Polygon" => parse_rings(coordinates)?,
            "MultiPolygon" => {
                let parts = coordinates
                    .as_array()
                    .ok_or_else(|| GeometryError::InvalidGeoJson("expected polygon list".into()))?;
                let mut rings = Vec::new();
                for part in parts {
                    rings.extend(parse_rings(part)?);
                }
                rings
            }
            other => return Err(GeometryError::UnsupportedGeometry(other.to_string())),
        };

        let polygon = Self::new(rings);
        if polygon.is_empty() {
            return Err(GeometryError::Degenerate);
        }
        Ok(polygon)
    }

    /// True when no ring has at least three vertices.
    pub fn is_empty(&self) -> bool {
        self.rings.iter().all(|ring| ring.len() < 3)
    }

    /// Calculate the bounding box of the polygon.
    pub fn bbox(&self) -> BoundingBox {
        let mut min_x = f64::MAX;
        let mut min_y = f64::MAX;
        let mut max_x = f64::MIN;
        let mut max_y = f64::MIN;

        for (x, y) in self.rings.iter().flatten() {
            min_x = min_x.min(*x);
            max_x = max_x.max(*x);
            min_y = min_y.min(*y);
            max_y = max_y.max(*y);
        }

        BoundingBox::new(min_x, min_y, max_x, max_y)
    }

    /// Check if a point is inside the polygon using ray casting.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        let mut inside = false;

        for ring in &self.rings {
            let n = ring.len();
            if n < 3 {
                continue;
            }

            let mut j = n - 1;
            for i in 0..n {
                let (xi, yi) = ring[i];
                let (xj, yj) = ring[j];

                if ((yi > y) != (yj > y)) && (x < (xj - xi) * (y - yi) / (yj - yi) + xi) {
                    inside = !inside;
                }
                j = i;
            }
        }

        inside
    }

    /// Check whether the polygon touches any part of an axis-aligned rectangle.
    pub fn touches_rect(&self, rect: &BoundingBox) -> bool {
        if !self.bbox_overlaps(rect) {
            return false;
        }

        if rect.corners().iter().any(|&(x, y)| self.contains_point(x, y)) {
            return true;
        }

        if self
            .rings
            .iter()
            .flatten()
            .any(|&(x, y)| rect.contains_point(x, y))
        {
            return true;
        }

        let corners = rect.corners();
        self.edges().any(|(a, b)| {
            (0..4).any(|k| segments_intersect(a, b, corners[k], corners[(k + 1) % 4]))
        })
    }

    fn bbox_overlaps(&self, rect: &BoundingBox) -> bool {
        let own = self.bbox();
        own.min_x <= rect.max_x
            && own.max_x >= rect.min_x
            && own.min_y <= rect.max_y
            && own.max_y >= rect.min_y
    }

    fn edges(&self) -> impl Iterator<Item = ((f64, f64), (f64, f64))> + '_ {
        self.rings
            .iter()
            .filter(|ring| ring.len() >= 2)
            .flat_map(|ring| {
                let n = ring.len();
                (0..n).map(move |i| (ring[i], ring[(i + 1) % n]))
            })
    }
}

fn parse_rings(value: &Value) -> Result<Vec<Vec<(f64, f64)>>, GeometryError> {
    let rings = value
        .as_array()
        .ok_or_else(|| GeometryError::InvalidGeoJson("expected ring list".into()))?;

    rings
        .iter()
        .map(|ring| {
            ring.as_array()
                .ok_or_else(|| GeometryError::InvalidGeoJson("expected position list".into()))?
                .iter()
                .map(parse_position)
                .collect()
        })
        .collect()
}

fn parse_position(value: &Value) -> Result<(f64, f64), GeometryError> {
    let pair = value
        .as_array()
        .filter(|p| p.len() >= 2)
        .ok_or_else(|| GeometryError::InvalidGeoJson(format!("invalid position: {}", value)))?;

    match (pair[0].as_f64(), pair[1].as_f64()) {
        (Some(x), Some(y)) => Ok((x, y)),
        _ => Err(GeometryError::InvalidGeoJson(format!(
            "non-numeric position: {}",
            value
        ))),
    }
}

fn orientation(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> f64 {
    (b.0 - a.0) * (c.1 - a.1) - (b.1 - a.1) * (c.0 - a.0)
}

fn on_segment(a: (f64, f64), b: (f64, f64), p: (f64, f64)) -> bool {
    p.0 >= a.0.min(b.0) && p.0 <= a.0.max(b.0) && p.1 >= a.1.min(b.1) && p.1 <= a.1.max(b.1)
}

fn segments_intersect(p1: (f64, f64), p2: (f64, f64), q1: (f64, f64), q2: (f64, f64)) -> bool {
    let d1 = orientation(q1, q2, p1);
    let d2 = orientation(q1, q2, p2);
    let d3 = orientation(p1, p2, q1);
    let d4 = orientation(p1, p2, q2);

    if ((d1 > 0.0) != (d2 > 0.0)) && d1 != 0.0 && d2 != 0.0
        && ((d3 > 0.0) != (d4 > 0.0)) && d3 != 0.0 && d4 != 0.0
    {
        return true;
    }

    (d1 == 0.0 && on_segment(q1, q2, p1))
        || (d2 == 0.0 && on_segment(q1, q2, p2))
        || (d3 == 0.0 && on_segment(p1, p2, q1))
        || (d4 == 0.0 && on_segment(p1, p2, q2))
}

#[derive(Debug, thiserror::Error)]
pub enum GeometryError {
    #[error("invalid GeoJSON: {0}")]
    InvalidGeoJson(String),

    #[error("unsupported geometry type: {0}")]
    UnsupportedGeometry(String),

    #[error("polygon has no ring with at least three vertices")]
    Degenerate,
}
