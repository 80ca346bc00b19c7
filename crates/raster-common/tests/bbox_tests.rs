//! Tests for BoundingBox operations used when windowing rasters.

use raster_common::bbox::{BboxParseError, BoundingBox};

// ============================================================================
// parse tests
// ============================================================================

#[test]
fn test_parse_bbox_integer() {
    let bbox = BoundingBox::parse("0,0,100,100").unwrap();
    assert_eq!(bbox, BoundingBox::new(0.0, 0.0, 100.0, 100.0));
}

#[test]
fn test_parse_bbox_tolerates_whitespace() {
    let bbox = BoundingBox::parse(" 29.5, -1.5 ,30.9, -1.0 ").unwrap();
    assert!((bbox.min_x - 29.5).abs() < 1e-12);
    assert!((bbox.max_y - (-1.0)).abs() < 1e-12);
}

#[test]
fn test_parse_bbox_invalid_format() {
    assert!(matches!(
        BoundingBox::parse("0,0,100"),
        Err(BboxParseError::InvalidFormat(_))
    ));
    assert!(matches!(
        BoundingBox::parse("0,0,100,100,200"),
        Err(BboxParseError::InvalidFormat(_))
    ));
    assert!(matches!(
        BoundingBox::parse(""),
        Err(BboxParseError::InvalidFormat(_))
    ));
}

#[test]
fn test_parse_bbox_invalid_number() {
    let result = BoundingBox::parse("abc,0,100,100");
    assert!(matches!(result, Err(BboxParseError::InvalidNumber(_))));
}

#[test]
fn test_parse_bbox_inverted() {
    let result = BoundingBox::parse("10,10,0,0");
    assert!(matches!(result, Err(BboxParseError::Inverted(_))));
}

// ============================================================================
// Geometry
// ============================================================================

#[test]
fn test_bbox_dimensions() {
    let bbox = BoundingBox::new(-10.0, 5.0, 10.0, 25.0);
    assert_eq!(bbox.width(), 20.0);
    assert_eq!(bbox.height(), 20.0);
}

#[test]
fn test_bbox_intersects_adjacent_edge() {
    // Touching at an edge is not an intersection
    let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    let b = BoundingBox::new(10.0, 0.0, 20.0, 10.0);
    assert!(!a.intersects(&b));
    assert!(a.intersection(&b).is_none());
}

#[test]
fn test_bbox_intersection_with_self() {
    let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    assert_eq!(bbox.intersection(&bbox).unwrap(), bbox);
}

#[test]
fn test_bbox_contains_point_on_edge() {
    let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    assert!(bbox.contains_point(0.0, 5.0));
    assert!(bbox.contains_point(10.0, 10.0));
    assert!(!bbox.contains_point(10.0001, 5.0));
}

#[test]
fn test_bbox_corners_ring_order() {
    let bbox = BoundingBox::new(1.0, 2.0, 3.0, 4.0);
    assert_eq!(
        bbox.corners(),
        [(1.0, 2.0), (3.0, 2.0), (3.0, 4.0), (1.0, 4.0)]
    );
}
