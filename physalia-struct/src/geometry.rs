//! Coordinate geometry: centroids and window centering.
//!
//! Fragment comparison is translation-invariant, so both the library
//! fragments and every query window are centered on their centroid before
//! the RMSD kernel sees them.

use alloc::vec::Vec;

use crate::types::Point3D;

/// Geometric centroid (unweighted center of mass) of a slice of points.
///
/// The centroid of an empty slice is the origin.
pub fn centroid(points: &[Point3D]) -> Point3D {
    if points.is_empty() {
        return Point3D::zero();
    }
    let mut sum = Point3D::zero();
    for p in points {
        sum = sum.add(p);
    }
    sum.scale(1.0 / points.len() as f64)
}

/// Return a copy of `points` translated so its centroid is the origin.
pub fn centered(points: &[Point3D]) -> Vec<Point3D> {
    let com = centroid(points);
    points.iter().map(|p| p.sub(&com)).collect()
}
