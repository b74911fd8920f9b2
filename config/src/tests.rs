//! # Tests for Config Constants
//!
//! Unit tests verifying the relationships between configuration constants.

use crate::constants::*;

#[test]
fn test_epsilon_is_positive_and_small() {
    assert!(EPSILON > 0.0);
    assert!(EPSILON < 1e-6);
}

#[test]
fn test_vertex_merge_epsilon_larger_than_epsilon() {
    assert!(VERTEX_MERGE_EPSILON >= EPSILON);
}

#[test]
fn test_plane_epsilon_between_merge_and_tolerance() {
    assert!(PLANE_EPSILON >= EPSILON);
    assert!(PLANE_EPSILON < DEFAULT_TOLERANCE);
}

#[test]
fn test_segment_minimums_ordered() {
    assert!(MIN_ARC_SEGMENTS >= 2);
    assert!(MIN_FIXED_SEGMENTS >= 3);
    assert!(MIN_ADAPTIVE_SEGMENTS >= MIN_FIXED_SEGMENTS);
    assert!(MAX_SEGMENTS > MIN_ADAPTIVE_SEGMENTS);
}

#[test]
fn test_solver_limits_positive() {
    assert!(NEWTON_MAX_ITERATIONS > 0);
    assert!(BISECTION_MAX_ITERATIONS > NEWTON_MAX_ITERATIONS);
    assert!(CURVE_PARAMETER_TOLERANCE > 0.0);
}
