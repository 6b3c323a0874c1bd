use nalgebra::Vector3;

/// Relative tolerance used by [`assert_equal`], sized for single precision.
pub const F32_RELTOL: f32 = 1e-5;

pub fn assert_equal(left: f32, right: f32) {
    assert_equal_reltol(left, right, F32_RELTOL);
}

pub fn assert_equal_reltol(left: f32, right: f32, reltol: f32) {
    let max = left.abs().max(right.abs());
    if max < f32::EPSILON {
        // both values are effectively zero
        return;
    }
    let abs_diff = (left - right).abs();
    let rel_diff = abs_diff / max;

    assert!(
        rel_diff < reltol,
        "Assertion failed: left ({}) and right ({}) are not approximately equal. Relative difference: {}. Absolute difference: {}",
        left,
        right,
        rel_diff,
        abs_diff,
    );
}

pub fn assert_equal_abstol(left: f32, right: f32, abstol: f32) {
    let abs_diff = (left - right).abs();
    assert!(
        abs_diff <= abstol,
        "Assertion failed: left ({}) and right ({}) differ by {} (tolerance {})",
        left,
        right,
        abs_diff,
        abstol,
    );
}

/// Component-wise [`assert_equal`] for three-axis quantities.
pub fn assert_vector_equal(left: &Vector3<f32>, right: [f32; 3]) {
    for (i, expected) in right.iter().enumerate() {
        assert_equal(left[i], *expected);
    }
}

/// Asserts that every component lies inside `[-limit, limit]`.
pub fn assert_within(vector: &Vector3<f32>, limit: f32) {
    for i in 0..3 {
        assert!(
            vector[i].abs() <= limit,
            "Assertion failed: component {} ({}) exceeds limit {}",
            i,
            vector[i],
            limit,
        );
    }
}
