//! Math utilities
//!
//! Re-exports glam with the conversions prefab data needs

pub use glam::*;

/// Build a unit quaternion from `(x, y, z, w)` components.
///
/// Zero-length input yields the identity rotation.
pub fn quat_from_vec4(v: Vec4) -> Quat {
    let q = Quat::from_xyzw(v.x, v.y, v.z, v.w);
    if q.length_squared() <= f32::EPSILON {
        Quat::IDENTITY
    } else {
        q.normalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quat_is_normalized() {
        let q = quat_from_vec4(Vec4::new(0.0, 0.0, 0.0, 2.0));
        assert_eq!(q, Quat::IDENTITY);
        assert_eq!(quat_from_vec4(Vec4::ZERO), Quat::IDENTITY);
    }
}
