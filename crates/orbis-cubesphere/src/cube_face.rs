//! The six faces of the cube-sphere and their orientation tables.

use std::fmt;

use glam::DVec3;

/// The six faces of the cube that is warped onto the sphere.
///
/// Each face has a local 2-D coordinate system `(x, z)` with origin at one
/// corner, plus the height axis `y` shared by every face.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum CubeFace {
    /// +X face
    PosX = 0,
    /// −X face
    NegX = 1,
    /// +Y face
    PosY = 2,
    /// −Y face
    NegY = 3,
    /// +Z face
    PosZ = 4,
    /// −Z face
    NegZ = 5,
}

/// Signed axis permutation taking the face-local unit vector `(s, 1, t)` to
/// a point on the `[-1, 1]` cube: `out[i] = sign[i] * local[source[i]]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisSwizzle {
    /// Which component of `(s, 1, t)` feeds each cube axis.
    pub source: [usize; 3],
    /// Sign applied to each cube axis.
    pub sign: [f64; 3],
}

impl AxisSwizzle {
    /// Apply the permutation to a face-local `(s, 1, t)` vector.
    #[inline]
    #[must_use]
    pub fn apply(&self, local: DVec3) -> DVec3 {
        let l = local.to_array();
        DVec3::new(
            self.sign[0] * l[self.source[0]],
            self.sign[1] * l[self.source[1]],
            self.sign[2] * l[self.source[2]],
        )
    }
}

const SWIZZLES: [AxisSwizzle; 6] = [
    // PosX: (1, t, -s)
    AxisSwizzle {
        source: [1, 2, 0],
        sign: [1.0, 1.0, -1.0],
    },
    // NegX: (-1, t, s)
    AxisSwizzle {
        source: [1, 2, 0],
        sign: [-1.0, 1.0, 1.0],
    },
    // PosY: (s, 1, -t)
    AxisSwizzle {
        source: [0, 1, 2],
        sign: [1.0, 1.0, -1.0],
    },
    // NegY: (s, -1, t)
    AxisSwizzle {
        source: [0, 1, 2],
        sign: [1.0, -1.0, 1.0],
    },
    // PosZ: (s, t, 1)
    AxisSwizzle {
        source: [0, 2, 1],
        sign: [1.0, 1.0, 1.0],
    },
    // NegZ: (-s, t, -1)
    AxisSwizzle {
        source: [0, 2, 1],
        sign: [-1.0, 1.0, -1.0],
    },
];

impl CubeFace {
    /// All six faces in canonical order.
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PosX,
        CubeFace::NegX,
        CubeFace::PosY,
        CubeFace::NegY,
        CubeFace::PosZ,
        CubeFace::NegZ,
    ];

    /// Position of this face in [`CubeFace::ALL`].
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Outward-pointing unit normal for this face.
    #[must_use]
    pub fn normal(self) -> DVec3 {
        match self {
            CubeFace::PosX => DVec3::X,
            CubeFace::NegX => DVec3::NEG_X,
            CubeFace::PosY => DVec3::Y,
            CubeFace::NegY => DVec3::NEG_Y,
            CubeFace::PosZ => DVec3::Z,
            CubeFace::NegZ => DVec3::NEG_Z,
        }
    }

    /// Direction of increasing local `x` on this face.
    #[must_use]
    pub fn tangent(self) -> DVec3 {
        match self {
            CubeFace::PosX => DVec3::NEG_Z,
            CubeFace::NegX => DVec3::Z,
            CubeFace::PosY => DVec3::X,
            CubeFace::NegY => DVec3::X,
            CubeFace::PosZ => DVec3::X,
            CubeFace::NegZ => DVec3::NEG_X,
        }
    }

    /// Direction of increasing local `z` on this face.
    #[must_use]
    pub fn bitangent(self) -> DVec3 {
        match self {
            CubeFace::PosX => DVec3::Y,
            CubeFace::NegX => DVec3::Y,
            CubeFace::PosY => DVec3::NEG_Z,
            CubeFace::NegY => DVec3::Z,
            CubeFace::PosZ => DVec3::Y,
            CubeFace::NegZ => DVec3::Y,
        }
    }

    /// The signed axis permutation for this face.
    #[inline]
    #[must_use]
    pub fn swizzle(self) -> &'static AxisSwizzle {
        &SWIZZLES[self.index()]
    }

    /// Short lowercase name, used in resource paths.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            CubeFace::PosX => "pos_x",
            CubeFace::NegX => "neg_x",
            CubeFace::PosY => "pos_y",
            CubeFace::NegY => "neg_y",
            CubeFace::PosZ => "pos_z",
            CubeFace::NegZ => "neg_z",
        }
    }
}

impl fmt::Display for CubeFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_matches_all_order() {
        for (i, face) in CubeFace::ALL.iter().enumerate() {
            assert_eq!(face.index(), i);
        }
    }

    #[test]
    fn test_tangent_cross_bitangent_equals_normal() {
        for face in CubeFace::ALL {
            let cross = face.tangent().cross(face.bitangent());
            assert!(
                (cross - face.normal()).length() < 1e-12,
                "tangent x bitangent != normal for {face:?}: got {cross:?}"
            );
        }
    }

    /// The lookup table must agree with `normal + s * tangent + t * bitangent`.
    #[test]
    fn test_swizzle_matches_face_basis() {
        let samples = [(-1.0, -1.0), (0.0, 0.0), (0.25, -0.75), (1.0, 0.5)];
        for face in CubeFace::ALL {
            for &(s, t) in &samples {
                let from_table = face.swizzle().apply(DVec3::new(s, 1.0, t));
                let from_basis = face.normal() + s * face.tangent() + t * face.bitangent();
                assert!(
                    (from_table - from_basis).length() < 1e-12,
                    "{face:?} at ({s}, {t}): table {from_table:?} vs basis {from_basis:?}"
                );
            }
        }
    }

    #[test]
    fn test_swizzle_is_a_permutation() {
        for face in CubeFace::ALL {
            let mut src = face.swizzle().source;
            src.sort_unstable();
            assert_eq!(src, [0, 1, 2], "{face:?}");
        }
    }

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<&str> = CubeFace::ALL.iter().map(|f| f.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 6);
        assert_eq!(CubeFace::NegY.to_string(), "neg_y");
    }
}
