use crate::foundation::error::{PanoError, PanoResult};
use crate::geometry::crop::CropRect;
use std::f32::consts::PI;
use std::fmt;
use std::str::FromStr;

/// `atan(sqrt(2)) / pi`: the polar extent of the top face in the source image.
const POLAR_EXTENT: f64 = 0.304_086_723_984_7;

/// One of the six faces of the cube inscribed in the panorama sphere.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Face {
    /// Looking along -x.
    Back,
    /// Looking along -y.
    Left,
    /// Looking along +x, the centre of the source image.
    Front,
    /// Looking along +y.
    Right,
    /// Looking along +z.
    Top,
    /// Looking along -z.
    Bottom,
}

/// A cartesian axis of the cube.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    /// x axis, pointing at the front face.
    X,
    /// y axis, pointing at the right face.
    Y,
    /// z axis, pointing up.
    Z,
}

impl Axis {
    fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// How the azimuth changes when a face image is mirrored about its vertical axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThetaReflection {
    /// `theta -> -theta`
    Negate,
    /// `theta -> ±pi - theta`, keeping the sign of theta.
    AboutPi,
}

impl ThetaReflection {
    /// Apply the reflection to an azimuth in `[-pi, pi]`.
    #[inline]
    pub fn apply(self, theta: f32) -> f32 {
        match self {
            ThetaReflection::Negate => -theta,
            ThetaReflection::AboutPi => PI.copysign(theta) - theta,
        }
    }
}

/// Axis assignment for one face.
///
/// The invariant axis is fixed at `invariant_sign`; the vertical image
/// coordinate `b` drives `major` and the horizontal coordinate `a` drives
/// `minor`, both in `[-1, 1]` and scaled by their sign.
#[derive(Clone, Copy, Debug)]
pub struct FaceAxes {
    /// Axis held at ±1.
    pub invariant: Axis,
    /// Value of the invariant axis.
    pub invariant_sign: f32,
    /// Axis driven by the image row.
    pub major: Axis,
    /// Sign applied to the row coordinate.
    pub major_sign: f32,
    /// Axis driven by the image column.
    pub minor: Axis,
    /// Sign applied to the column coordinate.
    pub minor_sign: f32,
    /// Mirror rule for the azimuth.
    pub reflect: ThetaReflection,
}

const fn axes(
    invariant: (Axis, f32),
    major: (Axis, f32),
    minor: (Axis, f32),
    reflect: ThetaReflection,
) -> FaceAxes {
    FaceAxes {
        invariant: invariant.0,
        invariant_sign: invariant.1,
        major: major.0,
        major_sign: major.1,
        minor: minor.0,
        minor_sign: minor.1,
        reflect,
    }
}

use Axis::{X, Y, Z};
use ThetaReflection::{AboutPi, Negate};

const FACE_AXES: [FaceAxes; 6] = [
    axes((X, -1.0), (Z, -1.0), (Y, -1.0), Negate),
    axes((Y, -1.0), (Z, -1.0), (X, 1.0), AboutPi),
    axes((X, 1.0), (Z, -1.0), (Y, 1.0), Negate),
    axes((Y, 1.0), (Z, -1.0), (X, -1.0), AboutPi),
    axes((Z, 1.0), (X, 1.0), (Y, 1.0), Negate),
    axes((Z, -1.0), (X, -1.0), (Y, 1.0), Negate),
];

const CROP_RECTS: [CropRect; 6] = [
    CropRect::new(7. / 8., 1. / 8., 1. / 4., 3. / 4.),
    CropRect::new(1. / 8., 3. / 8., 1. / 4., 3. / 4.),
    CropRect::new(3. / 8., 5. / 8., 1. / 4., 3. / 4.),
    CropRect::new(5. / 8., 7. / 8., 1. / 4., 3. / 4.),
    CropRect::new(0.0, 1.0, 0.0, POLAR_EXTENT),
    CropRect::new(0.0, 1.0, 1.0 - POLAR_EXTENT, 1.0),
];

const LETTERS: [&str; 6] = ["b", "l", "f", "r", "u", "d"];
const NAMES: [&str; 6] = ["back", "left", "front", "right", "top", "bottom"];

impl Face {
    /// All faces in index order.
    pub const ALL: [Face; 6] = [
        Face::Back,
        Face::Left,
        Face::Front,
        Face::Right,
        Face::Top,
        Face::Bottom,
    ];

    /// The face's index, 0..6.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Look up a face by index.
    pub fn from_index(index: usize) -> Option<Face> {
        Face::ALL.get(index).copied()
    }

    /// Look up a face by index, letter or name.
    pub fn from_name(name: &str) -> Option<Face> {
        Face::ALL.into_iter().find(|f| {
            name == f.letter() || name == f.name() || name == f.index().to_string()
        })
    }

    /// The letter Pannellum uses for this face. Top and bottom are (u)p and
    /// (d)own so as not to clash with (b)ack.
    pub fn letter(self) -> &'static str {
        LETTERS[self.index()]
    }

    /// The face's name.
    pub fn name(self) -> &'static str {
        NAMES[self.index()]
    }

    /// The axis assignment record.
    pub fn axes(self) -> &'static FaceAxes {
        &FACE_AXES[self.index()]
    }

    /// The fractional source window containing every sample this face needs.
    pub fn crop_rect(self) -> CropRect {
        CROP_RECTS[self.index()]
    }

    /// The point `(x, y, z)` on the 2x2x2 cube for face coordinates `a`
    /// (horizontal) and `b` (vertical), both in `[-1, 1]`.
    pub fn direction(self, a: f32, b: f32) -> [f32; 3] {
        let axes = self.axes();
        let mut p = [0.0f32; 3];
        p[axes.invariant.index()] = axes.invariant_sign;
        p[axes.major.index()] = axes.major_sign * b;
        p[axes.minor.index()] = axes.minor_sign * a;
        p
    }

    /// The RGB colour used for this face in the face diagram.
    pub fn diagram_color(self) -> [u8; 3] {
        match self {
            Face::Back => [0xff, 0x00, 0x00],
            Face::Left => [0x00, 0xff, 0x00],
            Face::Front => [0x00, 0x00, 0xff],
            Face::Right => [0x00, 0xff, 0xff],
            Face::Top => [0xff, 0x00, 0xff],
            Face::Bottom => [0xff, 0xff, 0x00],
        }
    }
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Face {
    type Err = PanoError;

    fn from_str(s: &str) -> PanoResult<Self> {
        Face::from_name(s).ok_or_else(|| {
            PanoError::config(format!(
                "invalid face name \"{s}\", must be one of: {}, {}",
                LETTERS.join(", "),
                NAMES.join(", ")
            ))
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/face.rs"]
mod tests;
