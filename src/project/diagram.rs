use crate::foundation::budget::MemoryBudget;
use crate::foundation::core::{CHANNELS, row_bytes};
use crate::foundation::error::{PanoError, PanoResult};
use crate::geometry::face::Face;
use crate::output::sink::RowSink;
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};
use std::rc::Rc;

/// Default forward-mapping grid resolution per face for [`DiagramMode::Numerical`].
pub const DEFAULT_SAMPLES: u32 = 5000;

/// How the face diagram decides which face a source pixel belongs to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DiagramMode {
    /// Classify each equirectangular pixel in closed form.
    #[default]
    Analytic,
    /// Forward-map a dense `samples x samples` grid of every face and paint
    /// whichever pixels are hit.
    Numerical {
        /// Grid resolution per face.
        samples: u32,
    },
}

/// The cube face seen in direction `(theta, phi)`.
///
/// `theta` is the azimuth in `[-pi, pi]` and `phi` the elevation in
/// `[-pi/2, pi/2]`. Ties on an edge go to the polar face.
pub fn face_at(theta: f64, phi: f64) -> Face {
    let tan_phi = phi.tan();
    let equatorial = theta.abs() < FRAC_PI_4 || theta.abs() >= 3.0 * FRAC_PI_4;
    // Elevation of the cube edge at this azimuth.
    let threshold = if equatorial {
        theta.cos().abs()
    } else {
        theta.sin().abs()
    };

    if tan_phi >= threshold {
        Face::Top
    } else if tan_phi < -threshold {
        Face::Bottom
    } else if equatorial {
        if theta.abs() < FRAC_PI_4 {
            Face::Front
        } else {
            Face::Back
        }
    } else if theta < 0.0 {
        Face::Left
    } else {
        Face::Right
    }
}

/// Render an equirectangular face-assignment map into `sink`.
///
/// The sink must be twice as wide as it is tall. Each pixel is painted with
/// [`Face::diagram_color`]; in numerical mode pixels no sample lands on stay
/// black.
#[tracing::instrument(skip(sink, budget), fields(width = sink.width(), height = sink.height()))]
pub fn render_face_diagram(
    sink: &mut dyn RowSink,
    mode: DiagramMode,
    budget: &Rc<MemoryBudget>,
) -> PanoResult<()> {
    let width = sink.width();
    let height = sink.height();
    if height < 2 || width != 2 * height {
        return Err(PanoError::config(format!(
            "face diagram must be twice as wide as it is tall, got {width}x{height}"
        )));
    }
    let step = PI / f64::from(height - 1);

    match mode {
        DiagramMode::Analytic => {
            let mut row = vec![0u8; row_bytes(width)];
            for v in 0..height {
                let phi = FRAC_PI_2 - f64::from(v) * step;
                for (u, px) in row.chunks_exact_mut(CHANNELS).enumerate() {
                    let theta = u as f64 * step - PI;
                    px.copy_from_slice(&face_at(theta, phi).diagram_color());
                }
                sink.write_row(&row)?;
            }
        }
        DiagramMode::Numerical { samples } => {
            let reservation = budget.claim(&[
                CHANNELS as u64,
                u64::from(width),
                u64::from(height),
            ])?;
            let mut image = vec![0u8; reservation.bytes() as usize];
            let n = samples as f32;

            for face in Face::ALL {
                let color = face.diagram_color();
                for j in 0..samples {
                    let b = 2.0 * j as f32 / n - 1.0;
                    for i in 0..samples {
                        let a = 2.0 * i as f32 / n - 1.0;
                        let [x, y, z] = face.direction(a, b);
                        let theta = f64::from(y.atan2(x));
                        let phi = f64::from(z.atan2(x.hypot(y)));
                        let u = (((theta + PI) / step) as u32).min(width - 1);
                        let v = (((FRAC_PI_2 - phi) / step) as u32).min(height - 1);
                        let start = row_bytes(width) * v as usize + row_bytes(u);
                        image[start..start + CHANNELS].copy_from_slice(&color);
                    }
                }
            }

            for row in image.chunks_exact(row_bytes(width)) {
                sink.write_row(row)?;
            }
        }
    }

    sink.finish()
}

#[cfg(test)]
#[path = "../../tests/unit/project/diagram.rs"]
mod tests;
