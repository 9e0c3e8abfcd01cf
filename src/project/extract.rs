use crate::foundation::core::{CHANNELS, row_bytes};
use crate::foundation::error::PanoResult;
use crate::geometry::face::Face;
use crate::input::source::SourceBuffer;
use crate::output::sink::RowSink;
use crate::project::atan::atan2_approx;
use std::f32::consts::{FRAC_PI_2, PI, TAU};

/// Rasterize `face` from an equirectangular `source` into `sink`.
///
/// Every destination pixel is mapped back onto the sphere through its pixel
/// centre and bilinearly sampled from the source. Each column `i` in the left
/// half shares its polar angle with its mirror `width - 1 - i`, so only the
/// left half pays for the `atan2` evaluations; the mirrored azimuth comes from
/// the face's reflection rule. The source window must contain every sample
/// the face needs, which holds for `face.crop_rect()` and the full window.
#[tracing::instrument(skip(source, sink), fields(width = sink.width(), height = sink.height()))]
pub fn extract_face(face: Face, source: &SourceBuffer, sink: &mut dyn RowSink) -> PanoResult<()> {
    let dest_width = sink.width();
    let dest_height = sink.height();
    let u_scale = source.width().saturating_sub(1) as f32 / TAU;
    let v_scale = source.height().saturating_sub(1) as f32 / PI;
    let reflect = face.axes().reflect;

    let mut row = vec![0u8; row_bytes(dest_width)];
    let half = dest_width / 2;

    for j in 0..dest_height {
        let b = (2 * j + 1) as f32 / dest_height as f32 - 1.0;

        for i in 0..half {
            let a = (2 * i + 1) as f32 / dest_width as f32 - 1.0;
            let [x, y, z] = face.direction(a, b);
            let theta = atan2_approx(y, x);
            let phi = atan2_approx(z, x.hypot(y));

            let v = (FRAC_PI_2 - phi) * v_scale;
            let start = i as usize * CHANNELS;
            source.interpolate(&mut row[start..], (theta + PI) * u_scale, v);

            let mirror = (dest_width - 1 - i) as usize * CHANNELS;
            let theta = reflect.apply(theta);
            source.interpolate(&mut row[mirror..], (theta + PI) * u_scale, v);
        }

        if dest_width % 2 == 1 {
            // The centre column has no mirror partner.
            let [x, y, z] = face.direction(0.0, b);
            let theta = atan2_approx(y, x);
            let phi = atan2_approx(z, x.hypot(y));
            let start = half as usize * CHANNELS;
            source.interpolate(
                &mut row[start..],
                (theta + PI) * u_scale,
                (FRAC_PI_2 - phi) * v_scale,
            );
        }

        sink.write_row(&row)?;
    }

    sink.finish()
}

#[cfg(test)]
#[path = "../../tests/unit/project/extract.rs"]
mod tests;
