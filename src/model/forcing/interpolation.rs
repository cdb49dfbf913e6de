/*
Copyright 2021 Jakub Lewandowski

This file is part of Large-Scale Forcing Engine (LSFE).

Large-Scale Forcing Engine (LSFE) is a free software: you can redistribute it and/or modify
it under the terms of the GNU General Public License as published by
the Free Software Foundation; either version 3 of the License, or
(at your option) any later version.

Large-Scale Forcing Engine (LSFE) is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
GNU General Public License for more details.

You should have received a copy of the GNU General Public License
along with Large-Scale Forcing Engine (LSFE). If not, see https://www.gnu.org/licenses/.
*/

//! Vertical interpolation from constant pressure levels
//! onto the (time-varying) model levels.

use crate::errors::NumericalError;
use crate::model::bisection::find_segment;
use crate::Float;
use log::debug;
use ndarray::{Array2, ArrayView1, ArrayView2};

/// Linear interpolation of `fp(xp)` at `x`.
///
/// `xp` must be strictly monotonic (in any direction) with at least
/// two points. Outside of `xp` the closest segment is extrapolated.
/// When `x` equals one of `xp` the corresponding `fp` is returned as is.
pub fn interpolate_linear(
    xp: &[Float],
    fp: &[Float],
    x: Float,
    name: &'static str,
) -> Result<Float, NumericalError> {
    if xp.len() < 2 || fp.len() != xp.len() {
        return Err(NumericalError::TooFewLevels(xp.len().min(fp.len())));
    }

    let value = match xp.iter().position(|&level| level == x) {
        Some(k) => fp[k],
        None => {
            let k = find_segment(xp, &x)?;
            let slope = (fp[k + 1] - fp[k]) / (xp[k + 1] - xp[k]);

            fp[k] + slope * (x - xp[k])
        }
    };

    if !value.is_finite() {
        return Err(NumericalError::NonFiniteInterpolation(name));
    }

    Ok(value)
}

/// Interpolates `values` of shape `(time, pressure level)` onto
/// pressures `p_model` of shape `(time, model level)`, separately
/// for every time step.
pub fn interpolate_to_model_levels(
    p_levels: ArrayView1<Float>,
    values: ArrayView2<Float>,
    p_model: ArrayView2<Float>,
    name: &'static str,
) -> Result<Array2<Float>, NumericalError> {
    let xp = p_levels.to_vec();

    let (p_min, p_max) = xp
        .iter()
        .fold((Float::INFINITY, Float::NEG_INFINITY), |(lo, hi), &p| {
            (lo.min(p), hi.max(p))
        });

    let mut result = Array2::zeros(p_model.raw_dim());

    for ((row, fp), p_row) in result
        .rows_mut()
        .into_iter()
        .zip(values.rows())
        .zip(p_model.rows())
    {
        let fp = fp.to_vec();

        for (target, &p) in row.into_iter().zip(p_row.iter()) {
            if p < p_min || p > p_max {
                debug!(
                    "Extrapolating {} to {:.1} Pa beyond pressure levels {:.1}..{:.1} Pa",
                    name, p, p_min, p_max
                );
            }

            *target = interpolate_linear(&xp, &fp, p, name)?;
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::{interpolate_linear, interpolate_to_model_levels};
    use crate::errors::NumericalError;
    use crate::Float;
    use float_cmp::approx_eq;
    use ndarray::{arr1, arr2};

    #[test]
    fn exact_level_is_identity() {
        let xp = [100_000.0, 92_500.0, 85_000.0];
        let fp = [0.1 + 0.2, 7.3, -2.9];

        // no arithmetic is done on an exact match
        assert_eq!(interpolate_linear(&xp, &fp, 92_500.0, "ug").unwrap(), 7.3);
        assert_eq!(interpolate_linear(&xp, &fp, 100_000.0, "ug").unwrap(), 0.1 + 0.2);
    }

    #[test]
    fn between_levels() {
        let xp = [100_000.0, 90_000.0];
        let fp = [10.0, 20.0];

        let value = interpolate_linear(&xp, &fp, 95_000.0, "ug").unwrap();

        assert!(approx_eq!(Float, value, 15.0));
    }

    #[test]
    fn extrapolation_below_lowest_level() {
        let xp = [100_000.0, 90_000.0, 80_000.0];
        let fp = [10.0, 20.0, 25.0];

        let value = interpolate_linear(&xp, &fp, 102_000.0, "ug").unwrap();

        assert!(approx_eq!(Float, value, 8.0, epsilon = 1e-12));
    }

    #[test]
    fn non_finite_result() {
        let xp = [100_000.0, 90_000.0];
        let fp = [10.0, Float::NAN];

        assert!(matches!(
            interpolate_linear(&xp, &fp, 95_000.0, "vg"),
            Err(NumericalError::NonFiniteInterpolation("vg"))
        ));
    }

    #[test]
    fn single_level() {
        assert!(matches!(
            interpolate_linear(&[100_000.0], &[1.0], 95_000.0, "vg"),
            Err(NumericalError::TooFewLevels(1))
        ));
    }

    #[test]
    fn per_time_step() {
        let p_levels = arr1(&[100_000.0, 90_000.0, 80_000.0]);
        let values = arr2(&[[1.0, 2.0, 3.0], [10.0, 20.0, 30.0]]);
        let p_model = arr2(&[[95_000.0, 80_000.0], [90_000.0, 85_000.0]]);

        let result =
            interpolate_to_model_levels(p_levels.view(), values.view(), p_model.view(), "ug")
                .unwrap();

        assert!(approx_eq!(Float, result[[0, 0]], 1.5));
        assert_eq!(result[[0, 1]], 3.0);
        assert_eq!(result[[1, 0]], 20.0);
        assert!(approx_eq!(Float, result[[1, 1]], 25.0));
    }
}
