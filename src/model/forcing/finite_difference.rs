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

//! Centered finite-difference derivatives evaluated
//! at every gridpoint of the averaging window.
//!
//! Each stencil is a fixed list of taps. A tap shifts the window
//! by `(row_offset, col_offset)` gridpoints (rows are latitudes,
//! columns are longitudes) and multiplies the shifted values by its
//! weight. The weighted sum divided by the grid spacing gives the
//! derivative. Values outside the window are read from the full field.

use super::window::AveragingWindow;
use crate::errors::ConfigError;
use crate::Float;
use ndarray::{Array4, ArrayView4, Zip};
use std::fmt;
use std::str::FromStr;

/// Single element of a finite-difference stencil.
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug)]
pub struct StencilTap {
    pub row_offset: isize,
    pub col_offset: isize,
    pub weight: Float,
}

const fn tap(row_offset: isize, col_offset: isize, weight: Float) -> StencilTap {
    StencilTap {
        row_offset,
        col_offset,
        weight,
    }
}

const SECOND_X: [StencilTap; 2] = [tap(0, -1, -0.5), tap(0, 1, 0.5)];
const SECOND_Y: [StencilTap; 2] = [tap(-1, 0, -0.5), tap(1, 0, 0.5)];

const FOURTH_X: [StencilTap; 4] = [
    tap(0, -2, 1.0 / 12.0),
    tap(0, -1, -8.0 / 12.0),
    tap(0, 1, 8.0 / 12.0),
    tap(0, 2, -1.0 / 12.0),
];
const FOURTH_Y: [StencilTap; 4] = [
    tap(-2, 0, 1.0 / 12.0),
    tap(-1, 0, -8.0 / 12.0),
    tap(1, 0, 8.0 / 12.0),
    tap(2, 0, -1.0 / 12.0),
];

/// Order of the centered finite-difference scheme.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum StencilOrder {
    Second,
    Fourth,
}

impl StencilOrder {
    /// Number of gridpoints the stencil reaches
    /// beyond the point it is evaluated at.
    pub fn margin(&self) -> usize {
        match self {
            StencilOrder::Second => 1,
            StencilOrder::Fourth => 2,
        }
    }

    pub fn x_taps(&self) -> &'static [StencilTap] {
        match self {
            StencilOrder::Second => &SECOND_X,
            StencilOrder::Fourth => &FOURTH_X,
        }
    }

    pub fn y_taps(&self) -> &'static [StencilTap] {
        match self {
            StencilOrder::Second => &SECOND_Y,
            StencilOrder::Fourth => &FOURTH_Y,
        }
    }
}

impl FromStr for StencilOrder {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "2nd" | "second" => Ok(StencilOrder::Second),
            "4th" | "fourth" => Ok(StencilOrder::Fourth),
            _ => Err(ConfigError::UnsupportedMethod(s.to_string())),
        }
    }
}

impl fmt::Display for StencilOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StencilOrder::Second => write!(f, "2nd"),
            StencilOrder::Fourth => write!(f, "4th"),
        }
    }
}

/// Derivative of a `(time, level, lat, lon)` field at every
/// point of the window, returned in the window shape.
///
/// `spacing` is the signed grid spacing (m) per index step
/// along the direction of the taps.
pub fn window_derivative(
    field: ArrayView4<Float>,
    window: &AveragingWindow,
    taps: &[StencilTap],
    spacing: Float,
) -> Array4<Float> {
    let (ntime, nlev, _, _) = field.dim();
    let side = window.side();

    let mut derivative = Array4::zeros((ntime, nlev, side, side));

    for tap in taps {
        let shifted = window.shifted_view4(field, tap.row_offset, tap.col_offset);

        Zip::from(&mut derivative)
            .and(&shifted)
            .for_each(|d, &v| *d += tap.weight * v);
    }

    derivative.mapv_into(|d| d / spacing)
}

#[cfg(test)]
mod tests {
    use super::{window_derivative, StencilOrder};
    use crate::errors::ConfigError;
    use crate::model::forcing::window::AveragingWindow;
    use crate::Float;
    use float_cmp::approx_eq;
    use ndarray::Array4;

    #[test]
    fn parse_methods() {
        assert_eq!("2nd".parse::<StencilOrder>().unwrap(), StencilOrder::Second);
        assert_eq!("Fourth".parse::<StencilOrder>().unwrap(), StencilOrder::Fourth);
        assert!(matches!(
            "box".parse::<StencilOrder>(),
            Err(ConfigError::UnsupportedMethod(_))
        ));
        assert_eq!(StencilOrder::Fourth.to_string(), "4th");
    }

    #[test]
    fn weights_sum_to_zero() {
        for order in [StencilOrder::Second, StencilOrder::Fourth] {
            let sum: Float = order.x_taps().iter().map(|t| t.weight).sum();
            assert!(approx_eq!(Float, sum, 0.0, epsilon = 1e-15));

            assert!(order
                .x_taps()
                .iter()
                .all(|t| t.row_offset == 0 && t.col_offset.unsigned_abs() <= order.margin()));
            assert!(order
                .y_taps()
                .iter()
                .all(|t| t.col_offset == 0 && t.row_offset.unsigned_abs() <= order.margin()));
        }
    }

    #[test]
    fn cubic_needs_fourth_order() {
        // x^3 has non-zero third derivative so only the
        // 4th order scheme is exact up to x^4 terms
        let field = Array4::from_shape_fn((1, 1, 1, 9), |(_, _, _, i)| {
            let x = i as Float - 4.0;
            x * x * x
        });
        let window = AveragingWindow {
            i_center: 4,
            j_center: 0,
            n_av: 0,
        };

        let second = window_derivative(field.view(), &window, StencilOrder::Second.x_taps(), 1.0);
        let fourth = window_derivative(field.view(), &window, StencilOrder::Fourth.x_taps(), 1.0);

        // analytic derivative at x = 0 is 0
        assert!(approx_eq!(Float, second[[0, 0, 0, 0]], 1.0));
        assert!(approx_eq!(Float, fourth[[0, 0, 0, 0]], 0.0, epsilon = 1e-12));
    }
}
