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

//! Module reconstructing pressure and height of the
//! hybrid model levels.
//!
//! Pressure at half levels (layer boundaries) is given by the
//! hybrid coordinate `p = a + b * ps`. Heights of the half levels
//! are then integrated hydrostatically upwards from the surface
//! (where `z = 0`) using the virtual temperature of each layer:
//!
//! `zh[k] = zh[k-1] + (Rd * Tv[k-1] / g) * ln(ph[k-1] / ph[k])`
//!
//! Full level (layer centre) pressure and height are the arithmetic
//! means of the bounding half levels, not the log-pressure means.
//!
//! All arrays are ordered bottom-to-top along the level axis.

use crate::constants::PhysicalConstants;
use crate::errors::DataConsistencyError;
use crate::Float;
use ndarray::{s, Array1, Array4, ArrayView1, ArrayView3, ArrayView4, ArrayViewMut1, Axis, Zip};
use std::f64::consts::LN_2;

/// Table of hybrid vertical coordinate coefficients,
/// one `(a, b)` pair per half level.
#[derive(Clone, PartialEq, PartialOrd, Debug)]
pub struct HybridCoefficients {
    a: Vec<Float>,
    b: Vec<Float>,
}

impl HybridCoefficients {
    /// Creates the table from `a` (Pa) and `b` (-) coefficients.
    /// Both must be of equal, non-zero length.
    pub fn new(a: Vec<Float>, b: Vec<Float>) -> Result<Self, DataConsistencyError> {
        if a.len() != b.len() {
            return Err(DataConsistencyError::CoefficientsMismatch {
                expected: a.len(),
                found: b.len(),
            });
        }

        if a.is_empty() {
            return Err(DataConsistencyError::EmptyAxis("hybrid coefficients"));
        }

        Ok(HybridCoefficients { a, b })
    }

    pub fn len(&self) -> usize {
        self.a.len()
    }

    pub fn is_empty(&self) -> bool {
        self.a.is_empty()
    }

    /// Table with the order of half levels reversed.
    pub fn reversed(&self) -> Self {
        HybridCoefficients {
            a: self.a.iter().rev().copied().collect(),
            b: self.b.iter().rev().copied().collect(),
        }
    }

    /// Half level pressure for given surface pressure.
    pub fn half_level_pressure(&self, ps: Float) -> Array1<Float> {
        self.a
            .iter()
            .zip(&self.b)
            .map(|(a, b)| a + b * ps)
            .collect()
    }
}

/// Pressure (Pa) and height (m) of half and full model levels,
/// each of shape `(time, level, lat, lon)`.
#[derive(Clone, Debug)]
pub struct VerticalCoordinates {
    pub ph: Array4<Float>,
    pub zh: Array4<Float>,
    pub p: Array4<Float>,
    pub z: Array4<Float>,
}

/// Computes pressure and height at half and full levels
/// for every column of the grid.
///
/// `ps` has shape `(time, lat, lon)` and `tv` (virtual temperature
/// at full levels) has shape `(time, nfull, lat, lon)`.
pub fn resolve(
    coefficients: &HybridCoefficients,
    ps: ArrayView3<Float>,
    tv: ArrayView4<Float>,
    constants: PhysicalConstants,
) -> Result<VerticalCoordinates, DataConsistencyError> {
    let (ntime, nfull, nlat, nlon) = tv.dim();
    let nhalf = nfull + 1;

    if coefficients.len() != nhalf {
        return Err(DataConsistencyError::CoefficientsMismatch {
            expected: nhalf,
            found: coefficients.len(),
        });
    }

    if ps.dim() != (ntime, nlat, nlon) {
        return Err(DataConsistencyError::ShapeMismatch {
            field: "surface pressure",
            expected: vec![ntime, nlat, nlon],
            found: ps.shape().to_vec(),
        });
    }

    if let Some(((t, j, i), _)) = ps.indexed_iter().find(|(_, v)| !v.is_finite()) {
        return Err(DataConsistencyError::NonFiniteSurfacePressure { t, j, i });
    }

    let mut ph = Array4::<Float>::zeros((ntime, nhalf, nlat, nlon));
    let mut zh = Array4::<Float>::zeros((ntime, nhalf, nlat, nlon));

    // lanes along the level axis form a (time, lat, lon) producer
    // matching the surface pressure shape
    Zip::from(ph.lanes_mut(Axis(1)))
        .and(zh.lanes_mut(Axis(1)))
        .and(tv.lanes(Axis(1)))
        .and(&ps)
        .for_each(|mut ph_col, zh_col, tv_col, &ps| {
            ph_col.assign(&coefficients.half_level_pressure(ps));
            integrate_half_level_heights(ph_col.view(), tv_col, constants, zh_col);
        });

    let p = full_level_mean(&ph);
    let z = full_level_mean(&zh);

    Ok(VerticalCoordinates { ph, zh, p, z })
}

/// Hydrostatic integration of the half level heights
/// in a single column.
///
/// A half level with zero pressure (the IFS model top) would be placed
/// at infinity, so for that layer the IFS top-layer log-thickness `ln 2`
/// is used for the full level, which puts the half level at twice that.
pub fn integrate_half_level_heights(
    ph: ArrayView1<Float>,
    tv: ArrayView1<Float>,
    constants: PhysicalConstants,
    mut zh: ArrayViewMut1<Float>,
) {
    zh[0] = 0.0;

    for k in 1..ph.len() {
        let log_thickness = if ph[k] > 0.0 {
            (ph[k - 1] / ph[k]).ln()
        } else {
            2.0 * LN_2
        };

        zh[k] = zh[k - 1] + (constants.r_d * tv[k - 1] / constants.grav) * log_thickness;
    }
}

/// Arithmetic mean of neighbouring half levels.
fn full_level_mean(half: &Array4<Float>) -> Array4<Float> {
    0.5 * (&half.slice(s![.., 1.., .., ..]) + &half.slice(s![.., ..-1, .., ..]))
}
