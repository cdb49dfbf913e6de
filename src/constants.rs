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

//! Module containing constants used by the model.
//!
//! Geometric constants describing the Earth are plain `const` items,
//! while thermodynamic constants are gathered in [`PhysicalConstants`]
//! which is passed by value into every computation that needs it.

use crate::Float;
use std::f64::consts::PI;

///WGS84 ellipsoid semi-major axis
pub const WGS84_A: Float = 6_378_137.0;

///WGS84 ellipsoid semi-minor axis
#[allow(clippy::excessive_precision)]
pub const WGS84_B: Float = 6_356_752.314_245;

///WGS84 ellipsoid Ramanujan's $h$ parameter
pub const WGS84_H: Float =
    ((WGS84_A - WGS84_B) * (WGS84_A - WGS84_B)) / ((WGS84_A + WGS84_B) * (WGS84_A + WGS84_B));

///WGS84 ellipsoid circumference along meridian
///
///Computed with first 6 terms of infinite series:
///`C = \pi(a+b)\sum_{n=0}^{+\infty}\binom{0.5}{n}h^n`
pub const NS_C_EARTH: Float = PI
    * (WGS84_A + WGS84_B)
    * (1.0
        + (1.0 / 4.0) * (WGS84_H)
        + (1.0 / 64.0) * (WGS84_H * WGS84_H)
        + (1.0 / 256.0) * (WGS84_H * WGS84_H * WGS84_H)
        + (25.0 / 16384.0) * (WGS84_H * WGS84_H * WGS84_H * WGS84_H)
        + (49.0 / 65536.0) * (WGS84_H * WGS84_H * WGS84_H * WGS84_H * WGS84_H));

///WGS84 ellipsoid circumference along equator
pub const WE_C_EARTH: Float = 2.0 * PI * WGS84_A;

///Mean Earth radius, used for great-circle distances
pub const EARTH_MEAN_RADIUS: Float = 6_371_008.8;

/// Thermodynamic and planetary constants used by the
/// vertical coordinate and forcing computations.
///
/// The struct is `Copy` and immutable by convention: every
/// function that needs a constant receives the whole set by value,
/// so two computations with different constants never interfere.
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug)]
pub struct PhysicalConstants {
    /// Gravitational acceleration (m s-2)
    pub grav: Float,

    /// Gas constant of dry air (J kg-1 K-1)
    pub r_d: Float,

    /// Gas constant of water vapour (J kg-1 K-1)
    pub r_v: Float,

    /// Specific heat of dry air at constant pressure (J kg-1 K-1)
    pub c_pd: Float,

    /// Latent heat of vaporisation (J kg-1)
    pub l_v: Float,

    /// Reference pressure of the exner function (Pa)
    pub p0: Float,

    /// Angular velocity of the Earth (rad s-1)
    pub omega: Float,
}

impl PhysicalConstants {
    /// Constants set used by the ECMWF IFS (and hence ERA5).
    pub const IFS: PhysicalConstants = PhysicalConstants {
        grav: floccus::constants::G,
        r_d: 287.06,
        r_v: 461.52,
        c_pd: 3.5 * 287.06,
        l_v: 2.5008e6,
        p0: 1.0e5,
        omega: 7.2921e-5,
    };

    /// Exponent of the exner function, `Rd/cp`.
    pub fn kappa(&self) -> Float {
        self.r_d / self.c_pd
    }

    /// Coefficient of the water vapour correction
    /// in virtual temperature, `Rv/Rd - 1`.
    pub fn vapour_correction(&self) -> Float {
        self.r_v / self.r_d - 1.0
    }
}

impl Default for PhysicalConstants {
    fn default() -> Self {
        PhysicalConstants::IFS
    }
}
