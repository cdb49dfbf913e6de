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

//! Horizontal geometry of the forcing computation: locating the
//! central gridpoint, the averaging window around it, local grid
//! spacing and the Coriolis parameter.

use super::finite_difference::StencilOrder;
use crate::constants::{EARTH_MEAN_RADIUS, NS_C_EARTH, WE_C_EARTH};
use crate::errors::{ConfigError, DataConsistencyError, NumericalError};
use crate::Float;
use log::info;
use ndarray::{s, Array1, Array2, ArrayView1, ArrayView3, ArrayView4, Axis};

/// Geographic point (in degrees).
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug)]
pub struct GeoPoint {
    pub lat: Float,
    pub lon: Float,
}

/// Gridpoint of the input data nearest to the requested location.
///
/// `i` indexes longitude and `j` indexes latitude.
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug)]
pub struct GridLocation {
    pub i: usize,
    pub j: usize,
    pub point: GeoPoint,
    /// Great-circle distance (m) from the requested location
    pub distance: Float,
}

impl GridLocation {
    /// Finds the gridpoint with the smallest coordinate
    /// differences to `center`, in both longitude conventions.
    pub fn nearest(
        lats: ArrayView1<Float>,
        lons: ArrayView1<Float>,
        center: GeoPoint,
    ) -> Result<Self, DataConsistencyError> {
        let j = argmin(lats.iter().map(|lat| (lat - center.lat).abs()))
            .ok_or(DataConsistencyError::EmptyAxis("latitude"))?;
        let i = argmin(lons.iter().map(|lon| wrap_longitude(lon - center.lon).abs()))
            .ok_or(DataConsistencyError::EmptyAxis("longitude"))?;

        let point = GeoPoint {
            lat: lats[j],
            lon: lons[i],
        };
        let distance = haversine_distance(center, point);

        info!(
            "Using gridpoint {:.3}N {:.3}E (i={}, j={}), {:.0} m from the requested location",
            point.lat, point.lon, i, j, distance
        );

        Ok(GridLocation {
            i,
            j,
            point,
            distance,
        })
    }
}

fn argmin<I: Iterator<Item = Float>>(values: I) -> Option<usize> {
    values
        .enumerate()
        .fold(None, |best: Option<(usize, Float)>, (index, value)| match best {
            Some((_, best_value)) if best_value <= value => best,
            _ => Some((index, value)),
        })
        .map(|(index, _)| index)
}

/// Maps longitude difference into `[-180, 180)`.
pub fn wrap_longitude(delta: Float) -> Float {
    (delta + 180.0).rem_euclid(360.0) - 180.0
}

/// Great-circle distance on the sphere of mean Earth radius.
pub fn haversine_distance(a: GeoPoint, b: GeoPoint) -> Float {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = wrap_longitude(b.lon - a.lon).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);

    2.0 * EARTH_MEAN_RADIUS * h.sqrt().asin()
}

/// Square window of `2 * n_av + 1` gridpoints
/// in each direction, centred on `(i_center, j_center)`.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct AveragingWindow {
    pub i_center: usize,
    pub j_center: usize,
    pub n_av: usize,
}

impl AveragingWindow {
    pub fn new(location: GridLocation, n_av: usize) -> Self {
        AveragingWindow {
            i_center: location.i,
            j_center: location.j,
            n_av,
        }
    }

    /// Number of gridpoints along one side of the window.
    pub fn side(&self) -> usize {
        2 * self.n_av + 1
    }

    /// Checks that the window together with the
    /// stencil margin lies inside the grid.
    pub fn check_within(
        &self,
        stencil: StencilOrder,
        nlat: usize,
        nlon: usize,
    ) -> Result<(), ConfigError> {
        let reach = self.n_av + stencil.margin();

        let fits = self.i_center >= reach
            && self.j_center >= reach
            && self.i_center + reach < nlon
            && self.j_center + reach < nlat;

        if !fits {
            return Err(ConfigError::WindowOutOfGrid {
                i: self.i_center,
                j: self.j_center,
                n_av: self.n_av,
                margin: stencil.margin(),
                nlon,
                nlat,
            });
        }

        Ok(())
    }

    /// Window of a `(time, level, lat, lon)` field shifted
    /// by given number of gridpoints. The window must be
    /// checked against the grid before.
    pub fn shifted_view4<'a>(
        &self,
        field: ArrayView4<'a, Float>,
        row_offset: isize,
        col_offset: isize,
    ) -> ArrayView4<'a, Float> {
        let j0 = (self.j_center as isize + row_offset) as usize - self.n_av;
        let i0 = (self.i_center as isize + col_offset) as usize - self.n_av;
        let side = self.side();

        field.slice_move(s![.., .., j0..j0 + side, i0..i0 + side])
    }

    pub fn view4<'a>(&self, field: ArrayView4<'a, Float>) -> ArrayView4<'a, Float> {
        self.shifted_view4(field, 0, 0)
    }

    pub fn view3<'a>(&self, field: ArrayView3<'a, Float>) -> ArrayView3<'a, Float> {
        let j0 = self.j_center - self.n_av;
        let i0 = self.i_center - self.n_av;
        let side = self.side();

        field.slice_move(s![.., j0..j0 + side, i0..i0 + side])
    }

    /// Arithmetic mean over the window of a `(time, level, lat, lon)` field.
    pub fn mean4(&self, field: ArrayView4<Float>) -> Array2<Float> {
        mean_of_window4(self.view4(field))
    }

    /// Arithmetic mean over the window of a `(time, lat, lon)` field.
    pub fn mean3(&self, field: ArrayView3<Float>) -> Array1<Float> {
        let count = (self.side() * self.side()) as Float;

        self.view3(field).sum_axis(Axis(2)).sum_axis(Axis(1)) / count
    }
}

/// Mean over the two horizontal axes of an already windowed field.
pub fn mean_of_window4(window: ArrayView4<Float>) -> Array2<Float> {
    let (_, _, nlat, nlon) = window.dim();
    let count = (nlat * nlon) as Float;

    window.sum_axis(Axis(3)).sum_axis(Axis(2)) / count
}

/// Grid spacing (m) per index step around a gridpoint.
///
/// Spacings are signed: `dy` is negative when latitude is
/// stored north-to-south and `dx` follows the longitude
/// direction, with wrap-around at the dateline/meridian.
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug)]
pub struct GridSpacing {
    pub dx: Float,
    pub dy: Float,
}

impl GridSpacing {
    /// Computes the spacing from the gridpoints adjacent to `(i, j)`
    /// using the lengths of a degree along the parallel and along
    /// the meridian. Both neighbours must exist and must not
    /// coincide along either axis.
    pub fn at(
        lats: ArrayView1<Float>,
        lons: ArrayView1<Float>,
        i: usize,
        j: usize,
    ) -> Result<Self, NumericalError> {
        let lat = lats[j];

        let d_lon = wrap_longitude(lons[i + 1] - lons[i - 1]) / 2.0;
        let d_lat = (lats[j + 1] - lats[j - 1]) / 2.0;

        let parallel_degree = lat.to_radians().cos() * (WE_C_EARTH / 360.0);
        let meridian_degree = NS_C_EARTH / 360.0;

        let dx = d_lon * parallel_degree;
        let dy = d_lat * meridian_degree;

        if !dx.is_normal() || !dy.is_normal() {
            return Err(NumericalError::DegenerateSpacing { i, j, dx, dy });
        }

        Ok(GridSpacing { dx, dy })
    }
}

/// Coriolis parameter `f = 2 * omega * sin(lat)`.
pub fn coriolis_parameter(lat: Float, omega: Float) -> Float {
    2.0 * omega * lat.to_radians().sin()
}
