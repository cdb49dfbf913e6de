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

//! Module computing the large-scale forcings.
//!
//! For a window of `2 * n_av + 1` gridpoints around the central
//! gridpoint the following terms are computed per time step and
//! model level:
//!
//! - advective tendencies `-u dS/dx - v dS/dy` of liquid water potential
//!   temperature, total water and both wind components, evaluated at each
//!   window point and then averaged over the window,
//! - geostrophic wind `ug = -(g/f) dZ/dy`, `vg = (g/f) dZ/dx` from the height
//!   of pressure levels, averaged over the window and interpolated (linearly
//!   in pressure, separately for each time step) onto the mean model levels,
//! - Coriolis tendencies `du/dt = f (v - vg)`, `dv/dt = -f (u - ug)`.
//!
//! Horizontal derivatives use 2nd or 4th order centered differences
//! (see [`StencilOrder`]) with grid spacing taken at the central
//! gridpoint and held constant over the window.
//!
//! Each call reads the dataset only, so results for different windows
//! and stencils are independent and can be computed in parallel.

mod finite_difference;
mod interpolation;
mod window;

pub use self::finite_difference::{window_derivative, StencilOrder, StencilTap};
pub use self::interpolation::{interpolate_linear, interpolate_to_model_levels};
pub use self::window::{
    coriolis_parameter, haversine_distance, wrap_longitude, AveragingWindow, GeoPoint,
    GridLocation, GridSpacing,
};

use self::window::mean_of_window4;
use super::dataset::PressureLevels;
use super::thermodynamics::{RadiativeTendencies, SurfaceState};
use crate::constants::PhysicalConstants;
use crate::errors::{ConfigError, DataConsistencyError, ForcingError};
use crate::Float;
use log::debug;
use ndarray::{Array1, Array2, Array4, ArrayView1, ArrayView3, ArrayView4, Zip};
use rayon::prelude::*;
use rustc_hash::FxHashMap;

/// Read-only views of the fields used by the forcing computation.
///
/// 4D fields are `(time, level, lat, lon)` with levels bottom-to-top,
/// `ps` is `(time, lat, lon)`. `z_levels` holds the height of the
/// pressure levels given in `p_levels` (Pa).
#[derive(Clone, Debug)]
pub struct ForcingFields<'a> {
    pub lats: ArrayView1<'a, Float>,
    pub lons: ArrayView1<'a, Float>,
    pub thl: ArrayView4<'a, Float>,
    pub qt: ArrayView4<'a, Float>,
    pub u: ArrayView4<'a, Float>,
    pub v: ArrayView4<'a, Float>,
    pub p: ArrayView4<'a, Float>,
    pub z: ArrayView4<'a, Float>,
    pub density: ArrayView4<'a, Float>,
    pub vertical_velocity: ArrayView4<'a, Float>,
    pub wind_speed: ArrayView4<'a, Float>,
    pub ps: ArrayView3<'a, Float>,
    pub p_levels: ArrayView1<'a, Float>,
    pub z_levels: ArrayView4<'a, Float>,
    pub surface: Option<&'a SurfaceState>,
    pub radiation: Option<&'a RadiativeTendencies>,
}

impl<'a> ForcingFields<'a> {
    fn check_shapes(&self) -> Result<(), DataConsistencyError> {
        let (ntime, nfull, nlat, nlon) = self.thl.dim();
        let full_shape = [ntime, nfull, nlat, nlon];

        if self.lats.len() != nlat || self.lons.len() != nlon {
            return Err(DataConsistencyError::ShapeMismatch {
                field: "latitude/longitude axes",
                expected: vec![nlat, nlon],
                found: vec![self.lats.len(), self.lons.len()],
            });
        }

        let full_level_fields = [
            ("total water", &self.qt),
            ("u wind", &self.u),
            ("v wind", &self.v),
            ("full level pressure", &self.p),
            ("full level height", &self.z),
            ("density", &self.density),
            ("vertical velocity", &self.vertical_velocity),
            ("wind speed", &self.wind_speed),
        ];

        for (field, values) in full_level_fields {
            if values.shape() != full_shape {
                return Err(DataConsistencyError::ShapeMismatch {
                    field,
                    expected: full_shape.to_vec(),
                    found: values.shape().to_vec(),
                });
            }
        }

        if self.ps.shape() != [ntime, nlat, nlon] {
            return Err(DataConsistencyError::ShapeMismatch {
                field: "surface pressure",
                expected: vec![ntime, nlat, nlon],
                found: self.ps.shape().to_vec(),
            });
        }

        PressureLevels::check_axis(self.p_levels)?;

        let level_shape = [ntime, self.p_levels.len(), nlat, nlon];

        if self.z_levels.shape() != level_shape {
            return Err(DataConsistencyError::ShapeMismatch {
                field: "height of pressure levels",
                expected: level_shape.to_vec(),
                found: self.z_levels.shape().to_vec(),
            });
        }

        Ok(())
    }
}

/// Averaging window size and finite-difference
/// method requested for one forcing computation.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct ForcingRequest {
    pub n_av: usize,
    pub method: StencilOrder,
}

/// Names of the forcing terms in [`ForcingSet`].
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum ForcingTerm {
    ThlAdvection,
    QtAdvection,
    UAdvection,
    VAdvection,
    GeostrophicU,
    GeostrophicV,
    UCoriolis,
    VCoriolis,
}

impl ForcingTerm {
    pub const ALL: [ForcingTerm; 8] = [
        ForcingTerm::ThlAdvection,
        ForcingTerm::QtAdvection,
        ForcingTerm::UAdvection,
        ForcingTerm::VAdvection,
        ForcingTerm::GeostrophicU,
        ForcingTerm::GeostrophicV,
        ForcingTerm::UCoriolis,
        ForcingTerm::VCoriolis,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ForcingTerm::ThlAdvection => "dtthl_advec",
            ForcingTerm::QtAdvection => "dtqt_advec",
            ForcingTerm::UAdvection => "dtu_advec",
            ForcingTerm::VAdvection => "dtv_advec",
            ForcingTerm::GeostrophicU => "ug",
            ForcingTerm::GeostrophicV => "vg",
            ForcingTerm::UCoriolis => "dtu_coriolis",
            ForcingTerm::VCoriolis => "dtv_coriolis",
        }
    }
}

/// Window means of the surface state, per time step.
#[derive(Clone, Debug)]
pub struct SurfaceMeans {
    pub skin_temperature: Array1<Float>,
    pub heat_flux: Array1<Float>,
    pub moisture_flux: Array1<Float>,
    pub cloud_cover: Array1<Float>,
    pub roughness_momentum: Array1<Float>,
    pub roughness_heat: Array1<Float>,
}

/// Window means of the radiative potential temperature
/// tendencies (K s-1), per time step and model level.
#[derive(Clone, Debug)]
pub struct RadiationMeans {
    pub shortwave: Array2<Float>,
    pub longwave: Array2<Float>,
    pub shortwave_clear: Array2<Float>,
    pub longwave_clear: Array2<Float>,
}

/// Base state averaged over the window. Arrays are
/// `(time, level)` apart from surface variables `(time)`.
#[derive(Clone, Debug)]
pub struct WindowMeans {
    pub z: Array2<Float>,
    pub p: Array2<Float>,
    pub thl: Array2<Float>,
    pub qt: Array2<Float>,
    pub u: Array2<Float>,
    pub v: Array2<Float>,
    pub wind_speed: Array2<Float>,
    pub vertical_velocity: Array2<Float>,
    pub density: Array2<Float>,
    pub ps: Array1<Float>,
    pub surface: Option<SurfaceMeans>,
    pub radiation: Option<RadiationMeans>,
}

impl WindowMeans {
    fn compute(fields: &ForcingFields, window: &AveragingWindow) -> Self {
        let surface = fields.surface.map(|s| SurfaceMeans {
            skin_temperature: window.mean3(s.skin_temperature.view()),
            heat_flux: window.mean3(s.heat_flux.view()),
            moisture_flux: window.mean3(s.moisture_flux.view()),
            cloud_cover: window.mean3(s.cloud_cover.view()),
            roughness_momentum: window.mean3(s.roughness_momentum.view()),
            roughness_heat: window.mean3(s.roughness_heat.view()),
        });

        let radiation = fields.radiation.map(|r| RadiationMeans {
            shortwave: window.mean4(r.shortwave.view()),
            longwave: window.mean4(r.longwave.view()),
            shortwave_clear: window.mean4(r.shortwave_clear.view()),
            longwave_clear: window.mean4(r.longwave_clear.view()),
        });

        WindowMeans {
            z: window.mean4(fields.z),
            p: window.mean4(fields.p),
            thl: window.mean4(fields.thl),
            qt: window.mean4(fields.qt),
            u: window.mean4(fields.u),
            v: window.mean4(fields.v),
            wind_speed: window.mean4(fields.wind_speed),
            vertical_velocity: window.mean4(fields.vertical_velocity),
            density: window.mean4(fields.density),
            ps: window.mean3(fields.ps),
            surface,
            radiation,
        }
    }
}

/// Forcings computed for one window and stencil.
///
/// Tendencies and geostrophic wind on model levels are
/// `(time, level)` arrays, consistent with `means.z` and `means.p`.
/// Geostrophic wind on pressure levels (`ug_p`, `vg_p`) is
/// `(time, pressure level)`.
#[derive(Clone, Debug)]
pub struct ForcingSet {
    pub window: AveragingWindow,
    pub stencil: StencilOrder,
    pub spacing: GridSpacing,
    pub coriolis_parameter: Float,
    pub means: WindowMeans,
    pub dtthl_advec: Array2<Float>,
    pub dtqt_advec: Array2<Float>,
    pub dtu_advec: Array2<Float>,
    pub dtv_advec: Array2<Float>,
    pub ug_p: Array2<Float>,
    pub vg_p: Array2<Float>,
    pub ug: Array2<Float>,
    pub vg: Array2<Float>,
    pub dtu_coriolis: Array2<Float>,
    pub dtv_coriolis: Array2<Float>,
}

impl ForcingSet {
    pub fn term(&self, term: ForcingTerm) -> &Array2<Float> {
        match term {
            ForcingTerm::ThlAdvection => &self.dtthl_advec,
            ForcingTerm::QtAdvection => &self.dtqt_advec,
            ForcingTerm::UAdvection => &self.dtu_advec,
            ForcingTerm::VAdvection => &self.dtv_advec,
            ForcingTerm::GeostrophicU => &self.ug,
            ForcingTerm::GeostrophicV => &self.vg,
            ForcingTerm::UCoriolis => &self.dtu_coriolis,
            ForcingTerm::VCoriolis => &self.dtv_coriolis,
        }
    }

    /// All forcing terms keyed by their names.
    pub fn terms(&self) -> FxHashMap<&'static str, &Array2<Float>> {
        ForcingTerm::ALL
            .iter()
            .map(|term| (term.name(), self.term(*term)))
            .collect()
    }
}

/// Computes forcings for a single window and stencil.
///
/// `center` is the requested location, its latitude
/// sets the Coriolis parameter.
pub fn compute_forcings(
    fields: &ForcingFields,
    center: GeoPoint,
    window: AveragingWindow,
    stencil: StencilOrder,
    constants: PhysicalConstants,
) -> Result<ForcingSet, ForcingError> {
    debug!(
        "Computing forcings with n_av={} and {} order stencil",
        window.n_av, stencil
    );

    fields.check_shapes()?;
    window.check_within(stencil, fields.lats.len(), fields.lons.len())?;

    let f = coriolis_parameter(center.lat, constants.omega);

    if f.abs() < Float::EPSILON {
        return Err(ConfigError::OutOfBounds(
            "Coriolis parameter vanishes at the central latitude",
        )
        .into());
    }

    let spacing = GridSpacing::at(fields.lats, fields.lons, window.i_center, window.j_center)?;

    let u = window.view4(fields.u);
    let v = window.view4(fields.v);

    let advect = |scalar: ArrayView4<Float>| {
        let ddx = window_derivative(scalar, &window, stencil.x_taps(), spacing.dx);
        let ddy = window_derivative(scalar, &window, stencil.y_taps(), spacing.dy);

        advective_tendency(u, v, &ddx, &ddy)
    };

    let dtthl_advec = advect(fields.thl);
    let dtqt_advec = advect(fields.qt);
    let dtu_advec = advect(fields.u);
    let dtv_advec = advect(fields.v);

    let dzdx = window_derivative(fields.z_levels, &window, stencil.x_taps(), spacing.dx);
    let dzdy = window_derivative(fields.z_levels, &window, stencil.y_taps(), spacing.dy);

    let g_over_f = constants.grav / f;

    let ug_p = -g_over_f * mean_of_window4(dzdy.view());
    let vg_p = g_over_f * mean_of_window4(dzdx.view());

    let means = WindowMeans::compute(fields, &window);

    let ug = interpolate_to_model_levels(fields.p_levels, ug_p.view(), means.p.view(), "ug")?;
    let vg = interpolate_to_model_levels(fields.p_levels, vg_p.view(), means.p.view(), "vg")?;

    let dtu_coriolis = f * (&means.v - &vg);
    let dtv_coriolis = -f * (&means.u - &ug);

    Ok(ForcingSet {
        window,
        stencil,
        spacing,
        coriolis_parameter: f,
        means,
        dtthl_advec,
        dtqt_advec,
        dtu_advec,
        dtv_advec,
        ug_p,
        vg_p,
        ug,
        vg,
        dtu_coriolis,
        dtv_coriolis,
    })
}

/// Window mean of `-u dS/dx - v dS/dy` with winds
/// and derivatives given at every window point.
fn advective_tendency(
    u: ArrayView4<Float>,
    v: ArrayView4<Float>,
    ddx: &Array4<Float>,
    ddy: &Array4<Float>,
) -> Array2<Float> {
    let mut tendency = Array4::zeros(ddx.raw_dim());

    Zip::from(&mut tendency)
        .and(&u)
        .and(&v)
        .and(ddx)
        .and(ddy)
        .for_each(|tend, &u, &v, &dx, &dy| *tend = -u * dx - v * dy);

    mean_of_window4(tendency.view())
}

/// Computes forcings for every request around the same location.
///
/// Requests are evaluated in parallel on the current `rayon`
/// thread pool. Each result is independent, so a failing
/// request does not affect the others.
pub fn compute_forcing_sweep(
    fields: &ForcingFields,
    center: GeoPoint,
    location: GridLocation,
    requests: &[ForcingRequest],
    constants: PhysicalConstants,
) -> Vec<Result<ForcingSet, ForcingError>> {
    requests
        .par_iter()
        .map(|request| {
            compute_forcings(
                fields,
                center,
                AveragingWindow::new(location, request.n_av),
                request.method,
                constants,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{NS_C_EARTH, WE_C_EARTH};
    use crate::errors::NumericalError;
    use float_cmp::approx_eq;
    use ndarray::{arr1, s, Array3};

    /// Small regular grid with fields given by closures of
    /// `(level, j, i)`, constant in time.
    struct SyntheticGrid {
        lats: Array1<Float>,
        lons: Array1<Float>,
        thl: Array4<Float>,
        qt: Array4<Float>,
        u: Array4<Float>,
        v: Array4<Float>,
        p: Array4<Float>,
        z: Array4<Float>,
        ones: Array4<Float>,
        ps: Array3<Float>,
        p_levels: Array1<Float>,
        z_levels: Array4<Float>,
    }

    const NTIME: usize = 2;
    const NLEV: usize = 3;

    impl SyntheticGrid {
        fn new(lats: &[Float], lons: &[Float]) -> Self {
            let shape = (NTIME, NLEV, lats.len(), lons.len());
            let plev_shape = (NTIME, 3, lats.len(), lons.len());

            SyntheticGrid {
                lats: arr1(lats),
                lons: arr1(lons),
                thl: Array4::from_elem(shape, 300.0),
                qt: Array4::from_elem(shape, 0.01),
                u: Array4::zeros(shape),
                v: Array4::zeros(shape),
                p: Array4::from_shape_fn(shape, |(_, k, _, _)| 95_000.0 - 10_000.0 * k as Float),
                z: Array4::from_shape_fn(shape, |(_, k, _, _)| 500.0 + 1000.0 * k as Float),
                ones: Array4::ones(shape),
                ps: Array3::from_elem((NTIME, lats.len(), lons.len()), 100_000.0),
                p_levels: arr1(&[100_000.0, 85_000.0, 70_000.0]),
                z_levels: Array4::from_shape_fn(plev_shape, |(_, k, _, _)| 1500.0 * k as Float),
            }
        }

        fn fields(&self) -> ForcingFields<'_> {
            ForcingFields {
                lats: self.lats.view(),
                lons: self.lons.view(),
                thl: self.thl.view(),
                qt: self.qt.view(),
                u: self.u.view(),
                v: self.v.view(),
                p: self.p.view(),
                z: self.z.view(),
                density: self.ones.view(),
                vertical_velocity: self.ones.view(),
                wind_speed: self.ones.view(),
                ps: self.ps.view(),
                p_levels: self.p_levels.view(),
                z_levels: self.z_levels.view(),
                surface: None,
                radiation: None,
            }
        }
    }

    fn grid_5x5() -> SyntheticGrid {
        SyntheticGrid::new(&[47.0, 46.0, 45.0, 44.0, 43.0], &[3.0, 4.0, 5.0, 6.0, 7.0])
    }

    fn grid_7x7() -> SyntheticGrid {
        SyntheticGrid::new(
            &[48.0, 47.0, 46.0, 45.0, 44.0, 43.0, 42.0],
            &[2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0],
        )
    }

    fn center_45n() -> GeoPoint {
        GeoPoint {
            lat: 45.0,
            lon: 5.0,
        }
    }

    fn window(i: usize, j: usize, n_av: usize) -> AveragingWindow {
        AveragingWindow {
            i_center: i,
            j_center: j,
            n_av,
        }
    }

    /// Distance (m) along x and y from gridpoint `(ic, jc)`
    /// on a 1 degree grid with latitude descending.
    fn metres_from(ic: usize, jc: usize, i: usize, j: usize) -> (Float, Float) {
        let dx = (45.0 as Float).to_radians().cos() * WE_C_EARTH / 360.0;
        let dy = -NS_C_EARTH / 360.0;

        (
            (i as Float - ic as Float) * dx,
            (j as Float - jc as Float) * dy,
        )
    }

    #[test]
    fn theta_gradient_along_x() {
        let mut grid = grid_5x5();
        grid.thl = Array4::from_shape_fn(grid.thl.raw_dim(), |(_, _, j, i)| {
            300.0 + 0.01 * metres_from(2, 2, i, j).0
        });
        grid.u.fill(1.0);

        let c = PhysicalConstants::default();
        let slow = compute_forcings(
            &grid.fields(),
            center_45n(),
            window(2, 2, 0),
            StencilOrder::Second,
            c,
        )
        .unwrap();

        grid.u.fill(2.0);
        let fast = compute_forcings(
            &grid.fields(),
            center_45n(),
            window(2, 2, 0),
            StencilOrder::Second,
            c,
        )
        .unwrap();

        for (&slow, &fast) in slow.dtthl_advec.iter().zip(fast.dtthl_advec.iter()) {
            assert!(approx_eq!(Float, slow, -0.01, epsilon = 1e-9));
            assert!(approx_eq!(Float, fast, 2.0 * slow, epsilon = 1e-12));
        }
    }

    #[test]
    fn single_column_matches_hand_computed_difference() {
        let mut grid = grid_5x5();
        grid.qt = Array4::from_shape_fn(grid.qt.raw_dim(), |(t, k, j, i)| {
            0.01 + 1e-4 * ((3 * i + 7 * j + k + t) % 5) as Float
        });
        grid.u.fill(3.0);
        grid.v.fill(-2.0);

        let c = PhysicalConstants::default();
        let forcings = compute_forcings(
            &grid.fields(),
            center_45n(),
            window(2, 2, 0),
            StencilOrder::Second,
            c,
        )
        .unwrap();

        let dx = (45.0 as Float).to_radians().cos() * WE_C_EARTH / 360.0;
        let dy = (44.0 - 46.0) / 2.0 * NS_C_EARTH / 360.0;
        let q = &grid.qt;

        for t in 0..NTIME {
            for k in 0..NLEV {
                let dqdx = (q[[t, k, 2, 3]] - q[[t, k, 2, 1]]) / (2.0 * dx);
                let dqdy = (q[[t, k, 3, 2]] - q[[t, k, 1, 2]]) / (2.0 * dy);
                let expected = -3.0 * dqdx + 2.0 * dqdy;

                assert!(approx_eq!(
                    Float,
                    forcings.dtqt_advec[[t, k]],
                    expected,
                    epsilon = 1e-15
                ));
            }
        }
    }

    #[test]
    fn uniform_fields_have_no_forcing() {
        let mut grid = grid_7x7();
        grid.u.fill(5.0);
        grid.v.fill(-3.0);
        grid.z_levels.fill(1000.0);

        let c = PhysicalConstants::default();

        for (n_av, stencil) in [
            (0, StencilOrder::Second),
            (1, StencilOrder::Second),
            (2, StencilOrder::Second),
            (0, StencilOrder::Fourth),
            (1, StencilOrder::Fourth),
        ] {
            let forcings =
                compute_forcings(&grid.fields(), center_45n(), window(3, 3, n_av), stencil, c)
                    .unwrap();

            for term in [
                ForcingTerm::ThlAdvection,
                ForcingTerm::QtAdvection,
                ForcingTerm::UAdvection,
                ForcingTerm::VAdvection,
                ForcingTerm::GeostrophicU,
                ForcingTerm::GeostrophicV,
            ] {
                assert!(forcings.term(term).iter().all(|v| v.abs() < 1e-12));
            }
        }
    }

    #[test]
    fn linear_field_gradient_is_exact() {
        let mut grid = grid_7x7();
        grid.thl = Array4::from_shape_fn(grid.thl.raw_dim(), |(_, _, j, i)| {
            let (x, y) = metres_from(3, 3, i, j);
            290.0 + 2e-5 * x - 3e-5 * y
        });
        grid.u.fill(1.0);
        grid.v.fill(1.0);

        let c = PhysicalConstants::default();

        // x is measured with the spacing of the central row
        for (n_av, stencil) in [
            (0, StencilOrder::Second),
            (1, StencilOrder::Second),
            (2, StencilOrder::Second),
            (1, StencilOrder::Fourth),
        ] {
            let forcings =
                compute_forcings(&grid.fields(), center_45n(), window(3, 3, n_av), stencil, c)
                    .unwrap();

            assert!(forcings
                .dtthl_advec
                .iter()
                .all(|&v| approx_eq!(Float, v, -2e-5 + 3e-5, epsilon = 1e-12)));
        }
    }

    #[test]
    fn geostrophic_wind_from_height_gradient() {
        let mut grid = grid_5x5();
        // height rising northwards gives easterly geostrophic wind
        // in the northern hemisphere
        grid.z_levels = Array4::from_shape_fn(grid.z_levels.raw_dim(), |(_, k, j, i)| {
            1500.0 * k as Float + 1e-3 * metres_from(2, 2, i, j).1
        });
        // model levels equal to pressure levels
        grid.p = Array4::from_shape_fn(grid.p.raw_dim(), |(_, k, _, _)| {
            100_000.0 - 15_000.0 * k as Float
        });
        grid.u.fill(-1.0);

        let c = PhysicalConstants::default();
        let forcings = compute_forcings(
            &grid.fields(),
            center_45n(),
            window(2, 2, 1),
            StencilOrder::Second,
            c,
        )
        .unwrap();

        let f = coriolis_parameter(45.0, c.omega);
        let expected_ug = -c.grav / f * 1e-3;

        assert!(expected_ug < 0.0);
        assert!(forcings
            .ug
            .iter()
            .all(|&ug| approx_eq!(Float, ug, expected_ug, epsilon = 1e-9)));
        assert!(forcings.vg.iter().all(|vg| vg.abs() < 1e-9));

        // exact pressure levels reproduce the pressure level values
        assert_eq!(forcings.ug.row(0), forcings.ug_p.row(0));

        // dv/dt = -f (u - ug) and du/dt = f (v - vg)
        for (&dtv, &ug) in forcings.dtv_coriolis.iter().zip(forcings.ug.iter()) {
            assert!(approx_eq!(Float, dtv, -f * (-1.0 - ug), epsilon = 1e-12));
        }
        assert!(forcings.dtu_coriolis.iter().all(|v| v.abs() < 1e-12));
    }

    /// Geostrophic wind at the center of a grid with height of
    /// pressure levels rising eastwards.
    fn geostrophic_wind_from_eastward_slope(lats: &[Float], center: GeoPoint) -> ForcingSet {
        let mut grid = SyntheticGrid::new(lats, &[3.0, 4.0, 5.0, 6.0, 7.0]);
        grid.z_levels = Array4::from_shape_fn(grid.z_levels.raw_dim(), |(_, k, j, i)| {
            1500.0 * k as Float + 1e-3 * metres_from(2, 2, i, j).0
        });

        compute_forcings(
            &grid.fields(),
            center,
            window(2, 2, 1),
            StencilOrder::Second,
            PhysicalConstants::default(),
        )
        .unwrap()
    }

    #[test]
    fn meridional_geostrophic_wind_changes_sign_with_hemisphere() {
        let c = PhysicalConstants::default();

        let north = geostrophic_wind_from_eastward_slope(
            &[47.0, 46.0, 45.0, 44.0, 43.0],
            center_45n(),
        );
        let south = geostrophic_wind_from_eastward_slope(
            &[-43.0, -44.0, -45.0, -46.0, -47.0],
            GeoPoint {
                lat: -45.0,
                lon: 5.0,
            },
        );

        let expected_vg = c.grav / coriolis_parameter(45.0, c.omega) * 1e-3;

        assert!(expected_vg > 0.0);
        assert!(north
            .vg
            .iter()
            .all(|&vg| approx_eq!(Float, vg, expected_vg, epsilon = 1e-9)));
        assert!(south
            .vg
            .iter()
            .all(|&vg| approx_eq!(Float, vg, -expected_vg, epsilon = 1e-9)));

        for forcings in [&north, &south] {
            assert!(forcings.ug.iter().all(|ug| ug.abs() < 1e-9));
        }

        assert!(north.coriolis_parameter > 0.0);
        assert!(south.coriolis_parameter < 0.0);

        // du/dt = f (v - vg) with v = 0 is negative in both hemispheres
        for forcings in [&north, &south] {
            assert!(forcings.dtu_coriolis.iter().all(|&dtu| dtu < 0.0));
        }
    }

    #[test]
    fn pressure_levels_must_be_monotonic() {
        let c = PhysicalConstants::default();

        let mut grid = grid_5x5();
        grid.p_levels = arr1(&[100_000.0, 70_000.0, 85_000.0]);

        let unordered = compute_forcings(
            &grid.fields(),
            center_45n(),
            window(2, 2, 0),
            StencilOrder::Second,
            c,
        );

        let mut grid = grid_5x5();
        grid.p_levels = arr1(&[85_000.0]);
        grid.z_levels = grid.z_levels.slice_move(s![.., 1..2, .., ..]);

        let single = compute_forcings(
            &grid.fields(),
            center_45n(),
            window(2, 2, 0),
            StencilOrder::Second,
            c,
        );

        for result in [unordered, single] {
            assert!(matches!(
                result,
                Err(ForcingError::DataConsistency(
                    DataConsistencyError::NonMonotonicLevels(_)
                ))
            ));
        }
    }

    #[test]
    fn repeated_longitudes_are_rejected() {
        let grid = SyntheticGrid::new(&[47.0, 46.0, 45.0, 44.0, 43.0], &[5.0; 5]);

        let result = compute_forcings(
            &grid.fields(),
            center_45n(),
            window(2, 2, 0),
            StencilOrder::Second,
            PhysicalConstants::default(),
        );

        assert!(matches!(
            result,
            Err(ForcingError::Numerical(NumericalError::DegenerateSpacing { .. }))
        ));
    }

    #[test]
    fn window_too_large() {
        let grid = grid_5x5();
        let c = PhysicalConstants::default();

        let fourth = compute_forcings(
            &grid.fields(),
            center_45n(),
            window(2, 2, 1),
            StencilOrder::Fourth,
            c,
        );
        let wide = compute_forcings(
            &grid.fields(),
            center_45n(),
            window(2, 2, 2),
            StencilOrder::Second,
            c,
        );
        let corner = compute_forcings(
            &grid.fields(),
            center_45n(),
            window(0, 4, 0),
            StencilOrder::Second,
            c,
        );

        for result in [fourth, wide, corner] {
            assert!(matches!(
                result,
                Err(ForcingError::Config(ConfigError::WindowOutOfGrid { .. }))
            ));
        }
    }

    #[test]
    fn equator_is_rejected() {
        let grid = SyntheticGrid::new(&[1.0, 0.0, -1.0], &[10.0, 11.0, 12.0]);

        let result = compute_forcings(
            &grid.fields(),
            GeoPoint {
                lat: 0.0,
                lon: 11.0,
            },
            window(1, 1, 0),
            StencilOrder::Second,
            PhysicalConstants::default(),
        );

        assert!(matches!(
            result,
            Err(ForcingError::Config(ConfigError::OutOfBounds(_)))
        ));
    }

    #[test]
    fn named_terms() {
        let grid = grid_5x5();
        let forcings = compute_forcings(
            &grid.fields(),
            center_45n(),
            window(2, 2, 0),
            StencilOrder::Second,
            PhysicalConstants::default(),
        )
        .unwrap();

        let terms = forcings.terms();

        assert_eq!(terms.len(), 8);
        assert_eq!(terms["dtthl_advec"].dim(), (NTIME, NLEV));
        assert_eq!(terms["vg"], &forcings.vg);
        assert_eq!(forcings.means.ps, arr1(&[100_000.0, 100_000.0]));
    }

    #[test]
    fn sweep_results_are_independent() {
        let grid = grid_5x5();
        let location = GridLocation {
            i: 2,
            j: 2,
            point: center_45n(),
            distance: 0.0,
        };

        let requests = [
            ForcingRequest {
                n_av: 0,
                method: StencilOrder::Second,
            },
            ForcingRequest {
                n_av: 2,
                method: StencilOrder::Second,
            },
            ForcingRequest {
                n_av: 1,
                method: StencilOrder::Second,
            },
        ];

        let results = compute_forcing_sweep(
            &grid.fields(),
            center_45n(),
            location,
            &requests,
            PhysicalConstants::default(),
        );

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().window.n_av, 0);
        assert!(results[1].is_err());
        assert_eq!(results[2].as_ref().unwrap().window.n_av, 1);
    }
}
