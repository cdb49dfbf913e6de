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

//! Module with element-wise thermodynamic transforms
//! of the model level fields.
//!
//! All functions are pure: non-finite inputs simply
//! propagate to the outputs.

use super::dataset::ModelState;
use crate::constants::PhysicalConstants;
use crate::Float;
use ndarray::{Array3, Array4, ArrayView3, ArrayView4, Zip};

/// Virtual temperature (K) from temperature (K), water vapour
/// and the sum of condensed water species (liquid, ice, rain, snow)
/// in kg kg-1.
pub fn virtual_temperature(
    temperature: Float,
    vapour: Float,
    condensate: Float,
    constants: PhysicalConstants,
) -> Float {
    temperature * (1.0 + constants.vapour_correction() * vapour - condensate)
}

/// Exner function `(p / p0)^(Rd/cp)`.
pub fn exner(pressure: Float, constants: PhysicalConstants) -> Float {
    (pressure / constants.p0).powf(constants.kappa())
}

pub fn potential_temperature(temperature: Float, exner: Float) -> Float {
    temperature / exner
}

/// Liquid water potential temperature (K).
pub fn liquid_water_potential_temperature(
    theta: Float,
    exner: Float,
    condensate: Float,
    constants: PhysicalConstants,
) -> Float {
    theta - constants.l_v / (constants.c_pd * exner) * condensate
}

/// Density of air (kg m-3) from pressure and virtual temperature.
pub fn density(pressure: Float, virtual_temperature: Float, constants: PhysicalConstants) -> Float {
    pressure / (constants.r_d * virtual_temperature)
}

/// Vertical velocity in height coordinates (m s-1)
/// from pressure velocity omega (Pa s-1).
pub fn vertical_velocity(omega: Float, density: Float, constants: PhysicalConstants) -> Float {
    -omega / (density * constants.grav)
}

pub fn wind_speed(u: Float, v: Float) -> Float {
    (u * u + v * v).sqrt()
}

/// Virtual temperature on every gridpoint of the model levels.
pub fn virtual_temperature_field(
    temperature: ArrayView4<Float>,
    vapour: ArrayView4<Float>,
    condensate: ArrayView4<Float>,
    constants: PhysicalConstants,
) -> Array4<Float> {
    let mut tv = Array4::zeros(temperature.raw_dim());

    Zip::from(&mut tv)
        .and(&temperature)
        .and(&vapour)
        .and(&condensate)
        .for_each(|tv, &t, &qv, &ql| {
            *tv = virtual_temperature(t, qv, ql, constants);
        });

    tv
}

/// Thermodynamic variables derived at the full model levels.
#[derive(Clone, Debug)]
pub struct DerivedFields {
    pub virtual_temperature: Array4<Float>,
    pub exner: Array4<Float>,
    pub theta: Array4<Float>,
    pub theta_l: Array4<Float>,
    pub density: Array4<Float>,
    pub vertical_velocity: Array4<Float>,
    pub wind_speed: Array4<Float>,
}

impl DerivedFields {
    /// Computes all derived variables from the model state,
    /// already computed virtual temperature and full level pressure.
    pub fn compute(
        state: &ModelState,
        virtual_temperature: Array4<Float>,
        pressure: ArrayView4<Float>,
        constants: PhysicalConstants,
    ) -> Self {
        let exner = pressure.mapv(|p| exner(p, constants));

        let mut theta = Array4::zeros(exner.raw_dim());
        let mut theta_l = Array4::zeros(exner.raw_dim());

        Zip::from(&mut theta)
            .and(&mut theta_l)
            .and(&state.temperature)
            .and(&exner)
            .and(&state.ql)
            .for_each(|th, thl, &t, &exn, &ql| {
                *th = potential_temperature(t, exn);
                *thl = liquid_water_potential_temperature(*th, exn, ql, constants);
            });

        let mut density = Array4::zeros(exner.raw_dim());
        let mut w = Array4::zeros(exner.raw_dim());

        Zip::from(&mut density)
            .and(&mut w)
            .and(&pressure)
            .and(&virtual_temperature)
            .and(&state.omega)
            .for_each(|rho, w, &p, &tv, &omega| {
                *rho = self::density(p, tv, constants);
                *w = vertical_velocity(omega, *rho, constants);
            });

        let mut speed = Array4::zeros(exner.raw_dim());

        Zip::from(&mut speed)
            .and(&state.u)
            .and(&state.v)
            .for_each(|speed, &u, &v| *speed = wind_speed(u, v));

        DerivedFields {
            virtual_temperature,
            exner,
            theta,
            theta_l,
            density,
            vertical_velocity: w,
            wind_speed: speed,
        }
    }
}

/// Surface variables as provided by the input, after
/// unit conversion. Fluxes are positive upwards.
#[derive(Clone, Debug)]
pub struct SurfaceInputs {
    pub skin_temperature: Array3<Float>,
    pub sensible_heat_flux: Array3<Float>,
    pub moisture_flux: Array3<Float>,
    pub cloud_cover: Array3<Float>,
    pub roughness_momentum: Array3<Float>,
    pub roughness_heat: Array3<Float>,
}

/// Surface state used to drive the column model,
/// all of shape `(time, lat, lon)`.
#[derive(Clone, Debug)]
pub struct SurfaceState {
    pub skin_temperature: Array3<Float>,
    pub virtual_temperature: Array3<Float>,
    pub density: Array3<Float>,
    pub exner: Array3<Float>,
    /// Kinematic sensible heat flux (K m s-1)
    pub heat_flux: Array3<Float>,
    /// Surface moisture flux (kg m-2 s-1), passed through
    pub moisture_flux: Array3<Float>,
    pub cloud_cover: Array3<Float>,
    pub roughness_momentum: Array3<Float>,
    pub roughness_heat: Array3<Float>,
}

impl SurfaceState {
    /// Derives the surface state. The surface virtual temperature
    /// is estimated from the skin temperature and the water vapour
    /// of the lowest model level.
    pub fn compute(
        inputs: SurfaceInputs,
        lowest_vapour: ArrayView3<Float>,
        surface_half_pressure: ArrayView3<Float>,
        surface_pressure: ArrayView3<Float>,
        constants: PhysicalConstants,
    ) -> Self {
        let mut tvs = Array3::zeros(inputs.skin_temperature.raw_dim());
        let mut rhos = Array3::zeros(inputs.skin_temperature.raw_dim());

        Zip::from(&mut tvs)
            .and(&mut rhos)
            .and(&inputs.skin_temperature)
            .and(&lowest_vapour)
            .and(&surface_half_pressure)
            .for_each(|tv, rho, &ts, &qv, &ph| {
                *tv = virtual_temperature(ts, qv, 0.0, constants);
                *rho = density(ph, *tv, constants);
            });

        let exns = surface_pressure.mapv(|p| exner(p, constants));

        let mut heat_flux = Array3::zeros(exns.raw_dim());

        Zip::from(&mut heat_flux)
            .and(&inputs.sensible_heat_flux)
            .and(&rhos)
            .and(&exns)
            .for_each(|wth, &h, &rho, &exn| {
                *wth = h / (rho * constants.c_pd * exn);
            });

        SurfaceState {
            skin_temperature: inputs.skin_temperature,
            virtual_temperature: tvs,
            density: rhos,
            exner: exns,
            heat_flux,
            moisture_flux: inputs.moisture_flux,
            cloud_cover: inputs.cloud_cover,
            roughness_momentum: inputs.roughness_momentum,
            roughness_heat: inputs.roughness_heat,
        }
    }
}

/// Radiative tendencies of potential temperature (K s-1)
/// at full model levels.
#[derive(Clone, Debug)]
pub struct RadiativeTendencies {
    pub shortwave: Array4<Float>,
    pub longwave: Array4<Float>,
    pub shortwave_clear: Array4<Float>,
    pub longwave_clear: Array4<Float>,
}

impl RadiativeTendencies {
    /// Converts temperature tendencies into potential
    /// temperature tendencies by dividing by the exner function.
    pub fn from_temperature_tendencies(
        shortwave: ArrayView4<Float>,
        longwave: ArrayView4<Float>,
        shortwave_clear: ArrayView4<Float>,
        longwave_clear: ArrayView4<Float>,
        exner: ArrayView4<Float>,
    ) -> Self {
        RadiativeTendencies {
            shortwave: &shortwave / &exner,
            longwave: &longwave / &exner,
            shortwave_clear: &shortwave_clear / &exner,
            longwave_clear: &longwave_clear / &exner,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    #[test]
    fn exner_at_reference() {
        let c = PhysicalConstants::default();

        assert!(approx_eq!(Float, exner(c.p0, c), 1.0));
        assert!(approx_eq!(
            Float,
            exner(50_000.0, c),
            0.5_f64.powf(2.0 / 7.0),
            epsilon = 1e-12
        ));
    }

    #[test]
    fn dry_virtual_temperature() {
        let c = PhysicalConstants::default();

        assert!(approx_eq!(Float, virtual_temperature(290.0, 0.0, 0.0, c), 290.0));
        assert!(virtual_temperature(290.0, 0.01, 0.0, c) > 290.0);
        assert!(virtual_temperature(290.0, 0.0, 0.001, c) < 290.0);
    }

    #[test]
    fn theta_l_without_condensate() {
        let c = PhysicalConstants::default();
        let exn = exner(85_000.0, c);
        let theta = potential_temperature(280.0, exn);

        assert!(approx_eq!(
            Float,
            liquid_water_potential_temperature(theta, exn, 0.0, c),
            theta
        ));
        assert!(liquid_water_potential_temperature(theta, exn, 1e-3, c) < theta);
    }

    #[test]
    fn omega_to_w() {
        let c = PhysicalConstants::default();
        let rho = density(100_000.0, 300.0, c);

        assert!(approx_eq!(Float, rho, 100_000.0 / (287.06 * 300.0), epsilon = 1e-12));

        // rising motion has negative omega
        let w = vertical_velocity(-1.0, rho, c);
        assert!(w > 0.0);
        assert!(approx_eq!(Float, w, 1.0 / (rho * c.grav), epsilon = 1e-12));
    }

    #[test]
    fn speed() {
        assert!(approx_eq!(Float, wind_speed(3.0, -4.0), 5.0));
    }

    #[test]
    fn propagates_nan() {
        let c = PhysicalConstants::default();

        assert!(exner(Float::NAN, c).is_nan());
        assert!(virtual_temperature(Float::NAN, 0.0, 0.0, c).is_nan());
    }
}
