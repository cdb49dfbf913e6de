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

//! Sub-module responsible for checking the source data
//! and turning it into a [`Dataset`].

use super::{
    Dataset, GridAxes, GriddedField, LevelOrder, ModelState, PressureLevelSource, PressureLevels,
    RadiationSource, SourceData, SurfaceSource, Units,
};
use crate::constants::PhysicalConstants;
use crate::errors::{DataConsistencyError, ForcingError};
use crate::model::thermodynamics::{
    virtual_temperature_field, DerivedFields, RadiativeTendencies, SurfaceInputs, SurfaceState,
};
use crate::model::vertical;
use crate::Float;
use chrono::NaiveDateTime;
use log::debug;
use ndarray::{s, Array, Array1, Array3, Array4, Axis, Dimension, Ix3, Ix4};

/// Unit transform applied to a field while reading it.
#[derive(Copy, Clone, PartialEq, Debug)]
enum Transform {
    Identity,
    Scale(Float),
    Negate,
    Exp,
}

impl Transform {
    fn apply(self, value: Float) -> Float {
        match self {
            Transform::Identity => value,
            Transform::Scale(factor) => value * factor,
            Transform::Negate => -value,
            Transform::Exp => value.exp(),
        }
    }
}

/// Builds the dataset from source data.
pub(super) fn build(
    source: SourceData,
    constants: PhysicalConstants,
) -> Result<Dataset, ForcingError> {
    let SourceData {
        times,
        lats,
        lons,
        level_order,
        model,
        pressure,
        surface,
        radiation,
    } = source;

    check_axes(&times, &lats, &lons)?;

    let (ntime, nlat, nlon) = (times.len(), lats.len(), lons.len());
    let nfull = model.temperature.values.dim().1;

    if nfull == 0 {
        return Err(DataConsistencyError::EmptyAxis("model levels").into());
    }

    let shape = [ntime, nfull, nlat, nlon];
    let kelvin = [(Units::Kelvin, Transform::Identity)];
    let wind = [(Units::MetrePerSecond, Transform::Identity)];
    let specific = [(Units::KilogramPerKilogram, Transform::Identity)];

    debug!("Reading model level fields");
    let u = model_level_field("u wind", model.u, &wind, shape, level_order)?;
    let v = model_level_field("v wind", model.v, &wind, shape, level_order)?;
    let omega = model_level_field(
        "omega",
        model.omega,
        &[(Units::PascalPerSecond, Transform::Identity)],
        shape,
        level_order,
    )?;
    let temperature =
        model_level_field("temperature", model.temperature, &kelvin, shape, level_order)?;
    let qv = model_level_field(
        "specific humidity",
        model.specific_humidity,
        &specific,
        shape,
        level_order,
    )?;
    let qc = model_level_field("cloud liquid", model.cloud_liquid, &specific, shape, level_order)?;
    let qi = model_level_field("cloud ice", model.cloud_ice, &specific, shape, level_order)?;
    let qr = model_level_field("rain", model.rain, &specific, shape, level_order)?;
    let qs = model_level_field("snow", model.snow, &specific, shape, level_order)?;

    let ps = surface_field(
        "surface pressure",
        model.surface_pressure,
        &[
            (Units::LogPascal, Transform::Exp),
            (Units::Pascal, Transform::Identity),
        ],
        [ntime, nlat, nlon],
    )?;

    let coefficients = match level_order {
        LevelOrder::TopToBottom => model.coefficients.reversed(),
        LevelOrder::BottomToTop => model.coefficients,
    };

    let ql = &qc + &qi + &qr + &qs;
    let qt = &qv + &ql;

    debug!("Resolving vertical coordinates");
    let tv = virtual_temperature_field(temperature.view(), qv.view(), ql.view(), constants);
    let vertical = vertical::resolve(&coefficients, ps.view(), tv.view(), constants)?;

    let state = ModelState {
        u,
        v,
        omega,
        temperature,
        qv,
        ql,
        qt,
        ps,
    };

    debug!("Computing derived variables");
    let derived = DerivedFields::compute(&state, tv, vertical.p.view(), constants);

    let pressure_levels =
        read_pressure_levels(pressure, [ntime, nlat, nlon], level_order, constants)?;

    let surface = match surface {
        Some(source) => {
            debug!("Computing surface state");
            let inputs = read_surface_inputs(source, [ntime, nlat, nlon])?;

            Some(SurfaceState::compute(
                inputs,
                state.qv.index_axis(Axis(1), 0),
                vertical.ph.index_axis(Axis(1), 0),
                state.ps.view(),
                constants,
            ))
        }
        None => None,
    };

    let radiation = match radiation {
        Some(source) => Some(read_radiation(
            source,
            &times,
            shape,
            level_order,
            &derived,
        )?),
        None => None,
    };

    let time_sec = seconds_since_start(&times);

    Ok(Dataset {
        axes: GridAxes {
            times,
            time_sec,
            lats: Array1::from_vec(lats),
            lons: Array1::from_vec(lons),
        },
        nfull,
        nhalf: nfull + 1,
        state,
        vertical,
        derived,
        pressure_levels,
        surface,
        radiation,
        constants,
    })
}

fn check_axes(
    times: &[NaiveDateTime],
    lats: &[Float],
    lons: &[Float],
) -> Result<(), DataConsistencyError> {
    if times.is_empty() {
        return Err(DataConsistencyError::EmptyAxis("time"));
    }

    if lats.is_empty() {
        return Err(DataConsistencyError::EmptyAxis("latitude"));
    }

    if lons.is_empty() {
        return Err(DataConsistencyError::EmptyAxis("longitude"));
    }

    if times.windows(2).any(|pair| pair[1] <= pair[0]) {
        return Err(DataConsistencyError::TimeAxisMismatch(
            "analysis times are not strictly increasing",
        ));
    }

    Ok(())
}

fn seconds_since_start(times: &[NaiveDateTime]) -> Array1<Float> {
    let start = times[0];

    times
        .iter()
        .map(|time| (*time - start).num_milliseconds() as Float / 1000.0)
        .collect()
}

fn check_shape(
    field: &'static str,
    found: &[usize],
    expected: &[usize],
) -> Result<(), DataConsistencyError> {
    if found != expected {
        return Err(DataConsistencyError::ShapeMismatch {
            field,
            expected: expected.to_vec(),
            found: found.to_vec(),
        });
    }

    Ok(())
}

/// Checks the field units against the accepted ones
/// and applies the matching transform.
fn convert<D: Dimension>(
    name: &'static str,
    field: GriddedField<D>,
    accepted: &[(Units, Transform)],
) -> Result<Array<Float, D>, DataConsistencyError> {
    let transform = accepted
        .iter()
        .find(|(units, _)| *units == field.units)
        .map(|(_, transform)| *transform)
        .ok_or_else(|| DataConsistencyError::UnexpectedUnits {
            field: name,
            expected: accepted
                .iter()
                .map(|(units, _)| units.symbol())
                .collect::<Vec<_>>()
                .join(" or "),
            found: field.units.symbol(),
        })?;

    if transform == Transform::Identity {
        return Ok(field.values);
    }

    Ok(field.values.mapv_into(|v| transform.apply(v)))
}

fn to_bottom_up(values: Array4<Float>, level_order: LevelOrder) -> Array4<Float> {
    match level_order {
        LevelOrder::TopToBottom => values.slice(s![.., ..;-1, .., ..]).to_owned(),
        LevelOrder::BottomToTop => values,
    }
}

fn model_level_field(
    name: &'static str,
    field: GriddedField<Ix4>,
    accepted: &[(Units, Transform)],
    shape: [usize; 4],
    level_order: LevelOrder,
) -> Result<Array4<Float>, DataConsistencyError> {
    check_shape(name, field.values.shape(), &shape)?;
    let values = convert(name, field, accepted)?;

    Ok(to_bottom_up(values, level_order))
}

fn surface_field(
    name: &'static str,
    field: GriddedField<Ix3>,
    accepted: &[(Units, Transform)],
    shape: [usize; 3],
) -> Result<Array3<Float>, DataConsistencyError> {
    check_shape(name, field.values.shape(), &shape)?;

    convert(name, field, accepted)
}

/// Reads pressure level axis (converted to Pa) and geopotential
/// height (m) and checks that the pressure axis is strictly monotonic.
fn read_pressure_levels(
    source: PressureLevelSource,
    shape: [usize; 3],
    level_order: LevelOrder,
    constants: PhysicalConstants,
) -> Result<PressureLevels, DataConsistencyError> {
    debug!("Reading pressure level fields");

    let levels = convert(
        "pressure levels",
        source.levels,
        &[
            (Units::Hectopascal, Transform::Scale(100.0)),
            (Units::Pascal, Transform::Identity),
        ],
    )?;

    let nplev = levels.len();

    let p = match level_order {
        LevelOrder::TopToBottom => levels.slice(s![..;-1]).to_owned(),
        LevelOrder::BottomToTop => levels,
    };

    PressureLevels::check_axis(p.view())?;

    let z = model_level_field(
        "geopotential on pressure levels",
        source.geopotential,
        &[
            (Units::Geopotential, Transform::Scale(1.0 / constants.grav)),
            (Units::Metre, Transform::Identity),
        ],
        [shape[0], nplev, shape[1], shape[2]],
        level_order,
    )?;

    Ok(PressureLevels { p, z })
}

/// Reads surface fields, turning fluxes positive upwards.
fn read_surface_inputs(
    source: SurfaceSource,
    shape: [usize; 3],
) -> Result<SurfaceInputs, DataConsistencyError> {
    let flux_upwards = Transform::Negate;

    Ok(SurfaceInputs {
        skin_temperature: surface_field(
            "skin temperature",
            source.skin_temperature,
            &[(Units::Kelvin, Transform::Identity)],
            shape,
        )?,
        sensible_heat_flux: surface_field(
            "sensible heat flux",
            source.sensible_heat_flux,
            &[(Units::WattPerSquareMetre, flux_upwards)],
            shape,
        )?,
        moisture_flux: surface_field(
            "moisture flux",
            source.moisture_flux,
            &[(Units::KilogramPerSquareMetrePerSecond, flux_upwards)],
            shape,
        )?,
        cloud_cover: surface_field(
            "cloud cover",
            source.cloud_cover,
            &[(Units::Fraction, Transform::Identity)],
            shape,
        )?,
        roughness_momentum: surface_field(
            "roughness length for momentum",
            source.roughness_momentum,
            &[(Units::Metre, Transform::Identity)],
            shape,
        )?,
        roughness_heat: surface_field(
            "roughness length for heat",
            source.roughness_heat,
            &[
                (Units::LogMetre, Transform::Exp),
                (Units::Metre, Transform::Identity),
            ],
            shape,
        )?,
    })
}

/// Reads forecast radiative tendencies, which must be
/// valid at exactly the analysis times.
fn read_radiation(
    source: RadiationSource,
    times: &[NaiveDateTime],
    shape: [usize; 4],
    level_order: LevelOrder,
    derived: &DerivedFields,
) -> Result<RadiativeTendencies, DataConsistencyError> {
    if source.times.as_slice() != times {
        return Err(DataConsistencyError::TimeAxisMismatch(
            "analysis and forecast times are not synced",
        ));
    }

    let tendency = [(Units::KelvinPerSecond, Transform::Identity)];

    let shortwave = model_level_field(
        "shortwave tendency",
        source.shortwave,
        &tendency,
        shape,
        level_order,
    )?;
    let longwave = model_level_field(
        "longwave tendency",
        source.longwave,
        &tendency,
        shape,
        level_order,
    )?;
    let shortwave_clear = model_level_field(
        "clear-sky shortwave tendency",
        source.shortwave_clear,
        &tendency,
        shape,
        level_order,
    )?;
    let longwave_clear = model_level_field(
        "clear-sky longwave tendency",
        source.longwave_clear,
        &tendency,
        shape,
        level_order,
    )?;

    Ok(RadiativeTendencies::from_temperature_tendencies(
        shortwave.view(),
        longwave.view(),
        shortwave_clear.view(),
        longwave_clear.view(),
        derived.exner.view(),
    ))
}
