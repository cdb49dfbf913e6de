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

//! Module responsible for receiving the gridded input
//! data and storing it together with all variables derived
//! from it, so the forcing computations can use it.
//!
//! Reading the data from files is not done here. The caller
//! provides it through [`GridDataStore`] as a [`SourceData`],
//! which is then checked and normalised (level axis flipped to
//! bottom-to-top, units converted) into a [`Dataset`].

mod ingest;

use super::forcing::ForcingFields;
use super::thermodynamics::{DerivedFields, RadiativeTendencies, SurfaceState};
use super::vertical::{HybridCoefficients, VerticalCoordinates};
use crate::constants::PhysicalConstants;
use crate::errors::{DataConsistencyError, ForcingError};
use crate::Float;
use chrono::NaiveDateTime;
use log::{debug, info};
use ndarray::{Array, Array1, Array3, Array4, ArrayView1, Dimension, Ix1, Ix3, Ix4};

/// Physical units of input fields.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum Units {
    Kelvin,
    MetrePerSecond,
    PascalPerSecond,
    KilogramPerKilogram,
    Pascal,
    Hectopascal,
    LogPascal,
    Metre,
    LogMetre,
    Geopotential,
    KelvinPerSecond,
    WattPerSquareMetre,
    KilogramPerSquareMetrePerSecond,
    Fraction,
}

impl Units {
    pub fn symbol(&self) -> &'static str {
        match self {
            Units::Kelvin => "K",
            Units::MetrePerSecond => "m s-1",
            Units::PascalPerSecond => "Pa s-1",
            Units::KilogramPerKilogram => "kg kg-1",
            Units::Pascal => "Pa",
            Units::Hectopascal => "hPa",
            Units::LogPascal => "ln(Pa)",
            Units::Metre => "m",
            Units::LogMetre => "ln(m)",
            Units::Geopotential => "m2 s-2",
            Units::KelvinPerSecond => "K s-1",
            Units::WattPerSquareMetre => "W m-2",
            Units::KilogramPerSquareMetrePerSecond => "kg m-2 s-1",
            Units::Fraction => "(0 - 1)",
        }
    }
}

/// Array of values tagged with its physical units.
#[derive(Clone, PartialEq, Debug)]
pub struct GriddedField<D: Dimension> {
    pub values: Array<Float, D>,
    pub units: Units,
}

impl<D: Dimension> GriddedField<D> {
    pub fn new(values: Array<Float, D>, units: Units) -> Self {
        GriddedField { values, units }
    }
}

/// Ordering of the vertical axis in the source data.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum LevelOrder {
    /// First level is the highest one (as in ERA5 files).
    TopToBottom,
    /// First level is the lowest one.
    BottomToTop,
}

/// Fields on the hybrid model levels, each of shape
/// `(time, level, lat, lon)` apart from surface pressure
/// of shape `(time, lat, lon)`.
#[derive(Clone, Debug)]
pub struct ModelLevelSource {
    pub u: GriddedField<Ix4>,
    pub v: GriddedField<Ix4>,
    pub omega: GriddedField<Ix4>,
    pub temperature: GriddedField<Ix4>,
    pub specific_humidity: GriddedField<Ix4>,
    pub cloud_liquid: GriddedField<Ix4>,
    pub cloud_ice: GriddedField<Ix4>,
    pub rain: GriddedField<Ix4>,
    pub snow: GriddedField<Ix4>,
    pub surface_pressure: GriddedField<Ix3>,
    /// Hybrid coefficients of `nfull + 1` half levels,
    /// in the same vertical order as the fields.
    pub coefficients: HybridCoefficients,
}

/// Geopotential on constant pressure levels.
#[derive(Clone, Debug)]
pub struct PressureLevelSource {
    pub levels: GriddedField<Ix1>,
    pub geopotential: GriddedField<Ix4>,
}

/// Surface fields, each of shape `(time, lat, lon)`.
/// Fluxes are positive downwards (ECMWF convention).
#[derive(Clone, Debug)]
pub struct SurfaceSource {
    pub skin_temperature: GriddedField<Ix3>,
    pub sensible_heat_flux: GriddedField<Ix3>,
    pub moisture_flux: GriddedField<Ix3>,
    pub cloud_cover: GriddedField<Ix3>,
    pub roughness_momentum: GriddedField<Ix3>,
    pub roughness_heat: GriddedField<Ix3>,
}

/// Radiative temperature tendencies from the forecast
/// data, which has its own time axis.
#[derive(Clone, Debug)]
pub struct RadiationSource {
    pub times: Vec<NaiveDateTime>,
    pub shortwave: GriddedField<Ix4>,
    pub longwave: GriddedField<Ix4>,
    pub shortwave_clear: GriddedField<Ix4>,
    pub longwave_clear: GriddedField<Ix4>,
}

/// Everything the library needs to read from
/// the gridded input data.
#[derive(Clone, Debug)]
pub struct SourceData {
    pub times: Vec<NaiveDateTime>,
    pub lats: Vec<Float>,
    pub lons: Vec<Float>,
    pub level_order: LevelOrder,
    pub model: ModelLevelSource,
    pub pressure: PressureLevelSource,
    pub surface: Option<SurfaceSource>,
    pub radiation: Option<RadiationSource>,
}

/// Provider of the gridded input data.
///
/// Implementors handle finding, downloading and decoding
/// the data files; the library only consumes the arrays.
pub trait GridDataStore {
    fn read_source(&self) -> Result<SourceData, ForcingError>;
}

/// Time and horizontal axes shared by all fields.
#[derive(Clone, Debug)]
pub struct GridAxes {
    pub times: Vec<NaiveDateTime>,
    /// Seconds since the first time step
    pub time_sec: Array1<Float>,
    pub lats: Array1<Float>,
    pub lons: Array1<Float>,
}

/// Model level fields after ingestion, bottom-to-top.
#[derive(Clone, Debug)]
pub struct ModelState {
    pub u: Array4<Float>,
    pub v: Array4<Float>,
    pub omega: Array4<Float>,
    pub temperature: Array4<Float>,
    pub qv: Array4<Float>,
    /// Total condensed water (liquid, ice, rain and snow)
    pub ql: Array4<Float>,
    /// Total water (vapour and condensate)
    pub qt: Array4<Float>,
    pub ps: Array3<Float>,
}

/// Height (m) of constant pressure levels (Pa), bottom-to-top.
#[derive(Clone, Debug)]
pub struct PressureLevels {
    pub p: Array1<Float>,
    pub z: Array4<Float>,
}

impl PressureLevels {
    /// Checks that the pressure level axis has at least two
    /// levels and is strictly monotonic in either direction.
    pub fn check_axis(p: ArrayView1<Float>) -> Result<(), DataConsistencyError> {
        if p.len() < 2 {
            return Err(DataConsistencyError::NonMonotonicLevels(
                "at least two pressure levels are required",
            ));
        }

        let decreasing = p.iter().zip(p.iter().skip(1)).all(|(a, b)| b < a);
        let increasing = p.iter().zip(p.iter().skip(1)).all(|(a, b)| b > a);

        if !decreasing && !increasing {
            return Err(DataConsistencyError::NonMonotonicLevels(
                "pressure level axis",
            ));
        }

        Ok(())
    }
}

/// Read-only dataset with input fields and all
/// variables derived from them.
///
/// Derived variables are computed once at construction
/// and shared by all forcing computations.
#[derive(Clone, Debug)]
pub struct Dataset {
    pub axes: GridAxes,
    pub nfull: usize,
    pub nhalf: usize,
    pub state: ModelState,
    pub vertical: VerticalCoordinates,
    pub derived: DerivedFields,
    pub pressure_levels: PressureLevels,
    pub surface: Option<SurfaceState>,
    pub radiation: Option<RadiativeTendencies>,
    pub constants: PhysicalConstants,
}

impl Dataset {
    /// Reads the source data from the store and builds the dataset.
    pub fn load<S: GridDataStore>(
        store: &S,
        constants: PhysicalConstants,
    ) -> Result<Self, ForcingError> {
        debug!("Reading source data from the grid data store");
        let source = store.read_source()?;

        Dataset::new(source, constants)
    }

    /// Checks and normalises the source data and
    /// derives vertical coordinates and thermodynamic variables.
    pub fn new(source: SourceData, constants: PhysicalConstants) -> Result<Self, ForcingError> {
        info!("Ingesting gridded input data");

        let dataset = ingest::build(source, constants)?;

        info!(
            "Dataset ready: {} times, {} full levels, {}x{} gridpoints",
            dataset.axes.times.len(),
            dataset.nfull,
            dataset.axes.lons.len(),
            dataset.axes.lats.len()
        );

        Ok(dataset)
    }

    pub fn ntime(&self) -> usize {
        self.axes.times.len()
    }

    /// Borrowed views of the fields consumed by the forcing engine.
    pub fn forcing_fields(&self) -> ForcingFields<'_> {
        ForcingFields {
            lats: self.axes.lats.view(),
            lons: self.axes.lons.view(),
            thl: self.derived.theta_l.view(),
            qt: self.state.qt.view(),
            u: self.state.u.view(),
            v: self.state.v.view(),
            p: self.vertical.p.view(),
            z: self.vertical.z.view(),
            density: self.derived.density.view(),
            vertical_velocity: self.derived.vertical_velocity.view(),
            wind_speed: self.derived.wind_speed.view(),
            ps: self.state.ps.view(),
            p_levels: self.pressure_levels.p.view(),
            z_levels: self.pressure_levels.z.view(),
            surface: self.surface.as_ref(),
            radiation: self.radiation.as_ref(),
        }
    }
}
