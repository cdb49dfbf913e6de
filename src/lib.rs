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

//! Large-Scale Forcing Engine (LSFE) derives the atmospheric state
//! and large-scale horizontal forcings from gridded reanalysis data
//! (like ERA5) for driving single-column models and LES.
//!
//! The library takes 4D fields (time, level, latitude, longitude)
//! already read into memory, reconstructs pressure and height of
//! the hybrid model levels, computes derived thermodynamic variables
//! and then evaluates advective tendencies, geostrophic wind and
//! Coriolis tendencies with 2nd or 4th order finite differences
//! averaged over a configurable window around the chosen location.
//!
//! Reading the data from disk is left to the caller, which hands
//! the arrays to the library through the [`GridDataStore`] trait.
//!
//! The library uses the `log` facade and never installs a logger itself.

pub mod constants;
pub mod errors;
pub mod model;

/// Floating point type used across the library.
pub type Float = f64;

pub use constants::PhysicalConstants;
pub use errors::{ConfigError, DataConsistencyError, ForcingError, ModelError, NumericalError};
pub use model::configuration::Config;
pub use model::dataset::{
    Dataset, GridDataStore, GriddedField, LevelOrder, ModelLevelSource, PressureLevelSource,
    RadiationSource, SourceData, SurfaceSource, Units,
};
pub use model::forcing::{
    compute_forcing_sweep, compute_forcings, AveragingWindow, ForcingFields, ForcingRequest,
    ForcingSet, ForcingTerm, GeoPoint, GridLocation, StencilOrder,
};
pub use model::vertical::HybridCoefficients;
pub use model::Core;
