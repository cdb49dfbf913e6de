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

use crate::Float;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Error while reading config.yaml: {0}")]
    Config(#[from] ConfigError),

    #[error("Error while computing forcings: {0}")]
    Forcing(#[from] ForcingError),

    #[error("Error while creating ThreadPool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

#[derive(Error, Debug)]
pub enum ForcingError {
    #[error("Incorrect configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Inconsistent input data: {0}")]
    DataConsistency(#[from] DataConsistencyError),

    #[error("Numerical failure: {0}")]
    Numerical(#[from] NumericalError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot open config.yaml: {0}")]
    CantOpenFile(#[from] std::io::Error),

    #[error("Cannot deserialize config.yaml: {0}")]
    CantDeserialize(#[from] serde_yaml::Error),

    #[error("Configuration component is out of bounds {0}")]
    OutOfBounds(&'static str),

    #[error("Unsupported finite-difference method: {0}")]
    UnsupportedMethod(String),

    #[error("Averaging window of {n_av} points with stencil margin {margin} around (i={i}, j={j}) exceeds the {nlon}x{nlat} grid")]
    WindowOutOfGrid {
        i: usize,
        j: usize,
        n_av: usize,
        margin: usize,
        nlon: usize,
        nlat: usize,
    },
}

#[derive(Error, Debug)]
pub enum DataConsistencyError {
    #[error("Time axes are not synchronised: {0}")]
    TimeAxisMismatch(&'static str),

    #[error("Field {field} has shape {found:?}, expected {expected:?}")]
    ShapeMismatch {
        field: &'static str,
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    #[error("Field {field} is given in {found}, expected {expected}")]
    UnexpectedUnits {
        field: &'static str,
        expected: String,
        found: &'static str,
    },

    #[error("Levels are not strictly monotonic: {0}")]
    NonMonotonicLevels(&'static str),

    #[error("Hybrid coefficient table has {found} entries but {expected} half levels are required")]
    CoefficientsMismatch { expected: usize, found: usize },

    #[error("Surface pressure is not finite at (t={t}, j={j}, i={i})")]
    NonFiniteSurfacePressure { t: usize, j: usize, i: usize },

    #[error("Axis cannot be empty: {0}")]
    EmptyAxis(&'static str),
}

#[derive(Error, Debug)]
pub enum NumericalError {
    #[error("Interpolation of {0} produced a non-finite value")]
    NonFiniteInterpolation(&'static str),

    #[error("At least two levels are required to interpolate, found {0}")]
    TooFewLevels(usize),

    #[error("Grid spacing around (i={i}, j={j}) is degenerate: dx={dx}, dy={dy}")]
    DegenerateSpacing {
        i: usize,
        j: usize,
        dx: Float,
        dy: Float,
    },

    #[error("Level search failed: {0}")]
    Search(#[from] SearchError),
}

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Searched axis has {0} points, at least two are required")]
    TooShort(usize),
}
