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

//! Module responsible for parsing and checking the configuration file.
//!
//! To provide meaningful error messages. The configuration file uses
//! [YAML](https://en.wikipedia.org/wiki/YAML) and `serde` to enforce
//! strong typing and automatic type checking.
//!
//! The structures and their fields in this module directly correspond to
//! the fields inside `config.yaml` so you can check this documentation
//! for more details how to set the config file.

use super::forcing::{ForcingRequest, GeoPoint, StencilOrder};
use crate::errors::ConfigError;
use crate::Float;
use serde::Deserialize;
use std::{fs, path::Path};

/// Location for which the forcings are derived.
///
/// The nearest gridpoint of the input data is used
/// as the centre of the averaging window.
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug, Deserialize)]
pub struct Location {
    /// Latitude (in degrees) of the column.
    ///
    /// Must meet the condition: `-90 <= central_lat <= 90`
    pub central_lat: Float,

    /// Longitude (in degrees) of the column.
    ///
    /// Both conventions `-180..180` and `0..360` are accepted.
    pub central_lon: Float,
}

impl Location {
    /// Checks if location follows conventions
    /// and limits.
    pub fn check_bounds(&self) -> Result<(), ConfigError> {
        if !(-90.0..=90.0).contains(&self.central_lat) {
            return Err(ConfigError::OutOfBounds(
                "Central latitude is too low or too high",
            ));
        }

        if !(-180.0..360.0).contains(&self.central_lon) {
            return Err(ConfigError::OutOfBounds(
                "Central longitude is too low or too high",
            ));
        }

        Ok(())
    }

    pub fn as_point(&self) -> GeoPoint {
        GeoPoint {
            lat: self.central_lat,
            lon: self.central_lon,
        }
    }
}

/// Single combination of averaging window and
/// finite-difference method to compute forcings for.
#[derive(Clone, PartialEq, PartialOrd, Debug, Deserialize)]
pub struct Run {
    /// Number of gridpoints (+/-) around the centre over which
    /// variables and forcings are averaged.
    ///
    /// Cannot be negative. `0` means a single column.
    pub n_av: i64,

    /// Finite-difference method, `2nd` or `4th`.
    pub method: String,
}

impl Run {
    /// Converts the run into a typed request,
    /// checking the window size and method name.
    pub fn to_request(&self) -> Result<ForcingRequest, ConfigError> {
        if self.n_av < 0 {
            return Err(ConfigError::OutOfBounds(
                "Averaging window size n_av cannot be negative",
            ));
        }

        let method = self.method.parse::<StencilOrder>()?;

        Ok(ForcingRequest {
            n_av: self.n_av as usize,
            method,
        })
    }
}

/// _(Optional)_ Fields with information about
/// resources available for the library.
#[derive(Clone, PartialEq, PartialOrd, Debug, Deserialize)]
pub struct Resources {
    /// _(Optional)_ Thread count used for computing runs.
    /// The thread pool will use up to this number of workers.
    ///
    /// Cannot be less than `1`. Defaults to `1`.
    #[serde(default = "Resources::default_threads")]
    pub threads: u16,
}

impl Resources {
    fn default_threads() -> u16 {
        1
    }

    /// Checks if thread count is above limits.
    pub fn check_bounds(&self) -> Result<(), ConfigError> {
        if self.threads < 1 {
            return Err(ConfigError::OutOfBounds(
                "Available threads cannot be less than 1",
            ));
        }

        Ok(())
    }
}

impl Default for Resources {
    fn default() -> Self {
        Resources {
            threads: Resources::default_threads(),
        }
    }
}

/// Main config structure representing the fields in
/// configuration file.
#[derive(Clone, PartialEq, PartialOrd, Debug, Deserialize)]
pub struct Config {
    pub location: Location,

    pub runs: Vec<Run>,

    #[serde(default)]
    pub resources: Resources,
}

impl Config {
    /// Config structure constructor, responsible for
    /// deserializing configuration and checking it.
    pub fn new_from_file(file_path: &Path) -> Result<Config, ConfigError> {
        let data = fs::read(file_path)?;
        let config: Config = serde_yaml::from_slice(data.as_slice())?;

        config.check_bounds()?;

        Ok(config)
    }

    /// Same as [`Config::new_from_file`] but
    /// for configuration already held in memory.
    pub fn new_from_str(data: &str) -> Result<Config, ConfigError> {
        let config: Config = serde_yaml::from_str(data)?;

        config.check_bounds()?;

        Ok(config)
    }

    pub fn check_bounds(&self) -> Result<(), ConfigError> {
        self.location.check_bounds()?;
        self.resources.check_bounds()?;

        if self.runs.is_empty() {
            return Err(ConfigError::OutOfBounds(
                "At least one run must be configured",
            ));
        }

        self.requests()?;

        Ok(())
    }

    /// Typed list of requested window/method combinations.
    pub fn requests(&self) -> Result<Vec<ForcingRequest>, ConfigError> {
        self.runs.iter().map(Run::to_request).collect()
    }
}
