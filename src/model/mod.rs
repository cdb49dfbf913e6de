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

//! Module containing the actual model code.
//!
//! The computation goes through the following steps:
//!
//! 1. The configuration is read and checked ([`configuration`]).
//! 2. Gridded data is received from a [`dataset::GridDataStore`], checked,
//!    normalised and stored in a read-only [`dataset::Dataset`] together with
//!    pressure and height of model levels ([`vertical`]) and derived
//!    thermodynamic variables ([`thermodynamics`]).
//! 3. The gridpoint nearest to the configured location is found and forcings
//!    are computed for every configured window and method ([`forcing`]),
//!    in parallel on a thread pool.

pub mod configuration;
pub mod dataset;
pub mod forcing;
pub mod thermodynamics;
pub mod vertical;

mod bisection;


use crate::constants::PhysicalConstants;
use crate::errors::{ForcingError, ModelError};
use configuration::Config;
use dataset::{Dataset, GridDataStore};
use forcing::{compute_forcing_sweep, ForcingSet, GridLocation};
use log::{debug, error, info};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::path::Path;

/// Structure containing everything needed to compute forcings.
///
/// Data is read and all derived variables are computed once,
/// so the runs only read from the dataset.
#[derive(Debug)]
pub struct Core {
    pub config: Config,
    pub threadpool: ThreadPool,
    pub dataset: Dataset,
    pub location: GridLocation,
}

impl Core {
    /// Model [`Core`] constructor.
    ///
    /// Sets up the thread pool, reads the data through the `store`
    /// and locates the gridpoint nearest to the configured location.
    pub fn new<S: GridDataStore>(config: Config, store: &S) -> Result<Self, ModelError> {
        Core::with_constants(config, store, PhysicalConstants::default())
    }

    /// Same as [`Core::new`] but with custom physical constants.
    pub fn with_constants<S: GridDataStore>(
        config: Config,
        store: &S,
        constants: PhysicalConstants,
    ) -> Result<Self, ModelError> {
        config.check_bounds()?;

        debug!("Setting up ThreadPool");
        let threadpool = ThreadPoolBuilder::new()
            .num_threads(config.resources.threads as usize)
            .build()?;

        debug!("Reading gridded data");
        let dataset = Dataset::load(store, constants)?;

        let location = GridLocation::nearest(
            dataset.axes.lats.view(),
            dataset.axes.lons.view(),
            config.location.as_point(),
        )
        .map_err(ForcingError::from)?;

        Ok(Core {
            config,
            threadpool,
            dataset,
            location,
        })
    }

    /// Same as [`Core::new`] but reads the configuration from file.
    pub fn new_from_file<S: GridDataStore>(
        config_path: &Path,
        store: &S,
    ) -> Result<Self, ModelError> {
        debug!("Reading configuration from {}", config_path.display());
        let config = Config::new_from_file(config_path)?;

        Core::new(config, store)
    }

    /// Computes forcings for all configured runs.
    ///
    /// Runs are independent, but any failed run fails the
    /// whole call as no partial results are returned.
    pub fn run(&self) -> Result<Vec<ForcingSet>, ModelError> {
        let requests = self.config.requests()?;

        info!("Computing forcings for {} runs", requests.len());

        let fields = self.dataset.forcing_fields();
        let center = self.config.location.as_point();

        let results = self.threadpool.install(|| {
            compute_forcing_sweep(
                &fields,
                center,
                self.location,
                &requests,
                self.dataset.constants,
            )
        });

        let forcings = results
            .into_iter()
            .zip(&requests)
            .map(|(result, request)| {
                result.map_err(|err| {
                    error!(
                        "Run with n_av={} and {} method failed: {}",
                        request.n_av, request.method, err
                    );
                    err
                })
            })
            .collect::<Result<Vec<_>, ForcingError>>()?;

        info!("All runs finished");

        Ok(forcings)
    }
}
