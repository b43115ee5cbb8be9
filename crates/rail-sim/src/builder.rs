//! Fluent builder for constructing an [`Engine`].

use std::path::Path;

use log::info;

use rail_demand::{DemandGrid, load_grid_csv};
use rail_network::{NetworkDescription, Router, UniformCostRouter};

use crate::config::EngineConfig;
use crate::{Engine, SimResult};

/// Fluent builder for [`Engine<R>`].
///
/// # Required inputs
///
/// - [`EngineConfig`]: clock, seed, and every subsystem's parameters
/// - `R: Router`: the journey planner (e.g. [`UniformCostRouter`])
///
/// # Optional inputs (have defaults)
///
/// | Method                 | Default                                   |
/// |------------------------|-------------------------------------------|
/// | `.network(d)`          | Empty network, no trains                  |
/// | `.network_json(p)`     | Same, read from a JSON file               |
/// | `.demand_grid(g)`      | Generated around stations on first use    |
/// | `.demand_grid_csv(p)`  | Same, read from a CSV file                |
///
/// # Example
///
/// ```rust,ignore
/// let mut engine = EngineBuilder::with_default_router(config)
///     .network(description)
///     .build()?;
/// engine.handle(Command::Start);
/// engine.run(&mut NoopObserver);
/// ```
pub struct EngineBuilder<R: Router> {
    config:  EngineConfig,
    router:  R,
    network: Option<NetworkDescription>,
    grid:    Option<DemandGrid>,
}

impl EngineBuilder<UniformCostRouter> {
    /// A builder using the uniform-cost router with the configured
    /// router parameters.
    pub fn with_default_router(config: EngineConfig) -> Self {
        let router = UniformCostRouter::new(config.router.clone());
        Self::new(config, router)
    }
}

impl<R: Router> EngineBuilder<R> {
    pub fn new(config: EngineConfig, router: R) -> Self {
        Self { config, router, network: None, grid: None }
    }

    /// Network to install before the first tick, as if sent through
    /// `UpdateNetwork`.
    pub fn network(mut self, description: NetworkDescription) -> Self {
        self.network = Some(description);
        self
    }

    /// Read the network from a JSON file of `{"lines": [...], "stations": [...]}`.
    pub fn network_json(self, path: &Path) -> SimResult<Self> {
        let description = NetworkDescription::from_json_path(path)?;
        Ok(self.network(description))
    }

    /// Host-supplied demand grid.  Kept across network rebuilds.
    pub fn demand_grid(mut self, grid: DemandGrid) -> Self {
        self.grid = Some(grid);
        self
    }

    /// Read the demand grid from a `lng,lat,demand` CSV file.
    pub fn demand_grid_csv(self, path: &Path) -> SimResult<Self> {
        let grid = load_grid_csv(path, self.config.demand.cell_size_m)?;
        Ok(self.demand_grid(grid))
    }

    /// Validate the configuration and return a paused [`Engine`].
    pub fn build(self) -> SimResult<Engine<R>> {
        self.config.validate()?;

        let mut engine = Engine::new(self.config, self.router);
        if let Some(description) = self.network {
            engine.update_network(&description);
        }
        if let Some(grid) = self.grid {
            info!("installing demand grid with {} cells", grid.len());
            engine.install_demand_grid(grid);
        }
        Ok(engine)
    }
}
