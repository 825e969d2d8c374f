// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Shared collaborators of every tool and resource handler.

use crate::config::ServerConfig;
use anyhow::{Context, Result};
use chrono::Utc;
use devforge_core::dashboard::{StaticTelemetryFeed, TelemetryFeed};
use devforge_core::scoring::PlatformScorer;
use devforge_core::store::{MemoryStore, PlatformSnapshot, PlatformStore};
use devforge_core::workflow::{ExecutorRegistry, WorkflowRunner};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub struct PlatformContext {
    pub store: Arc<dyn PlatformStore>,
    pub telemetry: Arc<dyn TelemetryFeed>,
    pub scorer: Arc<PlatformScorer>,
    pub runner: WorkflowRunner,
}

impl PlatformContext {
    pub fn new(
        store: Arc<dyn PlatformStore>,
        telemetry: Arc<dyn TelemetryFeed>,
        scorer: PlatformScorer,
        runner: WorkflowRunner,
    ) -> Self {
        Self {
            store,
            telemetry,
            scorer: Arc::new(scorer),
            runner,
        }
    }

    /// Build the in-memory platform described by `config`.
    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        let mut snapshot = match &config.storage.snapshot_path {
            Some(path) => PlatformSnapshot::load(path)
                .with_context(|| format!("Failed to load snapshot {}", path.display()))?,
            None => {
                warn!("No snapshot configured, serving an empty platform");
                PlatformSnapshot::default()
            }
        };

        if config.storage.rebase_timestamps {
            let now = Utc::now();
            snapshot.rebase_to(now);
            info!(%now, "Snapshot timestamps rebased");
        }

        Ok(Self::new(
            Arc::new(MemoryStore::new(snapshot)),
            Arc::new(StaticTelemetryFeed::new(config.telemetry.clone())),
            PlatformScorer::new(config.scoring.cost, config.scoring.compliance),
            WorkflowRunner::new(ExecutorRegistry::simulated(&config.workflow)),
        ))
    }
}
