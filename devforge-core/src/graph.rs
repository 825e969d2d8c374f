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

//! Dependency graph walker
//!
//! Expands the neighbourhood of a service in both directions (what it
//! depends on, and what depends on it) up to a bounded depth. One visited
//! set is shared by the whole traversal, so every service is expanded at
//! most once even when the relation has cycles; repeated occurrences are
//! reported with `children: null`.

use crate::catalog::{DependencyLink, ServiceSummary};
use crate::error::StoreResult;
use crate::store::PlatformStore;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Deepest traversal accepted by callers.
pub const MAX_DEPTH: i64 = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyNode {
    pub service: ServiceSummary,
    pub dependencies: Vec<DependencyBranch>,
    pub dependents: Vec<DependencyBranch>,
}

/// One edge of an expanded node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyBranch {
    pub service: ServiceSummary,
    #[serde(rename = "type")]
    pub dependency_type: String,
    pub description: Option<String>,
    /// `None` when the remaining depth ran out or the service was already expanded
    pub children: Option<Box<DependencyNode>>,
}

pub struct DependencyWalker<'a> {
    store: &'a dyn PlatformStore,
}

impl<'a> DependencyWalker<'a> {
    pub fn new(store: &'a dyn PlatformStore) -> Self {
        Self { store }
    }

    /// Expand `root` up to `depth` levels. `None` for `depth <= 0` or an
    /// unknown service.
    pub async fn walk(&self, root: &str, depth: i64) -> StoreResult<Option<DependencyNode>> {
        let mut visited = HashSet::new();
        self.expand(root.to_string(), depth, &mut visited).await
    }

    fn expand<'s>(
        &'s self,
        name: String,
        depth: i64,
        visited: &'s mut HashSet<String>,
    ) -> BoxFuture<'s, StoreResult<Option<DependencyNode>>> {
        async move {
            if depth <= 0 {
                return Ok(None);
            }
            let Some(service) = self.store.find_service(&name).await? else {
                return Ok(None);
            };
            // keyed by id so the set agrees with how the store resolves names
            if !visited.insert(service.id.clone()) {
                return Ok(None);
            }

            let outgoing = self.store.dependencies_of(&service.id).await?;
            let incoming = self.store.dependents_of(&service.id).await?;

            let mut dependencies = Vec::with_capacity(outgoing.len());
            for link in outgoing {
                dependencies.push(self.branch(link, depth, visited).await?);
            }

            let mut dependents = Vec::with_capacity(incoming.len());
            for link in incoming {
                dependents.push(self.branch(link, depth, visited).await?);
            }

            Ok(Some(DependencyNode {
                service: service.summary(),
                dependencies,
                dependents,
            }))
        }
        .boxed()
    }

    async fn branch(
        &self,
        link: DependencyLink,
        depth: i64,
        visited: &mut HashSet<String>,
    ) -> StoreResult<DependencyBranch> {
        let children = self
            .expand(link.service.name.clone(), depth - 1, visited)
            .await?
            .map(Box::new);

        Ok(DependencyBranch {
            service: link.service,
            dependency_type: link.dependency_type,
            description: link.description,
            children,
        })
    }
}
