// Nearest-wins connection lookup up the organization tree

use crate::errors::ConnectorError;
use crate::models::{ConnectionConfig, Organization};
use crate::store::ConnectorStore;
use std::collections::HashSet;
use tracing::instrument;

/// Walks organization ancestors looking for a connection configuration
pub struct HierarchyLookup<'a> {
    store: &'a dyn ConnectorStore,
}

impl<'a> HierarchyLookup<'a> {
    pub fn new(store: &'a dyn ConnectorStore) -> Self {
        Self { store }
    }

    /// Number of units on the path from `organization` to the root, inclusive
    ///
    /// Stops at the first revisited unit or missing parent, so a malformed
    /// tree still yields a finite count. A dangling parent is not counted.
    #[instrument(skip(self, organization), fields(organization_id = %organization.id))]
    pub async fn ancestor_count(&self, organization: &Organization) -> Result<usize, ConnectorError> {
        let mut visited = HashSet::from([organization.id.clone()]);
        let mut parent = organization.parent().map(str::to_string);

        while let Some(parent_id) = parent {
            if visited.contains(&parent_id) {
                tracing::warn!(organization_id = %parent_id, "Cycle detected in organization tree");
                break;
            }
            parent = match self.store.organization(&parent_id).await? {
                Some(org) => {
                    visited.insert(parent_id);
                    org.parent().map(str::to_string)
                }
                None => {
                    tracing::warn!(organization_id = %parent_id, "Parent organization not found");
                    break;
                }
            };
        }

        Ok(visited.len())
    }

    /// Connection of `start` or its nearest ancestor within `max_depth` steps
    ///
    /// `max_depth` counts inspected units, `start` included, so a depth of 1
    /// only looks at `start` itself.
    #[instrument(skip(self, start), fields(organization_id = %start.id))]
    pub async fn find_config(
        &self,
        start: &Organization,
        max_depth: usize,
    ) -> Result<ConnectionConfig, ConnectorError> {
        let mut current = start.clone();

        for depth in 0..max_depth {
            if let Some(config) = self.store.connection_for_organization(&current.id).await? {
                tracing::info!(
                    connection_id = %config.id,
                    found_at = %current.id,
                    depth = depth,
                    "Resolved connection configuration"
                );
                return Ok(config);
            }

            let Some(parent_id) = current.parent().map(str::to_string) else {
                break;
            };
            match self.store.organization(&parent_id).await? {
                Some(parent) => current = parent,
                None => break,
            }
        }

        tracing::warn!(max_depth = max_depth, "No config found for client/organization");
        Err(ConnectorError::ConfigNotFound {
            organization_id: start.id.clone(),
        })
    }
}
