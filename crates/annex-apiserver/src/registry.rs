//! The per-server table of registered resource kinds and their handlers.

use crate::handler::ResourceHandler;
use annex_core::{AnnexError, ApiResource, ApiResourceList, GroupVersion, GroupVersionResource};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::info;

/// Whether a handler serves cluster-scoped or namespaced requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerScope {
    Cluster,
    Namespaced,
}

#[derive(Default)]
struct RegistryInner {
    /// Discovery lists per GroupVersion; grow monotonically in registration order
    resource_lists: HashMap<GroupVersion, ApiResourceList>,
    /// Handler tables, split by scope; a GVR appears in exactly one of the two
    cluster_handlers: HashMap<GroupVersionResource, Arc<dyn ResourceHandler>>,
    namespaced_handlers: HashMap<GroupVersionResource, Arc<dyn ResourceHandler>>,
}

/// Registry of resource kinds served by one server instance.
///
/// Owned by the server and shared by reference with the router and the
/// discovery endpoint; there is no process-wide singleton. A single
/// reader/writer lock guards all state so registration may race with
/// serving; readers only hold the lock long enough to clone a snapshot.
#[derive(Default)]
pub struct Registry {
    inner: RwLock<RegistryInner>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource kind under a GroupVersion.
    ///
    /// The first registration for a GroupVersion creates its discovery list;
    /// subsequent registrations append. Registering the same resource name
    /// twice under one GroupVersion fails with `DuplicateResource` so a
    /// discovery document can never list a resource twice.
    pub fn register(
        &self,
        group_version: GroupVersion,
        resource: ApiResource,
        handler: Arc<dyn ResourceHandler>,
    ) -> annex_core::Result<()> {
        let mut inner = self.inner.write().expect("registry lock poisoned");

        let list = inner
            .resource_lists
            .entry(group_version.clone())
            .or_insert_with(|| ApiResourceList::new(group_version.clone()));

        if list.resources.iter().any(|r| r.name == resource.name) {
            return Err(AnnexError::duplicate_resource(
                group_version.api_version(),
                resource.name,
            ));
        }

        info!(
            groupversion = %group_version,
            resource = %resource.name,
            namespaced = resource.namespaced,
            "Registering API resource"
        );

        let gvr = group_version.with_resource(&resource.name);
        let namespaced = resource.namespaced;
        list.resources.push(resource);

        if namespaced {
            inner.namespaced_handlers.insert(gvr, handler);
        } else {
            inner.cluster_handlers.insert(gvr, handler);
        }

        Ok(())
    }

    /// Get the current discovery list for a GroupVersion.
    ///
    /// Returns an owned snapshot so encoding never observes (or races with)
    /// registry state shared with concurrent registrations.
    pub fn discovery_list(&self, group_version: &GroupVersion) -> Option<ApiResourceList> {
        let inner = self.inner.read().expect("registry lock poisoned");
        inner.resource_lists.get(group_version).cloned()
    }

    /// Look up the handler for a GVR in the table matching its scope
    pub fn handler_for(
        &self,
        gvr: &GroupVersionResource,
        scope: HandlerScope,
    ) -> Option<Arc<dyn ResourceHandler>> {
        let inner = self.inner.read().expect("registry lock poisoned");
        match scope {
            HandlerScope::Cluster => inner.cluster_handlers.get(gvr).cloned(),
            HandlerScope::Namespaced => inner.namespaced_handlers.get(gvr).cloned(),
        }
    }

    /// List the GroupVersions with at least one registered resource
    pub fn group_versions(&self) -> Vec<GroupVersion> {
        let inner = self.inner.read().expect("registry lock poisoned");
        inner.resource_lists.keys().cloned().collect()
    }
}
