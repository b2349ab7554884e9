//! API trait and implementations for talking to Fusion.
//!
//! This module provides the [`FusionApi`] trait and two implementations:
//! [`http::HttpBackend`], which speaks the REST API, and [`MockBackend`],
//! an in-memory stand-in that records every mutating call.
//!
//! # Testing
//!
//! ```
//! use fusionkit::backend::{FusionApi, MockBackend};
//! use fusionkit::{StorageClass, VolumeId};
//!
//! let mut mock = MockBackend::new();
//! mock.add_storage_class(StorageClass {
//!     name: "db-high-perf".to_string(),
//!     display_name: String::new(),
//!     size_limit: 1 << 40,
//! });
//!
//! assert!(mock.get_storage_class("db-high-perf").unwrap().is_some());
//! assert!(mock.get_volume(&VolumeId::new("t", "s", "v")).unwrap().is_none());
//! assert!(mock.calls().is_empty());
//! ```

pub mod http;

use crate::error::{Error, Result};
use crate::types::{
    AvailabilityZone, HostAccessPolicy, NamedRef, NetworkInterfaceGroup, Operation,
    OperationError, OperationStatus, PlacementGroup, ProtectionPolicy, StorageClass,
    StorageEndpoint, StorageEndpointId, StorageEndpointPatch, StorageEndpointPost, Volume,
    VolumeId, VolumePatch, VolumePost,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Fusion API surface used by the resource managers.
///
/// Reads return `Ok(None)` when the resource does not exist. Every other
/// failure is an error. Mutating calls return the [`Operation`] that has to
/// be awaited.
pub trait FusionApi: Send + Sync {
    fn get_volume(&self, id: &VolumeId) -> Result<Option<Volume>>;
    fn create_volume(&self, id: &VolumeId, body: &VolumePost) -> Result<Operation>;
    fn update_volume(&self, id: &VolumeId, patch: &VolumePatch) -> Result<Operation>;
    fn delete_volume(&self, id: &VolumeId) -> Result<Operation>;

    fn get_storage_class(&self, name: &str) -> Result<Option<StorageClass>>;
    fn get_placement_group(
        &self,
        tenant: &str,
        tenant_space: &str,
        name: &str,
    ) -> Result<Option<PlacementGroup>>;
    fn get_protection_policy(&self, name: &str) -> Result<Option<ProtectionPolicy>>;
    fn list_host_access_policies(&self) -> Result<Vec<HostAccessPolicy>>;

    fn get_availability_zone(&self, region: &str, name: &str)
    -> Result<Option<AvailabilityZone>>;
    fn get_network_interface_group(
        &self,
        region: &str,
        availability_zone: &str,
        name: &str,
    ) -> Result<Option<NetworkInterfaceGroup>>;

    fn get_storage_endpoint(&self, id: &StorageEndpointId) -> Result<Option<StorageEndpoint>>;
    fn create_storage_endpoint(
        &self,
        id: &StorageEndpointId,
        body: &StorageEndpointPost,
    ) -> Result<Operation>;
    fn update_storage_endpoint(
        &self,
        id: &StorageEndpointId,
        patch: &StorageEndpointPatch,
    ) -> Result<Operation>;
    fn delete_storage_endpoint(&self, id: &StorageEndpointId) -> Result<Operation>;

    /// Fetch the current state of an operation.
    fn get_operation(&self, id: &str) -> Result<Operation>;
}

/// A mutating call recorded by [`MockBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    CreateVolume { id: VolumeId, body: VolumePost },
    UpdateVolume { id: VolumeId, fields: Vec<&'static str> },
    DeleteVolume { id: VolumeId },
    CreateStorageEndpoint { id: StorageEndpointId, body: StorageEndpointPost },
    UpdateStorageEndpoint { id: StorageEndpointId },
    DeleteStorageEndpoint { id: StorageEndpointId },
}

#[derive(Debug, Default)]
struct MockState {
    volumes: HashMap<VolumeId, Volume>,
    storage_classes: HashMap<String, StorageClass>,
    placement_groups: HashMap<(String, String, String), PlacementGroup>,
    protection_policies: HashMap<String, ProtectionPolicy>,
    host_access_policies: Vec<HostAccessPolicy>,
    availability_zones: HashMap<(String, String), AvailabilityZone>,
    network_interface_groups: HashMap<(String, String, String), NetworkInterfaceGroup>,
    storage_endpoints: HashMap<StorageEndpointId, StorageEndpoint>,
    operations: HashMap<String, Operation>,
    next_operation: u64,
    calls: Vec<MockCall>,
    reads: usize,
    failing_fields: Vec<String>,
    failing_operations: Option<String>,
    unavailable: bool,
}

impl MockState {
    /// Register an operation whose final state `get_operation` will report.
    fn start_operation(&mut self, request_type: &str) -> Operation {
        self.next_operation += 1;
        let id = format!("op-{}", self.next_operation);

        let finished = match &self.failing_operations {
            Some(reason) => Operation {
                id: id.clone(),
                status: OperationStatus::Failed,
                request_type: request_type.to_string(),
                error: Some(OperationError {
                    message: reason.clone(),
                }),
            },
            None => Operation {
                id: id.clone(),
                status: OperationStatus::Succeeded,
                request_type: request_type.to_string(),
                error: None,
            },
        };
        self.operations.insert(id.clone(), finished);

        Operation {
            id,
            status: OperationStatus::Pending,
            request_type: request_type.to_string(),
            error: None,
        }
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable {
            return Err(Error::http("HTTP 503", Some(503)));
        }
        Ok(())
    }

    fn read(&mut self) -> Result<()> {
        self.check_available()?;
        self.reads += 1;
        Ok(())
    }
}

/// Mock backend for testing without network access.
///
/// Clones share state, so a test can hand one clone to a session and keep
/// another to seed resources and inspect the recorded calls.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    /// Create a new empty mock backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_volume(&mut self, id: &VolumeId, volume: Volume) {
        self.state().volumes.insert(id.clone(), volume);
    }

    pub fn add_storage_class(&mut self, class: StorageClass) {
        self.state().storage_classes.insert(class.name.clone(), class);
    }

    pub fn add_placement_group(&mut self, tenant: &str, tenant_space: &str, name: &str) {
        self.state().placement_groups.insert(
            (tenant.to_string(), tenant_space.to_string(), name.to_string()),
            PlacementGroup {
                name: name.to_string(),
                display_name: name.to_string(),
            },
        );
    }

    pub fn add_protection_policy(&mut self, name: &str) {
        self.state().protection_policies.insert(
            name.to_string(),
            ProtectionPolicy {
                name: name.to_string(),
                display_name: name.to_string(),
            },
        );
    }

    pub fn add_host_access_policy(&mut self, name: &str) {
        self.state().host_access_policies.push(HostAccessPolicy {
            name: name.to_string(),
            display_name: name.to_string(),
        });
    }

    pub fn add_availability_zone(&mut self, region: &str, name: &str) {
        self.state().availability_zones.insert(
            (region.to_string(), name.to_string()),
            AvailabilityZone {
                name: name.to_string(),
                display_name: name.to_string(),
            },
        );
    }

    pub fn add_network_interface_group(&mut self, region: &str, availability_zone: &str, name: &str) {
        self.state().network_interface_groups.insert(
            (
                region.to_string(),
                availability_zone.to_string(),
                name.to_string(),
            ),
            NetworkInterfaceGroup {
                name: name.to_string(),
                display_name: name.to_string(),
            },
        );
    }

    pub fn add_storage_endpoint(&mut self, id: &StorageEndpointId, endpoint: StorageEndpoint) {
        self.state().storage_endpoints.insert(id.clone(), endpoint);
    }

    /// Make volume updates touching `field` fail with an HTTP 500.
    pub fn fail_field(&mut self, field: &str) {
        self.state().failing_fields.push(field.to_string());
    }

    /// Make every subsequent operation end in the `Failed` state.
    pub fn fail_operations(&mut self, reason: &str) {
        self.state().failing_operations = Some(reason.to_string());
    }

    /// Make every call fail as if the API were down.
    pub fn set_unavailable(&mut self, unavailable: bool) {
        self.state().unavailable = unavailable;
    }

    /// Mutating calls recorded so far, in order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.state().calls.clone()
    }

    /// Number of read calls served so far.
    pub fn reads(&self) -> usize {
        self.state().reads
    }

    /// Current state of a volume, bypassing the read counter.
    pub fn volume(&self, id: &VolumeId) -> Option<Volume> {
        self.state().volumes.get(id).cloned()
    }

    /// Current state of a storage endpoint, bypassing the read counter.
    pub fn storage_endpoint(&self, id: &StorageEndpointId) -> Option<StorageEndpoint> {
        self.state().storage_endpoints.get(id).cloned()
    }
}

fn apply_volume_patch(volume: &mut Volume, patch: &VolumePatch) {
    if let Some(v) = &patch.name {
        volume.name = v.value.clone();
    }
    if let Some(v) = &patch.display_name {
        volume.display_name = v.value.clone();
    }
    if let Some(v) = &patch.storage_class {
        volume.storage_class = NamedRef::new(v.value.clone());
    }
    if let Some(v) = &patch.size {
        volume.size = v.value;
    }
    if let Some(v) = &patch.placement_group {
        volume.placement_group = NamedRef::new(v.value.clone());
    }
    if let Some(v) = &patch.protection_policy {
        volume.protection_policy = Some(NamedRef::new(v.value.clone()));
    }
    if let Some(v) = &patch.host_access_policies {
        volume.host_access_policies = v
            .value
            .split(',')
            .filter(|name| !name.is_empty())
            .map(NamedRef::new)
            .collect();
    }
}

impl FusionApi for MockBackend {
    fn get_volume(&self, id: &VolumeId) -> Result<Option<Volume>> {
        let mut state = self.state();
        state.read()?;
        Ok(state.volumes.get(id).cloned())
    }

    fn create_volume(&self, id: &VolumeId, body: &VolumePost) -> Result<Operation> {
        let mut state = self.state();
        state.check_available()?;
        state.calls.push(MockCall::CreateVolume {
            id: id.clone(),
            body: body.clone(),
        });
        let volume = Volume {
            name: body.name.clone(),
            display_name: body.display_name.clone(),
            size: body.size,
            storage_class: NamedRef::new(body.storage_class.clone()),
            placement_group: NamedRef::new(body.placement_group.clone()),
            protection_policy: body.protection_policy.clone().map(NamedRef::new),
            host_access_policies: Vec::new(),
            destroyed: false,
        };
        state.volumes.insert(id.clone(), volume);
        Ok(state.start_operation("CreateVolume"))
    }

    fn update_volume(&self, id: &VolumeId, patch: &VolumePatch) -> Result<Operation> {
        let mut state = self.state();
        state.check_available()?;
        let fields = patch.fields();
        state.calls.push(MockCall::UpdateVolume {
            id: id.clone(),
            fields: fields.clone(),
        });

        if fields
            .iter()
            .any(|f| state.failing_fields.iter().any(|failing| failing == f))
        {
            return Err(Error::http("HTTP 500", Some(500)));
        }

        let mut volume = state
            .volumes
            .remove(id)
            .ok_or_else(|| Error::http("HTTP 404", Some(404)))?;
        apply_volume_patch(&mut volume, patch);
        let new_id = id.sibling(volume.name.clone());
        state.volumes.insert(new_id, volume);
        Ok(state.start_operation("UpdateVolume"))
    }

    fn delete_volume(&self, id: &VolumeId) -> Result<Operation> {
        let mut state = self.state();
        state.check_available()?;
        state.calls.push(MockCall::DeleteVolume { id: id.clone() });
        state
            .volumes
            .remove(id)
            .ok_or_else(|| Error::http("HTTP 404", Some(404)))?;
        Ok(state.start_operation("DeleteVolume"))
    }

    fn get_storage_class(&self, name: &str) -> Result<Option<StorageClass>> {
        let mut state = self.state();
        state.read()?;
        Ok(state.storage_classes.get(name).cloned())
    }

    fn get_placement_group(
        &self,
        tenant: &str,
        tenant_space: &str,
        name: &str,
    ) -> Result<Option<PlacementGroup>> {
        let mut state = self.state();
        state.read()?;
        let key = (tenant.to_string(), tenant_space.to_string(), name.to_string());
        Ok(state.placement_groups.get(&key).cloned())
    }

    fn get_protection_policy(&self, name: &str) -> Result<Option<ProtectionPolicy>> {
        let mut state = self.state();
        state.read()?;
        Ok(state.protection_policies.get(name).cloned())
    }

    fn list_host_access_policies(&self) -> Result<Vec<HostAccessPolicy>> {
        let mut state = self.state();
        state.read()?;
        Ok(state.host_access_policies.clone())
    }

    fn get_availability_zone(
        &self,
        region: &str,
        name: &str,
    ) -> Result<Option<AvailabilityZone>> {
        let mut state = self.state();
        state.read()?;
        let key = (region.to_string(), name.to_string());
        Ok(state.availability_zones.get(&key).cloned())
    }

    fn get_network_interface_group(
        &self,
        region: &str,
        availability_zone: &str,
        name: &str,
    ) -> Result<Option<NetworkInterfaceGroup>> {
        let mut state = self.state();
        state.read()?;
        let key = (
            region.to_string(),
            availability_zone.to_string(),
            name.to_string(),
        );
        Ok(state.network_interface_groups.get(&key).cloned())
    }

    fn get_storage_endpoint(&self, id: &StorageEndpointId) -> Result<Option<StorageEndpoint>> {
        let mut state = self.state();
        state.read()?;
        Ok(state.storage_endpoints.get(id).cloned())
    }

    fn create_storage_endpoint(
        &self,
        id: &StorageEndpointId,
        body: &StorageEndpointPost,
    ) -> Result<Operation> {
        let mut state = self.state();
        state.check_available()?;
        state.calls.push(MockCall::CreateStorageEndpoint {
            id: id.clone(),
            body: body.clone(),
        });
        let endpoint = StorageEndpoint {
            name: body.name.clone(),
            display_name: body.display_name.clone(),
            endpoint_type: body.endpoint_type,
            iscsi: None,
        };
        state.storage_endpoints.insert(id.clone(), endpoint);
        Ok(state.start_operation("CreateStorageEndpoint"))
    }

    fn update_storage_endpoint(
        &self,
        id: &StorageEndpointId,
        patch: &StorageEndpointPatch,
    ) -> Result<Operation> {
        let mut state = self.state();
        state.check_available()?;
        state
            .calls
            .push(MockCall::UpdateStorageEndpoint { id: id.clone() });
        let endpoint = state
            .storage_endpoints
            .get_mut(id)
            .ok_or_else(|| Error::http("HTTP 404", Some(404)))?;
        if let Some(display_name) = &patch.display_name {
            endpoint.display_name = display_name.value.clone();
        }
        Ok(state.start_operation("UpdateStorageEndpoint"))
    }

    fn delete_storage_endpoint(&self, id: &StorageEndpointId) -> Result<Operation> {
        let mut state = self.state();
        state.check_available()?;
        state
            .calls
            .push(MockCall::DeleteStorageEndpoint { id: id.clone() });
        state
            .storage_endpoints
            .remove(id)
            .ok_or_else(|| Error::http("HTTP 404", Some(404)))?;
        Ok(state.start_operation("DeleteStorageEndpoint"))
    }

    fn get_operation(&self, id: &str) -> Result<Operation> {
        let mut state = self.state();
        state.read()?;
        state
            .operations
            .get(id)
            .cloned()
            .ok_or_else(|| Error::http("HTTP 404", Some(404)))
    }
}
