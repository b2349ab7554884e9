//! Wire types for the Fusion REST API.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference to another resource by name, as embedded in API responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRef {
    pub name: String,
}

impl NamedRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Wrapper the API uses for every field of a PATCH body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nullable<T> {
    pub value: T,
}

impl<T> Nullable<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }
}

/// Paged list envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

// =============================================================================
// Identities
// =============================================================================

/// Identity of a volume: tenant -> tenant space -> volume.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct VolumeId {
    pub tenant: String,
    pub tenant_space: String,
    pub name: String,
}

impl VolumeId {
    pub fn new(
        tenant: impl Into<String>,
        tenant_space: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            tenant: tenant.into(),
            tenant_space: tenant_space.into(),
            name: name.into(),
        }
    }

    /// Same scope, different volume name.
    pub fn sibling(&self, name: impl Into<String>) -> Self {
        Self {
            tenant: self.tenant.clone(),
            tenant_space: self.tenant_space.clone(),
            name: name.into(),
        }
    }
}

impl fmt::Display for VolumeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.tenant, self.tenant_space, self.name)
    }
}

/// Identity of a storage endpoint: region -> availability zone -> endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct StorageEndpointId {
    pub region: String,
    pub availability_zone: String,
    pub name: String,
}

impl StorageEndpointId {
    pub fn new(
        region: impl Into<String>,
        availability_zone: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            region: region.into(),
            availability_zone: availability_zone.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for StorageEndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.region, self.availability_zone, self.name)
    }
}

// =============================================================================
// Volumes
// =============================================================================

/// A volume as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volume {
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    /// Size in bytes.
    pub size: u64,
    pub storage_class: NamedRef,
    pub placement_group: NamedRef,
    #[serde(default)]
    pub protection_policy: Option<NamedRef>,
    #[serde(default)]
    pub host_access_policies: Vec<NamedRef>,
    /// Set when the volume sits in the trash awaiting eradication.
    #[serde(default)]
    pub destroyed: bool,
}

impl Volume {
    /// Host access policy names, de-duplicated, in API order.
    pub fn host_access_policy_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::with_capacity(self.host_access_policies.len());
        for hap in &self.host_access_policies {
            if !names.contains(&hap.name) {
                names.push(hap.name.clone());
            }
        }
        names
    }

    pub fn protection_policy_name(&self) -> Option<&str> {
        self.protection_policy.as_ref().map(|p| p.name.as_str())
    }
}

/// Body of a volume create call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumePost {
    pub name: String,
    pub display_name: String,
    pub size: u64,
    pub storage_class: String,
    pub placement_group: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protection_policy: Option<String>,
}

/// Body of a volume update call.
///
/// The API applies a PATCH atomically, so callers set exactly one field per
/// request. The constructors below enforce that.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<Nullable<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<Nullable<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_class: Option<Nullable<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Nullable<u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placement_group: Option<Nullable<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protection_policy: Option<Nullable<String>>,
    /// Comma-separated list of host access policy names; replaces the
    /// whole association list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_access_policies: Option<Nullable<String>>,
}

impl VolumePatch {
    pub fn name(value: impl Into<String>) -> Self {
        Self {
            name: Some(Nullable::new(value.into())),
            ..Default::default()
        }
    }

    pub fn display_name(value: impl Into<String>) -> Self {
        Self {
            display_name: Some(Nullable::new(value.into())),
            ..Default::default()
        }
    }

    pub fn storage_class(value: impl Into<String>) -> Self {
        Self {
            storage_class: Some(Nullable::new(value.into())),
            ..Default::default()
        }
    }

    pub fn size(bytes: u64) -> Self {
        Self {
            size: Some(Nullable::new(bytes)),
            ..Default::default()
        }
    }

    pub fn placement_group(value: impl Into<String>) -> Self {
        Self {
            placement_group: Some(Nullable::new(value.into())),
            ..Default::default()
        }
    }

    pub fn protection_policy(value: impl Into<String>) -> Self {
        Self {
            protection_policy: Some(Nullable::new(value.into())),
            ..Default::default()
        }
    }

    pub fn host_access_policies(names: &[String]) -> Self {
        Self {
            host_access_policies: Some(Nullable::new(names.join(","))),
            ..Default::default()
        }
    }

    /// Names of the fields this patch sets.
    pub fn fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.name.is_some() {
            fields.push("name");
        }
        if self.display_name.is_some() {
            fields.push("display_name");
        }
        if self.storage_class.is_some() {
            fields.push("storage_class");
        }
        if self.size.is_some() {
            fields.push("size");
        }
        if self.placement_group.is_some() {
            fields.push("placement_group");
        }
        if self.protection_policy.is_some() {
            fields.push("protection_policy");
        }
        if self.host_access_policies.is_some() {
            fields.push("host_access_policies");
        }
        fields
    }
}

// =============================================================================
// Referenced resources
// =============================================================================

/// A storage class: a named tier with a per-volume size ceiling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageClass {
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    /// Largest volume size allowed in this class, in bytes.
    pub size_limit: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementGroup {
    pub name: String,
    #[serde(default)]
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectionPolicy {
    pub name: String,
    #[serde(default)]
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostAccessPolicy {
    pub name: String,
    #[serde(default)]
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityZone {
    pub name: String,
    #[serde(default)]
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInterfaceGroup {
    pub name: String,
    #[serde(default)]
    pub display_name: String,
}

// =============================================================================
// Storage endpoints
// =============================================================================

/// Kind of storage endpoint. Only iSCSI exists today.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointType {
    #[default]
    Iscsi,
}

impl fmt::Display for EndpointType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointType::Iscsi => write!(f, "iscsi"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryInterface {
    pub address: String,
    #[serde(default)]
    pub gateway: Option<String>,
    #[serde(default)]
    pub network_interface_groups: Vec<NamedRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IscsiConfig {
    #[serde(default)]
    pub discovery_interfaces: Vec<DiscoveryInterface>,
}

/// A storage endpoint as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageEndpoint {
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub endpoint_type: EndpointType,
    #[serde(default)]
    pub iscsi: Option<IscsiConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryInterfacePost {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<String>,
    #[serde(default)]
    pub network_interface_groups: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IscsiPost {
    pub discovery_interfaces: Vec<DiscoveryInterfacePost>,
}

/// Body of a storage endpoint create call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageEndpointPost {
    pub name: String,
    pub display_name: String,
    pub endpoint_type: EndpointType,
    pub iscsi: IscsiPost,
}

/// Body of a storage endpoint update call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageEndpointPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<Nullable<String>>,
}

impl StorageEndpointPatch {
    pub fn display_name(value: impl Into<String>) -> Self {
        Self {
            display_name: Some(Nullable::new(value.into())),
        }
    }
}

// =============================================================================
// Operations
// =============================================================================

/// Lifecycle of an asynchronous remote operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    Aborting,
    Cancelled,
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "Pending",
            Self::Running => "Running",
            Self::Succeeded => "Succeeded",
            Self::Failed => "Failed",
            Self::Aborting => "Aborting",
            Self::Cancelled => "Cancelled",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationError {
    #[serde(default)]
    pub message: String,
}

/// Handle for an asynchronous remote operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub id: String,
    pub status: OperationStatus,
    #[serde(default)]
    pub request_type: String,
    #[serde(default)]
    pub error: Option<OperationError>,
}

impl Operation {
    /// Reason the operation failed, if the API gave one.
    pub fn failure_reason(&self) -> String {
        self.error
            .as_ref()
            .map(|e| e.message.clone())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("operation ended in state {}", self.status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_volume_patch_sets_one_field() {
        let patch = VolumePatch::size(1024);
        assert_eq!(patch.fields(), vec!["size"]);

        let body = serde_json::to_value(&patch).unwrap();
        assert_eq!(body, json!({ "size": { "value": 1024 } }));
    }

    #[test]
    fn test_host_access_policies_patch_is_comma_joined() {
        let names = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let body = serde_json::to_value(VolumePatch::host_access_policies(&names)).unwrap();
        assert_eq!(body, json!({ "host_access_policies": { "value": "a,b,c" } }));
    }

    #[test]
    fn test_volume_deserialize_with_defaults() {
        let volume: Volume = serde_json::from_value(json!({
            "name": "db01",
            "size": 1073741824,
            "storage_class": { "name": "db-high-perf" },
            "placement_group": { "name": "pg1" }
        }))
        .unwrap();

        assert_eq!(volume.name, "db01");
        assert_eq!(volume.display_name, "");
        assert!(volume.protection_policy.is_none());
        assert!(volume.host_access_policies.is_empty());
        assert!(!volume.destroyed);
    }

    #[test]
    fn test_host_access_policy_names_deduplicated() {
        let volume = Volume {
            name: "v".to_string(),
            display_name: "v".to_string(),
            size: 1,
            storage_class: NamedRef::new("sc"),
            placement_group: NamedRef::new("pg"),
            protection_policy: None,
            host_access_policies: vec![NamedRef::new("a"), NamedRef::new("b"), NamedRef::new("a")],
            destroyed: false,
        };
        assert_eq!(volume.host_access_policy_names(), vec!["a", "b"]);
    }

    #[test]
    fn test_volume_post_omits_missing_protection_policy() {
        let post = VolumePost {
            name: "v".to_string(),
            display_name: "v".to_string(),
            size: 10,
            storage_class: "sc".to_string(),
            placement_group: "pg".to_string(),
            protection_policy: None,
        };
        let body = serde_json::to_value(&post).unwrap();
        assert!(body.get("protection_policy").is_none());
    }

    #[test]
    fn test_operation_failure_reason_fallback() {
        let op = Operation {
            id: "op".to_string(),
            status: OperationStatus::Cancelled,
            request_type: String::new(),
            error: None,
        };
        assert_eq!(op.failure_reason(), "operation ended in state Cancelled");
    }

    #[test]
    fn test_endpoint_type_wire_name() {
        assert_eq!(serde_json::to_value(EndpointType::Iscsi).unwrap(), json!("iscsi"));
    }
}
