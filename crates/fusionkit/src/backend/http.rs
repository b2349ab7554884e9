//! REST backend.
//!
//! Blocking HTTP implementation of [`FusionApi`] on top of `ureq`. Every
//! request carries the session's bearer token. A 404 on a read becomes
//! `Ok(None)`; everything else is surfaced as an [`Error`].

use crate::backend::FusionApi;
use crate::error::{Error, Result, optional};
use crate::types::{
    AvailabilityZone, HostAccessPolicy, ListResponse, NetworkInterfaceGroup, Operation,
    PlacementGroup, ProtectionPolicy, StorageClass, StorageEndpoint, StorageEndpointId,
    StorageEndpointPatch, StorageEndpointPost, Volume, VolumeId, VolumePatch, VolumePost,
};
use log::{debug, info};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

/// Default API host.
pub const DEFAULT_API_HOST: &str = "https://api.pure1.purestorage.com/fusion";

/// API version path appended to the host.
const API_PREFIX: [&str; 2] = ["api", "1.0"];

const USER_AGENT: &str = concat!("fusionkit/", env!("CARGO_PKG_VERSION"));

/// Per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// HTTP backend for the Fusion REST API.
pub struct HttpBackend {
    /// HTTP agent for requests.
    agent: ureq::Agent,
    /// Versioned API base URL.
    base: Url,
    /// Bearer token sent with every request.
    access_token: String,
}

impl HttpBackend {
    /// Create a backend for `api_host` authenticating with `access_token`.
    pub fn new(api_host: &str, access_token: impl Into<String>) -> Result<Self> {
        let invalid = || Error::Session(format!("API host '{}' is not a valid base URL", api_host));
        let mut base = Url::parse(api_host).map_err(|_| invalid())?;
        base.path_segments_mut()
            .map_err(|()| invalid())?
            .pop_if_empty()
            .extend(API_PREFIX);

        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(REQUEST_TIMEOUT))
            .build()
            .into();
        Ok(Self {
            agent,
            base,
            access_token: access_token.into(),
        })
    }

    /// Build a URL below the API base, one path segment per element.
    ///
    /// Segments are percent-encoded, so a name can never reach outside its
    /// own segment. Empty and dot segments are refused.
    fn url(&self, segments: &[&str]) -> Result<String> {
        let mut url = self.base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| Error::Session(format!("API base '{}' has no path", self.base)))?;
            for segment in segments {
                if matches!(*segment, "" | "." | "..") {
                    return Err(Error::InvalidPathSegment((*segment).to_string()));
                }
                path.push(segment);
            }
        }
        Ok(url.to_string())
    }

    fn volumes_url(&self, tenant: &str, tenant_space: &str) -> Result<String> {
        self.url(&["tenants", tenant, "tenant-spaces", tenant_space, "volumes"])
    }

    fn volume_url(&self, id: &VolumeId) -> Result<String> {
        self.url(&[
            "tenants",
            &id.tenant,
            "tenant-spaces",
            &id.tenant_space,
            "volumes",
            &id.name,
        ])
    }

    fn storage_endpoints_url(&self, region: &str, availability_zone: &str) -> Result<String> {
        self.url(&[
            "regions",
            region,
            "availability-zones",
            availability_zone,
            "storage-endpoints",
        ])
    }

    fn storage_endpoint_url(&self, id: &StorageEndpointId) -> Result<String> {
        self.url(&[
            "regions",
            &id.region,
            "availability-zones",
            &id.availability_zone,
            "storage-endpoints",
            &id.name,
        ])
    }

    fn authorization(&self) -> String {
        format!("Bearer {}", self.access_token)
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!("GET {}", url);
        let value = self
            .agent
            .get(url)
            .header("Accept", "application/json")
            .header("Authorization", &self.authorization())
            .header("User-Agent", USER_AGENT)
            .call()?
            .body_mut()
            .read_json()?;
        Ok(value)
    }

    fn post_json<B: Serialize>(&self, url: &str, body: &B) -> Result<Operation> {
        info!("POST {}", url);
        let op = self
            .agent
            .post(url)
            .header("Accept", "application/json")
            .header("Authorization", &self.authorization())
            .header("User-Agent", USER_AGENT)
            .send_json(body)?
            .body_mut()
            .read_json()?;
        Ok(op)
    }

    fn patch_json<B: Serialize>(&self, url: &str, body: &B) -> Result<Operation> {
        info!("PATCH {}", url);
        let op = self
            .agent
            .patch(url)
            .header("Accept", "application/json")
            .header("Authorization", &self.authorization())
            .header("User-Agent", USER_AGENT)
            .send_json(body)?
            .body_mut()
            .read_json()?;
        Ok(op)
    }

    fn delete(&self, url: &str) -> Result<Operation> {
        info!("DELETE {}", url);
        let op = self
            .agent
            .delete(url)
            .header("Accept", "application/json")
            .header("Authorization", &self.authorization())
            .header("User-Agent", USER_AGENT)
            .call()?
            .body_mut()
            .read_json()?;
        Ok(op)
    }
}

impl FusionApi for HttpBackend {
    fn get_volume(&self, id: &VolumeId) -> Result<Option<Volume>> {
        optional(self.get_json(&self.volume_url(id)?))
    }

    fn create_volume(&self, id: &VolumeId, body: &VolumePost) -> Result<Operation> {
        self.post_json(&self.volumes_url(&id.tenant, &id.tenant_space)?, body)
    }

    fn update_volume(&self, id: &VolumeId, patch: &VolumePatch) -> Result<Operation> {
        self.patch_json(&self.volume_url(id)?, patch)
    }

    fn delete_volume(&self, id: &VolumeId) -> Result<Operation> {
        self.delete(&self.volume_url(id)?)
    }

    fn get_storage_class(&self, name: &str) -> Result<Option<StorageClass>> {
        optional(self.get_json(&self.url(&["storage-classes", name])?))
    }

    fn get_placement_group(
        &self,
        tenant: &str,
        tenant_space: &str,
        name: &str,
    ) -> Result<Option<PlacementGroup>> {
        optional(self.get_json(&self.url(&[
            "tenants",
            tenant,
            "tenant-spaces",
            tenant_space,
            "placement-groups",
            name,
        ])?))
    }

    fn get_protection_policy(&self, name: &str) -> Result<Option<ProtectionPolicy>> {
        optional(self.get_json(&self.url(&["protection-policies", name])?))
    }

    fn list_host_access_policies(&self) -> Result<Vec<HostAccessPolicy>> {
        let list: ListResponse<HostAccessPolicy> =
            self.get_json(&self.url(&["host-access-policies"])?)?;
        Ok(list.items)
    }

    fn get_availability_zone(
        &self,
        region: &str,
        name: &str,
    ) -> Result<Option<AvailabilityZone>> {
        optional(self.get_json(&self.url(&["regions", region, "availability-zones", name])?))
    }

    fn get_network_interface_group(
        &self,
        region: &str,
        availability_zone: &str,
        name: &str,
    ) -> Result<Option<NetworkInterfaceGroup>> {
        optional(self.get_json(&self.url(&[
            "regions",
            region,
            "availability-zones",
            availability_zone,
            "network-interface-groups",
            name,
        ])?))
    }

    fn get_storage_endpoint(&self, id: &StorageEndpointId) -> Result<Option<StorageEndpoint>> {
        optional(self.get_json(&self.storage_endpoint_url(id)?))
    }

    fn create_storage_endpoint(
        &self,
        id: &StorageEndpointId,
        body: &StorageEndpointPost,
    ) -> Result<Operation> {
        self.post_json(
            &self.storage_endpoints_url(&id.region, &id.availability_zone)?,
            body,
        )
    }

    fn update_storage_endpoint(
        &self,
        id: &StorageEndpointId,
        patch: &StorageEndpointPatch,
    ) -> Result<Operation> {
        self.patch_json(&self.storage_endpoint_url(id)?, patch)
    }

    fn delete_storage_endpoint(&self, id: &StorageEndpointId) -> Result<Operation> {
        self.delete(&self.storage_endpoint_url(id)?)
    }

    fn get_operation(&self, id: &str) -> Result<Operation> {
        self.get_json(&self.url(&["operations", id])?)
    }
}
