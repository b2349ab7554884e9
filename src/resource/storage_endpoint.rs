//! Storage endpoint resource
//!
//! An endpoint lives at region -> availability zone -> name. Only the
//! display name can change after creation; the discovery interfaces are
//! fixed when the endpoint is created.

use super::Remote;
use crate::network::{parse_cidr, parse_gateway};
use anyhow::{Context, Result};
use declarative::{
    ApplyContext, Defect, FieldPatch, FieldRule, Intent, Lookup, Resource, ValidationReport,
    diff_fields, missing_references, scalar_change,
};
use fusionkit::{
    DiscoveryInterfacePost, EndpointType, IscsiPost, StorageEndpoint, StorageEndpointId,
    StorageEndpointPatch, StorageEndpointPost,
};

/// Desired state of one storage endpoint
#[derive(Debug, Clone, Default)]
pub struct StorageEndpointSpec {
    pub id: StorageEndpointId,
    pub display_name: Option<String>,
    pub endpoint_type: EndpointType,
    pub network_interface_groups: Vec<String>,
    /// Interface addresses in CIDR notation
    pub addresses: Vec<String>,
    pub gateway: Option<String>,
    pub state: Intent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageEndpointChange {
    DisplayName(String),
}

impl FieldPatch for StorageEndpointChange {
    fn field(&self) -> &'static str {
        match self {
            StorageEndpointChange::DisplayName(_) => "display_name",
        }
    }
}

fn display_name(
    d: &StorageEndpointSpec,
    o: &StorageEndpoint,
) -> Result<Option<StorageEndpointChange>> {
    Ok(scalar_change(d.display_name.as_deref(), Some(o.display_name.as_str()))
        .map(StorageEndpointChange::DisplayName))
}

fn rules() -> [FieldRule<StorageEndpointSpec, StorageEndpoint, StorageEndpointChange>; 1] {
    [FieldRule::new("display_name", display_name)]
}

/// A storage endpoint spec bound to a session
#[derive(Debug)]
pub struct StorageEndpointResource<'a> {
    spec: StorageEndpointSpec,
    remote: Remote<'a>,
}

impl<'a> StorageEndpointResource<'a> {
    pub fn new(spec: StorageEndpointSpec, remote: Remote<'a>) -> Self {
        Self { spec, remote }
    }

    fn check_addresses(&self, report: &mut ValidationReport) {
        for address in &self.spec.addresses {
            if let Err(reason) = parse_cidr(address) {
                report.push(Defect::InvalidValue {
                    field: "address",
                    value: address.clone(),
                    reason: format!("not a valid address in CIDR notation ({})", reason),
                });
            }
        }
        if let Some(gateway) = &self.spec.gateway {
            if let Err(reason) = parse_gateway(gateway) {
                report.push(Defect::InvalidValue {
                    field: "gateway",
                    value: gateway.clone(),
                    reason,
                });
            }
        }
    }

    fn discovery_interfaces(&self) -> Vec<DiscoveryInterfacePost> {
        self.spec
            .addresses
            .iter()
            .map(|address| DiscoveryInterfacePost {
                address: address.trim().to_string(),
                gateway: self.spec.gateway.clone(),
                network_interface_groups: self.spec.network_interface_groups.clone(),
            })
            .collect()
    }
}

impl Resource for StorageEndpointResource<'_> {
    type Observed = StorageEndpoint;
    type Checked = ();
    type Patch = StorageEndpointChange;

    fn id(&self) -> String {
        self.spec.id.to_string()
    }

    fn description(&self) -> String {
        format!("storage endpoint {}", self.spec.id)
    }

    fn intent(&self) -> Intent {
        self.spec.state
    }

    fn locate(&self) -> Result<Lookup<StorageEndpoint>> {
        let endpoint = self
            .remote
            .api()
            .get_storage_endpoint(&self.spec.id)
            .with_context(|| format!("looking up storage endpoint {}", self.spec.id))?;
        Ok(endpoint.into())
    }

    fn validate(
        &self,
        observed: Option<&StorageEndpoint>,
        report: &mut ValidationReport,
    ) -> Result<()> {
        let api = self.remote.api();
        let id = &self.spec.id;

        let zone = missing_references("availability zone", [id.availability_zone.as_str()], |name| {
            Ok(api.get_availability_zone(&id.region, name)?.is_some())
        })?;
        match zone {
            Some(defect) => report.push(defect),
            // Interface groups are scoped to the zone.
            None => {
                let names = self.spec.network_interface_groups.iter().map(String::as_str);
                let groups = missing_references("network interface group", names, |name| {
                    Ok(api
                        .get_network_interface_group(&id.region, &id.availability_zone, name)?
                        .is_some())
                })?;
                report.extend(groups);
            }
        }

        self.check_addresses(report);

        if observed.is_none() && self.spec.state == Intent::Present && self.spec.addresses.is_empty()
        {
            report.push(Defect::MissingField {
                field: "addresses",
                reason: "(at least one) to create a new storage endpoint".to_string(),
            });
        }
        Ok(())
    }

    fn diff(&self, observed: &StorageEndpoint, _checked: &()) -> Result<Vec<StorageEndpointChange>> {
        diff_fields(&rules(), &self.spec, observed)
    }

    fn create(&self, _checked: &(), _ctx: &mut ApplyContext) -> Result<()> {
        let spec = &self.spec;
        let body = StorageEndpointPost {
            name: spec.id.name.clone(),
            display_name: spec
                .display_name
                .clone()
                .unwrap_or_else(|| spec.id.name.clone()),
            endpoint_type: spec.endpoint_type,
            iscsi: IscsiPost {
                discovery_interfaces: self.discovery_interfaces(),
            },
        };
        self.remote
            .mutate(&format!("creating storage endpoint {}", spec.id), |api| {
                api.create_storage_endpoint(&spec.id, &body)
            })?;
        Ok(())
    }

    fn apply_patch(&self, patch: &StorageEndpointChange, _ctx: &mut ApplyContext) -> Result<()> {
        let body = match patch {
            StorageEndpointChange::DisplayName(v) => StorageEndpointPatch::display_name(v.clone()),
        };
        let what = format!("changing {} of storage endpoint {}", patch.field(), self.spec.id);
        self.remote
            .mutate(&what, |api| api.update_storage_endpoint(&self.spec.id, &body))?;
        Ok(())
    }

    fn delete(&self, _ctx: &mut ApplyContext) -> Result<()> {
        let id = &self.spec.id;
        self.remote
            .mutate(&format!("deleting storage endpoint {}", id), |api| {
                api.delete_storage_endpoint(id)
            })?;
        Ok(())
    }
}
