//! Volume resource
//!
//! A volume lives at tenant -> tenant space -> name. Creation needs a size,
//! a storage class and a placement group. Updates go out one field per
//! call in a fixed order, with a rename always last so the earlier calls
//! still address the old name.

use super::Remote;
use crate::units::{format_size, parse_size};
use anyhow::{Context, Result};
use declarative::{
    Action, ApplyContext, Defect, FieldPatch, FieldRule, Intent, Lookup, Resource, SetOp,
    ValidationReport, diff_fields, missing_references, resolve_set, scalar_change, set_change,
};
use fusionkit::{Volume, VolumeId, VolumePatch, VolumePost};
use log::debug;

/// Desired state of one volume
#[derive(Debug, Clone, Default)]
pub struct VolumeSpec {
    pub id: VolumeId,
    pub display_name: Option<String>,
    /// New name for an existing volume
    pub rename: Option<String>,
    pub storage_class: Option<String>,
    pub placement_group: Option<String>,
    pub protection_policy: Option<String>,
    /// Added when present, removed when absent
    pub host_access_policies: Vec<String>,
    /// Size string, e.g. `10G`
    pub size: Option<String>,
    pub eradicate: bool,
    pub state: Intent,
}

/// Facts established during validation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VolumeFacts {
    /// Requested size in bytes
    pub size: Option<u64>,
    /// Ceiling of the effective storage class
    pub size_limit: Option<u64>,
}

/// One field-level change to a volume
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VolumeChange {
    DisplayName(String),
    StorageClass(String),
    Size(u64),
    PlacementGroup(String),
    ProtectionPolicy(String),
    /// The complete association list after the change
    HostAccessPolicies(Vec<String>),
    Name(String),
}

impl VolumeChange {
    fn to_patch(&self) -> VolumePatch {
        match self {
            VolumeChange::DisplayName(v) => VolumePatch::display_name(v.clone()),
            VolumeChange::StorageClass(v) => VolumePatch::storage_class(v.clone()),
            VolumeChange::Size(bytes) => VolumePatch::size(*bytes),
            VolumeChange::PlacementGroup(v) => VolumePatch::placement_group(v.clone()),
            VolumeChange::ProtectionPolicy(v) => VolumePatch::protection_policy(v.clone()),
            VolumeChange::HostAccessPolicies(names) => VolumePatch::host_access_policies(names),
            VolumeChange::Name(v) => VolumePatch::name(v.clone()),
        }
    }
}

impl FieldPatch for VolumeChange {
    fn field(&self) -> &'static str {
        match self {
            VolumeChange::DisplayName(_) => "display_name",
            VolumeChange::StorageClass(_) => "storage_class",
            VolumeChange::Size(_) => "size",
            VolumeChange::PlacementGroup(_) => "placement_group",
            VolumeChange::ProtectionPolicy(_) => "protection_policy",
            VolumeChange::HostAccessPolicies(_) => "host_access_policies",
            VolumeChange::Name(_) => "name",
        }
    }

    fn describe(&self) -> String {
        match self {
            VolumeChange::Size(bytes) => format!("size -> {}", format_size(*bytes)),
            VolumeChange::HostAccessPolicies(names) => {
                format!("host_access_policies -> [{}]", names.join(", "))
            }
            VolumeChange::DisplayName(v)
            | VolumeChange::StorageClass(v)
            | VolumeChange::PlacementGroup(v)
            | VolumeChange::ProtectionPolicy(v)
            | VolumeChange::Name(v) => format!("{} -> {}", self.field(), v),
        }
    }
}

/// Desired side of the comparison table
struct Desired<'a> {
    spec: &'a VolumeSpec,
    size: Option<u64>,
}

impl Desired<'_> {
    fn hap_op(&self) -> SetOp {
        match self.spec.state {
            Intent::Present => SetOp::Add,
            Intent::Absent => SetOp::Remove,
        }
    }
}

fn display_name(d: &Desired<'_>, o: &Volume) -> Result<Option<VolumeChange>> {
    Ok(scalar_change(d.spec.display_name.as_deref(), Some(o.display_name.as_str()))
        .map(VolumeChange::DisplayName))
}

fn storage_class(d: &Desired<'_>, o: &Volume) -> Result<Option<VolumeChange>> {
    Ok(scalar_change(d.spec.storage_class.as_deref(), Some(o.storage_class.name.as_str()))
        .map(VolumeChange::StorageClass))
}

fn size(d: &Desired<'_>, o: &Volume) -> Result<Option<VolumeChange>> {
    Ok(d.size.filter(|bytes| *bytes != o.size).map(VolumeChange::Size))
}

fn placement_group(d: &Desired<'_>, o: &Volume) -> Result<Option<VolumeChange>> {
    Ok(scalar_change(d.spec.placement_group.as_deref(), Some(o.placement_group.name.as_str()))
        .map(VolumeChange::PlacementGroup))
}

fn protection_policy(d: &Desired<'_>, o: &Volume) -> Result<Option<VolumeChange>> {
    Ok(scalar_change(d.spec.protection_policy.as_deref(), o.protection_policy_name())
        .map(VolumeChange::ProtectionPolicy))
}

fn host_access_policies(d: &Desired<'_>, o: &Volume) -> Result<Option<VolumeChange>> {
    let observed = o.host_access_policy_names();
    Ok(set_change(&observed, &d.spec.host_access_policies, d.hap_op())
        .map(VolumeChange::HostAccessPolicies))
}

fn name(d: &Desired<'_>, o: &Volume) -> Result<Option<VolumeChange>> {
    Ok(scalar_change(d.spec.rename.as_deref(), Some(o.name.as_str())).map(VolumeChange::Name))
}

/// Mutable fields in the order their patches are issued
fn rules<'a>() -> [FieldRule<Desired<'a>, Volume, VolumeChange>; 7] {
    [
        FieldRule::new("display_name", display_name),
        FieldRule::new("storage_class", storage_class),
        FieldRule::new("size", size),
        FieldRule::new("placement_group", placement_group),
        FieldRule::new("protection_policy", protection_policy),
        FieldRule::new("host_access_policies", host_access_policies),
        FieldRule::new("name", name),
    ]
}

/// A volume spec bound to a session
#[derive(Debug)]
pub struct VolumeResource<'a> {
    spec: VolumeSpec,
    remote: Remote<'a>,
}

impl<'a> VolumeResource<'a> {
    pub fn new(spec: VolumeSpec, remote: Remote<'a>) -> Self {
        Self { spec, remote }
    }

    /// Ceiling of a storage class, `None` when the class does not exist
    fn size_limit(&self, class: &str) -> Result<Option<u64>> {
        let found = self
            .remote
            .api()
            .get_storage_class(class)
            .with_context(|| format!("looking up storage class {}", class))?;
        Ok(found.map(|c| c.size_limit))
    }

    fn check_references(&self, report: &mut ValidationReport) -> Result<()> {
        let api = self.remote.api();
        let spec = &self.spec;

        if !spec.host_access_policies.is_empty() {
            let known = api
                .list_host_access_policies()
                .context("listing host access policies")?;
            let names = spec.host_access_policies.iter().map(String::as_str);
            let defect = missing_references("host access policy", names, |name| {
                Ok(known.iter().any(|hap| hap.name == name))
            })?;
            report.extend(defect);
        }

        if let Some(pg) = &spec.placement_group {
            let defect = missing_references("placement group", [pg.as_str()], |name| {
                Ok(api
                    .get_placement_group(&spec.id.tenant, &spec.id.tenant_space, name)?
                    .is_some())
            })?;
            report.extend(defect);
        }

        if let Some(pp) = &spec.protection_policy {
            let defect = missing_references("protection policy", [pp.as_str()], |name| {
                Ok(api.get_protection_policy(name)?.is_some())
            })?;
            report.extend(defect);
        }

        Ok(())
    }

    fn check_rename(&self, report: &mut ValidationReport) -> Result<()> {
        let Some(target) = &self.spec.rename else {
            return Ok(());
        };
        if *target == self.spec.id.name {
            return Ok(());
        }
        let taken = self
            .remote
            .api()
            .get_volume(&self.spec.id.sibling(target.clone()))
            .with_context(|| format!("looking up rename target {}", target))?
            .is_some();
        if taken {
            report.push(Defect::Collision {
                field: "rename",
                name: target.clone(),
            });
        }
        Ok(())
    }
}

impl Resource for VolumeResource<'_> {
    type Observed = Volume;
    type Checked = VolumeFacts;
    type Patch = VolumeChange;

    fn id(&self) -> String {
        self.spec.id.to_string()
    }

    fn description(&self) -> String {
        format!("volume {}", self.spec.id)
    }

    fn intent(&self) -> Intent {
        self.spec.state
    }

    fn locate(&self) -> Result<Lookup<Volume>> {
        let volume = self
            .remote
            .api()
            .get_volume(&self.spec.id)
            .with_context(|| format!("looking up volume {}", self.spec.id))?;
        Ok(volume.into())
    }

    fn validate(
        &self,
        observed: Option<&Volume>,
        report: &mut ValidationReport,
    ) -> Result<VolumeFacts> {
        let spec = &self.spec;
        let mut facts = VolumeFacts::default();

        if let Some(text) = &spec.size {
            match parse_size(text) {
                Ok(bytes) => facts.size = Some(bytes),
                Err(e) => report.push(Defect::InvalidValue {
                    field: "size",
                    value: text.clone(),
                    reason: e.to_string(),
                }),
            }
        }

        if observed.is_none() && spec.state == Intent::Present {
            let required = [
                ("size", spec.size.is_some()),
                ("storage_class", spec.storage_class.is_some()),
                ("placement_group", spec.placement_group.is_some()),
            ];
            for (field, given) in required {
                if !given {
                    report.push(Defect::MissingField {
                        field,
                        reason: "to create a new volume".to_string(),
                    });
                }
            }
        }

        self.check_rename(report)?;
        self.check_references(report)?;

        // Storage class comes before the size ceiling that depends on it.
        match &spec.storage_class {
            Some(class) => match self.size_limit(class)? {
                Some(limit) => facts.size_limit = Some(limit),
                None => report.push(Defect::MissingReferences {
                    kind: "storage class",
                    names: vec![class.clone()],
                }),
            },
            None => {
                if let (Some(volume), Some(_)) = (observed, facts.size) {
                    facts.size_limit = self.size_limit(&volume.storage_class.name)?;
                }
            }
        }

        let effective_size = facts.size.or_else(|| {
            observed
                .filter(|_| spec.storage_class.is_some())
                .map(|volume| volume.size)
        });
        if let (Some(bytes), Some(limit)) = (effective_size, facts.size_limit) {
            if bytes > limit {
                report.push(Defect::ExceedsLimit {
                    field: "size",
                    requested: format_size(bytes),
                    limit: format_size(limit),
                });
            }
        }

        debug!("validated {}: {:?}", self.description(), facts);
        Ok(facts)
    }

    fn plan(&self, observed: Option<&Volume>) -> Action {
        let Some(volume) = observed else {
            return Action::for_state(self.spec.state, false);
        };
        match (self.spec.state, volume.destroyed) {
            (Intent::Present, true) => Action::Unsupported {
                reason: "volume recovery not yet supported".to_string(),
            },
            (Intent::Absent, true) if self.spec.eradicate => Action::Unsupported {
                reason: "volume eradication not yet supported".to_string(),
            },
            (Intent::Absent, true) => Action::NoOp,
            // Removing associations is softer than destroying the volume.
            (Intent::Absent, false) if !self.spec.host_access_policies.is_empty() => {
                Action::Update
            }
            (intent, false) => Action::for_state(intent, true),
        }
    }

    fn diff(&self, observed: &Volume, checked: &VolumeFacts) -> Result<Vec<VolumeChange>> {
        let desired = Desired {
            spec: &self.spec,
            size: checked.size,
        };
        diff_fields(&rules(), &desired, observed)
    }

    fn after_create(&self, _checked: &VolumeFacts) -> Vec<VolumeChange> {
        if self.spec.host_access_policies.is_empty() {
            return Vec::new();
        }
        let names = resolve_set(&[], &self.spec.host_access_policies, SetOp::Add);
        vec![VolumeChange::HostAccessPolicies(names)]
    }

    fn create(&self, checked: &VolumeFacts, _ctx: &mut ApplyContext) -> Result<()> {
        let spec = &self.spec;
        let (Some(size), Some(storage_class), Some(placement_group)) = (
            checked.size,
            spec.storage_class.clone(),
            spec.placement_group.clone(),
        ) else {
            anyhow::bail!("volume {} is missing a size, storage class or placement group", spec.id);
        };

        let body = VolumePost {
            name: spec.id.name.clone(),
            display_name: spec
                .display_name
                .clone()
                .unwrap_or_else(|| spec.id.name.clone()),
            size,
            storage_class,
            placement_group,
            protection_policy: spec.protection_policy.clone(),
        };
        self.remote
            .mutate(&format!("creating volume {}", spec.id), |api| {
                api.create_volume(&spec.id, &body)
            })?;
        Ok(())
    }

    fn apply_patch(&self, patch: &VolumeChange, _ctx: &mut ApplyContext) -> Result<()> {
        let body = patch.to_patch();
        let what = format!("changing {} of volume {}", patch.field(), self.spec.id);
        debug!("{}: {}", what, patch.describe());
        self.remote
            .mutate(&what, |api| api.update_volume(&self.spec.id, &body))?;
        Ok(())
    }

    fn delete(&self, ctx: &mut ApplyContext) -> Result<()> {
        let id = &self.spec.id;
        self.remote
            .mutate(&format!("deleting volume {}", id), |api| api.delete_volume(id))?;
        if self.spec.eradicate {
            ctx.warn(format!(
                "eradication of volume {} is not supported; it stays in the trash",
                id
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::{ApplyResult, Error, ExecuteOptions, NoProgress, execute};
    use fusionkit::{MockBackend, MockCall, NamedRef, PollConfig, Session, StorageClass};
    use proptest::prelude::*;

    const GIB: u64 = 1024 * 1024 * 1024;

    fn fixture() -> (MockBackend, Session) {
        let mut mock = MockBackend::new();
        mock.add_storage_class(StorageClass {
            name: "gold".into(),
            display_name: "Gold".into(),
            size_limit: 100 * GIB,
        });
        mock.add_storage_class(StorageClass {
            name: "bronze".into(),
            display_name: "Bronze".into(),
            size_limit: 10 * GIB,
        });
        mock.add_placement_group("acme", "prod", "pg1");
        mock.add_placement_group("acme", "prod", "pg2");
        mock.add_protection_policy("daily");
        for hap in ["h1", "h2", "h3"] {
            mock.add_host_access_policy(hap);
        }
        let session = Session::with_api(mock.clone(), PollConfig::immediate());
        (mock, session)
    }

    fn id() -> VolumeId {
        VolumeId::new("acme", "prod", "db01")
    }

    fn existing(haps: &[&str]) -> Volume {
        Volume {
            name: "db01".into(),
            display_name: "db01".into(),
            size: 20 * GIB,
            storage_class: NamedRef::new("gold"),
            placement_group: NamedRef::new("pg1"),
            protection_policy: None,
            host_access_policies: haps.iter().map(|h| NamedRef::new(*h)).collect(),
            destroyed: false,
        }
    }

    fn spec() -> VolumeSpec {
        VolumeSpec {
            id: id(),
            ..Default::default()
        }
    }

    fn run(session: &Session, spec: VolumeSpec) -> declarative::Result<declarative::ExecuteSummary> {
        let resource = VolumeResource::new(spec, Remote::new(session));
        execute(&resource, &ExecuteOptions::default(), &mut NoProgress)
    }

    fn updated_fields(mock: &MockBackend) -> Vec<&'static str> {
        mock.calls()
            .into_iter()
            .flat_map(|call| match call {
                MockCall::UpdateVolume { fields, .. } => fields,
                _ => Vec::new(),
            })
            .collect()
    }

    #[test]
    fn test_create_issues_exactly_one_create() {
        let (mock, session) = fixture();
        let summary = run(
            &session,
            VolumeSpec {
                size: Some("10G".into()),
                storage_class: Some("gold".into()),
                placement_group: Some("pg1".into()),
                protection_policy: Some("daily".into()),
                ..spec()
            },
        )
        .unwrap();

        assert_eq!(summary.result, ApplyResult::Created);
        assert!(summary.changed());
        let calls = mock.calls();
        assert_eq!(calls.len(), 1);
        match &calls[0] {
            MockCall::CreateVolume { body, .. } => {
                assert_eq!(body.size, 10 * GIB);
                assert_eq!(body.display_name, "db01");
                assert_eq!(body.protection_policy.as_deref(), Some("daily"));
            }
            other => panic!("Expected CreateVolume, got {:?}", other),
        }
    }

    #[test]
    fn test_create_with_host_access_policies_patches_after_create() {
        let (mock, session) = fixture();
        let summary = run(
            &session,
            VolumeSpec {
                size: Some("1G".into()),
                storage_class: Some("gold".into()),
                placement_group: Some("pg1".into()),
                host_access_policies: vec!["h1".into(), "h2".into(), "h1".into()],
                ..spec()
            },
        )
        .unwrap();

        assert_eq!(summary.applied, vec!["create", "host_access_policies"]);
        let volume = mock.volume(&id()).unwrap();
        assert_eq!(volume.host_access_policy_names(), vec!["h1", "h2"]);
    }

    #[test]
    fn test_create_reports_every_missing_field() {
        let (mock, session) = fixture();
        let err = run(&session, spec()).unwrap_err();

        match err {
            Error::Validation(report) => {
                let fields: Vec<_> = report
                    .defects()
                    .iter()
                    .filter_map(|d| match d {
                        Defect::MissingField { field, .. } => Some(*field),
                        _ => None,
                    })
                    .collect();
                assert_eq!(fields, vec!["size", "storage_class", "placement_group"]);
            }
            other => panic!("Expected Validation, got {:?}", other),
        }
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_size_over_ceiling_fails_without_mutation() {
        let (mock, session) = fixture();
        let err = run(
            &session,
            VolumeSpec {
                size: Some("200G".into()),
                storage_class: Some("gold".into()),
                placement_group: Some("pg1".into()),
                ..spec()
            },
        )
        .unwrap_err();

        assert!(err.to_string().contains("exceeds the limit of 100G"));
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_size_over_ceiling_of_observed_class() {
        let (mut mock, session) = fixture();
        mock.add_volume(&id(), existing(&[]));
        let err = run(
            &session,
            VolumeSpec {
                size: Some("101G".into()),
                ..spec()
            },
        )
        .unwrap_err();

        assert!(matches!(err, Error::Validation(_)));
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_class_change_checks_current_size() {
        let (mut mock, session) = fixture();
        mock.add_volume(&id(), existing(&[]));
        let err = run(
            &session,
            VolumeSpec {
                storage_class: Some("bronze".into()),
                ..spec()
            },
        )
        .unwrap_err();

        assert!(err.to_string().contains("size 20G exceeds the limit of 10G"));
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_equal_fields_produce_no_calls() {
        let (mut mock, session) = fixture();
        mock.add_volume(&id(), existing(&["h1"]));
        let summary = run(
            &session,
            VolumeSpec {
                display_name: Some("db01".into()),
                size: Some("20G".into()),
                storage_class: Some("gold".into()),
                placement_group: Some("pg1".into()),
                host_access_policies: vec!["h1".into()],
                ..spec()
            },
        )
        .unwrap();

        assert!(!summary.changed());
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_only_display_name_differs() {
        let (mut mock, session) = fixture();
        mock.add_volume(&id(), existing(&[]));
        let summary = run(
            &session,
            VolumeSpec {
                display_name: Some("Orders DB".into()),
                ..spec()
            },
        )
        .unwrap();

        assert!(summary.changed());
        assert_eq!(updated_fields(&mock), vec!["display_name"]);
        assert_eq!(mock.volume(&id()).unwrap().display_name, "Orders DB");
    }

    #[test]
    fn test_patches_follow_fixed_order_with_rename_last() {
        let (mut mock, session) = fixture();
        mock.add_volume(&id(), existing(&["h1"]));
        let summary = run(
            &session,
            VolumeSpec {
                rename: Some("db02".into()),
                host_access_policies: vec!["h2".into()],
                protection_policy: Some("daily".into()),
                placement_group: Some("pg2".into()),
                size: Some("40G".into()),
                display_name: Some("Orders".into()),
                ..spec()
            },
        )
        .unwrap();

        let order = vec![
            "display_name",
            "size",
            "placement_group",
            "protection_policy",
            "host_access_policies",
            "name",
        ];
        assert_eq!(summary.applied, order);
        assert_eq!(updated_fields(&mock), order);

        let renamed = mock.volume(&id().sibling("db02")).unwrap();
        assert_eq!(renamed.size, 40 * GIB);
        assert_eq!(renamed.host_access_policy_names(), vec!["h1", "h2"]);
        assert!(mock.volume(&id()).is_none());
    }

    #[test]
    fn test_rename_collision_is_a_validation_error() {
        let (mut mock, session) = fixture();
        mock.add_volume(&id(), existing(&[]));
        mock.add_volume(&id().sibling("db02"), existing(&[]));
        let err = run(
            &session,
            VolumeSpec {
                rename: Some("db02".into()),
                ..spec()
            },
        )
        .unwrap_err();

        assert_eq!(err.to_string(), "rename target 'db02' already exists");
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_host_access_policy_union() {
        let (mut mock, session) = fixture();
        mock.add_volume(&id(), existing(&["h1", "h2"]));
        run(
            &session,
            VolumeSpec {
                host_access_policies: vec!["h2".into(), "h3".into()],
                ..spec()
            },
        )
        .unwrap();

        assert_eq!(
            mock.volume(&id()).unwrap().host_access_policy_names(),
            vec!["h1", "h2", "h3"]
        );
    }

    #[test]
    fn test_absent_with_host_access_policies_removes_instead_of_deleting() {
        let (mut mock, session) = fixture();
        mock.add_volume(&id(), existing(&["h1", "h2"]));
        let summary = run(
            &session,
            VolumeSpec {
                host_access_policies: vec!["h2".into()],
                state: Intent::Absent,
                ..spec()
            },
        )
        .unwrap();

        assert_eq!(summary.action, Action::Update);
        assert_eq!(updated_fields(&mock), vec!["host_access_policies"]);
        assert_eq!(
            mock.volume(&id()).unwrap().host_access_policy_names(),
            vec!["h1"]
        );
    }

    #[test]
    fn test_delete_issues_exactly_one_delete() {
        let (mut mock, session) = fixture();
        mock.add_volume(&id(), existing(&["h1"]));
        let summary = run(
            &session,
            VolumeSpec {
                state: Intent::Absent,
                eradicate: true,
                ..spec()
            },
        )
        .unwrap();

        assert_eq!(mock.calls(), vec![MockCall::DeleteVolume { id: id() }]);
        assert_eq!(summary.result, ApplyResult::Removed);
        assert_eq!(summary.warnings.len(), 1);
        assert!(summary.warnings[0].contains("eradication"));
    }

    #[test]
    fn test_absent_absent_makes_no_calls() {
        let (mock, session) = fixture();
        let summary = run(
            &session,
            VolumeSpec {
                state: Intent::Absent,
                ..spec()
            },
        )
        .unwrap();

        assert!(!summary.changed());
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_destroyed_volume_recovery_is_unsupported() {
        let (mut mock, session) = fixture();
        mock.add_volume(
            &id(),
            Volume {
                destroyed: true,
                ..existing(&[])
            },
        );
        let summary = run(&session, VolumeSpec { size: Some("40G".into()), ..spec() }).unwrap();

        assert!(!summary.changed());
        assert!(summary.warnings[0].contains("recovery"));
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_failed_patch_stops_without_compensation() {
        let (mut mock, session) = fixture();
        mock.add_volume(&id(), existing(&[]));
        mock.fail_field("size");
        let err = run(
            &session,
            VolumeSpec {
                display_name: Some("Orders".into()),
                size: Some("40G".into()),
                placement_group: Some("pg2".into()),
                ..spec()
            },
        )
        .unwrap_err();

        match &err {
            Error::Step { step, applied, .. } => {
                assert_eq!(step, "size");
                assert_eq!(applied, &vec!["display_name".to_string()]);
            }
            other => panic!("Expected Step, got {:?}", other),
        }
        assert!(err.changed());
        assert_eq!(updated_fields(&mock), vec!["display_name", "size"]);
        assert_eq!(mock.volume(&id()).unwrap().display_name, "Orders");
    }

    #[test]
    fn test_failed_operation_is_reported_with_step() {
        let (mut mock, session) = fixture();
        mock.add_volume(&id(), existing(&[]));
        mock.fail_operations("placement group is full");
        let err = run(
            &session,
            VolumeSpec {
                placement_group: Some("pg2".into()),
                ..spec()
            },
        )
        .unwrap_err();

        let message = err.to_string();
        assert!(message.starts_with("placement_group failed"));
        assert!(message.contains("placement group is full"));
    }

    #[test]
    fn test_missing_references_are_all_reported() {
        let (mut mock, session) = fixture();
        mock.add_volume(&id(), existing(&[]));
        let err = run(
            &session,
            VolumeSpec {
                storage_class: Some("platinum".into()),
                placement_group: Some("pg9".into()),
                protection_policy: Some("hourly".into()),
                host_access_policies: vec!["h1".into(), "h8".into(), "h9".into()],
                ..spec()
            },
        )
        .unwrap_err();

        match err {
            Error::Validation(report) => {
                let text = report.to_string();
                assert!(text.starts_with("4 problems found"));
                assert!(text.contains("host access policy not found: h8, h9"));
                assert!(text.contains("placement group not found: pg9"));
                assert!(text.contains("protection policy not found: hourly"));
                assert!(text.contains("storage class not found: platinum"));
            }
            other => panic!("Expected Validation, got {:?}", other),
        }
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_unreachable_api_is_not_absence() {
        let (mut mock, session) = fixture();
        mock.set_unavailable(true);
        let err = run(
            &session,
            VolumeSpec {
                size: Some("1G".into()),
                storage_class: Some("gold".into()),
                placement_group: Some("pg1".into()),
                ..spec()
            },
        )
        .unwrap_err();

        assert!(matches!(err, Error::Lookup { .. }));
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_check_mode_reads_but_does_not_mutate() {
        let (mut mock, session) = fixture();
        mock.add_volume(&id(), existing(&[]));
        let resource = VolumeResource::new(
            VolumeSpec {
                size: Some("40G".into()),
                ..spec()
            },
            Remote::new(&session),
        );
        let opts = ExecuteOptions { check_mode: true };
        let summary = execute(&resource, &opts, &mut NoProgress).unwrap();

        assert!(summary.changed());
        assert_eq!(summary.planned, vec!["size"]);
        assert!(mock.calls().is_empty());
        assert!(mock.reads() > 0);
    }

    #[test]
    fn test_change_descriptions() {
        assert_eq!(VolumeChange::Size(2 * GIB).describe(), "size -> 2G");
        assert_eq!(
            VolumeChange::Name("db02".into()).describe(),
            "name -> db02"
        );
        assert_eq!(
            VolumeChange::HostAccessPolicies(vec!["h1".into(), "h2".into()]).describe(),
            "host_access_policies -> [h1, h2]"
        );
    }

    const FIELD_ORDER: [&str; 7] = [
        "display_name",
        "storage_class",
        "size",
        "placement_group",
        "protection_policy",
        "host_access_policies",
        "name",
    ];

    fn name() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9-]{0,7}"
    }

    prop_compose! {
        fn any_volume()(
            name in name(),
            display_name in "[A-Za-z0-9 ]{0,12}",
            size in 1u64..(1u64 << 50),
            class in name(),
            placement_group in name(),
            protection_policy in proptest::option::of(name()),
            haps in prop::collection::vec(name(), 0..5),
        ) -> Volume {
            Volume {
                name,
                display_name,
                size,
                storage_class: NamedRef::new(class),
                placement_group: NamedRef::new(placement_group),
                protection_policy: protection_policy.map(NamedRef::new),
                host_access_policies: haps.into_iter().map(NamedRef::new).collect(),
                destroyed: false,
            }
        }
    }

    /// Spec naming each field either not at all or with its observed value
    fn mirror(volume: &Volume, keep: [bool; 6], hap_mask: &[bool]) -> (VolumeSpec, VolumeFacts) {
        let haps = volume
            .host_access_policy_names()
            .into_iter()
            .zip(hap_mask.iter().chain(std::iter::repeat(&false)))
            .filter(|(_, kept)| **kept)
            .map(|(name, _)| name)
            .collect();
        let spec = VolumeSpec {
            id: VolumeId::new("acme", "prod", volume.name.clone()),
            display_name: keep[0].then(|| volume.display_name.clone()),
            storage_class: keep[1].then(|| volume.storage_class.name.clone()),
            size: keep[2].then(|| format_size(volume.size)),
            placement_group: keep[3].then(|| volume.placement_group.name.clone()),
            protection_policy: volume
                .protection_policy_name()
                .filter(|_| keep[4])
                .map(String::from),
            rename: keep[5].then(|| volume.name.clone()),
            host_access_policies: haps,
            ..Default::default()
        };
        let facts = VolumeFacts {
            size: keep[2].then_some(volume.size),
            size_limit: None,
        };
        (spec, facts)
    }

    fn diff_of(spec: VolumeSpec, facts: &VolumeFacts, observed: &Volume) -> Vec<VolumeChange> {
        let session = Session::with_api(MockBackend::new(), PollConfig::immediate());
        let resource = VolumeResource::new(spec, Remote::new(&session));
        resource.diff(observed, facts).unwrap()
    }

    proptest! {
        #[test]
        fn prop_matching_spec_produces_no_patches(
            volume in any_volume(),
            keep in prop::array::uniform6(any::<bool>()),
            hap_mask in prop::collection::vec(any::<bool>(), 5),
        ) {
            let (spec, facts) = mirror(&volume, keep, &hap_mask);
            let changes = diff_of(spec, &facts, &volume);
            prop_assert!(changes.is_empty(), "unexpected patches: {:?}", changes);
        }

        #[test]
        fn prop_patches_follow_field_order(
            volume in any_volume(),
            display_name in proptest::option::of("[A-Za-z0-9 ]{0,12}"),
            storage_class in proptest::option::of(name()),
            size in proptest::option::of(1u64..(1u64 << 50)),
            placement_group in proptest::option::of(name()),
            protection_policy in proptest::option::of(name()),
            rename in proptest::option::of(name()),
            haps in prop::collection::vec(name(), 0..4),
        ) {
            let spec = VolumeSpec {
                id: VolumeId::new("acme", "prod", volume.name.clone()),
                display_name,
                storage_class,
                size: size.map(format_size),
                placement_group,
                protection_policy,
                rename,
                host_access_policies: haps,
                ..Default::default()
            };
            let facts = VolumeFacts { size, size_limit: None };
            let changes = diff_of(spec, &facts, &volume);

            let positions: Vec<usize> = changes
                .iter()
                .map(|change| {
                    FIELD_ORDER
                        .iter()
                        .position(|field| *field == change.field())
                        .unwrap()
                })
                .collect();
            prop_assert!(
                positions.windows(2).all(|pair| pair[0] < pair[1]),
                "out of order: {:?}",
                changes
            );
        }
    }
}
