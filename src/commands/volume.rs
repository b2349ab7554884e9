use crate::Context;
use crate::cli::VolumeArgs;
use crate::commands::{Outcome, reconcile};
use crate::progress::Spinner;
use crate::resource::{Remote, VolumeResource, VolumeSpec};
use fusionkit::{Session, VolumeId};

pub fn run(ctx: &Context, args: VolumeArgs) -> anyhow::Result<Outcome> {
    let session = ctx.open_session()?;
    Ok(run_with(ctx, &session, args))
}

pub(crate) fn run_with(ctx: &Context, session: &Session, args: VolumeArgs) -> Outcome {
    let spinner = Spinner::new(ctx.interactive());
    let remote = Remote::new(session).with_poll(&spinner);
    let resource = VolumeResource::new(spec_from_args(args), remote);
    reconcile(ctx, &resource, &spinner)
}

fn spec_from_args(args: VolumeArgs) -> VolumeSpec {
    VolumeSpec {
        id: VolumeId::new(args.tenant, args.tenant_space, args.name),
        display_name: args.display_name,
        rename: args.rename,
        storage_class: args.storage_class,
        placement_group: args.placement_group,
        protection_policy: args.protection_policy,
        host_access_policies: args.host_access_policies,
        size: args.size,
        eradicate: args.eradicate,
        state: args.state.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::State;
    use crate::commands::tests::context;
    use fusionkit::{MockBackend, MockCall, PollConfig, StorageClass};

    const GIB: u64 = 1024 * 1024 * 1024;

    fn session() -> (MockBackend, Session) {
        let mut mock = MockBackend::new();
        mock.add_storage_class(StorageClass {
            name: "gold".into(),
            display_name: "Gold".into(),
            size_limit: 100 * GIB,
        });
        mock.add_placement_group("acme", "prod", "pg1");
        let session = Session::with_api(mock.clone(), PollConfig::immediate());
        (mock, session)
    }

    fn args() -> VolumeArgs {
        VolumeArgs {
            name: "db01".into(),
            tenant: "acme".into(),
            tenant_space: "prod".into(),
            display_name: None,
            rename: None,
            size: Some("10G".into()),
            storage_class: Some("gold".into()),
            placement_group: Some("pg1".into()),
            protection_policy: None,
            host_access_policies: Vec::new(),
            eradicate: false,
            state: State::Present,
        }
    }

    #[test]
    fn test_spec_from_args() {
        let spec = spec_from_args(args());
        assert_eq!(spec.id, VolumeId::new("acme", "prod", "db01"));
        assert_eq!(spec.size.as_deref(), Some("10G"));
        assert_eq!(spec.state, declarative::Intent::Present);
    }

    #[test]
    fn test_create_then_converge() {
        let (mock, session) = session();

        let first = run_with(&context(false), &session, args());
        assert!(first.changed, "{}", first.msg);
        assert!(!first.failed);
        assert!(mock.volume(&VolumeId::new("acme", "prod", "db01")).is_some());

        let second = run_with(&context(false), &session, args());
        assert!(!second.changed, "{}", second.msg);
        assert!(!second.failed);
    }

    #[test]
    fn test_check_mode_issues_no_calls() {
        let (mock, session) = session();
        let outcome = run_with(&context(true), &session, args());
        assert!(outcome.changed);
        assert!(outcome.msg.contains("would create"));
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_validation_failure_is_reported() {
        let (mock, session) = session();
        let mut args = args();
        args.size = Some("12Q".into());
        args.storage_class = Some("platinum".into());

        let outcome = run_with(&context(false), &session, args);
        assert!(outcome.failed);
        assert!(!outcome.changed);
        assert!(outcome.msg.contains("problems found"), "{}", outcome.msg);
        assert!(!mock.calls().iter().any(|c| matches!(c, MockCall::CreateVolume { .. })));
    }
}
