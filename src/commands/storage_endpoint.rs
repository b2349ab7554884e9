use crate::Context;
use crate::cli::StorageEndpointArgs;
use crate::commands::{Outcome, reconcile};
use crate::progress::Spinner;
use crate::resource::{Remote, StorageEndpointResource, StorageEndpointSpec};
use fusionkit::{Session, StorageEndpointId};

pub fn run(ctx: &Context, args: StorageEndpointArgs) -> anyhow::Result<Outcome> {
    let session = ctx.open_session()?;
    Ok(run_with(ctx, &session, args))
}

pub(crate) fn run_with(ctx: &Context, session: &Session, args: StorageEndpointArgs) -> Outcome {
    let spinner = Spinner::new(ctx.interactive());
    let remote = Remote::new(session).with_poll(&spinner);
    let resource = StorageEndpointResource::new(spec_from_args(args), remote);
    reconcile(ctx, &resource, &spinner)
}

fn spec_from_args(args: StorageEndpointArgs) -> StorageEndpointSpec {
    StorageEndpointSpec {
        id: StorageEndpointId::new(args.region, args.availability_zone, args.name),
        display_name: args.display_name,
        endpoint_type: args.endpoint_type.into(),
        network_interface_groups: args.network_interface_groups,
        addresses: args.addresses,
        gateway: args.gateway,
        state: args.state.into(),
    }
}
