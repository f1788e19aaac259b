use std::process::ExitCode;

use kornia_feature::{dispatch::Dispatcher, dry_run::DryRunFactory, gpu::GpuSupport};

mod args;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: args::Args = argh::from_env();
    let request = args.command.into_request();

    let gpu = GpuSupport::detect();
    log::info!("Running {} (gpu enabled: {})", request.name(), gpu.is_enabled());

    Dispatcher::new(DryRunFactory, gpu).run(request).into()
}
