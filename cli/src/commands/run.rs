use std::process::ExitCode;

use ignite_common::error::BootstrapError;
use ignite_core::app::ProgramApplication;
use ignite_core::bootstrap::Bootstrap;
use tracing::error;

use super::RunArgs;

pub async fn run(args: RunArgs) -> ExitCode {
    let config = args.into_config();
    let app = ProgramApplication::new(config.app.clone());
    let bootstrap = Bootstrap::new(config);

    // Nothing is stamped until logging is installed, so early failures go straight to stderr.
    let log = match bootstrap.log_context().and_then(|log| log.install().map(|()| log)) {
        Ok(log) => log,
        Err(err) => {
            eprintln!("ignite: {err}");
            return ExitCode::from(err.exit_code());
        }
    };

    match bootstrap.run_with(log, app).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}

pub fn exit_code(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<BootstrapError>()
        .map_or(1, BootstrapError::exit_code)
}
