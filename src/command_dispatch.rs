//! Purpose: Hold top-level CLI command dispatch for `folio`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Command behavior, output envelopes, and exit code semantics stay unchanged.

use super::*;

pub(super) fn dispatch_command(command: Command, data_dir: PathBuf) -> Result<RunOutcome, Error> {
    match command {
        Command::Completion { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            clap_complete::aot::generate(shell, &mut cmd, "folio", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
        Command::Init => {
            let client = LocalClient::new().with_data_dir(&data_dir);
            client.init()?;
            emit_json(json!({ "initialized": data_dir.display().to_string() }));
            Ok(RunOutcome::ok())
        }
        Command::Author(entity_command) => {
            let catalog = LocalClient::new().with_data_dir(&data_dir).catalog();
            run_entity_command(&catalog, Entity::Author, entity_command)
        }
        Command::Book(entity_command) => {
            let catalog = LocalClient::new().with_data_dir(&data_dir).catalog();
            run_entity_command(&catalog, Entity::Book, entity_command)
        }
        Command::Publisher(entity_command) => {
            let catalog = LocalClient::new().with_data_dir(&data_dir).catalog();
            run_entity_command(&catalog, Entity::Publisher, entity_command)
        }
        Command::Serve(args) => {
            let bind = args.bind.parse().map_err(|_| {
                Error::new(ErrorKind::Usage)
                    .with_message("invalid bind address")
                    .with_hint("Use a host:port value like 127.0.0.1:9718.")
            })?;
            let config = serve::ServeConfig {
                bind,
                data_dir,
                allow_non_loopback: args.allow_non_loopback,
            };
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .map_err(|err| {
                    Error::new(ErrorKind::Internal)
                        .with_message("failed to start runtime")
                        .with_source(err)
                })?;
            runtime.block_on(serve::serve(config))?;
            Ok(RunOutcome::ok())
        }
    }
}
