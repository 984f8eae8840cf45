use clap::Parser;
use packwall::cli::{Cli, Command};
use packwall::run::InterruptFlag;
use packwall::{cmd_check, cmd_dump, cmd_init, cmd_update_todo, cmd_validate, style};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("packwall=debug")
        } else {
            EnvFilter::new("warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let interrupt = InterruptFlag::new();
    watch_for_interrupt(interrupt.clone());

    let exit_code = match cli.command {
        Command::Check(args) => cmd_check(args, interrupt),
        Command::UpdateTodo(args) => cmd_update_todo(args, interrupt),
        Command::Validate(args) => cmd_validate(args),
        Command::Dump(args) => cmd_dump(args, interrupt),
        Command::Init(args) => cmd_init(args),
    };

    std::process::exit(exit_code);
}

/// Turn the first Ctrl-C into a cooperative interrupt; a second one exits.
fn watch_for_interrupt(interrupt: InterruptFlag) {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            style::warning(&format!("Ctrl-C handling unavailable: {}", e));
            return;
        }
    };

    std::thread::spawn(move || {
        runtime.block_on(async {
            if tokio::signal::ctrl_c().await.is_err() {
                return;
            }
            interrupt.interrupt();
            if tokio::signal::ctrl_c().await.is_ok() {
                std::process::exit(130);
            }
        });
    });
}
