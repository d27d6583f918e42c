use clap::Parser;
use miette::Result;
use rackline::cli::{Cli, Commands};

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    // Without this, piping to `head`, `grep -q`, etc. causes a panic on broken pipe.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    // Install miette's fancy error handler for readable diagnostics
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;

    match cli.command {
        Commands::Init(args) => rackline::cli::commands::init::run(args),
        Commands::Type(cmd) => rackline::cli::commands::types::run(cmd, &global),
        Commands::Field(cmd) => rackline::cli::commands::field::run(cmd, &global),
        Commands::Master(cmd) => rackline::cli::commands::master::run(cmd, &global),
        Commands::Asset(cmd) => rackline::cli::commands::asset::run(cmd, &global),
        Commands::Import(cmd) => rackline::cli::commands::import::run(cmd, &global),
        Commands::Audit(args) => rackline::cli::commands::audit::run(args, &global),
        Commands::Completions(args) => rackline::cli::commands::completions::run(args),
    }
}
