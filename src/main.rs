use clap::Parser;
use miette::Result;
use qrstyle::cli::{self, Cli, Commands};
use qrstyle::output::{Printer, PrinterLogger};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let printer = Printer::new();
    PrinterLogger::install(printer, cli.verbose);

    match cli.command {
        Commands::Render(args) => {
            let config = cli::load_config(cli.config.as_deref())?;
            cli::render::run(args, &config, &printer)?;
        }
        Commands::Watch(args) => {
            let config = cli::load_config(cli.config.as_deref())?;
            cli::watch::run(args, &config, &printer)?;
        }
        Commands::Batch(args) => {
            let config = cli::load_config(cli.config.as_deref())?;
            cli::batch::run(args, &config, &printer)?;
        }
        Commands::Validate(args) => {
            let config = cli::load_config(cli.config.as_deref())?;
            cli::validate::run(args, &config, &printer)?;
        }
        Commands::Describe(args) => {
            let config = cli::load_config(cli.config.as_deref())?;
            cli::describe::run(args, &config)?;
        }
        Commands::Patterns(args) => cli::patterns::run(args)?,
        Commands::Init(args) => {
            cli::init::run(args, &printer)?;
        }
        Commands::Completions(args) => cli::completions::run(args)?,
    }

    Ok(())
}
