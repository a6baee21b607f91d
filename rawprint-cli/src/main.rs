//! rawprint - send raw print jobs through the Windows spooler

mod config;
mod logger;

use anyhow::Context;
use clap::Parser;
use rawprint::{Printer, SpoolPrinter, Spooler};
use tracing::info;

use config::{Cli, Command, SendArgs};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logger::init_logger(&cli.log_level, cli.log_json);

    dispatch(cli.command).await
}

#[cfg(windows)]
async fn dispatch(command: Command) -> anyhow::Result<()> {
    run(rawprint::WinSpool, command).await
}

#[cfg(not(windows))]
async fn dispatch(command: Command) -> anyhow::Result<()> {
    let _ = command;
    anyhow::bail!("rawprint needs the Windows print spooler, unavailable on this platform")
}

#[cfg_attr(not(windows), allow(dead_code))]
async fn run<S>(spooler: S, command: Command) -> anyhow::Result<()>
where
    S: Spooler + Clone + Send + 'static,
{
    match command {
        Command::List => {
            for name in rawprint::printer_names(&spooler)? {
                println!("{name}");
            }
        }
        Command::Send(args) => send(spooler, &args).await?,
        Command::DriverFiles { printer } => {
            let printer = SpoolPrinter::resolve(spooler, printer.as_deref())?;
            for file in printer.dependent_files()? {
                println!("{file}");
            }
        }
    }
    Ok(())
}

#[cfg_attr(not(windows), allow(dead_code))]
async fn send<S>(spooler: S, args: &SendArgs) -> anyhow::Result<()>
where
    S: Spooler + Clone + Send + 'static,
{
    let data = tokio::fs::read(&args.file)
        .await
        .with_context(|| format!("reading {}", args.file.display()))?;
    let document = args.document_info()?;
    let defaults = args.printer_defaults(&document);

    let printer = SpoolPrinter::resolve(spooler, args.printer.as_deref())?
        .with_defaults(defaults)
        .with_document(document);

    printer
        .print(&data)
        .await
        .with_context(|| format!("printing to {}", printer.name()))?;

    info!(
        printer = printer.name(),
        job = %printer.document().name,
        bytes = data.len(),
        "Job spooled"
    );
    Ok(())
}
