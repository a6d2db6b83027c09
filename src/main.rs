use clap::Parser;
use anyhow::Result;

use watchprobe::{
    cli::Cli,
    interrupt::CtrlC,
    Console, NotifySource, Probe, ProbeError,
};

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.setup_logging();

    let config = cli.to_config();
    tracing::debug!("Starting WatchProbe on: {}", config.watch_path.display());

    let source = NotifySource::new();
    let probe = match Probe::new(&source, config, Console::stdout()) {
        Ok(probe) => probe,
        Err(err) => exit_with(err),
    };

    let mut interrupt = CtrlC::install()?;
    match probe.run(&mut interrupt) {
        Ok(report) => {
            tracing::debug!(
                "Finished: native={} polling={}",
                report.native_count,
                report.polling_count
            );
            Ok(())
        }
        Err(err) if err.is_fatal_preflight() || err.remedy().is_some() => exit_with(err),
        Err(err) => Err(err.into()),
    }
}

fn exit_with(err: ProbeError) -> ! {
    eprintln!("Error: {}", err);
    if let Some(remedy) = err.remedy() {
        eprintln!("{}", remedy);
    }
    std::process::exit(1);
}
