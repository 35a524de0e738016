use clap::Args;
use pomogrande_core::effects::{
    Effects, FileBadge, FileSiteBlocker, LazyAudio, LogNotifier, TerminalBell,
};
use pomogrande_core::storage::{data_dir, CommandQueue, Database};
use pomogrande_core::timer::{Controller, ControllerOptions, IntervalScheduler};
use pomogrande_core::{Config, Runtime};
use tokio::task::JoinHandle;

use super::CliResult;

/// Origin name for writes made by the controller.
const CONTROLLER_ORIGIN: &str = "controller";

#[derive(Args)]
pub struct RunArgs {
    /// Do not print controller events to stdout
    #[arg(long)]
    quiet: bool,
}

pub fn run(args: RunArgs) -> CliResult {
    let config = Config::load()?;
    let dir = data_dir()?;
    let store = Database::open(CONTROLLER_ORIGIN)?;
    let queue = CommandQueue::open()?;
    let effects = Effects::new(
        Box::new(LogNotifier),
        Box::new(LazyAudio::new(TerminalBell::open)),
        Box::new(FileBadge::new(dir.join("badge.json"))),
        Box::new(FileSiteBlocker::new(dir.join("blocking.json"))),
    );

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    rt.block_on(async move {
        let (scheduler, ticks) = IntervalScheduler::channel();
        let mut controller = Controller::new(
            Box::new(store),
            Box::new(scheduler),
            effects,
            ControllerOptions::from_config(&config),
        );
        controller.seed_defaults();

        let (runtime, handle) = Runtime::new(controller, ticks, config.timer.poll_interval_ms);
        let mut runtime = runtime.with_queue(queue).with_ctrl_c();
        let mut events = runtime.subscribe();
        let quiet = args.quiet;
        let printer = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                if quiet {
                    continue;
                }
                match serde_json::to_string(&event) {
                    Ok(line) => println!("{line}"),
                    Err(e) => tracing::warn!(error = %e, "cannot encode event"),
                }
            }
        });

        let controller = runtime.run().await;
        drop(handle);
        join_printer(printer).await;
        if !quiet {
            if let Ok(line) = serde_json::to_string(&controller.snapshot()) {
                println!("{line}");
            }
        }
    });
    Ok(())
}

/// Wait for the event printer to drain. Returns false if it panicked or was
/// cancelled.
async fn join_printer(printer: JoinHandle<()>) -> bool {
    match printer.await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "event printer did not finish cleanly");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn printer_failure_is_reported() {
        assert!(join_printer(tokio::spawn(async {})).await);
        let failed = tokio::spawn(async { panic!("printer failed") });
        assert!(!join_printer(failed).await);
    }
}
