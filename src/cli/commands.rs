use std::path::Path;

use crate::app::{AppContext, GleanerError, Result};
use crate::cli::RunArgs;
use crate::dispatch::{Dispatcher, FlatRecord, Sink};
use crate::export;
use crate::harvest::Harvester;
use crate::schedule::{format_interval, Scheduler, Shutdown};

/// Fold command line overrides into the loaded configuration.
pub fn apply_run_args(ctx: &mut AppContext, args: &RunArgs) {
    if let Some(max) = args.max_records {
        ctx.config.collector.max_records = Some(max);
    }
    if let Some(interval) = &args.interval {
        ctx.config.schedule.interval = interval.clone();
    }
    if args.no_initial_run {
        ctx.config.schedule.run_on_start = false;
    }
    // The operator has to see the page to scroll it
    if args.headed || args.manual {
        ctx.config.browser.headless = false;
    }
}

pub async fn run(mut ctx: AppContext, args: RunArgs) -> Result<()> {
    apply_run_args(&mut ctx, &args);

    let harvester = ctx.harvester(!args.no_dispatch, args.manual)?;
    let shutdown = Shutdown::new();
    let listener = shutdown.listen_for_signals();

    if args.once {
        run_pass(&harvester, &shutdown, args.output.as_deref()).await;
    } else {
        let interval = ctx.config.schedule.interval().map_err(GleanerError::Config)?;
        println!(
            "Harvesting {} target(s) every {}. Press Ctrl-C to stop.",
            ctx.config.targets.len(),
            format_interval(interval.as_secs())
        );
        let scheduler = Scheduler::new(interval, ctx.config.schedule.run_on_start);
        let output = args.output.as_deref();
        scheduler
            .run(&shutdown, || run_pass(&harvester, &shutdown, output))
            .await;
    }

    listener.abort();
    Ok(())
}

/// One pass over every target. Per-target failures are reported, not returned.
async fn run_pass<S: Sink>(harvester: &Harvester<S>, shutdown: &Shutdown, output: Option<&Path>) {
    let summary = harvester.run(shutdown).await;

    println!(
        "Collected {} reviews from {} target(s), {} sent, {} failed",
        summary.total_records(),
        summary.targets.len(),
        summary.records_sent(),
        summary.failed_targets()
    );
    for report in summary.targets.iter().filter(|t| t.is_failed()) {
        if let Some(error) = &report.error {
            eprintln!("  Error on {}: {}", report.target, error);
        }
    }

    if let Some(dir) = output {
        match export::write_snapshot(dir, &summary) {
            Ok(path) => println!("Snapshot written to {}", path.display()),
            Err(e) => eprintln!("Failed to write snapshot: {}", e),
        }
    }
}

pub fn list_targets(ctx: &AppContext) -> Result<()> {
    let targets = &ctx.config.targets;

    if targets.is_empty() {
        println!("No targets configured");
        return Ok(());
    }

    for target in targets {
        match target.resolve_url(&ctx.config.view.search_url_template) {
            Ok(url) => println!("{}\n  {}", target.name, url),
            Err(e) => println!("{}\n  (unresolvable: {})", target.name, e),
        }
    }

    Ok(())
}

pub async fn ping(ctx: &AppContext) -> Result<()> {
    let sink = ctx.webhook_sink()?;
    println!("Sending test record to {}", sink.redacted_endpoint());

    let dispatcher = Dispatcher::new(sink, ctx.config.sink.clone());
    let report = dispatcher.dispatch_flat(&[FlatRecord::ping()]).await;

    if let Some(failure) = report.failures.first() {
        return Err(GleanerError::Other(format!(
            "Ping failed after {} attempt(s): {}",
            failure.attempts, failure.error
        )));
    }

    println!("Sink accepted the test record");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_run_args_override_config() {
        let mut ctx = AppContext::from_config(Config::default());
        let args = RunArgs {
            interval: Some("6h".into()),
            no_initial_run: true,
            max_records: Some(25),
            manual: true,
            ..Default::default()
        };

        apply_run_args(&mut ctx, &args);

        assert_eq!(ctx.config.schedule.interval, "6h");
        assert!(!ctx.config.schedule.run_on_start);
        assert_eq!(ctx.config.collector.max_records, Some(25));
        assert!(!ctx.config.browser.headless);
    }

    #[test]
    fn test_defaults_leave_config_alone() {
        let mut ctx = AppContext::from_config(Config::default());
        apply_run_args(&mut ctx, &RunArgs::default());

        assert_eq!(ctx.config.schedule.interval, "7d");
        assert!(ctx.config.browser.headless);
        assert_eq!(ctx.config.collector.max_records, None);
    }

    #[test]
    fn test_run_rejects_invalid_config_before_launching() {
        let ctx = AppContext::from_config(Config::default());
        let result = tokio_test::block_on(run(
            ctx,
            RunArgs {
                once: true,
                ..Default::default()
            },
        ));
        assert!(result.unwrap_err().is_config());
    }

    #[tokio::test]
    async fn test_ping_without_endpoint() {
        let ctx = AppContext::from_config(Config::default());
        assert!(ping(&ctx).await.unwrap_err().is_config());
    }
}
