//! The `status` command: apply with forced dry-run, printing a formatted
//! diff per target and a drift summary.

use anyhow::{Context as _, Result};

use super::{CommandContext, initialize};
use crate::cli::{GlobalOpts, StatusOpts};
use crate::color::ColorSupport;
use crate::config::Target;
use crate::logging::{Logger, TargetStatus};
use crate::state::compute_diff_with_current;

pub fn run(global: &GlobalOpts, opts: &StatusOpts, log: &Logger) -> Result<()> {
    log.stage("Checking configuration status");

    // Status is always a dry run.
    let ctx = initialize(global, &opts.targets, Some(true), false)?;
    let colors = ColorSupport::new();

    let mut has_changes = false;
    for target in &ctx.targets {
        let changed = check_target_status(target, &ctx, &colors)
            .with_context(|| format!("check status for target {}", target.name))?;
        if changed {
            has_changes = true;
            log.record_target(&target.name, TargetStatus::DryRun, Some("changes required"));
        } else {
            log.record_target(&target.name, TargetStatus::InSync, None);
        }
    }

    log.print_summary();

    if has_changes {
        log.warn("Drift detected - some targets need updates");
    } else {
        log.info("All targets are in sync");
    }

    Ok(())
}

/// Report one target's drift; returns whether changes are required.
fn check_target_status(
    target: &Target,
    ctx: &CommandContext,
    colors: &ColorSupport,
) -> Result<bool> {
    tracing::info!(
        "Checking status for target: {} (type: {})",
        target.name,
        target.kind()
    );

    let executor = ctx.registry.executor(target.kind())?;
    let current = executor
        .current_state(target)
        .context("get current system state")?;
    let diff = compute_diff_with_current(&target.name, &target.desired_state(), &current);

    if diff.is_empty() {
        println!("{} {}: No changes needed", colors.green("✓"), target.name);
        return Ok(false);
    }

    println!("{} {}: Changes required", colors.yellow("⚠"), target.name);
    let formatted = diff.format(colors);
    if !formatted.is_empty() {
        println!("{formatted}");
    }
    Ok(true)
}
