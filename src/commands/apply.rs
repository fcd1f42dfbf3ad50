//! The `apply` command: validate, run pre-apply hooks, reconcile, run
//! post-apply hooks.

use anyhow::{Context as _, Result};

use super::initialize;
use crate::cli::{ApplyOpts, GlobalOpts};
use crate::engine::Engine;
use crate::logging::Logger;

pub fn run(global: &GlobalOpts, opts: &ApplyOpts, log: &Logger) -> Result<()> {
    let suffix = if global.dry_run { " (dry run)" } else { "" };
    log.stage(&format!("Applying configuration{suffix}"));

    let ctx = initialize(global, &opts.targets, None, opts.backup)?;
    let engine = Engine::new(&ctx.registry, ctx.dry_run);

    if let Err(err) = engine.validate(&ctx.targets) {
        if opts.force {
            log.warn(&format!("proceeding despite validation failure: {err:#}"));
        } else {
            return Err(err.context("validation failed"));
        }
    }

    if let Some(hooks) = &ctx.system_config.hooks
        && !hooks.pre_apply.is_empty()
    {
        ctx.hook_runner
            .run_hooks(&hooks.pre_apply, "pre_apply")
            .context("pre-apply hooks failed")?;
    }

    engine
        .reconcile(&ctx.targets)
        .context("reconciliation failed")?;

    if let Some(hooks) = &ctx.system_config.hooks
        && !hooks.post_apply.is_empty()
    {
        ctx.hook_runner
            .run_hooks(&hooks.post_apply, "post_apply")
            .context("post-apply hooks failed")?;
    }

    Ok(())
}
