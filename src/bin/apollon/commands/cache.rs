//! `apollon --cache` command

use anyhow::Result;

use apollon::core::{BuildEnvironment, TargetMode};
use apollon::ops::{self, RunContext};
use apollon::util::{GlobalContext, Shell, Status};

pub fn execute(shell: &Shell) -> Result<()> {
    let env = BuildEnvironment::from_env()?;
    let gctx = GlobalContext::new()?;
    let ctx = RunContext::load(env, gctx.home())?;

    let report = ops::sync(&ctx)?;

    let mut linked = 0;
    for (target, mode) in &report.modes {
        if *mode == TargetMode::LinkFromCache {
            linked += 1;
            shell.status(Status::Linking, target);
        } else if shell.is_verbose() {
            shell.note(format!("{}: {}", target, mode));
        }
    }
    shell.status(
        Status::Finished,
        format!("{} of {} targets linked from the cache", linked, report.modes.len()),
    );
    Ok(())
}
