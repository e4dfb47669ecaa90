//! `apollon --sync_back` command

use anyhow::Result;

use apollon::core::BuildEnvironment;
use apollon::ops::{self, RunContext};
use apollon::util::{GlobalContext, Shell, Status};

pub fn execute(shell: &Shell) -> Result<()> {
    let env = BuildEnvironment::from_env()?;
    let gctx = GlobalContext::new()?;
    let ctx = RunContext::load(env, gctx.home())?;

    let collected = ops::sync_back(&ctx)?;
    for entry in &collected {
        shell.status(Status::Collecting, &entry.target);
    }
    shell.status(
        Status::Finished,
        format!("{} libraries cached", collected.len()),
    );
    Ok(())
}
