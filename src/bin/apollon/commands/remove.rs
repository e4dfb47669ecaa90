//! `apollon --remove` command

use anyhow::Result;

use apollon::ops;
use apollon::util::{GlobalContext, Shell, Status};

pub fn execute(shell: &Shell) -> Result<()> {
    let gctx = GlobalContext::new()?;
    let report = ops::remove(&gctx, shell)?;
    for target in &report.restored {
        shell.status(Status::Updated, format!("{}: compile sources restored", target));
    }
    Ok(())
}
