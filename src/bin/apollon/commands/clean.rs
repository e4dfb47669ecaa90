//! `apollon --clean` command

use anyhow::Result;

use apollon::ops;
use apollon::util::{GlobalContext, Shell, Status};

pub fn execute(shell: &Shell) -> Result<()> {
    let gctx = GlobalContext::new()?;

    if ops::clean(&gctx)? {
        shell.status(Status::Removed, gctx.home().display());
    } else {
        shell.note(format!("{} does not exist", gctx.home().display()));
    }

    Ok(())
}
