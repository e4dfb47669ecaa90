//! `apollon --install` command

use anyhow::Result;

use apollon::ops;
use apollon::util::{GlobalContext, Shell, Status};

pub fn execute(shell: &Shell) -> Result<()> {
    let gctx = GlobalContext::new()?;
    let report = ops::install(&gctx, shell)?;

    for target in &report.added {
        shell.status(Status::Added, format!("`{}` to the Apollonfile", target));
    }
    for target in &report.dropped {
        shell.status(Status::Removed, format!("`{}` from the Apollonfile", target));
    }
    if shell.is_verbose() {
        shell.note(format!("{} source mappings written", report.mapped.len()));
    }
    Ok(())
}
