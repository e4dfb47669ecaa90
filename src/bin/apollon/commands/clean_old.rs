//! `apollon --clean-old` command

use anyhow::Result;

use apollon::ops;
use apollon::util::{GlobalContext, Shell, Status};

pub fn execute(shell: &Shell) -> Result<()> {
    let gctx = GlobalContext::new()?;
    let report = ops::clean_old(&gctx)?;

    if report.removed.is_empty() {
        println!("Cache size is under the limit");
        return Ok(());
    }

    for file in &report.removed {
        println!("Deleted {} (last used {})", file.path.display(), file.last_used());
    }
    shell.status(
        Status::Finished,
        format!(
            "freed {} bytes, cache is now {} bytes",
            report.freed(),
            report.total_after()
        ),
    );
    Ok(())
}
