//! `apollon --setup` command

use anyhow::Result;

use apollon::ops;
use apollon::util::{GlobalContext, Shell};

pub fn execute(shell: &Shell) -> Result<()> {
    let gctx = GlobalContext::new()?;
    ops::setup(&gctx, shell)?;
    Ok(())
}
