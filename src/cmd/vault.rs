//! Vault discovery command

use vault_note::list_vaults;

use super::{CmdResult, Context};

/// Report the configured vault; never fails on a broken vault
pub fn run(ctx: &Context) -> CmdResult {
    ctx.emit(&list_vaults(&ctx.config))
}
