//! Tag management commands

use vault_note::TagCommand;

use super::{CmdResult, Context};

pub fn run(ctx: &Context, cmd: TagCommand) -> CmdResult {
    let engine = ctx.engine()?;
    match cmd {
        TagCommand::Add { filename, tags, folder } => {
            ctx.emit(&engine.add_tags(&filename, tags.as_slice(), folder.as_deref())?)
        }
        TagCommand::Remove { filename, tags, folder } => {
            ctx.emit(&engine.remove_tags(&filename, tags.as_slice(), folder.as_deref())?)
        }
        TagCommand::Rename { old_tag, new_tag } => {
            ctx.emit(&engine.rename_tag(&old_tag, &new_tag)?)
        }
    }
}

/// All tags with usage counts
pub fn list(ctx: &Context) -> CmdResult {
    let engine = ctx.engine()?;
    ctx.emit(&engine.list_tags()?)
}
