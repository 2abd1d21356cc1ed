//! Note CRUD commands

use std::io::{self, IsTerminal, Read};

use vault_note::EditOperation;

use super::{CmdResult, Context};

pub fn create(ctx: &Context, filename: &str, content: Option<String>, folder: Option<&str>) -> CmdResult {
    let engine = ctx.engine()?;
    let content = read_content(content)?;
    ctx.emit(&engine.create(filename, &content, folder)?)
}

pub fn read(ctx: &Context, filename: &str, folder: Option<&str>) -> CmdResult {
    let engine = ctx.engine()?;
    ctx.emit(&engine.read(filename, folder)?)
}

pub fn edit(
    ctx: &Context,
    filename: &str,
    content: Option<String>,
    folder: Option<&str>,
    operation: &str,
) -> CmdResult {
    // Reject a bad operation before touching the vault or stdin
    let operation: EditOperation = operation.parse()?;
    let engine = ctx.engine()?;
    let content = read_content(content)?;
    ctx.emit(&engine.edit(filename, &content, folder, operation)?)
}

pub fn delete(ctx: &Context, filename: &str, folder: Option<&str>) -> CmdResult {
    let engine = ctx.engine()?;
    ctx.emit(&engine.delete(filename, folder)?)
}

/// Read content from argument or stdin.
/// - Some("-") -> read from stdin
/// - Some(text) -> use the text directly
/// - None -> read from stdin when it is piped, else empty
fn read_content(content: Option<String>) -> io::Result<String> {
    match content {
        Some(arg) if arg == "-" => read_from_stdin(),
        Some(text) => Ok(text),
        None if io::stdin().is_terminal() => Ok(String::new()),
        None => read_from_stdin(),
    }
}

fn read_from_stdin() -> io::Result<String> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    Ok(buffer)
}
