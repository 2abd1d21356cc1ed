//! Search command

use vault_note::{SearchQuery, SearchType};

use super::{CmdResult, Context};

pub fn run(
    ctx: &Context,
    query: String,
    search_type: &str,
    case_sensitive: bool,
    path: Option<String>,
    limit: usize,
) -> CmdResult {
    let search_type: SearchType = search_type.parse()?;
    let engine = ctx.engine()?;

    let query = SearchQuery::new(query, search_type)
        .case_sensitive(case_sensitive)
        .in_folder(path)
        .limit(limit);
    ctx.emit(&engine.search(&query)?)
}
