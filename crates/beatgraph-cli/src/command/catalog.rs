//! `kinds` and `candidates`.

use beatgraph_runtime::registry::Registry;
use beatgraph_runtime::resolve;

use super::print_json;
use crate::config::CandidatesArgs;

/// Prints every built-in node kind.
pub fn kinds() -> anyhow::Result<()> {
    print_json(Registry::builtin().list_kinds())
}

/// Prints the kinds that can be wired to the given port.
pub fn candidates(args: &CandidatesArgs) -> anyhow::Result<()> {
    let registry = Registry::builtin();
    let mut found = resolve::candidates(&registry, args.semantic_type, args.direction);
    if let Some(query) = &args.query {
        found = found.filter(query);
    }
    print_json(&found)
}
