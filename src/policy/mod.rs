//! Declarative route policy: templates, the immutable table, and its loader.
//! Keep the public surface thin and split implementation across sub-modules.

mod template;
mod table;
mod loader;

pub use template::{split_path, PathTemplate, Segment};
pub use table::{Method, PolicyEntry, PolicyTable};
pub use loader::{default_portal_policy, from_file, from_json_str, PolicyDocument, PolicyEntryDoc};
