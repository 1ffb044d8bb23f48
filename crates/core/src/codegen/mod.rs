pub mod extract;
pub mod policy;
pub mod prompt;
pub mod types;

pub use extract::{extract_first_block, strip_echoed_prompt};
pub use policy::{apply, ParsePolicyError, PostProcess};
pub use prompt::build_bugfix_prompt;
pub use types::{BugfixRequest, FileContent};
