/// Content of a file to be included as context for a bugfix request.
#[derive(Debug, Clone)]
pub struct FileContent {
    /// File path (relative or absolute).
    pub path: String,
    /// Full text content of the file.
    pub content: String,
}

/// A request to rewrite a buggy piece of code.
#[derive(Debug, Clone)]
pub struct BugfixRequest {
    /// The code to repair.
    pub code: String,
    /// Optional description of the observed failure.
    pub context: Option<String>,
    /// Files to include as context.
    pub files: Vec<FileContent>,
}
