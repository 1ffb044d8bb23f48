use crate::prelude::{println, *};
use codefix_core::codegen::{apply, build_bugfix_prompt, BugfixRequest, FileContent, PostProcess};
use rig::client::CompletionClient;
use rig::completion::Prompt;
use rig::providers::ollama;
use tokio::io::AsyncReadExt;

const COMPLETION_PREAMBLE: &str = "\
You are a code completion engine. You receive the beginning of a function and
continue it.

Rules:
- Continue the code exactly where it stops. Do not repeat the given prefix.
- Output raw source code only. No markdown fences. No explanations.
- Complete the current function body through its closing brace before starting
  anything else.";

const BUGFIX_PREAMBLE: &str = "\
You are a code repair engine. You receive a buggy function, possibly with file
context and a failure description, and output the corrected version.

Rules:
- Output the complete corrected function. Raw source code only.
- No markdown fences. No explanations. No commentary.
- Preserve the original naming and formatting wherever the fix allows.";

// Sampling parameters the completion model was tuned with.
const COMPLETION_TEMPERATURE: f64 = 0.7;

#[derive(Debug, clap::Parser)]
#[command(name = "gen")]
#[command(about = "Run the generation models from the command line")]
pub struct App {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, clap::Subcommand)]
pub enum Commands {
    /// Complete a partial function using the completion model
    #[clap(name = "complete")]
    Complete(CompleteOptions),

    /// Rewrite a buggy function using the bugfix model
    #[clap(name = "fix")]
    Fix(FixOptions),
}

/// Post-processing applied to decoded model output.
#[derive(Debug, Clone, clap::ValueEnum, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostProcessArg {
    /// Keep output through the first balanced-brace block (default)
    Trim,
    /// Strip the echoed prompt, keep only the continuation
    StripPrompt,
    /// Return decoded output untouched
    None,
}

impl From<PostProcessArg> for PostProcess {
    fn from(p: PostProcessArg) -> Self {
        match p {
            PostProcessArg::Trim => PostProcess::TrimBraces,
            PostProcessArg::StripPrompt => PostProcess::StripPrompt,
            PostProcessArg::None => PostProcess::PassThrough,
        }
    }
}

#[derive(Debug, Clone, clap::Args)]
pub struct ModelOptions {
    /// Ollama base URL
    #[clap(long, env = "OLLAMA_URL", default_value = "http://localhost:11434")]
    pub ollama_url: String,

    /// Maximum number of generated tokens
    #[clap(long, env = "CODEFIX_MAX_TOKENS", default_value = "350")]
    pub max_tokens: u64,

    /// Post-processing applied to the decoded output
    #[clap(long, env = "CODEFIX_POST_PROCESS", value_enum, default_value = "trim")]
    pub post_process: PostProcessArg,
}

#[derive(Debug, clap::Parser)]
pub struct CompleteOptions {
    /// Path to the file holding the code prefix, or "-" for stdin
    pub input: String,

    /// Model name for code completion
    #[clap(long, env = "CODEFIX_COMPLETION_MODEL", default_value = "codegen-350m")]
    pub model: String,

    #[clap(flatten)]
    pub model_options: ModelOptions,
}

#[derive(Debug, clap::Parser)]
pub struct FixOptions {
    /// Path to the file holding the buggy code, or "-" for stdin
    pub input: String,

    /// Description of the observed failure
    #[clap(long)]
    pub context: Option<String>,

    /// File paths to include as context
    #[clap(long)]
    pub files: Vec<String>,

    /// Model name for bugfix rewriting
    #[clap(long, env = "CODEFIX_BUGFIX_MODEL", default_value = "codet5p-bugfix")]
    pub model: String,

    #[clap(flatten)]
    pub model_options: ModelOptions,
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    match app.command {
        Commands::Complete(options) => complete(options, global).await,
        Commands::Fix(options) => fix(options, global).await,
    }
}

fn create_client(ollama_url: &str) -> Result<ollama::Client> {
    use rig::client::Nothing;

    ollama::Client::builder()
        .api_key(Nothing)
        .base_url(ollama_url)
        .build()
        .map_err(|e| eyre!("Failed to create Ollama client: {}", e))
}

async fn complete(options: CompleteOptions, global: crate::Global) -> Result<()> {
    let code = read_input(&options.input).await?;

    if global.verbose {
        anstream::eprintln!("Ollama URL: {}", options.model_options.ollama_url);
        anstream::eprintln!("Model: {}", options.model);
        anstream::eprintln!("Prefix length: {} chars", code.len());
    }

    let result = complete_code_data(
        &code,
        &options.model,
        &options.model_options,
        options.model_options.post_process.clone().into(),
    )
    .await?;

    println!("{}", result);

    Ok(())
}

async fn fix(options: FixOptions, global: crate::Global) -> Result<()> {
    let code = read_input(&options.input).await?;
    let files = read_context_files(&options.files).await?;

    let request = BugfixRequest {
        code,
        context: options.context,
        files,
    };

    if global.verbose {
        anstream::eprintln!("Ollama URL: {}", options.model_options.ollama_url);
        anstream::eprintln!("Model: {}", options.model);
        anstream::eprintln!("Context files: {}", request.files.len());
    }

    let result = fix_code_data(
        &request,
        &options.model,
        &options.model_options,
        options.model_options.post_process.clone().into(),
    )
    .await?;

    println!("{}", result);

    Ok(())
}

/// Run the completion model and return the post-processed result (shared with
/// the HTTP server).
pub async fn complete_code_data(
    code: &str,
    model: &str,
    options: &ModelOptions,
    policy: PostProcess,
) -> Result<String> {
    let client = create_client(&options.ollama_url)?;
    let agent = client
        .agent(model)
        .preamble(COMPLETION_PREAMBLE)
        .temperature(COMPLETION_TEMPERATURE)
        .max_tokens(options.max_tokens)
        .build();

    let continuation = agent
        .prompt(code)
        .await
        .map_err(|e| eyre!("Model generation failed: {}", e))?;

    // A raw causal decode echoes its prompt before the continuation, and the
    // post-processing policies are defined over that full stream. Chat-style
    // backends return only the continuation, so put the prefix back unless the
    // model echoed it itself.
    let decoded = rebuild_decoded(code, &continuation);

    Ok(apply(policy, code, &decoded))
}

/// Run the bugfix model and return the post-processed result (shared with the
/// HTTP server).
pub async fn fix_code_data(
    request: &BugfixRequest,
    model: &str,
    options: &ModelOptions,
    policy: PostProcess,
) -> Result<String> {
    let prompt = build_bugfix_prompt(request);

    let client = create_client(&options.ollama_url)?;
    let agent = client
        .agent(model)
        .preamble(BUGFIX_PREAMBLE)
        .max_tokens(options.max_tokens)
        .build();

    // Seq2seq output does not echo its input, so the decode is used as-is.
    let decoded = agent
        .prompt(&prompt)
        .await
        .map_err(|e| eyre!("Model generation failed: {}", e))?;

    Ok(apply(policy, &prompt, &decoded))
}

fn rebuild_decoded(prompt: &str, continuation: &str) -> String {
    if continuation.starts_with(prompt) {
        continuation.to_string()
    } else {
        format!("{prompt}{continuation}")
    }
}

async fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut buffer = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buffer)
            .await
            .map_err(|e| eyre!("Failed to read stdin: {}", e))?;
        Ok(buffer)
    } else {
        tokio::fs::read_to_string(input)
            .await
            .map_err(|e| eyre!("Failed to read file '{}': {}", input, e))
    }
}

async fn read_context_files(paths: &[String]) -> Result<Vec<FileContent>> {
    let mut files = Vec::new();
    for path in paths {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| eyre!("Failed to read file '{}': {}", path, e))?;
        files.push(FileContent {
            path: path.clone(),
            content,
        });
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_rebuild_decoded_appends_missing_prefix() {
        assert_eq!(
            rebuild_decoded("int f() {", "\n    return 1;\n}"),
            "int f() {\n    return 1;\n}"
        );
    }

    #[test]
    fn test_rebuild_decoded_keeps_echoed_prefix() {
        let echoed = "int f() {\n    return 1;\n}";
        assert_eq!(rebuild_decoded("int f() {", echoed), echoed);
    }

    #[test]
    fn test_post_process_arg_conversion() {
        assert_eq!(PostProcess::from(PostProcessArg::Trim), PostProcess::TrimBraces);
        assert_eq!(
            PostProcess::from(PostProcessArg::StripPrompt),
            PostProcess::StripPrompt
        );
        assert_eq!(PostProcess::from(PostProcessArg::None), PostProcess::PassThrough);
    }

    #[tokio::test]
    async fn test_read_context_files() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "struct node;").unwrap();
        let path = file.path().to_string_lossy().to_string();

        let files = read_context_files(&[path.clone()]).await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, path);
        assert_eq!(files[0].content, "struct node;");
    }

    #[tokio::test]
    async fn test_read_context_files_missing_path() {
        let result = read_context_files(&["/definitely/not/here.c".to_string()]).await;
        assert!(result.is_err());
    }
}
