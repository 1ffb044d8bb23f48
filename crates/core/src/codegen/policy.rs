use std::str::FromStr;

use super::extract::{extract_first_block, strip_echoed_prompt};

/// What to do with decoded model output before handing it back to the caller.
///
/// The three policies correspond to the three deployment variants of the
/// service: trim at the first balanced-brace block, strip the echoed prompt,
/// or return the decode untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PostProcess {
    /// Keep output through the first balanced-brace block.
    TrimBraces,
    /// Drop the echoed prompt prefix, keep only the continuation.
    StripPrompt,
    /// Return the decoded text as-is, trimmed.
    PassThrough,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown post-process policy '{0}', expected one of: trim, strip-prompt, none")]
pub struct ParsePolicyError(String);

impl FromStr for PostProcess {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trim" | "trim-braces" => Ok(PostProcess::TrimBraces),
            "strip-prompt" => Ok(PostProcess::StripPrompt),
            "none" | "pass-through" => Ok(PostProcess::PassThrough),
            other => Err(ParsePolicyError(other.to_string())),
        }
    }
}

/// Apply a post-processing policy to decoded model output.
///
/// `prompt` is the text that was sent to the model; only `StripPrompt` looks
/// at it. Every policy trims surrounding whitespace from its result.
pub fn apply(policy: PostProcess, prompt: &str, decoded: &str) -> String {
    match policy {
        PostProcess::TrimBraces => extract_first_block(decoded),
        PostProcess::StripPrompt => strip_echoed_prompt(decoded, prompt),
        PostProcess::PassThrough => decoded.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DECODED: &str = "int add(int a, int b) {\n    return a + b;\n}\nint unused() {\n    return 0;\n}";

    #[test]
    fn test_trim_braces_policy() {
        assert_eq!(
            apply(PostProcess::TrimBraces, "int add(int a, int b) {", DECODED),
            "int add(int a, int b) {\n    return a + b;\n}"
        );
    }

    #[test]
    fn test_strip_prompt_policy() {
        let prompt = "int add(int a, int b) {";
        assert_eq!(
            apply(PostProcess::StripPrompt, prompt, DECODED),
            "return a + b;\n}\nint unused() {\n    return 0;\n}"
        );
    }

    #[test]
    fn test_pass_through_policy() {
        assert_eq!(apply(PostProcess::PassThrough, "ignored", "  x  "), "x");
    }

    #[test]
    fn test_parse_policy_names() {
        assert_eq!("trim".parse::<PostProcess>().unwrap(), PostProcess::TrimBraces);
        assert_eq!(
            "trim-braces".parse::<PostProcess>().unwrap(),
            PostProcess::TrimBraces
        );
        assert_eq!(
            "strip-prompt".parse::<PostProcess>().unwrap(),
            PostProcess::StripPrompt
        );
        assert_eq!("none".parse::<PostProcess>().unwrap(), PostProcess::PassThrough);
        assert_eq!(
            "pass-through".parse::<PostProcess>().unwrap(),
            PostProcess::PassThrough
        );
    }

    #[test]
    fn test_parse_policy_rejects_unknown() {
        let err = "bogus".parse::<PostProcess>().unwrap_err();
        assert!(err.to_string().contains("bogus"));
    }
}
