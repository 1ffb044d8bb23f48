use super::types::BugfixRequest;

/// Build the bugfix model prompt from a repair request.
///
/// Assembles file context, the optional failure description, and the buggy
/// code into a single prompt string suitable for sending to the model.
pub fn build_bugfix_prompt(request: &BugfixRequest) -> String {
    let mut parts = Vec::new();

    for file in &request.files {
        parts.push(format!("// {}\n{}", file.path, file.content));
    }

    if let Some(ctx) = &request.context {
        parts.push(format!("// Observed failure\n// {}", ctx));
    }

    parts.push(format!("// Buggy code\n{}", request.code));

    parts.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::types::FileContent;

    #[test]
    fn test_code_only() {
        let request = BugfixRequest {
            code: "int div(int a, int b) { return a / b; }".to_string(),
            context: None,
            files: vec![],
        };

        let prompt = build_bugfix_prompt(&request);
        assert_eq!(
            prompt,
            "// Buggy code\nint div(int a, int b) { return a / b; }"
        );
    }

    #[test]
    fn test_files_and_context_precede_code() {
        let request = BugfixRequest {
            code: "return head->next;".to_string(),
            context: Some("segfaults on empty list".to_string()),
            files: vec![
                FileContent {
                    path: "list.h".to_string(),
                    content: "struct node { struct node *next; };".to_string(),
                },
                FileContent {
                    path: "list.c".to_string(),
                    content: "#include \"list.h\"".to_string(),
                },
            ],
        };

        let prompt = build_bugfix_prompt(&request);
        assert!(prompt.contains("// list.h\nstruct node { struct node *next; };"));
        assert!(prompt.contains("// list.c\n#include \"list.h\""));
        assert!(prompt.contains("// Observed failure\n// segfaults on empty list"));
        assert!(prompt.ends_with("// Buggy code\nreturn head->next;"));
    }

    #[test]
    fn test_special_characters_preserved() {
        let request = BugfixRequest {
            code: r#"printf("%d\n", *p);"#.to_string(),
            context: None,
            files: vec![],
        };

        let prompt = build_bugfix_prompt(&request);
        assert!(prompt.contains(r#"printf("%d\n", *p);"#));
    }
}
