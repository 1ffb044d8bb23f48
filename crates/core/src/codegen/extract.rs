/// Cut decoded model output at the end of the first complete function body.
///
/// A causal model does not stop generating when a function is done; it keeps
/// sampling until it runs out of tokens, usually starting a second function or
/// trailing garbage. This walks the decoded text line by line, counting `{`
/// and `}`, and keeps everything through the line on which the brace depth
/// first returns to zero after a block was opened.
///
/// If no block ever opens, or an opened block never closes, the whole input is
/// returned. The result is trimmed of surrounding whitespace in every case.
pub fn extract_first_block(decoded: &str) -> String {
    let mut depth: i64 = 0;
    let mut entered = false;
    let mut kept: Vec<&str> = Vec::new();

    for line in decoded.lines() {
        kept.push(line);

        let opens = line.matches('{').count();
        if opens > 0 {
            depth += opens as i64;
            entered = true;
        }

        let closes = line.matches('}').count();
        if closes > 0 {
            depth -= closes as i64;
            // Opens are counted before closes, so a line like `{}` both
            // enters the block and completes it.
            if entered && depth == 0 {
                break;
            }
        }
    }

    kept.join("\n").trim().to_string()
}

/// Remove a prompt echoed back at the start of decoded output.
///
/// Causal decodes contain the prompt verbatim before the continuation. If the
/// decoded text starts with the prompt, only the continuation is kept;
/// otherwise the text is returned unchanged. Trimmed either way.
pub fn strip_echoed_prompt(decoded: &str, prompt: &str) -> String {
    decoded
        .strip_prefix(prompt)
        .unwrap_or(decoded)
        .trim()
        .to_string()
}
