//! Delimiter-aware splitting of legend bodies.
//!
//! A legend body is a comma-separated list of atoms whose overrides may
//! themselves contain commas inside `{}`, `()` or strings. Property blocks
//! are semicolon-separated and only strings can hide a semicolon.

/// Splitter error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SplitError {
    /// Input ended with delimiters still open.
    #[error("unbalanced delimiters at end of line (unclosed: {unclosed})")]
    MalformedLine {
        /// Opening delimiters still open, outermost first.
        unclosed: String,
    },
}

fn opener_for(closer: char) -> char {
    match closer {
        '}' => '{',
        ')' => '(',
        other => other,
    }
}

/// Split a legend body into top-level atom chunks.
///
/// Commas only separate chunks when no `{`, `(` or `"` is open. A backslash
/// escapes the next character. Chunks are trimmed; empty chunks are dropped.
pub fn split_atoms(line: &str) -> Result<Vec<String>, SplitError> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    // Expected closing characters, innermost last.
    let mut open: Vec<char> = Vec::new();
    let mut escaped = false;

    for ch in line.chars() {
        if escaped {
            escaped = false;
            current.push(ch);
            continue;
        }
        let in_string = open.last() == Some(&'"');
        match ch {
            '\\' => escaped = true,
            '"' if in_string => {
                open.pop();
            }
            '"' => open.push('"'),
            '{' if !in_string => open.push('}'),
            '(' if !in_string => open.push(')'),
            '}' | ')' if !in_string && open.last() == Some(&ch) => {
                open.pop();
            }
            ',' if open.is_empty() => {
                push_chunk(&mut chunks, &mut current);
                continue;
            }
            _ => {}
        }
        current.push(ch);
    }

    if !open.is_empty() {
        return Err(SplitError::MalformedLine {
            unclosed: open.iter().map(|&c| opener_for(c)).collect(),
        });
    }
    push_chunk(&mut chunks, &mut current);
    Ok(chunks)
}

/// Split the inside of an override block into `key = value` assignments.
///
/// Semicolons inside a double-quoted string do not split.
pub fn split_properties(body: &str) -> Vec<String> {
    let mut props = Vec::new();
    let mut current = String::new();
    let mut in_string = false;
    let mut escaped = false;

    for ch in body.chars() {
        if escaped {
            escaped = false;
            current.push(ch);
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '"' => in_string = !in_string,
            ';' if !in_string => {
                push_chunk(&mut props, &mut current);
                continue;
            }
            _ => {}
        }
        current.push(ch);
    }
    push_chunk(&mut props, &mut current);
    props
}

fn push_chunk(out: &mut Vec<String>, current: &mut String) {
    let chunk = current.trim();
    if !chunk.is_empty() {
        out.push(chunk.to_string());
    }
    current.clear();
}
