use std::mem;

/// Splits a console line into tokens.
///
/// Whitespace separates tokens except inside double quotes. Inside quotes,
/// `\"` is a literal quote and `\\` a literal backslash; any other backslash
/// is kept as is. An unterminated quote runs to the end of the line.
pub fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut token = String::new();
    let mut in_token = false; // Distinguishes `""` (an empty token) from no token.
    let mut quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if quoted {
            match c {
                '"' => quoted = false,
                '\\' if matches!(chars.peek(), Some(&'"') | Some(&'\\')) => {
                    token.extend(chars.next());
                }
                _ => token.push(c),
            }
        } else if c == '"' {
            quoted = true;
            in_token = true;
        } else if c.is_whitespace() {
            if in_token {
                tokens.push(mem::take(&mut token));
                in_token = false;
            }
        } else {
            token.push(c);
            in_token = true;
        }
    }

    if in_token {
        tokens.push(token);
    }

    tokens
}
