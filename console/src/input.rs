use std::{iter::Peekable, str::Chars};

/// Longest line the console accepts from a terminal.
pub const MAX_LINE_BYTES: usize = 256;

/// Removes ANSI escape sequences and control characters from raw terminal
/// input, so pasted colour codes or bells never reach the tokenizer.
pub fn sanitize(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\x1b' {
            skip_control_sequence(&mut chars);
        } else if !c.is_control() {
            output.push(c);
        }
    }

    output
}

// CSI: `ESC [`, parameter bytes 0x30..=0x3F, then one final byte 0x40..=0x7E.
fn skip_control_sequence(chars: &mut Peekable<Chars<'_>>) {
    if chars.next_if_eq(&'[').is_none() {
        return;
    }

    while chars.next_if(|p| ('\x30'..='\x3f').contains(p)).is_some() {}
    chars.next_if(|f| ('\x40'..='\x7e').contains(f));
}
