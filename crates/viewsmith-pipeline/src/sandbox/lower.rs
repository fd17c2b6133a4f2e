//! Markup lowering
//!
//! The evaluation engine speaks JavaScript, not JSX. This pass rewrites
//! markup regions of a normalized unit into template literals so the unit
//! becomes plain evaluable JavaScript whose entry declaration returns the
//! markup-text projection shown in the preview:
//!
//! - child expressions `{expr}` become `${expr}` interpolations (nested
//!   markup inside them is lowered recursively),
//! - event-handler attributes (`onClick={...}` and friends) are dropped -
//!   a stringified closure adds nothing to a preview,
//! - other braced attribute values (`style={{...}}`) are kept as literal
//!   text.
//!
//! Markup detection is positional, not a parse: a `<` opens markup only
//! where an expression may start. This is best effort by design; anything
//! the scanner gets wrong surfaces as a contained evaluation error, never
//! as a crash.

/// Lower every markup region of a unit into template literals.
pub fn lower_unit(source: &str) -> String {
    let chars: Vec<char> = source.chars().collect();
    lower_js(&chars)
}

/// Characters after which a `<` starts markup rather than a comparison.
const MARKUP_PRECEDERS: &str = "(,=?:&|;{[!";

fn lower_js(chars: &[char]) -> String {
    let mut out = String::with_capacity(chars.len());
    let mut i = 0;
    let mut prev_sig: Option<char> = None;
    let mut prev_prev_sig: Option<char> = None;
    let mut word = String::new();

    while i < chars.len() {
        let c = chars[i];

        // Comments pass through untouched and are invisible to markup
        // detection, so `return ( // note` still opens markup on the next
        // line.
        if c == '/' && i + 1 < chars.len() && (chars[i + 1] == '/' || chars[i + 1] == '*') {
            i = copy_comment(chars, i, &mut out);
            continue;
        }

        // String literals pass through untouched.
        if c == '"' || c == '\'' || c == '`' {
            i = copy_string(chars, i, &mut out);
            prev_prev_sig = prev_sig;
            prev_sig = Some(c);
            word.clear();
            continue;
        }

        if c == '<'
            && markup_follows(chars, i)
            && markup_can_start(prev_sig, prev_prev_sig, &word)
        {
            let (literal, next) = lower_markup(chars, i);
            out.push_str(&literal);
            i = next;
            // A template literal behaves like a closed operand.
            prev_prev_sig = prev_sig;
            prev_sig = Some('`');
            word.clear();
            continue;
        }

        out.push(c);
        if c.is_alphanumeric() || c == '_' || c == '$' {
            word.push(c);
        } else if !c.is_whitespace() {
            word.clear();
        }
        if !c.is_whitespace() {
            prev_prev_sig = prev_sig;
            prev_sig = Some(c);
        }
        i += 1;
    }

    out
}

/// Is the `<` at `i` followed by something tag-like?
fn markup_follows(chars: &[char], i: usize) -> bool {
    matches!(chars.get(i + 1), Some(c) if c.is_alphabetic() || *c == '>')
}

/// May markup start here, given the previous significant characters and the
/// identifier immediately before the `<`?
fn markup_can_start(prev_sig: Option<char>, prev_prev_sig: Option<char>, word: &str) -> bool {
    match prev_sig {
        None => true,
        Some(c) if MARKUP_PRECEDERS.contains(c) => true,
        // `=>` arrow body; a plain `>` would be a comparison.
        Some('>') => prev_prev_sig == Some('='),
        Some(_) => word == "return",
    }
}

/// Push a char into a template literal, escaping what the literal reserves.
fn esc_push(out: &mut String, c: char) {
    match c {
        '`' => out.push_str("\\`"),
        '\\' => out.push_str("\\\\"),
        '$' => out.push_str("\\$"),
        _ => out.push(c),
    }
}

fn copy_comment(chars: &[char], mut i: usize, out: &mut String) -> usize {
    let block = chars[i + 1] == '*';
    out.push(chars[i]);
    out.push(chars[i + 1]);
    i += 2;
    while i < chars.len() {
        if block && chars[i] == '*' && chars.get(i + 1) == Some(&'/') {
            out.push_str("*/");
            return i + 2;
        }
        if !block && chars[i] == '\n' {
            out.push('\n');
            return i + 1;
        }
        out.push(chars[i]);
        i += 1;
    }
    i
}

fn copy_string(chars: &[char], mut i: usize, out: &mut String) -> usize {
    let quote = chars[i];
    out.push(quote);
    i += 1;
    while i < chars.len() {
        let c = chars[i];
        out.push(c);
        if c == '\\' {
            if let Some(next) = chars.get(i + 1) {
                out.push(*next);
            }
            i += 2;
            continue;
        }
        i += 1;
        if c == quote {
            break;
        }
    }
    i
}

/// Lower one markup region starting at the `<` at `start`. Returns the
/// template literal and the index after the region. Unterminated markup is
/// consumed to the end of input - the engine reports whatever that breaks.
fn lower_markup(chars: &[char], start: usize) -> (String, usize) {
    let mut out = String::from("`");
    let mut depth: usize = 0;
    let mut i = start;

    while i < chars.len() {
        let c = chars[i];

        if c == '<' && chars.get(i + 1) == Some(&'/') {
            // Closing tag.
            while i < chars.len() {
                esc_push(&mut out, chars[i]);
                i += 1;
                if chars[i - 1] == '>' {
                    break;
                }
            }
            if depth <= 1 {
                break;
            }
            depth -= 1;
            continue;
        }

        if c == '<' && markup_follows(chars, i) {
            let (self_closing, next) = lower_tag_header(chars, i, &mut out);
            i = next;
            if self_closing {
                if depth == 0 {
                    break;
                }
            } else {
                depth += 1;
            }
            continue;
        }

        if c == '{' {
            let (expr, next) = collect_balanced(chars, i);
            i = next;
            let trimmed = expr.trim();
            // Empty expressions and JSX comments project to nothing.
            if trimmed.is_empty() || (trimmed.starts_with("/*") && trimmed.ends_with("*/")) {
                continue;
            }
            let inner: Vec<char> = expr.chars().collect();
            out.push_str("${");
            out.push_str(&lower_js(&inner));
            out.push('}');
            continue;
        }

        esc_push(&mut out, c);
        i += 1;
    }

    out.push('`');
    (out, i)
}

/// Copy one tag header (`<name attr…>` or `<name attr…/>`), dropping
/// event-handler attributes. Returns whether the tag was self-closing and
/// the index after the closing `>`.
fn lower_tag_header(chars: &[char], mut i: usize, out: &mut String) -> (bool, usize) {
    esc_push(out, '<');
    i += 1;

    // Tag name (possibly empty for fragments, possibly dotted).
    while i < chars.len() {
        let c = chars[i];
        if c.is_alphanumeric() || c == '.' || c == '_' || c == '$' || c == '-' {
            esc_push(out, c);
            i += 1;
        } else {
            break;
        }
    }

    loop {
        if i >= chars.len() {
            return (false, i);
        }
        let c = chars[i];

        if c == '/' && chars.get(i + 1) == Some(&'>') {
            out.push_str("/>");
            return (true, i + 2);
        }
        if c == '>' {
            esc_push(out, '>');
            return (false, i + 1);
        }
        if c.is_whitespace() {
            esc_push(out, c);
            i += 1;
            continue;
        }

        // Attribute.
        let mut name = String::new();
        while i < chars.len() {
            let c = chars[i];
            if c.is_alphanumeric() || c == '-' || c == '_' || c == ':' || c == '$' {
                name.push(c);
                i += 1;
            } else {
                break;
            }
        }
        if name.is_empty() {
            // Not an attribute start; copy the char and move on.
            esc_push(out, c);
            i += 1;
            continue;
        }

        let is_handler = name.len() > 2
            && name.starts_with("on")
            && name.chars().nth(2).is_some_and(|c| c.is_ascii_uppercase());

        // Peek for a value.
        let mut j = i;
        while j < chars.len() && chars[j].is_whitespace() {
            j += 1;
        }
        let has_value = chars.get(j) == Some(&'=');

        if !has_value {
            if !is_handler {
                out.push_str(&name);
            }
            continue;
        }

        // Move past `=`.
        i = j + 1;
        while i < chars.len() && chars[i].is_whitespace() {
            i += 1;
        }

        match chars.get(i) {
            Some('{') => {
                let (value, next) = collect_balanced(chars, i);
                i = next;
                if !is_handler {
                    out.push_str(&name);
                    esc_push(out, '=');
                    esc_push(out, '{');
                    for c in value.chars() {
                        esc_push(out, c);
                    }
                    esc_push(out, '}');
                }
            }
            Some(q @ ('"' | '\'')) => {
                let quote = *q;
                let mut value = String::new();
                value.push(quote);
                i += 1;
                while i < chars.len() {
                    let c = chars[i];
                    value.push(c);
                    i += 1;
                    if c == quote {
                        break;
                    }
                }
                if !is_handler {
                    out.push_str(&name);
                    esc_push(out, '=');
                    for c in value.chars() {
                        esc_push(out, c);
                    }
                }
            }
            _ => {
                // Bare value: copy until whitespace or tag end.
                let mut value = String::new();
                while i < chars.len() {
                    let c = chars[i];
                    if c.is_whitespace() || c == '>' || (c == '/' && chars.get(i + 1) == Some(&'>')) {
                        break;
                    }
                    value.push(c);
                    i += 1;
                }
                if !is_handler {
                    out.push_str(&name);
                    esc_push(out, '=');
                    for c in value.chars() {
                        esc_push(out, c);
                    }
                }
            }
        }
    }
}

/// Collect the content of a balanced `{…}` group starting at `i`, honoring
/// string literals. Returns the inner content and the index after the
/// closing brace; unterminated groups run to end of input.
fn collect_balanced(chars: &[char], mut i: usize) -> (String, usize) {
    let mut content = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    while i < chars.len() {
        let c = chars[i];
        match quote {
            Some(q) => {
                if c == '\\' {
                    content.push(c);
                    if let Some(next) = chars.get(i + 1) {
                        content.push(*next);
                    }
                    i += 2;
                    continue;
                }
                if c == q {
                    quote = None;
                }
                content.push(c);
            }
            None => match c {
                '\'' | '"' | '`' => {
                    quote = Some(c);
                    content.push(c);
                }
                '{' => {
                    depth += 1;
                    if depth > 1 {
                        content.push(c);
                    }
                }
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return (content, i + 1);
                    }
                    content.push(c);
                }
                _ => content.push(c),
            },
        }
        i += 1;
    }

    (content, i)
}
