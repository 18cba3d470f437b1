//! Recognition of bare RFC 5322 addr-specs (`local@domain`).
//!
//! Only the address grammar is handled here: display names, angle brackets,
//! comments and folding whitespace are not accepted. The parser returns the
//! canonical rendering of the address, which differs from the input whenever
//! the local part is quoted.

/// Parses `input` as a single addr-spec and returns its canonical rendering.
///
/// Returns `None` if `input` is not exactly one address.
///
/// # Example
/// ```
/// use certgen::mailbox::parse_addr_spec;
///
/// assert_eq!(parse_addr_spec("admin@example.com").as_deref(), Some("admin@example.com"));
/// assert_eq!(parse_addr_spec("\"admin\"@example.com").as_deref(), Some("admin@example.com"));
/// assert_eq!(parse_addr_spec("Admin <admin@example.com>"), None);
/// ```
pub fn parse_addr_spec(input: &str) -> Option<String> {
    let (local, rest) = if input.starts_with('"') {
        consume_quoted_string(input)?
    } else {
        consume_dot_atom(input)?
    };

    let rest = rest.strip_prefix('@')?;

    let (domain, rest) = if rest.starts_with('[') {
        consume_domain_literal(rest)?
    } else {
        consume_dot_atom(rest)?
    };

    if !rest.is_empty() || local.is_empty() {
        return None;
    }

    Some(format!("{local}@{domain}"))
}

fn is_atext(c: char) -> bool {
    match c {
        '(' | ')' | '<' | '>' | '[' | ']' | ':' | ';' | '@' | '\\' | ',' | '"' | '.' => false,
        c if c.is_ascii() => c.is_ascii_graphic(),
        _ => true,
    }
}

fn is_dtext(c: char) -> bool {
    match c {
        '[' | ']' | '\\' => false,
        c if c.is_ascii() => c.is_ascii_graphic(),
        _ => true,
    }
}

/// Consumes a dot-atom: atext runs separated by single dots.
fn consume_dot_atom(input: &str) -> Option<(String, &str)> {
    let end = input
        .char_indices()
        .find(|&(_, c)| !(is_atext(c) || c == '.'))
        .map_or(input.len(), |(i, _)| i);
    let atom = &input[..end];

    if atom.is_empty() || atom.starts_with('.') || atom.ends_with('.') || atom.contains("..") {
        return None;
    }

    Some((atom.to_string(), &input[end..]))
}

/// Consumes a quoted-string and returns its unquoted content.
fn consume_quoted_string(input: &str) -> Option<(String, &str)> {
    let mut content = String::new();
    let mut chars = input.char_indices().skip(1);

    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return Some((content, &input[i + 1..])),
            '\\' => {
                let (_, escaped) = chars.next()?;
                content.push(escaped);
            }
            ' ' | '\t' => content.push(c),
            c if c.is_ascii_control() => return None,
            c => content.push(c),
        }
    }

    None
}

/// Consumes a domain-literal, keeping the brackets.
fn consume_domain_literal(input: &str) -> Option<(String, &str)> {
    let close = input.find(']')?;
    let inner = &input[1..close];

    if !inner.chars().all(is_dtext) {
        return None;
    }

    Some((format!("[{inner}]"), &input[close + 1..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_addresses() {
        for addr in [
            "admin@example.com",
            "first.last@sub.example.org",
            "user+tag@localhost",
            "o'brien@example.ie",
            "josé@example.es",
            "ops@[192.168.0.1]",
        ] {
            assert_eq!(parse_addr_spec(addr).as_deref(), Some(addr), "{addr}");
        }
    }

    #[test]
    fn quoted_local_part_renders_unquoted() {
        assert_eq!(
            parse_addr_spec("\"john doe\"@example.com").as_deref(),
            Some("john doe@example.com")
        );
        assert_eq!(
            parse_addr_spec("\"a\\\"b\"@example.com").as_deref(),
            Some("a\"b@example.com")
        );
        assert_eq!(parse_addr_spec("\"\"@example.com"), None);
    }

    #[test]
    fn rejects_non_addresses() {
        for input in [
            "",
            "example.com",
            "*.example.com",
            "@example.com",
            "admin@",
            ".admin@example.com",
            "admin.@example.com",
            "ad..min@example.com",
            "admin@example..com",
            "admin@example.com.",
            "a@b@c",
            "Admin <admin@example.com>",
            "admin@example.com (Admin)",
            "admin @example.com",
            "mailto:admin@example.com",
            "ops@[192.168.0.1",
            "\"unterminated@example.com",
        ] {
            assert_eq!(parse_addr_spec(input), None, "{input}");
        }
    }
}
