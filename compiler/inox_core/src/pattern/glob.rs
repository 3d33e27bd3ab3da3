//! Glob matching for path, host and URL patterns.
//!
//! `*` matches a run of characters without the separator, `**` any run,
//! `?` one non-separator character and `[...]` a character class (ranges with
//! `-`, negation with `!` or `^`). A path or URL pattern ending with `/...` is
//! a prefix pattern: it matches everything below the prefix.

const PREFIX_SUFFIX: &str = "/...";

/// Whether `text` matches the glob `pattern`.
pub fn glob_match(pattern: &str, text: &str, separator: char) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();
    match_from(&pattern, &text, separator)
}

fn match_from(pattern: &[char], text: &[char], separator: char) -> bool {
    let Some((&first, rest)) = pattern.split_first() else {
        return text.is_empty();
    };
    match first {
        '*' => {
            if rest.first() == Some(&'*') {
                let rest = &rest[1..];
                (0..=text.len()).any(|i| match_from(rest, &text[i..], separator))
            } else {
                let limit = text
                    .iter()
                    .position(|c| *c == separator)
                    .unwrap_or(text.len());
                (0..=limit).any(|i| match_from(rest, &text[i..], separator))
            }
        }
        '?' => match text.split_first() {
            Some((&c, text_rest)) if c != separator => match_from(rest, text_rest, separator),
            _ => false,
        },
        '[' => {
            let Some((&c, text_rest)) = text.split_first() else {
                return false;
            };
            match parse_class(rest) {
                Some((matches, after)) => matches(c) && match_from(after, text_rest, separator),
                // An unterminated class is a literal bracket.
                None => c == '[' && match_from(rest, text_rest, separator),
            }
        }
        '\\' if !rest.is_empty() => match text.split_first() {
            Some((&c, text_rest)) if c == rest[0] => match_from(&rest[1..], text_rest, separator),
            _ => false,
        },
        literal => match text.split_first() {
            Some((&c, text_rest)) if c == literal => match_from(rest, text_rest, separator),
            _ => false,
        },
    }
}

/// Parses the class body after `[`; returns a matcher and the remaining
/// pattern.
#[allow(clippy::type_complexity, reason = "local helper signature")]
fn parse_class(body: &[char]) -> Option<(Box<dyn Fn(char) -> bool>, &[char])> {
    let (negated, mut i) = match body.first() {
        Some('!' | '^') => (true, 1),
        _ => (false, 0),
    };
    let mut ranges: Vec<(char, char)> = Vec::new();
    let mut first = true;
    while i < body.len() {
        let c = body[i];
        if c == ']' && !first {
            let after = &body[i + 1..];
            return Some((
                Box::new(move |x| {
                    ranges.iter().any(|(lo, hi)| *lo <= x && x <= *hi) != negated
                }),
                after,
            ));
        }
        first = false;
        if i + 2 < body.len() && body[i + 1] == '-' && body[i + 2] != ']' {
            ranges.push((c, body[i + 2]));
            i += 3;
        } else {
            ranges.push((c, c));
            i += 1;
        }
    }
    None
}

/// Whether the glob has any special character.
pub fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

pub fn is_prefix_pattern(pattern: &str) -> bool {
    pattern.ends_with(PREFIX_SUFFIX)
}

/// Prefix of a `/...` pattern, keeping the trailing slash.
fn prefix_of(pattern: &str) -> &str {
    &pattern[..pattern.len() - PREFIX_SUFFIX.len() + 1]
}

pub fn path_pattern_matches(pattern: &str, path: &str) -> bool {
    if is_prefix_pattern(pattern) {
        return path.starts_with(prefix_of(pattern));
    }
    glob_match(pattern, path, '/')
}

/// Whether every path matched by `other` is matched by `pattern`.
pub fn path_pattern_includes(pattern: &str, other: &str) -> bool {
    if pattern == other {
        return true;
    }
    if is_prefix_pattern(pattern) {
        let prefix = prefix_of(pattern);
        return if is_prefix_pattern(other) {
            prefix_of(other).starts_with(prefix)
        } else {
            other.starts_with(prefix)
        };
    }
    !is_glob(other) && !is_prefix_pattern(other) && glob_match(pattern, other, '/')
}

/// Host patterns glob over the whole `scheme://name[:port]` text with `.` as
/// separator, so `https://*.example.com` matches one label.
pub fn host_pattern_matches(pattern: &str, host: &str) -> bool {
    match (pattern.split_once("://"), host.split_once("://")) {
        (Some((pattern_scheme, pattern_rest)), Some((scheme, rest))) => {
            (pattern_scheme == scheme || pattern_scheme == "*")
                && glob_match(pattern_rest, rest, '.')
        }
        (None, None) => glob_match(pattern, host, '.'),
        (None, Some((_, rest))) => glob_match(pattern, rest, '.'),
        (Some(_), None) => false,
    }
}

pub fn url_pattern_matches(pattern: &str, url: &str) -> bool {
    if is_prefix_pattern(pattern) {
        return url.starts_with(prefix_of(pattern));
    }
    glob_match(pattern, url, '/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn star_stops_at_the_separator() {
        assert!(glob_match("/a/*", "/a/b", '/'));
        assert!(!glob_match("/a/*", "/a/b/c", '/'));
        assert!(glob_match("/a/**", "/a/b/c", '/'));
        assert!(glob_match("/a/*.txt", "/a/file.txt", '/'));
    }

    #[test]
    fn classes_and_single_characters() {
        assert!(glob_match("/[a-c]?", "/bx", '/'));
        assert!(!glob_match("/[a-c]?", "/dx", '/'));
        assert!(glob_match("/[!a-c]", "/d", '/'));
        assert!(glob_match("/\\*", "/*", '/'));
        assert!(!glob_match("/\\*", "/a", '/'));
    }

    #[test]
    fn prefix_patterns() {
        assert!(path_pattern_matches("/home/...", "/home/user/file"));
        assert!(path_pattern_matches("/home/...", "/home/"));
        assert!(!path_pattern_matches("/home/...", "/etc/passwd"));
        assert!(path_pattern_includes("/home/...", "/home/user/..."));
        assert!(path_pattern_includes("/home/...", "/home/user/*.txt"));
        assert!(!path_pattern_includes("/home/user/...", "/home/..."));
        assert!(path_pattern_includes("/a/*", "/a/b"));
        assert!(!path_pattern_includes("/a/*", "/a/*.txt"));
    }

    #[test]
    fn hosts_match_by_label() {
        assert!(host_pattern_matches("https://*.example.com", "https://api.example.com"));
        assert!(!host_pattern_matches("https://*.example.com", "https://a.b.example.com"));
        assert!(host_pattern_matches("https://**.example.com", "https://a.b.example.com"));
        assert!(!host_pattern_matches("https://*.example.com", "http://api.example.com"));
    }

    #[test]
    fn urls() {
        assert!(url_pattern_matches("https://example.com/...", "https://example.com/a/b"));
        assert!(url_pattern_matches("https://example.com/*", "https://example.com/a"));
        assert!(!url_pattern_matches("https://example.com/*", "https://example.com/a/b"));
    }
}
