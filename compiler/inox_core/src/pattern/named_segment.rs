//! Named-segment path patterns (`%/users/{:id}/posts`).

use std::fmt;

use crate::value::Value;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathSegment {
    Static(String),
    /// Captures the text up to the next `/`.
    Named(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamedSegmentPathPattern {
    segments: Vec<PathSegment>,
}

impl NamedSegmentPathPattern {
    pub fn new(segments: Vec<PathSegment>) -> Self {
        NamedSegmentPathPattern { segments }
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Captured segments when `path` is matched, in pattern order.
    pub fn match_path(&self, path: &str) -> Option<Vec<(String, String)>> {
        let mut cursor = 0;
        let mut groups = Vec::new();
        let last = self.segments.len().checked_sub(1)?;

        for (index, segment) in self.segments.iter().enumerate() {
            let rest = path.get(cursor..)?;
            match segment {
                PathSegment::Static(text) => {
                    if !rest.starts_with(text.as_str()) {
                        return None;
                    }
                    cursor += text.len();
                }
                PathSegment::Named(name) => {
                    let end = match rest.find('/') {
                        Some(_) if index == last => return None,
                        Some(slash) => slash,
                        None => rest.len(),
                    };
                    if end == 0 {
                        return None;
                    }
                    groups.push((name.clone(), rest[..end].to_string()));
                    cursor += end;
                }
            }
        }
        (cursor == path.len()).then_some(groups)
    }

    /// Group object entries: `"0"` maps to the path, captures to strings.
    pub fn group_entries(&self, path: &str, groups: Vec<(String, String)>) -> Vec<(String, Value)> {
        let mut entries = vec![("0".to_string(), Value::path(path))];
        entries.extend(groups.into_iter().map(|(name, text)| (name, Value::str(text))));
        entries
    }
}

impl fmt::Display for NamedSegmentPathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("%")?;
        for segment in &self.segments {
            match segment {
                PathSegment::Static(text) => f.write_str(text)?,
                PathSegment::Named(name) => write!(f, "{{:{name}}}")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn users_posts() -> NamedSegmentPathPattern {
        NamedSegmentPathPattern::new(vec![
            PathSegment::Static("/users/".into()),
            PathSegment::Named("id".into()),
            PathSegment::Static("/posts/".into()),
            PathSegment::Named("post".into()),
        ])
    }

    #[test]
    fn captures_named_segments() {
        assert_eq!(
            users_posts().match_path("/users/42/posts/7"),
            Some(vec![
                ("id".to_string(), "42".to_string()),
                ("post".to_string(), "7".to_string())
            ])
        );
    }

    #[test]
    fn last_segment_cannot_span_directories() {
        assert_eq!(users_posts().match_path("/users/42/posts/7/8"), None);
        assert_eq!(users_posts().match_path("/users//posts/7"), None);
        assert_eq!(users_posts().match_path("/users/42/post/7"), None);
    }

    #[test]
    fn trailing_static_must_reach_the_end() {
        let pattern = NamedSegmentPathPattern::new(vec![
            PathSegment::Static("/a/".into()),
            PathSegment::Named("x".into()),
            PathSegment::Static("/".into()),
        ]);
        assert!(pattern.match_path("/a/b/").is_some());
        assert!(pattern.match_path("/a/b/c").is_none());
    }
}
