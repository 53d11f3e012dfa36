use std::collections::HashMap;

/// One result line of the session log:
/// `[<url>][<field2>][<field3>][<expression>][<value>]`.
///
/// The two middle fields carry data this crate does not interpret; they are
/// kept verbatim so a line can be written back unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLine {
    pub url: String,
    pub opaque: [String; 2],
    pub expression: String,
    pub value: String,
}

impl SessionLine {
    pub fn new(url: &str, expression: &str, value: &str) -> Self {
        Self {
            url: url.to_string(),
            opaque: [String::new(), String::new()],
            expression: expression.to_string(),
            value: value.to_string(),
        }
    }

    /// Parse a raw log line. Returns `None` unless the line splits into
    /// exactly five `][`-separated fields; partial writes and marker lines
    /// fall out here.
    pub fn parse(line: &str) -> Option<Self> {
        let fields: Vec<&str> = line.split("][").collect();
        let &[url, second, third, expression, value] = fields.as_slice() else {
            return None;
        };

        let url = url.strip_prefix('[').unwrap_or(url);
        // '\r' and '\n' are stripped independently, then the record's closing bracket
        let value = value.trim_end_matches(['\r', '\n']);
        let value = value.strip_suffix(']').unwrap_or(value);

        Some(Self {
            url: url.to_string(),
            opaque: [second.to_string(), third.to_string()],
            expression: expression.to_string(),
            value: value.to_string(),
        })
    }
}

impl std::fmt::Display for SessionLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}][{}][{}][{}][{}]",
            self.url, self.opaque[0], self.opaque[1], self.expression, self.value
        )
    }
}

/// Best-known value per `(url, expression)` recovered from the session log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResumedQueries {
    by_url: HashMap<String, HashMap<String, String>>,
}

impl ResumedQueries {
    /// Record `value` unless a strictly longer one is already known.
    ///
    /// Longer values from blind techniques confirm more characters, so an
    /// equal-length later entry replaces the earlier one and a shorter one
    /// is dropped. Returns whether `value` is now the stored one.
    pub fn merge(&mut self, url: &str, expression: &str, value: &str) -> bool {
        let expressions = self.by_url.entry(url.to_string()).or_default();
        match expressions.get_mut(expression) {
            None => {
                expressions.insert(expression.to_string(), value.to_string());
                true
            }
            Some(current) if value.chars().count() >= current.chars().count() => {
                *current = value.to_string();
                true
            }
            Some(_) => false,
        }
    }

    pub fn get(&self, url: &str, expression: &str) -> Option<&str> {
        self.by_url.get(url)?.get(expression).map(String::as_str)
    }

    pub fn for_url(&self, url: &str) -> Option<&HashMap<String, String>> {
        self.by_url.get(url)
    }

    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.by_url.keys().map(String::as_str)
    }

    /// Number of `(url, expression)` records.
    pub fn len(&self) -> usize {
        self.by_url.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_five_fields() {
        let line = SessionLine::parse("[http://x/][a][b][id][AAAA]\r\n").unwrap();
        assert_eq!(line.url, "http://x/");
        assert_eq!(line.opaque, ["a".to_string(), "b".to_string()]);
        assert_eq!(line.expression, "id");
        assert_eq!(line.value, "AAAA");
    }

    #[test]
    fn test_line_endings_stripped_independently() {
        let line = SessionLine::parse("[u][][][e][v]\n\r\n").unwrap();
        assert_eq!(line.value, "v");
        let line = SessionLine::parse("[u][][][e][v]\r").unwrap();
        assert_eq!(line.value, "v");
    }

    #[test]
    fn test_wrong_field_count_rejected() {
        assert!(SessionLine::parse("[u][][e][v]").is_none());
        assert!(SessionLine::parse("[u][][][][e][v]").is_none());
        assert!(SessionLine::parse("[12:00:00 10/18/26]").is_none());
        assert!(SessionLine::parse("").is_none());
    }

    #[test]
    fn test_empty_value_parses_empty() {
        let line = SessionLine::parse("[u][][][e][]").unwrap();
        assert!(line.value.is_empty());
    }

    #[test]
    fn test_display_preserves_opaque_fields() {
        let raw = "[http://x/][GET][id][DBMS][MySQL 5.0]";
        let line = SessionLine::parse(raw).unwrap();
        assert_eq!(line.to_string(), raw);
    }

    #[test]
    fn test_merge_longest_wins() {
        let mut queries = ResumedQueries::default();
        assert!(queries.merge("http://x/", "id", "AAAA"));
        assert!(!queries.merge("http://x/", "id", "AA"));
        assert_eq!(queries.get("http://x/", "id"), Some("AAAA"));
        assert!(queries.merge("http://x/", "id", "BBBB"));
        assert_eq!(queries.get("http://x/", "id"), Some("BBBB"));
        assert!(queries.merge("http://x/", "id", "CCCCC"));
        assert_eq!(queries.get("http://x/", "id"), Some("CCCCC"));
        assert_eq!(queries.len(), 1);
    }

    #[test]
    fn test_merge_keyed_per_url() {
        let mut queries = ResumedQueries::default();
        queries.merge("http://x/", "id", "1");
        queries.merge("x", "id", "22");
        assert_eq!(queries.get("http://x/", "id"), Some("1"));
        assert_eq!(queries.get("x", "id"), Some("22"));
        assert_eq!(queries.len(), 2);
        assert_eq!(queries.urls().count(), 2);
    }
}
