//! Vessel state blocks in scenario files.
//!
//! A block is a sequence of `KEY value` lines. Keys are matched without
//! regard to case; the value is the rest of the line after the first run
//! of whitespace. Line order is kept so unrecognised lines can be handed
//! back to the host untouched.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScenarioBlock {
    lines: Vec<(String, String)>,
}

impl ScenarioBlock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(text: &str) -> Self {
        let lines = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(|l| match l.split_once(char::is_whitespace) {
                Some((k, v)) => (k.to_string(), v.trim().to_string()),
                None => (l.to_string(), String::new()),
            })
            .collect();
        Self { lines }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.lines
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Parse the value of `key`. Absent keys give `Ok(None)`.
    pub fn parse_value<T: FromStr>(&self, key: &str) -> Result<Option<T>> {
        let Some(raw) = self.get(key) else {
            return Ok(None);
        };
        // only the first token carries the value
        let token = raw.split_whitespace().next().unwrap_or("");
        token.parse().map(Some).map_err(|_| Error::ScenarioValue {
            key: key.to_string(),
            value: raw.to_string(),
        })
    }

    /// Append a line, replacing an existing line with the same key.
    pub fn set(&mut self, key: &str, value: impl fmt::Display) {
        let value = value.to_string();
        match self.lines.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(key)) {
            Some(line) => line.1 = value,
            None => self.lines.push((key.to_string(), value)),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Lines whose key is not in `known`, in original order.
    pub fn unhandled(&self, known: &[&str]) -> ScenarioBlock {
        let lines = self
            .lines
            .iter()
            .filter(|(k, _)| !known.iter().any(|n| k.eq_ignore_ascii_case(n)))
            .cloned()
            .collect();
        ScenarioBlock { lines }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.lines.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for ScenarioBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (k, v) in &self.lines {
            if v.is_empty() {
                writeln!(f, "  {k}")?;
            } else {
                writeln!(f, "  {k} {v}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "
        STATUS Landed Earth
        CONFIGURATION 1
        MET 50.000
        NAVFREQ 0 0
    ";

    #[test]
    fn typed_lookup() {
        let b = ScenarioBlock::parse(TEXT);
        assert_eq!(b.parse_value::<i64>("configuration").unwrap(), Some(1));
        assert_eq!(b.parse_value::<f64>("MET").unwrap(), Some(50.0));
        assert_eq!(b.parse_value::<f64>("TANKCONFIG").unwrap(), None);
        assert_eq!(b.get("STATUS"), Some("Landed Earth"));
    }

    #[test]
    fn bad_number_is_reported_with_key() {
        let b = ScenarioBlock::parse("MET soon");
        let err = b.parse_value::<f64>("MET").unwrap_err();
        assert!(matches!(err, Error::ScenarioValue { ref key, .. } if key == "MET"));
    }

    #[test]
    fn unhandled_lines_keep_order() {
        let b = ScenarioBlock::parse(TEXT);
        let rest = b.unhandled(&["CONFIGURATION", "MET"]);
        let keys: Vec<_> = rest.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["STATUS", "NAVFREQ"]);
    }

    #[test]
    fn set_replaces_and_writes() {
        let mut b = ScenarioBlock::new();
        b.set("CONFIGURATION", 0);
        b.set("CONFIGURATION", 2);
        assert_eq!(b.len(), 1);
        assert_eq!(b.to_string(), "  CONFIGURATION 2\n");
    }
}
