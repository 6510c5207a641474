//! Compiled predicate specs
//!
//! A spec is either a set of entries (exact names, wildcards, `/regex/flags`)
//! or a user callback. Strings are split on commas and whitespace unless the
//! whole string is a single regex literal.

use globset::{Glob, GlobSet, GlobSetBuilder};

use super::FilterError;
use crate::config::{split_regex_literal, Callback, CallbackInput, OptionValue, Pattern};

/// One compiled predicate axis.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Matches when any entry matches the whole subject.
    Entries {
        globs: GlobSet,
        patterns: Vec<Pattern>,
        source: String,
    },
    Callback(Callback),
}

impl Matcher {
    /// Compile the value of `axis`.
    pub fn compile(axis: &str, value: &OptionValue) -> Result<Self, FilterError> {
        let entries: Vec<String> = match value {
            OptionValue::Predicate(callback) => return Ok(Matcher::Callback(callback.clone())),
            OptionValue::Pattern(pattern) => {
                return Ok(Matcher::Entries {
                    globs: GlobSet::empty(),
                    source: pattern.source(),
                    patterns: vec![pattern.clone()],
                })
            }
            OptionValue::List(items) => items.clone(),
            OptionValue::Literal(_) | OptionValue::Data(_) => match value.as_str() {
                Some(text) => split_entries(text),
                None => {
                    return Err(FilterError::InvalidSpec {
                        axis: axis.to_string(),
                        message: format!("expected a string, list or function, got {}", value.kind_name()),
                    })
                }
            },
        };

        let mut builder = GlobSetBuilder::new();
        let mut patterns = Vec::new();
        for entry in &entries {
            match Pattern::parse(entry) {
                Some(Ok(pattern)) => patterns.push(pattern),
                Some(Err(e)) => {
                    return Err(FilterError::InvalidSpec {
                        axis: axis.to_string(),
                        message: e.to_string(),
                    })
                }
                None => {
                    let glob = Glob::new(entry).map_err(|e| FilterError::InvalidSpec {
                        axis: axis.to_string(),
                        message: e.to_string(),
                    })?;
                    builder.add(glob);
                }
            }
        }
        let globs = builder.build().map_err(|e| FilterError::InvalidSpec {
            axis: axis.to_string(),
            message: e.to_string(),
        })?;

        Ok(Matcher::Entries {
            globs,
            patterns,
            source: entries.join(","),
        })
    }

    /// True for an entry list with nothing in it, such as `--filter ""`.
    pub fn is_blank(&self) -> bool {
        match self {
            Matcher::Entries { globs, patterns, .. } => globs.is_empty() && patterns.is_empty(),
            Matcher::Callback(_) => false,
        }
    }

    /// Spec as written, for logs.
    pub fn describe(&self) -> String {
        match self {
            Matcher::Entries { source, .. } => source.clone(),
            Matcher::Callback(callback) => format!("{:?}", callback),
        }
    }

    /// Test `input` against this spec.
    pub fn is_match(&self, axis: &str, input: CallbackInput<'_>) -> Result<bool, FilterError> {
        match self {
            Matcher::Callback(callback) => callback.call(input).map_err(|e| FilterError::Callback {
                axis: axis.to_string(),
                subject: subject(input).to_string(),
                message: e.to_string(),
            }),
            Matcher::Entries { globs, patterns, .. } => {
                let text = subject(input);
                Ok(globs.is_match(text) || patterns.iter().any(|p| p.is_match(text)))
            }
        }
    }
}

fn subject<'a>(input: CallbackInput<'a>) -> &'a str {
    match input {
        CallbackInput::Name(s) | CallbackInput::Version(s) => s,
        CallbackInput::Result { name, .. } => name,
    }
}

/// `/a{1,2}/` is one entry even though it contains a comma; `/a/,/b/` is two.
fn is_single_regex(text: &str) -> bool {
    match split_regex_literal(text) {
        Some((pattern, _)) => !pattern.replace("\\/", "").contains('/'),
        None => false,
    }
}

/// Split a string spec into entries.
pub fn split_entries(text: &str) -> Vec<String> {
    let trimmed = text.trim();
    if is_single_regex(trimmed) {
        return vec![trimmed.to_string()];
    }
    trimmed
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name_matches(spec: &OptionValue, name: &str) -> bool {
        Matcher::compile("filter", spec)
            .unwrap()
            .is_match("filter", CallbackInput::Name(name))
            .unwrap()
    }

    #[test]
    fn test_split_entries() {
        assert_eq!(split_entries("a, b c"), vec!["a", "b", "c"]);
        assert_eq!(split_entries("/^a{1,2}$/"), vec!["/^a{1,2}$/"]);
        assert_eq!(split_entries("/a/,/b/"), vec!["/a/", "/b/"]);
        assert_eq!(split_entries("  "), Vec::<String>::new());
    }

    #[test]
    fn test_exact_name() {
        let spec = OptionValue::string("ncu-test-v2");
        assert!(name_matches(&spec, "ncu-test-v2"));
        assert!(!name_matches(&spec, "ncu-test-tag"));
        assert!(!name_matches(&spec, "ncu-test-v2-extra"));
    }

    #[test]
    fn test_list_and_wildcards() {
        let spec = OptionValue::string("lodash, @types/*");
        assert!(name_matches(&spec, "lodash"));
        assert!(name_matches(&spec, "@types/node"));
        assert!(!name_matches(&spec, "@babel/core"));

        let list = OptionValue::List(vec!["ncu-*".into(), "react".into()]);
        assert!(name_matches(&list, "ncu-test-tag"));
        assert!(name_matches(&list, "react"));
        assert!(!name_matches(&list, "react-dom"));
    }

    #[test]
    fn test_regex_entries() {
        let spec = OptionValue::string("/^ncu-test-V/i");
        assert!(name_matches(&spec, "ncu-test-v2"));
        assert!(!name_matches(&spec, "ncu-test-tag"));

        let mixed = OptionValue::string("lodash /tag$/");
        assert!(name_matches(&mixed, "ncu-test-tag"));
        assert!(name_matches(&mixed, "lodash"));
    }

    #[test]
    fn test_pattern_value() {
        let spec = OptionValue::Pattern(Pattern::parse("/^0\\./").unwrap().unwrap());
        let matcher = Matcher::compile("rejectVersion", &spec).unwrap();
        assert!(matcher.is_match("rejectVersion", CallbackInput::Version("0.1.0")).unwrap());
        assert!(!matcher.is_match("rejectVersion", CallbackInput::Version("1.0.0")).unwrap());
    }

    #[test]
    fn test_invalid_regex_is_error() {
        let err = Matcher::compile("filter", &OptionValue::string("/(/")).unwrap_err();
        assert!(matches!(err, FilterError::InvalidSpec { .. }));
    }

    #[test]
    fn test_non_string_literal_is_error() {
        let err = Matcher::compile("reject", &OptionValue::bool(true)).unwrap_err();
        assert!(err.to_string().contains("reject"));
    }

    #[test]
    fn test_callback_error_carries_subject() {
        let callback = Callback::new("filter", |_| Err(crate::config::CallbackError("boom".into())));
        let matcher = Matcher::compile("filter", &OptionValue::Predicate(callback)).unwrap();
        let err = matcher.is_match("filter", CallbackInput::Name("left-pad")).unwrap_err();
        assert_eq!(err.to_string(), "filter callback failed for left-pad: boom");
    }
}
