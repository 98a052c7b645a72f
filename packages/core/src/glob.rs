//! The pattern selector: glob over a flat key namespace.
//!
//! A pattern is split into a literal scan prefix and a matching suffix,
//! the suffix decides between a single-level (delimiter-grouped) and a
//! full-depth key scan, and the whole pattern compiles into one anchored
//! regular expression. The scan then reconstructs every intermediate
//! "directory" level between the prefix and each listed key, deduplicates
//! levels already produced during this invocation, and yields the ones the
//! expression matches.

use std::collections::{HashSet, VecDeque};

use regex::Regex;

use blobpath_client::{CallArgs, ClientHandle};

use crate::error::Error;
use crate::list::KeyIter;
use crate::path::{BlobPath, SEP};

fn is_wildcard(part: &str) -> bool {
    part.contains('*') || part.contains('?') || part.contains('[')
}

/// Check a pattern for the shapes the engine rejects, without compiling.
pub(crate) fn validate_pattern(pattern: &str) -> Result<(), Error> {
    pattern_components(pattern).map(|_| ())
}

/// Split a pattern into normalized components, rejecting shapes the
/// engine never accepts.
fn pattern_components(pattern: &str) -> Result<Vec<String>, Error> {
    if pattern.is_empty() {
        return Err(Error::InvalidPattern {
            pattern: pattern.to_string(),
            message: "empty pattern".to_string(),
        });
    }
    if pattern.starts_with(SEP) {
        return Err(Error::UnsupportedPattern {
            pattern: pattern.to_string(),
        });
    }
    let components: Vec<String> = pattern
        .split(SEP)
        .filter(|part| !part.is_empty() && *part != ".")
        .map(|part| part.to_string())
        .collect();
    for part in &components {
        if part != "**" && part.contains("**") {
            return Err(Error::InvalidPattern {
                pattern: pattern.to_string(),
                message: "'**' can only be an entire path component".to_string(),
            });
        }
    }
    if components.is_empty() {
        return Err(Error::InvalidPattern {
            pattern: pattern.to_string(),
            message: "empty pattern".to_string(),
        });
    }
    Ok(components)
}

/// Translate one fnmatch-style component into a regex fragment.
///
/// `*` matches greedily (the caller bounds it to one segment by scan depth
/// where needed), `?` matches one character, bracket classes pass through
/// with `!` negation; an unterminated `[` is a literal.
fn translate(part: &str) -> String {
    let chars: Vec<char> = part.chars().collect();
    let mut out = String::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        i += 1;
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '[' => {
                let mut j = i;
                if j < chars.len() && chars[j] == '!' {
                    j += 1;
                }
                if j < chars.len() && chars[j] == ']' {
                    j += 1;
                }
                while j < chars.len() && chars[j] != ']' {
                    j += 1;
                }
                if j >= chars.len() {
                    out.push_str("\\[");
                } else {
                    let inner: String = chars[i..j].iter().collect::<String>().replace('\\', "\\\\");
                    out.push('[');
                    if let Some(rest) = inner.strip_prefix('!') {
                        out.push('^');
                        out.push_str(rest);
                    } else if inner.starts_with('^') {
                        out.push('\\');
                        out.push_str(&inner);
                    } else {
                        out.push_str(&inner);
                    }
                    out.push(']');
                    i = j + 1;
                }
            }
            other => out.push_str(&regex::escape(&other.to_string())),
        }
    }
    out
}

fn depth(s: &str) -> usize {
    s.split(SEP).filter(|part| !part.is_empty()).count()
}

/// Compiled per-invocation glob state: scan prefix, scan mode, target
/// depth and the anchored match predicate.
pub(crate) struct Selector {
    bucket: String,
    prefix: String,
    full_keys: bool,
    target_level: Option<usize>,
    matcher: Regex,
}

impl Selector {
    pub(crate) fn new(base: &BlobPath, pattern: &str) -> Result<Self, Error> {
        let bucket = base.bucket()?.to_string();
        let key = base.key()?;
        let components = pattern_components(pattern)?;

        // Longest literal lead becomes the scan prefix; the remainder is
        // what actually needs matching.
        let (prefix, suffix_components) = if !is_wildcard(pattern) {
            let prefix = if key.is_empty() {
                pattern.to_string()
            } else {
                format!("{}{}{}", key, SEP, pattern)
            };
            (prefix, Vec::new())
        } else {
            let split_at = components
                .iter()
                .position(|part| is_wildcard(part))
                .unwrap_or(components.len());
            let mut literal = String::new();
            for part in &components[..split_at] {
                literal.push_str(part);
                literal.push(SEP);
            }
            let prefix = if key.is_empty() {
                literal
            } else {
                format!("{}{}{}", key, SEP, literal)
            };
            (prefix, components[split_at..].to_vec())
        };

        let has_recursive = suffix_components.iter().any(|part| part == "**");
        let full_keys = has_recursive
            || suffix_components
                .iter()
                .rev()
                .skip(1)
                .any(|part| is_wildcard(part));

        let target_level = if has_recursive {
            None
        } else {
            Some(depth(&prefix) + suffix_components.len())
        };

        let matcher = Self::compile(&bucket, &prefix, &suffix_components)?;

        Ok(Selector {
            bucket,
            prefix,
            full_keys,
            target_level,
            matcher,
        })
    }

    /// Concatenate per-component translations of bucket + prefix + suffix
    /// into one expression that must cover the whole candidate string.
    fn compile(bucket: &str, prefix: &str, suffix: &[String]) -> Result<Regex, Error> {
        let mut parts: Vec<String> = Vec::new();
        parts.extend(depth_components(bucket));
        parts.extend(depth_components(prefix));
        parts.extend(suffix.iter().cloned());

        let mut body = String::new();
        for part in &parts {
            if part.contains("**") {
                // Spans any number of levels, separators included.
                body.push_str(&format!("/*(?s:{})", part.replace("**", ".*")));
            } else if part == "*" {
                // Exactly one level: the separator is excluded.
                body.push_str("/(?s:[^/]+)");
            } else {
                body.push_str(&format!("/(?s:{})", translate(part)));
            }
        }

        Regex::new(&format!(r"\A{}/*\z", body)).map_err(|e| Error::InvalidPattern {
            pattern: parts.join("/"),
            message: e.to_string(),
        })
    }

    /// Run the scan against `client`, consuming the selector.
    pub(crate) fn scan(self, client: ClientHandle, args: CallArgs) -> Glob {
        let bucket = if self.bucket.is_empty() {
            None
        } else {
            Some(self.bucket.clone())
        };
        let prefix = if self.prefix.is_empty() {
            None
        } else {
            Some(self.prefix.clone())
        };
        log::debug!(
            "glob scan bucket={:?} prefix={:?} full={}",
            bucket,
            prefix,
            self.full_keys
        );
        let keys = KeyIter::new(client, args, bucket, prefix, self.full_keys);
        Glob {
            keys,
            bucket: self.bucket,
            prefix_depth: self.prefix.matches(SEP).count(),
            target_level: self.target_level,
            matcher: self.matcher,
            seen: HashSet::new(),
            pending: VecDeque::new(),
        }
    }

    #[cfg(test)]
    fn describe(&self) -> (String, bool, Option<usize>) {
        (self.prefix.clone(), self.full_keys, self.target_level)
    }
}

fn depth_components(s: &str) -> Vec<String> {
    s.split(SEP)
        .filter(|part| !part.is_empty())
        .map(|part| part.to_string())
        .collect()
}

/// Lazy, single-pass stream of matching paths. The backing scan is
/// consumed once; order follows the backend's listing order.
pub struct Glob {
    keys: KeyIter,
    bucket: String,
    prefix_depth: usize,
    target_level: Option<usize>,
    matcher: Regex,
    // Levels already produced during this invocation, so an intermediate
    // level inferred from several keys is yielded at most once.
    seen: HashSet<String>,
    pending: VecDeque<String>,
}

impl std::fmt::Debug for Glob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Glob")
            .field("bucket", &self.bucket)
            .field("prefix_depth", &self.prefix_depth)
            .field("target_level", &self.target_level)
            .field("matcher", &self.matcher)
            .field("seen", &self.seen)
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

impl Glob {
    /// Break one listed key into the candidate levels between the scan
    /// prefix and the key itself (bounded by the target depth), skipping
    /// levels already seen.
    fn push_levels(&mut self, key: &str) {
        let key_splits = key.matches(SEP).count() + 1;
        let splits = key_splits.saturating_sub(self.prefix_depth);
        let parts: Vec<&str> = if splits == 0 {
            vec![key]
        } else {
            let mut collected: Vec<&str> = key.rsplitn(splits + 1, SEP).collect();
            collected.reverse();
            collected
        };
        let take = self.target_level.unwrap_or(parts.len()).min(parts.len());

        let mut level = String::new();
        for part in &parts[..take] {
            if part.is_empty() {
                continue;
            }
            level.push(SEP);
            level.push_str(part);
            if self.seen.contains(&level) {
                continue;
            }
            self.seen.insert(level.clone());
            self.pending.push_back(level.clone());
        }
    }
}

impl Iterator for Glob {
    type Item = Result<BlobPath, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            while let Some(level) = self.pending.pop_front() {
                let candidate = if self.bucket.is_empty() {
                    level
                } else {
                    format!("/{}{}", self.bucket, level)
                };
                if self.matcher.is_match(&candidate) {
                    return Some(Ok(BlobPath::parse(&candidate)));
                }
            }
            match self.keys.next() {
                Some(Ok(key)) => self.push_levels(&key),
                Some(Err(e)) => return Some(Err(e)),
                None => return None,
            }
        }
    }
}
