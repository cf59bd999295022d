//! Target expression types and the group-membership resolution seam.
//!
//! Expanding a target expression into concrete minion ids is the host
//! dispatcher's job -- it owns the minion inventory, grains, and compound
//! matching. This module defines the [`TargetResolver`] seam the cache
//! calls through, plus [`StaticTargetResolver`], a fixed-inventory
//! implementation covering the two match modes that need no host state
//! (plain globs and explicit lists). Hosts with richer matching plug in
//! their own resolver.

use std::collections::BTreeSet;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CacheError;

/// How a target expression selects minions from the known set.
///
/// Serialized lowercase on the wire (`"glob"`, `"pcre"`, ...), with
/// `glob` as the default when a load omits the field.
///
/// # Examples
///
/// ```
/// use jobcache::TargetType;
///
/// assert_eq!(TargetType::default(), TargetType::Glob);
/// assert_eq!(serde_json::to_string(&TargetType::Pcre).unwrap(), "\"pcre\"");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    /// Shell-style wildcard matching against minion ids.
    #[default]
    Glob,
    /// Perl-compatible regular expression matching against minion ids.
    Pcre,
    /// Explicit comma-separated list of minion ids.
    List,
    /// Matching against minion grain data.
    Grain,
    /// Boolean combination of other match modes.
    Compound,
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Glob => "glob",
            Self::Pcre => "pcre",
            Self::List => "list",
            Self::Grain => "grain",
            Self::Compound => "compound",
        };
        f.write_str(name)
    }
}

/// Resolves a target expression to the concrete set of minion ids it
/// addresses.
///
/// The resolved set is recorded in the job's load *in advance* of any
/// returns arriving, so it is always a superset of the minions that
/// actually report -- a minion may be listed without ever reporting, or
/// report without being listed if it self-selected outside normal
/// matching.
#[async_trait]
pub trait TargetResolver: Send + Sync {
    /// Expands `tgt` under the given match mode.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Target`] when the expression cannot be
    /// resolved (e.g., an unsupported match mode for this resolver).
    async fn resolve(
        &self,
        tgt: &str,
        tgt_type: TargetType,
    ) -> Result<BTreeSet<String>, CacheError>;
}

/// A [`TargetResolver`] over a fixed minion inventory.
///
/// Supports [`TargetType::Glob`] (with `*` and `?` wildcards) and
/// [`TargetType::List`] (comma-separated ids, filtered to known minions).
/// Other match modes need host state this resolver does not have and
/// return [`CacheError::Target`].
///
/// # Examples
///
/// ```
/// use jobcache::{StaticTargetResolver, TargetResolver, TargetType};
///
/// # async fn example() -> Result<(), jobcache::CacheError> {
/// let resolver = StaticTargetResolver::new(["web1", "web2", "db1"]);
/// let matched = resolver.resolve("web*", TargetType::Glob).await?;
/// assert_eq!(matched.len(), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticTargetResolver {
    minions: BTreeSet<String>,
}

impl StaticTargetResolver {
    /// Creates a resolver over the given minion inventory.
    pub fn new(minions: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            minions: minions.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl TargetResolver for StaticTargetResolver {
    async fn resolve(
        &self,
        tgt: &str,
        tgt_type: TargetType,
    ) -> Result<BTreeSet<String>, CacheError> {
        match tgt_type {
            TargetType::Glob => Ok(self
                .minions
                .iter()
                .filter(|m| glob_match(tgt, m))
                .cloned()
                .collect()),
            TargetType::List => Ok(tgt
                .split(',')
                .map(str::trim)
                .filter(|id| self.minions.contains(*id))
                .map(ToOwned::to_owned)
                .collect()),
            other => Err(CacheError::Target {
                message: format!("match mode {other} requires the host's matching engine"),
            }),
        }
    }
}

/// Matches `text` against a shell-style pattern with `*` (any run) and
/// `?` (any single character) wildcards.
fn glob_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    let (mut pi, mut ti) = (0usize, 0usize);
    let mut star: Option<(usize, usize)> = None;

    while ti < t.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == t[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some((pi, ti));
            pi += 1;
        } else if let Some((star_pi, star_ti)) = star {
            // Backtrack: let the last * absorb one more character.
            pi = star_pi + 1;
            ti = star_ti + 1;
            star = Some((star_pi, star_ti + 1));
        } else {
            return false;
        }
    }
    while pi < p.len() && p[pi] == '*' {
        pi += 1;
    }
    pi == p.len()
}
