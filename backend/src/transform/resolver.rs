//! Column resolution: bind logical fields to whatever the export called them.
//!
//! Headers and candidates are compared in canonical form (lower-cased, every
//! run of non `[a-z0-9]` characters collapsed to `_`). An exact canonical
//! match on any candidate always beats a substring match; within each pass
//! candidates are tried in priority order, then headers in column order.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::api::logs::{log_info, log_success};
use crate::error::{ResolveError, ResolveResult};
use crate::models::{FieldMapping, LogicalField, ResolvedColumn};

static NON_ALNUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// Canonical form used for header comparison.
///
/// ```ignore
/// assert_eq!(canonize("Coin Reward (Value)"), "coin_reward_value_");
/// ```
pub fn canonize(name: &str) -> String {
    NON_ALNUM.replace_all(&name.to_lowercase(), "_").into_owned()
}

/// Index of the header bound to a field with the given candidate names.
///
/// Headers sharing a canonical form bind to the leftmost one.
///
/// Fails with [`ResolveError::MissingColumn`] listing every candidate.
pub fn resolve_column<S: AsRef<str>>(headers: &[S], candidates: &[&str]) -> ResolveResult<usize> {
    let canonical_headers: Vec<String> = headers.iter().map(|h| canonize(h.as_ref())).collect();
    let canonical_candidates: Vec<String> = candidates.iter().map(|c| canonize(c)).collect();

    for cand in &canonical_candidates {
        if let Some(i) = canonical_headers.iter().position(|h| h == cand) {
            return Ok(i);
        }
    }

    for cand in &canonical_candidates {
        if let Some(i) = canonical_headers.iter().position(|h| h.contains(cand.as_str())) {
            return Ok(i);
        }
    }

    Err(ResolveError::MissingColumn {
        candidates: candidates.iter().map(|c| c.to_string()).collect(),
    })
}

/// Resolve every logical field once, failing fast on the first one missing.
pub fn resolve_fields<S: AsRef<str>>(headers: &[S]) -> ResolveResult<FieldMapping> {
    log_info("🔎 Resolving columns...");

    let mut columns = Vec::with_capacity(LogicalField::ALL.len());
    for field in LogicalField::ALL {
        let index = resolve_column(headers, field.candidates()).map_err(|e| match e {
            ResolveError::MissingColumn { candidates } => {
                ResolveError::MissingField { field, candidates }
            }
            other => other,
        })?;
        let header = headers[index].as_ref().to_string();
        log_success(format!("{} → {}", field, header));
        columns.push(ResolvedColumn { index, header });
    }

    Ok(FieldMapping::from_columns(columns))
}
