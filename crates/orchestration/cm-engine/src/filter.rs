//! Eligibility rules for migration candidates.

use chrono::{DateTime, Duration, Utc};
use cm_types::{is_match_all_sentinel, ObjectMeta};

/// Decide whether an object qualifies for migration.
///
/// Rules, applied in order, short-circuiting:
/// 1. Folder placeholders (trailing `/`) never qualify.
/// 2. Unless `prefixes` is the match-all sentinel `[""]`, the base filename
///    must start with at least one prefix.
/// 3. When an age filter is active, objects with an unknown timestamp or
///    younger than `min_age` are rejected.
/// 4. The storage class must equal `target_class` exactly (case-sensitive).
///
/// Pure over its inputs; `now` is passed in rather than read from the clock.
pub fn is_eligible(
    meta: &ObjectMeta,
    prefixes: &[String],
    min_age: Option<Duration>,
    now: DateTime<Utc>,
    target_class: &str,
) -> bool {
    if meta.is_folder_placeholder() {
        return false;
    }

    if !is_match_all_sentinel(prefixes) {
        let base = meta.base_name();
        if !prefixes.iter().any(|p| base.starts_with(p.as_str())) {
            return false;
        }
    }

    if let Some(min_age) = min_age {
        match meta.updated {
            None => return false,
            Some(updated) if now - updated < min_age => return false,
            Some(_) => {}
        }
    }

    meta.storage_class == target_class
}
