// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Flattening category and tag into a single backend-safe metric name.

use std::sync::LazyLock;

use regex_lite::Regex;

static INVALID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_\-]+").expect("pattern is valid"));

/// Replace every run of characters outside `[A-Za-z0-9_-]` with a single `_`.
pub fn sanitize(name: &str) -> String {
    INVALID.replace_all(name, "_").into_owned()
}

/// Build `{prefix}{category}` for the aggregate or `{prefix}{category}-{tag}` for a tag.
///
/// The category and tag are [sanitized](sanitize) and leading or trailing `_` are trimmed from
/// the tag, so `/foo/bar` becomes `foo_bar`. The prefix is used verbatim. Only an empty `tag`
/// selects the aggregate form; a tag that trims down to nothing still gets the `-` separator,
/// keeping it distinct from the aggregate.
///
/// ```
/// use harvest::naming::format_name;
///
/// assert_eq!(format_name("svc_", "api qps", "/foo/bar"), "svc_api_qps-foo_bar");
/// assert_eq!(format_name("", "api_count", ""), "api_count");
/// assert_eq!(format_name("", "api_count", "/"), "api_count-");
/// ```
pub fn format_name(prefix: &str, category: &str, tag: &str) -> String {
    let category = sanitize(category);
    if tag.is_empty() {
        return format!("{prefix}{category}");
    }
    let tag = sanitize(tag);
    format!("{prefix}{category}-{}", tag.trim_matches('_'))
}
