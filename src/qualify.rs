//! Reference qualification for schema object names.
//!
//! A schema object can be referenced under several synonymous names: fully
//! qualified (`tables/orders.sql`), qualified without an extension
//! (`tables/orders`), or bare (`orders`). This module turns a reference plus
//! a namespace search path into the ordered list of candidate keys under
//! which the object might be registered.
//!
//! Candidate order is load-bearing: every index lookup in the crate tries the
//! candidates in order and keeps the first match, so the order here defines
//! first-match-wins semantics everywhere.
//!
//! # Examples
//!
//! ```
//! use schemadep::qualify;
//!
//! // Unqualified references are expanded against the search path, namespace
//! // order outermost, extension specificity innermost.
//! let path = vec!["tables".to_string(), "views".to_string()];
//! assert_eq!(
//!     qualify::qualify(&path, "orders.sql"),
//!     vec!["tables/orders.sql", "tables/orders", "views/orders.sql", "views/orders"]
//! );
//!
//! // A qualified reference bypasses the search path entirely.
//! assert_eq!(
//!     qualify::qualify(&path, "data/seed.sql"),
//!     vec!["data/seed.sql", "data/seed"]
//! );
//! ```

/// Returns `true` if the reference carries an explicit namespace prefix.
pub fn is_qualified(reference: &str) -> bool {
    reference.contains('/')
}

/// The reference as given, followed by its extension-stripped form.
///
/// Stripping splits on the last `.`; a reference without a dot yields only
/// itself. The unstripped form always comes first: a reference that names its
/// extension is more specific than one that does not.
pub fn basenames(reference: &str) -> Vec<&str> {
    match reference.rsplit_once('.') {
        Some((stem, _ext)) => vec![reference, stem],
        None => vec![reference],
    }
}

/// Produce the ordered candidate keys for `reference` under `search_path`.
///
/// A qualified reference yields itself plus its extension-stripped form and
/// ignores the search path. An unqualified reference yields, for each
/// namespace in declared order, `ns/reference` and `ns/stem`.
pub fn qualify(search_path: &[String], reference: &str) -> Vec<String> {
    if is_qualified(reference) {
        return basenames(reference).into_iter().map(str::to_string).collect();
    }
    let mut keys = Vec::with_capacity(search_path.len() * 2);
    for ns in search_path {
        for bn in basenames(reference) {
            keys.push(format!("{ns}/{bn}"));
        }
    }
    keys
}

/// Qualify against a single namespace.
///
/// Convenience for the common case of a file's own namespace (discovery and
/// rule-subject registration both use this form).
pub fn qualify_in(ns: &str, reference: &str) -> Vec<String> {
    qualify(std::slice::from_ref(&ns.to_string()), reference)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(nss: &[&str]) -> Vec<String> {
        nss.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn unqualified_expands_namespace_major_extension_minor() {
        let keys = qualify(&path(&["a", "b"]), "foo.sql");
        assert_eq!(keys, vec!["a/foo.sql", "a/foo", "b/foo.sql", "b/foo"]);
    }

    #[test]
    fn qualified_bypasses_search_path() {
        let keys = qualify(&path(&["a", "b"]), "c/foo.ext");
        assert_eq!(keys, vec!["c/foo.ext", "c/foo"]);
    }

    #[test]
    fn reference_without_extension_has_single_form() {
        assert_eq!(qualify(&path(&["a"]), "foo"), vec!["a/foo"]);
        assert_eq!(qualify(&path(&["a", "b"]), "foo"), vec!["a/foo", "b/foo"]);
    }

    #[test]
    fn stripping_splits_on_last_dot() {
        assert_eq!(basenames("pkg.body.sql"), vec!["pkg.body.sql", "pkg.body"]);
    }

    #[test]
    fn single_namespace_convenience() {
        assert_eq!(qualify_in("tables", "orders.sql"), vec!["tables/orders.sql", "tables/orders"]);
    }
}
