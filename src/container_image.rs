//! Container image reference handling.
//!
//! Unique responsibility: decide whether an OCI-style image reference
//! already pins a version (tag or digest) and, if not, pin it to
//! `:latest` before the reference is sent to the containers API.
//!
//! Reference anatomy:
//! - `[registry-host[:port]/]repository-path/name[:tag|@digest]`
//!
//! The only subtlety is that a registry host may itself carry a colon
//! (`localhost:5000/app`, including degenerate forms like `registry:/app`
//! or `registry:abc/app`). A version marker therefore only counts when it
//! appears in the final path segment.

/// Check whether an image reference carries an explicit tag or digest.
///
/// The decision looks exclusively at the final `/`-separated segment:
/// a `:` there is a tag delimiter, an `@` a digest delimiter. Colons in
/// earlier segments are registry port delimiters (numeric or not, possibly
/// empty) and never make a reference versioned.
///
/// An empty reference is never versioned.
#[must_use]
pub fn has_explicit_version(reference: &str) -> bool {
    if reference.is_empty() {
        return false;
    }

    // For a bare name ("nginx:1.21") the last segment is the whole string,
    // so the same rule covers both the single- and multi-segment shapes.
    let last_segment = reference.rsplit('/').next().unwrap_or(reference);

    last_segment.contains(':') || last_segment.contains('@')
}

/// Normalize an image reference for submission to the platform.
///
/// Returns the reference unchanged when it is empty or already versioned,
/// otherwise appends `:latest`. Pure and idempotent: normalizing an
/// already-normalized reference is a no-op.
#[must_use]
pub fn normalize_image(reference: &str) -> String {
    if reference.is_empty() || has_explicit_version(reference) {
        return reference.to_string();
    }
    format!("{reference}:latest")
}
