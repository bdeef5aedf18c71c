//! Path canonicalization.

/// Lexically canonicalize a path, removing redundant components.
/// Does not access the disk, but only simplifies things like
/// "foo/./bar" => "foo/bar" and "foo/../bar" => "bar".
/// Two spellings of the same path must map to the same file node, so every
/// path goes through here before it is used as a graph key.
pub fn canon_path<T: Into<String>>(inpath: T) -> String {
    let path: String = inpath.into();
    if is_canonical(&path) {
        return path;
    }

    let absolute = path.starts_with('/');
    let mut components: Vec<&str> = Vec::new();
    // Number of leading ".." components that can't be backed out of.
    let mut parents = 0;
    for component in path.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                if components.pop().is_none() && !absolute {
                    parents += 1;
                }
            }
            _ => components.push(component),
        }
    }

    let mut out = String::with_capacity(path.len());
    if absolute {
        out.push('/');
    }
    for _ in 0..parents {
        out.push_str("../");
    }
    for component in components {
        out.push_str(component);
        out.push('/');
    }
    if out.len() > 1 && out.ends_with('/') {
        out.pop();
    }
    if out.is_empty() {
        out.push('.');
    }
    out
}

/// Fast path: most paths in a recipe are already canonical.
fn is_canonical(path: &str) -> bool {
    if path.is_empty() || (path.ends_with('/') && path != "/") {
        return false;
    }
    let rest = path.strip_prefix('/').unwrap_or(path);
    if rest.is_empty() {
        return true;
    }
    rest.split('/').all(|c| !matches!(c, "" | "." | ".."))
}
