use std::path::{Component, Path, PathBuf};

use tokio::fs;

/// The root path serves the default document; everything else is taken as-is.
pub fn document_path(request_path: &str) -> &str {
    if request_path == "/" {
        "/index.html"
    } else {
        request_path
    }
}

pub async fn resolve(root: &Path, request_path: &str) -> Option<Vec<u8>> {
    let document = document_path(request_path);
    let candidate = rooted_join(root, document.trim_start_matches('/'))?;
    // Anything that is not a regular file counts as missing.
    match fs::metadata(&candidate).await {
        Ok(meta) if meta.is_file() => fs::read(&candidate).await.ok(),
        _ => None,
    }
}

// Joins a request path under the root, refusing any component that could
// escape it. No normalization beyond dropping `.`: a path containing `..`
// is rejected outright rather than resolved.
fn rooted_join(root: &Path, relative: &str) -> Option<PathBuf> {
    let mut joined = root.to_path_buf();
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => joined.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(joined)
}
