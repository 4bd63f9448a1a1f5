//! Build script to generate the icon manifest for WASM builds
//!
//! Scans assets/icons/ and writes a manifest listing every icon file, since
//! WASM can't enumerate directories at runtime.

use std::fs;
use std::io::Write;
use std::path::Path;

fn main() {
    println!("cargo:rerun-if-changed=assets/icons");

    let icons_dir = Path::new("assets/icons");
    let manifest_path = Path::new("assets/icons/manifest.txt");
    fs::create_dir_all(icons_dir).unwrap();

    let mut entries = Vec::new();
    if icons_dir.exists() {
        collect_pngs(icons_dir, icons_dir, &mut entries);
    }
    entries.sort();

    let mut manifest = String::new();
    for entry in entries {
        manifest.push_str(&entry);
        manifest.push('\n');
    }

    let mut file = fs::File::create(manifest_path).unwrap();
    file.write_all(manifest.as_bytes()).unwrap();
}

/// Recursively gather PNG paths relative to the icons root.
fn collect_pngs(root: &Path, dir: &Path, out: &mut Vec<String>) {
    let Ok(read_dir) = fs::read_dir(dir) else {
        return;
    };
    for entry in read_dir.filter_map(|e| e.ok()) {
        let path = entry.path();
        if path.is_dir() {
            collect_pngs(root, &path, out);
        } else if path
            .extension()
            .map(|ext| ext.to_ascii_lowercase() == "png")
            .unwrap_or(false)
        {
            if let Ok(rel) = path.strip_prefix(root) {
                out.push(rel.to_string_lossy().replace('\\', "/"));
            }
        }
    }
}
