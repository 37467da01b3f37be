use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

fn main() {
    // Askama reads templates at compile time; cargo does not know about them.
    watch_templates(Path::new("templates"));
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=SOURCE_DATE_EPOCH");

    // Reproducible builds pin the id through SOURCE_DATE_EPOCH.
    let build_id = std::env::var("SOURCE_DATE_EPOCH").unwrap_or_else(|_| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs().to_string())
            .unwrap_or_else(|_| "dev".to_string())
    });
    println!("cargo:rustc-env=PRESENSI_BUILD_ID={}", build_id);
}

fn watch_templates(dir: &Path) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    println!("cargo:rerun-if-changed={}", dir.display());
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            watch_templates(&path);
        } else if path.extension().is_some_and(|ext| ext == "html") {
            println!("cargo:rerun-if-changed={}", path.display());
        }
    }
}
