// SPDX-License-Identifier: Apache-2.0

use std::fs;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};

/// Directories that hold build output or vendored material rather than
/// sources of this workspace.
const SKIPPED_DIRS: &[&str] = &["target", ".git", "examples"];

fn check_spdx_identifier(file_path: &Path) -> bool {
    let file = fs::File::open(file_path).unwrap();
    let reader = io::BufReader::new(file);
    if let Some(Ok(first_line)) = reader.lines().next() {
        return first_line.starts_with("// SPDX-License-Identifier: Apache-2.0");
    }
    false
}

#[test]
fn check_all_rust_files_for_spdx() {
    let project_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    let mut missing_spdx_files = Vec::new();
    let mut dir_worklist: Vec<PathBuf> = vec![project_dir.to_path_buf()];

    while let Some(dir) = dir_worklist.pop() {
        for entry in fs::read_dir(dir).unwrap() {
            let entry = entry.unwrap();
            let path = entry.path();

            if path.is_dir() {
                let skip = path
                    .file_name()
                    .map(|name| SKIPPED_DIRS.iter().any(|skipped| name == *skipped))
                    .unwrap_or(false);
                if !skip {
                    dir_worklist.push(path.clone());
                }
                continue;
            }

            if let Some(extension) = path.extension() {
                if extension == "rs" {
                    if !check_spdx_identifier(&path) {
                        missing_spdx_files.push(path);
                    }
                }
            }
        }
    }

    if !missing_spdx_files.is_empty() {
        panic!(
            "The following files are missing SPDX identifiers: {:?}",
            missing_spdx_files
        );
    }
}
