//! Source-layout enforcement for the sockpath core crate.
//!
//! These tests scan the core crate's sources and fail when a module steps
//! outside its layer: only the three channel modules may touch OS socket
//! APIs, and production code must propagate errors instead of panicking.

use std::path::PathBuf;

use walkdir::WalkDir;

/// Modules allowed to use `std::os::unix::net`, `socket2`, or raw `libc`
/// socket calls.
const CHANNEL_MODULES: &[&str] = &["listener.rs", "connector.rs", "conn.rs"];

fn core_src_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../sockpath/core/src")
        .canonicalize()
        .expect("core src directory exists")
}

fn core_sources() -> Vec<(PathBuf, String)> {
    WalkDir::new(core_src_dir())
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "rs"))
        .map(|e| {
            let content = std::fs::read_to_string(e.path()).expect("readable source file");
            (e.path().to_path_buf(), content)
        })
        .collect()
}

/// The portion of a source file before its `#[cfg(test)]` module.
fn production_portion(content: &str) -> &str {
    content.split("#[cfg(test)]").next().unwrap_or(content)
}

#[test]
fn os_socket_apis_confined_to_channel_modules() {
    let forbidden = ["os::unix::net", "socket2::", "libc::getsockopt"];

    for (path, content) in core_sources() {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        if CHANNEL_MODULES.contains(&file_name) {
            continue;
        }

        for needle in forbidden {
            assert!(
                !production_portion(&content).contains(needle),
                "{} reaches into the OS socket layer ({needle}); only {:?} may",
                path.display(),
                CHANNEL_MODULES,
            );
        }
    }
}

#[test]
fn no_unwrap_or_expect_in_production_code() {
    for (path, content) in core_sources() {
        let production = production_portion(&content);
        for needle in [".unwrap()", ".expect("] {
            assert!(
                !production.contains(needle),
                "{} uses {needle} outside test code; propagate errors instead",
                path.display(),
            );
        }
    }
}

#[test]
fn address_translation_never_inspects_the_transport() {
    // The faked identity must come from stored hints alone; peer_addr on the
    // OS stream would leak real transport identity into address queries.
    for (path, content) in core_sources() {
        assert!(
            !production_portion(&content).contains("peer_addr"),
            "{} queries the transport for a peer address; hints are echoed instead",
            path.display(),
        );
    }
}

#[test]
fn no_sleep_in_production_code() {
    for (path, content) in core_sources() {
        assert!(
            !production_portion(&content).contains("thread::sleep"),
            "{} sleeps in production code",
            path.display(),
        );
    }
}
