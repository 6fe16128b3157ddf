//! Raw platform names of the running host.
//!
//! Bundle layouts key on conventional system names ("Mac OS X", "amd64"),
//! not Rust's target names ("macos", "x86_64"). These helpers translate the
//! compile-time target into those names so the host finds its resources.

/// Raw OS name of the running host, in the form [`crate::resolve_os`] expects.
pub fn host_os_name() -> &'static str {
    os_name_for(std::env::consts::OS)
}

/// Raw architecture name of the running host, in the form
/// [`crate::resolve_architecture`] expects.
pub fn host_arch_name() -> &'static str {
    arch_name_for(std::env::consts::ARCH)
}

fn os_name_for(target_os: &'static str) -> &'static str {
    match target_os {
        "linux" | "android" => "Linux",
        "windows" => "Windows",
        "macos" => "Mac OS X",
        "solaris" | "illumos" => "Solaris",
        other => other,
    }
}

fn arch_name_for(target_arch: &'static str) -> &'static str {
    match target_arch {
        "x86_64" => "amd64",
        other => other,
    }
}
