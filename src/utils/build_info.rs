use serde::Serialize;

/// Compile-time build metadata produced by `build.rs`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct BuildMetadata {
    pub name: &'static str,
    pub version: &'static str,
    pub git_hash: &'static str,
    pub git_status: &'static str,
    pub built_at: &'static str,
    pub target: &'static str,
    pub profile: &'static str,
    pub rustc: &'static str,
}

pub fn current() -> BuildMetadata {
    BuildMetadata {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        git_hash: option_env!("REX_BUILD_HASH").unwrap_or("unknown"),
        git_status: option_env!("REX_BUILD_STATUS").unwrap_or("unknown"),
        built_at: option_env!("REX_BUILD_TIMESTAMP").unwrap_or("unknown"),
        target: option_env!("REX_BUILD_TARGET").unwrap_or("unknown"),
        profile: option_env!("REX_BUILD_PROFILE").unwrap_or("unknown"),
        rustc: option_env!("REX_BUILD_RUSTC").unwrap_or("unknown"),
    }
}
