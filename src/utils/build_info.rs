/// Compile-time metadata stamped by `build.rs`.
#[derive(Debug, Clone, Copy)]
pub struct BuildInfo {
    pub version: &'static str,
    pub git_hash: &'static str,
    pub git_status: &'static str,
    pub built_at: &'static str,
    pub target: &'static str,
    pub profile: &'static str,
    pub rustc: &'static str,
}

impl BuildInfo {
    /// One-line summary, e.g. `mealbank 0.1.0 (abc1234, clean)`.
    pub fn summary(&self) -> String {
        format!(
            "mealbank {} ({}, {})",
            self.version, self.git_hash, self.git_status
        )
    }

    pub fn details(&self) -> Vec<(&'static str, &'static str)> {
        vec![
            ("built", self.built_at),
            ("target", self.target),
            ("profile", self.profile),
            ("rustc", self.rustc),
        ]
    }
}

pub fn current() -> BuildInfo {
    BuildInfo {
        version: env!("CARGO_PKG_VERSION"),
        git_hash: option_env!("MEALBANK_BUILD_HASH").unwrap_or("unknown"),
        git_status: option_env!("MEALBANK_BUILD_STATUS").unwrap_or("unknown"),
        built_at: option_env!("MEALBANK_BUILD_TIMESTAMP").unwrap_or("unknown"),
        target: option_env!("MEALBANK_BUILD_TARGET").unwrap_or("unknown"),
        profile: option_env!("MEALBANK_BUILD_PROFILE").unwrap_or("unknown"),
        rustc: option_env!("MEALBANK_BUILD_RUSTC").unwrap_or("unknown"),
    }
}
