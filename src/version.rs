const fn release_or_cargo_version(opt: Option<&'static str>) -> &'static str {
    match opt {
        Some(val) => val,
        None => env!("CARGO_PKG_VERSION"),
    }
}

/// Build version; release pipelines inject `FLEETWATCH_VERSION`.
pub const VERSION: &str = release_or_cargo_version(option_env!("FLEETWATCH_VERSION"));
