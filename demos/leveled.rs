//! Example of a leveled facility configured from YAML.
//!
//! Records go to one file per level in a temporary directory; the
//! crate's own diagnostics are printed on stderr.
//!
//! Run with:
//! ```bash
//! cargo run --example leveled
//! ```

use levelsplit::{
    DiagnosticsConfig, Facility, FacilityConfig, Level, init_diagnostics, log_debug, log_error,
    log_info, log_read, log_update, log_warn,
};

const CONFIG: &str = r#"
module: meta
threshold: info
overflow: drop_oldest
queue_capacity: 1024
header:
  precision: micros
"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_diagnostics(&DiagnosticsConfig::new().with_console(true), Some(1))?;

    let temp_dir = tempfile::tempdir()?;
    let mut value: serde_yaml::Value = serde_yaml::from_str(CONFIG)?;
    value["directory"] = temp_dir.path().to_string_lossy().into_owned().into();
    let config: FacilityConfig = serde_yaml::from_value(value)?;

    let facility = Facility::initialize(config)?;

    log_debug!(facility, "filtered out by the threshold");
    log_info!(facility, "volume {} mounted", 7);
    log_warn!(facility, "slow disk: {}ms", 250);
    log_error!(facility, "inode {} checksum mismatch", 42);
    log_read!(facility, "inode {} read by {}", 42, "client-1");
    log_update!(facility, "inode {} written by {}", 42, "client-2");

    facility.shutdown();

    for level in [
        Level::Debug,
        Level::Info,
        Level::Warn,
        Level::Error,
        Level::Read,
        Level::Update,
    ] {
        let path = facility.config().path_for(level);
        let contents = std::fs::read_to_string(&path)?;
        println!("== {} ==", path.display());
        print!("{contents}");
    }

    Ok(())
}
