//! The `cluecraft init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    if Path::new("cluecraft.toml").exists() {
        println!("cluecraft.toml already exists, skipping.");
    } else {
        std::fs::write("cluecraft.toml", SAMPLE_CONFIG)?;
        println!("Created cluecraft.toml");
    }

    std::fs::create_dir_all("catalogs")?;
    let starter_path = Path::new("catalogs/starter.toml");
    if starter_path.exists() {
        println!("catalogs/starter.toml already exists, skipping.");
    } else {
        std::fs::write(starter_path, STARTER_CATALOG)?;
        println!("Created catalogs/starter.toml");
    }

    println!("\nNext steps:");
    println!("  1. Run: cluecraft validate --catalog catalogs/starter.toml");
    println!("  2. Run: cluecraft play");
    println!("  3. Run: cluecraft insights");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# cluecraft configuration

catalog = "catalogs/starter.toml"
default_mode = "adaptive"
default_user = "player"

[store]
type = "json"
dir = "./cluecraft-data"

# Engine tuning. The values below are the defaults.
[engine.calibrator]
alpha = 0.15
band_low = 0.70
band_high = 0.80
min_outcomes_between_changes = 5

[engine.scheduler]
min_ease = 1.3
max_ease = 2.5

[engine.weakness]
threshold = 0.60
min_attempts = 3

[engine.quality]
base_expected_ms = 10000
per_tier_ms = 2500
"#;

const STARTER_CATALOG: &str = include_str!("../../../../catalogs/starter.toml");
