//! Build script for mpu-wrappers
//!
//! This script:
//! 1. Locates mpu-config.toml at the project root
//! 2. Reads `handle_pool.handle_pool_size`, letting `MPU_HANDLE_POOL_SIZE` override it
//! 3. Generates the pool capacity constant into OUT_DIR

use std::env;
use std::fs;
use std::path::PathBuf;

const ENV_OVERRIDE: &str = "MPU_HANDLE_POOL_SIZE";
const MAX_POOL_SIZE: u64 = 4096;

fn main() {
    // Get the project root (two levels up from runtime/mpu-wrappers)
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let project_root = manifest_dir
        .parent()
        .and_then(|p| p.parent())
        .expect("Failed to find project root");

    let config_toml = project_root.join("mpu-config.toml");

    println!("cargo:rerun-if-changed={}", config_toml.display());
    println!("cargo:rerun-if-env-changed={}", ENV_OVERRIDE);

    let size = match env::var(ENV_OVERRIDE) {
        Ok(value) => value.trim().parse::<u64>().unwrap_or_else(|_| {
            panic!("{} must be an integer, got {:?}", ENV_OVERRIDE, value)
        }),
        Err(_) => read_config(&config_toml),
    };

    if size == 0 || size > MAX_POOL_SIZE {
        panic!(
            "handle_pool_size must be in 1..={}, got {}",
            MAX_POOL_SIZE, size
        );
    }

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let generated = format!(
        "/// Number of slots in the handle pool (from mpu-config.toml)\n\
         pub const HANDLE_POOL_SIZE: usize = {};\n",
        size
    );
    fs::write(out_dir.join("pool_config.rs"), generated).expect("Failed to write pool_config.rs");

    println!("cargo:rustc-env=MPU_HANDLE_POOL_SIZE={}", size);
}

fn read_config(path: &PathBuf) -> u64 {
    if !path.exists() {
        panic!(
            "mpu-config.toml not found at project root: {}",
            path.display()
        );
    }

    let contents = fs::read_to_string(path).expect("Failed to read mpu-config.toml");
    let config: toml::Table = contents
        .parse()
        .unwrap_or_else(|e| panic!("mpu-config.toml is not valid TOML: {}", e));

    let value = config
        .get("handle_pool")
        .and_then(|section| section.get("handle_pool_size"))
        .unwrap_or_else(|| panic!("mpu-config.toml has no [handle_pool] handle_pool_size"));

    let size = value
        .as_integer()
        .unwrap_or_else(|| panic!("handle_pool_size must be an integer, got {}", value));

    u64::try_from(size).unwrap_or_else(|_| panic!("handle_pool_size must be positive, got {}", size))
}
