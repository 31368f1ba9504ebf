//! Build script for pingpong-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates pingpong.toml at compile time
//! - Generates the configuration constants included by `src/config.rs`

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    setup_linker(&out_dir);
    let config = load_config();
    let settings = validate_config(&config);
    generate_config(&out_dir, &settings);
}

/// Values extracted from pingpong.toml
struct Settings {
    slave_address: i64,
    frequency_hz: i64,
    timeout_ms: i64,
    button_pull: &'static str,
    poll_interval_ms: i64,
}

/// Set up linker search paths for memory.x
fn setup_linker(out_dir: &Path) {
    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Read and parse pingpong.toml
fn load_config() -> toml::Value {
    // Re-run if pingpong.toml changes
    println!("cargo:rerun-if-changed=pingpong.toml");

    let config_path = Path::new("pingpong.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: pingpong.toml not found!                                 ║\n\
            ║                                                                  ║\n\
            ║  The firmware requires a pingpong.toml configuration file.       ║\n\
            ║  Please create one in the pingpong-firmware directory.           ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read pingpong.toml                             ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in pingpong.toml                     ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                {}\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    }
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.chars().count() > 64 {
                format!("{}...", line.chars().take(61).collect::<String>())
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Look up an integer in `[section]` and check its range
fn read_integer(
    config: &toml::Value,
    section: &str,
    key: &str,
    range: (i64, i64),
    errors: &mut Vec<String>,
) -> i64 {
    match config.get(section).and_then(|s| s.get(key)) {
        Some(toml::Value::Integer(value)) => {
            if *value < range.0 || *value > range.1 {
                errors.push(format!(
                    "[{}] {} must be {}-{}",
                    section, key, range.0, range.1
                ));
            }
            *value
        }
        Some(_) => {
            errors.push(format!("[{}] {} must be an integer", section, key));
            0
        }
        None => {
            errors.push(format!("[{}] missing '{}'", section, key));
            0
        }
    }
}

/// Validate pingpong.toml and extract its settings
fn validate_config(config: &toml::Value) -> Settings {
    let mut errors = Vec::new();

    let slave_address = read_integer(config, "i2c", "slave_address", (0x00, 0x7F), &mut errors);
    let frequency_hz = read_integer(config, "i2c", "frequency_hz", (10_000, 1_000_000), &mut errors);
    let timeout_ms = read_integer(config, "i2c", "timeout_ms", (1, 10_000), &mut errors);
    let poll_interval_ms =
        read_integer(config, "button", "poll_interval_ms", (1, 1_000), &mut errors);

    let button_pull = match config.get("button").and_then(|b| b.get("pull")) {
        Some(toml::Value::String(pull)) => match pull.as_str() {
            "up" => "Up",
            "down" => "Down",
            "none" => "None",
            _ => {
                errors.push("[button] pull must be 'up', 'down', or 'none'".to_string());
                "Up"
            }
        },
        // Pulled-up input unless told otherwise
        None => "Up",
        Some(_) => {
            errors.push("[button] pull must be a string".to_string());
            "Up"
        }
    };

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid configuration in pingpong.toml                   ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }

    println!("cargo:warning=pingpong.toml validated successfully");

    Settings {
        slave_address,
        frequency_hz,
        timeout_ms,
        button_pull,
        poll_interval_ms,
    }
}

/// Write `config.rs` to OUT_DIR
fn generate_config(out_dir: &Path, settings: &Settings) {
    let source = format!(
        "// Generated by build.rs from pingpong.toml\n\
         pub const SLAVE_ADDRESS: u8 = {:#04x};\n\
         pub const I2C_FREQUENCY_HZ: u32 = {};\n\
         pub const I2C_TIMEOUT_MS: u32 = {};\n\
         pub const BUTTON_PULL: Pull = Pull::{};\n\
         pub const POLL_INTERVAL_MS: u64 = {};\n",
        settings.slave_address,
        settings.frequency_hz,
        settings.timeout_ms,
        settings.button_pull,
        settings.poll_interval_ms,
    );

    fs::write(out_dir.join("config.rs"), source).unwrap();
}
