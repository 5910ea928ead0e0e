//! Build script for audioswitch-firmware
//!
//! - Sets up linker search paths and scripts for memory.x
//! - Validates device.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    // Only the firmware binary links against the RP2040 scripts
    if env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("none") {
        println!("cargo:rustc-link-arg-bins=--nmagic");
        println!("cargo:rustc-link-arg-bins=-Tlink.x");
        println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
        println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
    }

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate device.toml configuration at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=device.toml");

    let config_path = Path::new("device.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: device.toml not found!                                   ║\n\
            ║                                                                  ║\n\
            ║  The firmware requires a device.toml configuration file.         ║\n\
            ║  Please create one in the audioswitch-firmware directory.        ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read device.toml                               ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in device.toml                       ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    let mut errors = Vec::new();
    validate_sections(&config, &mut errors);
    validate_wifi(&config, &mut errors);
    validate_mqtt(&config, &mut errors);
    validate_audio(&config, &mut errors);
    validate_input(&config, &mut errors);

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid configuration in device.toml                     ║\n\
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

    println!("cargo:warning=device.toml validated successfully");
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Keys accepted per section, mirroring the on-target parser
const SECTIONS: &[(&str, &[&str])] = &[
    ("wifi", &["ssid", "password"]),
    (
        "mqtt",
        &["broker", "port", "prefix", "client_id", "keepalive_s", "update_interval_s"],
    ),
    ("audio", &["channels", "volume_max", "rotary_step"]),
    (
        "input",
        &["button_active_low", "debounce_ms", "double_click_ms", "hold_ms"],
    ),
];

fn section<'a>(config: &'a toml::Value, name: &str) -> Option<&'a toml::value::Table> {
    config.get(name).and_then(|s| s.as_table())
}

/// Every section must be a table and contain only known keys
fn validate_sections(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(root) = config.as_table() else {
        return;
    };

    for (name, value) in root {
        let Some((_, keys)) = SECTIONS.iter().find(|(section, _)| *section == name.as_str()) else {
            errors.push(format!("Unknown section [{}]", name));
            continue;
        };
        let Some(table) = value.as_table() else {
            errors.push(format!("[{}] must be a table", name));
            continue;
        };
        for key in table.keys() {
            if !keys.contains(&key.as_str()) {
                errors.push(format!("[{}] unknown key '{}'", name, key));
            }
        }
    }

    for (name, _) in SECTIONS {
        if name != &"input" && config.get(*name).is_none() {
            errors.push(format!("Missing [{}] section", name));
        }
    }
}

fn check_string(
    table: &toml::value::Table,
    section: &str,
    key: &str,
    max_len: usize,
    required: bool,
    errors: &mut Vec<String>,
) {
    match table.get(key) {
        Some(toml::Value::String(s)) => {
            if s.len() > max_len {
                errors.push(format!("[{}] {} longer than {} bytes", section, key, max_len));
            }
            if required && s.is_empty() {
                errors.push(format!("[{}] {} cannot be empty", section, key));
            }
        }
        Some(_) => errors.push(format!("[{}] {} must be a string", section, key)),
        None if required => errors.push(format!("[{}] missing '{}'", section, key)),
        None => {}
    }
}

fn check_int(
    table: &toml::value::Table,
    section: &str,
    key: &str,
    range: std::ops::RangeInclusive<i64>,
    errors: &mut Vec<String>,
) {
    match table.get(key) {
        Some(toml::Value::Integer(n)) => {
            if !range.contains(n) {
                errors.push(format!(
                    "[{}] {} must be {}-{}",
                    section,
                    key,
                    range.start(),
                    range.end()
                ));
            }
        }
        Some(_) => errors.push(format!("[{}] {} must be an integer", section, key)),
        None => {}
    }
}

fn validate_wifi(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(wifi) = section(config, "wifi") else {
        return;
    };
    check_string(wifi, "wifi", "ssid", 32, true, errors);
    check_string(wifi, "wifi", "password", 64, false, errors);
}

fn validate_mqtt(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(mqtt) = section(config, "mqtt") else {
        return;
    };
    check_string(mqtt, "mqtt", "broker", 64, true, errors);
    check_string(mqtt, "mqtt", "prefix", 48, false, errors);
    check_string(mqtt, "mqtt", "client_id", 32, false, errors);
    check_int(mqtt, "mqtt", "port", 1..=65535, errors);
    check_int(mqtt, "mqtt", "keepalive_s", 1..=65535, errors);
    check_int(mqtt, "mqtt", "update_interval_s", 1..=65535, errors);

    if let Some(toml::Value::String(prefix)) = mqtt.get("prefix") {
        if prefix.trim_end_matches('/').is_empty() {
            errors.push("[mqtt] prefix cannot be empty".to_string());
        }
    }
}

fn validate_audio(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(audio) = section(config, "audio") else {
        return;
    };

    match audio.get("channels") {
        Some(toml::Value::Array(channels)) => {
            if channels.is_empty() || channels.len() > 4 {
                errors.push("[audio] channels must list 1-4 inputs".to_string());
            }
            let mut seen: Vec<&str> = Vec::new();
            for (i, channel) in channels.iter().enumerate() {
                match channel.as_str() {
                    Some(label) if label.is_empty() || label.len() > 16 => {
                        errors.push(format!("[audio] channel {} label must be 1-16 bytes", i));
                    }
                    Some(label) if seen.contains(&label) => {
                        errors.push(format!("[audio] duplicate channel label '{}'", label));
                    }
                    Some(label) => seen.push(label),
                    None => errors.push(format!("[audio] channel {} must be a string", i)),
                }
            }
        }
        Some(_) => errors.push("[audio] channels must be an array".to_string()),
        None => {}
    }

    check_int(audio, "audio", "volume_max", 1..=256, errors);
    check_int(audio, "audio", "rotary_step", 1..=256, errors);
}

fn validate_input(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(input) = section(config, "input") else {
        return;
    };

    if let Some(value) = input.get("button_active_low") {
        if !value.is_bool() {
            errors.push("[input] button_active_low must be true or false".to_string());
        }
    }
    for key in ["debounce_ms", "double_click_ms", "hold_ms"] {
        check_int(input, "input", key, 0..=60_000, errors);
    }
}
