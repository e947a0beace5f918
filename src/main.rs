use anyhow::Result;
use std::path::PathBuf;

use keepsake::backup::BackupExporter;
use keepsake::config::Config;
use keepsake::db::Database;
use keepsake::normalize::{self, RewriteDirection};
use keepsake::wipe::{purge_media_root, DataWipe};

enum Command {
    Backup { output: Option<PathBuf> },
    NormalizeUrls { rollback: bool },
    Wipe { confirmed: bool },
    PurgeMedia,
}

fn parse_args() -> (Option<PathBuf>, Command) {
    let args: Vec<String> = std::env::args().collect();
    let mut config_path = None;
    let mut command = None;
    let mut output = None;
    let mut rollback = false;
    let mut confirmed = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("keepsake {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                } else {
                    eprintln!("Error: --config requires a path argument");
                    std::process::exit(1);
                }
            }
            "--output" | "-o" => {
                if i + 1 < args.len() {
                    output = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                } else {
                    eprintln!("Error: --output requires a path argument");
                    std::process::exit(1);
                }
            }
            "--rollback" => rollback = true,
            "--yes" => confirmed = true,
            "backup" | "normalize-urls" | "wipe" | "purge-media" if command.is_none() => {
                command = Some(args[i].clone());
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_help();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let command = match command.as_deref() {
        Some("backup") => Command::Backup { output },
        Some("normalize-urls") => Command::NormalizeUrls { rollback },
        Some("wipe") => Command::Wipe { confirmed },
        Some("purge-media") => Command::PurgeMedia,
        _ => {
            print_help();
            std::process::exit(1);
        }
    };

    (config_path, command)
}

fn print_help() {
    println!(
        r#"keepsake - diary/photo/countdown backend admin tool

USAGE:
    keepsake [OPTIONS] <COMMAND>

COMMANDS:
    backup              Export the media tree as a dated ZIP archive
    normalize-urls      Rewrite legacy /uploads asset URLs to /media
                        (--rollback reverses the rewrite)
    wipe                Delete ALL data and purge the media root
                        (requires --yes)
    purge-media         Recreate an empty media root; cleanup step for a
                        wipe whose purge did not complete

OPTIONS:
    --config, -c PATH   Path to config file
    --output, -o PATH   Output directory for backup archives
    --version, -V       Show version
    --help, -h          Show this help message

ENVIRONMENT:
    KEEPSAKE_LOG        Log level (trace, debug, info, warn, error)

Config file location: $XDG_CONFIG_HOME/keepsake/config.toml"#
    );
}

fn main() -> Result<()> {
    let (config_path, command) = parse_args();

    // Initialize logging (uses journald on Linux, file fallback otherwise)
    let _ = keepsake::logging::init(Some(Config::config_dir().join("logs")));

    // Load configuration
    let config = match config_path {
        Some(path) => Config::load_from(&path)?,
        None => Config::load()?,
    };

    // Initialize database
    let mut db = Database::open(&config.db_path)?;
    db.initialize()?;

    match command {
        Command::Backup { output } => {
            let exporter = BackupExporter::new(&config.storage.media_root, &config.backup);
            let mut archive = exporter.export()?;
            let dir = output.unwrap_or_else(|| config.backup.output_dir.clone());
            let path = archive.persist_to(&dir)?;
            println!("Wrote {} ({} entries)", path.display(), archive.entries);
        }
        Command::NormalizeUrls { rollback } => {
            let direction =
                if rollback { RewriteDirection::Backward } else { RewriteDirection::Forward };
            let rewritten = normalize::apply(&db, direction)?;
            println!("Rewrote {rewritten} asset URL(s)");
        }
        Command::Wipe { confirmed } => {
            if !confirmed {
                eprintln!("wipe is irreversible; pass --yes to confirm");
                std::process::exit(1);
            }
            DataWipe::new(&mut db, &config.storage.media_root).execute()?;
            println!("All data wiped");
        }
        Command::PurgeMedia => {
            purge_media_root(&config.storage.media_root)?;
            println!("Media root purged: {}", config.storage.media_root.display());
        }
    }

    Ok(())
}
