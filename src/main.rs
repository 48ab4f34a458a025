use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use vpk::cli::{
    create_from_dir, extract_from_vpk, list_contents, show_info, show_info_json, CreateOptions,
    OpenOptions,
};
use vpk::package::default_destination;
use vpk::{Compression, Encryption, PackageConfig, VpkError};

/// Version info from build.rs
const VERSION: &str = env!("VPK_VERSION");
const PROFILE: &str = env!("VPK_PROFILE");
const GIT_HASH: &str = env!("VPK_GIT_HASH");

#[derive(Parser)]
#[command(name = "vpk")]
#[command(author, about = "Encrypted, compressed directory packages", long_about = None)]
struct Cli {
    /// Print version
    #[arg(short = 'V', long)]
    version: bool,

    /// Configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only print warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Phrases the package key is derived from
#[derive(Args)]
struct Phrases {
    /// Key phrase
    #[arg(long, env = "VPK_KEY", required = true, hide_env_values = true)]
    key: String,

    /// IV phrase (salts the key derivation)
    #[arg(long, env = "VPK_IV", required = true, hide_env_values = true)]
    iv: String,
}

/// Overrides for the configured modes
#[derive(Args)]
struct Modes {
    /// Encryption mode: chacha20, gcm, ctr
    #[arg(long, value_parser = parse_encryption)]
    encryption: Option<Encryption>,

    /// Compression mode: none, gzip, zstd, lz4, brotli
    #[arg(long, value_parser = parse_compression)]
    compression: Option<Compression>,
}

#[derive(Subcommand)]
enum Commands {
    /// Pack a directory into a VPK file
    #[command(alias = "c")]
    Create {
        /// Directory to pack
        input: PathBuf,

        /// Output package (defaults to <input>.vpk)
        output: Option<PathBuf>,

        /// Author recorded in the header
        #[arg(long)]
        author: Option<String>,

        #[command(flatten)]
        phrases: Phrases,

        #[command(flatten)]
        modes: Modes,
    },

    /// Unpack a VPK file into a directory
    #[command(alias = "x")]
    Extract {
        /// Package to read
        input: PathBuf,

        /// Output directory
        output: PathBuf,

        #[command(flatten)]
        phrases: Phrases,

        #[command(flatten)]
        modes: Modes,
    },

    /// List the folders and files in a VPK file
    #[command(alias = "l")]
    List {
        /// Package to read
        input: PathBuf,

        #[command(flatten)]
        phrases: Phrases,

        #[command(flatten)]
        modes: Modes,
    },

    /// Show the header of a VPK file
    #[command(alias = "i")]
    Info {
        /// Package to inspect
        file: PathBuf,

        /// Print the header as JSON
        #[arg(long)]
        json: bool,
    },
}

fn parse_encryption(s: &str) -> Result<Encryption, String> {
    s.parse().map_err(|e| format!("{}", e))
}

fn parse_compression(s: &str) -> Result<Compression, String> {
    s.parse().map_err(|e| format!("{}", e))
}

fn init_tracing(verbose: bool, quiet: bool) {
    let level = if quiet {
        "warn"
    } else if verbose {
        "debug"
    } else {
        "info"
    };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("vpk={}", level))),
        )
        .with_writer(std::io::stderr)
        .finish();

    // Only fails if a subscriber is already installed
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn load_config(path: Option<&PathBuf>, modes: Modes) -> Result<PackageConfig, VpkError> {
    let mut config = PackageConfig::discover(path.map(PathBuf::as_path))?;
    if let Some(encryption) = modes.encryption {
        config.encryption = encryption;
    }
    if let Some(compression) = modes.compression {
        config.compression = compression;
    }
    Ok(config)
}

fn run(config_path: Option<PathBuf>, command: Commands) -> Result<(), VpkError> {
    match command {
        Commands::Create {
            input,
            output,
            author,
            phrases,
            modes,
        } => {
            let mut config = load_config(config_path.as_ref(), modes)?;
            if let Some(author) = author {
                config.author = author;
            }
            let options = CreateOptions {
                key: phrases.key,
                iv: phrases.iv,
                config,
            };
            let output = output.unwrap_or_else(|| default_destination(&input));

            let report = create_from_dir(&input, &output, &options)?;
            println!(
                "Packed {} files into {} ({} bytes, {:.2} sec)",
                report.files,
                output.display(),
                report.package_size,
                report.elapsed.as_secs_f64()
            );
            Ok(())
        }

        Commands::Extract {
            input,
            output,
            phrases,
            modes,
        } => {
            let options = OpenOptions {
                key: phrases.key,
                iv: phrases.iv,
                config: load_config(config_path.as_ref(), modes)?,
            };
            let written = extract_from_vpk(&input, &output, &options)?;
            println!("Extracted {} files to {}", written, output.display());
            Ok(())
        }

        Commands::List {
            input,
            phrases,
            modes,
        } => {
            let options = OpenOptions {
                key: phrases.key,
                iv: phrases.iv,
                config: load_config(config_path.as_ref(), modes)?,
            };
            print!("{}", list_contents(&input, &options)?);
            Ok(())
        }

        Commands::Info { file, json } => {
            if json {
                println!("{}", show_info_json(&file)?);
            } else {
                print!("{}", show_info(&file)?);
            }
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.version {
        println!("vpk {} {} ({})", PROFILE, VERSION, GIT_HASH);
        return ExitCode::SUCCESS;
    }

    init_tracing(cli.verbose, cli.quiet);

    let command = match cli.command {
        Some(cmd) => cmd,
        None => {
            use clap::CommandFactory;
            let _ = Cli::command().print_help();
            println!();
            return ExitCode::SUCCESS;
        }
    };

    match run(cli.config, command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
