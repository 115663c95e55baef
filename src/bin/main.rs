//! Keybox certificate inspection CLI
//!
//! Lists and searches the X.509 certificates stored in a keybox file and
//! checks certificate signatures against an issuer certificate.

use clap::{Parser, Subcommand, ValueEnum};
use keybox_certcheck::{
    config::{ConfigManager, ExportFormat, KeyboxConfiguration},
    error::KeyboxError,
    load_certificate,
    services::certificate_fingerprint,
    Blob, HashAlgorithm, KeyboxHandle, SearchDescriptor, SearchOutcome, SerialNumber,
};
use miette::{Context, IntoDiagnostic, Result};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "kbx-certcheck")]
#[command(about = "Search keybox files and check X.509 certificate signatures")]
#[command(long_about = "
kbx-certcheck - keybox certificate inspection utility

EXAMPLES:
    # List every blob in the default keybox
    kbx-certcheck list

    # Find certificates issued by a CA
    kbx-certcheck find --issuer 'CN=Example CA,O=Example'

    # Find one certificate by issuer and serial number
    kbx-certcheck find --issuer 'CN=Example CA,O=Example' --serial 01:a2:ff

    # Check a certificate against its issuer
    kbx-certcheck verify --issuer-cert ca.pem --cert leaf.der

ENVIRONMENT VARIABLES:
    GNUPGHOME       Directory holding the default pubring.kbx
    RUST_LOG        Logging level (overrides the configured log_level)
")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to the per-user config directory)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all blobs of a keybox
    List {
        /// Keybox file (overrides config)
        #[arg(short, long, value_name = "PATH")]
        keybox: Option<PathBuf>,
    },

    /// Find X.509 certificates by issuer, issuer and serial, or subject
    Find {
        /// Keybox file (overrides config)
        #[arg(short, long, value_name = "PATH")]
        keybox: Option<PathBuf>,

        /// Issuer distinguished name, compared exactly
        #[arg(long, required_unless_present = "subject")]
        issuer: Option<String>,

        /// Serial number in hex (requires --issuer)
        #[arg(long, requires = "issuer")]
        serial: Option<SerialNumber>,

        /// Subject distinguished name, compared exactly
        #[arg(long, conflicts_with = "issuer")]
        subject: Option<String>,

        /// Write the first match as DER to this file
        #[arg(short, long, value_name = "FILE")]
        export: Option<PathBuf>,
    },

    /// Check the signature of a certificate against its issuer
    Verify {
        /// Issuer certificate (PEM or DER)
        #[arg(long, value_name = "FILE")]
        issuer_cert: PathBuf,

        /// Certificate to check (PEM or DER)
        #[arg(long, value_name = "FILE")]
        cert: PathBuf,

        /// Also print the SHA-256 fingerprints of both certificates
        #[arg(short, long)]
        verbose: bool,
    },

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Create default configuration file
    Init,

    /// Set a configuration value
    Set {
        /// Configuration key (`keybox_path`, `max_blob_size`, `log_level`)
        key: String,
        /// Configuration value
        value: String,
    },

    /// Export configuration
    Export {
        /// Export format
        #[arg(short, long, value_enum, default_value = "toml")]
        format: ExportFormatArg,
        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Import configuration
    Import {
        /// Configuration file to import
        file: PathBuf,
        /// Import format
        #[arg(short, long, value_enum, default_value = "toml")]
        format: ExportFormatArg,
    },
}

#[derive(ValueEnum, Clone)]
enum ExportFormatArg {
    Toml,
    Json,
    Yaml,
}

impl From<ExportFormatArg> for ExportFormat {
    fn from(arg: ExportFormatArg) -> Self {
        match arg {
            ExportFormatArg::Toml => ExportFormat::Toml,
            ExportFormatArg::Json => ExportFormat::Json,
            ExportFormatArg::Yaml => ExportFormat::Yaml,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_manager = match &cli.config {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new()?,
    };
    let config = config_manager.load_or_default()?;

    // Initialize logging
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_level.as_str()),
    )
    .init();

    match cli.command {
        Commands::List { keybox } => {
            handle_list_command(&keybox_config(&config, keybox))?;
        }

        Commands::Find {
            keybox,
            issuer,
            serial,
            subject,
            export,
        } => {
            let descriptor = match (issuer, serial, subject) {
                (Some(issuer), Some(serial), _) => SearchDescriptor::issuer_serial(issuer, serial),
                (Some(issuer), None, _) => SearchDescriptor::issuer(issuer),
                (None, _, Some(subject)) => SearchDescriptor::subject(subject),
                (None, _, None) => miette::bail!("either --issuer or --subject is required"),
            };
            handle_find_command(
                &keybox_config(&config, keybox),
                &descriptor,
                export.as_deref(),
            )?;
        }

        Commands::Verify {
            issuer_cert,
            cert,
            verbose,
        } => {
            handle_verify_command(&issuer_cert, &cert, verbose)?;
        }

        Commands::Config(config_cmd) => {
            handle_config_command(&config_manager, config_cmd)?;
        }
    }

    Ok(())
}

fn keybox_config(config: &KeyboxConfiguration, keybox: Option<PathBuf>) -> KeyboxConfiguration {
    let mut config = config.clone();
    if let Some(path) = keybox {
        config.keybox_path = path;
    }
    config
}

fn describe_blob(index: usize, blob: &Blob) -> String {
    let uid = |i| {
        blob.user_id(i)
            .map_or_else(|| "-".to_string(), |name| String::from_utf8_lossy(name).into_owned())
    };
    match blob.header() {
        Ok(header) => {
            let cert_len = header.certificate.map_or(0, |range| range.len());
            let serial = blob
                .serial_number()
                .map_or_else(|| "-".to_string(), hex::encode_upper);
            format!(
                "#{index} {} v{} cert={cert_len}B serial={serial} issuer=\"{}\" subject=\"{}\"",
                header.blob_type,
                header.version,
                uid(0),
                uid(1)
            )
        }
        Err(e) => format!("#{index} malformed blob ({} bytes): {e}", blob.len()),
    }
}

fn handle_list_command(config: &KeyboxConfiguration) -> Result<()> {
    println!("📋 Keybox: {}", config.keybox_path.display());

    let mut handle = KeyboxHandle::from_config(config);
    let mut descriptor = SearchDescriptor::first();
    let mut count = 0;

    while handle.search(std::slice::from_ref(&descriptor))? == SearchOutcome::Found {
        if let Some(blob) = handle.found_blob() {
            count += 1;
            println!("  {}", describe_blob(count, blob));
        }
        descriptor = SearchDescriptor::next();
    }

    println!("{count} blob(s)");
    Ok(())
}

fn handle_find_command(
    config: &KeyboxConfiguration,
    descriptor: &SearchDescriptor,
    export: Option<&Path>,
) -> Result<()> {
    log::info!(
        "Searching {} ({})",
        config.keybox_path.display(),
        descriptor.mode()
    );

    let mut handle = KeyboxHandle::from_config(config);
    let mut count = 0;

    while handle.search(std::slice::from_ref(descriptor))?.is_found() {
        count += 1;
        if let Some(blob) = handle.found_blob() {
            println!("  {}", describe_blob(count, blob));
        }

        // a bad certificate is reported in place; the scan goes on
        match handle
            .get_certificate()
            .and_then(|cert| certificate_fingerprint(&cert, HashAlgorithm::Sha256))
        {
            Ok(fingerprint) => {
                println!("     sha256 {}", hex::encode_upper(fingerprint.as_slice()));
            }
            Err(e) => {
                log::warn!("Match #{count}: {e}");
                println!("     ❌ {e}");
            }
        }

        if count == 1 {
            if let Some(path) = export {
                let der = handle
                    .found_blob()
                    .ok_or(KeyboxError::NothingFound)?
                    .certificate_der()
                    .map_err(KeyboxError::from)?;
                std::fs::write(path, der)
                    .into_diagnostic()
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!("✅ Certificate exported to: {}", path.display());
            }
        }
    }

    if count == 0 {
        println!("❌ No matching certificate found");
    }
    Ok(())
}

fn read_certificate(path: &Path) -> Result<x509_cert::Certificate> {
    let data = std::fs::read(path)
        .into_diagnostic()
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(load_certificate(&data)?)
}

fn handle_verify_command(issuer_path: &Path, cert_path: &Path, verbose: bool) -> Result<()> {
    let issuer = read_certificate(issuer_path)?;
    let cert = read_certificate(cert_path)?;

    if verbose {
        for (label, c) in [("issuer", &issuer), ("certificate", &cert)] {
            let fingerprint = certificate_fingerprint(c, HashAlgorithm::Sha256)?;
            println!("  {label}: sha256 {}", hex::encode_upper(fingerprint.as_slice()));
        }
    }

    match keybox_certcheck::verify_signature(&issuer, &cert) {
        Ok(()) => {
            println!("✅ Good signature");
            Ok(())
        }
        Err(KeyboxError::BadSignature) => {
            println!("❌ BAD signature");
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}

fn handle_config_command(config_manager: &ConfigManager, config_cmd: ConfigCommands) -> Result<()> {
    match config_cmd {
        ConfigCommands::Show => match config_manager.load() {
            Ok(config) => {
                println!("📋 Current Configuration:");
                println!("  Keybox path: {}", config.keybox_path.display());
                println!("  Maximum blob size: {} bytes", config.max_blob_size);
                println!("  Log level: {}", config.log_level);
                println!(
                    "  Configuration file: {}",
                    config_manager.config_path().display()
                );
            }
            Err(_) => {
                println!("📋 No configuration file found. Use 'config init' to create one.");
            }
        },

        ConfigCommands::Init => {
            let config = config_manager.load_or_default()?;
            config_manager.save(&config)?;
            println!(
                "✅ Configuration initialized: {}",
                config_manager.config_path().display()
            );
            println!("   Edit the file to customize settings, or use 'config set' commands.");
        }

        ConfigCommands::Set { key, value } => {
            config_manager.update_value(&key, &value)?;
            println!("✅ Configuration updated: {key} = {value}");
        }

        ConfigCommands::Export { format, output } => {
            let content = config_manager.export_config(format.into())?;

            if let Some(output_path) = output {
                std::fs::write(&output_path, content).into_diagnostic()?;
                println!("✅ Configuration exported to: {}", output_path.display());
            } else {
                println!("{content}");
            }
        }

        ConfigCommands::Import { file, format } => {
            let content = std::fs::read_to_string(&file).into_diagnostic()?;
            config_manager.import_config(&content, format.into())?;
            println!("✅ Configuration imported from: {}", file.display());
        }
    }

    Ok(())
}
