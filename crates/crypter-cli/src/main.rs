//! crypter: encrypt and decrypt files with a symmetric key
//!
//! Commands:
//!   generate-key <key_file>            - write a new random key
//!   encrypt <key_file> <input> [-o]    - seal a file into an authenticated token
//!   decrypt <key_file> <input> [-o]    - verify and open a token back into a file
//!   config show                        - display the effective configuration

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crypter_core::config::CrypterConfig;
use crypter_core::paths::{default_decrypt_output, default_encrypt_output, resolve_output};
use crypter_core::CrypterError;
use crypter_crypto::{AuthenticatedCipher, CryptError, Key};

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "crypter",
    version,
    about = "A tool to encrypt and decrypt files.",
    long_about = "crypter: generate a key, then encrypt and decrypt files with authenticated tokens"
)]
struct Cli {
    /// Path to config.toml
    #[arg(
        long,
        short = 'c',
        env = "CRYPTER_CONFIG",
        default_value = "~/.config/crypter/config.toml"
    )]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides log.level
    #[arg(long, env = "CRYPTER_LOG")]
    log: Option<String>,

    /// Log format; overrides log.format
    #[arg(long, env = "CRYPTER_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a new encryption key.
    #[command(name = "generate-key")]
    GenerateKey {
        /// The path to save the new key file (e.g., mykey.key)
        key_file: PathBuf,
        /// Replace the key file if it already exists
        #[arg(long)]
        force: bool,
    },

    /// Encrypt a file.
    Encrypt {
        /// The path to the encryption key file
        key_file: PathBuf,
        /// The path to the file to encrypt
        input_file: PathBuf,
        /// The path to save the encrypted file (default: <input>.enc)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Decrypt a file.
    Decrypt {
        /// The path to the encryption key file
        key_file: PathBuf,
        /// The path to the file to decrypt
        input_file: PathBuf,
        /// The path to save the decrypted file (default: .enc swapped for .dec)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
        /// Reject files encrypted more than this many seconds ago
        #[arg(long, value_name = "SECONDS")]
        ttl: Option<u64>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the active configuration (merged defaults + config file)
    Show,
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq)]
enum LogFormat {
    Json,
    Text,
}

impl LogFormat {
    fn from_config(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = expand_tilde(&cli.config);
    let config = load_config(&config_path).await?;

    let level = cli.log.as_deref().unwrap_or(&config.log.level);
    let format = cli
        .log_format
        .unwrap_or_else(|| LogFormat::from_config(&config.log.format));
    init_logging(level, format);

    debug!(config = %config_path.display(), "configuration loaded");

    match cli.command {
        Commands::GenerateKey { key_file, force } => cmd_generate_key(&key_file, force),
        Commands::Encrypt { key_file, input_file, output } => {
            cmd_encrypt(&config, &key_file, &input_file, output.as_deref()).await
        }
        Commands::Decrypt { key_file, input_file, output, ttl } => {
            cmd_decrypt(&config, &key_file, &input_file, output.as_deref(), ttl).await
        }
        Commands::Config { action: ConfigAction::Show } => cmd_config_show(&config, &config_path),
    }
}

// ── Config loading ────────────────────────────────────────────────────────────

async fn load_config(path: &Path) -> Result<CrypterConfig> {
    let config = if path.exists() {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading config: {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing config: {}", path.display()))?
    } else {
        CrypterConfig::default()
    };
    config
        .validate()
        .with_context(|| format!("invalid config: {}", path.display()))?;
    Ok(config)
}

/// Expand `~` in path to the user's home directory
fn expand_tilde(path: &Path) -> PathBuf {
    let s = path.to_string_lossy();
    match s.strip_prefix("~/") {
        Some(rest) => {
            let home = std::env::var("HOME").unwrap_or_default();
            PathBuf::from(home).join(rest)
        }
        None => path.to_path_buf(),
    }
}

fn init_logging(level: &str, format: LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout carries command results; logs go to stderr
    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

// ── `crypter generate-key` ────────────────────────────────────────────────────

fn cmd_generate_key(key_file: &Path, force: bool) -> Result<()> {
    let key = crypter_crypto::generate().map_err(|e| crypt_error(e, key_file))?;

    match crypter_core::keyfile::write_key_file(key_file, &key, force) {
        Ok(()) => {}
        Err(CrypterError::KeyFileExists(_)) => anyhow::bail!(
            "key file '{}' already exists; pass --force to replace it",
            key_file.display()
        ),
        Err(e) => {
            return Err(e).with_context(|| {
                format!("could not write key to file '{}'", key_file.display())
            })
        }
    }

    info!(key_file = %key_file.display(), "generated key");
    println!("Key successfully generated and saved to '{}'", key_file.display());
    Ok(())
}

// ── `crypter encrypt` ─────────────────────────────────────────────────────────

async fn cmd_encrypt(
    config: &CrypterConfig,
    key_file: &Path,
    input: &Path,
    output: Option<&Path>,
) -> Result<()> {
    let key = read_file(key_file, "key file").await?;
    let data = read_file(input, "input file").await?;

    let token = crypter_crypto::seal(&data, &key).map_err(|e| crypt_error(e, key_file))?;

    let out = resolve_output(output, input, |p| default_encrypt_output(p, &config.output))?;
    write_file(&out, &token).await?;

    info!(
        input = %input.display(),
        output = %out.display(),
        plaintext_len = data.len(),
        token_len = token.len(),
        "encrypted file"
    );
    println!(
        "File '{}' encrypted successfully to '{}'",
        input.display(),
        out.display()
    );
    Ok(())
}

// ── `crypter decrypt` ─────────────────────────────────────────────────────────

async fn cmd_decrypt(
    config: &CrypterConfig,
    key_file: &Path,
    input: &Path,
    output: Option<&Path>,
    ttl_override: Option<u64>,
) -> Result<()> {
    let key = read_file(key_file, "key file").await?;
    let contents = read_file(input, "input file").await?;
    // An editor may have added a final newline to the .enc file.
    let token = contents.trim_ascii_end();

    let ttl = ttl_override.or(config.decrypt.max_age_secs);
    let plaintext = match ttl {
        Some(secs) => Key::decode(&key).and_then(|key| {
            AuthenticatedCipher::new(&key).open_with_ttl(token, Duration::from_secs(secs))
        }),
        None => crypter_crypto::open(token, &key),
    }
    .map_err(|e| crypt_error(e, key_file))?;

    let out = resolve_output(output, input, |p| default_decrypt_output(p, &config.output))?;
    write_file(&out, &plaintext).await?;

    info!(
        input = %input.display(),
        output = %out.display(),
        plaintext_len = plaintext.len(),
        ttl_secs = ?ttl,
        "decrypted file"
    );
    println!(
        "File '{}' decrypted successfully to '{}'",
        input.display(),
        out.display()
    );
    Ok(())
}

// ── `crypter config show` ─────────────────────────────────────────────────────

fn cmd_config_show(config: &CrypterConfig, config_path: &Path) -> Result<()> {
    if config_path.exists() {
        println!("# Configuration from: {}", config_path.display());
    } else {
        println!("# Configuration: defaults (no file at {})", config_path.display());
    }
    println!();
    let rendered = toml::to_string_pretty(config).context("serializing config to TOML")?;
    print!("{rendered}");
    Ok(())
}

// ── Error rendering and file glue ─────────────────────────────────────────────

/// Map a cipher error to the message shown to the user.
///
/// Format and authentication failures share one message.
fn crypt_error(err: CryptError, key_file: &Path) -> anyhow::Error {
    debug!(error = %err, "crypto operation failed");
    match err {
        CryptError::KeyFormat(reason) => {
            anyhow::anyhow!("invalid key file '{}': {reason}", key_file.display())
        }
        CryptError::Format(_) | CryptError::Authentication => {
            anyhow::anyhow!("decryption failed: invalid key or corrupted file")
        }
        CryptError::Expired { age_secs, ttl_secs } => anyhow::anyhow!(
            "decryption failed: token expired ({age_secs}s old, limit is {ttl_secs}s)"
        ),
        CryptError::ClockSkew { ahead_secs } => anyhow::anyhow!(
            "decryption failed: token timestamp is in the future ({ahead_secs}s ahead)"
        ),
        CryptError::RandomSourceUnavailable(reason) => {
            anyhow::anyhow!("secure random source unavailable: {reason}")
        }
        CryptError::Seal(reason) => anyhow::anyhow!("encryption failed: {reason}"),
    }
}

async fn read_file(path: &Path, what: &str) -> Result<Vec<u8>> {
    tokio::fs::read(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            anyhow::anyhow!("file not found: {what} '{}'", path.display())
        } else {
            anyhow::Error::new(e)
                .context(format!("could not read {what} '{}'", path.display()))
        }
    })
}

async fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    tokio::fs::write(path, contents)
        .await
        .with_context(|| format!("could not write file '{}'", path.display()))
}
