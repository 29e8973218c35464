#![forbid(unsafe_code)]

//! Sigtuna CLI: verify and list signed ZIP, OpenDocument and XML files.

use clap::{Parser, Subcommand};
use sigtuna::document::{
    service_for_content_type, DocumentContext, DocumentService, VerificationConfig,
};
use sigtuna::Error;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;

/// Exit code when no signature is accepted.
const EXIT_NOT_SIGNED: i32 = 2;

#[derive(Parser)]
#[command(
    name = "sigtuna",
    about = "Sigtuna: verify signatures in ZIP, OpenDocument and XML containers",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify the signatures of a signed document
    Verify {
        /// Signed document
        file: PathBuf,

        /// Unsigned original the signed document must extend
        #[arg(long)]
        original: Option<PathBuf>,

        /// MIME type (default: guessed from the file extension)
        #[arg(long = "content-type")]
        content_type: Option<String>,

        /// TOML verification settings
        #[arg(long)]
        config: Option<PathBuf>,

        /// Also print rejected signatures
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print an HTML listing of a document
    List {
        /// Document to list
        file: PathBuf,

        /// MIME type (default: guessed from the file extension)
        #[arg(long = "content-type")]
        content_type: Option<String>,

        /// Language tag of the listing
        #[arg(long, default_value = "en")]
        language: String,
    },

    /// List supported algorithms
    Info,
}

fn main() {
    sigtuna::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Verify {
            file,
            original,
            content_type,
            config,
            verbose,
        } => cmd_verify(file, original, content_type, config, verbose),

        Commands::List {
            file,
            content_type,
            language,
        } => cmd_list(file, content_type, language),

        Commands::Info => cmd_info(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn cmd_verify(
    file: PathBuf,
    original: Option<PathBuf>,
    content_type: Option<String>,
    config: Option<PathBuf>,
    verbose: bool,
) -> Result<(), Error> {
    let config = match config {
        Some(path) => VerificationConfig::from_file(path)?,
        None => VerificationConfig::default(),
    };
    let fingerprint_uri = config.fingerprint_digest_uri()?;
    let content_type = content_type.unwrap_or_else(|| guess_content_type(&file).to_owned());
    let service = service_for_content_type(DocumentContext::accept_all(config), &content_type)?;

    let document = read_file(&file)?;
    let original = original.as_deref().map(read_file).transpose()?;
    service.check_incoming_document(&document)?;

    if verbose {
        eprintln!("Verifying: {} ({content_type})", file.display());
    }
    let report = service.verify_signatures_report(&document, original.as_deref())?;

    for (n, info) in report.signatures.iter().enumerate() {
        let signing_time = info
            .signing_time()
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "-".to_owned());
        println!(
            "OK {}: {} signed at {} (certificate {})",
            n + 1,
            info.signer().subject(),
            signing_time,
            info.certificate_fingerprint(fingerprint_uri)?
        );
        if verbose {
            for role in info.claimed_roles() {
                println!("  role: {role}");
            }
            if let Some(city) = info.production_place().and_then(|p| p.city.as_deref()) {
                println!("  place: {city}");
            }
        }
    }
    if verbose {
        for rejection in &report.rejections {
            println!("REJECTED {rejection}");
        }
    }

    if report.signatures.is_empty() {
        eprintln!("no accepted signature in {}", file.display());
        process::exit(EXIT_NOT_SIGNED);
    }
    Ok(())
}

fn cmd_list(file: PathBuf, content_type: Option<String>, language: String) -> Result<(), Error> {
    let content_type = content_type.unwrap_or_else(|| guess_content_type(&file).to_owned());
    let service = service_for_content_type(DocumentContext::default(), &content_type)?;
    let document = read_file(&file)?;
    let visualization = service.visualize_document(&document, &language)?;
    std::io::stdout()
        .write_all(&visualization.data)
        .map_err(|e| Error::Other(format!("stdout: {e}")))
}

fn cmd_info() -> Result<(), Error> {
    println!("Sigtuna: signed container verification");
    println!();
    println!("Supported container formats:");
    println!("  ZIP packages, OpenDocument (META-INF/*signatures*.xml)");
    println!("  XML documents with enveloped signatures");
    println!();
    println!("Supported digest algorithms:");
    for uri in sigtuna::crypto::digest::supported() {
        println!("  {uri}");
    }
    println!();
    println!("Supported signature algorithms:");
    for uri in sigtuna::crypto::sign::supported() {
        println!("  {uri}");
    }
    println!();
    println!("Supported transforms:");
    for uri in sigtuna::transforms::pipeline::supported() {
        println!("  {uri}");
    }
    Ok(())
}

// ── Utility functions ────────────────────────────────────────────────

fn read_file(path: &Path) -> Result<Vec<u8>, Error> {
    std::fs::read(path).map_err(|e| Error::Other(format!("{}: {e}", path.display())))
}

fn guess_content_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("xml") => "text/xml",
        Some("odt") => "application/vnd.oasis.opendocument.text",
        Some("ods") => "application/vnd.oasis.opendocument.spreadsheet",
        Some("odp") => "application/vnd.oasis.opendocument.presentation",
        Some("odg") => "application/vnd.oasis.opendocument.graphics",
        _ => "application/zip",
    }
}
