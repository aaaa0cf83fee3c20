//! Document finalization from the command line
//!
//! Reads a PDF and a PNG signature from disk, runs the finalization pipeline
//! and writes the finalized PDF next to an optional JSON report.

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, ValueEnum};
use docfinal_core::data_uri::{self, DataUri, PDF_MEDIA_TYPE, PNG_MEDIA_TYPE};
use docfinal_core::{
    finalize_document, CallerContext, FinalizeConfig, FinalizeRequest, PageSize, SignerInput,
    SignerRole,
};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Role {
    Sender,
    Recipient,
}

impl From<Role> for SignerRole {
    fn from(role: Role) -> Self {
        match role {
            Role::Sender => SignerRole::Sender,
            Role::Recipient => SignerRole::Recipient,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "docfinal")]
#[command(
    version,
    about = "Watermark, sign and certify a PDF in one pass"
)]
struct Args {
    /// Source PDF
    #[arg(short, long)]
    input: PathBuf,

    /// Signature image (PNG)
    #[arg(short, long)]
    signature: PathBuf,

    /// Which box receives the signature
    #[arg(short, long, value_enum)]
    role: Role,

    /// Signer's full name
    #[arg(short, long)]
    name: String,

    /// Signing date (YYYY-MM-DD), defaults to today
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Signer email shown on the certificate
    #[arg(long)]
    email: Option<String>,

    /// User agent used for the device descriptor
    #[arg(long)]
    user_agent: Option<String>,

    /// Display name, defaults to the input file name
    #[arg(long)]
    document_name: Option<String>,

    /// Certificate page size: letter, a4 or legal (defaults to the last page, or letter when it is too small)
    #[arg(long)]
    page_size: Option<String>,

    /// Where to write the finalized PDF
    #[arg(short, long)]
    output: PathBuf,

    /// Optional JSON report path
    #[arg(long)]
    report: Option<PathBuf>,
}

/// Raw PDF bytes carried by the finalized data URI
fn pdf_payload(uri: &str) -> Result<Vec<u8>> {
    let finalized = DataUri::parse(uri)
        .map_err(anyhow::Error::msg)
        .context("Finalized document is not a data URI")?;
    if !finalized.is(PDF_MEDIA_TYPE) {
        bail!("Finalized document has media type {}", finalized.media_type);
    }
    if finalized.data.is_empty() {
        bail!("Finalized document is empty");
    }
    Ok(finalized.data)
}

fn main() -> Result<()> {
    let args = Args::parse();

    // stdout carries the summary, logs go to stderr
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = FinalizeConfig::from_env()?;
    if let Some(size) = &args.page_size {
        config = config.with_certificate_page_size(PageSize::parse(size)?);
    }

    let pdf = std::fs::read(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let signature = std::fs::read(&args.signature)
        .with_context(|| format!("Failed to read {}", args.signature.display()))?;

    let document_name = args.document_name.clone().or_else(|| {
        args.input
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
    });

    let request = FinalizeRequest {
        source_document: data_uri::encode(PDF_MEDIA_TYPE, &pdf),
        document_name,
        signer: SignerInput {
            role: Some(args.role.into()),
            full_name: Some(args.name.clone()),
            signing_date: Some(args.date.unwrap_or_else(|| Utc::now().date_naive())),
            signature_image: Some(data_uri::encode(PNG_MEDIA_TYPE, &signature)),
        },
        caller: CallerContext {
            email: args.email.clone(),
            user_agent: args.user_agent.clone(),
        },
    };

    let output = finalize_document(&request, config)?;

    let bytes = pdf_payload(&output.finalized_document)?;
    std::fs::write(&args.output, &bytes)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    if let Some(path) = &args.report {
        let json = serde_json::to_string_pretty(&output.report)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    tracing::info!(
        output = %args.output.display(),
        pages = output.report.output_page_count,
        "Wrote finalized document"
    );
    println!(
        "{}: {} pages, signature {}",
        output.document_display_name, output.report.output_page_count, output.report.signature_id
    );
    Ok(())
}
