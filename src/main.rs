use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use certgen::cert::params::{DEFAULT_ORGANIZATION, DEFAULT_VALIDITY_DAYS, Validity};
use certgen::generator::{GenerationRequest, generate};
use certgen::key::KeyAlgorithm;
use certgen::output::{self, OutputPaths};
use certgen::owner::user_and_hostname;
use certgen::template::{CertificateRole, TemplateOptions};

/// Generate a self-signed X.509 certificate for development use.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Comma-separated hostnames, IPs, email addresses or URIs to generate a certificate for.
    #[arg(long, default_value = "")]
    host: String,

    /// ECDSA curve to use for the key: P224, P256, P384 or P521.
    #[arg(long, default_value = "P256")]
    ecdsa_curve: String,

    /// Generate an Ed25519 key instead of an ECDSA one.
    #[arg(long)]
    ed25519: bool,

    /// Organization name used in the certificate subject.
    #[arg(long, default_value = DEFAULT_ORGANIZATION)]
    org_name: String,

    /// Do not make the certificate its own certificate authority.
    #[arg(long)]
    no_ca: bool,

    /// Generate a client certificate (implies --no-ca).
    #[arg(long)]
    client: bool,

    /// Creation date formatted as "Jan 1 15:04:05 2011" (UTC); defaults to now.
    #[arg(long)]
    start_date: Option<String>,

    /// How long the certificate is valid for, e.g. "720h" or "30days"; defaults to 365 days.
    #[arg(long)]
    duration: Option<humantime::Duration>,

    /// Directory to write the certificate and key into.
    #[arg(long)]
    out_dir: Option<PathBuf>,
}

/// The `--duration` value, or the default certificate lifetime.
fn validity_duration(duration: Option<humantime::Duration>) -> anyhow::Result<time::Duration> {
    match duration {
        Some(duration) => time::Duration::try_from(*duration)
            .with_context(|| format!("duration {duration} is out of range")),
        None => Ok(time::Duration::days(DEFAULT_VALIDITY_DAYS)),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args = Args::parse();

    let algorithm = KeyAlgorithm::select(&args.ecdsa_curve, args.ed25519)?;
    let duration = validity_duration(args.duration)?;
    let validity = Validity::from_start_date(args.start_date.as_deref(), duration)?;
    let role = CertificateRole::from_flags(args.client, args.no_ca);

    let options = TemplateOptions::builder()
        .organization(args.org_name)
        .organizational_unit(user_and_hostname())
        .role(role)
        .validity(validity)
        .build();
    let request = GenerationRequest::builder()
        .hosts(args.host)
        .algorithm(algorithm)
        .options(options)
        .build();

    let generated = generate(&request)?;

    let paths = OutputPaths::for_role(args.out_dir.as_deref(), role);
    output::write_certificate(&paths.certificate, &generated.certificate_pem)?;
    output::write_private_key(&paths.private_key, &generated.private_key_pem)?;

    print!("{}", output::summary(&request.hosts, &paths));
    Ok(())
}
