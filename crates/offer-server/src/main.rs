//! Offer letter command line tool and signature server

mod errors;
mod routes;
mod state;

use anyhow::Context;
use clap::{Arg, ArgAction, ArgMatches, Command};
use offer_core::services::load_candidate;
use offer_core::{GenerateOptions, OfferPipeline, OfferSettings};
use std::net::SocketAddr;
use std::path::Path;
use tower_http::cors::CorsLayer;

use crate::routes::build_router;
use crate::state::AppState;

fn cli() -> Command {
    Command::new("offer-server")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Generate, send and collect signatures for offer letters")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("settings")
                .long("settings")
                .short('s')
                .value_name("FILE")
                .help("Settings file (TOML or JSON); OFFER__* variables override it")
                .global(true),
        )
        .subcommand(
            Command::new("generate")
                .about("Fill the profile's template for a candidate and convert it to PDF")
                .arg(Arg::new("profile").required(true).help("Company profile name"))
                .arg(
                    Arg::new("candidate")
                        .required(true)
                        .value_name("CANDIDATE_JSON")
                        .help("Candidate data file"),
                )
                .arg(
                    Arg::new("email")
                        .long("email")
                        .help("Email the PDF to the candidate")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("no-pdf")
                        .long("no-pdf")
                        .help("Only write the DOCX")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("send-email")
                .about("Email an already generated offer letter")
                .arg(Arg::new("profile").required(true).help("Company profile name"))
                .arg(
                    Arg::new("candidate")
                        .required(true)
                        .value_name("CANDIDATE_JSON")
                        .help("Candidate data file"),
                ),
        )
        .subcommand(
            Command::new("serve")
                .about("Run the signature server")
                .arg(
                    Arg::new("port")
                        .long("port")
                        .short('p')
                        .value_name("PORT")
                        .help("Listen port (defaults to server.port)")
                        .value_parser(clap::value_parser!(u16)),
                ),
        )
}

#[tokio::main]
async fn main() {
    // Initialize logging with INFO as default if RUST_LOG not set
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = cli().get_matches();
    if let Err(e) = run(matches).await {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(matches: ArgMatches) -> anyhow::Result<()> {
    let settings_path = matches.get_one::<String>("settings").map(Path::new);
    let settings = OfferSettings::load(settings_path)?;
    if let Some(path) = settings_path {
        log::info!("Loaded settings from {}", path.display());
    }

    let pipeline = OfferPipeline::from_settings(settings);

    match matches.subcommand() {
        Some(("generate", sub)) => generate(&pipeline, sub).await,
        Some(("send-email", sub)) => send_email(&pipeline, sub).await,
        Some(("serve", sub)) => serve(pipeline, sub.get_one::<u16>("port").copied()).await,
        _ => unreachable!("subcommand_required"),
    }
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> anyhow::Result<&'a str> {
    matches
        .get_one::<String>(name)
        .map(String::as_str)
        .with_context(|| format!("missing <{}>", name))
}

async fn generate(pipeline: &OfferPipeline, matches: &ArgMatches) -> anyhow::Result<()> {
    let profile = required(matches, "profile")?;
    let candidate_file = required(matches, "candidate")?;
    let candidate = load_candidate(candidate_file)?;

    let options = GenerateOptions {
        convert_pdf: !matches.get_flag("no-pdf"),
        send_email: matches.get_flag("email"),
    };
    if options.send_email && !options.convert_pdf {
        log::warn!("--email has no effect with --no-pdf");
    }

    let generated = pipeline.generate(profile, &candidate, options).await?;

    log::info!("DOCX: {}", generated.docx_path.display());
    if let Some(pdf) = &generated.pdf_path {
        log::info!("PDF: {}", pdf.display());
    }
    if generated.emailed {
        log::info!("Offer emailed to {}", candidate.email);
    }
    Ok(())
}

async fn send_email(pipeline: &OfferPipeline, matches: &ArgMatches) -> anyhow::Result<()> {
    let profile = required(matches, "profile")?;
    let candidate_file = required(matches, "candidate")?;
    let candidate = load_candidate(candidate_file)?;

    let pdf = pipeline.send_offer(profile, &candidate).await?;
    log::info!("Sent {} to {}", pdf.display(), candidate.email);
    Ok(())
}

async fn serve(pipeline: OfferPipeline, port: Option<u16>) -> anyhow::Result<()> {
    let port = port.unwrap_or(pipeline.settings().server.port);
    let web_dir = pipeline.settings().web_dir.clone();

    let app = build_router(AppState::new(pipeline)).layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", port).parse()?;
    log::info!("Signature server listening on {} (static files from {})", addr, web_dir.display());

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("cannot bind {}", addr))?;
    axum::serve(listener, app).await?;
    Ok(())
}
