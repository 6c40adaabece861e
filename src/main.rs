use std::time::Duration;

use anyhow::Result;
use aptfinder::config::EmailSettings;
use aptfinder::console::Console;
use aptfinder::filter::UnitCriteria;
use aptfinder::http::{Fetcher, HeaderProfile, ReqwestTransport, RetryPolicy, ThreadSleeper};
use aptfinder::mailer::SmtpMailer;
use aptfinder::models::ScrapeOutcome;
use aptfinder::parser::LENIENT_AVAILABLE;
use aptfinder::pipeline::{Pipeline, ScrapingOptions, DEFAULT_PROPERTY_NAME};
use aptfinder::report::{Report, Reporter};
use chrono::Local;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Aptfinder - checks a leasing site for available apartments")]
struct Args {
    /// Floorplan page to start from (repeat to add fallbacks, tried in order)
    #[clap(short, long = "url")]
    urls: Vec<String>,

    /// Script variable that holds the floorplan data
    #[clap(long, default_value = "pageData")]
    identifier: String,

    /// Bedrooms a floorplan must have
    #[clap(long, default_value = "2")]
    beds: i64,

    /// Bathrooms a floorplan must have
    #[clap(long, default_value = "2.0")]
    baths: f64,

    /// Attempts per URL before giving up
    #[clap(short = 'a', long, default_value = "3")]
    max_attempts: u32,

    /// Per-request timeout in seconds
    #[clap(short, long, default_value = "30")]
    timeout: u64,

    /// Send only the basic browser headers
    #[clap(long)]
    basic_headers: bool,

    /// Property name shown in reports
    #[clap(long, default_value = DEFAULT_PROPERTY_NAME)]
    property_name: String,

    /// Email the report (same as EMAIL_RESULTS=true)
    #[clap(short, long, conflicts_with = "no_email")]
    email: bool,

    /// Never email, even if EMAIL_RESULTS=true
    #[clap(long)]
    no_email: bool,

    /// Send plain-text emails without the HTML part
    #[clap(long)]
    plain_email: bool,

    /// Print the apartments as JSON after the report
    #[clap(long)]
    json: bool,

    /// Enable debug output
    #[clap(short, long)]
    debug: bool,
}

impl Args {
    fn scraping_options(&self) -> ScrapingOptions {
        let mut options = ScrapingOptions {
            identifier: self.identifier.clone(),
            criteria: self.criteria(),
            ..Default::default()
        };
        if !self.urls.is_empty() {
            options.entry_urls = self.urls.clone();
        }
        options
    }

    fn criteria(&self) -> UnitCriteria {
        UnitCriteria {
            beds: self.beds,
            baths: self.baths,
        }
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            profile: if self.basic_headers {
                HeaderProfile::Basic
            } else {
                HeaderProfile::Hardened
            },
            ..Default::default()
        }
    }

    fn email_settings(&self) -> EmailSettings {
        let mut settings = EmailSettings::from_env();
        if self.email {
            settings.enabled = true;
        }
        if self.no_email {
            settings.enabled = false;
        }
        settings
    }
}

fn init_tracing(debug: bool) {
    let default_directive = if debug { "aptfinder=debug" } else { "aptfinder=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn scrape(args: &Args, console: &mut Console<std::io::Stdout>) -> ScrapeOutcome {
    let transport = match ReqwestTransport::new(Duration::from_secs(args.timeout)) {
        Ok(transport) => transport,
        Err(e) => return ScrapeOutcome::Failed(format!("Could not set up the HTTP client: {}", e)),
    };

    let fetcher = Fetcher::new(
        transport,
        rand::thread_rng(),
        ThreadSleeper::new(),
        args.retry_policy(),
    );

    match Pipeline::new(fetcher, args.scraping_options()) {
        Ok(mut pipeline) => pipeline.run(console),
        Err(e) => ScrapeOutcome::Failed(e.to_string()),
    }
}

fn main() -> Result<()> {
    // A missing .env file is fine; the environment may already be set.
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(args.debug);

    let mut console = Console::stdout();
    console.plain(&format!("🏠 {} Apartment Scraper", args.property_name));
    console.plain(&format!("📋 Searching for {} apartments...", args.criteria()));
    if !LENIENT_AVAILABLE {
        console.hint("For better parsing, build with the json5 feature");
    }
    console.rule(40);

    let outcome = scrape(&args, &mut console);

    let report = Report::new(
        &args.property_name,
        args.criteria(),
        Local::now().naive_local(),
        outcome,
    );

    let settings = args.email_settings();
    let reporter = Reporter::new(settings.clone(), SmtpMailer::from_settings(&settings))
        .with_html(!args.plain_email);
    reporter.report(&report, &mut console);

    if args.json {
        match serde_json::to_string_pretty(report.outcome().apartments()) {
            Ok(json) => console.plain(&json),
            Err(e) => console.failure(&format!("Could not serialize apartments: {}", e)),
        }
    }

    // Scrape and email failures are reported above; the exit code stays 0 so
    // scheduled runs do not register as broken when the site has no data.
    Ok(())
}
