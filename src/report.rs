//! Renders a run's outcome for the console and for email, and dispatches it.

use std::io::Write;

use chrono::NaiveDateTime;
use maud::{html, Markup, DOCTYPE};

use crate::config::EmailSettings;
use crate::console::Console;
use crate::filter::UnitCriteria;
use crate::mailer::{EmailMessage, Mailer};
use crate::models::{ApartmentRecord, ScrapeOutcome};

const RULE_WIDTH: usize = 60;

/// The three mutually exclusive report shapes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReportKind<'a> {
    Error(&'a str),
    Empty,
    Results(&'a [ApartmentRecord]),
}

#[derive(Debug, Clone)]
pub struct Report {
    property_name: String,
    criteria: UnitCriteria,
    generated_at: NaiveDateTime,
    outcome: ScrapeOutcome,
}

impl Report {
    pub fn new(
        property_name: &str,
        criteria: UnitCriteria,
        generated_at: NaiveDateTime,
        outcome: ScrapeOutcome,
    ) -> Self {
        Self {
            property_name: property_name.to_string(),
            criteria,
            generated_at,
            outcome,
        }
    }

    pub fn outcome(&self) -> &ScrapeOutcome {
        &self.outcome
    }

    pub fn kind(&self) -> ReportKind<'_> {
        match &self.outcome {
            ScrapeOutcome::Failed(message) => ReportKind::Error(message),
            ScrapeOutcome::Apartments(apartments) if apartments.is_empty() => ReportKind::Empty,
            ScrapeOutcome::Apartments(apartments) => ReportKind::Results(apartments),
        }
    }

    pub fn subject(&self) -> String {
        match self.kind() {
            ReportKind::Results(_) => format!(
                "{} - Available {} Apartments",
                self.property_name, self.criteria
            ),
            ReportKind::Empty => format!(
                "{} - No {} Apartments Available",
                self.property_name, self.criteria
            ),
            ReportKind::Error(_) => format!("{} - Apartment Scraper Error", self.property_name),
        }
    }

    fn timestamp(&self) -> String {
        self.generated_at.format("%Y-%m-%d %H:%M:%S").to_string()
    }

    /// Multi-line summary used for the console and the plain-text email.
    pub fn text(&self) -> String {
        let rule = "=".repeat(RULE_WIDTH);
        let mut lines = vec![
            String::new(),
            rule.clone(),
            format!(
                "🏠 {} - AVAILABLE APARTMENTS",
                self.property_name.to_uppercase()
            ),
            format!("📅 {}", self.timestamp()),
            rule.clone(),
        ];

        match self.kind() {
            ReportKind::Results(apartments) => {
                lines.push(format!(
                    "Found {} available {} apartment(s):\n",
                    apartments.len(),
                    self.criteria
                ));
                for (index, apartment) in apartments.iter().enumerate() {
                    lines.push(format!("{}. 🏠 Apartment #{}", index + 1, apartment.apartment));
                    lines.push(format!("   📋 Floorplan: {}", apartment.floorplan));
                    lines.push(format!("   💰 Rent: {}", apartment.rent));
                    lines.push(String::new());
                }
            }
            ReportKind::Empty => {
                lines.push(format!("❌ No available {} apartments found", self.criteria));
            }
            ReportKind::Error(message) => {
                lines.push(format!("❌ Scraper error: {}", message));
            }
        }

        lines.push(rule);
        lines.join("\n")
    }

    pub fn html(&self) -> String {
        self.html_markup().into_string()
    }

    fn html_markup(&self) -> Markup {
        let cell = "padding: 6px 12px; border: 1px solid #ddd;";

        html! {
            (DOCTYPE)
            html {
                body style="font-family: sans-serif;" {
                    h2 { "🏠 " (self.property_name) " - Available Apartments" }
                    p style="color: #666;" { "📅 " (self.timestamp()) }
                    @match self.kind() {
                        ReportKind::Results(apartments) => {
                            p { "Found " (apartments.len()) " available " (self.criteria.to_string()) " apartment(s):" }
                            table style="border-collapse: collapse;" {
                                thead {
                                    tr {
                                        th style=(cell) { "#" }
                                        th style=(cell) { "Apartment" }
                                        th style=(cell) { "Floorplan" }
                                        th style=(cell) { "Rent" }
                                    }
                                }
                                tbody {
                                    @for (index, apartment) in apartments.iter().enumerate() {
                                        tr {
                                            td style=(cell) { (index + 1) }
                                            td style=(cell) { "#" (apartment.apartment) }
                                            td style=(cell) { (apartment.floorplan) }
                                            td style=(cell) { (apartment.rent) }
                                        }
                                    }
                                }
                            }
                        }
                        ReportKind::Empty => {
                            p {
                                "No " (self.criteria.to_string()) " apartments are listed as available right now. "
                                "The next scheduled check will look again."
                            }
                        }
                        ReportKind::Error(message) => {
                            p { "The apartment check could not finish:" }
                            p style="color: #b00020;" { strong { (message) } }
                            p { "No availability data was collected on this run." }
                        }
                    }
                }
            }
        }
    }
}

/// What happened to the email side of a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Disabled,
    MissingCredentials,
    Sent { recipient: String },
    Failed(String),
}

pub struct Reporter<M: Mailer> {
    settings: EmailSettings,
    mailer: M,
    html_email: bool,
}

impl<M: Mailer> Reporter<M> {
    pub fn new(settings: EmailSettings, mailer: M) -> Self {
        Self {
            settings,
            mailer,
            html_email: true,
        }
    }

    /// Send plain-text-only emails when `false`.
    pub fn with_html(mut self, html_email: bool) -> Self {
        self.html_email = html_email;
        self
    }

    pub fn mailer(&self) -> &M {
        &self.mailer
    }

    /// Prints the report and emails it when configured. Never fails: email
    /// problems are printed and returned as a `Delivery`.
    pub fn report<W: Write>(&self, report: &Report, console: &mut Console<W>) -> Delivery {
        console.plain(&report.text());

        if !self.settings.enabled {
            return Delivery::Disabled;
        }

        let (Some(credentials), Some(recipient)) =
            (self.settings.credentials(), self.settings.recipient())
        else {
            console.failure("Email credentials not set in environment variables.");
            return Delivery::MissingCredentials;
        };

        let message = EmailMessage {
            from: credentials.username.clone(),
            to: recipient.to_string(),
            subject: report.subject(),
            text_body: report.text(),
            html_body: self.html_email.then(|| report.html()),
        };

        match self.mailer.send(&credentials, &message) {
            Ok(()) => {
                console.success(&format!("Email sent to {}", recipient));
                Delivery::Sent {
                    recipient: recipient.to_string(),
                }
            }
            Err(e) => {
                console.failure(&format!("Failed to send email: {}", e));
                Delivery::Failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmailCredentials;
    use crate::mailer::MailerError;
    use chrono::NaiveDate;
    use std::cell::RefCell;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 15)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    fn apartment(number: &str, rent: &str) -> ApartmentRecord {
        ApartmentRecord {
            apartment: number.to_string(),
            floorplan: "B2".to_string(),
            rent: rent.to_string(),
        }
    }

    fn report(outcome: ScrapeOutcome) -> Report {
        Report::new("100 House NJ", UnitCriteria::default(), at(), outcome)
    }

    #[derive(Default)]
    struct RecordingMailer {
        sent: RefCell<Vec<EmailMessage>>,
        fail: bool,
    }

    impl Mailer for RecordingMailer {
        fn send(&self, _credentials: &EmailCredentials, message: &EmailMessage) -> Result<(), MailerError> {
            if self.fail {
                return Err(MailerError::Smtp("connection refused".to_string()));
            }
            self.sent.borrow_mut().push(message.clone());
            Ok(())
        }
    }

    fn configured() -> EmailSettings {
        EmailSettings {
            enabled: true,
            sender: Some("watcher@example.com".to_string()),
            password: Some("secret".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn results_text_numbers_each_apartment() {
        let text = report(ScrapeOutcome::Apartments(vec![
            apartment("101", "$2,500"),
            apartment("202", "Call for pricing"),
        ]))
        .text();

        assert!(text.contains("🏠 100 HOUSE NJ - AVAILABLE APARTMENTS"));
        assert!(text.contains("📅 2026-10-15 09:30:00"));
        assert!(text.contains("Found 2 available 2BR/2BA apartment(s):"));
        assert!(text.contains("1. 🏠 Apartment #101\n   📋 Floorplan: B2\n   💰 Rent: $2,500"));
        assert!(text.contains("2. 🏠 Apartment #202"));
        assert!(text.ends_with(&"=".repeat(60)));
    }

    #[test]
    fn shapes_are_distinct() {
        let empty = report(ScrapeOutcome::Apartments(vec![]));
        let failed = report(ScrapeOutcome::Failed("blocked".to_string()));

        assert_eq!(empty.kind(), ReportKind::Empty);
        assert!(empty.text().contains("No available 2BR/2BA apartments found"));
        assert_eq!(empty.subject(), "100 House NJ - No 2BR/2BA Apartments Available");

        assert_eq!(failed.kind(), ReportKind::Error("blocked"));
        assert!(failed.text().contains("Scraper error: blocked"));
        assert!(!failed.text().contains("No available"));
        assert_eq!(failed.subject(), "100 House NJ - Apartment Scraper Error");
    }

    #[test]
    fn html_escapes_scraped_text() {
        let html = report(ScrapeOutcome::Apartments(vec![apartment("<b>1</b>", "$1")])).html();
        assert!(html.contains("<table"));
        assert!(html.contains("&lt;b&gt;1&lt;/b&gt;"));
    }

    #[test]
    fn disabled_email_only_prints() {
        let reporter = Reporter::new(EmailSettings::default(), RecordingMailer::default());
        let mut console = Console::new(Vec::new(), false);

        let delivery = reporter.report(&report(ScrapeOutcome::Apartments(vec![])), &mut console);

        assert_eq!(delivery, Delivery::Disabled);
        assert!(reporter.mailer().sent.borrow().is_empty());
        let output = String::from_utf8(console.into_inner()).unwrap();
        assert!(output.contains("100 HOUSE NJ"));
    }

    #[test]
    fn missing_credentials_are_reported_not_sent() {
        let settings = EmailSettings {
            password: None,
            ..configured()
        };
        let reporter = Reporter::new(settings, RecordingMailer::default());
        let mut console = Console::new(Vec::new(), false);

        let delivery = reporter.report(&report(ScrapeOutcome::Apartments(vec![])), &mut console);

        assert_eq!(delivery, Delivery::MissingCredentials);
        let output = String::from_utf8(console.into_inner()).unwrap();
        assert!(output.contains("❌ Email credentials not set"));
    }

    #[test]
    fn sends_multipart_results_to_sender_by_default() {
        let reporter = Reporter::new(configured(), RecordingMailer::default());
        let mut console = Console::new(Vec::new(), false);

        let delivery = reporter.report(
            &report(ScrapeOutcome::Apartments(vec![apartment("101", "$2,500")])),
            &mut console,
        );

        assert_eq!(
            delivery,
            Delivery::Sent {
                recipient: "watcher@example.com".to_string()
            }
        );
        let sent = reporter.mailer().sent.borrow();
        assert_eq!(sent[0].subject, "100 House NJ - Available 2BR/2BA Apartments");
        assert!(sent[0].html_body.as_deref().unwrap().contains("$2,500"));
    }

    #[test]
    fn plain_mode_omits_html_body() {
        let reporter = Reporter::new(configured(), RecordingMailer::default()).with_html(false);
        let mut console = Console::new(Vec::new(), false);
        reporter.report(&report(ScrapeOutcome::Apartments(vec![])), &mut console);

        assert_eq!(reporter.mailer().sent.borrow()[0].html_body, None);
    }

    #[test]
    fn send_failure_is_printed_not_raised() {
        let mailer = RecordingMailer {
            fail: true,
            ..Default::default()
        };
        let reporter = Reporter::new(configured(), mailer);
        let mut console = Console::new(Vec::new(), false);

        let delivery = reporter.report(&report(ScrapeOutcome::Apartments(vec![])), &mut console);

        assert!(matches!(delivery, Delivery::Failed(_)));
        let output = String::from_utf8(console.into_inner()).unwrap();
        assert!(output.contains("Failed to send email: smtp error: connection refused"));
    }
}
