//! Notice templates.
//!
//! Every interpolated value is HTML-escaped. A notice whose recipient has no
//! email address cannot be composed and yields
//! [`NotifyError::MissingRecipient`].

use lifesafe_db::models::class_request::ClassRequest;
use lifesafe_db::models::confirmed_class::ConfirmedClass;
use lifesafe_db::models::educator::Educator;
use lifesafe_db::models::site::Site;
use serde::Serialize;

use crate::notifier::NotifyError;

/// Default signature on every notice.
pub const DEFAULT_ORGANIZATION: &str = "LifeSafe Services";

pub const ROSTER_REMINDER_SUBJECT: &str = "Class Roster, Evaluation & Invoice Not Yet Received";

// ---------------------------------------------------------------------------
// OutboundEmail
// ---------------------------------------------------------------------------

/// A fully rendered email ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Which template produced a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    NewRequest,
    ContactEducator,
    EducatorReminder,
    SiteReminder,
    RosterReminder,
}

impl NoticeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NewRequest => "new_request",
            Self::ContactEducator => "contact_educator",
            Self::EducatorReminder => "educator_reminder",
            Self::SiteReminder => "site_reminder",
            Self::RosterReminder => "roster_reminder",
        }
    }
}

impl std::fmt::Display for NoticeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Escape the five HTML-significant characters.
pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn recipient(kind: NoticeKind, email: Option<&str>) -> Result<String, NotifyError> {
    match email.map(str::trim) {
        Some(addr) if !addr.is_empty() => Ok(addr.to_string()),
        _ => Err(NotifyError::MissingRecipient(kind)),
    }
}

// ---------------------------------------------------------------------------
// Composer
// ---------------------------------------------------------------------------

/// Renders notices signed with the organization name.
#[derive(Debug, Clone)]
pub struct Composer {
    organization: String,
}

impl Default for Composer {
    fn default() -> Self {
        Self::new(DEFAULT_ORGANIZATION)
    }
}

impl Composer {
    pub fn new(organization: impl Into<String>) -> Self {
        Self {
            organization: organization.into(),
        }
    }

    /// Load the signature from `ORGANIZATION_NAME`, defaulting to
    /// `LifeSafe Services`.
    pub fn from_env() -> Self {
        std::env::var("ORGANIZATION_NAME")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(Self::new)
            .unwrap_or_default()
    }

    fn wrap(&self, greeting: &str, paragraphs: &[String]) -> String {
        let mut html = format!("<p>Dear {},</p>\n", escape_html(greeting));
        for p in paragraphs {
            html.push_str("<p>");
            html.push_str(p);
            html.push_str("</p>\n");
        }
        html.push_str("<p>Thank you,</p>\n");
        html.push_str(&format!("<p>{}</p>\n", escape_html(&self.organization)));
        html
    }

    /// Staff notice that a client submitted a class request.
    pub fn new_request(
        &self,
        staff_inbox: Option<&str>,
        request: &ClassRequest,
        company_name: Option<&str>,
    ) -> Result<OutboundEmail, NotifyError> {
        let to = recipient(NoticeKind::NewRequest, staff_inbox)?;
        let classes = request.class_types.join(", ");
        let company = company_name.unwrap_or("A client");
        let subject = format!("New Class Request: {classes}");
        let mut paragraphs = vec![format!(
            "{} has requested <strong>{}</strong> between <strong>{}</strong> and <strong>{}</strong>.",
            escape_html(company),
            escape_html(&classes),
            request.preferred_date_start,
            request.preferred_date_end,
        )];
        if let Some(notes) = request.notes.as_deref().filter(|n| !n.trim().is_empty()) {
            paragraphs.push(format!("Notes: {}", escape_html(notes)));
        }
        paragraphs.push(format!("Request #{} is waiting for an educator.", request.id));
        Ok(OutboundEmail {
            to,
            subject,
            html: self.wrap("Scheduling Team", &paragraphs),
        })
    }

    /// Offer to an educator asking for availability within the window.
    pub fn contact_educator(
        &self,
        educator: &Educator,
        request: &ClassRequest,
        site: Option<&Site>,
    ) -> Result<OutboundEmail, NotifyError> {
        let to = recipient(NoticeKind::ContactEducator, educator.email.as_deref())?;
        let classes = request.class_types.join(", ");
        let subject = format!(
            "Class Offer: '{classes}' between {} and {}",
            request.preferred_date_start, request.preferred_date_end
        );
        let location = site
            .map(|s| format!(" at <strong>{}</strong>", escape_html(&s.name)))
            .unwrap_or_default();
        let paragraphs = vec![
            format!(
                "We would like to offer you the class <strong>'{}'</strong>{location}, to be held between <strong>{}</strong> and <strong>{}</strong>.",
                escape_html(&classes),
                request.preferred_date_start,
                request.preferred_date_end,
            ),
            "Please reply with the date that works for you, or let us know if you are unable to teach it.".to_string(),
        ];
        Ok(OutboundEmail {
            to,
            subject,
            html: self.wrap(&educator.full_name(), &paragraphs),
        })
    }

    /// Upcoming-class reminder to the educator teaching it.
    pub fn educator_reminder(
        &self,
        educator: &Educator,
        class: &ConfirmedClass,
    ) -> Result<OutboundEmail, NotifyError> {
        let to = recipient(NoticeKind::EducatorReminder, educator.email.as_deref())?;
        let name = class_name(class);
        let subject = format!("Reminder: Your Class '{name}' on {}", class.date_of_class);
        let paragraphs = vec![
            format!(
                "This is a friendly reminder about your upcoming class <strong>'{}'</strong> scheduled for <strong>{}</strong>.",
                escape_html(name),
                class.date_of_class,
            ),
            "Please ensure you are prepared for the session.".to_string(),
        ];
        Ok(OutboundEmail {
            to,
            subject,
            html: self.wrap(&educator.full_name(), &paragraphs),
        })
    }

    /// Upcoming-class reminder to the hosting site.
    pub fn site_reminder(
        &self,
        site: &Site,
        class: &ConfirmedClass,
    ) -> Result<OutboundEmail, NotifyError> {
        let to = recipient(NoticeKind::SiteReminder, site.email.as_deref())?;
        let name = class_name(class);
        let subject = format!(
            "Reminder: Class '{name}' on {} at {}",
            class.date_of_class, site.name
        );
        let paragraphs = vec![
            format!(
                "This is a reminder that the class <strong>'{}'</strong> is scheduled to take place on <strong>{}</strong> at your location.",
                escape_html(name),
                class.date_of_class,
            ),
            "Please ensure everything is ready for the session.".to_string(),
        ];
        Ok(OutboundEmail {
            to,
            subject,
            html: self.wrap(&format!("{} Team", site.name), &paragraphs),
        })
    }

    /// Ask the educator for the missing roster, evaluations and invoice.
    pub fn roster_reminder(
        &self,
        educator: &Educator,
        class: &ConfirmedClass,
        site: Option<&Site>,
    ) -> Result<OutboundEmail, NotifyError> {
        let to = recipient(NoticeKind::RosterReminder, educator.email.as_deref())?;
        let site_name = site.map(|s| s.name.as_str()).unwrap_or("the site");
        let paragraphs = vec![
            format!(
                "We have not yet received your roster and evaluations for the training session on <strong>{}</strong> scheduled for <strong>{}</strong> at <strong>{}</strong>.",
                escape_html(&class.subjects),
                class.date_of_class,
                escape_html(site_name),
            ),
            "Please provide the necessary documents at your earliest convenience.".to_string(),
        ];
        Ok(OutboundEmail {
            to,
            subject: ROSTER_REMINDER_SUBJECT.to_string(),
            html: self.wrap(&educator.full_name(), &paragraphs),
        })
    }
}

fn class_name(class: &ConfirmedClass) -> &str {
    if class.subjects.trim().is_empty() {
        "this class"
    } else {
        &class.subjects
    }
}
