//! Contact form submissions.

use serde::Deserialize;

use super::mail::OutgoingMail;

/// A submission from one of the two contact forms.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContactSubmission {
    /// Someone offering clothes for upcycling.
    Contribute(Contribution),
    /// An artisan offering to work with the studio.
    Collaborate(Collaboration),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Contribution {
    pub name: String,
    pub location: String,
    pub mobile: String,
    pub email: String,
    pub clothes_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Collaboration {
    pub name: String,
    pub location: String,
    pub art_forms: Vec<String>,
    pub experience: String,
    pub social_media: Option<String>,
    pub suggestions: Option<String>,
}

impl ContactSubmission {
    /// `contribute` or `collaborate`.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Contribute(_) => "contribute",
            Self::Collaborate(_) => "collaborate",
        }
    }

    #[must_use]
    pub fn subject(&self) -> String {
        match self {
            Self::Contribute(c) => format!("[Dorodango] New Contribution from {}", c.name),
            Self::Collaborate(c) => format!("[Dorodango] New Collaboration from {}", c.name),
        }
    }

    #[must_use]
    pub fn body(&self) -> String {
        let lines = match self {
            Self::Contribute(c) => vec![
                "New Contribution Request".to_owned(),
                String::new(),
                format!("Name: {}", c.name),
                format!("Location: {}", c.location),
                format!("Mobile: {}", c.mobile),
                format!("Email: {}", c.email),
                format!("Type of Clothes: {}", c.clothes_type),
            ],
            Self::Collaborate(c) => vec![
                "New Collaboration Request".to_owned(),
                String::new(),
                format!("Name: {}", c.name),
                format!("Location: {}", c.location),
                format!("Art Forms: {}", c.art_forms.join(", ")),
                format!("Experience: {}", c.experience),
                format!("Social Media: {}", or_default(c.social_media.as_deref(), "Not provided")),
                format!("Suggestions: {}", or_default(c.suggestions.as_deref(), "None")),
            ],
        };
        lines.join("\n")
    }

    /// Build the message for `recipient`.
    #[must_use]
    pub fn to_mail(&self, from: &str, recipient: &str) -> OutgoingMail {
        OutgoingMail {
            from: from.to_owned(),
            to: vec![recipient.to_owned()],
            subject: self.subject(),
            text: self.body(),
        }
    }
}

fn or_default<'a>(value: Option<&'a str>, fallback: &'a str) -> &'a str {
    value.filter(|v| !v.is_empty()).unwrap_or(fallback)
}
