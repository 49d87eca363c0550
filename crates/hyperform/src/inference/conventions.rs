//! Naming conventions that map field names to display types.
//!
//! Defaults cover common REST naming. Callers extend them with their own
//! patterns through [`PartialConventions`]; caller patterns are appended and
//! never replace the defaults.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::FieldType;

const HIDDEN: &[&str] = &[
    r"^_",
    r"(?i)password",
    r"(?i)secret",
    r"(?i)salt$",
    r"(?i)token$",
    r"(?i)^internal",
];

const BOOLEAN: &[&str] = &[
    r"^(is|has|can|should|was|will|allow|allows|enable|enables)([A-Z_]|$)",
    r"(?i)^(active|enabled|disabled|verified|deleted|archived|published|visible|locked|confirmed)$",
    r"(?i)_flag$",
];

const DATE: &[&str] = &[
    r"[a-z]At$",
    r"(?i)_at$",
    r"(?i)ed_on$",
    r"[a-z]edOn$",
    r"(?i)(^|_)(date|time|timestamp)$",
    r"[a-z](Date|Time|Timestamp)$",
    r"(?i)^(birthday|dob)$",
];

const BADGE: &[&str] = &[
    r"(?i)(^|_)(status|state|role|type|kind|level|tier|category|priority|stage|phase)$",
    r"[a-z](Status|State|Role|Type|Kind|Level|Tier|Category|Priority|Stage|Phase)$",
];

const URL: &[&str] = &[r"(?i)(url|uri|href|link|website|homepage)$"];

const EMAIL: &[&str] = &[r"(?i)e-?mail(_?address)?$"];

const CODE: &[&str] = &[
    r"(?i)^id$",
    r"[a-z]Id$",
    r"(?i)_id$",
    r"[a-z]Key$",
    r"(?i)(^|_)key$",
    r"(?i)(uuid|guid|hash|checksum|fingerprint)$",
    r"(?i)(^|_)(arn|sku|sha(1|256)?)$",
    r"(?i)(^|_)code$",
    r"[a-z]Code$",
];

/// Compiled pattern sets, one per name-inferable type.
#[derive(Debug, Clone)]
pub struct FieldConventions {
    pub hidden: Vec<Regex>,
    pub boolean: Vec<Regex>,
    pub date: Vec<Regex>,
    pub badge: Vec<Regex>,
    pub url: Vec<Regex>,
    pub email: Vec<Regex>,
    pub code: Vec<Regex>,
}

/// Caller-supplied extra patterns, as raw regular expressions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartialConventions {
    pub hidden: Vec<String>,
    pub boolean: Vec<String>,
    pub date: Vec<String>,
    pub badge: Vec<String>,
    pub url: Vec<String>,
    pub email: Vec<String>,
    pub code: Vec<String>,
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("built-in convention regex is valid"))
        .collect()
}

fn defaults() -> &'static FieldConventions {
    static DEFAULTS: OnceLock<FieldConventions> = OnceLock::new();
    DEFAULTS.get_or_init(|| FieldConventions {
        hidden: compile(HIDDEN),
        boolean: compile(BOOLEAN),
        date: compile(DATE),
        badge: compile(BADGE),
        url: compile(URL),
        email: compile(EMAIL),
        code: compile(CODE),
    })
}

impl Default for FieldConventions {
    fn default() -> Self {
        defaults().clone()
    }
}

impl FieldConventions {
    /// Defaults extended with the caller's patterns.
    pub fn with_extensions(partial: &PartialConventions) -> Result<Self, regex::Error> {
        let mut conventions = Self::default();
        conventions.extend(partial)?;
        Ok(conventions)
    }

    /// Append caller patterns to each set. Nothing is added if any pattern
    /// fails to compile.
    pub fn extend(&mut self, partial: &PartialConventions) -> Result<(), regex::Error> {
        let parse = |patterns: &[String]| -> Result<Vec<Regex>, regex::Error> {
            patterns.iter().map(|p| Regex::new(p)).collect()
        };
        let hidden = parse(&partial.hidden)?;
        let boolean = parse(&partial.boolean)?;
        let date = parse(&partial.date)?;
        let badge = parse(&partial.badge)?;
        let url = parse(&partial.url)?;
        let email = parse(&partial.email)?;
        let code = parse(&partial.code)?;

        self.hidden.extend(hidden);
        self.boolean.extend(boolean);
        self.date.extend(date);
        self.badge.extend(badge);
        self.url.extend(url);
        self.email.extend(email);
        self.code.extend(code);
        Ok(())
    }

    /// First name-based match, checked hidden → boolean → date → badge → url → email → code.
    pub fn match_name(&self, name: &str) -> Option<FieldType> {
        let ladder: [(&[Regex], FieldType); 7] = [
            (self.hidden.as_slice(), FieldType::Hidden),
            (self.boolean.as_slice(), FieldType::Boolean),
            (self.date.as_slice(), FieldType::Date),
            (self.badge.as_slice(), FieldType::Badge),
            (self.url.as_slice(), FieldType::Url),
            (self.email.as_slice(), FieldType::Email),
            (self.code.as_slice(), FieldType::Code),
        ];
        ladder
            .into_iter()
            .find(|(patterns, _)| patterns.iter().any(|re| re.is_match(name)))
            .map(|(_, ty)| ty)
    }
}
