// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeMap;
use std::fmt;

use anyhow::{Result, bail};
use serde::{Serialize, Serializer};
use time::Date;
use time::macros::format_description;

pub const DEFAULT_SUCCESS_MESSAGE: &str = "thanks! our team will get in touch shortly";
pub const DEFAULT_FAILURE_MESSAGE: &str = "something went wrong -- please try again later";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LeadFormKind {
    Contact,
    LoanEnquiry,
    InsuranceEnquiry,
    RoadsideAssistance,
    PickupDrop,
    ServiceBooking,
    ProductEnquiry,
}

impl LeadFormKind {
    pub const ALL: [Self; 7] = [
        Self::Contact,
        Self::LoanEnquiry,
        Self::InsuranceEnquiry,
        Self::RoadsideAssistance,
        Self::PickupDrop,
        Self::ServiceBooking,
        Self::ProductEnquiry,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Contact => "contact us",
            Self::LoanEnquiry => "loan enquiry",
            Self::InsuranceEnquiry => "insurance enquiry",
            Self::RoadsideAssistance => "roadside assistance",
            Self::PickupDrop => "pick-up & drop",
            Self::ServiceBooking => "book a service",
            Self::ProductEnquiry => "product enquiry",
        }
    }

    /// POST path, relative to the API base URL.
    pub const fn submit_path(self) -> &'static str {
        match self {
            Self::Contact => "/enquiries/contact",
            Self::LoanEnquiry => "/enquiries/loan",
            Self::InsuranceEnquiry => "/enquiries/insurance",
            Self::RoadsideAssistance => "/enquiries/roadside-assistance",
            Self::PickupDrop => "/bookings/pickup-drop",
            Self::ServiceBooking => "/bookings/service",
            Self::ProductEnquiry => "/enquiries/product",
        }
    }

    pub const fn fields(self) -> &'static [FieldSpec] {
        match self {
            Self::Contact => CONTACT_FIELDS,
            Self::LoanEnquiry => LOAN_FIELDS,
            Self::InsuranceEnquiry => INSURANCE_FIELDS,
            Self::RoadsideAssistance => ROADSIDE_FIELDS,
            Self::PickupDrop => PICKUP_FIELDS,
            Self::ServiceBooking => SERVICE_FIELDS,
            Self::ProductEnquiry => PRODUCT_FIELDS,
        }
    }

    pub fn field(self, key: &str) -> Option<&'static FieldSpec> {
        self.fields().iter().find(|spec| spec.key == key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldFormat {
    Text,
    Email,
    Phone,
    Date,
    Registration,
    Choice(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Wire name in the submitted JSON object.
    pub key: &'static str,
    pub label: &'static str,
    pub required: bool,
    pub format: FieldFormat,
}

const fn required(key: &'static str, label: &'static str, format: FieldFormat) -> FieldSpec {
    FieldSpec {
        key,
        label,
        required: true,
        format,
    }
}

const fn optional(key: &'static str, label: &'static str, format: FieldFormat) -> FieldSpec {
    FieldSpec {
        key,
        label,
        required: false,
        format,
    }
}

const NAME: FieldSpec = required("name", "name", FieldFormat::Text);
const EMAIL: FieldSpec = required("email", "email", FieldFormat::Email);
const PHONE: FieldSpec = required("phone", "phone", FieldFormat::Phone);
const REGISTRATION: FieldSpec = required(
    "registrationNumber",
    "registration number",
    FieldFormat::Registration,
);

const LOAN_TENURES: &[&str] = &["12 months", "24 months", "36 months", "48 months", "60 months"];
const INSURANCE_TYPES: &[&str] = &["Comprehensive", "Third Party", "Zero Depreciation"];
const ROADSIDE_ISSUES: &[&str] = &["Breakdown", "Flat Tyre", "Battery", "Accident", "Other"];
const SERVICE_TYPES: &[&str] = &["Periodic Service", "Running Repair", "Body Shop", "Other"];

const CONTACT_FIELDS: &[FieldSpec] = &[
    NAME,
    EMAIL,
    PHONE,
    optional("model", "model", FieldFormat::Text),
    required("message", "message", FieldFormat::Text),
];

const LOAN_FIELDS: &[FieldSpec] = &[
    NAME,
    EMAIL,
    PHONE,
    required("model", "model", FieldFormat::Text),
    required("tenure", "tenure", FieldFormat::Choice(LOAN_TENURES)),
    optional("city", "city", FieldFormat::Text),
];

const INSURANCE_FIELDS: &[FieldSpec] = &[
    NAME,
    EMAIL,
    PHONE,
    REGISTRATION,
    optional("model", "model", FieldFormat::Text),
    required(
        "insuranceType",
        "insurance type",
        FieldFormat::Choice(INSURANCE_TYPES),
    ),
    optional("policyExpiry", "policy expiry", FieldFormat::Date),
];

const ROADSIDE_FIELDS: &[FieldSpec] = &[
    NAME,
    PHONE,
    REGISTRATION,
    required("location", "location", FieldFormat::Text),
    required("issue", "issue", FieldFormat::Choice(ROADSIDE_ISSUES)),
];

const PICKUP_FIELDS: &[FieldSpec] = &[
    NAME,
    PHONE,
    optional("email", "email", FieldFormat::Email),
    REGISTRATION,
    optional("model", "model", FieldFormat::Text),
    required("pickupAddress", "pick-up address", FieldFormat::Text),
    required("pickupDate", "pick-up date", FieldFormat::Date),
];

const SERVICE_FIELDS: &[FieldSpec] = &[
    NAME,
    EMAIL,
    PHONE,
    required("model", "model", FieldFormat::Text),
    REGISTRATION,
    required("serviceType", "service type", FieldFormat::Choice(SERVICE_TYPES)),
    required("preferredDate", "preferred date", FieldFormat::Date),
    optional("workshop", "workshop", FieldFormat::Text),
];

const PRODUCT_FIELDS: &[FieldSpec] = &[
    NAME,
    EMAIL,
    PHONE,
    required("productId", "product", FieldFormat::Text),
    optional("message", "message", FieldFormat::Text),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldError {
    Required,
    InvalidEmail,
    InvalidPhone,
    InvalidDate,
    InvalidRegistration,
    UnknownChoice(&'static [&'static str]),
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required => f.write_str("is required"),
            Self::InvalidEmail => f.write_str("must look like name@example.com"),
            Self::InvalidPhone => f.write_str("must have 10-15 digits"),
            Self::InvalidDate => f.write_str("must be a date like 2026-05-01"),
            Self::InvalidRegistration => {
                f.write_str("must be letters and digits, optionally split by spaces or dashes")
            }
            Self::UnknownChoice(options) => write!(f, "must be one of: {}", options.join(", ")),
        }
    }
}

impl std::error::Error for FieldError {}

pub fn validate_field(spec: &FieldSpec, raw: &str) -> Result<(), FieldError> {
    let value = raw.trim();
    if value.is_empty() {
        return if spec.required {
            Err(FieldError::Required)
        } else {
            Ok(())
        };
    }
    match spec.format {
        FieldFormat::Text => Ok(()),
        FieldFormat::Email if is_email(value) => Ok(()),
        FieldFormat::Email => Err(FieldError::InvalidEmail),
        FieldFormat::Phone if is_phone(value) => Ok(()),
        FieldFormat::Phone => Err(FieldError::InvalidPhone),
        FieldFormat::Date => parse_date(value).map(|_| ()),
        FieldFormat::Registration if is_registration(value) => Ok(()),
        FieldFormat::Registration => Err(FieldError::InvalidRegistration),
        FieldFormat::Choice(options) if options.contains(&value) => Ok(()),
        FieldFormat::Choice(options) => Err(FieldError::UnknownChoice(options)),
    }
}

fn is_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, _)| !host.is_empty())
        && !domain.ends_with('.')
}

fn is_phone(value: &str) -> bool {
    let body = value.strip_prefix('+').unwrap_or(value);
    if !body
        .chars()
        .all(|ch| ch.is_ascii_digit() || ch == ' ' || ch == '-')
    {
        return false;
    }
    let digits = body.chars().filter(char::is_ascii_digit).count();
    (10..=15).contains(&digits)
}

fn is_registration(value: &str) -> bool {
    value
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == ' ' || ch == '-')
        && value.chars().filter(char::is_ascii_alphanumeric).count() >= 4
}

pub fn parse_date(value: &str) -> Result<Date, FieldError> {
    Date::parse(value, format_description!("[year]-[month]-[day]"))
        .map_err(|_| FieldError::InvalidDate)
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubmitState {
    #[default]
    Editing,
    Submitting,
    Succeeded(String),
    Failed(String),
}

/// A validated payload ready to POST; serializes as a flat JSON object of
/// the non-empty fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadSubmission {
    pub kind: LeadFormKind,
    pub fields: BTreeMap<String, String>,
}

impl Serialize for LeadSubmission {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.fields.serialize(serializer)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadForm {
    kind: LeadFormKind,
    values: BTreeMap<&'static str, String>,
    errors: BTreeMap<&'static str, FieldError>,
    state: SubmitState,
}

impl LeadForm {
    pub fn new(kind: LeadFormKind) -> Self {
        Self {
            kind,
            values: BTreeMap::new(),
            errors: BTreeMap::new(),
            state: SubmitState::Editing,
        }
    }

    pub fn kind(&self) -> LeadFormKind {
        self.kind
    }

    pub fn state(&self) -> &SubmitState {
        &self.state
    }

    pub fn is_submitting(&self) -> bool {
        self.state == SubmitState::Submitting
    }

    pub fn value(&self, key: &str) -> &str {
        self.values.get(key).map_or("", String::as_str)
    }

    pub fn error(&self, key: &str) -> Option<FieldError> {
        self.errors.get(key).copied()
    }

    /// Updates one field and re-validates it. Unknown keys are ignored.
    pub fn set_field(&mut self, key: &str, value: impl Into<String>) -> bool {
        let Some(spec) = self.kind.field(key) else {
            return false;
        };
        let value = value.into();
        match validate_field(spec, &value) {
            Ok(()) => {
                self.errors.remove(spec.key);
            }
            Err(error) => {
                self.errors.insert(spec.key, error);
            }
        }
        self.values.insert(spec.key, value);
        if matches!(self.state, SubmitState::Succeeded(_) | SubmitState::Failed(_)) {
            self.state = SubmitState::Editing;
        }
        true
    }

    /// Copies a selected item's identifier into the form, when the form has
    /// a field for it.
    pub fn prefill(&mut self, key: &str, value: &str) -> bool {
        self.set_field(key, value)
    }

    pub fn can_submit(&self) -> bool {
        !self.is_submitting()
            && self
                .kind
                .fields()
                .iter()
                .all(|spec| validate_field(spec, self.value(spec.key)).is_ok())
    }

    /// Validates every field and, when all pass, moves into the in-flight
    /// state. Invalid fields are marked so the form can highlight them.
    pub fn begin_submit(&mut self) -> Result<LeadSubmission> {
        if self.is_submitting() {
            bail!("{} is already being sent -- wait for it to finish", self.kind.label());
        }

        self.errors.clear();
        for spec in self.kind.fields() {
            if let Err(error) = validate_field(spec, self.value(spec.key)) {
                self.errors.insert(spec.key, error);
            }
        }
        if let Some(spec) = self
            .kind
            .fields()
            .iter()
            .find(|spec| self.errors.contains_key(spec.key))
        {
            let error = self.errors[spec.key];
            bail!("{} {error} -- fix the highlighted fields and retry", spec.label);
        }

        self.state = SubmitState::Submitting;
        let fields = self
            .kind
            .fields()
            .iter()
            .filter_map(|spec| {
                let value = self.value(spec.key).trim();
                (!value.is_empty()).then(|| (spec.key.to_owned(), value.to_owned()))
            })
            .collect();
        Ok(LeadSubmission {
            kind: self.kind,
            fields,
        })
    }

    /// Records the POST outcome and returns the notification text. Success
    /// clears every field; failure keeps them for another attempt.
    pub fn finish_submit(&mut self, outcome: Result<Option<String>, Option<String>>) -> String {
        match outcome {
            Ok(message) => {
                let message =
                    non_blank(message).unwrap_or_else(|| DEFAULT_SUCCESS_MESSAGE.to_owned());
                self.values.clear();
                self.errors.clear();
                self.state = SubmitState::Succeeded(message.clone());
                message
            }
            Err(message) => {
                let message =
                    non_blank(message).unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_owned());
                self.state = SubmitState::Failed(message.clone());
                message
            }
        }
    }
}

fn non_blank(message: Option<String>) -> Option<String> {
    message.filter(|text| !text.trim().is_empty())
}
