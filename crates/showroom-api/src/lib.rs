// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use reqwest::StatusCode;
use reqwest::blocking::Client as HttpClient;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use showroom_app::{LeadFormKind, ListingRecord, PageKind};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Vehicles,
    Vehicle(String),
    Accessories,
    AccessoryCategories,
    Models,
    Offers,
    Brochures,
    Galleries,
    Testimonials,
    Faqs,
    Locations,
    Specifications(String),
    Highlights(String),
}

impl Endpoint {
    /// The listing endpoint behind a page. Pages keyed by model need the
    /// path parameter; a vehicles page with a slug reads a single vehicle.
    pub fn for_page(page: PageKind, path_param: Option<&str>) -> Option<Self> {
        let param = path_param.map(str::trim).filter(|value| !value.is_empty());
        Some(match page {
            PageKind::Vehicles => match param {
                Some(slug) => Self::Vehicle(slug.to_owned()),
                None => Self::Vehicles,
            },
            PageKind::Accessories => Self::Accessories,
            PageKind::Offers => Self::Offers,
            PageKind::Brochures => Self::Brochures,
            PageKind::Gallery => Self::Galleries,
            PageKind::Testimonials => Self::Testimonials,
            PageKind::Faqs => Self::Faqs,
            PageKind::Locations => Self::Locations,
            PageKind::Specifications => Self::Specifications(param?.to_owned()),
            PageKind::Highlights => Self::Highlights(param?.to_owned()),
        })
    }

    pub fn segments(&self) -> Vec<&str> {
        match self {
            Self::Vehicles => vec!["vehicles"],
            Self::Vehicle(slug) => vec!["vehicles", slug],
            Self::Accessories => vec!["accessories"],
            Self::AccessoryCategories => vec!["accessories", "categories"],
            Self::Models => vec!["models"],
            Self::Offers => vec!["offers"],
            Self::Brochures => vec!["brochures"],
            Self::Galleries => vec!["galleries"],
            Self::Testimonials => vec!["testimonials"],
            Self::Faqs => vec!["faqs"],
            Self::Locations => vec!["locations"],
            Self::Specifications(model) => vec!["specifications", model],
            Self::Highlights(model) => vec!["highlights", model],
        }
    }

    pub fn path(&self) -> String {
        format!("/{}", self.segments().join("/"))
    }
}

/// The `{ success, data, message }` wrapper around every response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: Option<bool>,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    pub fn is_success(&self) -> bool {
        self.success == Some(true)
    }

    fn message(&self) -> Option<String> {
        self.message
            .as_deref()
            .map(str::trim)
            .filter(|message| !message.is_empty())
            .map(str::to_owned)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("cannot reach {url} -- check [api].base_url and your connection ({source})")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{}", status_text(.status, .message))]
    Status { status: u16, message: Option<String> },
    #[error("malformed response from {path}: {detail}")]
    Malformed { path: String, detail: String },
    #[error("{0}")]
    NotFound(String),
    #[error("{}", rejected_text(.0))]
    Rejected(Option<String>),
}

impl ApiError {
    /// The backend's own wording, when it sent any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Status { message, .. } | Self::Rejected(message) => message.as_deref(),
            Self::NotFound(message) => Some(message),
            Self::Transport { .. } | Self::Malformed { .. } => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

fn status_text(status: &u16, message: &Option<String>) -> String {
    match message {
        Some(message) => format!("server error ({status}): {message}"),
        None => format!("server returned {status}"),
    }
}

fn rejected_text(message: &Option<String>) -> &str {
    message.as_deref().unwrap_or("request was rejected")
}

/// Turns image and file references into absolute URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaResolver {
    base_url: String,
}

impl MediaResolver {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim().trim_end_matches('/').to_owned(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn resolve(&self, reference: &str) -> Option<String> {
        let reference = reference.trim();
        if reference.is_empty() {
            return None;
        }
        if reference.starts_with("http://")
            || reference.starts_with("https://")
            || reference.starts_with("//")
        {
            return Some(reference.to_owned());
        }
        let fragment = reference.trim_start_matches('/');
        if self.base_url.is_empty() {
            return Some(format!("/{fragment}"));
        }
        Some(format!("{}/{fragment}", self.base_url))
    }
}

#[derive(Debug, Clone)]
pub struct Client {
    base_url: Url,
    media: MediaResolver,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, media_base_url: &str, timeout: Duration) -> Result<Self> {
        let trimmed = base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            bail!("api.base_url must not be empty -- set it in the config file or SHOWROOM_API_BASE_URL");
        }
        let parsed = Url::parse(trimmed)
            .with_context(|| format!("api.base_url {trimmed:?} is not a valid URL"))?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.cannot_be_a_base() {
            bail!("api.base_url {trimmed:?} must be an http:// or https:// URL");
        }

        let media_base = if media_base_url.trim().is_empty() {
            trimmed
        } else {
            media_base_url
        };

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url: parsed,
            media: MediaResolver::new(media_base),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    pub fn media(&self) -> &MediaResolver {
        &self.media
    }

    pub fn url_for(&self, endpoint: &Endpoint) -> Url {
        self.url_with_segments(&endpoint.segments())
    }

    fn url_with_segments(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn get_envelope(
        &self,
        endpoint: &Endpoint,
        query: &[(String, String)],
    ) -> Result<Envelope<Value>, ApiError> {
        let url = self.url_for(endpoint);
        debug!(%url, ?query, "GET");
        let response = self
            .http
            .get(url.clone())
            .query(query)
            .send()
            .map_err(|source| transport_error(&url, source))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|source| transport_error(&url, source))?;
        if !status.is_success() {
            warn!(%url, status = status.as_u16(), "request failed");
            return Err(clean_error_response(status, &body));
        }
        decode_envelope(&endpoint.path(), &body)
    }

    /// Reads a collection. A missing or null `data` is an empty collection;
    /// a non-success envelope is `NotFound`.
    pub fn fetch_list<T: DeserializeOwned>(
        &self,
        endpoint: &Endpoint,
        query: &[(String, String)],
    ) -> Result<Vec<T>, ApiError> {
        let envelope = self.get_envelope(endpoint, query)?;
        if !envelope.is_success() {
            return Err(not_found(endpoint, envelope.message()));
        }
        match envelope.data {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(data) => serde_json::from_value(data).map_err(|error| ApiError::Malformed {
                path: endpoint.path(),
                detail: error.to_string(),
            }),
        }
    }

    pub fn fetch_one<T: DeserializeOwned>(&self, endpoint: &Endpoint) -> Result<T, ApiError> {
        let envelope = self.get_envelope(endpoint, &[])?;
        let message = envelope.message();
        match envelope.data {
            Some(data) if envelope.success == Some(true) && !data.is_null() => {
                serde_json::from_value(data).map_err(|error| ApiError::Malformed {
                    path: endpoint.path(),
                    detail: error.to_string(),
                })
            }
            _ => Err(not_found(endpoint, message)),
        }
    }

    /// Fetches the records behind a page as [`ListingRecord`]s.
    pub fn fetch_page(
        &self,
        page: PageKind,
        query: &[(String, String)],
        path_param: Option<&str>,
    ) -> Result<Vec<ListingRecord>, ApiError> {
        let Some(endpoint) = Endpoint::for_page(page, path_param) else {
            return Err(ApiError::NotFound(format!(
                "{} needs a model -- pick one first",
                page.label()
            )));
        };
        let records = match (&endpoint, page) {
            (Endpoint::Vehicle(_), _) => vec![ListingRecord::Vehicle(self.fetch_one(&endpoint)?)],
            (_, PageKind::Vehicles) => self.list_as(&endpoint, query, ListingRecord::Vehicle)?,
            (_, PageKind::Accessories) => {
                self.list_as(&endpoint, query, ListingRecord::Accessory)?
            }
            (_, PageKind::Offers) => self.list_as(&endpoint, query, ListingRecord::Offer)?,
            (_, PageKind::Brochures) => self.list_as(&endpoint, query, ListingRecord::Brochure)?,
            (_, PageKind::Gallery) => {
                self.list_as(&endpoint, query, ListingRecord::GalleryImage)?
            }
            (_, PageKind::Testimonials) => {
                self.list_as(&endpoint, query, ListingRecord::Testimonial)?
            }
            (_, PageKind::Faqs) => self.list_as(&endpoint, query, ListingRecord::Faq)?,
            (_, PageKind::Locations) => self.list_as(&endpoint, query, ListingRecord::Location)?,
            (_, PageKind::Specifications) => {
                self.list_as(&endpoint, query, ListingRecord::Specification)?
            }
            (_, PageKind::Highlights) => {
                self.list_as(&endpoint, query, ListingRecord::Highlight)?
            }
        };
        debug!(page = page.label(), count = records.len(), "page fetched");
        Ok(records)
    }

    fn list_as<T: DeserializeOwned>(
        &self,
        endpoint: &Endpoint,
        query: &[(String, String)],
        variant: fn(T) -> ListingRecord,
    ) -> Result<Vec<ListingRecord>, ApiError> {
        Ok(self
            .fetch_list(endpoint, query)?
            .into_iter()
            .map(variant)
            .collect())
    }

    /// Model names, accepting plain strings or objects with a `name`/`model`.
    pub fn models(&self) -> Result<Vec<String>, ApiError> {
        self.fetch_names(&Endpoint::Models)
    }

    pub fn accessory_categories(&self) -> Result<Vec<String>, ApiError> {
        self.fetch_names(&Endpoint::AccessoryCategories)
    }

    fn fetch_names(&self, endpoint: &Endpoint) -> Result<Vec<String>, ApiError> {
        let values: Vec<NameEntry> = self.fetch_list(endpoint, &[])?;
        Ok(values
            .into_iter()
            .filter_map(NameEntry::into_name)
            .collect())
    }

    /// Posts a lead. Returns the server's confirmation text, if any.
    pub fn submit<P: Serialize>(
        &self,
        form: LeadFormKind,
        payload: &P,
    ) -> Result<Option<String>, ApiError> {
        let segments = form
            .submit_path()
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>();
        let url = self.url_with_segments(&segments);
        debug!(%url, form = form.label(), "POST");
        let response = self
            .http
            .post(url.clone())
            .json(payload)
            .send()
            .map_err(|source| transport_error(&url, source))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|source| transport_error(&url, source))?;
        if !status.is_success() {
            warn!(%url, status = status.as_u16(), "submission failed");
            return Err(clean_error_response(status, &body));
        }
        if body.trim().is_empty() {
            return Ok(None);
        }
        let envelope = decode_envelope(form.submit_path(), &body)?;
        if envelope.success == Some(false) {
            return Err(ApiError::Rejected(envelope.message()));
        }
        Ok(envelope.message())
    }

    /// Reachability check; returns how many models the backend lists.
    pub fn ping(&self) -> Result<usize, ApiError> {
        self.models().map(|models| models.len())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NameEntry {
    Plain(String),
    Named {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        model: Option<String>,
    },
}

impl NameEntry {
    fn into_name(self) -> Option<String> {
        let name = match self {
            Self::Plain(name) => Some(name),
            Self::Named { name, model } => name.or(model),
        }?;
        let trimmed = name.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_owned())
    }
}

fn not_found(endpoint: &Endpoint, message: Option<String>) -> ApiError {
    ApiError::NotFound(message.unwrap_or_else(|| format!("nothing found at {}", endpoint.path())))
}

fn transport_error(url: &Url, source: reqwest::Error) -> ApiError {
    warn!(%url, error = %source, "transport failure");
    ApiError::Transport {
        url: url.to_string(),
        source,
    }
}

fn decode_envelope(path: &str, body: &str) -> Result<Envelope<Value>, ApiError> {
    serde_json::from_str(body).map_err(|error| ApiError::Malformed {
        path: path.to_owned(),
        detail: error.to_string(),
    })
}

fn clean_error_response(status: StatusCode, body: &str) -> ApiError {
    let message = serde_json::from_str::<Envelope<Value>>(body)
        .ok()
        .and_then(|envelope| envelope.message())
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty() && trimmed.len() < 100 && !trimmed.contains('{'))
                .then(|| trimmed.to_owned())
        });
    ApiError::Status {
        status: status.as_u16(),
        message,
    }
}
