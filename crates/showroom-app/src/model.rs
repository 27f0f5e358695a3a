// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use time::Date;

use crate::forms::LeadFormKind;
use crate::group::{GroupOrder, Grouping};
use crate::ids::*;
use crate::view::ViewConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Facet {
    Model,
    Category,
    FuelType,
    Transmission,
    Variant,
    City,
    Heading,
    Tab,
    Kind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    Exact,
    CaseInsensitive,
}

impl Facet {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Category => "category",
            Self::FuelType => "fuel",
            Self::Transmission => "transmission",
            Self::Variant => "variant",
            Self::City => "city",
            Self::Heading => "heading",
            Self::Tab => "tab",
            Self::Kind => "type",
        }
    }

    /// The "no constraint" choice shown first in every dropdown.
    pub const fn sentinel(self) -> &'static str {
        match self {
            Self::Model => "All Models",
            Self::Category => "All Categories",
            Self::FuelType => "All Fuel Types",
            Self::Transmission => "All Transmissions",
            Self::Variant => "All Variants",
            Self::City => "All Cities",
            Self::Heading => "All Headings",
            Self::Tab => "All Tabs",
            Self::Kind => "All Types",
        }
    }

    pub const fn query_key(self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Category => "category",
            Self::FuelType => "fuelType",
            Self::Transmission => "transmission",
            Self::Variant => "variant",
            Self::City => "city",
            Self::Heading => "heading",
            Self::Tab => "tab",
            Self::Kind => "kind",
        }
    }

    pub const fn match_mode(self) -> MatchMode {
        match self {
            Self::Model | Self::Variant | Self::Heading | Self::Tab => MatchMode::Exact,
            Self::Category | Self::FuelType | Self::Transmission | Self::City | Self::Kind => {
                MatchMode::CaseInsensitive
            }
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "model" => Some(Self::Model),
            "category" => Some(Self::Category),
            "fuel" | "fueltype" | "fuel_type" => Some(Self::FuelType),
            "transmission" => Some(Self::Transmission),
            "variant" => Some(Self::Variant),
            "city" => Some(Self::City),
            "heading" => Some(Self::Heading),
            "tab" => Some(Self::Tab),
            "type" | "kind" => Some(Self::Kind),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PageKind {
    Vehicles,
    Accessories,
    Offers,
    Brochures,
    Gallery,
    Testimonials,
    Faqs,
    Locations,
    Specifications,
    Highlights,
}

impl PageKind {
    pub const ALL: [Self; 10] = [
        Self::Vehicles,
        Self::Accessories,
        Self::Offers,
        Self::Brochures,
        Self::Gallery,
        Self::Testimonials,
        Self::Faqs,
        Self::Locations,
        Self::Specifications,
        Self::Highlights,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Vehicles => "vehicles",
            Self::Accessories => "accessories",
            Self::Offers => "offers",
            Self::Brochures => "brochures",
            Self::Gallery => "gallery",
            Self::Testimonials => "testimonials",
            Self::Faqs => "faq",
            Self::Locations => "locations",
            Self::Specifications => "specs",
            Self::Highlights => "highlights",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "vehicles" | "cars" => Some(Self::Vehicles),
            "accessories" => Some(Self::Accessories),
            "offers" => Some(Self::Offers),
            "brochures" => Some(Self::Brochures),
            "gallery" | "galleries" => Some(Self::Gallery),
            "testimonials" => Some(Self::Testimonials),
            "faq" | "faqs" => Some(Self::Faqs),
            "locations" => Some(Self::Locations),
            "specs" | "specifications" => Some(Self::Specifications),
            "highlights" => Some(Self::Highlights),
            _ => None,
        }
    }

    pub const fn columns(self) -> &'static [&'static str] {
        match self {
            Self::Vehicles => &[
                "name",
                "model",
                "type",
                "fuel",
                "transmission",
                "variant",
                "price",
            ],
            Self::Accessories => &["name", "category", "model", "part #", "price"],
            Self::Offers => &["title", "model", "valid until"],
            Self::Brochures => &["title", "model", "file"],
            Self::Gallery => &["caption", "model", "category", "image"],
            Self::Testimonials => &["customer", "rating", "message"],
            Self::Faqs => &["question", "category"],
            Self::Locations => &["name", "type", "city", "phone"],
            Self::Specifications => &["heading", "label", "value"],
            Self::Highlights => &["title", "tab", "model"],
        }
    }

    pub const fn view_config(self) -> ViewConfig {
        match self {
            Self::Vehicles => ViewConfig {
                filters: &[
                    Facet::Model,
                    Facet::Category,
                    Facet::FuelType,
                    Facet::Transmission,
                ],
                remote_filters: &[],
                grouping: None,
                accordion: false,
                requires_path_param: false,
            },
            Self::Accessories => ViewConfig {
                filters: &[Facet::Category, Facet::Model],
                remote_filters: &[Facet::Category],
                grouping: None,
                accordion: false,
                requires_path_param: false,
            },
            Self::Offers | Self::Brochures => ViewConfig {
                filters: &[Facet::Model],
                remote_filters: &[],
                grouping: None,
                accordion: false,
                requires_path_param: false,
            },
            Self::Gallery => ViewConfig {
                filters: &[Facet::Model],
                remote_filters: &[Facet::Model],
                grouping: Some(Grouping {
                    facet: Facet::Category,
                    order: GroupOrder::Insertion,
                }),
                accordion: false,
                requires_path_param: false,
            },
            Self::Testimonials => ViewConfig {
                filters: &[],
                remote_filters: &[],
                grouping: None,
                accordion: false,
                requires_path_param: false,
            },
            Self::Faqs => ViewConfig {
                filters: &[],
                remote_filters: &[],
                grouping: Some(Grouping {
                    facet: Facet::Category,
                    order: GroupOrder::Insertion,
                }),
                accordion: true,
                requires_path_param: false,
            },
            Self::Locations => ViewConfig {
                filters: &[Facet::Kind],
                remote_filters: &[],
                grouping: Some(Grouping {
                    facet: Facet::City,
                    order: GroupOrder::Alphabetical,
                }),
                accordion: false,
                requires_path_param: false,
            },
            Self::Specifications => ViewConfig {
                filters: &[Facet::Heading],
                remote_filters: &[],
                grouping: Some(Grouping {
                    facet: Facet::Variant,
                    order: GroupOrder::Insertion,
                }),
                accordion: false,
                requires_path_param: true,
            },
            Self::Highlights => ViewConfig {
                filters: &[],
                remote_filters: &[],
                grouping: Some(Grouping {
                    facet: Facet::Tab,
                    order: GroupOrder::Insertion,
                }),
                accordion: false,
                requires_path_param: true,
            },
        }
    }

    /// The lead form a selected item on this page feeds into.
    pub const fn enquiry_form(self) -> Option<LeadFormKind> {
        match self {
            Self::Vehicles => Some(LeadFormKind::LoanEnquiry),
            Self::Accessories => Some(LeadFormKind::ProductEnquiry),
            Self::Offers | Self::Highlights => Some(LeadFormKind::Contact),
            Self::Specifications | Self::Locations => Some(LeadFormKind::ServiceBooking),
            Self::Brochures | Self::Gallery | Self::Testimonials | Self::Faqs => None,
        }
    }
}

pub trait ListingItem {
    fn key(&self) -> &str;
    fn title(&self) -> &str;
    fn facet(&self, facet: Facet) -> Option<&str>;
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Vehicle {
    #[serde(alias = "_id")]
    pub id: VehicleId,
    pub name: String,
    pub slug: String,
    pub model: String,
    #[serde(alias = "bodyType")]
    pub category: String,
    pub fuel_type: String,
    pub transmission: String,
    pub variant: String,
    #[serde(deserialize_with = "lenient::amount")]
    pub price: Option<i64>,
    pub image: String,
    #[serde(alias = "images")]
    pub gallery: Vec<String>,
    pub description: String,
}

impl ListingItem for Vehicle {
    fn key(&self) -> &str {
        self.id.as_str()
    }

    fn title(&self) -> &str {
        &self.name
    }

    fn facet(&self, facet: Facet) -> Option<&str> {
        match facet {
            Facet::Model => non_empty(&self.model),
            Facet::Category => non_empty(&self.category),
            Facet::FuelType => non_empty(&self.fuel_type),
            Facet::Transmission => non_empty(&self.transmission),
            Facet::Variant => non_empty(&self.variant),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Accessory {
    #[serde(alias = "_id")]
    pub id: AccessoryId,
    pub name: String,
    pub category: String,
    pub model: String,
    pub part_number: String,
    #[serde(deserialize_with = "lenient::amount")]
    pub price: Option<i64>,
    pub image: String,
    pub description: String,
}

impl ListingItem for Accessory {
    fn key(&self) -> &str {
        self.id.as_str()
    }

    fn title(&self) -> &str {
        &self.name
    }

    fn facet(&self, facet: Facet) -> Option<&str> {
        match facet {
            Facet::Model => non_empty(&self.model),
            Facet::Category => non_empty(&self.category),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Offer {
    #[serde(alias = "_id")]
    pub id: OfferId,
    pub title: String,
    pub model: String,
    pub description: String,
    pub image: String,
    #[serde(with = "iso_date")]
    pub valid_until: Option<Date>,
}

impl ListingItem for Offer {
    fn key(&self) -> &str {
        self.id.as_str()
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn facet(&self, facet: Facet) -> Option<&str> {
        match facet {
            Facet::Model => non_empty(&self.model),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Brochure {
    #[serde(alias = "_id")]
    pub id: BrochureId,
    pub title: String,
    pub model: String,
    #[serde(alias = "pdf")]
    pub file: String,
}

impl ListingItem for Brochure {
    fn key(&self) -> &str {
        self.id.as_str()
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn facet(&self, facet: Facet) -> Option<&str> {
        match facet {
            Facet::Model => non_empty(&self.model),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GalleryImage {
    #[serde(alias = "_id")]
    pub id: GalleryImageId,
    pub model: String,
    pub category: String,
    pub image: String,
    pub caption: String,
}

impl ListingItem for GalleryImage {
    fn key(&self) -> &str {
        self.id.as_str()
    }

    fn title(&self) -> &str {
        &self.caption
    }

    fn facet(&self, facet: Facet) -> Option<&str> {
        match facet {
            Facet::Model => non_empty(&self.model),
            Facet::Category => non_empty(&self.category),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Testimonial {
    #[serde(alias = "_id")]
    pub id: TestimonialId,
    #[serde(alias = "name")]
    pub customer_name: String,
    pub message: String,
    #[serde(deserialize_with = "lenient::rating")]
    pub rating: Option<u8>,
    pub image: String,
}

impl ListingItem for Testimonial {
    fn key(&self) -> &str {
        self.id.as_str()
    }

    fn title(&self) -> &str {
        &self.customer_name
    }

    fn facet(&self, _facet: Facet) -> Option<&str> {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Faq {
    #[serde(alias = "_id")]
    pub id: FaqId,
    pub category: String,
    pub question: String,
    pub answer: String,
}

impl ListingItem for Faq {
    fn key(&self) -> &str {
        self.id.as_str()
    }

    fn title(&self) -> &str {
        &self.question
    }

    fn facet(&self, facet: Facet) -> Option<&str> {
        match facet {
            Facet::Category => non_empty(&self.category),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Location {
    #[serde(alias = "_id")]
    pub id: LocationId,
    pub name: String,
    #[serde(alias = "type")]
    pub kind: String,
    pub city: String,
    pub address: String,
    pub phone: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl ListingItem for Location {
    fn key(&self) -> &str {
        self.id.as_str()
    }

    fn title(&self) -> &str {
        &self.name
    }

    fn facet(&self, facet: Facet) -> Option<&str> {
        match facet {
            Facet::City => non_empty(&self.city),
            Facet::Kind => non_empty(&self.kind),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Specification {
    #[serde(alias = "_id")]
    pub id: SpecificationId,
    pub model: String,
    pub variant: String,
    pub heading: String,
    pub label: String,
    pub value: String,
}

impl ListingItem for Specification {
    fn key(&self) -> &str {
        self.id.as_str()
    }

    fn title(&self) -> &str {
        &self.label
    }

    fn facet(&self, facet: Facet) -> Option<&str> {
        match facet {
            Facet::Model => non_empty(&self.model),
            Facet::Variant => non_empty(&self.variant),
            Facet::Heading => non_empty(&self.heading),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Highlight {
    #[serde(alias = "_id")]
    pub id: HighlightId,
    pub model: String,
    pub tab: String,
    pub title: String,
    pub description: String,
    pub image: String,
}

impl ListingItem for Highlight {
    fn key(&self) -> &str {
        self.id.as_str()
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn facet(&self, facet: Facet) -> Option<&str> {
        match facet {
            Facet::Model => non_empty(&self.model),
            Facet::Tab => non_empty(&self.tab),
            _ => None,
        }
    }
}

/// Any record a page can list, so one view type can host every page.
#[derive(Debug, Clone, PartialEq)]
pub enum ListingRecord {
    Vehicle(Vehicle),
    Accessory(Accessory),
    Offer(Offer),
    Brochure(Brochure),
    GalleryImage(GalleryImage),
    Testimonial(Testimonial),
    Faq(Faq),
    Location(Location),
    Specification(Specification),
    Highlight(Highlight),
}

macro_rules! each_record {
    ($value:expr, $record:ident => $body:expr) => {
        match $value {
            ListingRecord::Vehicle($record) => $body,
            ListingRecord::Accessory($record) => $body,
            ListingRecord::Offer($record) => $body,
            ListingRecord::Brochure($record) => $body,
            ListingRecord::GalleryImage($record) => $body,
            ListingRecord::Testimonial($record) => $body,
            ListingRecord::Faq($record) => $body,
            ListingRecord::Location($record) => $body,
            ListingRecord::Specification($record) => $body,
            ListingRecord::Highlight($record) => $body,
        }
    };
}

impl ListingItem for ListingRecord {
    fn key(&self) -> &str {
        each_record!(self, record => record.key())
    }

    fn title(&self) -> &str {
        each_record!(self, record => record.title())
    }

    fn facet(&self, facet: Facet) -> Option<&str> {
        each_record!(self, record => record.facet(facet))
    }
}

impl ListingRecord {
    pub const fn page(&self) -> PageKind {
        match self {
            Self::Vehicle(_) => PageKind::Vehicles,
            Self::Accessory(_) => PageKind::Accessories,
            Self::Offer(_) => PageKind::Offers,
            Self::Brochure(_) => PageKind::Brochures,
            Self::GalleryImage(_) => PageKind::Gallery,
            Self::Testimonial(_) => PageKind::Testimonials,
            Self::Faq(_) => PageKind::Faqs,
            Self::Location(_) => PageKind::Locations,
            Self::Specification(_) => PageKind::Specifications,
            Self::Highlight(_) => PageKind::Highlights,
        }
    }

    /// Table cells in the order of [`PageKind::columns`].
    pub fn cells(&self, currency: &str) -> Vec<String> {
        match self {
            Self::Vehicle(vehicle) => vec![
                vehicle.name.clone(),
                vehicle.model.clone(),
                vehicle.category.clone(),
                vehicle.fuel_type.clone(),
                vehicle.transmission.clone(),
                vehicle.variant.clone(),
                format_optional_price(vehicle.price, currency),
            ],
            Self::Accessory(accessory) => vec![
                accessory.name.clone(),
                accessory.category.clone(),
                accessory.model.clone(),
                accessory.part_number.clone(),
                format_optional_price(accessory.price, currency),
            ],
            Self::Offer(offer) => vec![
                offer.title.clone(),
                offer.model.clone(),
                offer.valid_until.map(format_date).unwrap_or_default(),
            ],
            Self::Brochure(brochure) => vec![
                brochure.title.clone(),
                brochure.model.clone(),
                brochure.file.clone(),
            ],
            Self::GalleryImage(image) => vec![
                image.caption.clone(),
                image.model.clone(),
                image.category.clone(),
                image.image.clone(),
            ],
            Self::Testimonial(testimonial) => vec![
                testimonial.customer_name.clone(),
                testimonial.rating.map(format_rating).unwrap_or_default(),
                testimonial.message.clone(),
            ],
            Self::Faq(faq) => vec![faq.question.clone(), faq.category.clone()],
            Self::Location(location) => vec![
                location.name.clone(),
                location.kind.clone(),
                location.city.clone(),
                location.phone.clone(),
            ],
            Self::Specification(spec) => {
                vec![spec.heading.clone(), spec.label.clone(), spec.value.clone()]
            }
            Self::Highlight(highlight) => vec![
                highlight.title.clone(),
                highlight.tab.clone(),
                highlight.model.clone(),
            ],
        }
    }

    /// Labelled lines for the detail panel; empty values are skipped.
    pub fn detail_lines(&self, currency: &str) -> Vec<(&'static str, String)> {
        let lines = match self {
            Self::Vehicle(vehicle) => vec![
                ("name", vehicle.name.clone()),
                ("model", vehicle.model.clone()),
                ("variant", vehicle.variant.clone()),
                ("type", vehicle.category.clone()),
                ("fuel", vehicle.fuel_type.clone()),
                ("transmission", vehicle.transmission.clone()),
                ("price", format_optional_price(vehicle.price, currency)),
                ("description", vehicle.description.clone()),
            ],
            Self::Accessory(accessory) => vec![
                ("name", accessory.name.clone()),
                ("category", accessory.category.clone()),
                ("model", accessory.model.clone()),
                ("part #", accessory.part_number.clone()),
                ("price", format_optional_price(accessory.price, currency)),
                ("description", accessory.description.clone()),
            ],
            Self::Offer(offer) => vec![
                ("title", offer.title.clone()),
                ("model", offer.model.clone()),
                (
                    "valid until",
                    offer.valid_until.map(format_date).unwrap_or_default(),
                ),
                ("details", offer.description.clone()),
            ],
            Self::Brochure(brochure) => vec![
                ("title", brochure.title.clone()),
                ("model", brochure.model.clone()),
            ],
            Self::GalleryImage(image) => vec![
                ("caption", image.caption.clone()),
                ("model", image.model.clone()),
                ("category", image.category.clone()),
            ],
            Self::Testimonial(testimonial) => vec![
                ("customer", testimonial.customer_name.clone()),
                (
                    "rating",
                    testimonial.rating.map(format_rating).unwrap_or_default(),
                ),
                ("message", testimonial.message.clone()),
            ],
            Self::Faq(faq) => vec![
                ("category", faq.category.clone()),
                ("question", faq.question.clone()),
                ("answer", faq.answer.clone()),
            ],
            Self::Location(location) => vec![
                ("name", location.name.clone()),
                ("type", location.kind.clone()),
                ("address", location.address.clone()),
                ("city", location.city.clone()),
                ("phone", location.phone.clone()),
                (
                    "map",
                    match (location.latitude, location.longitude) {
                        (Some(lat), Some(lon)) => format!("{lat:.5}, {lon:.5}"),
                        _ => String::new(),
                    },
                ),
            ],
            Self::Specification(spec) => vec![
                ("model", spec.model.clone()),
                ("variant", spec.variant.clone()),
                ("heading", spec.heading.clone()),
                ("spec", format!("{}: {}", spec.label, spec.value)),
            ],
            Self::Highlight(highlight) => vec![
                ("title", highlight.title.clone()),
                ("tab", highlight.tab.clone()),
                ("model", highlight.model.clone()),
                ("description", highlight.description.clone()),
            ],
        };
        lines
            .into_iter()
            .filter(|(_, value)| !value.trim().is_empty())
            .collect()
    }

    /// Raw image/file references, before media base resolution.
    pub fn media_refs(&self) -> Vec<&str> {
        let refs: Vec<&str> = match self {
            Self::Vehicle(vehicle) => std::iter::once(vehicle.image.as_str())
                .chain(vehicle.gallery.iter().map(String::as_str))
                .collect(),
            Self::Accessory(accessory) => vec![accessory.image.as_str()],
            Self::Offer(offer) => vec![offer.image.as_str()],
            Self::Brochure(brochure) => vec![brochure.file.as_str()],
            Self::GalleryImage(image) => vec![image.image.as_str()],
            Self::Testimonial(testimonial) => vec![testimonial.image.as_str()],
            Self::Highlight(highlight) => vec![highlight.image.as_str()],
            Self::Faq(_) | Self::Location(_) | Self::Specification(_) => Vec::new(),
        };
        refs.into_iter()
            .filter(|value| !value.trim().is_empty())
            .collect()
    }

    /// Form field and value copied into the enquiry form when this record
    /// is the selection.
    pub fn enquiry_prefill(&self) -> Option<(&'static str, &str)> {
        let (key, value) = match self {
            Self::Vehicle(vehicle) => (
                "model",
                non_empty(&vehicle.model).or(non_empty(&vehicle.name)),
            ),
            Self::Accessory(accessory) => ("productId", non_empty(accessory.id.as_str())),
            Self::Offer(offer) => ("model", non_empty(&offer.model)),
            Self::Specification(spec) => ("model", non_empty(&spec.model)),
            Self::Highlight(highlight) => ("model", non_empty(&highlight.model)),
            Self::Location(location) => ("workshop", non_empty(&location.name)),
            Self::Brochure(_) | Self::GalleryImage(_) | Self::Testimonial(_) | Self::Faq(_) => {
                return None;
            }
        };
        value.map(|value| (key, value))
    }
}

pub fn format_price(amount: i64, currency: &str) -> String {
    let (sign, amount) = if amount >= 0 {
        ("", amount)
    } else if amount == i64::MIN {
        ("-", i64::MAX)
    } else {
        ("-", -amount)
    };
    format!("{sign}{currency}{}", comma_format(amount))
}

pub fn format_optional_price(amount: Option<i64>, currency: &str) -> String {
    amount.map_or_else(String::new, |value| format_price(value, currency))
}

fn format_rating(rating: u8) -> String {
    let stars = usize::from(rating.min(5));
    format!("{}{}", "*".repeat(stars), ".".repeat(5 - stars))
}

pub fn format_date(date: Date) -> String {
    date.format(&time::macros::format_description!("[year]-[month]-[day]"))
        .unwrap_or_default()
}

fn comma_format(value: i64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().rev().enumerate() {
        if index > 0 && index % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out.chars().rev().collect()
}

/// Scalars as the backend actually sends them: numbers sometimes arrive as
/// strings and the odd record carries garbage.
#[derive(Deserialize)]
#[serde(untagged)]
enum LooseScalar {
    Number(f64),
    Text(String),
    Other(serde::de::IgnoredAny),
}

impl LooseScalar {
    fn number(self) -> Option<f64> {
        let value = match self {
            Self::Number(value) => value,
            Self::Text(text) => text.trim().replace(',', "").parse().ok()?,
            Self::Other(serde::de::IgnoredAny) => return None,
        };
        value.is_finite().then_some(value)
    }
}

/// Per-field decoding that degrades a bad value to `None` so one broken
/// record never blanks a whole page.
mod lenient {
    use super::LooseScalar;
    use serde::{Deserialize, Deserializer};

    pub fn amount<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<LooseScalar>::deserialize(deserializer)?;
        Ok(raw
            .and_then(LooseScalar::number)
            .filter(|value| value.abs() < i64::MAX as f64)
            .map(|value| value.round() as i64))
    }

    pub fn rating<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<LooseScalar>::deserialize(deserializer)?;
        Ok(raw
            .and_then(LooseScalar::number)
            .filter(|value| *value >= 0.0)
            .map(|value| value.round().min(5.0) as u8))
    }
}

/// `YYYY-MM-DD` dates; longer ISO timestamps are truncated to their date and
/// anything unparseable decodes as no date.
mod iso_date {
    use super::LooseScalar;
    use serde::{Deserialize, Deserializer, Serializer};
    use time::Date;
    use time::macros::format_description;

    pub fn serialize<S>(value: &Option<Date>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(date) => serializer.serialize_str(&super::format_date(*date)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Date>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Some(LooseScalar::Text(raw)) = Option::<LooseScalar>::deserialize(deserializer)? else {
            return Ok(None);
        };
        let trimmed = raw.trim();
        let date_part = trimmed.get(..10).unwrap_or(trimmed);
        Ok(Date::parse(date_part, format_description!("[year]-[month]-[day]")).ok())
    }
}
