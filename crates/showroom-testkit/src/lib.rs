// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use serde_json::{Value, json};
use showroom_app::{
    Accessory, AccessoryId, Brochure, BrochureId, Faq, FaqId, GalleryImage, GalleryImageId,
    Highlight, HighlightId, Location, LocationId, Offer, OfferId, Specification, SpecificationId,
    Testimonial, TestimonialId, Vehicle, VehicleId,
};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use time::{Date, Duration, Month};
use tiny_http::{Header, Response, Server};

const MODELS: [&str; 8] = [
    "Aurora", "Breeze", "Comet", "Drift", "Ember", "Fable", "Glide", "Harbor",
];
const BODY_TYPES: [&str; 5] = ["Hatchback", "Sedan", "SUV", "MUV", "Crossover"];
const FUEL_TYPES: [&str; 4] = ["Petrol", "Diesel", "CNG", "Electric"];
const TRANSMISSIONS: [&str; 3] = ["Manual", "AMT", "Automatic"];
const VARIANTS: [&str; 5] = ["LXi", "VXi", "ZXi", "ZXi+", "Alpha"];

const ACCESSORY_CATEGORIES: [&str; 5] = ["Interior", "Exterior", "Electronics", "Safety", "Care"];
const ACCESSORY_NAMES: [&str; 12] = [
    "Seat Cover",
    "Floor Mat",
    "Body Side Moulding",
    "Door Visor",
    "Mud Flap",
    "Dash Camera",
    "Reverse Sensor",
    "Tyre Inflator",
    "Car Perfume",
    "Roof Rail",
    "Fog Lamp",
    "Steering Cover",
];

const FAQ_CATEGORIES: [&str; 4] = ["Sales", "Service", "Finance", "Insurance"];
const CITIES: [&str; 8] = [
    "Pune",
    "Nashik",
    "Mumbai",
    "Nagpur",
    "Aurangabad",
    "Kolhapur",
    "Satara",
    "Thane",
];
const LOCATION_KINDS: [&str; 3] = ["Showroom", "Workshop", "True Value"];
const STREETS: [&str; 8] = [
    "MG Road",
    "Station Road",
    "Ring Road",
    "College Road",
    "Market Yard",
    "Baner Road",
    "Link Road",
    "Highway Service Road",
];
const SPEC_HEADINGS: [(&str, &[(&str, &str)]); 4] = [
    (
        "Engine",
        &[
            ("Displacement", "1197 cc"),
            ("Max Power", "89 bhp"),
            ("Max Torque", "113 Nm"),
        ],
    ),
    (
        "Dimensions",
        &[
            ("Length", "3845 mm"),
            ("Width", "1735 mm"),
            ("Boot Space", "318 L"),
        ],
    ),
    (
        "Safety",
        &[("Airbags", "6"), ("ABS with EBD", "Yes"), ("ISOFIX", "Yes")],
    ),
    (
        "Comfort",
        &[
            ("Climate Control", "Automatic"),
            ("Cruise Control", "Yes"),
            ("Touchscreen", "9 inch"),
        ],
    ),
];
const HIGHLIGHT_TABS: [&str; 4] = ["Exterior", "Interior", "Performance", "Safety"];
const GALLERY_CATEGORIES: [&str; 3] = ["Exterior", "Interior", "Colours"];

const FIRST_NAMES: [&str; 12] = [
    "Asha", "Rohan", "Meera", "Kabir", "Ishaan", "Priya", "Vikram", "Nisha", "Arjun", "Sana",
    "Dev", "Tara",
];
const LAST_NAMES: [&str; 10] = [
    "Rao", "Kulkarni", "Shah", "Patil", "Iyer", "Menon", "Desai", "Joshi", "Naik", "Pawar",
];

struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

/// Seeded generator of catalogue records. The same seed always yields the
/// same sequence.
pub struct CatalogFaker {
    rng: DeterministicRng,
    seed: u64,
    counter: u64,
}

impl CatalogFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            seed: normalized,
            counter: 0,
        }
    }

    pub fn model(&mut self) -> &'static str {
        self.pick(&MODELS)
    }

    pub fn vehicle(&mut self) -> Vehicle {
        let model = self.model();
        self.vehicle_for_model(model)
    }

    pub fn vehicle_for_model(&mut self, model: &str) -> Vehicle {
        let variant = self.pick(&VARIANTS);
        let name = format!("{model} {variant}");
        Vehicle {
            id: VehicleId::new(self.next_id("veh")),
            slug: slugify(&name),
            name,
            model: model.to_owned(),
            category: self.pick(&BODY_TYPES).to_owned(),
            fuel_type: self.pick(&FUEL_TYPES).to_owned(),
            transmission: self.pick(&TRANSMISSIONS).to_owned(),
            variant: variant.to_owned(),
            price: Some(self.int_range(550, 2_400) as i64 * 1_000),
            image: format!("uploads/vehicles/{}.jpg", slugify(model)),
            gallery: (1..=3)
                .map(|index| format!("uploads/vehicles/{}-{index}.jpg", slugify(model)))
                .collect(),
            description: format!("The {model} {variant} in a dealership-fresh finish."),
        }
    }

    pub fn accessory(&mut self) -> Accessory {
        let name = self.pick(&ACCESSORY_NAMES);
        Accessory {
            id: AccessoryId::new(self.next_id("acc")),
            name: name.to_owned(),
            category: self.pick(&ACCESSORY_CATEGORIES).to_owned(),
            model: self.model().to_owned(),
            part_number: format!("PN-{:05}", self.int_range(1, 99_999)),
            price: Some(self.int_range(4, 250) as i64 * 100),
            image: format!("uploads/accessories/{}.png", slugify(name)),
            description: format!("Genuine {} accessory.", name.to_ascii_lowercase()),
        }
    }

    pub fn offer(&mut self) -> Offer {
        let model = self.model();
        let base = Date::from_calendar_date(2026, Month::January, 1).unwrap_or(Date::MIN);
        Offer {
            id: OfferId::new(self.next_id("off")),
            title: format!("Save on the {model}"),
            model: model.to_owned(),
            description: "Exchange bonus plus corporate discount.".to_owned(),
            image: format!("uploads/offers/{}.jpg", slugify(model)),
            valid_until: base.checked_add(Duration::days(self.int_range(10, 300) as i64)),
        }
    }

    pub fn brochure(&mut self) -> Brochure {
        let model = self.model();
        Brochure {
            id: BrochureId::new(self.next_id("bro")),
            title: format!("{model} brochure"),
            model: model.to_owned(),
            file: format!("uploads/brochures/{}.pdf", slugify(model)),
        }
    }

    pub fn gallery_image(&mut self) -> GalleryImage {
        let model = self.model();
        let category = self.pick(&GALLERY_CATEGORIES);
        GalleryImage {
            id: GalleryImageId::new(self.next_id("img")),
            model: model.to_owned(),
            category: category.to_owned(),
            image: format!(
                "uploads/gallery/{}-{}.jpg",
                slugify(model),
                slugify(category)
            ),
            caption: format!("{model} {}", category.to_ascii_lowercase()),
        }
    }

    pub fn testimonial(&mut self) -> Testimonial {
        Testimonial {
            id: TestimonialId::new(self.next_id("tst")),
            customer_name: self.person_name(),
            message: "Smooth delivery and a friendly team.".to_owned(),
            rating: Some(self.int_range(3, 5) as u8),
            image: String::new(),
        }
    }

    pub fn faq(&mut self) -> Faq {
        let category = self.pick(&FAQ_CATEGORIES);
        let id = self.next_id("faq");
        Faq {
            question: format!("{category} question {id}?"),
            answer: format!("Answer for {category} question {id}."),
            id: FaqId::new(id),
            category: category.to_owned(),
        }
    }

    pub fn location(&mut self) -> Location {
        let city = self.pick(&CITIES);
        let kind = self.pick(&LOCATION_KINDS);
        Location {
            id: LocationId::new(self.next_id("loc")),
            name: format!("{city} {kind}"),
            kind: kind.to_owned(),
            city: city.to_owned(),
            address: format!("{} {}, {city}", self.int_range(1, 400), self.pick(&STREETS)),
            phone: format!("+91 20 {:04} {:04}", self.int_range(1000, 9999), self.int_range(1000, 9999)),
            latitude: Some(18.0 + self.int_range(0, 999) as f64 / 1000.0),
            longitude: Some(73.0 + self.int_range(0, 999) as f64 / 1000.0),
        }
    }

    /// One row per (variant, spec line) for a model.
    pub fn specifications(&mut self, model: &str, variants: usize) -> Vec<Specification> {
        let mut rows = Vec::new();
        for variant in VARIANTS.iter().take(variants.max(1)) {
            for (heading, lines) in SPEC_HEADINGS {
                for (label, value) in lines {
                    rows.push(Specification {
                        id: SpecificationId::new(self.next_id("spc")),
                        model: model.to_owned(),
                        variant: (*variant).to_owned(),
                        heading: heading.to_owned(),
                        label: (*label).to_owned(),
                        value: (*value).to_owned(),
                    });
                }
            }
        }
        rows
    }

    pub fn highlights(&mut self, model: &str) -> Vec<Highlight> {
        HIGHLIGHT_TABS
            .iter()
            .map(|tab| Highlight {
                id: HighlightId::new(self.next_id("hil")),
                model: model.to_owned(),
                tab: (*tab).to_owned(),
                title: format!("{model} {}", tab.to_ascii_lowercase()),
                description: format!("What makes the {model} {} stand out.", tab.to_ascii_lowercase()),
                image: format!("uploads/highlights/{}-{}.jpg", slugify(model), slugify(tab)),
            })
            .collect()
    }

    fn person_name(&mut self) -> String {
        format!("{} {}", self.pick(&FIRST_NAMES), self.pick(&LAST_NAMES))
    }

    fn next_id(&mut self, prefix: &str) -> String {
        self.counter += 1;
        format!("{prefix}-{}-{}", self.seed, self.counter)
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }

    fn int_range(&mut self, min: u64, max: u64) -> u64 {
        if max <= min {
            return min;
        }
        min + self.rng.next_u64() % (max - min + 1)
    }
}

pub fn models() -> &'static [&'static str] {
    &MODELS
}

pub fn slugify(value: &str) -> String {
    value
        .split(|ch: char| !ch.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// `{"success": true, "data": [...]}` for a list of records.
pub fn list_envelope<T: Serialize>(items: &[T]) -> String {
    json!({ "success": true, "data": items }).to_string()
}

pub fn item_envelope<T: Serialize>(item: &T) -> String {
    json!({ "success": true, "data": item }).to_string()
}

pub fn failure_envelope(message: &str) -> String {
    json!({ "success": false, "message": message }).to_string()
}

pub fn message_envelope(message: &str) -> String {
    json!({ "success": true, "message": message }).to_string()
}

pub fn temp_config_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let path = dir.path().join("config.toml");
    Ok((dir, path))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockResponse {
    pub status: u16,
    pub body: String,
}

impl MockResponse {
    pub fn json(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn ok(body: impl Into<String>) -> Self {
        Self::json(200, body)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub url: String,
    pub body: String,
}

impl RecordedRequest {
    pub fn path(&self) -> &str {
        self.url.split('?').next().unwrap_or(&self.url)
    }

    pub fn query(&self) -> Option<&str> {
        self.url.split_once('?').map(|(_, query)| query)
    }

    pub fn json_body(&self) -> Result<Value> {
        serde_json::from_str(&self.body).context("decode recorded request body")
    }
}

type Routes = BTreeMap<(String, String), MockResponse>;

/// An in-process REST backend. Routes are keyed by method and path (query
/// strings are ignored for matching); every request is recorded.
pub struct MockApi {
    base_url: String,
    server: Arc<Server>,
    routes: Arc<Mutex<Routes>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    handle: Option<JoinHandle<()>>,
}

impl MockApi {
    pub fn start() -> Result<Self> {
        let server = Server::http("127.0.0.1:0")
            .map_err(|error| anyhow!("start mock server: {error}"))?;
        let base_url = format!("http://{}", server.server_addr());
        let server = Arc::new(server);
        let routes = Arc::new(Mutex::new(Routes::new()));
        let requests = Arc::new(Mutex::new(Vec::new()));

        let handle = {
            let server = Arc::clone(&server);
            let routes = Arc::clone(&routes);
            let requests = Arc::clone(&requests);
            thread::spawn(move || serve(&server, &routes, &requests))
        };

        Ok(Self {
            base_url,
            server,
            routes,
            requests,
            handle: Some(handle),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn route(&self, method: &str, path: &str, response: MockResponse) {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((method.to_ascii_uppercase(), path.to_owned()), response);
    }

    pub fn get(&self, path: &str, body: impl Into<String>) {
        self.route("GET", path, MockResponse::ok(body));
    }

    pub fn post(&self, path: &str, response: MockResponse) {
        self.route("POST", path, response);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Drop for MockApi {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn serve(server: &Server, routes: &Mutex<Routes>, requests: &Mutex<Vec<RecordedRequest>>) {
    for mut request in server.incoming_requests() {
        let mut body = String::new();
        let _ = request.as_reader().read_to_string(&mut body);
        let recorded = RecordedRequest {
            method: request.method().to_string().to_ascii_uppercase(),
            url: request.url().to_owned(),
            body,
        };

        let response = routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(recorded.method.clone(), recorded.path().to_owned()))
            .cloned()
            .unwrap_or_else(|| MockResponse::json(404, failure_envelope("no such route")));
        requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(recorded);

        let mut reply = Response::from_string(response.body).with_status_code(response.status);
        if let Ok(header) = Header::from_bytes("Content-Type", "application/json") {
            reply = reply.with_header(header);
        }
        let _ = request.respond(reply);
    }
}
