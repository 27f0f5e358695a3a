// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use showroom_api::{ApiError, Client};
use showroom_app::{FetchOutcome, FetchTicket, LeadSubmission, ListingRecord, PageKind};
use showroom_tui::{InternalEvent, PageRuntime};
use std::sync::mpsc::Sender;
use std::thread;
use tracing::{info, warn};

/// Maps a page fetch onto the view's outcome: a non-success envelope is
/// "not found", anything else that failed is a load failure.
pub fn fetch_outcome(
    page: PageKind,
    result: Result<Vec<ListingRecord>, ApiError>,
) -> FetchOutcome<ListingRecord> {
    match result {
        Ok(records) => FetchOutcome::Found(records),
        Err(error) if error.is_not_found() => FetchOutcome::NotFound(error.to_string()),
        Err(error) => {
            warn!(page = page.label(), %error, "page fetch failed");
            FetchOutcome::Failed(error.to_string())
        }
    }
}

pub fn submit_outcome(
    result: Result<Option<String>, ApiError>,
) -> std::result::Result<Option<String>, Option<String>> {
    match result {
        Ok(message) => Ok(message),
        Err(error) => {
            warn!(%error, "lead submission failed");
            Err(error.server_message().map(str::to_owned))
        }
    }
}

pub struct ApiRuntime {
    client: Client,
    currency: String,
}

impl ApiRuntime {
    pub fn new(client: Client, currency: &str) -> Self {
        Self {
            client,
            currency: currency.to_owned(),
        }
    }
}

impl PageRuntime for ApiRuntime {
    fn load_page(&mut self, page: PageKind, ticket: &FetchTicket) -> FetchOutcome<ListingRecord> {
        let result = self
            .client
            .fetch_page(page, &ticket.query, ticket.path_param.as_deref());
        fetch_outcome(page, result)
    }

    fn list_models(&mut self) -> Result<Vec<String>> {
        Ok(self.client.models()?)
    }

    fn list_categories(&mut self) -> Result<Vec<String>> {
        Ok(self.client.accessory_categories()?)
    }

    fn submit_lead(
        &mut self,
        submission: &LeadSubmission,
    ) -> std::result::Result<Option<String>, Option<String>> {
        submit_outcome(self.client.submit(submission.kind, submission))
    }

    fn resolve_media(&self, reference: &str) -> Option<String> {
        self.client.media().resolve(reference)
    }

    fn currency(&self) -> &str {
        &self.currency
    }

    fn spawn_fetch(
        &mut self,
        page: PageKind,
        ticket: FetchTicket,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let client = self.client.clone();
        thread::spawn(move || {
            let result = client.fetch_page(page, &ticket.query, ticket.path_param.as_deref());
            let _ = tx.send(InternalEvent::Fetched {
                page,
                request_id: ticket.request_id,
                outcome: fetch_outcome(page, result),
            });
        });
        Ok(())
    }

    fn spawn_models(&mut self, tx: Sender<InternalEvent>) -> Result<()> {
        let client = self.client.clone();
        thread::spawn(move || {
            let models = client.models().map_err(|error| error.to_string());
            let _ = tx.send(InternalEvent::Models(models));
        });
        Ok(())
    }

    fn spawn_categories(&mut self, tx: Sender<InternalEvent>) -> Result<()> {
        let client = self.client.clone();
        thread::spawn(move || {
            let categories = client
                .accessory_categories()
                .map_err(|error| error.to_string());
            let _ = tx.send(InternalEvent::Categories(categories));
        });
        Ok(())
    }

    fn spawn_submit(
        &mut self,
        request_id: u64,
        submission: LeadSubmission,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let client = self.client.clone();
        thread::spawn(move || {
            let outcome = submit_outcome(client.submit(submission.kind, &submission));
            if outcome.is_ok() {
                info!(form = submission.kind.label(), "lead submitted");
            }
            let _ = tx.send(InternalEvent::Submitted {
                request_id,
                outcome,
            });
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::ApiRuntime;
    use anyhow::Result;
    use showroom_api::Client;
    use showroom_app::{
        CollectionView, FetchOutcome, LeadForm, LeadFormKind, ListingRecord, PageKind,
    };
    use showroom_testkit::{
        CatalogFaker, MockApi, MockResponse, failure_envelope, list_envelope, message_envelope,
    };
    use showroom_tui::{InternalEvent, PageRuntime};
    use std::sync::mpsc;
    use std::time::Duration;

    fn runtime_for(api: &MockApi) -> Result<ApiRuntime> {
        let client = Client::new(api.base_url(), "https://cdn.test", Duration::from_secs(2))?;
        Ok(ApiRuntime::new(client, "₹"))
    }

    #[test]
    fn load_page_maps_envelopes_to_outcomes() -> Result<()> {
        let api = MockApi::start()?;
        let mut faker = CatalogFaker::new(21);
        api.get("/offers", list_envelope(&[faker.offer(), faker.offer()]));
        api.get("/brochures", failure_envelope("no brochures yet"));
        api.route(
            "GET",
            "/faqs",
            MockResponse::json(500, failure_envelope("database offline")),
        );

        let mut runtime = runtime_for(&api)?;
        let mut view = CollectionView::<ListingRecord>::new(PageKind::Offers.view_config());
        let ticket = view.begin_fetch();

        let offers = runtime.load_page(PageKind::Offers, &ticket);
        assert!(matches!(offers, FetchOutcome::Found(ref records) if records.len() == 2));

        let brochures = runtime.load_page(PageKind::Brochures, &ticket);
        assert_eq!(
            brochures,
            FetchOutcome::NotFound("no brochures yet".to_owned())
        );

        let faqs = runtime.load_page(PageKind::Faqs, &ticket);
        assert!(matches!(faqs, FetchOutcome::Failed(ref message) if message.contains("database offline")));
        Ok(())
    }

    #[test]
    fn background_fetch_reports_over_channel() -> Result<()> {
        let api = MockApi::start()?;
        let mut faker = CatalogFaker::new(22);
        api.get("/testimonials", list_envelope(&[faker.testimonial()]));

        let mut runtime = runtime_for(&api)?;
        let mut view =
            CollectionView::<ListingRecord>::new(PageKind::Testimonials.view_config());
        let ticket = view.begin_fetch();
        let request_id = ticket.request_id;

        let (tx, rx) = mpsc::channel();
        runtime.spawn_fetch(PageKind::Testimonials, ticket, tx)?;
        let event = rx.recv_timeout(Duration::from_secs(5))?;
        match event {
            InternalEvent::Fetched {
                page,
                request_id: received,
                outcome: FetchOutcome::Found(records),
            } => {
                assert_eq!(page, PageKind::Testimonials);
                assert_eq!(received, request_id);
                assert_eq!(records.len(), 1);
            }
            other => panic!("unexpected event {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn background_submit_carries_server_messages() -> Result<()> {
        let api = MockApi::start()?;
        api.post(
            "/enquiries/product",
            MockResponse::ok(message_envelope("we will call you about this part")),
        );
        api.post(
            "/enquiries/contact",
            MockResponse::json(503, "gateway down"),
        );

        let mut runtime = runtime_for(&api)?;
        let mut form = LeadForm::new(LeadFormKind::ProductEnquiry);
        form.set_field("name", "Meera");
        form.set_field("email", "meera@example.com");
        form.set_field("phone", "9876543210");
        form.prefill("productId", "acc-4");
        let submission = form.begin_submit()?;

        let (tx, rx) = mpsc::channel();
        runtime.spawn_submit(7, submission, tx.clone())?;
        assert_eq!(
            rx.recv_timeout(Duration::from_secs(5))?,
            InternalEvent::Submitted {
                request_id: 7,
                outcome: Ok(Some("we will call you about this part".to_owned())),
            }
        );

        let mut contact = LeadForm::new(LeadFormKind::Contact);
        contact.set_field("name", "Meera");
        contact.set_field("email", "meera@example.com");
        contact.set_field("phone", "9876543210");
        contact.set_field("message", "call me");
        runtime.spawn_submit(8, contact.begin_submit()?, tx)?;
        assert_eq!(
            rx.recv_timeout(Duration::from_secs(5))?,
            InternalEvent::Submitted {
                request_id: 8,
                outcome: Err(Some("gateway down".to_owned())),
            }
        );
        Ok(())
    }

    #[test]
    fn background_category_list_reports_over_channel() -> Result<()> {
        let api = MockApi::start()?;
        api.get(
            "/accessories/categories",
            list_envelope(&["Interior", "Care"]),
        );

        let mut runtime = runtime_for(&api)?;
        let (tx, rx) = mpsc::channel();
        runtime.spawn_categories(tx)?;
        assert_eq!(
            rx.recv_timeout(Duration::from_secs(5))?,
            InternalEvent::Categories(Ok(vec!["Interior".to_owned(), "Care".to_owned()]))
        );
        Ok(())
    }

    #[test]
    fn media_resolves_against_configured_base() -> Result<()> {
        let api = MockApi::start()?;
        let runtime = runtime_for(&api)?;
        assert_eq!(
            runtime.resolve_media("/uploads/a.jpg").as_deref(),
            Some("https://cdn.test/uploads/a.jpg")
        );
        assert_eq!(runtime.resolve_media("  "), None);
        assert_eq!(runtime.currency(), "₹");
        Ok(())
    }
}
