// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::runtime::fetch_outcome;
use anyhow::{Context, Result, anyhow, bail};
use showroom_api::Client;
use showroom_app::{
    CollectionView, Facet, FetchOutcome, FilterChoice, ListingRecord, LoadState, PageKind,
    ViewCommand,
};
use std::io::Write;

/// A page named on the command line, with an optional model or slug after
/// a colon (`specs:Aurora`, `vehicles:aurora-zx`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpTarget {
    pub page: PageKind,
    pub param: Option<String>,
}

impl DumpTarget {
    pub fn parse(raw: &str) -> Result<Self> {
        let (name, param) = match raw.split_once(':') {
            Some((name, param)) => (name, Some(param.trim().to_owned())),
            None => (raw, None),
        };
        let page = PageKind::parse(name).ok_or_else(|| {
            anyhow!(
                "unknown page {name:?}; expected one of: {}",
                PageKind::ALL
                    .iter()
                    .map(|page| page.label())
                    .collect::<Vec<_>>()
                    .join(", ")
            )
        })?;
        Ok(Self {
            page,
            param: param.filter(|value| !value.is_empty()),
        })
    }
}

pub fn parse_filter(raw: &str) -> Result<(Facet, String)> {
    let (field, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("--filter expects field=value, got {raw:?}"))?;
    let facet =
        Facet::parse(field).ok_or_else(|| anyhow!("unknown filter field {field:?}"))?;
    Ok((facet, value.trim().to_owned()))
}

/// Fetches one page, applies the filters and writes the visible rows as a
/// plain-text table. Returns how many rows were written.
pub fn dump_page<W: Write>(
    client: &Client,
    target: &DumpTarget,
    filters: &[(Facet, String)],
    currency: &str,
    out: &mut W,
) -> Result<usize> {
    let page = target.page;
    let config = page.view_config();
    let mut view = CollectionView::<ListingRecord>::new(config);

    if let Some(param) = &target.param {
        view.dispatch(ViewCommand::SetPathParam(Some(param.clone())));
    } else if config.requires_path_param {
        bail!(
            "{} are listed per model; use --dump {}:<model>",
            page.label(),
            page.label()
        );
    }

    for (facet, value) in filters {
        if !config.filters.contains(facet) {
            bail!(
                "{} cannot be filtered by {}; available: {}",
                page.label(),
                facet.label(),
                facet_names(config.filters)
            );
        }
        view.dispatch(ViewCommand::SetFilter(
            *facet,
            FilterChoice::from_label(*facet, value),
        ));
    }

    let ticket = view.begin_fetch();
    let result = client.fetch_page(page, &ticket.query, ticket.path_param.as_deref());
    view.apply_response(ticket.request_id, fetch_outcome(page, result));

    match view.load_state() {
        LoadState::Failed(message) => bail!("fetch {} failed: {message}", page.label()),
        LoadState::NotFound(message) => {
            writeln!(out, "{message}").context("write dump output")?;
            return Ok(0);
        }
        _ => {}
    }

    let rows = view
        .visible()
        .into_iter()
        .map(|record| record.cells(currency))
        .collect::<Vec<_>>();
    write_table(out, page.columns(), &rows).context("write dump output")?;
    Ok(rows.len())
}

fn facet_names(facets: &[Facet]) -> String {
    if facets.is_empty() {
        return "none".to_owned();
    }
    facets
        .iter()
        .map(|facet| facet.label())
        .collect::<Vec<_>>()
        .join(", ")
}

fn write_table<W: Write>(out: &mut W, columns: &[&str], rows: &[Vec<String>]) -> std::io::Result<()> {
    let mut widths = columns
        .iter()
        .map(|column| column.chars().count())
        .collect::<Vec<_>>();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let render = |cells: Vec<&str>| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_owned()
    };

    writeln!(out, "{}", render(columns.to_vec()))?;
    for row in rows {
        writeln!(out, "{}", render(row.iter().map(String::as_str).collect()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{DumpTarget, dump_page, parse_filter};
    use anyhow::Result;
    use showroom_api::Client;
    use showroom_app::{Facet, PageKind, Vehicle};
    use showroom_testkit::{CatalogFaker, MockApi, failure_envelope, list_envelope};
    use std::time::Duration;

    fn vehicle(faker: &mut CatalogFaker, model: &str, fuel: &str) -> Vehicle {
        Vehicle {
            fuel_type: fuel.to_owned(),
            ..faker.vehicle_for_model(model)
        }
    }

    #[test]
    fn dump_target_parses_page_and_param() -> Result<()> {
        assert_eq!(
            DumpTarget::parse("specs:Aurora")?,
            DumpTarget {
                page: PageKind::Specifications,
                param: Some("Aurora".to_owned()),
            }
        );
        assert_eq!(DumpTarget::parse("faq")?.param, None);
        let error = DumpTarget::parse("garage").expect_err("unknown page");
        assert!(error.to_string().contains("expected one of: vehicles"));
        Ok(())
    }

    #[test]
    fn filter_argument_requires_known_field() -> Result<()> {
        assert_eq!(
            parse_filter("fuel=Petrol")?,
            (Facet::FuelType, "Petrol".to_owned())
        );
        assert!(parse_filter("fuel").is_err());
        assert!(parse_filter("colour=red").is_err());
        Ok(())
    }

    #[test]
    fn dump_applies_local_filters() -> Result<()> {
        let api = MockApi::start()?;
        let mut faker = CatalogFaker::new(31);
        api.get(
            "/vehicles",
            list_envelope(&[
                vehicle(&mut faker, "Aurora", "Petrol"),
                vehicle(&mut faker, "Breeze", "Diesel"),
                vehicle(&mut faker, "Aurora", "petrol"),
            ]),
        );
        let client = Client::new(api.base_url(), "", Duration::from_secs(2))?;

        let mut out = Vec::new();
        let written = dump_page(
            &client,
            &DumpTarget::parse("vehicles")?,
            &[(Facet::FuelType, "PETROL".to_owned())],
            "₹",
            &mut out,
        )?;
        assert_eq!(written, 2);

        let text = String::from_utf8(out)?;
        let lines = text.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("name"));
        assert!(lines[1..].iter().all(|line| line.contains("Aurora")));
        assert!(api.requests()[0].query().is_none());
        Ok(())
    }

    #[test]
    fn dump_brochures_by_model() -> Result<()> {
        let api = MockApi::start()?;
        let mut faker = CatalogFaker::new(32);
        let brochures = (0..6).map(|_| faker.brochure()).collect::<Vec<_>>();
        let model = brochures[0].model.clone();
        let expected = brochures.iter().filter(|b| b.model == model).count();
        api.get("/brochures", list_envelope(&brochures));
        let client = Client::new(api.base_url(), "", Duration::from_secs(2))?;

        let mut out = Vec::new();
        let written = dump_page(
            &client,
            &DumpTarget::parse("brochures")?,
            &[(Facet::Model, model.clone())],
            "₹",
            &mut out,
        )?;
        assert_eq!(written, expected);
        let text = String::from_utf8(out)?;
        assert!(text.lines().skip(1).all(|line| line.contains(&model)));
        assert!(text.contains(".pdf"));
        Ok(())
    }

    #[test]
    fn dump_reports_not_found_and_rejects_unsupported_filters() -> Result<()> {
        let api = MockApi::start()?;
        api.get("/offers", failure_envelope("no offers this month"));
        let client = Client::new(api.base_url(), "", Duration::from_secs(2))?;

        let mut out = Vec::new();
        let written = dump_page(&client, &DumpTarget::parse("offers")?, &[], "₹", &mut out)?;
        assert_eq!(written, 0);
        assert_eq!(String::from_utf8(out)?, "no offers this month\n");

        let error = dump_page(
            &client,
            &DumpTarget::parse("offers")?,
            &[(Facet::City, "Pune".to_owned())],
            "₹",
            &mut Vec::new(),
        )
        .expect_err("offers do not filter by city");
        assert!(error.to_string().contains("available: model"));

        let error = dump_page(&client, &DumpTarget::parse("specs")?, &[], "₹", &mut Vec::new())
            .expect_err("specs need a model");
        assert!(error.to_string().contains("--dump specs:<model>"));
        Ok(())
    }
}
