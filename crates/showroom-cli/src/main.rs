// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod dump;
mod runtime;

use anyhow::{Context, Result, anyhow, bail};
use config::Config;
use dump::{DumpTarget, dump_page, parse_filter};
use runtime::ApiRuntime;
use showroom_api::Client;
use showroom_app::{AppState, Facet};
use std::env;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `showroom --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;

    let interactive = !options.check_only && options.dump.is_none() && options.list.is_none();
    init_logging(&config, interactive)?;

    let client = Client::new(
        &config.api_base_url(),
        config.media_base_url(),
        config.api_timeout()?,
    )
    .with_context(|| {
        format!(
            "invalid [api] config in {}; fix base_url/media_base_url/timeout values",
            options.config_path.display()
        )
    })?;

    if options.check_only {
        let models = client.ping().with_context(|| {
            format!("{} did not answer the model list request", client.base_url())
        })?;
        println!("ok: {} lists {models} models", client.base_url());
        return Ok(());
    }

    if let Some(list) = options.list {
        let names = match list {
            ListKind::Models => client.models(),
            ListKind::Categories => client.accessory_categories(),
        }
        .with_context(|| format!("list {} from {}", list.label(), client.base_url()))?;
        for name in names {
            println!("{name}");
        }
        return Ok(());
    }

    if let Some(target) = &options.dump {
        let mut stdout = io::stdout().lock();
        let rows = dump_page(
            &client,
            target,
            &options.filters,
            config.currency(),
            &mut stdout,
        )?;
        info!(page = target.page.label(), rows, "dump finished");
        return Ok(());
    }

    let (start_page, start_model) = match options.start_page {
        Some(target) => (target.page, target.param),
        None => (config.start_page(), None),
    };
    info!(
        base_url = client.base_url(),
        page = start_page.label(),
        model = start_model.as_deref().unwrap_or(""),
        "starting showroom"
    );
    let mut state = AppState::new(start_page);
    let mut runtime = ApiRuntime::new(client, config.currency());
    showroom_tui::run_app(&mut state, &mut runtime, start_model)
}

/// The terminal owns stdout while the TUI runs, so interactive sessions log
/// to a file; one-shot commands log to stderr.
fn init_logging(config: &Config, interactive: bool) -> Result<()> {
    let filter = match env::var("SHOWROOM_LOG") {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(directives)
            .context("SHOWROOM_LOG is not a valid log filter")?,
        _ => EnvFilter::try_new(config.log_level()).context("invalid [log].level")?,
    };

    if interactive {
        let path = config.log_file()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create log directory {}", parent.display()))?;
        }
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| {
                format!(
                    "open log file {} -- set [log].file to a writable path",
                    path.display()
                )
            })?;
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
            .try_init()
            .context("install log subscriber")?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .try_init()
            .context("install log subscriber")?;
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Models,
    Categories,
}

impl ListKind {
    fn parse(value: &str) -> Result<Self> {
        match value {
            "models" => Ok(Self::Models),
            "categories" => Ok(Self::Categories),
            other => bail!("--list expects models or categories, got {other:?}"),
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Models => "models",
            Self::Categories => "accessory categories",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    print_example: bool,
    check_only: bool,
    start_page: Option<DumpTarget>,
    dump: Option<DumpTarget>,
    filters: Vec<(Facet, String)>,
    list: Option<ListKind>,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        print_example: false,
        check_only: false,
        start_page: None,
        dump: None,
        filters: Vec::new(),
        list: None,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--page" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--page requires a page name"))?;
                let target = DumpTarget::parse(value.as_ref())?;
                if target.param.is_some() && !target.page.view_config().requires_path_param {
                    bail!(
                        "--page {}: {} is not listed per model; drop the :model suffix",
                        value.as_ref(),
                        target.page.label()
                    );
                }
                options.start_page = Some(target);
            }
            "--dump" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--dump requires a page name"))?;
                options.dump = Some(DumpTarget::parse(value.as_ref())?);
            }
            "--filter" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--filter requires field=value"))?;
                options.filters.push(parse_filter(value.as_ref())?);
            }
            "--list" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--list requires models or categories"))?;
                options.list = Some(ListKind::parse(value.as_ref())?);
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    if !options.filters.is_empty() && options.dump.is_none() {
        bail!("--filter only applies to --dump");
    }

    Ok(options)
}

fn print_help() {
    println!("showroom");
    println!("  --config <path>            Use a specific config path");
    println!("  --print-config-path        Print resolved config path");
    println!("  --print-example-config     Print a config template");
    println!("  --check                    Validate config and ping the API");
    println!("  --page <name[:model]>      Open the terminal UI on this page");
    println!("  --dump <page[:model]>      Print one page as a table and exit");
    println!("  --filter <field=value>     Narrow --dump output (repeatable)");
    println!("  --list <models|categories> Print model names or accessory categories");
    println!("  --help                     Show this help");
}
