mod config;
mod logging;
mod render;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use refresh_core::{AppViewModel, JobView, ListQuery, Page};
use refresh_engine::{CompletionHook, Orchestrator, PageFetcher, ReqwestApi};
use refresh_logging::{refresh_info, refresh_warn};
use tokio::sync::{watch, Notify};

use crate::logging::LogDestination;

/// Trigger a backend refresh, follow it to completion, and page through narrative parents.
#[derive(Debug, Parser)]
#[command(name = "refresh", version)]
pub struct Args {
    /// RON configuration file. Defaults to ./refresh.ron when present.
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub base_url: Option<String>,
    /// Bearer token for the refresh endpoints.
    #[arg(long)]
    pub token: Option<String>,
    /// Narrative whose parents are listed.
    #[arg(long)]
    pub narrative: Option<String>,
    #[arg(long)]
    pub page_size: Option<u32>,
    /// Ask the backend for debug details on list pages.
    #[arg(long)]
    pub debug: bool,
    /// Additional pages to load after the first.
    #[arg(long, default_value_t = 0)]
    pub pages: u32,
    /// Only show the list; do not start a refresh.
    #[arg(long)]
    pub no_refresh: bool,
    #[arg(long, value_enum, default_value_t = LogDestination::Terminal)]
    pub log: LogDestination,
    #[arg(long)]
    pub log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::initialize(
        args.log,
        refresh_logging::level_from_name(args.log_level.as_deref()),
    );

    let file = config::load_file(args.config.as_deref())?;
    let config = config::resolve(file, |key| std::env::var(key).ok(), &args)?;
    let api = Arc::new(ReqwestApi::new(config.client.clone()).context("building HTTP client")?);

    let initial = match &config.query {
        Some(query) => api
            .fetch_page(query, None)
            .await
            .with_context(|| format!("loading first page of {}", query.name))?,
        None => Page::last(Vec::new()),
    };
    // Without a narrative the list is empty and exhausted, so it never fetches.
    let list_query = config
        .query
        .clone()
        .unwrap_or_else(|| ListQuery::new(String::new()));

    let settled = Arc::new(Notify::new());
    let hook: CompletionHook = {
        let settled = settled.clone();
        Arc::new(move || settled.notify_one())
    };
    let orchestrator = Orchestrator::spawn(config.poll, api.clone(), list_query, initial, hook);
    let mut rx = orchestrator.subscribe();

    let session = Session {
        orchestrator: &orchestrator,
        api: api.as_ref(),
        query: config.query.as_ref(),
        settled: &settled,
    };
    let outcome = tokio::select! {
        result = session.run(&args, &mut rx) => result,
        _ = tokio::signal::ctrl_c() => {
            refresh_warn!("Interrupted; tearing down");
            Ok(())
        }
    };

    orchestrator.teardown();
    outcome
}

struct Session<'a> {
    orchestrator: &'a Orchestrator,
    api: &'a ReqwestApi,
    query: Option<&'a ListQuery>,
    settled: &'a Notify,
}

impl Session<'_> {
    async fn run(
        &self,
        args: &Args,
        rx: &mut watch::Receiver<AppViewModel>,
    ) -> anyhow::Result<()> {
        if self.query.is_some() {
            print_lines(render::render_list(&self.orchestrator.snapshot()));
        }

        if !args.no_refresh {
            self.orchestrator.start();
            let view = follow_job(rx).await?;
            if view.job.state == refresh_core::JobState::Done {
                self.settled.notified().await;
                self.reload_first_page().await?;
            }
        }

        for _ in 0..args.pages {
            let before = self.orchestrator.snapshot();
            if !before.list.has_more {
                break;
            }
            self.orchestrator.load_more();
            let count = before.list.items.len();
            let view = wait_until(rx, |view| {
                !view.list.loading && (view.list.items.len() != count || view.list.error.is_some())
            })
            .await?;
            print_lines(render::render_list(&view));
            if view.list.error.is_some() {
                break;
            }
        }
        Ok(())
    }

    /// Re-reads the list once the backend has had time to write new data.
    async fn reload_first_page(&self) -> anyhow::Result<()> {
        let Some(query) = self.query else {
            return Ok(());
        };
        let page = self
            .api
            .fetch_page(query, None)
            .await
            .with_context(|| format!("reloading {} after refresh", query.name))?;
        refresh_info!("Reloaded {} items after refresh", page.items.len());
        println!("{} now has {} parents on the first page", query.name, page.items.len());
        Ok(())
    }
}

/// Prints job changes until the job is terminal or polling gave up.
async fn follow_job(rx: &mut watch::Receiver<AppViewModel>) -> anyhow::Result<AppViewModel> {
    let mut last_printed: Option<JobView> = None;
    loop {
        let view = rx.borrow_and_update().clone();
        if last_printed.as_ref() != Some(&view.job) {
            print_lines(render::render_job(&view));
            last_printed = Some(view.job.clone());
        }
        if view.job.state.is_terminal() || view.job.notice.is_some() {
            return Ok(view);
        }
        rx.changed().await.context("orchestrator stopped")?;
    }
}

async fn wait_until(
    rx: &mut watch::Receiver<AppViewModel>,
    pred: impl Fn(&AppViewModel) -> bool,
) -> anyhow::Result<AppViewModel> {
    loop {
        let view = rx.borrow_and_update().clone();
        if pred(&view) {
            return Ok(view);
        }
        rx.changed().await.context("orchestrator stopped")?;
    }
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{}", line);
    }
}
