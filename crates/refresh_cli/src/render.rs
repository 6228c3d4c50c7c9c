use chrono::SecondsFormat;
use refresh_core::{AppViewModel, JobState, ParentItem};

/// Status lines for the refresh control, in display order.
pub fn render_job(view: &AppViewModel) -> Vec<String> {
    let job = &view.job;
    let state = match job.state {
        JobState::Idle => "idle",
        JobState::Queued => "queued",
        JobState::Running => "running",
        JobState::Done => "done",
        JobState::Error => "error",
    };

    let mut lines = vec![match &job.last_observed_at {
        Some(at) => format!(
            "[{}] refresh {}",
            at.to_rfc3339_opts(SecondsFormat::Secs, true),
            state
        ),
        None => format!("refresh {}", state),
    }];
    if let Some(text) = &job.status_text {
        lines.push(format!("  {}", text));
    }
    if let Some(notice) = &job.notice {
        lines.push(format!("  ! {}", notice));
    }
    if let Some(error) = &job.error {
        lines.push(format!("  error: {}", error));
    }
    lines
}

/// List lines; one per item plus a footer describing paging state.
pub fn render_list(view: &AppViewModel) -> Vec<String> {
    let list = &view.list;
    let mut lines: Vec<String> = list
        .items
        .iter()
        .enumerate()
        .map(|(idx, item)| format_item(idx + 1, item))
        .collect();

    let footer = if list.loading {
        "loading more…".to_string()
    } else if list.has_more {
        format!("{} items, more available", list.items.len())
    } else {
        format!("{} items, end of list", list.items.len())
    };
    lines.push(footer);
    if let Some(error) = &list.error {
        lines.push(format!("error: {}", error));
    }
    lines
}

fn format_item(rank: usize, item: &ParentItem) -> String {
    let mut line = format!("{:>3}. {}", rank, item.parent);
    if let Some(symbol) = &item.symbol {
        line.push_str(&format!(" ({})", symbol));
    }
    line.push_str(&format!(" matches={}", item.matches));
    if let Some(score) = item.score {
        line.push_str(&format!(" score={:.2}", score));
    }
    if let Some(price) = item.price {
        line.push_str(&format!(" price={}", format_price(price)));
    }
    if let Some(market_cap) = item.market_cap {
        line.push_str(&format!(" mcap={}", format_market_cap(market_cap)));
    }
    if !item.sources.is_empty() {
        line.push_str(&format!(" [{}]", item.sources.join(", ")));
    }
    if let Some(url) = &item.url {
        line.push_str(&format!(" <{}>", url));
    }
    line
}

fn format_price(price: f64) -> String {
    if price >= 1.0 {
        format!("${:.2}", price)
    } else if price >= 0.01 {
        format!("${:.4}", price)
    } else {
        format!("${:.2e}", price)
    }
}

fn format_market_cap(market_cap: f64) -> String {
    const SCALES: [(f64, &str); 4] = [(1e12, "T"), (1e9, "B"), (1e6, "M"), (1e3, "K")];
    SCALES
        .iter()
        .find(|(scale, _)| market_cap >= *scale)
        .map(|(scale, suffix)| format!("${:.1}{}", market_cap / scale, suffix))
        .unwrap_or_else(|| format!("${:.0}", market_cap))
}
