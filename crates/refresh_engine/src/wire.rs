//! Response bodies of the refresh and parents endpoints.
//!
//! Decoding is the only place untyped JSON is looked at. Anything that does not
//! match the expected shape becomes [`ApiError::Decode`].

use refresh_core::{JobId, JobSnapshot, JobState, Page, ParentItem, Progress};
use serde::Deserialize;

use crate::ApiError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitBody {
    job_id: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum WireState {
    Queued,
    Running,
    Done,
    Error,
}

impl From<WireState> for JobState {
    fn from(state: WireState) -> Self {
        match state {
            WireState::Queued => JobState::Queued,
            WireState::Running => JobState::Running,
            WireState::Done => JobState::Done,
            WireState::Error => JobState::Error,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusBody {
    state: WireState,
    ts: f64,
    error: Option<String>,
    narratives_done: Option<u32>,
    narratives_total: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ParentBody {
    parent: String,
    matches: u32,
    score: Option<f64>,
    symbol: Option<String>,
    sources: Option<Vec<String>>,
    url: Option<String>,
    price: Option<f64>,
    market_cap: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageBody {
    items: Vec<ParentBody>,
    next_cursor: Option<String>,
}

pub fn decode_submit(body: &[u8]) -> Result<JobId, ApiError> {
    let parsed: SubmitBody = parse(body)?;
    if parsed.job_id.is_empty() {
        return Err(ApiError::Decode("empty jobId".to_string()));
    }
    Ok(JobId::new(parsed.job_id))
}

pub fn decode_status(body: &[u8]) -> Result<JobSnapshot, ApiError> {
    let parsed: StatusBody = parse(body)?;
    let progress = match (parsed.narratives_done, parsed.narratives_total) {
        (Some(done), Some(total)) => Some(Progress { done, total }),
        _ => None,
    };
    Ok(JobSnapshot {
        state: parsed.state.into(),
        progress,
        error: parsed.error,
        reported_at: Some(parsed.ts),
    })
}

pub fn decode_page(body: &[u8]) -> Result<Page<ParentItem>, ApiError> {
    let parsed: PageBody = parse(body)?;
    let items = parsed
        .items
        .into_iter()
        .map(|item| ParentItem {
            parent: item.parent,
            matches: item.matches,
            score: item.score,
            symbol: item.symbol,
            sources: item.sources.unwrap_or_default(),
            url: item.url,
            price: item.price,
            market_cap: item.market_cap,
        })
        .collect();
    Ok(Page {
        items,
        next_cursor: parsed.next_cursor,
    })
}

fn parse<'a, T: Deserialize<'a>>(body: &'a [u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|err| ApiError::Decode(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_with_progress_decodes() {
        let body = br#"{"id":"j1","state":"running","ts":1700000000.5,"error":null,
            "narrativesDone":2,"narrativesTotal":5}"#;
        let snapshot = decode_status(body).unwrap();
        assert_eq!(snapshot.state, JobState::Running);
        assert_eq!(snapshot.progress, Some(Progress { done: 2, total: 5 }));
        assert_eq!(snapshot.reported_at, Some(1700000000.5));
    }

    #[test]
    fn partial_progress_is_dropped() {
        let body = br#"{"id":"j1","state":"running","ts":1,"narrativesDone":2}"#;
        assert_eq!(decode_status(body).unwrap().progress, None);
    }

    #[test]
    fn unknown_state_is_a_decode_error() {
        let body = br#"{"id":"j1","state":"paused","ts":1}"#;
        assert!(matches!(decode_status(body), Err(ApiError::Decode(_))));
    }

    #[test]
    fn missing_job_id_is_a_decode_error() {
        assert!(matches!(decode_submit(b"{}"), Err(ApiError::Decode(_))));
        assert!(matches!(
            decode_submit(br#"{"jobId":""}"#),
            Err(ApiError::Decode(_))
        ));
    }

    #[test]
    fn page_tolerates_missing_optional_fields() {
        let body = br#"{"items":[{"parent":"Bitcoin","matches":10,"sources":null},
            {"parent":"Ethereum","matches":8,"score":0.88,"symbol":"ETH","sources":["dexscreener"]}]}"#;
        let page = decode_page(body).unwrap();
        assert_eq!(page.next_cursor, None);
        assert_eq!(page.items.len(), 2);
        assert!(page.items[0].sources.is_empty());
        assert_eq!(page.items[1].symbol.as_deref(), Some("ETH"));
        assert_eq!(page.items[1].market_cap, None);
    }

    #[test]
    fn page_keeps_market_fields() {
        let body = br#"{"items":[{"parent":"Solana","matches":6,"symbol":"SOL",
            "url":"https://www.coingecko.com/en/coins/solana","price":142.5,"marketCap":6.7e10}],
            "nextCursor":"c2"}"#;
        let page = decode_page(body).unwrap();
        let item = &page.items[0];
        assert_eq!(item.url.as_deref(), Some("https://www.coingecko.com/en/coins/solana"));
        assert_eq!(item.price, Some(142.5));
        assert_eq!(item.market_cap, Some(6.7e10));
        assert_eq!(page.next_cursor.as_deref(), Some("c2"));
    }
}
