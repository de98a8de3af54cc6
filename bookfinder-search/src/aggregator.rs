//! Fold per-source outcomes into the final response.

use crate::query::SearchQuery;
use crate::types::{AggregatedResult, SourceOutcome};

/// Build the response from outcomes gathered in completion order.
///
/// Each outcome is paired with its source's registration index. Outcomes are
/// sorted ascending by priority; equal priorities keep registration order.
/// The reported duration is the slowest source's, since dispatch is parallel.
pub fn aggregate(
    query: &SearchQuery,
    total_sources: usize,
    mut outcomes: Vec<(usize, SourceOutcome)>,
) -> AggregatedResult {
    outcomes.sort_by_key(|(index, outcome)| (outcome.priority(), *index));

    let elapsed_ms = outcomes
        .iter()
        .map(|(_, o)| u64::try_from(o.elapsed().as_millis()).unwrap_or(u64::MAX))
        .max()
        .unwrap_or(0);

    AggregatedResult {
        query: query.raw().to_string(),
        isbn: query.identifier().map(str::to_string),
        selected_title: query.title().map(str::to_string),
        total_sources,
        searched_sources: outcomes.len(),
        sources: outcomes.into_iter().map(|(_, o)| o).collect(),
        elapsed_ms,
    }
}
