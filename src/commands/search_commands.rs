use crate::models::search::{HighlightSegment, SearchResultSet};
use crate::services::search_service;
use crate::state::{AppState, PaneEvent};

pub fn set_search_query(state: &mut AppState, query: impl Into<String>) {
    state.dispatch(PaneEvent::QueryChanged(query.into()));
}

/// Runs the current query. A blank query clears previous results.
pub fn search(state: &mut AppState) -> Vec<SearchResultSet> {
    state.dispatch(PaneEvent::SearchRequested);
    state.pane.search_results.clone()
}

pub fn highlight(state: &AppState, context: &str) -> Vec<HighlightSegment> {
    search_service::highlight_segments(context, &state.pane.search_query)
}
