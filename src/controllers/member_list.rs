//! Paginated, filterable member listing with a selection set.

use std::collections::{BTreeMap, BTreeSet};

use tracing::warn;

use super::{Seq, Sequencer};
use crate::api::{MemberPage, MemberSummary};
use crate::error::Result;

/// Network work requested by the member list.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    LoadMembers {
        seq: Seq,
        page: u32,
        filters: BTreeMap<String, String>,
    },
}

/// Outcome of a [`Request`].
#[derive(Debug)]
pub enum Response {
    MembersLoaded { seq: Seq, result: Result<MemberPage> },
}

/// Member list state.
///
/// Rows are replaced wholesale on every load, so reloading any number of
/// times never duplicates entries.
#[derive(Debug)]
pub struct MemberListManager {
    rows: Vec<MemberSummary>,
    selected: BTreeSet<i64>,
    page: u32,
    total_pages: Option<u32>,
    filters: BTreeMap<String, String>,
    loading: bool,
    error: Option<String>,
    seq: Sequencer,
}

impl Default for MemberListManager {
    fn default() -> Self {
        Self::new()
    }
}

impl MemberListManager {
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            selected: BTreeSet::new(),
            page: 1,
            total_pages: None,
            filters: BTreeMap::new(),
            loading: false,
            error: None,
            seq: Sequencer::default(),
        }
    }

    pub fn rows(&self) -> &[MemberSummary] {
        &self.rows
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn total_pages(&self) -> Option<u32> {
        self.total_pages
    }

    pub fn filters(&self) -> &BTreeMap<String, String> {
        &self.filters
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Load the current page with the current filters.
    pub fn load_members(&mut self) -> Request {
        self.loading = true;
        Request::LoadMembers {
            seq: self.seq.next(),
            page: self.page,
            filters: self.filters.clone(),
        }
    }

    /// Set or clear (empty value) a filter, then reload from page 1.
    pub fn set_filter(&mut self, key: &str, value: &str) -> Request {
        let value = value.trim();
        if value.is_empty() {
            self.filters.remove(key);
        } else {
            self.filters.insert(key.to_string(), value.to_string());
        }
        self.page = 1;
        self.load_members()
    }

    pub fn clear_filters(&mut self) -> Request {
        self.filters.clear();
        self.page = 1;
        self.load_members()
    }

    /// Jump to a page. Out-of-range pages are refused.
    pub fn go_to_page(&mut self, page: u32) -> Option<Request> {
        if page < 1 || self.total_pages.is_some_and(|total| page > total) {
            return None;
        }
        self.page = page;
        Some(self.load_members())
    }

    pub fn next_page(&mut self) -> Option<Request> {
        self.go_to_page(self.page + 1)
    }

    pub fn prev_page(&mut self) -> Option<Request> {
        self.go_to_page(self.page.saturating_sub(1))
    }

    // Selection

    pub fn is_selected(&self, member_id: i64) -> bool {
        self.selected.contains(&member_id)
    }

    pub fn toggle_selection(&mut self, member_id: i64) {
        if !self.selected.remove(&member_id) {
            self.selected.insert(member_id);
        }
    }

    pub fn select_all_visible(&mut self) {
        self.selected.extend(self.rows.iter().map(|m| m.id));
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    pub fn selected_ids(&self) -> &BTreeSet<i64> {
        &self.selected
    }

    pub fn apply(&mut self, response: Response) {
        match response {
            Response::MembersLoaded { seq, result } => {
                if !self.seq.is_current(seq) {
                    return;
                }
                self.loading = false;
                match result {
                    Ok(page) => {
                        self.rows = page.members;
                        self.page = page.page.max(1);
                        self.total_pages = page.total_pages;
                        self.error = None;
                    }
                    Err(e) => {
                        warn!("Member list failed to load: {e}");
                        self.error = Some("Erreur lors du chargement des membres".to_string());
                    }
                }
            }
        }
    }
}
