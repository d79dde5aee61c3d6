//! Render model for the search dropdown.
//!
//! This is what a frontend draws: which of the dropdown states is showing and,
//! for results, the sections in order. No styling lives here.

use crate::model::state::WidgetState;
use core_types::routes::search_route;
use core_types::{DisplayHit, EntityKind, HitImage};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub kind: EntityKind,
    pub title: &'static str,
    pub hits: Vec<DisplayHit>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DropdownView {
    Hidden,
    /// Open with nothing typed yet.
    Empty,
    Searching,
    NoResults {
        query: String,
    },
    Results {
        sections: Vec<Section>,
        view_all: String,
    },
}

pub fn render(state: &WidgetState) -> DropdownView {
    if !state.is_open {
        return DropdownView::Hidden;
    }
    if state.is_loading {
        return DropdownView::Searching;
    }
    if state.last_results.is_empty() {
        if state.query_text.is_empty() {
            return DropdownView::Empty;
        }
        return DropdownView::NoResults {
            query: state.query_text.clone(),
        };
    }

    let sections = state
        .last_results
        .sections()
        .map(|(kind, hits)| Section {
            kind,
            title: kind.section_title(),
            hits: hits.to_vec(),
        })
        .collect();
    DropdownView::Results {
        sections,
        view_all: search_route(&state.query_text),
    }
}

impl fmt::Display for DropdownView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropdownView::Hidden | DropdownView::Empty => Ok(()),
            DropdownView::Searching => writeln!(f, "Searching..."),
            DropdownView::NoResults { query } => writeln!(f, "No results found for \"{query}\""),
            DropdownView::Results { sections, view_all } => {
                for section in sections {
                    writeln!(f, "{}", section.title)?;
                    for hit in &section.hits {
                        let marker = match &hit.image {
                            HitImage::Url(_) => "[img]".to_string(),
                            HitImage::Placeholder(icon) => format!("[{icon:?}]"),
                        };
                        write!(f, "  {marker} {}", hit.title)?;
                        if let Some(sub) = &hit.subtitle {
                            write!(f, " - {sub}")?;
                        }
                        writeln!(f, "  ({})", hit.route())?;
                    }
                }
                writeln!(f, "View all results: {view_all}")
            }
        }
    }
}
