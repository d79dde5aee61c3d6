//! Terminal output for dropdown views.

use console::style;
use core_types::HitImage;
use ui::DropdownView;

/// Styled, multi-line rendering of `view`. Colors follow `console`'s
/// terminal detection, so piped output is plain text.
pub fn styled_view(view: &DropdownView) -> String {
    let mut out = String::new();
    match view {
        DropdownView::Hidden => {}
        DropdownView::Empty => out.push_str(&format!("{}\n", style("(type to search)").dim())),
        DropdownView::Searching => out.push_str(&format!("{}\n", style("Searching...").yellow())),
        DropdownView::NoResults { query } => {
            out.push_str(&format!("No results found for \"{}\"\n", style(query).bold()));
        }
        DropdownView::Results { sections, view_all } => {
            for section in sections {
                out.push_str(&format!("{}\n", style(section.title).cyan().bold()));
                for hit in &section.hits {
                    let marker = match &hit.image {
                        HitImage::Url(_) => "*".to_string(),
                        HitImage::Placeholder(icon) => format!("[{icon:?}]"),
                    };
                    out.push_str(&format!("  {} {}", style(marker).dim(), hit.title));
                    if let Some(sub) = &hit.subtitle {
                        out.push_str(&format!(" {}", style(format!("- {sub}")).dim()));
                    }
                    out.push_str(&format!("  {}\n", style(hit.route()).green()));
                }
            }
            out.push_str(&format!("View all results: {}\n", style(view_all).underlined()));
        }
    }
    out
}
