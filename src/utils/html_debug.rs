// src/utils/html_debug.rs
use crate::extractors::statements::StatementKind;
use crate::utils::error::AppError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::Path;

// Loose versions of the statement titles, matched against raw markup rather than element text
static DEBUG_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"(?i)statements?\s+of\s+(?:consolidated\s+)?(?:operations|income|earnings)", "income"),
        (r"(?i)income\s+statements?", "income"),
        (r"(?i)statements?\s+of\s+(?:consolidated\s+)?cash\s+flows?", "cash_flow"),
        (r"(?i)balance\s+sheets?", "balance_sheet"),
        (r"(?i)statements?\s+of\s+(?:consolidated\s+)?financial\s+(?:position|condition)", "balance_sheet"),
        (r"(?i)table\s+of\s+contents", "toc"),
    ]
    .iter()
    .filter_map(|(pat, class)| Regex::new(pat).ok().map(|re| (re, *class)))
    .collect()
});

fn css_class(kind: &str) -> &'static str {
    match kind {
        "income" => "highlight-income",
        "cash_flow" => "highlight-cash-flow",
        "balance_sheet" => "highlight-balance-sheet",
        _ => "highlight-other",
    }
}

/// Wraps each `(start, end, kind)` byte range of `html` in a highlighted span.
/// Ranges overlapping an earlier one, or not on char boundaries, are dropped.
pub fn annotate(html: &str, highlights: &[(usize, usize, &str)]) -> String {
    // Add debug styling in head
    let mut debug_html = String::from("<!DOCTYPE html>\n<html>\n<head>\n<style>\n");
    debug_html.push_str(".highlight-income { background-color: #90EE90; }\n");
    debug_html.push_str(".highlight-cash-flow { background-color: #ADD8E6; }\n");
    debug_html.push_str(".highlight-balance-sheet { background-color: #FFFF00; }\n");
    debug_html.push_str(".highlight-other { background-color: #FFC0CB; }\n");
    debug_html.push_str("</style>\n</head>\n<body>\n");

    let mut sorted_highlights = highlights.to_vec();
    sorted_highlights.sort_by_key(|h| (h.0, h.1));

    let mut last_pos = 0;
    for (start, end, kind) in sorted_highlights {
        if start < last_pos || end > html.len() || start >= end {
            continue;
        }
        if !html.is_char_boundary(start) || !html.is_char_boundary(end) {
            continue;
        }
        debug_html.push_str(&html[last_pos..start]);
        debug_html.push_str(&format!(
            "<span class=\"{}\" title=\"Position: {}-{}, Type: {}\">",
            css_class(kind),
            start,
            end,
            kind
        ));
        debug_html.push_str(&html[start..end]);
        debug_html.push_str("</span>");
        last_pos = end;
    }
    debug_html.push_str(&html[last_pos..]);

    debug_html.push_str("\n</body>\n</html>");
    debug_html
}

/// Positions of every statement-title-like match in `html`.
pub fn statement_title_matches(html: &str) -> Vec<(usize, usize, &'static str)> {
    DEBUG_PATTERNS
        .iter()
        .flat_map(|(re, kind)| re.find_iter(html).map(move |m| (m.start(), m.end(), *kind)))
        .collect()
}

/// Saves the raw filing and an annotated copy with statement titles highlighted under `dir`.
pub fn save_debug_files(html: &str, dir: &Path, ticker: &str) -> Result<(), AppError> {
    fs::create_dir_all(dir)?;

    let raw_path = dir.join(format!("{}_raw_filing.html", ticker));
    fs::write(&raw_path, html)?;
    tracing::info!("Saved raw filing to: {}", raw_path.display());

    let matches = statement_title_matches(html);
    for kind in StatementKind::ALL {
        let tag = match kind {
            StatementKind::Income => "income",
            StatementKind::CashFlow => "cash_flow",
            StatementKind::BalanceSheet => "balance_sheet",
        };
        let count = matches.iter().filter(|m| m.2 == tag).count();
        tracing::debug!("{} title-like matches for the {}", count, kind.name());
    }

    let annotated_path = dir.join(format!("{}_filing_annotated.html", ticker));
    fs::write(&annotated_path, annotate(html, &matches))?;
    tracing::info!("Created annotated debug HTML: {}", annotated_path.display());
    Ok(())
}
