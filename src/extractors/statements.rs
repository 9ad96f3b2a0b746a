// src/extractors/statements.rs

// --- Imports ---
use crate::extractors::value::{clean_text, parse_value, value_tokens};
use crate::utils::error::ExtractError;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

// --- Constants ---
// Headings are short; anything longer is running text that merely mentions a statement.
const MAX_HEADING_LEN: usize = 160;
const MAX_LABEL_LEN: usize = 300;

// --- CSS Selectors (Lazy Static) ---
// Elements that may carry a statement title
static HEADING_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("h1, h2, h3, h4, h5, h6, p, div, span, font, b, strong, td")
        .expect("Failed to compile HEADING_SELECTOR")
});

static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("Failed to compile LINK_SELECTOR"));

// Selectors for potential ToC containers
static TOC_CONTAINER_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("div[class*='toc'], nav[class*='toc'], div[id*='toc'], nav[id*='toc']")
        .expect("Failed to compile TOC_CONTAINER_SELECTOR")
});

static ROW_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("tr").expect("Failed to compile ROW_SELECTOR"));

static TABLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table").expect("Failed to compile TABLE_SELECTOR"));

// --- Regex Patterns for Text Matching (Lazy Static) ---
// Page references in an index row: "28", "F-3"
static PAGE_REF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:F-)?\d{1,3}$").expect("Failed to compile PAGE_REF_RE"));

// Unit notes standing in a label cell: "(In millions)", "(Dollars in thousands)"
static UNIT_NOTE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\([^()]*\)$").expect("Failed to compile UNIT_NOTE_RE"));

// Column headers: "2024", "Fiscal 2023", "September 28, 2024", "Years ended"
static PERIOD_HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:(?:fiscal\s+)?(?:19|20)\d{2}|(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+\d{1,2},?(?:\s*(?:19|20)\d{2})?|(?:(?:fiscal\s+)?years?|(?:three|six|nine|twelve)\s+months|quarters?)\s+ended\b.*)$",
    )
    .expect("Failed to compile PERIOD_HEADER_RE")
});

/// Builds an anchored title pattern: optional "Consolidated"/"Combined"/"Condensed" prefix,
/// optional trailing parentheticals such as "(In millions)" or "(continued)".
fn title_pattern(body: &str) -> Regex {
    let pattern = format!(
        r"(?i)^(?:(?:consolidated|combined|condensed)\s+)*(?:{})(?:\s*\([^)]*\))*\s*$",
        body
    );
    Regex::new(&pattern).expect("statement title pattern must compile")
}

fn key_item(name: &'static str, label: &str) -> KeyItemRule {
    let pattern = Regex::new(&format!(r"(?i)^(?:{})$", label)).expect("key line item pattern must compile");
    KeyItemRule { name, pattern }
}

static RULES: Lazy<[ExtractionRule; 3]> = Lazy::new(|| {
    [
        ExtractionRule {
            kind: StatementKind::Income,
            title_patterns: vec![
                title_pattern(
                    r"statements?\s+of\s+(?:consolidated\s+)?(?:operations|income|earnings)(?:\s+and\s+comprehensive\s+(?:income|loss))?",
                ),
                title_pattern(r"income\s+statements?"),
            ],
            key_items: vec![
                key_item("Revenue", r"(?:total\s+)?(?:net\s+)?(?:revenues?|sales)(?:\s*,\s*net)?"),
                key_item(
                    "Cost of Revenue",
                    r"(?:total\s+)?costs?\s+of\s+(?:net\s+)?(?:revenues?|sales|goods\s+sold|products\s+sold)\b.*",
                ),
                key_item("Gross Profit", r"gross\s+(?:profit|margin)(?:\s*\(loss\))?"),
                key_item("Operating Expenses", r"(?:total\s+)?operating\s+(?:costs\s+and\s+)?expenses"),
                key_item(
                    "Operating Income",
                    r"operating\s+(?:income|profit|loss)(?:\s*\((?:loss|income)\))?|(?:income|loss)(?:\s*\(loss\))?\s+from\s+operations",
                ),
                key_item(
                    "Net Income",
                    r"net\s+(?:income|earnings|loss)(?:\s*\((?:loss|income)\))?(?:\s+attributable\s+to\b.*)?",
                ),
            ],
        },
        ExtractionRule {
            kind: StatementKind::CashFlow,
            title_patterns: vec![title_pattern(r"statements?\s+of\s+(?:consolidated\s+)?cash\s+flows?")],
            key_items: vec![
                key_item("Cash from Operating Activities", r"(?:net\s+)?cash\b.*\boperating\s+activities"),
                key_item("Cash from Investing Activities", r"(?:net\s+)?cash\b.*\binvesting\s+activities"),
                key_item("Cash from Financing Activities", r"(?:net\s+)?cash\b.*\bfinancing\s+activities"),
                key_item(
                    "Net Change in Cash",
                    r"(?:net\s+)?(?:increase|decrease|change)\b.*\bcash\b.*",
                ),
            ],
        },
        ExtractionRule {
            kind: StatementKind::BalanceSheet,
            title_patterns: vec![
                title_pattern(r"balance\s+sheets?"),
                title_pattern(r"statements?\s+of\s+(?:consolidated\s+)?financial\s+(?:position|condition)"),
            ],
            key_items: vec![
                key_item("Total Assets", r"total\s+assets"),
                key_item("Total Liabilities", r"total\s+liabilities"),
                key_item(
                    "Total Equity",
                    r"total\s+(?:(?:share|stock)holders[\u{2019}']?\s+)?(?:equity|deficit)(?:\s*\((?:deficit|equity)\))?",
                ),
                key_item("Cash and Cash Equivalents", r"cash\s+and\s+cash\s+equivalents\b.*"),
                key_item("Total Current Assets", r"total\s+current\s+assets"),
                key_item("Total Current Liabilities", r"total\s+current\s+liabilities"),
            ],
        },
    ]
});

// --- Data Structures ---

/// The three statements pulled from an annual report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Income,
    CashFlow,
    BalanceSheet,
}

impl StatementKind {
    pub const ALL: [StatementKind; 3] =
        [StatementKind::Income, StatementKind::CashFlow, StatementKind::BalanceSheet];

    /// Human readable name, used in logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            StatementKind::Income => "income statement",
            StatementKind::CashFlow => "cash flow statement",
            StatementKind::BalanceSheet => "balance sheet",
        }
    }

    /// Suffix of the output file name, `{TICKER}_{file_stem}.csv`.
    pub fn file_stem(&self) -> &'static str {
        match self {
            StatementKind::Income => "income_statement",
            StatementKind::CashFlow => "cash_flow_statement",
            StatementKind::BalanceSheet => "balance_sheet",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    pub label: String,
    pub value: Option<f64>,
}

impl LineItem {
    pub fn new(label: impl Into<String>, value: Option<f64>) -> Self {
        Self { label: label.into(), value }
    }
}

/// Line items of one statement, in document order, labels unique.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementTable {
    pub kind: StatementKind,
    pub items: Vec<LineItem>,
}

impl StatementTable {
    pub fn new(kind: StatementKind) -> Self {
        Self { kind, items: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Value recorded under `label`; `Some(None)` for a line item without a figure.
    pub fn get(&self, label: &str) -> Option<Option<f64>> {
        self.items.iter().find(|item| item.label == label).map(|item| item.value)
    }

    /// Appends a line item unless the label is already present (restatements keep the first figure).
    pub fn push_first(&mut self, label: String, value: Option<f64>) -> bool {
        if self.items.iter().any(|item| item.label == label) {
            tracing::trace!("Ignoring repeated line item '{}' in {}", label, self.kind.name());
            return false;
        }
        self.items.push(LineItem { label, value });
        true
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FinancialStatements {
    pub income: StatementTable,
    pub cash_flow: StatementTable,
    pub balance_sheet: StatementTable,
}

impl FinancialStatements {
    pub fn get(&self, kind: StatementKind) -> &StatementTable {
        match kind {
            StatementKind::Income => &self.income,
            StatementKind::CashFlow => &self.cash_flow,
            StatementKind::BalanceSheet => &self.balance_sheet,
        }
    }

    pub fn tables(&self) -> [&StatementTable; 3] {
        [&self.income, &self.cash_flow, &self.balance_sheet]
    }
}

/// A headline figure and the label wording filers use for it.
#[derive(Debug)]
struct KeyItemRule {
    name: &'static str,
    pattern: Regex,
}

/// A headline figure found in an extracted statement.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyLineItem {
    /// Canonical name, e.g. "Net Income"
    pub name: &'static str,
    /// Label as printed in the filing
    pub label: String,
    pub value: Option<f64>,
}

/// Locates one statement by its title and reads its table.
#[derive(Debug)]
pub struct ExtractionRule {
    kind: StatementKind,
    title_patterns: Vec<Regex>,
    key_items: Vec<KeyItemRule>,
}

impl ExtractionRule {
    pub fn for_kind(kind: StatementKind) -> &'static ExtractionRule {
        match kind {
            StatementKind::Income => &RULES[0],
            StatementKind::CashFlow => &RULES[1],
            StatementKind::BalanceSheet => &RULES[2],
        }
    }

    pub fn matches_title(&self, text: &str) -> bool {
        self.title_patterns.iter().any(|re| re.is_match(text))
    }

    /// Extracts this rule's statement from a parsed document.
    ///
    /// Headings are tried in document order; the first one whose table yields rows wins.
    /// No heading at all is `SectionNotFound`; headings without parsable rows are `Parse`.
    pub fn extract(&self, document: &Html) -> Result<StatementTable, ExtractError> {
        let mut headings_seen = 0usize;

        for heading in self.headings(document) {
            headings_seen += 1;
            tracing::debug!(
                "Trying {} heading <{}> '{}'",
                self.kind.name(),
                heading.value().name(),
                short_text(heading).unwrap_or_default()
            );

            let enclosing = enclosing_table(heading);
            let following = following_table(heading, self.kind);

            for table in enclosing.into_iter().chain(following) {
                let rows = parse_rows(table);
                if rows.is_empty() {
                    continue;
                }
                let mut statement = StatementTable::new(self.kind);
                for (label, value) in rows {
                    statement.push_first(label, value);
                }
                tracing::info!("Extracted {} line items for the {}", statement.len(), self.kind.name());
                return Ok(statement);
            }
        }

        if headings_seen == 0 {
            Err(ExtractError::SectionNotFound(format!("no {} heading in document", self.kind.name())))
        } else {
            Err(ExtractError::Parse {
                section: self.kind.name().to_string(),
                reason: format!("{} heading(s) found but no table rows could be read", headings_seen),
            })
        }
    }

    /// Headline figures of `table`, in this rule's order. The first line item whose label
    /// matches wins; figures the filer does not report are logged and left out.
    pub fn key_line_items(&self, table: &StatementTable) -> Vec<KeyLineItem> {
        let mut found = Vec::with_capacity(self.key_items.len());
        for key in &self.key_items {
            match table.items.iter().find(|item| key.pattern.is_match(&item.label)) {
                Some(item) => found.push(KeyLineItem { name: key.name, label: item.label.clone(), value: item.value }),
                None => tracing::info!("{} not found in the {}", key.name, self.kind.name()),
            }
        }
        found
    }

    /// Non-ToC elements whose text is one of this rule's titles, in document order.
    fn headings<'a>(&'a self, document: &'a Html) -> impl Iterator<Item = ElementRef<'a>> + 'a {
        document
            .select(&HEADING_SELECTOR)
            .filter(move |el| short_text(*el).is_some_and(|text| self.matches_title(&text)))
            .filter(|el| {
                let toc = is_in_toc(*el);
                if toc {
                    tracing::debug!("Skipping heading - likely in ToC: '{}'", short_text(*el).unwrap_or_default());
                }
                !toc
            })
    }
}

/// Runs all three rules over `html`.
///
/// A statement whose heading cannot be found becomes an empty table (logged as a warning);
/// finding none of the three, or a located statement without readable rows, is an error.
pub fn extract_statements(html: &str) -> Result<FinancialStatements, ExtractError> {
    let document = Html::parse_document(html);

    let mut missing = Vec::new();
    let mut extract = |kind: StatementKind| -> Result<StatementTable, ExtractError> {
        let rule = ExtractionRule::for_kind(kind);
        match rule.extract(&document) {
            Ok(table) => {
                for key in rule.key_line_items(&table) {
                    tracing::debug!("{}: '{}' = {:?}", key.name, key.label, key.value);
                }
                Ok(table)
            }
            Err(ExtractError::SectionNotFound(reason)) => {
                tracing::warn!("Could not locate the {} ({}); writing it empty", kind.name(), reason);
                missing.push(kind);
                Ok(StatementTable::new(kind))
            }
            Err(e) => Err(e),
        }
    };

    let income = extract(StatementKind::Income)?;
    let cash_flow = extract(StatementKind::CashFlow)?;
    let balance_sheet = extract(StatementKind::BalanceSheet)?;

    if missing.len() == StatementKind::ALL.len() {
        return Err(ExtractError::SectionNotFound(
            "none of the financial statements could be located".to_string(),
        ));
    }

    Ok(FinancialStatements { income, cash_flow, balance_sheet })
}

// --- DOM helpers ---

/// Cleaned text of `element`, or `None` when it is longer than a heading can be.
fn short_text(element: ElementRef<'_>) -> Option<String> {
    let mut raw = String::new();
    for chunk in element.text() {
        raw.push_str(chunk);
        if raw.len() > MAX_HEADING_LEN * 4 {
            return None;
        }
    }
    let cleaned = clean_text(&raw);
    (!cleaned.is_empty() && cleaned.len() <= MAX_HEADING_LEN).then_some(cleaned)
}

fn is_other_statement_title(element: ElementRef<'_>, kind: StatementKind) -> bool {
    if !HEADING_SELECTOR.matches(&element) {
        return false;
    }
    match short_text(element) {
        Some(text) => RULES.iter().any(|rule| rule.kind != kind && rule.matches_title(&text)),
        None => false,
    }
}

/// Closest `<table>` ancestor of `element`.
fn nearest_table(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element.ancestors().filter_map(ElementRef::wrap).find(|el| el.value().name() == "table")
}

/// The table whose own row carries `heading` as a title.
///
/// A cell that also holds nested tables belongs to a layout wrapper, not to a statement.
fn enclosing_table(heading: ElementRef<'_>) -> Option<ElementRef<'_>> {
    let cell = std::iter::once(heading)
        .chain(heading.ancestors().filter_map(ElementRef::wrap))
        .find(|el| matches!(el.value().name(), "td" | "th" | "caption" | "table"))?;
    if cell.value().name() == "table" || cell.select(&TABLE_SELECTOR).next().is_some() {
        return None;
    }
    nearest_table(cell)
}

/// First `<table>` after `heading` in document order, unless another statement's title comes first.
fn following_table<'a>(heading: ElementRef<'a>, kind: StatementKind) -> Option<ElementRef<'a>> {
    let mut node = *heading;
    loop {
        for sibling in node.next_siblings() {
            for descendant in sibling.descendants() {
                let Some(element) = ElementRef::wrap(descendant) else { continue };
                if element.value().name() == "table" {
                    return Some(element);
                }
                if is_other_statement_title(element, kind) {
                    tracing::debug!("Reached another statement before any table after the {} heading", kind.name());
                    return None;
                }
            }
        }
        node = node.parent()?;
    }
}

/// Checks if an element is likely within a Table of Contents using DOM structure.
fn is_in_toc(element: ElementRef<'_>) -> bool {
    // Links, or headings wrapping links, point at the statement rather than being it
    if element.value().name() == "a" && element.value().attr("href").is_some() {
        return true;
    }
    if element.select(&LINK_SELECTOR).next().is_some() || TOC_CONTAINER_SELECTOR.matches(&element) {
        return true;
    }

    for ancestor in element.ancestors().filter_map(ElementRef::wrap) {
        let name = ancestor.value().name();
        if TOC_CONTAINER_SELECTOR.matches(&ancestor) {
            return true;
        }
        if name == "a" && ancestor.value().attr("href").is_some() {
            return true;
        }
        // Index rows pair the title with a page number
        if name == "tr" && row_has_page_reference(ancestor) {
            return true;
        }
        if name == "body" {
            break;
        }
    }
    false
}

fn row_cells(row: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|cell| matches!(cell.value().name(), "td" | "th"))
}

fn row_has_page_reference(row: ElementRef<'_>) -> bool {
    row_cells(row).any(|cell| PAGE_REF_RE.is_match(&clean_text(&cell.text().collect::<String>())))
}

/// Reads `(label, value)` pairs from the rows of `table` itself; rows of nested tables are
/// left to their own table.
///
/// The first cell is the label; rows with an empty label (period headers) or no value cells
/// (sub-headings such as "Operating activities:") are skipped, and so are column headers
/// labelled with a unit note or carrying only dates. The first value token is the most recent
/// period.
fn parse_rows(table: ElementRef<'_>) -> Vec<(String, Option<f64>)> {
    let mut rows = Vec::new();
    let own_rows = table
        .select(&ROW_SELECTOR)
        .filter(|row| nearest_table(*row).is_some_and(|owner| owner.id() == table.id()));
    for row in own_rows {
        let cells: Vec<String> = row_cells(row)
            .map(|cell| clean_text(&cell.text().collect::<String>()))
            .collect();
        let Some((label, rest)) = cells.split_first() else { continue };
        if label.is_empty() || label.len() > MAX_LABEL_LEN {
            continue;
        }
        let tokens = value_tokens(rest);
        let Some(first) = tokens.first() else { continue };
        if UNIT_NOTE_RE.is_match(label) || tokens.iter().all(|token| PERIOD_HEADER_RE.is_match(token)) {
            tracing::trace!("Skipping column header row '{}'", label);
            continue;
        }
        rows.push((label.clone(), parse_value(first)));
    }
    rows
}
