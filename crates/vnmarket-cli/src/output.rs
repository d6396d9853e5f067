//! Terminal tables

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, Color, ContentArrangement, Table};

use vnmarket::api::{
    FScoreReport, FinancialMetrics, Post, PostPage, StockProfile, TradingRecommendation,
};
use vnmarket::chart::{HeadlessHandle, PaneKind};
use vnmarket::format::{
    format_compact, format_percent, format_price, format_signed_percent, format_thousands,
    percent_change,
};
use vnmarket::fscore::{FScoreBreakdown, FScoreCategory, FScoreRating};
use vnmarket::{Direction, PriceRecord, TimeRangeSelection};

pub const PREMIUM_HINT: &str = "Upgrade to Premium for F-Score analysis and trading signals. \
    Run `vnmarket premium --snooze` to hide this for a while.";

fn table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn right(text: impl std::fmt::Display) -> Cell {
    Cell::new(text).set_alignment(CellAlignment::Right)
}

fn opt(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

fn opt_num(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format_price(v, 2))
}

fn key_values(rows: Vec<(&str, String)>) -> String {
    let mut t = table();
    t.set_header(vec!["Field", "Value"]);
    for (key, value) in rows {
        t.add_row(vec![Cell::new(key), Cell::new(value)]);
    }
    t.to_string()
}

pub fn chart_panes(selection: &TimeRangeSelection, handles: &[HeadlessHandle]) -> String {
    let mut t = table();
    t.set_header(vec!["Pane", "Points", "Visible from", "Visible to"]);
    for pane in PaneKind::ALL {
        let Some(handle) = handles.iter().rev().find(|h| h.pane() == pane && !h.is_released())
        else {
            continue;
        };
        let window = handle.visible_time_range();
        t.add_row(vec![
            Cell::new(pane),
            right(handle.point_count()),
            Cell::new(window.map_or_else(|| "-".to_string(), |w| w.from.to_string())),
            Cell::new(window.map_or_else(|| "-".to_string(), |w| w.to.to_string())),
        ]);
    }
    format!(
        "{} {} .. {}\n{t}",
        selection.symbol, selection.start_date, selection.end_date
    )
}

pub fn latest_bars(records: &[PriceRecord], count: usize) -> String {
    let mut t = table();
    t.set_header(vec!["Date", "Open", "High", "Low", "Close", "Change", "Volume"]);

    let start = records.len().saturating_sub(count);
    for (i, record) in records.iter().enumerate().skip(start) {
        let change = i
            .checked_sub(1)
            .and_then(|prev| percent_change(records[prev].close, record.close));
        let color = match record.direction() {
            Direction::Up => Color::Green,
            Direction::Down => Color::Red,
        };
        t.add_row(vec![
            Cell::new(record.date),
            right(format_price(record.open, 2)),
            right(format_price(record.high, 2)),
            right(format_price(record.low, 2)),
            right(format_price(record.close, 2)).fg(color),
            right(format_signed_percent(change, 2)),
            right(record.volume.map_or_else(|| "-".to_string(), format_thousands)),
        ]);
    }
    t.to_string()
}

pub fn profile(profile: &StockProfile) -> String {
    key_values(vec![
        ("Symbol", profile.symbol.clone()),
        ("Company", opt(profile.company_name.as_deref()).to_string()),
        ("Exchange", opt(profile.exchange.as_deref()).to_string()),
        ("Industry", opt(profile.industry.as_deref()).to_string()),
        ("Sector", opt(profile.sector.as_deref()).to_string()),
        ("Price", opt_num(profile.current_price)),
        ("Change", format_signed_percent(profile.price_change_percent, 2)),
        ("Market cap", profile.market_cap.map_or_else(|| "-".to_string(), format_compact)),
        ("Listed", opt(profile.listing_date.as_deref()).to_string()),
        ("Website", opt(profile.website.as_deref()).to_string()),
    ])
}

pub fn metrics(metrics: &FinancialMetrics) -> String {
    key_values(vec![
        ("Symbol", metrics.symbol.clone()),
        ("Period", opt(metrics.period.as_deref()).to_string()),
        ("P/E", opt_num(metrics.pe)),
        ("P/B", opt_num(metrics.pb)),
        ("P/S", opt_num(metrics.ps)),
        ("EPS", opt_num(metrics.eps)),
        ("ROE", format_percent(metrics.roe, 2)),
        ("ROA", format_percent(metrics.roa, 2)),
        ("Gross margin", format_percent(metrics.gross_margin, 2)),
        ("Net margin", format_percent(metrics.net_margin, 2)),
        ("Debt / equity", opt_num(metrics.debt_to_equity)),
        ("Current ratio", opt_num(metrics.current_ratio)),
        ("Revenue growth", format_signed_percent(metrics.revenue_growth, 2)),
        ("Profit growth", format_signed_percent(metrics.profit_growth, 2)),
        ("Dividend yield", format_percent(metrics.dividend_yield, 2)),
    ])
}

fn category_name(category: FScoreCategory) -> &'static str {
    match category {
        FScoreCategory::Profitability => "Profitability",
        FScoreCategory::LeverageLiquidity => "Leverage & liquidity",
        FScoreCategory::OperatingEfficiency => "Operating efficiency",
    }
}

pub fn fscore(report: &FScoreReport, breakdown: &FScoreBreakdown) -> String {
    let mut t = table();
    t.set_header(vec!["Category", "Score"]);
    for category in &breakdown.categories {
        t.add_row(vec![
            Cell::new(category_name(category.category)),
            right(format!("{}/{}", category.score, category.max)),
        ]);
    }
    let rating_color = match breakdown.rating {
        FScoreRating::Strong => Color::Green,
        FScoreRating::Neutral => Color::Yellow,
        FScoreRating::Weak => Color::Red,
    };
    t.add_row(vec![
        Cell::new("Total"),
        right(format!("{}/9 {:?}", breakdown.total, breakdown.rating)).fg(rating_color),
    ]);

    let mut out = format!("{} F-Score\n{t}", report.symbol);
    if !breakdown.unknown.is_empty() {
        out.push_str(&format!("\nNot reported: {}", breakdown.unknown.join(", ")));
    }
    if let Some(reported) = report.fscore.filter(|&s| s != breakdown.total) {
        out.push_str(&format!("\nService reports {reported}/9"));
    }
    if let Some(analysis) = report.analysis.as_deref() {
        out.push_str(&format!("\n\n{analysis}"));
    }
    out
}

pub fn recommendation(rec: &TradingRecommendation) -> String {
    key_values(vec![
        ("Symbol", rec.symbol.clone()),
        ("Signal", opt(rec.recommendation.as_deref()).to_string()),
        ("Entry", opt_num(rec.entry_price)),
        ("Target", opt_num(rec.target_price)),
        ("Stop loss", opt_num(rec.stop_loss)),
        ("Confidence", format_percent(rec.confidence, 0)),
        ("Reason", opt(rec.reason.as_deref()).to_string()),
        ("Updated", opt(rec.updated_at.as_deref()).to_string()),
    ])
}

pub fn post_list(page: &PostPage) -> String {
    let mut t = table();
    t.set_header(vec!["ID", "Date", "Title", "Excerpt"]);
    for post in &page.posts {
        t.add_row(vec![
            right(post.id),
            Cell::new(opt(post.date.as_deref())),
            Cell::new(post.plain_title()),
            Cell::new(post.plain_excerpt()),
        ]);
    }
    let p = page.pagination;
    format!(
        "{t}\nPage {}/{} ({} posts){}",
        p.page,
        p.total_pages,
        p.total,
        if p.has_next() { ", more with --page" } else { "" }
    )
}

pub fn post(post: &Post) -> String {
    let mut out = post.plain_title();
    if let Some(date) = post.date.as_deref() {
        out.push_str(&format!("\n{date}"));
    }
    if let Some(author) = post.author.as_deref() {
        out.push_str(&format!(" by {author}"));
    }
    out.push_str("\n\n");
    out.push_str(&vnmarket::api::news::strip_html(&post.content));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use vnmarket::fscore::FScoreFlags;

    fn record(day: u32, close: f64) -> PriceRecord {
        PriceRecord {
            date: NaiveDate::from_ymd_opt(2024, 4, day).unwrap(),
            open: 100.0,
            high: 110.0,
            low: 90.0,
            close,
            volume: Some(1_234_567),
            trend_q: None,
            fq: None,
        }
    }

    #[test]
    fn test_latest_bars_limits_rows() {
        let records = [record(1, 100.0), record(2, 105.0), record(3, 99.75)];
        let out = latest_bars(&records, 2);
        assert!(!out.contains("2024-04-01"));
        assert!(out.contains("2024-04-02"));
        assert!(out.contains("+5.00%"));
        assert!(out.contains("1,234,567"));
    }

    #[test]
    fn test_fscore_table_flags_unknowns() {
        let flags = FScoreFlags {
            roa_positive: Some(true),
            cfo_positive: Some(true),
            ..FScoreFlags::default()
        };
        let report = FScoreReport {
            symbol: "FPT".to_string(),
            fscore: Some(6),
            ..FScoreReport::default()
        };
        let out = fscore(&report, &FScoreBreakdown::from_flags(&flags));
        assert!(out.contains("2/9"));
        assert!(out.contains("Not reported"));
        assert!(out.contains("Service reports 6/9"));
    }
}
