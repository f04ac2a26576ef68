//! Business Metrics Summary
//!
//! Run: ./target/release/ecommerce_metrics --year 2023 --compare-year 2022 [section]
//! Sections: all, revenue, categories, geography, experience

use anyhow::Result;
use clap::Parser;
use ecommerce_metrics::{loader, run_analysis, AnalysisConfig, AnalysisReport};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ecommerce_metrics")]
#[command(about = "Descriptive business metrics for an e-commerce dataset")]
struct Args {
    /// Section to print
    #[arg(default_value = "all")]
    section: String,

    /// Directory holding the dataset CSV files
    #[arg(long, default_value = "ecommerce_data")]
    data_dir: PathBuf,

    /// Year to analyze
    #[arg(long)]
    year: i32,

    /// Year to compare revenue against
    #[arg(long)]
    compare_year: Option<i32>,

    /// First month of the period (requires --end-month)
    #[arg(long)]
    start_month: Option<u32>,

    /// Last month of the period (requires --start-month)
    #[arg(long)]
    end_month: Option<u32>,

    /// Only count orders with this status
    #[arg(long)]
    status: Option<String>,

    /// Number of states in the top-states table
    #[arg(long)]
    top_states: Option<usize>,

    /// Print the full report as JSON instead of text
    #[arg(long)]
    json: bool,
}

fn print_section_header(title: &str) {
    println!("\n{}", "═".repeat(70));
    println!("  {}", title);
    println!("{}\n", "═".repeat(70));
}

fn fmt_money(value: f64) -> String {
    if value.abs() >= 1_000_000.0 {
        format!("${:.2}M", value / 1_000_000.0)
    } else if value.abs() >= 1_000.0 {
        format!("${:.1}K", value / 1_000.0)
    } else {
        format!("${:.2}", value)
    }
}

fn fmt_opt(value: Option<f64>, suffix: &str) -> String {
    match value {
        Some(v) => format!("{:.2}{}", v, suffix),
        None => "insufficient data".to_string(),
    }
}

fn month_name(m: usize) -> &'static str {
    match m {
        1 => "Jan", 2 => "Feb", 3 => "Mar", 4 => "Apr",
        5 => "May", 6 => "Jun", 7 => "Jul", 8 => "Aug",
        9 => "Sep", 10 => "Oct", 11 => "Nov", 12 => "Dec",
        _ => "???",
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = AnalysisConfig::new(
        args.year,
        args.compare_year,
        args.start_month,
        args.end_month,
        args.status.clone(),
        args.top_states,
    )?;

    let registry = loader::load_datasets(&args.data_dir)?;
    let report = run_analysis(&registry, &config)?;
    info!("Analysis complete: {} fact rows in period", report.filtered_rows);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("\n{}", "█".repeat(70));
    println!("  BUSINESS METRICS SUMMARY - {}", config.analysis_year());
    println!("{}", "█".repeat(70));

    if !report.has_data() {
        println!("\n  No data for this period.");
        return Ok(());
    }

    match args.section.as_str() {
        "all" => {
            print_revenue(&report);
            print_categories(&report);
            print_geography(&report);
            print_experience(&report);
        }
        "revenue" => print_revenue(&report),
        "categories" => print_categories(&report),
        "geography" => print_geography(&report),
        "experience" => print_experience(&report),
        other => {
            println!("Unknown section: {}", other);
            println!("Available: all, revenue, categories, geography, experience");
        }
    }

    Ok(())
}

fn print_revenue(report: &AnalysisReport) {
    print_section_header("REVENUE PERFORMANCE");
    let r = &report.revenue;

    println!("  Total Revenue:        {:>14}", fmt_money(r.primary.revenue));
    println!("  Total Orders:         {:>14}", r.primary.order_count);
    println!("  Average Order Value:  {:>14}", r.primary.avg_order_value.map_or("n/a".into(), fmt_money));

    if let Some(base) = &r.comparison {
        println!();
        println!("  vs {}:", base.year);
        println!("    Revenue Growth:     {:>14}", fmt_opt(r.revenue_growth_pct, "%"));
        println!("    Orders Growth:      {:>14}", fmt_opt(r.orders_growth_pct, "%"));
        println!("    AOV Growth:         {:>14}", fmt_opt(r.aov_growth_pct, "%"));
    }

    println!("\n  {:6} {:>14} {:>12}", "Month", "Revenue", "MoM");
    println!("  {}", "─".repeat(34));
    for (i, revenue) in r.monthly_revenue.iter().enumerate() {
        let growth = r.monthly_growth_pct[i].map_or("-".to_string(), |g| format!("{:+.1}%", g));
        println!("  {:6} {:>14} {:>12}", month_name(i + 1), fmt_money(*revenue), growth);
    }
}

fn print_categories(report: &AnalysisReport) {
    print_section_header("PRODUCT CATEGORIES (Top 10)");
    let c = &report.categories;

    println!("  {:4} {:28} {:>12} {:>8} {:>8}", "#", "Category", "Revenue", "Orders", "Share");
    println!("  {}", "─".repeat(64));
    for cat in c.categories.iter().take(10) {
        println!(
            "  {:<4} {:28} {:>12} {:>8} {:>7.1}%",
            cat.rank,
            cat.category.replace('_', " "),
            fmt_money(cat.revenue),
            cat.order_count,
            cat.revenue_share * 100.0
        );
    }
    println!("\n  Concentration Index:  {}", fmt_opt(c.concentration_index, ""));
}

fn print_geography(report: &AnalysisReport) {
    print_section_header("GEOGRAPHY");
    let g = &report.geography;

    println!("  {:4} {:8} {:>12} {:>8} {:>10} {:>8}", "#", "State", "Revenue", "Orders", "Customers", "Share");
    println!("  {}", "─".repeat(56));
    for state in &g.top_states {
        println!(
            "  {:<4} {:8} {:>12} {:>8} {:>10} {:>7.1}%",
            state.rank,
            state.state,
            fmt_money(state.revenue),
            state.order_count,
            state.customer_count,
            state.revenue_share * 100.0
        );
    }
    println!("\n  Concentration Index:  {}", fmt_opt(g.concentration_index, ""));
}

fn print_experience(report: &AnalysisReport) {
    print_section_header("CUSTOMER EXPERIENCE");
    let e = &report.experience;

    println!("  Avg Delivery Time:    {:>18}", fmt_opt(e.mean_delivery_days, " days"));
    println!("  Median Delivery Time: {:>18}", fmt_opt(e.median_delivery_days, " days"));
    println!("  On-Time Rate:         {:>18}", fmt_opt(e.on_time_rate.map(|r| r * 100.0), "%"));
    println!("  Avg Review Score:     {:>18}", fmt_opt(e.mean_review_score, "/5"));
    println!("  Delivery/Review Corr: {:>18}", fmt_opt(e.delivery_review_correlation, ""));
    println!("  Orders w/o Delivery:  {:>18}", e.excluded_orders);

    println!("\n  Review Scores:");
    for (score, count) in &e.review_score_distribution {
        println!("    {} stars: {:>8}", score, count);
    }

    if !e.mean_review_by_delivery_speed.is_empty() {
        println!("\n  Review Scores by Delivery Speed:");
        for (speed, score) in &e.mean_review_by_delivery_speed {
            println!("    {:10} {:.2}/5", speed.label(), score);
        }
    }
}
