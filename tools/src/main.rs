//! basket-runner: batch runner for segmentation and recommendations.
//!
//! Usage:
//!   basket-runner analyze   --data purchases.csv [--type full] [--limit 5]
//!   basket-runner classify  --data purchases.csv [--customer C063] [--clusters 5]
//!   basket-runner recommend --db purchases.db --customer C063 [--num 5]
//!   basket-runner generate  --out purchases.csv [--records 5000] [--seed 42]
//!   basket-runner import    --data purchases.csv --db purchases.db
//!
//! Every command accepts --config FILE.json, --json and --out FILE.

use anyhow::{bail, Context, Result};
use basket_core::{
    config::{FactorOverflow, InsightConfig, UnpurchasedRule},
    dataset,
    recommend::RecommendationList,
    sales::{self, FullAnalysis},
    segmentation::{CustomerSegmentDetail, CustomerSegmentation, SegmentationReport},
    store::{PurchaseLedger, TransactionStore},
    types::CustomerLookup,
    RecommendationEngine,
};
use chrono::NaiveDate;
use std::env;
use std::fs::File;
use std::io::{self, BufWriter, Write};

const DEFAULT_DATA: &str = "purchase_data.csv";

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("help");

    let mut config = match arg_str(&args, "--config") {
        Some(path) => InsightConfig::load(path)?,
        None => InsightConfig::default(),
    };
    apply_overrides(&mut config, &args)?;
    config.validate()?;

    let mut out: Box<dyn Write> = match arg_str(&args, "--out").filter(|_| command != "generate") {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Cannot create {path}"))?,
        )),
        None => Box::new(io::stdout()),
    };
    let json = args.iter().any(|a| a == "--json");
    log::debug!("command={command} json={json}");

    match command {
        "analyze"   => analyze_command(&args, json, &mut out)?,
        "classify"  => classify_command(&args, &config, json, &mut out)?,
        "recommend" => recommend_command(&args, &config, json, &mut out)?,
        "generate"  => generate_command(&args, &config)?,
        "import"    => import_command(&args)?,
        "help"      => print_usage(&mut out)?,
        other => {
            log::warn!("Unknown command: {}", other);
            print_usage(&mut out)?;
        }
    }
    out.flush()?;
    Ok(())
}

fn apply_overrides(config: &mut InsightConfig, args: &[String]) -> Result<()> {
    let seg = &mut config.segmentation;
    seg.cluster_count      = parse_arg(args, "--clusters", seg.cluster_count);
    seg.high_percentile    = parse_arg(args, "--high-percentile", seg.high_percentile);
    seg.medium_percentile  = parse_arg(args, "--medium-percentile", seg.medium_percentile);
    seg.recency_multiplier = parse_arg(args, "--recency-multiplier", seg.recency_multiplier);
    seg.seed               = parse_arg(args, "--seed", seg.seed);
    if let Some(raw) = arg_str(args, "--reference-date") {
        let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .with_context(|| format!("--reference-date '{raw}' is not YYYY-MM-DD"))?;
        seg.reference_date = Some(date);
    }

    let rec = &mut config.recommendation;
    rec.factor_count  = parse_arg(args, "--factors", rec.factor_count);
    rec.default_count = parse_arg(args, "--num", rec.default_count);
    if args.iter().any(|a| a == "--clamp-factors") {
        rec.factor_overflow = FactorOverflow::Clamp;
    }
    if args.iter().any(|a| a == "--presence-mask") {
        rec.unpurchased_rule = UnpurchasedRule::NoRecord;
    }

    let ds = &mut config.dataset;
    ds.records   = parse_arg(args, "--records", ds.records);
    ds.customers = parse_arg(args, "--customers", ds.customers);
    ds.products  = parse_arg(args, "--products", ds.products);
    ds.seed      = parse_arg(args, "--seed", ds.seed);
    Ok(())
}

fn load_store(args: &[String]) -> Result<TransactionStore> {
    if let Some(db) = arg_str(args, "--db") {
        let ledger = PurchaseLedger::open(db)?;
        ledger.migrate()?;
        return Ok(ledger.load_store()?);
    }
    let data = arg_str(args, "--data").unwrap_or(DEFAULT_DATA);
    TransactionStore::from_csv_path(data).with_context(|| format!("Cannot load {data}"))
}

// ── Commands ─────────────────────────────────────────────────────────────────

fn analyze_command(args: &[String], json: bool, out: &mut dyn Write) -> Result<()> {
    let store = load_store(args)?;
    let limit = parse_arg(args, "--limit", 5usize);
    let kind = arg_str(args, "--type").unwrap_or("full");

    if !matches!(kind, "products" | "categories" | "customers" | "full") {
        bail!("Unknown analysis type '{kind}' (products|categories|customers|full)");
    }
    let result = sales::full_analysis(&store, limit, limit);

    if json {
        let value = match kind {
            "products"   => serde_json::to_value(&result.products_analysis)?,
            "categories" => serde_json::to_value(&result.category_analysis)?,
            "customers"  => serde_json::to_value(&result.customer_analysis)?,
            _            => serde_json::to_value(&result)?,
        };
        writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
    } else {
        write_analysis(out, &result, kind)?;
    }
    Ok(())
}

fn classify_command(
    args: &[String],
    config: &InsightConfig,
    json: bool,
    out: &mut dyn Write,
) -> Result<()> {
    let store = load_store(args)?;
    let segmentation = CustomerSegmentation::run(&store, &config.segmentation)?;

    if let Some(customer) = arg_str(args, "--customer") {
        match segmentation.get_customer_segment(customer) {
            CustomerLookup::Found(detail) if !json => write_customer_segment(out, &detail)?,
            lookup @ CustomerLookup::Found(_) => {
                writeln!(out, "{}", serde_json::to_string_pretty(&lookup)?)?
            }
            CustomerLookup::NotFound { customer_id } => {
                writeln!(out, "Customer {customer_id} not found")?
            }
        }
        return Ok(());
    }

    let report = segmentation.report();
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
    } else {
        write_segmentation(out, &report)?;
    }
    Ok(())
}

fn recommend_command(
    args: &[String],
    config: &InsightConfig,
    json: bool,
    out: &mut dyn Write,
) -> Result<()> {
    let Some(customer) = arg_str(args, "--customer") else {
        bail!("recommend requires --customer ID");
    };
    let store = load_store(args)?;
    let engine = RecommendationEngine::fit(&store, &config.recommendation)?;

    match engine.recommend(customer, config.recommendation.default_count) {
        CustomerLookup::NotFound { customer_id } => {
            writeln!(out, "Customer {customer_id} not found in database")?;
        }
        CustomerLookup::Found(list) if json => {
            writeln!(out, "{}", serde_json::to_string_pretty(&list)?)?;
        }
        CustomerLookup::Found(list) => write_recommendations(out, &list)?,
    }
    Ok(())
}

fn generate_command(args: &[String], config: &InsightConfig) -> Result<()> {
    let path = arg_str(args, "--out").unwrap_or(DEFAULT_DATA);
    let file = File::create(path).with_context(|| format!("Cannot create {path}"))?;
    let n = dataset::generate_csv(&config.dataset, BufWriter::new(file))?;
    println!("Synthetic dataset of {n} records saved as '{path}'");
    Ok(())
}

fn import_command(args: &[String]) -> Result<()> {
    let Some(db) = arg_str(args, "--db") else {
        bail!("import requires --db FILE");
    };
    let data = arg_str(args, "--data").unwrap_or(DEFAULT_DATA);
    let store = TransactionStore::from_csv_path(data)?;
    let mut ledger = PurchaseLedger::open(db)?;
    ledger.migrate()?;
    let written = ledger.insert_transactions(store.transactions())?;
    println!("Imported {written} records from {data} into {db} ({} total)", ledger.transaction_count()?);
    Ok(())
}

// ── Text reports ─────────────────────────────────────────────────────────────

fn banner(out: &mut dyn Write, title: &str) -> io::Result<()> {
    let rule = "=".repeat(title.len() + 6);
    writeln!(out, "\n{rule}")?;
    writeln!(out, "\n|| {title} ||")?;
    writeln!(out, "\n{rule}")
}

fn write_analysis(out: &mut dyn Write, result: &FullAnalysis, kind: &str) -> io::Result<()> {
    banner(out, "Analysis Results")?;
    if matches!(kind, "products" | "full") {
        writeln!(out, "\n\t- Top Selling Products -")?;
        for p in &result.products_analysis.top_products {
            writeln!(out, "Product {}: ${:.2} ({} sales)", p.product_id, p.total, p.count)?;
        }
    }
    if matches!(kind, "categories" | "full") {
        writeln!(out, "\n\t- Top Selling Categories -")?;
        for c in &result.category_analysis.category_sales {
            writeln!(out, "{}: ${:.2} ({} sales)", c.category, c.total, c.count)?;
        }
    }
    if matches!(kind, "customers" | "full") {
        let stats = &result.customer_analysis.summary_stats;
        writeln!(out, "\n\t- Customer Spending Analysis -")?;
        writeln!(out, "Average Spending per Customer:")?;
        writeln!(out, "Mean: ${:.2}", stats.mean_spending)?;
        writeln!(out, "Median: ${:.2}", stats.median_spending)?;
        writeln!(out, "\n\t- Top Customers by Total Spend -")?;
        for c in &result.customer_analysis.top_customers {
            writeln!(out, "Customer {}: ${:.2} ({} purchases)", c.customer_id, c.total, c.count)?;
        }
    }
    Ok(())
}

fn write_customer_segment(out: &mut dyn Write, d: &CustomerSegmentDetail) -> io::Result<()> {
    banner(out, "Classification Results")?;
    writeln!(out, "\n\t- Customer Segment Analysis for {} -", d.customer_id)?;
    writeln!(out, "Segment: {}", d.segment)?;
    writeln!(out, "Cluster: {}", d.cluster_id)?;
    writeln!(out, "Total Spending: ${:.2}", d.metrics.total_spending)?;
    writeln!(out, "Purchase Frequency: {}", d.metrics.purchase_frequency)?;
    writeln!(out, "Average Order Value: ${:.2}", d.metrics.average_order_value)?;
    writeln!(out, "Days Since Last Purchase: {}", d.metrics.days_since_last_purchase)?;
    write_thresholds(out, &d.thresholds)
}

fn write_thresholds(
    out: &mut dyn Write,
    t: &basket_core::SegmentationThresholds,
) -> io::Result<()> {
    writeln!(out, "\n\t- Segmentation Thresholds -")?;
    writeln!(out, "High Spending: ${:.2}", t.spending_high)?;
    writeln!(out, "Medium Spending: ${:.2}", t.spending_medium)?;
    writeln!(out, "High Frequency: {:.1}", t.frequency_high)?;
    writeln!(out, "Medium Frequency: {:.1}", t.frequency_medium)?;
    writeln!(out, "Recency Threshold: {:.1} days", t.recency_cutoff)
}

fn write_segmentation(out: &mut dyn Write, report: &SegmentationReport) -> io::Result<()> {
    banner(out, "Classification Results")?;
    writeln!(out, "\n\t- Customer Segmentation Analysis -")?;
    writeln!(out, "Total Customers: {}", report.summary.total_customers)?;
    writeln!(out, "Number of Segments: {}", report.summary.number_of_segments)?;
    writeln!(out, "Reference Date: {}", report.summary.reference_date)?;
    write_thresholds(out, &report.summary.thresholds)?;

    writeln!(out, "\n\t- Segment Details -")?;
    for s in &report.segments {
        writeln!(out, "{}", s.segment_name)?;
        writeln!(out, "\tCustomer Count: {}", s.customer_count)?;
        writeln!(out, "\tAverage Spending: ${:.2}", s.avg_spending)?;
        writeln!(out, "\tAverage Purchase Frequency: {:.1}", s.avg_frequency)?;
        writeln!(out, "\tAverage Order Value: ${:.2}", s.avg_order_value)?;
        writeln!(out, "\tAverage Days Since Purchase: {:.1}\n", s.avg_days_since_purchase)?;
    }
    Ok(())
}

fn write_recommendations(out: &mut dyn Write, list: &RecommendationList) -> io::Result<()> {
    banner(out, "Recommendation Results")?;
    writeln!(
        out,
        "\nTop {} Recommended Products for Customer {}:",
        list.recommendations.len(),
        list.customer_id
    )?;
    for (i, r) in list.recommendations.iter().enumerate() {
        writeln!(
            out,
            "{}. Product {} ({}) - Predicted Score: {:.2}",
            i + 1,
            r.product_id,
            r.category,
            r.predicted_score
        )?;
    }
    Ok(())
}

fn print_usage(out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "basket-runner <analyze|classify|recommend|generate|import> [options]")?;
    writeln!(out, "  --data FILE.csv | --db FILE.sqlite   purchase log source")?;
    writeln!(out, "  --config FILE.json                    pipeline configuration")?;
    writeln!(out, "  --json                                JSON output")?;
    writeln!(out, "  --out FILE                            write the report to FILE")
}

// ── Arg helpers ──────────────────────────────────────────────────────────────

fn arg_str<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
