//! Amazon Minimalist CLI
//!
//! Offline tools: classify URLs, run the filter engine over saved result
//! pages and manage engine configuration files.

use std::fs;
use std::time::Instant;

use clap::{Parser, Subcommand};
use serde::Serialize;

use am_core::dom::Element;
use am_core::html::{HtmlDocument, RecordingTarget};
use am_core::prefs::normalize_rating;
use am_core::{EngineConfig, FilterEngine, FilterSettings, Location, Predicates, ProductFacts, RunReport};

#[derive(Parser)]
#[command(name = "am-cli")]
#[command(about = "Amazon Minimalist rule table and result page tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the route of a URL
    Route {
        /// Absolute URL
        url: String,

        /// Engine configuration file
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Run the filter engine over a saved search results page
    Classify {
        /// Saved HTML page
        #[arg(short, long)]
        input: String,

        /// Hide sponsored entries
        #[arg(long)]
        hide_sponsored: bool,

        /// Minimum star rating (0-5)
        #[arg(long, default_value_t = 0.0)]
        min_rating: f32,

        /// Minimum review count
        #[arg(long, default_value_t = 0)]
        min_reviews: u64,

        /// Master switch off
        #[arg(long)]
        disabled: bool,

        /// Engine configuration file
        #[arg(short, long)]
        config: Option<String>,

        /// Print a JSON report instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Print the default engine configuration
    Config {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Validate an engine configuration file
    CheckConfig {
        /// Configuration file to validate
        #[arg(short, long)]
        input: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Route { url, config } => cmd_route(&url, config.as_deref()),
        Commands::Classify {
            input,
            hide_sponsored,
            min_rating,
            min_reviews,
            disabled,
            config,
            json,
        } => {
            let settings = FilterSettings {
                enabled: !disabled,
                hide_sponsored,
                min_rating: normalize_rating(min_rating),
                min_reviews,
            };
            cmd_classify(&input, &settings, config.as_deref(), json)
        }
        Commands::Config { output } => cmd_config(output.as_deref()),
        Commands::CheckConfig { input } => cmd_check_config(&input),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn load_config(path: Option<&str>) -> Result<EngineConfig, String> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let content = fs::read_to_string(path).map_err(|e| format!("Failed to read '{}': {}", path, e))?;
    EngineConfig::from_json(&content).map_err(|e| format!("Invalid config '{}': {}", path, e))
}

fn cmd_route(url: &str, config: Option<&str>) -> Result<(), String> {
    let config = load_config(config)?;
    let location = Location::parse(url).ok_or_else(|| format!("Not an absolute URL: '{}'", url))?;
    println!("{}", location.route(&config.marketplace).as_str());
    Ok(())
}

#[derive(Serialize)]
struct EntryReport {
    index: usize,
    asin: Option<String>,
    hidden: bool,
    hidden_by: Predicates,
    facts: ProductFacts,
}

#[derive(Serialize)]
struct ClassifyReport<'a> {
    input: &'a str,
    settings: &'a FilterSettings,
    active: Predicates,
    report: RunReport,
    entries: Vec<EntryReport>,
}

fn cmd_classify(input: &str, settings: &FilterSettings, config: Option<&str>, json: bool) -> Result<(), String> {
    let config = load_config(config)?;
    let rules = config
        .compile_rules()
        .map_err(|e| format!("Invalid rule table: {}", e))?;
    let engine = FilterEngine::new(rules);

    let markup = fs::read_to_string(input).map_err(|e| format!("Failed to read '{}': {}", input, e))?;

    let start = Instant::now();
    let doc = HtmlDocument::parse(&markup);
    let mut target = RecordingTarget::new();

    let plan = engine.plan(&&doc, settings);
    let mut report = engine.apply(&plan, &mut target);
    report.revealed += engine.sweep_stale(&&doc, &plan, &mut target);
    report.pagination = engine.enforce_pagination(&&doc, &mut target);
    let elapsed = start.elapsed();

    let entries: Vec<EntryReport> = plan
        .entries
        .iter()
        .enumerate()
        .map(|(index, (entry, verdict))| EntryReport {
            index,
            asin: entry.attr("data-asin").filter(|a| !a.is_empty()),
            hidden: verdict.should_hide(),
            hidden_by: verdict.hidden_by,
            facts: verdict.facts,
        })
        .collect();

    if json {
        let out = ClassifyReport {
            input,
            settings,
            active: plan.active,
            report,
            entries,
        };
        let text = serde_json::to_string_pretty(&out).map_err(|e| format!("Failed to encode report: {}", e))?;
        println!("{}", text);
        return Ok(());
    }

    let active = plan.active.names();
    println!("Classified '{}'", input);
    println!(
        "  Active:      {}",
        if active.is_empty() { "none".to_string() } else { active.join(", ") }
    );
    println!("  Entries:     {}", report.discovered);
    println!("  Hidden:      {}", report.hidden);
    println!("  Unchanged:   {}", report.unchanged);
    println!("  Pagination:  {} forced visible", report.pagination);
    println!("  Time:        {:.1}ms", elapsed.as_secs_f64() * 1000.0);
    println!();

    for entry in &entries {
        let rating = entry
            .facts
            .rating
            .map(|r| format!("{:.1}", r))
            .unwrap_or_else(|| "-".to_string());
        let reviews = entry
            .facts
            .reviews
            .map(|r| r.to_string())
            .unwrap_or_else(|| "-".to_string());
        let sponsored = match entry.facts.sponsored {
            Some(signal) => format!("{:?}", signal),
            None => "-".to_string(),
        };
        let verdict = if entry.hidden {
            format!("hidden ({})", entry.hidden_by.names().join(", "))
        } else {
            "shown".to_string()
        };
        println!(
            "  [{:>3}] {:<12} rating {:<4} reviews {:<9} sponsored {:<16} {}",
            entry.index,
            entry.asin.as_deref().unwrap_or("-"),
            rating,
            reviews,
            sponsored,
            verdict
        );
    }

    Ok(())
}

fn cmd_config(output: Option<&str>) -> Result<(), String> {
    let text = EngineConfig::default()
        .to_json_pretty()
        .map_err(|e| format!("Failed to encode config: {}", e))?;

    match output {
        Some(path) => {
            fs::write(path, format!("{}\n", text)).map_err(|e| format!("Failed to write '{}': {}", path, e))?;
            println!("Wrote default configuration to '{}'", path);
        }
        None => println!("{}", text),
    }
    Ok(())
}

fn cmd_check_config(input: &str) -> Result<(), String> {
    let config = load_config(Some(input))?;
    let rules = &config.rules;

    println!("Config '{}' is valid", input);
    println!("  Marketplace:     {}", config.marketplace.domain);
    println!("  Product rules:   {}", rules.product_selectors.len());
    println!("  Rating rules:    {} selectors, {} patterns", rules.rating_rules.len(), rules.rating_patterns.len());
    println!("  Review rules:    {} selectors, {} patterns", rules.review_rules.len(), rules.review_patterns.len());
    println!("  Poll interval:   {}ms", config.timings.product_poll_ms);

    Ok(())
}
