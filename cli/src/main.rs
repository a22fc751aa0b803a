use clap::{CommandFactory, Parser};
use colored::*;
use log::debug;
use std::io::Write;
use std::process;
use std::sync::Arc;

use sitewarden_core::{
    read_lines, AuditConfig, AuditEngine, ConsoleSink, Dimension, HttpClient, Report,
    ReportAssembler,
};

#[derive(Parser, Debug)]
#[command(
    name = "SITEWARDEN",
    version,
    about = "Website audit: security, SEO, performance, and compliance scoring",
    override_usage = "sitewarden <target> <options>",
    after_help = "\x1b[1;36mEXAMPLES:\x1b[0m
  Quick audit:                sitewarden https://target.com
  Verbose mode:               sitewarden https://target.com -v
  With proxy (Burp):          sitewarden https://target.com --proxy http://127.0.0.1:8080
  Custom headers:             sitewarden https://target.com -H \"Authorization: Bearer TOKEN\"
  Audit from file:            sitewarden -l targets.txt
  JSON to stdout:             sitewarden https://target.com --json
  Dry-run test:               sitewarden https://target.com --dry-run"
)]
pub struct Args {
    #[arg(required_unless_present = "list")]
    pub target: Option<String>,

    #[arg(long, default_value_t = 10, help = "Request timeout in seconds")]
    pub timeout: u64,

    #[arg(short = 'v', long, default_value_t = false, help = "Show the whole process (Verbose Mode)")]
    pub verbose: bool,

    #[arg(short = 'o', long, default_value = "audit_report.json", help = "Output file path for the report")]
    pub output: String,

    #[arg(long, help = "Proxy URL (e.g. http://127.0.0.1:8080)")]
    pub proxy: Option<String>,

    #[arg(short = 'H', long = "header", help = "Custom header (e.g. \"Authorization: Bearer TOKEN\")")]
    pub headers: Vec<String>,

    #[arg(short = 'l', long = "list", help = "File containing target URLs (one per line)")]
    pub list: Option<String>,

    #[arg(long, default_value_t = 30, help = "Days before a stored report expires")]
    pub retention_days: i64,

    #[arg(long, default_value_t = false, help = "Print the full report JSON to stdout")]
    pub json: bool,

    #[arg(long, help = "Simulate the audit without sending real requests")]
    pub dry_run: bool,
}

#[tokio::main]
async fn main() {
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    print_banner();

    let mut targets: Vec<String> = Vec::new();

    if let Some(ref list_path) = args.list {
        match read_lines(list_path) {
            Ok(lines) => {
                print!(
                    "{}\r\n",
                    format!("[+] Loaded {} target(s) from {}", lines.len(), list_path)
                        .green().bold()
                );
                std::io::stdout().flush().ok();
                targets.extend(lines);
            }
            Err(e) => {
                eprint!("{}\r\n", format!("[!] Failed to read '{}': {}", list_path, e).red());
                process::exit(1);
            }
        }
    }

    if let Some(ref t) = args.target {
        targets.push(t.clone());
    }

    if targets.is_empty() {
        eprint!("{}\r\n", "[!] No targets specified. Provide a URL or use -l <file>.".red());
        let mut cmd = Args::command();
        cmd.print_help().unwrap();
        process::exit(1);
    }

    let total = targets.len();
    for (i, target) in targets.iter().enumerate() {
        if total > 1 {
            print!(
                "\r\n{}\r\n",
                format!("━━━ Target {}/{}: {} ━━━", i + 1, total, target)
                    .bright_white().bold()
            );
            std::io::stdout().flush().ok();
        }
        run_audit(target, &args).await;
    }
}

/// Prints the SITEWARDEN ASCII banner.
fn print_banner() {
    let banner = r#"
   _____ _ _____ _____ _ _ _ _____ _____ ____  _____ _____
  |   __|_|_   _|   __| | | |  _  | __  |    \|   __|   | |
  |__   | | | | |   __| | | |     |    -|  |  |   __| | | |
  |_____|_| |_| |_____|_____|__|__|__|__|____/|_____|_|___|
    "#;
    print!("{}\r\n", banner.bright_cyan().bold());
    print!("{}\r\n", "──────────────────────────────────────────────────".dimmed());
    std::io::stdout().flush().ok();
}

/// Maps parsed CLI arguments onto the shared audit configuration.
fn audit_config(target: &str, args: &Args) -> AuditConfig {
    AuditConfig {
        target: target.to_string(),
        list_file: args.list.clone().unwrap_or_default(),
        timeout: args.timeout,
        output: args.output.clone(),
        proxy: args.proxy.clone().unwrap_or_default(),
        headers: args.headers.join("; "),
        verbose: args.verbose,
        dry_run: args.dry_run,
        retention_days: args.retention_days,
    }
}

/// Runs the full audit pipeline for one target and renders the result.
async fn run_audit(target: &str, args: &Args) {
    let config = audit_config(target, args);

    if config.dry_run {
        println!("[DRY RUN] Would audit target: {}", config.target);
        return;
    }

    print_audit_config(&config);

    let client = Arc::new(HttpClient::new(
        config.timeout,
        config.proxy_ref(),
        &config.parsed_headers(),
    ));
    let engine = AuditEngine::with_default_scanners(
        client,
        ReportAssembler::default(),
        config.retention_days,
    );
    debug!("engine ready with {} scanners", engine.scanner_count());
    let sink = ConsoleSink::new_ref();

    let report = match engine.audit(target, &sink).await {
        Ok(report) => report,
        Err(e) => {
            eprint!("{}\r\n", format!("[!] Audit failed: {}", e).red());
            return;
        }
    };

    print_score_summary(&report);

    if args.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => eprint!("{}\r\n", format!("[!] Failed to render JSON: {}", e).red()),
        }
    }

    match serde_json::to_string_pretty(&report) {
        Ok(json) => {
            if let Err(e) = std::fs::write(&config.output, json) {
                eprint!("{}\r\n", format!("[!] Failed to write '{}': {}", config.output, e).red());
            } else {
                print!("{}\r\n", format!("[+] Report written to {}", config.output).green());
                std::io::stdout().flush().ok();
            }
        }
        Err(e) => eprint!("{}\r\n", format!("[!] Failed to serialize report: {}", e).red()),
    }
}

/// Prints the audit configuration summary for a target.
fn print_audit_config(config: &AuditConfig) {
    print!("{}\r\n", format!("[+] Target:     {}", config.target).green().bold());
    print!("{}\r\n", format!("[+] Timeout:    {}s", config.timeout).blue());
    print!("{}\r\n", format!("[+] Output:     {}", config.output).blue());
    if let Some(proxy) = config.proxy_ref() {
        print!("{}\r\n", format!("[+] Proxy:      {}", proxy).yellow());
    }
    let custom_headers = config.header_list();
    if !custom_headers.is_empty() {
        print!("{}\r\n", format!("[+] Headers:    {} custom", custom_headers.len()).yellow());
    }
    let verbose_label = if config.verbose { "ON" } else { "OFF" };
    print!("{}\r\n", format!("[+] Verbose:    {}", verbose_label).magenta());
    print!("{}\r\n", "──────────────────────────────────────────────────".dimmed());
    std::io::stdout().flush().ok();
}

fn score_color(score: u8) -> ColoredString {
    let text = format!("{:>3}", score);
    match score {
        90..=100 => text.green().bold(),
        70..=89 => text.yellow().bold(),
        _ => text.red().bold(),
    }
}

/// Prints the per-dimension and overall score table.
fn print_score_summary(report: &Report) {
    let out = |text: &str| {
        print!("{}\r\n", text);
        std::io::stdout().flush().ok();
    };

    out(&format!("\r\n{}", "━━━ Audit Summary ━━━".bright_white().bold()));
    for dimension in Dimension::ALL {
        let d = report.dimension(dimension);
        out(&format!(
            "  {:<12} {}  ({} issue(s): {} critical, {} medium, {} low)",
            dimension.to_string(),
            score_color(d.score),
            d.total,
            d.critical,
            d.medium,
            d.low
        ));
    }
    out(&format!(
        "  {:<12} {}  ({} issue(s) total)",
        "overall",
        score_color(report.summary.overall_score),
        report.summary.total
    ));
    out(&format!("  Report id: {}", report.public_id.dimmed()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_map_into_audit_config() {
        let args = Args::parse_from([
            "sitewarden",
            "https://example.com",
            "-H",
            "X-One: 1",
            "-H",
            "X-Two: 2",
            "--proxy",
            "http://127.0.0.1:8080",
            "--timeout",
            "20",
            "--retention-days",
            "7",
        ]);
        let config = audit_config("https://example.com", &args);

        assert_eq!(config.target, "https://example.com");
        assert_eq!(config.timeout, 20);
        assert_eq!(config.retention_days, 7);
        assert_eq!(config.proxy_ref(), Some("http://127.0.0.1:8080"));

        let headers = config.parsed_headers();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers[0], ("X-One".to_string(), "1".to_string()));
        assert_eq!(headers[1], ("X-Two".to_string(), "2".to_string()));
    }

    #[test]
    fn test_defaults_map_to_empty_optionals() {
        let args = Args::parse_from(["sitewarden", "https://example.com"]);
        let config = audit_config("https://example.com", &args);

        assert_eq!(config.proxy_ref(), None);
        assert!(config.parsed_headers().is_empty());
        assert!(!config.dry_run);
        assert_eq!(config.output, "audit_report.json");
    }
}
