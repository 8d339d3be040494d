//! Table rendering and log file output

use crate::error::Result;
use crate::resource::{
    BucketTotal, Database, Domain, Host, ObjectEntry, ResourceBundle, SecurityEvent, SmsSign,
    SmsTemplate, Storage, User,
};
use chrono::Local;
use colored::Colorize;
use std::path::{Path, PathBuf};

/// A value that can be shown as one table row
pub trait TableRow {
    fn headers() -> &'static [&'static str];

    fn cells(&self) -> Vec<String>;
}

/// Render rows as an aligned plain-text table
pub fn render_table<T: TableRow>(rows: &[T]) -> String {
    let headers = T::headers();
    let cells: Vec<Vec<String>> = rows.iter().map(TableRow::cells).collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &cells {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let mut out = String::new();
    out.push_str(&format_row(headers.iter().map(|h| h.to_string()), &widths));
    out.push('\n');
    out.push_str(&separator(&widths));
    out.push('\n');
    for row in cells {
        out.push_str(&format_row(row.into_iter(), &widths));
        out.push('\n');
    }
    out
}

fn format_row(cells: impl Iterator<Item = String>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(cell, w)| {
            let pad = w.saturating_sub(cell.chars().count());
            format!("{}{}", cell, " ".repeat(pad))
        })
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

fn separator(widths: &[usize]) -> String {
    let total = widths.iter().sum::<usize>() + widths.len().saturating_sub(1) * 2;
    "─".repeat(total)
}

/// Print `<tag> results:` followed by the table, if there is anything to show
pub fn print_section<T: TableRow>(tag: &str, rows: &[T]) {
    if rows.is_empty() {
        return;
    }
    let table = render_table(rows);
    let mut lines = table.lines();
    println!("{}", format!("{} results:", tag).bold());
    if let Some(header) = lines.next() {
        println!("{}", header.bold());
    }
    if let Some(sep) = lines.next() {
        println!("{}", sep.dimmed());
    }
    for line in lines {
        println!("{}", line);
    }
    println!();
}

/// Print every non-empty section of a bundle
pub fn print_bundle(bundle: &ResourceBundle) {
    print_section("Hosts", &bundle.hosts);
    print_section("Storages", &bundle.storages);
    print_section("Users", &bundle.users);
    print_section("Databases", &bundle.databases);
    print_section("Domains", &bundle.domains);
    print_section("SMS signs", &bundle.sms.signs);
    print_section("SMS templates", &bundle.sms.templates);
    if bundle.sms.daily_size > 0 {
        println!("SMS sent today: {}", bundle.sms.daily_size.to_string().cyan());
    }
    if let Some(balance) = &bundle.balance {
        println!(
            "Account balance: {} {} (cash {}, credit {})",
            balance.available_amount.cyan(),
            balance.currency,
            balance.available_cash_amount,
            balance.credit_amount
        );
    }
}

/// `<log_dir>/<provider>_<kind>_<YYYYMMDDHHMMSS>.log`
pub fn log_path(log_dir: &Path, provider: &str, kind: &str) -> PathBuf {
    let timestamp = Local::now().format("%Y%m%d%H%M%S");
    log_dir.join(format!("{}_{}_{}.log", provider, kind, timestamp))
}

/// Write rows as a plain table to a timestamped log file
pub fn write_log<T: TableRow>(
    log_dir: &Path,
    provider: &str,
    kind: &str,
    rows: &[T],
) -> Result<PathBuf> {
    std::fs::create_dir_all(log_dir)?;
    let path = log_path(log_dir, provider, kind);
    std::fs::write(&path, render_table(rows))?;
    tracing::info!("Output written to {}", path.display());
    Ok(path)
}

/// Write each non-empty section of a bundle to its own log file
pub fn write_bundle(log_dir: &Path, bundle: &ResourceBundle) -> Result<Vec<PathBuf>> {
    let provider = bundle.provider.as_str();
    let mut written = Vec::new();
    if !bundle.hosts.is_empty() {
        written.push(write_log(log_dir, provider, "host", &bundle.hosts)?);
    }
    if !bundle.storages.is_empty() {
        written.push(write_log(log_dir, provider, "bucket", &bundle.storages)?);
    }
    if !bundle.users.is_empty() {
        written.push(write_log(log_dir, provider, "account", &bundle.users)?);
    }
    if !bundle.databases.is_empty() {
        written.push(write_log(log_dir, provider, "database", &bundle.databases)?);
    }
    if !bundle.domains.is_empty() {
        written.push(write_log(log_dir, provider, "domain", &bundle.domains)?);
    }
    if !bundle.sms.signs.is_empty() {
        written.push(write_log(log_dir, provider, "sms_sign", &bundle.sms.signs)?);
    }
    if !bundle.sms.templates.is_empty() {
        written.push(write_log(log_dir, provider, "sms_template", &bundle.sms.templates)?);
    }
    Ok(written)
}

fn opt(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

impl TableRow for Host {
    fn headers() -> &'static [&'static str] {
        &["INSTANCE", "NAME", "PUBLIC IP", "PRIVATE IP", "PUBLIC", "REGION"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.instance_id.clone(),
            self.name.clone(),
            opt(&self.public_ipv4),
            opt(&self.private_ipv4),
            self.is_public.to_string(),
            self.region.clone(),
        ]
    }
}

impl TableRow for Storage {
    fn headers() -> &'static [&'static str] {
        &["BUCKET", "REGION"]
    }

    fn cells(&self) -> Vec<String> {
        vec![self.bucket_name.clone(), self.region.clone()]
    }
}

impl TableRow for User {
    fn headers() -> &'static [&'static str] {
        &["USER", "USER ID", "CONSOLE LOGIN", "LAST LOGIN", "CREATED"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.user_name.clone(),
            self.user_id.clone(),
            self.enable_login.to_string(),
            self.last_login.clone(),
            self.create_time.clone(),
        ]
    }
}

impl TableRow for Database {
    fn headers() -> &'static [&'static str] {
        &["INSTANCE", "ENGINE", "VERSION", "REGION", "NET TYPE", "ADDRESS"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.instance_id.clone(),
            self.engine.clone(),
            self.engine_version.clone(),
            self.region.clone(),
            self.net_type.clone(),
            self.address.clone(),
        ]
    }
}

impl TableRow for Domain {
    fn headers() -> &'static [&'static str] {
        &["DOMAIN", "RECORDS"]
    }

    fn cells(&self) -> Vec<String> {
        vec![self.domain_name.clone(), self.record_count.to_string()]
    }
}

impl TableRow for SmsSign {
    fn headers() -> &'static [&'static str] {
        &["SIGN", "TYPE", "STATUS"]
    }

    fn cells(&self) -> Vec<String> {
        vec![self.name.clone(), self.kind.clone(), self.status.clone()]
    }
}

impl TableRow for SmsTemplate {
    fn headers() -> &'static [&'static str] {
        &["TEMPLATE", "STATUS", "CONTENT"]
    }

    fn cells(&self) -> Vec<String> {
        vec![self.name.clone(), self.status.clone(), self.content.clone()]
    }
}

impl TableRow for SecurityEvent {
    fn headers() -> &'static [&'static str] {
        &["ID", "EVENT", "ASSET", "IP", "LEVEL", "LAST SEEN"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            self.affected_asset.clone(),
            self.ip.clone(),
            self.level.clone(),
            self.last_time.clone(),
        ]
    }
}

impl TableRow for ObjectEntry {
    fn headers() -> &'static [&'static str] {
        &["BUCKET", "KEY", "SIZE"]
    }

    fn cells(&self) -> Vec<String> {
        vec![self.bucket.clone(), self.key.clone(), self.size.to_string()]
    }
}

impl TableRow for BucketTotal {
    fn headers() -> &'static [&'static str] {
        &["BUCKET", "REGION", "OBJECTS", "SIZE"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.bucket.clone(),
            self.region.clone(),
            self.object_count.to_string(),
            human_size(self.total_size),
        ]
    }
}

/// Byte count in binary units, e.g. `1.5 MiB`
pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}
