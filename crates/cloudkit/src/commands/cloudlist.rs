use cloudkit_core::render::{print_bundle, write_bundle};
use cloudkit_core::{CancellationToken, CloudProvider, ResourceKind};
use colored::Colorize;
use std::path::Path;

/// 種別名の一覧を ResourceKind に変換（重複は除く）
fn parse_kinds(names: &[String]) -> anyhow::Result<Vec<ResourceKind>> {
    let mut kinds = Vec::new();
    for name in names {
        let kind: ResourceKind = name.trim().parse().map_err(anyhow::Error::msg)?;
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    Ok(kinds)
}

pub async fn handle(
    provider: &dyn CloudProvider,
    kinds: &[String],
    save: bool,
    log_dir: &Path,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    let requested = parse_kinds(kinds)?;
    let supported = provider.supported_kinds();
    let (kinds, skipped): (Vec<_>, Vec<_>) =
        requested.into_iter().partition(|k| supported.contains(k));
    for kind in &skipped {
        println!(
            "{}",
            format!("⚠ {} は {} に対応していません", provider.display_name(), kind).yellow()
        );
    }

    println!(
        "{}",
        format!("{} の資産を列挙します...", provider.display_name())
            .blue()
            .bold()
    );
    let bundle = provider.resources(&kinds, cancel).await;

    println!();
    if bundle.is_empty() {
        println!("{}", "資産は見つかりませんでした".dimmed());
    } else {
        print_bundle(&bundle);
    }

    if save && !bundle.is_empty() {
        for path in write_bundle(log_dir, &bundle)? {
            println!("{} {}", "✓ 保存しました:".green(), path.display());
        }
    }

    if cancel.is_cancelled() {
        println!("{}", "⚠ 中断されたため、結果は一部のみです".yellow());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_kinds_aliases_and_duplicates() {
        let kinds = parse_kinds(&names(&["host", "compute", "sms", " bucket"])).unwrap();
        assert_eq!(
            kinds,
            vec![
                ResourceKind::Compute,
                ResourceKind::Messaging,
                ResourceKind::Storage
            ]
        );
    }

    #[test]
    fn test_parse_kinds_unknown() {
        let err = parse_kinds(&names(&["compute", "queue"])).unwrap_err();
        assert!(err.to_string().contains("queue"));
    }
}
