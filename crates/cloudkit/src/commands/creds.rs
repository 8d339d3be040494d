use crate::CredsCommands;
use cloudkit_core::render::{render_table, TableRow};
use cloudkit_core::{Credential, CredentialStore};
use colored::Colorize;

/// 一覧表示用の行
struct CredRow<'a>(&'a Credential);

impl TableRow for CredRow<'_> {
    fn headers() -> &'static [&'static str] {
        &["FINGERPRINT", "PROVIDER", "USER", "KEY", "NOTE"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.0.fingerprint.clone(),
            self.0.provider.to_string(),
            self.0.display_user.clone(),
            self.0.display_key.clone(),
            self.0.note.clone().unwrap_or_default(),
        ]
    }
}

fn ensure_known(store: &CredentialStore, fingerprint: &str) -> anyhow::Result<()> {
    if store.get(fingerprint).is_none() {
        anyhow::bail!("クレデンシャル '{}' が見つかりません", fingerprint);
    }
    Ok(())
}

pub fn handle(cmd: CredsCommands, store: &mut CredentialStore) -> anyhow::Result<()> {
    match cmd {
        CredsCommands::List => {
            if store.is_empty() {
                println!("{}", "キャッシュ済みのクレデンシャルはありません".dimmed());
                return Ok(());
            }
            let rows: Vec<CredRow> = store.iter().map(CredRow).collect();
            println!("{}", render_table(&rows));
        }
        CredsCommands::Note { fingerprint, note } => {
            ensure_known(store, &fingerprint)?;
            store.annotate(&fingerprint, note);
            println!("{}", "✓ メモを更新しました".green());
        }
        CredsCommands::Delete { fingerprint } => {
            ensure_known(store, &fingerprint)?;
            store.delete(&fingerprint);
            println!(
                "{}",
                format!("✓ クレデンシャル '{}' を削除しました", fingerprint).green()
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudkit_core::{keys, Options};

    fn store() -> (CredentialStore, String) {
        let mut store = CredentialStore::new();
        let options = Options::new()
            .with(keys::PROVIDER, "aws")
            .with(keys::ACCESS_KEY, "AKIA000")
            .with(keys::SECRET_KEY, "secret");
        store.insert_or_update("alice", &options);
        let fp = store.iter().next().unwrap().fingerprint.clone();
        (store, fp)
    }

    #[test]
    fn test_note_and_delete() {
        let (mut store, fp) = store();

        handle(
            CredsCommands::Note {
                fingerprint: fp.clone(),
                note: "prod".to_string(),
            },
            &mut store,
        )
        .unwrap();
        assert_eq!(store.get(&fp).unwrap().note.as_deref(), Some("prod"));

        handle(CredsCommands::Delete { fingerprint: fp }, &mut store).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_unknown_fingerprint() {
        let (mut store, _) = store();
        let result = handle(
            CredsCommands::Delete {
                fingerprint: "missing".to_string(),
            },
            &mut store,
        );
        assert!(result.is_err());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_row_cells() {
        let (store, fp) = store();
        let cred = store.get(&fp).unwrap();
        let cells = CredRow(cred).cells();
        assert_eq!(cells[1], "aws");
        assert_eq!(cells[2], "alice");
        assert_eq!(cells[3], "AKIA000");
        assert_eq!(cells[4], "");
    }
}
