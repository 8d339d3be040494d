use super::unsupported;
use cloudkit_core::{CloudProvider, Options};
use colored::Colorize;

const USAGE: &str = "使い方: cloudkit user add <user> <password> | del <user> | shadow <role> <account-id> | delrole <role>";

/// `args` の先頭 `n` 個を取り出す（足りなければ使い方を返す）
fn take<const N: usize>(args: &[String]) -> anyhow::Result<[&str; N]> {
    if args.len() < N {
        anyhow::bail!("引数が足りません\n{}", USAGE);
    }
    Ok(std::array::from_fn(|i| args[i].as_str()))
}

pub async fn handle(provider: &dyn CloudProvider, options: &Options) -> anyhow::Result<()> {
    let admin = provider
        .identity_admin()
        .ok_or_else(|| unsupported(provider, "user management"))?;
    let (action, args) = options.metadata();

    match action.as_str() {
        "add" => {
            let [user, password] = take::<2>(&args)?;
            let profile = admin.add_user(user, password).await?;
            println!("{}", "✓ ユーザーを作成しました".green().bold());
            println!("  ユーザー名: {}", profile.user_name.cyan());
            println!("  パスワード: {}", profile.password.cyan());
            println!("  ログインURL: {}", profile.login_url.cyan());
        }
        "del" => {
            let [user] = take::<1>(&args)?;
            admin.delete_user(user).await?;
            println!("{}", format!("✓ ユーザー '{}' を削除しました", user).green());
        }
        "shadow" => {
            let [role, account] = take::<2>(&args)?;
            admin.add_role(role, account).await?;
            println!(
                "{}",
                format!("✓ ロール '{}' を作成しました（信頼先: {}）", role, account).green()
            );
        }
        "delrole" => {
            let [role] = take::<1>(&args)?;
            admin.delete_role(role).await?;
            println!("{}", format!("✓ ロール '{}' を削除しました", role).green());
        }
        other => anyhow::bail!("不明なサブコマンド: '{}'\n{}", other, USAGE),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take() {
        let args = vec!["alice".to_string(), "pw".to_string(), "extra".to_string()];
        let [user, password] = take::<2>(&args).unwrap();
        assert_eq!(user, "alice");
        assert_eq!(password, "pw");
        assert!(take::<3>(&args[..1]).is_err());
    }
}
