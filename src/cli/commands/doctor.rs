//! Doctor command - verify configuration and connectivity.

use crate::api::{CollectionQuery, HttpVideoApi, VideoApi};
use crate::cli::Output;
use crate::config::Settings;
use console::style;
use std::path::PathBuf;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub async fn run_doctor(settings: &Settings, config_path: Option<PathBuf>) -> anyhow::Result<()> {
    Output::header("Glimt Doctor");
    println!();
    println!("Checking configuration and API access...\n");

    let mut checks = Vec::new();

    println!("{}", style("Configuration").bold());
    let config_check = check_config_file(config_path.unwrap_or_else(Settings::default_config_path));
    config_check.print();
    checks.push(config_check);

    let settings_check = match settings.validate() {
        Ok(()) => CheckResult::ok("Settings", "valid"),
        Err(e) => CheckResult::error("Settings", &e.to_string(), "Fix with: glimt config edit"),
    };
    settings_check.print();
    checks.push(settings_check);

    println!();

    println!("{}", style("API").bold());
    let key_check = check_api_key(settings);
    key_check.print();
    let have_key = key_check.status == CheckStatus::Ok;
    checks.push(key_check);

    if have_key {
        let spinner = Output::spinner(&format!("Contacting {}...", settings.api.base_url));
        let reach_check = check_reachability(settings).await;
        spinner.finish_and_clear();
        reach_check.print();
        checks.push(reach_check);
    }

    println!();

    // Summary
    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Glimt.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!(
            "All checks passed with {} warning(s).",
            warnings
        ));
    } else {
        Output::success("All checks passed! Glimt is ready to use.");
    }

    Ok(())
}

/// Check that an API key is available.
fn check_api_key(settings: &Settings) -> CheckResult {
    let name = settings.api.api_key_env.as_str();
    match settings.api.resolve_api_key() {
        Some(key) if key.len() > 12 => {
            CheckResult::ok(name, &format!("configured ({})", mask_key(&key)))
        }
        Some(_) => CheckResult::warning(
            name,
            "set but looks too short",
            "Copy the full key from the platform dashboard",
        ),
        None => CheckResult::error(
            name,
            "not set",
            &format!("Set with: export {}='...'", name),
        ),
    }
}

/// Make one cheap authenticated call.
async fn check_reachability(settings: &Settings) -> CheckResult {
    let api = match HttpVideoApi::from_settings(&settings.api) {
        Ok(api) => api,
        Err(e) => return CheckResult::error("API", &e.to_string(), "Check api.base_url"),
    };

    let query = CollectionQuery {
        limit: 1,
        offset: 0,
        collection_type: None,
    };
    match api.list_collections(&query).await {
        Ok(page) => CheckResult::ok(
            "API",
            &format!(
                "reachable, {} collection(s)",
                page.total.map_or_else(|| "some".to_string(), |t| t.to_string())
            ),
        ),
        Err(crate::GlimtError::Api { status: 401, .. }) | Err(crate::GlimtError::Api { status: 403, .. }) => {
            CheckResult::error("API", "key rejected", "Check that the API key is current")
        }
        Err(e) => CheckResult::error(
            "API",
            &e.to_string(),
            "Check network access and api.base_url",
        ),
    }
}

/// Check if config file exists.
fn check_config_file(config_path: PathBuf) -> CheckResult {
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: glimt config edit",
        )
    }
}

fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_result_ok() {
        let result = CheckResult::ok("test", "passed");
        assert_eq!(result.status, CheckStatus::Ok);
        assert!(result.hint.is_none());
    }

    #[test]
    fn test_check_result_error() {
        let result = CheckResult::error("test", "failed", "fix it");
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.hint, Some("fix it".to_string()));
    }

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key("cg-abcdefghijklmnop"), "cg-a...mnop");
        assert_eq!(mask_key("short"), "****");
    }

    #[test]
    fn test_missing_key_is_error() {
        let mut settings = Settings::default();
        settings.api.api_key_env = "GLIMT_TEST_KEY_THAT_IS_NEVER_SET".to_string();
        settings.api.api_key = None;
        assert_eq!(check_api_key(&settings).status, CheckStatus::Error);

        settings.api.api_key = Some("cg-0123456789abcdef".to_string());
        assert_eq!(check_api_key(&settings).status, CheckStatus::Ok);
    }

    #[test]
    fn test_missing_config_file_is_warning() {
        let dir = tempfile::tempdir().unwrap();
        let check = check_config_file(dir.path().join("missing.toml"));
        assert_eq!(check.status, CheckStatus::Warning);
    }
}
