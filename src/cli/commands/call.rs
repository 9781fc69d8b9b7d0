//! Call command - run one tool from the command line.

use crate::cli::Output;
use crate::config::Settings;
use crate::tools::ToolContext;
use anyhow::{Context, Result};
use serde_json::Value;

/// Run `tool` with JSON `args` and print its envelope to stdout.
pub async fn run_call(tool: &str, args: &str, settings: Settings) -> Result<()> {
    let arguments = parse_arguments(args)?;
    let context = ToolContext::from_settings(settings)?;

    let spinner = Output::spinner(&format!("Running {}...", tool));
    let result = context.call(tool, Some(arguments)).await;
    spinner.finish_and_clear();

    let output = result?;
    println!("{}", output.to_pretty_json()?);

    if let Some(message) = output.error_message() {
        Output::error(message);
        std::process::exit(1);
    }
    Ok(())
}

fn parse_arguments(args: &str) -> Result<Value> {
    let value: Value = serde_json::from_str(args).context("--args must be valid JSON")?;
    anyhow::ensure!(value.is_object(), "--args must be a JSON object");
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_arguments() {
        let v = parse_arguments(r#"{"page": 1}"#).unwrap();
        assert_eq!(v["page"], 1);
        assert!(parse_arguments("[1, 2]").is_err());
        assert!(parse_arguments("{oops").is_err());
    }
}
