//! Tools command - list the tools the MCP server offers.

use crate::cli::Output;
use crate::mcp::get_tools;
use anyhow::Result;

pub fn run_tools() -> Result<()> {
    let tools = get_tools();
    Output::header(&format!("Tools ({})", tools.len()));
    for tool in &tools {
        Output::tool(&tool.name, &tool.description);
    }
    println!();
    Output::info("Run one with: glimt call <tool> --args '{...}'");
    Ok(())
}
