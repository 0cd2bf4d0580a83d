//! Bucket browsing commands
//!
//! - `vaultsync list`: every live file in the bucket with size and upload time
//! - `vaultsync show <path>`: the current remote content of one file

use anyhow::{Context, Result};
use clap::Args;

use vaultsync_core::domain::newtypes::ObjectPath;

use crate::context::AppContext;
use crate::output::{format_bytes, get_formatter, plural, OutputFormat};

#[derive(Debug, Args)]
pub struct ListCommand {}

impl ListCommand {
    pub async fn execute(&self, ctx: &AppContext, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);
        let engine = ctx.engine().await?;
        let objects = engine.list_remote().await?;

        if format.is_json() {
            let files: Vec<serde_json::Value> = objects
                .iter()
                .map(|o| {
                    serde_json::json!({
                        "path": o.path.as_str(),
                        "size": o.size,
                        "uploaded_at": o.uploaded_at.to_rfc3339(),
                        "fingerprint": o.fingerprint.as_ref().map(|f| f.as_str()),
                    })
                })
                .collect();
            formatter.print_json(&serde_json::json!({ "files": files }));
            return Ok(());
        }

        let total: u64 = objects.iter().map(|o| o.size).sum();
        formatter.success(&format!(
            "{} file{} in bucket ({})",
            objects.len(),
            plural(objects.len() as u64),
            format_bytes(total)
        ));
        for object in &objects {
            formatter.info(&format!(
                "{:<50} {:>10}  {}",
                object.path.as_str(),
                format_bytes(object.size),
                object.uploaded_at.format("%Y-%m-%d %H:%M")
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Args)]
pub struct ShowCommand {
    /// Vault-relative path of the remote file
    pub path: String,
}

impl ShowCommand {
    pub async fn execute(&self, ctx: &AppContext, format: OutputFormat) -> Result<()> {
        let path = ObjectPath::new(self.path.clone())
            .with_context(|| format!("Invalid path: '{}'", self.path))?;
        let engine = ctx.engine().await?;
        let content = engine.fetch_remote(&path).await?;
        let text = String::from_utf8_lossy(&content);

        if format.is_json() {
            get_formatter(format).print_json(&serde_json::json!({
                "path": path.as_str(),
                "size": content.len(),
                "content": text,
            }));
        } else {
            print!("{}", text);
            if !text.ends_with('\n') {
                println!();
            }
        }
        Ok(())
    }
}
