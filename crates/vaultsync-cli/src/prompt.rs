//! Interactive orphan decisions on the terminal
//!
//! Lists every remote-only file with its size and upload time, then asks
//! for one answer per file. An uppercase answer applies to the file and all
//! that follow it. End of input or `q` skips whatever is left.

use std::collections::BTreeMap;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use vaultsync_core::domain::{newtypes::ObjectPath, OrphanDecision, RemoteOrphan};
use vaultsync_core::ports::IDecisionProvider;

use crate::output::format_bytes;

/// A parsed answer to the per-file question
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    /// Apply to this file only
    One(OrphanDecision),
    /// Apply to this file and the rest
    All(OrphanDecision),
    /// Skip everything left
    Quit,
}

/// Parses one line of input; an empty line means skip
pub fn parse_answer(line: &str) -> Option<Answer> {
    let line = line.trim();
    let decision = match line.to_ascii_lowercase().as_str() {
        "" | "s" | "skip" => OrphanDecision::Skip,
        "d" | "delete" => OrphanDecision::Delete,
        "w" | "download" => OrphanDecision::Download,
        "q" | "quit" => return Some(Answer::Quit),
        _ => return None,
    };
    let all = line.len() == 1 && line.chars().all(|c| c.is_ascii_uppercase());
    Some(if all {
        Answer::All(decision)
    } else {
        Answer::One(decision)
    })
}

/// Asks on stdin / stdout
pub struct PromptDecisionProvider;

#[async_trait::async_trait]
impl IDecisionProvider for PromptDecisionProvider {
    async fn resolve_orphans(
        &self,
        orphans: &[RemoteOrphan],
    ) -> Result<BTreeMap<ObjectPath, OrphanDecision>> {
        let mut out = tokio::io::stdout();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut decisions = BTreeMap::new();

        out.write_all(
            format!(
                "\n{} file(s) exist in the bucket but not in the vault:\n",
                orphans.len()
            )
            .as_bytes(),
        )
        .await?;
        for orphan in orphans {
            let object = &orphan.object;
            out.write_all(
                format!(
                    "  {}  (uploaded {}, {})\n",
                    object.path,
                    object.uploaded_at.format("%Y-%m-%d %H:%M"),
                    format_bytes(object.size)
                )
                .as_bytes(),
            )
            .await?;
        }
        out.write_all(
            b"\nFor each file: [s]kip, [d]elete from bucket, do[w]nload, [q]uit.\n\
              Uppercase applies to the remaining files.\n",
        )
        .await?;

        let mut sticky: Option<OrphanDecision> = None;
        for orphan in orphans {
            if let Some(decision) = sticky {
                decisions.insert(orphan.path().clone(), decision);
                continue;
            }

            let answer = loop {
                out.write_all(format!("{} [s/d/w/q]: ", orphan.path()).as_bytes())
                    .await?;
                out.flush().await?;
                let Some(line) = lines.next_line().await? else {
                    break Answer::Quit;
                };
                match parse_answer(&line) {
                    Some(answer) => break answer,
                    None => out.write_all(b"  Please answer s, d, w or q.\n").await?,
                }
            };

            match answer {
                Answer::One(decision) => {
                    decisions.insert(orphan.path().clone(), decision);
                }
                Answer::All(decision) => {
                    decisions.insert(orphan.path().clone(), decision);
                    sticky = Some(decision);
                }
                Answer::Quit => break,
            }
        }

        Ok(decisions)
    }
}
