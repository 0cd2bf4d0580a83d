//! Remote catalog
//!
//! Builds a complete [`RemoteSnapshot`] of the bucket by following listing
//! pages until the provider stops returning a page token.
//!
//! ## Design Notes
//!
//! - No retry here: a listing failure aborts the run as
//!   [`SyncError::RemoteUnavailable`] carrying the provider message.
//! - A page token seen twice aborts the listing instead of looping forever.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use vaultsync_core::domain::{RemoteSnapshot, SyncError};
use vaultsync_core::ports::{Authorization, IRemoteStore};

use crate::filter::PathFilter;

/// Lists the bucket into snapshots
pub struct RemoteCatalog {
    remote: Arc<dyn IRemoteStore>,
}

impl RemoteCatalog {
    pub fn new(remote: Arc<dyn IRemoteStore>) -> Self {
        Self { remote }
    }

    /// Takes a complete snapshot of the bucket
    #[tracing::instrument(skip_all)]
    pub async fn list(&self, auth: &Authorization) -> Result<RemoteSnapshot> {
        let mut objects = Vec::new();
        let mut seen_tokens = HashSet::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0u32;

        loop {
            let page = self
                .remote
                .list_objects(auth, page_token.as_deref())
                .await
                .map_err(|e| match SyncError::find_in(&e) {
                    Some(sync_err) => anyhow::Error::new(sync_err.clone()),
                    None => SyncError::RemoteUnavailable(format!("{e:#}")).into(),
                })?;
            pages += 1;
            debug!(page = pages, objects = page.objects.len(), "Listing page received");
            objects.extend(page.objects);

            match page.next_page_token {
                None => break,
                Some(next) => {
                    if !seen_tokens.insert(next.clone()) {
                        return Err(SyncError::RemoteUnavailable(format!(
                            "listing returned page token '{next}' twice"
                        ))
                        .into());
                    }
                    page_token = Some(next);
                }
            }
        }

        let snapshot = RemoteSnapshot::new(objects);
        info!(
            pages,
            objects = snapshot.len(),
            bytes = snapshot.total_size(),
            "Remote snapshot taken"
        );
        Ok(snapshot)
    }

    /// Takes a snapshot restricted to paths accepted by `filter`
    pub async fn list_filtered(
        &self,
        auth: &Authorization,
        filter: &PathFilter,
    ) -> Result<RemoteSnapshot> {
        let mut snapshot = self.list(auth).await?;
        snapshot.retain(|object| filter.is_included(object.path.as_str()));
        Ok(snapshot)
    }
}
