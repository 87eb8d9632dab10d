// Fetch dispatch.
// Runs aggregator fetch requests as tokio tasks that post completions back over a channel.

use std::future::Future;

use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;

use crate::error::Result;
use crate::jenkins::{Build, Job};
use crate::store::{Account, FavoriteKind};

use super::aggregator::{Completion, FetchRequest};

/// Resolves favorites into jobs and builds. One call per favorite, single shot.
pub trait FetchClient: Clone + Send + Sync + 'static {
    fn fetch_job(&self, url: String, account: Account) -> impl Future<Output = Result<Job>> + Send;

    fn fetch_build(
        &self,
        url: String,
        account: Account,
    ) -> impl Future<Output = Result<Build>> + Send;
}

/// Spawn one task per request. Each task sends exactly one completion.
pub fn spawn_fetches<F: FetchClient>(
    handle: &Handle,
    client: &F,
    requests: Vec<FetchRequest>,
    tx: &UnboundedSender<Completion>,
) {
    for request in requests {
        let client = client.clone();
        let tx = tx.clone();
        handle.spawn(async move {
            let url = request.favorite.url.clone();
            let account = request.account.clone();
            let completion = match request.favorite.kind {
                FavoriteKind::Job => Completion::job(request, client.fetch_job(url, account).await),
                FavoriteKind::Build => {
                    Completion::build(request, client.fetch_build(url, account).await)
                }
            };
            if tx.send(completion).is_err() {
                tracing::debug!("completion receiver dropped");
            }
        });
    }
}
