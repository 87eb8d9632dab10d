// Jenkins API endpoint functions.
// Typed fetches for jobs and builds, and the `FetchClient` impl used by the aggregator.

use std::future::Future;

use crate::error::Result;
use crate::state::FetchClient;
use crate::store::Account;

use super::client::JenkinsClient;
use super::types::{Build, Job};

impl JenkinsClient {
    /// Get a job by its URL.
    pub async fn get_job(&self, url: &str, account: &Account) -> Result<Job> {
        let response = self.get(url, account).await?;
        let job: Job = response.json().await?;
        Ok(job)
    }

    /// Get a build by its URL.
    pub async fn get_build(&self, url: &str, account: &Account) -> Result<Build> {
        let response = self.get(url, account).await?;
        let build: Build = response.json().await?;
        Ok(build)
    }
}

impl FetchClient for JenkinsClient {
    fn fetch_job(&self, url: String, account: Account) -> impl Future<Output = Result<Job>> + Send {
        let client = self.clone();
        async move { client.get_job(&url, &account).await }
    }

    fn fetch_build(
        &self,
        url: String,
        account: Account,
    ) -> impl Future<Output = Result<Build>> + Send {
        let client = self.clone();
        async move { client.get_build(&url, &account).await }
    }
}
