//! Cluster status endpoints.

use crate::{ConsulClient, QueryOptions, Result};

/// Status endpoints, borrowed from a [`ConsulClient`].
#[derive(Debug, Clone, Copy)]
pub struct Status<'a> {
    client: &'a ConsulClient,
}

impl<'a> Status<'a> {
    pub(crate) fn new(client: &'a ConsulClient) -> Self {
        Self { client }
    }

    /// Raft address of the current leader, empty if there is none.
    pub async fn leader(&self, opts: Option<&QueryOptions>) -> Result<String> {
        let (leader, _) = self
            .client
            .query_as::<String>("/v1/status/leader", opts)
            .await?;
        Ok(leader)
    }

    /// Raft addresses of the voting peers.
    pub async fn peers(&self, opts: Option<&QueryOptions>) -> Result<Vec<String>> {
        let (peers, _) = self
            .client
            .query_as::<Vec<String>>("/v1/status/peers", opts)
            .await?;
        Ok(peers)
    }
}
