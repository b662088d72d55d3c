//! [`RemoteShell`] over SSH.

use async_trait::async_trait;

use clusterwatch_adapters::ssh::{SshAdapter, SshSession};
use clusterwatch_adapters::AdapterError;

use super::{CommandOutput, ProbeError, RemoteSession, RemoteShell};

#[async_trait]
impl RemoteShell for SshAdapter {
    type Session = SshSession;

    fn address(&self) -> String {
        SshAdapter::address(self)
    }

    async fn connect(&self) -> Result<SshSession, ProbeError> {
        SshAdapter::connect(self)
            .await
            .map_err(|e| connect_error(SshAdapter::address(self), e))
    }
}

#[async_trait]
impl RemoteSession for SshSession {
    async fn exec(&mut self, command: &str) -> Result<CommandOutput, ProbeError> {
        SshSession::exec(self, command)
            .await
            .map_err(|e| ProbeError::CommandExecutionFailure(e.to_string()))
    }

    async fn close(self) -> Result<(), ProbeError> {
        SshSession::close(self)
            .await
            .map_err(|e| ProbeError::CommandExecutionFailure(e.to_string()))
    }
}

fn connect_error(address: String, err: AdapterError) -> ProbeError {
    match err {
        AdapterError::Timeout => ProbeError::ConnectionTimeout { address },
        AdapterError::Auth(reason) => ProbeError::AuthFailure(reason),
        other => ProbeError::ConnectionRefused {
            address,
            reason: other.to_string(),
        },
    }
}
