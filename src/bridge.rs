//! One request/response exchange with the browser.
//!
//! `read → dispatch (ping | delegate) → write`, then the caller exits with the
//! code from the returned [`Outcome`].

use std::process::ExitCode;

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, error, info, warn};

use crate::config::BridgeConfig;
use crate::error::{BridgeError, ProtocolErrorKind};
use crate::helper::{call_helper, HelperDiscovery};
use crate::protocol::{read_message, write_message, Request, Response};

/// How an exchange ended once a response was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The exchange completed, including delegation faults reported as content.
    Completed,
    /// The inbound message was not a JSON object.
    Rejected,
}

impl Outcome {
    pub fn exit_code(self) -> ExitCode {
        match self {
            Outcome::Completed => ExitCode::SUCCESS,
            Outcome::Rejected => ExitCode::FAILURE,
        }
    }
}

/// The response to send and how the exchange ended.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub response: Response,
    pub outcome: Outcome,
}

impl Reply {
    fn completed(response: Response) -> Self {
        Self {
            response,
            outcome: Outcome::Completed,
        }
    }
}

/// Native messaging bridge.
pub struct Bridge {
    config: BridgeConfig,
    discovery: Box<dyn HelperDiscovery>,
}

impl Bridge {
    pub fn new(config: BridgeConfig, discovery: Box<dyn HelperDiscovery>) -> Self {
        Self { config, discovery }
    }

    /// Run one exchange: read a frame, answer it, write a frame.
    ///
    /// Errors returned here are fatal; no response is guaranteed to have been
    /// written.
    pub async fn run<R, W>(&self, reader: &mut R, writer: &mut W) -> Result<Outcome, BridgeError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let message = read_message(reader, self.config.max_inbound_size).await?;
        debug!(size = message.len(), "Message received");

        let reply = self.handle(&message).await?;

        let bytes = reply.response.to_bytes()?;
        write_message(writer, &bytes, self.config.max_outbound_size).await?;

        info!(
            response_type = reply.response.kind().unwrap_or("<none>"),
            size = bytes.len(),
            outcome = ?reply.outcome,
            "Response sent"
        );

        Ok(reply.outcome)
    }

    /// Decide the response for a raw inbound payload.
    pub async fn handle(&self, message: &[u8]) -> Result<Reply, BridgeError> {
        let request = match Request::parse(message) {
            Ok(request) => request,
            Err(BridgeError::Protocol {
                kind: kind @ ProtocolErrorKind::InvalidMessageFormat { .. },
            }) => {
                warn!(error = %kind, "Rejecting inbound message");
                return Ok(Reply {
                    response: Response::error(kind.to_string()),
                    outcome: Outcome::Rejected,
                });
            }
            Err(e) => return Err(e),
        };

        if request.is_ping() {
            debug!("Ping received, responding with pong");
            return Ok(Reply::completed(Response::pong()));
        }

        debug!(request_type = request.kind().unwrap_or("<none>"), "Delegating request");

        match call_helper(&self.config, self.discovery.as_ref(), message).await {
            Ok(response) => Ok(Reply::completed(response)),
            Err(BridgeError::Helper { kind }) => {
                error!(error = %kind, "Helper call failed");
                Ok(Reply::completed(Response::error(kind.to_string())))
            }
            Err(e) => Err(e),
        }
    }
}
