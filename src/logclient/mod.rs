// CT log REST client (RFC 6962 §4)
//
// Builds requests against a log's `ct/v1` surface and parses the JSON
// envelopes into the binary data model. The client itself performs no
// retries and owns no sockets; all network I/O goes through the injected
// `LogTransport` collaborator, which is also where retry/backoff policy
// lives.

pub mod client;
pub mod responses;
pub mod transport;

pub use client::LogClient;
pub use responses::{
    AddChainRequest, AddChainResponse, GetEntriesResponse, GetProofByHashResponse,
    GetSthConsistencyResponse, GetSthResponse,
};
pub use transport::{HttpTransport, LogTransport};
