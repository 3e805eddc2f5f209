//! Provider-facing network work: catalogue fetching, model discovery,
//! liveness checks and downstream gateway probes.

pub mod catalogue;
pub mod discovery;
pub mod downstream;
pub mod fetcher;
pub mod health;
pub mod pool;
pub mod transport;
pub(crate) mod util;

pub use discovery::{Discovery, DiscoveryReport, ProviderRefresh};
pub use downstream::{ApplyReport, DownstreamProbe};
pub use fetcher::{BatchSummary, CatalogueFetcher, FetchBatch, FetchOutcome, RetryPolicy, SourceSpec};
pub use health::{HealthBatch, HealthMonitor, HealthOutcome, HealthStatistics};
pub use transport::{CatalogueTransport, HttpTransport, TransportError, TransportResponse};
pub use util::{models_url, normalize_endpoint};
