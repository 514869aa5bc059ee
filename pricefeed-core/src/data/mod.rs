//! Price data: table schema, provider trait, and the Yahoo chart provider

pub mod backoff;
pub mod provider;
pub mod schema;
pub mod table;
pub mod transport;
pub mod user_agent;
pub mod yahoo;

pub use backoff::{Backoff, Sleeper, ThreadSleeper};
pub use provider::{Disposition, FetchError, PriceProvider, DELISTED_DESCRIPTION};
pub use schema::{PriceSchema, SchemaError, COLUMNS};
pub use table::{PriceRecord, PriceTable};
pub use transport::{ChartReply, ChartRequest, ChartTransport, HttpTransport};
pub use user_agent::{default_user_agents, SeededSource, ThreadRngSource, UserAgentSource};
pub use yahoo::{FetchOutcome, FetchReport, YahooProvider, PROVIDER_TAG};
