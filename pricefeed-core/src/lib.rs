//! Pricefeed Core — daily price tables from remote quote APIs.
//!
//! This crate contains:
//! - The fixed-schema price table (date, ticker, OHLC, adjusted close, volume, currency, provider)
//! - The provider trait every price source implements
//! - The Yahoo Finance chart provider with bounded retry and exponential backoff
//! - Fetch configuration loadable from TOML

pub mod config;
pub mod data;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: the provider and its seams can be shared across threads.
    ///
    /// Callers fan out across tickers on their own threads; if any of these
    /// stops being Send + Sync, the build breaks here.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<data::YahooProvider>();
        require_sync::<data::YahooProvider>();
        require_send::<data::PriceTable>();
        require_sync::<data::PriceTable>();
        require_send::<data::PriceRecord>();
        require_sync::<data::PriceRecord>();
        require_send::<data::FetchError>();
        require_sync::<data::FetchError>();
        require_send::<data::SeededSource>();
        require_sync::<data::SeededSource>();
        require_send::<config::FetchConfig>();
        require_sync::<config::FetchConfig>();
    }

    /// Compile-time check: the Yahoo provider is usable as a `dyn PriceProvider`.
    #[allow(dead_code)]
    fn assert_price_provider_object(p: &data::YahooProvider) -> &dyn data::PriceProvider {
        p
    }
}
