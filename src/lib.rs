pub mod config;
pub mod dedupe;
pub mod domain;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod matching;
pub mod normalize;
pub mod pipeline;
pub mod pool;
pub mod providers;
pub mod rank;
