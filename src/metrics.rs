//! Prometheus counters for the resolve/fetch/playback pipeline

use lazy_static::lazy_static;
use prometheus::{register_int_counter, IntCounter};

lazy_static! {
    pub static ref IDENTITY_RESOLUTIONS: IntCounter = register_int_counter!(
        "reelgate_identity_resolutions_total",
        "Route identities resolved from navigation events"
    )
    .unwrap();
    pub static ref CATALOG_FETCH_OK: IntCounter = register_int_counter!(
        "reelgate_catalog_fetch_success_total",
        "Catalog lookups that completed successfully"
    )
    .unwrap();
    pub static ref CATALOG_FETCH_FAILED: IntCounter = register_int_counter!(
        "reelgate_catalog_fetch_failure_total",
        "Catalog lookups that failed"
    )
    .unwrap();
    pub static ref STALE_DISCARDS: IntCounter = register_int_counter!(
        "reelgate_stale_responses_discarded_total",
        "Catalog responses dropped because their identity was superseded"
    )
    .unwrap();
    pub static ref SOURCE_SWITCHES: IntCounter = register_int_counter!(
        "reelgate_source_switches_total",
        "Explicit video source switches"
    )
    .unwrap();
    pub static ref SESSIONS_SWEPT: IntCounter = register_int_counter!(
        "reelgate_sessions_swept_total",
        "Watch sessions removed by the expiry sweeper"
    )
    .unwrap();
}
