/// Product name used in generated calendar content.
pub const PRODUCT_NAME: &str = "Cadence";

/// Default PRODID for emitted VCALENDAR containers.
pub const DEFAULT_PRODID: &str = const_str::concat!("-//", PRODUCT_NAME, "//Recurrence Limiter//EN");

/// Sentinel written into fingerprints for a missing uid or timestamp.
pub const FINGERPRINT_SENTINEL: &str = "-";

/// Default cap on the number of occurrences a single expansion may produce.
pub const DEFAULT_MAX_INSTANCES: usize = 10_000;
