// Per-tool token bucket rate limiting

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Instant;

pub const DEFAULT_CAPACITY: u32 = 5;
pub const DEFAULT_REFILL_PER_SECOND: f64 = 5.0;

/// Shape of a single bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BucketConfig {
    /// Maximum burst.
    #[serde(default = "default_capacity")]
    pub capacity: u32,
    /// Tokens added per second of wall-clock time.
    #[serde(default = "default_refill_per_second")]
    pub refill_per_second: f64,
}

fn default_capacity() -> u32 {
    DEFAULT_CAPACITY
}

fn default_refill_per_second() -> f64 {
    DEFAULT_REFILL_PER_SECOND
}

impl Default for BucketConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            refill_per_second: DEFAULT_REFILL_PER_SECOND,
        }
    }
}

impl BucketConfig {
    pub fn new(capacity: u32, refill_per_second: f64) -> Self {
        Self {
            capacity,
            refill_per_second,
        }
    }
}

/// How a rejected admission is reported to the client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitSurface {
    /// Successful envelope with `isError: true`.
    #[default]
    ToolError,
    /// Top-level JSON-RPC error (code 429).
    ProtocolError,
}

/// Limiter configuration: a default bucket, per-tool overrides and an
/// optional bucket shared by every tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(flatten)]
    pub default: BucketConfig,
    #[serde(default)]
    pub per_tool: HashMap<String, BucketConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global: Option<BucketConfig>,
}

impl RateLimitConfig {
    pub fn for_tool(&self, tool: &str) -> BucketConfig {
        self.per_tool.get(tool).copied().unwrap_or(self.default)
    }
}

#[derive(Debug)]
struct TokenBucket {
    capacity: f64,
    refill_per_second: f64,
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn new(config: BucketConfig, now: Instant) -> Self {
        let capacity = f64::from(config.capacity);
        Self {
            capacity,
            refill_per_second: config.refill_per_second.max(0.0),
            tokens: capacity,
            last_refill: now,
        }
    }

    /// Refill for the elapsed time, then take one token if available.
    fn try_acquire(&mut self, now: Instant) -> bool {
        // An instant earlier than the last refill adds nothing and never
        // moves the refill timestamp backwards.
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_per_second).min(self.capacity);
        self.last_refill = self.last_refill.max(now);

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Give back a token taken by `try_acquire`.
    fn refund(&mut self) {
        self.tokens = (self.tokens + 1.0).min(self.capacity);
    }
}

/// Token buckets keyed by tool name, created lazily and kept for the
/// lifetime of the limiter.
///
/// Each bucket has its own mutex, so the refill/check/decrement sequence is
/// atomic per tool while distinct tools never contend. The map itself only
/// takes its write lock to insert a new bucket.
#[derive(Debug, Default)]
pub struct RateLimiter {
    config: RateLimitConfig,
    buckets: RwLock<HashMap<String, Arc<Mutex<TokenBucket>>>>,
    global: Option<Mutex<TokenBucket>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        let global = config
            .global
            .map(|g| Mutex::new(TokenBucket::new(g, Instant::now())));

        Self {
            config,
            buckets: RwLock::new(HashMap::new()),
            global,
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Admit or reject one call to `tool` now.
    pub fn check(&self, tool: &str) -> bool {
        self.check_at(tool, Instant::now())
    }

    /// Admit or reject one call to `tool` at `now`.
    ///
    /// When a global bucket is configured it is consulted only after the
    /// tool bucket admitted. A global rejection returns the tool's token.
    /// Locks are always taken tool first, then global.
    pub fn check_at(&self, tool: &str, now: Instant) -> bool {
        let handle = self.bucket(tool, now);
        let mut bucket = handle.lock().unwrap_or_else(PoisonError::into_inner);
        if !bucket.try_acquire(now) {
            return false;
        }

        let Some(global) = &self.global else {
            return true;
        };
        if global
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .try_acquire(now)
        {
            true
        } else {
            bucket.refund();
            false
        }
    }

    /// Number of buckets created so far.
    pub fn bucket_count(&self) -> usize {
        self.buckets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn bucket(&self, tool: &str, now: Instant) -> Arc<Mutex<TokenBucket>> {
        if let Some(bucket) = self
            .buckets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(tool)
        {
            return bucket.clone();
        }

        let mut buckets = self.buckets.write().unwrap_or_else(PoisonError::into_inner);
        buckets
            .entry(tool.to_string())
            .or_insert_with(|| {
                Arc::new(Mutex::new(TokenBucket::new(self.config.for_tool(tool), now)))
            })
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_burst_then_refill() {
        let limiter = RateLimiter::new(RateLimitConfig::default());
        let start = Instant::now();

        let admitted = (0..6).filter(|_| limiter.check_at("get_balance", start)).count();
        assert_eq!(admitted, 5);
        assert!(!limiter.check_at("get_balance", start));

        let later = start + Duration::from_millis(200);
        assert!(limiter.check_at("get_balance", later));
        assert!(!limiter.check_at("get_balance", later));
    }

    #[test]
    fn test_refill_is_capped_at_capacity() {
        let limiter = RateLimiter::new(RateLimitConfig::default());
        let start = Instant::now();
        assert!(limiter.check_at("t", start));

        // An hour later the bucket holds exactly `capacity` tokens again.
        let later = start + Duration::from_secs(3600);
        let admitted = (0..10).filter(|_| limiter.check_at("t", later)).count();
        assert_eq!(admitted, 5);
    }

    #[test]
    fn test_tools_are_independent() {
        let limiter = RateLimiter::new(RateLimitConfig::default());
        let now = Instant::now();

        for _ in 0..5 {
            assert!(limiter.check_at("a", now));
        }
        assert!(!limiter.check_at("a", now));
        assert!(limiter.check_at("b", now));
        assert_eq!(limiter.bucket_count(), 2);
    }

    #[test]
    fn test_per_tool_override() {
        let mut config = RateLimitConfig::default();
        config
            .per_tool
            .insert("get_node_status".to_string(), BucketConfig::new(1, 1.0));
        let limiter = RateLimiter::new(config);
        let now = Instant::now();

        assert!(limiter.check_at("get_node_status", now));
        assert!(!limiter.check_at("get_node_status", now));
        assert!(limiter.check_at("get_node_status", now + Duration::from_millis(1000)));
    }

    #[test]
    fn test_global_bucket_caps_all_tools() {
        let config = RateLimitConfig {
            global: Some(BucketConfig::new(3, 0.0)),
            ..Default::default()
        };
        let limiter = RateLimiter::new(config);
        let now = Instant::now();

        assert!(limiter.check_at("a", now));
        assert!(limiter.check_at("b", now));
        assert!(limiter.check_at("c", now));
        assert!(!limiter.check_at("d", now));
    }

    #[test]
    fn test_global_rejection_leaves_tool_bucket_untouched() {
        let config = RateLimitConfig {
            default: BucketConfig::new(2, 0.0),
            global: Some(BucketConfig::new(1, 1.0)),
            ..Default::default()
        };
        let limiter = RateLimiter::new(config);
        let now = Instant::now();

        assert!(limiter.check_at("a", now));
        // Global bucket is empty; these must not drain "b".
        for _ in 0..5 {
            assert!(!limiter.check_at("b", now));
        }

        let later = now + Duration::from_secs(2);
        assert!(limiter.check_at("b", later));
        assert!(!limiter.check_at("b", later));
        assert!(limiter.check_at("b", later + Duration::from_secs(1)));
        assert!(!limiter.check_at("b", later + Duration::from_secs(2)));
    }

    #[test]
    fn test_earlier_instant_does_not_refill() {
        let limiter = RateLimiter::new(RateLimitConfig {
            default: BucketConfig::new(1, 1.0),
            ..Default::default()
        });
        let now = Instant::now() + Duration::from_secs(10);

        assert!(limiter.check_at("t", now));
        assert!(!limiter.check_at("t", now - Duration::from_secs(5)));
        assert!(!limiter.check_at("t", now + Duration::from_millis(500)));
        assert!(limiter.check_at("t", now + Duration::from_millis(1000)));
    }

    #[test]
    fn test_exactly_one_token_is_never_double_spent() {
        let limiter = Arc::new(RateLimiter::new(RateLimitConfig {
            default: BucketConfig::new(1, 0.0),
            ..Default::default()
        }));
        let now = Instant::now();

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let limiter = limiter.clone();
                std::thread::spawn(move || limiter.check_at("contended", now))
            })
            .collect();

        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|admitted| *admitted)
            .count();
        assert_eq!(admitted, 1);
    }

    #[test]
    fn test_config_deserializes_from_flat_table() {
        let config: RateLimitConfig = serde_json::from_value(serde_json::json!({
            "capacity": 10,
            "refill_per_second": 2.5,
            "per_tool": {"search_qdn": {"capacity": 1}}
        }))
        .unwrap();

        assert_eq!(config.default, BucketConfig::new(10, 2.5));
        assert_eq!(config.for_tool("search_qdn"), BucketConfig::new(1, 5.0));
        assert!(config.global.is_none());
    }
}
