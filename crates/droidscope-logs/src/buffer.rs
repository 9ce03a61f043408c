use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use parking_lot::RwLock;

use droidscope_types::{ArcLogRecord, LogLevel, LogRecord};

/// Lock-free atomic counters for each log level
#[derive(Default)]
struct AtomicLevelCounts {
    verbose: AtomicUsize,
    debug: AtomicUsize,
    info: AtomicUsize,
    warn: AtomicUsize,
    error: AtomicUsize,
    fatal: AtomicUsize,
    unknown: AtomicUsize,
}

impl AtomicLevelCounts {
    fn increment(&self, level: LogLevel) {
        self.slot(level).fetch_add(1, Ordering::Relaxed);
    }

    fn decrement(&self, level: LogLevel) {
        self.slot(level).fetch_sub(1, Ordering::Relaxed);
    }

    fn slot(&self, level: LogLevel) -> &AtomicUsize {
        match level {
            LogLevel::Verbose => &self.verbose,
            LogLevel::Debug => &self.debug,
            LogLevel::Info => &self.info,
            LogLevel::Warn => &self.warn,
            LogLevel::Error => &self.error,
            LogLevel::Fatal => &self.fatal,
            LogLevel::Unknown => &self.unknown,
        }
    }

    fn to_counts(&self) -> LevelCounts {
        LevelCounts {
            verbose: self.verbose.load(Ordering::Relaxed),
            debug: self.debug.load(Ordering::Relaxed),
            info: self.info.load(Ordering::Relaxed),
            warn: self.warn.load(Ordering::Relaxed),
            error: self.error.load(Ordering::Relaxed),
            fatal: self.fatal.load(Ordering::Relaxed),
            unknown: self.unknown.load(Ordering::Relaxed),
        }
    }
}

/// Thread-safe ring buffer holding the most recent log records.
///
/// Sequence numbers are assigned on append and are strictly increasing;
/// once the buffer is full the oldest record is evicted per append.
#[derive(Clone)]
pub struct LogBuffer {
    /// Internal storage - Arc<LogRecord> keeps render snapshots cheap
    records: Arc<RwLock<VecDeque<ArcLogRecord>>>,

    /// Maximum capacity
    capacity: usize,

    /// Next sequence number (first record gets 1)
    next_seq: Arc<AtomicU64>,

    /// Fast atomic counter for held records (avoids locking on len())
    held_count: Arc<AtomicUsize>,

    /// Lock-free level counts (O(1) instead of O(n) scan)
    level_counts: Arc<AtomicLevelCounts>,
}

impl LogBuffer {
    /// Create a new log buffer with the given capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            records: Arc::new(RwLock::new(VecDeque::with_capacity(capacity))),
            capacity,
            next_seq: Arc::new(AtomicU64::new(1)),
            held_count: Arc::new(AtomicUsize::new(0)),
            level_counts: Arc::new(AtomicLevelCounts::default()),
        }
    }

    /// Append a record, assigning its sequence number and evicting the
    /// oldest record when at capacity.
    pub fn append(&self, mut record: LogRecord) {
        record.seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        self.level_counts.increment(record.level);

        let mut records = self.records.write();
        if records.len() >= self.capacity
            && let Some(evicted) = records.pop_front()
        {
            self.level_counts.decrement(evicted.level);
            self.held_count.fetch_sub(1, Ordering::Relaxed);
        }
        records.push_back(Arc::new(record));
        self.held_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Consistent copy-on-read view of the held records in insertion
    /// order. Arc clones are cheap; concurrent appends after the snapshot
    /// is taken are simply not part of it.
    pub fn snapshot(&self) -> Vec<ArcLogRecord> {
        self.records.read().iter().cloned().collect()
    }

    /// Number of records currently held (lock-free)
    pub fn len(&self) -> usize {
        self.held_count.load(Ordering::Relaxed)
    }

    /// Check if buffer is empty (lock-free)
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Configured capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Record count per log level (O(1) via atomic counters)
    pub fn level_counts(&self) -> LevelCounts {
        self.level_counts.to_counts()
    }
}

/// Counts per log level
#[derive(Clone, Debug, Default)]
pub struct LevelCounts {
    pub verbose: usize,
    pub debug: usize,
    pub info: usize,
    pub warn: usize,
    pub error: usize,
    pub fatal: usize,
    pub unknown: usize,
}

impl LevelCounts {
    pub fn total(&self) -> usize {
        self.verbose + self.debug + self.info + self.warn + self.error + self.fatal + self.unknown
    }
}
