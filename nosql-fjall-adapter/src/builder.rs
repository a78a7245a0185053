use crate::config::FjallConfig;
use crate::store::FjallDatabase;
use fjall::compaction::Strategy;
use fjall::CompressionType;
use nosql::database::Database;
use nosql::errors::NosqlResult;

/// Fluent configuration for a [FjallDatabase].
///
/// # Examples
///
/// ```rust,ignore
/// use nosql_fjall_adapter::FjallDatabase;
///
/// let db = FjallDatabase::with_config()
///     .low_memory_preset()
///     .db_path("/path/to/db")
///     .open()?;
/// ```
///
/// # Configuration Presets
///
/// - `production_preset()` - Balanced configuration for production use
/// - `high_throughput_preset()` - Optimized for bulk loads
/// - `low_memory_preset()` - Optimized for low-memory environments
///
/// Setters called after a preset override the preset's values.
pub struct FjallDatabaseBuilder {
    config: FjallConfig,
}

impl FjallDatabaseBuilder {
    #[inline]
    pub fn new() -> FjallDatabaseBuilder {
        FjallDatabaseBuilder {
            config: FjallConfig::new(),
        }
    }

    /// Applies production-oriented settings.
    ///
    /// - 256 MB block cache, 64 MB blob cache
    /// - 128 MB write buffer, 32 MB memtables
    /// - All cores for flushing, half of them for compaction
    /// - Bloom filter with 10 bits per key
    /// - fsync every 100ms
    /// - LZ4 compression
    pub fn production_preset(self) -> Self {
        let cpus = std::thread::available_parallelism()
            .map(usize::from)
            .unwrap_or(4);

        self.block_cache_capacity(256 * 1024 * 1024)
            .blob_cache_capacity(64 * 1024 * 1024)
            .max_write_buffer_size(128 * 1024 * 1024)
            .max_memtable_size(32 * 1024 * 1024)
            .flush_workers(cpus)
            .compaction_workers((cpus / 2).max(1))
            .bloom_filter_bits(10)
            .fsync_frequency(100)
            .compression_type(CompressionType::Lz4)
    }

    /// Applies settings for bulk loading through batch writers.
    ///
    /// Large buffers and memtables, key-value separation for large documents,
    /// no bloom filter, and journal persistence left to explicit
    /// [`FjallDatabase::commit`] calls and close.
    pub fn high_throughput_preset(self) -> Self {
        let cpus = std::thread::available_parallelism()
            .map(usize::from)
            .unwrap_or(4);

        self.block_cache_capacity(512 * 1024 * 1024)
            .blob_cache_capacity(128 * 1024 * 1024)
            .max_write_buffer_size(256 * 1024 * 1024)
            .max_memtable_size(64 * 1024 * 1024)
            .flush_workers(cpus)
            .compaction_workers(cpus)
            .manual_journal_persist(true)
            .kv_separated(true)
            .bloom_filter_bits(0)
    }

    /// Applies minimal memory settings for embedded or test environments.
    pub fn low_memory_preset(self) -> Self {
        self.block_cache_capacity(16 * 1024 * 1024)
            .blob_cache_capacity(8 * 1024 * 1024)
            .max_write_buffer_size(32 * 1024 * 1024)
            .max_memtable_size(8 * 1024 * 1024)
            .flush_workers(1)
            .compaction_workers(1)
            .bloom_filter_bits(10)
    }

    #[inline]
    pub fn db_path(self, db_path: &str) -> Self {
        self.config.set_db_path(db_path);
        self
    }

    #[inline]
    pub fn manual_journal_persist(self, value: bool) -> Self {
        self.config.set_manual_journal_persist(value);
        self
    }

    #[inline]
    pub fn flush_workers(self, count: usize) -> Self {
        self.config.set_flush_workers(count);
        self
    }

    #[inline]
    pub fn compaction_workers(self, count: usize) -> Self {
        self.config.set_compaction_workers(count);
        self
    }

    #[inline]
    pub fn block_cache_capacity(self, capacity: u64) -> Self {
        self.config.set_block_cache_capacity(capacity);
        self
    }

    #[inline]
    pub fn blob_cache_capacity(self, capacity: u64) -> Self {
        self.config.set_blob_cache_capacity(capacity);
        self
    }

    #[inline]
    pub fn max_journaling_size(self, size: u64) -> Self {
        self.config.set_max_journaling_size(size);
        self
    }

    #[inline]
    pub fn max_write_buffer_size(self, size: u64) -> Self {
        self.config.set_max_write_buffer_size(size);
        self
    }

    #[inline]
    pub fn fsync_frequency(self, millis: u16) -> Self {
        self.config.set_fsync_frequency(millis);
        self
    }

    #[inline]
    pub fn commit_before_close(self, value: bool) -> Self {
        self.config.set_commit_before_close(value);
        self
    }

    #[inline]
    pub fn bloom_filter_bits(self, bits: u8) -> Self {
        self.config.set_bloom_filter_bits(bits as i8);
        self
    }

    /// Turns the partition bloom filters off.
    #[inline]
    pub fn disable_bloom_filter(self) -> Self {
        self.config.set_bloom_filter_bits(-1);
        self
    }

    #[inline]
    pub fn compression_type(self, compression_type: CompressionType) -> Self {
        self.config.set_compression_type(compression_type);
        self
    }

    #[inline]
    pub fn compaction_strategy(self, strategy: Strategy) -> Self {
        self.config.set_compaction_strategy(strategy);
        self
    }

    #[inline]
    pub fn max_memtable_size(self, size: u32) -> Self {
        self.config.set_max_memtable_size(size);
        self
    }

    #[inline]
    pub fn block_size(self, size: u32) -> Self {
        self.config.set_block_size(size);
        self
    }

    #[inline]
    pub fn kv_separated(self, value: bool) -> Self {
        self.config.set_kv_separated(value);
        self
    }

    pub fn config(&self) -> &FjallConfig {
        &self.config
    }

    /// Opens the database and returns the fjall handle itself.
    pub fn open_fjall(self) -> NosqlResult<FjallDatabase> {
        FjallDatabase::open(self.config)
    }

    /// Opens the database behind a [Database] handle.
    pub fn open(self) -> NosqlResult<Database> {
        self.open_fjall().map(Database::from)
    }
}

impl Default for FjallDatabaseBuilder {
    fn default() -> Self {
        FjallDatabaseBuilder::new()
    }
}
