//! Static table of the properties the tuner knows how to reason about

use serde::Serialize;

/// Property keys used across the rule engine
pub mod keys {
    pub const EXECUTOR_CORES: &str = "spark.executor.cores";
    pub const EXECUTOR_INSTANCES: &str = "spark.executor.instances";
    pub const EXECUTOR_MEMORY: &str = "spark.executor.memory";
    pub const EXECUTOR_MEMORY_OVERHEAD: &str = "spark.executor.memoryOverhead";
    pub const OFF_HEAP_ENABLED: &str = "spark.memory.offHeap.enabled";
    pub const OFF_HEAP_SIZE: &str = "spark.memory.offHeap.size";
    pub const PYSPARK_MEMORY: &str = "spark.executor.pyspark.memory";
    pub const PINNED_POOL: &str = "spark.rapids.memory.pinnedPool.size";
    pub const SPILL_STORAGE: &str = "spark.rapids.memory.host.spillStorageSize";
    pub const SQL_ENABLED: &str = "spark.rapids.sql.enabled";
    pub const PLUGINS: &str = "spark.plugins";
    pub const CONCURRENT_GPU_TASKS: &str = "spark.rapids.sql.concurrentGpuTasks";
    pub const BATCH_SIZE_BYTES: &str = "spark.rapids.sql.batchSizeBytes";
    pub const TASK_GPU_AMOUNT: &str = "spark.task.resource.gpu.amount";
    pub const SHUFFLE_PARTITIONS: &str = "spark.sql.shuffle.partitions";
    pub const MAX_PARTITION_BYTES: &str = "spark.sql.files.maxPartitionBytes";
    pub const AQE_ENABLED: &str = "spark.sql.adaptive.enabled";
    pub const AQE_ADVISORY_PARTITION_SIZE: &str =
        "spark.sql.adaptive.advisoryPartitionSizeInBytes";
    pub const AQE_MIN_PARTITION_SIZE: &str =
        "spark.sql.adaptive.coalescePartitions.minPartitionSize";
    pub const AQE_MIN_PARTITION_NUM: &str = "spark.sql.adaptive.coalescePartitions.minPartitionNum";
    pub const AQE_INITIAL_PARTITION_NUM: &str =
        "spark.sql.adaptive.coalescePartitions.initialPartitionNum";
    pub const AQE_PARALLELISM_FIRST: &str =
        "spark.sql.adaptive.coalescePartitions.parallelismFirst";
    pub const AQE_AUTO_BROADCAST_THRESHOLD: &str =
        "spark.sql.adaptive.autoBroadcastJoinThreshold";
    pub const SHUFFLE_READER_THREADS: &str = "spark.rapids.shuffle.multiThreaded.reader.threads";
    pub const SHUFFLE_WRITER_THREADS: &str = "spark.rapids.shuffle.multiThreaded.writer.threads";
    pub const SHUFFLE_MAX_BYTES_IN_FLIGHT: &str =
        "spark.rapids.shuffle.multiThreaded.maxBytesInFlight";
    pub const MULTITHREADED_READ_THREADS: &str = "spark.rapids.sql.multiThreadedRead.numThreads";
    pub const READER_COMBINE_SIZE: &str = "spark.rapids.sql.reader.multithreaded.combine.sizeBytes";
    pub const PARQUET_COMBINE_WAIT: &str =
        "spark.rapids.sql.format.parquet.multithreaded.combine.waitTime";
    pub const SHUFFLE_MANAGER: &str = "spark.shuffle.manager";
    pub const FILE_CACHE_ENABLED: &str = "spark.rapids.filecache.enabled";
    pub const SERIALIZER: &str = "spark.serializer";
    pub const KRYO_REGISTRATOR: &str = "spark.kryo.registrator";
    pub const KRYO_BUFFER_MAX: &str = "spark.kryoserializer.buffer.max";
    pub const INCOMPATIBLE_DATE_FORMATS: &str = "spark.rapids.sql.incompatibleDateFormats.enabled";
    pub const DATABRICKS_AUTO_OPTIMIZE_SHUFFLE: &str =
        "spark.databricks.adaptive.autoOptimizeShuffle.enabled";
}

/// What a property controls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Must be set for the accelerator to work at all
    Functionality,
    /// Affects performance only
    Tuning,
}

/// One tunable property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TuningDefinition {
    pub key: &'static str,
    pub category: Category,
    /// Value assumed by the engine when the application did not set one
    pub default: Option<&'static str>,
    /// Explanation emitted when the application did not set the property
    pub missing_comment: Option<&'static str>,
    /// Explanation emitted when the recommendation replaces the application's value
    pub update_comment: Option<&'static str>,
}

const fn def(key: &'static str, category: Category) -> TuningDefinition {
    TuningDefinition {
        key,
        category,
        default: None,
        missing_comment: None,
        update_comment: None,
    }
}

const fn with_default(mut d: TuningDefinition, default: &'static str) -> TuningDefinition {
    d.default = Some(default);
    d
}

const fn when_missing(mut d: TuningDefinition, comment: &'static str) -> TuningDefinition {
    d.missing_comment = Some(comment);
    d
}

const fn when_updated(mut d: TuningDefinition, comment: &'static str) -> TuningDefinition {
    d.update_comment = Some(comment);
    d
}

use Category::{Functionality, Tuning};

/// Properties seeded into every ledger, sorted by key
pub const TUNING_DEFINITIONS: &[TuningDefinition] = &[
    def(keys::DATABRICKS_AUTO_OPTIMIZE_SHUFFLE, Tuning),
    def("spark.databricks.optimizer.dynamicFilePruning", Tuning),
    def(keys::EXECUTOR_CORES, Tuning),
    when_missing(
        def(keys::EXECUTOR_INSTANCES, Tuning),
        "'spark.executor.instances' should be set to (gpuCount * numWorkers).",
    ),
    when_missing(
        def(keys::EXECUTOR_MEMORY, Tuning),
        "'spark.executor.memory' should be set to at least 2GB/core.",
    ),
    def(keys::EXECUTOR_MEMORY_OVERHEAD, Tuning),
    def(keys::KRYO_REGISTRATOR, Functionality),
    with_default(def(keys::KRYO_BUFFER_MAX, Tuning), "64m"),
    def(keys::FILE_CACHE_ENABLED, Tuning),
    def(keys::SPILL_STORAGE, Tuning),
    def(keys::PINNED_POOL, Tuning),
    def(keys::SHUFFLE_MAX_BYTES_IN_FLIGHT, Tuning),
    def(keys::SHUFFLE_READER_THREADS, Tuning),
    def(keys::SHUFFLE_WRITER_THREADS, Tuning),
    def(keys::BATCH_SIZE_BYTES, Tuning),
    when_missing(
        def(keys::CONCURRENT_GPU_TASKS, Tuning),
        "'spark.rapids.sql.concurrentGpuTasks' should be set to Min(4, (gpuMemory / 7.5G)).",
    ),
    when_missing(
        with_default(def(keys::SQL_ENABLED, Functionality), "true"),
        "'spark.rapids.sql.enabled' should be true to enable SQL operations on the GPU.",
    ),
    def(keys::PARQUET_COMBINE_WAIT, Tuning),
    def(keys::INCOMPATIBLE_DATE_FORMATS, Functionality),
    def(keys::MULTITHREADED_READ_THREADS, Tuning),
    def(keys::READER_COMBINE_SIZE, Tuning),
    when_updated(
        def(keys::SHUFFLE_MANAGER, Tuning),
        "'spark.shuffle.manager' was replaced by the RAPIDS shuffle manager built for this \
         Spark version.",
    ),
    with_default(def(keys::AQE_ADVISORY_PARTITION_SIZE, Tuning), "64m"),
    def(keys::AQE_AUTO_BROADCAST_THRESHOLD, Tuning),
    with_default(def(keys::AQE_INITIAL_PARTITION_NUM, Tuning), "200"),
    def(keys::AQE_MIN_PARTITION_NUM, Tuning),
    with_default(def(keys::AQE_MIN_PARTITION_SIZE, Tuning), "1m"),
    def(keys::AQE_PARALLELISM_FIRST, Tuning),
    when_missing(
        with_default(def(keys::AQE_ENABLED, Tuning), "true"),
        "'spark.sql.adaptive.enabled' should be enabled for better performance.",
    ),
    with_default(def(keys::MAX_PARTITION_BYTES, Tuning), "512m"),
    with_default(def(keys::SHUFFLE_PARTITIONS, Tuning), "200"),
    when_missing(
        def(keys::TASK_GPU_AMOUNT, Functionality),
        "'spark.task.resource.gpu.amount' should be set to Min(1, (gpuCount / numCores)).",
    ),
];

/// Look up the definition of a key
pub fn definition(key: &str) -> Option<&'static TuningDefinition> {
    TUNING_DEFINITIONS.iter().find(|d| d.key == key)
}

/// Default value of a key, if the table has one
pub fn default_value(key: &str) -> Option<&'static str> {
    definition(key).and_then(|d| d.default)
}

/// Comment used when a recommended key was not set by the application
pub fn missing_comment(key: &str) -> String {
    definition(key)
        .and_then(|d| d.missing_comment)
        .map(str::to_string)
        .unwrap_or_else(|| format!("'{key}' was not set."))
}

/// Comment used when a recommendation replaces the application's value
pub fn update_comment(key: &str) -> Option<&'static str> {
    definition(key).and_then(|d| d.update_comment)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_sorted_and_unique() {
        let keys: Vec<&str> = TUNING_DEFINITIONS.iter().map(|d| d.key).collect();
        let mut sorted = keys.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn test_missing_comment_fallback() {
        assert_eq!(
            missing_comment("spark.some.unknown.key"),
            "'spark.some.unknown.key' was not set."
        );
        assert_eq!(
            missing_comment(keys::AQE_ENABLED),
            "'spark.sql.adaptive.enabled' should be enabled for better performance."
        );
    }

    #[test]
    fn test_defaults() {
        assert_eq!(default_value(keys::SHUFFLE_PARTITIONS), Some("200"));
        assert_eq!(default_value(keys::MAX_PARTITION_BYTES), Some("512m"));
        assert_eq!(default_value(keys::EXECUTOR_CORES), None);
        assert!(update_comment(keys::SHUFFLE_MANAGER).is_some());
    }
}
