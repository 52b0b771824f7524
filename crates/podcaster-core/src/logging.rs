//! Structured logging schema.
//!
//! Every crate logs through `tracing` with the same field names so log
//! aggregation can query by one set of keys across subsystems.
//!
//! ## Fields
//!
//! | Field | Meaning |
//! |-------|---------|
//! | `subsystem` | `"core"`, `"api"` or `"database"` |
//! | `component` | e.g. `"overwrite"`, `"hierarchy"`, `"pool"`, `"wall_service"` |
//! | `op` | operation name: `"create"`, `"update"`, `"replace"`, ... |
//! | `entity_id` | id of the entity being operated on |
//! | `relation` | link table affected (`"wall_block"`, ...) |
//! | `parent_id` / `child_id` | the two sides of an association |
//! | `association_id` | association row id |
//! | `desired_count`, `removed`, `created` | overwrite sizes |
//! | `result_count` | rows returned |
//! | `duration_ms` | wall-clock duration |
//! | `pool_size`, `pool_idle` | connection pool occupancy |
//! | `partial` | a failed overwrite left a partial association set |
//! | `error` | error message of a failed operation |
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded state that needs operator attention (partial overwrite) |
//! | WARN  | Recoverable failure, nothing persisted |
//! | INFO  | Lifecycle events, completed mutations |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-row iteration |
