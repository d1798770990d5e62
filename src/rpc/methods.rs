//! Wire method names understood by the engine.

pub const LEDGER_LOAD: &str = "ledger.load";
pub const LEDGER_LOAD_FILE: &str = "ledger.loadFile";
pub const LEDGER_VALIDATE: &str = "ledger.validate";

pub const QUERY_EXECUTE: &str = "query.execute";

pub const FORMAT_SOURCE: &str = "format.source";
pub const FORMAT_ENTRY: &str = "format.entry";
pub const FORMAT_ENTRIES: &str = "format.entries";

pub const ENTRY_CREATE: &str = "entry.create";
pub const ENTRY_CREATE_BATCH: &str = "entry.createBatch";
pub const ENTRY_CLAMP: &str = "entry.clamp";
pub const ENTRY_FILTER: &str = "entry.filter";

pub const UTIL_IS_ENCRYPTED: &str = "util.isEncrypted";
pub const UTIL_GET_ACCOUNT_TYPE: &str = "util.getAccountType";
pub const UTIL_TYPES: &str = "util.types";
pub const UTIL_VERSION: &str = "util.version";

/// Every method the gateway may send.
pub const ALL: &[&str] = &[
    LEDGER_LOAD,
    LEDGER_LOAD_FILE,
    LEDGER_VALIDATE,
    QUERY_EXECUTE,
    FORMAT_SOURCE,
    FORMAT_ENTRY,
    FORMAT_ENTRIES,
    ENTRY_CREATE,
    ENTRY_CREATE_BATCH,
    ENTRY_CLAMP,
    ENTRY_FILTER,
    UTIL_IS_ENCRYPTED,
    UTIL_GET_ACCOUNT_TYPE,
    UTIL_TYPES,
    UTIL_VERSION,
];
