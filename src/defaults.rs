//! Default values for engine resolution and RPC calls.

use std::time::Duration;

// `concat!` only takes literals, so the release tag lives in a macro.
macro_rules! engine_version {
    () => {
        "v0.9.1"
    };
}

macro_rules! engine_file_name {
    () => {
        concat!("rustledger-ffi-wasi-", engine_version!(), ".wasm")
    };
}

/// Engine release fetched when no binary is present.
pub const ENGINE_VERSION: &str = engine_version!();

/// Download location of the engine module for [`ENGINE_VERSION`].
pub const ENGINE_URL: &str = concat!(
    "https://github.com/rustledger/rustledger/releases/download/",
    engine_version!(),
    "/",
    engine_file_name!()
);

/// File name the engine module is stored under.
pub const ENGINE_FILE_NAME: &str = engine_file_name!();

/// Launcher executable looked up on `PATH`.
pub const LAUNCHER_NAME: &str = "wasmtime";

/// Environment override for the engine module path.
pub const ENGINE_PATH_ENV: &str = "LEDGER_GATEWAY_ENGINE";

/// Environment override for the launcher executable.
pub const LAUNCHER_PATH_ENV: &str = "LEDGER_GATEWAY_LAUNCHER";

/// Major API version prefix the client understands.
pub const SUPPORTED_API_VERSION: &str = "1.";

/// Filename the engine assumes when none is given.
pub const STDIN_FILENAME: &str = "<stdin>";

pub const CALL_TIMEOUT: Duration = Duration::from_secs(60);
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(600);
