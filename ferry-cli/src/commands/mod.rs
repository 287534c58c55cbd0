//! CLI command implementations

pub mod ledger;
pub mod migrate;
pub mod secrets;

pub use ledger::LedgerArgs;
pub use migrate::MigrateArgs;
pub use secrets::SecretsArgs;
