pub mod account;
pub mod address;
pub mod alert;
pub mod chain;
pub mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod governance;
pub mod ledger;
pub mod node;
pub mod recovery;
pub mod storage;
