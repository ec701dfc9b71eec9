pub mod alerts;
pub mod controller;
pub mod guardian;
pub mod token;

use clap::{Parser, Subcommand};
use std::sync::Arc;

use crate::address::{Address, AddressError};
use crate::config::WbtcvConfig;
use crate::error::CustodyError;
use crate::node::{CustodyNode, CustodyState};
use crate::storage::Storage;

#[derive(Parser)]
#[command(name = "wbtcv")]
#[command(about = "wBTCV custody ledger CLI", long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, global = true, default_value = "wbtcv.toml")]
    pub config: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Deploy the ledger into the configured database
    Init,
    /// Token metadata, supply and chain position
    Status,
    /// Balance and recovery state of an account
    Balance {
        #[arg(value_parser = parse_address)]
        address: Address,
    },
    /// Owner-only direct mint
    Mint {
        #[arg(long, value_parser = parse_address)]
        caller: Address,
        #[arg(long, value_parser = parse_address)]
        to: Address,
        #[arg(long)]
        amount: u128,
    },
    /// Owner-only direct burn (only under the `owner` burn policy)
    Burn {
        #[arg(long, value_parser = parse_address)]
        caller: Address,
        #[arg(long)]
        amount: u128,
    },
    Transfer {
        #[arg(long, value_parser = parse_address)]
        caller: Address,
        #[arg(long, value_parser = parse_address)]
        to: Address,
        #[arg(long)]
        amount: u128,
    },
    TransferFrom {
        #[arg(long, value_parser = parse_address)]
        caller: Address,
        #[arg(long, value_parser = parse_address)]
        from: Address,
        #[arg(long, value_parser = parse_address)]
        to: Address,
        #[arg(long)]
        amount: u128,
    },
    Approve {
        #[arg(long, value_parser = parse_address)]
        caller: Address,
        #[arg(long, value_parser = parse_address)]
        spender: Address,
        #[arg(long)]
        amount: u128,
    },
    /// Move the block clock forward
    Advance {
        #[arg(long, default_value_t = 1)]
        blocks: u64,
    },
    /// Recovering address management
    Guardian {
        #[command(subcommand)]
        cmd: guardian::GuardianCommands,
    },
    /// Alert queue inspection, redemption and cancellation
    Alerts {
        #[command(subcommand)]
        cmd: alerts::AlertCommands,
    },
    /// 2-of-3 governance operations
    Controller {
        #[command(subcommand)]
        cmd: controller::ControllerCommands,
    },
}

/// Accepts `0x`-prefixed hex or a label hashed into an address.
pub fn parse_address(input: &str) -> Result<Address, AddressError> {
    Address::parse_or_label(input)
}

pub fn open_node(config: &WbtcvConfig) -> Result<CustodyNode, CustodyError> {
    let storage = Arc::new(Storage::open(&config.node.db_path)?);
    CustodyNode::open(config, storage)
}

/// Run a mutating operation and print the events it emitted.
pub(crate) fn apply<T, F>(node: &CustodyNode, op: F) -> Result<T, CustodyError>
where
    F: FnOnce(&mut CustodyState) -> Result<T, CustodyError>,
{
    let (value, events) = node.execute_with_events(op)?;
    for (block, event) in events {
        println!("  [block {}] {:?}", block, event);
    }
    Ok(value)
}

pub fn run(cli: Cli) -> Result<(), CustodyError> {
    let config = WbtcvConfig::load_or_default(&cli.config)?;

    if let Commands::Init = cli.command {
        return token::handle_init(&config);
    }

    let node = open_node(&config)?;
    match cli.command {
        Commands::Init => Ok(()),
        Commands::Status => token::handle_status(&node),
        Commands::Balance { address } => token::handle_balance(&node, &address),
        Commands::Mint { caller, to, amount } => token::handle_mint(&node, &caller, &to, amount),
        Commands::Burn { caller, amount } => token::handle_burn(&node, &caller, amount),
        Commands::Transfer { caller, to, amount } => {
            token::handle_transfer(&node, &caller, &to, amount)
        }
        Commands::TransferFrom {
            caller,
            from,
            to,
            amount,
        } => token::handle_transfer_from(&node, &caller, &from, &to, amount),
        Commands::Approve {
            caller,
            spender,
            amount,
        } => token::handle_approve(&node, &caller, &spender, amount),
        Commands::Advance { blocks } => token::handle_advance(&node, blocks),
        Commands::Guardian { cmd } => guardian::handle_guardian_command(&node, cmd),
        Commands::Alerts { cmd } => alerts::handle_alert_command(&node, cmd),
        Commands::Controller { cmd } => controller::handle_controller_command(&node, cmd),
    }
}
