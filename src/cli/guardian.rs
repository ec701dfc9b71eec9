use clap::Subcommand;

use super::{apply, parse_address};
use crate::address::Address;
use crate::error::CustodyError;
use crate::node::CustodyNode;
use crate::recovery::{GuardianChange, GuardianUpdate};

#[derive(Subcommand)]
pub enum GuardianCommands {
    /// Bind a recovering address, or propose replacing the current one
    Set {
        #[arg(long, value_parser = parse_address)]
        caller: Address,
        #[arg(long, value_parser = parse_address)]
        guardian: Address,
    },
    /// Confirm a proposed replacement once the wait has elapsed
    Confirm {
        #[arg(long, value_parser = parse_address)]
        caller: Address,
        #[arg(long, value_parser = parse_address)]
        guardian: Address,
    },
    /// Propose removing the recovering address
    Delete {
        #[arg(long, value_parser = parse_address)]
        caller: Address,
    },
    /// Confirm a proposed removal once the wait has elapsed
    ConfirmDelete {
        #[arg(long, value_parser = parse_address)]
        caller: Address,
    },
    Show {
        #[arg(value_parser = parse_address)]
        account: Address,
    },
}

pub fn handle_guardian_command(node: &CustodyNode, cmd: GuardianCommands) -> Result<(), CustodyError> {
    match cmd {
        GuardianCommands::Set { caller, guardian } => {
            let update = apply(node, |s| Ok(s.ledger.set_new_recovering_address(&caller, &guardian)?))?;
            match update {
                GuardianUpdate::Applied => println!("Recovering address for {} set to {}", caller, guardian),
                GuardianUpdate::Proposed { ready_at } => println!(
                    "Change to {} proposed; confirm from block {}",
                    guardian, ready_at
                ),
            }
        }
        GuardianCommands::Confirm { caller, guardian } => {
            apply(node, |s| Ok(s.ledger.confirm_new_recovering_address(&caller, &guardian)?))?;
            println!("Recovering address for {} is now {}", caller, guardian);
        }
        GuardianCommands::Delete { caller } => {
            let ready_at = apply(node, |s| Ok(s.ledger.delete_recovering_address(&caller)?))?;
            println!("Removal proposed; confirm from block {}", ready_at);
        }
        GuardianCommands::ConfirmDelete { caller } => {
            apply(node, |s| Ok(s.ledger.confirm_delete_recovering_address(&caller)?))?;
            println!("Recovering address for {} removed", caller);
        }
        GuardianCommands::Show { account } => {
            let (active, pending, wait) = node.query(|s| {
                (
                    s.ledger.recovering_address(&account),
                    s.ledger.pending_recovering_change(&account),
                    s.ledger.alert_block_wait(),
                )
            })?;
            match active {
                Some(g) => println!("Recovering address: {}", g),
                None => println!("Recovering address: none"),
            }
            if let Some(p) = pending {
                let target = match p.change {
                    GuardianChange::Replace(g) => format!("replace with {}", g),
                    GuardianChange::Delete => "delete".to_string(),
                };
                println!("Pending: {} (ready at block {})", target, p.ready_at(wait));
            }
        }
    }
    Ok(())
}
