use clap::Subcommand;

use super::{apply, parse_address};
use crate::address::Address;
use crate::alert::AlertEntry;
use crate::error::CustodyError;
use crate::node::CustodyNode;

#[derive(Subcommand)]
pub enum AlertCommands {
    /// Every pending alert addressed to the recipient
    Incoming {
        #[arg(value_parser = parse_address)]
        recipient: Address,
    },
    /// Alerts whose lock has elapsed
    Ready {
        #[arg(value_parser = parse_address)]
        recipient: Address,
    },
    /// Release ready alerts to the recipient
    Redeem {
        #[arg(long, value_parser = parse_address)]
        caller: Address,
        #[arg(long, value_parser = parse_address)]
        recipient: Address,
    },
    /// Refund the alerts to the recipient that the caller guards
    Cancel {
        #[arg(long, value_parser = parse_address)]
        caller: Address,
        #[arg(long, value_parser = parse_address)]
        recipient: Address,
    },
}

fn print_alerts(entries: &[AlertEntry], wait: u64) {
    if entries.is_empty() {
        println!("No alerts.");
        return;
    }
    println!("Alerts ({}):", entries.len());
    for e in entries {
        println!(
            " - #{} {} from {} (guardian {}, block {}, ready at {})",
            e.id,
            e.amount,
            e.sender,
            e.cancel_account,
            e.block_number,
            e.ready_at(wait)
        );
    }
}

pub fn handle_alert_command(node: &CustodyNode, cmd: AlertCommands) -> Result<(), CustodyError> {
    match cmd {
        AlertCommands::Incoming { recipient } => {
            let (entries, wait) =
                node.query(|s| (s.ledger.get_incoming_alerts(&recipient), s.ledger.alert_block_wait()))?;
            print_alerts(&entries?, wait);
        }
        AlertCommands::Ready { recipient } => {
            let (entries, wait) =
                node.query(|s| (s.ledger.get_ready_alerts(&recipient), s.ledger.alert_block_wait()))?;
            print_alerts(&entries?, wait);
        }
        AlertCommands::Redeem { caller, recipient } => {
            let amount = apply(node, |s| Ok(s.ledger.redeem_ready_alerts(&caller, &recipient)?))?;
            println!("Redeemed {} to {}", amount, recipient);
        }
        AlertCommands::Cancel { caller, recipient } => {
            let amount = apply(node, |s| Ok(s.ledger.cancel_transfers(&caller, &recipient)?))?;
            println!("Cancelled {} in transfers to {}", amount, recipient);
        }
    }
    Ok(())
}
