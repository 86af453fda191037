use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "quarry-chain")]
pub struct Opt {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(name = "createwallet", about = "Create a new wallet")]
    Createwallet,
    #[command(name = "listaddresses", about = "Print local wallet addresses")]
    ListAddresses,
    #[command(
        name = "getbalance",
        about = "Get the confirmed balance of the target address"
    )]
    GetBalance {
        #[arg(help = "The address (hex SPKI public key)")]
        address: String,
    },
    #[command(name = "send", about = "Sign a transaction and submit it to the node")]
    Send {
        #[arg(help = "Source wallet address")]
        from: String,
        #[arg(help = "Destination address")]
        to: String,
        #[arg(help = "Amount to send")]
        amount: i64,
        #[arg(
            long = "node",
            help = "Node to submit to (defaults to the configured node address)"
        )]
        node: Option<String>,
    },
    #[command(name = "printchain", about = "Print all blocks in the persisted chain")]
    Printchain,
    #[command(name = "startnode", about = "Start a blockchain node")]
    StartNode {
        #[arg(
            long = "miner",
            help = "Enable mining mode and send rewards to ADDRESS"
        )]
        miner: Option<String>,
    },
}
