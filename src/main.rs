// Entry point for the node CLI.
use clap::Parser;
use log::{error, LevelFilter};
use quarry_chain::network::Package;
use quarry_chain::{
    Chain, ChainStore, Command, MemoryPool, Miner, NodeCoordinator, Opt, Peers, Server,
    SledStore, TcpTransport, Transaction, Transport, Wallets, GLOBAL_CONFIG,
};
use std::process;
use std::sync::{Arc, Mutex};

fn main() {
    env_logger::builder().filter_level(LevelFilter::Info).init();

    let opt = Opt::parse();

    if let Err(e) = run_command(opt.command) {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn run_command(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Createwallet => {
            let mut wallets = Wallets::load()?;
            let address = wallets.create_wallet()?;
            println!("Your new address: {address}");
        }
        Command::ListAddresses => {
            let wallets = Wallets::load()?;
            for address in wallets.get_addresses() {
                println!("{address}");
            }
        }
        Command::GetBalance { address } => {
            let chain = load_persisted_chain()?;
            println!("Balance of {address}: {}", chain.balance_of(&address));
        }
        Command::Send {
            from,
            to,
            amount,
            node,
        } => {
            let wallets = Wallets::load()?;
            let wallet = wallets
                .get_wallet(&from)
                .ok_or_else(|| format!("Wallet not found for address: {from}"))?;

            let tx = Transaction::new_signed(wallet, &to, amount)?;
            let node_addr = node.unwrap_or_else(|| GLOBAL_CONFIG.get_node_addr());
            TcpTransport::send(
                &node_addr,
                &Package::Tx {
                    addr_from: GLOBAL_CONFIG.get_node_addr(),
                    transaction: tx.clone(),
                },
            )?;
            println!("Submitted transaction {} to {node_addr}", tx.id());
        }
        Command::Printchain => {
            let chain = load_persisted_chain()?;
            for block in chain.blocks() {
                println!(
                    "Block {} | hash {} | prev {} | {} transaction(s) | nonce {}",
                    block.index(),
                    block.hash(),
                    block.previous_hash(),
                    block.transactions().len(),
                    block.nonce()
                );
                for tx in block.transactions() {
                    println!("  {} -> {}: {} (id {})", tx.from_addr(), tx.to_addr(), tx.amount(), tx.id());
                }
            }
        }
        Command::StartNode { miner } => {
            if let Some(ref mining_addr) = miner {
                println!("Mining rewards go to: {mining_addr}");
                GLOBAL_CONFIG.set_mining_addr(mining_addr.clone());
            }
            start_node()?;
        }
    }
    Ok(())
}

fn load_persisted_chain() -> Result<Chain, Box<dyn std::error::Error>> {
    let store = SledStore::open(&GLOBAL_CONFIG.data_dir().join("chain_db"))?;
    let blocks = store.load()?;

    let mut chain = Chain::new();
    if !blocks.is_empty() && Chain::is_valid_chain(&blocks) {
        chain.replace(blocks);
    }
    Ok(chain)
}

fn start_node() -> Result<(), Box<dyn std::error::Error>> {
    let node_addr = GLOBAL_CONFIG.get_node_addr();

    // A store that cannot be opened is fatal at startup; after that, save
    // failures are logged and the in-memory chain stays authoritative.
    let store = Arc::new(SledStore::open(&GLOBAL_CONFIG.data_dir().join("chain_db"))?);

    let chain = Arc::new(Mutex::new(Chain::new()));
    let mempool = Arc::new(MemoryPool::new());
    let reward_address = GLOBAL_CONFIG.get_mining_addr().unwrap_or_default();
    let miner = Arc::new(Miner::new(
        Arc::clone(&chain),
        Arc::clone(&mempool),
        &reward_address,
    ));

    let peers = Arc::new(Peers::new());
    let transport: Arc<dyn Transport> = Arc::new(TcpTransport::new(
        Arc::clone(&peers),
        node_addr.clone(),
    ));

    let coordinator = Arc::new(NodeCoordinator::new(
        chain,
        mempool,
        miner,
        store,
        transport,
    ));
    coordinator.initialize_from_store();

    if GLOBAL_CONFIG.is_miner() {
        Arc::clone(&coordinator).start_mining();
    }

    let server = Server::new(Arc::clone(&coordinator), peers);
    let result = server.run(&node_addr);

    coordinator.shutdown();
    result?;
    Ok(())
}
