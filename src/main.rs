// token - command line host for the ledger
//
// Every subcommand opens the sled store under --data-dir, performs at most
// one ledger operation as the --from (or --key) caller, and exits.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokenledger::host::{SystemClock, TokenHost};
use tokenledger::identity::{Address, Keypair};
use tokenledger::ledger::{format_units, parse_units, Amount, GenesisParams, LedgerEvent, TokenMetadata};
use tokenledger::storage::LedgerStore;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "token", version, about = "Capped fee-on-transfer token ledger")]
struct Cli {
    /// Directory holding the ledger database
    #[arg(long, env = "TOKEN_DATA_DIR", default_value = "token-data", global = true)]
    data_dir: PathBuf,

    /// Address of the calling account
    #[arg(long, env = "TOKEN_CALLER", global = true, conflicts_with = "key")]
    from: Option<Address>,

    /// Hex secret key printed by `keygen`; the caller is its address
    #[arg(long, env = "TOKEN_KEY", global = true, hide_env_values = true)]
    key: Option<String>,

    /// Treat amounts as smallest units instead of decimal token amounts
    #[arg(long, global = true)]
    raw: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a keypair and print its address
    Keygen,
    /// Deploy a new ledger; the caller becomes owner and receives cap / 2
    Init {
        #[arg(long, default_value = "10000000")]
        cap: String,
        /// Transfer fee in basis points (max 100)
        #[arg(long, default_value_t = 10)]
        fee: u16,
        /// Reward rate in millionths of the balance per second
        #[arg(long, default_value_t = 1_000)]
        reward_rate: Amount,
        #[arg(long, default_value = "MyToken")]
        name: String,
        #[arg(long, default_value = "MTK")]
        symbol: String,
        #[arg(long, default_value_t = 18)]
        decimals: u8,
    },
    /// Mint new tokens (owner only)
    Mint { to: Address, amount: String },
    /// Transfer tokens; the fee goes to the owner
    Transfer { to: Address, amount: String },
    /// Set the transfer fee in basis points (owner only)
    SetFee { basis_points: u16 },
    /// Permanently disable transfers (owner only)
    Freeze,
    /// Hand ownership to another address (owner only)
    TransferOwnership { new_owner: Address },
    /// Claim accrued rewards
    Claim,
    /// Show an account balance
    Balance { address: Address },
    /// Show ledger configuration and totals
    Info,
    /// Show recent ledger events
    Events {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    run(cli)
}

fn run(cli: Cli) -> Result<()> {
    if let Command::Keygen = cli.command {
        let keypair = Keypair::generate();
        println!("address: {}", keypair.address());
        println!("secret:  {}", hex::encode(keypair.to_bytes()));
        return Ok(());
    }

    let store = LedgerStore::open(&cli.data_dir)
        .with_context(|| format!("opening ledger store at {}", cli.data_dir.display()))?;

    if let Command::Init {
        cap,
        fee,
        reward_rate,
        name,
        symbol,
        decimals,
    } = &cli.command
    {
        let deployer = caller(&cli)?;
        let cap = amount_arg(cap, *decimals, cli.raw)?;
        let params = GenesisParams::new(cap, *fee, *reward_rate).with_metadata(TokenMetadata {
            name: name.clone(),
            symbol: symbol.clone(),
            decimals: *decimals,
        });
        let host = TokenHost::initialize(store, SystemClock, deployer, params)?;
        println!("deployed {} ({}) owned by {}", host.ledger().name(), host.ledger().symbol(), deployer);
        print_info(&host);
        return Ok(());
    }

    let mut host = TokenHost::open(store, SystemClock)?;
    let decimals = host.ledger().decimals();

    match &cli.command {
        Command::Mint { to, amount } => {
            let amount = amount_arg(amount, decimals, cli.raw)?;
            host.mint(caller(&cli)?, *to, amount)?;
            println!("minted {} to {}", format_units(amount, decimals), to);
        }
        Command::Transfer { to, amount } => {
            let amount = amount_arg(amount, decimals, cli.raw)?;
            let from = caller(&cli)?;
            host.transfer(from, *to, amount)?;
            println!("transferred {} from {} to {}", format_units(amount, decimals), from, to);
        }
        Command::SetFee { basis_points } => {
            host.set_fee_percent(caller(&cli)?, *basis_points)?;
            println!("fee set to {} basis points", basis_points);
        }
        Command::Freeze => {
            host.freeze_contract(caller(&cli)?)?;
            println!("transfers are now disabled");
        }
        Command::TransferOwnership { new_owner } => {
            host.transfer_ownership(caller(&cli)?, *new_owner)?;
            println!("ownership transferred to {}", new_owner);
        }
        Command::Claim => {
            let reward = host.claim_reward(caller(&cli)?)?;
            println!("claimed {}", format_units(reward, decimals));
        }
        Command::Balance { address } => {
            let ledger = host.ledger();
            println!("{} {}", format_units(ledger.balance_of(address), decimals), ledger.symbol());
            println!("pending reward: {}", format_units(ledger.pending_reward(address, host.now()), decimals));
        }
        Command::Info => print_info(&host),
        Command::Events { limit } => {
            for record in host.store().recent_events(*limit)? {
                println!("{} {}", record.timestamp, describe(&record.event, decimals));
            }
        }
        Command::Keygen | Command::Init { .. } => unreachable!("handled above"),
    }

    host.store().flush()?;
    Ok(())
}

fn caller(cli: &Cli) -> Result<Address> {
    if let Some(secret) = &cli.key {
        let keypair = Keypair::from_hex(secret).context("invalid --key secret")?;
        return Ok(keypair.address());
    }
    cli.from
        .context("--from <ADDRESS> or --key <SECRET> (TOKEN_CALLER / TOKEN_KEY) is required for this command")
}

fn amount_arg(text: &str, decimals: u8, raw: bool) -> Result<Amount> {
    if raw {
        return text.trim().parse::<Amount>().with_context(|| format!("invalid raw amount {:?}", text));
    }
    Ok(parse_units(text, decimals)?)
}

fn print_info(host: &TokenHost<SystemClock>) {
    let ledger = host.ledger();
    let decimals = ledger.decimals();
    println!("name:          {} ({})", ledger.name(), ledger.symbol());
    println!("owner:         {}", ledger.owner());
    println!("total supply:  {}", format_units(ledger.total_supply(), decimals));
    println!("cap:           {}", format_units(ledger.cap(), decimals));
    println!("fee:           {} bps", ledger.fee_percent());
    println!("frozen:        {}", ledger.is_frozen());
    println!("reward rate:   {} ppm/s", ledger.reward_rate_per_second());
    println!("holders:       {}", ledger.accounts().count());
    println!("state root:    {}", hex::encode(ledger.state_root()));
}

fn describe(event: &LedgerEvent, decimals: u8) -> String {
    match event {
        LedgerEvent::Transfer { from: None, to, value } => {
            format!("mint {} -> {}", format_units(*value, decimals), to)
        }
        LedgerEvent::Transfer { from: Some(from), to, value } => {
            format!("transfer {} {} -> {}", format_units(*value, decimals), from, to)
        }
        LedgerEvent::FeeCollected { from, recipient, fee } => {
            format!("fee {} {} -> {}", format_units(*fee, decimals), from, recipient)
        }
        LedgerEvent::FeeUpdated { previous, current } => format!("fee updated {} -> {} bps", previous, current),
        LedgerEvent::Frozen { by } => format!("frozen by {}", by),
        LedgerEvent::OwnershipTransferred { previous, new_owner } => {
            format!("ownership {} -> {}", previous, new_owner)
        }
        LedgerEvent::RewardClaimed { holder, reward, elapsed } => {
            format!("reward {} to {} after {}s", format_units(*reward, decimals), holder, elapsed)
        }
    }
}
