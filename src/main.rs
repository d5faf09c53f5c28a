//! `custody` - drive a custodial balance ledger from the command line.
//!
//! ```bash
//! custody init --operator owner --fee-recipient company --fee-bps 10
//! custody deposit --caller bob 1
//! custody send --caller bob --to alice 0.4
//! custody withdraw --caller alice 0.1
//! custody set-fee --caller owner 25
//! custody balance company
//! ```

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use custody_core::{
    units::{format_units, parse_units},
    Amount, Ledger, LedgerGenesis, RecordedPayouts,
};

mod store;

#[derive(Parser)]
#[command(name = "custody")]
#[command(author, version, about = "Custodial balance ledger with proportional transfer fees", long_about = None)]
struct Cli {
    /// Ledger state file
    #[arg(long, default_value = "ledger.json", global = true)]
    state: PathBuf,

    /// Append-only log of withdrawal payouts (JSON lines)
    #[arg(long, default_value = "payouts.jsonl", global = true)]
    payouts: PathBuf,

    /// Read and print amounts as integer base units instead of decimal units
    #[arg(long, global = true)]
    raw: bool,

    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new ledger state file
    Init {
        #[arg(long)]
        operator: String,
        #[arg(long)]
        fee_recipient: String,
        /// Initial fee rate in basis points (1 bps = 0.01%)
        #[arg(long, default_value_t = 10)]
        fee_bps: u32,
    },

    /// Credit the caller with attached value
    Deposit {
        #[arg(long)]
        caller: String,
        amount: String,
    },

    /// Debit the caller and pay the value out
    Withdraw {
        #[arg(long)]
        caller: String,
        amount: String,
    },

    /// Transfer to another account, minus the fee
    Send {
        #[arg(long)]
        caller: String,
        #[arg(long)]
        to: String,
        amount: String,
    },

    /// Change the fee rate (operator only)
    SetFee {
        #[arg(long)]
        caller: String,
        bps: u32,
    },

    /// Show an account balance
    Balance { account: String },

    /// Show operator, fee configuration and totals
    Info,

    /// Print the event log as JSON lines
    Events,
}

fn init_tracing(format: LogFormat) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Json => subscriber.json().init(),
        LogFormat::Text => subscriber.init(),
    }
}

struct Render {
    raw: bool,
}

impl Render {
    fn parse(&self, input: &str) -> Result<Amount> {
        if self.raw {
            input
                .trim()
                .parse()
                .with_context(|| format!("invalid base-unit amount {input:?}"))
        } else {
            Ok(parse_units(input)?)
        }
    }

    fn show(&self, amount: Amount) -> String {
        if self.raw {
            amount.to_string()
        } else {
            format_units(amount)
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);
    run(cli)
}

fn run(cli: Cli) -> Result<()> {
    let render = Render { raw: cli.raw };

    match cli.command {
        Commands::Init {
            operator,
            fee_recipient,
            fee_bps,
        } => {
            if cli.state.exists() {
                bail!("state file {} already exists", cli.state.display());
            }
            let ledger = Ledger::initialize(LedgerGenesis {
                operator,
                fee_recipient,
                fee_basis_points: fee_bps,
            })?;
            store::save(&cli.state, &ledger)?;
            println!("initialized → {}", cli.state.display());
        }

        Commands::Deposit { caller, amount } => {
            let amount = render.parse(&amount)?;
            let mut ledger = store::load(&cli.state)?;
            ledger.deposit(&caller, amount)?;
            store::save(&cli.state, &ledger)?;
            println!("{caller}: {}", render.show(ledger.balance_of(&caller)));
        }

        Commands::Withdraw { caller, amount } => {
            let amount = render.parse(&amount)?;
            let mut ledger = store::load(&cli.state)?;
            let mut payouts = RecordedPayouts::new();
            ledger.withdraw(&caller, amount, &mut payouts)?;
            // the debit reaches disk before any payout is released
            store::save(&cli.state, &ledger)?;
            let root = hex_root(&ledger);
            store::append_payouts(&cli.payouts, &payouts.transfers, &root)?;
            println!("{caller}: {}", render.show(ledger.balance_of(&caller)));
        }

        Commands::Send { caller, to, amount } => {
            let amount = render.parse(&amount)?;
            let mut ledger = store::load(&cli.state)?;
            let quote = ledger.send_to(&caller, &to, amount)?;
            store::save(&cli.state, &ledger)?;
            println!(
                "sent {} to {to} (fee {} → {})",
                render.show(quote.net),
                render.show(quote.fee),
                ledger.fee_recipient()
            );
        }

        Commands::SetFee { caller, bps } => {
            let mut ledger = store::load(&cli.state)?;
            let rate = ledger.set_basis_point(&caller, bps)?;
            store::save(&cli.state, &ledger)?;
            println!("fee rate: {rate}");
        }

        Commands::Balance { account } => {
            let ledger = store::load(&cli.state)?;
            println!("{account}: {}", render.show(ledger.balance_of(&account)));
        }

        Commands::Info => {
            let ledger = store::load(&cli.state)?;
            println!("operator:      {}", ledger.operator());
            println!("fee recipient: {}", ledger.fee_recipient());
            println!("fee rate:      {}", ledger.fee_basis_points());
            println!("custody:       {}", render.show(ledger.total_custody()));
            println!("accounts:      {}", ledger.accounts().count());
            println!("state root:    {}", hex_root(&ledger));
        }

        Commands::Events => {
            let ledger = store::load(&cli.state)?;
            for event in ledger.events() {
                println!("{}", serde_json::to_string(event)?);
            }
        }
    }
    Ok(())
}

fn hex_root(ledger: &Ledger) -> String {
    hex::encode(ledger.state_root())
}
