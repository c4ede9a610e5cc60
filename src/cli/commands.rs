use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;

/// Fee schedule a local node charges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeesArg {
    Default,
    Free,
}

impl FromStr for FeesArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "default" => Ok(FeesArg::Default),
            "free" => Ok(FeesArg::Free),
            _ => Err(format!("Invalid fee schedule: {s}. Valid options: default, free")),
        }
    }
}

impl std::fmt::Display for FeesArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeesArg::Default => write!(f, "default"),
            FeesArg::Free => write!(f, "free"),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "testnet-fixtures")]
pub struct Opt {
    /// Fixture settings file (TOML); TESTNET_* variables still apply on top
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(name = "start-testnet", about = "Run a local test network node")]
    StartTestnet {
        #[arg(long, default_value = "127.0.0.1:8090", help = "Address to listen on")]
        listen: String,
        #[arg(long, help = "Write the genesis private keys to this file")]
        keyfile: Option<PathBuf>,
        #[arg(long, help = "Genesis JSON; a single-account genesis is generated otherwise")]
        genesis: Option<PathBuf>,
        #[arg(long, help = "Keep chain state in this directory instead of a temporary store")]
        data_dir: Option<PathBuf>,
        #[arg(long, default_value_t = FeesArg::Default, help = "Fee schedule: default or free")]
        fees: FeesArg,
    },
    #[command(
        name = "bootstrap",
        about = "Connect, claim the genesis balance and create the default assets"
    )]
    Bootstrap,
    #[command(name = "unused-asset", about = "Print an asset symbol nobody uses yet")]
    UnusedAsset,
    #[command(name = "unused-account", about = "Print an account name nobody uses yet")]
    UnusedAccount,
    #[command(name = "balances", about = "Print the balances of an account")]
    Balances {
        #[arg(help = "Account name or id")]
        account: String,
    },
    #[command(name = "genkey", about = "Generate a key pair")]
    Genkey,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_start_testnet() {
        let opt = Opt::try_parse_from([
            "testnet-fixtures",
            "start-testnet",
            "--listen",
            "127.0.0.1:0",
            "--fees",
            "free",
        ])
        .unwrap();
        match opt.command {
            Command::StartTestnet {
                listen,
                fees,
                keyfile,
                ..
            } => {
                assert_eq!(listen, "127.0.0.1:0");
                assert_eq!(fees, FeesArg::Free);
                assert!(keyfile.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_global_config_flag() {
        let opt =
            Opt::try_parse_from(["testnet-fixtures", "balances", "init0", "--config", "t.toml"])
                .unwrap();
        assert_eq!(opt.config, Some(PathBuf::from("t.toml")));
        assert!(matches!(opt.command, Command::Balances { account } if account == "init0"));
    }

    #[test]
    fn test_invalid_fees_rejected() {
        assert!("cheap".parse::<FeesArg>().is_err());
        assert!(Opt::try_parse_from(["testnet-fixtures", "start-testnet", "--fees", "cheap"]).is_err());
    }
}
