use structopt::clap::AppSettings::{ColoredHelp, DeriveDisplayOrder};
use structopt::StructOpt;
use structopt_flags::QuietVerbose;

use std::fmt::Debug;
use std::path::PathBuf;

use h2push::{ClientConfig, Environment, Priority};

#[derive(Debug, Clone, StructOpt)]
#[structopt(name = "pusher", about = "Push notifications over a single HTTP/2 connection", global_settings(&[ColoredHelp, DeriveDisplayOrder]))]
pub struct Opt {
    #[structopt(flatten)]
    pub verbose: QuietVerbose,

    #[structopt(flatten)]
    pub conn: ConnOpt,

    #[structopt(subcommand)]
    pub cmd: Cmd,
}

#[derive(Debug, Clone, StructOpt)]
pub enum Cmd {
    /// Send one notification
    Send(SendOpt),
    /// Send notifications read from a file, one JSON object {"token", "payload"} per line
    Batch(BatchOpt),
}

#[derive(Debug, Clone, StructOpt)]
pub struct ConnOpt {
    /// PEM file with the client certificate, and its private key unless --key is given
    #[structopt(short = "c", long = "cert", parse(from_os_str))]
    pub cert_file: PathBuf,

    /// PEM file with the private key of the client certificate
    #[structopt(short = "k", long = "key", parse(from_os_str))]
    pub key_file: Option<PathBuf>,

    /// Deliver to the development gateway
    #[structopt(long = "sandbox")]
    pub sandbox: bool,

    /// Connect to port 2197 instead of 443
    #[structopt(long = "alternative-port")]
    pub alternative_port: bool,

    /// Seconds to wait for the gateway's settings after connecting
    #[structopt(long = "settle-timeout", default_value = "5", value_name = "SECS")]
    pub settle_timeout: u64,
}

#[derive(Debug, Clone, StructOpt)]
pub struct DeliveryOpt {
    /// Topic of the notifications, typically the app's bundle ID
    #[structopt(short = "t", long = "topic")]
    pub topic: String,

    /// Delivery priority: immediate (10) or delayed (5)
    #[structopt(short = "p", long = "priority", default_value = "immediate")]
    pub priority: Priority,

    /// UNIX epoch seconds after which the gateway stops trying to deliver
    #[structopt(short = "e", long = "expiration")]
    pub expiration: Option<u64>,
}

#[derive(Debug, Clone, StructOpt)]
pub struct SendOpt {
    /// Device token, in hex
    #[structopt(name = "TOKEN")]
    pub token: String,

    /// Payload as a JSON object
    #[structopt(name = "PAYLOAD", parse(try_from_str = serde_json::from_str))]
    pub payload: serde_json::Value,

    #[structopt(flatten)]
    pub delivery: DeliveryOpt,
}

#[derive(Debug, Clone, StructOpt)]
pub struct BatchOpt {
    /// File to read notifications from, or - for standard input
    #[structopt(name = "FILE", parse(from_os_str))]
    pub input: PathBuf,

    #[structopt(flatten)]
    pub delivery: DeliveryOpt,
}

impl ConnOpt {
    pub fn build_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new(&self.cert_file);
        config.key_file = self.key_file.clone();
        config.environment = if self.sandbox {
            Environment::Sandbox
        } else {
            Environment::Production
        };
        config.use_alternative_port = self.alternative_port;
        config.settle_timeout = std::time::Duration::from_secs(self.settle_timeout);
        config
    }
}
