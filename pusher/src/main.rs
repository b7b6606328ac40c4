#![warn(rust_2018_idioms)]

use anyhow::{Context, Result};
use structopt::StructOpt;
use structopt_flags::LogLevel;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use std::fs::File;
use std::io::{self, BufRead, BufReader, Lines};
use std::iter::Enumerate;
use std::path::Path;

use h2push::utils::DurationExt;
use h2push::{Notification, PushClient, TlsSession};

mod opt;

use crate::opt::{BatchOpt, Cmd, Opt, SendOpt};

#[tokio::main]
async fn main() -> Result<()> {
    let opt = Opt::from_args();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(opt.verbose.get_level_filter().to_string().to_lowercase())
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let config = opt.conn.build_config();
    info!(
        "pushing to {} with identity {}",
        config.authority(),
        config.cert_file.display()
    );
    let client = PushClient::from_config(&config)
        .with_context(|| format!("failed to load identity {}", config.cert_file.display()))?;

    match opt.cmd {
        Cmd::Send(opt) => run_send(client, opt).await,
        Cmd::Batch(opt) => run_batch(client, opt).await,
    }
}

async fn run_send(mut client: PushClient<TlsSession>, opt: SendOpt) -> Result<()> {
    let t = Instant::now();
    let delivery = &opt.delivery;
    client
        .send_notification(
            &opt.token,
            &opt.payload,
            &delivery.topic,
            delivery.priority,
            delivery.expiration,
        )
        .await
        .with_context(|| format!("failed to push to {}", &opt.token))?;
    info!("pushed to {} within {}", &opt.token, t.elapsed().autofmt());
    println!("Success");
    Ok(())
}

async fn run_batch(
    mut client: PushClient<TlsSession>,
    opt: BatchOpt,
) -> Result<()> {
    let mut notifications = open_notifications(&opt.input)
        .with_context(|| format!("failed to open {}", opt.input.display()))?;

    let t = Instant::now();
    let delivery = &opt.delivery;
    let results = client
        .send_notification_batch(
            &mut notifications,
            &delivery.topic,
            delivery.priority,
            delivery.expiration,
        )
        .await;
    if let Some(error) = notifications.take_error() {
        return Err(error)
            .with_context(|| format!("batch stopped reading {}", opt.input.display()));
    }
    let results = results.context("batch aborted")?;

    let failed = results.values().filter(|o| !o.is_success()).count();
    info!(
        tokens = results.len(),
        failed,
        max_concurrent_streams = client.max_concurrent_streams(),
        "batch done within {}",
        t.elapsed().autofmt()
    );
    if failed > 0 {
        warn!("{} of {} tokens were rejected", failed, results.len());
    }

    let report: serde_json::Map<String, serde_json::Value> = results
        .into_iter()
        .map(|(token, outcome)| (token, outcome.to_string().into()))
        .collect();
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Open newline-delimited JSON notifications in a file, or standard input for `-`
fn open_notifications(path: &Path) -> Result<NotificationLines<Box<dyn BufRead>>> {
    let reader: Box<dyn BufRead> = if path == Path::new("-") {
        Box::new(BufReader::new(io::stdin()))
    } else {
        Box::new(BufReader::new(File::open(path)?))
    };
    Ok(NotificationLines::new(reader))
}

/// Notifications parsed one line at a time as the batch pulls them
///
/// Iteration ends at the first unreadable or invalid line, whose error is then kept for
/// [`NotificationLines::take_error`].
struct NotificationLines<R> {
    lines: Enumerate<Lines<R>>,
    error: Option<anyhow::Error>,
}

impl<R: BufRead> NotificationLines<R> {
    fn new(reader: R) -> Self {
        Self {
            lines: reader.lines().enumerate(),
            error: None,
        }
    }

    fn take_error(&mut self) -> Option<anyhow::Error> {
        self.error.take()
    }

    fn parse(i: usize, line: io::Result<String>) -> Result<Option<Notification>> {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let notification: Notification = serde_json::from_str(line)
            .with_context(|| format!("invalid notification at line {}", i + 1))?;
        debug!(token = %notification.token, "loaded");
        Ok(Some(notification))
    }
}

impl<R: BufRead> Iterator for NotificationLines<R> {
    type Item = Notification;

    fn next(&mut self) -> Option<Notification> {
        if self.error.is_some() {
            return None;
        }
        for (i, line) in self.lines.by_ref() {
            match Self::parse(i, line) {
                Ok(Some(notification)) => return Some(notification),
                Ok(None) => continue,
                Err(e) => {
                    self.error = Some(e);
                    return None;
                }
            }
        }
        None
    }
}
