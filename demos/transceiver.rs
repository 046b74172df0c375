// ABOUTME: Transceiver demo: binds, optionally sends one (possibly long) message, prints inbound traffic
// ABOUTME: Runs until the SMSC unbinds, the run duration elapses, or the connection drops

//! # SMPP transceiver demo
//!
//! ```bash
//! # Listen for MO messages and delivery reports for five minutes
//! cargo run --example transceiver -- --system-id test --password secret
//!
//! # Send a message first, with a delivery receipt requested
//! cargo run --example transceiver -- \
//!   --system-id test --password secret \
//!   --to 447700900123 --from 7726 --message "Hello from Rust" --receipt
//! ```

use argh::FromArgs;
use smpp_transceiver::datatypes::{CommandStatus, DataCoding, DeliverSm, ReportType};
use smpp_transceiver::{
    Connection, Correlation, MessageOptions, SessionConfig, SessionDelegate, SmppError,
};
use std::error::Error;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// SMPP transceiver demo
#[derive(FromArgs)]
struct CliArgs {
    /// whether or not to enable debugging
    #[argh(switch, short = 'd')]
    debugging: bool,

    /// the system id
    #[argh(option)]
    system_id: Option<String>,

    /// the password
    #[argh(option)]
    password: Option<String>,

    /// the hostname of IP address of the SMSC (default: localhost)
    #[argh(option)]
    host: Option<String>,

    /// the port to use when connecting to the SMSC (default: 2775)
    #[argh(option, short = 'p')]
    port: Option<u32>,

    /// enquire_link interval in seconds (default: 30)
    #[argh(option)]
    keep_alive_interval: Option<u64>,

    /// how long to stay connected in seconds (default: 300)
    #[argh(option)]
    run_duration: Option<u64>,

    /// the recipient telephone number (no message is sent without it)
    #[argh(option, short = 't')]
    to: Option<String>,

    /// the telephone number that the message will be from
    #[argh(option, short = 'f')]
    from: Option<String>,

    /// the message text; longer than one SMS is sent in parts
    #[argh(option, short = 'm')]
    message: Option<String>,

    /// send the message as UCS-2
    #[argh(switch)]
    ucs2: bool,

    /// request an SMSC delivery receipt
    #[argh(switch)]
    receipt: bool,
}

/// Logs every event and publishes the bound flag.
struct Printer {
    bound: watch::Sender<bool>,
}

impl SessionDelegate for Printer {
    fn on_bound(&mut self, system_id: &str) {
        info!("Bound to {system_id}");
        let _ = self.bound.send(true);
    }

    fn on_unbound(&mut self) {
        info!("Unbound");
        let _ = self.bound.send(false);
    }

    fn on_mo_received(&mut self, pdu: &DeliverSm) {
        info!(
            "MO from {}: {}",
            pdu.source,
            String::from_utf8_lossy(&pdu.short_message)
        );
    }

    fn on_delivery_report_received(&mut self, pdu: &DeliverSm, report_type: ReportType) {
        info!(
            "{report_type:?} for {:?}: {}",
            pdu.receipted_message_id(),
            String::from_utf8_lossy(&pdu.short_message)
        );
    }

    fn on_message_accepted(&mut self, correlation: &Correlation, message_id: &str) {
        info!("{correlation:?} accepted, SMSC message id {message_id}");
    }

    fn on_message_rejected(&mut self, correlation: &Correlation, status: CommandStatus) {
        warn!("{correlation:?} rejected: {status:?}");
    }

    fn on_invalid_credentials(&mut self) {
        error!("Bind refused: invalid password");
    }

    fn on_invalid_system_id(&mut self) {
        error!("Bind refused: invalid system id");
    }

    fn on_unexpected_error(&mut self, error: &SmppError) {
        error!("{error}");
    }

    fn on_timeout(&mut self, sequence_number: u32, correlation: Option<&Correlation>) {
        warn!("No response to sequence {sequence_number} ({correlation:?})");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli_args: CliArgs = argh::from_env();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if cli_args.debugging { Level::DEBUG } else { Level::INFO })
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let host = cli_args.host.unwrap_or_else(|| "localhost".to_owned());
    let port = cli_args.port.unwrap_or(2775);
    let run_duration = Duration::from_secs(cli_args.run_duration.unwrap_or(300));

    let config = SessionConfig::new(
        cli_args.system_id.unwrap_or_default(),
        cli_args.password.unwrap_or_default(),
    )
    .with_enquire_link_interval(Duration::from_secs(cli_args.keep_alive_interval.unwrap_or(30)));

    info!("Connecting to {host}:{port}");
    let (bound_tx, mut bound) = watch::channel(false);
    let (connection, handle) =
        Connection::connect(format!("{host}:{port}"), config, Printer { bound: bound_tx }).await?;
    let mut driver = tokio::spawn(connection.run());

    tokio::select! {
        result = bound.wait_for(|bound| *bound) => {
            result?;
        }
        _ = &mut driver => {
            error!("Connection closed before bind completed");
            return Ok(());
        }
    }

    if let (Some(to), Some(text)) = (cli_args.to, cli_args.message) {
        let from = cli_args.from.unwrap_or_default();
        let mut options = MessageOptions::default();
        if cli_args.ucs2 {
            options = options
                .with_data_coding(DataCoding::Ucs2)
                .with_emoji_aware(true);
        }
        if cli_args.receipt {
            options = options.with_registered_delivery(1);
        }

        let parts = handle.send_long_message(1, from, to, text, options).await?;
        info!("Submitted in {} part(s)", parts.len());
    }

    tokio::select! {
        _ = sleep(run_duration) => {
            info!("Run duration elapsed, unbinding");
            if let Err(e) = handle.send_unbind().await {
                warn!("Unbind failed: {e}");
                handle.close().await.ok();
            }
            (&mut driver).await?;
        }
        _ = &mut driver => {
            info!("Connection closed");
        }
    }

    Ok(())
}
