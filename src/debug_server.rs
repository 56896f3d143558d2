//! TCP debug console for driving the bike without BLE hardware.
//!
//! Listens on a TCP port (default 8826) and accepts line-based text commands
//! with hex-encoded binary payloads, mirroring exactly what a BLE FTMS client
//! would write/read via GATT characteristics.
//!
//! Usage from dev machine:
//!   nc <host> 8826
//!
//! Commands:
//!   state           → human-readable bike state
//!   ibd             → indoor bike data (0x2AD2) as hex
//!   feat            → feature (0x2ACC) as hex
//!   ts              → training status (0x2AD3) as hex
//!   cp <hex>        → write to control point (0x2AD9), returns response hex
//!   pulse           → inject one crank edge at the current time
//!   res <n>         → set resistance level * 10 (clamped to 10..80)
//!   res+ / res-     → step resistance by one level
//!   sub             → stream indoor bike data on every metrics update
//!   help            → list commands

use std::sync::Arc;

use log::info;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{watch, Mutex};

use crate::bike::{BikeEvent, BikeOutput, IndoorBike};
use crate::clock::Clock;
use crate::control_point::{ControlPointCommand, OpCode, ResultCode};
use crate::metrics::Metrics;
use crate::protocol;

pub const PROMPT: &str = "stepbit-debug> ";

type DynError = Box<dyn std::error::Error + Send + Sync>;

/// Handles shared by every console client.
#[derive(Clone)]
pub struct DebugContext {
    pub bike: Arc<Mutex<IndoorBike>>,
    pub clock: Arc<dyn Clock>,
    pub metrics_rx: watch::Receiver<Metrics>,
}

/// Bind the debug port and serve clients until an accept error.
pub async fn run(ctx: DebugContext, port: u16) -> Result<(), DynError> {
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    info!("Debug server listening on port {}", port);
    serve(listener, ctx).await
}

pub async fn serve(listener: TcpListener, ctx: DebugContext) -> Result<(), DynError> {
    loop {
        let (stream, addr) = listener.accept().await?;
        info!("Debug client connected from {}", addr);

        let ctx = ctx.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_client(stream, ctx).await {
                info!("Debug client {} disconnected: {}", addr, e);
            }
        });
    }
}

async fn handle_client(stream: TcpStream, ctx: DebugContext) -> Result<(), DynError> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    writer
        .write_all(b"stepbit-debug> connected. type 'help' for commands.\n")
        .await?;

    loop {
        writer.write_all(PROMPT.as_bytes()).await?;

        let Some(line) = lines.next_line().await? else {
            return Ok(()); // EOF
        };
        let line = line.trim().to_lowercase();
        if line.is_empty() {
            continue;
        }

        let response = match line.split_once(' ') {
            Some(("cp", hex)) => handle_cp(hex.trim(), &ctx).await,
            Some(("res", value)) => handle_set_resistance(value.trim(), &ctx).await,
            _ => match line.as_str() {
                "help" => Ok(HELP_TEXT.to_string()),
                "state" => handle_state(&ctx).await,
                "ibd" => handle_ibd(&ctx).await,
                "feat" => Ok(format!("feat {}", hex_encode(&protocol::encode_feature()))),
                "ts" => {
                    let state = ctx.bike.lock().await.training_state();
                    Ok(format!("ts {}", hex_encode(&protocol::encode_training_status(state))))
                }
                "pulse" => {
                    let ts = ctx.clock.now_us();
                    ctx.bike.lock().await.dispatch(BikeEvent::PulseDetected(ts));
                    Ok(format!("pulse at {}us", ts))
                }
                "res+" => Ok(format!("resistance {}", ctx.bike.lock().await.step_resistance(1))),
                "res-" => Ok(format!("resistance {}", ctx.bike.lock().await.step_resistance(-1))),
                "sub" => {
                    handle_subscribe(&ctx, &mut writer).await?;
                    continue; // subscribe handles its own output
                }
                "quit" | "exit" => return Ok(()),
                _ => Ok(format!("unknown command: '{}'. type 'help'.", line)),
            },
        };

        match response {
            Ok(msg) => {
                writer.write_all(msg.as_bytes()).await?;
                writer.write_all(b"\n").await?;
            }
            Err(e) => {
                writer
                    .write_all(format!("error: {}\n", e).as_bytes())
                    .await?;
            }
        }
    }
}

async fn handle_state(ctx: &DebugContext) -> Result<String, DynError> {
    let bike = ctx.bike.lock().await;
    let m = bike.metrics();
    Ok(format!(
        "interval:   {}us\n\
         cadence:    {:.1} rpm  [raw: {}]\n\
         speed:      {:.2} km/h  [raw: {}]\n\
         power:      {}W\n\
         resistance: {:.1}  [raw: {}]\n\
         training:   {:?}\n\
         stop_pause: {}",
        m.interval_us,
        m.cadence_x2 as f64 / 2.0,
        m.cadence_x2,
        m.speed_x100 as f64 / 100.0,
        m.speed_x100,
        m.power_w,
        bike.resistance_level() as f64 / 10.0,
        bike.resistance_level(),
        bike.training_state(),
        bike.stop_or_pause_flag(),
    ))
}

async fn handle_ibd(ctx: &DebugContext) -> Result<String, DynError> {
    let m = ctx.bike.lock().await.metrics();
    Ok(format!(
        "data {} (speed={} cadence={} power={})",
        hex_encode(&protocol::encode_indoor_bike_data(&m)),
        m.speed_x100,
        m.cadence_x2,
        m.power_w,
    ))
}

async fn handle_set_resistance(value: &str, ctx: &DebugContext) -> Result<String, DynError> {
    let level: i64 = value.parse()?;
    let mut bike = ctx.bike.lock().await;
    bike.set_resistance_level(level.clamp(0, u8::MAX as i64) as u8);
    Ok(format!("resistance {}", bike.resistance_level()))
}

async fn handle_cp(hex: &str, ctx: &DebugContext) -> Result<String, DynError> {
    let bytes = hex_decode(hex)?;
    let Some(cmd) = ControlPointCommand::from_bytes(&bytes) else {
        return Ok("error: empty control point data".to_string());
    };

    let description = describe_opcode(cmd.opcode, &cmd.params);
    let output = ctx
        .bike
        .lock()
        .await
        .dispatch(BikeEvent::ControlPointCommandReceived(cmd));

    let BikeOutput::ControlPoint {
        result,
        notifications,
    } = output
    else {
        return Err("control point produced no response".into());
    };

    let mut out = format!(
        "parsed: {}\nresp {}",
        description,
        hex_encode(&protocol::encode_control_response(&result))
    );
    for notification in &notifications {
        let (uuid, payload) = protocol::encode_notification(notification);
        out.push_str(&format!("\nnotify {} {}", uuid, hex_encode(&payload)));
    }
    if result.result_code != ResultCode::Success {
        out.push_str(&format!("\nwarning: {:?}", result.result_code));
    }
    Ok(out)
}

fn describe_opcode(opcode: u8, params: &[u8]) -> String {
    match OpCode::from_u8(opcode) {
        Some(OpCode::RequestControl) => "Request Control".to_string(),
        Some(OpCode::Reset) => "Reset".to_string(),
        Some(OpCode::StartOrResume) => "Start/Resume".to_string(),
        Some(OpCode::StopOrPause) => match params.first() {
            Some(p) => format!("Stop/Pause (param={})", p),
            None => "Stop/Pause (no param)".to_string(),
        },
        None => format!("unknown opcode 0x{:02x}", opcode),
    }
}

async fn handle_subscribe(
    ctx: &DebugContext,
    writer: &mut tokio::net::tcp::OwnedWriteHalf,
) -> Result<(), DynError> {
    let mut rx = ctx.metrics_rx.clone();
    rx.borrow_and_update();

    writer
        .write_all(b"subscribed to indoor bike data updates. ctrl-c to stop.\n")
        .await?;

    while rx.changed().await.is_ok() {
        let m = *rx.borrow_and_update();
        let line = format!(
            "data {} | {:.1}rpm {:.2}km/h {}W\n",
            hex_encode(&protocol::encode_indoor_bike_data(&m)),
            m.cadence_x2 as f64 / 2.0,
            m.speed_x100 as f64 / 100.0,
            m.power_w,
        );

        if writer.write_all(line.as_bytes()).await.is_err() {
            break;
        }
    }

    Ok(())
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect::<Vec<_>>().join("")
}

fn hex_decode(hex: &str) -> Result<Vec<u8>, DynError> {
    let hex = hex.replace(' ', "");
    if !hex.is_ascii() {
        return Err("hex string must be ascii".into());
    }
    if hex.len() % 2 != 0 {
        return Err("hex string must have even length".into());
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| -> DynError { Box::new(e) }))
        .collect()
}

const HELP_TEXT: &str = "\
commands:
  state           show current bike state (human-readable)
  ibd             read indoor bike data characteristic (0x2AD2) as hex
  feat            read feature characteristic (0x2ACC) as hex
  ts              read training status characteristic (0x2AD3) as hex
  cp <hex>        write to control point (0x2AD9), execute + show response
  pulse           inject one crank edge now
  res <n>         set resistance level * 10 (10..80)
  res+ / res-     step resistance up / down one level
  sub             stream indoor bike data on every update
  help            this message
  quit            disconnect

control point examples:
  cp 00           Request Control
  cp 01           Reset
  cp 07           Start or Resume
  cp 08 01        Stop
  cp 08 02        Pause

all values are little-endian hex, matching raw BLE GATT writes.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_roundtrip() {
        assert_eq!(hex_decode("08 02").unwrap(), vec![0x08, 0x02]);
        assert_eq!(hex_decode("").unwrap(), Vec::<u8>::new());
        assert_eq!(hex_encode(&[0x80, 0x07, 0x01]), "800701");
    }

    #[test]
    fn test_hex_decode_errors() {
        assert!(hex_decode("0").is_err());
        assert!(hex_decode("zz").is_err());
        assert!(hex_decode("a€").is_err());
        assert!(hex_decode("€€").is_err());
    }

    #[test]
    fn test_describe_opcode() {
        assert_eq!(describe_opcode(0x07, &[]), "Start/Resume");
        assert_eq!(describe_opcode(0x08, &[0x02]), "Stop/Pause (param=2)");
        assert_eq!(describe_opcode(0x08, &[]), "Stop/Pause (no param)");
        assert_eq!(describe_opcode(0x42, &[]), "unknown opcode 0x42");
    }
}
