//! FTMS Fitness Machine Control Point (0x2AD9) procedures.
//!
//! Only the mandatory subset is implemented: Request Control, Reset,
//! Start or Resume and Stop or Pause. Each write is validated first; the
//! training state only changes (and notifications are only produced) when the
//! result is Success.

use log::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OpCode {
    RequestControl = 0x00,
    Reset = 0x01,
    StartOrResume = 0x07,
    StopOrPause = 0x08,
}

impl OpCode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(Self::RequestControl),
            0x01 => Some(Self::Reset),
            0x07 => Some(Self::StartOrResume),
            0x08 => Some(Self::StopOrPause),
            _ => None,
        }
    }

    /// Exact write length (opcode included) the procedure accepts.
    fn expected_len(self) -> usize {
        match self {
            Self::StopOrPause => 2,
            _ => 1,
        }
    }
}

/// Result codes (FTMS spec Table 4.24).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ResultCode {
    Success = 0x01,
    NotSupported = 0x02,
    InvalidParameter = 0x03,
}

/// Stop or Pause parameter values.
pub const STOP: u8 = 0x01;
pub const PAUSE: u8 = 0x02;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TrainingState {
    #[default]
    Idle,
    ManualMode,
}

impl TrainingState {
    /// Training Status value (FTMS spec Table 4.25).
    pub fn status_value(self) -> u8 {
        match self {
            Self::Idle => 0x01,
            Self::ManualMode => 0x0D, // Manual Mode (Quick Start)
        }
    }
}

/// A raw control point write: opcode plus parameter bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlPointCommand {
    pub opcode: u8,
    pub params: Vec<u8>,
}

impl ControlPointCommand {
    pub fn new(opcode: u8, params: &[u8]) -> Self {
        Self {
            opcode,
            params: params.to_vec(),
        }
    }

    /// Split a write into opcode and parameters. Empty writes carry no
    /// opcode and are not commands.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let (&opcode, params) = bytes.split_first()?;
        Some(Self::new(opcode, params))
    }

    /// Total write length, opcode included.
    pub fn write_len(&self) -> usize {
        1 + self.params.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlPointResult {
    pub result_code: ResultCode,
    /// Always the opcode that was written, even on failure.
    pub echoed_opcode: u8,
}

/// Side effects the transport must notify after a successful command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    TrainingStatus(TrainingState),
}

#[derive(Debug, Default)]
pub struct ControlPointStateMachine {
    state: TrainingState,
    stop_or_pause: u8,
}

impl ControlPointStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> TrainingState {
        self.state
    }

    /// Parameter of the last successful Stop or Pause, 0 if none yet.
    pub fn stop_or_pause_flag(&self) -> u8 {
        self.stop_or_pause
    }

    pub fn handle_command(
        &mut self,
        cmd: &ControlPointCommand,
    ) -> (ControlPointResult, Vec<Notification>) {
        let result = |result_code| ControlPointResult {
            result_code,
            echoed_opcode: cmd.opcode,
        };

        let Some(op) = OpCode::from_u8(cmd.opcode) else {
            warn!("FTMS: unsupported control point opcode 0x{:02x}", cmd.opcode);
            return (result(ResultCode::NotSupported), Vec::new());
        };

        if cmd.write_len() != op.expected_len() {
            warn!(
                "FTMS: {:?} with {} bytes, expected {}",
                op,
                cmd.write_len(),
                op.expected_len()
            );
            return (result(ResultCode::InvalidParameter), Vec::new());
        }

        let notifications = match op {
            OpCode::RequestControl => {
                info!("FTMS: client requested control");
                Vec::new()
            }
            OpCode::Reset => {
                info!("FTMS: reset");
                self.transition(TrainingState::Idle)
            }
            OpCode::StartOrResume => {
                info!("FTMS: start/resume");
                self.transition(TrainingState::ManualMode)
            }
            OpCode::StopOrPause => {
                let param = cmd.params[0];
                if param != STOP && param != PAUSE {
                    warn!("FTMS: stop/pause with invalid param={}", param);
                    return (result(ResultCode::InvalidParameter), Vec::new());
                }
                info!("FTMS: stop/pause (param={})", param);
                self.stop_or_pause = param;
                self.transition(TrainingState::Idle)
            }
        };

        (result(ResultCode::Success), notifications)
    }

    fn transition(&mut self, next: TrainingState) -> Vec<Notification> {
        self.state = next;
        vec![Notification::TrainingStatus(next)]
    }
}
