//! Delay-stage binary command codec.
//!
//! Reference: Zaber Binary protocol.
//!
//! Protocol overview:
//! - Format: `[Device][Command][Data]`, exactly 6 bytes per command
//! - Device: 1-254, or 0 to broadcast to every device on the chain
//! - Data: signed 32-bit integer, little-endian two's complement
//! - No framing bytes; the fixed length is the frame boundary
//!
//! Only the two commands the sweep needs are encoded here: home (command 1,
//! zero payload) and move absolute (command 20, position in device counts).
//! The codec is stateless and returns the raw frame; settle delays and
//! transport failure detection are the caller's concern.

/// Broadcast device address understood by all devices on the chain.
pub const BROADCAST_DEVICE: u8 = 0;

/// Command 1: return the device to its reference position.
pub const CMD_HOME: u8 = 1;

/// Command 20: move to an absolute position given in device counts.
pub const CMD_MOVE_ABSOLUTE: u8 = 20;

/// Fixed length of every command frame.
pub const FRAME_LEN: usize = 6;

/// One encoded 6-byte command frame.
pub type CommandFrame = [u8; FRAME_LEN];

fn encode(device: u8, command: u8, data: i32) -> CommandFrame {
    let payload = data.to_le_bytes();
    [
        device, command, payload[0], payload[1], payload[2], payload[3],
    ]
}

/// Encode a home command for `device` (no payload).
pub fn encode_home(device: u8) -> CommandFrame {
    encode(device, CMD_HOME, 0)
}

/// Encode an absolute move of `device` to `counts`.
pub fn encode_move_absolute(device: u8, counts: i32) -> CommandFrame {
    encode(device, CMD_MOVE_ABSOLUTE, counts)
}
