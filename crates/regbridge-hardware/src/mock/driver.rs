//! Mock bridge driver implementation for testing and development.
//!
//! This module provides a simulated bridge driver that answers register
//! requests from an in-memory register bank, records every driver call, and
//! can be told to fail in the ways real hardware does.

use crate::driver::{BridgeDriver, DriverOp, DriverResult};
use regbridge_core::{
    ProductField, QueueState, QueueStatus, RawHandle, StatusCode,
    constants::*,
};
use regbridge_protocol::Response;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A driver call recorded by [`MockBridgeDriver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverCall {
    DeviceCount,
    ProductString { index: u32, field: ProductField },
    SetTimeouts { read_ms: u32, write_ms: u32 },
    Open { index: u32 },
    Close { handle: RawHandle },
    FlushBuffers { handle: RawHandle },
    Write { handle: RawHandle, data: Vec<u8> },
    CheckRxQueue { handle: RawHandle },
    Read { handle: RawHandle, len: usize },
}

impl DriverCall {
    /// Driver operation this call corresponds to.
    pub fn op(&self) -> DriverOp {
        match self {
            Self::DeviceCount => DriverOp::DeviceCount,
            Self::ProductString { .. } => DriverOp::ProductString,
            Self::SetTimeouts { .. } => DriverOp::SetTimeouts,
            Self::Open { .. } => DriverOp::Open,
            Self::Close { .. } => DriverOp::Close,
            Self::FlushBuffers { .. } => DriverOp::FlushBuffers,
            Self::Write { .. } => DriverOp::Write,
            Self::CheckRxQueue { .. } => DriverOp::CheckRxQueue,
            Self::Read { .. } => DriverOp::Read,
        }
    }
}

/// One simulated bridge with the peripherals behind it.
#[derive(Debug, Clone)]
pub struct MockBridge {
    pub serial_number: String,
    pub description: String,
    pub link_name: String,
    pub vid: String,
    pub pid: String,

    /// Register bank keyed by (device address, register address); unset registers read as 0.
    registers: HashMap<(u8, u8), u8>,

    /// Bytes waiting in the receive queue.
    rx: Vec<u8>,

    /// Polls left before a queued response is reported ready.
    polls_until_ready: u32,
}

impl MockBridge {
    pub fn new(serial_number: impl Into<String>) -> Self {
        Self {
            serial_number: serial_number.into(),
            description: "USB Register Bridge".to_string(),
            link_name: "\\\\?\\usb#vid_10c4&pid_ea61".to_string(),
            vid: "10C4".to_string(),
            pid: "EA61".to_string(),
            registers: HashMap::new(),
            rx: Vec::new(),
            polls_until_ready: 0,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Preset a register value.
    pub fn with_register(mut self, device_address: u8, register_address: u8, value: u8) -> Self {
        self.registers
            .insert((device_address, register_address), value);
        self
    }

    fn descriptor(&self, field: ProductField) -> &str {
        match field {
            ProductField::SerialNumber => &self.serial_number,
            ProductField::Description => &self.description,
            ProductField::LinkName => &self.link_name,
            ProductField::Vid => &self.vid,
            ProductField::Pid => &self.pid,
        }
    }

    fn register(&self, device_address: u8, register_address: u8) -> u8 {
        self.registers
            .get(&(device_address, register_address))
            .copied()
            .unwrap_or(0)
    }
}

/// Injected misbehavior.
#[derive(Debug, Clone)]
struct Faults {
    failures: HashMap<DriverOp, StatusCode>,
    short_write: Option<usize>,
    short_read: Option<usize>,
    ready_after: u32,
    never_ready: bool,
    ack: u8,
    allow_reopen: bool,
    response_override: Option<Vec<u8>>,
}

impl Default for Faults {
    fn default() -> Self {
        Self {
            failures: HashMap::new(),
            short_write: None,
            short_read: None,
            ready_after: 0,
            never_ready: false,
            ack: ACK_BYTE,
            allow_reopen: false,
            response_override: None,
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    bridges: Vec<MockBridge>,
    handles: HashMap<RawHandle, u32>,
    next_handle: u64,
    timeouts: Option<(u32, u32)>,
    faults: Faults,
    calls: Vec<DriverCall>,
}

impl MockState {
    fn record(&mut self, call: DriverCall) -> DriverResult<()> {
        let op = call.op();
        self.calls.push(call);
        match self.faults.failures.get(&op) {
            Some(status) => Err(*status),
            None => Ok(()),
        }
    }

    fn bridge_for(&mut self, handle: RawHandle) -> DriverResult<&mut MockBridge> {
        let index = *self
            .handles
            .get(&handle)
            .ok_or(StatusCode(SI_INVALID_HANDLE))?;
        self.bridges
            .get_mut(index as usize)
            .ok_or(StatusCode(SI_DEVICE_NOT_FOUND))
    }

    /// Answer a request frame the way the bridge firmware does.
    fn respond(&self, bridge: &mut MockBridge, frame: &[u8]) -> Option<Vec<u8>> {
        if frame.len() < WRITE_FRAME_OVERHEAD || frame[..2] != SYNC_PREAMBLE {
            return None;
        }
        let (command, device_address, register_address) = (frame[4], frame[5], frame[6]);
        let ack = self.faults.ack;

        match command {
            CMD_WRITE => {
                let payload = &frame[7..frame.len() - 1];
                for (offset, value) in payload.iter().enumerate() {
                    let register = register_address.wrapping_add(offset as u8);
                    bridge.registers.insert((device_address, register), *value);
                }
                Some(Response::encode(CMD_WRITE, device_address, register_address, ack, &[]).to_vec())
            }
            CMD_READ if frame.len() == READ_REQUEST_LEN => {
                let length = u16::from_be_bytes([frame[7], frame[8]]);
                let payload: Vec<u8> = (0..length)
                    .map(|offset| {
                        bridge.register(device_address, register_address.wrapping_add(offset as u8))
                    })
                    .collect();
                Some(Response::encode(CMD_READ, device_address, register_address, ack, &payload).to_vec())
            }
            _ => None,
        }
    }
}

/// Simulated bridge driver.
///
/// Requests written to an open handle are decoded and answered from an
/// in-memory register bank per bridge, so register writes can be read back.
/// Every call is recorded and can be inspected through [`calls`](Self::calls).
///
/// # Examples
///
/// ```
/// use regbridge_hardware::driver::{BridgeDriver, DriverOp};
/// use regbridge_hardware::mock::MockBridgeDriver;
///
/// let driver = MockBridgeDriver::with_serials(&["NS0001"]);
/// assert_eq!(driver.device_count().unwrap(), 1);
///
/// driver.fail_on(DriverOp::Open, 0xFF);
/// assert!(driver.open(0).is_err());
/// assert_eq!(driver.count(DriverOp::Open), 1);
/// ```
#[derive(Debug, Default)]
pub struct MockBridgeDriver {
    state: Mutex<MockState>,
}

impl MockBridgeDriver {
    /// Driver with no attached bridges.
    pub fn new() -> Self {
        Self::default()
    }

    /// Driver with one default bridge per serial number.
    pub fn with_serials(serials: &[&str]) -> Self {
        let driver = Self::new();
        for serial in serials {
            driver.add_bridge(MockBridge::new(*serial));
        }
        driver
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Attach a bridge, returning its index.
    pub fn add_bridge(&self, bridge: MockBridge) -> u32 {
        let mut state = self.state();
        state.bridges.push(bridge);
        (state.bridges.len() - 1) as u32
    }

    /// Make every call of `op` fail with `status` until cleared.
    pub fn fail_on(&self, op: DriverOp, status: u32) {
        self.state().faults.failures.insert(op, StatusCode(status));
    }

    pub fn clear_failure(&self, op: DriverOp) {
        self.state().faults.failures.remove(&op);
    }

    /// Report at most `limit` bytes written per write call.
    pub fn set_short_write(&self, limit: Option<usize>) {
        self.state().faults.short_write = limit;
    }

    /// Return at most `limit` bytes per read call.
    pub fn set_short_read(&self, limit: Option<usize>) {
        self.state().faults.short_read = limit;
    }

    /// Report a queued response as not ready for the first `polls` polls.
    pub fn set_ready_after(&self, polls: u32) {
        self.state().faults.ready_after = polls;
    }

    /// Never report a queued response as ready.
    pub fn set_never_ready(&self, never_ready: bool) {
        self.state().faults.never_ready = never_ready;
    }

    /// Acknowledgement byte placed in responses.
    pub fn set_ack(&self, ack: u8) {
        self.state().faults.ack = ack;
    }

    /// Accept an open request for a bridge that is already open.
    pub fn set_allow_reopen(&self, allow: bool) {
        self.state().faults.allow_reopen = allow;
    }

    /// Answer every request with these bytes instead of a simulated response.
    pub fn set_response_override(&self, response: Option<Vec<u8>>) {
        self.state().faults.response_override = response;
    }

    /// Remove all injected faults.
    pub fn reset_faults(&self) {
        self.state().faults = Faults::default();
    }

    pub fn set_register(&self, index: u32, device_address: u8, register_address: u8, value: u8) {
        if let Some(bridge) = self.state().bridges.get_mut(index as usize) {
            bridge
                .registers
                .insert((device_address, register_address), value);
        }
    }

    /// Current register value, 0 if unset or the bridge does not exist.
    pub fn register(&self, index: u32, device_address: u8, register_address: u8) -> u8 {
        self.state()
            .bridges
            .get(index as usize)
            .map(|bridge| bridge.register(device_address, register_address))
            .unwrap_or(0)
    }

    /// All calls recorded so far, in order.
    pub fn calls(&self) -> Vec<DriverCall> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// Number of recorded calls of `op`.
    pub fn count(&self, op: DriverOp) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|call| call.op() == op)
            .count()
    }

    /// Whether the bridge at `index` has an open handle.
    pub fn is_open(&self, index: u32) -> bool {
        self.state().handles.values().any(|open| *open == index)
    }

    /// Last timeouts set through the driver.
    pub fn timeouts(&self) -> Option<(u32, u32)> {
        self.state().timeouts
    }
}

impl BridgeDriver for MockBridgeDriver {
    fn device_count(&self) -> DriverResult<u32> {
        let mut state = self.state();
        state.record(DriverCall::DeviceCount)?;
        Ok(state.bridges.len() as u32)
    }

    fn product_string(&self, index: u32, field: ProductField) -> DriverResult<String> {
        let mut state = self.state();
        state.record(DriverCall::ProductString { index, field })?;
        state
            .bridges
            .get(index as usize)
            .map(|bridge| bridge.descriptor(field).to_string())
            .ok_or(StatusCode(SI_DEVICE_NOT_FOUND))
    }

    fn set_timeouts(&self, read_ms: u32, write_ms: u32) -> DriverResult<()> {
        let mut state = self.state();
        state.record(DriverCall::SetTimeouts { read_ms, write_ms })?;
        state.timeouts = Some((read_ms, write_ms));
        Ok(())
    }

    fn open(&self, index: u32) -> DriverResult<RawHandle> {
        let mut state = self.state();
        state.record(DriverCall::Open { index })?;
        if index as usize >= state.bridges.len() {
            return Err(StatusCode(SI_DEVICE_NOT_FOUND));
        }

        let existing = state
            .handles
            .iter()
            .find(|(_, open)| **open == index)
            .map(|(handle, _)| *handle);
        if let Some(handle) = existing {
            return if state.faults.allow_reopen {
                Ok(handle)
            } else {
                Err(StatusCode(SI_DEVICE_IO_FAILED))
            };
        }

        state.next_handle += 1;
        let handle = RawHandle(0x1000 + state.next_handle);
        state.handles.insert(handle, index);
        Ok(handle)
    }

    fn close(&self, handle: RawHandle) -> DriverResult<()> {
        let mut state = self.state();
        state.record(DriverCall::Close { handle })?;
        let index = state
            .handles
            .remove(&handle)
            .ok_or(StatusCode(SI_INVALID_HANDLE))?;
        if let Some(bridge) = state.bridges.get_mut(index as usize) {
            bridge.rx.clear();
        }
        Ok(())
    }

    fn flush_buffers(&self, handle: RawHandle) -> DriverResult<()> {
        let mut state = self.state();
        state.record(DriverCall::FlushBuffers { handle })?;
        state.bridge_for(handle)?.rx.clear();
        Ok(())
    }

    fn write(&self, handle: RawHandle, data: &[u8]) -> DriverResult<usize> {
        let mut state = self.state();
        state.record(DriverCall::Write {
            handle,
            data: data.to_vec(),
        })?;

        let index = *state
            .handles
            .get(&handle)
            .ok_or(StatusCode(SI_INVALID_HANDLE))?;
        let mut bridge = state
            .bridges
            .get(index as usize)
            .cloned()
            .ok_or(StatusCode(SI_DEVICE_NOT_FOUND))?;

        let response = match &state.faults.response_override {
            Some(bytes) => Some(bytes.clone()),
            None => state.respond(&mut bridge, data),
        };
        if let Some(bytes) = response {
            bridge.rx.extend_from_slice(&bytes);
            bridge.polls_until_ready = state.faults.ready_after;
        }
        state.bridges[index as usize] = bridge;

        Ok(state
            .faults
            .short_write
            .map_or(data.len(), |limit| data.len().min(limit)))
    }

    fn check_rx_queue(&self, handle: RawHandle) -> DriverResult<QueueState> {
        let mut state = self.state();
        state.record(DriverCall::CheckRxQueue { handle })?;
        let never_ready = state.faults.never_ready;
        let bridge = state.bridge_for(handle)?;

        if bridge.rx.is_empty() || never_ready {
            return Ok(QueueState::new(0, QueueStatus::Empty));
        }
        if bridge.polls_until_ready > 0 {
            bridge.polls_until_ready -= 1;
            return Ok(QueueState::new(0, QueueStatus::Empty));
        }
        Ok(QueueState::new(bridge.rx.len() as u32, QueueStatus::Ready))
    }

    fn read(&self, handle: RawHandle, buf: &mut [u8]) -> DriverResult<usize> {
        let mut state = self.state();
        state.record(DriverCall::Read {
            handle,
            len: buf.len(),
        })?;
        let short_read = state.faults.short_read;
        let bridge = state.bridge_for(handle)?;

        let mut count = buf.len().min(bridge.rx.len());
        if let Some(limit) = short_read {
            count = count.min(limit);
        }
        buf[..count].copy_from_slice(&bridge.rx[..count]);
        bridge.rx.drain(..count);
        Ok(count)
    }
}
