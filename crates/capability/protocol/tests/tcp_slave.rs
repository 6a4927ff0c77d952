//! 通过真实 socket 与进程内 Modbus TCP 从站交互。

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use tagbridge_protocol::{ConnectionConfig, ConnectionManager, ModbusError};

const ILLEGAL_FUNCTION: u8 = 0x01;
const ILLEGAL_DATA_ADDRESS: u8 = 0x02;

/// 从站数据区。
struct SlaveState {
    coils: Vec<bool>,
    discrete_inputs: Vec<bool>,
    holding: Vec<u16>,
    input: Vec<u16>,
}

impl SlaveState {
    fn handle(&mut self, pdu: &[u8]) -> Vec<u8> {
        let function = pdu[0];
        let address = usize::from(u16::from_be_bytes([pdu[1], pdu[2]]));
        let field = u16::from_be_bytes([pdu[3], pdu[4]]);
        match function {
            0x01 | 0x02 => {
                let bits = if function == 0x01 {
                    &self.coils
                } else {
                    &self.discrete_inputs
                };
                let count = usize::from(field);
                if address + count > bits.len() {
                    return vec![function | 0x80, ILLEGAL_DATA_ADDRESS];
                }
                let mut packed = vec![0u8; count.div_ceil(8)];
                for (index, bit) in bits[address..address + count].iter().enumerate() {
                    if *bit {
                        packed[index / 8] |= 1 << (index % 8);
                    }
                }
                let mut reply = vec![function, packed.len() as u8];
                reply.extend_from_slice(&packed);
                reply
            }
            0x03 | 0x04 => {
                let words = if function == 0x03 {
                    &self.holding
                } else {
                    &self.input
                };
                let count = usize::from(field);
                if address + count > words.len() {
                    return vec![function | 0x80, ILLEGAL_DATA_ADDRESS];
                }
                let mut reply = vec![function, (count * 2) as u8];
                for word in &words[address..address + count] {
                    reply.extend_from_slice(&word.to_be_bytes());
                }
                reply
            }
            0x05 => {
                if address >= self.coils.len() {
                    return vec![function | 0x80, ILLEGAL_DATA_ADDRESS];
                }
                self.coils[address] = field == 0xFF00;
                pdu[..5].to_vec()
            }
            0x06 => {
                if address >= self.holding.len() {
                    return vec![function | 0x80, ILLEGAL_DATA_ADDRESS];
                }
                self.holding[address] = field;
                pdu[..5].to_vec()
            }
            0x10 => {
                let count = usize::from(field);
                if address + count > self.holding.len() {
                    return vec![function | 0x80, ILLEGAL_DATA_ADDRESS];
                }
                for index in 0..count {
                    let offset = 6 + index * 2;
                    self.holding[address + index] =
                        u16::from_be_bytes([pdu[offset], pdu[offset + 1]]);
                }
                pdu[..5].to_vec()
            }
            _ => vec![function | 0x80, ILLEGAL_FUNCTION],
        }
    }
}

fn serve(mut stream: TcpStream, state: Arc<Mutex<SlaveState>>) {
    loop {
        let mut header = [0u8; 7];
        if stream.read_exact(&mut header).is_err() {
            return;
        }
        let length = usize::from(u16::from_be_bytes([header[4], header[5]]));
        let mut pdu = vec![0u8; length.saturating_sub(1)];
        if stream.read_exact(&mut pdu).is_err() {
            return;
        }
        let reply = state.lock().unwrap().handle(&pdu);

        let mut frame = Vec::with_capacity(7 + reply.len());
        frame.extend_from_slice(&header[..4]);
        frame.extend_from_slice(&((reply.len() + 1) as u16).to_be_bytes());
        frame.push(header[6]);
        frame.extend_from_slice(&reply);
        if stream.write_all(&frame).is_err() {
            return;
        }
    }
}

fn spawn_slave() -> (u16, Arc<Mutex<SlaveState>>) {
    let state = Arc::new(Mutex::new(SlaveState {
        coils: vec![false; 16],
        discrete_inputs: vec![true, false, true, true],
        holding: vec![0, 1, 7, 3, 0, 0, 0, 0],
        input: vec![0x3FC0, 0x0000, 0xFFFF],
    }));
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();
    let shared = state.clone();
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let state = shared.clone();
            thread::spawn(move || serve(stream, state));
        }
    });
    (port, state)
}

fn session(port: u16) -> ConnectionManager {
    let config = ConnectionConfig::new("127.0.0.1", port)
        .with_timeout_ms(2000)
        .with_retry(2, 0);
    ConnectionManager::new(config)
}

#[test]
fn reads_and_writes_holding_registers() {
    let (port, state) = spawn_slave();
    let mut manager = session(port);

    manager.connect().expect("connect");
    assert_eq!(
        manager.read_holding_registers(0, 4).expect("read"),
        vec![0, 1, 7, 3]
    );

    manager.write_register(2, 9).expect("write");
    manager.write_registers(4, &[0x1234, 0x5678]).expect("write many");

    assert_eq!(
        manager.read_holding_registers(2, 4).expect("read back"),
        vec![9, 3, 0x1234, 0x5678]
    );
    assert_eq!(state.lock().unwrap().holding[5], 0x5678);
}

#[test]
fn reads_bits_and_input_registers() {
    let (port, state) = spawn_slave();
    let mut manager = session(port);

    manager.write_coil(3, true).expect("write coil");
    assert!(state.lock().unwrap().coils[3]);
    assert_eq!(
        manager.read_coils(2, 3).expect("coils"),
        vec![false, true, false]
    );
    assert_eq!(
        manager.read_discrete_inputs(0, 4).expect("inputs"),
        vec![true, false, true, true]
    );
    assert_eq!(
        manager.read_input_registers(0, 2).expect("input registers"),
        vec![0x3FC0, 0x0000]
    );
}

#[test]
fn exception_response_is_not_retried() {
    let (port, _state) = spawn_slave();
    let mut manager = session(port);

    let err = manager.read_holding_registers(100, 1).unwrap_err();

    assert!(matches!(err, ModbusError::Exception { function: 0x03, .. }));
    assert!(manager.is_connected());
    // 会话在异常响应后仍可继续使用
    assert_eq!(manager.read_holding_registers(3, 1).expect("read"), vec![3]);
}

#[test]
fn refused_port_exhausts_retries() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("addr").port()
    };
    let mut manager = session(port);

    let err = manager.read_holding_registers(0, 1).unwrap_err();

    assert!(matches!(err, ModbusError::RetriesExhausted { attempts: 3, .. }));
    assert!(!manager.is_connected());
}
