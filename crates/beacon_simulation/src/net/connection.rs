//! NetConnection — очереди пакетов между sync pass и транспортом
//!
//! Транспорт (UDP/KCP) вне этого crate: он забирает `outbound`
//! и кладёт полученные байты в `inbound`.

use std::collections::VecDeque;

use bevy::prelude::*;

/// Роль стороны соединения
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetRole {
    /// Authoritative сторона: пакует dirty behaviors
    Server,
    /// Ghost сторона: распаковывает updates
    Client,
}

#[derive(Resource, Debug)]
pub struct NetConnection {
    pub role: NetRole,
    outbound: VecDeque<Vec<u8>>,
    inbound: VecDeque<Vec<u8>>,
}

impl NetConnection {
    pub fn new(role: NetRole) -> Self {
        Self {
            role,
            outbound: VecDeque::new(),
            inbound: VecDeque::new(),
        }
    }

    pub fn server() -> Self {
        Self::new(NetRole::Server)
    }

    pub fn client() -> Self {
        Self::new(NetRole::Client)
    }

    pub fn queue_outbound(&mut self, packet: Vec<u8>) {
        self.outbound.push_back(packet);
    }

    /// Забрать все исходящие пакеты (для транспорта)
    pub fn drain_outbound(&mut self) -> Vec<Vec<u8>> {
        self.outbound.drain(..).collect()
    }

    pub fn outbound_len(&self) -> usize {
        self.outbound.len()
    }

    pub fn receive(&mut self, packet: Vec<u8>) {
        self.inbound.push_back(packet);
    }

    pub fn pop_inbound(&mut self) -> Option<Vec<u8>> {
        self.inbound.pop_front()
    }
}

/// Run condition: серверная сторона
pub fn is_server(connection: Option<Res<NetConnection>>) -> bool {
    connection.is_some_and(|c| c.role == NetRole::Server)
}

/// Run condition: клиентская сторона
pub fn is_client(connection: Option<Res<NetConnection>>) -> bool {
    connection.is_some_and(|c| c.role == NetRole::Client)
}
