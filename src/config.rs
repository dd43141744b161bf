use crate::ship::ShipClass;

pub const BOARD_SIZE: usize = 10;
pub const FLEET_SIZE: usize = 7;
pub const FLEET: [ShipClass; FLEET_SIZE] = [
    ShipClass::new("Battleship", 4),
    ShipClass::new("Cruiser", 3),
    ShipClass::new("Cruiser", 3),
    ShipClass::new("Destroyer", 2),
    ShipClass::new("Destroyer", 2),
    ShipClass::new("Patrol Boat", 1),
    ShipClass::new("Patrol Boat", 1),
];

/// Longest ship in the fleet.
pub const MAX_SHIP_LENGTH: usize = 4;

/// Total number of ship segments in the standard fleet.
pub const TOTAL_SHIP_CELLS: usize = 4 + 3 + 3 + 2 + 2 + 1 + 1;

/// Random positions tried per ship before the whole fleet is restarted.
pub const PLACEMENT_ATTEMPTS: usize = 100;

/// Fleet restarts before auto placement reports failure.
pub const MAX_FLEET_RESTARTS: usize = 1_000;

pub const ROOM_CODE_LEN: usize = 6;
pub const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Seconds a room may sit idle before the cleanup sweep evicts it.
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 300;

/// Number of fleet ships of the given length.
pub fn fleet_quota(length: usize) -> usize {
    FLEET.iter().filter(|c| c.length() == length).count()
}

/// Runtime settings of the game service and its server.
#[cfg(feature = "std")]
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Idle time after which a room or standalone match is evicted.
    pub idle_timeout: std::time::Duration,
    /// How often the server runs the eviction sweep.
    pub cleanup_interval: std::time::Duration,
    /// Buffered events per subscriber before slow readers start lagging.
    pub event_capacity: usize,
}

#[cfg(feature = "std")]
impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            idle_timeout: std::time::Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS),
            cleanup_interval: std::time::Duration::from_secs(60),
            event_capacity: 256,
        }
    }
}
