use std::fmt;

use super::errors::InputError;

/// Vehicle slot `k` of the fleet, printed as `v{k}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VehicleId(usize);

impl VehicleId {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Homogeneous fleet: every vehicle shares one capacity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fleet {
    size: usize,
    capacity: f64,
}

impl Fleet {
    pub fn new(size: usize, capacity: f64) -> Result<Self, InputError> {
        if size == 0 {
            return Err(InputError::EmptyFleet);
        }
        if !capacity.is_finite() || capacity < 0.0 {
            return Err(InputError::InvalidCapacity(capacity));
        }
        Ok(Self { size, capacity })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    pub fn vehicles(&self) -> impl Iterator<Item = VehicleId> {
        (0..self.size).map(VehicleId)
    }
}
