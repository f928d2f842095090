use std::collections::HashMap;
use std::sync::Arc;

use tracing::trace;

use crate::error::{PortIoError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoDirection {
    Read,
    Write,
}

/// One trapped guest port access.
///
/// `size` is the access width in bytes and `count` the repeat count of a string instruction.
/// For reads, the handler fills in `data`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IoRequest {
    pub port: u16,
    pub size: u8,
    pub count: u32,
    pub direction: IoDirection,
    pub data: u32,
}

impl IoRequest {
    pub fn read(port: u16, size: u8) -> Self {
        Self {
            port,
            size,
            count: 1,
            direction: IoDirection::Read,
            data: 0,
        }
    }

    pub fn write(port: u16, size: u8, data: u32) -> Self {
        Self {
            port,
            size,
            count: 1,
            direction: IoDirection::Write,
            data,
        }
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    /// Value an undecoded read floats to.
    fn all_ones(&self) -> u32 {
        match self.size {
            1 => 0xFF,
            2 => 0xFFFF,
            _ => 0xFFFF_FFFF,
        }
    }
}

/// Emulated device behind one or more guest ports.
///
/// Handlers are shared between vCPU threads, so they take `&self` and synchronize internally.
pub trait PortIoHandler: Send + Sync {
    fn handle(&self, req: &mut IoRequest);
}

struct RangeHandler {
    start: u16,
    len: u16,
    handler: Arc<dyn PortIoHandler>,
}

impl RangeHandler {
    fn end_exclusive(&self) -> u32 {
        u32::from(self.start) + u32::from(self.len)
    }

    fn contains(&self, port: u16) -> bool {
        let p = u32::from(port);
        p >= u32::from(self.start) && p < self.end_exclusive()
    }
}

/// Port number to handler routing table for one domain.
///
/// Built while the domain is constructed; dispatch only needs `&self`.
#[derive(Default)]
pub struct IoPortBus {
    ports: HashMap<u16, Arc<dyn PortIoHandler>>,
    ranges: Vec<RangeHandler>,
}

impl IoPortBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims a single port. Exact ports take precedence over ranges.
    pub fn register(&mut self, port: u16, handler: Arc<dyn PortIoHandler>) {
        self.ports.insert(port, handler);
    }

    /// Claims `len` consecutive ports starting at `start`.
    pub fn register_range(
        &mut self,
        start: u16,
        len: u16,
        handler: Arc<dyn PortIoHandler>,
    ) -> Result<()> {
        if len == 0 {
            return Err(PortIoError::EmptyRange);
        }
        let end = u32::from(start) + u32::from(len);
        if end > 0x1_0000 {
            return Err(PortIoError::RangeWraps { start, len });
        }

        let idx = self.ranges.partition_point(|r| r.start < start);

        // Ranges are kept sorted and disjoint so lookup is a binary search.
        if let Some(prev) = idx.checked_sub(1).and_then(|i| self.ranges.get(i)) {
            if u32::from(start) < prev.end_exclusive() {
                return Err(PortIoError::Overlap {
                    start,
                    end,
                    existing: prev.start,
                });
            }
        }
        if let Some(next) = self.ranges.get(idx) {
            if end > u32::from(next.start) {
                return Err(PortIoError::Overlap {
                    start,
                    end,
                    existing: next.start,
                });
            }
        }

        self.ranges.insert(
            idx,
            RangeHandler {
                start,
                len,
                handler,
            },
        );
        Ok(())
    }

    fn find(&self, port: u16) -> Option<&Arc<dyn PortIoHandler>> {
        if let Some(handler) = self.ports.get(&port) {
            return Some(handler);
        }

        let idx = self.ranges.partition_point(|r| r.start <= port);
        let cand = self.ranges.get(idx.checked_sub(1)?)?;
        cand.contains(port).then_some(&cand.handler)
    }

    /// Routes `req` to its handler.
    ///
    /// Unclaimed reads float high; unclaimed writes are dropped. Both report
    /// [`PortIoError::Unclaimed`] so the caller can decide whether to log it.
    pub fn dispatch(&self, req: &mut IoRequest) -> Result<()> {
        let Some(handler) = self.find(req.port) else {
            if req.direction == IoDirection::Read {
                req.data = req.all_ones();
            }
            return Err(PortIoError::Unclaimed(req.port));
        };

        handler.handle(req);
        trace!(port = req.port, dir = ?req.direction, data = req.data, "port io");
        Ok(())
    }

    pub fn read_u8(&self, port: u16) -> Result<u8> {
        let mut req = IoRequest::read(port, 1);
        self.dispatch(&mut req)?;
        Ok(req.data as u8)
    }

    pub fn write_u8(&self, port: u16, value: u8) -> Result<()> {
        self.dispatch(&mut IoRequest::write(port, 1, u32::from(value)))
    }
}
