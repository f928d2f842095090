use thiserror::Error;

pub type Result<T> = std::result::Result<T, PortIoError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PortIoError {
    #[error("no handler claims port {0:#x}")]
    Unclaimed(u16),

    #[error("I/O port range must be non-empty")]
    EmptyRange,

    #[error("I/O port range wraps past 0xFFFF: start={start:#x} len={len:#x}")]
    RangeWraps { start: u16, len: u16 },

    #[error("overlapping I/O port ranges: new=[{start:#x}..{end:#x}) existing starts at {existing:#x}")]
    Overlap { start: u16, end: u32, existing: u16 },
}
