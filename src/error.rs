use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("backing storage allocation failed: {0}")]
    Allocation(#[from] std::io::Error),

    #[error("packet type has zero size")]
    ZeroSizedPacket,

    #[error("capacity of {capacity_bytes} bytes holds fewer than 2 packets of {packet_size} bytes")]
    CapacityTooSmall {
        capacity_bytes: usize,
        packet_size: usize,
    },

    #[error("packet alignment {align} exceeds page alignment of the backing mapping")]
    UnsupportedAlignment { align: usize },

    #[error("capacity of {capacity_bytes} bytes exceeds the addressable mapping size")]
    CapacityOverflow { capacity_bytes: usize },
}
