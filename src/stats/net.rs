use serde::Deserialize;

use super::Sample;

/// Network counters of a single interface (or the sum over several interfaces).
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct NetworkStats {
    /// Bytes received.
    pub rx_bytes: u64,
    /// Packets received.
    pub rx_packets: u64,
    /// Receive errors.
    pub rx_errors: u64,
    /// Dropped packets while receiving.
    pub rx_dropped: u64,
    /// Bytes transmitted.
    pub tx_bytes: u64,
    /// Packets transmitted.
    pub tx_packets: u64,
    /// Transmit errors.
    pub tx_errors: u64,
}

impl std::ops::AddAssign for NetworkStats {
    fn add_assign(&mut self, rhs: Self) {
        self.rx_bytes += rhs.rx_bytes;
        self.rx_packets += rhs.rx_packets;
        self.rx_errors += rhs.rx_errors;
        self.rx_dropped += rhs.rx_dropped;
        self.tx_bytes += rhs.tx_bytes;
        self.tx_packets += rhs.tx_packets;
        self.tx_errors += rhs.tx_errors;
    }
}

impl NetworkStats {
    pub(super) fn push_samples(&self, out: &mut Vec<Sample>) {
        out.push(Sample::new("Network.RxBytes", self.rx_bytes));
        out.push(Sample::new("Network.RxPackets", self.rx_packets));
        out.push(Sample::new("Network.RxErrors", self.rx_errors));
        out.push(Sample::new("Network.RxDropped", self.rx_dropped));
        out.push(Sample::new("Network.TxBytes", self.tx_bytes));
        out.push(Sample::new("Network.TxPackets", self.tx_packets));
        out.push(Sample::new("Network.TxErrors", self.tx_errors));
    }
}
