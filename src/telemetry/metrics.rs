//! Connection metrics

/// Counter metric types
#[derive(Debug, Clone, Copy)]
pub enum CounterMetric {
    /// Packets written to the transport
    PacketsSent,
    /// Packets decoded from the transport
    PacketsReceived,
    /// Frames that failed to decode
    DecodeFailures,
    /// Round-trip probes sent
    ProbesSent,
}

/// Record a counter increment
pub fn record_counter(metric: CounterMetric) {
    let metric_name = match metric {
        CounterMetric::PacketsSent => "wslink_packets_sent_total",
        CounterMetric::PacketsReceived => "wslink_packets_received_total",
        CounterMetric::DecodeFailures => "wslink_decode_failures_total",
        CounterMetric::ProbesSent => "wslink_probes_sent_total",
    };

    tracing::trace!(metric = metric_name, "Recording counter");
}

/// Record a round-trip measurement
pub fn record_rtt(rtt_ms: u64) {
    tracing::trace!(
        metric = "wslink_ping_rtt_ms",
        value_ms = rtt_ms,
        "Recording round trip"
    );
}
