use std::net::{ToSocketAddrs, UdpSocket};

use cadence::prelude::*;
use cadence::{StatsdClient, UdpMetricSink};

use crate::container::Container;
use crate::stats::Kind;

use super::{Adapter, Metric, Result, Template};

/// The default metric key format. The `source__...__` segment lets StatsD backends
/// split the key back into metric and source.
pub const STATSD_TEMPLATE: &str = "{{.Name}}.source__{{.Container.Name}}.{{.Hostname}}__";

/// An [`Adapter`] reporting samples as gauges and increments as counters.
#[derive(Debug)]
pub struct StatsdAdapter {
    client: StatsdClient,
    template: Template,
    hostname: String,
}

impl StatsdAdapter {
    /// Wraps an existing client, using [`STATSD_TEMPLATE`] when no template is given.
    pub fn new(
        client: StatsdClient,
        template: Option<&str>,
        hostname: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            client,
            template: Template::parse(template.unwrap_or(STATSD_TEMPLATE))?,
            hostname: hostname.into(),
        })
    }

    /// Creates an adapter sending to the StatsD server at `addr` over UDP.
    ///
    /// # Errors
    ///
    /// Returns [`super::Error::Write`] if no local socket can be bound and
    /// [`super::Error::Statsd`] if `addr` does not resolve.
    pub fn connect(
        addr: impl ToSocketAddrs,
        template: Option<&str>,
        hostname: impl Into<String>,
    ) -> Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.set_nonblocking(true)?;
        let sink = UdpMetricSink::from(addr, socket)?;
        Self::new(StatsdClient::from_sink("", sink), template, hostname)
    }

    fn key(&self, container: &Container, kind: Kind, name: &str, value: u64) -> String {
        self.template.render(&Metric {
            container,
            kind,
            name,
            value,
            hostname: &self.hostname,
        })
    }
}

impl Adapter for StatsdAdapter {
    fn sample(&self, container: &Container, name: &str, value: u64) -> Result<()> {
        if i64::try_from(value).is_err() {
            log::trace!("{name} of {} out of gauge range", container.name());
            return Ok(());
        }
        let key = self.key(container, Kind::Sample, name, value);
        self.client.gauge(&key, value)?;
        Ok(())
    }

    fn incr(&self, container: &Container, name: &str, value: u64) -> Result<()> {
        let Ok(delta) = i64::try_from(value) else {
            log::trace!("{name} of {} out of counter range", container.name());
            return Ok(());
        };
        let key = self.key(container, Kind::Count, name, value);
        self.client.count(&key, delta)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::container::ContainerID;

    fn container() -> Container {
        Container::new(
            ContainerID::new("4f66ad9a0b2e").unwrap(),
            "dummy",
            vec!["SOURCE=dockerstats.tests.statsd".to_owned()],
        )
    }

    fn server() -> UdpSocket {
        let server = UdpSocket::bind("127.0.0.1:0").unwrap();
        server
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        server
    }

    fn recv(server: &UdpSocket) -> String {
        let mut buf = [0u8; 512];
        let (n, _) = server.recv_from(&mut buf).unwrap();
        String::from_utf8(buf[..n].to_vec()).unwrap()
    }

    #[test]
    fn test_incr_with_env_template() {
        let server = server();
        let adapter = StatsdAdapter::connect(
            server.local_addr().unwrap(),
            Some(r#"tests.source__{{.Env "SOURCE"}}__"#),
            "node",
        )
        .unwrap();

        adapter.incr(&container(), "Container.Start", 1).unwrap();
        assert_eq!(recv(&server), "tests.source__dockerstats.tests.statsd__:1|c");
    }

    #[test]
    fn test_sample_with_default_template() {
        let server = server();
        let adapter = StatsdAdapter::connect(server.local_addr().unwrap(), None, "node").unwrap();

        adapter.sample(&container(), "MemoryStats.Usage", 4096).unwrap();
        assert_eq!(
            recv(&server),
            "MemoryStats.Usage.source__dummy.node__:4096|g"
        );
    }

    #[test]
    fn test_out_of_range_values_are_skipped() {
        let server = server();
        let adapter = StatsdAdapter::connect(server.local_addr().unwrap(), None, "node").unwrap();

        adapter.sample(&container(), "Huge", u64::MAX).unwrap();
        adapter.incr(&container(), "Huge", u64::MAX).unwrap();
        adapter.incr(&container(), "Small", 2).unwrap();
        assert_eq!(recv(&server), "Small.source__dummy.node__:2|c");
    }
}
