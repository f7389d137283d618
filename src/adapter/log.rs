use std::io::{Stdout, Write};
use std::sync::{Mutex, PoisonError};

use crate::container::Container;
use crate::stats::Kind;

use super::{Adapter, Metric, Result, Template};

/// The default line format, following the l2met convention.
pub const L2MET_TEMPLATE: &str =
    "{{.Type}}#{{.Name}}={{.Value}} source={{.Container.Name}}.{{.Hostname}}";

/// An [`Adapter`] writing one rendered line per metric.
#[derive(Debug)]
pub struct LogAdapter<W = Stdout> {
    template: Template,
    hostname: String,
    writer: Mutex<W>,
}

impl LogAdapter<Stdout> {
    /// Creates an adapter writing to standard output.
    ///
    /// # Errors
    ///
    /// Returns [`super::Error::Template`] if `template` does not parse.
    pub fn stdout(template: Option<&str>, hostname: impl Into<String>) -> Result<Self> {
        Self::new(template, hostname, std::io::stdout())
    }
}

impl<W: Write + Send + 'static> LogAdapter<W> {
    /// Creates an adapter writing to `writer`, using [`L2MET_TEMPLATE`] when no template
    /// is given.
    pub fn new(template: Option<&str>, hostname: impl Into<String>, writer: W) -> Result<Self> {
        Ok(Self {
            template: Template::parse(template.unwrap_or(L2MET_TEMPLATE))?,
            hostname: hostname.into(),
            writer: Mutex::new(writer),
        })
    }

    pub fn into_writer(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self, container: &Container, kind: Kind, name: &str, value: u64) -> Result<()> {
        let mut line = self.template.render(&Metric {
            container,
            kind,
            name,
            value,
            hostname: &self.hostname,
        });
        line.push('\n');

        // one write per line keeps lines from concurrent attachments whole
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer.write_all(line.as_bytes())?;
        Ok(())
    }
}

impl<W: Write + Send + 'static> Adapter for LogAdapter<W> {
    fn sample(&self, container: &Container, name: &str, value: u64) -> Result<()> {
        self.write(container, Kind::Sample, name, value)
    }

    fn incr(&self, container: &Container, name: &str, value: u64) -> Result<()> {
        self.write(container, Kind::Count, name, value)
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;
    use crate::adapter::Error;
    use crate::container::ContainerID;

    fn container() -> Container {
        Container::new(
            ContainerID::new("4f66ad9a0b2e").unwrap(),
            "dummy",
            vec!["SOURCE=app".to_owned()],
        )
    }

    #[test]
    fn test_default_template() {
        let adapter = LogAdapter::new(None, "tests.log", Vec::new()).unwrap();
        let c = container();
        adapter.sample(&c, "foo.bar", 1).unwrap();
        adapter.incr(&c, "Container.Start", 1).unwrap();

        let out = String::from_utf8(adapter.into_writer()).unwrap();
        assert_eq!(
            out,
            "sample#foo.bar=1 source=dummy.tests.log\ncount#Container.Start=1 source=dummy.tests.log\n"
        );
    }

    #[test]
    fn test_custom_template() {
        let adapter = LogAdapter::new(
            Some(r#"{{.Name}}:{{.Value}}|{{.Env "SOURCE"}}"#),
            "tests.log",
            Vec::new(),
        )
        .unwrap();
        adapter.sample(&container(), "MemoryStats.Usage", 4096).unwrap();

        let out = String::from_utf8(adapter.into_writer()).unwrap();
        assert_eq!(out, "MemoryStats.Usage:4096|app\n");
    }

    #[test]
    fn test_invalid_template() {
        match LogAdapter::new(Some("{{.Nope}}"), "h", Vec::new()) {
            Err(Error::Template(_)) => {}
            other => panic!("Expected template error, got {other:?}"),
        }
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_failure_is_reported() {
        let adapter = LogAdapter::new(None, "h", BrokenPipe).unwrap();
        match adapter.sample(&container(), "foo", 1) {
            Err(Error::Write(err)) => assert_eq!(err.kind(), io::ErrorKind::BrokenPipe),
            other => panic!("Expected write error, got {other:?}"),
        }
    }
}
