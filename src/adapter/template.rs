//! Rendering of metric lines and metric names.
//!
//! Templates are plain text with `{{ ... }}` actions referring to the metric being
//! rendered:
//!
//! | action                | renders                                   |
//! |-----------------------|-------------------------------------------|
//! | `{{.Type}}`           | `sample` or `count`                       |
//! | `{{.Name}}`           | the dotted metric name                    |
//! | `{{.Value}}`          | the metric value                          |
//! | `{{.Hostname}}`       | the hostname of the collecting machine    |
//! | `{{.Container.Name}}` | the container name                        |
//! | `{{.Container.ID}}`   | the container ID                          |
//! | `{{.Env "KEY"}}`      | `KEY` from the container environment      |
//!
//! # Examples
//!
//! ```
//! # use creo_stats::adapter::{Metric, Template};
//! # use creo_stats::container::{Container, ContainerID};
//! # use creo_stats::stats::Kind;
//! let template = Template::parse(r#"{{.Name}}={{.Value}} app={{.Env "APP"}}"#).unwrap();
//! let container = Container::new(ContainerID::new("abc").unwrap(), "web", vec!["APP=shop".into()]);
//! let metric = Metric {
//!     container: &container,
//!     kind: Kind::Sample,
//!     name: "MemoryStats.Usage",
//!     value: 42,
//!     hostname: "node-1",
//! };
//! assert_eq!(template.render(&metric), "MemoryStats.Usage=42 app=shop");
//! ```

use crate::container::Container;
use crate::stats::Kind;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unterminated action starting at byte {0}")]
    Unterminated(usize),
    #[error("unknown field `{0}`")]
    UnknownField(String),
    #[error("invalid argument in `{0}`, expected a quoted variable name")]
    InvalidEnvArgument(String),
}

/// The values a [`Template`] can refer to.
#[derive(Debug, Clone, Copy)]
pub struct Metric<'a> {
    pub container: &'a Container,
    pub kind: Kind,
    pub name: &'a str,
    pub value: u64,
    pub hostname: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Text(String),
    Type,
    Name,
    Value,
    Hostname,
    ContainerName,
    ContainerID,
    Env(String),
}

/// A parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    parts: Vec<Part>,
}

impl Template {
    /// Parses a template.
    ///
    /// # Errors
    ///
    /// Returns a [`TemplateError`] if an action is not closed, names an unknown field, or
    /// passes anything but a single quoted name to `.Env`.
    pub fn parse(src: &str) -> Result<Self, TemplateError> {
        let mut parts = Vec::new();
        let mut rest = src;
        while let Some(start) = rest.find("{{") {
            if start > 0 {
                parts.push(Part::Text(rest[..start].to_owned()));
            }
            let action = &rest[start + 2..];
            let end = action
                .find("}}")
                .ok_or(TemplateError::Unterminated(src.len() - rest.len() + start))?;
            parts.push(parse_action(action[..end].trim())?);
            rest = &action[end + 2..];
        }
        if !rest.is_empty() {
            parts.push(Part::Text(rest.to_owned()));
        }

        Ok(Self { parts })
    }

    /// Renders the template for a metric. Unset environment variables render empty.
    pub fn render(&self, metric: &Metric<'_>) -> String {
        let mut out = String::with_capacity(64);
        for part in &self.parts {
            match part {
                Part::Text(text) => out.push_str(text),
                Part::Type => out.push_str(metric.kind.as_str()),
                Part::Name => out.push_str(metric.name),
                Part::Value => out.push_str(&metric.value.to_string()),
                Part::Hostname => out.push_str(metric.hostname),
                Part::ContainerName => out.push_str(metric.container.name()),
                Part::ContainerID => out.push_str(metric.container.id().as_str()),
                Part::Env(key) => out.push_str(metric.container.env_var(key).unwrap_or_default()),
            }
        }
        out
    }
}

fn parse_action(action: &str) -> Result<Part, TemplateError> {
    let part = match action {
        ".Type" => Part::Type,
        ".Name" => Part::Name,
        ".Value" => Part::Value,
        ".Hostname" => Part::Hostname,
        ".Container.Name" => Part::ContainerName,
        ".Container.ID" => Part::ContainerID,
        _ => {
            let Some(arg) = action.strip_prefix(".Env") else {
                return Err(TemplateError::UnknownField(action.to_owned()));
            };
            if !arg.starts_with(char::is_whitespace) {
                return Err(TemplateError::UnknownField(action.to_owned()));
            }
            let key = arg
                .trim()
                .strip_prefix('"')
                .and_then(|arg| arg.strip_suffix('"'))
                .filter(|key| !key.is_empty() && !key.contains('"'))
                .ok_or_else(|| TemplateError::InvalidEnvArgument(action.to_owned()))?;
            Part::Env(key.to_owned())
        }
    };

    Ok(part)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::ContainerID;

    fn container() -> Container {
        Container::new(
            ContainerID::new("4f66ad9a0b2e").unwrap(),
            "dummy",
            vec!["SOURCE=dockerstats.tests.statsd".to_owned()],
        )
    }

    fn metric<'a>(container: &'a Container, kind: Kind) -> Metric<'a> {
        Metric {
            container,
            kind,
            name: "foo.bar",
            value: 1,
            hostname: "host-1",
        }
    }

    #[test]
    fn test_render_l2met_style() {
        let template =
            Template::parse("{{.Type}}#{{.Name}}={{.Value}} source={{.Container.Name}}.{{.Hostname}}")
                .unwrap();
        let c = container();
        assert_eq!(
            template.render(&metric(&c, Kind::Sample)),
            "sample#foo.bar=1 source=dummy.host-1"
        );
        assert_eq!(
            template.render(&metric(&c, Kind::Count)),
            "count#foo.bar=1 source=dummy.host-1"
        );
    }

    #[test]
    fn test_render_env_and_id() {
        let template =
            Template::parse(r#"tests.source__{{ .Env "SOURCE" }}__{{.Container.ID}}{{.Env "NOPE"}}"#)
                .unwrap();
        let c = container();
        assert_eq!(
            template.render(&metric(&c, Kind::Count)),
            "tests.source__dockerstats.tests.statsd__4f66ad9a0b2e"
        );
    }

    #[test]
    fn test_plain_text_template() {
        let template = Template::parse("static").unwrap();
        let c = container();
        assert_eq!(template.render(&metric(&c, Kind::Sample)), "static");
        assert_eq!(Template::parse("").unwrap().parts, Vec::new());
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            Template::parse("abc {{.Name"),
            Err(TemplateError::Unterminated(4))
        );
        assert_eq!(
            Template::parse("{{.Image}}"),
            Err(TemplateError::UnknownField(".Image".to_owned()))
        );
        assert_eq!(
            Template::parse("{{.Envelope}}"),
            Err(TemplateError::UnknownField(".Envelope".to_owned()))
        );
        assert_eq!(
            Template::parse("{{.Env SOURCE}}"),
            Err(TemplateError::InvalidEnvArgument(".Env SOURCE".to_owned()))
        );
        assert_eq!(
            Template::parse(r#"{{.Env ""}}"#),
            Err(TemplateError::InvalidEnvArgument(r#".Env """#.to_owned()))
        );
    }
}
