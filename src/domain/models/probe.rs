//! Sidecar probe requests and the argument vectors they run with.

use std::path::PathBuf;

use super::annotation::AnnotatorKind;

/// HTTP verbs the harness issues against an annotator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

/// A single HTTP call, rendered as a curl argument vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    /// Path inside the sidecar to write the response body to.
    pub output_path: Option<String>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            output_path: None,
        }
    }

    /// JSON POST with the accept/content-type headers the annotator API expects.
    pub fn post_json(url: impl Into<String>, body: String) -> Self {
        Self {
            method: HttpMethod::Post,
            url: url.into(),
            headers: vec![
                ("accept".to_string(), "application/json".to_string()),
                ("Content-Type".to_string(), "application/json".to_string()),
            ],
            body: Some(body),
            output_path: None,
        }
    }

    #[must_use]
    pub fn write_to(mut self, path: impl Into<String>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    /// Arguments for the curl image. `-f` turns HTTP errors into a non-zero exit.
    pub fn to_curl_args(&self) -> Vec<String> {
        let mut args = vec!["curl".to_string(), "-s".to_string(), "-S".to_string(), "-f".to_string()];
        if let Some(ref path) = self.output_path {
            args.push("-o".to_string());
            args.push(path.clone());
        }
        args.push("-X".to_string());
        args.push(self.method.as_str().to_string());
        args.push(self.url.clone());
        for (name, value) in &self.headers {
            args.push("-H".to_string());
            args.push(format!("{name}: {value}"));
        }
        if let Some(ref body) = self.body {
            args.push("-d".to_string());
            args.push(body.clone());
        }
        args
    }
}

/// Invocations of the conformance CLI image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConformanceCommand {
    GetTool {
        annotator_host: String,
    },
    CheckUrl {
        url: String,
    },
    AnnotateNote {
        annotator_host: String,
        note_json: String,
        kind: AnnotatorKind,
    },
}

impl ConformanceCommand {
    pub fn to_args(&self) -> Vec<String> {
        match self {
            Self::GetTool { annotator_host } => vec![
                "evaluate".to_string(),
                "get-tool".to_string(),
                "--annotator_host".to_string(),
                annotator_host.clone(),
            ],
            Self::CheckUrl { url } => vec![
                "evaluate".to_string(),
                "check-url".to_string(),
                "--url".to_string(),
                url.clone(),
            ],
            Self::AnnotateNote {
                annotator_host,
                note_json,
                kind,
            } => vec![
                "evaluate".to_string(),
                "annotate-note".to_string(),
                "--annotator_host".to_string(),
                annotator_host.clone(),
                "--note_json".to_string(),
                note_json.clone(),
                "--annotator_type".to_string(),
                kind.as_str().to_string(),
            ],
        }
    }
}

/// Where a probe's response payload is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutput {
    Stdout,
    /// Host path of a file the sidecar writes through a bind mount.
    MountedFile(PathBuf),
}

/// Everything needed to run one auxiliary container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeRequest {
    pub name: String,
    pub image: String,
    pub args: Vec<String>,
    /// Bind mounts in `host:container[:mode]` form.
    pub binds: Vec<String>,
    pub output: ProbeOutput,
}

impl ProbeRequest {
    pub fn new(name: impl Into<String>, image: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            args,
            binds: Vec::new(),
            output: ProbeOutput::Stdout,
        }
    }

    #[must_use]
    pub fn with_bind(mut self, bind: impl Into<String>) -> Self {
        self.binds.push(bind.into());
        self
    }

    #[must_use]
    pub fn reading_file(mut self, host_path: impl Into<PathBuf>) -> Self {
        self.output = ProbeOutput::MountedFile(host_path.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_json_curl_args() {
        let req = HttpRequest::post_json(
            "http://172.18.0.2:8080/api/v1/textDateAnnotations",
            r#"{"note":{}}"#.to_string(),
        )
        .write_to("/output/annotations.json");

        assert_eq!(
            req.to_curl_args(),
            vec![
                "curl",
                "-s",
                "-S",
                "-f",
                "-o",
                "/output/annotations.json",
                "-X",
                "POST",
                "http://172.18.0.2:8080/api/v1/textDateAnnotations",
                "-H",
                "accept: application/json",
                "-H",
                "Content-Type: application/json",
                "-d",
                r#"{"note":{}}"#,
            ]
        );
    }

    #[test]
    fn test_get_has_no_body() {
        let args = HttpRequest::get("http://h/api/v1/healthCheck").to_curl_args();
        assert!(!args.contains(&"-d".to_string()));
        assert_eq!(args.last().unwrap(), "http://h/api/v1/healthCheck");
    }

    #[test]
    fn test_conformance_annotate_args() {
        let cmd = ConformanceCommand::AnnotateNote {
            annotator_host: "http://h:8080/api/v1".to_string(),
            note_json: "/example_note.json".to_string(),
            kind: AnnotatorKind::Person,
        };
        let args = cmd.to_args();
        assert_eq!(&args[..2], &["evaluate", "annotate-note"]);
        assert_eq!(args.last().unwrap(), "person");
    }
}
